//! External contour selection.

use super::BoundingBox;
use image::{imageops, GrayImage};
use imageproc::contours::{find_contours, BorderType, Contour};

/// Outer borders of the mask's top-level regions.
///
/// Holes and regions nested inside holes are dropped. Order is the
/// raster order in which the borders were discovered. Points are in
/// mask coordinates.
pub fn external_contours(mask: &GrayImage) -> Vec<Contour<i32>> {
    // Border tracing misclassifies regions touching pixel (0, 0), so the
    // mask is traced inside a one pixel zero frame.
    let mut padded = GrayImage::new(mask.width() + 2, mask.height() + 2);
    imageops::replace(&mut padded, mask, 1, 1);

    find_contours::<i32>(&padded)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .map(|mut c| {
            for p in &mut c.points {
                p.x -= 1;
                p.y -= 1;
            }
            c
        })
        .collect()
}

/// Area enclosed by the contour polygon (shoelace formula).
///
/// Single points and straight runs enclose zero area.
pub fn contour_area(contour: &Contour<i32>) -> f64 {
    let points = &contour.points;
    if points.len() < 3 {
        return 0.0;
    }

    let twice_area: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();

    twice_area.abs() as f64 / 2.0
}

/// Picks the contour with the largest enclosed area.
///
/// On equal areas the contour discovered first wins, i.e. the one whose
/// topmost-leftmost border pixel comes first in raster order.
pub fn largest_contour(contours: &[Contour<i32>]) -> Option<&Contour<i32>> {
    let mut best: Option<(&Contour<i32>, f64)> = None;
    for contour in contours {
        let area = contour_area(contour);
        if best.map_or(true, |(_, best_area)| area > best_area) {
            best = Some((contour, area));
        }
    }
    best.map(|(contour, _)| contour)
}

/// Bounding rectangle of a contour's points.
pub fn contour_bounds(contour: &Contour<i32>) -> Option<BoundingBox> {
    BoundingBox::enclosing(
        contour
            .points
            .iter()
            .map(|p| (p.x.max(0) as u32, p.y.max(0) as u32)),
    )
}
