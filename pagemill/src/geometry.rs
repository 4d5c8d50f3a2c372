//! Mapping a source-space rectangle onto a pixel grid.
//!
//! Source space has its origin in the bottom-left corner with y pointing up. Pixel space
//! has its origin in the top-left corner with y pointing down.

use crate::error::GeometryError;
use kurbo::{Affine, Rect};

/// How far the transformed source rectangle may stray from the pixel origin.
pub const GEOMETRY_TOLERANCE: f64 = 1e-6;

/// The clockwise rotation a page is displayed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    /// No rotation.
    #[default]
    None,
    /// A rotation of 90 degrees.
    Quarter,
    /// A rotation of 180 degrees.
    Half,
    /// A rotation of 270 degrees.
    ThreeQuarter,
}

impl Rotation {
    /// Create a rotation from a number of degrees.
    ///
    /// Any multiple of 90 is accepted, including negative ones. Returns `None` for
    /// everything else.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        if degrees % 90 != 0 {
            return None;
        }

        match degrees.rem_euclid(360) {
            0 => Some(Self::None),
            90 => Some(Self::Quarter),
            180 => Some(Self::Half),
            270 => Some(Self::ThreeQuarter),
            _ => None,
        }
    }

    /// The rotation in degrees.
    pub fn degrees(self) -> u16 {
        match self {
            Self::None => 0,
            Self::Quarter => 90,
            Self::Half => 180,
            Self::ThreeQuarter => 270,
        }
    }

    /// Whether the rotation swaps width and height.
    pub fn is_sideways(self) -> bool {
        matches!(self, Self::Quarter | Self::ThreeQuarter)
    }
}

/// Compute the transform from source space to pixel space.
///
/// If `user_transform` is set, it is returned as is. Otherwise, the corner of `source` that ends
/// up in the top-left after rotating is moved to the origin, the y axis is flipped and
/// everything is scaled by `scale`.
pub fn compute_transform(
    rotation: Rotation,
    source: Rect,
    scale: f64,
    user_transform: Option<Affine>,
) -> Affine {
    if let Some(transform) = user_transform {
        return transform;
    }

    let Rect {
        x0: left,
        y0: bottom,
        x1: right,
        y1: top,
    } = source;

    let (orient, flip_height) = match rotation {
        Rotation::None => (Affine::new([1.0, 0.0, 0.0, 1.0, -left, -bottom]), top - bottom),
        Rotation::Quarter => (Affine::new([0.0, -1.0, 1.0, 0.0, -bottom, right]), right - left),
        Rotation::Half => (Affine::new([-1.0, 0.0, 0.0, -1.0, right, top]), top - bottom),
        Rotation::ThreeQuarter => (Affine::new([0.0, 1.0, -1.0, 0.0, top, -left]), right - left),
    };

    let flip = Affine::new([1.0, 0.0, 0.0, -1.0, 0.0, flip_height]);

    Affine::scale(scale) * flip * orient
}

/// Compute the pixel rectangle `source` is drawn into.
///
/// If `user_rect` is set, it is returned as is. Otherwise the bounding box of the transformed
/// source rectangle is used, which has to start at the origin.
pub fn compute_destination_rect(
    transform: Affine,
    source: Rect,
    user_rect: Option<Rect>,
) -> Result<Rect, GeometryError> {
    if let Some(rect) = user_rect {
        return Ok(rect);
    }

    let dest = transform.transform_rect_bbox(source);

    if dest.x0.abs() > GEOMETRY_TOLERANCE || dest.y0.abs() > GEOMETRY_TOLERANCE {
        return Err(GeometryError::Misaligned {
            x: dest.x0,
            y: dest.y0,
        });
    }

    Ok(dest)
}

/// Round the size of a destination rectangle to whole pixels.
pub fn pixel_dimensions(dest: Rect) -> Result<(u32, u32), GeometryError> {
    let round = |v: f64| (v + 0.5).floor();
    let (width, height) = (round(dest.width()), round(dest.height()));

    let in_range = |v: f64| v.is_finite() && v >= 1.0 && v <= u32::MAX as f64;

    if !in_range(width) || !in_range(height) {
        return Err(GeometryError::Empty { width, height });
    }

    Ok((width as u32, height as u32))
}

/// The rectangle a rendering of `source` occupies once it is displayed with `rotation`.
///
/// For sideways rotations, width and height trade places.
pub fn placement_rect(source: Rect, rotation: Rotation) -> Rect {
    if rotation.is_sideways() {
        Rect::new(source.y0, source.x0, source.y1, source.x1)
    } else {
        source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    const ROTATIONS: [Rotation; 4] = [
        Rotation::None,
        Rotation::Quarter,
        Rotation::Half,
        Rotation::ThreeQuarter,
    ];

    fn corners(rect: Rect) -> [Point; 4] {
        [
            Point::new(rect.x0, rect.y0),
            Point::new(rect.x1, rect.y0),
            Point::new(rect.x0, rect.y1),
            Point::new(rect.x1, rect.y1),
        ]
    }

    fn assert_near(a: Point, b: Point) {
        assert!(
            (a - b).hypot() < GEOMETRY_TOLERANCE,
            "expected {b:?}, got {a:?}"
        );
    }

    #[test]
    fn derived_transform_starts_at_origin() {
        let sources = [
            Rect::new(0.0, 0.0, 612.0, 792.0),
            Rect::new(-30.5, 12.25, 400.0, 100.0),
            Rect::new(100.0, 200.0, 101.0, 777.7),
        ];

        for source in sources {
            for rotation in ROTATIONS {
                for scale in [1.0, 150.0 / 72.0, 0.5] {
                    let ts = compute_transform(rotation, source, scale, None);
                    let (min_x, min_y) = corners(source)
                        .iter()
                        .map(|p| ts * *p)
                        .fold((f64::MAX, f64::MAX), |(x, y), p| (x.min(p.x), y.min(p.y)));

                    assert!(min_x.abs() < GEOMETRY_TOLERANCE, "{rotation:?}: {min_x}");
                    assert!(min_y.abs() < GEOMETRY_TOLERANCE, "{rotation:?}: {min_y}");
                }
            }
        }
    }

    #[test]
    fn content_top_left_maps_to_pixel_origin() {
        let source = Rect::new(10.0, 20.0, 110.0, 70.0);

        let expected_origin = [
            (Rotation::None, Point::new(10.0, 70.0)),
            (Rotation::Quarter, Point::new(10.0, 20.0)),
            (Rotation::Half, Point::new(110.0, 20.0)),
            (Rotation::ThreeQuarter, Point::new(110.0, 70.0)),
        ];

        for (rotation, corner) in expected_origin {
            let ts = compute_transform(rotation, source, 1.0, None);
            assert_near(ts * corner, Point::ORIGIN);
        }
    }

    #[test]
    fn user_transform_is_used_verbatim() {
        let user = Affine::new([2.0, 0.5, -1.0, 3.0, 7.0, 9.0]);
        let source = Rect::new(0.0, 0.0, 10.0, 10.0);
        let ts = compute_transform(Rotation::Quarter, source, 4.0, Some(user));
        assert_eq!(ts, user);
    }

    #[test]
    fn us_letter_at_72_dpi() {
        let source = Rect::new(0.0, 0.0, 612.0, 792.0);
        let ts = compute_transform(Rotation::None, source, 1.0, None);
        let dest = compute_destination_rect(ts, source, None).unwrap();

        assert_eq!(pixel_dimensions(dest).unwrap(), (612, 792));
    }

    #[test]
    fn resolution_scales_and_rounds() {
        let source = Rect::new(0.0, 0.0, 100.0, 100.0);
        let ts = compute_transform(Rotation::None, source, 150.0 / 72.0, None);
        let dest = compute_destination_rect(ts, source, None).unwrap();

        assert_eq!(pixel_dimensions(dest).unwrap(), (208, 208));
    }

    #[test]
    fn sideways_rotation_swaps_dimensions() {
        let source = Rect::new(0.0, 0.0, 200.0, 100.0);

        for rotation in [Rotation::Quarter, Rotation::ThreeQuarter] {
            let ts = compute_transform(rotation, source, 2.0, None);
            let dest = compute_destination_rect(ts, source, None).unwrap();
            assert_eq!(pixel_dimensions(dest).unwrap(), (200, 400));
        }

        let ts = compute_transform(Rotation::Quarter, source, 1.0, None);
        let dest = compute_destination_rect(ts, source, None).unwrap();
        assert_eq!(pixel_dimensions(dest).unwrap(), (100, 200));
    }

    #[test]
    fn misaligned_transform_is_rejected() {
        let source = Rect::new(0.0, 0.0, 10.0, 10.0);
        let ts = Affine::translate((5.0, 0.0));

        assert_eq!(
            compute_destination_rect(ts, source, None),
            Err(GeometryError::Misaligned { x: 5.0, y: 0.0 })
        );
    }

    #[test]
    fn user_rect_is_used_verbatim() {
        let user = Rect::new(0.0, 0.0, 31.0, 17.0);
        let dest =
            compute_destination_rect(Affine::translate((5.0, 5.0)), Rect::ZERO, Some(user)).unwrap();
        assert_eq!(dest, user);
        assert_eq!(pixel_dimensions(dest).unwrap(), (31, 17));
    }

    #[test]
    fn empty_destination() {
        assert!(matches!(
            pixel_dimensions(Rect::new(0.0, 0.0, 0.4, 10.0)),
            Err(GeometryError::Empty { .. })
        ));
    }

    #[test]
    fn rotation_from_degrees() {
        assert_eq!(Rotation::from_degrees(0), Some(Rotation::None));
        assert_eq!(Rotation::from_degrees(-90), Some(Rotation::ThreeQuarter));
        assert_eq!(Rotation::from_degrees(450), Some(Rotation::Quarter));
        assert_eq!(Rotation::from_degrees(540), Some(Rotation::Half));
        assert_eq!(Rotation::from_degrees(45), None);
    }

    #[test]
    fn placement_swaps_for_sideways_pages() {
        let source = Rect::new(1.0, 2.0, 3.0, 4.0);

        assert_eq!(placement_rect(source, Rotation::Half), source);
        assert_eq!(
            placement_rect(source, Rotation::Quarter),
            Rect::new(2.0, 1.0, 4.0, 3.0)
        );
    }
}
