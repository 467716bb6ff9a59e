//! Container geometry
//!
//! Pure functions relating liquid volume to liquid height in a container of
//! constant circular cross-section. Volumes are µl, lengths mm
//! (1 µl = 1 mm³).

use core::f32::consts::PI;

use thiserror::Error;

/// Geometry input errors
///
/// These are configuration errors: they are raised while building a plan
/// and never reach hardware.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    /// Radius was zero, negative, or not a number
    #[error("container radius must be positive, got {0} mm")]
    NonPositiveRadius(f32),
}

/// Cross-sectional area of a circular container
pub fn cross_sectional_area(radius_mm: f32) -> Result<f32, GeometryError> {
    // `!(r > 0)` also rejects NaN
    if !(radius_mm > 0.0) {
        return Err(GeometryError::NonPositiveRadius(radius_mm));
    }
    Ok(PI * radius_mm * radius_mm)
}

/// Liquid height for `volume_ul` in a container of radius `radius_mm`
pub fn height_for_volume(volume_ul: f32, radius_mm: f32) -> Result<f32, GeometryError> {
    Ok(volume_ul / cross_sectional_area(radius_mm)?)
}

/// Volume held up to `height_mm`
pub fn volume_for_height(height_mm: f32, radius_mm: f32) -> Result<f32, GeometryError> {
    Ok(height_mm * cross_sectional_area(radius_mm)?)
}

/// Initial draw height for a container filled with `fill_volume_ul`
///
/// The computed liquid height is reduced by `headroom_mm` so the first
/// aspiration happens below the surface; never negative.
pub fn starting_height(
    fill_volume_ul: f32,
    radius_mm: f32,
    headroom_mm: f32,
) -> Result<f32, GeometryError> {
    Ok((height_for_volume(fill_volume_ul, radius_mm)? - headroom_mm).max(0.0))
}

/// Radius of the circle whose area equals `area_mm2`
///
/// Lets rectangular troughs be described by their footprint area.
pub fn equivalent_radius(area_mm2: f32) -> f32 {
    (area_mm2 / PI).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_area_of_unit_radius() {
        let area = cross_sectional_area(1.0).unwrap();
        assert!((area - PI).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_non_positive_radius() {
        assert_eq!(
            height_for_volume(100.0, 0.0),
            Err(GeometryError::NonPositiveRadius(0.0))
        );
        assert!(height_for_volume(100.0, -2.0).is_err());
        assert!(height_for_volume(100.0, f32::NAN).is_err());
    }

    #[test]
    fn test_equivalent_radius_gives_area() {
        let r = equivalent_radius(100.0);
        let h = height_for_volume(1000.0, r).unwrap();
        assert!((h - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_starting_height_headroom() {
        let r = equivalent_radius(100.0);
        let h = starting_height(2000.0, r, 5.0).unwrap();
        assert!((h - 15.0).abs() < 1e-4);

        // Nearly empty tube never yields a negative height
        assert_eq!(starting_height(10.0, r, 5.0).unwrap(), 0.0);
    }

    #[test]
    fn test_volume_height_inverse() {
        let v = volume_for_height(12.5, 3.0).unwrap();
        let h = height_for_volume(v, 3.0).unwrap();
        assert!((h - 12.5).abs() < 1e-4);
    }

    proptest! {
        #[test]
        fn height_is_monotonic_in_volume(
            radius in 0.5f32..50.0,
            a in 0.0f32..100_000.0,
            b in 0.0f32..100_000.0,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let h_lo = height_for_volume(lo, radius).unwrap();
            let h_hi = height_for_volume(hi, radius).unwrap();
            prop_assert!(h_lo <= h_hi);
        }
    }
}
