/// Radius of the outermost scoring ring, in target units.
pub const OUTER_RADIUS: u32 = 10;

/// Score of the innermost ring.
pub const MAX_SCORE: u8 = 10;

/// Ring score for a landing point.
///
/// Rings are checked from the centre outward and the first one whose radius
/// is not exceeded wins, so a point exactly on a boundary belongs to the inner
/// (higher scoring) ring. Anything past [`OUTER_RADIUS`] is a miss worth 0.
/// Non-finite input never satisfies a ring comparison and also scores 0.
pub fn score(x: f64, y: f64) -> u8 {
    let d = (x * x + y * y).sqrt();
    for radius in 1..=OUTER_RADIUS {
        if d <= f64::from(radius) {
            return MAX_SCORE + 1 - radius as u8;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centre_is_ten() {
        assert_eq!(score(0.0, 0.0), 10);
        assert_eq!(score(-0.0, 0.0), 10);
    }

    #[test]
    fn ring_boundaries_belong_to_inner_ring() {
        for radius in 1..=OUTER_RADIUS {
            let expected = MAX_SCORE + 1 - radius as u8;
            assert_eq!(score(f64::from(radius), 0.0), expected, "on ring {radius}");
            assert_eq!(score(0.0, -f64::from(radius)), expected, "on ring {radius}");
        }
    }

    #[test]
    fn just_outside_the_target_is_a_miss() {
        assert_eq!(score(10.0, 0.0), 1);
        assert_eq!(score(10.0001, 0.0), 0);
        assert_eq!(score(50.0, -50.0), 0);
    }

    #[test]
    fn matches_floor_form_away_from_centre() {
        let points: [(f64, f64); 5] =
            [(0.3, 0.4), (1.5, 0.0), (3.0, 4.0), (6.1, -2.2), (-9.9, 0.5)];
        for (x, y) in points {
            let d = (x * x + y * y).sqrt();
            let closed = if d.fract() == 0.0 {
                (11.0 - d).max(0.0)
            } else {
                (10.0 - d.floor()).max(0.0)
            };
            assert_eq!(score(x, y), closed as u8, "({x}, {y})");
        }
    }

    #[test]
    fn non_finite_coordinates_miss() {
        assert_eq!(score(f64::NAN, 0.0), 0);
        assert_eq!(score(f64::INFINITY, 0.0), 0);
        assert_eq!(score(0.0, f64::NEG_INFINITY), 0);
    }
}
