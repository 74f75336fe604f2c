//! # Grid Geometry
//!
//! Distance measures and point-set helpers used when choosing where tunnels
//! start and where cavern centers go.

use crate::{Position, Rect};
use rand::Rng;
use std::collections::BTreeSet;

/// Squared Euclidean distance between two positions.
pub fn distance_squared(a: Position, b: Position) -> i64 {
    let dx = (a.x - b.x) as i64;
    let dy = (a.y - b.y) as i64;
    dx * dx + dy * dy
}

/// Returns the member of `locations` nearest to `target`.
///
/// Ties go to the first member in iteration order. Returns None for an empty set.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeSet;
/// use warren::Position;
/// use warren::utils::nearby_location;
///
/// let points: BTreeSet<_> = [Position::new(0, 0), Position::new(10, 10)].into_iter().collect();
/// assert_eq!(nearby_location(&points, Position::new(8, 9)), Some(Position::new(10, 10)));
/// ```
pub fn nearby_location(locations: &BTreeSet<Position>, target: Position) -> Option<Position> {
    let mut closest: Option<(Position, i64)> = None;
    for &location in locations {
        let distance = distance_squared(location, target);
        match closest {
            Some((_, best)) if best <= distance => {}
            _ => closest = Some((location, distance)),
        }
    }
    closest.map(|(location, _)| location)
}

/// Finds a pair of reasonably close points, one from each set.
///
/// This is a two-step approximation, not an exact nearest pair: pick a random
/// point in `a`, take the nearest point in `b` to it, then the nearest point
/// in `a` to that. It keeps the cost linear in the set sizes.
pub fn closest_points<R: Rng + ?Sized>(
    a: &BTreeSet<Position>,
    b: &BTreeSet<Position>,
    rng: &mut R,
) -> Option<(Position, Position)> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let guess_a = *a.iter().nth(rng.gen_range(0..a.len()))?;
    let guess_b = nearby_location(b, guess_a)?;
    let guess_a = nearby_location(a, guess_b)?;
    Some((guess_a, guess_b))
}

/// Evenly spaced sample points covering a rectangle.
///
/// Rows and columns start at the north-west corner and step by `spacing`;
/// the eastern column, the southern row and the south-east corner one past
/// the rectangle are always included.
pub fn mesh(rect: Rect, spacing: i32) -> Vec<Position> {
    let spacing = spacing.max(1) as usize;
    let x_end = rect.x_west + rect.width;
    let y_end = rect.y_north + rect.height;
    let mut points = Vec::new();

    for y in (rect.y_north..y_end).step_by(spacing) {
        for x in (rect.x_west..x_end).step_by(spacing) {
            points.push(Position::new(x, y));
        }
        points.push(Position::new(x_end, y));
    }
    for x in (rect.x_west..x_end).step_by(spacing) {
        points.push(Position::new(x, y_end));
    }
    points.push(Position::new(x_end, y_end));

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn set(points: &[(i32, i32)]) -> BTreeSet<Position> {
        points.iter().map(|&(x, y)| Position::new(x, y)).collect()
    }

    #[test]
    fn test_distance_squared() {
        let a = Position::new(1, 1);
        let b = Position::new(4, 5);
        assert_eq!(distance_squared(a, b), 25);
        assert_eq!(distance_squared(b, a), 25);
    }

    #[test]
    fn test_nearby_location() {
        let points = set(&[(0, 0), (5, 5), (9, 1)]);
        assert_eq!(nearby_location(&points, Position::new(8, 0)), Some(Position::new(9, 1)));
        assert_eq!(nearby_location(&BTreeSet::new(), Position::new(8, 0)), None);
    }

    #[test]
    fn test_closest_points_picks_facing_edges() {
        let left = set(&[(1, 1), (2, 1), (3, 1)]);
        let right = set(&[(10, 1), (11, 1), (12, 1)]);
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..10 {
            let (a, b) = closest_points(&left, &right, &mut rng).unwrap();
            assert_eq!(a, Position::new(3, 1));
            assert_eq!(b, Position::new(10, 1));
        }
        assert!(closest_points(&left, &BTreeSet::new(), &mut rng).is_none());
    }

    #[test]
    fn test_mesh_covers_corners() {
        let points = mesh(Rect::new(0, 0, 8, 4), 4);
        assert!(points.contains(&Position::new(0, 0)));
        assert!(points.contains(&Position::new(8, 0)));
        assert!(points.contains(&Position::new(0, 4)));
        assert!(points.contains(&Position::new(8, 4)));
        // rows 0 and 4, columns 0, 4 and 8
        assert_eq!(points.len(), 6);
    }
}
