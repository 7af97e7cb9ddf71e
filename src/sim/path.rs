//! Path generation for enemy flight
//!
//! Paths are finite, immutable point lists consumed by an index cursor.
//! Motion is sampled directly from the points (no interpolation between
//! samples), which gives the stepped retro movement.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// A sampled trajectory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    points: Vec<Vec2>,
}

impl Path {
    pub fn from_points(points: Vec<Vec2>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Vec2> {
        self.points.get(index).copied()
    }

    pub fn first(&self) -> Option<Vec2> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<Vec2> {
        self.points.last().copied()
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }
}

/// A path plus the index of the next sample to consume
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathCursor {
    pub path: Path,
    pub index: usize,
    /// Samples skipped per tick (1 = standard, 2+ = fast-follow)
    pub step: usize,
}

impl PathCursor {
    pub fn new(path: Path, step: usize) -> Self {
        Self {
            path,
            index: 0,
            step: step.max(1),
        }
    }

    /// Take the current sample and move the cursor forward.
    /// Returns None once the path is used up.
    pub fn advance(&mut self) -> Option<Vec2> {
        let point = self.path.get(self.index)?;
        self.index += self.step;
        Some(point)
    }

    pub fn is_exhausted(&self) -> bool {
        self.index >= self.path.len()
    }
}

/// Evaluate a cubic Bezier at parameter `t` in [0, 1]
#[inline]
pub fn cubic_bezier(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t)
}

/// Sample a cubic Bezier into `segments + 1` points.
///
/// The endpoints are written exactly, so a consumer that snaps to the last
/// sample lands on `end` bit-for-bit.
pub fn bezier_path(start: Vec2, c1: Vec2, c2: Vec2, end: Vec2, segments: usize) -> Path {
    let segments = segments.max(1);
    let mut points = Vec::with_capacity(segments + 1);
    points.push(start);
    for i in 1..segments {
        let t = i as f32 / segments as f32;
        points.push(cubic_bezier(start, c1, c2, end, t));
    }
    points.push(end);
    Path::from_points(points)
}

/// Random control points that make a path swoop through the upper screen:
/// the first in the upper third band, the second in the band below it.
pub fn swoop_controls<R: Rng>(rng: &mut R) -> (Vec2, Vec2) {
    let x_range = 50.0..=SCREEN_WIDTH - 50.0;
    let c1 = Vec2::new(
        rng.random_range(x_range.clone()),
        rng.random_range(SCREEN_HEIGHT / 7.0..=SCREEN_HEIGHT * 5.0 / 14.0),
    );
    let c2 = Vec2::new(
        rng.random_range(x_range),
        rng.random_range(SCREEN_HEIGHT * 5.0 / 14.0..=SCREEN_HEIGHT * 4.0 / 7.0),
    );
    (c1, c2)
}

/// Generate a swooping Bezier path from `start` to `end`.
/// `start == end` is fine: the curve still loops through the random controls.
pub fn generate_path<R: Rng>(start: Vec2, end: Vec2, rng: &mut R) -> Path {
    let (c1, c2) = swoop_controls(rng);
    bezier_path(start, c1, c2, end, PATH_SEGMENTS)
}

/// Straight plunge toward `aim_x` down to `floor_y`, then back up along the
/// mirrored leg. Used by divers that commit to a line instead of a curve.
pub fn plunge_path(start: Vec2, aim_x: f32, floor_y: f32, steps: usize) -> Path {
    if steps == 0 {
        return Path::from_points(vec![start]);
    }
    let n = steps as f32;
    let dx = (aim_x - start.x) / n;
    let dy = (floor_y - start.y) / n;
    let mut points = Vec::with_capacity(steps * 2);
    for i in 0..steps {
        let i = i as f32;
        points.push(Vec2::new(start.x + dx * i, start.y + dy * i));
    }
    for i in 0..steps {
        let i = i as f32;
        points.push(Vec2::new(start.x + dx * (n - i - 1.0), floor_y - dy * i));
    }
    Path::from_points(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_bezier_endpoints_exact() {
        let mut rng = Pcg32::seed_from_u64(7);
        let start = Vec2::new(-120.0, -100.0);
        let end = Vec2::new(315.0, 130.0);
        let path = generate_path(start, end, &mut rng);
        assert_eq!(path.len(), PATH_SEGMENTS + 1);
        assert_eq!(path.first(), Some(start));
        assert_eq!(path.last(), Some(end));
    }

    #[test]
    fn test_degenerate_path() {
        let mut rng = Pcg32::seed_from_u64(1);
        let p = Vec2::new(400.0, 300.0);
        let path = generate_path(p, p, &mut rng);
        assert_eq!(path.len(), PATH_SEGMENTS + 1);
        assert_eq!(path.first(), Some(p));
        assert_eq!(path.last(), Some(p));
        assert!(path.points().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_straight_bezier_midpoint() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(300.0, 0.0);
        // Controls on the chord at thirds give uniform speed
        let path = bezier_path(a, Vec2::new(100.0, 0.0), Vec2::new(200.0, 0.0), b, 10);
        let mid = path.get(5).unwrap();
        assert!((mid.x - 150.0).abs() < 1e-3);
        assert_eq!(mid.y, 0.0);
    }

    #[test]
    fn test_cursor_steps_and_exhausts() {
        let path = Path::from_points((0..5).map(|i| Vec2::splat(i as f32)).collect());
        let mut cursor = PathCursor::new(path, 2);
        assert_eq!(cursor.advance(), Some(Vec2::splat(0.0)));
        assert_eq!(cursor.advance(), Some(Vec2::splat(2.0)));
        assert_eq!(cursor.advance(), Some(Vec2::splat(4.0)));
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.advance(), None);
    }

    #[test]
    fn test_cursor_step_zero_is_one() {
        let cursor = PathCursor::new(Path::default(), 0);
        assert_eq!(cursor.step, 1);
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn test_plunge_path_shape() {
        let start = Vec2::new(100.0, 100.0);
        let path = plunge_path(start, 400.0, 800.0, 60);
        assert_eq!(path.len(), 120);
        assert_eq!(path.first(), Some(start));
        // Deepest point is the start of the return leg
        let deepest = path.get(60).unwrap();
        assert!((deepest.y - 800.0).abs() < 1e-3);
        // Comes back up near the start
        let last = path.last().unwrap();
        assert!((last.x - start.x).abs() < 1e-3);
        assert!(last.y < deepest.y);
    }

    #[test]
    fn test_plunge_zero_steps() {
        let path = plunge_path(Vec2::ZERO, 10.0, 10.0, 0);
        assert_eq!(path.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_generated_paths_well_formed(
            sx in -500.0f32..1300.0,
            sy in -300.0f32..900.0,
            ex in -500.0f32..1300.0,
            ey in -300.0f32..900.0,
            same in any::<bool>(),
            seed in any::<u64>(),
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let start = Vec2::new(sx, sy);
            let end = if same { start } else { Vec2::new(ex, ey) };
            let path = generate_path(start, end, &mut rng);
            prop_assert_eq!(path.len(), PATH_SEGMENTS + 1);
            prop_assert_eq!(path.first(), Some(start));
            prop_assert_eq!(path.last(), Some(end));
            prop_assert!(path.points().iter().all(|p| p.is_finite()));
        }
    }
}
