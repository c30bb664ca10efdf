/// Map viewport descriptor
///
/// A region is a center plus the latitude/longitude span visible on screen.
use super::data::Coordinate;

/// Smallest span the map can zoom in to
const MIN_DELTA: f64 = 0.0005;
/// Largest span the map can zoom out to
const MAX_DELTA: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub latitude: f64,
    pub longitude: f64,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl Region {
    /// Square region around a coordinate
    pub fn centered(center: Coordinate, delta: f64) -> Self {
        Self {
            latitude: center.latitude,
            longitude: center.longitude,
            latitude_delta: delta,
            longitude_delta: delta,
        }
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// True when the centers differ by more than `threshold` degrees in either axis
    pub fn moved_beyond(&self, other: &Region, threshold: f64) -> bool {
        (self.latitude - other.latitude).abs() > threshold
            || longitude_offset(other.longitude, self.longitude).abs() > threshold
    }

    /// Shift the center by a delta in degrees, keeping latitude on the globe
    /// and wrapping longitude around the antimeridian
    pub fn panned(&self, d_latitude: f64, d_longitude: f64) -> Self {
        let mut longitude = self.longitude + d_longitude;
        if longitude > 180.0 {
            longitude -= 360.0;
        } else if longitude < -180.0 {
            longitude += 360.0;
        }

        Self {
            latitude: (self.latitude + d_latitude).clamp(-90.0, 90.0),
            longitude,
            ..*self
        }
    }

    /// Scale both spans by `factor` (< 1 zooms in)
    pub fn zoomed(&self, factor: f64) -> Self {
        Self {
            latitude_delta: (self.latitude_delta * factor).clamp(MIN_DELTA, MAX_DELTA),
            longitude_delta: (self.longitude_delta * factor).clamp(MIN_DELTA, MAX_DELTA),
            ..*self
        }
    }

    /// Project a coordinate into widget space of the given size.
    /// The region center maps to the middle of the widget.
    pub fn project(&self, point: Coordinate, width: f32, height: f32) -> (f32, f32) {
        let dx = longitude_offset(self.longitude, point.longitude) / self.longitude_delta;
        let dy = (self.latitude - point.latitude) / self.latitude_delta;
        (
            width / 2.0 + (dx as f32) * width,
            height / 2.0 + (dy as f32) * height,
        )
    }
}

/// Shortest signed east-west distance from `from` to `to`, in -180..180
fn longitude_offset(from: f64, to: f64) -> f64 {
    (to - from + 180.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> Region {
        Region::centered(Coordinate::new(30.3165, 78.0322), 0.01)
    }

    #[test]
    fn test_small_move_is_within_threshold() {
        let moved = region().panned(0.005, -0.009);
        assert!(!moved.moved_beyond(&region(), 0.01));
    }

    #[test]
    fn test_move_in_one_axis_exceeds_threshold() {
        assert!(region().panned(0.02, 0.0).moved_beyond(&region(), 0.01));
        assert!(region().panned(0.0, -0.011).moved_beyond(&region(), 0.01));
    }

    #[test]
    fn test_pan_wraps_longitude() {
        let east = Region::centered(Coordinate::new(0.0, 179.5), 1.0).panned(0.0, 1.0);
        assert!((east.longitude - -179.5).abs() < 1e-9);

        let pole = Region::centered(Coordinate::new(89.9, 0.0), 1.0).panned(5.0, 0.0);
        assert_eq!(pole.latitude, 90.0);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let tiny = region().zoomed(1e-6);
        assert_eq!(tiny.latitude_delta, MIN_DELTA);
        let huge = region().zoomed(1e6);
        assert_eq!(huge.longitude_delta, MAX_DELTA);
        assert_eq!(huge.center(), region().center());
    }

    #[test]
    fn test_project_center_and_edge() {
        let r = region();
        assert_eq!(r.project(r.center(), 200.0, 100.0), (100.0, 50.0));

        // Half a span north-east lands in the top-right corner
        let corner = Coordinate::new(r.latitude + 0.005, r.longitude + 0.005);
        let (x, y) = r.project(corner, 200.0, 100.0);
        assert!((x - 200.0).abs() < 1e-3);
        assert!(y.abs() < 1e-3);
    }

    #[test]
    fn test_small_move_across_antimeridian() {
        let east = Region::centered(Coordinate::new(0.0, 179.999), 0.01);
        let west = Region::centered(Coordinate::new(0.0, -179.999), 0.01);
        assert!(!west.moved_beyond(&east, 0.01));
        assert!(!east.moved_beyond(&west, 0.01));
        assert!(west.moved_beyond(&east, 0.001));
    }

    #[test]
    fn test_project_across_antimeridian() {
        let east = Region::centered(Coordinate::new(0.0, 179.999), 0.01);
        // 0.002 degrees east of the center, a fifth of the span
        let (x, y) = east.project(Coordinate::new(0.0, -179.999), 100.0, 100.0);
        assert!((x - 70.0).abs() < 1e-3, "x = {x}");
        assert!((y - 50.0).abs() < 1e-3);
    }
}
