use std::f64::consts::PI;

/// Web Mercator is undefined at the poles; latitudes are clamped to this
const MAX_LATITUDE: f64 = 85.05;

const MIN_ZOOM: f64 = 0.5;
const MAX_ZOOM: f64 = 50.0;
const ZOOM_STEP: f64 = 1.5;

/// Viewport representing the visible map area and zoom level
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Zoom level (higher = more zoomed in)
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

/// Normalized Web Mercator coordinates in [0, 1]
fn mercator(lon: f64, lat: f64) -> (f64, f64) {
    let x = (lon + 180.0) / 360.0;
    let lat_rad = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;
    (x, y)
}

fn inverse_mercator(x: f64, y: f64) -> (f64, f64) {
    let lon = x * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();
    (lon, lat)
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom,
            width,
            height,
        }
    }

    /// Whole-world view, nudged north where most sub-regions sit
    pub fn world(width: usize, height: usize) -> Self {
        Self::new(0.0, 20.0, 1.0, width, height)
    }

    pub fn set_size(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = 360.0 / (self.zoom * self.width.max(1) as f64);
        self.center_lon += dx as f64 * scale;
        self.center_lat -= dy as f64 * scale * 0.5;

        if self.center_lon > 180.0 {
            self.center_lon -= 360.0;
        } else if self.center_lon < -180.0 {
            self.center_lon += 360.0;
        }

        self.center_lat = self.center_lat.clamp(-85.0, 85.0);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * ZOOM_STEP).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / ZOOM_STEP).max(MIN_ZOOM);
    }

    /// Zoom in keeping the point under (px, py) fixed
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, ZOOM_STEP);
    }

    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / ZOOM_STEP);
    }

    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px, py);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);

        // Re-centre so the same point lands back under the cursor
        let (x, y) = mercator(lon, lat);
        let scale = self.zoom * self.width as f64;
        let (center_lon, center_lat) = inverse_mercator(
            x - (px as f64 - self.width as f64 / 2.0) / scale,
            y - (py as f64 - self.height as f64 / 2.0) / scale,
        );
        self.center_lon = center_lon;
        self.center_lat = center_lat.clamp(-85.0, 85.0);
    }

    /// Pixel coordinates back to (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let scale = self.zoom * self.width as f64;
        let (center_x, center_y) = mercator(self.center_lon, self.center_lat);

        let x = (px as f64 - self.width as f64 / 2.0) / scale + center_x;
        let y = (py as f64 - self.height as f64 / 2.0) / scale + center_y;

        inverse_mercator(x, y)
    }

    /// (lon, lat) to sub-pixel coordinates, for polygon filling
    pub fn project_f64(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (x, y) = mercator(lon, lat);
        let (center_x, center_y) = mercator(self.center_lon, self.center_lat);
        let scale = self.zoom * self.width as f64;

        (
            (x - center_x) * scale + self.width as f64 / 2.0,
            (y - center_y) * scale + self.height as f64 / 2.0,
        )
    }

    /// (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let (px, py) = self.project_f64(lon, lat);
        (px as i32, py as i32)
    }

    /// Whether a projected pixel bbox overlaps the canvas
    pub fn bbox_visible(&self, min: (f64, f64), max: (f64, f64)) -> bool {
        max.0 >= 0.0 && min.0 < self.width as f64 && max.1 >= 0.0 && min.1 < self.height as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_center() {
        let vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        assert_eq!(vp.project(0.0, 0.0), (50, 50));
    }

    #[test]
    fn test_unproject_inverts_project() {
        let vp = Viewport::new(10.0, 30.0, 2.0, 200, 120);
        let (px, py) = vp.project_f64(25.0, 40.0);
        let (lon, lat) = vp.unproject(px.round() as i32, py.round() as i32);
        assert!((lon - 25.0).abs() < 1.0);
        assert!((lat - 40.0).abs() < 1.0);
    }

    #[test]
    fn test_poles_project_finitely() {
        let vp = Viewport::world(100, 100);
        let (_, south) = vp.project_f64(0.0, -90.0);
        let (_, north) = vp.project_f64(0.0, 90.0);
        assert!(south.is_finite() && north.is_finite());
        assert!(south > north);
    }

    #[test]
    fn test_pan_and_zoom_limits() {
        let mut vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        vp.pan(10, 0);
        assert!(vp.center_lon > 0.0);
        for _ in 0..40 {
            vp.zoom_in();
        }
        assert_eq!(vp.zoom, MAX_ZOOM);
        for _ in 0..40 {
            vp.zoom_out();
        }
        assert_eq!(vp.zoom, MIN_ZOOM);
    }

    #[test]
    fn test_zoom_at_keeps_point_under_cursor() {
        let mut vp = Viewport::new(0.0, 0.0, 1.0, 200, 200);
        let before = vp.unproject(150, 60);
        vp.zoom_in_at(150, 60);
        let after = vp.unproject(150, 60);
        assert!((before.0 - after.0).abs() < 2.0);
        assert!((before.1 - after.1).abs() < 2.0);
    }
}
