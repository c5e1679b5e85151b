//! Viewport and grid.

use mapwright_core::math::Vec2;
use mapwright_core::settings::EditorSettings;

/// The part of the map shown on the canvas.
///
/// `center` is in map coordinates and always maps to the middle of the
/// canvas. `scale` is canvas pixels per map unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    center: Vec2,
    scale: f32,
    width: f32,
    height: f32,
}

impl Default for View {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl View {
    /// View of a canvas `width` x `height` pixels, centered on the origin.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            center: Vec2::zeros(),
            scale: 1.0,
            width,
            height,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Ignores non-finite coordinates.
    pub fn set_center(&mut self, center: Vec2) -> bool {
        if !center.x.is_finite() || !center.y.is_finite() || center == self.center {
            return false;
        }
        self.center = center;
        true
    }

    /// Ignores scales that are not finite and positive.
    pub fn set_scale(&mut self, scale: f32) -> bool {
        if !scale.is_finite() || scale <= 0.0 || scale == self.scale {
            return false;
        }
        self.scale = scale;
        true
    }

    pub fn set_canvas_size(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    /// Canvas size in pixels.
    pub fn canvas_size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// Visible map area size in map units.
    pub fn map_size(&self) -> (f32, f32) {
        (self.width / self.scale, self.height / self.scale)
    }

    pub fn reset(&mut self) {
        self.center = Vec2::zeros();
        self.scale = 1.0;
    }

    pub fn canvas_to_map(&self, p: Vec2) -> Vec2 {
        let half = Vec2::new(self.width, self.height) / 2.0;
        self.center + (p - half) / self.scale
    }

    pub fn map_to_canvas(&self, p: Vec2) -> Vec2 {
        let half = Vec2::new(self.width, self.height) / 2.0;
        (p - self.center) * self.scale + half
    }

    /// Multiplies the scale by `factor`, clamped to the zoom limits, keeping
    /// the map point under the canvas point `anchor` in place.
    ///
    /// Returns `false` if the scale did not change.
    pub fn zoom(&mut self, factor: f32, anchor: Vec2, settings: &EditorSettings) -> bool {
        let old = self.scale;
        let (min, max) = settings.zoom_bounds();
        let new = (old * factor).clamp(min, max);
        if !self.set_scale(new) {
            return false;
        }
        let d = anchor - Vec2::new(self.width, self.height) / 2.0;
        self.center -= d / new - d / old;
        true
    }

    /// Zooms in one step around the canvas center.
    pub fn zoom_in(&mut self, settings: &EditorSettings) -> bool {
        let mid = Vec2::new(self.width, self.height) / 2.0;
        self.zoom(settings.zoom_factor, mid, settings)
    }

    /// Zooms out one step around the canvas center.
    pub fn zoom_out(&mut self, settings: &EditorSettings) -> bool {
        let mid = Vec2::new(self.width, self.height) / 2.0;
        self.zoom(1.0 / settings.zoom_factor, mid, settings)
    }

    pub fn can_zoom_in(&self, settings: &EditorSettings) -> bool {
        self.scale < settings.zoom_bounds().1
    }

    pub fn can_zoom_out(&self, settings: &EditorSettings) -> bool {
        self.scale > settings.zoom_bounds().0
    }
}

/// Grid spacing at a given zoom level.
///
/// Major lines are `editor.grid-size` apart, multiplied as needed to stay at
/// least `editor.grid-limit` pixels apart on screen. Minor lines split each
/// major cell into `editor.grid-divisions` parts and are dropped once they
/// would be closer than the limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    size: f32,
    divisions: u32,
    limit: f32,
    scale: f32,
}

impl Grid {
    pub fn new(settings: &EditorSettings, scale: f32) -> Self {
        Self {
            size: settings.grid_size,
            divisions: settings.grid_divisions,
            limit: settings.grid_limit,
            scale,
        }
    }

    pub fn major_size(&self) -> f32 {
        self.size * (self.limit / (self.size * self.scale)).ceil()
    }

    /// Minor spacing, or `0.0` when minor lines are too dense to show.
    pub fn minor_size(&self) -> f32 {
        if self.divisions == 0 {
            return 0.0;
        }
        let size = self.size / self.divisions as f32;
        if size * self.scale >= self.limit { size } else { 0.0 }
    }

    /// Spacing used for snapping: minor if shown, major otherwise.
    pub fn effective_size(&self) -> f32 {
        match self.minor_size() {
            s if s > 0.0 => s,
            _ => self.major_size(),
        }
    }

    /// Corners of the grid cell containing `p`, in the order
    /// `(x0, y0)`, `(x0 + d, y0)`, `(x0 + d, y0 + d)`, `(x0, y0 + d)`.
    pub fn cell_corners(&self, p: Vec2) -> [Vec2; 4] {
        let d = self.effective_size();
        let x0 = (p.x / d).floor() * d;
        let y0 = (p.y / d).floor() * d;
        [
            Vec2::new(x0, y0),
            Vec2::new(x0 + d, y0),
            Vec2::new(x0 + d, y0 + d),
            Vec2::new(x0, y0 + d),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_sizes() {
        let settings = EditorSettings::default();
        // 100 units split in 5 at scale 1: minor cells are 20px, above the limit.
        let g = Grid::new(&settings, 1.0);
        assert_eq!(g.major_size(), 100.0);
        assert_eq!(g.minor_size(), 20.0);
        assert_eq!(g.effective_size(), 20.0);

        // Zoomed far out the minor lines vanish and major cells double up.
        let g = Grid::new(&settings, 1.0 / 16.0);
        assert_eq!(g.minor_size(), 0.0);
        assert_eq!(g.major_size(), 200.0);
        assert_eq!(g.effective_size(), 200.0);
    }

    #[test]
    fn cell_corners_wrap_point() {
        let g = Grid::new(&EditorSettings::default(), 1.0);
        let [a, b, c, d] = g.cell_corners(Vec2::new(-5.0, 45.0));
        assert_eq!(a, Vec2::new(-20.0, 40.0));
        assert_eq!(b, Vec2::new(0.0, 40.0));
        assert_eq!(c, Vec2::new(0.0, 60.0));
        assert_eq!(d, Vec2::new(-20.0, 60.0));
    }

    #[test]
    fn zoom_is_clamped() {
        let settings = EditorSettings::default();
        let mut v = View::new(800.0, 600.0);
        for _ in 0..100 {
            v.zoom_in(&settings);
        }
        assert_eq!(v.scale(), settings.zoom_max);
        assert!(!v.can_zoom_in(&settings));
        assert!(!v.zoom_in(&settings));

        v.reset();
        for _ in 0..100 {
            v.zoom_out(&settings);
        }
        assert_eq!(v.scale(), settings.zoom_min);
        assert!(v.can_zoom_in(&settings));
    }

    #[test]
    fn reversed_zoom_limits_do_not_panic() {
        let settings = EditorSettings {
            zoom_min: 32.0,
            ..EditorSettings::default()
        };
        let mut v = View::new(800.0, 600.0);
        assert!(v.zoom_in(&settings));
        assert_eq!(v.scale(), 16.0);
        assert!(!v.zoom_out(&settings));

        let settings = EditorSettings {
            zoom_min: f32::NAN,
            ..EditorSettings::default()
        };
        v.reset();
        for _ in 0..100 {
            v.zoom_out(&settings);
        }
        assert_eq!(v.scale(), 0.0625);
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let settings = EditorSettings::default();
        let mut v = View::new(800.0, 600.0);
        let anchor = Vec2::new(700.0, 100.0);
        let before = v.canvas_to_map(anchor);
        assert!(v.zoom(2.0, anchor, &settings));
        let after = v.canvas_to_map(anchor);
        assert!((before - after).norm() < 1e-3);
    }

    #[test]
    fn coordinate_round_trip() {
        let mut v = View::new(800.0, 600.0);
        v.set_center(Vec2::new(10.0, -5.0));
        v.set_scale(2.0);
        assert!(!v.set_scale(-1.0));
        assert!(!v.set_scale(f32::NAN));
        assert_eq!(v.map_to_canvas(Vec2::new(10.0, -5.0)), Vec2::new(400.0, 300.0));
        let p = Vec2::new(123.0, 45.0);
        assert!((v.canvas_to_map(v.map_to_canvas(p)) - p).norm() < 1e-4);
    }
}
