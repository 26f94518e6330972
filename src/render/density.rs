//! Density overlay buffer and its colour map.

/// Colour of an inactive cell (fully transparent).
pub const CLEAR_COLOR: u32 = 0x0000_0000;

/// Translucent red base every active cell is drawn with.
const DENSITY_BASE_COLOR: u32 = 0xAAFF_0000;

/// Linear colour map between the simulator's density thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityThresholds {
    /// Drawn faintest at or below this density.
    pub min: f64,
    /// Drawn reddest at or above this density.
    pub max: f64,
}

impl DensityThresholds {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// ARGB colour for a density sample.
    ///
    /// The sample is clamped to `[min, max]`; the green and blue channels fade
    /// from 255 at `min` to 0 at `max`, so denser cells look redder. When the
    /// thresholds leave no range every sample is drawn at full intensity.
    pub fn color(&self, density: f64) -> u32 {
        let range = self.max - self.min;
        let white = if range > 0.0 {
            let level = density.clamp(self.min, self.max) - self.min;
            (255.0 - (level * 255.0 / range).floor()).clamp(0.0, 255.0) as u32
        } else {
            0
        };
        DENSITY_BASE_COLOR | (white << 8) | white
    }
}

/// Per-pixel density colours covering the whole scene.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl DensityGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![CLEAR_COLOR; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self) {
        self.pixels.fill(CLEAR_COLOR);
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Set one cell; returns `false` when `(x, y)` is outside the grid.
    pub fn set(&mut self, x: i32, y: i32, color: u32) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.pixels[i] = color;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, x: i32, y: i32) -> Option<u32> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Row-major ARGB pixels.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn active_cells(&self) -> usize {
        self.pixels.iter().filter(|&&p| p != CLEAR_COLOR).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_map_endpoints() {
        let t = DensityThresholds::new(1.0, 3.0);
        assert_eq!(t.color(1.0), 0xAAFF_FFFF);
        assert_eq!(t.color(3.0), 0xAAFF_0000);
        // Halfway: 255 - floor(127.5) = 128
        assert_eq!(t.color(2.0), 0xAAFF_8080);
    }

    #[test]
    fn test_color_map_clamps() {
        let t = DensityThresholds::new(1.0, 3.0);
        assert_eq!(t.color(0.0), t.color(1.0));
        assert_eq!(t.color(100.0), t.color(3.0));
        assert_eq!(t.color(f64::INFINITY), t.color(3.0));
    }

    #[test]
    fn test_degenerate_thresholds_saturate() {
        let t = DensityThresholds::new(2.0, 2.0);
        assert_eq!(t.color(0.0), 0xAAFF_0000);
        assert_eq!(t.color(5.0), 0xAAFF_0000);
    }

    #[test]
    fn test_grid_bounds() {
        let mut grid = DensityGrid::new(4, 3);
        assert!(grid.set(0, 0, 1));
        assert!(grid.set(3, 2, 2));
        assert!(!grid.set(4, 0, 3));
        assert!(!grid.set(0, 3, 3));
        assert!(!grid.set(-1, 0, 3));
        assert_eq!(grid.get(3, 2), Some(2));
        assert_eq!(grid.get(4, 2), None);
        assert_eq!(grid.active_cells(), 2);
        assert_eq!(grid.pixels()[3 + 2 * 4], 2);
    }

    #[test]
    fn test_grid_clear() {
        let mut grid = DensityGrid::new(2, 2);
        grid.set(1, 1, 0xAAFF_0000);
        grid.clear();
        assert_eq!(grid.active_cells(), 0);
        assert!(grid.pixels().iter().all(|&p| p == CLEAR_COLOR));
    }
}
