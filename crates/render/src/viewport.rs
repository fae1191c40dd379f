/// A pixel rectangle of the render target. Origin is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Width over height; 1.0 for a degenerate rectangle.
    pub fn aspect(&self) -> f32 {
        if self.width == 0 || self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }
}

/// Split a target into left and right halves that tile it exactly.
/// An odd width gives the extra column to the right half.
pub fn split_horizontal(width: u32, height: u32) -> [Viewport; 2] {
    let left = width / 2;
    [
        Viewport::new(0, 0, left, height),
        Viewport::new(left, 0, width - left, height),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halves_tile_the_target() {
        for width in [1u32, 2, 639, 640, 1281] {
            let [left, right] = split_horizontal(width, 720);
            assert_eq!(left.width + right.width, width);
            assert_eq!(left.x + left.width, right.x);
            for px in 0..width {
                assert!(left.contains(px, 0) ^ right.contains(px, 0), "column {px}");
            }
        }
    }

    #[test]
    fn half_aspect_uses_full_height() {
        let [left, right] = split_horizontal(1280, 720);
        assert!((left.aspect() - 640.0 / 720.0).abs() < 1e-6);
        assert_eq!(left.aspect(), right.aspect());
        assert_eq!(Viewport::new(0, 0, 0, 10).aspect(), 1.0);
    }
}
