use super::Vec2;

/// Screen rectangle as `x, y, w, h` in target pixels.
///
/// Shape emitters take `min`/`max` corners; the `*_rect` emitter variants
/// accept this type for hosts that keep widget bounds as origin + size.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { origin: Vec2::new(x, y), size: Vec2::new(w, h) }
    }

    #[inline]
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self { origin: min, size: max - min }
    }

    /// Rectangle of `size` whose center is `center`, e.g. the box around a
    /// `CENTERED` text run measured with `calculate_text_extent`.
    #[inline]
    pub fn centered_at(center: Vec2, size: Vec2) -> Self {
        Self { origin: center - size / 2.0, size }
    }

    #[inline]
    pub fn min(self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        self.origin + self.size
    }

    #[inline]
    pub fn width(self) -> f32 {
        self.size.x
    }

    #[inline]
    pub fn height(self) -> f32 {
        self.size.y
    }

    #[inline]
    pub fn center(self) -> Vec2 {
        self.origin + self.size / 2.0
    }

    /// Grows every side outward by `dx`/`dy`. Negative values shrink.
    #[inline]
    pub fn inflate(self, dx: f32, dy: f32) -> Self {
        Self::new(self.origin.x - dx, self.origin.y - dy, self.size.x + 2.0 * dx, self.size.y + 2.0 * dy)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        !(self.size.x > 0.0 && self.size.y > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_from_origin_and_size() {
        let rect = Rect::new(10.0, 20.0, 50.0, 5.0);
        assert_eq!(rect.max(), Vec2::new(60.0, 25.0));
        assert_eq!(Rect::from_min_max(rect.min(), rect.max()), rect);
    }

    #[test]
    fn centered_box_round_trips_center() {
        let rect = Rect::centered_at(Vec2::new(100.0, 50.0), Vec2::new(40.0, 10.0));
        assert_eq!(rect.min(), Vec2::new(80.0, 45.0));
        assert_eq!(rect.center(), Vec2::new(100.0, 50.0));
    }

    #[test]
    fn inflate_moves_all_sides() {
        let rect = Rect::new(10.0, 10.0, 20.0, 10.0).inflate(4.0, 2.0);
        assert_eq!(rect, Rect::new(6.0, 8.0, 28.0, 14.0));
        assert!(Rect::new(0.0, 0.0, 4.0, 4.0).inflate(-2.0, 0.0).is_empty());
    }

    #[test]
    fn empty_and_nan_sizes() {
        assert!(Rect::new(0.0, 0.0, 0.0, 5.0).is_empty());
        assert!(Rect::new(0.0, 0.0, f32::NAN, 5.0).is_empty());
        assert!(!Rect::new(0.0, 0.0, 1.0, 1.0).is_empty());
    }
}
