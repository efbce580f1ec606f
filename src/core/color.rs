//! RGBA color values with normalized float components.
//!
//! Per-instance color attributes travel to the GPU as packed bytes; the
//! packed little-endian `u32` form doubles as a batch grouping key.

/// A color with red, green, blue and alpha components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub alpha: f32,
}

impl Color {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const RED: Self = Self::new(1.0, 0.0, 0.0, 1.0);
    /// CSS green, `#008000`.
    pub const GREEN: Self = Self::new(0.0, 128.0 / 255.0, 0.0, 1.0);
    pub const BLUE: Self = Self::new(0.0, 0.0, 1.0, 1.0);
    pub const YELLOW: Self = Self::new(1.0, 1.0, 0.0, 1.0);

    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Returns this color with a different alpha component.
    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }

    /// Converts to `[r, g, b, a]` bytes, rounding each component.
    #[must_use]
    pub fn to_bytes(self) -> [u8; 4] {
        let quantize = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [
            quantize(self.red),
            quantize(self.green),
            quantize(self.blue),
            quantize(self.alpha),
        ]
    }

    /// Packs the byte form into a little-endian `u32` (`r` in the low byte).
    #[must_use]
    pub fn to_packed(self) -> u32 {
        u32::from_le_bytes(self.to_bytes())
    }

    /// True when the alpha byte is below 255.
    #[must_use]
    pub fn is_translucent(self) -> bool {
        self.to_bytes()[3] < 255
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_bytes_rounds_components() {
        assert_eq!(Color::RED.to_bytes(), [255, 0, 0, 255]);
        assert_eq!(Color::GREEN.to_bytes(), [0, 128, 0, 255]);
    }

    #[test]
    fn packed_is_little_endian() {
        assert_eq!(Color::RED.to_packed(), 0xFF00_00FF);
        assert_eq!(Color::new(0.0, 0.0, 0.0, 0.0).to_packed(), 0);
    }

    #[test]
    fn with_alpha_marks_translucent() {
        assert!(!Color::RED.is_translucent());
        assert!(Color::RED.with_alpha(0.5).is_translucent());
    }
}
