use super::SurfaceSize;

/// Pixel rectangle the graphics context maps its drawing coordinates onto.
///
/// Mirrors the arguments of a GL-style `viewport(x, y, width, height)` call.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ViewportRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ViewportRect {
    #[inline]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Viewport covering the whole surface: `(0, 0, width, height)`.
    #[inline]
    pub const fn covering(size: SurfaceSize) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    #[inline]
    pub fn size(self) -> SurfaceSize {
        SurfaceSize::new(self.width, self.height)
    }
}
