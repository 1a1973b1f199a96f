use crate::foundation::core::OutputDimensions;

/// A rendered frame as RGBA8 pixels.
///
/// Frames coming out of the compositor are **premultiplied alpha**. The `premultiplied` flag is
/// included to make this explicit at API boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Frame size.
    pub fn dimensions(&self) -> OutputDimensions {
        OutputDimensions::new(self.width, self.height)
    }

    /// RGBA8 value of pixel `(x, y)`. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }
}
