use ndarray::Array3;

/// Camera frame as handed over by the capture side, `(height, width, channel)`.
pub struct Frame {
    pub dims: (u32, u32),
    pub pixels: Array3<u8>,
    pub timestamp: f32, // in seconds
}

impl Frame {
    pub fn new(pixels: Array3<u8>, timestamp: f32) -> Self {
        let (h, w, _) = pixels.dim();

        Self {
            dims: (w as u32, h as u32),
            pixels,
            timestamp,
        }
    }

    /// Frame with no pixel payload, only an extent.
    pub fn blank(width: u32, height: u32, timestamp: f32) -> Self {
        Self {
            dims: (width, height),
            pixels: Array3::zeros((0, 0, 0)),
            timestamp,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.dims.0
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.dims.1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}
