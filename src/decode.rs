use crate::error::DetectError;
use image::io::Reader as ImageReader;
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgb,
    Bgr,
}

/// Packed 8-bit, 3-channel pixels.
#[derive(Debug, Clone)]
pub struct Frame {
    width: u32,
    height: u32,
    order: ChannelOrder,
    data: Vec<u8>,
}

impl Frame {
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Pixel at `(x, y)` in the frame's own channel order.
    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }
}

/// Decodes an uploaded image, whatever its container format, into pixels
/// laid out the way the OCR engine expects.
pub fn decode(bytes: &[u8], order: ChannelOrder) -> Result<Frame, DetectError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DetectError::InvalidImage(e.to_string()))?;
    let image = reader
        .decode()
        .map_err(|e| DetectError::InvalidImage(e.to_string()))?;
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let mut data = rgb.into_raw();
    if order == ChannelOrder::Bgr {
        for px in data.chunks_exact_mut(3) {
            px.swap(0, 2);
        }
    }
    Ok(Frame {
        width,
        height,
        order,
        data,
    })
}
