//! Image preprocessing for the issue photo classifier
//!
//! Decode → RGB → exact square resize → scale to [0, 1] → per-channel
//! mean/std normalization → NCHW `f32` tensor with batch size 1.

use image::imageops::{self, FilterType};
use image::RgbImage;
use thiserror::Error;

/// Per-channel mean (RGB) the model was trained with
pub const CHANNEL_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Per-channel standard deviation (RGB) the model was trained with
pub const CHANNEL_STD: [f32; 3] = [0.229, 0.224, 0.225];

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("input size must be greater than zero")]
    InvalidSize,
}

/// Normalized image ready for inference, laid out `[1, 3, height, width]`
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    data: Vec<f32>,
    height: usize,
    width: usize,
}

impl ImageTensor {
    pub fn shape(&self) -> [usize; 4] {
        [1, 3, self.height, self.width]
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Value at channel `c`, row `y`, column `x`
    pub fn get(&self, c: usize, y: usize, x: usize) -> f32 {
        self.data[(c * self.height + y) * self.width + x]
    }
}

/// Decode uploaded bytes (format sniffed from content) into RGB8
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, PreprocessError> {
    Ok(image::load_from_memory(bytes)?.to_rgb8())
}

/// Resize to `size × size` and normalize into an [`ImageTensor`]
pub fn to_tensor(rgb: &RgbImage, size: u32) -> Result<ImageTensor, PreprocessError> {
    if size == 0 {
        return Err(PreprocessError::InvalidSize);
    }

    let resized = if rgb.dimensions() == (size, size) {
        rgb.clone()
    } else {
        imageops::resize(rgb, size, size, FilterType::Triangle)
    };

    let side = size as usize;
    let plane = side * side;
    let mut data = vec![0.0f32; 3 * plane];
    for (x, y, pixel) in resized.enumerate_pixels() {
        let offset = y as usize * side + x as usize;
        for c in 0..3 {
            let value = pixel[c] as f32 / 255.0;
            data[c * plane + offset] = (value - CHANNEL_MEAN[c]) / CHANNEL_STD[c];
        }
    }

    Ok(ImageTensor {
        data,
        height: side,
        width: side,
    })
}

/// Full pipeline from uploaded bytes to model input
pub fn preprocess(bytes: &[u8], size: u32) -> Result<ImageTensor, PreprocessError> {
    let rgb = decode_rgb(bytes)?;
    to_tensor(&rgb, size)
}
