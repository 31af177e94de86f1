//! Image preprocessing shared by the service and the training pipeline.
//!
//! Both follow the Keras image loader: convert to RGB, resize with
//! nearest-neighbour sampling, scale to [0, 1]. The tensor layout is CHW
//! because Burn convolutions are channels-first.

use burn::tensor::{backend::Backend, Tensor, TensorData};
use image::imageops::{self, FilterType};
use image::DynamicImage;

use crate::utils::error::{PlantDiseaseError, Result};

/// A decoded, resized and normalized image with a leading batch dimension
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedImage {
    data: Vec<f32>,
    size: usize,
}

impl PreparedImage {
    /// Tensor shape `[1, 3, size, size]`
    pub fn shape(&self) -> [usize; 4] {
        [1, 3, self.size, self.size]
    }

    /// Side length in pixels
    pub fn size(&self) -> usize {
        self.size
    }

    /// Raw CHW values
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Copy into a Burn tensor on `device`
    pub fn to_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 4> {
        Tensor::<B, 4>::from_floats(TensorData::new(self.data.clone(), self.shape()), device)
    }
}

/// Decode uploaded bytes in any format the `image` crate recognizes
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| PlantDiseaseError::InvalidImage(e.to_string()))
}

/// Convert to RGB, resize to `size`×`size` and flatten to CHW in [0, 1]
pub fn image_to_chw(image: &DynamicImage, size: usize) -> Vec<f32> {
    let rgb = image.to_rgb8();
    let resized = imageops::resize(&rgb, size as u32, size as u32, FilterType::Nearest);

    let plane = size * size;
    let mut tensor = vec![0.0f32; 3 * plane];

    // All R values, then all G values, then all B values
    for (i, pixel) in resized.pixels().enumerate() {
        tensor[i] = pixel[0] as f32 / 255.0;
        tensor[plane + i] = pixel[1] as f32 / 255.0;
        tensor[2 * plane + i] = pixel[2] as f32 / 255.0;
    }

    tensor
}

/// Decode, resize, normalize and batch an uploaded image.
///
/// A pure function of `bytes` and `size`.
pub fn prepare_image(bytes: &[u8], size: usize) -> Result<PreparedImage> {
    let image = decode_image(bytes)?;
    Ok(PreparedImage {
        data: image_to_chw(&image, size),
        size,
    })
}
