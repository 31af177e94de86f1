//! Burn Dataset Integration
//!
//! Implements Burn's `Dataset` and `Batcher` traits for the binary leaf
//! training pipeline.

use std::marker::PhantomData;
use std::path::Path;

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;
use image::ImageReader;
use indicatif::{ProgressBar, ProgressStyle};

use crate::inference::preprocess::image_to_chw;
use crate::utils::error::{PlantDiseaseError, Result};

use super::loader::ImageSample;

/// A single training item ready for Burn
#[derive(Clone, Debug)]
pub struct LeafImageItem {
    /// Image data as flattened CHW float array [3 * H * W] in [0, 1]
    pub image: Vec<f32>,
    /// Class label
    pub label: usize,
    /// Image path (for logging)
    pub path: String,
}

impl LeafImageItem {
    /// Load, resize and normalize an image from disk
    pub fn from_path(path: &Path, label: usize, image_size: usize) -> Result<Self> {
        let img = ImageReader::open(path)
            .map_err(|e| PlantDiseaseError::ImageLoad(path.to_path_buf(), e.to_string()))?
            .with_guessed_format()
            .map_err(|e| PlantDiseaseError::ImageLoad(path.to_path_buf(), e.to_string()))?
            .decode()
            .map_err(|e| PlantDiseaseError::ImageLoad(path.to_path_buf(), e.to_string()))?;

        Ok(Self {
            image: image_to_chw(&img, image_size),
            label,
            path: path.to_string_lossy().to_string(),
        })
    }

    /// Create from pre-loaded image data
    pub fn from_data(image: Vec<f32>, label: usize, path: String) -> Self {
        Self { image, label, path }
    }
}

/// In-memory dataset of decoded leaf images
#[derive(Debug, Clone)]
pub struct LeafImageDataset {
    items: Vec<LeafImageItem>,
    image_size: usize,
}

impl LeafImageDataset {
    /// Decode every sample up front; any unreadable file is an error
    pub fn load(samples: &[ImageSample], image_size: usize) -> Result<Self> {
        let pb = ProgressBar::new(samples.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} images")
                .map_err(|e| PlantDiseaseError::Config(e.to_string()))?
                .progress_chars("#>-"),
        );

        let mut items = Vec::with_capacity(samples.len());
        for sample in samples {
            items.push(LeafImageItem::from_path(&sample.path, sample.label, image_size)?);
            pb.inc(1);
        }
        pb.finish_and_clear();

        Ok(Self { items, image_size })
    }

    /// Build from already decoded items
    pub fn from_items(items: Vec<LeafImageItem>, image_size: usize) -> Self {
        Self { items, image_size }
    }

    /// Side length of every image
    pub fn image_size(&self) -> usize {
        self.image_size
    }
}

impl Dataset<LeafImageItem> for LeafImageDataset {
    fn get(&self, index: usize) -> Option<LeafImageItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// A batch of images with binary targets
#[derive(Clone, Debug)]
pub struct LeafBatch<B: Backend> {
    /// Images with shape [batch_size, 3, height, width]
    pub images: Tensor<B, 4>,
    /// Labels with shape [batch_size, 1]
    pub targets: Tensor<B, 2, Int>,
}

/// Batcher for the binary training pipeline
#[derive(Clone, Debug)]
pub struct LeafBatcher<B: Backend> {
    image_size: usize,
    _backend: PhantomData<B>,
}

impl<B: Backend> LeafBatcher<B> {
    pub fn new(image_size: usize) -> Self {
        Self {
            image_size,
            _backend: PhantomData,
        }
    }
}

impl<B: Backend> Batcher<B, LeafImageItem, LeafBatch<B>> for LeafBatcher<B> {
    fn batch(&self, items: Vec<LeafImageItem>, device: &B::Device) -> LeafBatch<B> {
        let batch_size = items.len();

        let images_data: Vec<f32> = items.iter().flat_map(|item| item.image.iter().copied()).collect();
        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(images_data, [batch_size, 3, self.image_size, self.image_size]),
            device,
        );

        let targets_data: Vec<i64> = items.iter().map(|item| item.label as i64).collect();
        let targets =
            Tensor::<B, 2, Int>::from_data(TensorData::new(targets_data, [batch_size, 1]), device);

        LeafBatch { images, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use image::{Rgb, RgbImage};

    type TestBackend = NdArray;

    #[test]
    fn test_item_from_data() {
        let item = LeafImageItem::from_data(vec![0.5f32; 3 * 8 * 8], 1, "leaf.jpg".to_string());
        assert_eq!(item.label, 1);
        assert_eq!(item.image.len(), 3 * 8 * 8);
    }

    #[test]
    fn test_item_from_path_resizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leaf.png");
        RgbImage::from_pixel(40, 30, Rgb([0, 255, 0])).save(&path).unwrap();

        let item = LeafImageItem::from_path(&path, 0, 12).unwrap();
        assert_eq!(item.image.len(), 3 * 12 * 12);
        assert!(item.image[144..288].iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_item_from_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not really a jpeg").unwrap();

        let err = LeafImageItem::from_path(&path, 0, 12).unwrap_err();
        assert!(matches!(err, PlantDiseaseError::ImageLoad(_, _)));
    }

    #[test]
    fn test_batcher_shapes() {
        let items = vec![
            LeafImageItem::from_data(vec![0.0; 3 * 10 * 10], 0, "a.jpg".to_string()),
            LeafImageItem::from_data(vec![1.0; 3 * 10 * 10], 1, "b.jpg".to_string()),
            LeafImageItem::from_data(vec![0.5; 3 * 10 * 10], 1, "c.jpg".to_string()),
        ];

        let device = Default::default();
        let batch: LeafBatch<TestBackend> = LeafBatcher::new(10).batch(items, &device);

        assert_eq!(batch.images.dims(), [3, 3, 10, 10]);
        assert_eq!(batch.targets.dims(), [3, 1]);
        let targets: Vec<i64> = batch.targets.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(targets, vec![0, 1, 1]);
    }

    #[test]
    fn test_dataset_get() {
        let dataset = LeafImageDataset::from_items(
            vec![LeafImageItem::from_data(vec![0.0; 3], 1, "x.jpg".to_string())],
            1,
        );
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.get(0).unwrap().label, 1);
        assert!(dataset.get(1).is_none());
    }
}
