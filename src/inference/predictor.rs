//! Inference Predictor Module
//!
//! The [`Classifier`] trait is the boundary between the HTTP layer and the
//! network: it turns a prepared image into one score per class.
//! [`BurnClassifier`] implements it with a [`PlantClassifier`] loaded from a
//! record file.

use std::path::Path;
use std::sync::Mutex;

use burn::module::Module;
use burn::record::CompactRecorder;
use burn::tensor::backend::Backend;
use tracing::{debug, info};

use crate::model::cnn::{PlantClassifier, PlantClassifierConfig};
use crate::utils::error::{ensure_exists, PlantDiseaseError, Result};

use super::preprocess::PreparedImage;

/// Anything that scores a prepared image against every class
pub trait Classifier: Send + Sync {
    /// Class probabilities, one per output index
    fn predict(&self, image: &PreparedImage) -> Result<Vec<f32>>;

    /// Number of output classes
    fn num_classes(&self) -> usize;
}

/// Index of the highest score. Ties go to the lowest index, and a NaN
/// score outranks every number, so the first NaN wins.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            return Some(i);
        }
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i)
}

/// Burn-backed classifier
///
/// Forward passes are serialized through the mutex, so one prediction
/// completes before the next starts.
pub struct BurnClassifier<B: Backend> {
    model: Mutex<PlantClassifier<B>>,
    device: B::Device,
    num_classes: usize,
}

impl<B: Backend> BurnClassifier<B> {
    /// Wrap an already built model
    pub fn from_model(model: PlantClassifier<B>, device: B::Device) -> Self {
        let num_classes = model.num_classes();
        Self {
            model: Mutex::new(model),
            device,
            num_classes,
        }
    }

    /// Build a model for `num_classes` outputs and load its weights
    pub fn load<P: AsRef<Path>>(path: P, num_classes: usize, device: B::Device) -> Result<Self> {
        let path = path.as_ref();
        ensure_exists(path)?;

        info!("Loading model from {:?} ({} classes)", path, num_classes);
        let config = PlantClassifierConfig::new(num_classes);
        let model = PlantClassifier::<B>::new(&config, &device)
            .load_file(path, &CompactRecorder::new(), &device)
            .map_err(|e| {
                PlantDiseaseError::Model(format!("failed to load weights from {:?}: {}", path, e))
            })?;

        Ok(Self::from_model(model, device))
    }
}

impl<B: Backend> Classifier for BurnClassifier<B> {
    fn predict(&self, image: &PreparedImage) -> Result<Vec<f32>> {
        let model = self
            .model
            .lock()
            .map_err(|_| PlantDiseaseError::Inference("classifier lock poisoned".to_string()))?;

        let input = image.to_tensor::<B>(&self.device);
        let probabilities = model
            .forward_softmax(input)
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| PlantDiseaseError::Inference(format!("{:?}", e)))?;

        debug!("Class probabilities: {:?}", probabilities);
        Ok(probabilities)
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }
}
