//! Supervised Training Implementation
//!
//! A hand-written fit loop over Burn's autodiff API: shuffle, batch, forward,
//! binary cross-entropy, Adam step, then a validation pass on the inner
//! backend at the end of every epoch.

use std::path::{Path, PathBuf};
use std::time::Instant;

use burn::{
    data::{dataloader::batcher::Batcher, dataset::Dataset},
    module::{AutodiffModule, Module},
    nn::loss::BinaryCrossEntropyLossConfig,
    optim::{AdamConfig, GradientsParams, Optimizer},
    record::CompactRecorder,
    tensor::{
        backend::{AutodiffBackend, Backend},
        ElementConversion, Int, Tensor,
    },
};
use indicatif::{ProgressBar, ProgressStyle};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::dataset::{ImageFolder, LeafBatcher, LeafImageDataset};
use crate::model::cnn::BinaryLeafClassifier;
use crate::model::config::TrainingConfig;
use crate::model::MODEL_EXTENSION;
use crate::utils::error::{PlantDiseaseError, Result};
use crate::utils::logging::TrainingLogger;

/// Metrics recorded at the end of one epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// One-based epoch number
    pub epoch: usize,
    /// Mean training loss over samples
    pub loss: f64,
    /// Training accuracy in [0, 1]
    pub accuracy: f64,
    /// Validation loss, absent when the validation subset is empty
    pub val_loss: Option<f64>,
    /// Validation accuracy, absent when the validation subset is empty
    pub val_accuracy: Option<f64>,
}

/// Outcome of a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Class directory names; index 0 is the negative class
    pub class_names: Vec<String>,
    pub num_training: usize,
    pub num_validation: usize,
    pub history: Vec<EpochMetrics>,
    /// Path of the written weights
    pub model_path: PathBuf,
    /// Size of the written weights in bytes
    pub model_bytes: u64,
    pub duration_secs: f64,
}

impl TrainingReport {
    /// Metrics of the last epoch
    pub fn final_metrics(&self) -> Option<&EpochMetrics> {
        self.history.last()
    }
}

/// Train the binary leaf classifier and write it to `config.output_path`
///
/// # Type Parameters
/// * `B` - The autodiff backend to use (e.g., `Autodiff<NdArray>` or `Autodiff<Cuda>`)
///
/// Fails when the data directory has no class subdirectories, no images, or
/// more than two classes.
pub fn run_training<B>(config: &TrainingConfig) -> Result<TrainingReport>
where
    B: AutodiffBackend,
{
    config.validate().map_err(PlantDiseaseError::Config)?;
    let start = Instant::now();

    let device = B::Device::default();
    info!("Training on device {:?}", device);

    let folder = ImageFolder::scan(&config.data_dir)?;
    if folder.num_classes() == 0 {
        return Err(PlantDiseaseError::Dataset(format!(
            "no class subdirectories in {}",
            config.data_dir
        )));
    }
    if folder.num_classes() > 2 {
        return Err(PlantDiseaseError::Dataset(format!(
            "binary training needs at most 2 classes, found {}: {:?}",
            folder.num_classes(),
            folder.class_names
        )));
    }
    if folder.is_empty() {
        return Err(PlantDiseaseError::Dataset(format!(
            "no images found in {}",
            config.data_dir
        )));
    }
    if folder.num_classes() == 1 {
        warn!(
            "Only one class ('{}') found; every target will be 0",
            folder.class_names[0]
        );
    }

    let split = folder.split(config.validation_split)?;
    info!(
        "Using {} images for training, {} for validation",
        split.training.len(),
        split.validation.len()
    );

    info!("Loading training images...");
    let train_dataset = LeafImageDataset::load(&split.training, config.image_size)?;
    info!("Loading validation images...");
    let val_dataset = LeafImageDataset::load(&split.validation, config.image_size)?;

    let batcher = LeafBatcher::<B>::new(config.image_size);
    let mut model = BinaryLeafClassifier::<B>::new(&config.model_config(), &device);
    let mut optimizer = AdamConfig::new().init();
    let loss_fn = BinaryCrossEntropyLossConfig::new()
        .with_logits(true)
        .init(&device);

    let mut logger = TrainingLogger::new(config.epochs);
    let mut history = Vec::with_capacity(config.epochs);
    let mut epoch_rng = ChaCha8Rng::seed_from_u64(config.seed);

    for epoch in 0..config.epochs {
        logger.start_epoch(epoch);

        let mut indices: Vec<usize> = (0..train_dataset.len()).collect();
        indices.shuffle(&mut epoch_rng);

        let num_batches = indices.len().div_ceil(config.batch_size);
        let pb = batch_progress_bar(num_batches)?;

        let mut loss_sum = 0.0f64;
        let mut correct = 0usize;
        let mut seen = 0usize;

        for batch_indices in indices.chunks(config.batch_size) {
            let items: Vec<_> = batch_indices
                .iter()
                .filter_map(|&i| train_dataset.get(i))
                .collect();
            if items.is_empty() {
                continue;
            }
            let batch = batcher.batch(items, &device);
            let batch_size = batch_indices.len();

            let logits = model.forward(batch.images);
            let loss = loss_fn.forward(logits.clone(), batch.targets.clone());

            let loss_value: f64 = loss.clone().into_scalar().elem();
            loss_sum += loss_value * batch_size as f64;
            correct += count_correct(logits, batch.targets);
            seen += batch_size;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optimizer.step(config.learning_rate, model, grads);

            pb.set_message(format!(
                "loss: {:.4} - accuracy: {:.4}",
                loss_sum / seen as f64,
                correct as f64 / seen as f64
            ));
            pb.inc(1);
        }
        pb.finish_and_clear();

        let loss = loss_sum / seen.max(1) as f64;
        let accuracy = correct as f64 / seen.max(1) as f64;
        let validation = evaluate::<B>(&model, &val_dataset, config.batch_size);

        let metrics = EpochMetrics {
            epoch: epoch + 1,
            loss,
            accuracy,
            val_loss: validation.map(|(l, _)| l),
            val_accuracy: validation.map(|(_, a)| a),
        };
        logger.end_epoch(
            metrics.loss,
            metrics.accuracy,
            metrics.val_loss,
            metrics.val_accuracy,
        );
        history.push(metrics);
    }
    logger.log_complete();

    let model_path = save_model(model, Path::new(&config.output_path))?;
    let model_bytes = std::fs::metadata(&model_path)?.len();
    if model_bytes == 0 {
        return Err(PlantDiseaseError::Training(format!(
            "model file {:?} is empty",
            model_path
        )));
    }
    info!("Saved model to {:?} ({} bytes)", model_path, model_bytes);

    Ok(TrainingReport {
        class_names: folder.class_names.clone(),
        num_training: split.training.len(),
        num_validation: split.validation.len(),
        history,
        model_path,
        model_bytes,
        duration_secs: start.elapsed().as_secs_f64(),
    })
}

/// Number of samples whose logit lands on the target's side of zero
fn count_correct<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 2, Int>) -> usize {
    let predictions = logits.greater_elem(0.0).int();
    let batch_correct: i64 = predictions
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem();
    batch_correct as usize
}

/// Loss and accuracy over a dataset without dropout or gradients
fn evaluate<B: AutodiffBackend>(
    model: &BinaryLeafClassifier<B>,
    dataset: &LeafImageDataset,
    batch_size: usize,
) -> Option<(f64, f64)> {
    let len = dataset.len();
    if len == 0 {
        return None;
    }

    let device = <B::InnerBackend as Backend>::Device::default();
    let batcher = LeafBatcher::<B::InnerBackend>::new(dataset.image_size());
    let loss_fn = BinaryCrossEntropyLossConfig::new()
        .with_logits(true)
        .init(&device);
    let inner_model = model.clone().valid();

    let mut loss_sum = 0.0f64;
    let mut correct = 0usize;

    for start in (0..len).step_by(batch_size) {
        let end = (start + batch_size).min(len);
        let items: Vec<_> = (start..end).filter_map(|i| dataset.get(i)).collect();

        let batch = batcher.batch(items, &device);
        let logits = inner_model.forward(batch.images);
        let loss: f64 = loss_fn
            .forward(logits.clone(), batch.targets.clone())
            .into_scalar()
            .elem();

        loss_sum += loss * (end - start) as f64;
        correct += count_correct(logits, batch.targets);
    }

    Some((loss_sum / len as f64, correct as f64 / len as f64))
}

/// Write weights with `CompactRecorder`, creating parent directories
fn save_model<B: Backend>(model: BinaryLeafClassifier<B>, path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    model
        .save_file(path, &CompactRecorder::new())
        .map_err(|e| PlantDiseaseError::Model(format!("failed to save model: {:?}", e)))?;

    // The recorder replaces whatever extension the path had
    Ok(path.with_extension(MODEL_EXTENSION))
}

fn batch_progress_bar(num_batches: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(num_batches as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .map_err(|e| PlantDiseaseError::Config(e.to_string()))?
            .progress_chars("=>-"),
    );
    Ok(pb)
}
