//! Service context shared by every request handler
//!
//! Built once at startup and never mutated afterwards.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backend::{default_device, InferenceBackend};
use crate::inference::{
    argmax, prepare_image, BurnClassifier, ClassIndex, Classifier, DiseaseInfoTable,
};
use crate::utils::error::{PlantDiseaseError, Result};

use super::config::ServerConfig;

/// Body of a successful `POST /predict`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: String,
    pub advice: String,
}

/// Classifier, label mapping and disease table
pub struct ServiceContext {
    classifier: Arc<dyn Classifier>,
    class_index: ClassIndex,
    disease_info: DiseaseInfoTable,
    image_size: usize,
    started_at: Instant,
}

impl ServiceContext {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        class_index: ClassIndex,
        disease_info: DiseaseInfoTable,
        image_size: usize,
    ) -> Self {
        Self {
            classifier,
            class_index,
            disease_info,
            image_size,
            started_at: Instant::now(),
        }
    }

    /// Load every startup artifact named by `config`; any missing file is an error
    pub fn load(config: &ServerConfig) -> Result<Self> {
        config.validate().map_err(PlantDiseaseError::Config)?;

        let class_index = ClassIndex::load(&config.class_indices_path)?;
        if class_index.is_empty() {
            return Err(PlantDiseaseError::Config(format!(
                "class index {:?} has no entries",
                config.class_indices_path
            )));
        }

        let classifier = BurnClassifier::<InferenceBackend>::load(
            &config.model_path,
            class_index.len(),
            default_device(),
        )?;

        let disease_info = match &config.disease_info_path {
            Some(path) => DiseaseInfoTable::load(path)?,
            None => DiseaseInfoTable::builtin(),
        };
        info!("Disease table has {} entries", disease_info.len());

        Ok(Self::new(
            Arc::new(classifier),
            class_index,
            disease_info,
            config.image_size,
        ))
    }

    /// Prepare, classify and describe one uploaded image
    pub fn predict(&self, bytes: &[u8]) -> Result<PredictionResponse> {
        let image = prepare_image(bytes, self.image_size)?;
        let scores = self.classifier.predict(&image)?;

        let index = argmax(&scores).ok_or_else(|| {
            PlantDiseaseError::Inference("classifier returned no scores".to_string())
        })?;
        let label = self.class_index.label(index).ok_or_else(|| {
            PlantDiseaseError::Inference(format!("no label for class index {}", index))
        })?;

        let info = self.disease_info.lookup(label);
        info!("Predicted '{}' (class {})", label, index);

        Ok(PredictionResponse {
            prediction: info.name,
            advice: info.advice,
        })
    }

    pub fn num_classes(&self) -> usize {
        self.class_index.len()
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

pub type SharedState = Arc<ServiceContext>;

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::inference::{DiseaseInfo, PreparedImage};
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    /// Returns the same scores for every image
    pub(crate) struct FixedClassifier(pub Vec<f32>);

    impl Classifier for FixedClassifier {
        fn predict(&self, image: &PreparedImage) -> Result<Vec<f32>> {
            assert_eq!(image.shape(), [1, 3, 160, 160]);
            Ok(self.0.clone())
        }

        fn num_classes(&self) -> usize {
            self.0.len()
        }
    }

    pub(crate) fn context(scores: Vec<f32>) -> ServiceContext {
        let class_index = ClassIndex::from_json(r#"{"healthy": 0, "rust": 1}"#).unwrap();
        let table = DiseaseInfoTable::from_entries([(
            "rust".to_string(),
            DiseaseInfo::new("Leaf Rust", "Remove infected leaves and apply a fungicide."),
        )]);
        ServiceContext::new(Arc::new(FixedClassifier(scores)), class_index, table, 160)
    }

    pub(crate) fn leaf_png() -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 48, Rgb([40, 150, 30])))
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_predict_known_label() {
        let response = context(vec![0.2, 0.8]).predict(&leaf_png()).unwrap();
        assert_eq!(response.prediction, "Leaf Rust");
        assert_eq!(response.advice, "Remove infected leaves and apply a fungicide.");
    }

    #[test]
    fn test_predict_label_without_info() {
        let response = context(vec![0.9, 0.1]).predict(&leaf_png()).unwrap();
        assert_eq!(
            response,
            PredictionResponse {
                prediction: "healthy".to_string(),
                advice: "No advice available for this disease.".to_string(),
            }
        );
    }

    #[test]
    fn test_predict_index_without_label() {
        let err = context(vec![0.1, 0.2, 0.7]).predict(&leaf_png()).unwrap_err();
        assert!(matches!(err, PlantDiseaseError::Inference(_)));
    }

    #[test]
    fn test_predict_invalid_image() {
        let err = context(vec![0.5, 0.5]).predict(b"GIF89a but not really").unwrap_err();
        assert!(matches!(err, PlantDiseaseError::InvalidImage(_)));
    }

    #[test]
    fn test_load_missing_class_index() {
        let config = ServerConfig {
            class_indices_path: "/no/such/class_indices.json".into(),
            ..Default::default()
        };
        assert!(matches!(
            ServiceContext::load(&config),
            Err(PlantDiseaseError::PathNotFound(_))
        ));
    }
}
