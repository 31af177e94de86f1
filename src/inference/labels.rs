//! Class-index mapping
//!
//! The class-index file is the JSON object written when the served model was
//! trained, mapping each class name to the output unit it owns:
//!
//! ```json
//! {"Tomato___Early_blight": 0, "Tomato___healthy": 1}
//! ```
//!
//! Predictions arrive as indices, so the mapping is inverted once at load time.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tracing::info;

use crate::utils::error::{ensure_exists, PlantDiseaseError, Result};

/// Inverted class-index mapping: output index → class label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassIndex {
    labels: BTreeMap<usize, String>,
}

impl ClassIndex {
    /// Read and invert a class-index JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        ensure_exists(path)?;

        let json = std::fs::read_to_string(path)?;
        let index = Self::from_json(&json)?;
        info!("Loaded {} class labels from {:?}", index.len(), path);
        Ok(index)
    }

    /// Parse and invert a `{name: index}` JSON object
    pub fn from_json(json: &str) -> Result<Self> {
        let forward: HashMap<String, usize> = serde_json::from_str(json)?;
        Self::from_forward(forward)
    }

    /// Invert a name → index mapping; two names sharing an index is an error
    pub fn from_forward<I>(forward: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, usize)>,
    {
        let mut labels = BTreeMap::new();
        for (name, index) in forward {
            if let Some(existing) = labels.insert(index, name.clone()) {
                return Err(PlantDiseaseError::Config(format!(
                    "class index {} is assigned to both '{}' and '{}'",
                    index, existing, name
                )));
            }
        }
        Ok(Self { labels })
    }

    /// Label for an output index
    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(&index).map(String::as_str)
    }

    /// Number of classes, i.e. output units the model must have
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in index order
    pub fn labels(&self) -> impl Iterator<Item = (usize, &str)> {
        self.labels.iter().map(|(i, name)| (*i, name.as_str()))
    }
}
