//! Disease name and advice lookup
//!
//! Maps a predicted class label to the text shown to the user. Labels missing
//! from the table resolve to a placeholder record instead of an error.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::utils::error::{ensure_exists, Result};

/// Advice returned for labels the table does not know
pub const NO_ADVICE: &str = "No advice available for this disease.";

/// User-facing description of a class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseInfo {
    /// Display name
    pub name: String,
    /// Treatment or care advice
    pub advice: String,
}

impl DiseaseInfo {
    pub fn new(name: impl Into<String>, advice: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            advice: advice.into(),
        }
    }

    /// Placeholder for a label with no entry
    pub fn unknown(label: &str) -> Self {
        Self::new(label, NO_ADVICE)
    }
}

/// (label, display name, advice) for the PlantVillage classes
const BUILTIN_ENTRIES: &[(&str, &str, &str)] = &[
    (
        "Apple___Apple_scab",
        "Apple Scab",
        "Remove fallen leaves, prune for airflow and apply a fungicide such as captan early in the season.",
    ),
    (
        "Apple___Black_rot",
        "Apple Black Rot",
        "Prune out cankers and mummified fruit, and spray a fungicide from bloom through summer.",
    ),
    (
        "Apple___Cedar_apple_rust",
        "Cedar Apple Rust",
        "Remove nearby juniper hosts where possible and apply a protective fungicide in spring.",
    ),
    (
        "Apple___healthy",
        "Healthy Apple",
        "Your apple plant looks healthy. Keep up regular watering and pruning.",
    ),
    (
        "Blueberry___healthy",
        "Healthy Blueberry",
        "Your blueberry plant looks healthy. Keep the soil acidic and well mulched.",
    ),
    (
        "Cherry_(including_sour)___Powdery_mildew",
        "Cherry Powdery Mildew",
        "Improve air circulation, avoid overhead watering and apply sulfur or another labeled fungicide.",
    ),
    (
        "Cherry_(including_sour)___healthy",
        "Healthy Cherry",
        "Your cherry plant looks healthy. Continue routine care.",
    ),
    (
        "Corn_(maize)___Cercospora_leaf_spot Gray_leaf_spot",
        "Corn Gray Leaf Spot",
        "Rotate crops, till under residue and plant resistant hybrids. Fungicide may be needed in humid weather.",
    ),
    (
        "Corn_(maize)___Common_rust_",
        "Corn Common Rust",
        "Plant resistant hybrids and apply a fungicide if pustules appear early on young plants.",
    ),
    (
        "Corn_(maize)___Northern_Leaf_Blight",
        "Corn Northern Leaf Blight",
        "Use resistant varieties, rotate crops and manage residue. Apply fungicide at first signs on upper leaves.",
    ),
    (
        "Corn_(maize)___healthy",
        "Healthy Corn",
        "Your corn looks healthy. Maintain balanced fertilization.",
    ),
    (
        "Grape___Black_rot",
        "Grape Black Rot",
        "Remove mummified berries and infected canes, and spray fungicide from bud break until fruit set.",
    ),
    (
        "Grape___Esca_(Black_Measles)",
        "Grape Esca (Black Measles)",
        "Prune out infected wood in dry weather and protect pruning wounds. There is no curative spray.",
    ),
    (
        "Grape___Leaf_blight_(Isariopsis_Leaf_Spot)",
        "Grape Leaf Blight",
        "Remove infected leaves, improve canopy airflow and apply a copper-based fungicide.",
    ),
    (
        "Grape___healthy",
        "Healthy Grape",
        "Your grapevine looks healthy. Keep the canopy open and well ventilated.",
    ),
    (
        "Orange___Haunglongbing_(Citrus_greening)",
        "Citrus Greening",
        "There is no cure. Remove infected trees and control Asian citrus psyllids to protect nearby plants.",
    ),
    (
        "Peach___Bacterial_spot",
        "Peach Bacterial Spot",
        "Plant resistant cultivars and apply copper sprays during dormancy and early season.",
    ),
    (
        "Peach___healthy",
        "Healthy Peach",
        "Your peach tree looks healthy. Continue regular pruning and feeding.",
    ),
    (
        "Pepper,_bell___Bacterial_spot",
        "Bell Pepper Bacterial Spot",
        "Use disease-free seed, avoid overhead irrigation and apply copper-based bactericides.",
    ),
    (
        "Pepper,_bell___healthy",
        "Healthy Bell Pepper",
        "Your pepper plant looks healthy. Water consistently at the base.",
    ),
    (
        "Potato___Early_blight",
        "Potato Early Blight",
        "Remove infected foliage, rotate crops and apply chlorothalonil or a copper fungicide.",
    ),
    (
        "Potato___Late_blight",
        "Potato Late Blight",
        "Destroy infected plants immediately and apply a protective fungicide to the rest of the crop.",
    ),
    (
        "Potato___healthy",
        "Healthy Potato",
        "Your potato plant looks healthy. Hill the soil and keep foliage dry.",
    ),
    (
        "Raspberry___healthy",
        "Healthy Raspberry",
        "Your raspberry plant looks healthy. Thin canes to keep airflow good.",
    ),
    (
        "Soybean___healthy",
        "Healthy Soybean",
        "Your soybean looks healthy. Continue monitoring for pests.",
    ),
    (
        "Squash___Powdery_mildew",
        "Squash Powdery Mildew",
        "Remove badly infected leaves and spray with sulfur, potassium bicarbonate or neem oil.",
    ),
    (
        "Strawberry___Leaf_scorch",
        "Strawberry Leaf Scorch",
        "Remove infected leaves after harvest, avoid overhead watering and renovate beds regularly.",
    ),
    (
        "Strawberry___healthy",
        "Healthy Strawberry",
        "Your strawberry plant looks healthy. Keep the beds weeded and mulched.",
    ),
    (
        "Tomato___Bacterial_spot",
        "Tomato Bacterial Spot",
        "Remove infected leaves, avoid working with wet plants and apply copper sprays.",
    ),
    (
        "Tomato___Early_blight",
        "Tomato Early Blight",
        "Remove lower infected leaves, mulch the soil and apply a fungicide such as chlorothalonil.",
    ),
    (
        "Tomato___Late_blight",
        "Tomato Late Blight",
        "Remove and destroy infected plants and apply a protective fungicide to healthy ones.",
    ),
    (
        "Tomato___Leaf_Mold",
        "Tomato Leaf Mold",
        "Lower humidity, increase ventilation and apply a labeled fungicide.",
    ),
    (
        "Tomato___Septoria_leaf_spot",
        "Tomato Septoria Leaf Spot",
        "Remove infected leaves, avoid overhead watering and apply a copper or chlorothalonil fungicide.",
    ),
    (
        "Tomato___Spider_mites Two-spotted_spider_mite",
        "Tomato Spider Mites",
        "Spray leaves with water, introduce predatory mites or apply insecticidal soap.",
    ),
    (
        "Tomato___Target_Spot",
        "Tomato Target Spot",
        "Improve airflow, remove plant debris and apply a fungicide at first symptoms.",
    ),
    (
        "Tomato___Tomato_Yellow_Leaf_Curl_Virus",
        "Tomato Yellow Leaf Curl Virus",
        "Remove infected plants and control whiteflies with screens or insecticidal soap.",
    ),
    (
        "Tomato___Tomato_mosaic_virus",
        "Tomato Mosaic Virus",
        "Remove infected plants, disinfect tools and wash hands after handling tobacco.",
    ),
    (
        "Tomato___healthy",
        "Healthy Tomato",
        "Your tomato plant looks healthy. Keep watering at the base and stake for support.",
    ),
];

/// Read-only label → [`DiseaseInfo`] table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiseaseInfoTable {
    entries: HashMap<String, DiseaseInfo>,
}

impl Default for DiseaseInfoTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DiseaseInfoTable {
    /// Table with the PlantVillage labels
    pub fn builtin() -> Self {
        Self::from_entries(
            BUILTIN_ENTRIES
                .iter()
                .map(|(label, name, advice)| (label.to_string(), DiseaseInfo::new(*name, *advice))),
        )
    }

    /// Build from arbitrary entries
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, DiseaseInfo)>,
    {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Load a JSON object of the form `{"label": {"name": ..., "advice": ...}}`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        ensure_exists(path)?;

        let json = std::fs::read_to_string(path)?;
        let entries: HashMap<String, DiseaseInfo> = serde_json::from_str(&json)?;
        info!("Loaded {} disease entries from {:?}", entries.len(), path);
        Ok(Self { entries })
    }

    /// Entry for `label`, or a placeholder carrying the raw label
    pub fn lookup(&self, label: &str) -> DiseaseInfo {
        self.entries
            .get(label)
            .cloned()
            .unwrap_or_else(|| DiseaseInfo::unknown(label))
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
