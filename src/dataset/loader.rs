//! Image Folder Loader
//!
//! Discovers a class-per-subdirectory image tree and splits it into training
//! and validation subsets the way Keras' `flow_from_directory` does: classes
//! are the sorted subdirectory names, and the validation subset is the first
//! `floor(fraction * n)` files of each class in walk order.
//!
//! Walk order groups files by their parent directory, with directories ordered
//! by their full path string and files by name inside each directory. Files
//! directly inside a class directory therefore come before files in its
//! subdirectories. Symlinked files are read, symlinked subdirectories are not
//! descended.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::utils::error::{ensure_exists, PlantDiseaseError, Result};

/// File extensions accepted as images (compared case-insensitively)
pub const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "bmp", "gif", "tif", "tiff", "ppm"];

/// A single image file with its class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSample {
    /// Path to the image file
    pub path: PathBuf,
    /// Class index (position of the class directory in sorted order)
    pub label: usize,
    /// Class directory name
    pub class_name: String,
}

/// A scanned image tree
#[derive(Debug, Clone)]
pub struct ImageFolder {
    /// Root directory that was scanned
    pub root_dir: PathBuf,
    /// Class names, index = label
    pub class_names: Vec<String>,
    /// Samples grouped by class, in walk order within each class
    pub samples: Vec<ImageSample>,
}

/// Training and validation subsets of an [`ImageFolder`]
#[derive(Debug, Clone, Default)]
pub struct FolderSplit {
    pub training: Vec<ImageSample>,
    pub validation: Vec<ImageSample>,
}

/// Whether a path has one of the accepted image extensions
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Image files below a class directory in walk order
fn class_files(class_dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<(String, String, PathBuf)> = WalkDir::new(class_dir)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        // `Path::is_file` resolves symlinks, so linked files pass and
        // linked directories do not
        .filter(|entry| entry.path().is_file() && is_image_file(entry.path()))
        .map(|entry| {
            let parent = entry
                .path()
                .parent()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default();
            let name = entry.file_name().to_string_lossy().into_owned();
            (parent, name, entry.into_path())
        })
        .collect();

    files.sort();
    files.into_iter().map(|(_, _, path)| path).collect()
}

impl ImageFolder {
    /// Scan a directory laid out as:
    /// ```text
    /// root_dir/
    /// ├── healthy/
    /// │   ├── leaf1.jpg
    /// │   └── leaf2.jpg
    /// └── rust/
    ///     └── ...
    /// ```
    ///
    /// Images nested deeper inside a class directory belong to that class.
    /// A symlink at the top level counts as a class when it points to a
    /// directory.
    pub fn scan<P: AsRef<Path>>(root_dir: P) -> Result<Self> {
        let root_dir = root_dir.as_ref().to_path_buf();
        ensure_exists(&root_dir)?;
        info!("Scanning image folder: {:?}", root_dir);

        let mut class_names: Vec<String> = Vec::new();
        for entry in std::fs::read_dir(&root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    class_names.push(name.to_string());
                }
            }
        }
        class_names.sort();

        let mut samples = Vec::new();
        for (label, class_name) in class_names.iter().enumerate() {
            let files = class_files(&root_dir.join(class_name));

            debug!(
                "Class '{}' (label {}): {} images",
                class_name,
                label,
                files.len()
            );

            samples.extend(files.into_iter().map(|path| ImageSample {
                path,
                label,
                class_name: class_name.clone(),
            }));
        }

        info!(
            "Found {} images belonging to {} classes",
            samples.len(),
            class_names.len()
        );

        Ok(Self {
            root_dir,
            class_names,
            samples,
        })
    }

    /// Number of images
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no images were found
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of classes
    pub fn num_classes(&self) -> usize {
        self.class_names.len()
    }

    /// Images per class, indexed by label
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.num_classes()];
        for sample in &self.samples {
            counts[sample.label] += 1;
        }
        counts
    }

    /// Split every class into validation (leading files) and training (the rest)
    pub fn split(&self, validation_fraction: f64) -> Result<FolderSplit> {
        if !(0.0..1.0).contains(&validation_fraction) {
            return Err(PlantDiseaseError::Config(format!(
                "validation split must be in [0.0, 1.0), got {}",
                validation_fraction
            )));
        }

        let mut split = FolderSplit::default();
        for label in 0..self.num_classes() {
            let class_samples: Vec<&ImageSample> =
                self.samples.iter().filter(|s| s.label == label).collect();
            let num_validation = (validation_fraction * class_samples.len() as f64) as usize;

            let (validation, training) = class_samples.split_at(num_validation);
            split.validation.extend(validation.iter().map(|s| (*s).clone()));
            split.training.extend(training.iter().map(|s| (*s).clone()));
        }

        Ok(split)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"x").unwrap();
    }

    fn sample_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..10 {
            touch(&dir.path().join(format!("rust/leaf_{:02}.jpg", i)));
        }
        for i in 0..4 {
            touch(&dir.path().join(format!("healthy/leaf_{}.PNG", i)));
        }
        touch(&dir.path().join("healthy/notes.txt"));
        touch(&dir.path().join("healthy/nested/deep.jpeg"));
        touch(&dir.path().join("stray.jpg"));
        dir
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("a/b.JPG")));
        assert!(is_image_file(Path::new("a/b.tiff")));
        assert!(!is_image_file(Path::new("a/b.txt")));
        assert!(!is_image_file(Path::new("a/noext")));
    }

    #[test]
    fn test_scan_sorts_classes_and_filters_files() {
        let dir = sample_tree();
        let folder = ImageFolder::scan(dir.path()).unwrap();

        assert_eq!(folder.class_names, vec!["healthy", "rust"]);
        assert_eq!(folder.class_counts(), vec![5, 10]);
        assert!(folder.samples.iter().all(|s| s.path.extension().unwrap() != "txt"));
        assert!(folder
            .samples
            .iter()
            .all(|s| s.class_name == folder.class_names[s.label]));
    }

    #[test]
    fn test_files_in_class_root_come_before_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("healthy/a_sub/x.jpg"));
        touch(&dir.path().join("healthy/b.jpg"));
        touch(&dir.path().join("healthy/a_sub/inner/y.jpg"));
        touch(&dir.path().join("healthy/c.png"));

        let folder = ImageFolder::scan(dir.path()).unwrap();
        let names: Vec<_> = folder
            .samples
            .iter()
            .map(|s| s.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["b.jpg", "c.png", "x.jpg", "y.jpg"]);
        let validation = folder.split(0.5).unwrap().validation;
        assert_eq!(validation.len(), 2);
        assert_eq!(validation[0].path, dir.path().join("healthy/b.jpg"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directories_are_not_descended() {
        let dir = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        touch(&outside.path().join("elsewhere.jpg"));
        touch(&dir.path().join("rust/real.jpg"));
        std::os::unix::fs::symlink(outside.path(), dir.path().join("rust/linked")).unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("elsewhere.jpg"),
            dir.path().join("rust/alias.jpg"),
        )
        .unwrap();

        let folder = ImageFolder::scan(dir.path()).unwrap();
        let names: Vec<_> = folder
            .samples
            .iter()
            .map(|s| s.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["alias.jpg", "real.jpg"]);
    }

    #[test]
    fn test_scan_missing_directory() {
        let err = ImageFolder::scan("/no/such/uploads").unwrap_err();
        assert!(matches!(err, PlantDiseaseError::PathNotFound(_)));
    }

    #[test]
    fn test_split_takes_leading_files_for_validation() {
        let dir = sample_tree();
        let folder = ImageFolder::scan(dir.path()).unwrap();
        let split = folder.split(0.2).unwrap();

        // healthy: floor(0.2 * 5) = 1, rust: floor(0.2 * 10) = 2
        assert_eq!(split.validation.len(), 3);
        assert_eq!(split.training.len(), 12);

        let rust_val: Vec<_> = split
            .validation
            .iter()
            .filter(|s| s.class_name == "rust")
            .map(|s| s.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(rust_val, vec!["leaf_00.jpg", "leaf_01.jpg"]);
    }

    #[test]
    fn test_split_is_deterministic() {
        let dir = sample_tree();
        let folder = ImageFolder::scan(dir.path()).unwrap();
        let a = folder.split(0.2).unwrap();
        let b = folder.split(0.2).unwrap();
        assert_eq!(a.training, b.training);
        assert_eq!(a.validation, b.validation);
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        let dir = sample_tree();
        let folder = ImageFolder::scan(dir.path()).unwrap();
        assert!(folder.split(1.0).is_err());
        assert!(folder.split(-0.1).is_err());
    }
}
