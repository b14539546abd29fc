//! Model serialization and persistence
//!
//! Models are written as pretty-printed JSON together with metadata about
//! the run that produced them.

use crate::core::{Result, SVMError, TrainerConfig};
use crate::kernel::Kernel;
use crate::model::Model;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// On-disk representation of a trained model
#[derive(Debug, Serialize, Deserialize)]
pub struct SavedModel<K> {
    pub metadata: ModelMetadata,
    pub model: Model<K>,
}

/// Model metadata for tracking and validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Library version used to create the model
    pub library_version: String,
    pub n_support_vectors: usize,
    /// Training parameters used
    pub training_params: TrainerConfig,
    /// RFC 3339 creation timestamp
    pub created_at: String,
}

impl<K: Kernel + Serialize + DeserializeOwned> SavedModel<K> {
    pub fn new(model: Model<K>, config: &TrainerConfig) -> Self {
        let metadata = ModelMetadata {
            library_version: env!("CARGO_PKG_VERSION").to_string(),
            n_support_vectors: model.support_vectors().len(),
            training_params: config.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        Self { metadata, model }
    }

    /// Save model to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| SVMError::Serialization(e.to_string()))
    }

    /// Load model from file, rejecting internally inconsistent models
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let saved: Self = serde_json::from_reader(reader)
            .map_err(|e| SVMError::Serialization(e.to_string()))?;
        if !saved.model.is_consistent() {
            return Err(SVMError::Serialization(
                "support vectors do not match support vector indices".to_string(),
            ));
        }
        Ok(saved)
    }
}

/// Write `model` and its training configuration to `path`
pub fn save_model<K, P>(model: &Model<K>, config: &TrainerConfig, path: P) -> Result<()>
where
    K: Kernel + Clone + Serialize + DeserializeOwned,
    P: AsRef<Path>,
{
    SavedModel::new(model.clone(), config).save_to_file(path)
}

/// Read a model written by [`save_model`]
pub fn load_model<K, P>(path: P) -> Result<Model<K>>
where
    K: Kernel + Serialize + DeserializeOwned,
    P: AsRef<Path>,
{
    Ok(SavedModel::load_from_file(path)?.model)
}
