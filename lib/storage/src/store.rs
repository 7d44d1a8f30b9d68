use crate::artifact::{load_bundle, save_bundle, ArtifactInfo};
use fairrent_core::{InferenceService, ModelBundle, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Owns the location of the model artifact and moves bundles between disk
/// and the inference service.
pub struct ModelStore {
    model_path: PathBuf,
}

impl ModelStore {
    pub fn new<P: AsRef<Path>>(model_path: P) -> Self {
        Self {
            model_path: model_path.as_ref().to_path_buf(),
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.model_path
    }

    pub fn load(&self) -> Result<ModelBundle> {
        let (bundle, artifact) = load_bundle(&self.model_path)?;
        info!(
            path = ?self.model_path,
            estimator = ?bundle.estimator().kind(),
            with_encoders = bundle.encoders().is_some(),
            created_at = %artifact.created_at,
            "Model loaded"
        );
        Ok(bundle)
    }

    /// Load the bundle, or `None` if the artifact is missing or unusable.
    /// The failure is logged; callers start in degraded mode.
    pub fn load_or_degrade(&self) -> Option<ModelBundle> {
        match self.load() {
            Ok(bundle) => Some(bundle),
            Err(e) => {
                warn!(path = ?self.model_path, error = %e, "Model unavailable, starting without a model");
                None
            }
        }
    }

    pub fn save(&self, bundle: &ModelBundle) -> Result<ArtifactInfo> {
        let artifact = save_bundle(&self.model_path, bundle)?;
        info!(
            path = ?self.model_path,
            size = artifact.size,
            checksum = %artifact.checksum,
            "Model saved"
        );
        Ok(artifact)
    }

    /// Re-read the artifact and swap it into `service`. On failure the
    /// service keeps whatever bundle it had.
    pub fn reload_into(&self, service: &InferenceService) -> Result<()> {
        let bundle = self.load()?;
        service.reload(bundle);
        Ok(())
    }
}
