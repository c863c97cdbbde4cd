//! Loaded model handle

use tracing::{info, warn};

use crate::catalog::ModelVariant;
use crate::error::Result;
use crate::service::ModelService;

/// A variant that the service has loaded into memory.
///
/// Only a successful load produces one, and [`LoadedModel::unload`] consumes
/// it, so a handle is never used before loading and never released twice.
#[derive(Debug)]
pub struct LoadedModel {
    variant: ModelVariant,
    released: bool,
}

impl LoadedModel {
    pub(crate) fn new(variant: ModelVariant) -> Self {
        Self {
            variant,
            released: false,
        }
    }

    /// Id the service knows the loaded variant by
    pub fn id(&self) -> &str {
        &self.variant.id
    }

    pub fn variant(&self) -> &ModelVariant {
        &self.variant
    }

    /// Release the model on the service.
    pub async fn unload<S>(mut self, service: &S) -> Result<()>
    where
        S: ModelService + ?Sized,
    {
        self.released = true;
        info!("Unloading model {}", self.variant.id);
        service.unload(&self.variant).await
    }
}

impl Drop for LoadedModel {
    fn drop(&mut self) {
        if !self.released {
            warn!("Model {} dropped without being unloaded", self.variant.id);
        }
    }
}
