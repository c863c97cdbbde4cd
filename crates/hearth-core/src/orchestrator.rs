//! Acquire a model, run one task on it, tear everything down.

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::catalog::{Catalog, ModelVariant};
use crate::config::Configuration;
use crate::error::Result;
use crate::inference::{InferenceTask, TaskContext};
use crate::model::{DownloadProgress, LoadedModel, ProgressTracker};
use crate::service::{ModelService, ProgressSender};

type VariantPredicate = Box<dyn Fn(&ModelVariant) -> bool + Send + Sync>;

/// Which model to acquire and which of its variants to use
pub struct ModelRequest {
    pub alias: String,
    predicate: VariantPredicate,
}

impl ModelRequest {
    pub fn new<P>(alias: impl Into<String>, predicate: P) -> Self
    where
        P: Fn(&ModelVariant) -> bool + Send + Sync + 'static,
    {
        Self {
            alias: alias.into(),
            predicate: Box::new(predicate),
        }
    }

    pub fn matches(&self, variant: &ModelVariant) -> bool {
        (self.predicate)(variant)
    }
}

/// Drives the acquire → execute → teardown sequence against a model service
pub struct Orchestrator<'a, S: ModelService + ?Sized> {
    service: &'a S,
    config: &'a Configuration,
}

impl<'a, S: ModelService + ?Sized> Orchestrator<'a, S> {
    pub fn new(service: &'a S, config: &'a Configuration) -> Self {
        Self { service, config }
    }

    /// Fetch a fresh catalog
    pub async fn catalog(&self) -> Result<Catalog> {
        self.service.catalog().await
    }

    /// Resolve, download (if needed) and load the requested model.
    ///
    /// Progress events sent to `progress` never decrease and end at 100 when
    /// the download succeeds.
    pub async fn acquire(
        &self,
        request: &ModelRequest,
        progress: Option<ProgressSender>,
    ) -> Result<LoadedModel> {
        let catalog = self.service.catalog().await?;
        let model = catalog.get_model(&request.alias)?;
        let variant = model
            .select_variant(|v| request.matches(v))?
            .clone();

        info!("Selected variant {} for {}", variant, request.alias);

        self.download(&variant, progress).await?;
        self.service.load(&variant).await?;

        Ok(LoadedModel::new(variant))
    }

    async fn download(&self, variant: &ModelVariant, progress: Option<ProgressSender>) -> Result<()> {
        let mut tracker = ProgressTracker::new();
        let emit = |event: Option<DownloadProgress>| {
            if let (Some(tx), Some(event)) = (progress.as_ref(), event) {
                let _ = tx.send(event);
            }
        };

        if variant.cached {
            info!("Model {} already cached", variant.id);
            emit(tracker.finish());
            return Ok(());
        }

        let (raw_tx, mut raw_rx) = mpsc::unbounded_channel();
        let download = self.service.download(variant, raw_tx);
        let forward = async {
            while let Some(raw) = raw_rx.recv().await {
                emit(tracker.observe(raw.percent));
            }
        };

        let (result, ()) = tokio::join!(download, forward);
        result?;

        emit(tracker.finish());
        Ok(())
    }

    /// Run `task` on the requested model with scoped teardown.
    ///
    /// The model is unloaded, and a web service started here is stopped,
    /// whether or not the task succeeds. A task error takes precedence over a
    /// teardown error.
    pub async fn run<T>(
        &self,
        request: &ModelRequest,
        task: &T,
        progress: Option<ProgressSender>,
    ) -> Result<String>
    where
        T: InferenceTask + ?Sized,
    {
        let model = self.acquire(request, progress).await?;

        let web_started = match &self.config.web {
            Some(web) => match self.service.start_web_service(web).await {
                Ok(started) => started,
                Err(e) => {
                    if let Err(teardown) = self.teardown(model, false).await {
                        warn!("Teardown after failed web service start: {}", teardown);
                    }
                    return Err(e);
                }
            },
            None => false,
        };

        info!("Running {} on {}", task.name(), model.id());
        let outcome = {
            let ctx = TaskContext {
                model: &model,
                web: self.config.web.as_ref(),
            };
            task.run(&ctx).await
        };

        let teardown = self.teardown(model, web_started).await;

        match (outcome, teardown) {
            (Ok(output), Ok(())) => Ok(output),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(teardown)) => {
                error!("Teardown failed after task error: {}", teardown);
                Err(e)
            }
        }
    }

    /// Stop the web service (if owned) and unload the model; both always run.
    async fn teardown(&self, model: LoadedModel, stop_web: bool) -> Result<()> {
        let stopped = if stop_web {
            self.service.stop_web_service().await
        } else {
            Ok(())
        };
        let unloaded = model.unload(self.service).await;
        stopped.and(unloaded)
    }
}
