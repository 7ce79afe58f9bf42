//! Pipeline lookup used by the `pipelineID` directive.
//!
//! `pipelineID` resolves an application name and a pipeline name into the
//! pipeline's id by asking a [`PipelineLookup`]. A lookup that fails is not
//! fatal to a render; the directive logs and substitutes an empty string.

mod gate;

pub use gate::GateClient;

use std::collections::HashMap;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The fields of a pipeline configuration the renderer needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub id: String,
    pub name: String,
}

/// Failure to list an application's pipelines.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("No pipeline service is configured")]
    NotConfigured,

    #[error("Request for pipelines of '{application}' failed: {source}")]
    Http {
        application: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Pipeline service returned HTTP {status} for '{application}'")]
    Status {
        application: String,
        status: u16,
    },
}

/// Lists the pipelines of an application.
pub trait PipelineLookup: Send + Sync {
    fn list_pipelines<'a>(
        &'a self,
        application: &'a str,
    ) -> BoxFuture<'a, Result<Vec<PipelineSummary>, LookupError>>;
}

/// Find the id of `pipeline` in `application`.
pub async fn find_pipeline_id(
    lookup: &dyn PipelineLookup,
    application: &str,
    pipeline: &str,
) -> Result<Option<String>, LookupError> {
    let pipelines = lookup.list_pipelines(application).await?;
    Ok(pipelines.into_iter().find(|p| p.name == pipeline).map(|p| p.id))
}

/// Lookup used when no pipeline service is configured. Every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPipelines;

impl PipelineLookup for NoPipelines {
    fn list_pipelines<'a>(
        &'a self,
        _application: &'a str,
    ) -> BoxFuture<'a, Result<Vec<PipelineSummary>, LookupError>> {
        Box::pin(async { Err(LookupError::NotConfigured) })
    }
}

/// Fixed pipelines per application.
#[derive(Debug, Default, Clone)]
pub struct StaticPipelines {
    apps: HashMap<String, Vec<PipelineSummary>>,
}

impl StaticPipelines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pipeline to `application`.
    #[must_use]
    pub fn with(mut self, application: &str, name: &str, id: &str) -> Self {
        self.apps.entry(application.to_string()).or_default().push(PipelineSummary {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }
}

impl PipelineLookup for StaticPipelines {
    fn list_pipelines<'a>(
        &'a self,
        application: &'a str,
    ) -> BoxFuture<'a, Result<Vec<PipelineSummary>, LookupError>> {
        Box::pin(async move { Ok(self.apps.get(application).cloned().unwrap_or_default()) })
    }
}
