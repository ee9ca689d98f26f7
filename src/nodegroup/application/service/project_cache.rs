//! Time-bounded cache of the projects node groups are discovered in.

use crate::core::{
    domain::{
        error::{AutoscalerResult, ValidationError},
        model::catalog::Project,
    },
    infrastructure::cloudstack_client::ProjectClient,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Called once per project during a traversal.
#[async_trait]
pub trait ProjectVisitor: Send {
    /// Visits one project id; `""` is the root scope.
    async fn visit(&mut self, project_id: &str) -> AutoscalerResult<()>;
}

/// Caches the project list for `max_age`.
///
/// When projects are disabled the remote API is never called and only the
/// root scope is ever visited. A failed refresh keeps the previous content and
/// timestamp, so the next call retries right away.
pub struct ProjectCache {
    client: Arc<dyn ProjectClient>,
    enabled: bool,
    max_age: Duration,
    last_refreshed: Option<Instant>,
    projects: Vec<Project>,
}

impl ProjectCache {
    /// Creates an empty cache.
    ///
    /// # Errors
    /// Returns `AutoscalerError::Validation` if `max_age` is zero.
    pub fn new(
        client: Arc<dyn ProjectClient>,
        enabled: bool,
        max_age: Duration,
    ) -> AutoscalerResult<Self> {
        if max_age.is_zero() {
            return Err(ValidationError::ConstraintViolation(
                "max projects age cannot be <= 0".to_string(),
            )
            .into());
        }
        Ok(Self {
            client,
            enabled,
            max_age,
            last_refreshed: None,
            projects: Vec::new(),
        })
    }

    /// Re-reads the project list unless disabled or still fresh.
    pub async fn refresh(&mut self) -> AutoscalerResult<()> {
        if !self.enabled {
            return Ok(());
        }
        let now = Instant::now();
        if let Some(last) = self.last_refreshed {
            if now.duration_since(last) <= self.max_age {
                return Ok(());
            }
        }

        let projects = self.client.list_projects().await?;
        debug!(count = projects.len(), "refreshed project list");
        self.projects = projects;
        self.last_refreshed = Some(now);
        Ok(())
    }

    /// The root scope followed by every cached project id.
    pub fn project_ids(&self) -> Vec<String> {
        std::iter::once(String::new())
            .chain(self.projects.iter().map(|p| p.id.clone()))
            .collect()
    }

    /// Refreshes, then visits every project id in order, stopping at the
    /// first error.
    pub async fn for_each(&mut self, visitor: &mut dyn ProjectVisitor) -> AutoscalerResult<()> {
        self.refresh().await?;
        for project_id in self.project_ids() {
            visitor.visit(&project_id).await?;
        }
        Ok(())
    }
}
