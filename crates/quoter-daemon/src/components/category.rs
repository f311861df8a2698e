//! Category component.
//!
//! Keeps the category index in step with the collection and remembers the
//! filter the user last picked.

use std::sync::Arc;

use eyre::Result;
use quoter_client::{CategoryFilter, CategoryIndex};
use tokio::sync::RwLock;

use crate::{
    daemon::{Component, DaemonHandle},
    events::DaemonEvent,
};

/// Category component - rebuilds the index on every collection change.
pub struct CategoryComponent {
    index: Arc<RwLock<CategoryIndex>>,
    handle: Option<DaemonHandle>,
}

impl CategoryComponent {
    pub fn new() -> Self {
        Self {
            index: Arc::new(RwLock::new(CategoryIndex::default())),
            handle: None,
        }
    }

    /// Shared view of the current index, for whatever renders the selector.
    pub fn index(&self) -> Arc<RwLock<CategoryIndex>> {
        self.index.clone()
    }

    async fn rebuild(&self) -> Result<()> {
        let handle = self
            .handle
            .as_ref()
            .ok_or_else(|| eyre::eyre!("component not initialized"))?;

        let index = handle.store().lock().await.categories();
        tracing::debug!(categories = index.len(), "rebuilt category index");
        *self.index.write().await = index;
        Ok(())
    }

    async fn remember(&self, filter: &CategoryFilter) -> Result<()> {
        let handle = self
            .handle
            .as_ref()
            .ok_or_else(|| eyre::eyre!("component not initialized"))?;

        if let CategoryFilter::Only(name) = filter {
            if !self.index.read().await.contains(name) {
                tracing::warn!(category = %name, "selected category has no quotes");
            }
        }

        handle.store().lock().await.remember_category(filter)?;
        Ok(())
    }
}

impl Default for CategoryComponent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Component for CategoryComponent {
    fn name(&self) -> &'static str {
        "category"
    }

    async fn start(&mut self, handle: DaemonHandle) -> Result<()> {
        self.handle = Some(handle);
        self.rebuild().await?;

        tracing::info!("category component started");
        Ok(())
    }

    async fn handle_event(&mut self, event: &DaemonEvent) -> Result<()> {
        match event {
            DaemonEvent::QuotesChanged(_) => self.rebuild().await,
            DaemonEvent::CategorySelected(filter) => self.remember(filter).await,
            _ => Ok(()),
        }
    }

    async fn stop(&mut self) -> Result<()> {
        tracing::info!("category component stopped");
        Ok(())
    }
}
