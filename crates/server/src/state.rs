use std::sync::Arc;

use hlsforge_core::{Config, RenditionPlan, TriggerAdapter};

/// Shared application state
pub struct AppState {
    config: Config,
    plan: Arc<RenditionPlan>,
    adapter: Arc<TriggerAdapter>,
}

impl AppState {
    pub fn new(config: Config, plan: Arc<RenditionPlan>, adapter: Arc<TriggerAdapter>) -> Self {
        Self {
            config,
            plan,
            adapter,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn plan(&self) -> &RenditionPlan {
        &self.plan
    }

    pub fn adapter(&self) -> &TriggerAdapter {
        &self.adapter
    }
}
