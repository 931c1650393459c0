//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::stamp::Stamper;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    stamper: Stamper,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Self {
        let stamper = Stamper::new(config.stamp.layout);

        Self {
            inner: Arc::new(AppStateInner { config, stamper }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the stamper
    pub fn stamper(&self) -> &Stamper {
        &self.inner.stamper
    }
}
