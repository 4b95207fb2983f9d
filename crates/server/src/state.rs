use std::sync::{Arc, PoisonError, RwLock};

use packquote_core::config::AppConfig;
use packquote_core::QuoteEngine;

/// Shared handler state. The engine slot is swapped wholesale on catalog reload;
/// handlers clone the inner `Arc` and quote without holding the lock.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<RwLock<Arc<QuoteEngine>>>,
    config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(engine: QuoteEngine, config: Arc<AppConfig>) -> Self {
        Self { engine: Arc::new(RwLock::new(Arc::new(engine))), config }
    }

    pub fn engine(&self) -> Arc<QuoteEngine> {
        let guard = self.engine.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn replace_engine(&self, engine: QuoteEngine) {
        let mut guard = self.engine.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(engine);
    }
}
