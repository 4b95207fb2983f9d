use std::sync::Arc;

use packquote_core::config::AppConfig;
use packquote_core::{CatalogError, QuoteEngine};
use thiserror::Error;
use tracing::info;

use crate::state::AppState;

pub struct Application {
    pub config: Arc<AppConfig>,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("catalog failed to load: {0}")]
    Catalog(#[from] CatalogError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        catalog_path = ?config.catalog.path,
        "starting application bootstrap"
    );

    let engine = QuoteEngine::from_config(&config)?;
    info!(
        event_name = "system.bootstrap.catalog_loaded",
        correlation_id = "bootstrap",
        bag_types = engine.catalog().bag_types().len(),
        materials = engine.catalog().materials().len(),
        processes = engine.catalog().processes().len(),
        "catalog validated and engine built"
    );

    let config = Arc::new(config);
    let state = AppState::new(engine, Arc::clone(&config));
    Ok(Application { config, state })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use packquote_core::config::AppConfig;
    use packquote_core::{CatalogError, QuoteInput, QuoteRuntime};

    use crate::bootstrap::{bootstrap_with_config, BootstrapError};

    #[test]
    fn bootstrap_with_defaults_serves_the_builtin_catalog() {
        let app = bootstrap_with_config(Default::default()).expect("bootstrap");

        let quote = app
            .state
            .engine()
            .quote(&QuoteInput::new("stand-up", "md", "pet-pe", 1_000, 4))
            .expect("quote");
        assert_eq!(quote.unit_price.to_string(), "0.4104");
        assert_eq!(app.config.server.port, 8080);
    }

    #[test]
    fn bootstrap_fails_fast_on_missing_catalog_file() {
        let mut config = AppConfig::default();
        config.catalog.path = Some(PathBuf::from("does/not/exist.toml"));

        let error = bootstrap_with_config(config).err().expect("missing catalog should fail");
        assert!(matches!(error, BootstrapError::Catalog(CatalogError::ReadFile { .. })));
        assert!(error.to_string().contains("does/not/exist.toml"));
    }

    #[test]
    fn bootstrap_rejects_an_unparseable_catalog() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("catalog.toml");
        std::fs::write(&path, "overflow_discount = \"0.5\"\n").expect("write catalog");

        let mut config = AppConfig::default();
        config.catalog.path = Some(path);

        let error = bootstrap_with_config(config).err().expect("invalid catalog should fail");
        assert!(matches!(error, BootstrapError::Catalog(_)));
    }
}
