pub mod catalog;
pub mod config;
pub mod doctor;
pub mod quote;
pub mod select;

use packquote_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use packquote_core::QuoteEngine;
use serde::Serialize;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_REJECTED: u8 = 3;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn output(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }

    /// Puts human-readable detail lines ahead of the JSON outcome line.
    pub fn with_details(mut self, details: &[String]) -> Self {
        if !details.is_empty() {
            self.output = format!("{}\n{}", details.join("\n"), self.output);
        }
        self
    }
}

/// Loads configuration and builds the engine, mapping either failure to a config-class outcome.
pub(crate) fn load_engine(
    command: &str,
    overrides: ConfigOverrides,
) -> Result<(AppConfig, QuoteEngine), CommandResult> {
    let config =
        AppConfig::load(LoadOptions { overrides, ..LoadOptions::default() }).map_err(|error| {
            CommandResult::failure(command, "config_validation", error.to_string(), EXIT_CONFIG)
        })?;
    let engine = QuoteEngine::from_config(&config).map_err(|error| {
        CommandResult::failure(command, "catalog_load", error.to_string(), EXIT_CONFIG)
    })?;
    Ok((config, engine))
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
