use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use packquote_core::config::{AppConfig, LoadOptions, DEFAULT_CONFIG_FILE};
use secrecy::ExposeSecret;
use toml::Value;

use crate::commands::{CommandResult, EXIT_CONFIG};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                EXIT_CONFIG,
            )
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let catalog_path = config
        .catalog
        .path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<builtin>".to_string());
    let admin_token = config
        .server
        .admin_token
        .as_ref()
        .map(|token| redact_token(token.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());

    let fields: [(&str, &[&str], String); 12] = [
        ("pricing.margin", &["PACKQUOTE_PRICING_MARGIN"], config.pricing.margin.to_string()),
        (
            "pricing.print_color_rate",
            &["PACKQUOTE_PRICING_PRINT_COLOR_RATE"],
            config.pricing.print_color_rate.to_string(),
        ),
        (
            "pricing.quantity_floor",
            &["PACKQUOTE_PRICING_QUANTITY_FLOOR"],
            config.pricing.quantity_floor.to_string(),
        ),
        (
            "pricing.display_cny_rate",
            &["PACKQUOTE_PRICING_DISPLAY_CNY_RATE"],
            config.pricing.display_cny_rate.to_string(),
        ),
        (
            "pricing.large_order_threshold",
            &["PACKQUOTE_PRICING_LARGE_ORDER_THRESHOLD"],
            config.pricing.large_order_threshold.to_string(),
        ),
        ("catalog.path", &["PACKQUOTE_CATALOG_PATH"], catalog_path),
        (
            "server.bind_address",
            &["PACKQUOTE_SERVER_BIND_ADDRESS"],
            config.server.bind_address.clone(),
        ),
        ("server.port", &["PACKQUOTE_SERVER_PORT"], config.server.port.to_string()),
        (
            "server.graceful_shutdown_secs",
            &["PACKQUOTE_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            config.server.graceful_shutdown_secs.to_string(),
        ),
        ("server.admin_token", &["PACKQUOTE_SERVER_ADMIN_TOKEN"], admin_token),
        (
            "logging.level",
            &["PACKQUOTE_LOGGING_LEVEL", "PACKQUOTE_LOG_LEVEL"],
            config.logging.level.clone(),
        ),
        (
            "logging.format",
            &["PACKQUOTE_LOGGING_FORMAT", "PACKQUOTE_LOG_FORMAT"],
            format!("{:?}", config.logging.format),
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, env_keys, value) in fields {
        lines.push(render_line(
            key_path,
            &value,
            field_source(
                key_path,
                env_keys,
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            ),
        ));
    }

    CommandResult::output(lines.join("\n"))
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from(DEFAULT_CONFIG_FILE);
    if root.exists() {
        return Some(root);
    }

    let nested = Path::new("config").join(DEFAULT_CONFIG_FILE);
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps the last four characters so operators can tell tokens apart.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() <= 8 {
        return "<redacted>".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("***{tail}")
}

#[cfg(test)]
mod tests {
    use toml::Value;

    use super::{contains_path, redact_token};

    #[test]
    fn redaction_keeps_only_a_short_suffix() {
        assert_eq!(redact_token("0123456789abcdef"), "***cdef");
        assert_eq!(redact_token("short"), "<redacted>");
        assert_eq!(redact_token("   "), "<empty>");
    }

    #[test]
    fn dotted_paths_resolve_nested_tables() {
        let doc: Value = "[pricing]\nmargin = \"0.3\"\n".parse().expect("toml");

        assert!(contains_path(&doc, "pricing.margin"));
        assert!(!contains_path(&doc, "pricing.quantity_floor"));
        assert!(!contains_path(&doc, "server.port"));
    }
}
