use packquote_core::config::{AppConfig, LoadOptions};
use packquote_core::{QuoteEngine, QuoteInput, QuoteRuntime};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            match QuoteEngine::from_config(&config) {
                Ok(engine) => {
                    checks.push(DoctorCheck {
                        name: "catalog_load",
                        status: CheckStatus::Pass,
                        details: describe_catalog(&config, &engine),
                    });
                    checks.push(check_reference_quote(&engine));
                }
                Err(error) => {
                    checks.push(DoctorCheck {
                        name: "catalog_load",
                        status: CheckStatus::Fail,
                        details: error.to_string(),
                    });
                    checks.push(skipped("engine_smoke", "catalog did not load"));
                }
            }
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(skipped("catalog_load", "configuration did not load"));
            checks.push(skipped("engine_smoke", "configuration did not load"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn skipped(name: &'static str, reason: &str) -> DoctorCheck {
    DoctorCheck {
        name,
        status: CheckStatus::Skipped,
        details: format!("skipped because {reason}"),
    }
}

fn describe_catalog(config: &AppConfig, engine: &QuoteEngine) -> String {
    let source = config
        .catalog
        .path
        .as_ref()
        .map(|path| format!("`{}`", path.display()))
        .unwrap_or_else(|| "builtin catalog".to_string());
    let catalog = engine.catalog();
    format!(
        "{source}: {} bag types, {} sizes, {} materials, {} processes, {} tiers",
        catalog.bag_types().len(),
        catalog.bag_sizes().len(),
        catalog.materials().len(),
        catalog.processes().len(),
        catalog.tiers().len()
    )
}

/// Prices the first bag type, size and material of whatever catalog is loaded.
fn check_reference_quote(engine: &QuoteEngine) -> DoctorCheck {
    let catalog = engine.catalog();
    let size = catalog.bag_sizes().iter().find(|size| !size.is_custom());
    let (Some(bag_type), Some(size), Some(material)) =
        (catalog.bag_types().first(), size, catalog.materials().first())
    else {
        return DoctorCheck {
            name: "engine_smoke",
            status: CheckStatus::Fail,
            details: "catalog has no fixed-size configuration to price".to_string(),
        };
    };

    let input = QuoteInput::new(
        bag_type.id.as_str(),
        size.id.as_str(),
        material.id.as_str(),
        1_000,
        1,
    );
    match engine.quote(&input) {
        Ok(quote) if quote.unit_price > Decimal::ZERO => DoctorCheck {
            name: "engine_smoke",
            status: CheckStatus::Pass,
            details: format!(
                "{} / {} / {} x 1000 priced at {} per unit",
                bag_type.id, size.id, material.id, quote.unit_price
            ),
        },
        Ok(quote) => DoctorCheck {
            name: "engine_smoke",
            status: CheckStatus::Fail,
            details: format!("reference quote priced at non-positive {}", quote.unit_price),
        },
        Err(error) => DoctorCheck {
            name: "engine_smoke",
            status: CheckStatus::Fail,
            details: format!("reference quote rejected: {error}"),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
