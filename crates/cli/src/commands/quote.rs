use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use clap::Args;
use packquote_core::config::ConfigOverrides;
use packquote_core::display::{
    format_cny, format_cny_unit, format_date_range, format_dimensions, format_quantity,
    format_usd, format_usd_unit, UnitSystem,
};
use packquote_core::{QuoteDefaults, QuoteError, QuoteInput, QuoteResult, QuoteRuntime};
use rust_decimal::Decimal;

use crate::commands::{load_engine, CommandResult, EXIT_REJECTED};

#[derive(Debug, Clone, Args)]
pub struct QuoteArgs {
    #[arg(long, help = "Storefront preset, e.g. stand-up-pouch or flat-bottom-bag")]
    pub product: Option<String>,
    #[arg(long, help = "Bag type id; defaults to the preset's bag type")]
    pub bag_type: Option<String>,
    #[arg(long, default_value = "md", help = "Bag size id, or `custom` with --width/--height")]
    pub size: String,
    #[arg(long, help = "Custom width in mm")]
    pub width: Option<u32>,
    #[arg(long, help = "Custom height in mm")]
    pub height: Option<u32>,
    #[arg(long, help = "Custom gusset in mm")]
    pub gusset: Option<u32>,
    #[arg(long, default_value = "pet-pe")]
    pub material: String,
    #[arg(long = "process", help = "Process option id; repeat for several")]
    pub processes: Vec<String>,
    #[arg(long)]
    pub quantity: u32,
    #[arg(long, default_value_t = 1, help = "Number of print colours")]
    pub colors: u32,
    #[arg(long, help = "Count delivery days from this date (YYYY-MM-DD) instead of today")]
    pub today: Option<NaiveDate>,
    #[arg(long, help = "Price against this TOML catalog instead of the configured one")]
    pub catalog: Option<PathBuf>,
    #[arg(long, help = "Override the configured margin, e.g. 0.30")]
    pub margin: Option<Decimal>,
    #[arg(long, help = "Show dimensions in inches")]
    pub imperial: bool,
    #[arg(long, help = "Emit the full quote as JSON")]
    pub json: bool,
}

impl QuoteArgs {
    fn input(&self) -> Option<QuoteInput> {
        let bag_type = self
            .bag_type
            .clone()
            .or_else(|| {
                QuoteDefaults::for_product(self.product.as_deref())
                    .bag_type
                    .map(|id| id.as_str().to_owned())
            })?;

        let mut input =
            QuoteInput::new(bag_type, &self.size, &self.material, self.quantity, self.colors);
        input.custom_width = self.width;
        input.custom_height = self.height;
        input.custom_gusset = self.gusset;
        for process in &self.processes {
            input = input.with_process(process);
        }
        Some(input)
    }

    fn units(&self) -> UnitSystem {
        if self.imperial {
            UnitSystem::Imperial
        } else {
            UnitSystem::Metric
        }
    }
}

pub fn run(args: &QuoteArgs) -> CommandResult {
    let overrides = ConfigOverrides {
        catalog_path: args.catalog.clone(),
        margin: args.margin,
        ..ConfigOverrides::default()
    };
    let (config, engine) = match load_engine("quote", overrides) {
        Ok(loaded) => loaded,
        Err(result) => return result,
    };

    let Some(input) = args.input() else {
        return CommandResult::failure(
            "quote",
            "invalid_input",
            "a bag type is required: pass --bag-type or a known --product preset",
            EXIT_REJECTED,
        );
    };

    let today = args.today.unwrap_or_else(|| Utc::now().date_naive());
    match engine.quote_on(&input, today) {
        Ok(quote) if args.json => match serde_json::to_string_pretty(&quote) {
            Ok(body) => CommandResult::output(body),
            Err(error) => CommandResult::failure("quote", "serialization", error.to_string(), 1),
        },
        Ok(quote) => {
            let preset = args.product.as_deref().map(|product| {
                QuoteDefaults::for_product(Some(product)).content_label()
            });
            CommandResult::output(render_human(
                &quote,
                &input,
                preset,
                config.pricing.display_cny_rate,
                args.units(),
            ))
        }
        Err(error) => rejection(&error),
    }
}

fn rejection(error: &QuoteError) -> CommandResult {
    let details: Vec<String> = error
        .violations()
        .iter()
        .map(|violation| match &violation.suggestion {
            Some(suggestion) => {
                format!("- {}: {} ({suggestion})", violation.code, violation.message)
            }
            None => format!("- {}: {}", violation.code, violation.message),
        })
        .collect();

    CommandResult::failure(
        "quote",
        "quote_rejected",
        format!("{}: {error}", error.code()),
        EXIT_REJECTED,
    )
    .with_details(&details)
}

fn render_human(
    quote: &QuoteResult,
    input: &QuoteInput,
    content: Option<&str>,
    cny_rate: Decimal,
    units: UnitSystem,
) -> String {
    let (width, height, gusset) = if quote.bag_size.is_custom() {
        (
            input.custom_width.unwrap_or_default(),
            input.custom_height.unwrap_or_default(),
            input.custom_gusset.unwrap_or_default(),
        )
    } else {
        (quote.bag_size.width_mm, quote.bag_size.height_mm, quote.bag_size.gusset_mm)
    };

    let mut lines = vec![
        format!(
            "{} / {} / {}",
            quote.bag_type.name_en,
            quote.material.name,
            format_dimensions(width, height, gusset, units)
        ),
        format!("surface area: {} m²", quote.surface_area),
        format!(
            "quantity: {} ({} printing, MOQ {} {})",
            format_quantity(quote.quantity),
            quote.printing_method,
            format_quantity(quote.moq_required),
            if quote.moq_met { "met" } else { "not met" }
        ),
        format!(
            "unit price: {} ({})",
            format_usd_unit(quote.unit_price),
            format_cny_unit(quote.unit_price, cny_rate)
        ),
        format!(
            "total: {} ({})",
            format_usd(quote.total_price),
            format_cny(quote.total_price, cny_rate)
        ),
        format!(
            "tolerance: {} pcs {} .. {} pcs {}",
            format_quantity(quote.tolerance_low.quantity),
            format_usd(quote.tolerance_low.price),
            format_quantity(quote.tolerance_high.quantity),
            format_usd(quote.tolerance_high.price)
        ),
        format!(
            "delivery: {} ({}-{} business days)",
            format_date_range(&quote.delivery),
            quote.delivery.min_days,
            quote.delivery.max_days
        ),
        format!(
            "breakdown: material {} + process {} + printing {} + setup {} + margin {} \
             (discount x{})",
            format_usd_unit(quote.breakdown.material_cost),
            format_usd_unit(quote.breakdown.process_cost),
            format_usd_unit(quote.breakdown.printing_cost),
            format_usd_unit(quote.breakdown.setup_cost_per_unit),
            format_usd_unit(quote.breakdown.margin),
            quote.breakdown.discount
        ),
    ];

    if let Some(content) = content {
        lines.insert(1, format!("content: {content}"));
    }
    if let Some(next) = quote.next_price_break() {
        lines.push(format!(
            "next price break: {} pcs at {} each",
            format_quantity(next.quantity),
            format_usd_unit(next.unit_price)
        ));
    }
    lines.push(format!("checkout: {}", quote.checkout_request().description));

    lines.join("\n")
}
