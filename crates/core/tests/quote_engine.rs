use std::sync::Arc;

use chrono::NaiveDate;
use packquote_core::{
    BagTypeId, CatalogRegistry, ConstraintRules, DeliveryPolicy, MaterialId, PricingPolicy,
    ProcessId, QuoteEngine, QuoteError, QuoteInput, QuoteRuntime, Selection,
};
use rust_decimal::{Decimal, RoundingStrategy};

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 6).expect("valid date")
}

fn engine() -> QuoteEngine {
    QuoteEngine::default()
}

fn reference_input(quantity: u32) -> QuoteInput {
    QuoteInput::new("stand-up", "md", "pet-pe", quantity, 4)
}

#[test]
fn end_to_end_reference_configuration() {
    let quote = engine().quote_on(&reference_input(1_000), monday()).expect("quote");

    // (0.352 + 4 * 0.12 * 0.044) * 0.88 * 1.25 = 0.410432
    assert_eq!(quote.unit_price, Decimal::new(4104, 4));
    assert_eq!(quote.total_price, Decimal::new(41040, 2));
    assert_eq!(quote.surface_area, Decimal::new(44, 3));
    assert_eq!(quote.breakdown.material_cost, Decimal::new(3098, 4));
    assert_eq!(quote.breakdown.printing_cost, Decimal::new(186, 4));
    assert_eq!(quote.breakdown.margin, Decimal::new(820, 4));
    assert_eq!(quote.breakdown.discount, Decimal::new(88, 2));
}

#[test]
fn unit_price_never_rises_with_quantity() {
    let quantities = [
        10, 50, 99, 100, 250, 499, 500, 999, 1_000, 2_499, 2_500, 4_999, 5_000, 9_999, 10_000,
        24_999, 25_000, 49_999, 50_000, 100_000, 100_001, 250_000,
    ];
    let configurations = [
        reference_input(0),
        reference_input(0).with_process("gravure").with_process("zipper"),
        QuoteInput::new("flat-bottom", "xl", "pet-al-pe", 0, 8)
            .with_process("flexo")
            .with_process("matte-lamination")
            .with_process("valve"),
        QuoteInput::new("gusseted", "custom", "kraft-pla", 0, 1)
            .with_custom_dimensions(140, 200, Some(80))
            .with_process("digital")
            .with_process("tin-tie"),
    ];

    let engine = engine();
    for configuration in configurations {
        let prices: Vec<Decimal> = quantities
            .iter()
            .map(|quantity| {
                let input = QuoteInput { quantity: *quantity, ..configuration.clone() };
                engine.quote_on(&input, monday()).expect("quote").unit_price
            })
            .collect();

        for (pair, window) in quantities.windows(2).zip(prices.windows(2)) {
            assert!(
                window[1] <= window[0],
                "unit price rose from {} at {} to {} at {}",
                window[0],
                pair[0],
                window[1],
                pair[1]
            );
        }
    }
}

#[test]
fn identical_input_gives_identical_output() {
    let engine = engine();
    let input = reference_input(3_333).with_process("flexo").with_process("spot-uv");

    let first = engine.quote_on(&input, monday()).expect("quote");
    let second = engine.quote_on(&input, monday()).expect("quote");

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).expect("serialize"),
        serde_json::to_string(&second).expect("serialize")
    );
}

#[test]
fn tolerance_band_is_ordered() {
    let engine = engine();
    for quantity in [10, 19, 101, 1_000, 7_777, 150_000] {
        let quote = engine.quote_on(&reference_input(quantity), monday()).expect("quote");

        assert!(quote.tolerance_low.quantity <= quote.quantity);
        assert!(quote.quantity <= quote.tolerance_high.quantity);
        assert!(quote.tolerance_low.price <= quote.tolerance_target.price);
        assert!(quote.tolerance_target.price <= quote.tolerance_high.price);
        assert_eq!(quote.tolerance_target.price, quote.total_price);
    }
}

#[test]
fn breakdown_reconstructs_unit_price() {
    let engine = engine();
    let inputs = [
        reference_input(1_000),
        reference_input(37).with_process("gravure").with_process("holographic"),
        QuoteInput::new("flat-pouch", "sm", "silver", 12_345, 3)
            .with_process("digital")
            .with_process("hang-hole-euro")
            .with_process("round-corner"),
    ];

    for input in inputs {
        let quote = engine.quote_on(&input, monday()).expect("quote");
        assert_eq!(quote.breakdown.reconstructed_unit_price(), quote.unit_price);
    }
}

#[test]
fn quantity_below_floor_is_priced_at_floor() {
    let quote = engine().quote_on(&reference_input(1), monday()).expect("quote");

    assert_eq!(quote.quantity, 10);
    assert_eq!(
        quote.total_price,
        (quote.unit_price * Decimal::from(10))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    );
}

#[test]
fn overflow_discount_applies_above_last_tier() {
    let engine = engine();
    let at_edge = engine.quote_on(&reference_input(100_000), monday()).expect("quote");
    let above = engine.quote_on(&reference_input(100_001), monday()).expect("quote");

    assert_eq!(at_edge.breakdown.discount, Decimal::new(42, 2));
    assert_eq!(above.breakdown.discount, Decimal::new(38, 2));
}

#[test]
fn moq_follows_the_printing_method() {
    let engine = engine();

    let gravure = engine
        .quote_on(&reference_input(50).with_process("gravure"), monday())
        .expect("quote");
    assert!(!gravure.moq_met);
    assert_eq!(gravure.moq_required, 3_000);

    let digital = engine
        .quote_on(&reference_input(150).with_process("digital"), monday())
        .expect("quote");
    assert!(digital.moq_met);
    assert_eq!(digital.moq_required, 100);

    let flexo = engine
        .quote_on(&reference_input(1_000).with_process("flexo"), monday())
        .expect("quote");
    assert!(flexo.moq_met);
}

#[test]
fn delivery_dates_skip_weekends() {
    let engine = engine();
    let input = reference_input(20_000).with_process("digital").with_process("spot-uv");
    let quote = engine.quote_on(&input, monday()).expect("quote");

    // 5+3+2 .. 8+5+3 business days from Monday 6 May 2024
    assert_eq!(quote.delivery.min_days, 10);
    assert_eq!(quote.delivery.max_days, 16);
    assert_eq!(quote.delivery.earliest, NaiveDate::from_ymd_opt(2024, 5, 20).expect("date"));
    assert_eq!(quote.delivery.latest, NaiveDate::from_ymd_opt(2024, 5, 28).expect("date"));
}

#[test]
fn price_breaks_amortize_setup_over_tier_minimum() {
    let quote = engine()
        .quote_on(&reference_input(1_000).with_process("gravure"), monday())
        .expect("quote");
    let row = quote
        .price_breaks
        .iter()
        .find(|row| row.quantity == 1_000)
        .expect("1000 row");

    assert_eq!(row.unit_price, quote.unit_price);
    assert_eq!(quote.next_price_break().map(|row| row.quantity), Some(2_500));
}

#[test]
fn spout_and_zipper_replace_each_other() {
    let engine = engine();
    let configurator = engine.configurator();
    let start = Selection {
        bag_type: BagTypeId::new("stand-up"),
        material: MaterialId::new("pet-pe"),
        processes: Default::default(),
    };

    let spout_then_zipper = configurator
        .select(&start, &ProcessId::new("spout-corner"))
        .and_then(|state| configurator.select(&state, &ProcessId::new("zipper")))
        .expect("selection");
    assert_eq!(spout_then_zipper.processes.len(), 1);
    assert!(spout_then_zipper.processes.contains(&ProcessId::new("zipper")));

    let zipper_then_spout = configurator
        .select(&start, &ProcessId::new("zipper"))
        .and_then(|state| configurator.select(&state, &ProcessId::new("spout-corner")))
        .expect("selection");
    assert_eq!(zipper_then_spout.processes.len(), 1);
    assert!(zipper_then_spout.processes.contains(&ProcessId::new("spout-corner")));
}

#[test]
fn custom_policy_and_catalog_are_injected() {
    let catalog = CatalogRegistry::from_toml_str(include_str!("fixtures/mini_catalog.toml"))
        .expect("fixture catalog");
    let engine = QuoteEngine::new(
        Arc::new(catalog),
        ConstraintRules::default(),
        PricingPolicy { margin: Decimal::ZERO, ..PricingPolicy::default() },
        DeliveryPolicy::default(),
    )
    .expect("engine");

    let quote = engine
        .quote_on(&QuoteInput::new("pillow", "one", "film", 100, 1), monday())
        .expect("quote");
    // area 0.05 * cost 10 + 1 * 0.12 * 0.05 at discount 1.0, no margin
    assert_eq!(quote.unit_price, Decimal::new(506, 3));
    assert_eq!(quote.moq_required, 10);

    let error = engine
        .quote_on(&reference_input(100), monday())
        .expect_err("builtin ids are not in the fixture catalog");
    assert_eq!(error, QuoteError::UnknownBagType(BagTypeId::new("stand-up")));
}

#[test]
fn standard_rules_reject_a_catalog_missing_their_ids() {
    let catalog = CatalogRegistry::from_toml_str(include_str!("fixtures/mini_catalog.toml"))
        .expect("fixture catalog");
    let result = QuoteEngine::new(
        Arc::new(catalog),
        ConstraintRules::standard(),
        PricingPolicy::default(),
        DeliveryPolicy::default(),
    );

    assert!(result.is_err());
}
