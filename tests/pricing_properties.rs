use screenprint_pricing::app::{build_calculator, render_quote};
use screenprint_pricing::cli::{LocationArg, QuoteArgs, SourceArgs};
use screenprint_pricing::config::AppConfig;
use screenprint_pricing::domain::{
    calculate, normalize, CalculatorSettings, LocationId, PricingTables, PricingWarning,
    RawPricingBundle, ScreenPrintCalculator, SelectionError, SelectionState,
};

const BUNDLE: &str = include_str!("fixtures/pricing_bundle.json");

fn tables() -> PricingTables {
    let bundle: RawPricingBundle = serde_json::from_str(BUNDLE).unwrap();
    normalize(&bundle).unwrap()
}

fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-9
}

fn selection(tier: &str, dark: bool, base_cost: f64) -> SelectionState {
    let mut state = SelectionState::default();
    state.set_quantity_tier(Some(tier.to_string()));
    state.set_dark_garment(dark);
    state.set_manual_base_cost(base_cost);
    state
}

#[test]
fn base_price_never_drops_when_adding_front_colors() {
    let tables = tables();
    let settings = CalculatorSettings::default();

    for tier in ["24-36", "37-72", "73-144", "145-576"] {
        for dark in [true, false] {
            for base_cost in [0.0, 2.5, 4.0, 11.99] {
                let mut state = selection(tier, dark, base_cost);
                let mut previous = f64::MIN;
                for colors in 0..=6 {
                    state.set_front_colors(colors);
                    let price = calculate(&state, &tables, &settings).base_price;
                    assert!(
                        price >= previous,
                        "{tier} dark={dark} cost={base_cost}: {colors} colors priced {price} < {previous}"
                    );
                    previous = price;
                }
            }
        }
    }
}

#[test]
fn effective_colors_stay_within_screens() {
    let tables = tables();
    let settings = CalculatorSettings::default();

    for dark in [true, false] {
        for requested in 0..=9 {
            let mut state = selection("37-72", dark, 4.0);
            state.set_front_colors(requested);
            let result = calculate(&state, &tables, &settings);

            assert!(result.effective_front_colors <= 6);
            assert!(result.effective_front_colors <= tables.max_color_count());
            if dark {
                assert!(state.front_colors() <= 5);
            }
            if state.front_colors() == 0 {
                assert_eq!(result.effective_front_colors, 0);
                assert!(close(result.front_print_cost, 0.0));
            }
        }
    }
}

#[test]
fn setup_fee_is_order_independent() {
    let tables = tables();
    let settings = CalculatorSettings::default();
    let locations = [
        (LocationId::Back, 3),
        (LocationId::LeftSleeve, 0),
        (LocationId::RightSleeve, 2),
    ];
    let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];

    let mut totals = Vec::new();
    for order in orders {
        let mut state = selection("37-72", true, 4.0);
        state.set_front_colors(2);
        for index in order {
            let (id, colors) = locations[index];
            state.add_location(id, colors).unwrap();
        }
        let result = calculate(&state, &tables, &settings);
        let expected: f64 = result.front_setup_fee
            + result
                .locations
                .iter()
                .map(|loc| f64::from(loc.effective_colors) * settings.setup_fee_per_color)
                .sum::<f64>();
        assert!(close(result.total_setup_fee, expected));
        totals.push(result.total_setup_fee);
    }

    // front 3 + back 4 + right sleeve 3 effective colors
    assert!(totals.iter().all(|total| close(*total, 10.0 * 30.0)));
}

#[test]
fn full_quote_from_bundle() {
    let tables = tables();
    let mut state = selection("37-72", true, 4.0);
    state.set_front_colors(2);
    state.add_location(LocationId::Back, 1).unwrap();

    let result = calculate(&state, &tables, &CalculatorSettings::default());
    assert_eq!(result.tier_label.as_deref(), Some("37-72"));
    assert_eq!(result.representative_quantity, 37);
    assert!(close(result.garment_cost, 7.0));
    assert!(close(result.front_print_cost, 6.0));
    assert!(close(result.base_price, 12.5));
    assert!(close(result.additional_cost, 2.75));
    assert!(close(result.per_shirt_total, 15.25));
    assert!(close(result.total_setup_fee, 150.0));
    assert!(close(result.ltm_fee, 0.0));
    assert!(result.warnings.is_empty());
}

#[test]
fn small_batch_fee_is_flat_per_order() {
    let tables = tables();
    let settings = CalculatorSettings::default();
    let mut state = selection("24-36", true, 4.0);

    assert!(close(calculate(&state, &tables, &settings).ltm_fee, 50.0));
    state.set_front_colors(5);
    state.add_location(LocationId::Back, 5).unwrap();
    state.add_location(LocationId::LeftSleeve, 2).unwrap();
    state.add_location(LocationId::Custom, 1).unwrap();
    assert!(close(calculate(&state, &tables, &settings).ltm_fee, 50.0));

    state.set_quantity_tier(Some("73-144".to_string()));
    assert!(close(calculate(&state, &tables, &settings).ltm_fee, 0.0));
}

#[test]
fn fourth_location_leaves_state_at_three() {
    let mut calculator = ScreenPrintCalculator::new(tables(), CalculatorSettings::default());
    let selection = calculator.selection_mut();
    selection.add_location(LocationId::Back, 1).unwrap();
    selection.add_location(LocationId::LeftSleeve, 1).unwrap();
    selection.add_location(LocationId::RightSleeve, 1).unwrap();

    assert_eq!(
        selection.add_location(LocationId::Custom, 2),
        Err(SelectionError::TooManyLocations)
    );
    assert_eq!(calculator.calculate().locations.len(), 3);
}

#[test]
fn sparse_additional_costs_warn_instead_of_failing() {
    let tables = tables();
    let mut state = selection("73-144", false, 3.0);
    state.add_location(LocationId::Back, 1).unwrap();

    let result = calculate(&state, &tables, &CalculatorSettings::default());
    assert!(close(result.additional_cost, 0.0));
    assert!(result.base_price > 0.0);
    assert!(matches!(
        result.warnings.as_slice(),
        [PricingWarning::PrintCostNotFound { color_count: 1, .. }]
    ));
}

#[test]
fn command_line_selection_renders_quote() {
    let config = AppConfig::default();
    let args = QuoteArgs {
        tier: Some("37-72".to_string()),
        colors: 2,
        light: false,
        front_stripes: false,
        garment_cost: "$4.00".to_string(),
        locations: vec!["back:1".parse::<LocationArg>().unwrap()],
        style: Some("PC61".to_string()),
        garment_color: Some("Jet Black".to_string()),
        json: false,
        source: SourceArgs::default(),
    };

    let calculator = build_calculator(tables(), &config, &args).unwrap();
    let result = calculator.calculate();
    let text = render_quote(&result, calculator.selection(), &config);

    assert!(text.contains("Tier: 37-72"));
    assert!(text.contains("Garment color: Jet Black"));
    assert!(text.contains("Price per shirt: $15.25"));
    assert!(text.contains("Front (3 colors) (2 design + 1 underbase): $90.00"));
    assert!(text.contains("Back (2 colors) (1 design + 1 underbase): $60.00"));
    assert!(text.contains("Total: $150.00"));
    assert!(!text.contains("Warning"));
}

#[test]
fn command_line_rejects_unknown_tier() {
    let args = QuoteArgs {
        tier: Some("1-5".to_string()),
        colors: 1,
        light: false,
        front_stripes: false,
        garment_cost: "4".to_string(),
        locations: Vec::new(),
        style: None,
        garment_color: None,
        json: false,
        source: SourceArgs::default(),
    };

    let err = build_calculator(tables(), &AppConfig::default(), &args).unwrap_err();
    assert!(err.to_string().contains("unknown quantity tier"));
}

#[test]
fn stored_selection_outside_the_limits_never_reaches_pricing() {
    let stored = serde_json::json!({
        "quantity_tier": "37-72",
        "front_colors": 6,
        "is_dark_garment": true,
        "manual_base_garment_cost": 4.0,
        "additional_locations": [
            { "location_id": "back", "colors": 1 },
            { "location_id": "back", "colors": 1 },
            { "location_id": "left-chest", "colors": 1 },
            { "location_id": "custom", "colors": 1 }
        ]
    });
    assert!(serde_json::from_value::<SelectionState>(stored).is_err());

    let duplicate_only = serde_json::json!({
        "front_colors": 2,
        "is_dark_garment": true,
        "additional_locations": [
            { "location_id": "back", "colors": 1 },
            { "location_id": "back", "colors": 1 }
        ]
    });
    assert!(serde_json::from_value::<SelectionState>(duplicate_only).is_err());

    let within_limits = serde_json::json!({
        "quantity_tier": "37-72",
        "front_colors": 2,
        "is_dark_garment": true,
        "manual_base_garment_cost": 4.0,
        "additional_locations": [{ "location_id": "back", "colors": 1 }]
    });
    let state: SelectionState = serde_json::from_value(within_limits).unwrap();
    let result = calculate(&state, &tables(), &CalculatorSettings::default());
    assert!(close(result.per_shirt_total, 15.25));
    assert!(close(result.total_setup_fee, 150.0));
}
