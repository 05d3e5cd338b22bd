use anyhow::{Context, Result};

use crate::{
    cli::{Cli, Commands, QuoteArgs, SourceArgs},
    config::AppConfig,
    domain::{
        normalize, price_summary, setup_breakdown, tier_note, PricingResult, PricingTables,
        ScreenPrintCalculator, SelectionState, LOAD_FAILURE_MESSAGE,
    },
    infra::{cache, CacheStatus, PricingApiClient},
    util::format_money,
};

pub async fn run(cli: Cli, config: AppConfig) -> Result<()> {
    match cli.command {
        Commands::Quote(args) => run_quote(&config, args).await,
        Commands::Tiers { source } => run_tiers(&config, &source).await,
        Commands::Fetch => run_fetch(&config).await,
    }
}

/// Load and validate the pricing tables. Any failure here blocks the calculator.
pub async fn load_tables(config: &AppConfig, source: &SourceArgs) -> Result<PricingTables> {
    if let Some(path) = &source.bundle {
        let bundle = cache::load_bundle_file(path)
            .with_context(|| format!("failed to read pricing bundle {}", path.display()))?;
        return Ok(normalize(&bundle)?);
    }

    if source.offline {
        let snapshot = cache::load_default_snapshot()
            .context("no saved pricing snapshot; run `fetch` first")?;
        return Ok(normalize(&snapshot.bundle)?);
    }

    let client = PricingApiClient::new(&config.api)?;
    match client.get_pricing_tables().await {
        Ok(payload) => {
            if payload.status == CacheStatus::Cached {
                log::debug!("Pricing tables served from cache");
            }
            Ok(payload.data)
        }
        Err(err) => {
            log::error!("Error loading pricing data: {err}");
            Err(anyhow::Error::new(err).context(LOAD_FAILURE_MESSAGE))
        }
    }
}

/// Apply command-line choices to a fresh selection in the order the page applies them.
pub fn build_calculator(tables: PricingTables, config: &AppConfig, args: &QuoteArgs) -> Result<ScreenPrintCalculator> {
    let mut calculator = ScreenPrintCalculator::new(tables, config.pricing.clone());

    if let Some(tier) = &args.tier {
        calculator.select_quantity_tier(tier)?;
    }

    let selection = calculator.selection_mut();
    selection.set_dark_garment(!args.light);
    let applied = selection.set_front_colors(args.colors);
    if applied != args.colors {
        log::warn!("Front colors reduced to {applied} (dark garment limit)");
    }
    if args.front_stripes {
        selection.set_front_safety_stripes(true);
    }
    selection.set_manual_base_cost_str(&args.garment_cost);
    selection.set_style_number(args.style.clone());
    selection.set_garment_color(args.garment_color.clone());

    for location in &args.locations {
        selection.add_location(location.location_id, location.colors)?;
        if location.safety_stripes {
            let index = selection.additional_locations().len() - 1;
            selection.set_location_safety_stripes(index, true)?;
        }
    }

    Ok(calculator)
}

async fn run_quote(config: &AppConfig, args: QuoteArgs) -> Result<()> {
    let tables = load_tables(config, &args.source).await?;
    let calculator = build_calculator(tables, config, &args)?;
    let result = calculator.calculate();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_quote(&result, calculator.selection(), config));
    }
    Ok(())
}

pub fn render_quote(result: &PricingResult, selection: &SelectionState, config: &AppConfig) -> String {
    let mut out = String::new();

    let tier = result.tier_label.as_deref().unwrap_or("none");
    out.push_str(&format!("Tier: {tier}\n"));
    if let Some(color) = selection.garment_color() {
        out.push_str(&format!("Garment color: {color}\n"));
    }
    out.push_str(&format!("Price per shirt: {}\n", format_money(result.per_shirt_total)));
    out.push_str(&format!(
        "{}\n",
        price_summary(result, selection, config.pricing.safety_stripe_surcharge)
    ));
    out.push_str(&format!("{}\n", tier_note(selection)));

    let lines = setup_breakdown(result, selection);
    if !lines.is_empty() {
        out.push_str("Setup fees (one-time):\n");
        for line in &lines {
            out.push_str(&format!("  {}: {}\n", line.describe(), format_money(line.amount)));
        }
        out.push_str(&format!("  Total: {}\n", format_money(result.total_setup_fee)));
    }
    if result.ltm_fee > 0.0 {
        out.push_str(&format!(
            "Less-than-minimum fee (one-time): {}\n",
            format_money(result.ltm_fee)
        ));
    }
    for warning in &result.warnings {
        out.push_str(&format!("Warning: {warning}\n"));
    }
    out
}

async fn run_tiers(config: &AppConfig, source: &SourceArgs) -> Result<()> {
    let tables = load_tables(config, source).await?;
    println!("{:<12} {:<16} {:>8} {:>10}", "Tier", "Range", "Margin", "LTM fee");
    for tier in tables.tiers() {
        println!(
            "{:<12} {:<16} {:>8.2} {:>10}",
            tier.tier_label,
            tier.display_range(),
            tier.margin_denominator,
            format_money(tier.ltm_fee)
        );
    }
    println!("Colors priced: {:?}", tables.available_color_counts());
    println!("Rounding: {}", tables.rules().rounding_label());
    println!("Minimum order quantity: {} pieces", config.pricing.minimum_quantity);
    Ok(())
}

async fn run_fetch(config: &AppConfig) -> Result<()> {
    let client = PricingApiClient::new(&config.api)?;
    let payload = client
        .get_pricing_bundle()
        .await
        .context(LOAD_FAILURE_MESSAGE)?;
    let path = cache::save_default_snapshot(payload.data).context("failed to save pricing snapshot")?;
    println!("Saved pricing bundle to {}", path.display());
    Ok(())
}
