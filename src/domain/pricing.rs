//! Per-shirt price, setup fees and LTM fee for a screen print selection.
//!
//! Everything here is a pure function of the selection and the pricing tables.
//! Nothing is cached between calls; every input change recomputes the whole result.

use serde::{Deserialize, Serialize};

use super::entities::{AdditionalLocation, CostType, LocationId, TierDefinition};
use super::selection::{SelectionError, SelectionState};
use super::tables::{PricingTables, PrintCostNotFoundError, TierNotFoundError};

/// Fixed business constants that do not come from the pricing API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorSettings {
    pub setup_fee_per_color: f64,
    pub safety_stripe_surcharge: f64,
    /// Quantity used to price when no tier has been picked yet.
    pub default_quantity: u32,
    pub minimum_quantity: u32,
}

impl Default for CalculatorSettings {
    fn default() -> Self {
        Self {
            setup_fee_per_color: 30.0,
            safety_stripe_surcharge: 2.0,
            default_quantity: 37,
            minimum_quantity: 24,
        }
    }
}

/// Round up to the next half dollar.
pub fn half_dollar_ceil(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 0.0;
    }
    (value * 2.0).ceil() / 2.0
}

/// Design colors plus the underbase screen on dark garments, capped at what the tables price.
pub fn effective_colors(design_colors: u8, is_dark_garment: bool, max_available: u8) -> u8 {
    if design_colors == 0 {
        return 0;
    }
    let with_underbase = if is_dark_garment {
        design_colors.saturating_add(1)
    } else {
        design_colors
    };
    if with_underbase > max_available {
        log::debug!("Capping effective colors from {with_underbase} to {max_available}");
    }
    with_underbase.min(max_available)
}

/// Non-fatal problems met while pricing; affected line items price at zero.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PricingWarning {
    TierNotFound { quantity: u32 },
    PrintCostNotFound {
        tier_label: String,
        color_count: u8,
        cost_type: CostType,
    },
}

impl From<TierNotFoundError> for PricingWarning {
    fn from(err: TierNotFoundError) -> Self {
        PricingWarning::TierNotFound {
            quantity: err.quantity,
        }
    }
}

impl From<PrintCostNotFoundError> for PricingWarning {
    fn from(err: PrintCostNotFoundError) -> Self {
        PricingWarning::PrintCostNotFound {
            tier_label: err.tier_label,
            color_count: err.color_count,
            cost_type: err.cost_type,
        }
    }
}

impl std::fmt::Display for PricingWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PricingWarning::TierNotFound { quantity } => {
                write!(f, "No pricing tier found for {quantity} pieces; prices shown as $0.00")
            }
            PricingWarning::PrintCostNotFound {
                tier_label,
                color_count,
                cost_type,
            } => write!(
                f,
                "No {cost_type} print cost for {color_count} colors in tier {tier_label}"
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LocationCost {
    pub location_id: LocationId,
    pub design_colors: u8,
    pub effective_colors: u8,
    pub has_safety_stripes: bool,
    /// Already carries margin from the API; never divided again.
    pub cost_per_piece: f64,
    pub setup_cost: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PricingResult {
    pub tier_label: Option<String>,
    pub representative_quantity: u32,
    pub effective_front_colors: u8,
    pub garment_cost: f64,
    pub front_print_cost: f64,
    pub base_price: f64,
    pub locations: Vec<LocationCost>,
    pub additional_cost: f64,
    pub safety_stripe_surcharge: f64,
    pub per_shirt_total: f64,
    pub front_setup_fee: f64,
    pub total_setup_fee: f64,
    pub ltm_fee: f64,
    pub warnings: Vec<PricingWarning>,
}

impl PricingResult {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

struct FrontPrice {
    garment_cost: f64,
    front_print_cost: f64,
    base_price: f64,
}

impl FrontPrice {
    const ZERO: FrontPrice = FrontPrice {
        garment_cost: 0.0,
        front_print_cost: 0.0,
        base_price: 0.0,
    };
}

/// Quantity used for the tier lookup: the selected range's minimum.
pub fn representative_quantity(
    selection: &SelectionState,
    tables: &PricingTables,
    settings: &CalculatorSettings,
) -> u32 {
    match selection.quantity_tier() {
        Some(label) => tables
            .tier(label)
            .map(|tier| tier.min_quantity)
            .unwrap_or(0),
        None => settings.default_quantity,
    }
}

pub fn calculate(
    selection: &SelectionState,
    tables: &PricingTables,
    settings: &CalculatorSettings,
) -> PricingResult {
    let mut warnings = Vec::new();
    let quantity = representative_quantity(selection, tables, settings);
    let tier = match tables.resolve_tier(quantity) {
        Ok(tier) => Some(tier),
        Err(err) => {
            warnings.push(PricingWarning::from(err));
            None
        }
    };

    let max_available = tables.max_color_count();
    let effective_front = effective_colors(
        selection.front_colors(),
        selection.is_dark_garment(),
        max_available,
    );

    let front = tier
        .map(|tier| front_price(selection, tables, tier, effective_front, &mut warnings))
        .unwrap_or(FrontPrice::ZERO);

    let locations: Vec<LocationCost> = selection
        .additional_locations()
        .iter()
        .map(|location| {
            location_cost(
                location,
                selection.is_dark_garment(),
                max_available,
                tables,
                tier,
                settings,
                &mut warnings,
            )
        })
        .collect();

    let additional_cost: f64 = locations.iter().map(|loc| loc.cost_per_piece).sum();
    let front_setup_fee = if selection.front_colors() > 0 {
        f64::from(effective_front) * settings.setup_fee_per_color
    } else {
        0.0
    };
    let total_setup_fee = front_setup_fee + locations.iter().map(|loc| loc.setup_cost).sum::<f64>();

    let ltm_fee = tier
        .filter(|tier| tier.has_ltm_fee())
        .map(|tier| tier.ltm_fee)
        .unwrap_or(0.0);

    let safety_stripe_surcharge = safety_stripe_surcharge(selection, settings);
    let per_shirt_total = front.base_price + additional_cost + safety_stripe_surcharge;

    PricingResult {
        tier_label: tier.map(|tier| tier.tier_label.clone()),
        representative_quantity: quantity,
        effective_front_colors: effective_front,
        garment_cost: front.garment_cost,
        front_print_cost: front.front_print_cost,
        base_price: front.base_price,
        locations,
        additional_cost,
        safety_stripe_surcharge,
        per_shirt_total,
        front_setup_fee,
        total_setup_fee,
        ltm_fee,
        warnings,
    }
}

fn front_price(
    selection: &SelectionState,
    tables: &PricingTables,
    tier: &TierDefinition,
    effective_front: u8,
    warnings: &mut Vec<PricingWarning>,
) -> FrontPrice {
    let base_cost = selection.manual_base_garment_cost();
    if !(base_cost.is_finite() && base_cost > 0.0) {
        return FrontPrice::ZERO;
    }

    let margin = tier.margin_denominator;
    let garment_with_margin = base_cost / margin;

    let print_cost = if selection.front_colors() > 0 {
        tables
            .lookup_print_cost(&tier.tier_label, effective_front, CostType::PrimaryLocation)
            .unwrap_or_else(|err| {
                warnings.push(err.into());
                0.0
            })
    } else {
        0.0
    };

    let flash_total = tables.rules().flash_charge * f64::from(effective_front);
    let print_with_margin = (print_cost + flash_total) / margin;
    let subtotal = garment_with_margin + print_with_margin;

    log::debug!(
        "Front pricing: base {base_cost:.2} / margin {margin} = {garment_with_margin:.2}, \
         print {print_cost:.2} + flash {flash_total:.2} => {print_with_margin:.2}, subtotal {subtotal:.2}"
    );

    FrontPrice {
        garment_cost: half_dollar_ceil(garment_with_margin),
        front_print_cost: half_dollar_ceil(print_with_margin),
        base_price: half_dollar_ceil(subtotal),
    }
}

fn location_cost(
    location: &AdditionalLocation,
    is_dark_garment: bool,
    max_available: u8,
    tables: &PricingTables,
    tier: Option<&TierDefinition>,
    settings: &CalculatorSettings,
    warnings: &mut Vec<PricingWarning>,
) -> LocationCost {
    let effective = effective_colors(location.colors, is_dark_garment, max_available);

    let cost_per_piece = match tier {
        Some(tier) if effective > 0 => tables
            .lookup_print_cost(&tier.tier_label, effective, CostType::AdditionalLocation)
            .unwrap_or_else(|err| {
                warnings.push(err.into());
                0.0
            }),
        _ => 0.0,
    };

    LocationCost {
        location_id: location.location_id,
        design_colors: location.colors,
        effective_colors: effective,
        has_safety_stripes: location.has_safety_stripes,
        cost_per_piece,
        setup_cost: f64::from(effective) * settings.setup_fee_per_color,
    }
}

fn safety_stripe_surcharge(selection: &SelectionState, settings: &CalculatorSettings) -> f64 {
    let front = usize::from(selection.front_has_safety_stripes() && selection.front_colors() > 0);
    let extra = selection
        .additional_locations()
        .iter()
        .filter(|loc| loc.has_safety_stripes && loc.colors > 0)
        .count();
    (front + extra) as f64 * settings.safety_stripe_surcharge
}

/// A loaded calculator: tables from the API plus the user's selection.
#[derive(Clone, Debug)]
pub struct ScreenPrintCalculator {
    tables: PricingTables,
    settings: CalculatorSettings,
    selection: SelectionState,
}

impl ScreenPrintCalculator {
    pub fn new(tables: PricingTables, settings: CalculatorSettings) -> Self {
        Self {
            tables,
            settings,
            selection: SelectionState::default(),
        }
    }

    pub fn tables(&self) -> &PricingTables {
        &self.tables
    }

    pub fn settings(&self) -> &CalculatorSettings {
        &self.settings
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionState {
        &mut self.selection
    }

    /// Pick a quantity range by its tier label.
    pub fn select_quantity_tier(&mut self, label: &str) -> Result<&TierDefinition, SelectionError> {
        let tier = self
            .tables
            .tier(label)
            .ok_or_else(|| SelectionError::UnknownTier(label.to_string()))?;
        self.selection.set_quantity_tier(Some(tier.tier_label.clone()));
        Ok(tier)
    }

    pub fn calculate(&self) -> PricingResult {
        calculate(&self.selection, &self.tables, &self.settings)
    }

    /// Per-shirt total, or zero when nothing can be priced yet.
    pub fn current_price(&self) -> f64 {
        self.calculate().per_shirt_total
    }
}
