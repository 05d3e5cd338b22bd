//! Screen print pricing logic lives here.

pub mod breakdown;
pub mod entities;
pub mod normalize;
pub mod pricing;
pub mod selection;
pub mod tables;

pub use breakdown::{price_summary, setup_breakdown, tier_note, SetupLine};
pub use entities::{
    AdditionalLocation, CostType, LocationId, PricingRules, PrintCostEntry, PrintCostKey,
    TierDefinition, TierLabel, HALF_DOLLAR_CEIL_METHOD, MAX_SCREEN_COLORS,
};
pub use normalize::{
    normalize, DataValidationError, RawPricingBundle, RawPrintCostRow, RawRules, RawTierRow,
    LOAD_FAILURE_MESSAGE,
};
pub use pricing::{
    calculate, effective_colors, half_dollar_ceil, representative_quantity, CalculatorSettings,
    LocationCost, PricingResult, PricingWarning, ScreenPrintCalculator,
};
pub use selection::{SelectionError, SelectionState, MAX_ADDITIONAL_LOCATIONS};
pub use tables::{PricingTables, PrintCostNotFoundError, TierNotFoundError};
