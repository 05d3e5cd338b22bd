use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Highest color count any screen setup can carry (six screens on the press).
pub const MAX_SCREEN_COLORS: u8 = 6;

/// Top-tier upper bound the pricing proxy uses for "and up" ranges.
const OPEN_ENDED_TIER_MAX: u32 = 576;

/// Label of a quantity tier as sent by the pricing API (e.g. "37-72").
pub type TierLabel = String;

/// A quantity range with its own margin and small-batch fee.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierDefinition {
    pub tier_label: TierLabel,
    pub min_quantity: u32,
    pub max_quantity: u32,
    pub margin_denominator: f64,
    pub ltm_fee: f64,
}

impl TierDefinition {
    pub fn contains(&self, quantity: u32) -> bool {
        quantity >= self.min_quantity && quantity <= self.max_quantity
    }

    /// Human-readable range, e.g. "24-36 pieces" or "145+ pieces" for the open top tier.
    pub fn display_range(&self) -> String {
        if self.max_quantity >= OPEN_ENDED_TIER_MAX {
            format!("{}+ pieces", self.min_quantity)
        } else {
            format!("{}-{} pieces", self.min_quantity, self.max_quantity)
        }
    }

    pub fn has_ltm_fee(&self) -> bool {
        self.ltm_fee > 0.0
    }
}

/// Which print-cost column a row belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CostType {
    PrimaryLocation,
    AdditionalLocation,
}

impl CostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CostType::PrimaryLocation => "PrimaryLocation",
            CostType::AdditionalLocation => "AdditionalLocation",
        }
    }
}

impl FromStr for CostType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "PrimaryLocation" => Ok(CostType::PrimaryLocation),
            "AdditionalLocation" => Ok(CostType::AdditionalLocation),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for CostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrintCostEntry {
    pub tier_label: TierLabel,
    pub color_count: u8,
    pub cost_type: CostType,
    pub base_print_cost: f64,
}

/// Exact-match key into the print-cost table.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PrintCostKey {
    pub tier_label: TierLabel,
    pub color_count: u8,
    pub cost_type: CostType,
}

impl PrintCostKey {
    pub fn new(tier_label: &str, color_count: u8, cost_type: CostType) -> Self {
        Self {
            tier_label: tier_label.to_string(),
            color_count,
            cost_type,
        }
    }
}

/// The only rounding the calculator applies: each subtotal up to the next half dollar.
pub const HALF_DOLLAR_CEIL_METHOD: &str = "HalfDollarCeil_Final";

/// Pricing rules section of the bundle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingRules {
    /// Per-color flash (curing) charge added to the front print cost before margin.
    pub flash_charge: f64,
    pub rounding_method: Option<String>,
}

impl PricingRules {
    /// A missing method means the default half-dollar ceiling.
    pub fn rounding_is_half_dollar_ceil(&self) -> bool {
        self.rounding_method
            .as_deref()
            .map_or(true, |method| method == HALF_DOLLAR_CEIL_METHOD)
    }

    pub fn rounding_label(&self) -> &str {
        self.rounding_method.as_deref().unwrap_or(HALF_DOLLAR_CEIL_METHOD)
    }
}

/// Print locations offered on the page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocationId {
    Back,
    LeftChest,
    RightChest,
    LeftSleeve,
    RightSleeve,
    Custom,
}

impl LocationId {
    pub const ALL: [LocationId; 6] = [
        LocationId::Back,
        LocationId::LeftChest,
        LocationId::RightChest,
        LocationId::LeftSleeve,
        LocationId::RightSleeve,
        LocationId::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LocationId::Back => "back",
            LocationId::LeftChest => "left-chest",
            LocationId::RightChest => "right-chest",
            LocationId::LeftSleeve => "left-sleeve",
            LocationId::RightSleeve => "right-sleeve",
            LocationId::Custom => "custom",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LocationId::Back => "Back",
            LocationId::LeftChest => "Left Chest",
            LocationId::RightChest => "Right Chest",
            LocationId::LeftSleeve => "Left Sleeve",
            LocationId::RightSleeve => "Right Sleeve",
            LocationId::Custom => "Other Location",
        }
    }

    /// Chest slots are variants of the primary (front) print and never additional locations.
    pub fn is_front_slot(&self) -> bool {
        matches!(self, LocationId::LeftChest | LocationId::RightChest)
    }
}

impl FromStr for LocationId {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim().to_ascii_lowercase().replace([' ', '_'], "-");
        LocationId::ALL
            .into_iter()
            .find(|id| id.as_str() == needle)
            .ok_or_else(|| format!("unknown print location '{value}'"))
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One additional print location on the garment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdditionalLocation {
    pub location_id: LocationId,
    pub colors: u8,
    #[serde(default)]
    pub has_safety_stripes: bool,
}
