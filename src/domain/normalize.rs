//! Ingestion boundary for the pricing bundle.
//!
//! - Raw rows mirror the API payload (`tiersR`, `allScreenprintCostsR`, `rulesR`).
//! - Numbers may arrive as JSON numbers or numeric strings; garbage coerces to zero.
//! - Missing sections or required fields fail the whole load.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::{
    CostType, PricingRules, PrintCostEntry, TierDefinition, HALF_DOLLAR_CEIL_METHOD, MAX_SCREEN_COLORS,
};
use super::tables::PricingTables;

const TIERS_SECTION: &str = "tiersR";
const COSTS_SECTION: &str = "allScreenprintCostsR";
const RULES_SECTION: &str = "rulesR";

/// Message shown to the user whenever the pricing bundle cannot be used.
pub const LOAD_FAILURE_MESSAGE: &str =
    "Failed to load pricing data. Please refresh the page or contact support.";

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DataValidationError {
    #[error("pricing data is missing the `{0}` section")]
    MissingSection(&'static str),
    #[error("{section} row {index} is missing `{field}`")]
    MissingField {
        section: &'static str,
        index: usize,
        field: &'static str,
    },
    #[error("tier `{label}` has a non-positive margin denominator ({value})")]
    InvalidMargin { label: String, value: f64 },
    #[error("tier `{label}` starts at {min} but ends at {max}")]
    InvertedRange { label: String, min: u32, max: u32 },
}

impl DataValidationError {
    pub fn user_message(&self) -> &'static str {
        LOAD_FAILURE_MESSAGE
    }
}

/// The pricing bundle exactly as the API sends it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawPricingBundle {
    #[serde(rename = "tiersR", default, skip_serializing_if = "Option::is_none")]
    pub tiers: Option<Vec<RawTierRow>>,
    #[serde(
        rename = "allScreenprintCostsR",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub print_costs: Option<Vec<RawPrintCostRow>>,
    #[serde(rename = "rulesR", default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<RawRules>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawTierRow {
    #[serde(
        rename = "TierLabel",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub tier_label: Option<String>,
    #[serde(
        rename = "MinQuantity",
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_quantity: Option<f64>,
    #[serde(
        rename = "MaxQuantity",
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_quantity: Option<f64>,
    #[serde(
        rename = "MarginDenominator",
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub margin_denominator: Option<f64>,
    #[serde(
        rename = "LTM_Fee",
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub ltm_fee: Option<f64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawPrintCostRow {
    #[serde(
        rename = "TierLabel",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub tier_label: Option<String>,
    #[serde(
        rename = "ColorCount",
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub color_count: Option<f64>,
    #[serde(
        rename = "CostType",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub cost_type: Option<String>,
    #[serde(
        rename = "BasePrintCost",
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub base_print_cost: Option<f64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawRules {
    #[serde(
        rename = "FlashCharge",
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub flash_charge: Option<f64>,
    #[serde(
        rename = "RoundingMethod",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub rounding_method: Option<String>,
}

/// Validate the raw bundle and build the lookup tables.
pub fn normalize(bundle: &RawPricingBundle) -> Result<PricingTables, DataValidationError> {
    let raw_tiers = bundle
        .tiers
        .as_ref()
        .ok_or(DataValidationError::MissingSection(TIERS_SECTION))?;
    let raw_costs = bundle
        .print_costs
        .as_ref()
        .ok_or(DataValidationError::MissingSection(COSTS_SECTION))?;
    let raw_rules = bundle
        .rules
        .as_ref()
        .ok_or(DataValidationError::MissingSection(RULES_SECTION))?;

    let flash_charge = raw_rules
        .flash_charge
        .ok_or(DataValidationError::MissingSection("rulesR.FlashCharge"))?;

    let tiers = raw_tiers
        .iter()
        .enumerate()
        .map(|(index, row)| tier_from_row(index, row))
        .collect::<Result<Vec<_>, _>>()?;

    let mut costs = Vec::with_capacity(raw_costs.len());
    for (index, row) in raw_costs.iter().enumerate() {
        if let Some(entry) = print_cost_from_row(index, row)? {
            costs.push(entry);
        }
    }

    let rules = PricingRules {
        flash_charge: non_negative(flash_charge),
        rounding_method: raw_rules.rounding_method.clone(),
    };

    if !rules.rounding_is_half_dollar_ceil() {
        log::warn!(
            "Pricing rules ask for rounding method '{}'; prices are rounded with {}",
            rules.rounding_label(),
            HALF_DOLLAR_CEIL_METHOD
        );
    }

    let tables = PricingTables::new(tiers, costs, rules);
    log::info!(
        "Normalized pricing bundle: {} tiers, {} print costs, colors {:?}, flash {:.2}",
        tables.tiers().len(),
        tables.print_cost_count(),
        tables.available_color_counts(),
        tables.rules().flash_charge
    );
    Ok(tables)
}

fn tier_from_row(index: usize, row: &RawTierRow) -> Result<TierDefinition, DataValidationError> {
    let missing = |field| DataValidationError::MissingField {
        section: TIERS_SECTION,
        index,
        field,
    };

    let tier_label = row.tier_label.clone().ok_or_else(|| missing("TierLabel"))?;
    let min_quantity = quantity(row.min_quantity.ok_or_else(|| missing("MinQuantity"))?);
    let max_quantity = quantity(row.max_quantity.ok_or_else(|| missing("MaxQuantity"))?);
    let margin_denominator = row
        .margin_denominator
        .ok_or_else(|| missing("MarginDenominator"))?;
    let ltm_fee = non_negative(row.ltm_fee.ok_or_else(|| missing("LTM_Fee"))?);

    if !(margin_denominator.is_finite() && margin_denominator > 0.0) {
        return Err(DataValidationError::InvalidMargin {
            label: tier_label,
            value: margin_denominator,
        });
    }
    if min_quantity > max_quantity {
        return Err(DataValidationError::InvertedRange {
            label: tier_label,
            min: min_quantity,
            max: max_quantity,
        });
    }

    Ok(TierDefinition {
        tier_label,
        min_quantity,
        max_quantity,
        margin_denominator,
        ltm_fee,
    })
}

fn print_cost_from_row(
    index: usize,
    row: &RawPrintCostRow,
) -> Result<Option<PrintCostEntry>, DataValidationError> {
    let missing = |field| DataValidationError::MissingField {
        section: COSTS_SECTION,
        index,
        field,
    };

    let tier_label = row.tier_label.clone().ok_or_else(|| missing("TierLabel"))?;
    let raw_colors = row.color_count.ok_or_else(|| missing("ColorCount"))?;
    let raw_type = row.cost_type.as_deref().ok_or_else(|| missing("CostType"))?;
    let base_print_cost = non_negative(row.base_print_cost.ok_or_else(|| missing("BasePrintCost"))?);

    let cost_type = match raw_type.parse::<CostType>() {
        Ok(cost_type) => cost_type,
        Err(other) => {
            log::warn!("Skipping print cost row {index}: unknown cost type '{other}'");
            return Ok(None);
        }
    };

    let rounded = raw_colors.round();
    if !(1.0..=f64::from(MAX_SCREEN_COLORS)).contains(&rounded) {
        log::warn!("Skipping print cost row {index}: color count {raw_colors} out of range");
        return Ok(None);
    }

    Ok(Some(PrintCostEntry {
        tier_label,
        color_count: rounded as u8,
        cost_type,
        base_print_cost,
    }))
}

fn quantity(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round().min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Accepts numbers, numeric strings and null. Unparseable strings become `Some(0.0)`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct NumberOrString;

    impl<'de> serde::de::Visitor<'de> for NumberOrString {
        type Value = Option<f64>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a number, numeric string or null")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            deserializer.deserialize_any(NumberOrString)
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(if value.is_finite() { value } else { 0.0 }))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value as f64))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value as f64))
        }

        fn visit_bool<E>(self, _value: bool) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(0.0))
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(crate::util::parse_amount(value)))
        }
    }

    deserializer.deserialize_any(NumberOrString)
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct StringOrNumber;

    impl<'de> serde::de::Visitor<'de> for StringOrNumber {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string, number or null")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            deserializer.deserialize_any(StringOrNumber)
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }
    }

    deserializer.deserialize_any(StringOrNumber)
}
