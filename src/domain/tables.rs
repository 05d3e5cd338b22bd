use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

use super::entities::{CostType, PricingRules, PrintCostEntry, PrintCostKey, TierDefinition};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("no pricing tier covers a quantity of {quantity}")]
pub struct TierNotFoundError {
    pub quantity: u32,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("no {cost_type} print cost for tier {tier_label} with {color_count} colors")]
pub struct PrintCostNotFoundError {
    pub tier_label: String,
    pub color_count: u8,
    pub cost_type: CostType,
}

/// Validated lookup structures built from the pricing bundle.
#[derive(Clone, Debug, PartialEq)]
pub struct PricingTables {
    /// Kept in source order; the resolver scans front to back.
    tiers: Vec<TierDefinition>,
    print_costs: HashMap<PrintCostKey, f64>,
    available_color_counts: Vec<u8>,
    rules: PricingRules,
}

impl PricingTables {
    pub fn new(tiers: Vec<TierDefinition>, costs: Vec<PrintCostEntry>, rules: PricingRules) -> Self {
        let mut ordered: Vec<TierDefinition> = Vec::with_capacity(tiers.len());
        for tier in tiers {
            match ordered
                .iter_mut()
                .find(|existing| existing.tier_label == tier.tier_label)
            {
                Some(existing) => *existing = tier,
                None => ordered.push(tier),
            }
        }

        let mut print_costs = HashMap::with_capacity(costs.len());
        let mut colors = BTreeSet::new();
        for entry in costs {
            if entry.cost_type == CostType::PrimaryLocation {
                colors.insert(entry.color_count);
            }
            print_costs
                .entry(PrintCostKey::new(
                    &entry.tier_label,
                    entry.color_count,
                    entry.cost_type,
                ))
                .or_insert(entry.base_print_cost);
        }

        Self {
            tiers: ordered,
            print_costs,
            available_color_counts: colors.into_iter().collect(),
            rules,
        }
    }

    pub fn tiers(&self) -> &[TierDefinition] {
        &self.tiers
    }

    pub fn tier(&self, label: &str) -> Option<&TierDefinition> {
        self.tiers.iter().find(|tier| tier.tier_label == label)
    }

    pub fn rules(&self) -> &PricingRules {
        &self.rules
    }

    pub fn available_color_counts(&self) -> &[u8] {
        &self.available_color_counts
    }

    /// Highest primary-location color count priced by the API, 0 when none.
    pub fn max_color_count(&self) -> u8 {
        self.available_color_counts.last().copied().unwrap_or(0)
    }

    pub fn print_cost_count(&self) -> usize {
        self.print_costs.len()
    }

    /// Map a quantity to its tier. First covering range wins; overlap is not checked.
    pub fn resolve_tier(&self, quantity: u32) -> Result<&TierDefinition, TierNotFoundError> {
        match self.tiers.iter().find(|tier| tier.contains(quantity)) {
            Some(tier) => {
                log::debug!("Quantity {quantity} resolved to tier {}", tier.tier_label);
                Ok(tier)
            }
            None => {
                log::warn!("No tier found for quantity {quantity}");
                Err(TierNotFoundError { quantity })
            }
        }
    }

    /// Exact-match print cost lookup.
    pub fn print_cost(&self, tier_label: &str, color_count: u8, cost_type: CostType) -> Option<f64> {
        self.print_costs
            .get(&PrintCostKey::new(tier_label, color_count, cost_type))
            .copied()
    }

    pub fn lookup_print_cost(
        &self,
        tier_label: &str,
        color_count: u8,
        cost_type: CostType,
    ) -> Result<f64, PrintCostNotFoundError> {
        self.print_cost(tier_label, color_count, cost_type)
            .ok_or_else(|| {
                log::warn!(
                    "No print cost found for {tier_label}, {color_count} colors, {cost_type}"
                );
                PrintCostNotFoundError {
                    tier_label: tier_label.to_string(),
                    color_count,
                    cost_type,
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(label: &str, min: u32, max: u32, ltm: f64) -> TierDefinition {
        TierDefinition {
            tier_label: label.to_string(),
            min_quantity: min,
            max_quantity: max,
            margin_denominator: 0.6,
            ltm_fee: ltm,
        }
    }

    fn cost(label: &str, colors: u8, cost_type: CostType, value: f64) -> PrintCostEntry {
        PrintCostEntry {
            tier_label: label.to_string(),
            color_count: colors,
            cost_type,
            base_print_cost: value,
        }
    }

    fn tables() -> PricingTables {
        PricingTables::new(
            vec![
                tier("24-36", 24, 36, 50.0),
                tier("37-72", 37, 72, 0.0),
                tier("73-144", 73, 144, 0.0),
                tier("145-576", 145, 576, 0.0),
            ],
            vec![
                cost("37-72", 2, CostType::PrimaryLocation, 1.2),
                cost("37-72", 2, CostType::AdditionalLocation, 1.9),
                cost("37-72", 6, CostType::PrimaryLocation, 3.4),
            ],
            PricingRules {
                flash_charge: 0.5,
                rounding_method: None,
            },
        )
    }

    #[test]
    fn resolves_tier_boundaries_inclusively() {
        let tables = tables();
        assert_eq!(tables.resolve_tier(24).unwrap().tier_label, "24-36");
        assert_eq!(tables.resolve_tier(36).unwrap().tier_label, "24-36");
        assert_eq!(tables.resolve_tier(37).unwrap().tier_label, "37-72");
        assert_eq!(tables.resolve_tier(576).unwrap().tier_label, "145-576");
    }

    #[test]
    fn uncovered_quantity_is_not_found() {
        let tables = tables();
        assert_eq!(
            tables.resolve_tier(12).unwrap_err(),
            TierNotFoundError { quantity: 12 }
        );
        assert!(tables.resolve_tier(577).is_err());
    }

    #[test]
    fn print_cost_lookup_is_exact() {
        let tables = tables();
        assert_eq!(tables.print_cost("37-72", 2, CostType::PrimaryLocation), Some(1.2));
        assert_eq!(tables.print_cost("37-72", 2, CostType::AdditionalLocation), Some(1.9));
        assert_eq!(tables.print_cost("37-72", 3, CostType::PrimaryLocation), None);
        assert_eq!(tables.print_cost("24-36", 2, CostType::PrimaryLocation), None);

        let err = tables
            .lookup_print_cost("37-72", 4, CostType::AdditionalLocation)
            .unwrap_err();
        assert_eq!(err.color_count, 4);
        assert_eq!(err.cost_type, CostType::AdditionalLocation);
    }

    #[test]
    fn repeated_tier_label_replaces_earlier_row_in_place() {
        let tables = PricingTables::new(
            vec![tier("A", 1, 10, 0.0), tier("B", 11, 20, 0.0), tier("A", 1, 5, 25.0)],
            Vec::new(),
            PricingRules {
                flash_charge: 0.0,
                rounding_method: None,
            },
        );
        assert_eq!(tables.tiers().len(), 2);
        assert_eq!(tables.tiers()[0].max_quantity, 5);
        assert_eq!(tables.tier("A").unwrap().ltm_fee, 25.0);
        assert_eq!(tables.max_color_count(), 0);
    }

    #[test]
    fn max_color_count_ignores_additional_rows() {
        assert_eq!(tables().available_color_counts(), &[2, 6]);
        assert_eq!(tables().max_color_count(), 6);
    }
}
