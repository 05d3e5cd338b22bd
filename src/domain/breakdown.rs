use serde::Serialize;

use super::pricing::PricingResult;
use super::selection::SelectionState;
use crate::util::{format_money, plural};

/// One row of the one-time setup fee breakdown.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SetupLine {
    pub label: String,
    pub design_colors: u8,
    pub effective_colors: u8,
    pub has_underbase: bool,
    pub amount: f64,
}

impl SetupLine {
    pub fn describe(&self) -> String {
        let mut text = format!(
            "{} ({} color{})",
            self.label,
            self.effective_colors,
            plural(self.effective_colors.into())
        );
        if self.has_underbase {
            text.push_str(&format!(" ({} design + 1 underbase)", self.design_colors));
        }
        text
    }
}

/// Setup fee rows for every location that actually prints.
pub fn setup_breakdown(result: &PricingResult, selection: &SelectionState) -> Vec<SetupLine> {
    let mut lines = Vec::new();

    if selection.front_colors() > 0 && result.effective_front_colors > 0 {
        lines.push(SetupLine {
            label: "Front".to_string(),
            design_colors: selection.front_colors(),
            effective_colors: result.effective_front_colors,
            has_underbase: selection.is_dark_garment(),
            amount: result.front_setup_fee,
        });
    }

    lines.extend(
        result
            .locations
            .iter()
            .filter(|loc| loc.design_colors > 0)
            .map(|loc| SetupLine {
                label: loc.location_id.label().to_string(),
                design_colors: loc.design_colors,
                effective_colors: loc.effective_colors,
                has_underbase: selection.is_dark_garment(),
                amount: loc.setup_cost,
            }),
    );

    lines
}

/// Single-line price description, e.g.
/// `PC61 - Shirt + 2 Color Front: $4.50 (Shirt: $3.50 + Print: $1.50) + 3 Color Back $2.10 = $6.60`.
pub fn price_summary(result: &PricingResult, selection: &SelectionState, surcharge: f64) -> String {
    let style = selection.style_number().unwrap_or("Item");
    let mut parts = Vec::new();

    if selection.front_colors() > 0 {
        let front_price = if selection.front_has_safety_stripes() {
            result.base_price + surcharge
        } else {
            result.base_price
        };
        let part = if result.garment_cost > 0.0 && result.front_print_cost > 0.0 {
            format!(
                "Shirt + {} Color Front: {} (Shirt: {} + Print: {})",
                result.effective_front_colors,
                format_money(front_price),
                format_money(result.garment_cost),
                format_money(result.front_print_cost)
            )
        } else {
            format!(
                "{} Color Front {}",
                result.effective_front_colors,
                format_money(front_price)
            )
        };
        parts.push(part);
    }

    for loc in result.locations.iter().filter(|loc| loc.design_colors > 0) {
        let price = if loc.has_safety_stripes {
            loc.cost_per_piece + surcharge
        } else {
            loc.cost_per_piece
        };
        parts.push(format!(
            "{} Color {} {}",
            loc.effective_colors,
            loc.location_id.label(),
            format_money(price)
        ));
    }

    if parts.is_empty() {
        return if result.base_price > 0.0 {
            format!("{style} {}", format_money(result.base_price))
        } else {
            style.to_string()
        };
    }

    let mut summary = format!(
        "{style} - {} = {}",
        parts.join(" + "),
        format_money(result.per_shirt_total)
    );
    // any stripes toggle counts, even on a location without colors
    let has_stripes = selection.front_has_safety_stripes()
        || selection
            .additional_locations()
            .iter()
            .any(|loc| loc.has_safety_stripes);
    if has_stripes {
        summary.push_str(" (Includes safety stripe surcharges)");
    }
    summary
}

/// Note explaining what a per-shirt price covers for the current selection.
pub fn tier_note(selection: &SelectionState) -> String {
    let colors = selection.front_colors();
    if colors == 0 {
        return "Prices shown are per shirt for garment only (no printing).".to_string();
    }
    if selection.is_dark_garment() {
        format!(
            "Prices include garment + {colors} design color{} + 1 white underbase ({} total colors) front print.",
            plural(colors.into()),
            colors + 1
        )
    } else {
        format!(
            "Prices shown are per shirt for garment + {colors} color{} front print.",
            plural(colors.into())
        )
    }
}
