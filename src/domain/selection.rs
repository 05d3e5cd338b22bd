use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::{AdditionalLocation, LocationId, TierLabel, MAX_SCREEN_COLORS};

pub const MAX_ADDITIONAL_LOCATIONS: usize = 3;

/// Safety stripes are a fixed four-color design on the front.
pub const FRONT_SAFETY_STRIPE_COLORS: u8 = 4;
/// And a three-color design on any additional location.
pub const LOCATION_SAFETY_STRIPE_COLORS: u8 = 3;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("maximum 3 additional locations")]
    TooManyLocations,
    #[error("{0} is already selected")]
    DuplicateLocation(LocationId),
    #[error("{0} is a front location and is priced with the front print")]
    FrontLocation(LocationId),
    #[error("no additional location at position {0}")]
    NoSuchLocation(usize),
    #[error("unknown quantity tier '{0}'")]
    UnknownTier(String),
    #[error("{colors} colors exceeds the limit of {max} for this garment")]
    TooManyColors { colors: u8, max: u8 },
}

/// Everything the user has picked on the calculator page.
///
/// Fields only change through the guarded setters, and deserialized states
/// go through [`SelectionState::validate`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SelectionStateData")]
pub struct SelectionState {
    quantity_tier: Option<TierLabel>,
    front_colors: u8,
    front_has_safety_stripes: bool,
    is_dark_garment: bool,
    additional_locations: Vec<AdditionalLocation>,
    manual_base_garment_cost: f64,
    garment_color: Option<String>,
    style_number: Option<String>,
}

#[derive(Deserialize)]
struct SelectionStateData {
    #[serde(default)]
    quantity_tier: Option<TierLabel>,
    front_colors: u8,
    #[serde(default)]
    front_has_safety_stripes: bool,
    is_dark_garment: bool,
    #[serde(default)]
    additional_locations: Vec<AdditionalLocation>,
    #[serde(default)]
    manual_base_garment_cost: f64,
    #[serde(default)]
    garment_color: Option<String>,
    #[serde(default)]
    style_number: Option<String>,
}

impl TryFrom<SelectionStateData> for SelectionState {
    type Error = SelectionError;

    fn try_from(data: SelectionStateData) -> Result<Self, Self::Error> {
        let mut state = Self {
            quantity_tier: data.quantity_tier,
            front_colors: data.front_colors,
            front_has_safety_stripes: data.front_has_safety_stripes,
            is_dark_garment: data.is_dark_garment,
            additional_locations: data.additional_locations,
            manual_base_garment_cost: 0.0,
            garment_color: data.garment_color,
            style_number: data.style_number,
        };
        state.set_manual_base_cost(data.manual_base_garment_cost);
        state.validate()?;
        Ok(state)
    }
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            quantity_tier: None,
            front_colors: 1,
            front_has_safety_stripes: false,
            is_dark_garment: true,
            additional_locations: Vec::new(),
            manual_base_garment_cost: 0.0,
            garment_color: None,
            style_number: None,
        }
    }
}

impl SelectionState {
    pub fn quantity_tier(&self) -> Option<&str> {
        self.quantity_tier.as_deref()
    }

    pub fn front_colors(&self) -> u8 {
        self.front_colors
    }

    pub fn front_has_safety_stripes(&self) -> bool {
        self.front_has_safety_stripes
    }

    pub fn is_dark_garment(&self) -> bool {
        self.is_dark_garment
    }

    pub fn additional_locations(&self) -> &[AdditionalLocation] {
        &self.additional_locations
    }

    pub fn manual_base_garment_cost(&self) -> f64 {
        self.manual_base_garment_cost
    }

    pub fn garment_color(&self) -> Option<&str> {
        self.garment_color.as_deref()
    }

    pub fn style_number(&self) -> Option<&str> {
        self.style_number.as_deref()
    }

    /// Check the location and color limits on a state built outside the setters.
    pub fn validate(&self) -> Result<(), SelectionError> {
        if self.additional_locations.len() > MAX_ADDITIONAL_LOCATIONS {
            return Err(SelectionError::TooManyLocations);
        }
        let max = self.max_design_colors();
        if self.front_colors > max {
            return Err(SelectionError::TooManyColors {
                colors: self.front_colors,
                max,
            });
        }
        for (index, location) in self.additional_locations.iter().enumerate() {
            self.check_location_free(location.location_id, Some(index))?;
            if location.colors > max {
                return Err(SelectionError::TooManyColors {
                    colors: location.colors,
                    max,
                });
            }
        }
        Ok(())
    }

    /// Tier labels are checked against the tables by [`super::ScreenPrintCalculator`].
    pub fn set_quantity_tier(&mut self, tier: Option<TierLabel>) {
        self.quantity_tier = tier;
    }

    pub fn set_style_number(&mut self, style: Option<String>) {
        self.style_number = style;
    }

    pub fn set_garment_color(&mut self, color: Option<String>) {
        self.garment_color = color;
    }

    /// Design colors available per location; the underbase takes a screen on dark garments.
    pub fn max_design_colors(&self) -> u8 {
        if self.is_dark_garment {
            MAX_SCREEN_COLORS - 1
        } else {
            MAX_SCREEN_COLORS
        }
    }

    fn clamp_colors(&self, colors: u8) -> u8 {
        colors.min(self.max_design_colors())
    }

    /// Returns the color count actually stored.
    pub fn set_front_colors(&mut self, colors: u8) -> u8 {
        self.front_colors = self.clamp_colors(colors);
        self.front_colors
    }

    pub fn set_dark_garment(&mut self, dark: bool) {
        self.is_dark_garment = dark;
        let max = self.max_design_colors();
        if self.front_colors > max {
            log::debug!("Reset front colors from {} to {max} (dark garment limit)", self.front_colors);
            self.front_colors = max;
        }
        for location in &mut self.additional_locations {
            location.colors = location.colors.min(max);
        }
    }

    pub fn toggle_dark_garment(&mut self) -> bool {
        self.set_dark_garment(!self.is_dark_garment);
        self.is_dark_garment
    }

    pub fn set_front_safety_stripes(&mut self, enabled: bool) {
        self.front_has_safety_stripes = enabled;
        if enabled {
            self.set_front_colors(FRONT_SAFETY_STRIPE_COLORS);
        }
    }

    pub fn set_manual_base_cost(&mut self, cost: f64) {
        self.manual_base_garment_cost = if cost.is_finite() && cost > 0.0 {
            cost
        } else {
            0.0
        };
    }

    /// Accepts user text such as "5", "$5.25" or "" (treated as zero).
    pub fn set_manual_base_cost_str(&mut self, raw: &str) {
        self.set_manual_base_cost(crate::util::parse_amount(raw));
    }

    pub fn add_location(&mut self, location_id: LocationId, colors: u8) -> Result<(), SelectionError> {
        if self.additional_locations.len() >= MAX_ADDITIONAL_LOCATIONS {
            return Err(SelectionError::TooManyLocations);
        }
        self.check_location_free(location_id, None)?;

        let colors = self.clamp_colors(colors);
        self.additional_locations.push(AdditionalLocation {
            location_id,
            colors,
            has_safety_stripes: false,
        });
        log::debug!(
            "Added location {location_id}. Total locations: {}",
            self.additional_locations.len()
        );
        Ok(())
    }

    pub fn remove_location(&mut self, index: usize) -> Result<AdditionalLocation, SelectionError> {
        if index >= self.additional_locations.len() {
            return Err(SelectionError::NoSuchLocation(index));
        }
        Ok(self.additional_locations.remove(index))
    }

    pub fn set_location(&mut self, index: usize, location_id: LocationId) -> Result<(), SelectionError> {
        if index >= self.additional_locations.len() {
            return Err(SelectionError::NoSuchLocation(index));
        }
        self.check_location_free(location_id, Some(index))?;
        self.additional_locations[index].location_id = location_id;
        Ok(())
    }

    pub fn set_location_colors(&mut self, index: usize, colors: u8) -> Result<u8, SelectionError> {
        let colors = self.clamp_colors(colors);
        let location = self
            .additional_locations
            .get_mut(index)
            .ok_or(SelectionError::NoSuchLocation(index))?;
        location.colors = colors;
        Ok(colors)
    }

    pub fn set_location_safety_stripes(&mut self, index: usize, enabled: bool) -> Result<(), SelectionError> {
        let stripe_colors = self.clamp_colors(LOCATION_SAFETY_STRIPE_COLORS);
        let location = self
            .additional_locations
            .get_mut(index)
            .ok_or(SelectionError::NoSuchLocation(index))?;
        location.has_safety_stripes = enabled;
        if enabled {
            location.colors = stripe_colors;
        }
        Ok(())
    }

    /// Locations a slot may switch to: no front slots, nothing another slot already uses.
    pub fn available_locations(&self, current_index: Option<usize>) -> Vec<LocationId> {
        LocationId::ALL
            .into_iter()
            .filter(|id| !id.is_front_slot())
            .filter(|id| {
                !self
                    .additional_locations
                    .iter()
                    .enumerate()
                    .any(|(index, loc)| Some(index) != current_index && loc.location_id == *id)
            })
            .collect()
    }

    pub fn can_add_location(&self) -> bool {
        self.additional_locations.len() < MAX_ADDITIONAL_LOCATIONS
    }

    fn check_location_free(&self, location_id: LocationId, skip: Option<usize>) -> Result<(), SelectionError> {
        if location_id.is_front_slot() {
            return Err(SelectionError::FrontLocation(location_id));
        }
        let taken = self
            .additional_locations
            .iter()
            .enumerate()
            .any(|(index, loc)| Some(index) != skip && loc.location_id == location_id);
        if taken {
            return Err(SelectionError::DuplicateLocation(location_id));
        }
        Ok(())
    }
}
