//! User profile model (singleton)

use serde::{Deserialize, Serialize};

/// Distance unit preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MileageUnit {
    #[default]
    Miles,
    Km,
}

/// Fuel volume unit preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FuelUnit {
    #[default]
    Gallons,
    Liters,
}

/// Date rendering preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum DateFormat {
    #[default]
    Us,
    Eu,
}

/// Weekly targets shown as progress rings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyGoal {
    pub hours_target: u32,
    pub miles_target: u32,
    pub fuel_budget: u32,
}

impl Default for WeeklyGoal {
    fn default() -> Self {
        Self {
            hours_target: 40,
            miles_target: 500,
            fuel_budget: 200,
        }
    }
}

/// Partial update for a [`WeeklyGoal`]; `None` fields are left unchanged.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeeklyGoalPatch {
    pub hours_target: Option<u32>,
    pub miles_target: Option<u32>,
    pub fuel_budget: Option<u32>,
}

/// The single user profile.
///
/// Exactly one instance exists; the server stores it under the fixed id
/// `"default"` and replaces it wholesale on every push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub name: String,
    pub company: String,
    pub role: String,
    pub default_start_hour: u32,
    pub default_end_hour: u32,
    pub mileage_unit: MileageUnit,
    pub fuel_unit: FuelUnit,
    pub onboarding_complete: bool,
    pub hourly_rate: f64,
    pub overtime_threshold: f64,
    pub overtime_multiplier: f64,
    pub weekly_goal: WeeklyGoal,
    pub currency: String,
    pub date_format: DateFormat,
    /// Profile-level tag list, distinct from the custom-tag setting
    pub tags: Vec<String>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            company: String::new(),
            role: String::new(),
            default_start_hour: 7,
            default_end_hour: 17,
            mileage_unit: MileageUnit::Miles,
            fuel_unit: FuelUnit::Gallons,
            onboarding_complete: false,
            hourly_rate: 0.0,
            overtime_threshold: 8.0,
            overtime_multiplier: 1.5,
            weekly_goal: WeeklyGoal::default(),
            currency: "USD".to_string(),
            date_format: DateFormat::Us,
            tags: Vec::new(),
        }
    }
}

/// Partial update for the profile; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub company: Option<String>,
    pub role: Option<String>,
    pub default_start_hour: Option<u32>,
    pub default_end_hour: Option<u32>,
    pub mileage_unit: Option<MileageUnit>,
    pub fuel_unit: Option<FuelUnit>,
    pub onboarding_complete: Option<bool>,
    pub hourly_rate: Option<f64>,
    pub overtime_threshold: Option<f64>,
    pub overtime_multiplier: Option<f64>,
    pub weekly_goal: Option<WeeklyGoalPatch>,
    pub currency: Option<String>,
    pub date_format: Option<DateFormat>,
    pub tags: Option<Vec<String>>,
}

impl UserProfile {
    /// Merge a partial update into the profile.
    pub fn apply(&mut self, patch: ProfilePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(company) = patch.company {
            self.company = company;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(hour) = patch.default_start_hour {
            self.default_start_hour = hour;
        }
        if let Some(hour) = patch.default_end_hour {
            self.default_end_hour = hour;
        }
        if let Some(unit) = patch.mileage_unit {
            self.mileage_unit = unit;
        }
        if let Some(unit) = patch.fuel_unit {
            self.fuel_unit = unit;
        }
        if let Some(done) = patch.onboarding_complete {
            self.onboarding_complete = done;
        }
        if let Some(rate) = patch.hourly_rate {
            self.hourly_rate = rate;
        }
        if let Some(threshold) = patch.overtime_threshold {
            self.overtime_threshold = threshold;
        }
        if let Some(multiplier) = patch.overtime_multiplier {
            self.overtime_multiplier = multiplier;
        }
        if let Some(goal) = patch.weekly_goal {
            self.weekly_goal.apply(goal);
        }
        if let Some(currency) = patch.currency {
            self.currency = currency;
        }
        if let Some(format) = patch.date_format {
            self.date_format = format;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
    }
}

impl WeeklyGoal {
    /// Merge a partial update into the goal.
    pub fn apply(&mut self, patch: WeeklyGoalPatch) {
        if let Some(hours) = patch.hours_target {
            self.hours_target = hours;
        }
        if let Some(miles) = patch.miles_target {
            self.miles_target = miles;
        }
        if let Some(budget) = patch.fuel_budget {
            self.fuel_budget = budget;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_defaults() {
        let profile = UserProfile::default();
        assert_eq!(profile.default_start_hour, 7);
        assert!((profile.overtime_threshold - 8.0).abs() < f64::EPSILON);
        assert_eq!(profile.weekly_goal.hours_target, 40);
    }

    #[test]
    fn test_date_format_wire_names() {
        assert_eq!(serde_json::to_string(&DateFormat::Us).unwrap(), "\"US\"");
        let parsed: DateFormat = serde_json::from_str("\"EU\"").unwrap();
        assert_eq!(parsed, DateFormat::Eu);
    }

    #[test]
    fn test_nested_goal_patch() {
        let mut profile = UserProfile::default();
        profile.apply(ProfilePatch {
            weekly_goal: Some(WeeklyGoalPatch {
                miles_target: Some(600),
                ..WeeklyGoalPatch::default()
            }),
            ..ProfilePatch::default()
        });
        assert_eq!(profile.weekly_goal.miles_target, 600);
        assert_eq!(profile.weekly_goal.hours_target, 40);
    }
}
