//! Tracker configuration: SLA windows, escalation thresholds, scoring
//! constants, city alias table, scheduler interval.
//!
//! All constants ship as defaults so the tracker runs with no config
//! file; the runner can override them from a JSON document.

use crate::{department::Department, error::CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlaConfig {
    /// Resolution window per department, in hours from complaint creation.
    pub department_hours: HashMap<Department, i64>,
    /// Window applied when the category maps to no department.
    pub default_hours: i64,
}

impl Default for SlaConfig {
    fn default() -> Self {
        let mut department_hours = HashMap::new();
        department_hours.insert(Department::Sanitation, 24);
        department_hours.insert(Department::Plumbing, 48);
        department_hours.insert(Department::Structural, 72);
        department_hours.insert(Department::Electrical, 12);
        Self {
            department_hours,
            default_hours: 24,
        }
    }
}

impl SlaConfig {
    #[must_use]
    pub fn hours_for(&self, department: Option<Department>) -> i64 {
        department
            .and_then(|d| self.department_hours.get(&d).copied())
            .unwrap_or(self.default_hours)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// Hours since breach before level 0 → 1 (department admin).
    pub level1_after_hours: i64,
    /// Hours since breach before level 1 → 2 (city admin).
    pub level2_after_hours: i64,
    /// Hours since breach before level 2 → 3 (global admin).
    pub level3_after_hours: i64,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            level1_after_hours: 6,
            level2_after_hours: 12,
            level3_after_hours: 24,
        }
    }
}

impl EscalationConfig {
    /// Threshold gating the transition out of `from_level`, or `None`
    /// when the ladder tops out.
    #[must_use]
    pub fn threshold_hours(&self, from_level: u8) -> Option<i64> {
        match from_level {
            0 => Some(self.level1_after_hours),
            1 => Some(self.level2_after_hours),
            2 => Some(self.level3_after_hours),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Flat award for any resolution.
    pub resolution_base: i64,
    /// Maximum speed bonus, earned at instantaneous resolution.
    pub speed_bonus_max: i64,
    /// Resolutions slower than this earn no speed bonus.
    pub speed_bonus_window_hours: i64,
    /// Flat award for positive citizen feedback.
    pub feedback_bonus: i64,
    /// Minimum rating that counts as positive feedback.
    pub feedback_min_rating: i32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            resolution_base: 10,
            speed_bonus_max: 20,
            speed_bonus_window_hours: 72,
            feedback_bonus: 15,
            feedback_min_rating: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Fixed period between batch passes.
    pub interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { interval_secs: 600 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TrackerConfig {
    pub sla: SlaConfig,
    pub escalation: EscalationConfig,
    pub scoring: ScoringConfig,
    pub scheduler: SchedulerConfig,
    /// Historical / alternate city names mapped to their canonical form.
    /// Keys are matched case-insensitively.
    pub city_aliases: HashMap<String, String>,
}

impl TrackerConfig {
    /// Defaults plus the built-in historical alias table.
    #[must_use]
    pub fn builtin() -> Self {
        let mut city_aliases = HashMap::new();
        for (alias, canonical) in [
            ("allahabad", "Prayagraj"),
            ("bombay", "Mumbai"),
            ("bangalore", "Bengaluru"),
            ("madras", "Chennai"),
            ("calcutta", "Kolkata"),
            ("gurgaon", "Gurugram"),
        ] {
            city_aliases.insert(alias.to_string(), canonical.to_string());
        }
        Self {
            city_aliases,
            ..Self::default()
        }
    }

    /// Loads configuration from a JSON file, with defaults for any
    /// omitted section.
    pub fn load(path: &str) -> CoreResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config {path}: {e}"))?;
        let config: Self = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Normalizes a raw city name: trims whitespace and applies the
    /// alias table (case-insensitively). Unknown cities pass through
    /// with their original casing.
    #[must_use]
    pub fn normalize_city(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        let key = trimmed.to_lowercase();
        match self.city_aliases.get(&key) {
            Some(canonical) => canonical.clone(),
            None => trimmed.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sla_windows_match_departments() {
        let sla = SlaConfig::default();
        assert_eq!(sla.hours_for(Some(Department::Sanitation)), 24);
        assert_eq!(sla.hours_for(Some(Department::Plumbing)), 48);
        assert_eq!(sla.hours_for(Some(Department::Structural)), 72);
        assert_eq!(sla.hours_for(Some(Department::Electrical)), 12);
        assert_eq!(sla.hours_for(None), 24);
    }

    #[test]
    fn escalation_ladder_tops_out_at_level_three() {
        let esc = EscalationConfig::default();
        assert_eq!(esc.threshold_hours(0), Some(6));
        assert_eq!(esc.threshold_hours(1), Some(12));
        assert_eq!(esc.threshold_hours(2), Some(24));
        assert_eq!(esc.threshold_hours(3), None);
    }

    #[test]
    fn city_aliases_apply_case_insensitively() {
        let config = TrackerConfig::builtin();
        assert_eq!(config.normalize_city("Allahabad"), "Prayagraj");
        assert_eq!(config.normalize_city("  BOMBAY "), "Mumbai");
        assert_eq!(config.normalize_city("Riverdale"), "Riverdale");
    }

    #[test]
    fn partial_config_file_fills_in_defaults() {
        let config: TrackerConfig =
            serde_json::from_str(r#"{"scheduler": {"interval_secs": 60}}"#).unwrap();
        assert_eq!(config.scheduler.interval_secs, 60);
        assert_eq!(config.scoring.resolution_base, 10);
        assert_eq!(config.sla.default_hours, 24);
    }
}
