use serde::{Deserialize, Serialize};

/// Thresholds that drive automatic bill matching. The core never validates them:
/// unusual values simply make matching stricter or looser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillMatchingSettings {
    #[serde(default = "BillMatchingSettings::default_amount_tolerance")]
    pub amount_tolerance: f64,
    #[serde(default = "BillMatchingSettings::default_date_window_days")]
    pub date_window_days: i64,
    #[serde(default = "BillMatchingSettings::default_minimum_score")]
    pub minimum_score: u32,
    #[serde(default)]
    pub require_description_match: bool,
    #[serde(default = "BillMatchingSettings::default_true")]
    pub require_amount_match: bool,
    #[serde(default = "BillMatchingSettings::default_true")]
    pub require_date_window: bool,
}

impl BillMatchingSettings {
    fn default_amount_tolerance() -> f64 {
        1.0
    }

    fn default_date_window_days() -> i64 {
        7
    }

    fn default_minimum_score() -> u32 {
        60
    }

    fn default_true() -> bool {
        true
    }

    /// Applies a `name value` pair as typed in the shell, returning false for unknown names.
    pub fn apply(&mut self, name: &str, value: &str) -> Result<bool, String> {
        let normalized = name.trim().to_ascii_lowercase().replace(['-', '_'], "");
        match normalized.as_str() {
            "amounttolerance" => self.amount_tolerance = parse_value(name, value)?,
            "datewindowdays" => self.date_window_days = parse_value(name, value)?,
            "minimumscore" => self.minimum_score = parse_value(name, value)?,
            "requiredescriptionmatch" => self.require_description_match = parse_flag(name, value)?,
            "requireamountmatch" => self.require_amount_match = parse_flag(name, value)?,
            "requiredatewindow" => self.require_date_window = parse_flag(name, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl Default for BillMatchingSettings {
    fn default() -> Self {
        Self {
            amount_tolerance: Self::default_amount_tolerance(),
            date_window_days: Self::default_date_window_days(),
            minimum_score: Self::default_minimum_score(),
            require_description_match: false,
            require_amount_match: true,
            require_date_window: true,
        }
    }
}

fn parse_value<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, String> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| format!("invalid value `{}` for `{}`", value, name))
}

fn parse_flag(name: &str, value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(format!("invalid flag `{}` for `{}` (use true/false)", value, name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let settings: BillMatchingSettings =
            serde_json::from_str(r#"{"minimumScore": 75}"#).unwrap();
        assert_eq!(settings.minimum_score, 75);
        assert_eq!(settings.date_window_days, 7);
        assert!(settings.require_amount_match);
    }

    #[test]
    fn apply_accepts_camel_and_kebab_names() {
        let mut settings = BillMatchingSettings::default();
        assert!(settings.apply("amountTolerance", "2.5").unwrap());
        assert!(settings.apply("require-description-match", "yes").unwrap());
        assert!(!settings.apply("colour", "blue").unwrap());
        assert!(settings.apply("minimum_score", "abc").is_err());
        assert_eq!(settings.amount_tolerance, 2.5);
        assert!(settings.require_description_match);
    }

    #[test]
    fn negative_values_are_accepted_as_is() {
        let mut settings = BillMatchingSettings::default();
        settings.apply("dateWindowDays", "-1").unwrap();
        assert_eq!(settings.date_window_days, -1);
    }
}
