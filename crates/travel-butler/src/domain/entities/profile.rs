//! UserProfile - Travel conditions gathered from the conversation

use serde::{Deserialize, Serialize};

/// Accumulated travel conditions of one chat session.
///
/// Serialises without `null` fields so the profile can be shown to the
/// model compactly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depart_city: Option<String>,
    /// "2月" or "2026-02"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    /// YYYY-MM-DD
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_date: Option<String>,
    /// YYYY-MM-DD
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_cny: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub people: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

/// Partial profile extracted from a single user message.
///
/// Every key is always present when serialised (`null` when unknown).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub depart_city: Option<String>,
    pub month: Option<String>,
    pub departure_date: Option<String>,
    pub return_date: Option<String>,
    pub days: Option<i64>,
    pub budget_cny: Option<i64>,
    pub preferences: Option<String>,
    pub people: Option<i64>,
    pub destination: Option<String>,
}

impl UserProfile {
    /// Overwrite only the fields the update actually carries.
    pub fn merge(&mut self, update: ProfileUpdate) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.depart_city, update.depart_city);
        take(&mut self.month, update.month);
        take(&mut self.departure_date, update.departure_date);
        take(&mut self.return_date, update.return_date);
        take(&mut self.days, update.days);
        take(&mut self.budget_cny, update.budget_cny);
        take(&mut self.preferences, update.preferences);
        take(&mut self.people, update.people);
        take(&mut self.destination, update.destination);
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }

    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }

    /// Lenient parse of a profile passed around as JSON text; anything
    /// unparseable yields an empty profile.
    pub fn from_json_lenient(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Self::default();
        }
        serde_json::from_str(trimmed).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_only_overwrites_present_fields() {
        let mut profile = UserProfile {
            depart_city: Some("北京".into()),
            days: Some(3),
            ..Default::default()
        };

        profile.merge(ProfileUpdate {
            destination: Some("成都".into()),
            days: None,
            ..Default::default()
        });

        assert_eq!(profile.depart_city.as_deref(), Some("北京"));
        assert_eq!(profile.destination.as_deref(), Some("成都"));
        assert_eq!(profile.days, Some(3));
    }

    #[test]
    fn test_serialisation_skips_nulls() {
        let profile = UserProfile {
            destination: Some("大阪".into()),
            ..Default::default()
        };
        assert_eq!(profile.to_json_string(), r#"{"destination":"大阪"}"#);
    }

    #[test]
    fn test_from_json_lenient() {
        let profile = UserProfile::from_json_lenient(r#"{"depart_city":"上海","people":2}"#);
        assert_eq!(profile.depart_city.as_deref(), Some("上海"));
        assert_eq!(profile.people, Some(2));
        assert_eq!(UserProfile::from_json_lenient("not json"), UserProfile::default());
    }
}
