//! Caregiver profile domain types
//!
//! The profile entity assembled over many conversational turns, and the
//! partial update DTO the extraction agent submits on each turn.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum accepted length of a caregiver id, in bytes
pub const MAX_ID_LEN: usize = 128;

/// Stored profile status. Only the calling agent decides when to flip it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProfileStatus {
    #[default]
    InProgress,
    Complete,
}

impl ProfileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileStatus::InProgress => "in_progress",
            ProfileStatus::Complete => "complete",
        }
    }
}

impl fmt::Display for ProfileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(Self::InProgress),
            "complete" => Ok(Self::Complete),
            other => Err(format!("unknown profile status '{}'", other)),
        }
    }
}

/// Experience for one age group or care type: a count or a free-text answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExperienceValue {
    Years(serde_json::Number),
    Text(String),
}

#[cfg(test)]
impl ExperienceValue {
    pub fn years(years: i64) -> Self {
        Self::Years(years.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

/// Category label (age group or care type, caller defined) to experience
pub type YearsOfExperience = BTreeMap<String, ExperienceValue>;

/// Caregiver profile entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caregiver {
    pub id: String,
    pub status: ProfileStatus,

    // Basic information
    pub location: Option<String>,
    pub profile_picture_url: Option<String>,

    // Set-valued, duplicate free, insertion ordered
    pub qualifications: Vec<String>,
    pub languages: Vec<String>,
    pub preferred_age_groups: Vec<String>,
    pub dietary_preferences: Vec<String>,
    pub responsibilities: Vec<String>,
    pub benefits_required: Vec<String>,
    pub care_types: Vec<String>,

    // Availability
    pub start_date: Option<String>,
    pub general_availability: Option<String>,
    pub weekly_hours: Option<String>,

    // Commute
    pub commute_distance: Option<String>,
    pub commute_type: Option<String>,
    pub will_drive_children: Option<String>,

    pub accessibility_needs: Option<String>,

    pub years_of_experience: YearsOfExperience,

    // Compensation
    pub hourly_rate: Option<String>,
    pub additional_child_rate: Option<String>,
    pub payroll_required: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Caregiver {
    /// A blank profile: every scalar unknown, every collection empty
    pub fn new(id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            status: ProfileStatus::InProgress,
            location: None,
            profile_picture_url: None,
            qualifications: Vec::new(),
            languages: Vec::new(),
            preferred_age_groups: Vec::new(),
            dietary_preferences: Vec::new(),
            responsibilities: Vec::new(),
            benefits_required: Vec::new(),
            care_types: Vec::new(),
            start_date: None,
            general_availability: None,
            weekly_hours: None,
            commute_distance: None,
            commute_type: None,
            will_drive_children: None,
            accessibility_needs: None,
            years_of_experience: YearsOfExperience::new(),
            hourly_rate: None,
            additional_child_rate: None,
            payroll_required: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Current time at the precision timestamps are persisted with (milliseconds)
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Partial update submitted by the extraction agent.
///
/// Scalar fields are `Option<Option<String>>`: an absent key leaves the field
/// untouched (`None`), `null` clears it (`Some(None)`). Collections are merged,
/// never replaced, so `null` and absent mean the same thing for them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CaregiverUpdate {
    #[serde(default)]
    pub status: Option<ProfileStatus>,

    #[serde(default, deserialize_with = "present")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub profile_picture_url: Option<Option<String>>,

    #[serde(default)]
    pub qualifications: Option<Vec<String>>,
    #[serde(default)]
    pub languages: Option<Vec<String>>,
    #[serde(default)]
    pub preferred_age_groups: Option<Vec<String>>,
    #[serde(default)]
    pub dietary_preferences: Option<Vec<String>>,
    #[serde(default)]
    pub responsibilities: Option<Vec<String>>,
    #[serde(default)]
    pub benefits_required: Option<Vec<String>>,
    #[serde(default)]
    pub care_types: Option<Vec<String>>,

    #[serde(default, deserialize_with = "present")]
    pub start_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub general_availability: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub weekly_hours: Option<Option<String>>,

    #[serde(default, deserialize_with = "present")]
    pub commute_distance: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub commute_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub will_drive_children: Option<Option<String>>,

    #[serde(default, deserialize_with = "present")]
    pub accessibility_needs: Option<Option<String>>,

    #[serde(default)]
    pub years_of_experience: Option<YearsOfExperience>,

    #[serde(default, deserialize_with = "present")]
    pub hourly_rate: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub additional_child_rate: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub payroll_required: Option<Option<String>>,
}

/// Marks a key as present even when its value is `null`
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("caregiver id must not be blank")]
    BlankId,

    #[error("caregiver id must be at most {MAX_ID_LEN} bytes")]
    IdTooLong,

    #[error("caregiver id must not contain control characters")]
    IdControlCharacters,
}

/// Checks a caller-supplied id before it is stored
pub fn validate_id(id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        return Err(ValidationError::BlankId);
    }
    if id.len() > MAX_ID_LEN {
        return Err(ValidationError::IdTooLong);
    }
    if id.chars().any(char::is_control) {
        return Err(ValidationError::IdControlCharacters);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_and_null_scalars_are_distinguished() {
        let update: CaregiverUpdate =
            serde_json::from_value(json!({ "location": null })).expect("decode update");
        assert_eq!(update.location, Some(None));
        assert_eq!(update.hourly_rate, None);

        let update: CaregiverUpdate =
            serde_json::from_value(json!({ "hourlyRate": "$25" })).expect("decode update");
        assert_eq!(update.hourly_rate, Some(Some("$25".to_string())));
        assert_eq!(update.location, None);
    }

    #[test]
    fn null_collections_decode_as_absent() {
        let update: CaregiverUpdate = serde_json::from_value(json!({
            "languages": null,
            "yearsOfExperience": null,
        }))
        .expect("decode update");
        assert!(update.languages.is_none());
        assert!(update.years_of_experience.is_none());
    }

    #[test]
    fn unknown_and_immutable_keys_are_rejected() {
        for payload in [
            json!({ "favouriteColour": "green" }),
            json!({ "id": "other" }),
            json!({ "createdAt": "2024-01-01T00:00:00Z" }),
        ] {
            assert!(serde_json::from_value::<CaregiverUpdate>(payload).is_err());
        }
    }

    #[test]
    fn status_accepts_only_known_values() {
        let update: CaregiverUpdate =
            serde_json::from_value(json!({ "status": "complete" })).expect("decode update");
        assert_eq!(update.status, Some(ProfileStatus::Complete));

        assert!(serde_json::from_value::<CaregiverUpdate>(json!({ "status": "done" })).is_err());
        assert_eq!("in_progress".parse(), Ok(ProfileStatus::InProgress));
        assert!("Complete".parse::<ProfileStatus>().is_err());
    }

    #[test]
    fn experience_keeps_numbers_and_text_apart() {
        let update: CaregiverUpdate = serde_json::from_value(json!({
            "yearsOfExperience": { "infant": 2, "toddler": "3 years" }
        }))
        .expect("decode update");
        let experience = update.years_of_experience.expect("experience present");
        assert_eq!(experience["infant"], ExperienceValue::years(2));
        assert_eq!(experience["toddler"], ExperienceValue::text("3 years"));

        let encoded = serde_json::to_value(&experience).expect("encode experience");
        assert_eq!(encoded, json!({ "infant": 2, "toddler": "3 years" }));
    }

    #[test]
    fn new_profile_is_blank() {
        let created = now();
        let caregiver = Caregiver::new("cg-1", created);
        assert_eq!(caregiver.status, ProfileStatus::InProgress);
        assert!(caregiver.location.is_none());
        assert!(caregiver.languages.is_empty());
        assert!(caregiver.years_of_experience.is_empty());
        assert_eq!(caregiver.created_at, caregiver.updated_at);

        let encoded = serde_json::to_value(&caregiver).expect("encode caregiver");
        assert_eq!(encoded["status"], "in_progress");
        assert_eq!(encoded["careTypes"], json!([]));
        assert_eq!(encoded["yearsOfExperience"], json!({}));
        assert!(encoded["profilePictureUrl"].is_null());
    }

    #[test]
    fn id_validation() {
        assert_eq!(validate_id("caregiver-1"), Ok(()));
        assert_eq!(validate_id("   "), Err(ValidationError::BlankId));
        assert_eq!(validate_id(""), Err(ValidationError::BlankId));
        assert_eq!(
            validate_id(&"x".repeat(MAX_ID_LEN + 1)),
            Err(ValidationError::IdTooLong)
        );
        assert_eq!(
            validate_id("line\nbreak"),
            Err(ValidationError::IdControlCharacters)
        );
    }
}
