//! Row mapping for the `caregivers` table.
//!
//! Collections live in JSON text columns and timestamps in epoch
//! milliseconds. Only this module knows about either encoding; a column that
//! fails to decode is reported as malformed, never replaced by a default.

use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};

use super::profile_store::{StoreError, StoreResult};
use crate::domain::merge::union_set;
use crate::domain::{Caregiver, ProfileStatus, YearsOfExperience};

/// `SELECT <every caregiver column> FROM caregivers <tail>`
macro_rules! select_caregivers {
    ($tail:literal) => {
        concat!(
            "SELECT id, status, location, profile_picture_url, ",
            "qualifications, languages, preferred_age_groups, dietary_preferences, ",
            "responsibilities, benefits_required, care_types, ",
            "start_date, general_availability, weekly_hours, ",
            "commute_distance, commute_type, will_drive_children, accessibility_needs, ",
            "years_of_experience, hourly_rate, additional_child_rate, payroll_required, ",
            "created_at, updated_at ",
            "FROM caregivers ",
            $tail
        )
    };
}
pub(crate) use select_caregivers;

/// Database row for a caregiver
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CaregiverRow {
    pub id: String,
    pub status: String,
    pub location: Option<String>,
    pub profile_picture_url: Option<String>,
    pub qualifications: String,
    pub languages: String,
    pub preferred_age_groups: String,
    pub dietary_preferences: String,
    pub responsibilities: String,
    pub benefits_required: String,
    pub care_types: String,
    pub start_date: Option<String>,
    pub general_availability: Option<String>,
    pub weekly_hours: Option<String>,
    pub commute_distance: Option<String>,
    pub commute_type: Option<String>,
    pub will_drive_children: Option<String>,
    pub accessibility_needs: Option<String>,
    pub years_of_experience: String,
    pub hourly_rate: Option<String>,
    pub additional_child_rate: Option<String>,
    pub payroll_required: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl CaregiverRow {
    pub fn encode(c: &Caregiver) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: c.id.clone(),
            status: c.status.as_str().to_string(),
            location: c.location.clone(),
            profile_picture_url: c.profile_picture_url.clone(),
            qualifications: serde_json::to_string(&c.qualifications)?,
            languages: serde_json::to_string(&c.languages)?,
            preferred_age_groups: serde_json::to_string(&c.preferred_age_groups)?,
            dietary_preferences: serde_json::to_string(&c.dietary_preferences)?,
            responsibilities: serde_json::to_string(&c.responsibilities)?,
            benefits_required: serde_json::to_string(&c.benefits_required)?,
            care_types: serde_json::to_string(&c.care_types)?,
            start_date: c.start_date.clone(),
            general_availability: c.general_availability.clone(),
            weekly_hours: c.weekly_hours.clone(),
            commute_distance: c.commute_distance.clone(),
            commute_type: c.commute_type.clone(),
            will_drive_children: c.will_drive_children.clone(),
            accessibility_needs: c.accessibility_needs.clone(),
            years_of_experience: serde_json::to_string(&c.years_of_experience)?,
            hourly_rate: c.hourly_rate.clone(),
            additional_child_rate: c.additional_child_rate.clone(),
            payroll_required: c.payroll_required.clone(),
            created_at: c.created_at.timestamp_millis(),
            updated_at: c.updated_at.timestamp_millis(),
        })
    }

    pub fn decode(self) -> StoreResult<Caregiver> {
        let id = self.id.as_str();
        let status = self
            .status
            .parse::<ProfileStatus>()
            .map_err(|reason| malformed(id, "status", reason))?;

        Ok(Caregiver {
            status,
            qualifications: decode_set(id, "qualifications", &self.qualifications)?,
            languages: decode_set(id, "languages", &self.languages)?,
            preferred_age_groups: decode_set(
                id,
                "preferred_age_groups",
                &self.preferred_age_groups,
            )?,
            dietary_preferences: decode_set(id, "dietary_preferences", &self.dietary_preferences)?,
            responsibilities: decode_set(id, "responsibilities", &self.responsibilities)?,
            benefits_required: decode_set(id, "benefits_required", &self.benefits_required)?,
            care_types: decode_set(id, "care_types", &self.care_types)?,
            years_of_experience: decode_json::<YearsOfExperience>(
                id,
                "years_of_experience",
                &self.years_of_experience,
            )?,
            created_at: decode_timestamp(id, "created_at", self.created_at)?,
            updated_at: decode_timestamp(id, "updated_at", self.updated_at)?,
            location: self.location,
            profile_picture_url: self.profile_picture_url,
            start_date: self.start_date,
            general_availability: self.general_availability,
            weekly_hours: self.weekly_hours,
            commute_distance: self.commute_distance,
            commute_type: self.commute_type,
            will_drive_children: self.will_drive_children,
            accessibility_needs: self.accessibility_needs,
            hourly_rate: self.hourly_rate,
            additional_child_rate: self.additional_child_rate,
            payroll_required: self.payroll_required,
            id: self.id,
        })
    }

    /// Binds every mutable column in the order of `MUTABLE_COLUMNS`
    pub fn bind_mutable<'q>(
        &'q self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        query
            .bind(self.status.as_str())
            .bind(self.location.as_deref())
            .bind(self.profile_picture_url.as_deref())
            .bind(self.qualifications.as_str())
            .bind(self.languages.as_str())
            .bind(self.preferred_age_groups.as_str())
            .bind(self.dietary_preferences.as_str())
            .bind(self.responsibilities.as_str())
            .bind(self.benefits_required.as_str())
            .bind(self.care_types.as_str())
            .bind(self.start_date.as_deref())
            .bind(self.general_availability.as_deref())
            .bind(self.weekly_hours.as_deref())
            .bind(self.commute_distance.as_deref())
            .bind(self.commute_type.as_deref())
            .bind(self.will_drive_children.as_deref())
            .bind(self.accessibility_needs.as_deref())
            .bind(self.years_of_experience.as_str())
            .bind(self.hourly_rate.as_deref())
            .bind(self.additional_child_rate.as_deref())
            .bind(self.payroll_required.as_deref())
            .bind(self.updated_at)
    }
}

/// Columns written on every save, matching `CaregiverRow::bind_mutable`
macro_rules! mutable_columns {
    () => {
        "status, location, profile_picture_url, \
         qualifications, languages, preferred_age_groups, dietary_preferences, \
         responsibilities, benefits_required, care_types, \
         start_date, general_availability, weekly_hours, \
         commute_distance, commute_type, will_drive_children, accessibility_needs, \
         years_of_experience, hourly_rate, additional_child_rate, payroll_required, \
         updated_at"
    };
}

pub const INSERT_CAREGIVER: &str = concat!(
    "INSERT INTO caregivers (",
    mutable_columns!(),
    ", id, created_at) ",
    "VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) ",
    "ON CONFLICT(id) DO NOTHING"
);

pub const UPDATE_CAREGIVER: &str = "UPDATE caregivers SET \
     status = ?, location = ?, profile_picture_url = ?, \
     qualifications = ?, languages = ?, preferred_age_groups = ?, dietary_preferences = ?, \
     responsibilities = ?, benefits_required = ?, care_types = ?, \
     start_date = ?, general_availability = ?, weekly_hours = ?, \
     commute_distance = ?, commute_type = ?, will_drive_children = ?, accessibility_needs = ?, \
     years_of_experience = ?, hourly_rate = ?, additional_child_rate = ?, payroll_required = ?, \
     updated_at = ? \
     WHERE id = ?";

fn malformed(id: &str, field: &'static str, reason: impl ToString) -> StoreError {
    StoreError::MalformedPersistedState {
        id: id.to_string(),
        field,
        reason: reason.to_string(),
    }
}

fn decode_json<T: DeserializeOwned>(id: &str, field: &'static str, raw: &str) -> StoreResult<T> {
    serde_json::from_str(raw).map_err(|e| malformed(id, field, e))
}

fn decode_set(id: &str, field: &'static str, raw: &str) -> StoreResult<Vec<String>> {
    let items: Vec<String> = decode_json(id, field, raw)?;
    let mut set = Vec::with_capacity(items.len());
    union_set(&mut set, items);
    Ok(set)
}

fn decode_timestamp(id: &str, field: &'static str, millis: i64) -> StoreResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| malformed(id, field, format!("timestamp {} out of range", millis)))
}
