//! Field merge policies
//!
//! A partial update never loses what an earlier turn captured: scalars are
//! overwritten only when their key is present, sets grow by union and the
//! experience map grows by key.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use thiserror::Error;

use super::caregivers::{Caregiver, CaregiverUpdate, YearsOfExperience};

/// `updated_at` is already at the largest representable instant
#[derive(Debug, Error, PartialEq, Eq)]
#[error("updated_at {0} cannot be advanced")]
pub struct TimestampOverflow(pub DateTime<Utc>);

/// Scalar overwrite. `None` means the key was absent; `Some(None)` clears.
pub fn overwrite<T>(existing: &mut Option<T>, incoming: Option<Option<T>>) {
    if let Some(value) = incoming {
        *existing = value;
    }
}

/// Set union keeping existing order, then first occurrences from `incoming`
pub fn union_set(existing: &mut Vec<String>, incoming: Vec<String>) {
    if incoming.is_empty() {
        return;
    }

    let mut seen: HashSet<String> = existing.iter().cloned().collect();
    for item in incoming {
        if seen.insert(item.clone()) {
            existing.push(item);
        }
    }
}

/// Shallow map union, incoming keys win
pub fn union_map(existing: &mut YearsOfExperience, incoming: YearsOfExperience) {
    existing.extend(incoming);
}

impl Caregiver {
    /// Applies every field present in `update`.
    ///
    /// Does not touch `updated_at`; the store advances it once the merged
    /// snapshot is about to be persisted.
    pub fn apply_update(&mut self, update: CaregiverUpdate) {
        let CaregiverUpdate {
            status,
            location,
            profile_picture_url,
            qualifications,
            languages,
            preferred_age_groups,
            dietary_preferences,
            responsibilities,
            benefits_required,
            care_types,
            start_date,
            general_availability,
            weekly_hours,
            commute_distance,
            commute_type,
            will_drive_children,
            accessibility_needs,
            years_of_experience,
            hourly_rate,
            additional_child_rate,
            payroll_required,
        } = update;

        if let Some(status) = status {
            self.status = status;
        }

        overwrite(&mut self.location, location);
        overwrite(&mut self.profile_picture_url, profile_picture_url);
        overwrite(&mut self.start_date, start_date);
        overwrite(&mut self.general_availability, general_availability);
        overwrite(&mut self.weekly_hours, weekly_hours);
        overwrite(&mut self.commute_distance, commute_distance);
        overwrite(&mut self.commute_type, commute_type);
        overwrite(&mut self.will_drive_children, will_drive_children);
        overwrite(&mut self.accessibility_needs, accessibility_needs);
        overwrite(&mut self.hourly_rate, hourly_rate);
        overwrite(&mut self.additional_child_rate, additional_child_rate);
        overwrite(&mut self.payroll_required, payroll_required);

        union_set(&mut self.qualifications, qualifications.unwrap_or_default());
        union_set(&mut self.languages, languages.unwrap_or_default());
        union_set(
            &mut self.preferred_age_groups,
            preferred_age_groups.unwrap_or_default(),
        );
        union_set(
            &mut self.dietary_preferences,
            dietary_preferences.unwrap_or_default(),
        );
        union_set(&mut self.responsibilities, responsibilities.unwrap_or_default());
        union_set(&mut self.benefits_required, benefits_required.unwrap_or_default());
        union_set(&mut self.care_types, care_types.unwrap_or_default());

        if let Some(incoming) = years_of_experience {
            union_map(&mut self.years_of_experience, incoming);
        }
    }

    /// Advances `updated_at` to `now`, or 1ms past its previous value when
    /// the clock has not moved on (or moved backwards) since the last write.
    pub fn touch(&mut self, now: DateTime<Utc>) -> Result<(), TimestampOverflow> {
        let floor = self
            .updated_at
            .checked_add_signed(Duration::milliseconds(1))
            .ok_or(TimestampOverflow(self.updated_at))?;
        self.updated_at = now.max(floor);
        Ok(())
    }
}
