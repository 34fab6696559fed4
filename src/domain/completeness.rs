//! Profile completeness scoring
//!
//! Pure functions over a snapshot. The derived label here is for display and
//! for the agent's stop condition; it never writes the stored status.

use serde::Serialize;

use super::caregivers::Caregiver;

/// Percentage from which a profile with every critical facet counts as done
pub const STOP_THRESHOLD: u8 = 80;

/// One checklist item of the profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Facet {
    Location,
    ProfilePictureUrl,
    Qualifications,
    Languages,
    PreferredAgeGroups,
    DietaryPreferences,
    Responsibilities,
    BenefitsRequired,
    CareTypes,
    StartDate,
    GeneralAvailability,
    WeeklyHours,
    CommuteDistance,
    CommuteType,
    WillDriveChildren,
    AccessibilityNeeds,
    YearsOfExperience,
    HourlyRate,
    AdditionalChildRate,
    PayrollRequired,
}

impl Facet {
    /// Checklist in the order facets are presented to the agent
    pub const ALL: [Facet; 20] = [
        Facet::Location,
        Facet::ProfilePictureUrl,
        Facet::Qualifications,
        Facet::Languages,
        Facet::PreferredAgeGroups,
        Facet::DietaryPreferences,
        Facet::Responsibilities,
        Facet::BenefitsRequired,
        Facet::CareTypes,
        Facet::StartDate,
        Facet::GeneralAvailability,
        Facet::WeeklyHours,
        Facet::CommuteDistance,
        Facet::CommuteType,
        Facet::WillDriveChildren,
        Facet::AccessibilityNeeds,
        Facet::YearsOfExperience,
        Facet::HourlyRate,
        Facet::AdditionalChildRate,
        Facet::PayrollRequired,
    ];

    /// Facets that must be filled before collection may stop
    pub const CRITICAL: [Facet; 4] = [
        Facet::Location,
        Facet::Languages,
        Facet::CareTypes,
        Facet::HourlyRate,
    ];

    pub fn is_critical(self) -> bool {
        Self::CRITICAL.contains(&self)
    }

    pub fn is_filled(self, c: &Caregiver) -> bool {
        match self {
            Facet::Location => c.location.is_some(),
            Facet::ProfilePictureUrl => c.profile_picture_url.is_some(),
            Facet::Qualifications => !c.qualifications.is_empty(),
            Facet::Languages => !c.languages.is_empty(),
            Facet::PreferredAgeGroups => !c.preferred_age_groups.is_empty(),
            Facet::DietaryPreferences => !c.dietary_preferences.is_empty(),
            Facet::Responsibilities => !c.responsibilities.is_empty(),
            Facet::BenefitsRequired => !c.benefits_required.is_empty(),
            Facet::CareTypes => !c.care_types.is_empty(),
            Facet::StartDate => c.start_date.is_some(),
            Facet::GeneralAvailability => c.general_availability.is_some(),
            Facet::WeeklyHours => c.weekly_hours.is_some(),
            Facet::CommuteDistance => c.commute_distance.is_some(),
            Facet::CommuteType => c.commute_type.is_some(),
            Facet::WillDriveChildren => c.will_drive_children.is_some(),
            Facet::AccessibilityNeeds => c.accessibility_needs.is_some(),
            Facet::YearsOfExperience => !c.years_of_experience.is_empty(),
            Facet::HourlyRate => c.hourly_rate.is_some(),
            Facet::AdditionalChildRate => c.additional_child_rate.is_some(),
            Facet::PayrollRequired => c.payroll_required.is_some(),
        }
    }
}

/// Display label derived from the completion percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompletionStatus {
    #[serde(rename = "Complete")]
    Complete,
    #[serde(rename = "Nearly Complete")]
    NearlyComplete,
    #[serde(rename = "In Progress")]
    InProgress,
}

impl CompletionStatus {
    pub fn from_percentage(percentage: u8) -> Self {
        match percentage {
            100..=u8::MAX => Self::Complete,
            STOP_THRESHOLD..=99 => Self::NearlyComplete,
            _ => Self::InProgress,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Complete => "Complete",
            Self::NearlyComplete => "Nearly Complete",
            Self::InProgress => "In Progress",
        }
    }
}

pub fn filled_facets(caregiver: &Caregiver) -> usize {
    Facet::ALL
        .iter()
        .filter(|facet| facet.is_filled(caregiver))
        .count()
}

/// `round(100 * filled / total)`, halves rounding up
pub fn completion_percentage(caregiver: &Caregiver) -> u8 {
    let total = Facet::ALL.len();
    let filled = filled_facets(caregiver);
    ((200 * filled + total) / (2 * total)) as u8
}

pub fn completion_status(caregiver: &Caregiver) -> CompletionStatus {
    CompletionStatus::from_percentage(completion_percentage(caregiver))
}

pub fn all_critical_filled(caregiver: &Caregiver) -> bool {
    Facet::CRITICAL
        .iter()
        .all(|facet| facet.is_filled(caregiver))
}

/// Unfilled facets in checklist order, critical ones first
pub fn missing_facets(caregiver: &Caregiver) -> Vec<Facet> {
    let (mut critical, rest): (Vec<Facet>, Vec<Facet>) = Facet::ALL
        .into_iter()
        .filter(|facet| !facet.is_filled(caregiver))
        .partition(|facet| facet.is_critical());
    critical.extend(rest);
    critical
}

/// Stop condition for the extraction agent
pub fn is_collection_finished(caregiver: &Caregiver) -> bool {
    all_critical_filled(caregiver) && completion_percentage(caregiver) >= STOP_THRESHOLD
}

/// Completeness summary returned alongside a snapshot
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletenessReport {
    pub caregiver_id: String,
    pub completion_percentage: u8,
    pub status: CompletionStatus,
    pub filled_facets: usize,
    pub total_facets: usize,
    pub all_critical_filled: bool,
    pub collection_finished: bool,
    pub missing: Vec<Facet>,
}

impl CompletenessReport {
    pub fn for_caregiver(caregiver: &Caregiver) -> Self {
        Self {
            caregiver_id: caregiver.id.clone(),
            completion_percentage: completion_percentage(caregiver),
            status: completion_status(caregiver),
            filled_facets: filled_facets(caregiver),
            total_facets: Facet::ALL.len(),
            all_critical_filled: all_critical_filled(caregiver),
            collection_finished: is_collection_finished(caregiver),
            missing: missing_facets(caregiver),
        }
    }
}
