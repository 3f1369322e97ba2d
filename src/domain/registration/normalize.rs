//! Canonicalization of raw submissions

use std::collections::HashSet;

use phonenumber::{Mode, PhoneNumber};

use super::error::{FieldError, ReasonCode, RegistrationError};
use super::submission::{NormalizedSubmission, Submission, SubmissionField};

/// Source choices that are elaborated in `otherSource`
pub const OTHER_SOURCES: [&str; 2] = ["other", "otherSocial"];

/// Separator used when skills are stored as text
pub const SKILLS_SEPARATOR: &str = ",";

const PHONE_MAX_CHARS: usize = 100;

const MSG_PHONE_MISSING: &str = "Будь ласка, введіть номер телефону.";
const MSG_PHONE_TOO_LONG: &str = "Номер телефону занадто довгий.";
const MSG_PHONE_MALFORMED: &str = "Невірний формат номеру телефону.";

/// Bring every field of the submission into canonical form.
///
/// Fails only when the phone number cannot be canonicalized; everything
/// else is left for the validator to judge.
pub fn normalize(submission: Submission) -> Result<NormalizedSubmission, RegistrationError> {
    let phone = normalize_phone(&submission.phone).map_err(RegistrationError::Normalization)?;

    let source_choice = submission.source.trim().to_string();
    let other_source = optional_text(submission.other_source);
    let source = resolve_source(&source_choice, other_source.as_deref());

    Ok(NormalizedSubmission {
        full_name: submission.full_name.trim().to_string(),
        email: submission.email.trim().to_string(),
        telegram: submission.telegram.trim().to_string(),
        phone,
        is_student: submission.is_student,
        university_id: submission.university_id,
        study_year: submission.study_year,
        category_id: submission.category_id,
        skills: normalize_skills(&submission.skills),
        format: submission.format.trim().to_string(),
        has_team: submission.has_team,
        team_leader: submission.team_leader,
        team_name: optional_text(Some(submission.team_name)),
        wants_job: submission.wants_job,
        job_description: optional_text(Some(submission.job_description)),
        cv: optional_text(Some(submission.cv)),
        linkedin: optional_text(Some(submission.linkedin)),
        work_consent: submission.work_consent,
        source_choice,
        source,
        other_source,
        comment: optional_text(submission.comment),
        personal_data_consent: submission.personal_data_consent,
    })
}

/// Parse a phone number written in international form and emit E.164
pub fn normalize_phone(raw: &str) -> Result<String, FieldError> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Err(phone_error(ReasonCode::Missing, MSG_PHONE_MISSING));
    }
    if raw.chars().count() > PHONE_MAX_CHARS {
        return Err(phone_error(ReasonCode::TooLong, MSG_PHONE_TOO_LONG));
    }

    let number = phonenumber::parse(None, raw)
        .map_err(|_| phone_error(ReasonCode::Malformed, MSG_PHONE_MALFORMED))?;

    if !has_possible_length(&number) {
        return Err(phone_error(ReasonCode::Malformed, MSG_PHONE_MALFORMED));
    }

    Ok(number.format().mode(Mode::E164).to_string())
}

/// Plausibility only: the national number length must be one the calling
/// code's main region dials, including local-only lengths. Assigned ranges
/// are not checked.
fn has_possible_length(number: &PhoneNumber) -> bool {
    let national_len = number.national().to_string().len();

    phonenumber::metadata::DATABASE
        .by_code(&number.code().value())
        .and_then(|regions| regions.first().copied())
        .is_some_and(|main| {
            let general = main.descriptors().general();
            general
                .possible_length()
                .iter()
                .chain(general.possible_local_length())
                .any(|&len| usize::from(len) == national_len)
        })
}

/// Split, trim and deduplicate skills case-insensitively, keeping the first spelling
pub fn normalize_skills(items: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();

    items
        .iter()
        .flat_map(|item| item.split(SKILLS_SEPARATOR))
        .map(str::trim)
        .filter(|skill| !skill.is_empty())
        .filter(|skill| seen.insert(skill.to_lowercase()))
        .map(str::to_string)
        .collect()
}

pub fn join_skills(skills: &[String]) -> String {
    skills.join(SKILLS_SEPARATOR)
}

/// Stored attribution: the elaboration for "other" choices, the choice itself otherwise
pub fn resolve_source(choice: &str, other_source: Option<&str>) -> String {
    if OTHER_SOURCES.contains(&choice) {
        other_source.map(str::trim).unwrap_or_default().to_string()
    } else {
        choice.to_string()
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn phone_error(reason: ReasonCode, message: &str) -> FieldError {
    FieldError::new(SubmissionField::Phone, reason, message)
}
