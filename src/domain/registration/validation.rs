//! Field-level and cross-field validation of normalized submissions

use url::Url;
use validator::ValidateEmail;

use super::error::{FieldError, ReasonCode, RegistrationError};
use super::normalize::{join_skills, OTHER_SOURCES};
use super::submission::{NormalizedSubmission, SubmissionField, TeamIntent, ValidatedSubmission};
use crate::domain::participant::{NewParticipant, ParticipationFormat, StudyYear};
use crate::domain::reference::{CategoryId, InstitutionId};

/// A single check applied to one field
#[derive(Debug, Clone, Copy)]
enum Check {
    /// Text is non-empty, or an identifier is present
    Required,
    MinChars(usize),
    MaxChars(usize),
    EmailAddress,
    OneOf(&'static [&'static str]),
    StudyYearRange,
    MaxItemChars(usize),
    MaxItems(usize),
}

struct FieldRule {
    field: SubmissionField,
    check: Check,
    reason: ReasonCode,
    message: &'static str,
}

const fn rule(
    field: SubmissionField,
    check: Check,
    reason: ReasonCode,
    message: &'static str,
) -> FieldRule {
    FieldRule {
        field,
        check,
        reason,
        message,
    }
}

use Check::*;
use ReasonCode::{EnumMismatch, Malformed, Missing, TooLong, TooShort};
use SubmissionField as F;

const FORMATS: &[&str] = &["online", "offline"];

/// Per-field checks, evaluated in order; the first failure is reported
const FIELD_RULES: &[FieldRule] = &[
    rule(F::FullName, Required, Missing, "Будь ласка, введіть ваше ім'я."),
    rule(F::FullName, MinChars(2), TooShort, "Ім'я має містити щонайменше 2 символи."),
    rule(F::FullName, MaxChars(100), TooLong, "Ім'я занадто довге (максимум 100 символів)."),
    rule(F::Email, Required, Missing, "Будь ласка, введіть Email."),
    rule(F::Email, MaxChars(100), TooLong, "Email занадто довгий (максимум 100 символів)."),
    rule(F::Email, EmailAddress, Malformed, "Будь ласка, введіть коректний Email."),
    rule(F::Telegram, Required, Missing, "Будь ласка, введіть Telegram нікнейм."),
    rule(F::Telegram, MinChars(1), TooShort, "Telegram нікнейм не може бути порожнім."),
    rule(F::Telegram, MaxChars(100), TooLong, "Telegram нікнейм занадто довгий (максимум 100 символів)."),
    rule(F::StudyYear, StudyYearRange, EnumMismatch, "Оберіть коректний курс зі списку."),
    rule(F::CategoryId, Required, Missing, "Будь ласка, оберіть категорію."),
    rule(F::Format, Required, Missing, "Будь ласка, оберіть формат участі."),
    rule(F::Format, OneOf(FORMATS), EnumMismatch, "Оберіть 'online' або 'offline'."),
    rule(F::Skills, MaxItemChars(100), TooLong, "Назва навички занадто довга (максимум 100 символів)."),
    rule(F::Skills, MaxItems(50), TooLong, "Забагато навичок (максимум 50)."),
    rule(F::TeamName, MaxChars(100), TooLong, "Назва команди занадто довга (максимум 100 символів)."),
    rule(F::JobDescription, MaxChars(2000), TooLong, "Опис роботи не може перевищувати 2000 символів."),
    rule(F::Cv, MaxChars(100), TooLong, "Посилання на CV занадто довге (максимум 100 символів)."),
    rule(F::Linkedin, MaxChars(100), TooLong, "Посилання на LinkedIn занадто довге (максимум 100 символів)."),
    rule(F::Source, Required, Missing, "Будь ласка, вкажіть, звідки ви дізналися про подію."),
    rule(F::Source, MinChars(1), TooShort, "Поле джерела не може бути порожнім."),
    rule(F::Source, MaxChars(100), TooLong, "Текст джерела занадто довгий (максимум 100 символів)."),
    rule(F::OtherSource, MaxChars(100), TooLong, "Текст іншого джерела занадто довгий (максимум 100 символів)."),
    rule(F::Comment, MaxChars(2000), TooLong, "Коментар занадто довгий (максимум 2000 символів)."),
];

/// Predicate over the whole submission paired with the error it raises
struct CrossFieldRule {
    field: SubmissionField,
    reason: ReasonCode,
    message: &'static str,
    violated: fn(&NormalizedSubmission) -> bool,
}

/// Cross-field rules, evaluated in order after every per-field check passed
const CROSS_FIELD_RULES: &[CrossFieldRule] = &[
    CrossFieldRule {
        field: F::WorkConsent,
        reason: ReasonCode::CrossField,
        message: "Потрібно надати згоду на обробку даних для передачі CV/LinkedIn.",
        violated: |s| (s.cv.is_some() || s.linkedin.is_some()) && !s.work_consent,
    },
    CrossFieldRule {
        field: F::Cv,
        reason: Missing,
        message: "Будь ласка, надайте посилання на CV.",
        violated: |s| s.wants_job && s.cv.is_none(),
    },
    CrossFieldRule {
        field: F::Cv,
        reason: Malformed,
        message: "Посилання на CV має починатися з http:// або https://.",
        violated: |s| s.wants_job && s.cv.as_deref().is_some_and(|cv| !is_http_url(cv)),
    },
    CrossFieldRule {
        field: F::Linkedin,
        reason: Malformed,
        message: "Посилання на LinkedIn має починатися з http:// або https://.",
        violated: |s| s.linkedin.as_deref().is_some_and(|url| !is_http_url(url)),
    },
    CrossFieldRule {
        field: F::OtherSource,
        reason: Missing,
        message: "Будь ласка, вкажіть джерело, якщо обрали 'Other'.",
        violated: |s| OTHER_SOURCES.contains(&s.source_choice.as_str()) && s.other_source.is_none(),
    },
    CrossFieldRule {
        field: F::UniversityId,
        reason: Missing,
        message: "Будь ласка, вкажіть ваш університет.",
        violated: |s| s.is_student && s.university_id.is_none(),
    },
    CrossFieldRule {
        field: F::StudyYear,
        reason: Missing,
        message: "Будь ласка, вкажіть ваш курс навчання.",
        violated: |s| s.is_student && s.study_year.is_none(),
    },
    CrossFieldRule {
        field: F::TeamName,
        reason: Missing,
        message: "Ви повинні вказати назву команди.",
        violated: |s| s.has_team && s.team_name.is_none(),
    },
    CrossFieldRule {
        field: F::PersonalDataConsent,
        reason: Missing,
        message: "Необхідна згода на обробку персональних даних.",
        violated: |s| !s.personal_data_consent,
    },
];

/// Check a normalized submission and turn it into a participant record plus team intent
pub fn validate(submission: NormalizedSubmission) -> Result<ValidatedSubmission, RegistrationError> {
    for rule in FIELD_RULES {
        if !passes(&submission, rule.field, rule.check) {
            return Err(rejection(rule.field, rule.reason, rule.message));
        }
    }

    for rule in CROSS_FIELD_RULES {
        if (rule.violated)(&submission) {
            return Err(rejection(rule.field, rule.reason, rule.message));
        }
    }

    into_validated(submission)
}

fn passes(submission: &NormalizedSubmission, field: SubmissionField, check: Check) -> bool {
    match check {
        Required => match field {
            F::CategoryId => submission.category_id.is_some(),
            F::UniversityId => submission.university_id.is_some(),
            F::StudyYear => submission.study_year.is_some(),
            _ => submission.text(field).is_some_and(|text| !text.is_empty()),
        },
        MinChars(min) => submission
            .text(field)
            .is_none_or(|text| text.chars().count() >= min),
        MaxChars(max) => submission
            .text(field)
            .is_none_or(|text| text.chars().count() <= max),
        EmailAddress => submission.text(field).is_none_or(|text| text.validate_email()),
        OneOf(allowed) => submission
            .text(field)
            .is_none_or(|text| allowed.contains(&text)),
        StudyYearRange => submission
            .study_year
            .is_none_or(|year| StudyYear::new(year).is_some()),
        MaxItemChars(max) => submission
            .skills
            .iter()
            .all(|skill| skill.chars().count() <= max),
        MaxItems(max) => submission.skills.len() <= max,
    }
}

/// Absolute http(s) URL with a host
fn is_http_url(value: &str) -> bool {
    Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}

fn rejection(field: SubmissionField, reason: ReasonCode, message: &str) -> RegistrationError {
    RegistrationError::Validation(FieldError::new(field, reason, message))
}

fn into_validated(submission: NormalizedSubmission) -> Result<ValidatedSubmission, RegistrationError> {
    let category_id = submission
        .category_id
        .map(CategoryId::new)
        .ok_or_else(|| rejection(F::CategoryId, Missing, "Будь ласка, оберіть категорію."))?;

    let participation_format = ParticipationFormat::parse(&submission.format).ok_or_else(|| {
        rejection(F::Format, EnumMismatch, "Оберіть 'online' або 'offline'.")
    })?;

    let study_year = match submission.study_year {
        Some(year) => Some(StudyYear::new(year).ok_or_else(|| {
            rejection(F::StudyYear, EnumMismatch, "Оберіть коректний курс зі списку.")
        })?),
        None => None,
    };

    let team = match (submission.has_team, submission.team_name) {
        (true, Some(team_name)) => TeamIntent::JoinOrCreate {
            team_name,
            leader: submission.team_leader,
        },
        _ => TeamIntent::None,
    };

    let participant = NewParticipant {
        full_name: submission.full_name,
        email: submission.email,
        telegram: submission.telegram,
        phone: submission.phone,
        is_student: submission.is_student,
        study_year,
        university_id: submission.university_id.map(InstitutionId::new),
        category_id,
        participation_format,
        team_id: None,
        team_leader: false,
        wants_job: submission.wants_job,
        job_description: submission.job_description,
        cv_url: submission.cv,
        linkedin: submission.linkedin,
        work_consent: submission.work_consent,
        source: submission.source,
        comment: submission.comment,
        personal_data_consent: submission.personal_data_consent,
        skills_text: join_skills(&submission.skills),
    };

    Ok(ValidatedSubmission { participant, team })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> NormalizedSubmission {
        NormalizedSubmission {
            full_name: "Леся Українка".to_string(),
            email: "lesya@example.com".to_string(),
            telegram: "@lesya".to_string(),
            phone: "+380501234567".to_string(),
            is_student: false,
            university_id: None,
            study_year: None,
            category_id: Some(1),
            skills: vec!["Python".to_string(), "SQL".to_string()],
            format: "offline".to_string(),
            has_team: false,
            team_leader: false,
            team_name: None,
            wants_job: false,
            job_description: None,
            cv: None,
            linkedin: None,
            work_consent: false,
            source_choice: "facebook".to_string(),
            source: "facebook".to_string(),
            other_source: None,
            comment: None,
            personal_data_consent: true,
        }
    }

    fn failure(submission: NormalizedSubmission) -> FieldError {
        match validate(submission) {
            Err(RegistrationError::Validation(e)) => e,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_solo_submission() {
        let validated = validate(valid()).unwrap();

        assert_eq!(validated.team, TeamIntent::None);
        assert_eq!(validated.participant.category_id, CategoryId::new(1));
        assert_eq!(validated.participant.participation_format, ParticipationFormat::Offline);
        assert_eq!(validated.participant.skills_text, "Python,SQL");
        assert!(!validated.participant.team_leader);
        assert!(validated.participant.team_id.is_none());
    }

    #[test]
    fn test_full_name_bounds() {
        let mut s = valid();
        s.full_name = String::new();
        assert_eq!(failure(s).reason, ReasonCode::Missing);

        let mut s = valid();
        s.full_name = "Я".to_string();
        let e = failure(s);
        assert_eq!(e.field, SubmissionField::FullName);
        assert_eq!(e.reason, ReasonCode::TooShort);

        let mut s = valid();
        s.full_name = "ї".repeat(100);
        assert!(validate(s).is_ok());

        let mut s = valid();
        s.full_name = "ї".repeat(101);
        assert_eq!(failure(s).reason, ReasonCode::TooLong);
    }

    #[test]
    fn test_malformed_email() {
        let mut s = valid();
        s.email = "not-an-email".to_string();
        let e = failure(s);
        assert_eq!(e.field, SubmissionField::Email);
        assert_eq!(e.reason, ReasonCode::Malformed);
    }

    #[test]
    fn test_first_failing_field_wins() {
        let mut s = valid();
        s.email = String::new();
        s.telegram = String::new();
        assert_eq!(failure(s).field, SubmissionField::Email);
    }

    #[test]
    fn test_enum_mismatches() {
        let mut s = valid();
        s.format = "hybrid".to_string();
        let e = failure(s);
        assert_eq!(e.field, SubmissionField::Format);
        assert_eq!(e.reason, ReasonCode::EnumMismatch);

        let mut s = valid();
        s.study_year = Some(8);
        let e = failure(s);
        assert_eq!(e.field, SubmissionField::StudyYear);
        assert_eq!(e.reason, ReasonCode::EnumMismatch);
    }

    #[test]
    fn test_missing_category() {
        let mut s = valid();
        s.category_id = None;
        let e = failure(s);
        assert_eq!(e.field, SubmissionField::CategoryId);
        assert_eq!(e.reason, ReasonCode::Missing);
    }

    #[test]
    fn test_skill_limits() {
        let mut s = valid();
        s.skills = vec!["x".repeat(101)];
        assert_eq!(failure(s).field, SubmissionField::Skills);

        let mut s = valid();
        s.skills = (0..51).map(|i| format!("skill{}", i)).collect();
        assert_eq!(failure(s).reason, ReasonCode::TooLong);

        let mut s = valid();
        s.skills = Vec::new();
        assert!(validate(s).is_ok());
    }

    #[test]
    fn test_cv_requires_work_consent() {
        let mut s = valid();
        s.cv = Some("https://cv.example.com/me.pdf".to_string());
        let e = failure(s);
        assert_eq!(e.field, SubmissionField::WorkConsent);
        assert_eq!(e.reason, ReasonCode::CrossField);
    }

    #[test]
    fn test_wants_job_requires_http_cv() {
        let mut s = valid();
        s.wants_job = true;
        let e = failure(s.clone());
        assert_eq!(e.field, SubmissionField::Cv);
        assert_eq!(e.reason, ReasonCode::Missing);

        s.cv = Some("ftp://cv.example.com/me.pdf".to_string());
        s.work_consent = true;
        let e = failure(s.clone());
        assert_eq!(e.field, SubmissionField::Cv);
        assert_eq!(e.reason, ReasonCode::Malformed);

        s.cv = Some("https://cv.example.com/me.pdf".to_string());
        assert!(validate(s).is_ok());
    }

    #[test]
    fn test_work_consent_checked_before_cv_format() {
        let mut s = valid();
        s.wants_job = true;
        s.cv = Some("not a url".to_string());
        assert_eq!(failure(s).field, SubmissionField::WorkConsent);
    }

    #[test]
    fn test_linkedin_must_be_http_url() {
        let mut s = valid();
        s.work_consent = true;
        s.linkedin = Some("linkedin.com/in/lesya".to_string());
        let e = failure(s.clone());
        assert_eq!(e.field, SubmissionField::Linkedin);
        assert_eq!(e.reason, ReasonCode::Malformed);

        s.linkedin = Some("https://www.linkedin.com/in/lesya".to_string());
        assert!(validate(s).is_ok());
    }

    #[test]
    fn test_other_source_requires_elaboration() {
        let mut s = valid();
        s.source_choice = "other".to_string();
        s.source = String::new();
        assert_eq!(failure(s).field, SubmissionField::OtherSource);
    }

    #[test]
    fn test_student_requires_university_then_year() {
        let mut s = valid();
        s.is_student = true;
        assert_eq!(failure(s.clone()).field, SubmissionField::UniversityId);

        s.university_id = Some(4);
        let e = failure(s.clone());
        assert_eq!(e.field, SubmissionField::StudyYear);
        assert_eq!(e.reason, ReasonCode::Missing);

        s.study_year = Some(5);
        let validated = validate(s).unwrap();
        assert_eq!(validated.participant.university_id, Some(InstitutionId::new(4)));
        assert_eq!(validated.participant.study_year, StudyYear::new(5));
    }

    #[test]
    fn test_non_student_may_supply_institution() {
        let mut s = valid();
        s.university_id = Some(2);
        let validated = validate(s).unwrap();
        assert_eq!(validated.participant.university_id, Some(InstitutionId::new(2)));
    }

    #[test]
    fn test_has_team_requires_name() {
        let mut s = valid();
        s.has_team = true;
        s.team_leader = true;
        assert_eq!(failure(s.clone()).field, SubmissionField::TeamName);

        s.team_name = Some("Kobzar".to_string());
        let validated = validate(s).unwrap();
        assert_eq!(
            validated.team,
            TeamIntent::JoinOrCreate {
                team_name: "Kobzar".to_string(),
                leader: true,
            }
        );
    }

    #[test]
    fn test_team_name_ignored_without_team() {
        let mut s = valid();
        s.team_name = Some("Kobzar".to_string());
        s.team_leader = true;
        let validated = validate(s).unwrap();
        assert_eq!(validated.team, TeamIntent::None);
        assert!(!validated.participant.team_leader);
    }

    #[test]
    fn test_personal_data_consent_required() {
        let mut s = valid();
        s.personal_data_consent = false;
        let e = failure(s);
        assert_eq!(e.field, SubmissionField::PersonalDataConsent);
        assert!(e.message.contains("персональних"));
    }

    #[test]
    fn test_cross_field_rules_run_after_field_rules() {
        let mut s = valid();
        s.personal_data_consent = false;
        s.comment = Some("x".repeat(2001));
        assert_eq!(failure(s).field, SubmissionField::Comment);
    }

    #[test]
    fn test_phone_checks_live_only_in_normalizer() {
        assert!(FIELD_RULES.iter().all(|rule| rule.field != SubmissionField::Phone));
    }

    #[test]
    fn test_http_url_detection() {
        assert!(is_http_url("http://example.com"));
        assert!(is_http_url("https://example.com/cv.pdf"));
        assert!(!is_http_url("mailto:someone@example.com"));
        assert!(!is_http_url("example.com"));
    }
}
