//! Registration form types at each pipeline stage

use serde::{Deserialize, Serialize};

use crate::domain::participant::NewParticipant;

/// Field names as they appear on the registration form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionField {
    FullName,
    Email,
    Telegram,
    Phone,
    IsStudent,
    UniversityId,
    StudyYear,
    CategoryId,
    Skills,
    Format,
    HasTeam,
    TeamLeader,
    TeamName,
    WantsJob,
    JobDescription,
    Cv,
    Linkedin,
    WorkConsent,
    Source,
    #[serde(rename = "otherSource")]
    OtherSource,
    Comment,
    PersonalDataConsent,
}

impl SubmissionField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullName => "full_name",
            Self::Email => "email",
            Self::Telegram => "telegram",
            Self::Phone => "phone",
            Self::IsStudent => "is_student",
            Self::UniversityId => "university_id",
            Self::StudyYear => "study_year",
            Self::CategoryId => "category_id",
            Self::Skills => "skills",
            Self::Format => "format",
            Self::HasTeam => "has_team",
            Self::TeamLeader => "team_leader",
            Self::TeamName => "team_name",
            Self::WantsJob => "wants_job",
            Self::JobDescription => "job_description",
            Self::Cv => "cv",
            Self::Linkedin => "linkedin",
            Self::WorkConsent => "work_consent",
            Self::Source => "source",
            Self::OtherSource => "otherSource",
            Self::Comment => "comment",
            Self::PersonalDataConsent => "personal_data_consent",
        }
    }
}

impl std::fmt::Display for SubmissionField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registration form exactly as submitted.
///
/// Absent keys take their default so that every problem with the content is
/// reported by the validator with a localized message instead of a
/// deserialization error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Submission {
    pub full_name: String,
    pub email: String,
    pub telegram: String,
    pub phone: String,
    pub is_student: bool,
    pub university_id: Option<i64>,
    pub study_year: Option<i64>,
    pub category_id: Option<i64>,
    pub skills: Vec<String>,
    pub format: String,
    pub has_team: bool,
    pub team_leader: bool,
    pub team_name: String,
    pub wants_job: bool,
    pub job_description: String,
    pub cv: String,
    pub linkedin: String,
    pub work_consent: bool,
    pub source: String,
    #[serde(rename = "otherSource")]
    pub other_source: Option<String>,
    pub comment: Option<String>,
    pub personal_data_consent: bool,
}

/// Submission with every value in canonical form
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSubmission {
    pub full_name: String,
    pub email: String,
    pub telegram: String,
    /// E.164 representation
    pub phone: String,
    pub is_student: bool,
    pub university_id: Option<i64>,
    pub study_year: Option<i64>,
    pub category_id: Option<i64>,
    /// Deduplicated, in first-seen order
    pub skills: Vec<String>,
    pub format: String,
    pub has_team: bool,
    pub team_leader: bool,
    pub team_name: Option<String>,
    pub wants_job: bool,
    pub job_description: Option<String>,
    pub cv: Option<String>,
    pub linkedin: Option<String>,
    pub work_consent: bool,
    /// Source option picked on the form
    pub source_choice: String,
    /// Source as it will be stored
    pub source: String,
    pub other_source: Option<String>,
    pub comment: Option<String>,
    pub personal_data_consent: bool,
}

impl NormalizedSubmission {
    /// Text value of a form field, if the field is textual and present
    pub fn text(&self, field: SubmissionField) -> Option<&str> {
        match field {
            SubmissionField::FullName => Some(&self.full_name),
            SubmissionField::Email => Some(&self.email),
            SubmissionField::Telegram => Some(&self.telegram),
            SubmissionField::Phone => Some(&self.phone),
            SubmissionField::Format => Some(&self.format),
            SubmissionField::TeamName => self.team_name.as_deref(),
            SubmissionField::JobDescription => self.job_description.as_deref(),
            SubmissionField::Cv => self.cv.as_deref(),
            SubmissionField::Linkedin => self.linkedin.as_deref(),
            SubmissionField::Source => Some(&self.source_choice),
            SubmissionField::OtherSource => self.other_source.as_deref(),
            SubmissionField::Comment => self.comment.as_deref(),
            _ => None,
        }
    }
}

impl From<NormalizedSubmission> for Submission {
    fn from(normalized: NormalizedSubmission) -> Self {
        Self {
            full_name: normalized.full_name,
            email: normalized.email,
            telegram: normalized.telegram,
            phone: normalized.phone,
            is_student: normalized.is_student,
            university_id: normalized.university_id,
            study_year: normalized.study_year,
            category_id: normalized.category_id,
            skills: normalized.skills,
            format: normalized.format,
            has_team: normalized.has_team,
            team_leader: normalized.team_leader,
            team_name: normalized.team_name.unwrap_or_default(),
            wants_job: normalized.wants_job,
            job_description: normalized.job_description.unwrap_or_default(),
            cv: normalized.cv.unwrap_or_default(),
            linkedin: normalized.linkedin.unwrap_or_default(),
            work_consent: normalized.work_consent,
            source: normalized.source_choice,
            other_source: normalized.other_source,
            comment: normalized.comment,
            personal_data_consent: normalized.personal_data_consent,
        }
    }
}

/// What the submitter wants with respect to teams
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamIntent {
    /// Registering alone
    None,
    /// Join the named team, or create it when registering as its leader
    JoinOrCreate { team_name: String, leader: bool },
}

/// Submission that passed every check and is ready for storage lookups
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSubmission {
    /// Participant row without team attachment
    pub participant: NewParticipant,
    pub team: TeamIntent,
}
