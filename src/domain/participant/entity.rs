//! Participant entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::reference::{CategoryId, InstitutionId};
use crate::domain::team::TeamId;

/// Participant identifier assigned by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(i64);

impl ParticipantId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the participant takes part in the event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipationFormat {
    Online,
    Offline,
}

impl ParticipationFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "online" => Some(Self::Online),
            "offline" => Some(Self::Offline),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

impl std::fmt::Display for ParticipationFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Year of study: 1-4 bachelor, 5-6 master, 7 graduated
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct StudyYear(u8);

impl StudyYear {
    pub const FIRST: u8 = 1;
    pub const GRADUATED: u8 = 7;

    pub fn new(value: i64) -> Option<Self> {
        if (i64::from(Self::FIRST)..=i64::from(Self::GRADUATED)).contains(&value) {
            Some(Self(value as u8))
        } else {
            None
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn is_graduated(&self) -> bool {
        self.0 == Self::GRADUATED
    }
}

impl TryFrom<i64> for StudyYear {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("study year out of range: {}", value))
    }
}

impl From<StudyYear> for i64 {
    fn from(year: StudyYear) -> Self {
        i64::from(year.0)
    }
}

impl std::fmt::Display for StudyYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            1..=4 => write!(f, "{} курс", self.0),
            5 => write!(f, "1 магістр"),
            6 => write!(f, "2 магістр"),
            _ => write!(f, "Закінчив"),
        }
    }
}

/// Participant data ready to be inserted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewParticipant {
    pub full_name: String,
    pub email: String,
    pub telegram: String,
    pub phone: String,
    pub is_student: bool,
    pub study_year: Option<StudyYear>,
    pub university_id: Option<InstitutionId>,
    pub category_id: CategoryId,
    pub participation_format: ParticipationFormat,
    pub team_id: Option<TeamId>,
    pub team_leader: bool,
    pub wants_job: bool,
    pub job_description: Option<String>,
    pub cv_url: Option<String>,
    pub linkedin: Option<String>,
    pub work_consent: bool,
    pub source: String,
    pub comment: Option<String>,
    pub personal_data_consent: bool,
    pub skills_text: String,
}

impl NewParticipant {
    /// Register without a team; a solo entry never leads
    pub fn solo(mut self) -> Self {
        self.team_id = None;
        self.team_leader = false;
        self
    }

    /// Attach the participant to a team
    pub fn with_team(mut self, team_id: TeamId, leader: bool) -> Self {
        self.team_id = Some(team_id);
        self.team_leader = leader;
        self
    }

    /// Materialize the row once the store assigned an ID
    pub fn into_participant(self, id: ParticipantId, created_at: DateTime<Utc>) -> Participant {
        Participant {
            id,
            created_at,
            details: self,
        }
    }
}

/// Registered participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    id: ParticipantId,
    created_at: DateTime<Utc>,
    #[serde(flatten)]
    details: NewParticipant,
}

impl Participant {
    pub fn id(&self) -> ParticipantId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn email(&self) -> &str {
        &self.details.email
    }

    pub fn telegram(&self) -> &str {
        &self.details.telegram
    }

    pub fn category_id(&self) -> CategoryId {
        self.details.category_id
    }

    pub fn team_id(&self) -> Option<TeamId> {
        self.details.team_id
    }

    pub fn is_team_leader(&self) -> bool {
        self.details.team_leader
    }

    /// Full stored record
    pub fn details(&self) -> &NewParticipant {
        &self.details
    }
}
