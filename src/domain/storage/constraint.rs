//! Storage-level uniqueness constraints

/// Uniqueness constraints the registration flow depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniqueConstraint {
    /// One participant per email
    ParticipantEmail,
    /// One participant per Telegram handle
    ParticipantTelegram,
    /// One team per (name, category)
    TeamNameCategory,
    /// Any constraint the engine does not anticipate
    Other,
}

impl UniqueConstraint {
    pub const PARTICIPANT_EMAIL: &'static str = "uq_participants_email";
    pub const PARTICIPANT_TELEGRAM: &'static str = "uq_participants_telegram";
    pub const TEAM_NAME_CATEGORY: &'static str = "uix_team_name_category";

    /// Constraint name as declared in the schema
    pub fn name(&self) -> &'static str {
        match self {
            Self::ParticipantEmail => Self::PARTICIPANT_EMAIL,
            Self::ParticipantTelegram => Self::PARTICIPANT_TELEGRAM,
            Self::TeamNameCategory => Self::TEAM_NAME_CATEGORY,
            Self::Other => "unknown",
        }
    }

    /// Map a constraint name reported by the database
    pub fn from_name(name: &str) -> Self {
        match name {
            Self::PARTICIPANT_EMAIL => Self::ParticipantEmail,
            Self::PARTICIPANT_TELEGRAM => Self::ParticipantTelegram,
            Self::TEAM_NAME_CATEGORY => Self::TeamNameCategory,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for UniqueConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_names_round_trip() {
        for constraint in [
            UniqueConstraint::ParticipantEmail,
            UniqueConstraint::ParticipantTelegram,
            UniqueConstraint::TeamNameCategory,
        ] {
            assert_eq!(UniqueConstraint::from_name(constraint.name()), constraint);
        }
    }

    #[test]
    fn test_unknown_constraint_name() {
        assert_eq!(
            UniqueConstraint::from_name("pk_participants"),
            UniqueConstraint::Other
        );
    }
}
