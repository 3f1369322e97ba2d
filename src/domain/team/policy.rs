//! Team membership policy

use serde::Deserialize;

/// Rules applied when a participant joins an existing team
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TeamPolicy {
    /// Maximum number of members per team; unlimited when unset
    #[serde(default)]
    pub max_team_size: Option<usize>,
}

impl TeamPolicy {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_max_team_size(mut self, size: usize) -> Self {
        self.max_team_size = Some(size);
        self
    }

    /// Whether a team with `current_members` can accept one more
    pub fn has_room(&self, current_members: usize) -> bool {
        match self.max_team_size {
            Some(max) => current_members < max,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited_policy_always_has_room() {
        let policy = TeamPolicy::unlimited();
        assert!(policy.has_room(0));
        assert!(policy.has_room(1_000));
    }

    #[test]
    fn test_capped_policy() {
        let policy = TeamPolicy::unlimited().with_max_team_size(4);
        assert!(policy.has_room(3));
        assert!(!policy.has_room(4));
        assert!(!policy.has_room(5));
    }
}
