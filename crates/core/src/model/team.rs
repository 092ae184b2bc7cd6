use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::catalog::LevelCatalog;
use crate::model::ids::{LevelId, TeamId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TeamError {
    #[error("team name cannot be empty")]
    EmptyName,
}

//
// ─── TEAM ──────────────────────────────────────────────────────────────────────
//

/// The authenticated team and the highest level it has unlocked.
///
/// `current_level` never decreases through this type: the only mutator is
/// [`Team::advance_to`], which keeps the maximum of the old and new values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TeamWire")]
pub struct Team {
    id: TeamId,
    team_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    leader_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    leader_email: Option<String>,
    current_level: LevelId,
}

impl Team {
    /// Create a team.
    ///
    /// # Errors
    ///
    /// Returns `TeamError::EmptyName` if `team_name` is blank.
    pub fn new(
        id: TeamId,
        team_name: impl Into<String>,
        current_level: LevelId,
    ) -> Result<Self, TeamError> {
        let team_name = team_name.into();
        if team_name.trim().is_empty() {
            return Err(TeamError::EmptyName);
        }
        Ok(Self {
            id,
            team_name,
            leader_name: None,
            leader_email: None,
            current_level: normalize_level(current_level.value()),
        })
    }

    #[must_use]
    pub fn with_leader(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.leader_name = Some(name.into());
        self.leader_email = Some(email.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> &TeamId {
        &self.id
    }

    #[must_use]
    pub fn team_name(&self) -> &str {
        &self.team_name
    }

    #[must_use]
    pub fn leader_name(&self) -> Option<&str> {
        self.leader_name.as_deref()
    }

    #[must_use]
    pub fn leader_email(&self) -> Option<&str> {
        self.leader_email.as_deref()
    }

    #[must_use]
    pub fn current_level(&self) -> LevelId {
        self.current_level
    }

    /// Raise `current_level` to `level` if it is higher.
    ///
    /// Returns `true` when the value changed.
    pub fn advance_to(&mut self, level: LevelId) -> bool {
        if level > self.current_level {
            self.current_level = level;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn is_level_unlocked(&self, level: LevelId) -> bool {
        level <= self.current_level
    }

    /// True once the team has moved past the last level of the catalog.
    #[must_use]
    pub fn has_finished(&self, catalog: &LevelCatalog) -> bool {
        self.current_level > catalog.final_level()
    }
}

fn normalize_level(raw: u32) -> LevelId {
    LevelId::new(raw.max(1))
}

/// Shape accepted from the grading service and from persisted storage.
///
/// The service may send its document id as `_id`; missing or zero levels
/// are treated as level 1.
#[derive(Deserialize)]
struct TeamWire {
    #[serde(alias = "_id")]
    id: TeamId,
    team_name: String,
    #[serde(default)]
    leader_name: Option<String>,
    #[serde(default)]
    leader_email: Option<String>,
    #[serde(default)]
    current_level: Option<u32>,
}

impl From<TeamWire> for Team {
    fn from(wire: TeamWire) -> Self {
        Self {
            id: wire.id,
            team_name: wire.team_name,
            leader_name: wire.leader_name,
            leader_email: wire.leader_email,
            current_level: normalize_level(wire.current_level.unwrap_or(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(level: u32) -> Team {
        Team::new(TeamId::new("t-1"), "Cicadas", LevelId::new(level)).unwrap()
    }

    #[test]
    fn advance_keeps_maximum() {
        let mut team = team(3);
        assert!(!team.advance_to(LevelId::new(2)));
        assert_eq!(team.current_level(), LevelId::new(3));
        assert!(team.advance_to(LevelId::new(5)));
        assert!(!team.advance_to(LevelId::new(5)));
        assert_eq!(team.current_level(), LevelId::new(5));
    }

    #[test]
    fn zero_level_is_normalized() {
        assert_eq!(team(0).current_level(), LevelId::new(1));
    }

    #[test]
    fn blank_name_rejected() {
        let err = Team::new(TeamId::new("x"), "  ", LevelId::new(1)).unwrap_err();
        assert_eq!(err, TeamError::EmptyName);
    }

    #[test]
    fn unlocked_levels_are_at_or_below_current() {
        let team = team(2);
        assert!(team.is_level_unlocked(LevelId::new(1)));
        assert!(team.is_level_unlocked(LevelId::new(2)));
        assert!(!team.is_level_unlocked(LevelId::new(3)));
    }

    #[test]
    fn deserializes_service_shape() {
        let json = r#"{"_id":"65f0","team_name":"Nymphs","leader_email":"a@b.c","current_level":4,"members":[]}"#;
        let team: Team = serde_json::from_str(json).unwrap();
        assert_eq!(team.id().as_str(), "65f0");
        assert_eq!(team.leader_email(), Some("a@b.c"));
        assert_eq!(team.current_level(), LevelId::new(4));
    }

    #[test]
    fn missing_level_defaults_to_first() {
        let team: Team = serde_json::from_str(r#"{"id":"1","team_name":"N"}"#).unwrap();
        assert_eq!(team.current_level(), LevelId::new(1));
    }

    #[test]
    fn serialized_form_reads_back() {
        let original = team(6).with_leader("Ada", "ada@example.com");
        let json = serde_json::to_string(&original).unwrap();
        let back: Team = serde_json::from_str(&json).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn finished_after_final_level() {
        let catalog = LevelCatalog::standard();
        assert!(!team(7).has_finished(&catalog));
        assert!(team(8).has_finished(&catalog));
    }
}
