use std::collections::BTreeMap;

use cicada_core::model::{PartId, SubpartKey, Team};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(super) struct LoginRequest<'a> {
    pub leader_email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct TeamEnvelope {
    pub team: Team,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ErrorBody {
    #[serde(default)]
    pub err: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct SubmitRequest<'a> {
    pub ans: &'a str,
    pub level: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subpart: Option<SubpartKey>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SubmitResponse {
    #[serde(default)]
    pub correct: bool,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub new_level: Option<u32>,
}

/// Server-side record of solved sub-parts, sent as
/// `{ "subpartACompleted": true, ... }`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, serde_json::Value>")]
pub struct LevelStatus {
    completed: Vec<SubpartKey>,
}

impl LevelStatus {
    #[must_use]
    pub fn new(completed: Vec<SubpartKey>) -> Self {
        Self { completed }
    }

    #[must_use]
    pub fn completed_subparts(&self) -> &[SubpartKey] {
        &self.completed
    }

    #[must_use]
    pub fn is_completed(&self, key: SubpartKey) -> bool {
        self.completed.contains(&key)
    }

    /// Solved parts in ascending order.
    #[must_use]
    pub fn completed_parts(&self) -> Vec<PartId> {
        let mut parts: Vec<PartId> = self
            .completed
            .iter()
            .map(|key| PartId::new(u32::from(key.letter()) - u32::from('a') + 1))
            .collect();
        parts.sort();
        parts
    }
}

impl From<BTreeMap<String, serde_json::Value>> for LevelStatus {
    fn from(fields: BTreeMap<String, serde_json::Value>) -> Self {
        let completed = fields
            .iter()
            .filter(|(_, value)| value.as_bool() == Some(true))
            .filter_map(|(name, _)| {
                let letter = name.strip_prefix("subpart")?.strip_suffix("Completed")?;
                letter.parse::<SubpartKey>().ok()
            })
            .collect();
        Self { completed }
    }
}
