use thiserror::Error;

use crate::model::ids::{LevelId, PartId, SubpartKey};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LevelError {
    #[error("level {level} has no parts")]
    NoParts { level: LevelId },

    #[error("level {level}: expected part {expected}, found part {found}")]
    PartOutOfOrder {
        level: LevelId,
        expected: PartId,
        found: PartId,
    },

    #[error("level {level} has too many parts for single-letter keys ({count})")]
    TooManyParts { level: LevelId, count: usize },

    #[error("catalog is empty")]
    EmptyCatalog,

    #[error("catalog: expected level {expected}, found level {found}")]
    LevelOutOfOrder { expected: LevelId, found: LevelId },
}

//
// ─── CONTENT ───────────────────────────────────────────────────────────────────
//

/// What a part shows the team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartContent {
    /// Markdown prose: riddles, fill-in-the-blank questions.
    Text(String),
    /// A substitution cipher with its decoding legend.
    Cipher {
        lines: Vec<String>,
        legend: Vec<(char, String)>,
    },
    /// A clip the team has to watch.
    Video { uri: String },
}

/// Hint revealed after the team has been on the level for a while.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    pub text: String,
    pub reveal_after_secs: u32,
}

/// A gradable unit inside a level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    id: PartId,
    title: String,
    content: PartContent,
}

impl Part {
    #[must_use]
    pub fn new(id: PartId, title: impl Into<String>, content: PartContent) -> Self {
        Self {
            id,
            title: title.into(),
            content,
        }
    }

    #[must_use]
    pub fn id(&self) -> PartId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn content(&self) -> &PartContent {
        &self.content
    }
}

//
// ─── LEVEL ─────────────────────────────────────────────────────────────────────
//

/// A top-level puzzle, split into one or more parts solved strictly in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    id: LevelId,
    title: String,
    parts: Vec<Part>,
    countdown_secs: u32,
    hint: Option<Hint>,
}

impl Level {
    /// Build a level, checking that parts are numbered 1..=n.
    ///
    /// # Errors
    ///
    /// Returns `LevelError` if there are no parts, parts are out of order,
    /// or there are more parts than single-letter sub-part keys.
    pub fn new(
        id: LevelId,
        title: impl Into<String>,
        parts: Vec<Part>,
        countdown_secs: u32,
    ) -> Result<Self, LevelError> {
        if parts.is_empty() {
            return Err(LevelError::NoParts { level: id });
        }
        if parts.len() > 26 {
            return Err(LevelError::TooManyParts {
                level: id,
                count: parts.len(),
            });
        }
        for (index, part) in parts.iter().enumerate() {
            let expected = PartId::new(u32::try_from(index + 1).unwrap_or(u32::MAX));
            if part.id() != expected {
                return Err(LevelError::PartOutOfOrder {
                    level: id,
                    expected,
                    found: part.id(),
                });
            }
        }
        Ok(Self {
            id,
            title: title.into(),
            parts,
            countdown_secs,
            hint: None,
        })
    }

    #[must_use]
    pub fn with_hint(mut self, text: impl Into<String>, reveal_after_secs: u32) -> Self {
        self.hint = Some(Hint {
            text: text.into(),
            reveal_after_secs,
        });
        self
    }

    #[must_use]
    pub fn id(&self) -> LevelId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    #[must_use]
    pub fn part(&self, id: PartId) -> Option<&Part> {
        let index = usize::try_from(id.value()).ok()?.checked_sub(1)?;
        self.parts.get(index)
    }

    /// Seconds the submit control stays disabled before the request is sent.
    #[must_use]
    pub fn countdown_secs(&self) -> u32 {
        self.countdown_secs
    }

    #[must_use]
    pub fn hint(&self) -> Option<&Hint> {
        self.hint.as_ref()
    }

    #[must_use]
    pub fn is_multi_part(&self) -> bool {
        self.parts.len() > 1
    }

    /// Sub-part key sent with a submission. Single-part levels send none.
    #[must_use]
    pub fn subpart_for(&self, part: PartId) -> Option<SubpartKey> {
        if !self.is_multi_part() || self.part(part).is_none() {
            return None;
        }
        SubpartKey::for_part(part)
    }

    #[must_use]
    pub fn final_part(&self) -> PartId {
        self.parts.last().map_or(PartId::FIRST, Part::id)
    }

    #[must_use]
    pub fn is_final(&self, part: PartId) -> bool {
        part == self.final_part()
    }
}
