use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Server-issued identifier for a team.
///
/// The grading service owns the format, so this is kept opaque.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(String);

impl TeamId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 1-based level number.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelId(u32);

impl LevelId {
    /// Creates a new `LevelId`
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the underlying u32 value
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// The level that follows this one.
    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// 1-based position of a part inside its level.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartId(u32);

impl PartId {
    pub const FIRST: PartId = PartId(1);

    /// Creates a new `PartId`
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the underlying u32 value
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// The part that must be solved before this one, if any.
    #[must_use]
    pub const fn previous(&self) -> Option<Self> {
        if self.0 <= 1 {
            None
        } else {
            Some(Self(self.0 - 1))
        }
    }

    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Single-letter sub-part identifier sent to the grading service (`a`, `b`, ...).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubpartKey(char);

impl SubpartKey {
    /// Build a key from a letter. Uppercase input is folded to lowercase.
    ///
    /// # Errors
    ///
    /// Returns `ParseIdError` if `letter` is not an ASCII letter.
    pub fn new(letter: char) -> Result<Self, ParseIdError> {
        if letter.is_ascii_alphabetic() {
            Ok(Self(letter.to_ascii_lowercase()))
        } else {
            Err(ParseIdError::new("SubpartKey"))
        }
    }

    /// Key for the given part position: 1 -> `a`, 2 -> `b`, ...
    ///
    /// Returns `None` past `z`.
    #[must_use]
    pub fn for_part(part: PartId) -> Option<Self> {
        let offset = part.value().checked_sub(1)?;
        if offset >= 26 {
            return None;
        }
        let offset = u8::try_from(offset).ok()?;
        Some(Self(char::from(b'a' + offset)))
    }

    #[must_use]
    pub fn letter(&self) -> char {
        self.0
    }

    /// Uppercase form used in notices ("Part B solved!").
    #[must_use]
    pub fn label(&self) -> char {
        self.0.to_ascii_uppercase()
    }
}

impl fmt::Debug for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TeamId({})", self.0)
    }
}

impl fmt::Debug for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LevelId({})", self.0)
    }
}

impl fmt::Debug for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PartId({})", self.0)
    }
}

impl fmt::Debug for SubpartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubpartKey({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SubpartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<SubpartKey> for String {
    fn from(key: SubpartKey) -> Self {
        key.0.to_string()
    }
}

impl TryFrom<String> for SubpartKey {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl ParseIdError {
    fn new(kind: &'static str) -> Self {
        Self { kind }
    }
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for TeamId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseIdError::new("TeamId"));
        }
        Ok(TeamId::new(trimmed))
    }
}

impl FromStr for LevelId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<u32>() {
            Ok(value) if value >= 1 => Ok(LevelId::new(value)),
            _ => Err(ParseIdError::new("LevelId")),
        }
    }
}

impl FromStr for PartId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<u32>() {
            Ok(value) if value >= 1 => Ok(PartId::new(value)),
            _ => Err(ParseIdError::new("PartId")),
        }
    }
}

impl FromStr for SubpartKey {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) => SubpartKey::new(letter),
            _ => Err(ParseIdError::new("SubpartKey")),
        }
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
