//! Per-level progression state machine.
//!
//! Every part moves through `Locked -> Accessible -> Pending -> Completed`,
//! falling back from `Pending` to `Accessible` when the grader rejects the
//! answer or the request fails. A part is accessible iff it is the first part
//! or the part before it is completed, so parts are solved strictly in order.
//!
//! This module is pure: it owns no timers and performs no I/O. The services
//! layer drives countdown ticks and network calls and feeds the results back
//! through [`LevelProgress::tick_countdown`], [`LevelProgress::resolve`] and
//! [`LevelProgress::rollback`].

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::model::{Level, LevelId, PartId, SubpartKey};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("empty answer")]
    EmptyAnswer,

    #[error("part {part} does not exist in this level")]
    UnknownPart { part: PartId },

    #[error("part {part} is locked")]
    Locked { part: PartId },

    #[error("part {part} is already completed")]
    AlreadyCompleted { part: PartId },

    #[error("a submission for part {part} is already in flight")]
    SubmissionInFlight { part: PartId },

    #[error("submission ticket is no longer current")]
    StaleTicket,
}

impl ProgressError {
    /// Input problems the team can fix by typing; everything else is a
    /// control that should not have been enabled.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, ProgressError::EmptyAnswer)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PartState {
    Locked,
    Accessible,
    Pending,
    Completed,
}

/// Proof that a submission was accepted into `Pending`.
///
/// Only the holder of the current ticket can tick, resolve or roll back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmissionTicket {
    part: PartId,
    seq: u64,
}

impl SubmissionTicket {
    #[must_use]
    pub fn part(&self) -> PartId {
        self.part
    }
}

/// Outcome of applying the grader's verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Part solved; `next` becomes current once the caller advances.
    Advanced { solved: PartId, next: PartId },
    /// The final part was solved.
    LevelComplete { solved: PartId },
    /// Wrong answer; the part stays submittable.
    Rejected { part: PartId },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartSnapshot {
    pub id: PartId,
    pub subpart: Option<SubpartKey>,
    pub state: PartState,
    pub draft: String,
}

/// Plain-data view of a [`LevelProgress`] for observers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub level: LevelId,
    pub current_part: PartId,
    pub parts: Vec<PartSnapshot>,
    pub pending: Option<PartId>,
    pub countdown_remaining: Option<u32>,
    pub complete: bool,
}

impl ProgressSnapshot {
    #[must_use]
    pub fn part(&self, id: PartId) -> Option<&PartSnapshot> {
        self.parts.iter().find(|part| part.id == id)
    }

    #[must_use]
    pub fn state_of(&self, id: PartId) -> Option<PartState> {
        self.part(id).map(|part| part.state)
    }
}

#[derive(Clone, Copy, Debug)]
struct InFlight {
    ticket: SubmissionTicket,
    countdown_remaining: Option<u32>,
}

/// Lock/countdown/submit state for one level page visit.
#[derive(Clone, Debug)]
pub struct LevelProgress {
    level: LevelId,
    subparts: Vec<Option<SubpartKey>>,
    current: PartId,
    completed: BTreeSet<PartId>,
    drafts: BTreeMap<PartId, String>,
    in_flight: Option<InFlight>,
    next_seq: u64,
}

impl LevelProgress {
    #[must_use]
    pub fn new(level: &Level) -> Self {
        Self {
            level: level.id(),
            subparts: level
                .parts()
                .iter()
                .map(|part| level.subpart_for(part.id()))
                .collect(),
            current: PartId::FIRST,
            completed: BTreeSet::new(),
            drafts: BTreeMap::new(),
            in_flight: None,
            next_seq: 0,
        }
    }

    #[must_use]
    pub fn level(&self) -> LevelId {
        self.level
    }

    fn part_count(&self) -> u32 {
        u32::try_from(self.subparts.len()).unwrap_or(u32::MAX)
    }

    fn contains(&self, part: PartId) -> bool {
        part.value() >= 1 && part.value() <= self.part_count()
    }

    fn final_part(&self) -> PartId {
        PartId::new(self.part_count())
    }

    #[must_use]
    pub fn current_part(&self) -> PartId {
        self.current
    }

    #[must_use]
    pub fn is_completed(&self, part: PartId) -> bool {
        self.completed.contains(&part)
    }

    #[must_use]
    pub fn is_accessible(&self, part: PartId) -> bool {
        if !self.contains(part) {
            return false;
        }
        part.previous()
            .is_none_or(|previous| self.completed.contains(&previous))
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed.len() == self.subparts.len()
    }

    #[must_use]
    pub fn pending_part(&self) -> Option<PartId> {
        self.in_flight.map(|flight| flight.ticket.part)
    }

    #[must_use]
    pub fn countdown_remaining(&self) -> Option<u32> {
        self.in_flight.and_then(|flight| flight.countdown_remaining)
    }

    #[must_use]
    pub fn completed_parts(&self) -> Vec<PartId> {
        self.completed.iter().copied().collect()
    }

    #[must_use]
    pub fn part_state(&self, part: PartId) -> PartState {
        if self.completed.contains(&part) {
            PartState::Completed
        } else if self.pending_part() == Some(part) {
            PartState::Pending
        } else if self.is_accessible(part) {
            PartState::Accessible
        } else {
            PartState::Locked
        }
    }

    pub fn set_draft(&mut self, part: PartId, text: impl Into<String>) {
        if self.contains(part) {
            self.drafts.insert(part, text.into());
        }
    }

    #[must_use]
    pub fn draft(&self, part: PartId) -> &str {
        self.drafts.get(&part).map_or("", String::as_str)
    }

    /// Move `part` into `Pending`.
    ///
    /// The draft is stored even when the submission is refused so the team
    /// never loses what they typed.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::EmptyAnswer` for blank drafts, and a logic
    /// error if the part is unknown, locked, completed, or another
    /// submission is in flight.
    pub fn begin_submission(
        &mut self,
        part: PartId,
        draft: &str,
        countdown_secs: u32,
    ) -> Result<SubmissionTicket, ProgressError> {
        if !self.contains(part) {
            return Err(ProgressError::UnknownPart { part });
        }
        self.drafts.insert(part, draft.to_string());

        if let Some(flight) = self.in_flight {
            return Err(ProgressError::SubmissionInFlight {
                part: flight.ticket.part,
            });
        }
        if self.completed.contains(&part) {
            return Err(ProgressError::AlreadyCompleted { part });
        }
        if !self.is_accessible(part) {
            return Err(ProgressError::Locked { part });
        }
        if draft.trim().is_empty() {
            return Err(ProgressError::EmptyAnswer);
        }

        self.next_seq = self.next_seq.wrapping_add(1);
        let ticket = SubmissionTicket {
            part,
            seq: self.next_seq,
        };
        self.in_flight = Some(InFlight {
            ticket,
            countdown_remaining: (countdown_secs > 0).then_some(countdown_secs),
        });
        Ok(ticket)
    }

    fn check_ticket(&self, ticket: SubmissionTicket) -> Result<InFlight, ProgressError> {
        match self.in_flight {
            Some(flight) if flight.ticket == ticket => Ok(flight),
            _ => Err(ProgressError::StaleTicket),
        }
    }

    /// Count the visible countdown down by one second.
    ///
    /// Returns the seconds left; at zero the countdown is cleared and the
    /// request phase begins.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::StaleTicket` if `ticket` is not in flight.
    pub fn tick_countdown(&mut self, ticket: SubmissionTicket) -> Result<u32, ProgressError> {
        let mut flight = self.check_ticket(ticket)?;
        let remaining = flight.countdown_remaining.unwrap_or(0).saturating_sub(1);
        flight.countdown_remaining = (remaining > 0).then_some(remaining);
        self.in_flight = Some(flight);
        Ok(remaining)
    }

    /// Apply the grader's verdict to the in-flight submission.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::StaleTicket` if `ticket` is not in flight.
    pub fn resolve(
        &mut self,
        ticket: SubmissionTicket,
        correct: bool,
    ) -> Result<Resolution, ProgressError> {
        self.check_ticket(ticket)?;
        self.in_flight = None;
        let part = ticket.part;

        if !correct {
            return Ok(Resolution::Rejected { part });
        }

        self.completed.insert(part);
        if part == self.final_part() {
            Ok(Resolution::LevelComplete { solved: part })
        } else {
            Ok(Resolution::Advanced {
                solved: part,
                next: part.next(),
            })
        }
    }

    /// Return the in-flight part to `Accessible` after a failed request.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::StaleTicket` if `ticket` is not in flight.
    pub fn rollback(&mut self, ticket: SubmissionTicket) -> Result<(), ProgressError> {
        self.check_ticket(ticket)?;
        self.in_flight = None;
        Ok(())
    }

    /// Drop any in-flight submission regardless of ticket (page teardown).
    pub fn abandon(&mut self) -> Option<PartId> {
        self.in_flight.take().map(|flight| flight.ticket.part)
    }

    /// Point `current_part` at the first part that still needs solving.
    pub fn advance_current(&mut self) -> PartId {
        self.current = (1..=self.part_count())
            .map(PartId::new)
            .find(|part| !self.completed.contains(part))
            .unwrap_or_else(|| self.final_part());
        self.current
    }

    /// Mark previously solved parts as completed.
    ///
    /// Only the contiguous prefix starting at part 1 is taken; anything after
    /// a gap is ignored so hydration cannot unlock parts out of order.
    /// Returns the number of parts newly marked.
    pub fn restore_completed(&mut self, parts: &[PartId]) -> usize {
        let known: BTreeSet<PartId> = parts.iter().copied().collect();
        let mut restored = 0;
        for part in (1..=self.part_count()).map(PartId::new) {
            if self.completed.contains(&part) {
                continue;
            }
            if !known.contains(&part) {
                break;
            }
            self.completed.insert(part);
            restored += 1;
        }
        self.advance_current();
        restored
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        let parts = self
            .subparts
            .iter()
            .enumerate()
            .map(|(index, subpart)| {
                let id = PartId::new(u32::try_from(index + 1).unwrap_or(u32::MAX));
                PartSnapshot {
                    id,
                    subpart: *subpart,
                    state: self.part_state(id),
                    draft: self.draft(id).to_string(),
                }
            })
            .collect();

        ProgressSnapshot {
            level: self.level,
            current_part: self.current,
            parts,
            pending: self.pending_part(),
            countdown_remaining: self.countdown_remaining(),
            complete: self.is_complete(),
        }
    }
}
