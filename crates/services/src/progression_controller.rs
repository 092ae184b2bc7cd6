//! Async driver for a level's [`LevelProgress`].
//!
//! The controller owns the countdown timer and the grading request, feeds
//! their results into the pure state machine, and publishes every change on
//! a `watch` channel the UI renders from.

use std::sync::{Arc, Mutex, PoisonError};

use cicada_core::model::{Level, LevelId, PartId};
use cicada_core::progression::{
    LevelProgress, ProgressSnapshot, Resolution, SubmissionTicket,
};
use tokio::sync::{Notify, watch};
use tracing::{debug, info, warn};

use crate::api::{AnswerVerdict, TeamApi};
use crate::config::ProgressionTiming;
use crate::error::SubmitError;
use crate::session_store::SessionStore;

pub const LEVEL_UNLOCKED_MESSAGE: &str = "Correct! Level unlocked.";
pub const INCORRECT_MESSAGE: &str = "Incorrect answer. Try again.";
pub const TRANSPORT_MESSAGE: &str = "Something went wrong while submitting.";
pub const EMPTY_ANSWER_MESSAGE: &str = "Please enter your answer before submitting.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Failure,
    Warning,
}

/// Transient message shown after a submission attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// What observers of a controller see.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControllerState {
    pub progress: ProgressSnapshot,
    pub notice: Option<Notice>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A non-final part was accepted; `next` is now current.
    PartSolved {
        part: PartId,
        next: PartId,
        message: String,
    },
    /// The final part was accepted and the team's level was raised.
    LevelCompleted { new_level: LevelId, message: String },
    /// The grader rejected the answer; the part can be resubmitted.
    Incorrect { part: PartId, message: String },
}

impl SubmitOutcome {
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            SubmitOutcome::PartSolved { message, .. }
            | SubmitOutcome::LevelCompleted { message, .. }
            | SubmitOutcome::Incorrect { message, .. } => message,
        }
    }
}

struct Shared {
    progress: Mutex<LevelProgress>,
    state: watch::Sender<ControllerState>,
}

impl Shared {
    fn update<R>(&self, f: impl FnOnce(&mut LevelProgress) -> R) -> R {
        let mut progress = self.progress.lock().unwrap_or_else(PoisonError::into_inner);
        let result = f(&mut progress);
        let snapshot = progress.snapshot();
        drop(progress);
        self.state.send_modify(|state| state.progress = snapshot);
        result
    }

    fn read<R>(&self, f: impl FnOnce(&LevelProgress) -> R) -> R {
        let progress = self.progress.lock().unwrap_or_else(PoisonError::into_inner);
        f(&progress)
    }

    fn notify(&self, notice: Option<Notice>) {
        self.state.send_modify(|state| state.notice = notice);
    }
}

/// Returns an abandoned submission to `Accessible` when dropped.
///
/// Once the ticket has been resolved or rolled back, the rollback here is a
/// stale-ticket no-op.
struct PendingGuard {
    shared: Arc<Shared>,
    ticket: SubmissionTicket,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let ticket = self.ticket;
        if self.shared.read(|progress| progress.pending_part().is_some()) {
            let rolled_back = self.shared.update(|progress| progress.rollback(ticket).is_ok());
            if rolled_back {
                debug!(part = ticket.part().value(), "abandoned submission rolled back");
            }
        }
    }
}

/// One level page's lock, countdown and submit logic.
pub struct LevelProgressionController {
    level: Level,
    api: Arc<dyn TeamApi>,
    store: Arc<SessionStore>,
    timing: ProgressionTiming,
    shared: Arc<Shared>,
    cancel: Notify,
}

impl LevelProgressionController {
    #[must_use]
    pub fn new(
        level: Level,
        api: Arc<dyn TeamApi>,
        store: Arc<SessionStore>,
        timing: ProgressionTiming,
    ) -> Self {
        let progress = LevelProgress::new(&level);
        let (state, _) = watch::channel(ControllerState {
            progress: progress.snapshot(),
            notice: None,
        });
        Self {
            level,
            api,
            store,
            timing,
            shared: Arc::new(Shared {
                progress: Mutex::new(progress),
                state,
            }),
            cancel: Notify::new(),
        }
    }

    #[must_use]
    pub fn level(&self) -> &Level {
        &self.level
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.shared.state.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> ControllerState {
        self.shared.state.borrow().clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.shared.read(LevelProgress::snapshot)
    }

    pub fn set_draft(&self, part: PartId, text: impl Into<String>) {
        let text = text.into();
        self.shared.update(|progress| progress.set_draft(part, text));
    }

    pub fn dismiss_notice(&self) {
        self.shared.notify(None);
    }

    /// Restore parts solved on an earlier visit.
    ///
    /// Local flags are used first. A multi-part level with no local flags
    /// asks the service which sub-parts it has recorded and mirrors the
    /// answer locally. Failures are logged and leave the level at part 1.
    /// Returns the number of parts restored.
    pub async fn hydrate(&self) -> usize {
        let level = self.level.id();
        let local = match self.store.completed_parts(level).await {
            Ok(parts) => parts,
            Err(err) => {
                warn!(level = level.value(), error = %err, "could not read part flags");
                Vec::new()
            }
        };
        let mut restored = self
            .shared
            .update(|progress| progress.restore_completed(&local));

        if self.level.is_multi_part() && local.is_empty() {
            match self.api.level_status(level).await {
                Ok(status) => {
                    let remote = status.completed_parts();
                    restored += self
                        .shared
                        .update(|progress| progress.restore_completed(&remote));
                    for part in self.shared.read(LevelProgress::completed_parts) {
                        if let Err(err) = self.store.mark_part_completed(level, part).await {
                            warn!(level = level.value(), error = %err, "could not mirror part flag");
                        }
                    }
                }
                Err(err) => {
                    debug!(level = level.value(), error = %err, "level status unavailable");
                }
            }
        }

        if restored > 0 {
            info!(level = level.value(), restored, "progress restored");
        }
        restored
    }

    /// Submit `draft` for `part`.
    ///
    /// Runs the level's countdown, sends one grading request, and applies
    /// the verdict. Blank drafts and parts that are not currently
    /// submittable are refused before anything is sent.
    ///
    /// # Errors
    ///
    /// - `SubmitError::Validation` for a blank draft.
    /// - `SubmitError::Logic` when the part is locked, completed, or another
    ///   submission is in flight.
    /// - `SubmitError::Transport` when the request fails; the part is
    ///   submittable again and the draft is kept.
    /// - `SubmitError::Cancelled` when [`Self::cancel`] interrupts it.
    /// - `SubmitError::Session` when the level was solved but the new level
    ///   could not be saved.
    pub async fn submit(&self, part: PartId, draft: &str) -> Result<SubmitOutcome, SubmitError> {
        let countdown = self.level.countdown_secs();
        let ticket = match self
            .shared
            .update(|progress| progress.begin_submission(part, draft, countdown))
        {
            Ok(ticket) => ticket,
            Err(err) if err.is_validation() => {
                self.shared
                    .notify(Some(Notice::new(NoticeKind::Warning, EMPTY_ANSWER_MESSAGE)));
                return Err(SubmitError::Validation(EMPTY_ANSWER_MESSAGE.into()));
            }
            Err(err) => {
                debug!(part = part.value(), error = %err, "submission refused");
                return Err(SubmitError::Logic(err));
            }
        };
        self.shared.notify(None);
        let _guard = PendingGuard {
            shared: Arc::clone(&self.shared),
            ticket,
        };

        let cancelled = self.cancel.notified();
        tokio::pin!(cancelled);
        let verdict = tokio::select! {
            verdict = self.countdown_then_request(ticket, draft.trim()) => verdict,
            () = &mut cancelled => Err(SubmitError::Cancelled),
        };

        match verdict {
            Ok(verdict) => self.apply_verdict(ticket, verdict).await,
            Err(SubmitError::Transport(err)) => {
                self.shared.update(|progress| progress.rollback(ticket)).ok();
                warn!(level = self.level.id().value(), part = part.value(), error = %err, "submission failed");
                self.shared.notify(Some(Notice::new(
                    NoticeKind::Failure,
                    err.user_message(TRANSPORT_MESSAGE),
                )));
                Err(SubmitError::Transport(err))
            }
            Err(err) => Err(err),
        }
    }

    async fn countdown_then_request(
        &self,
        ticket: SubmissionTicket,
        answer: &str,
    ) -> Result<AnswerVerdict, SubmitError> {
        while self
            .shared
            .read(|progress| progress.countdown_remaining().is_some())
        {
            tokio::time::sleep(self.timing.tick).await;
            self.shared
                .update(|progress| progress.tick_countdown(ticket))
                .map_err(|_| SubmitError::Cancelled)?;
        }

        let subpart = self.level.subpart_for(ticket.part());
        debug!(level = self.level.id().value(), subpart = ?subpart, "sending answer");
        Ok(self
            .api
            .submit_answer(self.level.id(), subpart, answer)
            .await?)
    }

    async fn apply_verdict(
        &self,
        ticket: SubmissionTicket,
        verdict: AnswerVerdict,
    ) -> Result<SubmitOutcome, SubmitError> {
        let level = self.level.id();
        // The final part is only committed once the unlocked level is saved,
        // so a failed save leaves it submittable.
        let unlocked = if verdict.correct && self.level.is_final(ticket.part()) {
            let target = verdict.new_level.unwrap_or_else(|| level.next());
            match self.store.advance_level(target).await {
                Ok(new_level) => Some(new_level),
                Err(err) => {
                    self.shared.update(|progress| progress.rollback(ticket)).ok();
                    warn!(level = level.value(), error = %err, "could not save unlocked level");
                    self.shared
                        .notify(Some(Notice::new(NoticeKind::Failure, TRANSPORT_MESSAGE)));
                    return Err(err.into());
                }
            }
        } else {
            None
        };
        let resolution = self
            .shared
            .update(|progress| progress.resolve(ticket, verdict.correct))
            .map_err(|_| SubmitError::Cancelled)?;

        match resolution {
            Resolution::Rejected { part } => {
                let message = verdict
                    .message
                    .unwrap_or_else(|| INCORRECT_MESSAGE.to_string());
                self.shared
                    .notify(Some(Notice::new(NoticeKind::Failure, message.clone())));
                Ok(SubmitOutcome::Incorrect { part, message })
            }
            Resolution::Advanced { solved, next } => {
                if let Err(err) = self.store.mark_part_completed(level, solved).await {
                    warn!(level = level.value(), error = %err, "could not save part flag");
                }
                let message = verdict
                    .message
                    .unwrap_or_else(|| self.part_solved_message(solved));
                info!(level = level.value(), part = solved.value(), "part solved");
                self.shared
                    .notify(Some(Notice::new(NoticeKind::Success, message.clone())));
                tokio::time::sleep(self.timing.advance_delay).await;
                self.shared.update(LevelProgress::advance_current);
                Ok(SubmitOutcome::PartSolved {
                    part: solved,
                    next,
                    message,
                })
            }
            Resolution::LevelComplete { .. } => {
                let new_level = unlocked.unwrap_or_else(|| level.next());
                if let Err(err) = self.store.clear_level(level).await {
                    warn!(level = level.value(), error = %err, "could not clear part flags");
                }
                let message = verdict
                    .message
                    .unwrap_or_else(|| LEVEL_UNLOCKED_MESSAGE.to_string());
                info!(level = level.value(), new_level = new_level.value(), "level completed");
                self.shared
                    .notify(Some(Notice::new(NoticeKind::Success, message.clone())));
                tokio::time::sleep(self.timing.completion_delay).await;
                Ok(SubmitOutcome::LevelCompleted { new_level, message })
            }
        }
    }

    fn part_solved_message(&self, part: PartId) -> String {
        match self.level.subpart_for(part) {
            Some(key) => format!("Part {} solved!", key.label()),
            None => format!("Part {part} solved!"),
        }
    }

    /// Abort any countdown or request in progress; the part becomes
    /// submittable again.
    pub fn cancel(&self) {
        self.cancel.notify_waiters();
        if let Some(part) = self.shared.update(LevelProgress::abandon) {
            debug!(part = part.value(), "submission cancelled");
        }
    }
}
