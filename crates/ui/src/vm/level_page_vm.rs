use cicada_core::model::{Level, LevelId, Part, PartContent, PartId};
use cicada_core::progression::PartState;
use services::{ControllerState, Notice, NoticeKind};

use crate::vm::markdown_to_html;

pub const SUBMIT_LABEL: &str = "SUBMIT";
pub const CHECKING_LABEL: &str = "Checking...";
pub const SOLVED_LABEL: &str = "SOLVED";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PartBodyVm {
    Html(String),
    Cipher {
        lines: Vec<String>,
        legend: Vec<(char, String)>,
    },
    Video {
        uri: String,
    },
}

impl PartBodyVm {
    fn from_part(part: &Part) -> Self {
        match part.content() {
            PartContent::Text(markdown) => PartBodyVm::Html(markdown_to_html(markdown)),
            PartContent::Cipher { lines, legend } => PartBodyVm::Cipher {
                lines: lines.clone(),
                legend: legend.clone(),
            },
            PartContent::Video { uri } => PartBodyVm::Video { uri: uri.clone() },
        }
    }
}

/// One part row on a level page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartRowVm {
    pub id: PartId,
    pub title: String,
    pub body: PartBodyVm,
    pub state: PartState,
    pub is_current: bool,
    pub draft: String,
    pub button_label: String,
    pub input_enabled: bool,
    pub submit_enabled: bool,
}

impl PartRowVm {
    #[must_use]
    pub fn dom_id(&self) -> String {
        format!("answer-{}", self.id)
    }

    #[must_use]
    pub fn state_class(&self) -> &'static str {
        match self.state {
            PartState::Locked => "part part-locked",
            PartState::Accessible => "part part-open",
            PartState::Pending => "part part-pending",
            PartState::Completed => "part part-solved",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoticeVm {
    pub class: &'static str,
    pub message: String,
}

impl From<&Notice> for NoticeVm {
    fn from(notice: &Notice) -> Self {
        let class = match notice.kind {
            NoticeKind::Success => "notice notice-success",
            NoticeKind::Failure => "notice notice-failure",
            NoticeKind::Warning => "notice notice-warning",
        };
        Self {
            class,
            message: notice.message.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelPageVm {
    pub level: LevelId,
    pub title: String,
    pub rows: Vec<PartRowVm>,
    pub solved: usize,
    pub complete: bool,
    pub notice: Option<NoticeVm>,
}

/// Label of a part's submit control.
///
/// The pending part shows the remaining countdown, then "Checking..." while
/// the request is out.
#[must_use]
pub fn submit_label(state: PartState, countdown_remaining: Option<u32>) -> String {
    match (state, countdown_remaining) {
        (PartState::Pending, Some(remaining)) => remaining.to_string(),
        (PartState::Pending, None) => CHECKING_LABEL.to_string(),
        (PartState::Completed, _) => SOLVED_LABEL.to_string(),
        (PartState::Locked | PartState::Accessible, _) => SUBMIT_LABEL.to_string(),
    }
}

#[must_use]
pub fn map_level_page(level: &Level, state: &ControllerState) -> LevelPageVm {
    let progress = &state.progress;
    let busy = progress.pending.is_some();
    let rows = level
        .parts()
        .iter()
        .filter_map(|part| {
            let snapshot = progress.part(part.id())?;
            let state = snapshot.state;
            Some(PartRowVm {
                id: part.id(),
                title: part.title().to_string(),
                body: PartBodyVm::from_part(part),
                state,
                is_current: part.id() == progress.current_part && !progress.complete,
                draft: snapshot.draft.clone(),
                button_label: submit_label(state, progress.countdown_remaining),
                input_enabled: state == PartState::Accessible,
                submit_enabled: state == PartState::Accessible && !busy,
            })
        })
        .collect::<Vec<_>>();
    let solved = rows
        .iter()
        .filter(|row| row.state == PartState::Completed)
        .count();

    LevelPageVm {
        level: level.id(),
        title: level.title().to_string(),
        rows,
        solved,
        complete: progress.complete,
        notice: state.notice.as_ref().map(NoticeVm::from),
    }
}
