use dioxus::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewError {
    Unknown,
    UnknownLevel,
}

impl ViewError {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            ViewError::Unknown => "Something went wrong. Please try again.",
            ViewError::UnknownLevel => "There is no such level.",
        }
    }
}

/// Load state of a view backed by a `use_resource`.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready(T),
    Error(ViewError),
}

#[must_use]
pub fn view_state_from_resource<T: Clone>(
    resource: Resource<Result<T, ViewError>>,
) -> ViewState<T> {
    match resource.state().cloned() {
        UseResourceState::Ready => {}
        UseResourceState::Pending => return ViewState::Loading,
        UseResourceState::Paused | UseResourceState::Stopped => return ViewState::Idle,
    }
    match resource.value().read().as_ref() {
        Some(Ok(data)) => ViewState::Ready(data.clone()),
        Some(Err(err)) => ViewState::Error(*err),
        None => ViewState::Error(ViewError::Unknown),
    }
}
