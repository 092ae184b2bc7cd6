mod home;
mod level;
mod play;
mod state;

pub use home::HomeView;
pub use level::LevelView;
pub use play::PlayView;
pub use state::{ViewError, ViewState, view_state_from_resource};

#[cfg(test)]
mod test_harness;
#[cfg(test)]
mod view_smoke;
