pub mod catalog;
mod ids;
mod level;
mod team;

pub use catalog::LevelCatalog;
pub use ids::{LevelId, ParseIdError, PartId, SubpartKey, TeamId};
pub use level::{Hint, Level, LevelError, Part, PartContent};
pub use team::{Team, TeamError};
