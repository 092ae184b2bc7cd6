use cicada_core::model::{LevelCatalog, LevelId, Team};

/// Seconds counted down on the map before a level opens.
pub const PLAY_COUNTDOWN_SECS: u32 = 3;

pub const LOCKED_LEVEL_MESSAGE: &str = "This level is locked!";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileState {
    Locked,
    Unlocked,
    Current,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelTileVm {
    pub level: LevelId,
    pub title: String,
    pub state: TileState,
}

impl LevelTileVm {
    #[must_use]
    pub fn is_playable(&self) -> bool {
        self.state != TileState::Locked
    }

    #[must_use]
    pub fn class(&self) -> &'static str {
        match self.state {
            TileState::Locked => "tile tile-locked",
            TileState::Unlocked => "tile tile-unlocked",
            TileState::Current => "tile tile-current",
        }
    }
}

/// The level map as seen by one team.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelMapVm {
    pub team_name: String,
    pub current_level: LevelId,
    pub tiles: Vec<LevelTileVm>,
    pub finished: bool,
}

impl LevelMapVm {
    #[must_use]
    pub fn new(team: &Team, catalog: &LevelCatalog) -> Self {
        let current_level = team.current_level();
        let tiles = catalog
            .levels()
            .iter()
            .map(|level| {
                let state = if level.id() == current_level {
                    TileState::Current
                } else if team.is_level_unlocked(level.id()) {
                    TileState::Unlocked
                } else {
                    TileState::Locked
                };
                LevelTileVm {
                    level: level.id(),
                    title: level.title().to_string(),
                    state,
                }
            })
            .collect();

        Self {
            team_name: team.team_name().to_string(),
            current_level,
            tiles,
            finished: team.has_finished(catalog),
        }
    }

    #[must_use]
    pub fn tile(&self, level: LevelId) -> Option<&LevelTileVm> {
        self.tiles.iter().find(|tile| tile.level == level)
    }

    #[must_use]
    pub fn can_play(&self, level: LevelId) -> bool {
        self.tile(level).is_some_and(LevelTileVm::is_playable)
    }
}
