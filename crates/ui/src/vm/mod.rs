mod auth_vm;
mod level_map_vm;
mod level_page_vm;
mod markdown_vm;

pub use auth_vm::{LOGIN_FAILED, LOGOUT_FAILED, auth_error_message};
pub use level_map_vm::{
    LOCKED_LEVEL_MESSAGE, LevelMapVm, LevelTileVm, PLAY_COUNTDOWN_SECS, TileState,
};
pub use level_page_vm::{
    CHECKING_LABEL, LevelPageVm, NoticeVm, PartBodyVm, PartRowVm, SOLVED_LABEL, SUBMIT_LABEL,
    map_level_page, submit_label,
};
pub use markdown_vm::{markdown_to_html, sanitize_html};
