pub mod battle;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod stderr_buffer;
pub mod tui;

pub use error::BattleError;
