pub mod engine;
pub mod model;
pub mod presets;
pub mod results;
pub mod sequencer;
pub mod session;
pub mod store;
pub mod transport;

pub use model::{BattleSetup, BonusCategory, Contestant, RoundConfig};
pub use presets::{RoundCatalogue, RoundPreset};
pub use results::{export_rows, ranking, winner, ExportRow, Standing};
pub use sequencer::{Advance, RoundSequencer};
pub use session::BattleSession;
pub use store::{Intervention, Leg, Pattern, RoundKey, ScoreSheet, ScoreStore};
pub use transport::{BattleConfigFile, BattleReport};
