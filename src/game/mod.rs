//! Toolkit-free game core.

pub mod agenda;
pub mod board;
pub mod cards;
pub mod deck;
pub mod effects;
pub mod events;
pub mod levels;
pub mod session;
pub mod specials;
pub mod timer;

pub use board::{Phase, Round};
pub use cards::{Card, Face, Symbol};
pub use events::{AnalyticsEvent, Cue, GameEvent, Outcome};
pub use levels::{Mode, RoundConfig};
pub use session::{Session, Stage};
