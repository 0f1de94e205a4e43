pub mod config;
pub mod feedback;
pub mod game;
pub mod hearts;
pub mod logging;

#[cfg(feature = "gui")]
pub mod ui;
