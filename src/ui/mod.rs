pub mod app;
mod audio;
mod board;
mod debug_tools;
mod dialogs;
mod hearts_view;
mod hud;
mod scene;
mod state;
