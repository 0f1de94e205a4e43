use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use gtk4 as gtk;
use gtk4::glib;
use libadwaita as adw;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::Settings;
use crate::feedback::Feedback;
use crate::game::{Face, Session, Symbol};
use crate::hearts::HeartField;

/// Card faces as the board last drew them.
#[derive(Clone, Debug)]
pub struct Tile {
    pub symbol: Symbol,
    pub face: Face,
}

pub struct AppState {
    pub app: Option<adw::Application>,
    pub view_stack: Option<gtk::Stack>,
    pub sound_button: Option<gtk::ToggleButton>,
    pub level_label: Option<gtk::Label>,
    pub score_label: Option<gtk::Label>,
    pub timer_bar: Option<gtk::ProgressBar>,
    pub status_label: Option<gtk::Label>,
    pub board_container: Option<gtk::Box>,
    pub round_overlay: Option<gtk::Box>,
    pub round_message: Option<gtk::Label>,
    pub next_button: Option<gtk::Button>,
    pub retry_button: Option<gtk::Button>,
    pub arcade_button: Option<gtk::Button>,
    pub hearts_canvas: Option<gtk::DrawingArea>,
    pub dynamic_css_provider: Option<gtk::CssProvider>,

    pub session: Session,
    pub feedback: Feedback,
    pub hearts: HeartField,
    pub rng: StdRng,
    pub tiles: Vec<Tile>,
    pub grid_buttons: Vec<gtk::Button>,
    pub grid_cols: i32,
    pub grid_rows: i32,
    pub card_images: HashMap<Symbol, Option<gtk::cairo::ImageSurface>>,
    // Bumped on every new round; delayed callbacks compare against it.
    pub game_id: u64,
    pub pump_handle: Option<glib::SourceId>,
    pub last_pump: Option<Instant>,
    pub hearts_tick: Option<gtk::TickCallbackId>,
}

impl AppState {
    pub fn new(settings: Settings, feedback: Feedback) -> Self {
        AppState {
            app: None,
            view_stack: None,
            sound_button: None,
            level_label: None,
            score_label: None,
            timer_bar: None,
            status_label: None,
            board_container: None,
            round_overlay: None,
            round_message: None,
            next_button: None,
            retry_button: None,
            arcade_button: None,
            hearts_canvas: None,
            dynamic_css_provider: None,
            session: Session::new(settings),
            feedback,
            hearts: HeartField::new(),
            rng: StdRng::from_os_rng(),
            tiles: Vec::new(),
            grid_buttons: Vec::new(),
            grid_cols: 0,
            grid_rows: 0,
            card_images: HashMap::new(),
            game_id: 0,
            pump_handle: None,
            last_pump: None,
            hearts_tick: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        self.session.settings()
    }

    pub fn asset_path(&self, name: &str) -> PathBuf {
        self.settings().asset_path(name)
    }

    /// Loads (once) the face image for `symbol`. `None` means draw the glyph.
    pub fn card_image(&mut self, symbol: Symbol) -> Option<gtk::cairo::ImageSurface> {
        if let Some(cached) = self.card_images.get(&symbol) {
            return cached.clone();
        }
        let path = self.asset_path(&symbol.asset_name());
        let surface = std::fs::File::open(&path)
            .map_err(|err| err.to_string())
            .and_then(|mut file| {
                gtk::cairo::ImageSurface::create_from_png(&mut file).map_err(|err| err.to_string())
            });
        let surface = match surface {
            Ok(surface) => Some(surface),
            Err(err) => {
                tracing::debug!("no image for {symbol} at {}: {err}", path.display());
                None
            }
        };
        self.card_images.insert(symbol, surface.clone());
        surface
    }

    /// Grid shape for a deck: two columns for the smallest deck, four up to
    /// twelve cards, five beyond.
    pub fn set_grid_for(&mut self, card_count: usize) {
        let cols = if card_count <= 4 {
            2
        } else if card_count <= 12 {
            4
        } else {
            5
        };
        self.grid_cols = cols;
        self.grid_rows = (card_count as i32 + cols - 1) / cols;
    }
}
