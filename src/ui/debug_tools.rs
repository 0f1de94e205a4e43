use std::cell::RefCell;
use std::rc::Rc;

use gtk4::gdk;
use gtk4::glib;

use super::app::with_session;
use super::state::AppState;
use crate::game::Stage;

pub const DEBUG_ENV: &str = "HEARTMATCH_DEBUG";

pub fn debug_mode_enabled() -> bool {
    match std::env::var(DEBUG_ENV) {
        Ok(value) => {
            let v = value.trim().to_ascii_lowercase();
            matches!(v.as_str(), "1" | "true" | "yes" | "on")
        }
        Err(_) => false,
    }
}

fn level_for_key(key: gdk::Key) -> Option<u32> {
    match key {
        gdk::Key::_1 | gdk::Key::KP_1 => Some(1),
        gdk::Key::_2 | gdk::Key::KP_2 => Some(2),
        gdk::Key::_3 | gdk::Key::KP_3 => Some(3),
        gdk::Key::_4 | gdk::Key::KP_4 => Some(4),
        gdk::Key::_5 | gdk::Key::KP_5 => Some(5),
        _ => None,
    }
}

/// Ctrl+N leaves one pair on the board; Ctrl+1..5 jumps to a level in the
/// current mode. Only active with `HEARTMATCH_DEBUG=1`.
pub fn handle_debug_shortcut(
    state: &Rc<RefCell<AppState>>,
    key: gdk::Key,
    mods: gdk::ModifierType,
) -> bool {
    if !mods.contains(gdk::ModifierType::CONTROL_MASK) {
        return false;
    }
    let near_win = matches!(key, gdk::Key::N | gdk::Key::n | gdk::Key::F9);
    let level = level_for_key(key);
    if !near_win && level.is_none() {
        return false;
    }

    if !debug_mode_enabled() {
        show_debug_banner(state, &format!("DEBUG OFF | export {DEBUG_ENV}=1"));
        return true;
    }

    if near_win {
        let applied = state.borrow_mut().session.debug_near_win();
        super::app::route_events(state);
        if applied {
            tracing::debug!("near-win board prepared");
            show_debug_banner(state, "DEBUG | Near-win ready");
        } else {
            tracing::debug!("near-win skipped, no round in play");
            show_debug_banner(state, "DEBUG | Near-win failed");
        }
        return true;
    }

    if let Some(level) = level {
        let (mode, stage) = {
            let st = state.borrow();
            (st.session.mode(), st.session.stage())
        };
        if stage == Stage::Intro {
            with_session(state, |session| {
                session.begin();
            });
        }
        with_session(state, |session| session.start_level(level));
        tracing::debug!("forced {} level {}", mode.name(), level);
        show_debug_banner(state, &format!("DEBUG | {} level {}", mode.name(), level));
    }
    true
}

fn show_debug_banner(state: &Rc<RefCell<AppState>>, message: &str) {
    let game_id = {
        let st = state.borrow();
        if let Some(status) = &st.status_label {
            status.set_text(message);
        }
        st.game_id
    };
    let state_weak = Rc::downgrade(state);
    glib::timeout_add_local_once(std::time::Duration::from_millis(1200), move || {
        if let Some(state) = state_weak.upgrade() {
            let st = state.borrow();
            if st.game_id == game_id
                && let Some(status) = &st.status_label
            {
                status.set_text("");
            }
        }
    });
}
