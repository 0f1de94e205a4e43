use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use gtk4::glib;
use gtk4::prelude::*;

use super::state::AppState;
use crate::game::Mode;
use crate::game::specials::EffectTag;

const PUMP_INTERVAL: Duration = Duration::from_millis(50);
const LOW_TIME_FRACTION: f64 = 0.3;

pub(super) fn update_round_labels(st: &AppState, mode: Mode, level: u32, score: u64) {
    if let Some(label) = &st.level_label {
        let text = match mode {
            Mode::Story => format!("Level {level}"),
            Mode::Arcade => format!("Arcade Level {level}"),
        };
        label.set_text(&text);
    }
    if let Some(label) = &st.score_label {
        label.set_visible(mode == Mode::Arcade);
        label.set_text(&format!("Score: {score}"));
    }
    if let Some(status) = &st.status_label {
        status.set_text("");
    }
}

pub(super) fn update_score(st: &AppState, score: u64) {
    if let Some(label) = &st.score_label {
        label.set_text(&format!("Score: {score}"));
    }
}

pub(super) fn update_timer(st: &AppState, left: u32, total: u32, frozen: bool) {
    let Some(bar) = &st.timer_bar else {
        return;
    };
    let fraction = if total == 0 {
        0.0
    } else {
        (left as f64 / total as f64).clamp(0.0, 1.0)
    };
    bar.set_fraction(fraction);
    bar.set_text(Some(&format!("{left}s")));
    if fraction < LOW_TIME_FRACTION {
        bar.add_css_class("low");
    } else {
        bar.remove_css_class("low");
    }
    if frozen {
        bar.add_css_class("frozen");
    } else {
        bar.remove_css_class("frozen");
    }
}

fn effect_class(tag: EffectTag) -> &'static str {
    match tag {
        EffectTag::TimerFrozen => "effect-frozen",
        EffectTag::PeekBlocked => "effect-peek-blocked",
    }
}

fn effect_text(tag: EffectTag) -> &'static str {
    match tag {
        EffectTag::TimerFrozen => "Time Freeze!",
        EffectTag::PeekBlocked => "Swipe Block!",
    }
}

pub(super) fn show_effect(st: &AppState, tag: EffectTag, active: bool) {
    if let Some(board) = &st.board_container {
        if active {
            board.add_css_class(effect_class(tag));
        } else {
            board.remove_css_class(effect_class(tag));
        }
    }
    if let Some(status) = &st.status_label {
        if active {
            status.set_text(effect_text(tag));
        } else if status.text() == effect_text(tag) {
            status.set_text("");
        }
    }
}

pub(super) fn set_sound_icon(st: &AppState) {
    if let Some(button) = &st.sound_button {
        let enabled = st.feedback.sound_enabled();
        button.set_icon_name(if enabled {
            "audio-volume-high-symbolic"
        } else {
            "audio-volume-muted-symbolic"
        });
    }
}

pub(super) fn stop_pump(st: &mut AppState) {
    if let Some(handle) = st.pump_handle.take() {
        handle.remove();
    }
    st.last_pump = None;
}

/// Feeds wall-clock time into the session and routes whatever it emits.
pub(super) fn start_pump(state: &Rc<RefCell<AppState>>, on_events: fn(&Rc<RefCell<AppState>>)) {
    let mut st = state.borrow_mut();
    stop_pump(&mut st);
    st.last_pump = Some(Instant::now());

    let state_clone = state.clone();
    let handle = glib::timeout_add_local(PUMP_INTERVAL, move || {
        {
            let mut st = state_clone.borrow_mut();
            let now = Instant::now();
            let elapsed = st
                .last_pump
                .map(|last| now.saturating_duration_since(last))
                .unwrap_or_default();
            st.last_pump = Some(now);
            st.session.advance(elapsed);
        }
        on_events(&state_clone);
        glib::ControlFlow::Continue
    });
    st.pump_handle = Some(handle);
}
