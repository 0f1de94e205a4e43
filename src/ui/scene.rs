use std::cell::RefCell;
use std::rc::Rc;

use gtk4 as gtk;
use gtk4::prelude::*;

use super::board::build_board_grid;
use super::state::AppState;
use crate::game::{Mode, Outcome, Stage};

const STORY_FAREWELL: &str = "I hope this game adds a little joy to your day. \
It's my way of bridging the gap between us until I can see you again. \
Happy Valentine's Day! ❤️";

pub(super) fn view_for(stage: Stage) -> &'static str {
    match stage {
        Stage::Intro => "intro",
        Stage::Greeting => "greeting",
        Stage::Playing | Stage::RoundEnd(_) | Stage::Completed => "game",
    }
}

pub(super) fn show_view(state: &Rc<RefCell<AppState>>, name: &str) {
    let st = state.borrow();
    if let Some(stack) = &st.view_stack
        && stack.visible_child_name().as_deref() != Some(name)
    {
        stack.set_transition_type(gtk::StackTransitionType::Crossfade);
        stack.set_visible_child_name(name);
    }
    if let Some(canvas) = &st.hearts_canvas {
        canvas.set_visible(name != "intro");
    }
}

pub(super) fn rebuild_board(state: &Rc<RefCell<AppState>>) {
    let (board_container, grid_cols, grid_rows) = {
        let st = state.borrow();
        (st.board_container.clone(), st.grid_cols, st.grid_rows)
    };
    let Some(board_container) = board_container else {
        return;
    };

    while let Some(child) = board_container.first_child() {
        board_container.remove(&child);
    }
    let grid = build_board_grid(state);
    // Cards are 3:4, so the grid is narrower than its cell count suggests.
    let grid_ratio = if grid_rows > 0 {
        grid_cols as f32 * 0.75 / grid_rows as f32
    } else {
        1.0
    };
    let grid_frame = gtk::AspectFrame::new(0.5, 0.5, grid_ratio, false);
    grid_frame.set_halign(gtk::Align::Fill);
    grid_frame.set_valign(gtk::Align::Fill);
    grid_frame.set_hexpand(true);
    grid_frame.set_vexpand(true);
    grid_frame.set_child(Some(&grid));
    board_container.append(&grid_frame);
}

pub(super) fn hide_round_end(st: &AppState) {
    if let Some(overlay) = &st.round_overlay {
        overlay.set_visible(false);
    }
}

pub(super) fn show_round_end(
    st: &AppState,
    outcome: Outcome,
    mode: Mode,
    score: u64,
    final_level: bool,
) {
    let message = match (outcome, mode) {
        (Outcome::Won, _) if final_level => STORY_FAREWELL.to_string(),
        (Outcome::Won, Mode::Story) => "Level Complete! ❤️".to_string(),
        (Outcome::Won, Mode::Arcade) => format!("Level Complete!\nScore: {score}"),
        (Outcome::Lost, Mode::Story) => "Time's up! 💔".to_string(),
        (Outcome::Lost, Mode::Arcade) => format!("Game Over!\nScore: {score} 💔"),
    };
    if let Some(label) = &st.round_message {
        label.set_text(&message);
    }
    if let Some(button) = &st.next_button {
        button.set_visible(outcome == Outcome::Won && !final_level);
    }
    if let Some(button) = &st.retry_button {
        button.set_visible(outcome == Outcome::Lost);
        button.set_label(match mode {
            Mode::Story => "Try Again",
            Mode::Arcade => "New Arcade Run",
        });
    }
    if let Some(button) = &st.arcade_button {
        button.set_visible(final_level);
    }
    if let Some(overlay) = &st.round_overlay {
        overlay.set_visible(true);
    }
}
