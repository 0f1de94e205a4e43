use std::cell::RefCell;
use std::rc::Rc;

use gtk4 as gtk;
use gtk4::glib;
use gtk4::prelude::*;

use super::state::AppState;
use crate::hearts::{Heart, PALETTE};

fn draw_heart(cr: &gtk::cairo::Context, heart: &Heart) {
    let (r, g, b) = PALETTE[heart.color % PALETTE.len()];
    let scale = heart.size / 10.0;
    cr.save().ok();
    cr.translate(heart.x, heart.y);
    cr.scale(scale, scale);
    cr.move_to(0.0, 0.0);
    cr.curve_to(-5.0, -5.0, -10.0, 0.0, 0.0, 10.0);
    cr.curve_to(10.0, 0.0, 5.0, -5.0, 0.0, 0.0);
    cr.set_source_rgba(r, g, b, heart.opacity);
    let _ = cr.fill();
    cr.restore().ok();
}

/// Full-window canvas that never takes input; the board stays clickable
/// underneath.
pub(super) fn build_hearts_canvas(state: &Rc<RefCell<AppState>>) -> gtk::DrawingArea {
    let canvas = gtk::DrawingArea::builder()
        .hexpand(true)
        .vexpand(true)
        .can_target(false)
        .build();
    canvas.add_css_class("hearts-canvas");

    let state_draw = state.clone();
    canvas.set_draw_func(move |_, cr, _, _| {
        let st = state_draw.borrow();
        for heart in st.hearts.hearts() {
            draw_heart(cr, heart);
        }
    });

    let state_resize = state.clone();
    canvas.connect_resize(move |_, width, height| {
        let mut st = state_resize.borrow_mut();
        let st = &mut *st;
        st.hearts.resize(width as f64, height as f64, &mut st.rng);
    });

    let state_tick = state.clone();
    let tick = canvas.add_tick_callback(move |canvas, _clock| {
        let Ok(mut st) = state_tick.try_borrow_mut() else {
            return glib::ControlFlow::Continue;
        };
        if canvas.is_visible() {
            let st = &mut *st;
            st.hearts.step(&mut st.rng);
            canvas.queue_draw();
        }
        glib::ControlFlow::Continue
    });
    state.borrow_mut().hearts_tick = Some(tick);

    canvas
}

/// Screen-space centre of a card, in canvas coordinates.
pub(super) fn card_center(st: &AppState, index: usize) -> Option<(f64, f64)> {
    let canvas = st.hearts_canvas.as_ref()?;
    let button = st.grid_buttons.get(index)?;
    let bounds = button.compute_bounds(canvas)?;
    let center = bounds.center();
    Some((center.x() as f64, center.y() as f64))
}
