use std::cell::RefCell;
use std::rc::Rc;

use gtk4 as gtk;
use gtk4::glib;
use gtk4::pango;
use gtk4::prelude::*;

use super::app::{handle_card_click, handle_card_peek};
use super::state::AppState;
use crate::game::Face;
use crate::game::specials::{Polarity, special_for};

pub const CONTENT_MARGIN: i32 = 12;
pub const TILE_GAP: i32 = 8;
const HIDDEN_GLYPH: &str = "♥";

pub(super) fn apply_face_classes(button: &gtk::Button, face: Face) {
    for class in ["peeked", "selected", "matched"] {
        button.remove_css_class(class);
    }
    match face {
        Face::Hidden => {}
        Face::Peeked => button.add_css_class("peeked"),
        Face::Selected => button.add_css_class("selected"),
        Face::Matched => button.add_css_class("matched"),
    }
    if let Some(child) = button.child() {
        child.queue_draw();
    }
}

fn draw_card(
    state: &Rc<RefCell<AppState>>,
    index: usize,
    area: &gtk::DrawingArea,
    cr: &gtk::cairo::Context,
    width: i32,
    height: i32,
) {
    let mut st = state.borrow_mut();
    let Some(tile) = st.tiles.get(index).cloned() else {
        return;
    };
    let face_up = tile.face.is_face_up();
    let min_dim = width.min(height) as f64;
    cr.set_antialias(gtk::cairo::Antialias::Best);

    if face_up && let Some(surface) = st.card_image(tile.symbol) {
        let (img_w, img_h) = (surface.width() as f64, surface.height() as f64);
        if img_w > 0.0 && img_h > 0.0 {
            let scale = (width as f64 / img_w).min(height as f64 / img_h) * 0.86;
            cr.save().ok();
            cr.translate(
                (width as f64 - img_w * scale) / 2.0,
                (height as f64 - img_h * scale) / 2.0,
            );
            cr.scale(scale, scale);
            if cr.set_source_surface(&surface, 0.0, 0.0).is_ok() {
                let _ = cr.paint();
            }
            cr.restore().ok();
            return;
        }
    }
    drop(st);

    let text = if face_up {
        tile.symbol.to_string()
    } else {
        HIDDEN_GLYPH.to_string()
    };
    let font_size = if face_up { min_dim * 0.46 } else { min_dim * 0.34 };

    let layout = pangocairo::functions::create_layout(cr);
    let mut font_desc = pango::FontDescription::new();
    font_desc.set_family("Cantarell, Noto Sans, sans");
    font_desc.set_weight(pango::Weight::Bold);
    font_desc.set_size((font_size * pango::SCALE as f64) as i32);
    layout.set_font_description(Some(&font_desc));
    layout.set_text(&text);

    let fg = area.style_context().color();
    cr.set_source_rgba(
        fg.red() as f64,
        fg.green() as f64,
        fg.blue() as f64,
        fg.alpha() as f64,
    );

    let (text_width, text_height) = layout.pixel_size();
    cr.move_to(
        (width as f64 - text_width as f64) / 2.0,
        (height as f64 - text_height as f64) / 2.0,
    );
    pangocairo::functions::show_layout(cr, &layout);
}

pub fn build_board_grid(state: &Rc<RefCell<AppState>>) -> gtk::Grid {
    let grid = gtk::Grid::new();
    grid.add_css_class("heart-board");
    grid.set_row_spacing(TILE_GAP as u32);
    grid.set_column_spacing(TILE_GAP as u32);
    grid.set_halign(gtk::Align::Fill);
    grid.set_valign(gtk::Align::Fill);
    grid.set_hexpand(true);
    grid.set_vexpand(true);

    let (css_provider, grid_cols, grid_rows) = {
        let st = state.borrow();
        (st.dynamic_css_provider.clone(), st.grid_cols.max(1), st.grid_rows.max(1))
    };

    let update_styles = move |grid: &gtk::Grid| {
        let width = grid.width();
        let height = grid.height();
        if width > 0 && height > 0 {
            let cell_width = (width - (grid_cols - 1) * TILE_GAP) / grid_cols;
            let cell_height = (height - (grid_rows - 1) * TILE_GAP) / grid_rows;
            let card_radius = (cell_width.min(cell_height) as f64 * 0.14) as i32;
            if let Some(provider) = &css_provider {
                provider.load_from_data(&format!(
                    ".heart-card {{ border-radius: {card_radius}px; }}"
                ));
            }
        }
    };

    let update_width = update_styles.clone();
    grid.connect_closure(
        "notify::width",
        false,
        glib::closure_local!(move |grid: gtk::Grid, _: glib::ParamSpec| {
            update_width(&grid);
        }),
    );
    grid.connect_closure(
        "notify::height",
        false,
        glib::closure_local!(move |grid: gtk::Grid, _: glib::ParamSpec| {
            update_styles(&grid);
        }),
    );

    let tiles = state.borrow().tiles.clone();
    let mut buttons = Vec::with_capacity(tiles.len());

    for (index, tile) in tiles.iter().enumerate() {
        let aspect_frame = gtk::AspectFrame::builder()
            .ratio(0.75)
            .obey_child(false)
            .halign(gtk::Align::Fill)
            .valign(gtk::Align::Fill)
            .hexpand(true)
            .vexpand(true)
            .build();

        let button = gtk::Button::builder()
            .css_classes(vec!["heart-card"])
            .build();
        button.set_hexpand(true);
        button.set_vexpand(true);
        if let Some(special) = special_for(tile.symbol) {
            button.add_css_class(match special.polarity {
                Polarity::Buff => "special-buff",
                Polarity::Malus => "special-malus",
            });
        }

        let drawing_area = gtk::DrawingArea::builder()
            .hexpand(true)
            .vexpand(true)
            .build();
        drawing_area.add_css_class("heart-card-face");

        let state_draw = state.clone();
        drawing_area.set_draw_func(move |area, cr, width, height| {
            draw_card(&state_draw, index, area, cr, width, height);
        });
        button.set_child(Some(&drawing_area));
        apply_face_classes(&button, tile.face);

        let motion = gtk::EventControllerMotion::new();
        let state_peek = state.clone();
        motion.connect_enter(move |_, _, _| {
            handle_card_peek(&state_peek, index);
        });
        button.add_controller(motion);

        let state_click = state.clone();
        button.connect_clicked(move |_| {
            handle_card_click(&state_click, index);
        });

        aspect_frame.set_child(Some(&button));

        let i = index as i32;
        grid.attach(&aspect_frame, i % grid_cols, i / grid_cols, 1, 1);
        buttons.push(button);
    }

    state.borrow_mut().grid_buttons = buttons;

    grid
}
