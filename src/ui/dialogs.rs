use std::path::Path;

use gtk4 as gtk;
use libadwaita as adw;

use adw::prelude::*;

use crate::game::specials::SPECIALS;

pub fn show_instructions_dialog(app: &adw::Application) -> adw::AlertDialog {
    let mut body = String::from(
        "Hover a card to peek at it for a moment.\n\
Click two cards to pick a pair. Matching pairs stay open.\n\
Clear the board before the timer runs out.\n\nSpecial cards:",
    );
    for special in &SPECIALS {
        body.push_str(&format!("\n{}  {}: {}", special.symbol, special.name, special.description));
    }
    let dialog = adw::AlertDialog::new(Some("How to Play"), Some(&body));
    dialog.add_response("ok", "Got it");
    dialog.set_default_response(Some("ok"));
    dialog.set_close_response("ok");
    dialog.present(app.active_window().as_ref());
    dialog
}

pub fn show_about_dialog(app: &adw::Application) -> adw::AboutDialog {
    let dialog = adw::AboutDialog::builder()
        .application_name("Heartmatch")
        .application_icon("emblem-favorite-symbolic")
        .version(env!("CARGO_PKG_VERSION"))
        .comments("A Valentine's memory game with a story and an arcade mode.")
        .build();
    dialog.add_legal_section("Heartmatch", None, gtk::License::MitX11, None);
    dialog.present(app.active_window().as_ref());
    dialog
}

/// Milestone popup. The image is optional; a missing file just leaves it out.
pub fn show_milestone_dialog(
    app: &adw::Application,
    score: u64,
    text: &str,
    image: &Path,
) -> adw::AlertDialog {
    let dialog = adw::AlertDialog::new(Some(&format!("{score} points!")), Some(text));
    if image.exists() {
        let picture = gtk::Picture::for_filename(image);
        picture.set_can_shrink(true);
        picture.set_size_request(240, 240);
        dialog.set_extra_child(Some(&picture));
    } else {
        tracing::debug!("milestone image {} not found", image.display());
    }
    dialog.add_response("continue", "Keep Playing");
    dialog.set_default_response(Some("continue"));
    dialog.set_close_response("continue");
    dialog.present(app.active_window().as_ref());
    dialog
}
