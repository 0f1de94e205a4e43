use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;
use std::time::Duration;

use gtk4 as gtk;
use gtk4::gdk;
use gtk4::glib;
use gtk4::prelude::*;
use libadwaita as adw;
use adw::prelude::*;
use gio::SimpleAction;

use super::audio::MediaAudio;
use super::board::{CONTENT_MARGIN, apply_face_classes};
use super::debug_tools;
use super::dialogs::{show_about_dialog, show_instructions_dialog, show_milestone_dialog};
use super::hearts_view::{build_hearts_canvas, card_center};
use super::hud::{
    set_sound_icon,
    show_effect,
    start_pump,
    stop_pump,
    update_round_labels,
    update_score,
    update_timer,
};
use super::scene::{hide_round_end, rebuild_board, show_round_end, show_view, view_for};
use super::state::{AppState, Tile};
use crate::config::Settings;
use crate::feedback::{Feedback, TracingAnalytics};
use crate::game::events::Burst;
use crate::game::specials::EffectTag;
use crate::game::{Face, GameEvent, Outcome, Stage};

const APP_ID: &str = "io.github.heartmatch.Heartmatch";
const RESOURCE_PREFIX: &str = "/io/github/heartmatch/Heartmatch";

pub(super) fn route_events(state: &Rc<RefCell<AppState>>) {
    loop {
        let events = state.borrow_mut().session.drain_events();
        if events.is_empty() {
            break;
        }
        for event in events {
            handle_event(state, event);
        }
    }
}

fn handle_event(state: &Rc<RefCell<AppState>>, event: GameEvent) {
    match event {
        GameEvent::StageChanged(stage) => {
            show_view(state, view_for(stage));
            if stage == Stage::Playing {
                hide_round_end(&state.borrow());
            }
        }
        GameEvent::RoundStarted {
            mode,
            level,
            symbols,
            time_budget_secs,
            score,
        } => {
            {
                let mut st = state.borrow_mut();
                st.game_id = st.game_id.wrapping_add(1);
                st.set_grid_for(symbols.len());
                st.tiles = symbols
                    .into_iter()
                    .map(|symbol| Tile {
                        symbol,
                        face: Face::Hidden,
                    })
                    .collect();
                update_round_labels(&st, mode, level, score);
                update_timer(&st, time_budget_secs, time_budget_secs, false);
                hide_round_end(&st);
                for tag in [EffectTag::TimerFrozen, EffectTag::PeekBlocked] {
                    show_effect(&st, tag, false);
                }
            }
            rebuild_board(state);
        }
        GameEvent::CardFace { index, face } => {
            let mut st = state.borrow_mut();
            if let Some(tile) = st.tiles.get_mut(index) {
                tile.face = face;
            }
            if let Some(button) = st.grid_buttons.get(index) {
                apply_face_classes(button, face);
            }
        }
        GameEvent::TimerChanged {
            left,
            total,
            frozen,
        } => update_timer(&state.borrow(), left, total, frozen),
        GameEvent::ScoreChanged(score) => update_score(&state.borrow(), score),
        GameEvent::EffectStarted(tag) => show_effect(&state.borrow(), tag, true),
        GameEvent::EffectEnded(tag) => show_effect(&state.borrow(), tag, false),
        GameEvent::Burst(burst) => {
            let mut st = state.borrow_mut();
            let st = &mut *st;
            match burst {
                Burst::AtCard(index) => {
                    if let Some((x, y)) = card_center(st, index) {
                        st.hearts.burst_at(x, y, &mut st.rng);
                    }
                }
                Burst::Center => st.hearts.celebrate(&mut st.rng),
            }
        }
        GameEvent::MilestoneReached { score, text, image } => {
            let (app, image_path) = {
                let st = state.borrow();
                (st.app.clone(), st.asset_path(&image))
            };
            let Some(app) = app else {
                return;
            };
            let dialog = show_milestone_dialog(&app, score, &text, &image_path);
            let state_ack = state.clone();
            dialog.connect_response(None, move |_, _| {
                state_ack.borrow_mut().session.acknowledge_milestone();
                route_events(&state_ack);
            });
        }
        GameEvent::MilestoneCleared => {}
        GameEvent::RoundOver {
            outcome,
            mode,
            score,
            final_level,
            ..
        } => {
            if outcome == Outcome::Lost {
                show_round_end(&state.borrow(), outcome, mode, score, final_level);
                return;
            }
            let (game_id, delay) = {
                let st = state.borrow();
                (st.game_id, st.settings().timings.win_message_delay_ms)
            };
            let state_weak = Rc::downgrade(state);
            glib::timeout_add_local_once(Duration::from_millis(delay), move || {
                if let Some(state) = state_weak.upgrade() {
                    let st = state.borrow();
                    if st.game_id == game_id {
                        show_round_end(&st, outcome, mode, score, final_level);
                    }
                }
            });
        }
        GameEvent::Cue(_) | GameEvent::Analytics(_) => {
            state.borrow_mut().feedback.dispatch(&event);
        }
    }
}

pub fn handle_card_peek(state: &Rc<RefCell<AppState>>, index: usize) {
    let accepted = state.borrow_mut().session.peek(index);
    if accepted {
        route_events(state);
    }
}

pub fn handle_card_click(state: &Rc<RefCell<AppState>>, index: usize) {
    let accepted = state.borrow_mut().session.select(index);
    if accepted {
        route_events(state);
    }
}

/// Runs a session operation and routes what it emitted.
pub(super) fn with_session(state: &Rc<RefCell<AppState>>, op: impl FnOnce(&mut crate::game::Session)) {
    op(&mut state.borrow_mut().session);
    route_events(state);
}

fn pause_for_overlay(state: &Rc<RefCell<AppState>>) -> bool {
    let mut st = state.borrow_mut();
    let running = st.pump_handle.is_some();
    stop_pump(&mut st);
    running
}

fn resume_after_overlay(state: &Rc<RefCell<AppState>>, was_running: bool) {
    if was_running {
        start_pump(state, route_events);
    }
}

pub fn run() {
    glib::set_prgname(Some(APP_ID));
    let app = adw::Application::builder().application_id(APP_ID).build();

    app.connect_activate(move |app| {
        load_css();

        let settings = Settings::load_or_default(Some(&glib::user_config_dir()));
        let audio = MediaAudio::new(settings.asset_path("sounds"), settings.sound.clone());
        let feedback = Feedback::new(Box::new(audio), Box::new(TracingAnalytics));
        let state = Rc::new(RefCell::new(AppState::new(settings, feedback)));
        state.borrow_mut().app = Some(app.clone());

        let instructions_action = SimpleAction::new("instructions", None);
        instructions_action.connect_activate({
            let app = app.clone();
            let state = state.clone();
            move |_, _| {
                let was_running = pause_for_overlay(&state);
                let dialog = show_instructions_dialog(&app);
                let state_resume = state.clone();
                dialog.connect_response(None, move |_, _| {
                    resume_after_overlay(&state_resume, was_running);
                });
            }
        });
        app.add_action(&instructions_action);

        let about_action = SimpleAction::new("about", None);
        about_action.connect_activate({
            let app = app.clone();
            let state = state.clone();
            move |_, _| {
                let was_running = pause_for_overlay(&state);
                let dialog = show_about_dialog(&app);
                let state_resume = state.clone();
                dialog.connect_closed(move |_| {
                    resume_after_overlay(&state_resume, was_running);
                });
            }
        });
        app.add_action(&about_action);

        let quit_action = SimpleAction::new("quit", None);
        quit_action.connect_activate({
            let app = app.clone();
            move |_, _| app.quit()
        });
        app.add_action(&quit_action);

        let dynamic_css_provider = gtk::CssProvider::new();
        if let Some(display) = gdk::Display::default() {
            gtk::style_context_add_provider_for_display(
                &display,
                &dynamic_css_provider,
                gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
            );
        }

        let title = gtk::Label::new(None);
        title.set_markup("<b>Heartmatch</b>");
        title.set_halign(gtk::Align::Center);
        let header = adw::HeaderBar::builder().title_widget(&title).build();
        header.add_css_class("app-header");
        header.add_css_class("flat");

        let sound_button = gtk::ToggleButton::builder()
            .icon_name("audio-volume-high-symbolic")
            .active(state.borrow().feedback.sound_enabled())
            .build();
        sound_button.set_tooltip_text(Some("Sound"));
        sound_button.connect_toggled({
            let state = state.clone();
            move |button| {
                let mut st = state.borrow_mut();
                st.feedback.set_sound_enabled(button.is_active());
                set_sound_icon(&st);
            }
        });

        let menu_model = gio::Menu::new();
        menu_model.append(Some("Instructions"), Some("app.instructions"));
        menu_model.append(Some("About Heartmatch"), Some("app.about"));
        menu_model.append(Some("Quit"), Some("app.quit"));
        let menu_button = gtk::MenuButton::builder()
            .icon_name("open-menu-symbolic")
            .menu_model(&menu_model)
            .build();

        let end_box = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        end_box.append(&sound_button);
        end_box.append(&menu_button);
        header.pack_end(&end_box);

        let view_stack = gtk::Stack::new();
        view_stack.set_hexpand(true);
        view_stack.set_vexpand(true);
        view_stack.set_hhomogeneous(false);
        view_stack.set_vhomogeneous(false);
        view_stack.set_transition_type(gtk::StackTransitionType::Crossfade);
        view_stack.set_transition_duration(
            state.borrow().settings().timings.act_transition_ms.min(u32::MAX as u64) as u32,
        );
        view_stack.add_named(&build_intro_view(&state), Some("intro"));
        view_stack.add_named(&build_greeting_view(&state), Some("greeting"));
        view_stack.add_named(&build_game_view(&state), Some("game"));
        view_stack.set_visible_child_name("intro");

        let hearts_canvas = build_hearts_canvas(&state);
        hearts_canvas.set_visible(false);

        let scene = gtk::Overlay::new();
        scene.set_child(Some(&hearts_canvas));
        scene.add_overlay(&view_stack);

        let pointer = gtk::EventControllerMotion::new();
        pointer.connect_motion({
            let state = state.clone();
            move |_, x, y| {
                if let Ok(mut st) = state.try_borrow_mut() {
                    st.hearts.set_pointer(Some((x, y)));
                }
            }
        });
        pointer.connect_leave({
            let state = state.clone();
            move |_| {
                if let Ok(mut st) = state.try_borrow_mut() {
                    st.hearts.set_pointer(None);
                }
            }
        });
        scene.add_controller(pointer);

        let toolbar = adw::ToolbarView::new();
        toolbar.set_hexpand(true);
        toolbar.set_vexpand(true);
        toolbar.add_top_bar(&header);
        toolbar.set_content(Some(&scene));

        let win = adw::ApplicationWindow::builder()
            .application(app)
            .title("Heartmatch")
            .default_width(720)
            .default_height(860)
            .content(&toolbar)
            .build();
        win.set_size_request(360, 560);
        win.add_css_class("app-window");

        {
            let mut st = state.borrow_mut();
            st.view_stack = Some(view_stack.clone());
            st.sound_button = Some(sound_button);
            st.hearts_canvas = Some(hearts_canvas);
            st.dynamic_css_provider = Some(dynamic_css_provider);
            set_sound_icon(&st);
        }

        let global_key = gtk::EventControllerKey::new();
        global_key.set_propagation_phase(gtk::PropagationPhase::Capture);
        global_key.connect_key_pressed({
            let state = state.clone();
            move |_, key, _, mods| {
                if debug_tools::handle_debug_shortcut(&state, key, mods) {
                    return glib::Propagation::Stop;
                }
                glib::Propagation::Proceed
            }
        });
        win.add_controller(global_key);

        win.connect_close_request({
            let state = state.clone();
            move |_| {
                let mut st = state.borrow_mut();
                stop_pump(&mut st);
                if let Some(tick) = st.hearts_tick.take() {
                    tick.remove();
                }
                glib::Propagation::Proceed
            }
        });

        start_pump(&state, route_events);
        win.present();
    });

    app.run();
}

fn load_css() {
    static RESOURCES_INIT: Once = Once::new();
    RESOURCES_INIT.call_once(|| {
        if let Err(err) = gio::resources_register_include!("heartmatch.gresource") {
            tracing::error!("failed to register embedded resources: {err}");
        }
    });

    let Some(display) = gdk::Display::default() else {
        return;
    };

    let provider = gtk::CssProvider::new();
    provider.load_from_resource(&format!("{RESOURCE_PREFIX}/style.css"));
    gtk::style_context_add_provider_for_display(
        &display,
        &provider,
        gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
    );
}

fn centered_page(css_class: &str) -> (gtk::Box, gtk::Box) {
    let root = gtk::Box::new(gtk::Orientation::Vertical, 0);
    root.set_hexpand(true);
    root.set_vexpand(true);
    root.add_css_class(css_class);

    let center = gtk::CenterBox::new();
    center.set_hexpand(true);
    center.set_vexpand(true);

    let content = gtk::Box::new(gtk::Orientation::Vertical, 18);
    content.set_halign(gtk::Align::Center);
    content.set_valign(gtk::Align::Center);
    content.set_margin_start(24);
    content.set_margin_end(24);

    center.set_center_widget(Some(&content));
    root.append(&center);
    (root, content)
}

fn page_button(label: &str) -> gtk::Button {
    let button = gtk::Button::with_label(label);
    button.add_css_class("pill");
    button.add_css_class("suggested-action");
    button.set_size_request(200, 44);
    button
}

fn build_intro_view(state: &Rc<RefCell<AppState>>) -> gtk::Box {
    let (root, content) = centered_page("intro-root");

    let envelope = gtk::Label::new(Some("💌"));
    envelope.add_css_class("intro-envelope");

    let title = gtk::Label::new(Some("You've got a Valentine"));
    title.add_css_class("title-1");

    let open_button = page_button("Open");
    open_button.set_halign(gtk::Align::Center);
    open_button.connect_clicked({
        let state = state.clone();
        move |_| {
            with_session(&state, |session| {
                session.begin();
            });
        }
    });

    content.append(&envelope);
    content.append(&title);
    content.append(&open_button);
    root
}

fn build_greeting_view(state: &Rc<RefCell<AppState>>) -> gtk::Box {
    let (root, content) = centered_page("greeting-root");

    let title = gtk::Label::new(Some("Happy Valentine's Day ❤️"));
    title.add_css_class("title-1");

    let message = gtk::Label::new(Some(
        "I made you a little game.\nFind the pairs before the hearts run out of time.",
    ));
    message.set_justify(gtk::Justification::Center);
    message.set_wrap(true);
    message.add_css_class("greeting-message");

    let story_button = page_button("Play Story");
    story_button.connect_clicked({
        let state = state.clone();
        move |_| with_session(&state, |session| session.start_story_run())
    });

    let arcade_button = page_button("Arcade Mode");
    arcade_button.remove_css_class("suggested-action");
    arcade_button.connect_clicked({
        let state = state.clone();
        move |_| with_session(&state, |session| session.start_arcade_run())
    });

    let buttons = gtk::Box::new(gtk::Orientation::Vertical, 12);
    buttons.set_halign(gtk::Align::Center);
    buttons.append(&story_button);
    buttons.append(&arcade_button);

    content.append(&title);
    content.append(&message);
    content.append(&buttons);
    root
}

fn build_round_overlay(state: &Rc<RefCell<AppState>>) -> gtk::Box {
    let overlay = gtk::Box::new(gtk::Orientation::Vertical, 16);
    overlay.set_halign(gtk::Align::Center);
    overlay.set_valign(gtk::Align::Center);
    overlay.add_css_class("round-message");
    overlay.add_css_class("card");
    overlay.set_visible(false);

    let message = gtk::Label::new(None);
    message.set_wrap(true);
    message.set_justify(gtk::Justification::Center);
    message.set_max_width_chars(32);
    message.add_css_class("title-3");

    let next_button = page_button("Next Level");
    next_button.connect_clicked({
        let state = state.clone();
        move |_| {
            with_session(&state, |session| {
                session.next_level();
            })
        }
    });

    let retry_button = page_button("Try Again");
    retry_button.connect_clicked({
        let state = state.clone();
        move |_| {
            with_session(&state, |session| {
                session.retry();
            })
        }
    });

    let arcade_button = page_button("Play Arcade");
    arcade_button.connect_clicked({
        let state = state.clone();
        move |_| with_session(&state, |session| session.start_arcade_run())
    });

    overlay.append(&message);
    overlay.append(&next_button);
    overlay.append(&retry_button);
    overlay.append(&arcade_button);

    {
        let mut st = state.borrow_mut();
        st.round_message = Some(message);
        st.next_button = Some(next_button);
        st.retry_button = Some(retry_button);
        st.arcade_button = Some(arcade_button);
        st.round_overlay = Some(overlay.clone());
    }
    overlay
}

fn build_game_view(state: &Rc<RefCell<AppState>>) -> gtk::Box {
    let root = gtk::Box::new(gtk::Orientation::Vertical, 0);
    root.set_hexpand(true);
    root.set_vexpand(true);
    root.add_css_class("game-root");

    let content = gtk::Box::new(gtk::Orientation::Vertical, 10);
    content.set_hexpand(true);
    content.set_vexpand(true);
    content.set_margin_top(CONTENT_MARGIN);
    content.set_margin_bottom(CONTENT_MARGIN);
    content.set_margin_start(CONTENT_MARGIN);
    content.set_margin_end(CONTENT_MARGIN);

    let hud = gtk::CenterBox::new();
    hud.add_css_class("game-hud");
    let level_label = gtk::Label::new(Some("Level 1"));
    level_label.add_css_class("heading");
    let status_label = gtk::Label::new(None);
    status_label.add_css_class("effect-status");
    let score_label = gtk::Label::new(Some("Score: 0"));
    score_label.add_css_class("heading");
    score_label.set_visible(false);
    hud.set_start_widget(Some(&level_label));
    hud.set_center_widget(Some(&status_label));
    hud.set_end_widget(Some(&score_label));

    let timer_bar = gtk::ProgressBar::new();
    timer_bar.add_css_class("timer-bar");
    timer_bar.set_fraction(1.0);

    let board_card = gtk::Box::new(gtk::Orientation::Vertical, 0);
    board_card.set_halign(gtk::Align::Fill);
    board_card.set_valign(gtk::Align::Fill);
    board_card.set_hexpand(true);
    board_card.set_vexpand(true);
    board_card.add_css_class("heart-card-container");

    board_card.connect_closure(
        "notify::width",
        false,
        glib::closure_local!(move |card: gtk::Box, _: glib::ParamSpec| {
            if card.width() < 500 {
                card.add_css_class("compact");
            } else {
                card.remove_css_class("compact");
            }
        }),
    );

    let board_overlay = gtk::Overlay::new();
    board_overlay.set_child(Some(&board_card));
    board_overlay.add_overlay(&build_round_overlay(state));

    content.append(&hud);
    content.append(&timer_bar);
    content.append(&board_overlay);
    root.append(&content);

    {
        let mut st = state.borrow_mut();
        st.level_label = Some(level_label);
        st.score_label = Some(score_label);
        st.status_label = Some(status_label);
        st.timer_bar = Some(timer_bar);
        st.board_container = Some(board_card);
    }

    root
}
