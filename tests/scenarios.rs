// End-to-end runs through the public session API. Everything here is headless
// and seeded, so it runs under a plain `cargo test`.

use std::io::Write;
use std::time::Duration;

use heartmatch::config::{MilestoneSpec, Settings};
use heartmatch::game::specials::EffectTag;
use heartmatch::game::{AnalyticsEvent, Face, GameEvent, Mode, Outcome, Session, Stage, Symbol};

fn indices_of(session: &Session, symbol: Symbol) -> Vec<usize> {
    session
        .round()
        .expect("round in play")
        .cards()
        .iter()
        .enumerate()
        .filter(|(_, card)| card.symbol == symbol && !card.is_matched())
        .map(|(idx, _)| idx)
        .collect()
}

fn match_symbol(session: &mut Session, symbol: Symbol) {
    let idx = indices_of(session, symbol);
    assert!(session.select(idx[0]), "select first {symbol}");
    assert!(session.select(idx[1]), "select second {symbol}");
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[test]
fn story_first_level_from_intro_to_win() {
    let mut s = Session::with_seed(Settings::default(), 1);
    assert_eq!(s.stage(), Stage::Intro);
    assert!(s.begin());
    s.start_story_run();
    assert_eq!(s.stage(), Stage::Playing);

    s.advance(ms(2000));
    match_symbol(&mut s, Symbol::L);
    match_symbol(&mut s, Symbol::Y);

    assert_eq!(s.stage(), Stage::RoundEnd(Outcome::Won));
    let events = s.drain_events();
    assert!(events.contains(&GameEvent::Analytics(AnalyticsEvent::StoryStart)));
    assert!(events.contains(&GameEvent::Analytics(AnalyticsEvent::LevelWin {
        level: 1,
        mode: Mode::Story,
        score: None,
        time_remaining: 8,
    })));
    let overs: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, GameEvent::RoundOver { .. }))
        .collect();
    assert_eq!(overs.len(), 1);
}

#[test]
fn mismatched_pair_locks_the_board_briefly() {
    let mut s = Session::with_seed(Settings::default(), 2);
    s.start_story_run();
    s.start_level(2);
    let l = indices_of(&s, Symbol::L);
    let y = indices_of(&s, Symbol::Y);

    assert!(s.select(l[0]));
    assert!(s.select(y[0]));
    assert!(!s.select(l[1]), "third pick while two are open");
    assert!(!s.peek(y[1]));

    s.advance(ms(500));
    let round = s.round().expect("round");
    assert_eq!(round.face(l[0]), Some(Face::Hidden));
    assert_eq!(round.face(y[0]), Some(Face::Hidden));
    assert!(s.select(l[1]));
}

#[test]
fn time_freeze_holds_the_clock() {
    let mut s = Session::with_seed(Settings::default(), 3);
    s.start_story_run();
    s.start_level(4);
    assert_eq!(s.round().map(|r| r.timer().left()), Some(40));

    match_symbol(&mut s, Symbol::T);
    assert!(s.round().is_some_and(|r| r.effects().contains(EffectTag::TimerFrozen)));
    s.advance(ms(3999));
    assert_eq!(s.round().map(|r| r.timer().left()), Some(40));
    s.advance(ms(2001));
    assert_eq!(s.round().map(|r| r.timer().left()), Some(37));

    let events = s.drain_events();
    assert!(events.contains(&GameEvent::EffectStarted(EffectTag::TimerFrozen)));
    assert!(events.contains(&GameEvent::EffectEnded(EffectTag::TimerFrozen)));
}

#[test]
fn swipe_block_only_blocks_previews() {
    let mut s = Session::with_seed(Settings::default(), 4);
    s.start_story_run();
    s.start_level(3);
    match_symbol(&mut s, Symbol::M);
    let i = indices_of(&s, Symbol::I);
    assert!(!s.peek(i[0]));
    assert!(s.select(i[0]));
    assert!(s.select(i[1]));
    s.advance(ms(4000));
    let l = indices_of(&s, Symbol::L);
    assert!(s.peek(l[0]));
}

#[test]
fn running_out_of_time_loses_exactly_once() {
    let mut s = Session::with_seed(Settings::default(), 5);
    s.start_story_run();
    s.advance(Duration::from_secs(30));
    assert_eq!(s.stage(), Stage::RoundEnd(Outcome::Lost));
    let fails = s
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, GameEvent::Analytics(AnalyticsEvent::LevelFail { .. })))
        .count();
    assert_eq!(fails, 1);
    assert!(!s.select(0));
}

#[test]
fn one_match_can_cross_several_milestones() {
    let mut settings = Settings::default();
    settings.milestones = vec![
        MilestoneSpec {
            score: 100,
            text: "first".into(),
            image: "100.png".into(),
        },
        MilestoneSpec {
            score: 200,
            text: "second".into(),
            image: "200.png".into(),
        },
    ];
    let mut s = Session::with_seed(settings, 6);
    s.start_arcade_run();
    let symbol = s.round().expect("round").cards()[0].symbol;
    match_symbol(&mut s, symbol);
    assert_eq!(s.score(), 220);

    let reached: Vec<u64> = s
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            GameEvent::MilestoneReached { score, .. } => Some(score),
            _ => None,
        })
        .collect();
    assert_eq!(reached, vec![100, 200]);
    assert_eq!(s.pending_milestones(), 2);

    s.acknowledge_milestone();
    assert!(s.round().is_some_and(|r| r.is_held()));
    s.acknowledge_milestone();
    assert!(s.round().is_some_and(|r| !r.is_held()));
}

#[test]
fn arcade_run_keeps_score_across_levels() {
    let mut s = Session::with_seed(Settings::default(), 8);
    s.start_arcade_run();
    assert!(s.debug_near_win());
    let remaining: Vec<Symbol> = s
        .round()
        .expect("round")
        .cards()
        .iter()
        .filter(|c| !c.is_matched())
        .map(|c| c.symbol)
        .collect();
    match_symbol(&mut s, remaining[0]);
    assert_eq!(s.stage(), Stage::RoundEnd(Outcome::Won));
    assert!(s.next_level());
    assert_eq!(s.level(), 2);
    assert_eq!(s.score(), 220);
    assert_eq!(s.round().map(|r| r.pairs()), Some(6));
}

#[test]
fn settings_file_drives_the_session() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"{{ "timings": {{ "mismatch_reveal_ms": 900 }}, "story_seconds_per_pair": 7 }}"#
    )
    .expect("write settings");
    let settings = Settings::load_from(file.path()).expect("load settings");

    let mut s = Session::with_seed(settings, 9);
    s.start_story_run();
    assert_eq!(s.round().map(|r| r.timer().total()), Some(14));

    let l = indices_of(&s, Symbol::L);
    let y = indices_of(&s, Symbol::Y);
    s.select(l[0]);
    s.select(y[0]);
    s.advance(ms(500));
    assert_eq!(s.round().and_then(|r| r.face(l[0])), Some(Face::Selected));
    s.advance(ms(400));
    assert_eq!(s.round().and_then(|r| r.face(l[0])), Some(Face::Hidden));
}
