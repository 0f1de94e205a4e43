//! Everything the core tells the outside world.
//!
//! The session appends events to an outbox; the front end drains it after
//! every operation and routes each event to the renderer, audio, analytics or
//! particle collaborator. None of them can feed an error back into the game.

use serde::Serialize;

use super::cards::{Face, Symbol};
use super::levels::Mode;
use super::session::Stage;
use super::specials::{EffectTag, Polarity};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Won,
    Lost,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cue {
    Flip,
    Select,
    Match,
    Level,
    Milestone,
    MusicStart,
    MusicDuck,
    MusicRestore,
}

impl Cue {
    /// Sound effect file stem, for cues backed by a sample.
    pub fn sample_name(self) -> Option<&'static str> {
        match self {
            Cue::Flip => Some("card_flip"),
            Cue::Select => Some("card_select"),
            Cue::Match => Some("card_match_pop"),
            Cue::Level => Some("level"),
            Cue::Milestone => Some("milestone"),
            Cue::MusicStart | Cue::MusicDuck | Cue::MusicRestore => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Burst {
    /// One large heart rising from the card at this index.
    AtCard(usize),
    /// Celebration at the centre of the screen.
    Center,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AnalyticsEvent {
    ClickStart,
    StoryStart,
    ArcadeStart,
    LevelStart {
        level: u32,
        mode: Mode,
    },
    MatchFound {
        level: u32,
        mode: Mode,
        card: Symbol,
    },
    SpecialCard {
        card_type: Polarity,
        level: u32,
    },
    LevelWin {
        level: u32,
        mode: Mode,
        #[serde(skip_serializing_if = "Option::is_none")]
        score: Option<u64>,
        time_remaining: u32,
    },
    LevelFail {
        level: u32,
        mode: Mode,
    },
    ArcadeScore {
        score: u64,
        level: u32,
    },
    Milestone {
        score: u64,
        level: u32,
    },
    GameComplete,
}

impl AnalyticsEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AnalyticsEvent::ClickStart => "click_start",
            AnalyticsEvent::StoryStart => "story_start",
            AnalyticsEvent::ArcadeStart => "arcade_start",
            AnalyticsEvent::LevelStart { .. } => "level_start",
            AnalyticsEvent::MatchFound { .. } => "match_found",
            AnalyticsEvent::SpecialCard { .. } => "special_card",
            AnalyticsEvent::LevelWin { .. } => "level_win",
            AnalyticsEvent::LevelFail { .. } => "level_fail",
            AnalyticsEvent::ArcadeScore { .. } => "arcade_score",
            AnalyticsEvent::Milestone { .. } => "milestone",
            AnalyticsEvent::GameComplete => "game_complete",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    StageChanged(Stage),
    RoundStarted {
        mode: Mode,
        level: u32,
        symbols: Vec<Symbol>,
        time_budget_secs: u32,
        score: u64,
    },
    CardFace {
        index: usize,
        face: Face,
    },
    TimerChanged {
        left: u32,
        total: u32,
        frozen: bool,
    },
    ScoreChanged(u64),
    EffectStarted(EffectTag),
    EffectEnded(EffectTag),
    Burst(Burst),
    Cue(Cue),
    MilestoneReached {
        score: u64,
        text: String,
        image: String,
    },
    MilestoneCleared,
    RoundOver {
        outcome: Outcome,
        mode: Mode,
        level: u32,
        score: u64,
        final_level: bool,
    },
    Analytics(AnalyticsEvent),
}
