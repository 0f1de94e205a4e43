//! Run-level controller: stages, level progression, arcade score and
//! milestones.
//!
//! A `Session` owns the active [`Round`], the task agenda and the event
//! outbox. Front ends call the operations below, feed wall-clock time in
//! through [`Session::advance`], and drain the outbox afterwards.

use std::collections::BTreeSet;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::agenda::{Agenda, RoundId, Task};
use super::board::{Ctx, Round, SelectOutcome};
use super::deck::build_deck;
use super::events::{AnalyticsEvent, Burst, Cue, GameEvent, Outcome};
use super::levels::{Mode, STORY_FINAL_LEVEL, config_for, score_for_match};
use crate::config::Settings;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Intro,
    Greeting,
    Playing,
    RoundEnd(Outcome),
    /// Story finished; arcade is on offer.
    Completed,
}

pub struct Session {
    settings: Settings,
    stage: Stage,
    mode: Mode,
    level: u32,
    score: u64,
    triggered: BTreeSet<u64>,
    pending_milestones: u32,
    round: Option<Round>,
    last_round: RoundId,
    agenda: Agenda,
    outbox: Vec<GameEvent>,
    rng: StdRng,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Self::with_rng(settings, StdRng::from_os_rng())
    }

    /// Deterministic deck order, for tests and replays.
    pub fn with_seed(settings: Settings, seed: u64) -> Self {
        Self::with_rng(settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(settings: Settings, rng: StdRng) -> Self {
        Self {
            settings,
            stage: Stage::Intro,
            mode: Mode::Story,
            level: 1,
            score: 0,
            triggered: BTreeSet::new(),
            pending_milestones: 0,
            round: None,
            last_round: RoundId::default(),
            agenda: Agenda::new(),
            outbox: Vec::new(),
            rng,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    pub fn pending_milestones(&self) -> u32 {
        self.pending_milestones
    }

    pub fn triggered_milestones(&self) -> impl Iterator<Item = u64> + '_ {
        self.triggered.iter().copied()
    }

    /// Virtual time since the session was created.
    pub fn now(&self) -> Duration {
        self.agenda.now()
    }

    /// Time until the next scheduled task, if any.
    pub fn next_due_in(&self) -> Option<Duration> {
        self.agenda.next_due_in()
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.outbox)
    }

    fn emit(&mut self, event: GameEvent) {
        self.outbox.push(event);
    }

    fn track(&mut self, event: AnalyticsEvent) {
        self.emit(GameEvent::Analytics(event));
    }

    fn set_stage(&mut self, stage: Stage) {
        if self.stage != stage {
            tracing::debug!("stage {:?} -> {:?}", self.stage, stage);
            self.stage = stage;
            self.emit(GameEvent::StageChanged(stage));
        }
    }

    fn with_round<T>(&mut self, f: impl FnOnce(&mut Round, &mut Ctx) -> T) -> Option<T> {
        let round = self.round.as_mut()?;
        let mut ctx = Ctx {
            agenda: &mut self.agenda,
            out: &mut self.outbox,
            settings: &self.settings,
        };
        Some(f(round, &mut ctx))
    }

    pub fn begin(&mut self) -> bool {
        if self.stage != Stage::Intro {
            return false;
        }
        self.track(AnalyticsEvent::ClickStart);
        self.emit(GameEvent::Cue(Cue::MusicStart));
        self.set_stage(Stage::Greeting);
        true
    }

    pub fn start_story_run(&mut self) {
        tracing::info!("Starting story run");
        self.mode = Mode::Story;
        self.score = 0;
        self.track(AnalyticsEvent::StoryStart);
        self.start_level(1);
    }

    pub fn start_arcade_run(&mut self) {
        tracing::info!("Starting arcade run");
        self.mode = Mode::Arcade;
        self.score = 0;
        self.triggered.clear();
        self.track(AnalyticsEvent::ArcadeStart);
        self.emit(GameEvent::ScoreChanged(0));
        self.start_level(1);
    }

    pub fn start_level(&mut self, level: u32) {
        let level = level.max(1);
        if let Some(previous) = self.round.take() {
            self.agenda.cancel_round(previous.id());
        }
        self.pending_milestones = 0;
        self.level = level;

        let config = config_for(self.mode, level, &self.settings);
        let cards = build_deck(
            config.pairs,
            &config.allowed_specials,
            config.fixed_symbols.as_deref(),
            &mut self.rng,
        );
        self.last_round = self.last_round.next();
        tracing::info!(
            round = self.last_round.0,
            "{} level {} with {} pairs, {}s",
            self.mode.name(),
            level,
            config.pairs,
            config.time_budget_secs
        );

        self.emit(GameEvent::RoundStarted {
            mode: self.mode,
            level,
            symbols: cards.iter().map(|card| card.symbol).collect(),
            time_budget_secs: config.time_budget_secs,
            score: self.score,
        });
        self.emit(GameEvent::Cue(Cue::MusicRestore));
        self.track(AnalyticsEvent::LevelStart {
            level,
            mode: self.mode,
        });

        self.round = Some(Round::new(self.last_round, config, cards));
        self.set_stage(Stage::Playing);
        self.with_round(|round, ctx| round.start(ctx));
    }

    /// Proceeds after a won round.
    pub fn next_level(&mut self) -> bool {
        if self.stage != Stage::RoundEnd(Outcome::Won) {
            return false;
        }
        self.start_level(self.level + 1);
        true
    }

    /// Replays a lost story level, or restarts arcade from scratch.
    pub fn retry(&mut self) -> bool {
        if self.stage != Stage::RoundEnd(Outcome::Lost) {
            return false;
        }
        match self.mode {
            Mode::Story => self.start_level(self.level),
            Mode::Arcade => self.start_arcade_run(),
        }
        true
    }

    pub fn peek(&mut self, index: usize) -> bool {
        if self.stage != Stage::Playing {
            return false;
        }
        self.with_round(|round, ctx| round.peek(index, ctx))
            .unwrap_or(false)
    }

    pub fn select(&mut self, index: usize) -> bool {
        if self.stage != Stage::Playing {
            return false;
        }
        let Some(outcome) = self.with_round(|round, ctx| round.select(index, ctx)) else {
            return false;
        };
        match outcome {
            SelectOutcome::Rejected => false,
            SelectOutcome::Pending | SelectOutcome::Mismatched => true,
            SelectOutcome::Matched { symbol, index } => {
                self.emit(GameEvent::Cue(Cue::Match));
                self.emit(GameEvent::Burst(Burst::AtCard(index)));
                self.track(AnalyticsEvent::MatchFound {
                    level: self.level,
                    mode: self.mode,
                    card: symbol,
                });

                if self.mode == Mode::Arcade {
                    let previous = self.score;
                    self.score += score_for_match(self.level, &self.settings);
                    self.emit(GameEvent::ScoreChanged(self.score));
                    self.check_milestones(previous, self.score);
                }

                let special = self
                    .with_round(|round, ctx| round.apply_special(symbol, ctx))
                    .flatten();
                if let Some(special) = special {
                    self.track(AnalyticsEvent::SpecialCard {
                        card_type: special.polarity,
                        level: self.level,
                    });
                }

                if self.round.as_ref().is_some_and(Round::is_cleared) {
                    self.round_won();
                }
                true
            }
        }
    }

    fn check_milestones(&mut self, previous: u64, current: u64) {
        let mut crossed: Vec<_> = self
            .settings
            .milestones
            .iter()
            .filter(|m| previous < m.score && m.score <= current)
            .filter(|m| !self.triggered.contains(&m.score))
            .cloned()
            .collect();
        crossed.sort_by_key(|m| m.score);

        for milestone in crossed {
            self.triggered.insert(milestone.score);
            self.pending_milestones += 1;
            tracing::info!("Milestone {} reached", milestone.score);
            self.track(AnalyticsEvent::Milestone {
                score: milestone.score,
                level: self.level,
            });
            self.emit(GameEvent::Cue(Cue::Milestone));
            self.emit(GameEvent::Cue(Cue::MusicDuck));
            self.emit(GameEvent::MilestoneReached {
                score: milestone.score,
                text: milestone.text,
                image: milestone.image,
            });
        }
        if self.pending_milestones > 0 {
            self.with_round(|round, ctx| round.set_held(true, ctx));
        }
    }

    /// Dismisses one milestone popup; the round resumes once none remain.
    pub fn acknowledge_milestone(&mut self) -> bool {
        if self.pending_milestones == 0 {
            return false;
        }
        self.pending_milestones -= 1;
        self.emit(GameEvent::MilestoneCleared);
        if self.pending_milestones == 0 {
            self.emit(GameEvent::Cue(Cue::MusicRestore));
            self.with_round(|round, ctx| round.set_held(false, ctx));
        }
        true
    }

    fn round_won(&mut self) {
        let time_remaining = self
            .with_round(|round, ctx| {
                round.finish(Outcome::Won, ctx);
                round.timer().left()
            })
            .unwrap_or(0);
        let final_level = self.mode == Mode::Story && self.level >= STORY_FINAL_LEVEL;
        tracing::info!("{} level {} won", self.mode.name(), self.level);

        self.emit(GameEvent::Burst(Burst::Center));
        self.emit(GameEvent::Cue(Cue::Level));
        self.emit(GameEvent::Cue(Cue::MusicDuck));
        if final_level {
            self.track(AnalyticsEvent::GameComplete);
        } else {
            self.track(AnalyticsEvent::LevelWin {
                level: self.level,
                mode: self.mode,
                score: (self.mode == Mode::Arcade).then_some(self.score),
                time_remaining,
            });
        }
        self.emit(GameEvent::RoundOver {
            outcome: Outcome::Won,
            mode: self.mode,
            level: self.level,
            score: self.score,
            final_level,
        });
        self.set_stage(if final_level {
            Stage::Completed
        } else {
            Stage::RoundEnd(Outcome::Won)
        });
    }

    fn round_lost(&mut self) {
        self.with_round(|round, ctx| round.finish(Outcome::Lost, ctx));
        tracing::info!("{} level {} lost", self.mode.name(), self.level);

        self.emit(GameEvent::Cue(Cue::Level));
        self.emit(GameEvent::Cue(Cue::MusicDuck));
        self.track(AnalyticsEvent::LevelFail {
            level: self.level,
            mode: self.mode,
        });
        if self.mode == Mode::Arcade {
            self.track(AnalyticsEvent::ArcadeScore {
                score: self.score,
                level: self.level,
            });
        }
        self.emit(GameEvent::RoundOver {
            outcome: Outcome::Lost,
            mode: self.mode,
            level: self.level,
            score: self.score,
            final_level: false,
        });
        self.set_stage(Stage::RoundEnd(Outcome::Lost));
    }

    /// Moves the clock forward by `elapsed`, firing every task that falls due.
    pub fn advance(&mut self, elapsed: Duration) {
        let deadline = self.agenda.now() + elapsed;
        while let Some((_, task)) = self.agenda.pop_due(deadline) {
            self.fire(task);
        }
        self.agenda.settle(deadline);
    }

    fn fire(&mut self, task: Task) {
        let current = self.round.as_ref().map(Round::id);
        if current != Some(task.round) {
            tracing::trace!("dropping stale task {:?}", task);
            return;
        }
        let lost = self
            .with_round(|round, ctx| round.on_task(task.kind, ctx))
            .flatten();
        if lost == Some(Outcome::Lost) {
            self.round_lost();
        }
    }

    /// Debug shortcut: leaves a single unmatched pair on the board.
    pub fn debug_near_win(&mut self) -> bool {
        if self.stage != Stage::Playing {
            return false;
        }
        let kept = self
            .with_round(|round, ctx| round.match_all_but_one(ctx))
            .flatten();
        if let Some(pair) = kept {
            tracing::debug!("near win, remaining pair {:?}", pair);
        }
        kept.is_some()
    }
}
