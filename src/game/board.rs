//! Per-round card state machine: previews, selections, match resolution,
//! special effects and the countdown.

use std::collections::HashMap;

use super::agenda::{Agenda, RoundId, Task, TaskHandle, TaskKind};
use super::cards::{Card, Face, Symbol};
use super::effects::{ActiveEffects, Applied};
use super::events::{GameEvent, Outcome};
use super::levels::RoundConfig;
use super::specials::{Effect, EffectTag, Special, special_for};
use super::timer::{RoundTimer, TickOutcome};
use crate::config::Settings;

/// Borrowed session plumbing handed to a round for one operation.
pub struct Ctx<'a> {
    pub agenda: &'a mut Agenda,
    pub out: &'a mut Vec<GameEvent>,
    pub settings: &'a Settings,
}

impl Ctx<'_> {
    fn emit(&mut self, event: GameEvent) {
        self.out.push(event);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No card selected.
    Open,
    /// One card selected, waiting for its partner.
    OneUp(usize),
    /// Two mismatched cards stay face up until the reveal delay ends.
    Revealing([usize; 2]),
    Over(Outcome),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectOutcome {
    Rejected,
    Pending,
    Mismatched,
    /// `index` is the second card of the pair, where the burst spawns.
    Matched { symbol: Symbol, index: usize },
}

#[derive(Debug)]
pub struct Round {
    id: RoundId,
    config: RoundConfig,
    cards: Vec<Card>,
    phase: Phase,
    matched_pairs: usize,
    effects: ActiveEffects,
    timer: RoundTimer,
    held: bool,
    peek_tasks: HashMap<usize, TaskHandle>,
    reveal_task: Option<TaskHandle>,
}

impl Round {
    pub fn new(id: RoundId, config: RoundConfig, cards: Vec<Card>) -> Self {
        let timer = RoundTimer::new(config.time_budget_secs);
        Self {
            id,
            config,
            cards,
            phase: Phase::Open,
            matched_pairs: 0,
            effects: ActiveEffects::new(),
            timer,
            held: false,
            peek_tasks: HashMap::new(),
            reveal_task: None,
        }
    }

    pub fn id(&self) -> RoundId {
        self.id
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn face(&self, index: usize) -> Option<Face> {
        self.cards.get(index).map(|card| card.face)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Pair count of this round; always half the deck.
    pub fn pairs(&self) -> usize {
        self.cards.len() / 2
    }

    pub fn matched_pairs(&self) -> usize {
        self.matched_pairs
    }

    pub fn is_cleared(&self) -> bool {
        self.matched_pairs == self.pairs()
    }

    pub fn timer(&self) -> &RoundTimer {
        &self.timer
    }

    pub fn effects(&self) -> &ActiveEffects {
        &self.effects
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, Phase::Over(_))
    }

    pub fn is_locked(&self) -> bool {
        self.held || matches!(self.phase, Phase::Revealing(_) | Phase::Over(_))
    }

    pub fn selected(&self) -> Vec<usize> {
        match self.phase {
            Phase::OneUp(a) => vec![a],
            Phase::Revealing(pair) => pair.to_vec(),
            Phase::Open | Phase::Over(_) => Vec::new(),
        }
    }

    fn timer_frozen(&self) -> bool {
        self.held || self.effects.contains(EffectTag::TimerFrozen)
    }

    fn task(&self, kind: TaskKind) -> Task {
        Task {
            round: self.id,
            kind,
        }
    }

    fn set_face(&mut self, index: usize, face: Face, ctx: &mut Ctx) {
        if let Some(card) = self.cards.get_mut(index)
            && card.face != face
        {
            card.face = face;
            ctx.emit(GameEvent::CardFace { index, face });
        }
    }

    fn emit_timer(&self, ctx: &mut Ctx) {
        ctx.emit(GameEvent::TimerChanged {
            left: self.timer.left(),
            total: self.timer.total(),
            frozen: self.timer_frozen(),
        });
    }

    pub fn start(&mut self, ctx: &mut Ctx) {
        self.emit_timer(ctx);
        let tick = self.task(TaskKind::TimerTick);
        ctx.agenda.schedule(ctx.settings.timings.tick(), tick);
    }

    /// Hover/touch preview. Returns whether the card flipped.
    pub fn peek(&mut self, index: usize, ctx: &mut Ctx) -> bool {
        if self.is_locked()
            || self.effects.contains(EffectTag::PeekBlocked)
            || self.phase != Phase::Open
            || self.face(index) != Some(Face::Hidden)
        {
            return false;
        }

        self.set_face(index, Face::Peeked, ctx);
        ctx.emit(GameEvent::Cue(super::events::Cue::Flip));
        if let Some(previous) = self.peek_tasks.remove(&index) {
            ctx.agenda.cancel(previous);
        }
        let revert = self.task(TaskKind::PeekRevert(index));
        let handle = ctx.agenda.schedule(ctx.settings.timings.peek_revert(), revert);
        self.peek_tasks.insert(index, handle);
        true
    }

    pub fn select(&mut self, index: usize, ctx: &mut Ctx) -> SelectOutcome {
        if self.is_locked() {
            return SelectOutcome::Rejected;
        }
        match self.face(index) {
            None | Some(Face::Matched) | Some(Face::Selected) => return SelectOutcome::Rejected,
            Some(Face::Hidden) | Some(Face::Peeked) => {}
        }

        if let Some(previous) = self.peek_tasks.remove(&index) {
            ctx.agenda.cancel(previous);
        }
        self.set_face(index, Face::Selected, ctx);
        ctx.emit(GameEvent::Cue(super::events::Cue::Select));

        match self.phase {
            Phase::Open => {
                self.phase = Phase::OneUp(index);
                SelectOutcome::Pending
            }
            Phase::OneUp(first) => self.resolve(first, index, ctx),
            Phase::Revealing(_) | Phase::Over(_) => SelectOutcome::Rejected,
        }
    }

    fn resolve(&mut self, first: usize, second: usize, ctx: &mut Ctx) -> SelectOutcome {
        // Lock before comparing so nothing can slip in mid-resolution.
        self.phase = Phase::Revealing([first, second]);
        let symbol = self.cards[first].symbol;

        if symbol != self.cards[second].symbol {
            let reset = self.task(TaskKind::MismatchReset);
            ctx.agenda
                .schedule(ctx.settings.timings.mismatch_reveal(), reset);
            return SelectOutcome::Mismatched;
        }

        self.set_face(first, Face::Matched, ctx);
        self.set_face(second, Face::Matched, ctx);
        self.matched_pairs += 1;
        self.phase = Phase::Open;
        SelectOutcome::Matched {
            symbol,
            index: second,
        }
    }

    /// Runs the effect attached to `symbol`, if it is special.
    pub fn apply_special(&mut self, symbol: Symbol, ctx: &mut Ctx) -> Option<&'static Special> {
        let special = special_for(symbol)?;
        tracing::debug!(round = self.id.0, "special {} ({})", special.symbol, special.name);
        match special.effect {
            Effect::RevealAll(duration) => {
                for index in 0..self.cards.len() {
                    if self.cards[index].face == Face::Hidden {
                        self.set_face(index, Face::Peeked, ctx);
                    }
                }
                for (_, handle) in self.peek_tasks.drain() {
                    ctx.agenda.cancel(handle);
                }
                if let Some(previous) = self.reveal_task.take() {
                    ctx.agenda.cancel(previous);
                }
                let end = self.task(TaskKind::RevealEnd);
                self.reveal_task = Some(ctx.agenda.schedule(duration, end));
            }
            Effect::AddTime(secs) => {
                self.timer.add_seconds(secs);
                self.emit_timer(ctx);
            }
            Effect::FreezeTimer(duration) | Effect::BlockPeek(duration) => {
                if let Some(tag) = special.effect.tag() {
                    self.start_effect(tag, duration, ctx);
                }
            }
        }
        Some(special)
    }

    fn start_effect(&mut self, tag: EffectTag, duration: std::time::Duration, ctx: &mut Ctx) {
        let applied = self.effects.apply(tag, ctx.agenda.now(), duration);
        if applied == Applied::Started {
            ctx.emit(GameEvent::EffectStarted(tag));
            if tag == EffectTag::TimerFrozen {
                self.emit_timer(ctx);
            }
        }
        let expiry = self.task(TaskKind::EffectExpiry(tag));
        ctx.agenda.schedule(duration, expiry);
    }

    /// Handles one due task. Returns `Some(Outcome::Lost)` when time ran out.
    pub fn on_task(&mut self, kind: TaskKind, ctx: &mut Ctx) -> Option<Outcome> {
        if self.is_over() {
            return None;
        }
        match kind {
            TaskKind::PeekRevert(index) => {
                self.peek_tasks.remove(&index);
                if self.face(index) == Some(Face::Peeked) {
                    self.set_face(index, Face::Hidden, ctx);
                }
            }
            TaskKind::RevealEnd => {
                self.reveal_task = None;
                for index in 0..self.cards.len() {
                    if self.cards[index].face == Face::Peeked {
                        self.set_face(index, Face::Hidden, ctx);
                    }
                }
            }
            TaskKind::MismatchReset => {
                if let Phase::Revealing([a, b]) = self.phase {
                    self.set_face(a, Face::Hidden, ctx);
                    self.set_face(b, Face::Hidden, ctx);
                    self.phase = Phase::Open;
                }
            }
            TaskKind::EffectExpiry(tag) => {
                if self.effects.expire(tag, ctx.agenda.now()) {
                    ctx.emit(GameEvent::EffectEnded(tag));
                    if tag == EffectTag::TimerFrozen {
                        self.emit_timer(ctx);
                    }
                }
            }
            TaskKind::TimerTick => {
                let outcome = self.timer.tick(self.timer_frozen());
                match outcome {
                    TickOutcome::Idle => {}
                    TickOutcome::Expired => {
                        self.emit_timer(ctx);
                        return Some(Outcome::Lost);
                    }
                    TickOutcome::Counted | TickOutcome::Skipped => {
                        self.emit_timer(ctx);
                        let tick = self.task(TaskKind::TimerTick);
                        ctx.agenda.schedule(ctx.settings.timings.tick(), tick);
                    }
                }
            }
        }
        None
    }

    pub fn set_held(&mut self, held: bool, ctx: &mut Ctx) {
        if self.held != held && !self.is_over() {
            self.held = held;
            self.emit_timer(ctx);
        }
    }

    /// Ends the round for good: stops the clock, drops every pending task and
    /// winds down running effects.
    pub fn finish(&mut self, outcome: Outcome, ctx: &mut Ctx) {
        if self.is_over() {
            return;
        }
        self.phase = Phase::Over(outcome);
        self.timer.stop();
        self.held = false;
        ctx.agenda.cancel_round(self.id);
        self.peek_tasks.clear();
        self.reveal_task = None;
        let tags: Vec<EffectTag> = self.effects.tags().collect();
        self.effects.clear();
        for tag in tags {
            ctx.emit(GameEvent::EffectEnded(tag));
        }
    }

    /// Debug helper: matches every pair but one. Returns the remaining pair.
    pub fn match_all_but_one(&mut self, ctx: &mut Ctx) -> Option<[usize; 2]> {
        if self.is_over() {
            return None;
        }
        let mut keep = None;
        for (first, card) in self.cards.iter().enumerate() {
            if card.is_matched() {
                continue;
            }
            let partner = self
                .cards
                .iter()
                .enumerate()
                .skip(first + 1)
                .find(|(_, other)| !other.is_matched() && other.symbol == card.symbol)
                .map(|(idx, _)| idx);
            if let Some(second) = partner {
                keep = Some([first, second]);
                break;
            }
        }
        let keep = keep?;

        for (_, handle) in self.peek_tasks.drain() {
            ctx.agenda.cancel(handle);
        }
        self.phase = Phase::Open;
        for index in 0..self.cards.len() {
            let face = if keep.contains(&index) {
                Face::Hidden
            } else {
                Face::Matched
            };
            self.set_face(index, face, ctx);
        }
        self.matched_pairs = self.pairs() - 1;
        Some(keep)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::game::cards::CardId;
    use crate::game::levels::Mode;

    struct Harness {
        agenda: Agenda,
        out: Vec<GameEvent>,
        settings: Settings,
        round: Round,
    }

    impl Harness {
        /// Deck laid out in the given order, no shuffling.
        fn new(symbols: &[Symbol], budget: u32) -> Self {
            let cards = symbols
                .iter()
                .enumerate()
                .map(|(i, s)| Card::new(CardId(i as u32), *s))
                .collect::<Vec<_>>();
            let config = RoundConfig {
                mode: Mode::Story,
                level: 1,
                pairs: cards.len() / 2,
                time_budget_secs: budget,
                allowed_specials: Vec::new(),
                fixed_symbols: None,
            };
            let mut harness = Self {
                agenda: Agenda::new(),
                out: Vec::new(),
                settings: Settings::default(),
                round: Round::new(RoundId(1), config, cards),
            };
            harness.with(|round, ctx| round.start(ctx));
            harness
        }

        fn with<T>(&mut self, f: impl FnOnce(&mut Round, &mut Ctx) -> T) -> T {
            let mut ctx = Ctx {
                agenda: &mut self.agenda,
                out: &mut self.out,
                settings: &self.settings,
            };
            f(&mut self.round, &mut ctx)
        }

        fn select(&mut self, index: usize) -> SelectOutcome {
            self.with(|round, ctx| round.select(index, ctx))
        }

        fn peek(&mut self, index: usize) -> bool {
            self.with(|round, ctx| round.peek(index, ctx))
        }

        fn elapse(&mut self, ms: u64) -> Option<Outcome> {
            let deadline = self.agenda.now() + Duration::from_millis(ms);
            let mut result = None;
            while let Some((_, task)) = self.agenda.pop_due(deadline) {
                let kind = task.kind;
                if let Some(outcome) = self.with(|round, ctx| round.on_task(kind, ctx)) {
                    result = Some(outcome);
                }
            }
            self.agenda.settle(deadline);
            result
        }
    }

    const LYLY: [Symbol; 4] = [Symbol::L, Symbol::Y, Symbol::L, Symbol::Y];

    #[test]
    fn matching_pair_becomes_matched_and_unlocks() {
        let mut h = Harness::new(&LYLY, 10);
        assert_eq!(h.select(0), SelectOutcome::Pending);
        assert_eq!(
            h.select(2),
            SelectOutcome::Matched {
                symbol: Symbol::L,
                index: 2
            }
        );
        assert_eq!(h.round.face(0), Some(Face::Matched));
        assert_eq!(h.round.face(2), Some(Face::Matched));
        assert_eq!(h.round.matched_pairs(), 1);
        assert!(!h.round.is_locked());
    }

    #[test]
    fn mismatch_stays_locked_until_the_reveal_delay() {
        let mut h = Harness::new(&LYLY, 10);
        h.select(0);
        assert_eq!(h.select(1), SelectOutcome::Mismatched);
        assert!(h.round.is_locked());
        assert_eq!(h.round.face(0), Some(Face::Selected));

        h.elapse(499);
        assert!(h.round.is_locked());
        assert_eq!(h.round.face(1), Some(Face::Selected));

        h.elapse(1);
        assert!(!h.round.is_locked());
        assert_eq!(h.round.face(0), Some(Face::Hidden));
        assert_eq!(h.round.face(1), Some(Face::Hidden));
        assert_eq!(h.round.phase(), Phase::Open);
    }

    #[test]
    fn third_selection_during_resolution_is_rejected() {
        let mut h = Harness::new(&LYLY, 10);
        h.select(0);
        h.select(1);
        assert_eq!(h.select(2), SelectOutcome::Rejected);
        assert_eq!(h.round.face(2), Some(Face::Hidden));
        assert_eq!(h.round.selected(), vec![0, 1]);
        let selected = h
            .round
            .cards()
            .iter()
            .filter(|c| c.face == Face::Selected)
            .count();
        assert_eq!(selected, 2);
    }

    #[test]
    fn matched_and_selected_cards_cannot_be_selected_again() {
        let mut h = Harness::new(&LYLY, 10);
        h.select(0);
        assert_eq!(h.select(0), SelectOutcome::Rejected);
        h.select(2);
        assert_eq!(h.select(0), SelectOutcome::Rejected);
        assert_eq!(h.round.face(0), Some(Face::Matched));
    }

    #[test]
    fn peek_reverts_after_delay_unless_selected() {
        let mut h = Harness::new(&LYLY, 10);
        assert!(h.peek(1));
        assert_eq!(h.round.face(1), Some(Face::Peeked));
        h.elapse(1500);
        assert_eq!(h.round.face(1), Some(Face::Hidden));

        assert!(h.peek(3));
        h.select(3);
        h.elapse(2000);
        assert_eq!(h.round.face(3), Some(Face::Selected));
    }

    #[test]
    fn peek_is_ignored_while_a_selection_is_pending() {
        let mut h = Harness::new(&LYLY, 10);
        h.select(0);
        assert!(!h.peek(1));
        assert_eq!(h.round.face(1), Some(Face::Hidden));
    }

    #[test]
    fn swipe_block_stops_peeks_but_not_clicks() {
        let mut h = Harness::new(&[Symbol::M, Symbol::L, Symbol::M, Symbol::L], 10);
        h.select(0);
        h.select(2);
        h.with(|round, ctx| round.apply_special(Symbol::M, ctx));
        assert!(h.round.effects().contains(EffectTag::PeekBlocked));
        assert!(!h.peek(1));
        assert_eq!(h.select(1), SelectOutcome::Pending);

        h.elapse(4000);
        assert!(!h.round.effects().contains(EffectTag::PeekBlocked));
        assert!(h.out.contains(&GameEvent::EffectEnded(EffectTag::PeekBlocked)));
    }

    #[test]
    fn frozen_timer_skips_ticks_then_resumes() {
        let mut h = Harness::new(&[Symbol::T, Symbol::L, Symbol::T, Symbol::L], 10);
        h.select(0);
        h.select(2);
        h.with(|round, ctx| round.apply_special(Symbol::T, ctx));
        h.elapse(3000);
        assert_eq!(h.round.timer().left(), 10);
        // The expiry was queued before the 4000ms tick, so that tick counts.
        h.elapse(1000);
        assert!(!h.round.effects().contains(EffectTag::TimerFrozen));
        assert_eq!(h.round.timer().left(), 9);
        h.elapse(1000);
        assert_eq!(h.round.timer().left(), 8);
    }

    #[test]
    fn reveal_all_flips_hidden_cards_for_a_moment() {
        let symbols = [Symbol::X, Symbol::L, Symbol::X, Symbol::L, Symbol::Y, Symbol::Y];
        let mut h = Harness::new(&symbols, 30);
        h.select(0);
        h.select(2);
        h.with(|round, ctx| round.apply_special(Symbol::X, ctx));
        for index in [1, 3, 4, 5] {
            assert_eq!(h.round.face(index), Some(Face::Peeked));
        }
        assert_eq!(h.select(4), SelectOutcome::Pending);
        h.elapse(1000);
        assert_eq!(h.round.face(1), Some(Face::Hidden));
        assert_eq!(h.round.face(4), Some(Face::Selected));
        assert_eq!(h.round.face(0), Some(Face::Matched));
    }

    #[test]
    fn extra_time_adds_to_the_clock() {
        let mut h = Harness::new(&[Symbol::K, Symbol::K], 10);
        h.elapse(1000);
        h.with(|round, ctx| round.apply_special(Symbol::K, ctx));
        assert_eq!(h.round.timer().left(), 13);
    }

    #[test]
    fn timer_expiry_reports_loss_once() {
        let mut h = Harness::new(&LYLY, 2);
        assert_eq!(h.elapse(1000), None);
        assert_eq!(h.elapse(1000), Some(Outcome::Lost));
        h.with(|round, ctx| round.finish(Outcome::Lost, ctx));
        assert_eq!(h.elapse(5000), None);
        assert!(h.agenda.is_empty());
    }

    #[test]
    fn finishing_cancels_pending_work() {
        let mut h = Harness::new(&[Symbol::T, Symbol::L, Symbol::T, Symbol::L], 10);
        h.select(0);
        h.select(2);
        h.with(|round, ctx| round.apply_special(Symbol::T, ctx));
        h.peek(1);
        h.with(|round, ctx| round.finish(Outcome::Won, ctx));
        assert!(h.agenda.is_empty());
        assert!(h.round.is_locked());
        assert_eq!(h.round.face(1), Some(Face::Peeked));
    }

    #[test]
    fn held_round_freezes_clock_and_input() {
        let mut h = Harness::new(&LYLY, 10);
        h.with(|round, ctx| round.set_held(true, ctx));
        assert_eq!(h.select(0), SelectOutcome::Rejected);
        h.elapse(3000);
        assert_eq!(h.round.timer().left(), 10);
        h.with(|round, ctx| round.set_held(false, ctx));
        h.elapse(1000);
        assert_eq!(h.round.timer().left(), 9);
    }

    #[test]
    fn near_win_leaves_exactly_one_pair() {
        let mut h = Harness::new(&[Symbol::L, Symbol::Y, Symbol::I, Symbol::Y, Symbol::L, Symbol::I], 10);
        let keep = h.with(|round, ctx| round.match_all_but_one(ctx));
        assert_eq!(keep, Some([0, 4]));
        assert_eq!(h.round.matched_pairs(), 2);
        h.select(0);
        assert!(matches!(h.select(4), SelectOutcome::Matched { .. }));
        assert!(h.round.is_cleared());
    }
}
