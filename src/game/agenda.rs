//! Deferred work on a virtual clock.
//!
//! Every wait in the game (peek revert, mismatch reveal, effect expiry, timer
//! tick) is a task stamped with the round that scheduled it. Tearing a round
//! down cancels its tasks in one call, and the owner still checks the round id
//! when a task fires.

use std::collections::BTreeMap;
use std::time::Duration;

use super::specials::EffectTag;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RoundId(pub u64);

impl RoundId {
    pub fn next(self) -> Self {
        RoundId(self.0.wrapping_add(1))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    PeekRevert(usize),
    MismatchReset,
    RevealEnd,
    EffectExpiry(EffectTag),
    TimerTick,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Task {
    pub round: RoundId,
    pub kind: TaskKind,
}

#[derive(Debug, Default)]
pub struct Agenda {
    now: Duration,
    next_handle: u64,
    // Keyed by (due, handle) so ties fire in scheduling order.
    pending: BTreeMap<(Duration, TaskHandle), Task>,
}

impl Agenda {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, after: Duration, task: Task) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        self.pending.insert((self.now + after, handle), task);
        handle
    }

    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let key = self.pending.keys().find(|(_, h)| *h == handle).copied();
        match key {
            Some(key) => self.pending.remove(&key).is_some(),
            None => false,
        }
    }

    pub fn cancel_round(&mut self, round: RoundId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, task| task.round != round);
        before - self.pending.len()
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.pending.keys().any(|(_, h)| *h == handle)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Time until the earliest pending task, if any.
    pub fn next_due_in(&self) -> Option<Duration> {
        self.pending
            .keys()
            .next()
            .map(|(due, _)| due.saturating_sub(self.now))
    }

    /// Pops the earliest task due at or before `deadline`, moving the clock to
    /// its due time. Returns `None` once nothing else is due; the caller then
    /// settles the clock with [`Agenda::settle`].
    pub fn pop_due(&mut self, deadline: Duration) -> Option<(TaskHandle, Task)> {
        let (&(due, handle), _) = self.pending.iter().next()?;
        if due > deadline {
            return None;
        }
        let task = self.pending.remove(&(due, handle))?;
        self.now = self.now.max(due);
        Some((handle, task))
    }

    pub fn settle(&mut self, deadline: Duration) {
        self.now = self.now.max(deadline);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(round: u64, kind: TaskKind) -> Task {
        Task {
            round: RoundId(round),
            kind,
        }
    }

    fn drain(agenda: &mut Agenda, elapsed: Duration) -> Vec<Task> {
        let deadline = agenda.now() + elapsed;
        let mut fired = Vec::new();
        while let Some((_, t)) = agenda.pop_due(deadline) {
            fired.push(t);
        }
        agenda.settle(deadline);
        fired
    }

    #[test]
    fn tasks_fire_in_due_order_then_insertion_order() {
        let mut agenda = Agenda::new();
        agenda.schedule(Duration::from_millis(500), task(1, TaskKind::MismatchReset));
        agenda.schedule(Duration::from_millis(100), task(1, TaskKind::PeekRevert(3)));
        agenda.schedule(Duration::from_millis(100), task(1, TaskKind::PeekRevert(4)));

        let fired = drain(&mut agenda, Duration::from_millis(1000));
        let kinds: Vec<TaskKind> = fired.into_iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TaskKind::PeekRevert(3),
                TaskKind::PeekRevert(4),
                TaskKind::MismatchReset
            ]
        );
        assert_eq!(agenda.now(), Duration::from_millis(1000));
    }

    #[test]
    fn tasks_not_yet_due_stay_pending() {
        let mut agenda = Agenda::new();
        let handle = agenda.schedule(Duration::from_millis(1500), task(1, TaskKind::TimerTick));
        assert!(drain(&mut agenda, Duration::from_millis(1499)).is_empty());
        assert!(agenda.is_pending(handle));
        assert_eq!(agenda.next_due_in(), Some(Duration::from_millis(1)));
        assert_eq!(drain(&mut agenda, Duration::from_millis(1)).len(), 1);
    }

    #[test]
    fn cancel_removes_a_single_task() {
        let mut agenda = Agenda::new();
        let a = agenda.schedule(Duration::from_millis(10), task(1, TaskKind::RevealEnd));
        let b = agenda.schedule(Duration::from_millis(10), task(1, TaskKind::TimerTick));
        assert!(agenda.cancel(a));
        assert!(!agenda.cancel(a));
        assert!(agenda.is_pending(b));
        assert_eq!(agenda.len(), 1);
    }

    #[test]
    fn cancel_round_only_touches_that_round() {
        let mut agenda = Agenda::new();
        agenda.schedule(Duration::from_millis(10), task(1, TaskKind::TimerTick));
        agenda.schedule(Duration::from_millis(20), task(1, TaskKind::MismatchReset));
        agenda.schedule(Duration::from_millis(30), task(2, TaskKind::TimerTick));
        assert_eq!(agenda.cancel_round(RoundId(1)), 2);
        let fired = drain(&mut agenda, Duration::from_secs(1));
        assert_eq!(fired, vec![task(2, TaskKind::TimerTick)]);
    }

    #[test]
    fn tasks_scheduled_while_draining_use_the_task_due_time() {
        let mut agenda = Agenda::new();
        agenda.schedule(Duration::from_millis(1000), task(1, TaskKind::TimerTick));
        let deadline = Duration::from_millis(2500);
        let mut ticks = 0;
        while let Some((_, t)) = agenda.pop_due(deadline) {
            ticks += 1;
            agenda.schedule(Duration::from_millis(1000), t);
        }
        agenda.settle(deadline);
        assert_eq!(ticks, 2);
        assert_eq!(agenda.next_due_in(), Some(Duration::from_millis(500)));
    }
}
