/// Countdown for one round, in whole seconds.
///
/// The owner schedules the ticks; this type only decides what a tick does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundTimer {
    left: u32,
    total: u32,
    running: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Timer already stopped; nothing happened.
    Idle,
    /// Frozen this tick; the second is lost rather than banked.
    Skipped,
    Counted,
    Expired,
}

impl RoundTimer {
    pub fn new(total: u32) -> Self {
        Self {
            left: total,
            total,
            running: total > 0,
        }
    }

    pub fn left(&self) -> u32 {
        self.left
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn fraction_left(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.left as f64 / self.total as f64).clamp(0.0, 1.0)
    }

    pub fn tick(&mut self, frozen: bool) -> TickOutcome {
        if !self.running {
            return TickOutcome::Idle;
        }
        if frozen {
            return TickOutcome::Skipped;
        }
        self.left = self.left.saturating_sub(1);
        if self.left == 0 {
            self.running = false;
            TickOutcome::Expired
        } else {
            TickOutcome::Counted
        }
    }

    pub fn add_seconds(&mut self, secs: u32) {
        if self.running {
            self.left = self.left.saturating_add(secs);
        }
    }

    pub fn stop(&mut self) {
        self.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_and_expires_once() {
        let mut timer = RoundTimer::new(2);
        assert_eq!(timer.tick(false), TickOutcome::Counted);
        assert_eq!(timer.tick(false), TickOutcome::Expired);
        assert_eq!(timer.left(), 0);
        assert_eq!(timer.tick(false), TickOutcome::Idle);
        assert!(!timer.is_running());
    }

    #[test]
    fn frozen_ticks_are_not_banked() {
        let mut timer = RoundTimer::new(5);
        assert_eq!(timer.tick(true), TickOutcome::Skipped);
        assert_eq!(timer.tick(true), TickOutcome::Skipped);
        assert_eq!(timer.left(), 5);
        assert_eq!(timer.tick(false), TickOutcome::Counted);
        assert_eq!(timer.left(), 4);
    }

    #[test]
    fn stopped_timer_never_expires() {
        let mut timer = RoundTimer::new(1);
        timer.stop();
        assert_eq!(timer.tick(false), TickOutcome::Idle);
        assert_eq!(timer.left(), 1);
    }

    #[test]
    fn extra_time_can_exceed_the_budget() {
        let mut timer = RoundTimer::new(10);
        timer.tick(false);
        timer.add_seconds(4);
        assert_eq!(timer.left(), 13);
        assert_eq!(timer.fraction_left(), 1.0);
    }
}
