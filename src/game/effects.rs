use std::collections::BTreeMap;
use std::time::Duration;

use super::specials::EffectTag;

/// Effect tags currently in force, each with the instant it lapses.
///
/// Re-applying an active tag pushes its expiry out to the later of the two
/// deadlines. Expiry tasks that fire before the current deadline are ignored,
/// so an early expiry can never cut a refreshed effect short.
#[derive(Clone, Debug, Default)]
pub struct ActiveEffects {
    expiries: BTreeMap<EffectTag, Duration>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    Started,
    Extended,
    Unchanged,
}

impl ActiveEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, tag: EffectTag) -> bool {
        self.expiries.contains_key(&tag)
    }

    pub fn expires_at(&self, tag: EffectTag) -> Option<Duration> {
        self.expiries.get(&tag).copied()
    }

    pub fn apply(&mut self, tag: EffectTag, now: Duration, duration: Duration) -> Applied {
        let until = now + duration;
        match self.expiries.get_mut(&tag) {
            None => {
                self.expiries.insert(tag, until);
                Applied::Started
            }
            Some(current) if until > *current => {
                *current = until;
                Applied::Extended
            }
            Some(_) => Applied::Unchanged,
        }
    }

    /// Drops `tag` if its deadline has passed. Returns whether it was removed.
    pub fn expire(&mut self, tag: EffectTag, now: Duration) -> bool {
        match self.expiries.get(&tag) {
            Some(until) if *until <= now => {
                self.expiries.remove(&tag);
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.expiries.clear();
    }

    pub fn tags(&self) -> impl Iterator<Item = EffectTag> + '_ {
        self.expiries.keys().copied()
    }
}
