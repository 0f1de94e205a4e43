//! Special cards: symbols whose match changes the round beyond scoring.
//!
//! The table is plain data. `board::Round` interprets each [`Effect`] when the
//! pair is matched.

use std::time::Duration;

use serde::Serialize;

use super::cards::Symbol;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectClass {
    Instant,
    Timed,
    Passive,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Buff,
    Malus,
}

/// Named modifiers that stay in force for a while.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectTag {
    TimerFrozen,
    PeekBlocked,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Flip every hidden card face up for a moment.
    RevealAll(Duration),
    /// Add seconds to the countdown.
    AddTime(u32),
    /// Skip timer ticks while active.
    FreezeTimer(Duration),
    /// Ignore hover/touch previews while active.
    BlockPeek(Duration),
}

impl Effect {
    /// Tag held in `ActiveEffects` while this effect runs, if any.
    pub fn tag(self) -> Option<EffectTag> {
        match self {
            Effect::FreezeTimer(_) => Some(EffectTag::TimerFrozen),
            Effect::BlockPeek(_) => Some(EffectTag::PeekBlocked),
            Effect::RevealAll(_) | Effect::AddTime(_) => None,
        }
    }

    pub fn duration(self) -> Option<Duration> {
        match self {
            Effect::RevealAll(d) | Effect::FreezeTimer(d) | Effect::BlockPeek(d) => Some(d),
            Effect::AddTime(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Special {
    pub symbol: Symbol,
    pub name: &'static str,
    pub polarity: Polarity,
    pub class: EffectClass,
    pub effect: Effect,
    pub description: &'static str,
}

pub const SPECIALS: [Special; 5] = [
    Special {
        symbol: Symbol::X,
        name: "The Revealer",
        polarity: Polarity::Buff,
        class: EffectClass::Instant,
        effect: Effect::RevealAll(Duration::from_millis(1000)),
        description: "Reveals every card!",
    },
    Special {
        symbol: Symbol::T,
        name: "Time Freeze",
        polarity: Polarity::Buff,
        class: EffectClass::Timed,
        effect: Effect::FreezeTimer(Duration::from_millis(4000)),
        description: "Freezes time for 4s!",
    },
    Special {
        symbol: Symbol::C,
        name: "Time Freeze",
        polarity: Polarity::Buff,
        class: EffectClass::Timed,
        effect: Effect::FreezeTimer(Duration::from_millis(2000)),
        description: "Freezes time for 2s!",
    },
    Special {
        symbol: Symbol::M,
        name: "Swipe Block",
        polarity: Polarity::Malus,
        class: EffectClass::Passive,
        effect: Effect::BlockPeek(Duration::from_millis(4000)),
        description: "Blocks swipe previews (malus)!",
    },
    Special {
        symbol: Symbol::K,
        name: "Extra Time",
        polarity: Polarity::Buff,
        class: EffectClass::Instant,
        effect: Effect::AddTime(4),
        description: "Extra time (+4s)!",
    },
];

pub fn special_for(symbol: Symbol) -> Option<&'static Special> {
    SPECIALS.iter().find(|special| special.symbol == symbol)
}

pub fn is_special(symbol: Symbol) -> bool {
    special_for(symbol).is_some()
}

/// Arcade offers every special from level 1, in table order.
pub fn all_special_symbols() -> Vec<Symbol> {
    SPECIALS.iter().map(|special| special.symbol).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::cards::ALPHABET;

    #[test]
    fn every_special_is_part_of_the_alphabet() {
        for special in &SPECIALS {
            assert!(ALPHABET.contains(&special.symbol));
        }
    }

    #[test]
    fn duration_effects_carry_a_tag() {
        for special in &SPECIALS {
            match special.class {
                EffectClass::Instant => assert!(special.effect.tag().is_none()),
                EffectClass::Timed | EffectClass::Passive => {
                    assert!(special.effect.tag().is_some());
                    assert!(special.effect.duration().is_some());
                }
            }
        }
    }

    #[test]
    fn regular_symbols_are_not_special() {
        for symbol in [Symbol::F, Symbol::H, Symbol::I, Symbol::L, Symbol::Y] {
            assert!(!is_special(symbol), "{symbol} should be regular");
        }
    }
}
