use serde::Serialize;

use super::cards::Symbol;
use super::specials::{all_special_symbols, is_special};
use crate::config::Settings;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Story,
    Arcade,
}

impl Mode {
    pub fn name(self) -> &'static str {
        match self {
            Mode::Story => "Story",
            Mode::Arcade => "Arcade",
        }
    }
}

pub const STORY_FINAL_LEVEL: u32 = 5;

const STORY_DECKS: [&[Symbol]; STORY_FINAL_LEVEL as usize] = [
    &[Symbol::L, Symbol::Y],
    &[Symbol::I, Symbol::L, Symbol::Y, Symbol::H],
    &[Symbol::I, Symbol::L, Symbol::Y, Symbol::H, Symbol::X, Symbol::M],
    &[
        Symbol::I,
        Symbol::L,
        Symbol::Y,
        Symbol::H,
        Symbol::X,
        Symbol::M,
        Symbol::T,
        Symbol::K,
    ],
    &[
        Symbol::I,
        Symbol::L,
        Symbol::Y,
        Symbol::H,
        Symbol::H,
        Symbol::X,
        Symbol::M,
        Symbol::T,
        Symbol::K,
        Symbol::C,
    ],
];

const ARCADE_LOW_END_LEVEL: u32 = 2;
const ARCADE_MID_END_LEVEL: u32 = 5;
pub const ARCADE_MAX_PAIRS: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoundConfig {
    pub mode: Mode,
    pub level: u32,
    pub pairs: usize,
    pub time_budget_secs: u32,
    pub allowed_specials: Vec<Symbol>,
    pub fixed_symbols: Option<Vec<Symbol>>,
}

impl RoundConfig {
    pub fn card_count(&self) -> usize {
        self.pairs * 2
    }
}

pub fn config_for(mode: Mode, level: u32, settings: &Settings) -> RoundConfig {
    match mode {
        Mode::Story => story_config(level, settings),
        Mode::Arcade => arcade_config(level, settings),
    }
}

fn story_config(level: u32, settings: &Settings) -> RoundConfig {
    let table_idx = level.clamp(1, STORY_FINAL_LEVEL) as usize - 1;
    let fixed = STORY_DECKS[table_idx].to_vec();
    let pairs = fixed.len();
    let mut allowed_specials: Vec<Symbol> =
        fixed.iter().copied().filter(|s| is_special(*s)).collect();
    allowed_specials.dedup();
    RoundConfig {
        mode: Mode::Story,
        level: level.max(1),
        pairs,
        time_budget_secs: pairs as u32 * settings.story_seconds_per_pair,
        allowed_specials,
        fixed_symbols: Some(fixed),
    }
}

pub fn arcade_pairs(level: u32) -> usize {
    let pairs = if level <= ARCADE_LOW_END_LEVEL {
        6
    } else if level <= ARCADE_MID_END_LEVEL {
        8
    } else {
        10
    };
    pairs.min(ARCADE_MAX_PAIRS)
}

/// Seconds granted per pair; shrinks with level down to the configured floor.
pub fn arcade_seconds_per_pair(level: u32, settings: &Settings) -> f64 {
    let tuning = &settings.arcade;
    (tuning.base_seconds_per_pair - tuning.decay_per_level * level as f64)
        .max(tuning.min_seconds_per_pair)
}

fn arcade_config(level: u32, settings: &Settings) -> RoundConfig {
    let level = level.max(1);
    let pairs = arcade_pairs(level);
    let budget = (pairs as f64 * arcade_seconds_per_pair(level, settings)).ceil();
    RoundConfig {
        mode: Mode::Arcade,
        level,
        pairs,
        time_budget_secs: (budget as u32).max(1),
        allowed_specials: all_special_symbols(),
        fixed_symbols: None,
    }
}

pub fn score_for_match(level: u32, settings: &Settings) -> u64 {
    settings.arcade.score_base + settings.arcade.score_per_level * level as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn story_level_one_is_the_two_pair_deck() {
        let cfg = config_for(Mode::Story, 1, &Settings::default());
        assert_eq!(cfg.pairs, 2);
        assert_eq!(cfg.time_budget_secs, 10);
        assert_eq!(cfg.fixed_symbols, Some(vec![Symbol::L, Symbol::Y]));
        assert!(cfg.allowed_specials.is_empty());
    }

    #[test]
    fn story_fixed_list_length_matches_pairs() {
        let settings = Settings::default();
        for level in 1..=STORY_FINAL_LEVEL {
            let cfg = config_for(Mode::Story, level, &settings);
            assert_eq!(cfg.fixed_symbols.as_ref().map(Vec::len), Some(cfg.pairs));
            assert_eq!(cfg.time_budget_secs, cfg.pairs as u32 * 5);
        }
    }

    #[test]
    fn story_specials_start_at_level_three() {
        let settings = Settings::default();
        assert!(config_for(Mode::Story, 2, &settings).allowed_specials.is_empty());
        assert_eq!(
            config_for(Mode::Story, 3, &settings).allowed_specials,
            vec![Symbol::X, Symbol::M]
        );
    }

    #[test]
    fn story_levels_past_the_table_reuse_the_last_entry() {
        let settings = Settings::default();
        let last = config_for(Mode::Story, STORY_FINAL_LEVEL, &settings);
        let beyond = config_for(Mode::Story, 42, &settings);
        assert_eq!(beyond.pairs, last.pairs);
        assert_eq!(beyond.fixed_symbols, last.fixed_symbols);
        assert_eq!(beyond.time_budget_secs, last.time_budget_secs);
    }

    #[test]
    fn arcade_pairs_step_up_by_tier() {
        let expected = [(1, 6), (2, 6), (3, 8), (5, 8), (6, 10), (100, 10)];
        for (level, pairs) in expected {
            assert_eq!(arcade_pairs(level), pairs, "level {level}");
        }
    }

    #[test]
    fn arcade_level_one_budget_follows_the_curve() {
        let cfg = config_for(Mode::Arcade, 1, &Settings::default());
        // 6 * (5.1 - 0.18) = 29.52, rounded up.
        assert_eq!(cfg.time_budget_secs, 30);
        assert_eq!(cfg.allowed_specials.len(), 5);
        assert!(cfg.fixed_symbols.is_none());
    }

    #[test]
    fn arcade_budget_never_drops_below_the_floor() {
        let settings = Settings::default();
        for level in 1..500 {
            let cfg = config_for(Mode::Arcade, level, &settings);
            let floor = (cfg.pairs as f64 * settings.arcade.min_seconds_per_pair) as u32;
            assert!(cfg.time_budget_secs >= floor, "level {level}");
            assert!(cfg.time_budget_secs > 0);
        }
    }

    #[test]
    fn config_is_deterministic() {
        let settings = Settings::default();
        assert_eq!(
            config_for(Mode::Arcade, 7, &settings),
            config_for(Mode::Arcade, 7, &settings)
        );
    }

    #[test]
    fn match_score_grows_with_level() {
        let settings = Settings::default();
        assert_eq!(score_for_match(1, &settings), 220);
        assert_eq!(score_for_match(10, &settings), 400);
    }
}
