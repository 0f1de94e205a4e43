use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use super::cards::{ALPHABET, Card, CardId, FILLER, Symbol};
use super::specials::is_special;

/// Symbols a randomized deck may draw its regular pairs from.
pub fn regular_pool() -> Vec<Symbol> {
    ALPHABET.iter().copied().filter(|s| !is_special(*s)).collect()
}

/// Picks the symbols for a round, one entry per pair, before duplication.
pub fn choose_symbols<R: Rng + ?Sized>(
    pairs: usize,
    allowed_specials: &[Symbol],
    fixed: Option<&[Symbol]>,
    rng: &mut R,
) -> Vec<Symbol> {
    if let Some(fixed) = fixed
        && !fixed.is_empty()
    {
        return fixed.to_vec();
    }

    let mut symbols = Vec::with_capacity(pairs);
    if pairs > 2
        && let Some(special) = allowed_specials.choose(rng)
    {
        symbols.push(*special);
    }

    let needed = pairs - symbols.len();
    let mut pool = regular_pool();
    pool.shuffle(rng);
    symbols.extend(pool.into_iter().take(needed));
    while symbols.len() < pairs {
        symbols.push(FILLER);
    }
    symbols
}

/// Builds a shuffled deck with two cards per chosen symbol.
///
/// A non-empty `fixed` list wins over `pairs`: each listed symbol becomes one
/// pair, so the deck holds `2 * fixed.len()` cards.
pub fn build_deck<R: Rng + ?Sized>(
    pairs: usize,
    allowed_specials: &[Symbol],
    fixed: Option<&[Symbol]>,
    rng: &mut R,
) -> Vec<Card> {
    let symbols = choose_symbols(pairs, allowed_specials, fixed, rng);
    let mut deck = Vec::with_capacity(symbols.len() * 2);
    for (pair_idx, symbol) in symbols.into_iter().enumerate() {
        let base = (pair_idx * 2) as u32;
        deck.push(Card::new(CardId(base), symbol));
        deck.push(Card::new(CardId(base + 1), symbol));
    }
    deck.shuffle(rng);
    deck
}
