use std::fmt;

use serde::{Deserialize, Serialize};

/// Card face symbol. Every symbol maps to an asset named `<symbol>.png`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(pub char);

impl Symbol {
    pub const C: Symbol = Symbol('C');
    pub const F: Symbol = Symbol('F');
    pub const H: Symbol = Symbol('H');
    pub const I: Symbol = Symbol('I');
    pub const K: Symbol = Symbol('K');
    pub const L: Symbol = Symbol('L');
    pub const M: Symbol = Symbol('M');
    pub const T: Symbol = Symbol('T');
    pub const X: Symbol = Symbol('X');
    pub const Y: Symbol = Symbol('Y');

    pub fn as_char(self) -> char {
        self.0
    }

    pub fn asset_name(self) -> String {
        format!("{}.png", self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Every symbol the game knows about, specials included.
pub const ALPHABET: [Symbol; 10] = [
    Symbol::C,
    Symbol::F,
    Symbol::H,
    Symbol::I,
    Symbol::K,
    Symbol::L,
    Symbol::M,
    Symbol::T,
    Symbol::X,
    Symbol::Y,
];

/// Pads randomized decks when the regular pool runs dry. Only this symbol may
/// appear in more than one pair.
pub const FILLER: Symbol = Symbol::H;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Face {
    #[default]
    Hidden,
    Peeked,
    Selected,
    Matched,
}

impl Face {
    pub fn is_face_up(self) -> bool {
        !matches!(self, Face::Hidden)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub symbol: Symbol,
    pub face: Face,
}

impl Card {
    pub fn new(id: CardId, symbol: Symbol) -> Self {
        Self {
            id,
            symbol,
            face: Face::Hidden,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.face == Face::Matched
    }
}
