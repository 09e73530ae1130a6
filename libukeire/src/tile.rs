use crate::{matches_tu8, tu8};
use std::error::Error;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of distinct tile types: three numeric suits of 9 and 7 honors.
pub const TILE_TYPES: usize = 34;

/// Short names accepted for honors, indexed by `rank - 1`.
pub const HONOR_NAMES: [&str; 7] = ["E", "S", "W", "N", "Wh", "G", "R"];

/// Suits in canonical order. Numeric suits sort before honors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Suit {
    Man,
    Pin,
    Sou,
    Honor,
}

/// A tile type, identified by suit and rank.
///
/// Stored as its id in `0..34`, which is also the canonical sort order: suit
/// first, then rank.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tile(u8);

#[derive(Debug)]
pub enum InvalidTile {
    Number(usize),
    Rank(Suit, u8),
    String(String),
}

impl Suit {
    pub const ALL: [Self; 4] = [Self::Man, Self::Pin, Self::Sou, Self::Honor];

    #[inline]
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Man => 'm',
            Self::Pin => 'p',
            Self::Sou => 's',
            Self::Honor => 'z',
        }
    }

    #[inline]
    #[must_use]
    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'm' => Some(Self::Man),
            b'p' => Some(Self::Pin),
            b's' => Some(Self::Sou),
            b'z' => Some(Self::Honor),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_honor(self) -> bool {
        matches!(self, Self::Honor)
    }

    #[inline]
    #[must_use]
    pub const fn max_rank(self) -> u8 {
        if self.is_honor() { 7 } else { 9 }
    }

    /// Id of rank 1 of this suit.
    #[inline]
    #[must_use]
    pub const fn base(self) -> u8 {
        match self {
            Self::Man => 0,
            Self::Pin => 9,
            Self::Sou => 18,
            Self::Honor => 27,
        }
    }
}

impl Tile {
    /// Fails when `rank` is outside 1-9 for numeric suits or 1-7 for honors.
    pub fn new(suit: Suit, rank: u8) -> Result<Self, InvalidTile> {
        if rank == 0 || rank > suit.max_rank() {
            return Err(InvalidTile::Rank(suit, rank));
        }
        Ok(Self(suit.base() + rank - 1))
    }

    #[inline]
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        if (id as usize) < TILE_TYPES {
            Some(Self(id))
        } else {
            None
        }
    }

    /// All 34 tile types in canonical order.
    pub fn all() -> impl Iterator<Item = Self> + Clone {
        (0..TILE_TYPES as u8).map(Self)
    }

    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }
    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    #[inline]
    #[must_use]
    pub const fn suit(self) -> Suit {
        match self.0 / 9 {
            0 => Suit::Man,
            1 => Suit::Pin,
            2 => Suit::Sou,
            _ => Suit::Honor,
        }
    }

    #[inline]
    #[must_use]
    pub const fn rank(self) -> u8 {
        self.0 - self.suit().base() + 1
    }

    #[inline]
    #[must_use]
    pub const fn is_jihai(self) -> bool {
        self.suit().is_honor()
    }

    /// Terminals and honors.
    #[inline]
    #[must_use]
    pub const fn is_yaokyuu(self) -> bool {
        matches_tu8!(self.0, 1m | 9m | 1p | 9p | 1s | 9s | E | S | W | N | P | F | C)
    }

    /// Whether `other` sits close enough to matter for a block built around
    /// `self`: same suit and at most two ranks apart, or the same honor.
    #[inline]
    #[must_use]
    pub const fn is_near(self, other: Self) -> bool {
        if self.suit() as u8 != other.suit() as u8 {
            return false;
        }
        if self.is_jihai() {
            self.0 == other.0
        } else {
            self.0.abs_diff(other.0) <= 2
        }
    }
}

impl TryFrom<u8> for Tile {
    type Error = InvalidTile;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Self::try_from(v as usize)
    }
}

impl TryFrom<usize> for Tile {
    type Error = InvalidTile;

    fn try_from(v: usize) -> Result<Self, Self::Error> {
        if v >= TILE_TYPES {
            Err(InvalidTile::Number(v))
        } else {
            Ok(Self(v as u8))
        }
    }
}

impl FromStr for Tile {
    type Err = InvalidTile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(pos) = HONOR_NAMES.iter().position(|&name| name == s) {
            return Ok(Self(tu8!(E) + pos as u8));
        }
        match *s.as_bytes() {
            [rank @ b'0'..=b'9', suit] => {
                let suit = Suit::from_byte(suit).ok_or_else(|| InvalidTile::String(s.to_owned()))?;
                Self::new(suit, rank - b'0')
            }
            _ => Err(InvalidTile::String(s.to_owned())),
        }
    }
}

impl fmt::Debug for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self, f)
    }
}

/// The canonical key, rank digit then suit letter (`5p`, `3z`).
impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank(), self.suit().as_char())
    }
}

impl<'de> Deserialize<'de> for Tile {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tile = String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)?;
        Ok(tile)
    }
}

impl Serialize for Tile {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl fmt::Display for InvalidTile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("not a valid tile: ")?;
        match self {
            Self::Number(n) => fmt::Display::fmt(n, f),
            Self::Rank(suit, rank) => write!(f, "rank {rank} in suit {}", suit.as_char()),
            Self::String(s) => write!(f, "\"{s}\""),
        }
    }
}

impl Error for InvalidTile {}
