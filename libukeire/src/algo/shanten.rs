//! Shanten over the three winning shapes: four sets and a pair, seven pairs
//! and thirteen orphans.
//!
//! The standard shape is searched per numeric suit. Instead of keeping the
//! single decomposition with the best `10 * sets + partials` score, a suit
//! is reduced to its [`Frontier`], the most partials reachable for every
//! count of complete sets. A weighted score alone can miss the optimum:
//! `11244455679m1p7s` scores best as `444 567 11 24 5 9` but reaches
//! 2-shanten only as head `11` with `24 45 57 69`. Frontiers are memoized
//! per thread, keyed by the suit's rank counts.
use crate::hand::count_tiles;
use crate::tile::{TILE_TYPES, Tile};
use crate::tuz;
use ahash::AHashMap;
use derive_more::{Add, AddAssign, Sum};
use serde::Serialize;
use std::cell::RefCell;
use tinyvec::{TinyVec, tiny_vec};

/// Shanten of an empty hand as shown to users, and the standard-shape value
/// of a hand with no useful groups at all.
pub const MAX_SHANTEN: i8 = 8;

/// Complete sets and partial sets (pairs included) of a decomposition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Add, AddAssign, Sum)]
pub struct Shape {
    pub mentsu: u8,
    pub partials: u8,
}

impl Shape {
    pub const MENTSU: Self = Self { mentsu: 1, partials: 0 };
    pub const PARTIAL: Self = Self { mentsu: 0, partials: 1 };

    /// `8 - 2m - t - head`, with partials capped so that sets plus partials
    /// never exceed four.
    #[inline]
    #[must_use]
    pub const fn shanten(self, has_head: bool) -> i8 {
        let m = self.mentsu as i8;
        let mut t = self.partials as i8;
        if m + t > 4 {
            t = 4 - m;
        }
        MAX_SHANTEN - 2 * m - t - has_head as i8
    }
}

/// Most partial sets reachable for each number of complete sets, indexed by
/// that number.
///
/// Reachable set counts are always `0..len`, since dropping a set from a
/// decomposition leaves a valid one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frontier(TinyVec<[u8; 6]>);

impl Default for Frontier {
    fn default() -> Self {
        Self(tiny_vec![0])
    }
}

impl Frontier {
    fn raise(&mut self, shape: Shape) {
        let m = shape.mentsu as usize;
        if self.0.len() <= m {
            self.0.resize(m + 1, 0);
        }
        self.0[m] = self.0[m].max(shape.partials);
    }

    pub fn shapes(&self) -> impl Iterator<Item = Shape> + '_ {
        self.0
            .iter()
            .enumerate()
            .map(|(m, &partials)| Shape { mentsu: m as u8, partials })
    }

    /// Frontier of the union of two disjoint tile sets.
    #[must_use]
    pub fn combine(&self, other: &Self) -> Self {
        let mut ret = Self(TinyVec::new());
        for a in self.shapes() {
            for b in other.shapes() {
                ret.raise(a + b);
            }
        }
        ret
    }

    /// Best standard-shape shanten over this frontier plus fixed extra groups.
    #[must_use]
    pub fn shanten(&self, extra: Shape, has_head: bool) -> i8 {
        self.shapes()
            .map(|shape| (shape + extra).shanten(has_head))
            .min()
            .unwrap_or(MAX_SHANTEN)
    }
}

thread_local! {
    static SUIT_CACHE: RefCell<AHashMap<u32, Frontier>> = RefCell::new(AHashMap::new());
}

/// Counts may exceed four while the acceptance search adds hypothetical
/// copies, so each rank gets three bits. Suits holding more than seven
/// copies of a rank have no key and are never cached.
#[inline]
fn suit_key(counts: &[u8; 9]) -> Option<u32> {
    counts
        .iter()
        .try_fold(0, |key, &c| (c <= 7).then(|| (key << 3) | c as u32))
}

fn search(counts: &mut [u8; 9]) -> Frontier {
    let Some(i) = counts.iter().position(|&c| c > 0) else {
        return Frontier::default();
    };

    let mut best = Frontier(TinyVec::new());
    let mut branch = |counts: &mut [u8; 9], used: &[usize], gained: Shape| {
        for &j in used {
            counts[j] -= 1;
        }
        let rest = analyze_suit(counts);
        for &j in used {
            counts[j] += 1;
        }
        for shape in rest.shapes() {
            best.raise(shape + gained);
        }
    };

    if counts[i] >= 3 {
        branch(counts, &[i, i, i], Shape::MENTSU);
    }
    if i < 7 && counts[i + 1] > 0 && counts[i + 2] > 0 {
        branch(counts, &[i, i + 1, i + 2], Shape::MENTSU);
    }
    if counts[i] >= 2 {
        branch(counts, &[i, i], Shape::PARTIAL);
    }
    if i < 8 && counts[i + 1] > 0 {
        branch(counts, &[i, i + 1], Shape::PARTIAL);
    }
    if i < 7 && counts[i + 2] > 0 {
        branch(counts, &[i, i + 2], Shape::PARTIAL);
    }
    branch(counts, &[i], Shape::default());

    best
}

/// Frontier of one numeric suit, given its rank counts.
#[must_use]
pub fn analyze_suit(counts: &[u8; 9]) -> Frontier {
    let Some(key) = suit_key(counts) else {
        return search(&mut { *counts });
    };
    if let Some(frontier) = SUIT_CACHE.with_borrow(|cache| cache.get(&key).cloned()) {
        return frontier;
    }
    let frontier = search(&mut { *counts });
    SUIT_CACHE.with_borrow_mut(|cache| cache.insert(key, frontier.clone()));
    frontier
}

/// Honors only form triplets and pairs.
#[must_use]
pub fn analyze_honors(counts: &[u8]) -> Shape {
    counts
        .iter()
        .map(|&c| match c {
            3.. => Shape::MENTSU,
            2 => Shape::PARTIAL,
            _ => Shape::default(),
        })
        .sum()
}

fn suit_slice(counts: &[u8; TILE_TYPES], suit: usize) -> [u8; 9] {
    let mut ret = [0; 9];
    ret.copy_from_slice(&counts[suit * 9..suit * 9 + 9]);
    ret
}

fn numeric_frontier(suits: &[Frontier; 3]) -> Frontier {
    suits[0].combine(&suits[1]).combine(&suits[2])
}

/// Standard shape: every tile type with two or more copies is tried as the
/// head, plus the headless variant.
#[must_use]
pub fn calc_normal(counts: &[u8; TILE_TYPES]) -> i8 {
    let suits: [Frontier; 3] = std::array::from_fn(|s| analyze_suit(&suit_slice(counts, s)));
    let honors = analyze_honors(&counts[tuz!(E)..]);
    let numeric = numeric_frontier(&suits);
    let mut shanten = numeric.shanten(honors, false);

    let mut counts = *counts;
    for id in 0..TILE_TYPES {
        if counts[id] < 2 {
            continue;
        }
        counts[id] -= 2;
        let with_head = if id >= tuz!(E) {
            numeric.shanten(analyze_honors(&counts[tuz!(E)..]), true)
        } else {
            let mut suits = suits.clone();
            suits[id / 9] = analyze_suit(&suit_slice(&counts, id / 9));
            numeric_frontier(&suits).shanten(honors, true)
        };
        counts[id] += 2;
        shanten = shanten.min(with_head);
    }

    shanten
}

/// Seven pairs. A type with four copies still counts as a single pair.
#[must_use]
pub fn calc_chitoi(counts: &[u8; TILE_TYPES]) -> i8 {
    let pairs = counts.iter().filter(|&&c| c >= 2).count() as i8;
    6 - pairs
}

#[must_use]
pub fn calc_kokushi(counts: &[u8; TILE_TYPES]) -> i8 {
    let mut kinds = 0;
    let mut has_pair = false;
    for tile in Tile::all().filter(|t| t.is_yaokyuu()) {
        let c = counts[tile.as_usize()];
        if c > 0 {
            kinds += 1;
        }
        if c >= 2 {
            has_pair = true;
        }
    }
    13 - kinds - has_pair as i8
}

/// Minimum over all three shapes.
///
/// `-1` is a complete hand. Hands longer than 14 tiles can go lower.
#[must_use]
pub fn calc_all(counts: &[u8; TILE_TYPES]) -> i8 {
    calc_normal(counts)
        .min(calc_chitoi(counts))
        .min(calc_kokushi(counts))
}

/// [`calc_all`] over a list of tiles in any order.
#[must_use]
pub fn calc_tiles(tiles: &[Tile]) -> i8 {
    calc_all(&count_tiles(tiles))
}
