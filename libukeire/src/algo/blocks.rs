//! Splitting a hand into connected blocks for display.
//!
//! Tiles of one suit within two ranks of their neighbour (or identical
//! honors) form one block. Each block carries the part of the hand's
//! acceptance that lies near its own tiles.
use super::ukeire::UkeireResult;
use crate::hand::sorted;
use crate::tile::Tile;
use ahash::AHashMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    /// Triplet or run.
    Mentsu,
    Toitsu,
    /// Two-sided partial run, `23m`.
    Ryanmen,
    /// Edge partial run, `12m` or `89m`.
    Penchan,
    /// Closed partial run, `13m`.
    Kanchan,
    /// Anything larger that needs decomposing, `234567m`, `11123m`.
    Complex,
    Isolated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandBlock {
    /// Concatenated tile keys, `"2m3m4m"`.
    pub id: String,
    pub tiles: Vec<Tile>,
    pub kind: BlockKind,
    pub primary: Vec<Tile>,
    pub secondary: Vec<Tile>,
    /// Breakdown of a `Complex` block, empty otherwise.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_blocks: Vec<HandBlock>,
}

/// Classify a sorted group of tiles.
#[must_use]
pub fn identify_block_kind(tiles: &[Tile]) -> BlockKind {
    match *tiles {
        [_] => BlockKind::Isolated,
        [a, b] if a == b => BlockKind::Toitsu,
        [a, b] if a.is_jihai() || a.suit() != b.suit() => BlockKind::Isolated,
        [a, b] => match b.rank().abs_diff(a.rank()) {
            1 if a.rank() == 1 || b.rank() == 9 => BlockKind::Penchan,
            1 => BlockKind::Ryanmen,
            2 => BlockKind::Kanchan,
            _ => BlockKind::Isolated,
        },
        [a, b, c] if a == b && b == c => BlockKind::Mentsu,
        [a, b, c]
            if !a.is_jihai()
                && a.suit() == c.suit()
                && a.as_u8() + 1 == b.as_u8()
                && b.as_u8() + 1 == c.as_u8() =>
        {
            BlockKind::Mentsu
        }
        _ => BlockKind::Complex,
    }
}

fn near_block(tiles: &[Tile], candidates: &[Tile]) -> Vec<Tile> {
    candidates
        .iter()
        .copied()
        .filter(|&c| tiles.iter().any(|t| t.is_near(c)))
        .collect()
}

/// Offsets from the lowest remaining tile and the score of each group, in
/// search order. Sets outweigh any number of partials.
const GROUPS: [(&[u8], u32); 6] = [
    (&[0, 0, 0], 10),
    (&[0, 1, 2], 10),
    (&[0, 0], 1),
    (&[0, 1], 1),
    (&[0, 2], 1),
    (&[0], 0),
];

type Split = (u32, Vec<Vec<Tile>>);

fn split_group(rest: &[Tile], offsets: &[u8]) -> Option<(Vec<Tile>, Vec<Tile>)> {
    let &first = rest.first()?;
    if first.is_jihai() && offsets.iter().any(|&o| o > 0) {
        return None;
    }
    let mut remaining = rest.to_vec();
    let mut group = Vec::with_capacity(offsets.len());
    for &offset in offsets {
        let want = first.as_u8() + offset;
        let pos = remaining
            .iter()
            .position(|t| t.suit() == first.suit() && t.as_u8() == want)?;
        group.push(remaining.remove(pos));
    }
    Some((group, remaining))
}

fn best_split(rest: &[Tile], memo: &mut AHashMap<Vec<Tile>, Split>) -> Split {
    if rest.is_empty() {
        return (0, vec![]);
    }
    if let Some(hit) = memo.get(rest) {
        return hit.clone();
    }

    let mut best: Option<Split> = None;
    for (offsets, gain) in GROUPS {
        let Some((group, remaining)) = split_group(rest, offsets) else {
            continue;
        };
        let (score, mut groups) = best_split(&remaining, memo);
        let score = score + gain;
        if best.as_ref().is_none_or(|(best_score, _)| score > *best_score) {
            groups.insert(0, group);
            best = Some((score, groups));
        }
    }

    let best = best.unwrap_or_default();
    memo.insert(rest.to_vec(), best.clone());
    best
}

/// The sets, partials and single tiles of a block, preferring the most sets
/// and then the most partials.
#[must_use]
pub fn decompose(tiles: &[Tile]) -> Vec<Vec<Tile>> {
    best_split(&sorted(tiles), &mut AHashMap::new()).1
}

fn create_block(tiles: Vec<Tile>, ukeire: Option<&UkeireResult>) -> HandBlock {
    let kind = identify_block_kind(&tiles);
    let id = tiles.iter().map(|t| t.to_string()).collect();
    let (primary, secondary) = ukeire.map_or_else(Default::default, |ukeire| {
        (near_block(&tiles, &ukeire.primary), near_block(&tiles, &ukeire.secondary))
    });
    let sub_blocks = if kind == BlockKind::Complex {
        decompose(&tiles)
            .into_iter()
            .map(|group| create_block(group, ukeire))
            .collect()
    } else {
        vec![]
    };

    HandBlock {
        id,
        tiles,
        kind,
        primary,
        secondary,
        sub_blocks,
    }
}

/// Split any hand into blocks in sorted order, annotated with the nearby
/// part of `ukeire` when given.
#[must_use]
pub fn partition_hand(tiles: &[Tile], ukeire: Option<&UkeireResult>) -> Vec<HandBlock> {
    let tiles = sorted(tiles);
    let mut blocks = vec![];
    let mut current: Vec<Tile> = vec![];

    for tile in tiles {
        if let Some(&prev) = current.last()
            && !prev.is_near(tile)
        {
            blocks.push(create_block(std::mem::take(&mut current), ukeire));
        }
        current.push(tile);
    }
    if !current.is_empty() {
        blocks.push(create_block(current, ukeire));
    }

    blocks
}
