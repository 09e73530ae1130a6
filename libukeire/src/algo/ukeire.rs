//! Tile acceptance of a hand against a wall.
//!
//! Primary acceptance is every tile type whose draw lowers shanten.
//! Secondary acceptance is every other tile type whose draw allows a discard
//! that keeps shanten but strictly raises the number of primary tiles left
//! in the wall.
use super::shanten::calc_all;
use crate::hand::count_tiles;
use crate::tile::{TILE_TYPES, Tile};
use crate::wall::Wall;
use serde::Serialize;

/// Hands shorter than this only get a shanten number.
pub const MIN_UKEIRE_LEN: usize = 13;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UkeireResult {
    pub shanten: i8,
    /// Draws that lower shanten, in tile order.
    pub primary: Vec<Tile>,
    /// Draws that improve the shape without lowering shanten, in tile order.
    pub secondary: Vec<Tile>,
    /// Copies of the primary tiles still in the wall.
    pub primary_count: u32,
}

impl UkeireResult {
    #[must_use]
    pub const fn shanten_only(shanten: i8) -> Self {
        Self {
            shanten,
            primary: vec![],
            secondary: vec![],
            primary_count: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_primary(&self, tile: Tile) -> bool {
        self.primary.contains(&tile)
    }

    #[inline]
    #[must_use]
    pub fn is_secondary(&self, tile: Tile) -> bool {
        self.secondary.contains(&tile)
    }
}

/// Tile types that bring `counts` below `shanten` when drawn.
fn improving_tiles(counts: &mut [u8; TILE_TYPES], shanten: i8) -> Vec<Tile> {
    Tile::all()
        .filter(|&tile| {
            counts[tile.as_usize()] += 1;
            let improves = calc_all(counts) < shanten;
            counts[tile.as_usize()] -= 1;
            improves
        })
        .collect()
}

/// Best primary count over the discards after drawing `tile` that keep
/// `shanten`, or `None` when every discard worsens the hand.
fn best_after_draw(
    counts: &mut [u8; TILE_TYPES],
    wall: &Wall,
    shanten: i8,
    tile: Tile,
) -> Option<u32> {
    let mut wall_after_draw = *wall;
    wall_after_draw.draw(tile);

    counts[tile.as_usize()] += 1;
    let mut best = None;
    for discard in Tile::all() {
        let id = discard.as_usize();
        if counts[id] == 0 {
            continue;
        }
        counts[id] -= 1;
        if calc_all(counts) == shanten {
            let improving = improving_tiles(counts, shanten);
            let mut wall_after_discard = wall_after_draw;
            wall_after_discard.release(discard);
            let score = wall_after_discard.acceptance(&improving);
            best = best.max(Some(score));
        }
        counts[id] += 1;
    }
    counts[tile.as_usize()] -= 1;

    best
}

/// Acceptance of a hand given as per-type counts.
#[must_use]
pub fn calc_ukeire_counts(counts: &[u8; TILE_TYPES], wall: &Wall) -> UkeireResult {
    let len: usize = counts.iter().map(|&c| c as usize).sum();
    let shanten = calc_all(counts);
    // a complete hand has nothing to accept, and the `< shanten` test below
    // must never run against a value that is already negative
    if len < MIN_UKEIRE_LEN || shanten < 0 {
        return UkeireResult::shanten_only(shanten);
    }

    let mut counts = *counts;
    let primary = improving_tiles(&mut counts, shanten);
    let primary_count = wall.acceptance(&primary);

    let secondary = Tile::all()
        .filter(|tile| !primary.contains(tile))
        .filter(|&tile| {
            best_after_draw(&mut counts, wall, shanten, tile).is_some_and(|best| best > primary_count)
        })
        .collect();

    UkeireResult {
        shanten,
        primary,
        secondary,
        primary_count,
    }
}

/// Acceptance of a 13-tile hand, the unit of work behind every discard
/// candidate.
#[must_use]
pub fn calc_ukeire(tiles: &[Tile], wall: &Wall) -> UkeireResult {
    calc_ukeire_counts(&count_tiles(tiles), wall)
}
