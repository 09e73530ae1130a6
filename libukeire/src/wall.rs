use crate::tile::{TILE_TYPES, Tile};
use anyhow::{Result, ensure};
use derivative::Derivative;

/// Copies of each tile type in a full set.
pub const MAX_COPIES: u8 = 4;

/// Unseen tiles, tracked as remaining copies per tile type.
///
/// Every count stays in `0..=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Derivative)]
#[derivative(Default)]
pub struct Wall {
    #[derivative(Default(value = "[MAX_COPIES; TILE_TYPES]"))]
    counts: [u8; TILE_TYPES],
}

impl Wall {
    /// Every tile type at four copies.
    #[inline]
    #[must_use]
    pub fn full() -> Self {
        Self::default()
    }

    pub fn from_counts(counts: [u8; TILE_TYPES]) -> Result<Self> {
        for (tile, &count) in Tile::all().zip(&counts) {
            ensure!(count <= MAX_COPIES, "{count} copies of {tile} in wall");
        }
        Ok(Self { counts })
    }

    /// A full wall minus the tiles of `hand`.
    ///
    /// Saturates at zero, so a hand that already breaks the four copy limit
    /// still gets a valid wall.
    #[must_use]
    pub fn from_hand(hand: &[Tile]) -> Self {
        let mut wall = Self::full();
        for &tile in hand {
            wall.draw(tile);
        }
        wall
    }

    /// Remove one visible copy of `tile` from the pool.
    pub fn witness(&mut self, tile: Tile) -> Result<()> {
        let count = &mut self.counts[tile.as_usize()];
        ensure!(*count > 0, "cannot see a fifth {tile}");
        *count -= 1;
        Ok(())
    }

    /// Remove every tile of `tiles`, as with [`Self::witness`].
    pub fn witness_all(&mut self, tiles: &[Tile]) -> Result<()> {
        tiles.iter().try_for_each(|&t| self.witness(t))
    }

    #[inline]
    #[must_use]
    pub const fn count(&self, tile: Tile) -> u8 {
        self.counts[tile.as_usize()]
    }

    #[inline]
    #[must_use]
    pub const fn counts(&self) -> &[u8; TILE_TYPES] {
        &self.counts
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.counts.iter().map(|&c| c as u32).sum()
    }

    /// Hypothetical draw. Saturates at zero.
    #[inline]
    pub fn draw(&mut self, tile: Tile) {
        let count = &mut self.counts[tile.as_usize()];
        *count = count.saturating_sub(1);
    }

    /// Hypothetical discard, making the tile available again. Capped at four.
    #[inline]
    pub fn release(&mut self, tile: Tile) {
        let count = &mut self.counts[tile.as_usize()];
        *count = (*count + 1).min(MAX_COPIES);
    }

    /// Sum of remaining copies over `tiles`.
    #[must_use]
    pub fn acceptance(&self, tiles: &[Tile]) -> u32 {
        tiles.iter().map(|&t| self.count(t) as u32).sum()
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::hand::parse_tiles;
    use crate::t;

    #[test]
    pub fn construction() {
        assert_eq!(Wall::full().total(), 136);
        assert_eq!(Wall::default(), Wall::full());

        let hand = parse_tiles("1111m23p").unwrap();
        let wall = Wall::from_hand(&hand);
        assert_eq!(wall.count(t!(1m)), 0);
        assert_eq!(wall.count(t!(2p)), 3);
        assert_eq!(wall.total(), 130);

        // a fifth copy saturates instead of wrapping
        let wall = Wall::from_hand(&parse_tiles("11111m").unwrap());
        assert_eq!(wall.count(t!(1m)), 0);

        let mut counts = [4; TILE_TYPES];
        Wall::from_counts(counts).unwrap();
        counts[3] = 5;
        Wall::from_counts(counts).unwrap_err();
    }

    #[test]
    pub fn witnessing() {
        let mut wall = Wall::full();
        wall.witness_all(&parse_tiles("5555p").unwrap()).unwrap();
        assert_eq!(wall.count(t!(5p)), 0);
        wall.witness(t!(5p)).unwrap_err();
        assert_eq!(wall.count(t!(5p)), 0);
    }

    #[test]
    pub fn bounds() {
        let mut wall = Wall::full();
        wall.release(t!(E));
        assert_eq!(wall.count(t!(E)), 4);
        for _ in 0..6 {
            wall.draw(t!(E));
        }
        assert_eq!(wall.count(t!(E)), 0);
        wall.release(t!(E));
        assert_eq!(wall.count(t!(E)), 1);
        assert_eq!(wall.acceptance(&t![E, E, 1m]), 6);
    }
}
