//! Hand notation and counting.
//!
//! Notation is digits closed by a suit letter (`45m123456p789s11z`), with the
//! honor shortcuts `E S W N Wh G R` accepted anywhere outside a digit run.
use crate::tile::{HONOR_NAMES, Suit, TILE_TYPES, Tile};
use anyhow::{Context, Result, bail, ensure};

/// Parse a notation string into tiles, in the order they are written.
pub fn parse_tiles(s: &str) -> Result<Vec<Tile>> {
    ensure!(s.is_ascii(), "hand {s} contains non-ascii content");

    let mut tiles = vec![];
    let mut stack = vec![];

    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'0'..=b'9' => stack.push(b - b'0'),
            b'm' | b'p' | b's' | b'z' => {
                let suit = Suit::from_byte(b).context("suit letter")?;
                for rank in stack.drain(..) {
                    let tile = Tile::new(suit, rank).with_context(|| format!("in hand {s}"))?;
                    tiles.push(tile);
                }
            }
            b'E' | b'S' | b'W' | b'N' | b'G' | b'R' => {
                ensure!(stack.is_empty(), "digits {stack:?} in hand {s} have no suit");
                let name = if b == b'W' && bytes.get(i + 1) == Some(&b'h') {
                    i += 1;
                    "Wh"
                } else {
                    &s[i..=i]
                };
                tiles.push(name.parse::<Tile>().with_context(|| format!("in hand {s}"))?);
            }
            _ if b.is_ascii_whitespace() => (),
            _ => bail!("unexpected byte {} in hand {s}", b as char),
        };
        i += 1;
    }
    ensure!(stack.is_empty(), "digits {stack:?} in hand {s} have no suit");

    Ok(tiles)
}

/// Parse exactly one tile.
pub fn parse_tile(s: &str) -> Result<Tile> {
    let tiles = parse_tiles(s)?;
    ensure!(tiles.len() == 1, "expected one tile, got {}", tiles.len());
    tiles.into_iter().next().context("missing tile")
}

/// Parse a notation string straight into per-type counts.
pub fn hand(s: &str) -> Result<[u8; TILE_TYPES]> {
    Ok(count_tiles(&parse_tiles(s)?))
}

/// Multiset count of a hand, indexed by tile id. Saturates at 255 copies.
#[must_use]
pub fn count_tiles(tiles: &[Tile]) -> [u8; TILE_TYPES] {
    let mut counts = [0u8; TILE_TYPES];
    for tile in tiles {
        let count = &mut counts[tile.as_usize()];
        *count = count.saturating_add(1);
    }
    counts
}

/// Expand per-type counts back into a sorted hand.
#[must_use]
pub fn counts_to_tiles(counts: &[u8; TILE_TYPES]) -> Vec<Tile> {
    Tile::all()
        .flat_map(|tile| std::iter::repeat_n(tile, counts[tile.as_usize()] as usize))
        .collect()
}

/// Canonical sorted copy of a hand.
#[must_use]
pub fn sorted(tiles: &[Tile]) -> Vec<Tile> {
    let mut tiles = tiles.to_vec();
    tiles.sort_unstable();
    tiles
}

/// Format a hand grouped by suit with sorted ranks, e.g. `123m456p11z`.
#[must_use]
pub fn tiles_to_string(tiles: &[Tile]) -> String {
    let tiles = sorted(tiles);
    let mut out = String::with_capacity(tiles.len() + 4);
    for suit in Suit::ALL {
        let before = out.len();
        for tile in tiles.iter().filter(|t| t.suit() == suit) {
            out.push((b'0' + tile.rank()) as char);
        }
        if out.len() != before {
            out.push(suit.as_char());
        }
    }
    out
}

/// Display name of an honor, falling back to the key for numeric tiles.
#[must_use]
pub fn display_name(tile: Tile) -> String {
    if tile.is_jihai() {
        HONOR_NAMES[tile.rank() as usize - 1].to_owned()
    } else {
        tile.to_string()
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::{t, tuz};

    #[test]
    pub fn parse() {
        assert_eq!(parse_tiles("123m").unwrap(), t![1m, 2m, 3m]);
        assert_eq!(parse_tiles("EEEWWh").unwrap(), t![E, E, E, W, P]);
        assert_eq!(parse_tiles("19m 19p 19s 1234567z").unwrap().len(), 13);
        assert_eq!(
            parse_tiles("123m456p789sEEESS").unwrap(),
            parse_tiles("123m456p789s11122z").unwrap(),
        );
        assert_eq!(parse_tiles("GR").unwrap(), t![F, C]);
        assert!(parse_tiles("").unwrap().is_empty());

        parse_tiles("123").unwrap_err();
        parse_tiles("12E3m").unwrap_err();
        parse_tiles("0m").unwrap_err();
        parse_tiles("8z").unwrap_err();
        parse_tiles("5x").unwrap_err();
        parse_tiles("5mあ").unwrap_err();
        parse_tiles("Wx").unwrap_err();
    }

    #[test]
    pub fn single() {
        assert_eq!(parse_tile("7z").unwrap(), t!(C));
        assert_eq!(parse_tile("Wh").unwrap(), t!(P));
        parse_tile("12m").unwrap_err();
        parse_tile("").unwrap_err();
    }

    #[test]
    pub fn counting() {
        let counts = hand("1112345678999m").unwrap();
        assert_eq!(counts[tuz!(1m)], 3);
        assert_eq!(counts[tuz!(5m)], 1);
        assert_eq!(counts[tuz!(9m)], 3);
        assert_eq!(counts.iter().map(|&c| c as usize).sum::<usize>(), 13);
        assert_eq!(counts_to_tiles(&counts), parse_tiles("1112345678999m").unwrap());

        let counts = count_tiles(&[t!(E); 300]);
        assert_eq!(counts[tuz!(E)], u8::MAX);
    }

    #[test]
    pub fn format() {
        let test_one = |input: &str, expected: &str| {
            let tiles = parse_tiles(input).unwrap();
            let formatted = tiles_to_string(&tiles);
            assert_eq!(formatted, expected, "formatting {input}");
            assert_eq!(
                count_tiles(&parse_tiles(&formatted).unwrap()),
                count_tiles(&tiles),
                "reparsing {formatted}",
            );
        };
        test_one("54m651234p987s11z", "45m123456p789s11z");
        test_one("EESSWh2p", "2p11225z");
        test_one("z 9s1s", "19s");
        test_one("", "");
        test_one("RGWhNWSE", "1234567z");
    }

    #[test]
    pub fn names() {
        assert_eq!(display_name(t!(P)), "Wh");
        assert_eq!(display_name(t!(5m)), "5m");
    }
}
