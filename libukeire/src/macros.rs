/// Tile literal to its `u8` id, usable in patterns.
///
/// Accepts `1m`..`9s`, `1z`..`7z` and the honor letters `E S W N P F C`.
#[macro_export]
macro_rules! tu8 {
    (1m) => { 0_u8 };
    (2m) => { 1_u8 };
    (3m) => { 2_u8 };
    (4m) => { 3_u8 };
    (5m) => { 4_u8 };
    (6m) => { 5_u8 };
    (7m) => { 6_u8 };
    (8m) => { 7_u8 };
    (9m) => { 8_u8 };
    (1p) => { 9_u8 };
    (2p) => { 10_u8 };
    (3p) => { 11_u8 };
    (4p) => { 12_u8 };
    (5p) => { 13_u8 };
    (6p) => { 14_u8 };
    (7p) => { 15_u8 };
    (8p) => { 16_u8 };
    (9p) => { 17_u8 };
    (1s) => { 18_u8 };
    (2s) => { 19_u8 };
    (3s) => { 20_u8 };
    (4s) => { 21_u8 };
    (5s) => { 22_u8 };
    (6s) => { 23_u8 };
    (7s) => { 24_u8 };
    (8s) => { 25_u8 };
    (9s) => { 26_u8 };
    (E) => { 27_u8 };
    (S) => { 28_u8 };
    (W) => { 29_u8 };
    (N) => { 30_u8 };
    (P) => { 31_u8 };
    (F) => { 32_u8 };
    (C) => { 33_u8 };
    (1z) => { 27_u8 };
    (2z) => { 28_u8 };
    (3z) => { 29_u8 };
    (4z) => { 30_u8 };
    (5z) => { 31_u8 };
    (6z) => { 32_u8 };
    (7z) => { 33_u8 };
    ($($s:tt),* $(,)?) => { [$($crate::tu8!($s)),*] };
}

/// Same as `tu8!` but as `usize`, for indexing count arrays.
#[macro_export]
macro_rules! tuz {
    ($s:tt) => {
        $crate::tu8!($s) as usize
    };
    ($($s:tt),* $(,)?) => { [$($crate::tuz!($s)),*] };
}

/// Tile literal to a `Tile`, checked at compile time.
#[macro_export]
macro_rules! t {
    ($s:tt) => {{
        const TILE: $crate::tile::Tile = match $crate::tile::Tile::from_id($crate::tu8!($s)) {
            Some(tile) => tile,
            None => panic!("tile id out of range"),
        };
        TILE
    }};
    ($($s:tt),* $(,)?) => { [$($crate::t!($s)),*] };
}

#[macro_export]
macro_rules! matches_tu8 {
    ($o:expr, $($s:tt)|* $(,)?) => {
        matches!($o, $($crate::tu8!($s))|*)
    };
}
