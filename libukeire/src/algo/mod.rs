pub mod blocks;
pub mod shanten;
pub mod ukeire;
pub use blocks::{BlockKind, HandBlock, partition_hand};
pub use ukeire::{UkeireResult, calc_ukeire};
