//! Terminal and JSON rendering of an analysed hand.
use console::style;
use serde::Serialize;
use ukeire::algo::blocks::{BlockKind, HandBlock, partition_hand};
use ukeire::algo::ukeire::UkeireResult;
use ukeire::calc::CalculationResult;
use ukeire::hand::{display_name, tiles_to_string};
use ukeire::tile::Tile;

/// Everything shown for one position.
#[derive(Debug, Serialize)]
pub struct Report {
    #[serde(flatten)]
    pub result: CalculationResult,
    /// Discard that keeps the lowest shanten with the most acceptance.
    /// Only set for 14-tile hands.
    pub best_discard: Option<Tile>,
    /// Blocks of the hand, after the best discard when there is one.
    /// Acceptance is only attached once the hand has 13 tiles.
    pub blocks: Vec<HandBlock>,
}

impl Report {
    pub fn new(result: CalculationResult) -> Self {
        let best = result.best_discard();
        let mut kept = result.hand.clone();
        if let Some(idx) = best {
            kept.remove(idx);
        }
        let ukeire = (kept.len() >= 13).then_some(&*result.ukeire);
        let blocks = partition_hand(&kept, ukeire);

        Self {
            best_discard: best.map(|idx| result.hand[idx]),
            blocks,
            result,
        }
    }

    pub fn to_log_string(&self) -> String {
        let result = &self.result;
        let mut lines = vec![format!(
            "{} ({})",
            tiles_to_string(&result.hand),
            shanten_to_string(result.shanten),
        )];

        if let Some(discards) = &result.discards {
            // one line per tile type, the first position stands for the rest
            lines.extend(
                result
                    .hand
                    .iter()
                    .enumerate()
                    .filter(|&(idx, tile)| idx == 0 || result.hand[idx - 1] != *tile)
                    .map(|(idx, &tile)| {
                        let marker = if Some(tile) == self.best_discard { '*' } else { ' ' };
                        format!(
                            "{marker}{:<3} {}",
                            display_name(tile),
                            ukeire_to_string(&discards[idx]),
                        )
                    }),
            );
        } else if result.hand.len() >= 13 {
            lines.push(ukeire_to_string(&result.ukeire));
        }

        let blocks = self
            .blocks
            .iter()
            .map(block_to_string)
            .collect::<Vec<_>>()
            .join(" ");
        if !blocks.is_empty() {
            lines.push(blocks);
        }

        lines.join("\n")
    }
}

fn shanten_to_string(shanten: i8) -> String {
    match shanten {
        ..=-1 => "agari".to_owned(),
        0 => "tenpai".to_owned(),
        n => format!("{n}-shanten"),
    }
}

fn tiles_styled(tiles: &[Tile], secondary: bool) -> String {
    tiles
        .iter()
        .map(|&t| {
            let name = style(display_name(t));
            if secondary {
                name.yellow().to_string()
            } else {
                name.green().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn ukeire_to_string(ukeire: &UkeireResult) -> String {
    let mut s = format!(
        "{:>2} {:>3} {}",
        ukeire.shanten,
        ukeire.primary_count,
        tiles_styled(&ukeire.primary, false),
    );
    if !ukeire.secondary.is_empty() {
        s.push_str(" | ");
        s.push_str(&tiles_styled(&ukeire.secondary, true));
    }
    s
}

fn block_to_string(block: &HandBlock) -> String {
    let tiles = tiles_to_string(&block.tiles);
    let tiles = match block.kind {
        BlockKind::Mentsu => style(tiles).dim().to_string(),
        BlockKind::Isolated => style(tiles).red().to_string(),
        _ => tiles,
    };
    if block.primary.is_empty() && block.secondary.is_empty() {
        format!("[{tiles}]")
    } else {
        format!(
            "[{tiles} {}{}]",
            tiles_styled(&block.primary, false),
            if block.secondary.is_empty() {
                String::new()
            } else {
                format!(" | {}", tiles_styled(&block.secondary, true))
            },
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ukeire::calc::{Orchestrator, SequentialExecutor, Status};
    use ukeire::hand::parse_tiles;
    use ukeire::t;
    use ukeire::wall::Wall;

    fn report(s: &str) -> Report {
        let tiles = parse_tiles(s).unwrap();
        let mut orch = Orchestrator::new(Box::new(SequentialExecutor::default()));
        orch.submit(&tiles, &Wall::from_hand(&tiles)).unwrap();
        assert_eq!(orch.wait().unwrap(), Status::Ready);
        Report::new(orch.result().unwrap().clone())
    }

    #[test]
    fn best_discard_blocks() {
        console::set_colors_enabled(false);
        let report = report("445m123456p789s11z");
        assert_eq!(report.best_discard, Some(t!(4m)));
        assert_eq!(report.blocks[0].id, "4m5m");
        assert_eq!(report.blocks[0].primary, t![3m, 6m]);

        let log = report.to_log_string();
        assert!(log.starts_with("445m123456p789s11z (tenpai)"), "{log}");
        assert!(log.contains("*4m"), "{log}");
        // one line per distinct tile type, plus the header and the blocks
        assert_eq!(log.lines().count(), 14);
    }

    #[test]
    fn json_shape() {
        let report = report("46m123456p789s11z");
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["shanten"], 0);
        assert_eq!(value["ukeire"]["primary"], serde_json::json!(["5m"]));
        assert_eq!(value["ukeire"]["secondary"], serde_json::json!(["3m", "7m"]));
        assert_eq!(value["best_discard"], serde_json::Value::Null);
        assert_eq!(value["blocks"][0]["kind"], "kanchan");
    }
}
