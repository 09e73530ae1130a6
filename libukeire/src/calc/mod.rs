//! Scheduling of acceptance work for a hand that keeps changing.
//!
//! Every [`Orchestrator::submit`] starts a new generation. A 13-tile hand is
//! one job; a 14-tile hand is one job per distinct tile type, whose result
//! is shared by every position holding that type. Completions of older
//! generations are dropped when they arrive.
mod executor;
#[cfg(test)]
mod test;

pub use executor::{Executor, RayonExecutor, SequentialExecutor};

use crate::algo::shanten::{MAX_SHANTEN, calc_tiles};
use crate::algo::ukeire::{MIN_UKEIRE_LEN, UkeireResult, calc_ukeire};
use crate::hand::{count_tiles, sorted, tiles_to_string};
use crate::tile::Tile;
use crate::wall::{MAX_COPIES, Wall};
use anyhow::{Context, Result, ensure};
use crossbeam::channel::{Receiver, Sender, unbounded};
use serde::Serialize;
use std::cmp::Reverse;
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Longest hand accepted, right after a draw.
pub const MAX_HAND_LEN: usize = 14;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Nothing submitted yet.
    #[default]
    Idle,
    Loading,
    Ready,
}

/// One acceptance evaluation over a snapshot of a 13-tile hand.
#[derive(Debug, Clone)]
pub struct Job {
    pub generation: u64,
    /// Index of the tile type group this job stands for.
    pub slot: usize,
    pub tiles: Vec<Tile>,
    pub wall: Wall,
    current: Arc<AtomicU64>,
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub generation: u64,
    pub slot: usize,
    pub result: UkeireResult,
}

impl Job {
    /// Whether a newer generation has been submitted since this job was
    /// issued. Stale jobs may be skipped, their results would be dropped.
    #[inline]
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.current.load(Ordering::Acquire) != self.generation
    }

    #[must_use]
    pub fn run(&self) -> Completion {
        Completion {
            generation: self.generation,
            slot: self.slot,
            result: calc_ukeire(&self.tiles, &self.wall),
        }
    }

    /// Run unless stale and report back on `done`.
    pub fn run_into(self, done: &Sender<Completion>) {
        if self.is_stale() {
            log::trace!("skipping stale job {}/{}", self.generation, self.slot);
            return;
        }
        if done.send(self.run()).is_err() {
            log::trace!("orchestrator gone before job {}/{} finished", self.generation, self.slot);
        }
    }
}

/// Tuning for [`Orchestrator::from_config`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CalcConfig {
    /// Worker threads, `0` for one per logical core.
    pub threads: usize,
    /// Run jobs on the calling thread, one per [`Orchestrator::pump`].
    pub sequential: bool,
}

impl CalcConfig {
    pub fn build_executor(&self) -> Result<Box<dyn Executor>> {
        if self.sequential {
            return Ok(Box::new(SequentialExecutor::default()));
        }
        Ok(Box::new(RayonExecutor::new(self.threads)?))
    }
}

/// Visible outcome of the latest finished generation.
#[derive(Debug, Clone, Serialize)]
pub struct CalculationResult {
    /// The hand in sorted order. Discard indices refer to it.
    pub hand: Vec<Tile>,
    pub shanten: i8,
    /// Acceptance of a 13-tile hand, or of the best discard of a 14-tile one.
    /// In the latter case its `shanten` is the one after that discard and
    /// can be higher than the hand's own, e.g. `0` for a complete hand.
    pub ukeire: Arc<UkeireResult>,
    /// Acceptance after discarding each position of a 14-tile hand. Positions
    /// holding the same tile type share one result.
    pub discards: Option<Vec<Arc<UkeireResult>>>,
}

impl CalculationResult {
    fn shanten_only(hand: Vec<Tile>, shanten: i8) -> Self {
        Self {
            hand,
            shanten,
            ukeire: Arc::new(UkeireResult::shanten_only(shanten)),
            discards: None,
        }
    }

    /// Discard with the lowest shanten, then the most acceptance, then the
    /// lowest position.
    #[must_use]
    pub fn best_discard(&self) -> Option<usize> {
        self.discards
            .as_ref()?
            .iter()
            .enumerate()
            .min_by_key(|&(idx, res)| (res.shanten, Reverse(res.primary_count), idx))
            .map(|(idx, _)| idx)
    }
}

/// Work issued for the current generation.
struct Batch {
    generation: u64,
    hand: Vec<Tile>,
    /// Positions in `hand` covered by each slot.
    slots: Vec<Range<usize>>,
    results: Vec<Option<Arc<UkeireResult>>>,
    pending: usize,
    started: Instant,
}

impl Batch {
    fn finish(self) -> Result<CalculationResult> {
        let results = self
            .results
            .into_iter()
            .enumerate()
            .map(|(idx, res)| res.with_context(|| format!("position {idx} never completed")))
            .collect::<Result<Vec<_>>>()?;

        if self.hand.len() < MAX_HAND_LEN {
            let ukeire = results.into_iter().next().context("empty batch")?;
            return Ok(CalculationResult {
                hand: self.hand,
                shanten: ukeire.shanten,
                ukeire,
                discards: None,
            });
        }

        let mut ret = CalculationResult {
            shanten: calc_tiles(&self.hand),
            hand: self.hand,
            ukeire: Arc::default(),
            discards: Some(results),
        };
        if let Some(best) = ret.best_discard()
            && let Some(discards) = &ret.discards
        {
            ret.ukeire = Arc::clone(&discards[best]);
        }
        Ok(ret)
    }
}

pub struct Orchestrator {
    executor: Box<dyn Executor>,
    current: Arc<AtomicU64>,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    status: Status,
    result: Option<CalculationResult>,
    batch: Option<Batch>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(executor: Box<dyn Executor>) -> Self {
        let (tx, rx) = unbounded();
        Self {
            executor,
            current: Arc::new(AtomicU64::new(0)),
            tx,
            rx,
            status: Status::Idle,
            result: None,
            batch: None,
        }
    }

    pub fn from_config(config: &CalcConfig) -> Result<Self> {
        Ok(Self::new(config.build_executor()?))
    }

    #[inline]
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Result of the latest finished generation. While a new hand is
    /// loading this still holds the previous one.
    #[inline]
    #[must_use]
    pub const fn result(&self) -> Option<&CalculationResult> {
        self.result.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }

    /// Acceptance after discarding position `index` of the sorted hand.
    #[must_use]
    pub fn acceptance_for(&self, index: usize) -> Option<Arc<UkeireResult>> {
        self.result.as_ref()?.discards.as_ref()?.get(index).cloned()
    }

    #[must_use]
    pub fn best_discard(&self) -> Option<usize> {
        self.result.as_ref()?.best_discard()
    }

    /// Start analysing a new hand, superseding all earlier work.
    ///
    /// Hands under 13 tiles are answered right away without any job.
    pub fn submit(&mut self, hand: &[Tile], wall: &Wall) -> Result<Status> {
        ensure!(
            hand.len() <= MAX_HAND_LEN,
            "hand of {} tiles is longer than {MAX_HAND_LEN}",
            hand.len(),
        );
        let counts = count_tiles(hand);
        for tile in Tile::all() {
            let count = counts[tile.as_usize()];
            ensure!(count <= MAX_COPIES, "{count} copies of {tile} in hand");
        }

        let generation = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        let hand = sorted(hand);
        self.batch = None;

        if hand.len() < MIN_UKEIRE_LEN {
            let shanten = if hand.is_empty() { MAX_SHANTEN } else { calc_tiles(&hand) };
            self.result = Some(CalculationResult::shanten_only(hand, shanten));
            self.status = Status::Ready;
            return Ok(self.status);
        }

        let slots = if hand.len() == MIN_UKEIRE_LEN {
            vec![0..hand.len()]
        } else {
            hand.chunk_by(|a, b| a == b)
                .scan(0, |start, group| {
                    let range = *start..*start + group.len();
                    *start = range.end;
                    Some(range)
                })
                .collect()
        };

        log::debug!(
            "generation {generation}: {} job(s) for {}",
            slots.len(),
            tiles_to_string(&hand),
        );
        for (slot, range) in slots.iter().enumerate() {
            let mut tiles = hand.clone();
            if hand.len() == MAX_HAND_LEN {
                tiles.remove(range.start);
            }
            let job = Job {
                generation,
                slot,
                tiles,
                wall: *wall,
                current: Arc::clone(&self.current),
            };
            self.executor.execute(job, self.tx.clone());
        }

        self.batch = Some(Batch {
            generation,
            results: vec![None; hand.len()],
            pending: slots.len(),
            hand,
            slots,
            started: Instant::now(),
        });
        self.status = Status::Loading;
        Ok(self.status)
    }

    fn merge(&mut self, completion: Completion) -> Result<()> {
        let Some(batch) = self
            .batch
            .as_mut()
            .filter(|b| b.generation == completion.generation)
        else {
            log::debug!(
                "dropping stale completion {}/{}",
                completion.generation,
                completion.slot,
            );
            return Ok(());
        };

        let range = batch
            .slots
            .get(completion.slot)
            .cloned()
            .with_context(|| format!("unknown slot {}", completion.slot))?;
        if batch.results[range.start].is_some() {
            log::debug!("duplicate completion {}/{}", completion.generation, completion.slot);
            return Ok(());
        }
        let result = Arc::new(completion.result);
        for idx in range {
            batch.results[idx] = Some(Arc::clone(&result));
        }
        batch.pending -= 1;
        log::trace!(
            "generation {}: slot {} done, {} left",
            batch.generation,
            completion.slot,
            batch.pending,
        );

        if batch.pending == 0
            && let Some(batch) = self.batch.take()
        {
            let generation = batch.generation;
            let elapsed = batch.started.elapsed();
            self.result = Some(batch.finish()?);
            self.status = Status::Ready;
            log::info!("generation {generation} ready in {elapsed:?}");
        }
        Ok(())
    }

    /// Give the executor one turn and merge whatever has completed, without
    /// blocking.
    pub fn pump(&mut self) -> Result<Status> {
        self.executor.run_pending();
        while let Ok(completion) = self.rx.try_recv() {
            self.merge(completion)?;
        }
        Ok(self.status)
    }

    /// Block until the current generation is ready.
    pub fn wait(&mut self) -> Result<Status> {
        while self.pump()? == Status::Loading {
            if self.executor.run_pending() {
                continue;
            }
            let completion = self.rx.recv().context("completion channel closed")?;
            self.merge(completion)?;
        }
        Ok(self.status)
    }
}
