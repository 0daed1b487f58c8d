//! Exhaustive scan over one partition of the search space.

use std::{
    iter::once,
    ops::Range,
    sync::atomic::{AtomicBool, Ordering},
};

use itertools::Itertools;

use super::{
    ranked::{Entry, RankedList},
    relative_error, Filter, ScoreFn,
};
use crate::{Error, Result};

pub(super) const ITERS_BETWEEN_ABORT_CHECKS: usize = 10_000;
const ITERS_BETWEEN_PROGRESS_UPDATES: usize = 1_000_000;

/// Immutable data shared by every worker in one run
pub(super) struct ScanData<'s> {
    /// Nominal value of every value of every slot
    pub nominals: &'s [Vec<f64>],
    pub score_fn: &'s ScoreFn,
    pub filters: &'s [Filter],
    pub target: f64,
    pub capacity: usize,
}

/// What one worker found in its partition
#[derive(Debug)]
pub(super) struct Output {
    pub ranked: RankedList,
    pub tested: usize,
    pub filtered: usize,
    pub aborted: bool,
}

/// Test every combination whose first slot index lies in `first_slot`.  Stops early if
/// `abort_flag` is set (by the caller) or `stop_flag` is set (by another worker hitting an
/// error).
pub(super) fn scan(
    data: &ScanData,
    first_slot: Range<usize>,
    abort_flag: &AtomicBool,
    stop_flag: &AtomicBool,
) -> Result<Output> {
    let result = scan_inner(data, first_slot, abort_flag, stop_flag);
    if result.is_err() {
        // No point in the other workers continuing
        stop_flag.store(true, Ordering::Relaxed);
    }
    result
}

fn scan_inner(
    data: &ScanData,
    first_slot: Range<usize>,
    abort_flag: &AtomicBool,
    stop_flag: &AtomicBool,
) -> Result<Output> {
    let partition_size = data.nominals[1..]
        .iter()
        .fold(first_slot.len(), |acc, vs| acc.saturating_mul(vs.len()));

    let mut ranked = RankedList::new(data.capacity);
    let mut tested = 0;
    let mut filtered = 0;
    let mut aborted = false;

    let mut args = vec![0.0; data.nominals.len()];
    let index_ranges = once(first_slot).chain(data.nominals[1..].iter().map(|vs| 0..vs.len()));
    'combinations: for idxs in index_ranges.multi_cartesian_product() {
        // Check for abort every so often
        if tested % ITERS_BETWEEN_ABORT_CHECKS == 0 {
            if stop_flag.load(Ordering::Relaxed) {
                break;
            }
            if abort_flag.load(Ordering::Relaxed) {
                aborted = true;
                break;
            }
        }
        if tested > 0 && tested % ITERS_BETWEEN_PROGRESS_UPDATES == 0 {
            log::debug!(
                "{}: tested {}/{} combinations, {} results kept",
                worker_name(),
                tested,
                partition_size,
                ranked.len()
            );
        }

        for ((arg, slot), &idx) in args.iter_mut().zip_eq(data.nominals).zip_eq(&idxs) {
            *arg = slot[idx];
        }
        tested += 1;

        for (filter_idx, filter) in data.filters.iter().enumerate() {
            let passed = filter
                .call(&args)
                .map_err(|source| Error::Callback {
                    function: format!("Filter #{}", filter_idx),
                    args: args.clone(),
                    source,
                })?;
            if !passed {
                filtered += 1;
                continue 'combinations;
            }
        }

        let score = data
            .score_fn
            .call(&args)
            .map_err(|source| Error::Callback {
                function: "Score function".to_owned(),
                args: args.clone(),
                source,
            })?;
        let error = relative_error(data.target, score);
        if ranked.would_accept(error) {
            log::trace!("Keeping {:?} (score {}, error {})", args, score, error);
            ranked.insert(Entry { idxs, score, error });
        }
    }

    log::debug!(
        "{}: finished after testing {} combinations ({} filtered)",
        worker_name(),
        tested,
        filtered
    );
    Ok(Output {
        ranked,
        tested,
        filtered,
        aborted,
    })
}

fn worker_name() -> String {
    std::thread::current()
        .name()
        .unwrap_or("<unnamed>")
        .to_owned()
}
