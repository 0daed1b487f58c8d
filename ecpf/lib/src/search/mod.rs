//! The [`Search`] engine: exhaustive, ranked search over every combination of slot values.

use std::{
    fmt::{Debug, Formatter},
    ops::Range,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

use ecpf_utils::BigNumInt;
use itertools::Itertools;
use rand::RngCore;

use crate::{
    permutator::read_each_once,
    stats::{MonteCarloStats, MIN_SAMPLES},
    Error, FnError, Permutator, Result, Value,
};

mod ranked;
mod worker;

use self::ranked::RankedList;

/// The number of results kept by a [`SearchBuilder`] unless told otherwise
pub const DEFAULT_CAPACITY: usize = 20;

///////////////
// CALLBACKS //
///////////////

type Callback<T> = Arc<dyn Fn(&[f64]) -> std::result::Result<T, FnError> + Send + Sync>;

/// The function which turns one value per slot into a score, which is then compared to the
/// target.  Values are passed positionally, in slot order.
#[derive(Clone)]
pub struct ScoreFn {
    arity: usize,
    func: Callback<f64>,
}

impl ScoreFn {
    /// Creates a `ScoreFn` which takes `arity` values and can't fail
    pub fn new(arity: usize, func: impl Fn(&[f64]) -> f64 + Send + Sync + 'static) -> Self {
        Self::fallible(arity, move |args| Ok(func(args)))
    }

    /// Creates a `ScoreFn` which can fail.  The first failure stops the [`Search`] and is
    /// returned as an [`Error::Callback`].
    pub fn fallible(
        arity: usize,
        func: impl Fn(&[f64]) -> std::result::Result<f64, FnError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            arity,
            func: Arc::new(func),
        }
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub(crate) fn call(&self, args: &[f64]) -> std::result::Result<f64, FnError> {
        (self.func)(args)
    }
}

impl Debug for ScoreFn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ScoreFn(arity = {})", self.arity)
    }
}

/// A predicate over one value per slot.  Combinations for which any `Filter` returns `false` are
/// counted as filtered and never scored.
#[derive(Clone)]
pub struct Filter {
    arity: usize,
    func: Callback<bool>,
}

impl Filter {
    pub fn new(arity: usize, func: impl Fn(&[f64]) -> bool + Send + Sync + 'static) -> Self {
        Self::fallible(arity, move |args| Ok(func(args)))
    }

    pub fn fallible(
        arity: usize,
        func: impl Fn(&[f64]) -> std::result::Result<bool, FnError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            arity,
            func: Arc::new(func),
        }
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub(crate) fn call(&self, args: &[f64]) -> std::result::Result<bool, FnError> {
        (self.func)(args)
    }
}

impl Debug for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Filter(arity = {})", self.arity)
    }
}

////////////
// CONFIG //
////////////

/// Parameters for _how_ a [`Search`] is run.  None of these affect which results are found.
#[derive(Debug, Clone)]
pub struct Config {
    /// How many threads will be used to search.  If set to `None`, this will use the number of
    /// available CPU cores.
    pub num_threads: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            num_threads: Some(1),
        }
    }
}

/////////////
// BUILDER //
/////////////

/// Builder API for creating [`Search`]es
#[derive(Debug)]
pub struct SearchBuilder {
    target: f64,
    slots: Vec<Arc<dyn Permutator>>,
    score_fn: ScoreFn,
    filters: Vec<Filter>,
    capacity: usize,
    config: Config,
}

impl SearchBuilder {
    /// Start building a [`Search`] for combinations (one value from each of the `slots`) whose
    /// score is as close as possible to `target`.
    pub fn new(target: f64, slots: Vec<Arc<dyn Permutator>>, score_fn: ScoreFn) -> Self {
        Self {
            target,
            slots,
            score_fn,
            filters: Vec::new(),
            capacity: DEFAULT_CAPACITY,
            config: Config::default(),
        }
    }

    /// Add a [`Filter`].  Filters are run in the order they're added.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Sets the maximum number of results which will be kept (default [`DEFAULT_CAPACITY`])
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Check the parameters and build the [`Search`]
    pub fn build(self) -> Result<Search> {
        if self.slots.is_empty() {
            return Err(Error::invalid("slots", "a search needs at least one slot"));
        }
        if self.capacity == 0 {
            return Err(Error::invalid("capacity", "must keep at least one result"));
        }
        if !self.target.is_finite() || self.target == 0.0 {
            return Err(Error::invalid(
                "target",
                format!(
                    "relative error is undefined for a target of {}",
                    self.target
                ),
            ));
        }
        if self.config.num_threads == Some(0) {
            return Err(Error::invalid("num_threads", "must use at least one thread"));
        }

        check_arity("Score function", self.score_fn.arity, self.slots.len())?;
        for (idx, filter) in self.filters.iter().enumerate() {
            check_arity(&format!("Filter #{}", idx), filter.arity, self.slots.len())?;
        }

        Ok(Search {
            target: self.target,
            slots: self.slots,
            score_fn: self.score_fn,
            filters: self.filters,
            capacity: self.capacity,
            config: self.config,

            results: Vec::new(),
            progress: None,
        })
    }
}

fn check_arity(function: &str, expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::ArityMismatch {
            function: function.to_owned(),
            expected,
            found,
        })
    }
}

////////////
// SEARCH //
////////////

/// One of the combinations found by a [`Search`]: one [`Value`] per slot, with its score
#[derive(Debug, Clone)]
pub struct Candidate {
    pub values: Vec<Arc<dyn Value>>,
    pub score: f64,
    /// `|target - score| / |target|`
    pub error: f64,
}

/// Counters from the last run of a [`Search`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    /// Number of combinations enumerated, including the ones which were filtered
    pub total_tested: usize,
    /// Number of combinations rejected by a [`Filter`]
    pub total_filtered: usize,
    /// `true` if the run was stopped by its abort flag before every combination was tested
    pub aborted: bool,
}

/// The worst and best scores which a combination can reach, given the tolerances of its values
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub min: f64,
    /// The value of each slot which gives the score `min`
    pub min_args: Vec<f64>,
    pub max: f64,
    /// The value of each slot which gives the score `max`
    pub max_args: Vec<f64>,
}

/// A search for the combinations of slot values whose score is closest to some target.  Created
/// with a [`SearchBuilder`].
#[derive(Debug)]
pub struct Search {
    target: f64,
    slots: Vec<Arc<dyn Permutator>>,
    score_fn: ScoreFn,
    filters: Vec<Filter>,
    capacity: usize,
    config: Config,

    /// Sorted by ascending `error`
    results: Vec<Candidate>,
    /// `None` until a run has completed
    progress: Option<Progress>,
}

impl Search {
    /// Run the search, replacing the results and counters of any previous run
    pub fn run(&mut self) -> Result<()> {
        self.run_with_abort(&AtomicBool::new(false))
    }

    /// Run the search, stopping early if `abort_flag` gets set.  An aborted run keeps the best
    /// results found before the abort.
    pub fn run_with_abort(&mut self, abort_flag: &AtomicBool) -> Result<()> {
        self.results.clear();
        self.progress = None;

        // Read every slot exactly once
        let slot_values = read_each_once(&self.slots);
        let nominals: Vec<Vec<f64>> = slot_values
            .iter()
            .map(|values| values.iter().map(|v| v.nominal()).collect_vec())
            .collect_vec();
        let space_size = nominals
            .iter()
            .fold(1usize, |acc, vs| acc.saturating_mul(vs.len()));

        let num_threads = self.config.num_threads.unwrap_or_else(num_cpus::get).max(1);
        let partitions = partition(nominals[0].len(), num_threads);
        log::info!(
            "Searching {} combinations of {} slot(s) on {} thread(s)",
            BigNumInt(space_size),
            self.slots.len(),
            partitions.len()
        );

        let data = worker::ScanData {
            nominals: &nominals,
            score_fn: &self.score_fn,
            filters: &self.filters,
            target: self.target,
            capacity: self.capacity,
        };
        let outputs = run_workers(&data, partitions, abort_flag)?;

        // Merge in partition order, so that ties are broken exactly as in a single-threaded run
        let mut merged = RankedList::new(self.capacity);
        let mut progress = Progress::default();
        for output in outputs {
            for entry in output.ranked.into_entries() {
                merged.insert(entry);
            }
            progress.total_tested += output.tested;
            progress.total_filtered += output.filtered;
            progress.aborted |= output.aborted;
        }

        self.results = merged
            .into_entries()
            .into_iter()
            .map(|entry| Candidate {
                values: entry
                    .idxs
                    .iter()
                    .enumerate()
                    .map(|(slot, &idx)| slot_values[slot][idx].clone())
                    .collect(),
                score: entry.score,
                error: entry.error,
            })
            .collect();

        if progress.aborted {
            log::warn!(
                "Search aborted after testing {}/{} combinations",
                BigNumInt(progress.total_tested),
                BigNumInt(space_size)
            );
        }
        log::info!(
            "Tested {} combinations ({} filtered); kept {} result(s)",
            BigNumInt(progress.total_tested),
            BigNumInt(progress.total_filtered),
            self.results.len()
        );
        self.progress = Some(progress);
        Ok(())
    }

    /* RESULTS */

    /// The best combinations found by the last run, closest to the target first
    pub fn results(&self) -> &[Candidate] {
        &self.results
    }

    /// Iterate over `(score, values)` for each result, closest to the target first
    pub fn iter_results(&self) -> impl Iterator<Item = (f64, &[Arc<dyn Value>])> + '_ {
        self.results.iter().map(|c| (c.score, c.values.as_slice()))
    }

    /// Returns `true` if [`Search::run`] has completed at least once (even if it found nothing)
    pub fn has_run(&self) -> bool {
        self.progress.is_some()
    }

    /// The counters of the last completed run, if there was one
    pub fn progress(&self) -> Option<Progress> {
        self.progress
    }

    pub fn total_tested(&self) -> usize {
        self.progress.map_or(0, |p| p.total_tested)
    }

    pub fn total_filtered(&self) -> usize {
        self.progress.map_or(0, |p| p.total_filtered)
    }

    pub fn was_aborted(&self) -> bool {
        self.progress.map_or(false, |p| p.aborted)
    }

    /* GETTERS */

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn slots(&self) -> &[Arc<dyn Permutator>] {
        &self.slots
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn num_filters(&self) -> usize {
        self.filters.len()
    }

    pub fn relative_error(&self, score: f64) -> f64 {
        relative_error(self.target, score)
    }

    /* ANALYSIS */

    /// Score every combination of the min and max of each of `values`, returning the smallest and
    /// largest scores.  If several combinations give the same extreme score, the first one
    /// (taking every `min` before every `max`, first slot varying slowest) is returned.
    pub fn theoretical_bounds(&self, values: &[Arc<dyn Value>]) -> Result<Bounds> {
        check_arity("Score function", self.score_fn.arity, values.len())?;

        let mut bounds: Option<Bounds> = None;
        let endpoint_combinations = values
            .iter()
            .map(|v| v.interval().endpoints().into_iter())
            .multi_cartesian_product();
        for args in endpoint_combinations {
            let score = self.score(&args)?;
            match &mut bounds {
                None => {
                    bounds = Some(Bounds {
                        min: score,
                        min_args: args.clone(),
                        max: score,
                        max_args: args,
                    })
                }
                Some(b) => {
                    if score < b.min {
                        b.min = score;
                        b.min_args = args.clone();
                    }
                    if score > b.max {
                        b.max = score;
                        b.max_args = args;
                    }
                }
            }
        }
        bounds.ok_or_else(|| Error::invalid("values", "no values to compute bounds of"))
    }

    /// Score `num_samples` random realisations of `values`, sampling every component
    /// independently within its tolerance.
    pub fn monte_carlo_samples(
        &self,
        values: &[Arc<dyn Value>],
        num_samples: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<f64>> {
        check_arity("Score function", self.score_fn.arity, values.len())?;

        let mut args = vec![0.0; values.len()];
        let mut samples = Vec::with_capacity(num_samples);
        for _ in 0..num_samples {
            for (arg, v) in args.iter_mut().zip(values) {
                *arg = v.sample(rng);
            }
            samples.push(self.score(&args)?);
        }
        Ok(samples)
    }

    /// Summarise the distribution of scores of `values` over `num_samples` random realisations,
    /// using the thread-local RNG.  Use [`Search::monte_carlo_stats_with_rng`] for reproducible
    /// results.
    pub fn monte_carlo_stats(
        &self,
        values: &[Arc<dyn Value>],
        num_samples: usize,
    ) -> Result<MonteCarloStats> {
        self.monte_carlo_stats_with_rng(values, num_samples, &mut rand::thread_rng())
    }

    pub fn monte_carlo_stats_with_rng(
        &self,
        values: &[Arc<dyn Value>],
        num_samples: usize,
        rng: &mut dyn RngCore,
    ) -> Result<MonteCarloStats> {
        if num_samples < MIN_SAMPLES {
            return Err(Error::InsufficientSamples {
                requested: num_samples,
                required: MIN_SAMPLES,
            });
        }
        let samples = self.monte_carlo_samples(values, num_samples, rng)?;
        MonteCarloStats::from_samples(&samples)
    }

    fn score(&self, args: &[f64]) -> Result<f64> {
        self.score_fn.call(args).map_err(|source| Error::Callback {
            function: "Score function".to_owned(),
            args: args.to_vec(),
            source,
        })
    }
}

/// `|target - score| / |target|`.  A `NaN` score is treated as infinitely far from the target.
pub(crate) fn relative_error(target: f64, score: f64) -> f64 {
    let error = ((target - score) / target).abs();
    if error.is_nan() {
        f64::INFINITY
    } else {
        error
    }
}

/// Split `0..len` into at most `parts` contiguous, non-empty ranges of near-equal length
fn partition(len: usize, parts: usize) -> Vec<Range<usize>> {
    let parts = parts.clamp(1, len.max(1));
    let (chunk, remainder) = (len / parts, len % parts);
    let mut ranges = Vec::with_capacity(parts);
    let mut start = 0;
    for i in 0..parts {
        let end = start + chunk + usize::from(i < remainder);
        if end > start {
            ranges.push(start..end);
        }
        start = end;
    }
    ranges
}

/// Scan every partition, each on its own thread (or on this thread if there's only one
/// partition).  Outputs are returned in partition order; if any worker fails, the error from the
/// earliest partition is returned.
fn run_workers(
    data: &worker::ScanData,
    partitions: Vec<Range<usize>>,
    abort_flag: &AtomicBool,
) -> Result<Vec<worker::Output>> {
    let stop_flag = AtomicBool::new(false);
    if partitions.len() <= 1 {
        return partitions
            .into_iter()
            .map(|range| worker::scan(data, range, abort_flag, &stop_flag))
            .collect();
    }

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(partitions.len());
        for (i, range) in partitions.into_iter().enumerate() {
            let stop_flag = &stop_flag;
            let spawn_result = thread::Builder::new()
                .name(format!("Worker{}", i))
                .spawn_scoped(scope, move || worker::scan(data, range, abort_flag, stop_flag));
            match spawn_result {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    stop_flag.store(true, Ordering::Relaxed);
                    return Err(Error::WorkerSpawn(e));
                }
            }
        }
        // Join every worker before reporting any errors
        let outputs = handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect_vec();
        outputs.into_iter().collect()
    })
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::{Chain, ChainPermutator, Component, ComponentKind, ComponentPermutator, ESeries};

    fn slot(values: &[f64], tolerance: f64) -> Arc<dyn Permutator> {
        Arc::new(ComponentPermutator::new(values, tolerance).unwrap())
    }

    fn scores(search: &Search) -> Vec<f64> {
        search.iter_results().map(|(score, _)| score).collect()
    }

    #[test]
    fn ranking() {
        let mut search = SearchBuilder::new(
            100.0,
            vec![slot(&[90.0, 110.0, 100.0001], 0.0)],
            ScoreFn::new(1, |v| v[0]),
        )
        .capacity(2)
        .build()
        .unwrap();
        assert!(!search.has_run());
        search.run().unwrap();

        assert!(search.has_run());
        assert_eq!(search.total_tested(), 3);
        assert_eq!(search.total_filtered(), 0);
        // 90 and 110 tie; 90 was enumerated first so it wins the tie
        assert_eq!(scores(&search), [100.0001, 90.0]);
        let errors = search.results().iter().map(|c| c.error).collect_vec();
        assert!(errors.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn filtering() {
        let values = [100.0, 500.0, 900.0];
        let mut search = SearchBuilder::new(
            1000.0,
            vec![slot(&values, 0.0), slot(&values, 0.0)],
            ScoreFn::new(2, |v| v[0] + v[1]),
        )
        .filter(Filter::new(2, |v| v[0] + v[1] < 1000.0))
        .build()
        .unwrap();
        search.run().unwrap();

        // Filtered: 100+900, 500+500, 500+900, 900+100, 900+500, 900+900
        assert_eq!(search.total_tested(), 9);
        assert_eq!(search.total_filtered(), 6);
        assert_eq!(search.results().len(), 3);
        for (score, _) in search.iter_results() {
            assert!(score < 1000.0);
        }
        assert_eq!(search.results()[0].score, 600.0);
    }

    #[test]
    fn filters_short_circuit() {
        let mut search = SearchBuilder::new(
            1.0,
            vec![slot(&[1.0, 2.0], 0.0)],
            ScoreFn::new(1, |v| v[0]),
        )
        .filter(Filter::new(1, |v| v[0] < 1.5))
        .filter(Filter::fallible(1, |v| {
            if v[0] < 1.5 {
                Ok(true)
            } else {
                Err("second filter saw a value the first should have rejected".into())
            }
        }))
        .build()
        .unwrap();
        search.run().unwrap();
        assert_eq!(search.total_filtered(), 1);
        assert_eq!(scores(&search), [1.0]);
    }

    #[test]
    fn empty_slot() {
        let mut search = SearchBuilder::new(
            10.0,
            vec![slot(&[1.0, 2.0], 0.0), slot(&[], 0.0)],
            ScoreFn::new(2, |v| v[0] * v[1]),
        )
        .build()
        .unwrap();
        search.run().unwrap();
        assert!(search.has_run());
        assert_eq!(search.total_tested(), 0);
        assert!(search.results().is_empty());
    }

    #[test]
    fn rerun_resets() {
        let mut search = SearchBuilder::new(
            3.0,
            vec![slot(&[1.0, 2.0, 3.0], 0.0)],
            ScoreFn::new(1, |v| v[0]),
        )
        .build()
        .unwrap();
        search.run().unwrap();
        let first = scores(&search);
        search.run().unwrap();
        assert_eq!(scores(&search), first);
        assert_eq!(search.total_tested(), 3);
    }

    #[test]
    fn parallel_matches_sequential() {
        let resistors = slot(&ESeries::E12.over_decades(2..=4), 0.05);
        let pair: Arc<dyn Permutator> = Arc::new(
            ChainPermutator::new(
                vec![resistors.clone(), resistors.clone()],
                ComponentKind::Resistor.reducers(),
            )
            .unwrap(),
        );
        let build = |num_threads| {
            SearchBuilder::new(
                0.25,
                vec![pair.clone(), resistors.clone()],
                ScoreFn::new(2, |v| v[1] / (v[0] + v[1])),
            )
            .filter(Filter::new(2, |v| v[0] + v[1] > 1_000.0))
            .capacity(15)
            .config(Config {
                num_threads: Some(num_threads),
            })
            .build()
            .unwrap()
        };

        let mut sequential = build(1);
        sequential.run().unwrap();
        for num_threads in [2, 3, 7] {
            let mut parallel = build(num_threads);
            parallel.run().unwrap();
            assert_eq!(parallel.progress(), sequential.progress());
            let ranked = |s: &Search| {
                s.iter_results()
                    .map(|(score, vs)| (score, vs.iter().map(|v| v.nominal()).collect_vec()))
                    .collect_vec()
            };
            assert_eq!(ranked(&parallel), ranked(&sequential));
        }
    }

    #[test]
    fn abort_before_start() {
        let mut search = SearchBuilder::new(
            1.0,
            vec![slot(&[1.0, 2.0], 0.0)],
            ScoreFn::new(1, |v| v[0]),
        )
        .build()
        .unwrap();
        search.run_with_abort(&AtomicBool::new(true)).unwrap();
        assert!(search.has_run());
        assert!(search.was_aborted());
        assert_eq!(search.total_tested(), 0);
    }

    #[test]
    fn abort_during_run_keeps_results() {
        use std::sync::atomic::AtomicUsize;

        let values = (1..=200).map(f64::from).collect_vec();
        let abort_flag = Arc::new(AtomicBool::new(false));
        let calls = Arc::new(AtomicUsize::new(0));
        let (flag, counter) = (abort_flag.clone(), calls.clone());
        let mut search = SearchBuilder::new(
            150.0,
            vec![slot(&values, 0.0), slot(&values, 0.0)],
            ScoreFn::new(2, |v| v[0] + v[1]),
        )
        .filter(Filter::new(2, move |_| {
            // Ask for an abort part-way between two abort checks
            if counter.fetch_add(1, Ordering::Relaxed) == 15_000 {
                flag.store(true, Ordering::Relaxed);
            }
            true
        }))
        .capacity(10)
        .build()
        .unwrap();
        search.run_with_abort(&abort_flag).unwrap();

        assert!(search.has_run());
        assert!(search.was_aborted());
        assert_eq!(search.total_tested(), 2 * worker::ITERS_BETWEEN_ABORT_CHECKS);
        assert_eq!(search.results().len(), 10);
        let errors = search.results().iter().map(|c| c.error).collect_vec();
        assert!(errors.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(errors[0], 0.0);
    }

    #[test]
    fn shared_one_shot_slot() {
        let src: Arc<dyn Permutator> = Arc::new(
            ComponentPermutator::new(crate::Magnitudes::one_shot(vec![1.0, 2.0, 3.0]), 0.0)
                .unwrap(),
        );
        let score = ScoreFn::new(2, |v| v[0] + v[1]);
        let mut search = SearchBuilder::new(4.0, vec![src.clone(), src], score)
            .build()
            .unwrap();
        search.run().unwrap();
        assert_eq!(search.total_tested(), 9);
        assert_eq!(scores(&search)[..3], [4.0, 4.0, 4.0]);
    }

    #[test]
    fn invalid_parameters() {
        #[track_caller]
        fn check(builder: SearchBuilder, exp_name: &str) {
            match builder.build() {
                Err(Error::InvalidParameter { name, .. }) => assert_eq!(name, exp_name),
                other => panic!("expected invalid `{}`, got {:?}", exp_name, other),
            }
        }

        let score = || ScoreFn::new(1, |v| v[0]);
        let slots = || vec![slot(&[1.0], 0.0)];
        check(SearchBuilder::new(1.0, vec![], score()), "slots");
        check(SearchBuilder::new(1.0, slots(), score()).capacity(0), "capacity");
        check(SearchBuilder::new(0.0, slots(), score()), "target");
        check(SearchBuilder::new(f64::NAN, slots(), score()), "target");
        check(
            SearchBuilder::new(1.0, slots(), score()).config(Config {
                num_threads: Some(0),
            }),
            "num_threads",
        );
    }

    #[test]
    fn arity_mismatch() {
        let result = SearchBuilder::new(
            1.0,
            vec![slot(&[1.0], 0.0)],
            ScoreFn::new(2, |v| v[0] * v[1]),
        )
        .build();
        assert!(matches!(
            result,
            Err(Error::ArityMismatch {
                expected: 2,
                found: 1,
                ..
            })
        ));

        let result = SearchBuilder::new(1.0, vec![slot(&[1.0], 0.0)], ScoreFn::new(1, |v| v[0]))
            .filter(Filter::new(3, |_| true))
            .build();
        assert!(matches!(
            result,
            Err(Error::ArityMismatch {
                function,
                expected: 3,
                found: 1
            }) if function == "Filter #0"
        ));
    }

    #[test]
    fn callback_errors_stop_search() {
        let mut search = SearchBuilder::new(
            1.0,
            vec![slot(&[1.0, 0.0, 2.0], 0.0)],
            ScoreFn::fallible(1, |v| {
                if v[0] == 0.0 {
                    Err("division by zero".into())
                } else {
                    Ok(1.0 / v[0])
                }
            }),
        )
        .build()
        .unwrap();
        match search.run() {
            Err(Error::Callback { function, args, .. }) => {
                assert_eq!(function, "Score function");
                assert_eq!(args, [0.0]);
            }
            other => panic!("expected callback error, got {:?}", other),
        }
        assert!(!search.has_run());
    }

    #[test]
    fn callback_errors_stop_parallel_search() {
        let values = (0..200).map(f64::from).collect_vec();
        let mut search = SearchBuilder::new(
            1.0,
            vec![slot(&values, 0.0), slot(&[1.0, 2.0, 3.0], 0.0)],
            ScoreFn::fallible(2, |v| {
                if v[0] == 150.0 {
                    Err("boom".into())
                } else {
                    Ok(v[0] * v[1])
                }
            }),
        )
        .config(Config {
            num_threads: Some(4),
        })
        .build()
        .unwrap();
        match search.run() {
            Err(Error::Callback { function, args, .. }) => {
                assert_eq!(function, "Score function");
                assert_eq!(args[0], 150.0);
            }
            other => panic!("expected callback error, got {:?}", other),
        }
        assert!(!search.has_run());
        assert!(search.results().is_empty());
    }

    #[test]
    fn bounds() {
        let search = SearchBuilder::new(
            1.0,
            vec![slot(&[1.0], 0.0), slot(&[1.0], 0.0)],
            ScoreFn::new(2, |v| v[0] - v[1]),
        )
        .build()
        .unwrap();
        let values: Vec<Arc<dyn Value>> = vec![
            Arc::new(Component::new(10.0, 0.1).unwrap()),
            Arc::new(Component::new(5.0, 0.2).unwrap()),
        ];
        let bounds = search.theoretical_bounds(&values).unwrap();
        assert!((bounds.min - 3.0).abs() < 1e-9);
        assert!((bounds.max - 7.0).abs() < 1e-9);
        assert!((bounds.min_args[0] - 9.0).abs() < 1e-9);
        assert!((bounds.min_args[1] - 6.0).abs() < 1e-9);
        assert!((bounds.max_args[0] - 11.0).abs() < 1e-9);
        assert!((bounds.max_args[1] - 4.0).abs() < 1e-9);

        assert!(matches!(
            search.theoretical_bounds(&values[..1]),
            Err(Error::ArityMismatch { .. })
        ));
    }

    #[test]
    fn monte_carlo() {
        let search = SearchBuilder::new(10.0, vec![slot(&[10.0], 0.0)], ScoreFn::new(1, |v| v[0]))
            .build()
            .unwrap();
        let exact: Vec<Arc<dyn Value>> =
            vec![Arc::new(Chain::single(Arc::new(Component::exact(10.0))))];
        let mut rng = StdRng::seed_from_u64(1);

        let stats = search.monte_carlo_stats_with_rng(&exact, 1000, &mut rng).unwrap();
        assert_eq!(stats.mean, 10.0);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!((stats.q25, stats.median, stats.q75), (10.0, 10.0, 10.0));

        assert!(matches!(
            search.monte_carlo_stats_with_rng(&exact, 2, &mut rng),
            Err(Error::InsufficientSamples {
                requested: 2,
                required: 3
            })
        ));

        // Samples of a toleranced component stay within its bounds
        let toleranced: Vec<Arc<dyn Value>> = vec![Arc::new(Component::new(10.0, 0.1).unwrap())];
        let stats = search.monte_carlo_stats_with_rng(&toleranced, 10_000, &mut rng).unwrap();
        assert!((stats.mean - 10.0).abs() < 0.05);
        assert!(stats.q25 >= 9.0 && stats.q75 <= 11.0);
        assert!(stats.q25 < stats.median && stats.median < stats.q75);
    }

    #[test]
    fn partitions() {
        #[track_caller]
        fn check(len: usize, parts: usize, exp: &[Range<usize>]) {
            assert_eq!(partition(len, parts), exp);
        }

        check(10, 1, &[0..10]);
        check(10, 3, &[0..4, 4..7, 7..10]);
        check(2, 4, &[0..1, 1..2]);
        check(0, 4, &[]);
    }

    #[test]
    fn nan_scores_rank_last() {
        assert_eq!(relative_error(2.0, f64::NAN), f64::INFINITY);
        assert_eq!(relative_error(-2.0, -1.0), 0.5);
    }
}
