//! [`Permutator`]s: things which enumerate [`Value`]s.

use std::{
    fmt::{Debug, Formatter},
    sync::{Arc, Mutex, PoisonError},
};

use itertools::Itertools;

use crate::{value::check_tolerance, Chain, Component, Error, Reducer, Result, Value};

/// Something which can enumerate [`Value`]s.  A `Permutator` is used as one 'slot' of a
/// [`Search`](crate::Search), or as one of the sources of a [`ChainPermutator`].
pub trait Permutator: Debug + Send + Sync {
    /// The number of [`Value`]s which [`Permutator::values`] will yield
    fn count(&self) -> usize;

    /// Iterate over every [`Value`] of this `Permutator`
    fn values(&self) -> Box<dyn Iterator<Item = Arc<dyn Value>> + '_>;
}

////////////////
// MAGNITUDES //
////////////////

type MagnitudeIter = Box<dyn Iterator<Item = f64> + Send>;

/// A sequence of raw magnitudes (e.g. resistances) from which [`Component`]s are made.
pub enum Magnitudes {
    /// A fixed list of magnitudes, which can be iterated over any number of times
    Fixed(Vec<f64>),
    /// A function which produces a fresh iterator every time it's called.  Also repeatable.
    Generated(Arc<dyn Fn() -> MagnitudeIter + Send + Sync>),
    /// An iterator which can only be traversed once.  [`Magnitudes::count`] buffers the iterator so
    /// that no values are lost, but any pass after the first will be empty.
    OneShot(Mutex<OneShot>),
}

/// The state of a [`Magnitudes::OneShot`] sequence
pub enum OneShot {
    Fresh(MagnitudeIter),
    /// The iterator was drained by [`Magnitudes::count`], but its values haven't been used yet
    Buffered(Vec<f64>),
    Consumed,
}

impl Magnitudes {
    pub fn generated<I>(producer: impl Fn() -> I + Send + Sync + 'static) -> Self
    where
        I: IntoIterator<Item = f64>,
        I::IntoIter: Send + 'static,
    {
        Magnitudes::Generated(Arc::new(move || Box::new(producer().into_iter())))
    }

    pub fn one_shot<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = f64>,
        I::IntoIter: Send + 'static,
    {
        Magnitudes::OneShot(Mutex::new(OneShot::Fresh(Box::new(iter.into_iter()))))
    }

    /// Returns `true` if these `Magnitudes` can be iterated over more than once
    pub fn is_repeatable(&self) -> bool {
        !matches!(self, Magnitudes::OneShot(_))
    }

    /// The number of magnitudes in this sequence.  For [`Magnitudes::Generated`], this runs the
    /// producer to completion.
    pub fn count(&self) -> usize {
        match self {
            Magnitudes::Fixed(values) => values.len(),
            Magnitudes::Generated(producer) => producer().count(),
            Magnitudes::OneShot(state) => {
                let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                match &mut *state {
                    OneShot::Fresh(iter) => {
                        let values = iter.collect::<Vec<_>>();
                        let len = values.len();
                        *state = OneShot::Buffered(values);
                        len
                    }
                    OneShot::Buffered(values) => values.len(),
                    OneShot::Consumed => 0,
                }
            }
        }
    }

    /// Iterate over the magnitudes.  A [`Magnitudes::OneShot`] sequence will yield nothing after
    /// the first call.
    pub fn iter(&self) -> Box<dyn Iterator<Item = f64> + '_> {
        match self {
            Magnitudes::Fixed(values) => Box::new(values.iter().copied()),
            Magnitudes::Generated(producer) => producer(),
            Magnitudes::OneShot(state) => {
                let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                let taken = std::mem::replace(&mut *state, OneShot::Consumed);
                drop(state);
                match taken {
                    OneShot::Fresh(iter) => iter,
                    OneShot::Buffered(values) => Box::new(values.into_iter()),
                    OneShot::Consumed => {
                        log::warn!("One-shot magnitudes iterated more than once; yielding nothing");
                        Box::new(std::iter::empty())
                    }
                }
            }
        }
    }
}

impl From<Vec<f64>> for Magnitudes {
    fn from(values: Vec<f64>) -> Self {
        Magnitudes::Fixed(values)
    }
}

impl From<&[f64]> for Magnitudes {
    fn from(values: &[f64]) -> Self {
        Magnitudes::Fixed(values.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for Magnitudes {
    fn from(values: [f64; N]) -> Self {
        Magnitudes::Fixed(values.to_vec())
    }
}

impl Debug for Magnitudes {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Magnitudes::Fixed(values) => f.debug_tuple("Fixed").field(values).finish(),
            Magnitudes::Generated(_) => write!(f, "Generated(..)"),
            Magnitudes::OneShot(_) => write!(f, "OneShot(..)"),
        }
    }
}

///////////////
// COMPONENT //
///////////////

/// A [`Permutator`] which yields one [`Component`] per magnitude, all with the same tolerance
#[derive(Debug)]
pub struct ComponentPermutator {
    magnitudes: Magnitudes,
    tolerance: f64,
}

impl ComponentPermutator {
    pub fn new(magnitudes: impl Into<Magnitudes>, tolerance: f64) -> Result<Self> {
        check_tolerance(tolerance)?;
        Ok(Self {
            magnitudes: magnitudes.into(),
            tolerance,
        })
    }

    pub fn magnitudes(&self) -> &Magnitudes {
        &self.magnitudes
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

impl Permutator for ComponentPermutator {
    fn count(&self) -> usize {
        self.magnitudes.count()
    }

    fn values(&self) -> Box<dyn Iterator<Item = Arc<dyn Value>> + '_> {
        let tolerance = self.tolerance;
        Box::new(self.magnitudes.iter().map(move |nominal| {
            Arc::new(Component::new_unchecked(nominal, tolerance)) as Arc<dyn Value>
        }))
    }
}

///////////
// CHAIN //
///////////

/// A [`Permutator`] which yields every [`Chain`] made by picking one value from each of its
/// sources, joined by every ordered selection (without repetition) of reducers from its pool.
///
/// Chains are yielded with the choice of source values in the outer loop (the last source varying
/// fastest) and the choice of reducers in the inner loop.
#[derive(Debug)]
pub struct ChainPermutator {
    sources: Vec<Arc<dyn Permutator>>,
    reducer_pool: Vec<Reducer>,
}

impl ChainPermutator {
    pub fn new(sources: Vec<Arc<dyn Permutator>>, reducer_pool: Vec<Reducer>) -> Result<Self> {
        if sources.is_empty() {
            return Err(Error::invalid(
                "sources",
                "a chain permutator needs at least one source",
            ));
        }
        Ok(Self {
            sources,
            reducer_pool,
        })
    }

    /// Number of reducers in each generated [`Chain`]
    fn chain_reducers(&self) -> usize {
        self.sources.len() - 1
    }
}

impl Permutator for ChainPermutator {
    fn count(&self) -> usize {
        let num_value_choices = self
            .sources
            .iter()
            .fold(1usize, |acc, s| acc.saturating_mul(s.count()));
        num_value_choices.saturating_mul(num_permutations(
            self.reducer_pool.len(),
            self.chain_reducers(),
        ))
    }

    fn values(&self) -> Box<dyn Iterator<Item = Arc<dyn Value>> + '_> {
        let reducer_orders: Arc<[Vec<Reducer>]> =
            reducer_permutations(&self.reducer_pool, self.chain_reducers()).into();
        let source_values = read_each_once(&self.sources);
        let chains = source_values
            .into_iter()
            .map(Vec::into_iter)
            .multi_cartesian_product()
            .flat_map(move |members| {
                let reducer_orders = reducer_orders.clone();
                (0..reducer_orders.len()).map(move |i| {
                    let chain = Chain::new_unchecked(members.clone(), reducer_orders[i].clone());
                    Arc::new(chain) as Arc<dyn Value>
                })
            });
        Box::new(chains)
    }
}

/// Collect the values of every permutator in `sources`.  A permutator which appears more than once
/// (by [`Arc::ptr_eq`]) is only read the first time, and its values are reused for every later
/// position.  This matters for one-shot sources, where a second read would yield nothing.
pub(crate) fn read_each_once(sources: &[Arc<dyn Permutator>]) -> Vec<Vec<Arc<dyn Value>>> {
    let mut values: Vec<Vec<Arc<dyn Value>>> = Vec::with_capacity(sources.len());
    for (idx, source) in sources.iter().enumerate() {
        let first_use = sources[..idx].iter().position(|s| Arc::ptr_eq(s, source));
        let source_values = match first_use {
            Some(first_idx) => values[first_idx].clone(),
            None => source.values().collect_vec(),
        };
        values.push(source_values);
    }
    values
}

/// `P(n, r) = n! / (n - r)!`, saturating on overflow
fn num_permutations(n: usize, r: usize) -> usize {
    if r > n {
        return 0;
    }
    (n - r + 1..=n).fold(1usize, |acc, x| acc.saturating_mul(x))
}

/// Every ordered selection of `r` distinct reducers from `pool`, in lexicographic order of pool
/// index.  Choosing 0 reducers gives exactly one (empty) selection.
fn reducer_permutations(pool: &[Reducer], r: usize) -> Vec<Vec<Reducer>> {
    if r == 0 {
        return vec![vec![]];
    }
    pool.iter().cloned().permutations(r).collect()
}
