//! ECPF is an exhaustive search engine for picking real-world component values.
//!
//! Given some target value (a resistance, an RC time constant, a divider ratio, ...) and the
//! components which can actually be bought (e.g. the E12 series of resistors at ±5%), ECPF
//! enumerates every way of choosing and combining those components and returns the combinations
//! which get closest to the target.  It then answers the question of how close a chosen
//! combination will be _in reality_, once the tolerance of every part is taken into account:
//! analytically (the worst-case interval) and statistically (Monte Carlo sampling).
//!
//! # Description
//!
//! The building blocks, from the bottom up:
//!
//! - A [`Component`] is a single part with a nominal value and a symmetric tolerance.
//! - A [`Chain`] joins several [`Value`]s together with pairwise [`Reducer`]s, for example 'these
//!   two resistors in series, and then that one in parallel'.  A [`Chain`] is itself a [`Value`],
//!   so chains compose.
//! - A [`Permutator`] enumerates values.  [`ComponentPermutator`] turns a list of magnitudes into
//!   [`Component`]s; [`ChainPermutator`] enumerates every choice of values for its sources combined
//!   in every order of the available [`Reducer`]s.
//! - A [`Search`] (built with a [`SearchBuilder`]) takes one [`Permutator`] per 'slot', scores
//!   every combination of one value per slot with a user-supplied [`ScoreFn`], discards
//!   combinations rejected by any [`Filter`] and keeps the best few, ranked by relative error to
//!   the target.
//!
//! Nothing here is clever about the search itself: the whole search space is enumerated.  The
//! spaces involved are normally small enough (a few million combinations at most) that this takes
//! seconds, and being exhaustive means the best results really are the best.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use ecpf::{
//!     ChainPermutator, ComponentKind, ComponentPermutator, ESeries, Permutator, ScoreFn,
//!     SearchBuilder,
//! };
//!
//! // Two E6 resistors between 1k and 680k, joined in series or in parallel
//! let resistors: Arc<dyn Permutator> =
//!     Arc::new(ComponentPermutator::new(ESeries::E6.over_decades(3..=5), 0.05)?);
//! let pair: Arc<dyn Permutator> = Arc::new(ChainPermutator::new(
//!     vec![resistors.clone(), resistors],
//!     ComponentKind::Resistor.reducers(),
//! )?);
//!
//! let mut search = SearchBuilder::new(12_345.0, vec![pair], ScoreFn::new(1, |v| v[0]))
//!     .capacity(5)
//!     .build()?;
//! search.run()?;
//! let (best_value, _best_parts) = search.iter_results().next().unwrap();
//! assert!((best_value - 12_345.0).abs() / 12_345.0 < 0.01);
//! # Ok::<(), ecpf::Error>(())
//! ```

#![deny(clippy::all)]
#![deny(rustdoc::broken_intra_doc_links, rustdoc::private_intra_doc_links)]

mod chain;
pub mod configuration;
pub mod e_series;
mod error;
mod permutator;
mod search;
pub mod stats;
mod value;

pub use chain::{Chain, Reducer};
pub use configuration::ComponentKind;
pub use e_series::ESeries;
pub use error::{Error, FnError, Result};
pub use permutator::{ChainPermutator, ComponentPermutator, Magnitudes, OneShot, Permutator};
pub use search::{
    Bounds, Candidate, Config, Filter, Progress, ScoreFn, Search, SearchBuilder, DEFAULT_CAPACITY,
};
pub use value::{Component, Interval, Value};
