//! Error types for the different ways that ECPF can fail.

use std::fmt::{Display, Formatter};

use itertools::Itertools;

#[allow(unused_imports)] // Only used for doc comments
use crate::{Chain, Component, Filter, ScoreFn, SearchBuilder};

/// Alias for `Result<T, ecpf::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type returned by fallible [`ScoreFn`]s and [`Filter`]s.
pub type FnError = Box<dyn std::error::Error + Send + Sync>;

/// The different ways that ECPF can fail.
#[derive(Debug)]
pub enum Error {
    /* CONSTRUCTION ERRORS */
    /// Some parameter was out of range, e.g. a negative tolerance on a [`Component`], a
    /// [`SearchBuilder`] with no slots or a [`Chain`] with the wrong number of reducers
    InvalidParameter { name: &'static str, reason: String },
    /// A [`ScoreFn`] or [`Filter`] takes a different number of arguments to the number of values
    /// it's being given
    ArityMismatch {
        function: String,
        expected: usize,
        found: usize,
    },

    /* SEARCH ERRORS */
    /// A [`ScoreFn`] or [`Filter`] returned an error.  This aborts the search.
    Callback {
        function: String,
        args: Vec<f64>,
        source: FnError,
    },
    /// The OS refused to give us a worker thread
    WorkerSpawn(std::io::Error),

    /* STATISTICS ERRORS */
    /// Monte Carlo statistics were requested with too few samples to compute skewness
    InsufficientSamples { requested: usize, required: usize },
}

impl Error {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            /* CONSTRUCTION ERRORS */
            Error::InvalidParameter { name, reason } => {
                write!(f, "Invalid value for `{}`: {}", name, reason)
            }
            Error::ArityMismatch {
                function,
                expected,
                found,
            } => write!(
                f,
                "{} expects {} value(s), but was given {}",
                function, expected, found
            ),

            /* SEARCH ERRORS */
            Error::Callback {
                function,
                args,
                source,
            } => write!(
                f,
                "{} failed on ({}): {}",
                function,
                args.iter().join(", "),
                source
            ),
            Error::WorkerSpawn(e) => write!(f, "Couldn't spawn search worker thread: {}", e),

            /* STATISTICS ERRORS */
            Error::InsufficientSamples {
                requested,
                required,
            } => write!(
                f,
                "Monte Carlo statistics need at least {} samples, but only {} were requested",
                required, requested
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Callback { source, .. } => Some(source.as_ref()),
            Error::WorkerSpawn(e) => Some(e),
            _ => None,
        }
    }
}
