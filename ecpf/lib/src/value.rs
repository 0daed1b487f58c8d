//! The [`Value`] trait, and the leaf implementation of it: a single [`Component`].

use std::fmt::{Debug, Display, Formatter};

use ecpf_utils::Eng;
use rand::{Rng, RngCore};

use crate::{Chain, Error, Result};

/// Anything which has a nominal value, a worst-case range and can be randomly sampled within that
/// range.  Implemented by single [`Component`]s and by [`Chain`]s of other `Value`s, so that both
/// can be treated identically by a [`Search`](crate::Search).
pub trait Value: Debug + Send + Sync {
    /// The value this would have if every part was exactly at its nominal value
    fn nominal(&self) -> f64;

    /// The range which this value is guaranteed to be within, given the tolerances of its parts
    fn interval(&self) -> Interval;

    /// Draw one random realisation of this value, with every underlying part sampled
    /// independently and uniformly from within its tolerance
    fn sample(&self, rng: &mut dyn RngCore) -> f64;

    /// If this `Value` is a [`Chain`], return it.  Used by code which wants to display how a value
    /// is built up from its parts.
    fn as_chain(&self) -> Option<&Chain> {
        None
    }
}

/// A closed range `[min, max]` of `f64`s
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    /// Creates an `Interval` covering both `a` and `b`, in whichever order they are given
    pub fn new(a: f64, b: f64) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// The `[min, max]` endpoints as an array, `min` first
    pub fn endpoints(self) -> [f64; 2] {
        [self.min, self.max]
    }

    /// Uniformly sample a number from `[min, max)`.  A zero-width `Interval` always returns `min`.
    pub fn sample(self, rng: &mut dyn RngCore) -> f64 {
        if self.min < self.max {
            rng.gen_range(self.min..self.max)
        } else {
            self.min
        }
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", Eng(self.min), Eng(self.max))
    }
}

///////////////
// COMPONENT //
///////////////

/// A single physical part, e.g. a 4.7kΩ resistor with ±1% tolerance.  `Component`s are immutable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Component {
    nominal: f64,
    /// Symmetric tolerance, as a fraction of `nominal` (so `0.01` means ±1%)
    tolerance: f64,
}

impl Component {
    /// Creates a new `Component`, failing if `tolerance` is negative or not finite
    pub fn new(nominal: f64, tolerance: f64) -> Result<Self> {
        check_tolerance(tolerance)?;
        Ok(Self::new_unchecked(nominal, tolerance))
    }

    /// Creates a `Component` with no tolerance
    pub fn exact(nominal: f64) -> Self {
        Self::new_unchecked(nominal, 0.0)
    }

    /// Creates a `Component` whose tolerance has already been checked by [`check_tolerance`]
    pub(crate) fn new_unchecked(nominal: f64, tolerance: f64) -> Self {
        Self { nominal, tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// `nominal * (1 - tolerance)`
    pub fn min(&self) -> f64 {
        self.nominal * (1.0 - self.tolerance)
    }

    /// `nominal * (1 + tolerance)`
    pub fn max(&self) -> f64 {
        self.nominal * (1.0 + self.tolerance)
    }
}

impl Value for Component {
    fn nominal(&self) -> f64 {
        self.nominal
    }

    fn interval(&self) -> Interval {
        Interval::new(self.min(), self.max())
    }

    fn sample(&self, rng: &mut dyn RngCore) -> f64 {
        self.interval().sample(rng)
    }
}

impl Display for Component {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Eng(self.nominal))?;
        if self.tolerance > 0.0 {
            let percent = format!("{:.4}", self.tolerance * 100.0);
            write!(f, " ±{}%", percent.trim_end_matches('0').trim_end_matches('.'))?;
        }
        Ok(())
    }
}

/// Check that a tolerance fraction can be used to build [`Component`]s
pub(crate) fn check_tolerance(tolerance: f64) -> Result<()> {
    if tolerance.is_finite() && tolerance >= 0.0 {
        Ok(())
    } else {
        Err(Error::invalid(
            "tolerance",
            format!("must be a non-negative number, not {}", tolerance),
        ))
    }
}
