//! Standard ways of combining passive components, as [`Reducer`]s.

use crate::Reducer;

/// Name given to the [`Reducer`] for two components in series
pub const SERIES: &str = "series";
/// Name given to the [`Reducer`] for two components in parallel
pub const PARALLEL: &str = "parallel";

/// The kinds of passive component which ECPF knows how to combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Resistor,
    Capacitor,
    Inductor,
}

impl ComponentKind {
    /// The [`Reducer`] for two of these components in series
    pub fn series(self) -> Reducer {
        match self {
            Self::Resistor | Self::Inductor => Reducer::new(SERIES, sum),
            Self::Capacitor => Reducer::new(SERIES, reciprocal_sum),
        }
    }

    /// The [`Reducer`] for two of these components in parallel
    pub fn parallel(self) -> Reducer {
        match self {
            Self::Resistor | Self::Inductor => Reducer::new(PARALLEL, reciprocal_sum),
            Self::Capacitor => Reducer::new(PARALLEL, sum),
        }
    }

    /// Both ways of combining two of these components: `[series, parallel]`
    pub fn reducers(self) -> Vec<Reducer> {
        vec![self.series(), self.parallel()]
    }

    /// Look up a [`Reducer`] by name (either `"series"` or `"parallel"`)
    pub fn reducer(self, name: &str) -> Option<Reducer> {
        match name {
            SERIES => Some(self.series()),
            PARALLEL => Some(self.parallel()),
            _ => None,
        }
    }
}

/// `a + b`: resistors or inductors in series, capacitors in parallel
pub fn sum(a: f64, b: f64) -> f64 {
    a + b
}

/// `a*b / (a+b)`: resistors or inductors in parallel, capacitors in series
pub fn reciprocal_sum(a: f64, b: f64) -> f64 {
    a * b / (a + b)
}
