//! [`Chain`]s of [`Value`]s, joined together by pairwise [`Reducer`]s.

use std::{
    borrow::Cow,
    fmt::{Debug, Display, Formatter},
    sync::{Arc, OnceLock},
};

use ecpf_utils::Eng;
use rand::RngCore;

use crate::{Error, Interval, Result, Value};

/// A named function which combines two values into one, e.g. the formula for two resistors in
/// parallel.  The name is used when displaying [`Chain`]s.
#[derive(Clone)]
pub struct Reducer {
    name: Cow<'static, str>,
    func: Arc<dyn Fn(f64, f64) -> f64 + Send + Sync>,
}

impl Reducer {
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        func: impl Fn(f64, f64) -> f64 + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn apply(&self, lhs: f64, rhs: f64) -> f64 {
        (self.func)(lhs, rhs)
    }
}

impl Debug for Reducer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Reducer").field(&self.name).finish()
    }
}

/// An ordered sequence of [`Value`]s, combined left-to-right by [`Reducer`]s.  For members
/// `[a, b, c]` and reducers `[f, g]`, the value of the `Chain` is `g(f(a, b), c)`.
///
/// A `Chain` is itself a [`Value`], so `Chain`s can be nested.  `Chain`s are immutable, so the
/// (potentially expensive) worst-case [`Interval`] is computed at most once.
pub struct Chain {
    members: Vec<Arc<dyn Value>>,
    /// Always exactly one shorter than `members`
    reducers: Vec<Reducer>,
    interval: OnceLock<Interval>,
}

impl Chain {
    /// Creates a new `Chain`, checking that there is exactly one fewer [`Reducer`] than there are
    /// members.
    pub fn new(members: Vec<Arc<dyn Value>>, reducers: Vec<Reducer>) -> Result<Self> {
        if members.is_empty() {
            return Err(Error::invalid("members", "a chain needs at least one member"));
        }
        if reducers.len() != members.len() - 1 {
            return Err(Error::invalid(
                "reducers",
                format!(
                    "a chain of {} members needs {} reducers, but {} were given",
                    members.len(),
                    members.len() - 1,
                    reducers.len()
                ),
            ));
        }
        Ok(Self::new_unchecked(members, reducers))
    }

    /// A `Chain` containing only one member (and therefore no reducers), which behaves exactly
    /// like that member.
    pub fn single(member: Arc<dyn Value>) -> Self {
        Self::new_unchecked(vec![member], vec![])
    }

    pub(crate) fn new_unchecked(members: Vec<Arc<dyn Value>>, reducers: Vec<Reducer>) -> Self {
        debug_assert!(!members.is_empty());
        debug_assert_eq!(reducers.len() + 1, members.len());
        Self {
            members,
            reducers,
            interval: OnceLock::new(),
        }
    }

    pub fn members(&self) -> &[Arc<dyn Value>] {
        &self.members
    }

    pub fn reducers(&self) -> &[Reducer] {
        &self.reducers
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always `false`; `Chain`s can't be empty
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Fold the reducers over one value per member, given by `member_value`
    fn fold(&self, mut member_value: impl FnMut(&dyn Value) -> f64) -> f64 {
        let mut acc = member_value(self.members[0].as_ref());
        for (member, reducer) in self.members[1..].iter().zip(&self.reducers) {
            acc = reducer.apply(acc, member_value(member.as_ref()));
        }
        acc
    }

    /// Compute the worst-case interval by folding the reducers over every combination of member
    /// endpoints (each member contributes either its min or its max).  This is exact when every
    /// reducer is monotonic in both arguments, and an approximation otherwise.
    ///
    /// The combinations are expanded one member at a time: after processing `i` members, `accs`
    /// holds the partial fold of every one of the `2^i` endpoint combinations so far.  This does
    /// the same work as folding each of the `2^k` combinations separately, but shares the common
    /// prefixes.
    fn compute_interval(&self) -> Interval {
        let mut accs = self.members[0].interval().endpoints().to_vec();
        for (member, reducer) in self.members[1..].iter().zip(&self.reducers) {
            let endpoints = member.interval().endpoints();
            accs = accs
                .iter()
                .flat_map(|&acc| endpoints.iter().map(move |&e| reducer.apply(acc, e)))
                .collect();
        }

        let min = accs.iter().copied().fold(f64::INFINITY, f64::min);
        let max = accs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Interval { min, max }
    }
}

impl Value for Chain {
    fn nominal(&self) -> f64 {
        self.fold(|v| v.nominal())
    }

    fn interval(&self) -> Interval {
        *self.interval.get_or_init(|| self.compute_interval())
    }

    fn sample(&self, rng: &mut dyn RngCore) -> f64 {
        self.fold(|v| v.sample(&mut *rng))
    }

    fn as_chain(&self) -> Option<&Chain> {
        Some(self)
    }
}

impl Debug for Chain {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("members", &self.members)
            .field("reducers", &self.reducers)
            .finish()
    }
}

/// Displays the chain as a fully bracketed expression, e.g. `(1k series 2.2k) parallel 4.7k`.
/// Use `{:#}` to display the chain's nominal value instead.
impl Display for Chain {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            return write!(f, "{}", Eng(self.nominal()));
        }
        // Every reducer after the first wraps everything before it in brackets
        for _ in 1..self.reducers.len() {
            write!(f, "(")?;
        }
        write!(f, "{}", Eng(self.members[0].nominal()))?;
        for (idx, (member, reducer)) in self.members[1..].iter().zip(&self.reducers).enumerate() {
            write!(f, " {} {}", reducer.name(), Eng(member.nominal()))?;
            if idx + 1 < self.reducers.len() {
                write!(f, ")")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::{Component, ComponentKind};

    fn component(nominal: f64, tolerance: f64) -> Arc<dyn Value> {
        Arc::new(Component::new(nominal, tolerance).unwrap())
    }

    #[test]
    fn reducer_count_checked() {
        let series = ComponentKind::Resistor.series();
        let members = vec![component(1.0, 0.0), component(2.0, 0.0)];

        assert!(Chain::new(members.clone(), vec![series.clone()]).is_ok());
        assert!(matches!(
            Chain::new(members.clone(), vec![]),
            Err(Error::InvalidParameter {
                name: "reducers",
                ..
            })
        ));
        assert!(matches!(
            Chain::new(members, vec![series.clone(), series.clone()]),
            Err(Error::InvalidParameter {
                name: "reducers",
                ..
            })
        ));
        assert!(matches!(
            Chain::new(vec![], vec![]),
            Err(Error::InvalidParameter {
                name: "members",
                ..
            })
        ));
    }

    #[test]
    fn single_member_behaves_like_member() {
        let member = Component::new(330.0, 0.1).unwrap();
        let chain = Chain::single(Arc::new(member));

        assert_eq!(chain.nominal(), member.nominal());
        assert_eq!(chain.interval(), member.interval());
        // Both draw exactly one number from the same interval, so identically seeded RNGs must
        // give identical samples
        let mut rng1 = StdRng::seed_from_u64(42);
        let mut rng2 = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            assert_eq!(chain.sample(&mut rng1), member.sample(&mut rng2));
        }
    }

    #[test]
    fn nominal_folds_left_to_right() {
        let sub = Reducer::new("sub", |a, b| a - b);
        let div = Reducer::new("div", |a, b| a / b);
        let chain = Chain::new(
            vec![
                component(10.0, 0.0),
                component(4.0, 0.0),
                component(2.0, 0.0),
            ],
            vec![sub, div],
        )
        .unwrap();
        // (10 - 4) / 2, not 10 - (4 / 2)
        assert_eq!(chain.nominal(), 3.0);
    }

    #[test]
    fn interval_series_parallel() {
        let r = ComponentKind::Resistor;
        // 100 ±10% in series with 200 ±10%
        let series = Chain::new(
            vec![component(100.0, 0.1), component(200.0, 0.1)],
            vec![r.series()],
        )
        .unwrap();
        let Interval { min, max } = series.interval();
        assert!((min - 270.0).abs() < 1e-9);
        assert!((max - 330.0).abs() < 1e-9);

        // 100 ±10% in parallel with 100 ±10%
        let parallel = Chain::new(
            vec![component(100.0, 0.1), component(100.0, 0.1)],
            vec![r.parallel()],
        )
        .unwrap();
        let Interval { min, max } = parallel.interval();
        assert!((min - 45.0).abs() < 1e-9);
        assert!((max - 55.0).abs() < 1e-9);
    }

    #[test]
    fn interval_finds_mixed_endpoints() {
        // `a - b` is smallest when `a` is at its min and `b` is at its max, which a naive
        // 'all mins'/'all maxes' substitution would miss
        let sub = Reducer::new("sub", |a, b| a - b);
        let chain = Chain::new(vec![component(10.0, 0.1), component(5.0, 0.2)], vec![sub]).unwrap();
        let Interval { min, max } = chain.interval();
        assert!((min - 3.0).abs() < 1e-9);
        assert!((max - 7.0).abs() < 1e-9);
    }

    #[test]
    fn nested_chains() {
        let r = ComponentKind::Resistor;
        let inner: Arc<dyn Value> = Arc::new(
            Chain::new(
                vec![component(1000.0, 0.0), component(1000.0, 0.0)],
                vec![r.series()],
            )
            .unwrap(),
        );
        let outer = Chain::new(vec![inner, component(2000.0, 0.0)], vec![r.parallel()]).unwrap();
        assert!((outer.nominal() - 1000.0).abs() < 1e-9);
        assert_eq!(outer.interval(), Interval::new(outer.nominal(), outer.nominal()));
    }

    #[test]
    fn display() {
        let r = ComponentKind::Resistor;
        let chain = Chain::new(
            vec![
                component(1000.0, 0.0),
                component(2200.0, 0.0),
                component(4700.0, 0.0),
            ],
            vec![r.series(), r.parallel()],
        )
        .unwrap();
        assert_eq!(chain.to_string(), "(1k series 2.2k) parallel 4.7k");
        assert_eq!(Chain::single(component(10.0, 0.0)).to_string(), "10");
        assert_eq!(format!("{:#}", Chain::single(component(10.0, 0.0))), "10");
    }

    /// For the (monotonic) series and parallel formulas, the worst-case interval must contain the
    /// nominal value and every sampled value.
    #[quickcheck]
    fn interval_is_sound(
        nominals: (u16, u16),
        tolerances: (u8, u8),
        use_parallel: bool,
        seed: u64,
    ) -> bool {
        let r = ComponentKind::Resistor;
        let to_tolerance = |t: u8| (t % 51) as f64 / 100.0; // [0, 0.5]
        let reducer = if use_parallel { r.parallel() } else { r.series() };
        let chain = Chain::new(
            vec![
                component(nominals.0 as f64 + 1.0, to_tolerance(tolerances.0)),
                component(nominals.1 as f64 + 1.0, to_tolerance(tolerances.1)),
            ],
            vec![reducer],
        )
        .unwrap();

        // Allow for floating point error in the fold
        let Interval { min, max } = chain.interval();
        let slack = max.abs() * 1e-12;
        let in_bounds = |v: f64| min - slack <= v && v <= max + slack;

        let mut rng = StdRng::seed_from_u64(seed);
        in_bounds(chain.nominal()) && (0..10_000).all(|_| in_bounds(chain.sample(&mut rng)))
    }
}
