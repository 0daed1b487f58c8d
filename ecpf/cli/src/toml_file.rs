//! The format of ECPF's query files, and the code to turn them into [`Search`]es.

use std::{f64::consts::PI, path::Path, sync::Arc};

use anyhow::{anyhow, bail, Context};
use ecpf::{
    ChainPermutator, ComponentKind, ComponentPermutator, Config, ESeries, Filter, Permutator,
    ScoreFn, Search, SearchBuilder,
};
use itertools::Itertools;
use serde::Deserialize;

use crate::{
    args::Options,
    utils::{default_num_results, get_one, parse_toml, read_file_to_string},
};

/// The description of a search, parsed directly from the TOML file.  Like an AST, this allows a
/// superset of valid searches, so lowering it into a [`Search`] can also fail.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlFile {
    /* GENERAL */
    /// The value which the calculation should get as close as possible to
    target: EngValue,
    /// How many of the best combinations to keep
    #[serde(default = "default_num_results")]
    num_results: usize,

    /* CALCULATION */
    /// How each combination of slot values is turned into a single value
    #[serde(default)]
    calculation: Calculation,
    /// Constant factor applied to the result of `calculation`
    #[serde(default = "get_one")]
    scale: f64,

    /* FILTERS */
    /// If set, the nominal values of the slots must sum to less than this
    max_total: Option<EngValue>,
    /// If set, the nominal values of the slots must sum to at least this
    min_total: Option<EngValue>,

    /* SLOTS */
    slots: Vec<TomlSlot>,
}

/// One independent dimension of the search, e.g. 'the resistor on the top of the divider'
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlSlot {
    /// Name used when printing results.  Defaults to e.g. `R1` for the first slot if it's a
    /// resistor.
    name: Option<String>,
    #[serde(default)]
    kind: TomlKind,
    /// Which ways the components can be combined.  Defaults to `["series", "parallel"]`.
    #[serde(default = "default_configurations")]
    configurations: Vec<String>,
    /// The groups of components which make up this slot.  Each result will use one component from
    /// each group.
    components: Vec<TomlComponents>,
}

/// A group of available components with the same tolerance
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlComponents {
    /// Name of an E series to take values from (e.g. `"E12"`)
    series: Option<String>,
    /// Powers of ten applied to the values of `series`
    #[serde(default)]
    decades: Vec<i32>,
    /// Explicit component values, added after the values from `series`
    #[serde(default)]
    values: Vec<EngValue>,
    /// Tolerance as a fraction (`0.01` means ±1%)
    #[serde(default)]
    tolerance: f64,
}

/// A number which can either be written as a TOML number (`4700`) or as a string in engineering
/// notation (`"4k7"`)
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EngValue {
    Number(f64),
    Text(String),
}

impl EngValue {
    pub fn value(&self) -> anyhow::Result<f64> {
        match self {
            EngValue::Number(v) => Ok(*v),
            EngValue::Text(s) => {
                ecpf_utils::parse_eng(s).with_context(|| format!("Invalid value {:?}", s))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TomlKind {
    #[default]
    Resistor,
    Capacitor,
    Inductor,
}

impl TomlKind {
    fn symbol(self) -> char {
        match self {
            TomlKind::Resistor => 'R',
            TomlKind::Capacitor => 'C',
            TomlKind::Inductor => 'L',
        }
    }
}

impl From<TomlKind> for ComponentKind {
    fn from(k: TomlKind) -> Self {
        match k {
            TomlKind::Resistor => ComponentKind::Resistor,
            TomlKind::Capacitor => ComponentKind::Capacitor,
            TomlKind::Inductor => ComponentKind::Inductor,
        }
    }
}

/// The built-in calculations which can be used to score combinations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Calculation {
    /// Product of every slot
    #[default]
    Product,
    /// Sum of every slot
    Sum,
    /// `a / b`
    Ratio,
    /// `a / (a + b)`, the fraction of the total across `a`
    Divider,
    /// `1 / (2π R C)`, the cutoff frequency of an RC filter
    RcCutoff,
    /// `1 / (2π √(L C))`, the resonant frequency of an LC tank
    LcResonance,
}

impl Calculation {
    /// The number of slots required, or `None` if any number of slots is allowed
    fn required_slots(self) -> Option<usize> {
        match self {
            Calculation::Product | Calculation::Sum => None,
            Calculation::Ratio
            | Calculation::Divider
            | Calculation::RcCutoff
            | Calculation::LcResonance => Some(2),
        }
    }

    /// Create the [`ScoreFn`] for this calculation over `num_slots` slots
    fn score_fn(self, num_slots: usize, scale: f64) -> anyhow::Result<ScoreFn> {
        if let Some(required) = self.required_slots() {
            if num_slots != required {
                bail!(
                    "Calculation `{:?}` needs exactly {} slots, but {} were given",
                    self,
                    required,
                    num_slots
                );
            }
        }
        let func: fn(&[f64]) -> f64 = match self {
            Calculation::Product => |v| v.iter().product(),
            Calculation::Sum => |v| v.iter().sum(),
            Calculation::Ratio => |v| v[0] / v[1],
            Calculation::Divider => |v| v[0] / (v[0] + v[1]),
            Calculation::RcCutoff => |v| 1.0 / (2.0 * PI * v[0] * v[1]),
            Calculation::LcResonance => |v| 1.0 / (2.0 * PI * (v[0] * v[1]).sqrt()),
        };
        Ok(ScoreFn::new(num_slots, move |v| scale * func(v)))
    }
}

impl TomlFile {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let toml_string = read_file_to_string(path)?;
        parse_toml(&toml_string)
    }

    /// Lower this `TomlFile` into a [`Search`] which is ready to run
    pub fn to_query(&self, options: &Options) -> anyhow::Result<Query> {
        if self.slots.is_empty() {
            bail!("Query must have at least one `[[slots]]` entry");
        }
        let num_slots = self.slots.len();

        let mut slot_names = Vec::with_capacity(num_slots);
        let mut permutators = Vec::<Arc<dyn Permutator>>::with_capacity(num_slots);
        for (idx, slot) in self.slots.iter().enumerate() {
            let name = slot
                .name
                .clone()
                .unwrap_or_else(|| format!("{}{}", slot.kind.symbol(), idx + 1));
            let permutator = slot
                .to_permutator()
                .with_context(|| format!("Error in slot {:?}", name))?;
            slot_names.push(name);
            permutators.push(Arc::new(permutator));
        }

        let target = self.target.value().context("Error in `target`")?;
        let mut builder = SearchBuilder::new(
            target,
            permutators,
            self.calculation.score_fn(num_slots, self.scale)?,
        )
        .capacity(options.num_results.unwrap_or(self.num_results))
        .config(Config {
            num_threads: options.num_threads,
        });
        if let Some(max_total) = &self.max_total {
            let max_total = max_total.value().context("Error in `max_total`")?;
            builder = builder.filter(Filter::new(num_slots, move |v| {
                v.iter().sum::<f64>() < max_total
            }));
        }
        if let Some(min_total) = &self.min_total {
            let min_total = min_total.value().context("Error in `min_total`")?;
            builder = builder.filter(Filter::new(num_slots, move |v| {
                v.iter().sum::<f64>() >= min_total
            }));
        }

        Ok(Query {
            search: builder.build()?,
            slot_names,
        })
    }
}

impl TomlSlot {
    fn to_permutator(&self) -> anyhow::Result<ChainPermutator> {
        let kind = ComponentKind::from(self.kind);
        let reducers = self
            .configurations
            .iter()
            .map(|name| {
                kind.reducer(name).ok_or_else(|| {
                    anyhow!(
                        "Unknown configuration {:?}. Expected `series` or `parallel`.",
                        name
                    )
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        if let Some(dup) = self.configurations.iter().duplicates().next() {
            bail!("Configuration {:?} is given more than once", dup);
        }
        if self.components.is_empty() {
            bail!("Slot needs at least one `[[slots.components]]` entry");
        }

        let sources = self
            .components
            .iter()
            .map(|c| -> anyhow::Result<Arc<dyn Permutator>> { Ok(Arc::new(c.to_permutator()?)) })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(ChainPermutator::new(sources, reducers)?)
    }
}

impl TomlComponents {
    fn magnitudes(&self) -> anyhow::Result<Vec<f64>> {
        let mut magnitudes = Vec::new();
        if let Some(series_name) = &self.series {
            let series: ESeries = series_name.parse().map_err(anyhow::Error::msg)?;
            if self.decades.is_empty() {
                bail!("`series = {:?}` needs a list of `decades`", series_name);
            }
            magnitudes.extend(series.over_decades(self.decades.iter().copied()));
        } else if !self.decades.is_empty() {
            bail!("`decades` has no effect without a `series`");
        }
        for v in &self.values {
            magnitudes.push(v.value()?);
        }
        if magnitudes.is_empty() {
            bail!("Components need either a `series` or some `values`");
        }
        Ok(magnitudes)
    }

    fn to_permutator(&self) -> anyhow::Result<ComponentPermutator> {
        Ok(ComponentPermutator::new(self.magnitudes()?, self.tolerance)?)
    }
}

fn default_configurations() -> Vec<String> {
    vec![
        ecpf::configuration::SERIES.to_owned(),
        ecpf::configuration::PARALLEL.to_owned(),
    ]
}

/// A [`Search`] built from a [`TomlFile`], along with the names of its slots
#[derive(Debug)]
pub struct Query {
    pub search: Search,
    pub slot_names: Vec<String>,
}
