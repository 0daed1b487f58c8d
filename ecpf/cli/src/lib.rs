//! Crate for loading and running ECPF's query files.  The CLI itself is a very thin wrapper around
//! this crate, parsing CLI args and immediately calling into [`run`].

#![deny(clippy::all)]

pub mod args;
pub mod diagram;
pub mod logging;
pub mod toml_file;
mod utils;

use std::{
    path::Path,
    str::FromStr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use colored::Colorize;
use ecpf::stats::{MonteCarloStats, DEFAULT_NUM_SAMPLES};
use log::{log_enabled, LevelFilter};
use simple_logger::SimpleLogger;

use crate::{
    args::Options,
    logging::{histogram, result_details, Analysis, ResultTable, HISTOGRAM_BINS},
    toml_file::{Query, TomlFile},
};

pub fn init_logging(log_level: LevelFilter) -> anyhow::Result<()> {
    SimpleLogger::new()
        .without_timestamps()
        .with_colors(true)
        .with_level(log_level)
        .init()?;
    Ok(())
}

pub fn run(input_file: &Path, options: &Options) -> anyhow::Result<Option<QueryResult>> {
    let start_time = Instant::now();

    /// If the user specifies a [`DebugOption`] flag with e.g. `-D toml`, then debug print the
    /// corresponding value and exit.
    macro_rules! debug_print {
        ($variant: ident, $val: expr) => {
            if options.debug_option == Some(DebugOption::$variant) {
                dbg!($val);
                return Ok(None);
            }
        };
    }

    // Parse & debug print the TOML file specifying the query
    let toml_file = TomlFile::from_file(input_file)?;
    debug_print!(Toml, toml_file);

    // Convert the `TomlFile` into a `Search`
    log::debug!("Building search");
    let Query {
        mut search,
        slot_names,
    } = toml_file.to_query(options)?;
    debug_print!(Search, &search);

    // Run the search, stopping early if the user presses ctrl-C
    let abort_flag = Arc::new(AtomicBool::new(false));
    let handler_flag = abort_flag.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_flag.store(true, Ordering::Relaxed)) {
        log::warn!("Can't install ctrl-C handler ({}), so the search can't be aborted", e);
    }
    search.run_with_abort(&abort_flag)?;
    if search.was_aborted() {
        log::warn!("Results only cover the combinations tested before ctrl-C");
    }

    // Analyse every result
    let num_samples = options.samples.unwrap_or(DEFAULT_NUM_SAMPLES);
    let mut analyses = Vec::with_capacity(search.results().len());
    for candidate in search.results() {
        let bounds = search.theoretical_bounds(&candidate.values)?;
        let (stats, histogram) = if options.no_stats {
            (None, None)
        } else {
            let mut rng = rand::thread_rng();
            let samples = search.monte_carlo_samples(&candidate.values, num_samples, &mut rng)?;
            let stats = MonteCarloStats::from_samples(&samples)?;
            let hist =
                log_enabled!(log::Level::Debug).then(|| histogram(&samples, HISTOGRAM_BINS));
            (Some(stats), hist)
        };
        analyses.push(Analysis {
            bounds,
            stats,
            histogram,
        });
    }

    Ok(Some(QueryResult {
        search,
        slot_names,
        analyses,
        draw_diagrams: !options.no_diagrams,
        duration: Instant::now() - start_time,
    }))
}

#[derive(Debug)]
pub struct QueryResult {
    pub search: ecpf::Search,
    pub slot_names: Vec<String>,
    /// One [`Analysis`] per result, in the same order as [`Search::results`](ecpf::Search::results)
    pub analyses: Vec<Analysis>,
    pub draw_diagrams: bool,
    pub duration: Duration,
}

impl QueryResult {
    pub fn print(&self) -> anyhow::Result<()> {
        let results = self.search.results();
        if results.is_empty() {
            println!("{}", "No combinations found".red().bold());
            return Ok(());
        }

        println!("{}", ResultTable::new(&self.search, &self.slot_names).to_table_string());
        println!();
        for (idx, (candidate, analysis)) in results.iter().zip(&self.analyses).enumerate() {
            let details =
                result_details(idx, candidate, analysis, &self.slot_names, self.draw_diagrams)?;
            println!("{}", details);
        }
        println!("Query completed in {:.2?}", self.duration);
        Ok(())
    }
}

/// What item should be debug printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugOption {
    Toml,
    /// Print the search which would be run, then stop before running it
    Search,
}

impl FromStr for DebugOption {
    type Err = String;

    fn from_str(v: &str) -> Result<Self, String> {
        Ok(match v.to_lowercase().as_str() {
            "toml" => Self::Toml,
            "search" => Self::Search,
            _ => {
                return Err(format!(
                    "Unknown value {:?}. Expected `toml` or `search`.",
                    v
                ))
            }
        })
    }
}
