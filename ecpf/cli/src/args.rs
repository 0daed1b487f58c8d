use std::path::PathBuf;

use log::LevelFilter;
use structopt::StructOpt;

use crate::DebugOption;

/// A struct storing the CLI args taken by ECPF.  `StructOpt` will generate the argument
/// parsing/help code for us.
#[derive(Debug, Clone, StructOpt)]
#[structopt(
    name = "ECPF",
    about = "Find the combinations of real-world components closest to a target value"
)]
pub struct CliArgs {
    /// The name of the query file for ECPF (`*.toml`)
    #[structopt(parse(from_os_str))]
    pub input_file: PathBuf,

    #[structopt(flatten)]
    pub options: Options,

    /// Makes ECPF print more output (`-vv` will produce all output).
    #[structopt(short, long = "verbose", parse(from_occurrences))]
    pub verbosity: usize,
    /// Makes ECPF print less output (`-qq` will only produce errors).
    #[structopt(short, long = "quiet", parse(from_occurrences))]
    pub quietness: usize,
}

// Parameters passed directly into `ecpf_cli::run`.  This isn't a doc-comment because doc comments
// override `#[structopt(about = "...")]`.
#[derive(Default, Debug, Clone, StructOpt)]
pub struct Options {
    /// The maximum number of threads that ECPF will use.  Defaults to one per CPU core.
    #[structopt(short = "T", long)]
    pub num_threads: Option<usize>,
    /// Number of results to keep.  Overrides `num_results` in the query file.
    #[structopt(short = "n", long)]
    pub num_results: Option<usize>,
    /// Number of Monte Carlo samples taken for each result (e.g. `10000` or `500k`).  Defaults to
    /// 500k.
    #[structopt(long, parse(try_from_str = parse_sample_count))]
    pub samples: Option<usize>,
    /// Don't compute Monte Carlo statistics for the results
    #[structopt(long)]
    pub no_stats: bool,
    /// Don't draw diagrams of how each result's components are connected
    #[structopt(long)]
    pub no_diagrams: bool,

    /// Debug options.  `toml` prints the parsed query file, `search` prints the search which
    /// would be run and then stops.
    #[structopt(short = "D", long)]
    pub debug_option: Option<DebugOption>,
}

impl CliArgs {
    /// Parse the `-q`/`-v` args into the [`LevelFilter`] to give to the `log` library
    pub fn log_level(&self) -> LevelFilter {
        match self.verbosity as isize - self.quietness as isize {
            x if x < -2 => LevelFilter::Off, // -qqq (or more `q`s)
            -2 => LevelFilter::Error,        // -qq
            -1 => LevelFilter::Warn,         // -q
            0 => LevelFilter::Info,          // <none of -q or -v>
            1 => LevelFilter::Debug,         // -v
            _ => LevelFilter::Trace,         // -vv (or more `v`s)
        }
    }
}

/// Parse a sample count like `'2000'` or `'500k'`
fn parse_sample_count(s: &str) -> anyhow::Result<usize> {
    let value = ecpf_utils::parse_eng(s)?;
    if value < 0.0 || value.fract() != 0.0 || !value.is_finite() {
        anyhow::bail!("Sample count must be a whole number, not {:?}", s);
    }
    Ok(value as usize)
}
