//! Code for printing the results of a [`Search`] in a human-readable form

use std::fmt::Write;

use colored::{ColoredString, Colorize};
use ecpf::{stats::MonteCarloStats, Bounds, Candidate, Search, Value};
use ecpf_utils::{BigNumInt, Eng};
use itertools::{Itertools, MinMaxResult};
use ordered_float::OrderedFloat;

use crate::diagram::chain_diagram;

/// Number of bars in a histogram of Monte Carlo samples
pub const HISTOGRAM_BINS: usize = 20;
/// Width (in chars) of the longest bar in a histogram
const HISTOGRAM_WIDTH: usize = 50;

/// Prints the results of a [`Search`] as a table, one row per result.  Looks something like:
/// ```text
///  # |  value  |  error  |        R1        | C2
/// ---|---------|---------|------------------|-----
///  1 |  1.001k | 0.0512% | 1k series 2.2k   | 47n
/// ```
pub struct ResultTable<'s> {
    search: &'s Search,
    slot_names: &'s [String],

    /* COLUMN WIDTHS */
    index_width: usize,
    value_width: usize,
    error_width: usize,
    /// For each slot, the max width of the slot's name and its values in every result
    slot_widths: Vec<usize>,
}

impl<'s> ResultTable<'s> {
    pub fn new(search: &'s Search, slot_names: &'s [String]) -> Self {
        let results = search.results();
        let slot_widths = slot_names
            .iter()
            .enumerate()
            .map(|(slot_idx, name)| {
                results
                    .iter()
                    .map(|c| value_string(c.values[slot_idx].as_ref()).len())
                    .fold(name.len(), usize::max)
            })
            .collect_vec();
        Self {
            search,
            slot_names,

            index_width: results.len().to_string().len().max(1),
            value_width: results
                .iter()
                .map(|c| Eng(c.score).to_string().len())
                .fold("value".len(), usize::max),
            error_width: results
                .iter()
                .map(|c| error_string(c.error).len())
                .fold("error".len(), usize::max),
            slot_widths,
        }
    }

    pub fn to_table_string(&self) -> String {
        let mut s = String::new();
        s.push_str(&self.header());
        s.push('\n');
        s.push_str(&self.ruleoff());
        for (idx, candidate) in self.search.results().iter().enumerate() {
            s.push('\n');
            s.push_str(&self.row(idx, candidate));
        }
        s
    }

    fn header(&self) -> String {
        let mut s = String::new();
        write_centered_text(&mut s, "#", self.index_width);
        s.push_str(" | ");
        write_centered_text(&mut s, "value", self.value_width);
        s.push_str(" | ");
        write_centered_text(&mut s, "error", self.error_width);
        for (name, width) in self.slot_names.iter().zip_eq(&self.slot_widths) {
            s.push_str(" | ");
            write_centered_text(&mut s, name, *width);
        }
        s
    }

    fn ruleoff(&self) -> String {
        // Ruleoff is the same as header, but with every non-'|' char replaced with '-'
        self.header()
            .chars()
            .map(|c| if c == '|' { '|' } else { '-' })
            .collect::<String>()
    }

    fn row(&self, idx: usize, candidate: &Candidate) -> String {
        let mut s = String::new();
        write!(s, "{:>width$} | ", idx + 1, width = self.index_width).unwrap();
        write!(s, "{:>width$} | ", Eng(candidate.score), width = self.value_width).unwrap();
        // Pad before colouring, since escape codes would upset the padding
        let error = format!("{:>width$}", error_string(candidate.error), width = self.error_width);
        write!(s, "{}", color_error(&error, candidate.error)).unwrap();
        for (value, width) in candidate.values.iter().zip_eq(&self.slot_widths) {
            write!(s, " | {:<width$}", value_string(value.as_ref()), width = *width).unwrap();
        }
        s.trim_end().to_owned()
    }
}

/// Everything which is known about a single result, beyond its score
#[derive(Debug, Clone)]
pub struct Analysis {
    pub bounds: Bounds,
    pub stats: Option<MonteCarloStats>,
    /// A histogram of the Monte Carlo samples, only generated if debug output is enabled
    pub histogram: Option<String>,
}

/// Describe one result in detail: its bounds, Monte Carlo stats and how its slots are built
pub fn result_details(
    idx: usize,
    candidate: &Candidate,
    analysis: &Analysis,
    slot_names: &[String],
    draw_diagrams: bool,
) -> anyhow::Result<String> {
    let mut s = String::new();
    push_multiple('*', 20, &mut s);
    writeln!(
        s,
        "\nResult #{}: {} ({} from target)",
        idx + 1,
        Eng(candidate.score).to_string().bold(),
        error_string(candidate.error)
    )?;

    // Bounds
    let Bounds {
        min,
        min_args,
        max,
        max_args,
    } = &analysis.bounds;
    writeln!(s, "  theoretical min: {} (at {})", Eng(*min), args_string(min_args))?;
    writeln!(s, "  theoretical max: {} (at {})", Eng(*max), args_string(max_args))?;

    // Stats
    if let Some(stats) = &analysis.stats {
        writeln!(
            s,
            "  Monte Carlo stats of {} samples:",
            BigNumInt(stats.num_samples)
        )?;
        writeln!(s, "      mean:     {}", Eng(stats.mean))?;
        writeln!(s, "      std:      {}", Eng(stats.std_dev))?;
        writeln!(s, "      variance: {:e}", stats.variance)?;
        writeln!(s, "      skewness: {:.4}", stats.skewness)?;
        writeln!(
            s,
            "      q25/q50/q75: {} / {} / {}",
            Eng(stats.q25),
            Eng(stats.median),
            Eng(stats.q75)
        )?;
    }
    if let Some(histogram) = &analysis.histogram {
        s.push_str(histogram);
        s.push('\n');
    }

    // Slots
    for (name, value) in slot_names.iter().zip_eq(&candidate.values) {
        writeln!(s, "  {}: {}", name.bold(), value_string(value.as_ref()))?;
        if let (true, Some(chain)) = (draw_diagrams, value.as_chain()) {
            for line in chain_diagram(chain)?.lines() {
                writeln!(s, "    {}", line)?;
            }
        }
    }
    Ok(s)
}

/// Draw a text histogram of `samples` with `num_bins` bars, each labelled with its lower edge
pub fn histogram(samples: &[f64], num_bins: usize) -> String {
    let (min, max) = match samples.iter().copied().map(OrderedFloat).minmax() {
        MinMaxResult::NoElements => return String::new(),
        MinMaxResult::OneElement(v) => (v.0, v.0),
        MinMaxResult::MinMax(min, max) => (min.0, max.0),
    };
    let num_bins = if min == max { 1 } else { num_bins.max(1) };
    let bin_width = (max - min) / num_bins as f64;

    let mut counts = vec![0usize; num_bins];
    for &x in samples {
        let bin = if bin_width > 0.0 {
            ((x - min) / bin_width) as usize
        } else {
            0
        };
        counts[bin.min(num_bins - 1)] += 1;
    }

    let max_count = counts.iter().copied().max().unwrap_or(0).max(1);
    let labels = (0..num_bins)
        .map(|i| Eng(min + bin_width * i as f64).to_string())
        .collect_vec();
    let label_width = labels.iter().map(String::len).max().unwrap_or(0);
    labels
        .iter()
        .zip_eq(&counts)
        .map(|(label, &count)| {
            let bar_len = count * HISTOGRAM_WIDTH / max_count;
            let mut line = format!("    {:>width$} | ", label, width = label_width);
            push_multiple('#', bar_len, &mut line);
            write!(line, " {}", count).unwrap();
            line
        })
        .join("\n")
}

/// A [`Value`] as a string: the expression for [`Chain`](ecpf::Chain)s, or the nominal value
pub fn value_string(value: &dyn Value) -> String {
    match value.as_chain() {
        Some(chain) => chain.to_string(),
        None => Eng(value.nominal()).to_string(),
    }
}

fn error_string(error: f64) -> String {
    format!("{:.4}%", error * 100.0)
}

fn args_string(args: &[f64]) -> String {
    args.iter().map(|&v| Eng(v)).join(", ")
}

fn color_error(s: &str, error: f64) -> ColoredString {
    if error < 1e-3 {
        s.bright_green()
    } else if error < 1e-2 {
        s.yellow()
    } else {
        s.normal()
    }
}

/// Write `text` into `out`, padded with spaces to be centred in `width` chars
pub(crate) fn write_centered_text(out: &mut String, text: &str, width: usize) {
    let w = width.saturating_sub(text.len());
    push_multiple(' ', w - (w / 2), out);
    out.push_str(text);
    push_multiple(' ', w / 2, out);
}

/// Push `n` copies of `c` to the end of `out`
pub(crate) fn push_multiple(c: char, n: usize, out: &mut String) {
    (0..n).for_each(|_| out.push(c));
}
