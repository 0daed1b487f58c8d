//! ASCII-art diagrams of how the members of a [`Chain`] are wired together.

use anyhow::bail;
use ecpf::{
    configuration::{PARALLEL, SERIES},
    Chain,
};
use ecpf_utils::Eng;

use crate::logging::{push_multiple, write_centered_text};

/// Draw `chain` as a column of boxes, one per member, joined in series or parallel.  Each line of
/// the diagram has the same width.  Members which are themselves chains are drawn as a single
/// box showing their nominal value.
///
/// Fails if any reducer isn't named `series` or `parallel`, since there's no way to draw it.
pub fn chain_diagram(chain: &Chain) -> anyhow::Result<String> {
    let labels = chain
        .members()
        .iter()
        .map(|m| Eng(m.nominal()).to_string())
        .collect::<Vec<_>>();
    let box_width = labels.iter().map(String::len).max().unwrap_or(0) + 4;

    // `joins_parallel[i]` is `true` if member `i` is joined in parallel to the member before it.
    // The first member has nothing before it, and nothing follows the last.
    let mut joins_parallel = vec![false];
    for reducer in chain.reducers() {
        joins_parallel.push(match reducer.name() {
            PARALLEL => true,
            SERIES => false,
            name => bail!(
                "Can't draw reducer `{}`; only `{}` and `{}` can be drawn",
                name,
                SERIES,
                PARALLEL
            ),
        });
    }
    joins_parallel.push(false);

    let mut lines = Vec::new();
    for (label, flags) in labels.iter().zip(joins_parallel.windows(2)) {
        let (prev_parallel, next_parallel) = (flags[0], flags[1]);
        lines.extend(component_box(label, box_width, prev_parallel, next_parallel));
        if next_parallel {
            lines.push(padded_line('|', ' ', box_width, '|'));
        } else {
            lines.push(padded_line(' ', ' ', box_width, '|'));
            lines.push(padded_line('+', '-', box_width, '+'));
            lines.push(padded_line('|', ' ', box_width, ' '));
        }
    }
    Ok(lines.join("\n"))
}

/// Three lines drawing one component, with rails on the left (to the previous member if joined in
/// parallel) and on the right (to the next member if joined in parallel)
fn component_box(
    label: &str,
    width: usize,
    prev_parallel: bool,
    next_parallel: bool,
) -> [String; 3] {
    let mut top = String::from("|      +");
    push_multiple('-', width, &mut top);
    top.push_str("+      ");
    top.push(if prev_parallel { '|' } else { ' ' });

    let mut middle = String::from("+------+");
    write_centered_text(&mut middle, label, width);
    middle.push_str("+------+");

    let mut bottom = String::new();
    bottom.push(if next_parallel { '|' } else { ' ' });
    bottom.push_str("      +");
    push_multiple('-', width, &mut bottom);
    bottom.push_str("+      |");

    [top, middle, bottom]
}

/// A line as wide as a [`component_box`], made of `fill` between the given end characters
fn padded_line(left: char, fill: char, width: usize, right: char) -> String {
    let mut line = String::new();
    line.push(left);
    push_multiple(fill, width + 14, &mut line);
    line.push(right);
    line
}
