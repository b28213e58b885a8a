//! Restriction of a step's global spike list to one monitor's source range.
//!
//! Every function here assumes `spikes` is strictly ascending. That is a
//! precondition on the driver and is not checked.

use std::ops::Range;

use crate::params::ScanStrategy;

/// Positions in `spikes` whose values lie in `source`.
pub fn locate(spikes: &[usize], source: &Range<usize>, strategy: ScanStrategy) -> Range<usize> {
    if spikes.is_empty() || source.is_empty() {
        return 0..0;
    }

    match strategy {
        ScanStrategy::Linear => locate_linear(spikes, source),
        ScanStrategy::Binary => locate_binary(spikes, source),
    }
}

/// Local indices (`nid - source.start`) of all spikes within `source`, ascending.
pub fn filter<'a>(
    spikes: &'a [usize],
    source: &Range<usize>,
    strategy: ScanStrategy,
) -> impl Iterator<Item = usize> + 'a {
    let source_start = source.start;
    spikes[locate(spikes, source, strategy)]
        .iter()
        .map(move |nid| nid - source_start)
}

fn locate_linear(spikes: &[usize], source: &Range<usize>) -> Range<usize> {
    let start_idx = match spikes.iter().position(|nid| *nid >= source.start) {
        Some(start_idx) => start_idx,
        None => return 0..0,
    };

    let end_idx = spikes[start_idx..]
        .iter()
        .position(|nid| *nid >= source.end)
        .map_or(spikes.len(), |offset| start_idx + offset);

    start_idx..end_idx
}

fn locate_binary(spikes: &[usize], source: &Range<usize>) -> Range<usize> {
    let start_idx = spikes.partition_point(|nid| *nid < source.start);
    let end_idx = start_idx + spikes[start_idx..].partition_point(|nid| *nid < source.end);
    start_idx..end_idx
}
