use std::ops::Range;

/// Contiguous share of `num_items` assigned to `part_id` out of `num_parts`.
/// The first `num_items % num_parts` parts get one extra item.
pub fn get_partition_range(num_parts: usize, part_id: usize, num_items: usize) -> Range<usize> {
    let min_part_size = num_items / num_parts;
    let remainder = num_items % num_parts;

    if part_id < remainder {
        let part_size = min_part_size + 1;
        let start = part_size * part_id;
        Range {
            start,
            end: start + part_size,
        }
    } else {
        let start = (min_part_size + 1) * remainder + min_part_size * (part_id - remainder);
        Range {
            start,
            end: start + min_part_size,
        }
    }
}
