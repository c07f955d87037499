use crate::util::*;

/// Number of cells covered by the exclusive bounds.
/// Negative extents (an empty box) count as zero.
pub fn real_buffer_size<const DIMENSION: usize>(
    exclusive_bound: &Coord<DIMENSION>,
) -> usize {
    exclusive_bound.iter().map(|d| (*d).max(0) as usize).product()
}

/// Row major strides, the highest dimension goes the fastest.
pub fn row_major_strides<const DIMENSION: usize>(
    exclusive_bound: &Coord<DIMENSION>,
) -> [usize; DIMENSION] {
    let mut strides = [0; DIMENSION];
    let mut accumulator = 1;
    for d in (0..DIMENSION).rev() {
        strides[d] = accumulator;
        accumulator *= exclusive_bound[d].max(0) as usize;
    }
    strides
}

/// Row major position of a non negative `coord`.
pub fn coord_to_linear<const DIMENSION: usize>(
    coord: &Coord<DIMENSION>,
    exclusive_bounds: &Coord<DIMENSION>,
) -> usize {
    row_major_strides(exclusive_bounds)
        .iter()
        .zip(coord.iter())
        .map(|(stride, c)| {
            debug_assert!(*c >= 0);
            stride * *c as usize
        })
        .sum()
}

pub fn linear_to_coord<const DIMENSION: usize>(
    linear_index: usize,
    exclusive_bounds: &Coord<DIMENSION>,
) -> Coord<DIMENSION> {
    let strides = row_major_strides(exclusive_bounds);
    let mut result = Coord::<DIMENSION>::zeros();
    let mut remainder = linear_index;
    for d in 0..DIMENSION {
        result[d] = (remainder / strides[d]) as i32;
        remainder %= strides[d];
    }
    result
}
