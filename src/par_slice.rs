//! Chunked parallel operations on field storage.

use num_traits::Num;
use rayon::prelude::*;

/// Set every scalar to `value`, `chunk_size` scalars per task.
pub fn set_value<T: Num + Copy + Send + Sync>(
    slice: &mut [T],
    value: T,
    chunk_size: usize,
) {
    slice
        .par_chunks_mut(chunk_size.max(1))
        .for_each(|chunk| chunk.fill(value));
}

/// Copy `src` into `dst`, both must have the same length.
pub fn copy<T: Num + Copy + Send + Sync>(
    src: &[T],
    dst: &mut [T],
    chunk_size: usize,
) {
    debug_assert_eq!(src.len(), dst.len());
    let chunk_size = chunk_size.max(1);
    dst.par_chunks_mut(chunk_size)
        .zip(src.par_chunks(chunk_size))
        .for_each(|(d, s)| d.copy_from_slice(s));
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn set_value_test() {
        let mut storage = vec![1.5; 343];
        set_value(&mut storage, -1.0, 50);
        assert!(storage.iter().all(|v| *v == -1.0));

        let mut empty: Vec<f64> = Vec::new();
        set_value(&mut empty, 2.0, 0);
    }

    #[test]
    fn copy_test() {
        let src: Vec<f64> = (0..1000).map(|i| i as f64 * 0.5).collect();
        let mut dst = vec![0.0; 1000];
        copy(&src, &mut dst, 33);
        assert_eq!(src, dst);
    }
}
