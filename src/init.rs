//! Field initialization
//!
//! Utilities for common field initialization.
//! Use `Field::par_set_values` for custom needs.

use crate::block::*;
use crate::error::*;
use crate::field::*;
use crate::util::*;
use rand::prelude::*;
use rayon::prelude::*;

/// Uniform random integers in `[0, max_val)`, ghost layers included.
pub fn rand<L: Layout>(field: &mut Field<L>, max_val: i32, chunk_size: usize) {
    field
        .data_mut()
        .par_chunks_mut(chunk_size.max(1))
        .for_each(|chunk: &mut [f64]| {
            let mut rng = rand::thread_rng();
            for value in chunk.iter_mut() {
                *value = rng.gen_range(0..max_val.max(1)) as f64;
            }
        });
}

/// Offset of a block's local cell coordinates in the global grid,
/// for a forest of blocks with `shape`.
pub fn block_origin(block: &Block, shape: &FieldShape) -> Coord<3> {
    block.position().component_mul(&shape.size)
}

/// Set every cell of every block, ghost layers included, from a
/// function of the global cell coordinate.
pub fn global<L, F>(
    forest: &mut BlockForest,
    id: BlockDataId,
    f: F,
    chunk_size: usize,
) -> Result<()>
where
    L: Layout,
    F: Fn(Coord<3>, usize) -> f64 + Send + Sync,
{
    let f = &f;
    forest.blocks_mut().par_iter_mut().try_for_each(|block| {
        let shape = *block.get_data::<Field<L>>(id)?.shape();
        let origin = block_origin(block, &shape);
        let field = block.get_data_mut::<Field<L>>(id)?;
        field.par_set_values(move |c, i| f(c + origin, i), chunk_size);
        Ok(())
    })
}
