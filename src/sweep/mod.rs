//! Sweeps apply a kernel to every cell of a block.
//! `Sweep` covers the whole interior at once, `InnerOuterSweep` splits
//! it into a halo independent interior pass and six boundary layers so
//! communication can overlap with computation.

mod inner_outer;
mod layers;
mod plain;
mod standard_kernels;
mod streams;

pub use inner_outer::*;
pub use layers::*;
pub use plain::*;
pub use standard_kernels::*;
pub use streams::*;

use crate::block::*;
use crate::comm::*;
use crate::error::*;
use crate::field::*;
use crate::util::*;
use rayon::prelude::*;

/// A per cell pull update, generated or hand written elsewhere.
/// `invoke` must only write `dst` inside `interval`, and only read `src`
/// at the offsets it declares in `reads`, all within the first
/// neighborhood.
pub trait Kernel: Send + Sync {
    fn reads(&self) -> Vec<FieldAccess>;

    fn invoke(
        &self,
        src: &FieldReader<'_>,
        dst: &mut FieldWriter<'_>,
        interval: &CellInterval,
    );

    /// Components each direction has to send so that every read of
    /// this kernel finds current ghost values.
    fn comm_spec(&self) -> Result<CommSpec> {
        CommSpec::from_accesses(ExchangeKind::Pull, &self.reads(), &[])
    }
}

/// Block data a sweep reads from and writes to.
/// With `swap` set, the two fields exchange roles after every complete
/// sweep, so `src` always holds the latest generation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SweepFields {
    pub src: BlockDataId,
    pub dst: BlockDataId,
    pub swap: bool,
}

impl SweepFields {
    pub fn double_buffered(src: BlockDataId, dst: BlockDataId) -> Self {
        SweepFields {
            src,
            dst,
            swap: true,
        }
    }

    pub fn separate(src: BlockDataId, dst: BlockDataId) -> Self {
        SweepFields {
            src,
            dst,
            swap: false,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.src == self.dst {
            return Err(HaloError::AliasedSweepFields);
        }
        Ok(())
    }

    /// The two fields of a block, checked against each other.
    fn extract<'a, L: Layout>(
        &self,
        block: &'a mut Block,
    ) -> Result<(&'a Field<L>, &'a mut Field<L>)> {
        let (src, dst) =
            block.get_src_dst::<Field<L>, Field<L>>(self.src, self.dst)?;
        src.shape().check_same(dst.shape())?;
        Ok((src, dst))
    }

    fn finish<L: Layout>(&self, block: &mut Block) -> Result<()> {
        if self.swap {
            block.swap_data::<Field<L>>(self.src, self.dst)?;
        }
        Ok(())
    }
}

/// Split `interval` into at most `parts` slabs along axis 0.
pub fn split_slabs(interval: &CellInterval, parts: usize) -> Vec<CellInterval> {
    if interval.is_empty() {
        return Vec::new();
    }
    let lo = interval.bounds[(0, 0)];
    let n = interval.exclusive_bounds()[0] as usize;
    let parts = parts.clamp(1, n);
    let (base, rem) = (n / parts, n % parts);
    let mut start = lo;
    (0..parts)
        .map(|i| {
            let len = (base + usize::from(i < rem)) as i32;
            let mut slab = *interval;
            slab.bounds[(0, 0)] = start;
            slab.bounds[(0, 1)] = start + len - 1;
            start += len;
            slab
        })
        .collect()
}

/// Run `kernel` over `interval` with one rayon task per slab.
pub(crate) fn par_invoke<K: Kernel, L: Layout>(
    kernel: &K,
    src: &Field<L>,
    dst: &mut Field<L>,
    interval: &CellInterval,
) -> Result<()> {
    profiling::scope!("par_invoke");
    let slabs = split_slabs(interval, rayon::current_num_threads());
    let reader = src.reader();
    let writers = dst.writers(&slabs)?;
    writers.into_par_iter().for_each(|mut writer| {
        let slab = *writer.interval();
        kernel.invoke(&reader, &mut writer, &slab);
    });
    Ok(())
}
