use crate::block::*;
use crate::error::*;
use crate::field::*;
use crate::sweep::*;
use std::marker::PhantomData;

/// Kernel applied to the full interior of a block in one pass.
pub struct Sweep<K: Kernel, L: Layout = CellMajor> {
    kernel: K,
    fields: SweepFields,
    _layout: PhantomData<fn() -> L>,
}

impl<K: Kernel, L: Layout> Sweep<K, L> {
    pub fn new(kernel: K, fields: SweepFields) -> Result<Self> {
        fields.validate()?;
        kernel.comm_spec()?;
        Ok(Sweep {
            kernel,
            fields,
            _layout: PhantomData,
        })
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub fn fields(&self) -> &SweepFields {
        &self.fields
    }

    /// Fields are looked up on every call, their storage may have been
    /// swapped or replaced since the last one.
    pub fn apply(&self, block: &mut Block) -> Result<()> {
        profiling::scope!("sweep");
        {
            let (src, dst) = self.fields.extract::<L>(block)?;
            let interval = src.xyz_size();
            par_invoke(&self.kernel, src, dst, &interval)?;
        }
        self.fields.finish::<L>(block)
    }
}
