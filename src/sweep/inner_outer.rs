use crate::block::*;
use crate::error::*;
use crate::field::*;
use crate::sweep::*;
use crate::util::*;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::marker::PhantomData;

/// Sweep split into an interior pass that never reads ghost cells and
/// an outer pass over six boundary layers.
///
/// Overlapped use: `inner` on a block, communicate, then `outer` once
/// the ghost layers are filled. `outer` is rejected for blocks whose
/// `inner` has not been issued, and vice versa `inner` cannot be issued
/// twice before the matching `outer`.
pub struct InnerOuterSweep<K: Kernel, L: Layout = CellMajor> {
    kernel: K,
    fields: SweepFields,
    shape: FieldShape,
    inner: CellInterval,
    layers: OuterLayers,
    execution: OuterExecution,
    pending_outer: Mutex<HashSet<BlockId>>,
    _layout: PhantomData<fn() -> L>,
}

impl<K: Kernel, L: Layout> InnerOuterSweep<K, L> {
    /// Layers are computed here, once, for blocks whose fields have `shape`.
    pub fn new(
        kernel: K,
        fields: SweepFields,
        shape: FieldShape,
        execution: OuterExecution,
    ) -> Result<Self> {
        fields.validate()?;
        kernel.comm_spec()?;
        let layers = OuterLayers::new(&shape)?;
        Ok(InnerOuterSweep {
            kernel,
            fields,
            shape,
            inner: inner_interval(&shape),
            layers,
            execution,
            pending_outer: Mutex::new(HashSet::new()),
            _layout: PhantomData,
        })
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub fn fields(&self) -> &SweepFields {
        &self.fields
    }

    pub fn inner_interval(&self) -> &CellInterval {
        &self.inner
    }

    pub fn layers(&self) -> &OuterLayers {
        &self.layers
    }

    pub fn execution(&self) -> &OuterExecution {
        &self.execution
    }

    /// Forwarded to the outer streams, without effect when the layers
    /// run sequentially.
    pub fn set_outer_priority(&mut self, priority: i32) {
        if let OuterExecution::Streams(streams) = &mut self.execution {
            streams.set_priority(priority);
        }
    }

    pub fn outer_priority(&self) -> Option<i32> {
        match &self.execution {
            OuterExecution::Streams(streams) => Some(streams.priority()),
            OuterExecution::Sequential => None,
        }
    }

    /// Whether `inner` ran on `block` without a matching `outer` yet.
    pub fn is_outer_pending(&self, block: BlockId) -> bool {
        self.pending_outer.lock().contains(&block)
    }

    /// Forget every started but unfinished block, after a failed step.
    pub fn reset_pending(&self) {
        self.pending_outer.lock().clear();
    }

    fn extract<'a>(
        &self,
        block: &'a mut Block,
    ) -> Result<(&'a Field<L>, &'a mut Field<L>)> {
        let (src, dst) = self.fields.extract::<L>(block)?;
        self.shape.check_same(src.shape())?;
        Ok((src, dst))
    }

    pub fn inner(&self, block: &mut Block) -> Result<()> {
        profiling::scope!("inner");
        let id = block.id();
        if self.is_outer_pending(id) {
            return Err(HaloError::InnerAlreadyIssued { block: id.0 });
        }
        let (src, dst) = self.extract(block)?;
        par_invoke(&self.kernel, src, dst, &self.inner)?;
        self.pending_outer.lock().insert(id);
        Ok(())
    }

    pub fn outer(&self, block: &mut Block) -> Result<()> {
        profiling::scope!("outer");
        let id = block.id();
        if !self.is_outer_pending(id) {
            return Err(HaloError::OuterBeforeInner { block: id.0 });
        }
        {
            let (src, dst) = self.extract(block)?;
            let reader = src.reader();
            let writers = dst.writers(self.layers.layers())?;
            let run_layer = |mut writer: FieldWriter<'_>| {
                let layer = *writer.interval();
                self.kernel.invoke(&reader, &mut writer, &layer);
            };
            match &self.execution {
                OuterExecution::Sequential => {
                    writers.into_iter().for_each(run_layer)
                }
                OuterExecution::Streams(streams) => {
                    streams.run_and_synchronize(writers, run_layer)
                }
            }
        }
        self.pending_outer.lock().remove(&id);
        self.fields.finish::<L>(block)
    }

    /// Inner and outer pass without communication in between.
    pub fn apply(&self, block: &mut Block) -> Result<()> {
        self.inner(block)?;
        self.outer(block)
    }
}
