use crate::block::*;
use crate::comm::*;
use crate::error::*;
use crate::field::*;
use crate::sweep::*;
use rayon::prelude::*;

/// How a time step combines communication and computation.
pub enum StepStrategy<K: Kernel, L: Layout = CellMajor> {
    /// Start communication, inner passes, wait, outer passes.
    Overlapped(InnerOuterSweep<K, L>),
    /// Communicate, then sweep.
    Synchronous(Sweep<K, L>),
}

/// Advances all blocks of a forest in lock step.
pub struct Timeloop<K: Kernel, L: Layout = CellMajor> {
    scheme: UniformScheme,
    strategy: StepStrategy<K, L>,
    steps: usize,
}

impl<K: Kernel, L: Layout> Timeloop<K, L> {
    pub fn new(scheme: UniformScheme, strategy: StepStrategy<K, L>) -> Self {
        Timeloop {
            scheme,
            strategy,
            steps: 0,
        }
    }

    pub fn overlapped(
        scheme: UniformScheme,
        sweep: InnerOuterSweep<K, L>,
    ) -> Self {
        Self::new(scheme, StepStrategy::Overlapped(sweep))
    }

    pub fn synchronous(scheme: UniformScheme, sweep: Sweep<K, L>) -> Self {
        Self::new(scheme, StepStrategy::Synchronous(sweep))
    }

    /// Completed time steps.
    pub fn current_step(&self) -> usize {
        self.steps
    }

    pub fn scheme(&self) -> &UniformScheme {
        &self.scheme
    }

    pub fn strategy(&self) -> &StepStrategy<K, L> {
        &self.strategy
    }

    pub fn strategy_mut(&mut self) -> &mut StepStrategy<K, L> {
        &mut self.strategy
    }

    pub fn single_step(&mut self, forest: &mut BlockForest) -> Result<()> {
        profiling::scope!("time step");
        match &self.strategy {
            StepStrategy::Overlapped(sweep) => {
                self.scheme.start_communication(forest)?;
                let inner = forest
                    .blocks_mut()
                    .par_iter_mut()
                    .try_for_each(|block| sweep.inner(block));
                // The exchange is finished even when an inner pass failed,
                // so the next step can start a new one.
                let waited = self.scheme.wait(forest);
                let outer = inner.and(waited).and_then(|_| {
                    forest
                        .blocks_mut()
                        .par_iter_mut()
                        .try_for_each(|block| sweep.outer(block))
                });
                if let Err(err) = outer {
                    tracing::warn!(step = self.steps, %err, "time step failed");
                    sweep.reset_pending();
                    return Err(err);
                }
            }
            StepStrategy::Synchronous(sweep) => {
                self.scheme.communicate(forest)?;
                forest
                    .blocks_mut()
                    .par_iter_mut()
                    .try_for_each(|block| sweep.apply(block))?;
            }
        }
        self.steps += 1;
        tracing::debug!(step = self.steps, "time step done");
        Ok(())
    }

    pub fn run(
        &mut self,
        forest: &mut BlockForest,
        steps: usize,
    ) -> Result<()> {
        let mode = match &self.strategy {
            StepStrategy::Overlapped(_) => "overlapped",
            StepStrategy::Synchronous(_) => "synchronous",
        };
        tracing::info!(
            steps,
            mode,
            blocks = forest.len(),
            "running time loop"
        );
        let start = std::time::Instant::now();
        for _ in 0..steps {
            self.single_step(forest)?;
        }
        tracing::info!(
            steps = self.steps,
            elapsed_ms = start.elapsed().as_secs_f64() * 1e3,
            "time loop finished"
        );
        Ok(())
    }
}
