use crate::error::*;

/// Independent execution streams for the boundary layers of an
/// inner/outer sweep, one pool thread per layer.
/// The pool lives as long as the scheduler that owns it.
pub struct ParallelStreams {
    pool: rayon::ThreadPool,
    priority: i32,
}

impl std::fmt::Debug for ParallelStreams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParallelStreams")
            .field("streams", &self.pool.current_num_threads())
            .field("priority", &self.priority)
            .finish()
    }
}

impl ParallelStreams {
    pub fn new(streams: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(streams.max(1))
            .thread_name(|i| format!("outer_stream_{i}"))
            .build()?;
        tracing::debug!(
            streams = pool.current_num_threads(),
            "allocated execution streams"
        );
        Ok(ParallelStreams { pool, priority: 0 })
    }

    pub fn num_streams(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Scheduling hint relative to other concurrent work.
    /// Never changes results.
    pub fn set_priority(&mut self, priority: i32) {
        tracing::debug!(priority, "outer stream priority");
        self.priority = priority;
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Launch `job` once per item on the streams and return after every
    /// launched job has completed.
    pub fn run_and_synchronize<T, F>(&self, items: Vec<T>, job: F)
    where
        T: Send,
        F: Fn(T) + Sync,
    {
        profiling::scope!("run_and_synchronize");
        let job = &job;
        self.pool.scope(|s| {
            for item in items {
                s.spawn(move |_| job(item));
            }
        });
    }
}

/// Where the six boundary layers of an outer pass run.
#[derive(Debug, Default)]
pub enum OuterExecution {
    /// One after the other on the calling thread.
    #[default]
    Sequential,
    Streams(ParallelStreams),
}

impl OuterExecution {
    /// One stream per boundary layer.
    pub fn streams() -> Result<Self> {
        Ok(OuterExecution::Streams(ParallelStreams::new(6)?))
    }
}
