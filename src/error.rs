use crate::util::*;

pub type Result<T> = std::result::Result<T, HaloError>;

/// Errors raised by the halo exchange and sweep scheduling layer.
/// Configuration errors are detected during setup and are fatal,
/// protocol violations are reported instead of producing stale
/// or out of bounds data.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum HaloError {
    #[error("invalid field shape: {reason}")]
    InvalidFieldShape { reason: String },

    #[error("thickness {thickness} exceeds {ghost_layers} ghost layers")]
    ThicknessExceedsGhostLayers { thickness: usize, ghost_layers: usize },

    #[error("region thickness must be at least one cell")]
    ZeroThickness,

    #[error("ill formed stencil: {reason}")]
    IllFormedStencil { reason: String },

    #[error("component {component} out of range for {f_size} components")]
    ComponentOutOfRange { component: usize, f_size: usize },

    #[error(
        "block extent {extent} along axis {axis} is below the required \
         {required} cells"
    )]
    BlockTooSmall {
        axis: usize,
        extent: usize,
        required: usize,
    },

    #[error("sweep source and destination refer to the same block data")]
    AliasedSweepFields,

    #[error("field shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    #[error("invalid block forest: {reason}")]
    InvalidForest { reason: String },

    #[error("buffer underflow: needed {needed} scalars, {remaining} remaining")]
    BufferUnderflow { needed: usize, remaining: usize },

    #[error("datatype mismatch: send {send} elements, receive {recv} elements")]
    DatatypeMismatch { send: usize, recv: usize },

    #[error("outer pass on block {block} issued before its inner pass")]
    OuterBeforeInner { block: usize },

    #[error("inner pass on block {block} issued twice without an outer pass")]
    InnerAlreadyIssued { block: usize },

    #[error("communication already in flight")]
    CommunicationInFlight,

    #[error("no communication in flight")]
    NoCommunicationInFlight,

    #[error("writer intervals {a} and {b} overlap")]
    OverlappingWriters { a: CellInterval, b: CellInterval },

    #[error("writer interval {interval} exceeds field storage {storage}")]
    WriterOutOfBounds {
        interval: CellInterval,
        storage: CellInterval,
    },

    #[error("block {block} has no data registered under id {id}")]
    MissingBlockData { block: usize, id: usize },

    #[error("block data {id} is not a {expected}")]
    BlockDataTypeMismatch { id: usize, expected: &'static str },

    #[error("unknown block {block}")]
    UnknownBlock { block: usize },

    #[error("failed to allocate execution streams")]
    StreamAllocation(#[from] rayon::ThreadPoolBuildError),
}
