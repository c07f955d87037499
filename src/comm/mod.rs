//! Ghost layer communication.
//! Pack infos serialize halo regions into buffers, datatype infos
//! describe them for copy free transfers, and `UniformScheme` moves
//! either kind between the blocks of a forest.

mod buffer;
mod comm_spec;
mod datatype;
mod pack_info;
mod scheme;

pub use buffer::*;
pub use comm_spec::*;
pub use datatype::*;
pub use pack_info::*;
pub use scheme::*;
