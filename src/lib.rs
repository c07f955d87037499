pub mod block;
pub mod build_info;
pub mod comm;
pub mod error;
pub mod field;
pub mod init;
pub mod par_slice;
pub mod sweep;
pub mod timeloop;
pub mod util;

pub use error::{HaloError, Result};
