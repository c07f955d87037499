//! Blocks own the data of one sub domain.
//! Data is registered once per block and looked up by `BlockDataId`,
//! sweeps and pack infos extract their fields at every call
//! instead of caching references across time steps.

mod forest;

pub use forest::*;

use crate::error::*;
use crate::util::*;
use std::any::Any;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub usize);

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one registered piece of block data,
/// the same id is valid on every block of a forest.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockDataId(pub(crate) usize);

impl BlockDataId {
    pub fn index(&self) -> usize {
        self.0
    }
}

struct BlockData {
    name: String,
    data: Box<dyn Any + Send + Sync>,
}

pub struct Block {
    id: BlockId,
    position: Coord<3>,
    data: Vec<BlockData>,
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("id", &self.id)
            .field("position", &self.position)
            .field(
                "data",
                &self.data.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Block {
    pub fn new(id: BlockId, position: Coord<3>) -> Self {
        Block {
            id,
            position,
            data: Vec::new(),
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Position of the block in the forest's block grid.
    pub fn position(&self) -> &Coord<3> {
        &self.position
    }

    pub fn add_data<T: Any + Send + Sync>(
        &mut self,
        name: &str,
        data: T,
    ) -> BlockDataId {
        self.data.push(BlockData {
            name: name.to_string(),
            data: Box::new(data),
        });
        BlockDataId(self.data.len() - 1)
    }

    pub fn data_name(&self, id: BlockDataId) -> Option<&str> {
        self.data.get(id.0).map(|d| d.name.as_str())
    }

    fn missing(&self, id: BlockDataId) -> HaloError {
        HaloError::MissingBlockData {
            block: self.id.0,
            id: id.0,
        }
    }

    fn mismatch<T>(id: BlockDataId) -> HaloError {
        HaloError::BlockDataTypeMismatch {
            id: id.0,
            expected: std::any::type_name::<T>(),
        }
    }

    pub fn get_data<T: Any>(&self, id: BlockDataId) -> Result<&T> {
        self.data
            .get(id.0)
            .ok_or_else(|| self.missing(id))?
            .data
            .downcast_ref::<T>()
            .ok_or_else(|| Self::mismatch::<T>(id))
    }

    pub fn get_data_mut<T: Any>(&mut self, id: BlockDataId) -> Result<&mut T> {
        let missing = self.missing(id);
        self.data
            .get_mut(id.0)
            .ok_or(missing)?
            .data
            .downcast_mut::<T>()
            .ok_or_else(|| Self::mismatch::<T>(id))
    }

    /// Borrow `src` for reading and `dst` for writing at the same time.
    pub fn get_src_dst<T: Any, U: Any>(
        &mut self,
        src: BlockDataId,
        dst: BlockDataId,
    ) -> Result<(&T, &mut U)> {
        if src == dst {
            return Err(HaloError::AliasedSweepFields);
        }
        let len = self.data.len();
        if src.0 >= len {
            return Err(self.missing(src));
        }
        if dst.0 >= len {
            return Err(self.missing(dst));
        }
        let (src_entry, dst_entry) = if src.0 < dst.0 {
            let (head, tail) = self.data.split_at_mut(dst.0);
            (&head[src.0], &mut tail[0])
        } else {
            let (head, tail) = self.data.split_at_mut(src.0);
            (&tail[0], &mut head[dst.0])
        };
        let src_data = src_entry
            .data
            .downcast_ref::<T>()
            .ok_or_else(|| Self::mismatch::<T>(src))?;
        let dst_data = dst_entry
            .data
            .downcast_mut::<U>()
            .ok_or_else(|| Self::mismatch::<U>(dst))?;
        Ok((src_data, dst_data))
    }

    /// Exchange the identities of two data entries of the same type,
    /// the generation swap of double buffered sweeps.
    pub fn swap_data<T: Any>(
        &mut self,
        a: BlockDataId,
        b: BlockDataId,
    ) -> Result<()> {
        self.get_data::<T>(a)?;
        self.get_data::<T>(b)?;
        if a != b {
            let (lo, hi) = (a.0.min(b.0), a.0.max(b.0));
            let (head, tail) = self.data.split_at_mut(hi);
            std::mem::swap(&mut head[lo].data, &mut tail[0].data);
        }
        Ok(())
    }
}
