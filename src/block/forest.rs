use crate::block::*;
use crate::error::*;
use crate::field::*;
use crate::util::*;
use std::any::Any;

/// Uniform grid of equally sized blocks, all owned by this process.
/// Block ids are the linear index of the block position in the grid.
pub struct BlockForest {
    grid: AABB<3>,
    periodic: [bool; 3],
    blocks: Vec<Block>,
}

impl BlockForest {
    pub fn new(
        blocks_per_axis: [usize; 3],
        periodic: [bool; 3],
    ) -> Result<Self> {
        if blocks_per_axis.iter().any(|b| *b == 0) {
            return Err(HaloError::InvalidForest {
                reason: format!("empty block grid {blocks_per_axis:?}"),
            });
        }
        let grid = AABB::from_mm(
            Coord::zeros(),
            vector![
                blocks_per_axis[0] as i32 - 1,
                blocks_per_axis[1] as i32 - 1,
                blocks_per_axis[2] as i32 - 1
            ],
        );
        let blocks = grid
            .coord_iter()
            .enumerate()
            .map(|(i, position)| Block::new(BlockId(i), position))
            .collect();
        tracing::debug!(%grid, ?periodic, "created block forest");
        Ok(BlockForest {
            grid,
            periodic,
            blocks,
        })
    }

    /// Block grid bounds.
    pub fn grid(&self) -> &AABB<3> {
        &self.grid
    }

    pub fn periodic(&self) -> [bool; 3] {
        self.periodic
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    pub fn block(&self, id: BlockId) -> Result<&Block> {
        self.blocks
            .get(id.0)
            .ok_or(HaloError::UnknownBlock { block: id.0 })
    }

    pub fn block_mut(&mut self, id: BlockId) -> Result<&mut Block> {
        self.blocks
            .get_mut(id.0)
            .ok_or(HaloError::UnknownBlock { block: id.0 })
    }

    /// Register data on every block, `init` is called once per block.
    pub fn add_block_data<T, F>(
        &mut self,
        name: &str,
        init: F,
    ) -> Result<BlockDataId>
    where
        T: Any + Send + Sync,
        F: Fn(&Block) -> T,
    {
        let mut result = None;
        for block in self.blocks.iter_mut() {
            let data = init(block);
            let id = block.add_data(name, data);
            match result {
                None => result = Some(id),
                Some(expected) if expected != id => {
                    return Err(HaloError::InvalidForest {
                        reason: format!(
                            "block {} registered {name} as {}, expected {}",
                            block.id(),
                            id.0,
                            expected.0
                        ),
                    });
                }
                _ => {}
            }
        }
        result.ok_or_else(|| HaloError::InvalidForest {
            reason: "no blocks".to_string(),
        })
    }

    /// Register a zero initialized field on every block.
    pub fn add_field<L: Layout>(
        &mut self,
        name: &str,
        shape: FieldShape,
    ) -> Result<BlockDataId> {
        let id = self.add_block_data(name, |_| Field::<L>::new(shape))?;
        tracing::debug!(name, %shape, layout = L::NAME, "added field");
        Ok(id)
    }

    /// The block adjacent to `id` in `dir`, wrapping around periodic axes.
    pub fn neighbor(&self, id: BlockId, dir: Direction) -> Option<BlockId> {
        let block = self.blocks.get(id.0)?;
        let mut position = block.position() + dir.offset();
        for d in 0..3 {
            let outside = position[d] < self.grid.bounds[(d, 0)]
                || position[d] > self.grid.bounds[(d, 1)];
            if outside && !self.periodic[d] {
                return None;
            }
        }
        position = self.grid.periodic_coord(&position);
        Some(BlockId(self.grid.coord_to_linear(&position)))
    }

    /// Shared access to `sender` together with exclusive access to a
    /// different `receiver`.
    pub fn pair_mut(
        &mut self,
        sender: BlockId,
        receiver: BlockId,
    ) -> Result<(&Block, &mut Block)> {
        let len = self.blocks.len();
        for id in [sender, receiver] {
            if id.0 >= len {
                return Err(HaloError::UnknownBlock { block: id.0 });
            }
        }
        if sender == receiver {
            return Err(HaloError::InvalidForest {
                reason: format!("block {sender} cannot be paired with itself"),
            });
        }
        if sender.0 < receiver.0 {
            let (head, tail) = self.blocks.split_at_mut(receiver.0);
            Ok((&head[sender.0], &mut tail[0]))
        } else {
            let (head, tail) = self.blocks.split_at_mut(sender.0);
            Ok((&tail[0], &mut head[receiver.0]))
        }
    }
}
