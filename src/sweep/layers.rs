use crate::error::*;
use crate::field::*;
use crate::util::*;

/// Every axis of a block swept inner/outer needs this many cells.
pub fn min_block_extent(shape: &FieldShape) -> usize {
    (2 * shape.ghost_layers).max(3)
}

pub fn check_block_size(shape: &FieldShape) -> Result<()> {
    let required = min_block_extent(shape);
    for d in 0..3 {
        let extent = shape.size[d] as usize;
        if extent < required {
            return Err(HaloError::BlockTooSmall {
                axis: d,
                extent,
                required,
            });
        }
    }
    Ok(())
}

/// Interior cells whose update reads no ghost cells.
pub fn inner_interval(shape: &FieldShape) -> CellInterval {
    shape.xyz_size().expand_uniform(-1)
}

/// The one cell deep boundary shell of a block as six disjoint layers.
/// Top and bottom take whole planes, north and south skip the z
/// boundary, east and west skip the y and z boundaries.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OuterLayers {
    layers: [CellInterval; 6],
}

impl OuterLayers {
    pub const DIRECTIONS: [Direction; 6] = [
        Direction::T,
        Direction::B,
        Direction::N,
        Direction::S,
        Direction::E,
        Direction::W,
    ];

    pub fn new(shape: &FieldShape) -> Result<Self> {
        check_block_size(shape)?;
        let mut layers = [shape.xyz_size(); 6];
        for (layer, dir) in layers.iter_mut().zip(Self::DIRECTIONS) {
            let slice = shape.slice_before_ghost_layer(dir, 1)?;
            *layer = match dir {
                Direction::N | Direction::S => slice.expand(&vector![0, 0, -1]),
                Direction::E | Direction::W => {
                    slice.expand(&vector![0, -1, -1])
                }
                _ => slice,
            };
        }
        tracing::debug!(%shape, "computed outer layers");
        Ok(OuterLayers { layers })
    }

    pub fn layers(&self) -> &[CellInterval; 6] {
        &self.layers
    }

    pub fn iter(&self) -> impl Iterator<Item = (Direction, &CellInterval)> {
        Self::DIRECTIONS.into_iter().zip(self.layers.iter())
    }

    pub fn num_cells(&self) -> usize {
        self.layers.iter().map(|l| l.buffer_size()).sum()
    }
}
