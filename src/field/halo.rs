//! Halo region geometry.
//! Every send and receive region used by pack infos, datatypes and the
//! outer sweep layers comes from these two queries. Edge and corner
//! regions are the intersection of the per axis slices.

use crate::error::*;
use crate::field::*;
use crate::util::*;

impl FieldShape {
    fn check_thickness(&self, thickness: usize) -> Result<i32> {
        if thickness == 0 {
            return Err(HaloError::ZeroThickness);
        }
        if thickness > self.ghost_layers {
            return Err(HaloError::ThicknessExceedsGhostLayers {
                thickness,
                ghost_layers: self.ghost_layers,
            });
        }
        for d in 0..3 {
            if thickness as i32 > self.size[d] {
                return Err(HaloError::BlockTooSmall {
                    axis: d,
                    extent: self.size[d] as usize,
                    required: thickness,
                });
            }
        }
        Ok(thickness as i32)
    }

    /// The `thickness` deep interior slice adjacent to the boundary
    /// in `dir`, this is what gets sent to the neighbour in `dir`.
    pub fn slice_before_ghost_layer(
        &self,
        dir: Direction,
        thickness: usize,
    ) -> Result<CellInterval> {
        let t = self.check_thickness(thickness)?;
        let offset = dir.offset();
        let mut result = self.xyz_size();
        for d in 0..3 {
            let n = self.size[d];
            match offset[d] {
                1 => result.bounds[(d, 0)] = n - t,
                -1 => result.bounds[(d, 1)] = t - 1,
                _ => {}
            }
        }
        Ok(result)
    }

    /// The `thickness` deep ghost slice outside the boundary in `dir`,
    /// this is what gets received from the neighbour in `dir`.
    pub fn ghost_region(
        &self,
        dir: Direction,
        thickness: usize,
    ) -> Result<CellInterval> {
        let t = self.check_thickness(thickness)?;
        let offset = dir.offset();
        let mut result = self.xyz_size();
        for d in 0..3 {
            let n = self.size[d];
            match offset[d] {
                1 => {
                    result.bounds[(d, 0)] = n;
                    result.bounds[(d, 1)] = n + t - 1;
                }
                -1 => {
                    result.bounds[(d, 0)] = -t;
                    result.bounds[(d, 1)] = -1;
                }
                _ => {}
            }
        }
        Ok(result)
    }
}

impl<L: Layout> Field<L> {
    pub fn slice_before_ghost_layer(
        &self,
        dir: Direction,
        thickness: usize,
    ) -> Result<CellInterval> {
        self.shape().slice_before_ghost_layer(dir, thickness)
    }

    pub fn ghost_region(
        &self,
        dir: Direction,
        thickness: usize,
    ) -> Result<CellInterval> {
        self.shape().ghost_region(dir, thickness)
    }
}
