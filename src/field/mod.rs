//! Ghost layer fields.
//! A field stores `f_size` scalar components per cell over a block's
//! interior cells plus a border of ghost layers mirroring the
//! neighbouring blocks. Interior cells are addressed `0..n` per axis,
//! ghost cells have negative or `>= n` coordinates.

mod access;
mod halo;
mod layout;

pub use access::*;
pub use layout::*;

use access::storage_index;

use crate::error::*;
use crate::par_slice;
use crate::util::*;
use rayon::prelude::*;
use std::marker::PhantomData;

/// Geometry of a field. Fixed for the lifetime of the field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldShape {
    /// Interior cells per axis.
    pub size: Coord<3>,

    /// Scalar components per cell.
    pub f_size: usize,

    /// Depth of the ghost layer border.
    pub ghost_layers: usize,
}

impl std::fmt::Display for FieldShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{}x{} cells, {} components, {} ghost layers",
            self.size[0],
            self.size[1],
            self.size[2],
            self.f_size,
            self.ghost_layers
        )
    }
}

impl FieldShape {
    pub fn new(
        size: [usize; 3],
        f_size: usize,
        ghost_layers: usize,
    ) -> Result<Self> {
        if size.iter().any(|s| *s == 0) {
            return Err(HaloError::InvalidFieldShape {
                reason: format!("empty interior {size:?}"),
            });
        }
        if f_size == 0 {
            return Err(HaloError::InvalidFieldShape {
                reason: "cells need at least one component".to_string(),
            });
        }
        if ghost_layers == 0 {
            return Err(HaloError::InvalidFieldShape {
                reason: "at least one ghost layer is required".to_string(),
            });
        }
        Ok(FieldShape {
            size: vector![size[0] as i32, size[1] as i32, size[2] as i32],
            f_size,
            ghost_layers,
        })
    }

    /// Interior cells.
    pub fn xyz_size(&self) -> CellInterval {
        CellInterval::from_mm(Coord::zeros(), self.size.add_scalar(-1))
    }

    /// Interior and ghost cells, the whole allocation.
    pub fn xyz_size_with_ghost_layers(&self) -> CellInterval {
        self.xyz_size().expand_uniform(self.ghost_layers as i32)
    }

    pub fn allocated_cells(&self) -> usize {
        self.xyz_size_with_ghost_layers().buffer_size()
    }

    /// Number of scalars in the backing storage.
    pub fn num_scalars(&self) -> usize {
        self.allocated_cells() * self.f_size
    }

    pub(crate) fn check_same(&self, other: &FieldShape) -> Result<()> {
        if self != other {
            return Err(HaloError::ShapeMismatch {
                expected: self.to_string(),
                got: other.to_string(),
            });
        }
        Ok(())
    }
}

/// Three dimensional ghost layer field of `f64` scalars,
/// generic over its memory layout.
pub struct Field<L: Layout = CellMajor> {
    shape: FieldShape,
    allocated: CellInterval,
    strides: Strides,
    buffer: Vec<f64>,
    _layout: PhantomData<L>,
}

impl<L: Layout> Clone for Field<L> {
    fn clone(&self) -> Self {
        Field {
            shape: self.shape,
            allocated: self.allocated,
            strides: self.strides,
            buffer: self.buffer.clone(),
            _layout: PhantomData,
        }
    }
}

impl<L: Layout> std::fmt::Debug for Field<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("shape", &self.shape)
            .field("layout", &L::NAME)
            .finish()
    }
}

impl<L: Layout> Field<L> {
    /// Zero initialized field.
    pub fn new(shape: FieldShape) -> Self {
        let allocated = shape.xyz_size_with_ghost_layers();
        let strides = L::strides(&allocated.exclusive_bounds(), shape.f_size);
        Field {
            shape,
            allocated,
            strides,
            buffer: vec![0.0; shape.num_scalars()],
            _layout: PhantomData,
        }
    }

    /// Fresh zeroed field with the same shape, e.g. a shadow field
    /// for double buffered sweeps.
    pub fn clone_shape(&self) -> Self {
        Self::new(self.shape)
    }

    #[inline]
    pub fn shape(&self) -> &FieldShape {
        &self.shape
    }

    #[inline]
    pub fn f_size(&self) -> usize {
        self.shape.f_size
    }

    #[inline]
    pub fn ghost_layers(&self) -> usize {
        self.shape.ghost_layers
    }

    #[inline]
    pub fn strides(&self) -> &Strides {
        &self.strides
    }

    pub fn xyz_size(&self) -> CellInterval {
        self.shape.xyz_size()
    }

    pub fn xyz_size_with_ghost_layers(&self) -> CellInterval {
        self.allocated
    }

    /// Storage index of component `c` of the cell at `coord`.
    #[inline]
    #[track_caller]
    pub fn index(&self, coord: &Coord<3>, c: usize) -> usize {
        debug_assert!(
            self.allocated.contains(coord),
            "{} does not contain {:?}",
            self.allocated,
            coord
        );
        debug_assert!(c < self.shape.f_size);
        storage_index(&self.allocated, &self.strides, coord, c)
    }

    #[inline]
    #[track_caller]
    pub fn get(&self, coord: &Coord<3>, c: usize) -> f64 {
        self.buffer[self.index(coord, c)]
    }

    #[inline]
    #[track_caller]
    pub fn set(&mut self, coord: &Coord<3>, c: usize, value: f64) {
        let index = self.index(coord, c);
        self.buffer[index] = value;
    }

    pub fn data(&self) -> &[f64] {
        &self.buffer
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.buffer
    }

    /// Set every scalar, ghost layers included.
    pub fn fill(&mut self, value: f64, chunk_size: usize) {
        par_slice::set_value(&mut self.buffer, value, chunk_size);
    }

    /// Set every scalar, ghost layers included, from `f(coord, component)`.
    pub fn par_set_values<F: Fn(Coord<3>, usize) -> f64 + Send + Sync>(
        &mut self,
        f: F,
        chunk_size: usize,
    ) {
        let allocated = self.allocated;
        let cells = allocated.buffer_size();
        let f_size = self.shape.f_size;
        self.buffer
            .par_chunks_mut(chunk_size.max(1))
            .enumerate()
            .for_each(|(i, chunk): (usize, &mut [f64])| {
                let offset = i * chunk_size.max(1);
                for (j, value) in chunk.iter_mut().enumerate() {
                    let (cell, c) = L::split(offset + j, cells, f_size);
                    *value = f(allocated.linear_to_coord(cell), c);
                }
            });
    }

    /// Copy all scalars of a field with identical shape.
    pub fn copy_from(&mut self, other: &Self, chunk_size: usize) -> Result<()> {
        self.shape.check_same(&other.shape)?;
        par_slice::copy(&other.buffer, &mut self.buffer, chunk_size);
        Ok(())
    }

    /// Exchange the storage of two fields with identical shape.
    pub fn swap(&mut self, other: &mut Self) -> Result<()> {
        self.shape.check_same(&other.shape)?;
        std::mem::swap(&mut self.buffer, &mut other.buffer);
        Ok(())
    }

    pub fn reader(&self) -> FieldReader<'_> {
        FieldReader::new(&self.buffer, self.allocated, self.strides, self.shape)
    }

    /// One writer per interval. Intervals must lie inside the allocation
    /// and be pairwise disjoint, the writers may then be used concurrently.
    pub fn writers(
        &mut self,
        intervals: &[CellInterval],
    ) -> Result<Vec<FieldWriter<'_>>> {
        for (i, a) in intervals.iter().enumerate() {
            if !self.allocated.contains_aabb(a) {
                return Err(HaloError::WriterOutOfBounds {
                    interval: *a,
                    storage: self.allocated,
                });
            }
            for b in &intervals[i + 1..] {
                if a.intersects(b) {
                    return Err(HaloError::OverlappingWriters { a: *a, b: *b });
                }
            }
        }
        let ptr = self.buffer.as_mut_ptr();
        let len = self.buffer.len();
        Ok(intervals
            .iter()
            .map(|interval| {
                // SAFETY: intervals were checked to be disjoint and inside
                // the allocation, each writer only touches its own cells,
                // and the writers borrow `self` mutably.
                unsafe {
                    FieldWriter::from_raw(
                        ptr,
                        len,
                        self.allocated,
                        self.strides,
                        self.shape,
                        *interval,
                    )
                }
            })
            .collect())
    }

    pub fn writer(
        &mut self,
        interval: CellInterval,
    ) -> Result<FieldWriter<'_>> {
        let mut writers = self.writers(&[interval])?;
        Ok(writers.remove(0))
    }
}
