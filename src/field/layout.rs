use crate::util::indexing::*;
use crate::util::*;

/// Distance in scalars between neighbouring cells along each axis
/// and between neighbouring components of one cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Strides {
    pub cell: [usize; 3],
    pub component: usize,
}

/// Memory layout of a multi component field.
/// Strides are resolved once when a field is created,
/// so the hot loops never branch on the layout.
pub trait Layout: Send + Sync + 'static {
    const NAME: &'static str;

    /// Strides for an allocation of `extent` cells with `f_size` components.
    fn strides(extent: &Coord<3>, f_size: usize) -> Strides;

    /// Split a storage index into (linear cell index, component).
    fn split(index: usize, cells: usize, f_size: usize) -> (usize, usize);
}

/// Components of one cell are adjacent in memory.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CellMajor;

/// Each component is stored as one contiguous block of cells.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ComponentMajor;

impl Layout for CellMajor {
    const NAME: &'static str = "cell_major";

    fn strides(extent: &Coord<3>, f_size: usize) -> Strides {
        let cell = row_major_strides(extent).map(|s| s * f_size);
        Strides { cell, component: 1 }
    }

    #[inline]
    fn split(index: usize, _cells: usize, f_size: usize) -> (usize, usize) {
        (index / f_size, index % f_size)
    }
}

impl Layout for ComponentMajor {
    const NAME: &'static str = "component_major";

    fn strides(extent: &Coord<3>, _f_size: usize) -> Strides {
        Strides {
            cell: row_major_strides(extent),
            component: real_buffer_size(extent),
        }
    }

    #[inline]
    fn split(index: usize, cells: usize, _f_size: usize) -> (usize, usize) {
        (index % cells, index / cells)
    }
}
