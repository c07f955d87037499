pub use nalgebra::{matrix, vector};
pub use num_traits::{Num, One, Zero};

mod aabb;
mod direction;
pub mod indexing;
pub use aabb::*;
pub use direction::*;

pub type Coord<const GRID_DIMENSION: usize> =
    nalgebra::SVector<i32, { GRID_DIMENSION }>;

/// Column 0 holds the min corner, column 1 the max corner.
pub type Bounds<const GRID_DIMENSION: usize> =
    nalgebra::SMatrix<i32, { GRID_DIMENSION }, 2>;

/// Cell intervals are inclusive boxes in cell index space.
pub type CellInterval = AABB<3>;
