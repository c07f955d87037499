use crate::util::indexing::*;
use crate::util::*;

/// Axis Aligned Bounding Box (AABB) for coordinate types.
/// Each instance is inclusive of both corners.
/// This class is responsible for alot of indexing operations,
/// where we map between a linear buffer and coordinates.
/// A box with `max < min` along any axis is empty.
#[derive(Hash, Debug, Copy, Clone, Eq, PartialEq)]
pub struct AABB<const DIMENSION: usize> {
    pub bounds: Bounds<DIMENSION>,
}

impl<const GRID_DIMENSION: usize> std::fmt::Display for AABB<GRID_DIMENSION> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> Result<(), std::fmt::Error> {
        write!(f, "[")?;
        for d in 0..GRID_DIMENSION {
            if d > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}..={}", self.bounds[(d, 0)], self.bounds[(d, 1)])?;
        }
        write!(f, "]")
    }
}

impl<const DIMENSION: usize> AABB<DIMENSION> {
    /// Create AABB from raw bounds.
    #[inline]
    pub fn new(bounds: Bounds<DIMENSION>) -> Self {
        AABB { bounds }
    }

    /// Create AABB from corners.
    pub fn from_mm(min: Coord<DIMENSION>, max: Coord<DIMENSION>) -> Self {
        AABB {
            bounds: Bounds::from_columns(&[min, max]),
        }
    }

    /// Moving min to the origin, returns the exclusie size in each direction
    /// i.e. [0, 9]  would have exclusive size of 10.
    pub fn exclusive_bounds(&self) -> Coord<DIMENSION> {
        (self.bounds.column(1) - self.bounds.column(0)).add_scalar(1)
    }

    /// Return the number of coordinates contained in the instance.
    #[inline]
    pub fn buffer_size(&self) -> usize {
        real_buffer_size(&self.exclusive_bounds())
    }

    /// Return the linear index for a coord in the instance
    pub fn coord_to_linear(&self, coord: &Coord<DIMENSION>) -> usize {
        coord_to_linear(&(coord - self.min()), &self.exclusive_bounds())
    }

    /// Return the coordinate in the instance for a given linear index.
    pub fn linear_to_coord(&self, index: usize) -> Coord<DIMENSION> {
        linear_to_coord(index, &self.exclusive_bounds()) + self.min()
    }

    /// Check whether the instance contains a coordinate.
    pub fn contains(&self, coord: &Coord<DIMENSION>) -> bool {
        for d in 0..DIMENSION {
            if coord[d] < self.bounds[(d, 0)] || coord[d] > self.bounds[(d, 1)]
            {
                return false;
            }
        }
        true
    }

    /// Check whether another AABB is contained in the instance.
    /// Empty boxes are contained everywhere.
    pub fn contains_aabb(&self, other: &Self) -> bool {
        if other.is_empty() {
            return true;
        }
        for d in 0..DIMENSION {
            if other.bounds[(d, 0)] < self.bounds[(d, 0)]
                || other.bounds[(d, 1)] > self.bounds[(d, 1)]
            {
                return false;
            }
        }
        true
    }

    /// Return the overlap of both boxes, possibly empty.
    pub fn intersection(&self, other: &Self) -> Self {
        let mut result = *self;
        for d in 0..DIMENSION {
            result.bounds[(d, 0)] =
                self.bounds[(d, 0)].max(other.bounds[(d, 0)]);
            result.bounds[(d, 1)] =
                self.bounds[(d, 1)].min(other.bounds[(d, 1)]);
        }
        result
    }

    pub fn intersects(&self, other: &Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && !self.intersection(other).is_empty()
    }

    /// Grow each side by `by[d]` cells along axis `d`,
    /// negative values shrink.
    pub fn expand(&self, by: &Coord<DIMENSION>) -> Self {
        let mut result = *self;
        for d in 0..DIMENSION {
            result.bounds[(d, 0)] -= by[d];
            result.bounds[(d, 1)] += by[d];
        }
        result
    }

    pub fn expand_uniform(&self, by: i32) -> Self {
        self.expand(&Coord::from_element(by))
    }

    /// Find the coord within bound assuming periodic boundary conditions.
    /// Assumes that coords are no more than one box away!
    pub fn periodic_coord(&self, coord: &Coord<DIMENSION>) -> Coord<DIMENSION> {
        let mut result = Coord::<DIMENSION>::zeros();
        for d in 0..DIMENSION {
            let di_raw = coord[d];
            result[d] = if di_raw < self.bounds[(d, 0)] {
                (self.bounds[(d, 1)] + 1) - (self.bounds[(d, 0)] - di_raw)
            } else if di_raw > self.bounds[(d, 1)] {
                self.bounds[(d, 0)] + (di_raw - self.bounds[(d, 1)] - 1)
            } else {
                di_raw
            }
        }
        result
    }

    /// Return min corner.
    pub fn min(&self) -> Coord<DIMENSION> {
        self.bounds.column(0).into()
    }

    /// Return max corner
    pub fn max(&self) -> Coord<DIMENSION> {
        self.bounds.column(1).into()
    }

    /// Check that max >= min
    pub fn check_validity(&self) -> bool {
        for d in 0..DIMENSION {
            if self.bounds[(d, 0)] > self.bounds[(d, 1)] {
                return false;
            }
        }
        true
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.check_validity()
    }

    /// Contained coords in linear ordering.
    pub fn coord_iter(&self) -> impl Iterator<Item = Coord<DIMENSION>> {
        let aabb = *self;
        (0..aabb.buffer_size()).map(move |i| aabb.linear_to_coord(i))
    }
}
