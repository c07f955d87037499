use crate::field::*;
use crate::util::*;
use std::marker::PhantomData;
use sync_ptr::SyncMutPtr;

#[inline]
pub(crate) fn storage_index(
    allocated: &CellInterval,
    strides: &Strides,
    coord: &Coord<3>,
    c: usize,
) -> usize {
    let mut index = c * strides.component;
    for d in 0..3 {
        let local = coord[d] - allocated.bounds[(d, 0)];
        index += local as usize * strides.cell[d];
    }
    index
}

/// Read only view of a field handed to kernels.
#[derive(Copy, Clone)]
pub struct FieldReader<'a> {
    data: &'a [f64],
    allocated: CellInterval,
    strides: Strides,
    shape: FieldShape,
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(
        data: &'a [f64],
        allocated: CellInterval,
        strides: Strides,
        shape: FieldShape,
    ) -> Self {
        FieldReader {
            data,
            allocated,
            strides,
            shape,
        }
    }

    pub fn shape(&self) -> &FieldShape {
        &self.shape
    }

    #[inline]
    #[track_caller]
    pub fn get(&self, coord: &Coord<3>, c: usize) -> f64 {
        debug_assert!(
            self.allocated.contains(coord),
            "{} does not contain {:?}",
            self.allocated,
            coord
        );
        debug_assert!(c < self.shape.f_size);
        self.data[storage_index(&self.allocated, &self.strides, coord, c)]
    }
}

/// Write access to the cells of one interval of a field.
/// Writers created together cover disjoint intervals, so each of them
/// can be moved to a different thread.
pub struct FieldWriter<'a> {
    ptr: SyncMutPtr<f64>,
    len: usize,
    allocated: CellInterval,
    strides: Strides,
    shape: FieldShape,
    interval: CellInterval,
    _marker: PhantomData<&'a mut [f64]>,
}

impl<'a> FieldWriter<'a> {
    /// # Safety
    /// `ptr` must point to `len` scalars laid out by `strides` that stay
    /// valid for `'a`, and no other live writer may cover `interval`.
    pub(crate) unsafe fn from_raw(
        ptr: *mut f64,
        len: usize,
        allocated: CellInterval,
        strides: Strides,
        shape: FieldShape,
        interval: CellInterval,
    ) -> Self {
        FieldWriter {
            ptr: SyncMutPtr::new(ptr),
            len,
            allocated,
            strides,
            shape,
            interval,
            _marker: PhantomData,
        }
    }

    pub fn interval(&self) -> &CellInterval {
        &self.interval
    }

    pub fn shape(&self) -> &FieldShape {
        &self.shape
    }

    /// Panics if `coord` lies outside the writer's interval.
    #[inline]
    #[track_caller]
    pub fn set(&mut self, coord: &Coord<3>, c: usize, value: f64) {
        assert!(
            self.interval.contains(coord) && c < self.shape.f_size,
            "write to {:?}[{}] outside {}",
            coord,
            c,
            self.interval
        );
        let index = storage_index(&self.allocated, &self.strides, coord, c);
        debug_assert!(index < self.len);
        // SAFETY: the cell lies in this writer's interval, which no other
        // writer covers, and the interval lies inside the allocation.
        unsafe {
            *self.ptr.inner().add(index) = value;
        }
    }

    #[inline]
    #[track_caller]
    pub fn get(&self, coord: &Coord<3>, c: usize) -> f64 {
        assert!(self.interval.contains(coord) && c < self.shape.f_size);
        let index = storage_index(&self.allocated, &self.strides, coord, c);
        // SAFETY: see `set`.
        unsafe { *self.ptr.inner().add(index) }
    }
}
