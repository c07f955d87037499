//! Zero copy exchange.
//! A `Datatype` describes which scalars of a field's storage make up a
//! message, so a structured transport can move them without packing.
//! Descriptions hold offsets relative to the field's data pointer and
//! are only valid while that storage is not reallocated.

use crate::block::*;
use crate::comm::*;
use crate::error::*;
use crate::field::*;
use crate::util::*;
use std::marker::PhantomData;
use sync_ptr::{SyncConstPtr, SyncMutPtr};

/// Strided 3D block of scalars, `sizes[d]` elements `strides[d]` apart.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Subarray {
    pub offset: usize,
    pub sizes: [usize; 3],
    pub strides: [usize; 3],
}

impl Subarray {
    pub fn num_elements(&self) -> usize {
        self.sizes.iter().product()
    }

    /// Element offsets, axis 0 slowest.
    pub fn offsets(&self) -> impl Iterator<Item = usize> + '_ {
        let [nx, ny, nz] = self.sizes;
        (0..nx).flat_map(move |x| {
            (0..ny).flat_map(move |y| {
                (0..nz).map(move |z| {
                    self.offset
                        + x * self.strides[0]
                        + y * self.strides[1]
                        + z * self.strides[2]
                })
            })
        })
    }
}

/// Ordered list of subarrays forming one message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Datatype {
    parts: Vec<Subarray>,
}

impl Datatype {
    pub fn new(parts: Vec<Subarray>) -> Self {
        Datatype { parts }
    }

    /// One subarray per component over the cells of `interval`,
    /// in the order the components are given.
    pub fn for_region<L: Layout>(
        field: &Field<L>,
        interval: &CellInterval,
        components: &[usize],
    ) -> Self {
        if interval.is_empty() {
            return Self::default();
        }
        let extent = interval.exclusive_bounds();
        let sizes = [0, 1, 2].map(|d| extent[d] as usize);
        let strides = field.strides().cell;
        let parts = components
            .iter()
            .map(|c| Subarray {
                offset: field.index(&interval.min(), *c),
                sizes,
                strides,
            })
            .collect();
        Datatype { parts }
    }

    pub fn parts(&self) -> &[Subarray] {
        &self.parts
    }

    pub fn num_elements(&self) -> usize {
        self.parts.iter().map(|p| p.num_elements()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.num_elements() == 0
    }

    /// Element offsets in message order.
    pub fn offsets(&self) -> impl Iterator<Item = usize> + '_ {
        self.parts.iter().flat_map(|p| p.offsets())
    }

    /// One past the largest offset touched.
    pub fn extent(&self) -> usize {
        self.offsets().max().map_or(0, |m| m + 1)
    }
}

/// Structured, copy free exchange for one piece of block data.
/// `send_*(dir)` describes the message to the neighbour in `dir`,
/// `recv_*(dir)` the message arriving from the neighbour in `dir`.
pub trait DatatypeInfo: Send + Sync {
    fn send_datatype(&self, dir: Direction, block: &Block) -> Result<Datatype>;

    fn recv_datatype(&self, dir: Direction, block: &Block) -> Result<Datatype>;

    fn send_pointer(
        &self,
        dir: Direction,
        block: &Block,
    ) -> Result<SyncConstPtr<f64>>;

    fn recv_pointer(
        &self,
        dir: Direction,
        block: &mut Block,
    ) -> Result<SyncMutPtr<f64>>;

    /// Exchange between a block and itself across a periodic boundary,
    /// sending towards `dir`. Returns the number of scalars moved.
    fn communicate_self(
        &self,
        dir: Direction,
        block: &mut Block,
    ) -> Result<usize>;
}

/// Datatype info for a `Field<L>`. The exchanged components per
/// direction are fixed when the info is built.
pub struct FieldDatatypeInfo<L: Layout = CellMajor> {
    field_id: BlockDataId,
    kind: ExchangeKind,
    spec: CommSpec,
    _layout: PhantomData<fn() -> L>,
}

impl<L: Layout> FieldDatatypeInfo<L> {
    pub fn new(
        field_id: BlockDataId,
        kind: ExchangeKind,
        spec: CommSpec,
        f_size: usize,
    ) -> Result<Self> {
        spec.validate(f_size)?;
        tracing::debug!(
            field = field_id.index(),
            ?kind,
            directions = spec.directions().count(),
            "registered datatype info"
        );
        Ok(FieldDatatypeInfo {
            field_id,
            kind,
            spec,
            _layout: PhantomData,
        })
    }

    pub fn for_field(field_id: BlockDataId, f_size: usize) -> Result<Self> {
        Self::new(
            field_id,
            ExchangeKind::Pull,
            CommSpec::all_components(f_size, &Direction::NEIGHBORS),
            f_size,
        )
    }

    pub fn from_accesses(
        field_id: BlockDataId,
        kind: ExchangeKind,
        reads: &[FieldAccess],
        writes: &[FieldAccess],
        f_size: usize,
    ) -> Result<Self> {
        let spec = CommSpec::from_accesses(kind, reads, writes)?;
        Self::new(field_id, kind, spec, f_size)
    }

    pub fn spec(&self) -> &CommSpec {
        &self.spec
    }

    fn field<'a>(&self, block: &'a Block) -> Result<&'a Field<L>> {
        block.get_data::<Field<L>>(self.field_id)
    }
}

impl<L: Layout> DatatypeInfo for FieldDatatypeInfo<L> {
    fn send_datatype(&self, dir: Direction, block: &Block) -> Result<Datatype> {
        let components = self.spec.components(dir);
        if components.is_empty() {
            return Ok(Datatype::default());
        }
        let field = self.field(block)?;
        let region = self.kind.send_region(field.shape(), dir, 1)?;
        Ok(Datatype::for_region(field, &region, components))
    }

    fn recv_datatype(&self, dir: Direction, block: &Block) -> Result<Datatype> {
        let components = self.spec.components(dir.inverse());
        if components.is_empty() {
            return Ok(Datatype::default());
        }
        let field = self.field(block)?;
        let region = self.kind.recv_region(field.shape(), dir, 1)?;
        Ok(Datatype::for_region(field, &region, components))
    }

    fn send_pointer(
        &self,
        _dir: Direction,
        block: &Block,
    ) -> Result<SyncConstPtr<f64>> {
        let field = self.field(block)?;
        // SAFETY: wrapping only, the pointer is dereferenced by `transfer`.
        Ok(unsafe { SyncConstPtr::new(field.data().as_ptr()) })
    }

    fn recv_pointer(
        &self,
        _dir: Direction,
        block: &mut Block,
    ) -> Result<SyncMutPtr<f64>> {
        let field = block.get_data_mut::<Field<L>>(self.field_id)?;
        // SAFETY: see `send_pointer`.
        Ok(unsafe { SyncMutPtr::new(field.data_mut().as_mut_ptr()) })
    }

    fn communicate_self(
        &self,
        dir: Direction,
        block: &mut Block,
    ) -> Result<usize> {
        let send_type = self.send_datatype(dir, block)?;
        let recv_type = self.recv_datatype(dir.inverse(), block)?;
        let field = block.get_data_mut::<Field<L>>(self.field_id)?;
        let base = field.data_mut().as_mut_ptr();
        // SAFETY: both pointers come from the same exclusive borrow of
        // the field, whose storage outlives the call. The datatypes were
        // built from that field, and a send region never overlaps the
        // receive region of the same direction.
        unsafe {
            let send = SyncConstPtr::new(base as *const f64);
            let recv = SyncMutPtr::new(base);
            transfer(&send, &send_type, &recv, &recv_type)
        }
    }
}

/// Copy the elements of `send_type` at `send` to the elements of
/// `recv_type` at `recv`, element by element in message order.
/// Returns the number of scalars moved.
///
/// # Safety
/// Every offset of each datatype must lie inside the storage its pointer
/// refers to, that storage must be live, and the received elements must
/// not overlap the sent ones.
pub unsafe fn transfer(
    send: &SyncConstPtr<f64>,
    send_type: &Datatype,
    recv: &SyncMutPtr<f64>,
    recv_type: &Datatype,
) -> Result<usize> {
    profiling::scope!("datatype transfer");
    let n = send_type.num_elements();
    if n != recv_type.num_elements() {
        return Err(HaloError::DatatypeMismatch {
            send: n,
            recv: recv_type.num_elements(),
        });
    }
    for (from, to) in send_type.offsets().zip(recv_type.offsets()) {
        *recv.inner().add(to) = *send.inner().add(from);
    }
    Ok(n)
}
