use crate::block::*;
use crate::comm::*;
use crate::error::*;
use crate::field::*;
use crate::util::*;
use std::marker::PhantomData;

/// Buffered halo exchange for one piece of block data.
///
/// `pack(dir)` serializes what the neighbour in `dir` needs,
/// `unpack(dir)` consumes what the neighbour in `dir` sent.
/// `size` must agree exactly with what `pack` writes so a transport can
/// post receives before any payload exists.
pub trait PackInfo: Send + Sync {
    /// The set and size of exchanged cells never changes after setup.
    fn constant_data_exchange(&self) -> bool {
        true
    }

    /// Unpacking into different blocks never touches shared memory.
    fn threadsafe_receiving(&self) -> bool {
        true
    }

    /// Scalars `pack(dir, block)` writes.
    fn size(&self, dir: Direction, block: &Block) -> Result<usize>;

    fn pack(
        &self,
        dir: Direction,
        block: &Block,
        buffer: &mut SendBuffer,
    ) -> Result<()>;

    fn unpack(
        &self,
        dir: Direction,
        buffer: &mut RecvBuffer,
        block: &mut Block,
    ) -> Result<()>;

    /// Exchange between two blocks owned by this process,
    /// `receiver` is the neighbour of `sender` in `dir`.
    fn communicate_local(
        &self,
        sender: &Block,
        receiver: &mut Block,
        dir: Direction,
    ) -> Result<()> {
        let mut buffer = SendBuffer::new();
        self.pack(dir, sender, &mut buffer)?;
        let mut buffer = RecvBuffer::from(buffer);
        self.unpack(dir.inverse(), &mut buffer, receiver)
    }
}

/// Pack info for a `Field<L>`, exchanging the components of a `CommSpec`.
pub struct FieldPackInfo<L: Layout = CellMajor> {
    field_id: BlockDataId,
    kind: ExchangeKind,
    spec: CommSpec,
    thickness: usize,
    _layout: PhantomData<fn() -> L>,
}

impl<L: Layout> FieldPackInfo<L> {
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
            "registered pack info"
        );
        Ok(FieldPackInfo {
            field_id,
            kind,
            spec,
            thickness: 1,
            _layout: PhantomData,
        })
    }

    /// Every component in all 26 directions.
    pub fn for_field(field_id: BlockDataId, f_size: usize) -> Result<Self> {
        Self::new(
            field_id,
            ExchangeKind::Pull,
            CommSpec::all_components(f_size, &Direction::NEIGHBORS),
            f_size,
        )
    }

    /// Only the components a kernel with these accesses needs.
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

    /// Exchange `thickness` cell deep regions, at most the ghost depth.
    pub fn with_thickness(mut self, thickness: usize) -> Self {
        self.thickness = thickness;
        self
    }

    pub fn spec(&self) -> &CommSpec {
        &self.spec
    }

    pub fn kind(&self) -> ExchangeKind {
        self.kind
    }

    fn field<'a>(&self, block: &'a Block) -> Result<&'a Field<L>> {
        block.get_data::<Field<L>>(self.field_id)
    }
}

impl<L: Layout> PackInfo for FieldPackInfo<L> {
    fn size(&self, dir: Direction, block: &Block) -> Result<usize> {
        let components = self.spec.components(dir);
        if components.is_empty() {
            return Ok(0);
        }
        let field = self.field(block)?;
        let region = self.kind.send_region(field.shape(), dir, self.thickness)?;
        Ok(region.buffer_size() * components.len())
    }

    fn pack(
        &self,
        dir: Direction,
        block: &Block,
        buffer: &mut SendBuffer,
    ) -> Result<()> {
        profiling::scope!("pack");
        let components = self.spec.components(dir);
        if components.is_empty() {
            return Ok(());
        }
        let field = self.field(block)?;
        let region = self.kind.send_region(field.shape(), dir, self.thickness)?;
        for coord in region.coord_iter() {
            for &c in components {
                buffer.put(field.get(&coord, c));
            }
        }
        Ok(())
    }

    fn unpack(
        &self,
        dir: Direction,
        buffer: &mut RecvBuffer,
        block: &mut Block,
    ) -> Result<()> {
        profiling::scope!("unpack");
        // The sender packed towards us, i.e. towards inverse(dir).
        let components = self.spec.components(dir.inverse());
        if components.is_empty() {
            return Ok(());
        }
        let field = block.get_data_mut::<Field<L>>(self.field_id)?;
        let region = self.kind.recv_region(field.shape(), dir, self.thickness)?;
        let values = buffer.take(region.buffer_size() * components.len())?;
        let targets = region
            .coord_iter()
            .flat_map(|coord| components.iter().map(move |c| (coord, *c)));
        for ((coord, c), value) in targets.zip(values) {
            field.set(&coord, c, value);
        }
        Ok(())
    }

    fn communicate_local(
        &self,
        sender: &Block,
        receiver: &mut Block,
        dir: Direction,
    ) -> Result<()> {
        profiling::scope!("communicate_local");
        let components = self.spec.components(dir);
        if components.is_empty() {
            return Ok(());
        }
        let src = self.field(sender)?;
        let dst = receiver.get_data_mut::<Field<L>>(self.field_id)?;
        src.shape().check_same(dst.shape())?;
        let send = self.kind.send_region(src.shape(), dir, self.thickness)?;
        let recv = self
            .kind
            .recv_region(dst.shape(), dir.inverse(), self.thickness)?;
        for (from, to) in send.coord_iter().zip(recv.coord_iter()) {
            for &c in components {
                dst.set(&to, c, src.get(&from, c));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    fn block_with_field(shape: FieldShape) -> (Block, BlockDataId) {
        let mut block = Block::new(BlockId(0), vector![0, 0, 0]);
        let mut field = Field::<CellMajor>::new(shape);
        field.par_set_values(
            |c, i| (c[0] * 100 + c[1] * 10 + c[2]) as f64 + i as f64 * 0.25,
            64,
        );
        let id = block.add_data("f", field);
        (block, id)
    }

    #[test]
    fn size_test() {
        let shape = FieldShape::new([4, 5, 6], 2, 1).unwrap();
        let (block, id) = block_with_field(shape);
        let info = FieldPackInfo::<CellMajor>::for_field(id, 2).unwrap();
        assert!(info.constant_data_exchange());
        assert!(info.threadsafe_receiving());
        assert_eq!(info.size(Direction::E, &block).unwrap(), 5 * 6 * 2);
        assert_eq!(info.size(Direction::T, &block).unwrap(), 4 * 5 * 2);
        assert_eq!(info.size(Direction::TNE, &block).unwrap(), 2);
        assert_eq!(info.size(Direction::C, &block).unwrap(), 0);

        let mut buffer = SendBuffer::new();
        for dir in Direction::NEIGHBORS {
            buffer.clear();
            info.pack(dir, &block, &mut buffer).unwrap();
            assert_eq!(buffer.len(), info.size(dir, &block).unwrap());
        }
    }

    #[test]
    fn pack_order_test() {
        let shape = FieldShape::new([2, 2, 2], 2, 1).unwrap();
        let (block, id) = block_with_field(shape);
        let info = FieldPackInfo::<CellMajor>::for_field(id, 2).unwrap();
        let mut buffer = SendBuffer::new();
        info.pack(Direction::E, &block, &mut buffer).unwrap();
        let values: Vec<f64> =
            RecvBuffer::from(buffer).take(8).unwrap().collect();
        // x = 1 plane, y slower than z, components innermost.
        assert_eq!(
            values,
            vec![100.0, 100.25, 101.0, 101.25, 110.0, 110.25, 111.0, 111.25]
        );
    }

    #[test]
    fn unpack_test() {
        let shape = FieldShape::new([3, 3, 3], 1, 1).unwrap();
        let (sender, id) = block_with_field(shape);
        let mut receiver = Block::new(BlockId(1), vector![1, 0, 0]);
        let rid = receiver.add_data("f", Field::<CellMajor>::new(shape));
        assert_eq!(rid, id);
        let info = FieldPackInfo::<CellMajor>::for_field(id, 1).unwrap();

        let mut buffer = SendBuffer::new();
        info.pack(Direction::E, &sender, &mut buffer).unwrap();
        let mut buffer = RecvBuffer::from(buffer);
        info.unpack(Direction::W, &mut buffer, &mut receiver).unwrap();
        assert!(buffer.is_exhausted());

        let src = sender.get_data::<Field<CellMajor>>(id).unwrap();
        let dst = receiver.get_data::<Field<CellMajor>>(id).unwrap();
        for y in 0..3 {
            for z in 0..3 {
                assert_eq!(
                    dst.get(&vector![-1, y, z], 0).to_bits(),
                    src.get(&vector![2, y, z], 0).to_bits()
                );
            }
        }
        assert_eq!(dst.get(&vector![3, 1, 1], 0), 0.0);
    }

    #[test]
    fn undersized_buffer_test() {
        let shape = FieldShape::new([3, 3, 3], 1, 1).unwrap();
        let (mut block, id) = block_with_field(shape);
        let info = FieldPackInfo::<CellMajor>::for_field(id, 1).unwrap();
        let mut send = SendBuffer::new();
        send.put_slice(&[1.0; 8]);
        let mut buffer = RecvBuffer::from(send);
        assert!(matches!(
            info.unpack(Direction::W, &mut buffer, &mut block),
            Err(HaloError::BufferUnderflow {
                needed: 9,
                remaining: 8
            })
        ));
    }

    #[test]
    fn reduced_spec_test() {
        let shape = FieldShape::new([3, 3, 3], 3, 1).unwrap();
        let (sender, id) = block_with_field(shape);
        let reads = [FieldAccess::center(0), FieldAccess::new([-1, 0, 0], 2)];
        let info = FieldPackInfo::<CellMajor>::from_accesses(
            id,
            ExchangeKind::Pull,
            &reads,
            &[],
            3,
        )
        .unwrap();
        assert_eq!(info.size(Direction::E, &sender).unwrap(), 9);
        assert_eq!(info.size(Direction::W, &sender).unwrap(), 0);

        let mut receiver = Block::new(BlockId(1), vector![1, 0, 0]);
        receiver.add_data("f", Field::<CellMajor>::new(shape));
        info.communicate_local(&sender, &mut receiver, Direction::E)
            .unwrap();
        let dst = receiver.get_data::<Field<CellMajor>>(id).unwrap();
        assert_eq!(dst.get(&vector![-1, 1, 2], 2), 212.5);
        assert_eq!(dst.get(&vector![-1, 1, 2], 0), 0.0);

        assert!(matches!(
            FieldPackInfo::<CellMajor>::from_accesses(
                id,
                ExchangeKind::Pull,
                &reads,
                &[],
                2
            ),
            Err(HaloError::ComponentOutOfRange { .. })
        ));
    }

    #[test]
    fn thickness_test() {
        let shape = FieldShape::new([4, 4, 4], 1, 2).unwrap();
        let (block, id) = block_with_field(shape);
        let info = FieldPackInfo::<CellMajor>::for_field(id, 1)
            .unwrap()
            .with_thickness(2);
        assert_eq!(info.size(Direction::N, &block).unwrap(), 32);
        let too_thick = FieldPackInfo::<CellMajor>::for_field(id, 1)
            .unwrap()
            .with_thickness(3);
        assert!(matches!(
            too_thick.size(Direction::N, &block),
            Err(HaloError::ThicknessExceedsGhostLayers { .. })
        ));
    }
}
