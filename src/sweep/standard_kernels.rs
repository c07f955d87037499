use crate::comm::*;
use crate::field::*;
use crate::sweep::*;
use crate::util::*;

/// Average of a cell and its six face neighbours, per component.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Jacobi7 {
    f_size: usize,
}

impl Jacobi7 {
    pub fn new(f_size: usize) -> Self {
        Jacobi7 { f_size }
    }
}

impl Kernel for Jacobi7 {
    fn reads(&self) -> Vec<FieldAccess> {
        let mut reads = Vec::with_capacity(7 * self.f_size);
        for c in 0..self.f_size {
            reads.push(FieldAccess::center(c));
            for dir in Direction::FACES {
                reads.push(FieldAccess {
                    offset: dir.offset(),
                    component: c,
                });
            }
        }
        reads
    }

    fn invoke(
        &self,
        src: &FieldReader<'_>,
        dst: &mut FieldWriter<'_>,
        interval: &CellInterval,
    ) {
        let offsets = Direction::FACES.map(|d| d.offset());
        for coord in interval.coord_iter() {
            for c in 0..self.f_size {
                let mut sum = src.get(&coord, c);
                for offset in &offsets {
                    sum += src.get(&(coord + offset), c);
                }
                dst.set(&coord, c, sum / 7.0);
            }
        }
    }
}

/// Lattice streaming without collision, component `q` moves one cell
/// along lattice velocity `q` per step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PullStream {
    velocities: Vec<Direction>,
}

impl PullStream {
    /// Rest, face and edge velocities.
    pub fn d3q19() -> Self {
        PullStream {
            velocities: Direction::ALL
                .into_iter()
                .filter(|d| d.order() <= 2)
                .collect(),
        }
    }

    pub fn d3q27() -> Self {
        PullStream {
            velocities: Direction::ALL.to_vec(),
        }
    }

    pub fn velocities(&self) -> &[Direction] {
        &self.velocities
    }

    /// Components per cell.
    pub fn q(&self) -> usize {
        self.velocities.len()
    }
}

impl Kernel for PullStream {
    fn reads(&self) -> Vec<FieldAccess> {
        self.velocities
            .iter()
            .enumerate()
            .map(|(q, v)| FieldAccess {
                offset: -v.offset(),
                component: q,
            })
            .collect()
    }

    fn invoke(
        &self,
        src: &FieldReader<'_>,
        dst: &mut FieldWriter<'_>,
        interval: &CellInterval,
    ) {
        let offsets: Vec<Coord<3>> =
            self.velocities.iter().map(|v| v.offset()).collect();
        for coord in interval.coord_iter() {
            for (q, offset) in offsets.iter().enumerate() {
                dst.set(&coord, q, src.get(&(coord - offset), q));
            }
        }
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::block::*;

    #[test]
    fn velocity_sets_test() {
        assert_eq!(PullStream::d3q19().q(), 19);
        assert_eq!(PullStream::d3q27().q(), 27);
        assert_eq!(PullStream::d3q19().velocities()[0], Direction::C);
    }

    #[test]
    fn stream_spec_test() {
        // Each non rest population crosses the face, edge or corner
        // it moves towards, and the faces adjacent to it.
        let stream = PullStream::d3q19();
        let spec = stream.comm_spec().unwrap();
        let q_e = stream
            .velocities()
            .iter()
            .position(|d| *d == Direction::E)
            .unwrap();
        let q_ne = stream
            .velocities()
            .iter()
            .position(|d| *d == Direction::NE)
            .unwrap();
        assert!(spec.components(Direction::E).contains(&q_e));
        assert!(spec.components(Direction::E).contains(&q_ne));
        assert!(spec.components(Direction::N).contains(&q_ne));
        assert_eq!(spec.components(Direction::NE), &[q_ne]);
        assert!(!spec.components(Direction::W).contains(&q_e));
        assert!(spec.components(Direction::TNE).is_empty());
        assert_eq!(spec.components(Direction::E).len(), 5);

        // Corner populations cross the three adjacent faces as well.
        let stream = PullStream::d3q27();
        let spec = stream.comm_spec().unwrap();
        let q_bne = stream
            .velocities()
            .iter()
            .position(|d| *d == Direction::BNE)
            .unwrap();
        for dir in [Direction::E, Direction::N, Direction::B] {
            assert!(spec.components(dir).contains(&q_bne), "{dir}");
        }
        assert!(spec.components(Direction::BN).contains(&q_bne));
        assert!(!spec.components(Direction::T).contains(&q_bne));
        assert_eq!(spec.components(Direction::E).len(), 9);
        assert_eq!(spec.components(Direction::NE).len(), 3);
        assert_eq!(spec.components(Direction::TNE).len(), 1);
    }

    #[test]
    fn stream_test() {
        let stream = PullStream::d3q27();
        let shape = FieldShape::new([3, 3, 3], stream.q(), 1).unwrap();
        let mut src = Field::<CellMajor>::new(shape);
        for q in 0..stream.q() {
            src.set(&vector![1, 1, 1], q, (q + 1) as f64);
        }
        let mut block = Block::new(BlockId(0), vector![0, 0, 0]);
        let a = block.add_data("src", src);
        let b = block.add_data("dst", Field::<CellMajor>::new(shape));
        Sweep::<_, CellMajor>::new(stream.clone(), SweepFields::separate(a, b))
            .unwrap()
            .apply(&mut block)
            .unwrap();

        let dst = block.get_data::<Field<CellMajor>>(b).unwrap();
        for (q, v) in stream.velocities().iter().enumerate() {
            let target = vector![1, 1, 1] + v.offset();
            assert_eq!(dst.get(&target, q), (q + 1) as f64);
        }
        assert_eq!(dst.get(&vector![1, 1, 1], 1), 0.0);
    }
}
