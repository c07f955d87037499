use gridhalo::block::*;
use gridhalo::comm::*;
use gridhalo::field::*;
use gridhalo::init;
use gridhalo::sweep::*;
use gridhalo::util::*;

use nalgebra::{matrix, vector};

const SENTINEL: f64 = -1.0;

fn global_value(c: Coord<3>, component: usize) -> f64 {
    (c[0] * 10_000 + c[1] * 100 + c[2]) as f64 + component as f64 * 0.125
}

/// Interior cells from `global_value`, ghost cells set to `SENTINEL`.
fn forest_with_field<L: Layout>(
    blocks: [usize; 3],
    periodic: [bool; 3],
    shape: FieldShape,
) -> (BlockForest, BlockDataId) {
    let mut forest = BlockForest::new(blocks, periodic).unwrap();
    let id = forest.add_field::<L>("f", shape).unwrap();
    for block in forest.blocks_mut() {
        let origin = init::block_origin(block, &shape);
        let interior = shape.xyz_size();
        block
            .get_data_mut::<Field<L>>(id)
            .unwrap()
            .par_set_values(
                move |c, i| {
                    if interior.contains(&c) {
                        global_value(c + origin, i)
                    } else {
                        SENTINEL
                    }
                },
                64,
            );
    }
    (forest, id)
}

/// What a ghost cell holds after a full exchange: the global value of
/// the cell it mirrors, or the sentinel beyond non periodic boundaries.
fn expected_ghost(
    forest: &BlockForest,
    shape: &FieldShape,
    global: Coord<3>,
    component: usize,
) -> f64 {
    let cells = forest.grid().exclusive_bounds().component_mul(&shape.size);
    let domain = AABB::from_mm(Coord::zeros(), cells - Coord::repeat(1));
    let mut wrapped = global;
    for d in 0..3 {
        let (low, high) = (domain.bounds[(d, 0)], domain.bounds[(d, 1)]);
        if global[d] < low || global[d] > high {
            if !forest.periodic()[d] {
                return SENTINEL;
            }
            wrapped[d] = global[d].rem_euclid(domain.bounds[(d, 1)] + 1);
        }
    }
    global_value(wrapped, component)
}

fn check_full_exchange<L: Layout>(
    forest: &BlockForest,
    id: BlockDataId,
    shape: &FieldShape,
) {
    for block in forest.blocks() {
        let origin = init::block_origin(block, shape);
        let field = block.get_data::<Field<L>>(id).unwrap();
        for c in shape.xyz_size_with_ghost_layers().coord_iter() {
            for i in 0..shape.f_size {
                let expected = if shape.xyz_size().contains(&c) {
                    global_value(c + origin, i)
                } else {
                    expected_ghost(forest, shape, c + origin, i)
                };
                assert_eq!(
                    field.get(&c, i).to_bits(),
                    expected.to_bits(),
                    "block {} cell {:?} component {}",
                    block.id(),
                    c,
                    i
                );
            }
        }
    }
}

#[test]
fn neighbor_sizes_agree() {
    let shape = FieldShape::new([4, 5, 6], 3, 1).unwrap();
    let (forest, id) =
        forest_with_field::<CellMajor>([3, 3, 3], [false; 3], shape);
    let info = FieldPackInfo::<CellMajor>::for_field(id, 3).unwrap();
    let center = BlockId(forest.grid().coord_to_linear(&vector![1, 1, 1]));
    let a = forest.block(center).unwrap();
    for dir in Direction::NEIGHBORS {
        let neighbor = forest.neighbor(center, dir).unwrap();
        let b = forest.block(neighbor).unwrap();
        assert_eq!(
            info.size(dir, a).unwrap(),
            info.size(dir.inverse(), b).unwrap(),
            "{dir}"
        );
    }
}

#[test]
fn pack_unpack_round_trip() {
    let shape = FieldShape::new([5, 4, 3], 2, 2).unwrap();
    let mut sender = Block::new(BlockId(0), vector![0, 0, 0]);
    let mut field = Field::<ComponentMajor>::new(shape);
    field.par_set_values(|_, _| rand::random::<f64>(), 16);
    let id = sender.add_data("f", field);
    let info = FieldPackInfo::<ComponentMajor>::for_field(id, 2)
        .unwrap()
        .with_thickness(2);

    for dir in Direction::NEIGHBORS {
        let mut receiver = Block::new(BlockId(1), dir.offset());
        receiver.add_data("f", Field::<ComponentMajor>::new(shape));

        let mut buffer = SendBuffer::new();
        info.pack(dir, &sender, &mut buffer).unwrap();
        let mut buffer = RecvBuffer::from(buffer);
        info.unpack(dir.inverse(), &mut buffer, &mut receiver).unwrap();
        assert!(buffer.is_exhausted());

        let src = sender.get_data::<Field<ComponentMajor>>(id).unwrap();
        let dst = receiver.get_data::<Field<ComponentMajor>>(id).unwrap();
        let send = shape.slice_before_ghost_layer(dir, 2).unwrap();
        let recv = shape.ghost_region(dir.inverse(), 2).unwrap();
        for (from, to) in send.coord_iter().zip(recv.coord_iter()) {
            for i in 0..2 {
                let (sent, received) = (src.get(&from, i), dst.get(&to, i));
                assert_eq!(received.to_bits(), sent.to_bits());
            }
        }
    }
}

#[test]
fn east_west_scenario() {
    let shape = FieldShape::new([4, 4, 4], 1, 1).unwrap();
    let slice = shape.slice_before_ghost_layer(Direction::E, 1).unwrap();
    assert_eq!(slice, AABB::new(matrix![3, 3; 0, 3; 0, 3]));
    assert_eq!(slice.buffer_size(), 16);

    let (mut forest, id) =
        forest_with_field::<CellMajor>([2, 1, 1], [false; 3], shape);
    let mut scheme = UniformScheme::new(&[Direction::E, Direction::W]);
    let info = FieldPackInfo::<CellMajor>::for_field(id, 1).unwrap();
    scheme.add_pack_info(info).unwrap();
    scheme.communicate(&mut forest).unwrap();

    // The eastern block's western ghost column holds the western
    // block's last interior plane.
    let east = forest.blocks()[1].get_data::<Field<CellMajor>>(id).unwrap();
    let ghost = shape.ghost_region(Direction::W, 1).unwrap();
    assert_eq!(ghost.buffer_size(), 16);
    for c in ghost.coord_iter() {
        assert_eq!(east.get(&c, 0), global_value(vector![3, c[1], c[2]], 0));
    }
    assert_eq!(east.get(&vector![-1, -1, 0], 0), SENTINEL);
}

#[test]
fn buffered_forest_exchange() {
    let shape = FieldShape::new([3, 4, 3], 2, 1).unwrap();
    let (mut forest, id) = forest_with_field::<CellMajor>(
        [3, 2, 2],
        [false, true, false],
        shape,
    );
    let mut scheme = UniformScheme::all_neighbors();
    let info = FieldPackInfo::<CellMajor>::for_field(id, 2).unwrap();
    scheme.add_pack_info(info).unwrap();
    scheme.communicate(&mut forest).unwrap();
    check_full_exchange::<CellMajor>(&forest, id, &shape);
}

#[test]
fn local_shortcut_forest_exchange() {
    let shape = FieldShape::new([3, 3, 4], 1, 2).unwrap();
    let (mut forest, id) =
        forest_with_field::<ComponentMajor>([2, 2, 2], [true; 3], shape);
    let mut scheme =
        UniformScheme::all_neighbors().with_local_shortcut(true);
    scheme
        .add_pack_info(
            FieldPackInfo::<ComponentMajor>::for_field(id, 1)
                .unwrap()
                .with_thickness(2),
        )
        .unwrap();
    scheme.communicate(&mut forest).unwrap();
    check_full_exchange::<ComponentMajor>(&forest, id, &shape);
}

#[test]
fn datatype_forest_exchange() {
    let shape = FieldShape::new([4, 3, 3], 3, 1).unwrap();
    let (mut forest, id) = forest_with_field::<ComponentMajor>(
        [2, 3, 1],
        [true, false, true],
        shape,
    );
    let mut scheme = UniformScheme::all_neighbors();
    let info = FieldDatatypeInfo::<ComponentMajor>::for_field(id, 3).unwrap();
    scheme.add_datatype_info(info).unwrap();
    scheme.communicate(&mut forest).unwrap();
    check_full_exchange::<ComponentMajor>(&forest, id, &shape);
}

#[test]
fn reduced_exchange_feeds_stream_reads() {
    for stream in [PullStream::d3q19(), PullStream::d3q27()] {
        let shape = FieldShape::new([3, 3, 3], stream.q(), 1).unwrap();
        for datatype in [false, true] {
            let (mut forest, id) = forest_with_field::<CellMajor>(
                [2, 2, 2],
                [true, false, true],
                shape,
            );
            let spec = stream.comm_spec().unwrap();
            let q = stream.q();
            let mut scheme = UniformScheme::all_neighbors();
            if datatype {
                let info = FieldDatatypeInfo::<CellMajor>::new(
                    id,
                    ExchangeKind::Pull,
                    spec,
                    q,
                )
                .unwrap();
                scheme.add_datatype_info(info).unwrap();
            } else {
                let info = FieldPackInfo::<CellMajor>::new(
                    id,
                    ExchangeKind::Pull,
                    spec,
                    q,
                )
                .unwrap();
                scheme.add_pack_info(info).unwrap();
            }
            scheme.communicate(&mut forest).unwrap();

            for block in forest.blocks() {
                let origin = init::block_origin(block, &shape);
                let field = block.get_data::<Field<CellMajor>>(id).unwrap();
                for c in shape.xyz_size().coord_iter() {
                    for (q, v) in stream.velocities().iter().enumerate() {
                        let source = c - v.offset();
                        let expected =
                            if shape.xyz_size().contains(&source) {
                                global_value(source + origin, q)
                            } else {
                                expected_ghost(
                                    &forest,
                                    &shape,
                                    source + origin,
                                    q,
                                )
                            };
                        assert_eq!(field.get(&source, q), expected);
                    }
                }
            }
        }
    }
}
