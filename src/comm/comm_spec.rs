use crate::error::*;
use crate::field::*;
use crate::util::*;
use std::collections::BTreeSet;

/// One stencil access of a kernel: component `component` of the cell
/// at `offset` from the updated cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldAccess {
    pub offset: Coord<3>,
    pub component: usize,
}

impl FieldAccess {
    pub fn new(offset: [i32; 3], component: usize) -> Self {
        FieldAccess {
            offset: vector![offset[0], offset[1], offset[2]],
            component,
        }
    }

    pub fn center(component: usize) -> Self {
        Self::new([0, 0, 0], component)
    }
}

/// Addressing of an exchange. Pull sends interior slices into the
/// neighbour's ghost layers, push sends ghost layers back into the
/// neighbour's interior.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExchangeKind {
    #[default]
    Pull,
    Push,
}

impl ExchangeKind {
    /// Cells sent to the neighbour in `dir`.
    pub fn send_region(
        self,
        shape: &FieldShape,
        dir: Direction,
        thickness: usize,
    ) -> Result<CellInterval> {
        match self {
            ExchangeKind::Pull => {
                shape.slice_before_ghost_layer(dir, thickness)
            }
            ExchangeKind::Push => shape.ghost_region(dir, thickness),
        }
    }

    /// Cells filled from the neighbour in `dir`.
    pub fn recv_region(
        self,
        shape: &FieldShape,
        dir: Direction,
        thickness: usize,
    ) -> Result<CellInterval> {
        match self {
            ExchangeKind::Pull => shape.ghost_region(dir, thickness),
            ExchangeKind::Push => {
                shape.slice_before_ghost_layer(dir, thickness)
            }
        }
    }
}

/// For every direction, the sorted components that are sent towards it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommSpec {
    components: [Vec<usize>; 27],
}

impl CommSpec {
    fn from_sets(sets: [BTreeSet<usize>; 27]) -> Self {
        CommSpec {
            components: sets.map(|set| set.into_iter().collect()),
        }
    }

    /// Every component of an `f_size` field in each of `directions`.
    pub fn all_components(f_size: usize, directions: &[Direction]) -> Self {
        let mut components: [Vec<usize>; 27] = Default::default();
        for dir in directions {
            if *dir != Direction::C {
                components[dir.index()] = (0..f_size).collect();
            }
        }
        CommSpec { components }
    }

    /// Derive the exchanged components from stencil accesses.
    /// Under pull addressing a read at offset `o` needs the neighbour in
    /// `o` to send towards `inverse(o)`. Under push addressing a write at
    /// `o` is sent towards `o`. Data crossing an edge or corner also
    /// crosses the adjacent edges and faces.
    pub fn from_accesses(
        kind: ExchangeKind,
        reads: &[FieldAccess],
        writes: &[FieldAccess],
    ) -> Result<Self> {
        let accesses = match kind {
            ExchangeKind::Pull => reads,
            ExchangeKind::Push => writes,
        };
        let mut sets: [BTreeSet<usize>; 27] = Default::default();
        for access in accesses {
            let offset = access.offset;
            let dir = Direction::from_offset(&offset).ok_or_else(|| {
                HaloError::IllFormedStencil {
                    reason: format!(
                        "access {:?} leaves the first neighborhood",
                        offset.as_slice()
                    ),
                }
            })?;
            if dir == Direction::C {
                continue;
            }
            let comm_dir = match kind {
                ExchangeKind::Pull => dir.inverse(),
                ExchangeKind::Push => dir,
            };
            for sub in comm_dir.sub_directions() {
                sets[sub.index()].insert(access.component);
            }
        }
        Ok(Self::from_sets(sets))
    }

    pub fn components(&self, dir: Direction) -> &[usize] {
        &self.components[dir.index()]
    }

    /// Directions with at least one exchanged component.
    pub fn directions(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::NEIGHBORS
            .into_iter()
            .filter(|d| !self.components[d.index()].is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.components.iter().all(|c| c.is_empty())
    }

    /// Every component must exist in an `f_size` field.
    pub fn validate(&self, f_size: usize) -> Result<()> {
        for components in &self.components {
            let out_of_range = components.iter().find(|c| **c >= f_size);
            if let Some(&component) = out_of_range {
                return Err(HaloError::ComponentOutOfRange {
                    component,
                    f_size,
                });
            }
        }
        Ok(())
    }
}
