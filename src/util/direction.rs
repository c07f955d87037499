use crate::util::*;

/// The 27 stencil directions of a 3D block neighborhood.
/// East is +x, North is +y, Top is +z.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    C,
    N,
    S,
    W,
    E,
    T,
    B,
    NW,
    NE,
    SW,
    SE,
    TN,
    TS,
    TW,
    TE,
    BN,
    BS,
    BW,
    BE,
    TNE,
    TNW,
    TSE,
    TSW,
    BNE,
    BNW,
    BSE,
    BSW,
}

use Direction::*;

const OFFSETS: [[i32; 3]; 27] = [
    [0, 0, 0],
    [0, 1, 0],
    [0, -1, 0],
    [-1, 0, 0],
    [1, 0, 0],
    [0, 0, 1],
    [0, 0, -1],
    [-1, 1, 0],
    [1, 1, 0],
    [-1, -1, 0],
    [1, -1, 0],
    [0, 1, 1],
    [0, -1, 1],
    [-1, 0, 1],
    [1, 0, 1],
    [0, 1, -1],
    [0, -1, -1],
    [-1, 0, -1],
    [1, 0, -1],
    [1, 1, 1],
    [-1, 1, 1],
    [1, -1, 1],
    [-1, -1, 1],
    [1, 1, -1],
    [-1, 1, -1],
    [1, -1, -1],
    [-1, -1, -1],
];

const NAMES: [&str; 27] = [
    "C", "N", "S", "W", "E", "T", "B", "NW", "NE", "SW", "SE", "TN", "TS",
    "TW", "TE", "BN", "BS", "BW", "BE", "TNE", "TNW", "TSE", "TSW", "BNE",
    "BNW", "BSE", "BSW",
];

impl Direction {
    pub const ALL: [Direction; 27] = [
        C, N, S, W, E, T, B, NW, NE, SW, SE, TN, TS, TW, TE, BN, BS, BW, BE,
        TNE, TNW, TSE, TSW, BNE, BNW, BSE, BSW,
    ];

    /// Every direction except the center.
    pub const NEIGHBORS: [Direction; 26] = [
        N, S, W, E, T, B, NW, NE, SW, SE, TN, TS, TW, TE, BN, BS, BW, BE,
        TNE, TNW, TSE, TSW, BNE, BNW, BSE, BSW,
    ];

    pub const FACES: [Direction; 6] = [N, S, W, E, T, B];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn offset(self) -> Coord<3> {
        Coord::from_column_slice(&OFFSETS[self.index()])
    }

    pub fn from_offset(offset: &Coord<3>) -> Option<Direction> {
        Self::ALL.into_iter().find(|d| d.offset() == *offset)
    }

    pub fn inverse(self) -> Direction {
        match self {
            C => C,
            N => S,
            S => N,
            W => E,
            E => W,
            T => B,
            B => T,
            NW => SE,
            NE => SW,
            SW => NE,
            SE => NW,
            TN => BS,
            TS => BN,
            TW => BE,
            TE => BW,
            BN => TS,
            BS => TN,
            BW => TE,
            BE => TW,
            TNE => BSW,
            TNW => BSE,
            TSE => BNW,
            TSW => BNE,
            BNE => TSW,
            BNW => TSE,
            BSE => TNW,
            BSW => TNE,
        }
    }

    /// Number of non-zero axes: 1 for faces, 2 for edges, 3 for corners.
    pub fn order(self) -> usize {
        OFFSETS[self.index()].iter().filter(|o| **o != 0).count()
    }

    pub fn is_face(self) -> bool {
        self.order() == 1
    }

    pub fn name(self) -> &'static str {
        NAMES[self.index()]
    }

    /// The direction itself followed by every direction whose offset
    /// keeps a non empty subset of its non-zero axes, edges before faces.
    /// Data needed across a corner is also needed across the adjacent
    /// edges and faces.
    pub fn sub_directions(self) -> Vec<Direction> {
        let offset = self.offset();
        let mut result: Vec<Direction> = Direction::NEIGHBORS
            .into_iter()
            .filter(|d| {
                *d != self
                    && d.offset()
                        .iter()
                        .zip(offset.iter())
                        .all(|(s, o)| *s == 0 || s == o)
            })
            .collect();
        result.sort_by_key(|d| std::cmp::Reverse(d.order()));
        result.insert(0, self);
        result
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn inverse_test() {
        for d in Direction::ALL {
            assert_eq!(d.inverse().offset(), -d.offset());
            assert_eq!(d.inverse().inverse(), d);
        }
        assert_eq!(Direction::E.inverse(), Direction::W);
        assert_eq!(Direction::TNE.inverse(), Direction::BSW);
    }

    #[test]
    fn offsets_unique_test() {
        let mut seen = std::collections::HashSet::new();
        for d in Direction::ALL {
            assert!(seen.insert(d.offset()));
            assert_eq!(Direction::from_offset(&d.offset()), Some(d));
            let position = Direction::ALL.iter().position(|x| *x == d);
            assert_eq!(Some(d.index()), position);
        }
        assert_eq!(Direction::from_offset(&vector![2, 0, 0]), None);
    }

    #[test]
    fn order_test() {
        assert_eq!(Direction::C.order(), 0);
        assert_eq!(Direction::FACES.len(), 6);
        for d in Direction::FACES {
            assert!(d.is_face());
        }
        assert_eq!(Direction::NE.order(), 2);
        assert_eq!(Direction::BSW.order(), 3);
        assert_eq!(
            Direction::NEIGHBORS.iter().filter(|d| d.order() == 2).count(),
            12
        );
    }

    #[test]
    fn sub_directions_test() {
        assert_eq!(Direction::E.sub_directions(), vec![Direction::E]);
        assert_eq!(
            Direction::NE.sub_directions(),
            vec![Direction::NE, Direction::N, Direction::E]
        );
        assert_eq!(
            Direction::TNE.sub_directions(),
            vec![
                Direction::TNE,
                Direction::NE,
                Direction::TN,
                Direction::TE,
                Direction::N,
                Direction::E,
                Direction::T,
            ]
        );
        for d in Direction::NEIGHBORS {
            let subs = d.sub_directions();
            assert_eq!(subs.len(), (1 << d.order()) - 1, "{d}");
            assert!(subs.iter().all(|s| s.offset().dot(&d.offset())
                == s.order() as i32));
        }
    }

    #[test]
    fn display_test() {
        assert_eq!(format!("{}", Direction::BSW), "BSW");
    }
}
