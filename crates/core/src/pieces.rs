//! Pieces module - tetromino geometry and kick offset tables
//!
//! Every (kind, rotation) pair is a plain `Copy` value backed by static
//! lookup tables built at compile time, so equal pieces always compare equal
//! and no geometry is ever allocated.
//!
//! Rotation `r + 1` is derived from rotation `r` by turning every cell a
//! quarter clockwise around the anchor: `(x, y) -> (y, -x)`.
//!
//! Kicks use per-rotation offset tables. For a rotation from `a` to `b` the
//! candidate offsets are `table(a)[i] - table(b)[i]`, tried in index order.

use arrayvec::ArrayVec;

use crate::types::{PieceKind, Point, Rotation, Turn};

/// The four cells of a piece, relative to its anchor point
pub type Geometry = [Point; 4];

const fn p(x: i8, y: i8) -> Point {
    Point::new(x, y)
}

const fn rotations(base: Geometry) -> [Geometry; 4] {
    let mut out = [base; 4];
    let mut r = 1;
    while r < 4 {
        let mut i = 0;
        while i < 4 {
            out[r][i] = out[r - 1][i].rotate_right();
            i += 1;
        }
        r += 1;
    }
    out
}

/// Geometry for every kind (indexed by `PieceKind::index`) and rotation
static GEOMETRY: [[Geometry; 4]; 7] = [
    rotations([p(-1, 0), p(0, 0), p(1, 0), p(2, 0)]),  // I
    rotations([p(-1, 1), p(-1, 0), p(0, 0), p(1, 0)]), // J
    rotations([p(1, 1), p(-1, 0), p(0, 0), p(1, 0)]),  // L
    rotations([p(0, 1), p(1, 1), p(0, 0), p(1, 0)]),   // O
    rotations([p(0, 1), p(1, 1), p(-1, 0), p(0, 0)]),  // S
    rotations([p(0, 1), p(-1, 0), p(0, 0), p(1, 0)]),  // T
    rotations([p(-1, 1), p(0, 1), p(0, 0), p(1, 0)]),  // Z
];

/// O never kicks; its table only re-centres the square after a turn
static O_KICKS: [[Point; 1]; 4] = [[p(0, 0)], [p(0, -1)], [p(-1, -1)], [p(-1, 0)]];

static I_KICKS: [[Point; 5]; 4] = [
    [p(0, 0), p(-1, 0), p(2, 0), p(-1, 0), p(0, -2)],
    [p(-1, 0), p(0, 0), p(0, 0), p(0, 1), p(0, -2)],
    [p(-1, 1), p(1, 1), p(-2, 1), p(1, 0), p(-2, 0)],
    [p(0, 1), p(0, 1), p(0, 1), p(0, -1), p(0, 2)],
];

/// Shared by J, L, S, T and Z
static JLSTZ_KICKS: [[Point; 5]; 4] = [
    [p(0, 0), p(0, 0), p(0, 0), p(0, 0), p(0, 0)],
    [p(0, 0), p(1, 0), p(1, -1), p(0, 2), p(1, 2)],
    [p(0, 0), p(0, 0), p(0, 0), p(0, 0), p(0, 0)],
    [p(0, 0), p(-1, 0), p(-1, -1), p(0, 2), p(-1, 2)],
];

/// A tetromino in one rotation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tetromino {
    pub kind: PieceKind,
    pub rotation: Rotation,
}

impl Tetromino {
    pub const fn new(kind: PieceKind, rotation: Rotation) -> Self {
        Self { kind, rotation }
    }

    /// The spawn orientation of a piece kind
    pub const fn spawn(kind: PieceKind) -> Self {
        Self::new(kind, Rotation::North)
    }

    /// Cell offsets relative to the anchor
    pub fn geometry(&self) -> &'static Geometry {
        &GEOMETRY[self.kind.index()][self.rotation.index()]
    }

    /// Kick offset table for this rotation state
    pub fn kick_offsets(&self) -> &'static [Point] {
        let r = self.rotation.index();
        match self.kind {
            PieceKind::O => &O_KICKS[r][..],
            PieceKind::I => &I_KICKS[r][..],
            _ => &JLSTZ_KICKS[r][..],
        }
    }

    pub fn rotate_left(self) -> Self {
        Self::new(self.kind, self.rotation.rotate_ccw())
    }

    pub fn rotate_right(self) -> Self {
        Self::new(self.kind, self.rotation.rotate_cw())
    }

    pub fn turned(self, turn: Turn) -> Self {
        Self::new(self.kind, self.rotation.turn(turn))
    }

    /// Same kind, back in the spawn orientation
    pub fn reset(self) -> Self {
        Self::spawn(self.kind)
    }

    /// Absolute cells when anchored at `at`
    pub fn cells_at(&self, at: Point) -> impl Iterator<Item = Point> + '_ {
        self.geometry().iter().map(move |&c| c + at)
    }

    /// Anchor offsets to try when turning into `target`, in priority order
    pub fn kick_candidates(&self, target: &Tetromino) -> ArrayVec<Point, 5> {
        self.kick_offsets()
            .iter()
            .zip(target.kick_offsets())
            .map(|(&from, &to)| from - to)
            .collect()
    }

    /// Centre of the bounding box, for preview layout only
    pub fn center(&self) -> (f32, f32) {
        let g = self.geometry();
        let (mut min_x, mut max_x) = (g[0].x, g[0].x);
        let (mut min_y, mut max_y) = (g[0].y, g[0].y);
        for c in &g[1..] {
            min_x = min_x.min(c.x);
            max_x = max_x.max(c.x);
            min_y = min_y.min(c.y);
            max_y = max_y.max(c.y);
        }
        (
            (min_x as f32 + max_x as f32) / 2.0,
            (min_y as f32 + max_y as f32) / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROTATIONS: [Rotation; 4] = [
        Rotation::North,
        Rotation::East,
        Rotation::South,
        Rotation::West,
    ];

    fn sorted(cells: impl Iterator<Item = Point>) -> Vec<(i8, i8)> {
        let mut v: Vec<_> = cells.map(|c| (c.x, c.y)).collect();
        v.sort();
        v
    }

    #[test]
    fn test_spawn_geometry() {
        let t = Tetromino::spawn(PieceKind::T);
        assert_eq!(
            t.geometry(),
            &[p(0, 1), p(-1, 0), p(0, 0), p(1, 0)]
        );
        let i = Tetromino::spawn(PieceKind::I);
        assert_eq!(i.geometry()[3], p(2, 0));
    }

    #[test]
    fn test_rotation_is_quarter_turn_clockwise() {
        for kind in PieceKind::ALL {
            for rotation in ROTATIONS {
                let piece = Tetromino::new(kind, rotation);
                let next = piece.rotate_right();
                for (a, b) in piece.geometry().iter().zip(next.geometry()) {
                    assert_eq!(a.rotate_right(), *b);
                }
                assert_eq!(next.rotate_left(), piece);
            }
        }
    }

    #[test]
    fn test_o_rotation_keeps_square_in_place() {
        let at = p(4, 10);
        for rotation in ROTATIONS {
            let o = Tetromino::new(PieceKind::O, rotation);
            let target = o.rotate_right();
            let offsets = o.kick_candidates(&target);
            assert_eq!(offsets.len(), 1);
            assert_eq!(
                sorted(o.cells_at(at)),
                sorted(target.cells_at(at + offsets[0]))
            );
        }
    }

    #[test]
    fn test_t_kick_candidates_north_to_east() {
        let t = Tetromino::spawn(PieceKind::T);
        let offsets = t.kick_candidates(&t.rotate_right());
        assert_eq!(
            offsets.as_slice(),
            &[p(0, 0), p(-1, 0), p(-1, 1), p(0, -2), p(-1, -2)]
        );
    }

    #[test]
    fn test_i_kick_candidates_north_to_east() {
        let i = Tetromino::spawn(PieceKind::I);
        let offsets = i.kick_candidates(&i.rotate_right());
        assert_eq!(
            offsets.as_slice(),
            &[p(1, 0), p(-1, 0), p(2, 0), p(-1, -1), p(0, 0)]
        );
    }

    #[test]
    fn test_i_kick_candidates_west_to_north() {
        let west = Tetromino::new(PieceKind::I, Rotation::West);
        let offsets = west.kick_candidates(&west.rotate_right());
        assert_eq!(
            offsets.as_slice(),
            &[p(0, 1), p(1, 1), p(-2, 1), p(1, -1), p(0, 4)]
        );
    }

    #[test]
    fn test_reset_and_center() {
        let l = Tetromino::new(PieceKind::L, Rotation::South);
        assert_eq!(l.reset(), Tetromino::spawn(PieceKind::L));
        assert_eq!(Tetromino::spawn(PieceKind::O).center(), (0.5, 0.5));
        assert_eq!(Tetromino::spawn(PieceKind::I).center(), (0.5, 0.0));
    }
}
