//! Fixed cube-topology tables driving octree construction and contouring.
//!
//! Corner index bits: bit 2 = x, bit 1 = y, bit 0 = z, matching
//! `CHILD_MIN_OFFSETS`. All of the contouring masks assume this layout and
//! must be kept in sync with each other; none of them is derived at runtime.

/// Min-corner offsets of the 8 octants (and the 8 corners of a unit cell).
pub const CHILD_MIN_OFFSETS: [[f32; 3]; 8] = [
    [0.0, 0.0, 0.0],
    [0.0, 0.0, 1.0],
    [0.0, 1.0, 0.0],
    [0.0, 1.0, 1.0],
    [1.0, 0.0, 0.0],
    [1.0, 0.0, 1.0],
    [1.0, 1.0, 0.0],
    [1.0, 1.0, 1.0],
];

/// Corner pairs for the 12 scanned cell edges, grouped 4 per axis (x, y, z).
pub const EDGE_VERT_MAP: [[u8; 2]; 12] = [
    [2, 4],
    [1, 5],
    [2, 6],
    [3, 7],
    [0, 2],
    [1, 3],
    [4, 6],
    [5, 7],
    [0, 1],
    [2, 3],
    [4, 5],
    [6, 7],
];

/// Octant pairs sharing one of the 12 interior faces of a subdivided cell.
/// Entry i belongs to axis i / 4.
pub const CELL_PROC_FACE_MASK: [[u8; 2]; 12] = [
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
    [0, 2],
    [4, 6],
    [1, 3],
    [5, 7],
    [0, 1],
    [2, 3],
    [4, 5],
    [6, 7],
];

/// Octant quadruples sharing one of the 6 interior edges of a subdivided
/// cell. Entry i belongs to axis i / 2.
pub const CELL_PROC_EDGE_MASK: [[u8; 4]; 6] = [
    [0, 1, 2, 3],
    [4, 5, 6, 7],
    [0, 4, 1, 5],
    [2, 6, 3, 7],
    [0, 2, 4, 6],
    [1, 3, 5, 7],
];

/// Per face axis, the 4 finer face-adjacent octant pairs. The first octant
/// descends the negative-side cell, the second the positive side.
pub const FACE_PROC_FACE_MASK: [[[u8; 2]; 4]; 3] = [
    [[4, 0], [5, 1], [6, 2], [7, 3]],
    [[2, 0], [6, 4], [3, 1], [7, 5]],
    [[1, 0], [3, 2], [5, 4], [7, 6]],
];

/// Per face axis, the octants forming each of the 4 edge quadruples derived
/// from that face. Paired with `FACE_PROC_EDGE_ORDER` (which parent supplies
/// each slot) and `FACE_PROC_EDGE_AXIS` (the resulting edge axis).
pub const FACE_PROC_EDGE_OCTANTS: [[[u8; 4]; 4]; 3] = [
    [[4, 0, 5, 1], [6, 2, 7, 3], [4, 6, 0, 2], [5, 7, 1, 3]],
    [[2, 3, 0, 1], [6, 7, 4, 5], [2, 0, 6, 4], [3, 1, 7, 5]],
    [[1, 0, 3, 2], [5, 4, 7, 6], [1, 5, 0, 4], [3, 7, 2, 6]],
];

/// Selects one of `EDGE_ORDERS` for each face-derived edge quadruple.
pub const FACE_PROC_EDGE_ORDER: [[usize; 4]; 3] = [
    [1, 1, 0, 0],
    [0, 0, 1, 1],
    [1, 1, 0, 0],
];

/// Axis of each edge quadruple derived from a face ("face axis" is not the
/// same as "edge axis").
pub const FACE_PROC_EDGE_AXIS: [[usize; 4]; 3] = [
    [1, 1, 2, 2],
    [0, 0, 2, 2],
    [0, 0, 1, 1],
];

/// The two ways the parent pair of a face maps onto an edge quadruple.
pub const EDGE_ORDERS: [[usize; 4]; 2] = [[0, 0, 1, 1], [0, 1, 0, 1]];

/// Per edge axis, the 2 finer edge quadruples interior to an edge.
pub const EDGE_PROC_EDGE_MASK: [[[u8; 4]; 2]; 3] = [
    [[3, 2, 1, 0], [7, 6, 5, 4]],
    [[5, 1, 4, 0], [7, 3, 6, 2]],
    [[6, 4, 2, 0], [7, 5, 3, 1]],
];

/// Per edge axis, the `EDGE_VERT_MAP` entry describing the shared edge from
/// the perspective of each of the 4 nodes around it.
pub const PROCESS_EDGE_MASK: [[usize; 4]; 3] = [
    [3, 2, 1, 0],
    [7, 5, 6, 4],
    [11, 10, 9, 8],
];
