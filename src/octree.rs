//! Arena-backed adaptive octree: top-down construction over a density field
//! and bottom-up simplification under a QEF error threshold.
//!
//! Nodes live in a flat arena addressed by index, with each internal node
//! storing the index of its first of 8 contiguous children. Nodes are never
//! removed; deactivation flips the kind tag to `Inactive`.

use crate::config::{MeshConfig, QefParams};
use crate::density::{approximate_zero_crossing, central_gradient, DensityField};
use crate::mesh::{MeshVertexId, NULL_MESH_VERTEX_ID};
use crate::qef::{QefData, QefSolver};
use crate::tables::{CHILD_MIN_OFFSETS, EDGE_VERT_MAP};
use glam::Vec3A;
use tracing::{debug, trace};

pub type NodeId = u32;

/// The root always occupies this arena slot.
pub const ROOT: NodeId = 0;

pub const NULL_CHILD_INDEX: u32 = u32::MAX;

/// Step size for central-difference normal estimation.
const NORMAL_STEP: f32 = 0.001;

/// Edge crossings accumulated per leaf before the scan stops; on
/// high-resolution surfaces not every bipolar edge is needed for a stable
/// fit.
const MAX_CROSSINGS: u32 = 6;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NodeKind {
    /// Not part of the active tree; either never intersected the surface or
    /// absorbed by a collapse.
    #[default]
    Inactive,
    Internal,
    /// A merged subtree; meshes like a leaf but remembers it represents a
    /// larger region.
    Collapsed,
    Leaf,
}

/// Meshing payload of a leaf or collapsed node.
#[derive(Clone, Copy, Debug)]
pub struct DrawInfo {
    /// Bit i set = corner i samples solid (negative density).
    pub corners: u8,
    /// Fitted vertex position.
    pub position: Vec3A,
    pub average_normal: Vec3A,
    /// Output vertex index, assigned by the contouring pass.
    pub vertex_id: MeshVertexId,
    pub qef: QefData,
}

impl Default for DrawInfo {
    fn default() -> Self {
        Self {
            corners: 0,
            position: Vec3A::ZERO,
            average_normal: Vec3A::ZERO,
            vertex_id: NULL_MESH_VERTEX_ID,
            qef: QefData::default(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Node {
    pub kind: NodeKind,
    /// World-space min corner of the cell.
    pub min: Vec3A,
    /// Cell edge length; always a power of two. Leaves have size 1.
    pub size: u32,
    /// Arena index of the first of 8 contiguous children; meaningful only
    /// while `kind == Internal`.
    pub child_index: u32,
    pub draw: DrawInfo,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            kind: NodeKind::Inactive,
            min: Vec3A::ZERO,
            size: 0,
            child_index: NULL_CHILD_INDEX,
            draw: DrawInfo::default(),
        }
    }
}

impl Node {
    pub fn is_internal(&self) -> bool {
        self.kind == NodeKind::Internal
    }

    pub fn is_inactive(&self) -> bool {
        self.kind == NodeKind::Inactive
    }

    /// Leaf or collapsed: owns a fitted vertex and meshes like a leaf.
    pub fn has_vertex(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf | NodeKind::Collapsed)
    }

    /// World-space position of corner `i`.
    pub fn corner(&self, i: usize) -> Vec3A {
        self.min + Vec3A::from(CHILD_MIN_OFFSETS[i]) * self.size as f32
    }

    fn contains(&self, p: Vec3A) -> bool {
        let max = self.min + Vec3A::splat(self.size as f32);
        !(p.cmplt(self.min).any() || p.cmpgt(max).any())
    }
}

/// A face-adjacent pair of cells pending contouring, ordered from the
/// negative to the positive side of `axis`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Face {
    pub axis: usize,
    pub nodes: [NodeId; 2],
}

/// An edge-adjacent quadruple of cells pending contouring.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Edge {
    pub axis: usize,
    pub nodes: [NodeId; 4],
}

#[derive(Debug, Default)]
pub struct Octree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) cell_stack: Vec<NodeId>,
    pub(crate) face_stack: Vec<Face>,
    pub(crate) edge_stack: Vec<Edge>,
}

impl Octree {
    /// Construct the octree top-down over `field`.
    ///
    /// The arena grows geometrically as nodes are allocated; callers that
    /// prefer a single allocation can reserve [`worst_case_node_count`]
    /// slots up front.
    pub fn build(field: &impl DensityField, config: &MeshConfig) -> Self {
        debug!(
            origin = ?config.origin,
            size = config.size,
            threshold = config.threshold,
            "building octree"
        );
        let mut tree = Self::default();
        tree.nodes.push(Node {
            kind: NodeKind::Internal,
            min: config.origin,
            size: config.size,
            ..Default::default()
        });
        tree.construct_node(ROOT, field, &config.qef);
        tree
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn root(&self) -> &Node {
        &self.nodes[ROOT as usize]
    }

    /// True when no cell intersected the surface.
    pub fn is_empty(&self) -> bool {
        self.root().is_inactive()
    }

    pub(crate) fn clear_stacks(&mut self) {
        self.cell_stack.clear();
        self.face_stack.clear();
        self.edge_stack.clear();
    }

    fn construct_node(&mut self, id: NodeId, field: &impl DensityField, params: &QefParams) -> bool {
        let (min, size) = {
            let node = &self.nodes[id as usize];
            (node.min, node.size)
        };
        if size == 1 {
            return self.construct_leaf(id, field, params);
        }

        let child_size = size / 2;
        let child_index = self.nodes.len() as u32;
        self.nodes[id as usize].child_index = child_index;
        self.nodes.resize(self.nodes.len() + 8, Node::default());

        let mut has_children = false;
        for (i, offset) in CHILD_MIN_OFFSETS.iter().enumerate() {
            let child_id = child_index + i as u32;
            let child = &mut self.nodes[child_id as usize];
            child.kind = NodeKind::Internal;
            child.min = min + Vec3A::from(*offset) * child_size as f32;
            child.size = child_size;
            has_children |= self.construct_node(child_id, field, params);
        }

        self.nodes[id as usize].kind = if has_children {
            NodeKind::Internal
        } else {
            NodeKind::Inactive
        };
        has_children
    }

    fn construct_leaf(&mut self, id: NodeId, field: &impl DensityField, params: &QefParams) -> bool {
        let min = self.nodes[id as usize].min;

        let mut corners = 0u8;
        for (i, offset) in CHILD_MIN_OFFSETS.iter().enumerate() {
            if field.density(min + Vec3A::from(*offset)) < 0.0 {
                corners |= 1 << i;
            }
        }
        if corners == 0 || corners == u8::MAX {
            // Cell is entirely inside or outside the volume.
            self.nodes[id as usize].kind = NodeKind::Inactive;
            return false;
        }

        let mut edge_count = 0;
        let mut normal_sum = Vec3A::ZERO;
        let mut qef = QefSolver::default();
        for edge in EDGE_VERT_MAP {
            if edge_count == MAX_CROSSINGS {
                break;
            }
            let m1 = (corners >> edge[0]) & 1;
            let m2 = (corners >> edge[1]) & 1;
            if m1 == m2 {
                // No zero crossing on this edge.
                continue;
            }
            let p1 = min + Vec3A::from(CHILD_MIN_OFFSETS[edge[0] as usize]);
            let p2 = min + Vec3A::from(CHILD_MIN_OFFSETS[edge[1] as usize]);
            let p = approximate_zero_crossing(field, p1, p2);
            let n = central_gradient(field, p, NORMAL_STEP).normalize();
            qef.add(p, n);
            normal_sum += n;
            edge_count += 1;
        }

        let (position, _) = fit_vertex(&qef, min, 1, params);
        let node = &mut self.nodes[id as usize];
        node.draw.position = position;
        node.draw.average_normal = (normal_sum / edge_count as f32).normalize();
        node.draw.corners = corners;
        node.draw.qef = qef.data();
        node.kind = NodeKind::Leaf;
        true
    }

    /// Greedily collapse subtrees whose merged QEF error stays within
    /// `threshold`. A threshold of zero or below disables collapsing.
    pub fn simplify(&mut self, threshold: f32, params: &QefParams) {
        if threshold <= 0.0 {
            return;
        }
        self.simplify_node(ROOT, threshold, params);
    }

    fn simplify_node(&mut self, id: NodeId, threshold: f32, params: &QefParams) {
        let node = self.nodes[id as usize];
        if !node.is_internal() {
            return;
        }

        let mut qef = QefSolver::default();
        let mut signs = [None::<u8>; 8];
        let mut center_votes = 0u32;
        let mut active_children = 0u32;
        let mut collapsible = true;

        for i in 0..8 {
            let child_id = node.child_index + i as u32;
            self.simplify_node(child_id, threshold, params);
            let child = &self.nodes[child_id as usize];
            match child.kind {
                NodeKind::Inactive => {}
                NodeKind::Internal => collapsible = false,
                NodeKind::Leaf | NodeKind::Collapsed => {
                    qef.merge(&child.draw.qef);
                    signs[i] = Some((child.draw.corners >> i) & 1);
                    // Every child's corner 7-i sits at the parent center.
                    center_votes += u32::from((child.draw.corners >> (7 - i)) & 1);
                    active_children += 1;
                }
            }
        }

        if !collapsible {
            // At least one child kept its subtree.
            return;
        }

        let (position, error) = fit_vertex(&qef, node.min, node.size, params);
        if error > threshold {
            return;
        }

        // Corner i is owned by child i where that child survived; corners
        // nobody owns take the majority of the center samples, rounding up.
        let center_bit = u8::from(2 * center_votes >= active_children);
        let mut corners = 0u8;
        for (i, sign) in signs.iter().enumerate() {
            corners |= sign.unwrap_or(center_bit) << i;
        }

        let mut normal_sum = Vec3A::ZERO;
        for i in 0..8 {
            let child = &self.nodes[(node.child_index + i) as usize];
            if child.has_vertex() {
                normal_sum += child.draw.average_normal;
            }
        }

        for i in 0..8 {
            self.deactivate_subtree(node.child_index + i);
        }

        trace!(node = id, error, "collapsed subtree");
        let node = &mut self.nodes[id as usize];
        node.kind = NodeKind::Collapsed;
        node.child_index = NULL_CHILD_INDEX;
        node.draw = DrawInfo {
            corners,
            position,
            average_normal: normal_sum.normalize(),
            vertex_id: NULL_MESH_VERTEX_ID,
            qef: qef.data(),
        };
    }

    fn deactivate_subtree(&mut self, id: NodeId) {
        let node = self.nodes[id as usize];
        if node.is_inactive() {
            return;
        }
        if node.child_index != NULL_CHILD_INDEX {
            for i in 0..8 {
                self.deactivate_subtree(node.child_index + i);
            }
        }
        let node = &mut self.nodes[id as usize];
        node.kind = NodeKind::Inactive;
        node.child_index = NULL_CHILD_INDEX;
    }
}

/// Solve for a cell vertex, substituting the mass point when the
/// least-squares position escapes the cell bounds. The returned error is the
/// least-squares residual either way.
fn fit_vertex(qef: &QefSolver, min: Vec3A, size: u32, params: &QefParams) -> (Vec3A, f32) {
    let (position, error) = qef.solve(params);
    let probe = Node {
        min,
        size,
        ..Default::default()
    };
    if probe.contains(position) {
        (position, error)
    } else {
        (qef.mass_point(), error)
    }
}

/// Node count of a fully subdivided octree with root edge length `size`:
/// one cell at the root plus 8 more per level down to unit cells.
pub fn worst_case_node_count(size: u32) -> usize {
    let depth = size.max(1).trailing_zeros();
    (0..=depth).map(|level| 8usize.pow(level)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MeshConfig;

    fn unit_config() -> MeshConfig {
        MeshConfig {
            size: 1,
            ..Default::default()
        }
    }

    /// Trilinear interpolation of per-corner values over the unit cell.
    fn trilinear(corner_values: [f32; 8]) -> impl Fn(Vec3A) -> f32 {
        move |p| {
            let mut value = 0.0;
            for (i, c) in corner_values.iter().enumerate() {
                let w = Vec3A::ONE - (p - Vec3A::from(CHILD_MIN_OFFSETS[i])).abs();
                value += c * w.x * w.y * w.z;
            }
            value
        }
    }

    #[test]
    fn uniform_field_yields_an_inactive_root() {
        let tree = Octree::build(&|_: Vec3A| 5.0, &unit_config());
        assert!(tree.is_empty());

        let config = MeshConfig {
            size: 16,
            ..Default::default()
        };
        let tree = Octree::build(&|_: Vec3A| 5.0, &config);
        assert!(tree.is_empty());
    }

    #[test]
    fn axis_plane_leaf_registers_four_crossings() {
        let field = |p: Vec3A| p.x - 0.5;
        let tree = Octree::build(&field, &unit_config());
        let root = tree.root();
        assert_eq!(root.kind, NodeKind::Leaf);
        assert_eq!(root.draw.corners, 0b0000_1111);
        assert_eq!(root.draw.qef.num_points, 4);
        assert!((root.draw.position.x - 0.5).abs() < 1e-4);
        assert!((root.draw.average_normal - Vec3A::X).length() < 1e-3);
    }

    #[test]
    fn every_mixed_corner_mask_yields_an_active_leaf() {
        for mask in 1..=254u8 {
            let corner_values =
                std::array::from_fn(|i| if mask & (1 << i) != 0 { -1.0 } else { 1.0 });
            let field = trilinear(corner_values);
            let tree = Octree::build(&field, &unit_config());
            let root = tree.root();
            assert_eq!(root.kind, NodeKind::Leaf, "mask {mask:#010b}");
            assert_eq!(root.draw.corners, mask);
            assert!(
                (1..=MAX_CROSSINGS).contains(&root.draw.qef.num_points),
                "mask {mask:#010b} registered {} crossings",
                root.draw.qef.num_points
            );
        }
    }

    #[test]
    fn out_of_cell_solution_falls_back_to_the_mass_point() {
        // Two nearly parallel planes whose intersection lies far outside the
        // unit cell, while both sample points sit inside it.
        let mut qef = QefSolver::default();
        qef.add(Vec3A::new(0.2, 0.5, 0.5), Vec3A::X);
        qef.add(
            Vec3A::new(0.8, 0.5, 0.5),
            Vec3A::new(1.0, 0.01, 0.0).normalize(),
        );
        let params = QefParams::default();

        let (unclamped, _) = qef.solve(&params);
        let probe = Node {
            min: Vec3A::ZERO,
            size: 1,
            ..Default::default()
        };
        assert!(!probe.contains(unclamped));

        let (position, _) = fit_vertex(&qef, Vec3A::ZERO, 1, &params);
        assert!(probe.contains(position));
        assert_eq!(position, qef.mass_point());
    }

    #[test]
    fn solid_field_with_one_corner_bubble_collapses_to_the_root() {
        // Solid everywhere except a small air pocket around the origin that
        // makes exactly one unit cell bipolar.
        let field = |p: Vec3A| 0.5 - p.length();
        let config = MeshConfig {
            size: 8,
            threshold: f32::INFINITY,
            ..Default::default()
        };
        let mut tree = Octree::build(&field, &config);
        assert_eq!(tree.root().kind, NodeKind::Internal);

        tree.simplify(config.threshold, &config.qef);
        let root = tree.root();
        assert_eq!(root.kind, NodeKind::Collapsed);
        assert_eq!(root.child_index, NULL_CHILD_INDEX);
        // Corner 0 keeps the leaf's air sample; the rest follow the solid
        // center consensus.
        assert_eq!(root.draw.corners, 0b1111_1110);
        assert!(tree
            .nodes()
            .iter()
            .skip(1)
            .all(|node| node.is_inactive()));
    }

    #[test]
    fn non_positive_threshold_disables_collapsing() {
        let field = crate::sdf_primitives::sphere(Vec3A::splat(4.0), 2.5);
        let config = MeshConfig {
            size: 8,
            threshold: -1.0,
            ..Default::default()
        };
        let mut tree = Octree::build(&field, &config);
        let kinds_before: Vec<_> = tree.nodes().iter().map(|n| n.kind).collect();
        tree.simplify(config.threshold, &config.qef);
        let kinds_after: Vec<_> = tree.nodes().iter().map(|n| n.kind).collect();
        assert_eq!(kinds_before, kinds_after);
    }

    #[test]
    fn infinite_threshold_collapses_a_sphere_tree() {
        let field = crate::sdf_primitives::sphere(Vec3A::splat(4.0), 2.5);
        let config = MeshConfig {
            size: 8,
            threshold: f32::INFINITY,
            ..Default::default()
        };
        let mut tree = Octree::build(&field, &config);
        tree.simplify(config.threshold, &config.qef);
        assert_eq!(tree.root().kind, NodeKind::Collapsed);
    }

    #[test]
    fn worst_case_counts_cover_full_subdivision() {
        assert_eq!(worst_case_node_count(1), 1);
        assert_eq!(worst_case_node_count(2), 9);
        assert_eq!(worst_case_node_count(4), 73);
    }
}
