//! Mesh extraction: assign output vertex indices, then walk cell adjacency
//! to emit a triangle for every bipolar minimal edge.
//!
//! The traversal visits every interior face and edge of the active tree.
//! Cells seed faces and edges, faces refine into finer faces and edge
//! quadruples, edges refine until all four participants mesh like leaves.
//! The three stacks are consumed in that order; recursion depth is bounded
//! by octree depth either way, the stacks just keep the hot loops flat.

use crate::mesh::MeshBuffers;
use crate::octree::{Edge, Face, Node, NodeId, Octree, ROOT};
use crate::tables::{
    CELL_PROC_EDGE_MASK, CELL_PROC_FACE_MASK, EDGE_ORDERS, EDGE_PROC_EDGE_MASK, EDGE_VERT_MAP,
    FACE_PROC_EDGE_AXIS, FACE_PROC_EDGE_OCTANTS, FACE_PROC_EDGE_ORDER, FACE_PROC_FACE_MASK,
    PROCESS_EDGE_MASK,
};

impl Octree {
    /// Run both contouring passes into `buffers`: vertex indexing, then
    /// topology emission.
    pub fn extract(&mut self, buffers: &mut MeshBuffers) {
        buffers.clear();
        if self.is_empty() {
            return;
        }
        self.index_vertices(ROOT, buffers);
        self.emit_topology(buffers);
    }

    /// Depth-first pass assigning each leaf and collapsed node the next
    /// output vertex index.
    fn index_vertices(&mut self, id: NodeId, buffers: &mut MeshBuffers) {
        let node = self.nodes[id as usize];
        if node.is_internal() {
            for i in 0..8 {
                self.index_vertices(node.child_index + i, buffers);
            }
        }
        if node.has_vertex() {
            let node = &mut self.nodes[id as usize];
            node.draw.vertex_id =
                buffers.push_vertex(node.draw.position.into(), node.draw.average_normal.into());
        }
    }

    fn emit_topology(&mut self, buffers: &mut MeshBuffers) {
        self.clear_stacks();
        self.cell_stack.push(ROOT);
        while let Some(cell) = self.cell_stack.pop() {
            self.contour_cell(cell);
        }
        while let Some(face) = self.face_stack.pop() {
            self.contour_face(face);
        }
        while let Some(edge) = self.edge_stack.pop() {
            self.contour_edge(edge, buffers);
        }
    }

    // 8 cells, 12 faces, 6 edges interior to one subdivided cell.
    fn contour_cell(&mut self, id: NodeId) {
        let node = self.nodes[id as usize];
        if !node.is_internal() {
            return;
        }

        for i in 0..8 {
            self.cell_stack.push(node.child_index + i);
        }

        for (i, pair) in CELL_PROC_FACE_MASK.iter().enumerate() {
            self.face_stack.push(Face {
                axis: i / 4,
                nodes: pair.map(|octant| node.child_index + octant as u32),
            });
        }

        for (i, quad) in CELL_PROC_EDGE_MASK.iter().enumerate() {
            self.edge_stack.push(Edge {
                axis: i / 2,
                nodes: quad.map(|octant| node.child_index + octant as u32),
            });
        }
    }

    // 4 finer faces and 4 edge quadruples interior to one face.
    fn contour_face(&mut self, face: Face) {
        let nodes = face.nodes.map(|id| self.nodes[id as usize]);
        if nodes.iter().any(Node::is_inactive) {
            return;
        }
        if !nodes.iter().any(Node::is_internal) {
            // Nothing finer to resolve on this face.
            return;
        }

        for octants in FACE_PROC_FACE_MASK[face.axis] {
            let pair = [0, 1].map(|side| {
                if nodes[side].is_internal() {
                    nodes[side].child_index + octants[side] as u32
                } else {
                    face.nodes[side]
                }
            });
            self.face_stack.push(Face {
                axis: face.axis,
                nodes: pair,
            });
        }

        for i in 0..4 {
            let order = EDGE_ORDERS[FACE_PROC_EDGE_ORDER[face.axis][i]];
            let octants = FACE_PROC_EDGE_OCTANTS[face.axis][i];
            let quad = [0, 1, 2, 3].map(|slot| {
                let side = order[slot];
                if nodes[side].has_vertex() {
                    face.nodes[side]
                } else {
                    nodes[side].child_index + octants[slot] as u32
                }
            });
            self.edge_stack.push(Edge {
                axis: FACE_PROC_EDGE_AXIS[face.axis][i],
                nodes: quad,
            });
        }
    }

    // 2 finer edge quadruples interior to one edge.
    fn contour_edge(&mut self, edge: Edge, buffers: &mut MeshBuffers) {
        let nodes = edge.nodes.map(|id| self.nodes[id as usize]);
        if nodes.iter().any(Node::is_inactive) {
            return;
        }
        if !nodes.iter().any(Node::is_internal) {
            self.process_edge(&edge, &nodes, buffers);
            return;
        }

        for octants in EDGE_PROC_EDGE_MASK[edge.axis] {
            let quad = [0, 1, 2, 3].map(|slot| {
                if nodes[slot].has_vertex() {
                    edge.nodes[slot]
                } else {
                    nodes[slot].child_index + octants[slot] as u32
                }
            });
            self.edge_stack.push(Edge {
                axis: edge.axis,
                nodes: quad,
            });
        }
    }

    /// Emit triangles for a minimal edge shared by four vertex-bearing
    /// nodes. The smallest cell owns the edge: its corner pair decides both
    /// whether the edge is bipolar and the winding of the two triangles.
    fn process_edge(&self, edge: &Edge, nodes: &[Node; 4], buffers: &mut MeshBuffers) {
        let mut min_size = u32::MAX;
        let mut min_slot = 0;
        let mut flip = false;
        let mut indices = [0; 4];
        let mut sign_change = [false; 4];

        for (slot, node) in nodes.iter().enumerate() {
            let corner_pair = EDGE_VERT_MAP[PROCESS_EDGE_MASK[edge.axis][slot]];
            let m1 = (node.draw.corners >> corner_pair[0]) & 1;
            let m2 = (node.draw.corners >> corner_pair[1]) & 1;

            if node.size < min_size {
                min_size = node.size;
                min_slot = slot;
                flip = m1 != 0;
            }
            indices[slot] = node.draw.vertex_id;
            sign_change[slot] = m1 != m2;
        }

        if !sign_change[min_slot] {
            return;
        }
        if flip {
            buffers.push_triangle([indices[0], indices[3], indices[1]]);
            buffers.push_triangle([indices[0], indices[2], indices[3]]);
        } else {
            buffers.push_triangle([indices[0], indices[1], indices[3]]);
            buffers.push_triangle([indices[0], indices[3], indices[2]]);
        }
    }
}
