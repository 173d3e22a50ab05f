//! Model asset and outlined rendering data
//!
//! Assets are loaded by an external loader and handed over as named nodes.
//! [`OutlinedModel`] pairs each styled node with its extracted feature edges
//! and spins the nodes that ask for it.

use crate::edges::extract_edges;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use vantage_core::Vec3;

/// Indexed triangle mesh
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    /// Triangle list indices into `positions`
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self { positions, indices }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned box centered on the origin, four vertices per face
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let (hw, hh, hd) = (width / 2.0, height / 2.0, depth / 2.0);
        let faces: [[[f32; 3]; 4]; 6] = [
            // +X
            [[hw, -hh, hd], [hw, -hh, -hd], [hw, hh, -hd], [hw, hh, hd]],
            // -X
            [[-hw, -hh, -hd], [-hw, -hh, hd], [-hw, hh, hd], [-hw, hh, -hd]],
            // +Y
            [[-hw, hh, hd], [hw, hh, hd], [hw, hh, -hd], [-hw, hh, -hd]],
            // -Y
            [[-hw, -hh, -hd], [hw, -hh, -hd], [hw, -hh, hd], [-hw, -hh, hd]],
            // +Z
            [[-hw, -hh, hd], [hw, -hh, hd], [hw, hh, hd], [-hw, hh, hd]],
            // -Z
            [[hw, -hh, -hd], [-hw, -hh, -hd], [-hw, hh, -hd], [hw, hh, -hd]],
        ];

        let mut positions = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for face in faces {
            let base = positions.len() as u32;
            positions.extend(face.into_iter().map(Vec3::from));
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self::new(positions, indices)
    }
}

/// A named sub-mesh with its transform
#[derive(Clone, Debug)]
pub struct ModelNode {
    pub name: String,
    pub mesh: Mesh,
    pub position: Vec3,
    /// Euler angles in radians
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl ModelNode {
    pub fn new(name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            name: name.into(),
            mesh,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }
}

/// A loaded model: named nodes in load order
#[derive(Clone, Debug, Default)]
pub struct ModelAsset {
    nodes: Vec<ModelNode>,
    by_name: FxHashMap<String, usize>,
}

impl ModelAsset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node(mut self, node: ModelNode) -> Self {
        self.insert(node);
        self
    }

    /// Add a node, replacing any node with the same name
    pub fn insert(&mut self, node: ModelNode) {
        match self.by_name.get(&node.name) {
            Some(&i) => self.nodes[i] = node,
            None => {
                self.by_name.insert(node.name.clone(), self.nodes.len());
                self.nodes.push(node);
            }
        }
    }

    pub fn node(&self, name: &str) -> Option<&ModelNode> {
        self.by_name.get(name).map(|&i| &self.nodes[i])
    }

    pub fn nodes(&self) -> &[ModelNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Per-node outline style
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeStyle {
    /// Fill color of the faces
    pub fill: String,
    /// Line color of the edges
    pub stroke: String,
    /// Line width in pixels
    pub line_width: f32,
    /// Crease angle in degrees
    pub threshold: f32,
    pub spin: bool,
    /// Spin clockwise
    pub reverse: bool,
    /// Radians per second
    pub spin_speed: f32,
    /// Shade faces with scene lights instead of a flat fill
    pub lit: bool,
}

impl Default for EdgeStyle {
    fn default() -> Self {
        Self {
            fill: "#222120".to_string(),
            stroke: "#fff".to_string(),
            line_width: 3.0,
            threshold: 2.0,
            spin: true,
            reverse: false,
            spin_speed: 0.5,
            lit: false,
        }
    }
}

/// A node name paired with its style
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeStyle {
    pub name: String,
    #[serde(flatten)]
    pub style: EdgeStyle,
}

impl NodeStyle {
    pub fn new(name: impl Into<String>, style: EdgeStyle) -> Self {
        Self {
            name: name.into(),
            style,
        }
    }
}

/// Styles for the portfolio model's sub-meshes
pub fn default_node_styles() -> Vec<NodeStyle> {
    let still = |threshold: f32, reverse: bool| EdgeStyle {
        line_width: 1.0,
        threshold,
        spin: false,
        reverse,
        ..EdgeStyle::default()
    };
    let spinning = |reverse: bool| EdgeStyle {
        line_width: 1.0,
        reverse,
        ..EdgeStyle::default()
    };
    vec![
        NodeStyle::new("A_Frame", still(2.0, false)),
        NodeStyle::new("A_Screen", still(20.0, false)),
        NodeStyle::new("B_Sides", still(2.0, false)),
        NodeStyle::new("C_Cover", still(2.0, true)),
        NodeStyle::new("E_NodeCover", still(2.0, true)),
        NodeStyle::new("F_Node", still(2.0, true)),
        NodeStyle::new("G_Cover_Inner", still(4.0, true)),
        NodeStyle::new("H_Tube_Connector", still(2.0, true)),
        NodeStyle::new("I_Tube", spinning(false)),
        NodeStyle::new("J_Cap", spinning(true)),
    ]
}

/// A styled node ready for drawing
#[derive(Clone, Debug)]
pub struct OutlinedNode {
    pub name: String,
    pub style: EdgeStyle,
    /// Segment endpoints in node space, two per segment
    pub edges: Vec<Vec3>,
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl OutlinedNode {
    pub fn segment_count(&self) -> usize {
        self.edges.len() / 2
    }
}

/// The outlined model drawn by the scene
#[derive(Clone, Debug, Default)]
pub struct OutlinedModel {
    nodes: Vec<OutlinedNode>,
}

impl OutlinedModel {
    /// Build outline data for every styled node present in `asset`
    ///
    /// Styled nodes missing from the asset are skipped with a warning.
    pub fn build(asset: &ModelAsset, styles: &[NodeStyle]) -> Self {
        let mut nodes = Vec::with_capacity(styles.len());
        for NodeStyle { name, style } in styles {
            let Some(node) = asset.node(name) else {
                tracing::warn!(node = %name, "model node not found, skipping");
                continue;
            };
            nodes.push(OutlinedNode {
                name: name.clone(),
                style: style.clone(),
                edges: extract_edges(&node.mesh, style.threshold),
                position: node.position,
                rotation: node.rotation,
                scale: node.scale,
            });
        }
        tracing::debug!(nodes = nodes.len(), "outlined model built");
        Self { nodes }
    }

    /// Advance spinning nodes around their Z axis
    pub fn spin(&mut self, dt_ms: f32) {
        let dt = dt_ms / 1000.0;
        for node in self.nodes.iter_mut().filter(|n| n.style.spin) {
            let direction = if node.style.reverse { -1.0 } else { 1.0 };
            node.rotation.z += dt * node.style.spin_speed * direction;
        }
    }

    pub fn nodes(&self) -> &[OutlinedNode] {
        &self.nodes
    }

    pub fn node(&self, name: &str) -> Option<&OutlinedNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Total segments across all nodes
    pub fn segment_count(&self) -> usize {
        self.nodes.iter().map(OutlinedNode::segment_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset() -> ModelAsset {
        ModelAsset::new()
            .with_node(ModelNode::new("I_Tube", Mesh::cuboid(1.0, 1.0, 1.0)))
            .with_node(ModelNode::new("J_Cap", Mesh::cuboid(0.5, 0.5, 0.5)))
            .with_node(
                ModelNode::new("A_Frame", Mesh::cuboid(2.0, 1.0, 0.1))
                    .with_position(Vec3::new(0.0, 1.0, 0.0)),
            )
    }

    #[test]
    fn test_missing_nodes_are_skipped() {
        let model = OutlinedModel::build(&asset(), &default_node_styles());
        assert_eq!(model.nodes().len(), 3);
        assert!(model.node("A_Screen").is_none());
        assert_eq!(model.node("A_Frame").unwrap().position, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(model.segment_count(), 36);
    }

    #[test]
    fn test_spin_direction_and_speed() {
        let mut model = OutlinedModel::build(&asset(), &default_node_styles());
        model.spin(1000.0);
        assert!((model.node("I_Tube").unwrap().rotation.z - 0.5).abs() < 1e-6);
        assert!((model.node("J_Cap").unwrap().rotation.z + 0.5).abs() < 1e-6);
        assert_eq!(model.node("A_Frame").unwrap().rotation.z, 0.0);
    }

    #[test]
    fn test_insert_replaces_by_name() {
        let mut asset = asset();
        asset.insert(ModelNode::new("J_Cap", Mesh::default()));
        assert_eq!(asset.len(), 3);
        assert_eq!(asset.node("J_Cap").unwrap().mesh.triangle_count(), 0);
    }

    #[test]
    fn test_default_styles() {
        let styles = default_node_styles();
        assert_eq!(styles.len(), 10);
        let screen = styles.iter().find(|s| s.name == "A_Screen").unwrap();
        assert_eq!(screen.style.threshold, 20.0);
        assert!(!screen.style.spin);
        let cap = styles.iter().find(|s| s.name == "J_Cap").unwrap();
        assert!(cap.style.spin && cap.style.reverse);
    }
}
