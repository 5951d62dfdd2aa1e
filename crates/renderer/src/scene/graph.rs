//! Named-node transform graph. Every renderable unit (a particle group, a
//! glyph cloud, each mesh node of a loaded asset) registers a node with a
//! fixed base transform; per-frame spin effects write absolute rotation
//! angles derived from elapsed time into those nodes. Writing to an absent
//! node is a guarded no-op.

use std::collections::BTreeMap;

use glam::{EulerRot, Mat4, Vec3};

use crate::types::Axis;

/// Rotation derived from elapsed time; same input, same output.
pub fn spin_angle(elapsed: f32, rate: f32) -> f32 {
    elapsed * rate
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeTransform {
    base: Mat4,
    rotation: Vec3,
}

impl NodeTransform {
    pub fn new(base: Mat4) -> Self {
        Self {
            base,
            rotation: Vec3::ZERO,
        }
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    /// Base transform composed with the accumulated rotation.
    pub fn matrix(&self) -> Mat4 {
        self.base
            * Mat4::from_euler(
                EulerRot::YXZ,
                self.rotation.y,
                self.rotation.x,
                self.rotation.z,
            )
    }
}

#[derive(Debug, Default, Clone)]
pub struct SceneGraph {
    nodes: BTreeMap<String, NodeTransform>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, base: Mat4) {
        self.nodes.insert(name.into(), NodeTransform::new(base));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn node(&self, name: &str) -> Option<&NodeTransform> {
        self.nodes.get(name)
    }

    /// World matrix for a node; identity when the node is unknown.
    pub fn matrix(&self, name: &str) -> Mat4 {
        self.nodes
            .get(name)
            .map(NodeTransform::matrix)
            .unwrap_or(Mat4::IDENTITY)
    }

    /// Writes an absolute rotation angle on one axis. Returns `false` (and
    /// changes nothing) when the node does not exist.
    pub fn set_rotation(&mut self, name: &str, axis: Axis, angle: f32) -> bool {
        let Some(node) = self.nodes.get_mut(name) else {
            return false;
        };
        match axis {
            Axis::X => node.rotation.x = angle,
            Axis::Y => node.rotation.y = angle,
            Axis::Z => node.rotation.z = angle,
        }
        true
    }
}

/// A per-frame rotation driver bound to a named node.
#[derive(Debug, Clone)]
pub struct SpinEffect {
    pub node: String,
    pub axis: Axis,
    pub rate: f32,
}

/// Applies every spin for the given elapsed time. Spins on missing nodes are
/// skipped silently; the caller logged them once at scene build.
pub fn apply_spins(graph: &mut SceneGraph, spins: &[SpinEffect], elapsed: f32) {
    for spin in spins {
        graph.set_rotation(&spin.node, spin.axis, spin_angle(elapsed, spin.rate));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spin_angle_scales_linearly() {
        assert_eq!(spin_angle(0.0, 0.1), 0.0);
        assert_eq!(spin_angle(10.0, 0.1), 1.0);
        assert_eq!(spin_angle(10.0, 0.05), 0.5);
    }

    #[test]
    fn spin_angle_is_idempotent_per_input() {
        for step in 0..100 {
            let elapsed = step as f32 * 0.73;
            assert_eq!(spin_angle(elapsed, 0.1), spin_angle(elapsed, 0.1));
        }
    }

    #[test]
    fn applying_spins_twice_at_same_time_is_stable() {
        let mut graph = SceneGraph::new();
        graph.insert("station", Mat4::IDENTITY);
        let spins = vec![SpinEffect {
            node: "station".into(),
            axis: Axis::Y,
            rate: 0.1,
        }];

        apply_spins(&mut graph, &spins, 4.0);
        let first = graph.matrix("station");
        apply_spins(&mut graph, &spins, 4.0);
        assert_eq!(first, graph.matrix("station"));
    }

    #[test]
    fn missing_node_is_a_noop() {
        let mut graph = SceneGraph::new();
        graph.insert("station", Mat4::IDENTITY);
        let before = graph.matrix("station");

        assert!(!graph.set_rotation("asteroids", Axis::X, 1.0));
        apply_spins(
            &mut graph,
            &[SpinEffect {
                node: "asteroids".into(),
                axis: Axis::X,
                rate: 0.05,
            }],
            60.0,
        );
        assert_eq!(before, graph.matrix("station"));
        assert!(!graph.contains("asteroids"));
    }

    #[test]
    fn axes_rotate_independently() {
        let mut graph = SceneGraph::new();
        graph.insert("n", Mat4::IDENTITY);
        graph.set_rotation("n", Axis::Y, 0.4);
        graph.set_rotation("n", Axis::X, 0.2);
        let node = graph.node("n").unwrap();
        assert_eq!(node.rotation().y, 0.4);
        assert_eq!(node.rotation().x, 0.2);
        assert_eq!(node.rotation().z, 0.0);
    }

    #[test]
    fn base_transform_is_preserved() {
        let base = Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0));
        let mut graph = SceneGraph::new();
        graph.insert("group", base);
        graph.set_rotation("group", Axis::Y, std::f32::consts::FRAC_PI_2);
        let transformed = graph.matrix("group") * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        // Translation survives the rotation because the base applies last.
        assert!((transformed.y - -1.0).abs() < 1e-6);
    }
}
