mod forces;
mod quadtree;

use eframe::egui::Vec2;

use crate::settings::SimulationParams;
use crate::vault::LinkKind;

use super::{RenderGraph, SimPhase};
use forces::{CollisionParams, accumulate_collision_pairs, accumulate_repulsion_for_node};
use quadtree::QuadNode;

/// Below this energy the layout counts as settled and ticks become no-ops.
pub(super) const ALPHA_MIN: f32 = 0.005;
/// Energy floor held while the user drags a node.
pub(super) const ALPHA_DRAG: f32 = 0.3;
/// Per-tick approach rate of alpha toward its target (multiplicative decay
/// when the target is zero).
const ALPHA_RELAX: f32 = 0.0228;
const VELOCITY_RETAIN: f32 = 0.6;
const BARNES_HUT_THETA: f32 = 0.72;
const SOFTENING: f32 = 40.0;
const COLLIDE_PADDING: f32 = 5.0;
const MAX_SPEED: f32 = 26.0;
const MAX_FORCE: f32 = 220.0;

/// Shallow nodes repel harder; deep hierarchies stay compact.
pub(super) fn charge_depth_factor(depth: usize) -> f32 {
    (1.0 - 0.2 * depth as f32).max(0.3)
}

/// Deeper children sit closer to their parent.
pub(super) fn parent_link_distance(link_distance: f32, target_depth: usize) -> f32 {
    (link_distance / 2.0 - 5.0 * target_depth as f32).max(20.0)
}

/// Deeper attachments are held more rigidly.
pub(super) fn parent_link_strength(base: f32, target_depth: usize) -> f32 {
    (base + 0.1 * target_depth as f32).min(1.5)
}

impl RenderGraph {
    /// Reset the decay cycle; called on construction and whenever
    /// parameters, the visible link set, or the focal node change.
    pub(super) fn restart(&mut self) {
        self.alpha = 1.0;
        self.phase = SimPhase::Running;
    }

    /// Hold the simulation live while a node is being dragged.
    pub(super) fn begin_drag(&mut self) {
        self.alpha_target = ALPHA_DRAG;
        self.alpha = self.alpha.max(ALPHA_DRAG);
        self.phase = SimPhase::Running;
    }

    /// Drop the drag floor; the layout decays back to rest.
    pub(super) fn end_drag(&mut self) {
        self.alpha_target = 0.0;
        self.phase = SimPhase::Running;
    }

    pub(super) fn is_running(&self) -> bool {
        self.phase == SimPhase::Running
    }
}

/// One relaxation tick. Returns true while the simulation is still running.
pub(super) fn step_physics(cache: &mut RenderGraph, params: SimulationParams) -> bool {
    let node_count = cache.nodes.len();
    if node_count == 0 {
        cache.phase = SimPhase::Settled;
        return false;
    }

    if cache.phase == SimPhase::Settled && cache.alpha_target < ALPHA_MIN {
        return false;
    }

    cache.alpha += (cache.alpha_target - cache.alpha) * ALPHA_RELAX;
    if cache.alpha < ALPHA_MIN && cache.alpha_target < ALPHA_MIN {
        cache.phase = SimPhase::Settled;
        for node in &mut cache.nodes {
            node.velocity = Vec2::ZERO;
        }
        return false;
    }
    cache.phase = SimPhase::Running;
    let alpha = cache.alpha;

    let scratch = &mut cache.physics_scratch;
    scratch.forces.resize(node_count, Vec2::ZERO);
    scratch.forces.fill(Vec2::ZERO);
    scratch.positions.clear();
    scratch.radii.clear();
    scratch.charges.clear();
    let mut max_radius = 0.0_f32;
    for node in &cache.nodes {
        scratch.positions.push(node.world_pos);
        scratch.radii.push(node.weighted_radius);
        scratch
            .charges
            .push(params.charge_strength * charge_depth_factor(node.depth));
        max_radius = max_radius.max(node.weighted_radius);
    }

    let forces = &mut scratch.forces;
    let positions = &scratch.positions;
    let radii = &scratch.radii;
    let charges = &scratch.charges;

    if node_count > 1
        && let Some(quadtree) = QuadNode::build(positions, charges)
    {
        for (index, force) in forces.iter_mut().enumerate() {
            accumulate_repulsion_for_node(
                &quadtree,
                index,
                positions,
                charges,
                SOFTENING,
                BARNES_HUT_THETA,
                force,
            );
        }

        let max_collision_distance = (max_radius * 2.0) + COLLIDE_PADDING;
        if max_collision_distance > 0.0 && params.collide_strength > 0.0 {
            accumulate_collision_pairs(
                &quadtree,
                &quadtree,
                true,
                positions,
                radii,
                CollisionParams {
                    collide_strength: params.collide_strength,
                    padding: COLLIDE_PADDING,
                    max_collision_distance_sq: max_collision_distance * max_collision_distance,
                },
                forces,
            );
        }
    }

    for edge in &cache.edges {
        let (from, to) = (edge.source, edge.target);
        if from >= node_count || to >= node_count || from == to {
            continue;
        }

        let delta = positions[from] - positions[to];
        let distance_sq = delta.length_sq();
        if distance_sq <= 0.0001 * 0.0001 {
            continue;
        }
        let distance = distance_sq.sqrt();
        let direction = delta / distance;

        let (preferred, strength) = match edge.kind {
            LinkKind::ParentChild => {
                let target_depth = cache.nodes[to].depth;
                (
                    parent_link_distance(params.link_distance, target_depth),
                    parent_link_strength(params.parent_child_strength, target_depth),
                )
            }
            LinkKind::Reference => (params.link_distance, params.reference_strength),
        };

        let correction = direction * ((distance - preferred) * strength * 0.5);
        forces[from] -= correction;
        forces[to] += correction;
    }

    let max_force_sq = MAX_FORCE * MAX_FORCE;
    let max_speed_sq = MAX_SPEED * MAX_SPEED;
    for (index, force_value) in forces.iter().enumerate() {
        let node = &mut cache.nodes[index];

        // pinned nodes exert forces on others but are never repositioned
        if let Some(pin) = node.pinned {
            node.world_pos = pin;
            node.velocity = Vec2::ZERO;
            continue;
        }

        let mut force = *force_value;
        let force_sq = force.length_sq();
        if force_sq > max_force_sq {
            force *= MAX_FORCE / force_sq.sqrt();
        }

        let mut velocity = (node.velocity + force * alpha) * VELOCITY_RETAIN;
        let speed_sq = velocity.length_sq();
        if speed_sq > max_speed_sq {
            velocity *= MAX_SPEED / speed_sq.sqrt();
        }

        node.velocity = velocity;
        node.world_pos += velocity;
    }

    // weak global pull toward the viewport center: shift unpinned nodes by
    // a center_force fraction of the centroid offset
    if params.center_force > 0.0 {
        let mut centroid = Vec2::ZERO;
        for node in &cache.nodes {
            centroid += node.world_pos;
        }
        centroid /= node_count as f32;

        let shift = centroid * params.center_force.clamp(0.0, 1.0);
        if shift.length_sq() > 0.000_001 {
            for node in &mut cache.nodes {
                if node.pinned.is_none() {
                    node.world_pos -= shift;
                }
            }
        }
    }

    true
}
