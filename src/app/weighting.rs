//! Depth-relative visual weighting.
//!
//! With no focal node the weights fall off with absolute nesting depth.
//! When a node is selected, they fall off with hierarchical distance from
//! the selection in either direction, so the view fans out around it.

/// Hierarchical distance used for visual weighting. Absolute depth when no
/// focal node is set, otherwise |node.depth - focal.depth|.
pub(super) fn relative_depth(node_depth: usize, focal_depth: Option<usize>) -> usize {
    match focal_depth {
        None => node_depth,
        Some(focal) => node_depth.abs_diff(focal),
    }
}

/// Per-node scalars derived from relative depth. All are monotonically
/// decreasing with a floor so nothing vanishes entirely; the focal node
/// itself always gets full weight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct NodeWeights {
    pub(super) radius_multiplier: f32,
    pub(super) opacity: f32,
    pub(super) label_size: f32,
    pub(super) label_opacity: f32,
    /// Subtracted from HSL lightness when muting deep nodes (floor 0.2).
    pub(super) lightness_shift: f32,
    /// Subtracted from HSL saturation when muting deep nodes (floor 0.3).
    pub(super) saturation_shift: f32,
}

pub(super) const LIGHTNESS_FLOOR: f32 = 0.2;
pub(super) const SATURATION_FLOOR: f32 = 0.3;

pub(super) fn node_weights(
    relative_depth: usize,
    base_label_size: f32,
    is_focal: bool,
) -> NodeWeights {
    if is_focal {
        return NodeWeights {
            radius_multiplier: 1.0,
            opacity: 1.0,
            label_size: base_label_size.max(8.0),
            label_opacity: 1.0,
            lightness_shift: 0.0,
            saturation_shift: 0.0,
        };
    }

    let depth = relative_depth as f32;
    NodeWeights {
        radius_multiplier: (1.0 - 0.15 * depth).max(0.6),
        opacity: (1.0 - 0.15 * depth).max(0.4),
        label_size: (base_label_size - depth).max(8.0),
        label_opacity: (1.0 - 0.1 * depth).max(0.6),
        lightness_shift: 0.1 * depth,
        saturation_shift: 0.1 * depth,
    }
}
