//! Stage-indexed path provider that scales waypoint templates to the viewport.

use std::time::Duration;

use quiz_defence_core::{PathId, Viewport, WorldPoint, PATH_CLEARANCE};

/// Duration player input stays locked while a stage swap plays out.
pub(crate) const STAGE_SWAP_LOCK: Duration = Duration::from_secs(2);

/// Waypoint templates expressed as play-area fractions, one set per stage
/// layout. Layouts cycle once the stage index outgrows the table.
const STAGE_TEMPLATES: [&[&[(f32, f32)]]; 3] = [
    // A single serpentine crossing the whole play area.
    &[&[
        (0.0, 0.2),
        (0.8, 0.2),
        (0.8, 0.5),
        (0.2, 0.5),
        (0.2, 0.8),
        (1.0, 0.8),
    ]],
    // Two straighter lanes entering from opposite corners.
    &[
        &[(0.0, 0.15), (0.6, 0.15), (0.6, 0.6), (1.0, 0.6)],
        &[(0.0, 0.85), (0.45, 0.85), (0.45, 0.35), (1.0, 0.35)],
    ],
    // A tight zigzag with short segments.
    &[&[
        (0.0, 0.5),
        (0.25, 0.2),
        (0.5, 0.8),
        (0.75, 0.2),
        (1.0, 0.5),
    ]],
];

/// One ordered waypoint sequence enemies follow.
#[derive(Clone, Debug)]
pub(crate) struct Path {
    id: PathId,
    waypoints: Vec<WorldPoint>,
}

impl Path {
    /// Identifier of the path within the active stage.
    pub(crate) fn id(&self) -> PathId {
        self.id
    }

    /// Ordered waypoints scaled to the current viewport.
    pub(crate) fn waypoints(&self) -> &[WorldPoint] {
        &self.waypoints
    }
}

/// Stage state owning the active path set and the input-lock timer.
#[derive(Debug)]
pub(crate) struct StageState {
    index: u32,
    paths: Vec<Path>,
    input_lock_remaining: Duration,
}

impl StageState {
    /// Creates the initial stage with paths scaled to the viewport.
    pub(crate) fn new(viewport: Viewport) -> Self {
        Self {
            index: 0,
            paths: build_paths(0, viewport),
            input_lock_remaining: Duration::ZERO,
        }
    }

    /// Zero-based index of the active stage.
    pub(crate) fn index(&self) -> u32 {
        self.index
    }

    /// Paths enemies traverse in the active stage.
    pub(crate) fn paths(&self) -> &[Path] {
        &self.paths
    }

    /// Looks up a path by identifier.
    pub(crate) fn path(&self, id: PathId) -> Option<&Path> {
        self.paths.iter().find(|path| path.id() == id)
    }

    /// Reports whether player input is currently locked by a stage swap.
    pub(crate) fn input_locked(&self) -> bool {
        !self.input_lock_remaining.is_zero()
    }

    /// Advances the input-lock timer by real elapsed time.
    pub(crate) fn advance_lock(&mut self, dt: Duration) {
        self.input_lock_remaining = self.input_lock_remaining.saturating_sub(dt);
    }

    /// Swaps to the next stage layout and starts the input lock.
    pub(crate) fn advance(&mut self, viewport: Viewport) {
        self.index = self.index.saturating_add(1);
        self.paths = build_paths(self.index, viewport);
        self.input_lock_remaining = STAGE_SWAP_LOCK;
    }

    /// Rebuilds the active paths after a viewport change.
    pub(crate) fn rescale(&mut self, viewport: Viewport) {
        self.paths = build_paths(self.index, viewport);
    }

    /// Reports whether the point violates the path clearance invariant.
    ///
    /// Checks the point against every waypoint pair of every active path.
    pub(crate) fn violates_clearance(&self, point: WorldPoint) -> bool {
        self.paths.iter().any(|path| {
            path.waypoints()
                .windows(2)
                .any(|pair| point.distance_to_segment(pair[0], pair[1]) < PATH_CLEARANCE)
        })
    }
}

fn build_paths(stage: u32, viewport: Viewport) -> Vec<Path> {
    let layout = STAGE_TEMPLATES[stage as usize % STAGE_TEMPLATES.len()];
    layout
        .iter()
        .enumerate()
        .map(|(index, template)| Path {
            id: PathId::new(index as u32),
            waypoints: template
                .iter()
                .map(|&(fx, fy)| WorldPoint::new(fx * viewport.width(), fy * viewport.height()))
                .collect(),
        })
        .collect()
}
