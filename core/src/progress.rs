/// Progress reporting for long-running comparisons.
///
/// The engine calls the callback at phase boundaries with a best-effort fraction in the range
/// `[0.0, 1.0]`. Phases run in the order [`PHASE_INDEX`], [`PHASE_MATCH`], [`PHASE_COMPARE`],
/// [`PHASE_ASSEMBLE`]. Callers should treat progress as advisory.

pub const PHASE_INDEX: &str = "index";
pub const PHASE_MATCH: &str = "match";
pub const PHASE_COMPARE: &str = "compare";
pub const PHASE_ASSEMBLE: &str = "assemble";

pub trait ProgressCallback: Send {
    fn on_progress(&self, phase: &str, percent: f32);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_progress(&self, _phase: &str, _percent: f32) {}
}
