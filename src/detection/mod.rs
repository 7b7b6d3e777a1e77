//! Rule-based detectors that run over a transcript before selection.

mod breaks;
mod context;
mod visual_cues;

pub use breaks::{BreakDetector, BreakReason, ContentBreak};
pub use context::{adaptive_window_size, extract_semantic_context, ContextWindow};
pub use visual_cues::{detect_visual_cues, Importance, VisualCue};
