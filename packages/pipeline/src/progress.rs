//! Progress reporting trait for scoring runs.
//!
//! Decouples stage progress from any rendering backend (`indicatif` bars
//! in the CLI, silence in tests and library callers).

/// Receives progress from a run.
///
/// Matching and scoring report from `rayon` worker threads, hence
/// `Send + Sync`.
pub trait ProgressCallback: Send + Sync {
    /// Set the total expected units of work for the current stage.
    fn set_total(&self, total: u64);

    /// Set the current position (absolute, not delta).
    fn set_position(&self, pos: u64);

    /// Advance progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Update the message displayed alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);

    /// Begins a named run stage of `total` units.
    fn start_stage(&self, stage: &str, total: u64) {
        self.set_message(stage.to_string());
        self.set_total(total);
        self.set_position(0);
    }
}

/// Ignores all progress updates.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn set_position(&self, _pos: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}
