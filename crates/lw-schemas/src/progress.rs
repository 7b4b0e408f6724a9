/// Progress reporting for long-running reconciliation work.
/// The job tracker implements this to surface live status; CLI callers
/// can pass [`NullProgress`] or a printing sink.
pub trait Progress: Send {
    /// Called once with the number of items that will be processed.
    fn begin(&mut self, _total: usize) {}

    /// Free-form status line that does not advance the counter.
    fn log(&mut self, _msg: &str) {}

    /// Called when one logical unit (one slate player) completes,
    /// successfully or not. `detail` is a one-line human-readable status.
    fn item_done(&mut self, _detail: &str) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}
