/// Portable kernel core
///
/// Everything here is written against `hal::HwPort` and runs unchanged
/// on the host test harness: context builder, scheduler hook, trap
/// dispatcher, generic timer, foreground/interrupt sync, logging.

pub mod cell;
pub mod config;
pub mod context;
pub mod diag;
pub mod log;
pub mod sched;
pub mod sync;
pub mod timer;
pub mod trap;
