/// AArch64 architecture module
///
/// The real `HwPort` and the `extern "C"` symbols the trap trampoline
/// and startup code link against.

pub mod entry;
pub mod port;
