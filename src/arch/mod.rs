/// Architecture layer
///
/// Portable code talks to `hal::HwPort`; `arch::current` is the target's
/// implementation of it plus its entry points.

#[cfg(target_arch = "aarch64")]
pub mod aarch64;

#[cfg(target_arch = "aarch64")]
pub use aarch64 as current;
