//! ticktock: preemptive tick-driven task switching for one AArch64 core
//!
//! Kernel core only: trap-frame layout and initial-frame construction,
//! GICv2 + generic-timer bring-up, the per-interrupt dispatcher, a
//! round-robin frame switcher, and lock-free foreground/interrupt
//! cooperation. The trap trampoline, startup code and task bodies live
//! outside this crate.
//!
//! On AArch64: real `HwPort` plus `extern "C"` entry points.
//! On host (x86_64): everything portable, driven by a simulated port in
//! `tests/host_tests.rs`.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]

/// Architecture-specific port and entry points
pub mod arch;

/// Hardware port abstraction
pub mod hal;

/// Portable kernel logic (context, scheduler, dispatcher, sync, log)
pub mod kernel;

/// Platform constants (MMIO addresses, interrupt numbers)
pub mod platform;

pub mod gic;
pub mod uart;

// ─── Convenience re-exports ────────────────────────────────────────

pub use kernel::config::KernelConfig;
pub use kernel::context::{create_context, ContextHandle, TaskStack, TrapFrame};
pub use kernel::sched::Scheduler;
pub use kernel::sync::{MaskedSection, TickHandshake};
pub use kernel::trap::Kernel;
