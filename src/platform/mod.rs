/// Platform constants
///
/// Each supported board provides its MMIO map and interrupt numbering.
/// Only the QEMU `virt` machine is described today.

pub mod qemu_virt;
