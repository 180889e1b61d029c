/// Entry points the trap trampoline and startup code call
///
/// The trampoline is expected to:
///   1. reserve a `TrapFrame` (264 bytes) on the current stack and save
///      x0–x30, ELR_EL1, SPSR_EL1 into it in that order;
///   2. call `handle_trap(frame)` with IRQ/FIQ still masked;
///   3. set SP to the returned address, restore from it, pop the frame
///      and `eret`.
/// In the secure configuration the timer arrives as FIQ, so both the IRQ
/// and FIQ vectors must take this path.

use crate::arch::aarch64::port::Aarch64Port;
use crate::gic::SecurityMode;
use crate::kernel::cell::KernelCell;
use crate::kernel::config::{ConfigError, KernelConfig};
use crate::kernel::context::{self, ContextHandle, TaskEntry, TaskStack, TrapFrame};
use crate::kernel::log;
use crate::kernel::sync::{with_masked, TickHandshake};
use crate::kernel::trap::Kernel;
use crate::platform::qemu_virt::UART0_BASE;
use crate::uart::{ByteSink, Pl011};

pub type BoardKernel = Kernel<'static, Aarch64Port>;

/// Request/acknowledge flags shared by foreground and the tick handler.
pub static HANDSHAKE: TickHandshake = TickHandshake::new();

static KERNEL: KernelCell<Option<BoardKernel>> = KernelCell::new(None);

/// UART0, with IRQ+FIQ masked around each write so lines never interleave.
pub struct MaskedConsole(Pl011<Aarch64Port>);

impl ByteSink for MaskedConsole {
    fn write_bytes(&self, bytes: &[u8]) {
        with_masked(&Aarch64Port, || self.0.write_bytes(bytes));
    }
}

pub static CONSOLE: MaskedConsole = MaskedConsole(Pl011::new(Aarch64Port, UART0_BASE));

/// Install the console and the kernel, bring up GIC + timer.
///
/// An invalid `cfg` leaves the GIC and timer untouched.
///
/// # Safety
///
/// Call once, at EL1, with IRQ/FIQ masked. Register background tasks via
/// `kernel_mut` before unmasking.
pub unsafe fn boot(cfg: KernelConfig) -> Result<SecurityMode, ConfigError> {
    // SAFETY: Boot context, interrupts masked.
    unsafe { log::set_sink(&CONSOLE) };

    // SAFETY: Boot context, no dispatcher can run yet.
    let slot = unsafe { KERNEL.get_mut() };
    slot.insert(Kernel::new(Aarch64Port, &HANDSHAKE, cfg)).init()
}

/// # Safety
///
/// Boot context only (before interrupts are unmasked).
pub unsafe fn kernel_mut() -> Option<&'static mut BoardKernel> {
    // SAFETY: Forwarded caller contract.
    unsafe { KERNEL.get_mut().as_mut() }
}

/// Called by the trampoline for every IRQ/FIQ.
#[no_mangle]
pub extern "C" fn handle_trap(frame: *mut TrapFrame) -> *mut TrapFrame {
    // SAFETY: Trampoline entry semantics keep further IRQ/FIQ masked, and
    // this is the only place the kernel is borrowed after boot.
    match unsafe { KERNEL.get_mut() } {
        Some(kernel) => kernel.handle_trap(ContextHandle::from_ptr(frame)).as_ptr(),
        None => frame,
    }
}

/// Raw-pointer form of `context::create_context` for startup code.
///
/// # Safety
///
/// `stack_base..stack_base + stack_size` must be owned, writable, and big
/// enough for a `TrapFrame` plus the task's stack.
#[no_mangle]
pub unsafe extern "C" fn create_context(
    stack_base: *mut u8,
    stack_size: usize,
    entry: TaskEntry,
    arg: usize,
) -> *mut TrapFrame {
    // SAFETY: Forwarded caller contract.
    unsafe { context::create_context(TaskStack::new(stack_base, stack_size), entry, arg).as_ptr() }
}
