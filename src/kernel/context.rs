/// Execution context: trap frame layout and initial-frame construction
///
/// The trampoline saves x0–x30, ELR_EL1 and SPSR_EL1 into a `TrapFrame`
/// on the interrupted stack, passes its address to `handle_trap`, then
/// restores from whatever address comes back and `eret`s. A new task is
/// therefore just a frame laid out at the top of its stack that looks as
/// if the task had been interrupted right before its first instruction.

use core::mem;
use core::ptr;

// ─── TrapFrame: ABI-fixed layout, 264 bytes ────────────────────────

/// Saved CPU context.
/// 33 × u64 = 264 bytes, 8-byte aligned.
/// This layout is shared with the trap trampoline. Do not reorder.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TrapFrame {
    /// x0–x30 general-purpose registers (31 × 8 = 248 bytes)
    pub x: [u64; 31],  // offset   0..248
    /// Saved ELR_EL1 (return address)
    pub elr_el1: u64,  // offset 248
    /// Saved SPSR_EL1 (saved processor state)
    pub spsr_el1: u64, // offset 256
}

/// TrapFrame size: must match the trampoline
pub const TRAPFRAME_SIZE: usize = 264;

const _: () = assert!(mem::size_of::<TrapFrame>() == TRAPFRAME_SIZE);

/// SPSR for a fresh task: EL1h (M = 0b0101), D/A/I/F all clear.
pub const SPSR_EL1H_UNMASKED: u64 = 0b0101;

/// Task stacks are placed 16-byte aligned at the top.
pub const STACK_ALIGN: usize = 16;

impl TrapFrame {
    pub const fn zeroed() -> Self {
        Self {
            x: [0; 31],
            elr_el1: 0,
            spsr_el1: 0,
        }
    }
}

/// Task entry function. `arg` arrives in x0.
pub type TaskEntry = extern "C" fn(arg: usize);

// ─── ContextHandle ─────────────────────────────────────────────────

/// Address of a saved frame, exchanged with the trampoline.
///
/// The trampoline restores from it with the stack pointer set to the
/// frame, so it doubles as the task's resume SP. Handles are swapped,
/// never copied through.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(transparent)]
pub struct ContextHandle(*mut TrapFrame);

impl ContextHandle {
    pub const fn from_ptr(frame: *mut TrapFrame) -> Self {
        Self(frame)
    }

    pub const fn as_ptr(self) -> *mut TrapFrame {
        self.0
    }

    pub fn addr(self) -> usize {
        self.0 as usize
    }
}

// ─── TaskStack ─────────────────────────────────────────────────────

/// Caller-owned stack region. Grows down from `base + size`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TaskStack {
    pub base: *mut u8,
    pub size: usize,
}

impl TaskStack {
    pub const fn new(base: *mut u8, size: usize) -> Self {
        Self { base, size }
    }

    /// Highest 16-byte aligned address inside the region.
    pub fn top(&self) -> usize {
        (self.base as usize + self.size) & !(STACK_ALIGN - 1)
    }
}

// ─── Context builder ───────────────────────────────────────────────

/// Build the first frame for a task that has never run.
///
/// Returns a handle such that restoring from it and returning from the
/// exception enters `entry(arg)` at EL1h with interrupts enabled, with
/// the stack pointer at the top of `stack`.
///
/// # Safety
///
/// `stack` must be writable memory the caller owns for the lifetime of
/// the task, large enough for one `TrapFrame` plus the task's working
/// stack. Nothing here checks that.
pub unsafe fn create_context(stack: TaskStack, entry: TaskEntry, arg: usize) -> ContextHandle {
    let frame = (stack.top() - TRAPFRAME_SIZE) as *mut TrapFrame;

    let mut init = TrapFrame::zeroed();
    init.x[0] = arg as u64;
    init.elr_el1 = entry as usize as u64;
    init.spsr_el1 = SPSR_EL1H_UNMASKED;

    // SAFETY: Caller guarantees the region is writable and large enough;
    // `top()` is 16-aligned so `frame` is 8-aligned.
    unsafe { ptr::write_volatile(frame, init) };

    ContextHandle(frame)
}
