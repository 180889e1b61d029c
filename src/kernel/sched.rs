/// Thời Khóa Biểu / Bộ lập lịch (Scheduler).
/// Round-robin frame switcher, fixed task table
///
/// Slot 0 is the foreground: whatever code was running when the first
/// timer interrupt arrived. It is never created here; its handle is the
/// first context the dispatcher passes in. Slots 1..N are background
/// tasks, whose frames are built lazily on the first scheduling
/// opportunity after they are registered. Registering after the first
/// tick is fine; the frame is built on the next one.
///
/// Context switch: timer IRQ → save incoming handle in the running slot
/// → pick next slot that has a frame → hand its handle back to the
/// trampoline. Frames themselves are never copied.
///
/// Runs inside the dispatcher's masked window; no locking.

use crate::kernel::context::{self, ContextHandle, TaskEntry, TaskStack};
use crate::kernel::log::LogLevel;
use crate::klog;

/// Index of the interrupted foreground code
pub const FOREGROUND: usize = 0;

/// Default table size: foreground + one background task
pub const PING_PONG: usize = 2;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SchedError {
    /// No free background slot
    TableFull,
    /// Slot already has a task registered
    SlotInUse,
    /// Slot index out of range, or the foreground slot
    NoSuchSlot,
}

#[derive(Clone, Copy)]
struct TaskSpec {
    stack: TaskStack,
    entry: TaskEntry,
    arg: usize,
}

#[derive(Clone, Copy)]
struct Slot {
    spec: Option<TaskSpec>,
    saved: Option<ContextHandle>,
}

const EMPTY_SLOT: Slot = Slot {
    spec: None,
    saved: None,
};

pub struct Scheduler<const N: usize> {
    slots: [Slot; N],
    current: usize,
    switches: u64,
}

impl<const N: usize> Scheduler<N> {
    pub const fn new() -> Self {
        Self {
            slots: [EMPTY_SLOT; N],
            current: FOREGROUND,
            switches: 0,
        }
    }

    /// Register a background task in a specific slot.
    ///
    /// # Safety
    ///
    /// `stack` must stay valid and unused by anything else for as long
    /// as the scheduler exists (see `context::create_context`).
    pub unsafe fn register_task(
        &mut self,
        slot: usize,
        stack: TaskStack,
        entry: TaskEntry,
        arg: usize,
    ) -> Result<(), SchedError> {
        if slot == FOREGROUND || slot >= N {
            return Err(SchedError::NoSuchSlot);
        }
        if self.slots[slot].spec.is_some() {
            return Err(SchedError::SlotInUse);
        }
        self.slots[slot].spec = Some(TaskSpec { stack, entry, arg });
        Ok(())
    }

    /// Register a background task in the first free slot.
    ///
    /// # Safety
    ///
    /// Same contract as `register_task`.
    pub unsafe fn add_task(
        &mut self,
        stack: TaskStack,
        entry: TaskEntry,
        arg: usize,
    ) -> Result<usize, SchedError> {
        let slot = (1..N)
            .find(|&i| self.slots[i].spec.is_none())
            .ok_or(SchedError::TableFull)?;
        // SAFETY: Forwarded caller contract.
        unsafe { self.register_task(slot, stack, entry, arg)? };
        Ok(slot)
    }

    /// Build frames for every registered task that does not have one.
    /// Idempotent: slots that already have a frame are skipped.
    fn ensure_created(&mut self) {
        for (i, slot) in self.slots.iter_mut().enumerate().skip(1) {
            if let (Some(spec), None) = (slot.spec, slot.saved) {
                // SAFETY: `register_task` callers vouched for the stack.
                let handle = unsafe { context::create_context(spec.stack, spec.entry, spec.arg) };
                slot.saved = Some(handle);
                klog!(LogLevel::Debug, "sched: task {} frame at 0x{:X}", i, handle.addr());
            }
        }
    }

    /// Save `current` as the running slot's frame and return the frame
    /// to resume. Returns `current` unchanged if nothing else can run.
    pub fn schedule(&mut self, current: ContextHandle) -> ContextHandle {
        self.ensure_created();

        let old = self.current;
        self.slots[old].saved = Some(current);

        let mut next = (old + 1) % N;
        while next != old && self.slots[next].saved.is_none() {
            next = (next + 1) % N;
        }

        if next == old {
            return current;
        }

        self.current = next;
        self.switches += 1;
        match self.slots[next].saved {
            Some(handle) => handle,
            None => current,
        }
    }

    /// Slot currently running.
    pub fn running(&self) -> usize {
        self.current
    }

    /// Last saved frame for a slot (`None` before it first ran or was built).
    pub fn saved(&self, slot: usize) -> Option<ContextHandle> {
        self.slots.get(slot).and_then(|s| s.saved)
    }

    pub fn is_registered(&self, slot: usize) -> bool {
        self.slots.get(slot).is_some_and(|s| s.spec.is_some())
    }

    /// Whether every registered background task has a frame.
    pub fn is_created(&self) -> bool {
        self.slots
            .iter()
            .skip(1)
            .all(|s| s.spec.is_none() || s.saved.is_some())
    }

    /// Number of times `schedule` handed back a different slot.
    pub fn switches(&self) -> u64 {
        self.switches
    }
}

impl<const N: usize> Default for Scheduler<N> {
    fn default() -> Self {
        Self::new()
    }
}
