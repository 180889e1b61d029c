/// Foreground ↔ interrupt-context cooperation without locks
///
/// Two pieces:
///   - `TickHandshake`: one-shot request/acknowledge between foreground
///     code and the timer interrupt, parked on `wfe` while waiting.
///   - `MaskedSection`: IRQ+FIQ masked for a short, externally visible
///     write sequence, with the previous DAIF restored on drop.
///
/// Each handshake flag has exactly one writer per direction, so plain
/// loads/stores plus barriers are enough; there is no read-modify-write.
/// A request that is never acknowledged parks the foreground forever.

use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::hal::{Barrier, HwPort, SysReg, DAIF_F, DAIF_I};

// ─── Event ─────────────────────────────────────────────────────────

/// Wait/wake pair. On hardware this is `wfe`/`sev`; host tests plug in
/// a mock whose `wait` runs the interrupt side.
pub trait Event {
    /// Suspend until woken (or spuriously return). Callers re-check.
    fn wait(&self);
    fn signal(&self);
}

impl<P: HwPort> Event for P {
    #[inline(always)]
    fn wait(&self) {
        self.wait_for_event();
    }

    #[inline(always)]
    fn signal(&self) {
        self.send_event();
    }
}

// ─── TickHandshake ─────────────────────────────────────────────────

pub struct TickHandshake {
    /// Set by foreground, cleared by interrupt context
    request: AtomicBool,
    /// Set by interrupt context, cleared by foreground
    ack: AtomicBool,
    /// Requests acknowledged so far (interrupt side)
    serviced: AtomicU64,
}

impl TickHandshake {
    pub const fn new() -> Self {
        Self {
            request: AtomicBool::new(false),
            ack: AtomicBool::new(false),
            serviced: AtomicU64::new(0),
        }
    }

    /// Foreground: post a request and park until it is acknowledged.
    pub fn request<P: HwPort, E: Event + ?Sized>(&self, port: &P, event: &E) {
        self.request.store(true, Ordering::Release);
        port.barrier(Barrier::DmbIsh);
        event.signal();

        loop {
            port.barrier(Barrier::DmbIsh);
            if self.ack.load(Ordering::Acquire) {
                break;
            }
            event.wait();
        }

        self.ack.store(false, Ordering::Release);
        port.barrier(Barrier::DmbIsh);
    }

    /// Interrupt context: acknowledge a pending request, if any.
    /// Returns whether one was serviced.
    pub fn service<P: HwPort, E: Event + ?Sized>(&self, port: &P, event: &E) -> bool {
        port.barrier(Barrier::DmbIsh);
        if !self.request.load(Ordering::Acquire) {
            return false;
        }

        port.barrier(Barrier::DmbIsh);
        self.request.store(false, Ordering::Release);
        self.ack.store(true, Ordering::Release);
        port.barrier(Barrier::DmbIsh);
        event.signal();

        // Single writer: load + store, no exclusive-monitor RMW.
        let n = self.serviced.load(Ordering::Relaxed);
        self.serviced.store(n + 1, Ordering::Relaxed);
        true
    }

    pub fn is_requested(&self) -> bool {
        self.request.load(Ordering::Acquire)
    }

    pub fn is_acknowledged(&self) -> bool {
        self.ack.load(Ordering::Acquire)
    }

    pub fn serviced(&self) -> u64 {
        self.serviced.load(Ordering::Relaxed)
    }
}

impl Default for TickHandshake {
    fn default() -> Self {
        Self::new()
    }
}

// ─── MaskedSection ─────────────────────────────────────────────────

/// IRQ and FIQ masked while this is alive.
///
/// Keeps a multi-byte console write from being split by an interrupt
/// whose handler writes to the same sink. Restores the DAIF value seen
/// on entry, so nesting inside an already-masked region stays masked.
pub struct MaskedSection<'a, P: HwPort> {
    port: &'a P,
    saved: u64,
}

impl<'a, P: HwPort> MaskedSection<'a, P> {
    pub fn enter(port: &'a P) -> Self {
        let saved = port.read_sysreg(SysReg::Daif);
        port.write_sysreg(SysReg::Daif, saved | DAIF_I | DAIF_F);
        Self { port, saved }
    }

    /// DAIF value that will be restored.
    pub fn saved_daif(&self) -> u64 {
        self.saved
    }
}

impl<P: HwPort> Drop for MaskedSection<'_, P> {
    fn drop(&mut self) {
        self.port.write_sysreg(SysReg::Daif, self.saved);
    }
}

/// Run `f` with IRQ and FIQ masked.
pub fn with_masked<P: HwPort, R>(port: &P, f: impl FnOnce() -> R) -> R {
    let _section = MaskedSection::enter(port);
    f()
}
