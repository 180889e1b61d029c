/// KernelCell<T>: the one global kernel instance on hardware
///
/// Host tests own their `Kernel` values directly. On the target, the
/// trampoline calls a bare `extern "C"` function with no way to pass
/// Rust state, so the kernel and the log sink live in statics wrapped in
/// this cell.
///
/// # Safety Invariant
///
/// KernelCell is only sound when ALL of these hold:
/// - **Single core**: one application core, no SMP
/// - **Masked access**: the mutable path runs in the trap dispatcher, with
///   further interrupts of the same class masked, or at boot before the
///   timer is started
/// - **No re-entrancy**: the same cell is not borrowed recursively
///
/// State touched from both contexts (the tick handshake) does not go in
/// a KernelCell; it uses atomics plus barriers instead.

use core::cell::UnsafeCell;

#[repr(transparent)]
pub struct KernelCell<T>(UnsafeCell<T>);

// SAFETY: Single-core. Mutable access only from the dispatcher (masked)
// or from boot code before interrupts are enabled.
unsafe impl<T> Sync for KernelCell<T> {}

impl<T> KernelCell<T> {
    /// Usable in `static` declarations.
    pub const fn new(val: T) -> Self {
        Self(UnsafeCell::new(val))
    }

    /// # Safety
    ///
    /// No concurrent mutable access (interrupts masked or boot context).
    #[inline(always)]
    pub unsafe fn get(&self) -> &T {
        // SAFETY: Caller guarantees no concurrent mutable access.
        unsafe { &*self.0.get() }
    }

    /// # Safety
    ///
    /// Exclusive access: trap dispatcher or boot context only.
    #[allow(clippy::mut_from_ref)]
    #[inline(always)]
    pub unsafe fn get_mut(&self) -> &mut T {
        // SAFETY: Caller guarantees exclusive access.
        unsafe { &mut *self.0.get() }
    }

    #[inline(always)]
    pub const fn as_ptr(&self) -> *mut T {
        self.0.get()
    }
}
