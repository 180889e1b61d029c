/// Hardware port: the only way kernel code touches the machine.
///
/// The GIC, timer and console drivers never dereference MMIO addresses
/// or execute system-register instructions themselves. They go through a
/// `HwPort`, which on AArch64 is a zero-sized type doing volatile accesses
/// and `mrs`/`msr` (see `arch::aarch64::port`), and on the host is a
/// simulated register file (see `tests/sim`).
///
/// All methods take `&self`: MMIO has no Rust-visible state, and the
/// foreground and interrupt paths must both be able to hold the port.

// ─── Special registers ─────────────────────────────────────────────

/// System registers the kernel core reads or writes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SysReg {
    /// CNTFRQ_EL0: counter frequency in Hz (read-only)
    CntfrqEl0,
    /// CNTP_CTL_EL0: physical timer control (ENABLE, IMASK, ISTATUS)
    CntpCtlEl0,
    /// CNTP_TVAL_EL0: physical timer countdown
    CntpTvalEl0,
    /// DAIF: exception mask bits
    Daif,
}

/// Memory / instruction barriers.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Barrier {
    /// `dsb sy`: full-system data synchronization
    DsbSy,
    /// `dmb ish`: inner-shareable data memory barrier
    DmbIsh,
    /// `isb`: instruction synchronization
    Isb,
}

// ─── DAIF bits ─────────────────────────────────────────────────────

/// DAIF.F: FIQ masked
pub const DAIF_F: u64 = 1 << 6;
/// DAIF.I: IRQ masked
pub const DAIF_I: u64 = 1 << 7;
/// DAIF.A: SError masked
pub const DAIF_A: u64 = 1 << 8;
/// DAIF.D: debug exceptions masked
pub const DAIF_D: u64 = 1 << 9;

// ─── Port trait ────────────────────────────────────────────────────

pub trait HwPort {
    /// Volatile 32-bit read at a physical address.
    fn read32(&self, addr: usize) -> u32;

    /// Volatile 32-bit write at a physical address.
    fn write32(&self, addr: usize, val: u32);

    /// Volatile byte write (GIC priority bytes, UART data).
    fn write8(&self, addr: usize, val: u8);

    fn read_sysreg(&self, reg: SysReg) -> u64;

    fn write_sysreg(&self, reg: SysReg, val: u64);

    fn barrier(&self, kind: Barrier);

    /// `wfe`: suspend until an event or pending exception.
    fn wait_for_event(&self);

    /// `sev`: signal an event to all waiters.
    fn send_event(&self);
}

impl<T: HwPort + ?Sized> HwPort for &T {
    #[inline(always)]
    fn read32(&self, addr: usize) -> u32 {
        (**self).read32(addr)
    }

    #[inline(always)]
    fn write32(&self, addr: usize, val: u32) {
        (**self).write32(addr, val)
    }

    #[inline(always)]
    fn write8(&self, addr: usize, val: u8) {
        (**self).write8(addr, val)
    }

    #[inline(always)]
    fn read_sysreg(&self, reg: SysReg) -> u64 {
        (**self).read_sysreg(reg)
    }

    #[inline(always)]
    fn write_sysreg(&self, reg: SysReg, val: u64) {
        (**self).write_sysreg(reg, val)
    }

    #[inline(always)]
    fn barrier(&self, kind: Barrier) {
        (**self).barrier(kind)
    }

    #[inline(always)]
    fn wait_for_event(&self) {
        (**self).wait_for_event()
    }

    #[inline(always)]
    fn send_event(&self) {
        (**self).send_event()
    }
}
