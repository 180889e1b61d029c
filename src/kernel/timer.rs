/// Đồng hồ hệ thống (Timer)
/// ARM Generic Timer: EL1 physical timer (CNTP_*_EL0)
///
/// Periodic tick source routed through the GIC as PPI INTID 30.
/// The countdown is reloaded on every tick; IMASK gates the interrupt
/// line without stopping the count.
///
/// Every CNTP_CTL / CNTP_TVAL write is followed by an `isb` so the new
/// state is in effect before the next instruction.

use crate::hal::{Barrier, HwPort, SysReg};

// ─── CNTP_CTL_EL0 bits ─────────────────────────────────────────────

/// ENABLE: timer counting and able to fire
pub const CTL_ENABLE: u64 = 1 << 0;
/// IMASK: interrupt masked
pub const CTL_IMASK: u64 = 1 << 1;
/// ISTATUS: condition met (read-only)
pub const CTL_ISTATUS: u64 = 1 << 2;

/// Rate used when a caller asks for 0 Hz
pub const FALLBACK_RATE_HZ: u32 = 100;

/// Countdown value for one period at `rate_hz`.
///
/// Floors at 1: a zero TVAL would make the timer condition true
/// immediately and refire forever.
pub fn period_ticks(counter_freq: u64, rate_hz: u32) -> u64 {
    let rate = if rate_hz == 0 { FALLBACK_RATE_HZ } else { rate_hz };
    let ticks = counter_freq / rate as u64;
    if ticks == 0 {
        1
    } else {
        ticks
    }
}

pub struct Timer<P: HwPort> {
    port: P,
}

impl<P: HwPort> Timer<P> {
    pub const fn new(port: P) -> Self {
        Self { port }
    }

    #[inline(always)]
    fn ctl(&self) -> u64 {
        self.port.read_sysreg(SysReg::CntpCtlEl0)
    }

    #[inline(always)]
    fn set_ctl(&self, val: u64) {
        self.port.write_sysreg(SysReg::CntpCtlEl0, val);
        self.port.barrier(Barrier::Isb);
    }

    #[inline(always)]
    fn set_tval(&self, ticks: u64) {
        self.port.write_sysreg(SysReg::CntpTvalEl0, ticks);
        self.port.barrier(Barrier::Isb);
    }

    /// Counter frequency (CNTFRQ_EL0), in Hz.
    pub fn frequency(&self) -> u64 {
        self.port.read_sysreg(SysReg::CntfrqEl0)
    }

    pub fn enable(&self) {
        self.set_ctl(self.ctl() | CTL_ENABLE);
    }

    pub fn disable(&self) {
        self.set_ctl(self.ctl() & !CTL_ENABLE);
    }

    /// Stop the line from signalling. The counter keeps running.
    pub fn mask(&self) {
        self.set_ctl(self.ctl() | CTL_IMASK);
    }

    pub fn unmask(&self) {
        self.set_ctl(self.ctl() & !CTL_IMASK);
    }

    /// Disable, load one period, unmask, enable.
    ///
    /// Caller must have masked the timer first if an interrupt from it
    /// could still be in service.
    pub fn program(&self, rate_hz: u32) {
        self.disable();
        self.set_tval(period_ticks(self.frequency(), rate_hz));
        self.unmask();
        self.enable();
    }

    /// Reload one period without touching IMASK.
    ///
    /// Used from the interrupt path: the line stays masked until the
    /// dispatcher has issued EOI and unmasks explicitly.
    pub fn rearm(&self, rate_hz: u32) {
        self.disable();
        self.set_tval(period_ticks(self.frequency(), rate_hz));
        self.enable();
    }

    /// Mask, then program. Boot-time entry point.
    pub fn start(&self, rate_hz: u32) {
        self.mask();
        self.program(rate_hz);
    }

    pub fn is_masked(&self) -> bool {
        self.ctl() & CTL_IMASK != 0
    }

    pub fn port(&self) -> &P {
        &self.port
    }
}
