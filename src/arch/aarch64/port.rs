/// AArch64 hardware port: volatile MMIO and system registers
///
/// Zero-sized and `Copy`; every driver gets its own copy.

use core::ptr;

use aarch64_cpu::asm;
use aarch64_cpu::asm::barrier;
use aarch64_cpu::registers::{CNTFRQ_EL0, CNTP_CTL_EL0, CNTP_TVAL_EL0, DAIF};
use tock_registers::interfaces::{Readable, Writeable};

use crate::hal::{Barrier, HwPort, SysReg};

#[derive(Clone, Copy, Default, Debug)]
pub struct Aarch64Port;

impl HwPort for Aarch64Port {
    #[inline(always)]
    fn read32(&self, addr: usize) -> u32 {
        // SAFETY: Addresses come from KernelConfig / platform constants and
        // name device registers mapped at those physical addresses.
        unsafe { ptr::read_volatile(addr as *const u32) }
    }

    #[inline(always)]
    fn write32(&self, addr: usize, val: u32) {
        // SAFETY: See read32.
        unsafe { ptr::write_volatile(addr as *mut u32, val) }
    }

    #[inline(always)]
    fn write8(&self, addr: usize, val: u8) {
        // SAFETY: See read32. GICD_IPRIORITYR is byte-accessible.
        unsafe { ptr::write_volatile(addr as *mut u8, val) }
    }

    fn read_sysreg(&self, reg: SysReg) -> u64 {
        match reg {
            SysReg::CntfrqEl0 => CNTFRQ_EL0.get(),
            SysReg::CntpCtlEl0 => CNTP_CTL_EL0.get(),
            SysReg::CntpTvalEl0 => CNTP_TVAL_EL0.get(),
            SysReg::Daif => DAIF.get(),
        }
    }

    fn write_sysreg(&self, reg: SysReg, val: u64) {
        match reg {
            // Read-only for EL1 purposes; firmware owns it.
            SysReg::CntfrqEl0 => {}
            SysReg::CntpCtlEl0 => CNTP_CTL_EL0.set(val),
            SysReg::CntpTvalEl0 => CNTP_TVAL_EL0.set(val),
            SysReg::Daif => DAIF.set(val),
        }
    }

    #[allow(unused_unsafe)]
    #[inline(always)]
    fn barrier(&self, kind: Barrier) {
        // SAFETY: Barriers have no memory-safety preconditions.
        unsafe {
            match kind {
                Barrier::DsbSy => barrier::dsb(barrier::SY),
                Barrier::DmbIsh => barrier::dmb(barrier::ISH),
                Barrier::Isb => barrier::isb(barrier::SY),
            }
        }
    }

    #[allow(unused_unsafe)]
    #[inline(always)]
    fn wait_for_event(&self) {
        // SAFETY: wfe is a hint instruction, safe at EL1.
        unsafe { asm::wfe() }
    }

    #[allow(unused_unsafe)]
    #[inline(always)]
    fn send_event(&self) {
        // SAFETY: sev is a hint instruction, safe at EL1.
        unsafe { asm::sev() }
    }
}
