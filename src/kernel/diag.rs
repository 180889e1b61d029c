/// Register dump for bring-up
///
/// When the tick never arrives there is no error to report, only
/// silence. This logs the routing-relevant GIC and timer registers so a
/// misconfiguration can be spotted on the console.

use crate::gic::{
    GICC_CTLR, GICC_HPPIR, GICC_PMR, GICC_RPR, GICD_CTLR, GICD_IGROUPR, GICD_ISENABLER,
};
use crate::hal::{HwPort, SysReg};
use crate::kernel::config::KernelConfig;
use crate::kernel::log::LogLevel;
use crate::klog;

/// Snapshot of the registers `dump` prints.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RegSnapshot {
    pub gicd_ctlr: u32,
    pub igroupr0: u32,
    pub isenabler0: u32,
    pub gicc_ctlr: u32,
    pub pmr: u32,
    pub rpr: u32,
    pub hppir: u32,
    pub cntp_ctl: u64,
    pub cntfrq: u64,
    pub daif: u64,
}

/// Read the registers. GICC_IAR is deliberately not touched: reading it
/// acknowledges an interrupt.
pub fn snapshot<P: HwPort>(port: &P, cfg: &KernelConfig) -> RegSnapshot {
    RegSnapshot {
        gicd_ctlr: port.read32(cfg.gicd_base + GICD_CTLR),
        igroupr0: port.read32(cfg.gicd_base + GICD_IGROUPR),
        isenabler0: port.read32(cfg.gicd_base + GICD_ISENABLER),
        gicc_ctlr: port.read32(cfg.gicc_base + GICC_CTLR),
        pmr: port.read32(cfg.gicc_base + GICC_PMR),
        rpr: port.read32(cfg.gicc_base + GICC_RPR),
        hppir: port.read32(cfg.gicc_base + GICC_HPPIR),
        cntp_ctl: port.read_sysreg(SysReg::CntpCtlEl0),
        cntfrq: port.read_sysreg(SysReg::CntfrqEl0),
        daif: port.read_sysreg(SysReg::Daif),
    }
}

/// Snapshot and log at `level`. Registers are read even when `level`
/// is filtered out.
pub fn dump<P: HwPort>(port: &P, cfg: &KernelConfig, level: LogLevel, tag: &str) -> RegSnapshot {
    let s = snapshot(port, cfg);
    klog!(level, "diag {}", tag);
    klog!(
        level,
        "GICD_CTLR=0x{:08X} IGROUPR0=0x{:08X} ISENABLER0=0x{:08X}",
        s.gicd_ctlr,
        s.igroupr0,
        s.isenabler0
    );
    klog!(
        level,
        "GICC_CTLR=0x{:08X} PMR=0x{:08X} RPR=0x{:08X} HPPIR=0x{:08X}",
        s.gicc_ctlr,
        s.pmr,
        s.rpr,
        s.hppir
    );
    klog!(
        level,
        "CNTP_CTL=0x{:X} CNTFRQ={} DAIF=0x{:X}",
        s.cntp_ctl,
        s.cntfrq,
        s.daif
    );
    s
}
