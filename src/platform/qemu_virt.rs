/// QEMU `virt` machine (Cortex-A53/A57, GICv2)
///
/// MMIO addresses and interrupt numbering used by the drivers and by
/// `KernelConfig::QEMU_VIRT`.

// ─── GIC (Generic Interrupt Controller) ────────────────────────────

/// GIC Distributor base address
pub const GICD_BASE: usize = 0x0800_0000;

/// GIC CPU Interface base address
pub const GICC_BASE: usize = 0x0801_0000;

// ─── UART ──────────────────────────────────────────────────────────

/// PL011 UART0 base address
pub const UART0_BASE: usize = 0x0900_0000;

// ─── Timer ─────────────────────────────────────────────────────────

/// GIC INTID for the EL1 physical timer (PPI 14 → INTID 30)
pub const TIMER_INTID: u32 = 30;

/// Distributor priority for the timer: mid-range
pub const TIMER_PRIORITY: u8 = 0x80;

/// Default tick rate
pub const TICK_HZ: u32 = 100;

/// Counter frequency QEMU reports in CNTFRQ_EL0 (informational; the
/// driver always reads the register)
pub const TIMER_FREQ_HZ: u64 = 62_500_000;
