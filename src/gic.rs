/// Generic Interrupt Controller: GICv2 driver
///
/// Brings the distributor and CPU interface to a minimal known state and
/// routes exactly one private peripheral interrupt (the timer). Every
/// register access goes through the `HwPort`, so the same code runs on
/// hardware and against the simulated register file in host tests.
///
/// QEMU virt machine GICv2 addresses:
///   GICD (Distributor):   0x0800_0000
///   GICC (CPU Interface): 0x0801_0000

use crate::hal::{Barrier, HwPort};
use crate::kernel::config::KernelConfig;

// ─── GICD register offsets ─────────────────────────────────────────

pub const GICD_CTLR: usize = 0x000;
pub const GICD_IGROUPR: usize = 0x080; // Group (1 bit per INTID, 0 = group 0)
pub const GICD_ISENABLER: usize = 0x100; // Set-enable (write-1-to-set)
pub const GICD_ICENABLER: usize = 0x180; // Clear-enable (write-1-to-clear)
pub const GICD_ISPENDR: usize = 0x200;
pub const GICD_ICPENDR: usize = 0x280;
pub const GICD_ISACTIVER: usize = 0x300;
pub const GICD_ICACTIVER: usize = 0x380;
pub const GICD_IPRIORITYR: usize = 0x400; // Priority (1 byte per INTID)
pub const GICD_ICFGR: usize = 0xC00; // Config (2 bits per INTID, bit 1 = edge)

// ─── GICC register offsets ─────────────────────────────────────────

pub const GICC_CTLR: usize = 0x000;
pub const GICC_PMR: usize = 0x004;
pub const GICC_BPR: usize = 0x008;
pub const GICC_IAR: usize = 0x00C;
pub const GICC_EOIR: usize = 0x010;
pub const GICC_RPR: usize = 0x014;
pub const GICC_HPPIR: usize = 0x018;

// ─── Bit values ────────────────────────────────────────────────────

/// GICD_CTLR: EnableGrp0 | EnableGrp1
pub const GICD_CTLR_ENABLE_GRP0_GRP1: u32 = 0b11;

/// GICC_CTLR: EnableGrp0
pub const GICC_CTLR_ENABLE_GRP0: u32 = 1 << 0;
/// GICC_CTLR: EnableGrp1
pub const GICC_CTLR_ENABLE_GRP1: u32 = 1 << 1;
/// GICC_CTLR: FIQEn: group 0 is signalled as FIQ
pub const GICC_CTLR_FIQ_EN: u32 = 1 << 3;

/// PPIs occupy INTIDs 16..=31 of bank 0
pub const PPI_BANK_MASK: u32 = 0xFFFF_0000;

/// Lowest acknowledge value that is not a real interrupt (1020..=1023)
pub const INTID_SPECIAL_MIN: u32 = 1020;

/// "No pending interrupt"
pub const INTID_SPURIOUS: u32 = 1023;

/// INTID field of GICC_IAR
const IAR_INTID_MASK: u32 = 0x3FF;

// ─── Types ─────────────────────────────────────────────────────────

/// Security state the CPU interface is being driven from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SecurityMode {
    /// Group registers writable; timer routed to group 0 and taken as FIQ.
    Secure,
    /// Group registers RAZ/WI; timer routed to group 1 and taken as IRQ.
    NonSecure,
}

/// Raw GICC_IAR value.
///
/// EOI must be written with this exact value, not just the INTID: bits
/// above the INTID field carry the source CPU for SGIs.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(transparent)]
pub struct Iar(pub u32);

impl Iar {
    #[inline(always)]
    pub const fn intid(self) -> u32 {
        self.0 & IAR_INTID_MASK
    }

    /// 1020..=1023: spurious or special, must not be EOI'd.
    #[inline(always)]
    pub const fn is_special(self) -> bool {
        self.intid() >= INTID_SPECIAL_MIN
    }

    #[inline(always)]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

// ─── Driver ────────────────────────────────────────────────────────

pub struct Gic<P: HwPort> {
    port: P,
    gicd_base: usize,
    gicc_base: usize,
    timer_intid: u32,
    timer_priority: u8,
    forced: Option<SecurityMode>,
    mode: SecurityMode,
}

impl<P: HwPort> Gic<P> {
    pub fn new(port: P, cfg: &KernelConfig) -> Self {
        Self {
            port,
            gicd_base: cfg.gicd_base,
            gicc_base: cfg.gicc_base,
            timer_intid: cfg.timer_intid,
            timer_priority: cfg.timer_priority,
            forced: cfg.security,
            mode: cfg.security.unwrap_or(SecurityMode::NonSecure),
        }
    }

    #[inline(always)]
    fn gicd_read(&self, offset: usize) -> u32 {
        self.port.read32(self.gicd_base + offset)
    }

    #[inline(always)]
    fn gicd_write(&self, offset: usize, val: u32) {
        self.port.write32(self.gicd_base + offset, val)
    }

    #[inline(always)]
    fn gicc_read(&self, offset: usize) -> u32 {
        self.port.read32(self.gicc_base + offset)
    }

    #[inline(always)]
    fn gicc_write(&self, offset: usize, val: u32) {
        self.port.write32(self.gicc_base + offset, val)
    }

    /// Bring the GIC up with only the timer routed.
    ///
    /// Order: distributor groups on, security probe (unless overridden),
    /// isolate the other PPIs, route the timer, open the CPU interface.
    /// A wrong routing here shows up only as a timer that never fires.
    pub fn init(&mut self) -> SecurityMode {
        let intid = self.timer_intid;
        let bit = 1u32 << (intid % 32);
        let bank = (intid / 32) as usize * 4;

        self.port.barrier(Barrier::DsbSy);

        // 1. Distributor: group 0 and group 1
        self.gicd_write(GICD_CTLR, GICD_CTLR_ENABLE_GRP0_GRP1);

        // 2. Security state
        self.mode = match self.forced {
            Some(mode) => mode,
            None => self.probe_security(),
        };

        // 3. Every other PPI: disabled, not pending, not active
        let others = PPI_BANK_MASK & !bit;
        self.gicd_write(GICD_ICENABLER, others);
        self.gicd_write(GICD_ICPENDR, others);
        self.gicd_write(GICD_ICACTIVER, others);

        // 4. Timer: group, level-triggered, enabled, priority
        let group = self.gicd_read(GICD_IGROUPR + bank);
        let group = match self.mode {
            SecurityMode::Secure => group & !bit,
            SecurityMode::NonSecure => group | bit,
        };
        self.gicd_write(GICD_IGROUPR + bank, group);
        self.set_level_triggered(intid);
        self.set_priority(intid, self.timer_priority);
        self.enable_intid(intid);

        // 5. CPU interface: all priorities, no preemption grouping
        self.gicc_write(GICC_PMR, 0xFF);
        self.gicc_write(GICC_BPR, 0);
        let mut ctlr = GICC_CTLR_ENABLE_GRP0 | GICC_CTLR_ENABLE_GRP1;
        if self.mode == SecurityMode::Secure {
            ctlr |= GICC_CTLR_FIQ_EN;
        }
        self.gicc_write(GICC_CTLR, ctlr);

        self.port.barrier(Barrier::DsbSy);
        self.port.barrier(Barrier::Isb);

        self.mode
    }

    /// Detect the security state by toggling the timer's group bit.
    ///
    /// From the secure side IGROUPR is read/write; from the non-secure
    /// side it is RAZ/WI. Set, reread, clear, reread: both writes visible
    /// means secure. Not guaranteed by the architecture for every GIC
    /// implementation, hence `KernelConfig::security` as an override.
    pub fn probe_security(&self) -> SecurityMode {
        let bit = 1u32 << (self.timer_intid % 32);
        let reg = GICD_IGROUPR + (self.timer_intid / 32) as usize * 4;

        let orig = self.gicd_read(reg);
        self.gicd_write(reg, orig | bit);
        let set_seen = self.gicd_read(reg) & bit != 0;
        self.gicd_write(reg, orig & !bit);
        let clear_seen = self.gicd_read(reg) & bit == 0;

        if set_seen && clear_seen {
            SecurityMode::Secure
        } else {
            SecurityMode::NonSecure
        }
    }

    /// Security state chosen by the last `init`.
    pub fn security(&self) -> SecurityMode {
        self.mode
    }

    pub fn timer_intid(&self) -> u32 {
        self.timer_intid
    }

    /// Enable a specific interrupt ID (write-1-to-set, no read-modify-write).
    pub fn enable_intid(&self, intid: u32) {
        let offset = GICD_ISENABLER + (intid / 32) as usize * 4;
        self.gicd_write(offset, 1u32 << (intid % 32));
    }

    /// Disable (mask) a specific interrupt ID.
    pub fn disable_intid(&self, intid: u32) {
        let offset = GICD_ICENABLER + (intid / 32) as usize * 4;
        self.gicd_write(offset, 1u32 << (intid % 32));
    }

    /// Set priority for a specific INTID (0 = highest, 0xFF = lowest)
    pub fn set_priority(&self, intid: u32, priority: u8) {
        self.port
            .write8(self.gicd_base + GICD_IPRIORITYR + intid as usize, priority);
    }

    /// Clear the edge bit for `intid` in GICD_ICFGR.
    pub fn set_level_triggered(&self, intid: u32) {
        let offset = GICD_ICFGR + (intid / 16) as usize * 4;
        let edge_bit = 1u32 << ((intid % 16) * 2 + 1);
        let val = self.gicd_read(offset);
        self.gicd_write(offset, val & !edge_bit);
    }

    /// Acknowledge: read GICC_IAR. Marks the interrupt active.
    pub fn acknowledge(&self) -> Iar {
        Iar(self.gicc_read(GICC_IAR))
    }

    /// End-of-interrupt with the raw value returned by `acknowledge`.
    pub fn end_of_interrupt(&self, iar: Iar) {
        self.gicc_write(GICC_EOIR, iar.raw());
    }

    pub fn port(&self) -> &P {
        &self.port
    }
}
