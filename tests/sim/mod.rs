/// Simulated GICv2 + generic timer + PL011 behind `HwPort`
///
/// Models just enough register semantics for the drivers:
///   - GICD set/clear register pairs (enable, pending, active)
///   - IGROUPR read/write when secure, RAZ/WI when non-secure
///   - ICFGR, byte-wide IPRIORITYR
///   - GICC_IAR pops a queue of raised values (1023 when empty)
///   - CNTP_CTL / CNTP_TVAL / CNTFRQ / DAIF
///   - UART DR captured, FR never full
/// Every side effect the ordering tests care about lands in `events`.

use std::cell::RefCell;
use std::collections::VecDeque;

use ticktock::gic::*;
use ticktock::hal::{Barrier, HwPort, SysReg};
use ticktock::platform::qemu_virt::{GICC_BASE, GICD_BASE, TIMER_FREQ_HZ, UART0_BASE};
use ticktock::uart::UART_DR;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HwEvent {
    Iar(u32),
    Eoi(u32),
    TimerCtl(u64),
    TimerTval(u64),
    Daif(u64),
    Barrier(Barrier),
    Sev,
    Wfe,
}

struct SimState {
    secure: bool,
    gicd_ctlr: u32,
    igroupr: [u32; 32],
    enable: [u32; 32],
    pending: [u32; 32],
    active: [u32; 32],
    icfgr: [u32; 64],
    priority: [u8; 1024],
    gicc_ctlr: u32,
    pmr: u32,
    bpr: u32,
    iar_queue: VecDeque<u32>,
    cntfrq: u64,
    cntp_ctl: u64,
    cntp_tval: u64,
    daif: u64,
    uart: Vec<u8>,
    events: Vec<HwEvent>,
}

pub struct SimPort {
    state: RefCell<SimState>,
}

/// Which 32-bit register bank a GICD offset falls in.
fn bank(offset: usize, base: usize) -> usize {
    (offset - base) / 4
}

impl SimPort {
    fn with_security(secure: bool) -> Self {
        Self {
            state: RefCell::new(SimState {
                secure,
                gicd_ctlr: 0,
                igroupr: [0; 32],
                enable: [0; 32],
                pending: [0; 32],
                active: [0; 32],
                icfgr: [0; 64],
                priority: [0; 1024],
                gicc_ctlr: 0,
                pmr: 0,
                bpr: 3,
                iar_queue: VecDeque::new(),
                cntfrq: TIMER_FREQ_HZ,
                cntp_ctl: 0,
                cntp_tval: 0,
                daif: 0,
                uart: Vec::new(),
                events: Vec::new(),
            }),
        }
    }

    /// GIC accessed from the secure side: group registers writable.
    pub fn secure() -> Self {
        Self::with_security(true)
    }

    /// GIC accessed from the non-secure side: group registers RAZ/WI.
    pub fn non_secure() -> Self {
        Self::with_security(false)
    }

    /// Queue a value for the next GICC_IAR read.
    pub fn raise(&self, iar: u32) {
        self.state.borrow_mut().iar_queue.push_back(iar);
    }

    pub fn pending_iars(&self) -> usize {
        self.state.borrow().iar_queue.len()
    }

    pub fn set_cntfrq(&self, hz: u64) {
        self.state.borrow_mut().cntfrq = hz;
    }

    pub fn set_daif(&self, val: u64) {
        self.state.borrow_mut().daif = val;
    }

    /// Pretend firmware left every PPI enabled, pending, active and edge.
    pub fn dirty_ppis(&self) {
        let mut s = self.state.borrow_mut();
        s.enable[0] = 0xFFFF_FFFF;
        s.pending[0] = 0xFFFF_FFFF;
        s.active[0] = 0xFFFF_FFFF;
        s.icfgr[1] = 0xFFFF_FFFF;
    }

    pub fn events(&self) -> Vec<HwEvent> {
        self.state.borrow().events.clone()
    }

    pub fn clear_events(&self) {
        self.state.borrow_mut().events.clear();
    }

    pub fn eois(&self) -> Vec<u32> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                HwEvent::Eoi(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, ev: HwEvent) -> usize {
        self.state.borrow().events.iter().filter(|&&e| e == ev).count()
    }

    pub fn gicd_ctlr(&self) -> u32 {
        self.state.borrow().gicd_ctlr
    }

    /// IGROUPR0 as stored (ignores RAZ so tests can see writes landed).
    pub fn igroupr0(&self) -> u32 {
        self.state.borrow().igroupr[0]
    }

    pub fn enabled0(&self) -> u32 {
        self.state.borrow().enable[0]
    }

    pub fn pending0(&self) -> u32 {
        self.state.borrow().pending[0]
    }

    pub fn active0(&self) -> u32 {
        self.state.borrow().active[0]
    }

    pub fn icfgr(&self, n: usize) -> u32 {
        self.state.borrow().icfgr[n]
    }

    pub fn priority(&self, intid: u32) -> u8 {
        self.state.borrow().priority[intid as usize]
    }

    pub fn gicc_ctlr(&self) -> u32 {
        self.state.borrow().gicc_ctlr
    }

    pub fn pmr(&self) -> u32 {
        self.state.borrow().pmr
    }

    pub fn bpr(&self) -> u32 {
        self.state.borrow().bpr
    }

    pub fn cntp_ctl(&self) -> u64 {
        self.state.borrow().cntp_ctl
    }

    pub fn cntp_tval(&self) -> u64 {
        self.state.borrow().cntp_tval
    }

    pub fn daif(&self) -> u64 {
        self.state.borrow().daif
    }

    pub fn uart_output(&self) -> String {
        String::from_utf8_lossy(&self.state.borrow().uart).into_owned()
    }

    fn push(&self, ev: HwEvent) {
        self.state.borrow_mut().events.push(ev);
    }

    fn gicd_read(&self, off: usize) -> u32 {
        let s = self.state.borrow();
        match off {
            GICD_CTLR => s.gicd_ctlr,
            o if (GICD_IGROUPR..GICD_ISENABLER).contains(&o) => {
                if s.secure {
                    s.igroupr[bank(o, GICD_IGROUPR)]
                } else {
                    0
                }
            }
            o if (GICD_ISENABLER..GICD_ICENABLER).contains(&o) => s.enable[bank(o, GICD_ISENABLER)],
            o if (GICD_ICENABLER..GICD_ISPENDR).contains(&o) => s.enable[bank(o, GICD_ICENABLER)],
            o if (GICD_ISPENDR..GICD_ICPENDR).contains(&o) => s.pending[bank(o, GICD_ISPENDR)],
            o if (GICD_ICPENDR..GICD_ISACTIVER).contains(&o) => s.pending[bank(o, GICD_ICPENDR)],
            o if (GICD_ISACTIVER..GICD_ICACTIVER).contains(&o) => s.active[bank(o, GICD_ISACTIVER)],
            o if (GICD_ICACTIVER..GICD_IPRIORITYR).contains(&o) => s.active[bank(o, GICD_ICACTIVER)],
            o if (GICD_IPRIORITYR..GICD_IPRIORITYR + 1020).contains(&o) => {
                let i = o - GICD_IPRIORITYR;
                u32::from_le_bytes([s.priority[i], s.priority[i + 1], s.priority[i + 2], s.priority[i + 3]])
            }
            o if (GICD_ICFGR..GICD_ICFGR + 256).contains(&o) => s.icfgr[bank(o, GICD_ICFGR)],
            _ => 0,
        }
    }

    fn gicd_write(&self, off: usize, val: u32) {
        let mut s = self.state.borrow_mut();
        match off {
            GICD_CTLR => s.gicd_ctlr = val,
            o if (GICD_IGROUPR..GICD_ISENABLER).contains(&o) => {
                if s.secure {
                    s.igroupr[bank(o, GICD_IGROUPR)] = val;
                }
            }
            o if (GICD_ISENABLER..GICD_ICENABLER).contains(&o) => s.enable[bank(o, GICD_ISENABLER)] |= val,
            o if (GICD_ICENABLER..GICD_ISPENDR).contains(&o) => s.enable[bank(o, GICD_ICENABLER)] &= !val,
            o if (GICD_ISPENDR..GICD_ICPENDR).contains(&o) => s.pending[bank(o, GICD_ISPENDR)] |= val,
            o if (GICD_ICPENDR..GICD_ISACTIVER).contains(&o) => s.pending[bank(o, GICD_ICPENDR)] &= !val,
            o if (GICD_ISACTIVER..GICD_ICACTIVER).contains(&o) => s.active[bank(o, GICD_ISACTIVER)] |= val,
            o if (GICD_ICACTIVER..GICD_IPRIORITYR).contains(&o) => s.active[bank(o, GICD_ICACTIVER)] &= !val,
            o if (GICD_ICFGR..GICD_ICFGR + 256).contains(&o) => s.icfgr[bank(o, GICD_ICFGR)] = val,
            _ => {}
        }
    }

    fn gicc_read(&self, off: usize) -> u32 {
        match off {
            GICC_IAR => {
                let iar = self.state.borrow_mut().iar_queue.pop_front().unwrap_or(INTID_SPURIOUS);
                self.push(HwEvent::Iar(iar));
                iar
            }
            GICC_CTLR => self.state.borrow().gicc_ctlr,
            GICC_PMR => self.state.borrow().pmr,
            GICC_BPR => self.state.borrow().bpr,
            GICC_RPR => 0xFF,
            GICC_HPPIR => INTID_SPURIOUS,
            _ => 0,
        }
    }

    fn gicc_write(&self, off: usize, val: u32) {
        match off {
            GICC_EOIR => self.push(HwEvent::Eoi(val)),
            GICC_CTLR => self.state.borrow_mut().gicc_ctlr = val,
            GICC_PMR => self.state.borrow_mut().pmr = val,
            GICC_BPR => self.state.borrow_mut().bpr = val,
            _ => {}
        }
    }
}

impl HwPort for SimPort {
    fn read32(&self, addr: usize) -> u32 {
        if (GICD_BASE..GICD_BASE + 0x1000).contains(&addr) {
            self.gicd_read(addr - GICD_BASE)
        } else if (GICC_BASE..GICC_BASE + 0x1000).contains(&addr) {
            self.gicc_read(addr - GICC_BASE)
        } else {
            // UART_FR included: TX FIFO never full
            0
        }
    }

    fn write32(&self, addr: usize, val: u32) {
        if (GICD_BASE..GICD_BASE + 0x1000).contains(&addr) {
            self.gicd_write(addr - GICD_BASE, val)
        } else if (GICC_BASE..GICC_BASE + 0x1000).contains(&addr) {
            self.gicc_write(addr - GICC_BASE, val)
        } else if addr == UART0_BASE + UART_DR {
            self.state.borrow_mut().uart.push(val as u8);
        }
    }

    fn write8(&self, addr: usize, val: u8) {
        let prio = GICD_BASE + GICD_IPRIORITYR;
        if (prio..prio + 1024).contains(&addr) {
            self.state.borrow_mut().priority[addr - prio] = val;
        } else if addr == UART0_BASE + UART_DR {
            self.state.borrow_mut().uart.push(val);
        }
    }

    fn read_sysreg(&self, reg: SysReg) -> u64 {
        let s = self.state.borrow();
        match reg {
            SysReg::CntfrqEl0 => s.cntfrq,
            SysReg::CntpCtlEl0 => s.cntp_ctl,
            SysReg::CntpTvalEl0 => s.cntp_tval,
            SysReg::Daif => s.daif,
        }
    }

    fn write_sysreg(&self, reg: SysReg, val: u64) {
        match reg {
            SysReg::CntfrqEl0 => self.state.borrow_mut().cntfrq = val,
            SysReg::CntpCtlEl0 => {
                // ISTATUS is read-only
                self.state.borrow_mut().cntp_ctl = val & 0b11;
                self.push(HwEvent::TimerCtl(val & 0b11));
            }
            SysReg::CntpTvalEl0 => {
                self.state.borrow_mut().cntp_tval = val;
                self.push(HwEvent::TimerTval(val));
            }
            SysReg::Daif => {
                self.state.borrow_mut().daif = val;
                self.push(HwEvent::Daif(val));
            }
        }
    }

    fn barrier(&self, kind: Barrier) {
        self.push(HwEvent::Barrier(kind));
    }

    fn wait_for_event(&self) {
        self.push(HwEvent::Wfe);
    }

    fn send_event(&self) {
        self.push(HwEvent::Sev);
    }
}
