/// Trap dispatcher: one call per interrupt
///
/// The trampoline saves the interrupted registers into a `TrapFrame`,
/// calls `Kernel::handle_trap` with its address, and restores from the
/// address returned. Switching tasks is returning a different frame.
///
/// Timer path ordering is fixed:
///   mask → rearm → (handshake, scheduler) → dsb → EOI(raw IAR) → isb → unmask
/// Unmasking before EOI lets the still-active line re-assert while the
/// CPU interface has not yet dropped its running priority.

use crate::gic::{Gic, SecurityMode};
use crate::hal::{Barrier, HwPort};
use crate::kernel::config::{ConfigError, KernelConfig};
use crate::kernel::context::ContextHandle;
use crate::kernel::diag;
use crate::kernel::log::{self, LogLevel};
use crate::kernel::sched::{Scheduler, PING_PONG};
use crate::kernel::sync::TickHandshake;
use crate::kernel::timer::Timer;
use crate::klog;

/// Per-class interrupt counters.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct TrapStats {
    /// Timer interrupts serviced
    pub timer: u64,
    /// Spurious/special IDs absorbed (no EOI)
    pub spurious: u64,
    /// Real but unexpected IDs (EOI only)
    pub unexpected: u64,
}

/// All kernel state the dispatcher touches, owned in one place.
///
/// The handshake is only borrowed: foreground code reaches it directly
/// while the dispatcher holds `&mut Kernel`.
pub struct Kernel<'h, P: HwPort + Copy, const N: usize = PING_PONG> {
    cfg: KernelConfig,
    gic: Gic<P>,
    timer: Timer<P>,
    sched: Scheduler<N>,
    handshake: &'h TickHandshake,
    ticks: u64,
    stats: TrapStats,
}

impl<'h, P: HwPort + Copy, const N: usize> Kernel<'h, P, N> {
    pub fn new(port: P, handshake: &'h TickHandshake, cfg: KernelConfig) -> Self {
        Self {
            cfg,
            gic: Gic::new(port, &cfg),
            timer: Timer::new(port),
            sched: Scheduler::new(),
            handshake,
            ticks: 0,
            stats: TrapStats::default(),
        }
    }

    /// Bring up the GIC and start the periodic timer.
    ///
    /// Call with interrupts still masked at the CPU; unmask afterwards.
    /// An invalid configuration is rejected before any register write.
    pub fn init(&mut self) -> Result<SecurityMode, ConfigError> {
        if let Err(e) = self.cfg.validate() {
            klog!(LogLevel::Error, "bad kernel config: {:?}", e);
            return Err(e);
        }

        let mode = self.gic.init();
        klog!(LogLevel::Info, "gic up, timer INTID {} ({:?})", self.cfg.timer_intid, mode);
        diag::dump(self.gic.port(), &self.cfg, LogLevel::Debug, "after gic init");

        self.timer.start(self.cfg.tick_hz);
        klog!(
            LogLevel::Info,
            "timer started ({} Hz, freq={} Hz)",
            self.cfg.tick_hz,
            self.timer.frequency()
        );
        diag::dump(self.gic.port(), &self.cfg, LogLevel::Debug, "after timer start");
        Ok(mode)
    }

    /// Dispatch one interrupt and return the frame to resume.
    pub fn handle_trap(&mut self, current: ContextHandle) -> ContextHandle {
        let iar = self.gic.acknowledge();

        // 1020..=1023: nothing was really pending. No EOI.
        if iar.is_special() {
            self.stats.spurious += 1;
            klog!(LogLevel::Debug, "spurious IAR 0x{:X}", iar.raw());
            return current;
        }

        if iar.intid() != self.gic.timer_intid() {
            self.stats.unexpected += 1;
            klog!(LogLevel::Debug, "unexpected INTID {}", iar.intid());
            self.gic.end_of_interrupt(iar);
            return current;
        }

        self.timer.mask();
        self.timer.rearm(self.cfg.tick_hz);

        self.ticks += 1;
        self.stats.timer += 1;
        log::stamp_tick(self.ticks);

        let port = *self.gic.port();
        self.handshake.service(&port, &port);

        let next = self.sched.schedule(current);

        port.barrier(Barrier::DsbSy);
        self.gic.end_of_interrupt(iar);
        port.barrier(Barrier::Isb);
        self.timer.unmask();

        next
    }

    /// Scheduler hook, exposed for task registration at boot.
    pub fn scheduler_mut(&mut self) -> &mut Scheduler<N> {
        &mut self.sched
    }

    pub fn scheduler(&self) -> &Scheduler<N> {
        &self.sched
    }

    pub fn gic(&self) -> &Gic<P> {
        &self.gic
    }

    pub fn timer(&self) -> &Timer<P> {
        &self.timer
    }

    pub fn config(&self) -> &KernelConfig {
        &self.cfg
    }

    /// Timer interrupts serviced since boot.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn stats(&self) -> TrapStats {
        self.stats
    }
}
