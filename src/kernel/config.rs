/// Boot-time kernel configuration
///
/// Which MMIO blocks to drive, which PPI is the tick, how fast it ticks,
/// and whether the GIC security state is probed or stated.

use crate::gic::SecurityMode;
use crate::platform::qemu_virt;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct KernelConfig {
    pub gicd_base: usize,
    pub gicc_base: usize,
    /// GIC INTID of the periodic timer (must be a PPI: 16..=31)
    pub timer_intid: u32,
    pub timer_priority: u8,
    pub tick_hz: u32,
    /// `None` = probe the GIC; `Some` = trust this and skip the probe.
    pub security: Option<SecurityMode>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ConfigError {
    /// `tick_hz` is 0
    ZeroTickRate,
    /// `timer_intid` is outside the PPI range 16..=31
    IntidNotPpi,
}

impl KernelConfig {
    pub const QEMU_VIRT: KernelConfig = KernelConfig {
        gicd_base: qemu_virt::GICD_BASE,
        gicc_base: qemu_virt::GICC_BASE,
        timer_intid: qemu_virt::TIMER_INTID,
        timer_priority: qemu_virt::TIMER_PRIORITY,
        tick_hz: qemu_virt::TICK_HZ,
        security: None,
    };

    /// Same config with the security state fixed instead of probed.
    pub const fn with_security(mut self, mode: SecurityMode) -> Self {
        self.security = Some(mode);
        self
    }

    pub const fn with_tick_hz(mut self, hz: u32) -> Self {
        self.tick_hz = hz;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_hz == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if !(16..=31).contains(&self.timer_intid) {
            return Err(ConfigError::IntidNotPpi);
        }
        Ok(())
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self::QEMU_VIRT
    }
}
