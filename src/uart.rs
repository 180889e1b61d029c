/// PL011 UART driver: QEMU virt UART0 at 0x0900_0000
///
/// Blocking, polled transmit only. Used as the diagnostic console; the
/// kernel core sees it only through `ByteSink`, so running without a
/// console changes nothing but the output.

use crate::hal::HwPort;

/// Data register
pub const UART_DR: usize = 0x000;
/// Flag register
pub const UART_FR: usize = 0x018;
/// FR.TXFF: transmit FIFO full
pub const UART_FR_TXFF: u32 = 1 << 5;

/// Opaque byte output. May block until there is space.
pub trait ByteSink {
    fn write_bytes(&self, bytes: &[u8]);
}

pub struct Pl011<P: HwPort> {
    port: P,
    base: usize,
}

impl<P: HwPort> Pl011<P> {
    pub const fn new(port: P, base: usize) -> Self {
        Self { port, base }
    }

    /// Write one byte, spinning while the TX FIFO is full.
    pub fn putc(&self, byte: u8) {
        while self.port.read32(self.base + UART_FR) & UART_FR_TXFF != 0 {
            core::hint::spin_loop();
        }
        self.port.write32(self.base + UART_DR, byte as u32);
    }

    pub fn puts(&self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    /// Print a u64 as 16 hex digits
    pub fn put_hex(&self, val: u64) {
        let hex = b"0123456789ABCDEF";
        for i in (0..16).rev() {
            let nibble = ((val >> (i * 4)) & 0xF) as usize;
            self.putc(hex[nibble]);
        }
    }

    /// Print a u64 in decimal
    pub fn put_dec(&self, mut val: u64) {
        if val == 0 {
            self.putc(b'0');
            return;
        }
        let mut buf = [0u8; 20];
        let mut i = 0;
        while val > 0 {
            buf[i] = b'0' + (val % 10) as u8;
            val /= 10;
            i += 1;
        }
        while i > 0 {
            i -= 1;
            self.putc(buf[i]);
        }
    }
}

impl<P: HwPort> ByteSink for Pl011<P> {
    fn write_bytes(&self, bytes: &[u8]) {
        for &b in bytes {
            self.putc(b);
        }
    }
}

impl<P: HwPort> core::fmt::Write for Pl011<P> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.puts(s);
        Ok(())
    }
}
