/// Structured kernel logging: `klog!` macro
///
/// Provides compile-time level filtering with an automatic tick stamp.
/// Output format: `[TICK:XXXXXXXX] [LEVEL] message`
///
/// Each line is formatted into a stack buffer and handed to the sink in
/// one `write_bytes` call, so a sink that masks interrupts per call never
/// shows half a line. With no sink installed, lines are dropped.
///
/// Usage:
/// ```ignore
/// klog!(LogLevel::Info, "gic up ({:?})", mode);
/// klog!(LogLevel::Debug, "spurious IAR 0x{:X}", iar);
/// ```

use core::fmt::{self, Write};
use core::sync::atomic::{AtomicU64, Ordering};

use crate::kernel::cell::KernelCell;
use crate::uart::ByteSink;

// ─── Log Levels ────────────────────────────────────────────────────

/// Log severity levels; lower value = higher severity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn  = 1,
    Info  = 2,
    Debug = 3,
}

/// Compile-time maximum log level. Messages above this are eliminated by
/// the compiler (dead-code elimination). Set to 3 for debug builds.
pub const LOG_LEVEL: u8 = 2; // INFO

/// Longest line emitted; the rest is cut.
pub const LINE_MAX: usize = 160;

// ─── Global sink + tick stamp ──────────────────────────────────────

static SINK: KernelCell<Option<&'static dyn ByteSink>> = KernelCell::new(None);

static TICK: AtomicU64 = AtomicU64::new(0);

/// Install the console used by `klog!`.
///
/// # Safety
///
/// Must be called before interrupts are enabled (no concurrent reader).
pub unsafe fn set_sink(sink: &'static dyn ByteSink) {
    // SAFETY: Caller guarantees boot context, single-core.
    unsafe { *SINK.get_mut() = Some(sink) };
}

/// Publish the dispatcher's tick count for log prefixes.
pub fn stamp_tick(tick: u64) {
    TICK.store(tick, Ordering::Relaxed);
}

pub fn tick() -> u64 {
    TICK.load(Ordering::Relaxed)
}

// ─── Line buffer ───────────────────────────────────────────────────

/// Fixed-capacity `fmt::Write` target. Silently truncates.
pub struct LineBuf {
    buf: [u8; LINE_MAX],
    len: usize,
}

impl LineBuf {
    pub const fn new() -> Self {
        Self { buf: [0; LINE_MAX], len: 0 }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    fn push(&mut self, bytes: &[u8]) {
        let room = LINE_MAX - self.len;
        let n = bytes.len().min(room);
        self.buf[self.len..self.len + n].copy_from_slice(&bytes[..n]);
        self.len += n;
    }
}

impl Default for LineBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for LineBuf {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push(s.as_bytes());
        Ok(())
    }
}

// ─── Logging Internals ────────────────────────────────────────────

/// Write `[TICK:XXXXXXXX] [LEVEL] ` into `line`.
pub fn format_prefix(line: &mut LineBuf, level: LogLevel, tick: u64) {
    line.push(b"[TICK:");
    let hex = b"0123456789ABCDEF";
    for i in (0..8u32).rev() {
        let nibble = ((tick >> (i * 4)) & 0xF) as usize;
        line.push(&hex[nibble..nibble + 1]);
    }
    line.push(b"] ");

    let tag: &[u8] = match level {
        LogLevel::Error => b"[ERROR] ",
        LogLevel::Warn  => b"[WARN ] ",
        LogLevel::Info  => b"[INFO ] ",
        LogLevel::Debug => b"[DEBUG] ",
    };
    line.push(tag);
}

/// Format a full line (prefix, message, newline).
pub fn format_line(level: LogLevel, tick: u64, args: fmt::Arguments) -> LineBuf {
    let mut line = LineBuf::new();
    format_prefix(&mut line, level, tick);
    let _ = line.write_fmt(args);
    line.push(b"\n");
    line
}

/// Print a formatted log message with prefix and trailing newline.
///
/// Called by the `klog!` macro, not intended for direct use.
#[inline(never)]
pub fn log_message(level: LogLevel, args: fmt::Arguments) {
    // SAFETY: SINK is written once at boot before interrupts are enabled.
    let sink = unsafe { *SINK.get() };
    if let Some(sink) = sink {
        let line = format_line(level, tick(), args);
        sink.write_bytes(line.as_bytes());
    }
}

// ─── Public Macro ──────────────────────────────────────────────────

/// Structured kernel log macro with compile-time level filtering.
///
/// Messages with level > `LOG_LEVEL` are eliminated at compile time.
#[macro_export]
macro_rules! klog {
    ($level:expr, $($arg:tt)*) => {
        if ($level as u8) <= $crate::kernel::log::LOG_LEVEL {
            $crate::kernel::log::log_message($level, format_args!($($arg)*));
        }
    };
}
