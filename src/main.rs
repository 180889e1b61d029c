// ticktock: demo kernel binary
// This entire file is AArch64-only. When building for host tests (x86_64),
// the content is gated off and only the lib crate is tested.
//
// `kernel_main` is entered from external startup code at EL1 with a
// stack, IRQ/FIQ masked and the vector table pointing at the trampoline.

#![cfg_attr(target_arch = "aarch64", no_std)]
#![cfg_attr(target_arch = "aarch64", no_main)]
#![cfg_attr(not(target_arch = "aarch64"), allow(unused))]
#![deny(unsafe_op_in_unsafe_fn)]

#[cfg(target_arch = "aarch64")]
mod demo {
    use core::panic::PanicInfo;
    use core::sync::atomic::{AtomicU64, Ordering};

    use ticktock::arch::current::entry::{self, CONSOLE, HANDSHAKE};
    use ticktock::arch::current::port::Aarch64Port;
    use ticktock::hal::{HwPort, SysReg, DAIF_F, DAIF_I};
    use ticktock::kernel::cell::KernelCell;
    use ticktock::kernel::log::LogLevel;
    use ticktock::kernel::sync::with_masked;
    use ticktock::platform::qemu_virt::UART0_BASE;
    use ticktock::uart::{ByteSink, Pl011};
    use ticktock::{klog, KernelConfig, TaskStack};

    const ROUNDS: u32 = 50;
    const DELAY_SPINS: u32 = 200_000;
    const BG_STACK_SIZE: usize = 16 * 1024;

    #[repr(C, align(16))]
    struct Stack([u8; BG_STACK_SIZE]);

    static BG_STACK: KernelCell<Stack> = KernelCell::new(Stack([0; BG_STACK_SIZE]));

    /// Iterations the background task has completed.
    static BG_SPINS: AtomicU64 = AtomicU64::new(0);

    /// Background task: counts while the foreground is preempted.
    extern "C" fn background(step: usize) {
        loop {
            // Only writer: load + store.
            let n = BG_SPINS.load(Ordering::Relaxed);
            BG_SPINS.store(n + step as u64, Ordering::Relaxed);
            core::hint::spin_loop();
        }
    }

    fn delay() {
        for _ in 0..DELAY_SPINS {
            core::hint::spin_loop();
        }
    }

    #[no_mangle]
    pub extern "C" fn kernel_main() -> ! {
        let port = Aarch64Port;
        let uart = Pl011::new(port, UART0_BASE);

        // SAFETY: Entered once from startup at EL1 with IRQ/FIQ masked.
        match unsafe { entry::boot(KernelConfig::QEMU_VIRT) } {
            Ok(mode) => klog!(LogLevel::Info, "boot ({:?})", mode),
            Err(e) => {
                klog!(LogLevel::Error, "boot failed: {:?}", e);
                loop {
                    aarch64_cpu::asm::wfi();
                }
            }
        }

        let stack = TaskStack::new(BG_STACK.as_ptr() as *mut u8, BG_STACK_SIZE);
        // SAFETY: Still masked; BG_STACK is used by nothing else.
        match unsafe { entry::kernel_mut() } {
            Some(kernel) => {
                // SAFETY: BG_STACK is static and dedicated to this task.
                if let Err(e) = unsafe { kernel.scheduler_mut().add_task(stack, background, 1) } {
                    klog!(LogLevel::Error, "background task not registered: {:?}", e);
                }
            }
            None => klog!(LogLevel::Error, "kernel missing after boot"),
        }

        // Unmask IRQ + FIQ: the first tick builds the background frame.
        let daif = port.read_sysreg(SysReg::Daif);
        port.write_sysreg(SysReg::Daif, daif & !(DAIF_I | DAIF_F));

        for _ in 0..ROUNDS {
            uart.puts("1 ");
            delay();
            uart.puts("2 ");
            delay();
            uart.puts("3 ");
            delay();

            // One tick handshake per round.
            HANDSHAKE.request(&port, &port);

            with_masked(&port, || uart.puts(" [Tick]"));
        }

        klog!(
            LogLevel::Info,
            "done: {} handshakes, background spins={}",
            HANDSHAKE.serviced(),
            BG_SPINS.load(Ordering::Relaxed)
        );
        uart.puts("\nDone.\n");

        loop {
            aarch64_cpu::asm::wfi();
        }
    }

    #[panic_handler]
    fn panic(info: &PanicInfo) -> ! {
        CONSOLE.write_bytes(b"\n!!! KERNEL PANIC !!!\n");
        if let Some(loc) = info.location() {
            let uart = Pl011::new(Aarch64Port, UART0_BASE);
            uart.puts("  at: ");
            uart.puts(loc.file());
            uart.puts(":");
            uart.put_dec(loc.line() as u64);
            uart.puts("\n");
        }

        loop {
            Aarch64Port.wait_for_event();
        }
    }
}

// On host target: provide a main() so the bin target compiles
#[cfg(not(target_arch = "aarch64"))]
fn main() {}
