//! Panic Handler.
//!
//! Quando o Rust detecta um estado irrecuperável, esta função é chamada.
//! É o segundo nível de erro do kernel: defeitos do próprio kernel param
//! a máquina inteira, nunca tentam continuar.
//!
//! # Comportamento
//! 1. Desabilita interrupções (evita cascata de panics).
//! 2. Loga o diagnóstico na Serial.
//! 3. Trava a CPU (hlt loop).

use crate::arch::Cpu;
use crate::arch::CpuOps;
use core::panic::PanicInfo;

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    Cpu::disable_interrupts();

    crate::kerror!("================ KERNEL PANIC ================");

    if let Some(location) = info.location() {
        crate::kerror!("Arquivo:");
        crate::kerror!(location.file());
        crate::kerror!("Linha:", location.line() as u64);
    }

    // A mensagem usa core::fmt apenas aqui, no caminho frio.
    let _ = core::fmt::write(
        &mut crate::drivers::serial::PanicWriter,
        format_args!("{}\n", info.message()),
    );

    crate::kerror!("==============================================");

    Cpu::hang();
}
