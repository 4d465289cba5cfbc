//! Entry Point Lógico do Kernel.
//!
//! `kernel_main` é o primeiro código Rust de alto nível após o trampolim em
//! assembly (`_start`). Inicializa os subsistemas na ordem estrita de
//! dependência (Arch -> Memória -> Drivers -> Scheduler) e entrega o núcleo
//! ao loop do scheduler.

use crate::arch::{Cpu, CpuOps};
use crate::sched::{self, Task};

/// Função principal do Kernel no BSP. Não retorna.
#[no_mangle]
pub extern "C" fn kernel_main() -> ! {
    // 1. Serial primeiro: a partir daqui kinfo!/kerror! funcionam
    crate::drivers::serial::init();
    crate::kinfo!("Brasa OS Kernel - Iniciando");

    // 2. Arquitetura: GDT, tabela de vetores e LAPIC, antes de qualquer
    //    operação que possa gerar falhas
    unsafe {
        crate::arch::platform::init_bsp();
    }

    // 3. Memória: PMM, Heap (habilita Box/Vec/Arc)
    crate::mm::init();

    // 4. Drivers: timer de hardware e discos
    crate::drivers::timer::init();
    crate::drivers::ide::init();

    // 5. Self tests (feature self_test), com o kernel já de pé
    #[cfg(feature = "self_test")]
    run_self_tests();

    // 6. Scheduler: tarefa idle e loop de escalonamento
    crate::kinfo!("Inicializando Scheduler...");
    sched::spawn(Task::kernel("idle", idle_task));
    sched::scheduler_loop();
}

/// Entrada dos núcleos adicionais: ativa a tabela de vetores compartilhada
/// e entra no scheduler. O trampolim de boot dos APs é responsabilidade do
/// firmware/loader.
#[no_mangle]
pub extern "C" fn ap_main() -> ! {
    unsafe {
        crate::arch::platform::init_ap();
    }
    crate::kinfo!("(Boot) Nucleo adicional ativo:", Cpu::core_id() as u64);
    sched::scheduler_loop();
}

/// Tarefa idle: habilita interrupções e dorme; o tick do timer preempta.
extern "C" fn idle_task() -> ! {
    Cpu::enable_interrupts();
    loop {
        Cpu::halt();
    }
}

#[cfg(feature = "self_test")]
fn run_self_tests() {
    crate::kinfo!("Executando self tests...");
    crate::arch::test::run_arch_tests();
    crate::kcore::test::run_core_tests();
    crate::mm::test::run_memory_tests();
}
