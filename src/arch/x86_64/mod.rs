//! Implementação x86_64

pub mod apic;
pub mod cpu;
pub mod gdt;
pub mod idt;
pub mod ports;
pub mod trap;
pub mod vectors;

pub use cpu::Cpu;

/// Inicializa o básico da arquitetura no BSP: GDT, tabela de vetores e LAPIC.
///
/// # Safety
///
/// Deve ser chamado uma única vez, no início do boot, com interrupções
/// desabilitadas e antes de qualquer trap possível.
pub unsafe fn init_bsp() {
    gdt::init();
    idt::init();
    idt::load();
    apic::lapic::init();

    crate::kinfo!("(Arch) BSP inicializado (GDT, IDT, LAPIC)");
}

/// Inicialização por núcleo adicional: ativa a tabela compartilhada e o
/// LAPIC local. A GDT e o conteúdo da IDT já foram construídos pelo BSP.
///
/// # Safety
///
/// Chamar uma única vez por núcleo, após `init_bsp`.
pub unsafe fn init_ap() {
    gdt::load();
    idt::load();
    apic::lapic::init();
}
