//! Gerenciamento da Interrupt Descriptor Table (IDT).
//!
//! Define a tabela usada pela CPU para despachar exceções de hardware
//! (Page Fault, GPF, etc.), interrupções externas (IRQs) e o vetor de
//! syscall invocável do Ring 3.
//!
//! Detalhes de Implementação:
//! - Define `IdtEntry` conforme especificação AMD64/Intel 64 (16 bytes).
//! - Mantém uma tabela estática de 256 entradas, compartilhada por todos os
//!   núcleos; construída uma única vez no boot, só leitura depois.
//! - `init()` aponta cada vetor para seu stub em `vectors.rs`.
//! - `load()` configura o registrador IDTR do núcleo atual (`lidt`).

use crate::arch::x86_64::gdt::KERNEL_CODE_SEL;
use crate::arch::x86_64::trap::T_SYSCALL;
use crate::arch::x86_64::vectors;
use crate::sync::Spinlock;
use core::mem::size_of;

pub const IDT_ENTRIES: usize = 256;

/// Present | DPL 0 | Interrupt Gate.
/// Vetores comuns: só hardware (ou o próprio kernel) pode dispará-los;
/// a CPU desabilita interrupções ao entrar.
pub const GATE_KERNEL_INTERRUPT: u8 = 0x8E;

/// Present | DPL 3 | Trap Gate.
/// O vetor de syscall: invocável por `int` diretamente do Ring 3.
pub const GATE_USER_TRAP: u8 = 0xEF;

/// Entrada da IDT (16 bytes em 64-bit)
#[derive(Debug, Clone, Copy)]
#[repr(C, packed)]
pub struct IdtEntry {
    offset_low: u16,
    selector: u16,
    ist_reserved: u8, // Bits 0-2: IST, 3-7: Reservado
    type_attr: u8,    // Gate Type, DPL, Present
    offset_mid: u16,
    offset_high: u32,
    reserved: u32,
}

impl IdtEntry {
    /// Cria uma entrada vazia (não presente)
    pub const fn missing() -> Self {
        Self {
            offset_low: 0,
            selector: 0,
            ist_reserved: 0,
            type_attr: 0,
            offset_mid: 0,
            offset_high: 0,
            reserved: 0,
        }
    }

    /// Cria uma entrada presente apontando para um handler
    pub fn new(handler: u64, type_attr: u8) -> Self {
        Self {
            offset_low: (handler & 0xFFFF) as u16,
            selector: KERNEL_CODE_SEL.0,
            ist_reserved: 0,
            type_attr,
            offset_mid: ((handler >> 16) & 0xFFFF) as u16,
            offset_high: (handler >> 32) as u32,
            reserved: 0,
        }
    }

    /// Endereço do handler codificado na entrada.
    pub fn handler(&self) -> u64 {
        let low = self.offset_low;
        let mid = self.offset_mid;
        let high = self.offset_high;
        low as u64 | ((mid as u64) << 16) | ((high as u64) << 32)
    }

    pub fn type_attr(&self) -> u8 {
        self.type_attr
    }

    /// DPL: privilégio mínimo para invocar o vetor voluntariamente via `int`.
    pub fn dpl(&self) -> u8 {
        (self.type_attr >> 5) & 0x3
    }

    pub fn is_present(&self) -> bool {
        self.type_attr & 0x80 != 0
    }
}

/// A Tabela IDT propriamente dita
#[repr(C, align(16))]
pub struct Idt {
    entries: [IdtEntry; IDT_ENTRIES],
}

/// Descritor para LIDT
#[repr(C, packed)]
struct IdtDescriptor {
    limit: u16,
    base: u64,
}

// Tabela compartilhada por todos os núcleos; escrita apenas em init().
static IDT: Spinlock<Idt> = Spinlock::new(Idt {
    entries: [IdtEntry::missing(); IDT_ENTRIES],
});

/// Constrói a tabela de vetores.
///
/// Todos os 256 vetores apontam para o stub genérico correspondente como
/// interrupt gate restrito ao kernel; a exceção é o vetor de syscall,
/// instalado como trap gate invocável do Ring 3.
///
/// # Safety
///
/// Deve rodar exatamente uma vez, no BSP, antes de qualquer trap possível.
pub unsafe fn init() {
    let mut idt = IDT.lock();

    for vector in 0..IDT_ENTRIES {
        idt.entries[vector] =
            IdtEntry::new(vectors::stub_addr(vector), GATE_KERNEL_INTERRUPT);
    }

    idt.entries[T_SYSCALL as usize] =
        IdtEntry::new(vectors::stub_addr(T_SYSCALL as usize), GATE_USER_TRAP);

    crate::kdebug!("(IDT) Tabela de vetores construida. Entradas=", IDT_ENTRIES as u64);
}

/// Ativa a tabela compartilhada no núcleo atual (`lidt`).
///
/// # Safety
///
/// `init()` deve ter construído a tabela antes. Chamar uma vez por núcleo.
pub unsafe fn load() {
    let idt = IDT.lock();
    let descriptor = IdtDescriptor {
        limit: (size_of::<Idt>() - 1) as u16,
        base: &*idt as *const Idt as u64,
    };
    core::arch::asm!(
        "lidt [{}]",
        in(reg) &descriptor,
        options(readonly, nostack, preserves_flags)
    );
}

/// Cópia da entrada de um vetor (para inspeção nos self-tests).
pub fn entry(vector: u8) -> IdtEntry {
    IDT.lock().entries[vector as usize]
}
