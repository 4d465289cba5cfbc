//! Brasa Kernel Library.
//!
//! Ponto central de exportação dos módulos do Kernel.
//! Define a estrutura hierárquica do sistema operacional.

#![no_std]

// Habilitar alocação dinâmica (necessário para Vec/Box/Arc)
extern crate alloc;

// --- Módulos de Baixo Nível (Hardware) ---
pub mod arch; // HAL (CPU, GDT, IDT, Trap Dispatch)
pub mod drivers; // Drivers Específicos (Serial, Timer, Teclado, IDE)

// --- Módulos Centrais (Lógica do Kernel) ---
pub mod kcore; // Inicialização, Logs, Tempo
pub mod klib; // Utilitários Internos (Framework de Testes)
pub mod mm; // Gerenciamento de Memória (PMM, VMM, Heap, Page Fault)
pub mod sync; // Primitivas de Sincronização (Spinlock, CondVar)
pub mod sys; // Definições de Sistema (Tipos)

// --- Subsistemas ---
pub mod sched; // Scheduler e Tarefas
pub mod syscall; // Interface com Userspace

mod panic;
