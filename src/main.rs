//! Kernel Brasa - Binário Principal.
//!
//! Responsabilidade:
//! 1. Configurar a Stack inicial do BSP.
//! 2. Habilitar SSE.
//! 3. Saltar para `kcore::entry::kernel_main` (da biblioteca `brasa`).
//!
//! O loader de boot zera o BSS e entrega a CPU em modo longo com o
//! mapeamento higher-half já ativo antes de saltar para `_start`.

#![no_std]
#![no_main]

use brasa as _;
use core::cell::UnsafeCell;

const KERNEL_STACK_SIZE: usize = 64 * 1024;

// Stack do kernel do BSP (64 KB). UnsafeCell mantém o static em seção
// gravável; só o assembly de boot toca nela.
#[repr(C, align(16))]
struct KernelStack(UnsafeCell<[u8; KERNEL_STACK_SIZE]>);

unsafe impl Sync for KernelStack {}

#[no_mangle]
static KERNEL_STACK: KernelStack = KernelStack(UnsafeCell::new([0; KERNEL_STACK_SIZE]));

// Ponto de entrada do BSP.
// Configura o Stack Pointer (RSP), habilita SSE e chama kernel_main.
core::arch::global_asm!(
    r#"
    .section .text._start
    .global _start
_start:
    // 1. Configurar Stack Pointer (RSP)
    lea rax, [rip + KERNEL_STACK]
    lea rsp, [rax + {stack_size}]

    // 2. Zerar RBP (Frame Pointer)
    xor rbp, rbp

    // 3. Habilitar SSE (necessário para código Rust)
    mov rax, cr0
    and ax, 0xFFFB          // Limpar CR0.EM (bit 2)
    or ax, 0x2              // Setar CR0.MP (bit 1)
    mov cr0, rax
    mov rax, cr4
    or ax, 0x600            // Setar CR4.OSFXSR (bit 9) e CR4.OSXMMEXCPT (bit 10)
    mov cr4, rax

    // 4. Alinhamento de 16 bytes para SSE (System V ABI)
    and rsp, -16

    // 5. Saltar para o kernel de alto nível
    call kernel_main

    // 6. Halt Loop (kernel_main não deve retornar)
2:
    cli
    hlt
    jmp 2b
"#,
    stack_size = const KERNEL_STACK_SIZE,
);
