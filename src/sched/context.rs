//! Context switch
//!
//! Troca de contexto cooperativa entre o loop do scheduler e as tarefas.
//! Salva apenas os registradores callee-saved (SysV ABI); o resto está no
//! trap frame ou é clobber da própria chamada.

/// Contexto de CPU (registradores salvos)
#[repr(C)]
pub struct CpuContext {
    // Callee-saved registers (SysV ABI)
    pub rbx: u64,
    pub rbp: u64,
    pub r12: u64,
    pub r13: u64,
    pub r14: u64,
    pub r15: u64,

    // Stack pointer
    pub rsp: u64,

    // Instruction pointer (endereço de retomada)
    pub rip: u64,
}

impl CpuContext {
    pub const fn new() -> Self {
        Self {
            rbx: 0,
            rbp: 0,
            r12: 0,
            r13: 0,
            r14: 0,
            r15: 0,
            rsp: 0,
            rip: 0,
        }
    }

    /// Configura para iniciar em função específica com a stack dada.
    pub fn setup(&mut self, entry: u64, stack_top: u64) {
        self.rip = entry;
        self.rsp = stack_top;
        self.rbp = 0;
    }
}

extern "C" {
    fn context_switch_asm(old: u64, new: u64);
}

/// Realiza a troca de contexto. Retorna quando `old` for retomado.
///
/// # Safety
///
/// - Interrupções devem estar desabilitadas.
/// - `old` e `new` devem ser ponteiros válidos para contextos vivos.
pub unsafe fn switch(old: *mut CpuContext, new: *const CpuContext) {
    context_switch_asm(old as u64, new as u64);
}

// RDI = old (mut ptr), RSI = new (ptr)
// Offsets do CpuContext:
// 0x00:rbx 0x08:rbp 0x10:r12 0x18:r13 0x20:r14 0x28:r15 0x30:rsp 0x38:rip
core::arch::global_asm!(
    r#"
.global context_switch_asm
context_switch_asm:
    // Salvar registradores callee-saved no contexto antigo
    mov [rdi + 0x00], rbx
    mov [rdi + 0x08], rbp
    mov [rdi + 0x10], r12
    mov [rdi + 0x18], r13
    mov [rdi + 0x20], r14
    mov [rdi + 0x28], r15

    // Ponto de retomada: o endereço de retorno desta chamada
    mov rax, [rsp]
    mov [rdi + 0x38], rax
    lea rax, [rsp + 8]
    mov [rdi + 0x30], rax

    // Restaurar o contexto novo
    mov rbx, [rsi + 0x00]
    mov rbp, [rsi + 0x08]
    mov r12, [rsi + 0x10]
    mov r13, [rsi + 0x18]
    mov r14, [rsi + 0x20]
    mov r15, [rsi + 0x28]
    mov rsp, [rsi + 0x30]
    mov rax, [rsi + 0x38]
    jmp rax
"#
);
