//! Dispatcher central de traps.
//!
//! Toda transferência de controle para o kernel (interrupção de hardware,
//! exceção da CPU ou syscall) chega aqui com um `TrapFrame` montado pelos
//! stubs de `vectors.rs`. Cada invocação é uma transição autocontida:
//! classifica o vetor, executa o tratamento do caso e aplica a política
//! pós-despacho (derrubada de tarefa morta, preempção no tick do timer).
//!
//! A ordem dos campos do `TrapFrame` e o espaço de números de vetor são
//! contrato fixo com os stubs; não renumerar de forma independente.

use crate::arch::x86_64::apic::lapic;
use crate::arch::{Cpu, CpuOps};
use crate::kcore::time::ticks;
use crate::sched::{self, percpu, TaskState};

// --- Números de vetor ---

/// Exceção de Page Fault.
pub const T_PGFLT: u8 = 14;
/// Vetor de syscall, invocável por `int` do Ring 3.
pub const T_SYSCALL: u8 = 64;
/// Base dos IRQs externos (0-31 são exceções da CPU).
pub const T_IRQ0: u8 = 32;

pub const IRQ_TIMER: u8 = 0;
pub const IRQ_KBD: u8 = 1;
pub const IRQ_COM1: u8 = 4;
pub const IRQ_IDE: u8 = 14;
pub const IRQ_SPURIOUS: u8 = 31;

/// Estado do processador capturado na entrada do trap.
///
/// Layout fixo com os stubs: registradores gerais na ordem de push, número
/// do vetor, código de erro e o hardware frame empilhado pela CPU.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TrapFrame {
    pub r15: u64,
    pub r14: u64,
    pub r13: u64,
    pub r12: u64,
    pub r11: u64,
    pub r10: u64,
    pub r9: u64,
    pub r8: u64,
    pub rsi: u64,
    pub rdi: u64,
    pub rbp: u64,
    pub rdx: u64,
    pub rcx: u64,
    pub rbx: u64,
    pub rax: u64,

    pub vector: u64,
    pub error_code: u64,

    // Empilhado pela CPU
    pub rip: u64,
    pub cs: u64,
    pub rflags: u64,
    pub rsp: u64,
    pub ss: u64,
}

impl TrapFrame {
    /// Frame zerado (útil em testes).
    pub const fn zeroed() -> Self {
        // SAFETY: TrapFrame é repr(C) composto só de u64
        unsafe { core::mem::zeroed() }
    }
}

/// Privilégio do contexto interrompido, derivado dos bits baixos de CS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    Kernel,
    User,
}

impl Privilege {
    #[inline]
    pub fn from_cs(cs: u64) -> Self {
        if cs & 0x3 == 0 {
            Privilege::Kernel
        } else {
            Privilege::User
        }
    }
}

/// Classificação fechada dos vetores conhecidos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trap {
    Syscall,
    Timer,
    Ide,
    /// Linha secundária do controlador IDE: reconhecida, nunca tratada.
    IdeSecondary,
    Keyboard,
    Com1,
    Spurious,
    PageFault,
    Unknown(u8),
}

impl Trap {
    pub fn classify(vector: u8) -> Trap {
        match vector {
            T_SYSCALL => Trap::Syscall,
            T_PGFLT => Trap::PageFault,
            v if v == T_IRQ0 + IRQ_TIMER => Trap::Timer,
            v if v == T_IRQ0 + IRQ_IDE => Trap::Ide,
            v if v == T_IRQ0 + IRQ_IDE + 1 => Trap::IdeSecondary,
            v if v == T_IRQ0 + IRQ_KBD => Trap::Keyboard,
            v if v == T_IRQ0 + IRQ_COM1 => Trap::Com1,
            v if v == T_IRQ0 + 7 || v == T_IRQ0 + IRQ_SPURIOUS => Trap::Spurious,
            v => Trap::Unknown(v),
        }
    }
}

/// Decisão de derrubada de uma tarefa morta, em função do privilégio do
/// contexto interrompido.
///
/// Nunca desenrolar execução de kernel: uma tarefa morta interrompida em
/// modo kernel continua até o ponto seguro de retorno de syscall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationDecision {
    /// Derrubar agora: a tarefa estava em modo usuário.
    TerminateNow,
    /// Adiar: a tarefa está no meio de execução de kernel.
    Defer,
    /// Nada a fazer.
    Continue,
}

pub fn termination_decision(privilege: Privilege, killed: bool) -> TerminationDecision {
    match (privilege, killed) {
        (_, false) => TerminationDecision::Continue,
        (Privilege::User, true) => TerminationDecision::TerminateNow,
        (Privilege::Kernel, true) => TerminationDecision::Defer,
    }
}

/// Entrada única de despacho, chamada pelos stubs com o frame montado.
#[no_mangle]
pub extern "C" fn trap_handler(frame: &mut TrapFrame) {
    let trap = Trap::classify(frame.vector as u8);

    match trap {
        Trap::Syscall => {
            let task = match percpu::current_task() {
                Some(task) => task,
                None => panic!("syscall sem tarefa corrente"),
            };
            if task.killed() {
                sched::exit_current();
            }
            task.set_trap_frame(frame);
            crate::syscall::syscall_dispatcher(&task);
            // Outro núcleo pode ter ligado a flag durante a chamada
            if task.killed() {
                sched::exit_current();
            }
            return;
        }
        Trap::Timer => {
            // Apenas o núcleo designado avança o relógio global
            if Cpu::core_id() == ticks::TICK_CPU {
                ticks::tick();
            }
            lapic::eoi();
        }
        Trap::Ide => {
            crate::drivers::ide::interrupt();
            lapic::eoi();
        }
        Trap::IdeSecondary => {
            // A linha secundária dispara espúria em hardware emulado
            lapic::eoi();
        }
        Trap::Keyboard => {
            crate::drivers::keyboard::interrupt();
            lapic::eoi();
        }
        Trap::Com1 => {
            crate::drivers::serial::interrupt();
            lapic::eoi();
        }
        Trap::Spurious => {
            crate::kwarn!("(Trap) Interrupcao espuria no nucleo:", Cpu::core_id() as u64);
            crate::klog!("       CS=", frame.cs, " RIP=", frame.rip);
            crate::knl!();
            lapic::eoi();
        }
        Trap::PageFault => {
            crate::mm::fault::page_fault(frame);
        }
        Trap::Unknown(vector) => {
            unknown_trap(vector, frame);
        }
    }

    post_dispatch(trap, frame);
}

/// Vetor fora da classificação: defeito do kernel se o contexto era
/// privilegiado (ou não havia tarefa); tarefa mal-comportada caso contrário.
fn unknown_trap(vector: u8, frame: &TrapFrame) {
    let fault_addr = Cpu::fault_address();

    match percpu::current_task() {
        Some(task) if Privilege::from_cs(frame.cs) == Privilege::User => {
            crate::kerror!("(Trap) Trap inesperado de usuario. Vetor=", vector as u64);
            crate::klog!("       TID=", task.tid.as_u32() as u64, " Nome=");
            crate::klog!(task.name);
            crate::knl!();
            crate::klog!("       Err=", frame.error_code, " Nucleo=", Cpu::core_id() as u64);
            crate::knl!();
            crate::klog!("       RIP=", frame.rip, " CR2=", fault_addr);
            crate::knl!();
            crate::kerror!("(Trap) Matando tarefa");
            task.mark_killed();
        }
        _ => {
            crate::kerror!("(Trap) Trap inesperado em contexto de kernel. Vetor=", vector as u64);
            crate::kerror!("(Trap) Nucleo:", Cpu::core_id() as u64);
            crate::kerror!("(Trap) RIP:", frame.rip);
            crate::kerror!("(Trap) CR2:", fault_addr);
            panic!("trap inesperado");
        }
    }
}

/// Política pós-despacho, aplicada a todo caso exceto syscall.
fn post_dispatch(trap: Trap, frame: &TrapFrame) {
    let privilege = Privilege::from_cs(frame.cs);

    // Tarefa morta interrompida em modo usuário é derrubada aqui; em modo
    // kernel a derrubada espera o retorno de syscall.
    if let Some(task) = percpu::current_task() {
        if termination_decision(privilege, task.killed()) == TerminationDecision::TerminateNow {
            sched::exit_current();
        }
    }

    // Tick do timer é o ponto de preempção: quem está Running cede a CPU.
    if trap == Trap::Timer {
        if let Some(task) = percpu::current_task() {
            if task.state() == TaskState::Running {
                sched::yield_now();
            }
        }
    }

    // A flag pode ter sido ligada enquanto a tarefa estava preemptada
    if let Some(task) = percpu::current_task() {
        if termination_decision(privilege, task.killed()) == TerminationDecision::TerminateNow {
            sched::exit_current();
        }
    }
}
