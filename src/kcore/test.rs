//! Testes do núcleo: classificação de traps, política de derrubada, relógio
//! e roteamento de syscalls.

use crate::arch::platform::trap::{
    termination_decision, Privilege, TerminationDecision, Trap, TrapFrame, T_IRQ0, T_PGFLT,
    T_SYSCALL,
};
use crate::kcore::time::ticks;
use crate::klib::test_framework::{check, run_test_suite, TestCase, TestResult};
use crate::sched::{Task, TaskState};
use crate::sync::Spinlock;
use crate::syscall::numbers::{SYS_GETPID, SYS_UPTIME};
use crate::syscall::syscall_dispatcher;

const CORE_TESTS: &[TestCase] = &[
    TestCase::new("trap_classification", test_trap_classification),
    TestCase::new("privilege_from_cs", test_privilege_from_cs),
    TestCase::new("termination_table", test_termination_table),
    TestCase::new("ticks_count_increments", test_ticks_count),
    TestCase::new("task_state_runnable", test_task_state_runnable),
    TestCase::new("sleep_interrupted_by_kill", test_sleep_interrupted),
    TestCase::new("syscall_return_in_rax", test_syscall_return),
    TestCase::new("syscall_unknown_number_fails", test_syscall_unknown),
    TestCase::new("spinlock_try_lock_contended", test_spinlock_try_lock),
];

pub fn run_core_tests() {
    run_test_suite("Core", CORE_TESTS);
}

/// Cada vetor conhecido cai no braço certo; o resto é Unknown.
fn test_trap_classification() -> TestResult {
    let cases: &[(u8, Trap)] = &[
        (T_SYSCALL, Trap::Syscall),
        (T_PGFLT, Trap::PageFault),
        (T_IRQ0, Trap::Timer),
        (T_IRQ0 + 1, Trap::Keyboard),
        (T_IRQ0 + 4, Trap::Com1),
        (T_IRQ0 + 14, Trap::Ide),
        (T_IRQ0 + 15, Trap::IdeSecondary),
        (T_IRQ0 + 7, Trap::Spurious),
        (T_IRQ0 + 31, Trap::Spurious),
        (13, Trap::Unknown(13)),
        (200, Trap::Unknown(200)),
    ];
    for &(vector, expected) in cases {
        if Trap::classify(vector) != expected {
            return TestResult::Failed;
        }
    }
    TestResult::Passed
}

fn test_privilege_from_cs() -> TestResult {
    check(
        Privilege::from_cs(0x08) == Privilege::Kernel
            && Privilege::from_cs(0x10) == Privilege::Kernel
            && Privilege::from_cs(0x1B) == Privilege::User
            && Privilege::from_cs(0x23) == Privilege::User,
    )
}

/// Tabela de decisão: morta em modo usuário cai agora; em modo kernel a
/// derrubada é adiada; viva continua.
fn test_termination_table() -> TestResult {
    check(
        termination_decision(Privilege::User, true) == TerminationDecision::TerminateNow
            && termination_decision(Privilege::Kernel, true) == TerminationDecision::Defer
            && termination_decision(Privilege::User, false) == TerminationDecision::Continue
            && termination_decision(Privilege::Kernel, false) == TerminationDecision::Continue,
    )
}

/// N ticks avançam o relógio em exatamente N.
fn test_ticks_count() -> TestResult {
    let before = ticks::current();
    for _ in 0..5 {
        ticks::tick();
    }
    check(ticks::current() == before + 5)
}

/// Só Ready e Running são escalonáveis.
fn test_task_state_runnable() -> TestResult {
    check(
        TaskState::Ready.is_runnable()
            && TaskState::Running.is_runnable()
            && !TaskState::Created.is_runnable()
            && !TaskState::Blocked.is_runnable()
            && !TaskState::Zombie.is_runnable(),
    )
}

/// Uma tarefa morta não fica presa dormindo: o sleep retorna na hora.
fn test_sleep_interrupted() -> TestResult {
    let task = Task::with_address_space("teste_sleep", 0, 0);
    task.mark_killed();
    // Marcar de novo não desfaz nada: a flag é monotônica
    task.mark_killed();
    check(ticks::sleep_ticks(&task, 1000) == Err(ticks::SleepInterrupted) && task.killed())
}

/// O dispatcher de syscalls lê o número em RAX do frame registrado na
/// tarefa e escreve o retorno de volta em RAX.
fn test_syscall_return() -> TestResult {
    let task = Task::with_address_space("teste_sys", 0, 0);
    let mut frame = TrapFrame::zeroed();

    frame.rax = SYS_GETPID;
    task.set_trap_frame(&mut frame);
    syscall_dispatcher(&task);
    if frame.rax != task.tid.as_u32() as u64 {
        return TestResult::Failed;
    }

    frame.rax = SYS_UPTIME;
    task.set_trap_frame(&mut frame);
    syscall_dispatcher(&task);
    check(frame.rax == ticks::current())
}

/// Número de syscall desconhecido devolve erro sem efeito colateral.
fn test_syscall_unknown() -> TestResult {
    let task = Task::with_address_space("teste_sys_2", 0, 0);
    let mut frame = TrapFrame::zeroed();
    frame.rax = 9999;
    task.set_trap_frame(&mut frame);
    syscall_dispatcher(&task);
    check(frame.rax == u64::MAX && !task.killed())
}

/// try_lock falha com o lock tomado e volta a funcionar depois do drop.
fn test_spinlock_try_lock() -> TestResult {
    let lock = Spinlock::new(0u32);
    let guard = match lock.try_lock() {
        Some(guard) => guard,
        None => return TestResult::Failed,
    };
    let contended = lock.try_lock().is_none();
    drop(guard);
    check(contended && lock.try_lock().is_some())
}
