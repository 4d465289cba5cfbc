//! Orquestrador de Agendamento.
//!
//! Round-robin FIFO: o loop do scheduler de cada núcleo retira a próxima
//! tarefa da fila global, troca para ela e a re-enfileira quando ela cede.
//!
//! ## Mecanismos de Execução:
//! - **Cooperativo:** tarefas cedem voluntariamente via `yield_now()`.
//! - **Preemptivo:** o dispatcher de traps chama `yield_now()` no tick do
//!   timer quando a tarefa corrente está em `Running`.

use crate::arch::{Cpu, CpuOps};
use crate::sched::context;
use crate::sched::percpu;
use crate::sched::task::{Task, TaskState};
use crate::sync::Spinlock;
use alloc::collections::VecDeque;
use alloc::sync::Arc;

static RUNQUEUE: Spinlock<VecDeque<Arc<Task>>> = Spinlock::new(VecDeque::new());

/// Tarefas mortas aguardando liberação de recursos.
static ZOMBIES: Spinlock<VecDeque<Arc<Task>>> = Spinlock::new(VecDeque::new());

/// Coloca uma tarefa na fila de execução.
pub fn spawn(task: Arc<Task>) {
    crate::ktrace!("(Sched) Nova tarefa na fila. TID=", task.tid.as_u32() as u64);
    task.set_state(TaskState::Ready);
    RUNQUEUE.lock().push_back(task);
}

/// Loop do scheduler do núcleo atual. Nunca retorna.
///
/// Cada iteração escolhe a próxima tarefa, troca para ela e trata o estado
/// em que ela voltou (cedeu, bloqueou ou morreu).
pub fn scheduler_loop() -> ! {
    crate::kinfo!("(Sched) Scheduler ativo no nucleo:", Cpu::core_id() as u64);
    loop {
        let next = RUNQUEUE.lock().pop_front();

        match next {
            Some(task) => {
                Cpu::disable_interrupts();
                task.set_state(TaskState::Running);
                percpu::set_current(task.clone());

                let slot = percpu::slot();
                // SAFETY: interrupções desabilitadas; contextos vivos
                unsafe { context::switch(slot.scheduler.get(), task.context_ptr()) }

                // A tarefa devolveu a CPU
                if let Some(prev) = percpu::take_current() {
                    match prev.state() {
                        TaskState::Ready => RUNQUEUE.lock().push_back(prev),
                        TaskState::Zombie => ZOMBIES.lock().push_back(prev),
                        // Blocked fica fora da fila; quem acordar re-enfileira
                        _ => {}
                    }
                }
                reap_zombies();
            }
            None => {
                // Fila vazia: dormir até a próxima interrupção
                Cpu::enable_interrupts();
                Cpu::halt();
            }
        }
    }
}

/// Cede a CPU voluntariamente. Retorna quando a tarefa for re-escalonada.
pub fn yield_now() {
    let task = match percpu::current_task() {
        Some(task) => task,
        None => return,
    };

    let interrupts_were_enabled = Cpu::interrupts_enabled();
    Cpu::disable_interrupts();

    task.set_state(TaskState::Ready);
    // SAFETY: interrupções desabilitadas; o scheduler re-enfileira a tarefa
    unsafe { context::switch(task.context_ptr(), percpu::slot().scheduler.get()) }

    if interrupts_were_enabled {
        Cpu::enable_interrupts();
    }
}

/// Termina a tarefa corrente. Não retorna.
pub fn exit_current() -> ! {
    let task = match percpu::current_task() {
        Some(task) => task,
        None => panic!("exit sem tarefa corrente"),
    };

    crate::kdebug!("(Sched) Tarefa terminando. TID=", task.tid.as_u32() as u64);

    Cpu::disable_interrupts();
    task.set_state(TaskState::Zombie);
    // SAFETY: interrupções desabilitadas; o scheduler recolhe a zumbi
    unsafe { context::switch(task.context_ptr(), percpu::slot().scheduler.get()) }

    panic!("tarefa zumbi retomada");
}

/// Libera recursos de tarefas mortas (drop do último Arc).
fn reap_zombies() {
    let mut zombies = ZOMBIES.lock();
    let count = zombies.len();
    if count > 0 {
        crate::ktrace!("(Sched) Limpando zumbis. Total=", count as u64);
        zombies.clear();
    }
}
