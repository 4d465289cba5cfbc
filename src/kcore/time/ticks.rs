//! Relógio global de ticks.
//!
//! Um contador único protegido por lock, avançado uma vez por interrupção
//! de timer, e somente pelo núcleo designado (`TICK_CPU`): N interrupções
//! significam exatamente N incrementos. Após cada incremento, com o lock
//! já liberado, os waiters recebem broadcast e re-checam o valor (o
//! contador pode ter andado entre o acordar e a re-checagem).

use crate::arch::traits::cpu::CoreId;
use crate::sched::task::Task;
use crate::sync::{CondVar, Spinlock};

/// Núcleo designado para avançar o relógio global.
pub const TICK_CPU: CoreId = 0;

static TICKS: Spinlock<u64> = Spinlock::new(0);
static TICK_WAITERS: CondVar = CondVar::new();

/// Avança o relógio em um tick e acorda os waiters.
///
/// Chamar apenas do tratamento da interrupção de timer, no `TICK_CPU`.
pub fn tick() {
    let mut ticks = TICKS.lock();
    *ticks = ticks.wrapping_add(1);
    drop(ticks);

    // Broadcast fora do lock; waiters toleram acordadas espúrias
    TICK_WAITERS.notify_all();
}

/// Valor atual do relógio.
pub fn current() -> u64 {
    *TICKS.lock()
}

/// A espera terminou antes do prazo porque a tarefa foi morta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepInterrupted;

/// Espera o relógio avançar `count` ticks.
///
/// Re-checa a flag `killed` da tarefa a cada acordada: uma tarefa morta não
/// fica presa dormindo.
pub fn sleep_ticks(task: &Task, count: u64) -> Result<(), SleepInterrupted> {
    let start = current();
    let mut generation = TICK_WAITERS.generation();

    while current().wrapping_sub(start) < count {
        if task.killed() {
            return Err(SleepInterrupted);
        }
        generation = TICK_WAITERS.wait_beyond(generation);
    }
    Ok(())
}
