//! Estado por núcleo do scheduler.
//!
//! Cada núcleo tem seu slot com a tarefa corrente e o contexto do loop do
//! scheduler. Outros núcleos só tocam o slot alheio através do `Arc<Task>`
//! clonado (ex: marcar killed); o slot em si é local.

use crate::arch::{Cpu, CpuOps};
use crate::sched::context::CpuContext;
use crate::sched::task::Task;
use crate::sync::Spinlock;
use alloc::sync::Arc;
use core::cell::UnsafeCell;

pub const MAX_CPUS: usize = 8;

pub struct CpuSlot {
    current: Spinlock<Option<Arc<Task>>>,
    /// Contexto do loop do scheduler deste núcleo. Só o próprio núcleo
    /// toca, com interrupções desabilitadas.
    pub(crate) scheduler: UnsafeCell<CpuContext>,
}

// SAFETY: `current` é protegido por Spinlock; `scheduler` obedece a
// disciplina acima.
unsafe impl Sync for CpuSlot {}

impl CpuSlot {
    const fn new() -> Self {
        Self {
            current: Spinlock::new(None),
            scheduler: UnsafeCell::new(CpuContext::new()),
        }
    }
}

static CPUS: [CpuSlot; MAX_CPUS] = [const { CpuSlot::new() }; MAX_CPUS];

/// Slot do núcleo atual.
pub(crate) fn slot() -> &'static CpuSlot {
    &CPUS[Cpu::core_id() as usize % MAX_CPUS]
}

/// Tarefa corrente deste núcleo, se houver.
pub fn current_task() -> Option<Arc<Task>> {
    slot().current.lock().clone()
}

pub(crate) fn set_current(task: Arc<Task>) {
    *slot().current.lock() = Some(task);
}

pub(crate) fn take_current() -> Option<Arc<Task>> {
    slot().current.lock().take()
}
