//! Tarefas do kernel.
//!
//! `Task` concentra o estado que o despacho de traps consulta: a flag
//! monotônica `killed`, o estado de execução, o limite de memória válida,
//! a raiz da page table e o ponteiro para o trap frame da syscall corrente.

use crate::arch::platform::trap::TrapFrame;
use crate::sched::context::CpuContext;
use crate::sync::Spinlock;
use crate::sys::Tid;
use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec;
use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicPtr, AtomicU32, AtomicU64, Ordering};

/// Estado de uma task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Recém criada, não executou ainda
    Created,
    /// Pronta para executar
    Ready,
    /// Executando em algum núcleo
    Running,
    /// Bloqueada esperando algo
    Blocked,
    /// Terminada, esperando cleanup
    Zombie,
}

impl TaskState {
    /// Verifica se pode ser escalonada
    pub const fn is_runnable(self) -> bool {
        matches!(self, Self::Ready | Self::Running)
    }
}

const KERNEL_STACK_SIZE: usize = 16 * 1024;

static NEXT_TID: AtomicU32 = AtomicU32::new(1);

fn next_tid() -> Tid {
    Tid::new(NEXT_TID.fetch_add(1, Ordering::Relaxed))
}

pub struct Task {
    pub tid: Tid,
    pub name: &'static str,
    /// Monotônica: uma vez true, nunca volta a false. Lida com Relaxed por
    /// outros núcleos; os pontos de re-checagem ficam no dispatcher.
    killed: AtomicBool,
    state: Spinlock<TaskState>,
    /// Topo do espaço de endereços virtual válido da tarefa.
    mem_limit: AtomicU64,
    /// Endereço físico da raiz (PML4) da page table da tarefa.
    page_table: AtomicU64,
    /// Trap frame da syscall em andamento, para leitura de argumentos e
    /// escrita do retorno.
    trap_frame: AtomicPtr<TrapFrame>,
    /// Contexto salvo. Só o scheduler toca, com interrupções desabilitadas.
    context: UnsafeCell<CpuContext>,
    _kernel_stack: Option<Box<[u8]>>,
}

// SAFETY: campos compartilhados são atômicos ou protegidos por Spinlock;
// `context` obedece a disciplina do scheduler.
unsafe impl Send for Task {}
unsafe impl Sync for Task {}

impl Task {
    /// Cria uma tarefa de kernel com stack própria, parada em `entry`.
    pub fn kernel(name: &'static str, entry: extern "C" fn() -> !) -> Arc<Task> {
        let stack = vec![0u8; KERNEL_STACK_SIZE].into_boxed_slice();
        let stack_top = (stack.as_ptr() as u64 + KERNEL_STACK_SIZE as u64) & !0xF;

        let mut context = CpuContext::new();
        context.setup(entry as u64, stack_top);

        Arc::new(Task {
            tid: next_tid(),
            name,
            killed: AtomicBool::new(false),
            state: Spinlock::new(TaskState::Created),
            mem_limit: AtomicU64::new(0),
            page_table: AtomicU64::new(0),
            trap_frame: AtomicPtr::new(core::ptr::null_mut()),
            context: UnsafeCell::new(context),
            _kernel_stack: Some(stack),
        })
    }

    /// Cria uma tarefa com espaço de endereços de usuário próprio.
    /// A carga do código de usuário é responsabilidade de quem chama.
    pub fn with_address_space(
        name: &'static str,
        page_table: u64,
        mem_limit: u64,
    ) -> Arc<Task> {
        Arc::new(Task {
            tid: next_tid(),
            name,
            killed: AtomicBool::new(false),
            state: Spinlock::new(TaskState::Created),
            mem_limit: AtomicU64::new(mem_limit),
            page_table: AtomicU64::new(page_table),
            trap_frame: AtomicPtr::new(core::ptr::null_mut()),
            context: UnsafeCell::new(CpuContext::new()),
            _kernel_stack: None,
        })
    }

    pub fn killed(&self) -> bool {
        self.killed.load(Ordering::Relaxed)
    }

    /// Marca a tarefa como morta. Só transiciona false -> true.
    pub fn mark_killed(&self) {
        self.killed.store(true, Ordering::Relaxed);
    }

    pub fn state(&self) -> TaskState {
        *self.state.lock()
    }

    pub fn set_state(&self, state: TaskState) {
        *self.state.lock() = state;
    }

    pub fn mem_limit(&self) -> u64 {
        self.mem_limit.load(Ordering::Relaxed)
    }

    pub fn page_table(&self) -> u64 {
        self.page_table.load(Ordering::Relaxed)
    }

    pub fn set_trap_frame(&self, frame: *mut TrapFrame) {
        self.trap_frame.store(frame, Ordering::Release);
    }

    pub fn trap_frame_ptr(&self) -> *mut TrapFrame {
        self.trap_frame.load(Ordering::Acquire)
    }

    pub(crate) fn context_ptr(&self) -> *mut CpuContext {
        self.context.get()
    }
}
