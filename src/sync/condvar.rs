//! Condition Variable
//!
//! Broadcast por contador de gerações: `notify_all` incrementa a geração e
//! waiters giram até observar uma geração nova. Acordadas espúrias são
//! permitidas; quem espera DEVE re-checar a condição após acordar.

use core::sync::atomic::{AtomicU64, Ordering};

pub struct CondVar {
    generation: AtomicU64,
}

impl CondVar {
    pub const fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
        }
    }

    /// Lê a geração atual. Capturar ANTES de checar a condição pela qual
    /// se espera, e passar para `wait_beyond`.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Espera até a geração avançar além de `seen`. Retorna a geração nova.
    pub fn wait_beyond(&self, seen: u64) -> u64 {
        loop {
            let now = self.generation.load(Ordering::Acquire);
            if now != seen {
                return now;
            }
            core::hint::spin_loop();
        }
    }

    /// Acorda todos os waiters (broadcast).
    pub fn notify_all(&self) {
        self.generation.fetch_add(1, Ordering::Release);
    }
}
