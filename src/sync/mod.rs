//! # Primitivas de Sincronização
//!
//! ## Hierarquia de Uso
//!
//! ```text
//! Spinlock   → Seções críticas curtas (não pode dormir; seguro em IRQ)
//! CondVar    → Espera por condição com broadcast (waiters re-checam)
//! ```
//!
//! ## Regras
//!
//! - **Spinlock**: desabilita interrupções no núcleo local enquanto o guard
//!   vive; é a única primitiva permitida dentro de handlers de interrupção.
//! - **Ordem de Lock**: sempre adquirir na mesma ordem para evitar deadlock.

pub mod condvar;
pub mod spinlock;

pub use condvar::CondVar;
pub use spinlock::{Spinlock, SpinlockGuard};
