//! Interface de Syscalls do Brasa OS.
//!
//! A entrada é o vetor de trap dedicado; o dispatcher de traps registra o
//! frame na tarefa e chama `syscall_dispatcher`, que roteia pelo número em
//! RAX e devolve o resultado em RAX.
//!
//! # Módulos
//!
//! - `numbers`: constantes das syscalls
//! - `dispatch`: dispatcher central

pub mod dispatch;
pub mod numbers;

pub use dispatch::syscall_dispatcher;
