//! Tempo do sistema.

pub mod ticks;
