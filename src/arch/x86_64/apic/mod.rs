//! Advanced Programmable Interrupt Controller.

pub mod lapic;
