//! Driver ATA/IDE (canal primário)
//!
//! ## Portas I/O
//!
//! | Porta  | Função           |
//! |--------|------------------|
//! | 0x1F0  | Data Register    |
//! | 0x1F1  | Error/Features   |
//! | 0x1F7  | Status/Command   |
//!
//! A interrupção do canal primário é entregue pelo dispatcher; a linha
//! secundária nunca chega aqui (dispara espúria em hardware emulado).

#![allow(dead_code)]

use crate::arch::platform::ports::inb;

/// Portas do Primary ATA
mod ports {
    pub const DATA: u16 = 0x1F0;
    pub const ERROR: u16 = 0x1F1;
    pub const STATUS: u16 = 0x1F7;
}

/// Bits do Status Register
mod status {
    pub const BSY: u8 = 0x80; // Busy
    pub const DRDY: u8 = 0x40; // Drive Ready
    pub const ERR: u8 = 0x01; // Error
}

/// Detecta a presença do controlador no canal primário.
pub fn init() {
    let st = inb(ports::STATUS);
    if st == 0xFF {
        // Barramento flutuando: sem controlador
        crate::kwarn!("(IDE) Canal primario ausente");
        return;
    }
    crate::kinfo!("(IDE) Canal primario presente. Status=", st as u64);
}

/// Entrada de interrupção do canal primário.
///
/// Ler STATUS baixa a linha de interrupção no controlador; sem fila de
/// requisições pendente, é só isso que o acknowledge exige.
pub fn interrupt() {
    let st = inb(ports::STATUS);
    if st & status::ERR != 0 {
        crate::kwarn!("(IDE) Erro reportado. Error=", inb(ports::ERROR) as u64);
    }
    crate::ktrace!("(IDE) Interrupcao tratada. Status=", st as u64);
}
