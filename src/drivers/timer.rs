//! Timer PIT (Programmable Interval Timer)
//!
//! Driver para o 8253/8254 PIT. Gera a interrupção periódica que vira o
//! tick global e o ponto de preempção do scheduler.

use crate::arch::platform::ports::outb;

const PIT_CHANNEL_0: u16 = 0x40;
const PIT_COMMAND: u16 = 0x43;
const PIT_BASE_FREQUENCY: u32 = 1193182; // Hz

/// Frequência do tick do sistema (interrupções por segundo).
pub const TICK_HZ: u32 = 100;

/// Programa o PIT para a frequência do tick.
pub fn init() {
    let divisor = (PIT_BASE_FREQUENCY / TICK_HZ) as u16;

    // Channel 0, rate generator, 16-bit (low byte depois high byte)
    outb(PIT_COMMAND, 0x36);
    outb(PIT_CHANNEL_0, (divisor & 0xFF) as u8);
    outb(PIT_CHANNEL_0, ((divisor >> 8) & 0xFF) as u8);

    crate::kinfo!("(Timer) PIT configurado. Hz=", TICK_HZ as u64);
}
