//! PS/2 Keyboard Driver
//!
//! Lê scancodes (Set 1) da porta 0x60 na interrupção e decodifica para
//! caracteres em um buffer de entrada.

use spin::Mutex;

use crate::arch::platform::ports::inb;

const DATA_PORT: u16 = 0x60;

/// Estado do decoder de scancodes
#[derive(Debug, Copy, Clone, PartialEq)]
enum DecodeState {
    /// Estado inicial
    Start,
    /// Recebeu 0xE0 (extended key)
    Extended,
}

/// Decoder de Scancode Set 1 (subconjunto: ASCII imprimível)
struct ScancodeDecoder {
    state: DecodeState,
    shift: bool,
}

impl ScancodeDecoder {
    const fn new() -> Self {
        Self {
            state: DecodeState::Start,
            shift: false,
        }
    }

    fn process_scancode(&mut self, code: u8) -> Option<char> {
        match self.state {
            DecodeState::Extended => {
                // Teclas estendidas não geram caractere aqui
                self.state = DecodeState::Start;
                None
            }
            DecodeState::Start => {
                if code == 0xE0 {
                    self.state = DecodeState::Extended;
                    return None;
                }
                if code >= 0x80 {
                    // Break code (tecla liberada)
                    self.handle_key_up(code - 0x80);
                    return None;
                }
                self.handle_key_down(code)
            }
        }
    }

    fn handle_key_up(&mut self, code: u8) {
        if code == 0x2A || code == 0x36 {
            self.shift = false;
        }
    }

    fn handle_key_down(&mut self, code: u8) -> Option<char> {
        if code == 0x2A || code == 0x36 {
            self.shift = true;
            return None;
        }

        // Mapa Set 1 para 0x00..0x39; 0 = tecla sem caractere
        const PLAIN: &[u8] =
            b"\x00\x001234567890-=\x08\tqwertyuiop[]\n\x00asdfghjkl;'`\x00\\zxcvbnm,./\x00*\x00 ";
        const SHIFTED: &[u8] =
            b"\x00\x00!@#$%^&*()_+\x08\tQWERTYUIOP{}\n\x00ASDFGHJKL:\"~\x00|ZXCVBNM<>?\x00*\x00 ";

        let table = if self.shift { SHIFTED } else { PLAIN };
        let byte = *table.get(code as usize)?;
        if byte == 0 {
            None
        } else {
            Some(byte as char)
        }
    }
}

static DECODER: Mutex<ScancodeDecoder> = Mutex::new(ScancodeDecoder::new());

const INPUT_CAPACITY: usize = 64;

struct InputBuffer {
    data: [char; INPUT_CAPACITY],
    head: usize,
    len: usize,
}

impl InputBuffer {
    const fn new() -> Self {
        Self {
            data: ['\0'; INPUT_CAPACITY],
            head: 0,
            len: 0,
        }
    }

    fn push(&mut self, c: char) {
        if self.len == INPUT_CAPACITY {
            return; // Cheio: descarta
        }
        let tail = (self.head + self.len) % INPUT_CAPACITY;
        self.data[tail] = c;
        self.len += 1;
    }

    fn pop(&mut self) -> Option<char> {
        if self.len == 0 {
            return None;
        }
        let c = self.data[self.head];
        self.head = (self.head + 1) % INPUT_CAPACITY;
        self.len -= 1;
        Some(c)
    }
}

static INPUT: Mutex<InputBuffer> = Mutex::new(InputBuffer::new());

/// Entrada de interrupção do teclado: lê e decodifica um scancode.
pub fn interrupt() {
    let code = inb(DATA_PORT);
    if let Some(c) = DECODER.lock().process_scancode(code) {
        INPUT.lock().push(c);
    }
}

/// Próximo caractere digitado, se houver.
pub fn read_char() -> Option<char> {
    INPUT.lock().pop()
}
