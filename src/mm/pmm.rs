//! Alocador físico de frames (bitmap).
//!
//! Gerencia uma região física contígua em frames de 4 KiB. Um bit por
//! frame: 1 = ocupado. A busca parte de uma dica circular para evitar
//! varrer o prefixo já cheio a cada alocação.
//!
//! Frames recém-alocados NÃO são zerados; quem mapeia para um novo dono
//! zera antes.

use crate::mm::{PAGE_SIZE, PHYS_POOL_SIZE};
use crate::sync::Spinlock;

const MAX_FRAMES: usize = (PHYS_POOL_SIZE as usize) / PAGE_SIZE;
const BITMAP_WORDS: usize = MAX_FRAMES / 64;

pub struct FrameAllocator {
    base: u64,
    frames: usize,
    free: usize,
    next_hint: usize,
    bitmap: [u64; BITMAP_WORDS],
}

impl FrameAllocator {
    const fn empty() -> Self {
        Self {
            base: 0,
            frames: 0,
            free: 0,
            next_hint: 0,
            bitmap: [0; BITMAP_WORDS],
        }
    }

    fn init(&mut self, base: u64, size: u64) {
        self.base = base;
        self.frames = (size as usize / PAGE_SIZE).min(MAX_FRAMES);
        self.free = self.frames;
        self.next_hint = 0;
        self.bitmap = [0; BITMAP_WORDS];
    }

    fn index_of(&self, phys: u64) -> Option<usize> {
        if phys < self.base {
            return None;
        }
        let index = ((phys - self.base) as usize) / PAGE_SIZE;
        if index < self.frames {
            Some(index)
        } else {
            None
        }
    }

    fn alloc(&mut self) -> Option<u64> {
        if self.free == 0 {
            return None;
        }
        for offset in 0..self.frames {
            let index = (self.next_hint + offset) % self.frames;
            let (word, bit) = (index / 64, index % 64);
            if self.bitmap[word] & (1 << bit) == 0 {
                self.bitmap[word] |= 1 << bit;
                self.free -= 1;
                self.next_hint = (index + 1) % self.frames;
                return Some(self.base + (index * PAGE_SIZE) as u64);
            }
        }
        None
    }

    fn free_at(&mut self, phys: u64) {
        let index = match self.index_of(phys) {
            Some(i) => i,
            None => {
                crate::kerror!("(PMM) free de frame fora do pool:", phys);
                return;
            }
        };
        let (word, bit) = (index / 64, index % 64);
        if self.bitmap[word] & (1 << bit) == 0 {
            crate::kerror!("(PMM) double free de frame:", phys);
            return;
        }
        self.bitmap[word] &= !(1 << bit);
        self.free += 1;
    }
}

static FRAME_ALLOCATOR: Spinlock<FrameAllocator> = Spinlock::new(FrameAllocator::empty());

/// Entrega a região física `[base, base+size)` ao alocador.
///
/// # Safety
///
/// A região deve ser RAM livre, não usada pelo kernel nem por MMIO, e
/// visível pelo direct map.
pub unsafe fn init(base: u64, size: u64) {
    FRAME_ALLOCATOR.lock().init(base, size);
}

/// Aloca um frame de 4 KiB. Conteúdo indefinido.
pub fn alloc_frame() -> Option<u64> {
    FRAME_ALLOCATOR.lock().alloc()
}

/// Devolve um frame ao alocador.
pub fn free_frame(phys: u64) {
    FRAME_ALLOCATOR.lock().free_at(phys);
}

/// Quantidade de frames livres.
pub fn free_frames() -> usize {
    FRAME_ALLOCATOR.lock().free
}
