//! Heap do kernel.
//!
//! Alocador global (`Box`, `Vec`, `Arc`) sobre uma arena estática,
//! delegado ao `linked_list_allocator`.

use core::cell::UnsafeCell;
use linked_list_allocator::LockedHeap;

#[global_allocator]
static ALLOCATOR: LockedHeap = LockedHeap::empty();

const HEAP_SIZE: usize = 1024 * 1024;

#[repr(C, align(4096))]
struct HeapArena(UnsafeCell<[u8; HEAP_SIZE]>);

// SAFETY: a arena só é acessada através do LockedHeap
unsafe impl Sync for HeapArena {}

static HEAP_ARENA: HeapArena = HeapArena(UnsafeCell::new([0; HEAP_SIZE]));

/// Inicializa o heap sobre a arena estática.
///
/// # Safety
///
/// Chamar uma única vez, antes da primeira alocação.
pub unsafe fn init() {
    ALLOCATOR
        .lock()
        .init(HEAP_ARENA.0.get() as *mut u8, HEAP_SIZE);
}
