//! Gerenciamento da Global Descriptor Table (GDT) e Task State Segment (TSS).
//!
//! A GDT define os segmentos de Código/Dados para Kernel e Usuário; os bits
//! baixos de CS em um trap frame dizem o privilégio do contexto interrompido.
//! O TSS fornece a stack de kernel (RSP0) usada pela CPU ao cruzar de Ring 3
//! para Ring 0 em uma interrupção.

use crate::sync::Spinlock;
use core::arch::asm;
use core::cell::UnsafeCell;
use core::mem::size_of;

/// Seletor de segmento
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct SegmentSelector(pub u16);

impl SegmentSelector {
    pub const fn new(index: u16, rpl: u8) -> Self {
        Self((index << 3) | (rpl as u16))
    }
}

/// Constantes de seletores
// Index 0: Null
// Index 1: Kernel Code
// Index 2: Kernel Data
// Index 3: User Data
// Index 4: User Code
// Index 5: TSS (ocupa 2 slots em 64-bit)
pub const KERNEL_CODE_SEL: SegmentSelector = SegmentSelector::new(1, 0);
pub const KERNEL_DATA_SEL: SegmentSelector = SegmentSelector::new(2, 0);
pub const USER_DATA_SEL: SegmentSelector = SegmentSelector::new(3, 3);
pub const USER_CODE_SEL: SegmentSelector = SegmentSelector::new(4, 3);
pub const TSS_SEL: SegmentSelector = SegmentSelector::new(5, 0);

/// Entrada da GDT (64-bit)
#[derive(Debug, Clone, Copy)]
#[repr(C, packed)]
pub struct GdtEntry {
    limit_low: u16,
    base_low: u16,
    base_mid: u8,
    access: u8,
    flags_limit_high: u8,
    base_high: u8,
}

impl GdtEntry {
    pub const fn null() -> Self {
        Self {
            limit_low: 0,
            base_low: 0,
            base_mid: 0,
            access: 0,
            flags_limit_high: 0,
            base_high: 0,
        }
    }

    pub const fn kernel_code() -> Self {
        Self {
            limit_low: 0xFFFF,
            base_low: 0,
            base_mid: 0,
            access: 0x9A,           // Present, Ring 0, Code, Readable
            flags_limit_high: 0xAF, // Long mode, limit high
            base_high: 0,
        }
    }

    pub const fn kernel_data() -> Self {
        Self {
            limit_low: 0xFFFF,
            base_low: 0,
            base_mid: 0,
            access: 0x92, // Present, Ring 0, Data, Writable
            flags_limit_high: 0xCF,
            base_high: 0,
        }
    }

    pub const fn user_data() -> Self {
        Self {
            limit_low: 0xFFFF,
            base_low: 0,
            base_mid: 0,
            access: 0xF2, // Present, Ring 3, Data, Writable
            flags_limit_high: 0xCF,
            base_high: 0,
        }
    }

    pub const fn user_code() -> Self {
        Self {
            limit_low: 0xFFFF,
            base_low: 0,
            base_mid: 0,
            access: 0xFA, // Present, Ring 3, Code, Readable
            flags_limit_high: 0xAF,
            base_high: 0,
        }
    }

    /// Metade baixa do descritor de sistema do TSS (16 bytes no total).
    fn tss_low(base: u64, limit: u32) -> Self {
        Self {
            limit_low: (limit & 0xFFFF) as u16,
            base_low: (base & 0xFFFF) as u16,
            base_mid: ((base >> 16) & 0xFF) as u8,
            access: 0x89, // Present, 64-bit TSS (Available)
            flags_limit_high: ((limit >> 16) & 0xF) as u8,
            base_high: ((base >> 24) & 0xFF) as u8,
        }
    }

    /// Metade alta do descritor do TSS: bits 32-63 da base.
    fn tss_high(base: u64) -> Self {
        Self {
            limit_low: ((base >> 32) & 0xFFFF) as u16,
            base_low: ((base >> 48) & 0xFFFF) as u16,
            base_mid: 0,
            access: 0,
            flags_limit_high: 0,
            base_high: 0,
        }
    }
}

/// Task State Segment de 64-bit
#[repr(C, packed(4))]
pub struct TaskStateSegment {
    reserved0: u32,
    rsp0: u64,
    rsp1: u64,
    rsp2: u64,
    reserved1: u64,
    ist: [u64; 7],
    reserved2: u64,
    reserved3: u16,
    iomap_base: u16,
}

impl TaskStateSegment {
    const fn new() -> Self {
        Self {
            reserved0: 0,
            rsp0: 0,
            rsp1: 0,
            rsp2: 0,
            reserved1: 0,
            ist: [0; 7],
            reserved2: 0,
            reserved3: 0,
            iomap_base: size_of::<TaskStateSegment>() as u16,
        }
    }
}

const GDT_ENTRIES: usize = 7;

#[repr(C, align(16))]
struct Gdt {
    entries: [GdtEntry; GDT_ENTRIES],
}

#[repr(C, packed)]
struct GdtDescriptor {
    limit: u16,
    base: u64,
}

const INTERRUPT_STACK_SIZE: usize = 16 * 1024;

/// Stack usada pela CPU ao entrar no Ring 0 a partir do Ring 3 (TSS.RSP0).
/// UnsafeCell mantém o static em seção gravável; só a CPU escreve nela.
#[repr(C, align(16))]
struct InterruptStack(UnsafeCell<[u8; INTERRUPT_STACK_SIZE]>);

unsafe impl Sync for InterruptStack {}

static INTERRUPT_STACK: InterruptStack =
    InterruptStack(UnsafeCell::new([0; INTERRUPT_STACK_SIZE]));

// Tabela compartilhada por todos os núcleos; mutada apenas em init().
static GDT: Spinlock<Gdt> = Spinlock::new(Gdt {
    entries: [GdtEntry::null(); GDT_ENTRIES],
});

struct TssCell(UnsafeCell<TaskStateSegment>);

// SAFETY: escrito apenas em init() (boot single-core); depois lido só pela CPU
unsafe impl Sync for TssCell {}

static TSS: TssCell = TssCell(UnsafeCell::new(TaskStateSegment::new()));

/// Constrói a GDT e o TSS e ativa ambos no BSP.
///
/// # Safety
///
/// Chamar uma única vez, no boot, antes de habilitar interrupções.
pub unsafe fn init() {
    let tss_ptr = TSS.0.get();
    (*tss_ptr).rsp0 = INTERRUPT_STACK.0.get() as u64 + INTERRUPT_STACK_SIZE as u64;

    let tss_base = tss_ptr as u64;
    let tss_limit = (size_of::<TaskStateSegment>() - 1) as u32;

    {
        let mut gdt = GDT.lock();
        gdt.entries[0] = GdtEntry::null();
        gdt.entries[1] = GdtEntry::kernel_code();
        gdt.entries[2] = GdtEntry::kernel_data();
        gdt.entries[3] = GdtEntry::user_data();
        gdt.entries[4] = GdtEntry::user_code();
        gdt.entries[5] = GdtEntry::tss_low(tss_base, tss_limit);
        gdt.entries[6] = GdtEntry::tss_high(tss_base);
    }

    load();

    // Carrega o Task Register (apenas o BSP; ltr marca o TSS como Busy)
    asm!("ltr ax", in("ax") TSS_SEL.0, options(nostack, preserves_flags));
}

/// Ativa a GDT compartilhada no núcleo atual e recarrega os seletores.
///
/// # Safety
///
/// `init()` deve ter construído a tabela antes.
pub unsafe fn load() {
    let gdt = GDT.lock();
    let descriptor = GdtDescriptor {
        limit: (size_of::<Gdt>() - 1) as u16,
        base: &*gdt as *const Gdt as u64,
    };

    asm!(
        "lgdt [{desc}]",
        // Recarregar CS com far return
        "push {kcode}",
        "lea rax, [rip + 2f]",
        "push rax",
        "retfq",
        "2:",
        // Recarregar segmentos de dados
        "mov ds, {kdata:x}",
        "mov es, {kdata:x}",
        "mov ss, {kdata:x}",
        desc = in(reg) &descriptor,
        kcode = const KERNEL_CODE_SEL.0 as u64,
        kdata = in(reg) KERNEL_DATA_SEL.0,
        out("rax") _,
    );
}
