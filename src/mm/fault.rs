//! Resolvedor de Page Fault.
//!
//! Recebe a falha já classificada pelo dispatcher de traps e decide, nesta
//! ordem, do mais barato/fatal para o mais caro:
//!
//! 1. Falha em contexto de kernel (ou sem tarefa) num endereço do kernel:
//!    defeito do próprio kernel, panic com diagnóstico.
//! 2. Endereço acima do limite de memória da tarefa: fora do espaço de
//!    endereços válido, tarefa marcada como morta. Sem alocação.
//! 3. Bit PROTECTION do código de erro ligado: a página existe mas é
//!    protegida (guard page). Tarefa marcada como morta. Sem alocação.
//! 4. Caso contrário, demand paging: aloca um frame, zera, mapeia
//!    gravável e acessível ao usuário na base da página da falha. A
//!    instrução interrompida é re-executada pelo hardware e passa.
//!
//! Falhas nos passos de alocação/mapeamento também matam a tarefa (nunca
//! o kernel), e um frame alocado cujo mapeamento falhou volta ao alocador.

use crate::arch::platform::trap::{Privilege, TrapFrame};
use crate::arch::{Cpu, CpuOps};
use crate::mm::{page_round_down, phys_to_virt, pmm, vmm, KERNEL_BASE, PAGE_SIZE};
use crate::sched::task::Task;
use alloc::sync::Arc;
use bitflags::bitflags;

bitflags! {
    /// Código de erro empilhado pela CPU em um Page Fault.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PageFaultErrorCode: u64 {
        /// 0 = página não presente; 1 = violação de proteção em página presente.
        const PROTECTION = 1 << 0;
        /// 0 = leitura; 1 = escrita.
        const WRITE = 1 << 1;
        /// Falha originada em Ring 3.
        const USER = 1 << 2;
        /// Bit reservado ligado em alguma entrada da page table.
        const RESERVED = 1 << 3;
        /// Falha em busca de instrução.
        const INSTRUCTION = 1 << 4;
    }
}

/// Veredito da política de page fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultVerdict {
    /// Defeito do kernel: abortar o sistema.
    KernelFault,
    /// Falha da tarefa: marcar como morta, sem alocação.
    Kill(KillReason),
    /// Falha legítima de demand paging: alocar e mapear.
    DemandPage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillReason {
    /// Endereço além do limite de memória da tarefa.
    OutOfRange,
    /// Acesso a página presente mas protegida (guard page).
    GuardPage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemandPageError {
    /// Memória física esgotada.
    OutOfMemory,
    /// Mapeamento recusado pela VMM.
    MapFailed,
}

/// Política pura de page fault; não toca em estado algum.
///
/// `mem_limit` é `None` quando não há tarefa corrente. Uma falha sem tarefa
/// é sempre defeito do kernel: as checagens restantes não têm contra quem
/// rodar.
pub fn disposition(
    privilege: Privilege,
    mem_limit: Option<u64>,
    addr: u64,
    error_code: PageFaultErrorCode,
) -> FaultVerdict {
    if (mem_limit.is_none() || privilege == Privilege::Kernel) && addr >= KERNEL_BASE {
        return FaultVerdict::KernelFault;
    }

    let limit = match mem_limit {
        Some(limit) => limit,
        None => return FaultVerdict::KernelFault,
    };

    if addr > limit {
        return FaultVerdict::Kill(KillReason::OutOfRange);
    }

    if error_code.contains(PageFaultErrorCode::PROTECTION) {
        return FaultVerdict::Kill(KillReason::GuardPage);
    }

    FaultVerdict::DemandPage
}

/// Entrada chamada pelo dispatcher para o vetor de Page Fault.
pub fn page_fault(frame: &TrapFrame) {
    let addr = Cpu::fault_address();
    let error_code = PageFaultErrorCode::from_bits_truncate(frame.error_code);
    let privilege = Privilege::from_cs(frame.cs);
    let current = crate::sched::percpu::current_task();

    let verdict = disposition(
        privilege,
        current.as_ref().map(|task| task.mem_limit()),
        addr,
        error_code,
    );

    let task = match (verdict, current) {
        (FaultVerdict::KernelFault, _) | (_, None) => kernel_fault(frame, addr),
        (FaultVerdict::Kill(reason), Some(task)) => {
            match reason {
                KillReason::OutOfRange => {
                    crate::kerror!("(Fault) Endereco fora do espaco da tarefa:", addr);
                }
                KillReason::GuardPage => {
                    crate::kerror!("(Fault) Acesso a guard page negado:", addr);
                }
            }
            crate::kerror!("(Fault) RIP da falha:", frame.rip);
            task.mark_killed();
            return;
        }
        (FaultVerdict::DemandPage, Some(task)) => task,
    };

    if let Err(error) = demand_page(&task, addr) {
        match error {
            DemandPageError::OutOfMemory => {
                crate::kerror!("(Fault) Sem memoria fisica para:", addr);
            }
            DemandPageError::MapFailed => {
                crate::kerror!("(Fault) Mapeamento recusado para:", addr);
            }
        }
        task.mark_killed();
    }
}

/// Aloca, zera e mapeia uma página na base da página de `addr`.
///
/// O frame alocado nunca vaza: se o mapeamento falhar ele volta ao PMM.
pub fn demand_page(task: &Arc<Task>, addr: u64) -> Result<(), DemandPageError> {
    let frame = pmm::alloc_frame().ok_or(DemandPageError::OutOfMemory)?;

    // Frames reciclados carregam conteúdo do dono anterior
    unsafe {
        core::ptr::write_bytes(phys_to_virt(frame), 0, PAGE_SIZE);
    }

    vmm::map_page_in(
        task.page_table(),
        page_round_down(addr),
        frame,
        vmm::MapFlags::PRESENT | vmm::MapFlags::WRITABLE | vmm::MapFlags::USER,
    )
    .map_err(|_| {
        pmm::free_frame(frame);
        DemandPageError::MapFailed
    })?;

    Ok(())
}

/// Diagnóstico e abort para falha em contexto de kernel.
fn kernel_fault(frame: &TrapFrame, addr: u64) -> ! {
    crate::kerror!("(Fault) Page fault em contexto de kernel");
    crate::kerror!("(Fault) Nucleo:", Cpu::core_id() as u64);
    crate::kerror!("(Fault) RIP:", frame.rip);
    crate::kerror!("(Fault) CR2:", addr);
    crate::kerror!("(Fault) Codigo de erro:", frame.error_code);
    panic!("page fault em contexto de kernel");
}
