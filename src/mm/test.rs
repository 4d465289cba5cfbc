//! Testes de memória: política de page fault, PMM e demand paging.

use crate::arch::platform::trap::Privilege;
use crate::klib::test_framework::{check, run_test_suite, TestCase, TestResult};
use crate::mm::fault::{
    demand_page, disposition, DemandPageError, FaultVerdict, KillReason, PageFaultErrorCode,
};
use crate::mm::{phys_to_virt, pmm, vmm, KERNEL_BASE, PAGE_SIZE};
use crate::sched::Task;

const MEMORY_TESTS: &[TestCase] = &[
    TestCase::new("fault_kernel_context_fatal", test_fault_kernel_fatal),
    TestCase::new("fault_no_task_fatal", test_fault_no_task),
    TestCase::new("fault_out_of_range_kills", test_fault_out_of_range),
    TestCase::new("fault_guard_page_kills", test_fault_guard_page),
    TestCase::new("fault_in_bounds_demand_pages", test_fault_demand_page),
    TestCase::new("fault_kernel_below_base_falls_through", test_fault_kernel_below_base),
    TestCase::new("pmm_alloc_free_roundtrip", test_pmm_alloc_free),
    TestCase::new("demand_page_maps_zeroed", test_demand_page_zeroed),
    TestCase::new("demand_page_no_leak_on_remap", test_demand_page_no_leak),
];

pub fn run_memory_tests() {
    run_test_suite("MM", MEMORY_TESTS);
}

const NO_ERR: PageFaultErrorCode = PageFaultErrorCode::empty();

/// Falha de kernel em endereço do kernel: aborto do sistema.
fn test_fault_kernel_fatal() -> TestResult {
    check(
        disposition(Privilege::Kernel, Some(0x10000), KERNEL_BASE + 0x1000, NO_ERR)
            == FaultVerdict::KernelFault,
    )
}

/// Falha sem tarefa corrente: sempre defeito do kernel.
fn test_fault_no_task() -> TestResult {
    check(
        disposition(Privilege::Kernel, None, KERNEL_BASE + 0x1000, NO_ERR)
            == FaultVerdict::KernelFault
            && disposition(Privilege::User, None, 0x1000, NO_ERR) == FaultVerdict::KernelFault,
    )
}

/// Endereço além do limite da tarefa: mata, sem alocar.
fn test_fault_out_of_range() -> TestResult {
    let free_before = pmm::free_frames();
    let verdict = disposition(Privilege::User, Some(0x10000), 0x20000, NO_ERR);
    check(verdict == FaultVerdict::Kill(KillReason::OutOfRange) && pmm::free_frames() == free_before)
}

/// Guard page (bit PROTECTION) dentro do limite: mata, sem alocar.
fn test_fault_guard_page() -> TestResult {
    let free_before = pmm::free_frames();
    let verdict = disposition(
        Privilege::User,
        Some(0x10000),
        0x8000,
        PageFaultErrorCode::PROTECTION | PageFaultErrorCode::USER,
    );
    check(verdict == FaultVerdict::Kill(KillReason::GuardPage) && pmm::free_frames() == free_before)
}

/// Falha legítima dentro do limite: demand paging.
fn test_fault_demand_page() -> TestResult {
    check(
        disposition(Privilege::User, Some(0x10000), 0x8000, PageFaultErrorCode::USER)
            == FaultVerdict::DemandPage,
    )
}

/// Falha de kernel ABAIXO da base do kernel com tarefa corrente: cai nas
/// checagens por tarefa em vez de abortar.
fn test_fault_kernel_below_base() -> TestResult {
    check(
        disposition(Privilege::Kernel, Some(0x10000), 0x8000, NO_ERR)
            == FaultVerdict::DemandPage
            && disposition(Privilege::Kernel, Some(0x10000), 0x20000, NO_ERR)
                == FaultVerdict::Kill(KillReason::OutOfRange),
    )
}

/// Frame alocado é alinhado e volta ao contador ao ser liberado.
fn test_pmm_alloc_free() -> TestResult {
    let free_before = pmm::free_frames();
    let frame = match pmm::alloc_frame() {
        Some(frame) => frame,
        None => return TestResult::Failed,
    };
    let aligned = frame % PAGE_SIZE as u64 == 0;
    let counted = pmm::free_frames() == free_before - 1;
    pmm::free_frame(frame);
    check(aligned && counted && pmm::free_frames() == free_before)
}

/// Demand paging mapeia a página zerada no endereço arredondado.
fn test_demand_page_zeroed() -> TestResult {
    let p4 = match vmm::create_address_space() {
        Ok(p4) => p4,
        Err(_) => return TestResult::Failed,
    };
    let task = Task::with_address_space("mm_teste", p4, 0x10000);

    if demand_page(&task, 0x4321).is_err() {
        return TestResult::Failed;
    }

    let phys = match vmm::translate_in(p4, 0x4000) {
        Some(phys) => phys,
        None => return TestResult::Failed,
    };

    // A página recém-mapeada deve estar toda zerada
    let bytes = unsafe { core::slice::from_raw_parts(phys_to_virt(phys), PAGE_SIZE) };
    check(bytes.iter().all(|&b| b == 0) && !task.killed())
}

/// Mapear duas vezes a mesma página falha sem vazar o frame alocado.
fn test_demand_page_no_leak() -> TestResult {
    let p4 = match vmm::create_address_space() {
        Ok(p4) => p4,
        Err(_) => return TestResult::Failed,
    };
    let task = Task::with_address_space("mm_teste_2", p4, 0x10000);

    if demand_page(&task, 0x6000).is_err() {
        return TestResult::Failed;
    }

    let free_before = pmm::free_frames();
    let second = demand_page(&task, 0x6000);
    check(second == Err(DemandPageError::MapFailed) && pmm::free_frames() == free_before)
}
