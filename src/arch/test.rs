//! Testes de Arquitetura (HAL)

use crate::arch::platform::idt;
use crate::arch::platform::trap::T_SYSCALL;
use crate::arch::platform::vectors;
use crate::klib::test_framework::{check, run_test_suite, TestCase, TestResult};

const ARCH_TESTS: &[TestCase] = &[
    TestCase::new("syscall_gate_user_invocable", test_syscall_gate),
    TestCase::new("other_gates_kernel_only", test_kernel_gates),
    TestCase::new("gate_targets_match_stubs", test_gate_targets),
];

/// Executa todos os testes de arquitetura
pub fn run_arch_tests() {
    run_test_suite("Arch", ARCH_TESTS);
}

/// O vetor de syscall deve ser trap gate invocável do Ring 3.
fn test_syscall_gate() -> TestResult {
    let entry = idt::entry(T_SYSCALL);
    check(entry.is_present() && entry.dpl() == 3 && entry.type_attr() == idt::GATE_USER_TRAP)
}

/// Todos os outros vetores exigem privilégio de kernel.
fn test_kernel_gates() -> TestResult {
    for vector in 0..=255u8 {
        if vector == T_SYSCALL {
            continue;
        }
        let entry = idt::entry(vector);
        if !entry.is_present()
            || entry.dpl() != 0
            || entry.type_attr() != idt::GATE_KERNEL_INTERRUPT
        {
            return TestResult::Failed;
        }
    }
    TestResult::Passed
}

/// Cada entrada aponta para o stub do seu próprio vetor.
fn test_gate_targets() -> TestResult {
    for vector in 0..=255u8 {
        if idt::entry(vector).handler() != vectors::stub_addr(vector as usize) {
            return TestResult::Failed;
        }
    }
    TestResult::Passed
}
