//! Framework de testes do kernel
//!
//! Suites rodam dentro do próprio kernel durante o boot (feature
//! `self_test`), reportando pela serial.

/// Resultado de teste
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestResult {
    Passed,
    Failed,
    Skipped,
}

/// Um caso de teste
pub struct TestCase {
    pub name: &'static str,
    pub func: fn() -> TestResult,
}

impl TestCase {
    pub const fn new(name: &'static str, func: fn() -> TestResult) -> Self {
        Self { name, func }
    }
}

/// Executa suite de testes, retornando (passed, failed, skipped)
pub fn run_test_suite(name: &str, tests: &[TestCase]) -> (usize, usize, usize) {
    crate::klog!("=== Executando suite: ");
    crate::klog!(name);
    crate::knl!();

    let mut passed = 0;
    let mut failed = 0;
    let mut skipped = 0;

    for test in tests {
        match (test.func)() {
            TestResult::Passed => {
                crate::klog!("[PASS] ");
                passed += 1;
            }
            TestResult::Failed => {
                crate::klog!("[FAIL] ");
                failed += 1;
            }
            TestResult::Skipped => {
                crate::klog!("[SKIP] ");
                skipped += 1;
            }
        }
        crate::klog!(test.name);
        crate::knl!();
    }

    crate::kinfo!("Resultados: passed=", passed as u64);
    if failed > 0 {
        crate::kerror!("Resultados: failed=", failed as u64);
    }
    (passed, failed, skipped)
}

/// Converte uma condição booleana em TestResult.
pub fn check(cond: bool) -> TestResult {
    if cond {
        TestResult::Passed
    } else {
        TestResult::Failed
    }
}
