//! Dispatcher central de syscalls.
//!
//! Convenção: número em RAX, argumentos em RDI/RSI/RDX, retorno em RAX
//! (u64::MAX sinaliza erro). Os registradores vêm do trap frame registrado
//! na tarefa pelo dispatcher de traps.

use crate::kcore::time::ticks;
use crate::sched::task::Task;
use crate::syscall::numbers::*;
use alloc::sync::Arc;

/// Roteia a syscall corrente da tarefa e escreve o retorno no frame.
pub fn syscall_dispatcher(task: &Arc<Task>) {
    // SAFETY: o ponteiro foi registrado nesta mesma invocação de trap e o
    // frame vive na stack do trap até o retorno
    let frame = unsafe { &mut *task.trap_frame_ptr() };

    let number = frame.rax;
    crate::ktrace!("(Syscall) Numero=", number);

    let ret = match number {
        SYS_EXIT => crate::sched::exit_current(),
        SYS_GETPID => task.tid.as_u32() as u64,
        SYS_WRITE => sys_write(task, frame.rdi, frame.rsi, frame.rdx),
        SYS_UPTIME => ticks::current(),
        SYS_SLEEP => sys_sleep(task, frame.rdi),
        _ => {
            crate::kwarn!("(Syscall) Numero desconhecido:", number);
            u64::MAX
        }
    };

    frame.rax = ret;
}

/// write(fd, buf, len): apenas fd 1 (console serial).
fn sys_write(task: &Arc<Task>, fd: u64, buf: u64, len: u64) -> u64 {
    if fd != 1 {
        return u64::MAX;
    }

    // A janela [buf, buf+len) deve caber no espaço válido da tarefa
    match buf.checked_add(len) {
        Some(end) if end <= task.mem_limit() => {}
        _ => return u64::MAX,
    }

    // SAFETY: janela validada acima; o espaço da tarefa está ativo durante
    // a syscall
    let bytes = unsafe { core::slice::from_raw_parts(buf as *const u8, len as usize) };
    for &byte in bytes {
        crate::drivers::serial::write_byte(byte);
    }
    len
}

/// sleep(n): dorme n ticks do relógio global.
fn sys_sleep(task: &Arc<Task>, count: u64) -> u64 {
    match ticks::sleep_ticks(task, count) {
        Ok(()) => 0,
        Err(_) => u64::MAX,
    }
}
