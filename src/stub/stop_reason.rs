//! Kernel fault descriptions, and the stop replies they translate into.

use crate::common::Signal;
use crate::protocol::{CapacityError, ResponseWriter};
use crate::target::registry::{Registry, ThreadRef};
use crate::target::{Target, WatchKind};

/// Why the kernel raised a debug exception.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebugExceptionReason {
    /// A hardware breakpoint slot fired.
    InstructionBreakpoint,
    /// A hardware watchpoint slot fired.
    DataBreakpoint,
    /// The thread completed a single step.
    SingleStep,
    /// The thread executed a software breakpoint instruction.
    SoftwareBreakRequest,
}

/// A debug exception, as delivered by the kernel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebugException {
    /// What raised the exception.
    pub reason: DebugExceptionReason,
    /// Instruction pointer at the time of the exception.
    pub fault_ip: u64,
    /// Data address that triggered a watchpoint.
    pub trigger_address: u64,
    /// Kernel slot number of the breakpoint or watchpoint that fired.
    pub breakpoint_number: usize,
}

/// A fault delivered by the kernel on behalf of a registered thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    /// Breakpoint, watchpoint or single-step exception.
    DebugException(DebugException),
    /// Any other fault (page fault, undefined instruction, ...), carrying the
    /// kernel's fault label.
    Other(u64),
}

impl Fault {
    /// Whether the faulting thread should be restarted by replying to the
    /// kernel's fault message once the session resumes it.
    pub fn wants_reply(&self) -> bool {
        matches!(self, Fault::DebugException(_))
    }
}

/// An event to be reported to GDB as a stop reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StopReason {
    SwBreak(ThreadRef),
    /// Hardware breakpoint or completed single-step.
    HwBreak(ThreadRef),
    Watch {
        thread: ThreadRef,
        kind: WatchKind,
        addr: u64,
    },
    Signal {
        thread: ThreadRef,
        signal: Signal,
    },
    Clone {
        parent: ThreadRef,
        child: ThreadRef,
    },
    Exited(ThreadRef),
}

impl StopReason {
    pub fn from_fault<T: Target>(registry: &Registry<T>, thread: ThreadRef, fault: Fault) -> Self {
        let e = match fault {
            Fault::DebugException(e) => e,
            Fault::Other(label) => {
                debug!("fault {:#x} on {}", label, thread);
                return StopReason::Signal {
                    thread,
                    signal: Signal::SIGABRT,
                };
            }
        };

        match e.reason {
            DebugExceptionReason::SoftwareBreakRequest => StopReason::SwBreak(thread),
            DebugExceptionReason::InstructionBreakpoint | DebugExceptionReason::SingleStep => {
                StopReason::HwBreak(thread)
            }
            DebugExceptionReason::DataBreakpoint => {
                let wp = registry
                    .inferior(thread.pid)
                    .and_then(|inf| inf.breakpoints().watchpoint_at_slot(e.breakpoint_number));
                match wp {
                    Some(wp) => StopReason::Watch {
                        thread,
                        kind: wp.access,
                        addr: e.trigger_address,
                    },
                    None => {
                        warn!(
                            "{} hit unknown watchpoint slot {}",
                            thread, e.breakpoint_number
                        );
                        StopReason::Signal {
                            thread,
                            signal: Signal::SIGTRAP,
                        }
                    }
                }
            }
        }
    }

    /// The thread GDB will consider current after this stop.
    pub fn thread(&self) -> Option<ThreadRef> {
        match *self {
            StopReason::SwBreak(thread)
            | StopReason::HwBreak(thread)
            | StopReason::Watch { thread, .. }
            | StopReason::Signal { thread, .. }
            | StopReason::Clone { parent: thread, .. } => Some(thread),
            StopReason::Exited(_) => None,
        }
    }

    pub fn write_reply(&self, res: &mut ResponseWriter<'_>) -> Result<(), CapacityError> {
        match *self {
            StopReason::SwBreak(thread) => {
                write_thread_stop(res, Signal::SIGTRAP, thread)?;
                res.write_str("swbreak:;")?;
            }
            StopReason::HwBreak(thread) => {
                write_thread_stop(res, Signal::SIGTRAP, thread)?;
                res.write_str("hwbreak:;")?;
            }
            StopReason::Watch { thread, kind, addr } => {
                write_thread_stop(res, Signal::SIGTRAP, thread)?;
                res.write_str(match kind {
                    WatchKind::Write => "watch:",
                    WatchKind::Read => "rwatch:",
                    WatchKind::ReadWrite => "awatch:",
                })?;
                res.write_hex_buf(&addr.to_be_bytes())?;
                res.write(b';')?;
            }
            StopReason::Signal { thread, signal } => {
                write_thread_stop(res, signal, thread)?;
            }
            StopReason::Clone { parent, child } => {
                res.write(b'T')?;
                res.write_hex(Signal::SIGTRAP.0)?;
                res.write_str("clone:")?;
                res.write_thread_id(child.pid, child.tid)?;
                res.write_str(";thread:")?;
                res.write_thread_id(parent.pid, parent.tid)?;
                res.write(b';')?;
            }
            StopReason::Exited(thread) => {
                res.write_str("w00;")?;
                res.write_thread_id(thread.pid, thread.tid)?;
            }
        }
        Ok(())
    }
}

fn write_thread_stop(
    res: &mut ResponseWriter<'_>,
    signal: Signal,
    thread: ThreadRef,
) -> Result<(), CapacityError> {
    res.write(b'T')?;
    res.write_hex(signal.0)?;
    res.write_str("thread:")?;
    res.write_thread_id(thread.pid, thread.tid)?;
    res.write(b';')
}
