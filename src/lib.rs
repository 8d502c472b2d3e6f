//! A GDB Remote Serial Protocol stub for debugging protection domains running
//! on top of a capability-based microkernel.
//!
//! `capstub` sits next to the kernel (typically inside a privileged "debugger"
//! protection domain) and lets a stock GDB client inspect and control any
//! number of other protection domains. All access to the debuggee goes through
//! capabilities: every memory word, register file, breakpoint slot and
//! suspend/resume request is issued against a handle supplied by the embedder.
//!
//! The crate covers the protocol and target-model engine:
//!
//! - packet framing, checksums and retransmission
//! - the inferior/thread registry and its protocol id scheme
//!   ([`target::registry`])
//! - software and hardware breakpoint management ([`target::breakpoints`])
//! - command dispatch and fault translation ([`stub`])
//!
//! The transport (UART, ring buffers, ...) and the kernel's fault delivery are
//! left to the embedder, which feeds the engine one byte or one fault at a time
//! via [`GdbStub::pump`] and [`GdbStub::report_fault`].
//!
//! ## Features
//!
//! - `std`: implements `std::error::Error` for the crate's error types.
//! - `trace-pkt`: outputs every inbound / outbound packet via `trace!`.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

#[macro_use]
extern crate log;

pub mod arch;
pub mod common;
pub mod conn;
pub mod stub;
pub mod target;

mod protocol;
mod util;

pub use stub::{GdbStub, GdbStubBuilder, GdbStubError};

/// Default number of inferiors the registry can track.
pub const DEFAULT_MAX_INFERIORS: usize = 64;
/// Default number of threads tracked per inferior.
pub const DEFAULT_MAX_THREADS: usize = 256;
/// Default number of software breakpoints per inferior.
pub const DEFAULT_MAX_SW_BREAKPOINTS: usize = 32;
/// Default packet buffer size (also advertised to GDB as `PacketSize`).
pub const DEFAULT_PACKET_BUFFER_SIZE: usize = 2048;
