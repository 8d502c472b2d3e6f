//! Capability interfaces the stub uses to act on the debuggee, plus the
//! bookkeeping it keeps about them.
//!
//! The stub never touches debuggee state directly. Every remote memory access
//! goes through an [`AddressSpace`] handle, and every register, breakpoint or
//! scheduling operation goes through a [`ThreadControl`] handle. The embedder
//! supplies these handles when registering inferiors and threads (see
//! [`GdbStub::register_inferior`](crate::GdbStub::register_inferior)).
//!
//! ### What's with all the `<T::Arch as Arch>::` syntax?
//!
//! If [rust-lang/rust#38078](https://github.com/rust-lang/rust/issues/38078)
//! ever gets fixed, `<T::Arch as Arch>::Registers` will be simplified to just
//! `T::Arch::Registers`. Until then, prefer naming concrete types directly
//! when implementing these traits.

use core::fmt::Debug;

use crate::arch::Arch;

pub mod breakpoints;
pub mod registry;

#[cfg(test)]
pub(crate) mod mock;

/// Remote memory access for one inferior.
pub trait AddressSpace {
    /// Capability-specific error (e.g: a kernel error code).
    type Error: Debug;

    /// Read the 64-bit little-endian word starting at `addr`.
    ///
    /// Memory transfers only ever request word-aligned addresses. Software
    /// breakpoints request the breakpoint address itself, which is aligned to
    /// the architecture's instruction size.
    fn read_word(&mut self, addr: u64) -> Result<u64, Self::Error>;

    /// Write the 64-bit little-endian word starting at `addr`.
    fn write_word(&mut self, addr: u64, val: u64) -> Result<(), Self::Error>;
}

/// The kind of watchpoint that should be set/removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchKind {
    /// Fire when the memory location is written to.
    Write,
    /// Fire when the memory location is read from.
    Read,
    /// Fire when the memory location is written to and/or read from.
    ReadWrite,
}

/// What a hardware debug slot should trigger on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HwBreakpointKind {
    /// Instruction fetch from the slot's address.
    Instruction,
    /// Data access of `size` bytes at the slot's address.
    Data {
        /// Access type to trigger on.
        access: WatchKind,
        /// Watched region size, in bytes (a power of two).
        size: u64,
    },
}

/// Register, debug-slot and scheduling control for one thread.
///
/// Hardware slot numbers are the kernel's numbering, starting at
/// [`Arch::FIRST_HW_BREAKPOINT`] and [`Arch::FIRST_HW_WATCHPOINT`].
pub trait ThreadControl {
    /// The register file exposed by this thread.
    type Registers;
    /// Capability-specific error (e.g: a kernel error code).
    type Error: Debug;

    /// Read the thread's register file into `regs`.
    fn read_registers(&mut self, regs: &mut Self::Registers) -> Result<(), Self::Error>;

    /// Overwrite the thread's register file.
    fn write_registers(&mut self, regs: &Self::Registers) -> Result<(), Self::Error>;

    /// Program hardware debug slot `slot`.
    fn set_breakpoint(
        &mut self,
        slot: usize,
        addr: u64,
        kind: HwBreakpointKind,
    ) -> Result<(), Self::Error>;

    /// Disarm hardware debug slot `slot`.
    fn clear_breakpoint(&mut self, slot: usize) -> Result<(), Self::Error>;

    /// Enable or disable single-stepping.
    fn configure_single_step(&mut self, enabled: bool) -> Result<(), Self::Error>;

    /// Stop the thread from being scheduled.
    fn suspend(&mut self) -> Result<(), Self::Error>;

    /// Allow the thread to be scheduled again.
    fn resume(&mut self) -> Result<(), Self::Error>;
}

/// Bundles the architecture and capability handle types of a debug session.
///
/// This is a type-level description only: the handles themselves are owned by
/// the stub's registry.
pub trait Target {
    /// The target's architecture.
    type Arch: Arch;

    /// Address space capability of an inferior.
    type AddressSpace: AddressSpace;

    /// Thread control capability.
    type Thread: ThreadControl<Registers = <Self::Arch as Arch>::Registers>;
}
