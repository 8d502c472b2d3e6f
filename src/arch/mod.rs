//! Traits to encode architecture-specific target information.
//!
//! The debug stub itself is architecture independent: it only needs to know
//! how to (de)serialize a register file, how to turn an instruction word into
//! a breakpoint trap, and how many exclusive hardware breakpoint / watchpoint
//! slots the CPU provides.

pub mod aarch64;

/// Methods to read/write architecture-specific registers.
///
/// Registers must be de/serialized in the order specified by the architecture's
/// `<target>.xml` in the GDB source tree.
///
/// e.g: for AArch64:
/// github.com/bminor/binutils-gdb/blob/master/gdb/features/aarch64-core.xml
pub trait Registers: Default + Clone + core::fmt::Debug {
    /// Serialize `self` into a GDB register bytestream.
    fn gdb_serialize(&self, write_byte: impl FnMut(u8));

    /// Deserialize a GDB register bytestream into `self`.
    fn gdb_deserialize(&mut self, bytes: &[u8]) -> Result<(), ()>;
}

/// Encodes architecture-specific information: register layout, breakpoint
/// encoding, and the hardware debug resources exposed by the kernel.
pub trait Arch {
    /// The architecture's register file.
    type Registers: Registers;

    /// The only breakpoint `kind` accepted in `Z0` / `Z1` packets (i.e: the
    /// size of an instruction, in bytes).
    const BREAKPOINT_KIND: u64;

    /// Largest watchpoint size (in bytes) the hardware can trigger on.
    const MAX_WATCHPOINT_SIZE: u64;

    /// Number of exclusive hardware instruction breakpoints.
    const NUM_HW_BREAKPOINTS: usize;
    /// Kernel slot number of the first hardware instruction breakpoint.
    const FIRST_HW_BREAKPOINT: usize;

    /// Number of exclusive hardware watchpoints.
    const NUM_HW_WATCHPOINTS: usize;
    /// Kernel slot number of the first hardware watchpoint.
    const FIRST_HW_WATCHPOINT: usize;

    /// Return `word` with the breakpoint trap spliced into the instruction at
    /// its lowest address.
    fn insert_sw_breakpoint(word: u64) -> u64;

    /// Return `word` with the instruction at its lowest address taken from
    /// `original`. The rest of `word` (which may hold a neighbouring trap) is
    /// left as is.
    fn remove_sw_breakpoint(word: u64, original: u64) -> u64;
}
