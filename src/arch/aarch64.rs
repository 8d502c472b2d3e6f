//! Implementation for the AArch64 architecture.

use core::convert::TryInto;

use super::{Arch, Registers};

/// `BRK #0x400` (the dynamic debug break immediate used by kgdb).
pub const BREAK_INSTR: u32 = 0xd420_0000 | (0x400 << 5);

const INSTR_MASK: u64 = 0xffff_ffff;

/// AArch64 core registers.
///
/// Registers from the `org.gnu.gdb.aarch64.core`
/// [AArch64 Standard GDB Target Features](https://sourceware.org/gdb/onlinedocs/gdb/AArch64-Features.html).
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct AArch64CoreRegs {
    /// General Purpose Registers (X0-X30)
    pub x: [u64; 31],
    /// Stack Pointer
    pub sp: u64,
    /// Program Counter
    pub pc: u64,
    /// Process State (GDB uses the AArch32 CPSR name)
    pub cpsr: u32,
}

impl AArch64CoreRegs {
    /// Size of the serialized register file, in bytes.
    pub const SERIALIZED_LEN: usize = 33 * 8 + 4;
}

impl Registers for AArch64CoreRegs {
    fn gdb_serialize(&self, mut write_byte: impl FnMut(u8)) {
        macro_rules! write_bytes {
            ($var: expr) => {
                for b in $var.to_le_bytes().iter() {
                    write_byte(*b)
                }
            };
        }

        for reg in self.x.iter() {
            write_bytes!(reg);
        }
        write_bytes!(self.sp);
        write_bytes!(self.pc);
        write_bytes!(self.cpsr);
    }

    fn gdb_deserialize(&mut self, bytes: &[u8]) -> Result<(), ()> {
        const U64_END: usize = core::mem::size_of::<u64>() * 33;

        if bytes.len() != Self::SERIALIZED_LEN {
            return Err(());
        }

        let mut regs = bytes[..U64_END]
            .chunks_exact(core::mem::size_of::<u64>())
            .map(|c| c.try_into().map(u64::from_le_bytes));

        for reg in self.x.iter_mut() {
            *reg = regs.next().ok_or(())?.map_err(drop)?;
        }
        self.sp = regs.next().ok_or(())?.map_err(drop)?;
        self.pc = regs.next().ok_or(())?.map_err(drop)?;

        self.cpsr = u32::from_le_bytes(bytes[U64_END..].try_into().map_err(drop)?);

        Ok(())
    }
}

/// Implements `Arch` for 64-bit ARM, as exposed by the kernel's debug API.
pub enum AArch64 {}

impl Arch for AArch64 {
    type Registers = AArch64CoreRegs;

    const BREAKPOINT_KIND: u64 = 4;
    const MAX_WATCHPOINT_SIZE: u64 = 8;

    const NUM_HW_BREAKPOINTS: usize = 6;
    const FIRST_HW_BREAKPOINT: usize = 0;

    const NUM_HW_WATCHPOINTS: usize = 4;
    const FIRST_HW_WATCHPOINT: usize = 6;

    fn insert_sw_breakpoint(word: u64) -> u64 {
        (word & !INSTR_MASK) | BREAK_INSTR as u64
    }

    fn remove_sw_breakpoint(word: u64, original: u64) -> u64 {
        (word & !INSTR_MASK) | (original & INSTR_MASK)
    }
}
