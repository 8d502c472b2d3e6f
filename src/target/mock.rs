//! In-memory capability handles for unit tests.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use super::{AddressSpace, HwBreakpointKind, Target, ThreadControl};
use crate::arch::aarch64::{AArch64, AArch64CoreRegs};
use crate::conn::Connection;

pub enum MockTarget {}

impl Target for MockTarget {
    type Arch = AArch64;
    type AddressSpace = MockVSpace;
    type Thread = MockThread;
}

/// Byte-addressed sparse memory. Accessing an unmapped byte fails.
#[derive(Debug, Default)]
pub struct MockVSpace {
    mem: BTreeMap<u64, u8>,
    pub writes: usize,
    pub fail_writes: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockMemError {
    Unmapped(u64),
    WriteFault,
}

impl MockVSpace {
    /// Map `words` consecutive words starting at `addr`, all set to `val`.
    pub fn fill(&mut self, addr: u64, words: u64, val: u64) {
        for w in 0..words {
            for (i, b) in val.to_le_bytes().iter().enumerate() {
                self.mem.insert(addr + w * 8 + i as u64, *b);
            }
        }
    }

    /// Read a word, bypassing the capability interface.
    pub fn peek(&self, addr: u64) -> u64 {
        let mut bytes = [0; 8];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = self.mem[&(addr + i as u64)];
        }
        u64::from_le_bytes(bytes)
    }
}

impl AddressSpace for MockVSpace {
    type Error = MockMemError;

    fn read_word(&mut self, addr: u64) -> Result<u64, MockMemError> {
        let mut bytes = [0; 8];
        for (i, b) in bytes.iter_mut().enumerate() {
            let a = addr + i as u64;
            *b = *self.mem.get(&a).ok_or(MockMemError::Unmapped(a))?;
        }
        Ok(u64::from_le_bytes(bytes))
    }

    fn write_word(&mut self, addr: u64, val: u64) -> Result<(), MockMemError> {
        if self.fail_writes {
            return Err(MockMemError::WriteFault);
        }
        for i in 0..8 {
            let a = addr + i;
            if !self.mem.contains_key(&a) {
                return Err(MockMemError::Unmapped(a));
            }
        }
        for (i, b) in val.to_le_bytes().iter().enumerate() {
            self.mem.insert(addr + i as u64, *b);
        }
        self.writes += 1;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotState {
    pub addr: u64,
    pub kind: HwBreakpointKind,
}

/// Records every request made through its capability interface.
#[derive(Debug)]
pub struct MockThread {
    pub regs: AArch64CoreRegs,
    pub slots: Vec<Option<SlotState>>,
    pub single_step: bool,
    pub single_step_calls: usize,
    pub suspended: bool,
    pub resume_calls: usize,
    pub fail_set_breakpoint: bool,
    /// Fail only when programming this slot.
    pub fail_slot: Option<usize>,
    pub fail_clear_breakpoint: bool,
    pub fail_registers: bool,
}

impl Default for MockThread {
    fn default() -> Self {
        MockThread {
            regs: AArch64CoreRegs::default(),
            slots: vec![None; 16],
            single_step: false,
            single_step_calls: 0,
            suspended: false,
            resume_calls: 0,
            fail_set_breakpoint: false,
            fail_slot: None,
            fail_clear_breakpoint: false,
            fail_registers: false,
        }
    }
}

impl ThreadControl for MockThread {
    type Registers = AArch64CoreRegs;
    type Error = &'static str;

    fn read_registers(&mut self, regs: &mut AArch64CoreRegs) -> Result<(), &'static str> {
        if self.fail_registers {
            return Err("read_registers");
        }
        *regs = self.regs.clone();
        Ok(())
    }

    fn write_registers(&mut self, regs: &AArch64CoreRegs) -> Result<(), &'static str> {
        if self.fail_registers {
            return Err("write_registers");
        }
        self.regs = regs.clone();
        Ok(())
    }

    fn set_breakpoint(
        &mut self,
        slot: usize,
        addr: u64,
        kind: HwBreakpointKind,
    ) -> Result<(), &'static str> {
        if self.fail_set_breakpoint || self.fail_slot == Some(slot) {
            return Err("set_breakpoint");
        }
        *self.slots.get_mut(slot).ok_or("bad slot")? = Some(SlotState { addr, kind });
        Ok(())
    }

    fn clear_breakpoint(&mut self, slot: usize) -> Result<(), &'static str> {
        if self.fail_clear_breakpoint {
            return Err("clear_breakpoint");
        }
        *self.slots.get_mut(slot).ok_or("bad slot")? = None;
        Ok(())
    }

    fn configure_single_step(&mut self, enabled: bool) -> Result<(), &'static str> {
        self.single_step = enabled;
        self.single_step_calls += 1;
        Ok(())
    }

    fn suspend(&mut self) -> Result<(), &'static str> {
        self.suspended = true;
        Ok(())
    }

    fn resume(&mut self) -> Result<(), &'static str> {
        self.suspended = false;
        self.resume_calls += 1;
        Ok(())
    }
}

/// Captures everything written to it.
#[derive(Debug, Default)]
pub struct MockConnection {
    pub tx: Vec<u8>,
}

impl MockConnection {
    /// Take everything written so far.
    pub fn take(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.tx)
    }
}

impl Connection for MockConnection {
    type Error = ();

    fn write(&mut self, byte: u8) -> Result<(), ()> {
        self.tx.push(byte);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }
}
