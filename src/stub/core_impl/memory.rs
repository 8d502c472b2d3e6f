//! `m` / `M`: memory transfers through the address space capability, which
//! only deals in whole, aligned 64-bit words.

use super::prelude::*;

use alloc::vec;

use crate::protocol::common::hex::hex_to_mem;
use crate::target::registry::Inferior;
use crate::target::AddressSpace;

const WORD: u64 = 8;

impl<T: Target> GdbStubImpl<T> {
    fn current_inferior_mut(&mut self) -> Option<&mut Inferior<T>> {
        let pid = self.registry.current()?.pid;
        self.registry.inferior_mut(pid)
    }

    pub(super) fn read_memory(
        &mut self,
        res: &mut ResponseWriter<'_>,
        addr: u64,
        len: usize,
    ) -> Result<(), CapacityError> {
        if len.checked_mul(2).map_or(true, |n| n > res.remaining()) {
            return res.write_str("E01");
        }
        let end = match addr.checked_add(len as u64) {
            Some(end) => end,
            None => return res.write_str("E01"),
        };
        let inferior = match self.current_inferior_mut() {
            Some(inferior) => inferior,
            None => return res.write_str("E01"),
        };

        let mut word_addr = addr & !(WORD - 1);
        while word_addr < end {
            let word = match inferior.address_space.read_word(word_addr) {
                Ok(word) => word,
                Err(e) => {
                    warn!("failed to read word at {:#x}: {:?}", word_addr, e);
                    res.clear();
                    return res.write_str("E04");
                }
            };

            let bytes = word.to_le_bytes();
            let lo = (addr.max(word_addr) - word_addr) as usize;
            let hi = (end - word_addr).min(WORD) as usize;
            res.write_hex_buf(&bytes[lo..hi])?;

            word_addr = match word_addr.checked_add(WORD) {
                Some(next) => next,
                None => break,
            };
        }
        Ok(())
    }

    pub(super) fn write_memory(
        &mut self,
        res: &mut ResponseWriter<'_>,
        addr: u64,
        len: usize,
        val: &[u8],
    ) -> Result<(), CapacityError> {
        let mut data = vec![0; len];
        if hex_to_mem(val, &mut data).is_err() || addr.checked_add(len as u64).is_none() {
            return res.write_str("E02");
        }
        let inferior = match self.current_inferior_mut() {
            Some(inferior) => inferior,
            None => return res.write_str("E02"),
        };

        let mut word_addr = addr & !(WORD - 1);
        let mut src = &data[..];
        while !src.is_empty() {
            let lo = (addr.max(word_addr) - word_addr) as usize;
            let n = (WORD as usize - lo).min(src.len());

            let mut bytes = [0; WORD as usize];
            if n != WORD as usize {
                // partial word: keep the bytes around it
                match inferior.address_space.read_word(word_addr) {
                    Ok(word) => bytes = word.to_le_bytes(),
                    Err(e) => {
                        warn!("failed to read word at {:#x}: {:?}", word_addr, e);
                        return res.write_str("E03");
                    }
                }
            }
            bytes[lo..lo + n].copy_from_slice(&src[..n]);

            let word = u64::from_le_bytes(bytes);
            if let Err(e) = inferior.address_space.write_word(word_addr, word) {
                warn!("failed to write word at {:#x}: {:?}", word_addr, e);
                return res.write_str("E03");
            }

            src = &src[n..];
            word_addr = word_addr.wrapping_add(WORD);
        }

        res.write_str("OK")
    }
}
