use alloc::vec::Vec;

use num_traits::PrimInt;

use super::common::hex::{byte_to_hex, mem_to_hex, nybble_to_hex};
use crate::common::{Pid, Tid};

/// The reply did not fit into the outbound buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityError;

impl core::fmt::Display for CapacityError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "reply does not fit into the outbound buffer")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CapacityError {}

/// Renders a reply payload into a bounded buffer.
///
/// Replies are rendered in full before being framed and sent, since the frame
/// must be retransmitted verbatim until the client acknowledges it.
pub struct ResponseWriter<'a> {
    buf: &'a mut Vec<u8>,
    capacity: usize,
}

impl<'a> ResponseWriter<'a> {
    /// Creates a new ResponseWriter, discarding any previous contents of
    /// `buf`.
    pub fn new(buf: &'a mut Vec<u8>, capacity: usize) -> Self {
        buf.clear();
        ResponseWriter { buf, capacity }
    }

    /// Bytes still available before the writer reports [`CapacityError`].
    pub fn remaining(&self) -> usize {
        self.capacity - self.buf.len()
    }

    /// Number of bytes rendered so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Discard everything rendered so far.
    pub fn clear(&mut self) {
        self.buf.clear()
    }

    /// Discard everything rendered after the first `len` bytes.
    pub fn truncate(&mut self, len: usize) {
        self.buf.truncate(len)
    }

    /// Write a single raw byte.
    pub fn write(&mut self, byte: u8) -> Result<(), CapacityError> {
        if self.buf.len() == self.capacity {
            return Err(CapacityError);
        }
        self.buf.push(byte);
        Ok(())
    }

    /// Write an entire string.
    pub fn write_str(&mut self, s: &str) -> Result<(), CapacityError> {
        if s.len() > self.remaining() {
            return Err(CapacityError);
        }
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }

    /// Write a single byte as a hex string (two ascii chars)
    pub fn write_hex(&mut self, byte: u8) -> Result<(), CapacityError> {
        for &c in byte_to_hex(byte).iter() {
            self.write(c)?;
        }
        Ok(())
    }

    /// Write a byte-buffer as a hex string (i.e: two ascii chars / byte).
    pub fn write_hex_buf(&mut self, data: &[u8]) -> Result<(), CapacityError> {
        if data.len() * 2 > self.remaining() {
            return Err(CapacityError);
        }
        let start = self.buf.len();
        self.buf.resize(start + data.len() * 2, 0);
        mem_to_hex(data, &mut self.buf[start..]).map_err(|_| CapacityError)?;
        Ok(())
    }

    /// Write a number as a big-endian hex string using the most compact
    /// representation possible (i.e: trimming leading zeros).
    pub fn write_num<D: PrimInt>(&mut self, digit: D) -> Result<(), CapacityError> {
        let digit = digit.to_u64().ok_or(CapacityError)?;
        if digit == 0 {
            return self.write(b'0');
        }

        let nybbles = (64 - digit.leading_zeros() as usize + 3) / 4;
        for i in (0..nybbles).rev() {
            self.write(nybble_to_hex((digit >> (i * 4)) as u8))?;
        }
        Ok(())
    }

    /// Write a multiprocess thread id (`p<pid>.<tid>`).
    pub fn write_thread_id(&mut self, pid: Pid, tid: Tid) -> Result<(), CapacityError> {
        self.write(b'p')?;
        self.write_num(pid.get())?;
        self.write(b'.')?;
        self.write_num(tid.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nz(n: usize) -> core::num::NonZeroUsize {
        core::num::NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn compact_numbers() {
        let mut buf = Vec::new();
        let mut res = ResponseWriter::new(&mut buf, 64);
        res.write_num(0u8).unwrap();
        res.write(b',').unwrap();
        res.write_num(0x1a2usize).unwrap();
        res.write(b',').unwrap();
        res.write_num(u64::MAX).unwrap();
        assert_eq!(buf, b"0,1a2,ffffffffffffffff");
    }

    #[test]
    fn thread_ids() {
        let mut buf = Vec::new();
        let mut res = ResponseWriter::new(&mut buf, 64);
        res.write_thread_id(nz(1), nz(0x10)).unwrap();
        assert_eq!(buf, b"p1.10");
    }

    #[test]
    fn capacity_is_enforced() {
        let mut buf = Vec::new();
        let mut res = ResponseWriter::new(&mut buf, 4);
        assert_eq!(res.write_hex_buf(&[1, 2, 3]), Err(CapacityError));
        assert_eq!(res.len(), 0);
        res.write_str("OK").unwrap();
        assert_eq!(res.write_str("abc"), Err(CapacityError));
        res.write_hex(0xab).unwrap();
        assert_eq!(res.write(b'x'), Err(CapacityError));
        assert_eq!(buf, b"OKab");
    }

    #[test]
    fn new_discards_previous_contents() {
        let mut buf = b"stale".to_vec();
        ResponseWriter::new(&mut buf, 8).write_str("OK").unwrap();
        assert_eq!(buf, b"OK");
    }
}
