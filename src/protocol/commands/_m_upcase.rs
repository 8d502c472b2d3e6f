use super::prelude::*;

#[derive(PartialEq, Eq, Debug)]
pub struct M<'a> {
    pub addr: u64,
    pub len: usize,
    /// Data to write, still hex encoded. Exactly `len * 2` hex digits.
    pub val: &'a [u8],
}

impl<'a> ParseCommand<'a> for M<'a> {
    fn from_packet(body: &'a [u8]) -> Option<Self> {
        let mut body = body.splitn(3, |b| matches!(*b, b',' | b':'));
        let addr = decode_hex(body.next()?).ok()?;
        let len: usize = decode_hex(body.next()?).ok()?;
        let val = body.next()?;

        if val.len() != len.checked_mul(2)? || !val.iter().all(|b| is_hex(*b)) {
            return None;
        }

        Some(M { addr, len, val })
    }
}
