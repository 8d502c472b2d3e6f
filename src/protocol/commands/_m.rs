use super::prelude::*;

#[derive(PartialEq, Eq, Debug)]
pub struct m {
    pub addr: u64,
    pub len: usize,
}

impl<'a> ParseCommand<'a> for m {
    fn from_packet(body: &'a [u8]) -> Option<Self> {
        let mut body = body.split(|b| *b == b',');
        let addr = decode_hex(body.next()?).ok()?;
        let len = decode_hex(body.next()?).ok()?;
        if body.next().is_some() {
            return None;
        }

        Some(m { addr, len })
    }
}
