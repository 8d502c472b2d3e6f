use super::prelude::*;

/// Register file, still hex encoded.
#[derive(PartialEq, Eq, Debug)]
pub struct G<'a> {
    pub vals: &'a [u8],
}

impl<'a> ParseCommand<'a> for G<'a> {
    fn from_packet(body: &'a [u8]) -> Option<Self> {
        if body.len() % 2 != 0 || !body.iter().all(|b| is_hex(*b)) {
            return None;
        }
        Some(G { vals: body })
    }
}
