use super::prelude::*;

#[derive(PartialEq, Eq, Debug)]
pub struct qC;

impl<'a> ParseCommand<'a> for qC {
    fn from_packet(body: &'a [u8]) -> Option<Self> {
        if !body.is_empty() {
            return None;
        }
        Some(qC)
    }
}
