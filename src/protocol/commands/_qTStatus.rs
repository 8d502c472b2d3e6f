use super::prelude::*;

#[derive(PartialEq, Eq, Debug)]
pub struct qTStatus;

impl<'a> ParseCommand<'a> for qTStatus {
    fn from_packet(body: &'a [u8]) -> Option<Self> {
        if !body.is_empty() {
            return None;
        }
        Some(qTStatus)
    }
}
