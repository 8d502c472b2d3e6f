use super::prelude::*;

#[derive(PartialEq, Eq, Debug)]
pub struct qfThreadInfo;

impl<'a> ParseCommand<'a> for qfThreadInfo {
    fn from_packet(body: &'a [u8]) -> Option<Self> {
        if !body.is_empty() {
            return None;
        }
        Some(qfThreadInfo)
    }
}
