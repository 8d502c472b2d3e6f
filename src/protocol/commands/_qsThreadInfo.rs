use super::prelude::*;

#[derive(PartialEq, Eq, Debug)]
pub struct qsThreadInfo;

impl<'a> ParseCommand<'a> for qsThreadInfo {
    fn from_packet(body: &'a [u8]) -> Option<Self> {
        if !body.is_empty() {
            return None;
        }
        Some(qsThreadInfo)
    }
}
