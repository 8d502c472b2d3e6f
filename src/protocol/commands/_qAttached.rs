use super::prelude::*;

#[derive(PartialEq, Eq, Debug)]
pub struct qAttached;

impl<'a> ParseCommand<'a> for qAttached {
    fn from_packet(_body: &'a [u8]) -> Option<Self> {
        Some(qAttached)
    }
}
