use super::prelude::*;

#[derive(PartialEq, Eq, Debug)]
pub struct T {
    pub thread: ThreadId,
}

impl<'a> ParseCommand<'a> for T {
    fn from_packet(body: &'a [u8]) -> Option<Self> {
        Some(T {
            thread: ThreadId::try_from(body).ok()?,
        })
    }
}
