use super::prelude::*;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Op {
    /// `Hg`: subsequent register/memory operations
    Other,
    /// `Hc`: subsequent step/continue operations
    StepContinue,
}

#[derive(PartialEq, Eq, Debug)]
pub struct H {
    pub kind: Op,
    /// `None` if the thread-id could not be parsed.
    pub thread: Option<ThreadId>,
}

impl<'a> ParseCommand<'a> for H {
    fn from_packet(body: &'a [u8]) -> Option<Self> {
        let (kind, thread) = body.split_first()?;
        let kind = match kind {
            b'g' => Op::Other,
            b'c' => Op::StepContinue,
            _ => return None,
        };

        Some(H {
            kind,
            thread: ThreadId::try_from(thread).ok(),
        })
    }
}
