use super::prelude::*;

/// `vCont;action[:thread-id][;action[:thread-id]]...`
#[derive(Debug)]
pub struct vCont<'a> {
    pub actions: Actions<'a>,
}

impl<'a> ParseCommand<'a> for vCont<'a> {
    fn from_packet(body: &'a [u8]) -> Option<Self> {
        match body {
            [b';', actions @ ..] if !actions.is_empty() => Some(vCont {
                actions: Actions(actions),
            }),
            _ => None,
        }
    }
}

/// A lazily evaluated iterator over the actions specified in a vCont packet.
#[derive(Debug, Clone, Copy)]
pub struct Actions<'a>(&'a [u8]);

impl<'a> Actions<'a> {
    /// Yields `None` for every action that could not be parsed.
    pub fn iter(&self) -> impl Iterator<Item = Option<VContAction>> + 'a {
        self.0.split(|b| *b == b';').map(|act| {
            let mut s = act.splitn(2, |b| *b == b':');
            let kind = VContKind::from_bytes(s.next()?)?;
            let thread = match s.next() {
                Some(s) => Some(ThreadId::try_from(s).ok()?),
                None => None,
            };

            Some(VContAction { kind, thread })
        })
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct VContAction {
    pub kind: VContKind,
    /// `None` applies the action to every thread without an explicit action.
    pub thread: Option<ThreadId>,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum VContKind {
    Continue,
    ContinueWithSig(u8),
    Step,
    StepWithSig(u8),
}

impl VContKind {
    fn from_bytes(s: &[u8]) -> Option<VContKind> {
        use self::VContKind::*;

        let res = match s {
            [b'c'] => Continue,
            [b'C', sig @ ..] => ContinueWithSig(decode_hex(sig).ok()?),
            [b's'] => Step,
            [b'S', sig @ ..] => StepWithSig(decode_hex(sig).ok()?),
            _ => return None,
        };

        Some(res)
    }

    /// Whether this action single-steps its thread(s).
    pub fn is_step(self) -> bool {
        matches!(self, VContKind::Step | VContKind::StepWithSig(_))
    }
}
