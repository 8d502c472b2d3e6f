use super::prelude::*;

use crate::common::Pid;

#[derive(PartialEq, Eq, Debug)]
pub struct D {
    pub pid: Option<Pid>,
}

impl<'a> ParseCommand<'a> for D {
    fn from_packet(body: &'a [u8]) -> Option<Self> {
        let pid = match body {
            [] => None,
            [b';', pid @ ..] => Some(Pid::new(decode_hex(pid).ok()?)?),
            _ => return None,
        };
        Some(D { pid })
    }
}
