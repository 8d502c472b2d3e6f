use super::breakpoint::BasicBreakpoint;
use super::prelude::*;

#[derive(PartialEq, Eq, Debug)]
pub struct Z(pub BasicBreakpoint);

impl<'a> ParseCommand<'a> for Z {
    fn from_packet(body: &'a [u8]) -> Option<Self> {
        Some(Z(BasicBreakpoint::from_slice(body)?))
    }
}
