use super::breakpoint::BasicBreakpoint;
use super::prelude::*;

#[derive(PartialEq, Eq, Debug)]
pub struct z(pub BasicBreakpoint);

impl<'a> ParseCommand<'a> for z {
    fn from_packet(body: &'a [u8]) -> Option<Self> {
        Some(z(BasicBreakpoint::from_slice(body)?))
    }
}
