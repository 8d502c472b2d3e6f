use super::prelude::*;

#[derive(PartialEq, Eq, Debug)]
pub struct qSymbol;

impl<'a> ParseCommand<'a> for qSymbol {
    fn from_packet(_body: &'a [u8]) -> Option<Self> {
        Some(qSymbol)
    }
}
