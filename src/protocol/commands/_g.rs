use super::prelude::*;

#[derive(PartialEq, Eq, Debug)]
pub struct g;

impl<'a> ParseCommand<'a> for g {
    fn from_packet(body: &'a [u8]) -> Option<Self> {
        if !body.is_empty() {
            return None;
        }
        Some(g)
    }
}
