use super::prelude::*;

#[derive(PartialEq, Eq, Debug)]
pub struct QuestionMark;

impl<'a> ParseCommand<'a> for QuestionMark {
    fn from_packet(_body: &'a [u8]) -> Option<Self> {
        Some(QuestionMark)
    }
}
