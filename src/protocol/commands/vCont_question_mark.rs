use super::prelude::*;

#[derive(PartialEq, Eq, Debug)]
pub struct vContQuestionMark;

impl<'a> ParseCommand<'a> for vContQuestionMark {
    fn from_packet(body: &'a [u8]) -> Option<Self> {
        if !body.is_empty() {
            return None;
        }
        Some(vContQuestionMark)
    }
}
