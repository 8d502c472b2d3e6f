use crate::protocol::common::hex::decode_hex;

/// `<type>,<addr>,<kind>` as found in `z` / `Z` packets.
///
/// Conditions and commands (`;cond_list...`) are not supported, so the
/// packet must end after `kind`.
#[derive(PartialEq, Eq, Debug)]
pub struct BasicBreakpoint {
    pub type_: BreakpointType,
    pub addr: u64,
    /// architecture dependent (instruction size for breakpoints, byte count
    /// for watchpoints)
    pub kind: u64,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum BreakpointType {
    Software,
    Hardware,
    WriteWatchpoint,
    ReadWatchpoint,
    AccessWatchpoint,
}

impl BasicBreakpoint {
    pub fn from_slice(body: &[u8]) -> Option<BasicBreakpoint> {
        let mut body = body.split(|b| *b == b',');
        let type_ = match body.next()? {
            b"0" => BreakpointType::Software,
            b"1" => BreakpointType::Hardware,
            b"2" => BreakpointType::WriteWatchpoint,
            b"3" => BreakpointType::ReadWatchpoint,
            b"4" => BreakpointType::AccessWatchpoint,
            _ => return None,
        };
        let addr = decode_hex(body.next()?).ok()?;
        let kind = decode_hex(body.next()?).ok()?;
        if body.next().is_some() {
            return None;
        }

        Some(BasicBreakpoint { type_, addr, kind })
    }
}
