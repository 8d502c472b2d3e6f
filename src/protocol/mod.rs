//! GDB Remote Serial Protocol wire format: framing, codecs and command
//! parsing.

pub mod commands;
pub mod common;
pub mod recv_packet;
pub mod response_writer;
pub mod send_packet;

pub use commands::{Command, CommandParseError};
pub use recv_packet::{RecvEvent, RecvPacketStateMachine};
pub use response_writer::{CapacityError, ResponseWriter};

/// Split off a leading `xx:` sequence-id prefix.
///
/// Some clients prefix a packet body with a two character sequence id
/// followed by a colon. The stub must echo the id right after the ACK, and the
/// command itself starts after the colon.
pub fn split_sequence_id(body: &[u8]) -> (Option<[u8; 2]>, &[u8]) {
    match body {
        [a, b, b':', rest @ ..] => (Some([*a, *b]), rest),
        _ => (None, body),
    }
}
