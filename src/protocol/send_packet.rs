use alloc::vec::Vec;

use super::common::hex::{byte_to_hex, checksum};
use crate::conn::Connection;

/// Frame `payload` as `$<payload>#<checksum>` into `frame`, replacing its
/// previous contents.
pub fn frame_packet(payload: &[u8], frame: &mut Vec<u8>) {
    frame.clear();
    frame.reserve(payload.len() + 4);
    frame.push(b'$');
    frame.extend_from_slice(payload);
    frame.push(b'#');
    frame.extend_from_slice(&byte_to_hex(checksum(payload)));
}

/// Write a complete frame to the connection and flush it.
///
/// Called both for the first transmission and for every retransmission, so
/// the bytes on the wire are identical each time.
pub fn transmit<C: Connection>(conn: &mut C, frame: &[u8]) -> Result<(), C::Error> {
    #[cfg(feature = "trace-pkt")]
    trace!("--> {}", core::str::from_utf8(frame).unwrap_or("<invalid packet>"));

    conn.write_all(frame)?;
    conn.flush()
}
