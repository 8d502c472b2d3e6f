use super::common::hex::{checksum, hex_to_byte};

/// The interrupt ("Ctrl-C") byte, sent outside of any packet framing.
pub const INTERRUPT: u8 = 0x03;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    WaitStart,
    ReadBody,
    ReadChecksum1,
    ReadChecksum2(u8),
}

/// Result of feeding a byte into [`RecvPacketStateMachine::pump`].
#[derive(Debug, PartialEq, Eq)]
pub enum RecvEvent<'b> {
    /// The out-of-band interrupt byte arrived while waiting for a packet.
    Interrupt,
    /// A complete packet with a valid checksum. Contains the packet body.
    Packet(&'b [u8]),
    /// A complete packet whose checksum did not match its body. The client
    /// must be NACK'd so that it retransmits.
    ChecksumMismatch {
        /// Checksum sent by the client (`None` if it wasn't valid hex).
        checksum: Option<u8>,
        /// Checksum calculated over the received body.
        calculated: u8,
    },
}

/// Receives a packet incrementally, one byte at a time.
///
/// All intermediate state lives in the state machine and in the caller-owned
/// packet buffer, so the caller is free to service other events (e.g: a fault
/// report) between any two bytes without losing a partially received packet.
pub struct RecvPacketStateMachine {
    state: State,
    len: usize,
}

impl RecvPacketStateMachine {
    pub fn new() -> Self {
        RecvPacketStateMachine {
            state: State::WaitStart,
            len: 0,
        }
    }

    /// Returns `true` if the state machine is between packets.
    #[cfg(test)]
    pub fn is_idle(&self) -> bool {
        self.state == State::WaitStart
    }

    pub fn pump<'b>(&mut self, packet_buffer: &'b mut [u8], byte: u8) -> Option<RecvEvent<'b>> {
        match self.state {
            State::WaitStart => match byte {
                b'$' => self.restart_body(),
                INTERRUPT => return Some(RecvEvent::Interrupt),
                _ => {}
            },
            State::ReadBody => match byte {
                // packet restart: whatever was received so far is discarded
                b'$' => self.restart_body(),
                b'#' => self.state = State::ReadChecksum1,
                _ => {
                    if self.len == packet_buffer.len() {
                        warn!(
                            "dropping packet: body exceeds {} byte packet buffer",
                            packet_buffer.len()
                        );
                        self.state = State::WaitStart;
                        self.len = 0;
                    } else {
                        packet_buffer[self.len] = byte;
                        self.len += 1;
                    }
                }
            },
            State::ReadChecksum1 => self.state = State::ReadChecksum2(byte),
            State::ReadChecksum2(hi) => {
                self.state = State::WaitStart;
                let body = &packet_buffer[..self.len];

                #[cfg(feature = "trace-pkt")]
                trace!(
                    "<-- ${}#{}{}",
                    core::str::from_utf8(body).unwrap_or("<invalid packet>"),
                    hi as char,
                    byte as char
                );

                let calculated = checksum(body);
                let expected = hex_to_byte([hi, byte]).ok();
                return Some(if expected == Some(calculated) {
                    RecvEvent::Packet(body)
                } else {
                    RecvEvent::ChecksumMismatch {
                        checksum: expected,
                        calculated,
                    }
                });
            }
        }

        None
    }

    fn restart_body(&mut self) {
        self.state = State::ReadBody;
        self.len = 0;
    }
}

impl Default for RecvPacketStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed<'b>(
        sm: &mut RecvPacketStateMachine,
        buf: &'b mut [u8],
        bytes: &[u8],
    ) -> Option<RecvEvent<'b>> {
        let (last, rest) = bytes.split_last().unwrap();
        for &b in rest {
            assert_eq!(sm.pump(buf, b), None);
        }
        sm.pump(buf, *last)
    }

    #[test]
    fn simple_packet() {
        let mut sm = RecvPacketStateMachine::new();
        let mut buf = [0; 64];
        let ev = feed(&mut sm, &mut buf, b"garbage$qC#b4");
        assert_eq!(ev, Some(RecvEvent::Packet(b"qC")));
        assert!(sm.is_idle());
    }

    #[test]
    fn packet_restart() {
        let mut sm = RecvPacketStateMachine::new();
        let mut buf = [0; 64];
        let packet = format!("$abc$def#{:02x}", checksum(b"def"));
        let ev = feed(&mut sm, &mut buf, packet.as_bytes());
        assert_eq!(ev, Some(RecvEvent::Packet(b"def")));
    }

    #[test]
    fn interrupt_short_circuits() {
        let mut sm = RecvPacketStateMachine::new();
        let mut buf = [0; 64];
        assert_eq!(sm.pump(&mut buf, b'+'), None);
        assert_eq!(sm.pump(&mut buf, INTERRUPT), Some(RecvEvent::Interrupt));
    }

    #[test]
    fn interrupt_inside_body_is_data() {
        let mut sm = RecvPacketStateMachine::new();
        let mut buf = [0; 64];
        assert_eq!(sm.pump(&mut buf, b'$'), None);
        assert_eq!(sm.pump(&mut buf, INTERRUPT), None);
        assert!(!sm.is_idle());
    }

    #[test]
    fn checksum_mismatch() {
        let mut sm = RecvPacketStateMachine::new();
        let mut buf = [0; 64];
        let ev = feed(&mut sm, &mut buf, b"$qC#00");
        assert_eq!(
            ev,
            Some(RecvEvent::ChecksumMismatch {
                checksum: Some(0),
                calculated: 0xb4
            })
        );

        // the state machine is ready for the retransmission
        let ev = feed(&mut sm, &mut buf, b"$qC#B4");
        assert_eq!(ev, Some(RecvEvent::Packet(b"qC")));
    }

    #[test]
    fn non_hex_checksum() {
        let mut sm = RecvPacketStateMachine::new();
        let mut buf = [0; 64];
        let ev = feed(&mut sm, &mut buf, b"$qC#zz");
        assert_eq!(
            ev,
            Some(RecvEvent::ChecksumMismatch {
                checksum: None,
                calculated: 0xb4
            })
        );
    }

    #[test]
    fn oversized_packet_dropped() {
        let mut sm = RecvPacketStateMachine::new();
        let mut buf = [0; 4];
        for &b in b"$abcde" {
            assert_eq!(sm.pump(&mut buf, b), None);
        }
        assert!(sm.is_idle());
        // the tail of the dropped packet is ignored
        for &b in b"#00" {
            assert_eq!(sm.pump(&mut buf, b), None);
        }
        let ev = feed(&mut sm, &mut buf, b"$qC#b4");
        assert_eq!(ev, Some(RecvEvent::Packet(b"qC")));
    }
}
