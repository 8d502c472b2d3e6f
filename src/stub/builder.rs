use core::fmt::{self, Display};
use core::marker::PhantomData;

use managed::ManagedSlice;

use crate::conn::Connection;
use crate::protocol::RecvPacketStateMachine;
use crate::target::registry::Registry;
use crate::target::Target;
use crate::{
    DEFAULT_MAX_INFERIORS, DEFAULT_MAX_SW_BREAKPOINTS, DEFAULT_MAX_THREADS,
    DEFAULT_PACKET_BUFFER_SIZE,
};

use super::core_impl::GdbStubImpl;
use super::GdbStub;

/// An error which may occur when building a [`GdbStub`].
#[derive(Debug)]
pub enum GdbStubBuilderError {
    /// The packet buffer has zero length.
    MissingPacketBuffer,
    /// Custom packet buffer size is larger than the provided buffer's length.
    PacketBufSizeMismatch,
    /// One of the registry capacities is zero.
    ZeroCapacity,
}

impl Display for GdbStubBuilderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use self::GdbStubBuilderError::*;
        match self {
            MissingPacketBuffer => write!(f, "The packet buffer must not be empty."),
            PacketBufSizeMismatch => write!(
                f,
                "`packet_buffer_size` is larger than `packet_buffer`'s size."
            ),
            ZeroCapacity => write!(
                f,
                "`max_inferiors`, `max_threads` and `max_sw_breakpoints` must be non-zero."
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for GdbStubBuilderError {}

/// Helper to construct and customize [`GdbStub`].
pub struct GdbStubBuilder<'a, T: Target, C: Connection> {
    conn: C,
    packet_buffer: Option<&'a mut [u8]>,
    packet_buffer_size: Option<usize>,
    max_inferiors: usize,
    max_threads: usize,
    max_sw_breakpoints: usize,

    _target: PhantomData<T>,
}

impl<'a, T: Target, C: Connection> GdbStubBuilder<'a, T, C> {
    /// Create a new `GdbStubBuilder` using the provided Connection.
    pub fn new(conn: C) -> GdbStubBuilder<'static, T, C> {
        GdbStubBuilder {
            conn,
            packet_buffer: None,
            packet_buffer_size: None,
            max_inferiors: DEFAULT_MAX_INFERIORS,
            max_threads: DEFAULT_MAX_THREADS,
            max_sw_breakpoints: DEFAULT_MAX_SW_BREAKPOINTS,

            _target: PhantomData,
        }
    }

    /// Use a pre-allocated packet buffer (instead of heap-allocating).
    pub fn packet_buffer(mut self, packet_buffer: &'a mut [u8]) -> Self {
        self.packet_buffer = Some(packet_buffer);
        self
    }

    /// Specify a custom size for the packet buffer. Defaults to
    /// [`DEFAULT_PACKET_BUFFER_SIZE`] bytes.
    ///
    /// The size bounds both inbound packet bodies and outbound replies, and is
    /// advertised to GDB as `PacketSize`. When used alongside `packet_buffer`,
    /// the provided `size` must be less than or equal to the length of the
    /// packet buffer.
    pub fn packet_buffer_size(mut self, size: usize) -> Self {
        self.packet_buffer_size = Some(size);
        self
    }

    /// Maximum number of simultaneously enabled inferiors.
    pub fn max_inferiors(mut self, n: usize) -> Self {
        self.max_inferiors = n;
        self
    }

    /// Maximum number of simultaneously enabled threads per inferior.
    pub fn max_threads(mut self, n: usize) -> Self {
        self.max_threads = n;
        self
    }

    /// Maximum number of software breakpoints per inferior.
    pub fn max_sw_breakpoints(mut self, n: usize) -> Self {
        self.max_sw_breakpoints = n;
        self
    }

    /// Build the GdbStub, returning an error if something went wrong.
    pub fn build(self) -> Result<GdbStub<'a, T, C>, GdbStubBuilderError> {
        if self.max_inferiors == 0 || self.max_threads == 0 || self.max_sw_breakpoints == 0 {
            return Err(GdbStubBuilderError::ZeroCapacity);
        }

        let packet_buffer = match self.packet_buffer {
            Some(buf) => {
                let buf = match self.packet_buffer_size {
                    Some(custom_len) => {
                        if custom_len > buf.len() {
                            return Err(GdbStubBuilderError::PacketBufSizeMismatch);
                        } else {
                            &mut buf[..custom_len]
                        }
                    }
                    None => buf,
                };
                ManagedSlice::Borrowed(buf)
            }
            None => {
                use alloc::vec;
                let len = self.packet_buffer_size.unwrap_or(DEFAULT_PACKET_BUFFER_SIZE);
                ManagedSlice::Owned(vec![0; len])
            }
        };

        if packet_buffer.is_empty() {
            return Err(GdbStubBuilderError::MissingPacketBuffer);
        }

        let registry = Registry::new(
            self.max_inferiors,
            self.max_threads,
            self.max_sw_breakpoints,
        );

        Ok(GdbStub {
            conn: self.conn,
            recv: RecvPacketStateMachine::new(),
            inner: GdbStubImpl::new(registry, packet_buffer.len()),
            packet_buffer,
        })
    }
}
