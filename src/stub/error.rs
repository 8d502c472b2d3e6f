use core::fmt::{self, Debug, Display};

use crate::common::NativeId;
use crate::protocol::CapacityError;
use crate::target::registry::RegistryError;

/// An error which may occur during a GDB debugging session.
///
/// Protocol-level problems (malformed commands, failed capability calls,
/// unresolvable thread ids) never surface here: they are answered on the wire
/// with an `E<nn>` or empty reply, and the session carries on.
#[derive(Debug)]
#[non_exhaustive]
pub enum GdbStubError<C> {
    /// Connection Error while writing a packet or an acknowledgement.
    ConnectionWrite(C),
    /// Connection Error while reading the next byte.
    ConnectionRead(C),
    /// A reply did not fit into the packet buffer.
    PacketBufferOverflow,
    /// An inferior or thread could not be registered or retired.
    Registry(RegistryError),
    /// A fault was delivered for a thread that was never registered.
    UnknownFaultingThread {
        /// Native id of the faulting thread's inferior.
        inferior: NativeId,
        /// Native id of the faulting thread.
        thread: NativeId,
    },
}

impl<C> From<RegistryError> for GdbStubError<C> {
    fn from(e: RegistryError) -> Self {
        GdbStubError::Registry(e)
    }
}

impl<C> From<CapacityError> for GdbStubError<C> {
    fn from(_: CapacityError) -> Self {
        GdbStubError::PacketBufferOverflow
    }
}

impl<C> Display for GdbStubError<C>
where
    C: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use self::GdbStubError::*;
        match self {
            ConnectionWrite(e) => write!(f, "Connection Error while writing response: {:?}", e),
            ConnectionRead(e) => write!(f, "Connection Error while reading request: {:?}", e),
            PacketBufferOverflow => write!(f, "Reply too big for the packet buffer!"),
            Registry(e) => write!(f, "Registry error: {}", e),
            UnknownFaultingThread { inferior, thread } => write!(
                f,
                "Fault from unregistered thread {:#x} of inferior {:#x}",
                thread, inferior
            ),
        }
    }
}

#[cfg(feature = "std")]
impl<C> std::error::Error for GdbStubError<C> where C: Debug {}
