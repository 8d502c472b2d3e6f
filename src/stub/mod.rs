//! The core [`GdbStub`] type, used to drive a GDB debugging session over a
//! given [`Connection`].
//!
//! The stub is entirely event driven. The embedder delivers:
//!
//! - every byte received from the GDB client, via [`GdbStub::pump`]
//! - every fault raised by a debuggee thread, via [`GdbStub::report_fault`]
//! - thread lifecycle changes, via [`GdbStub::thread_spawned`] and
//!   [`GdbStub::thread_exited`]
//!
//! in whatever order they occur. A fault arriving in the middle of a packet
//! does not disturb the partially received packet.
//!
//! ## Kernel fault replies
//!
//! Faulting threads are suspended through their [`ThreadControl`] capability,
//! but the kernel also keeps them blocked until their fault message is
//! answered. Once `pump` returns [`SessionEvent::Resumed`] (or
//! [`SessionEvent::Detached`]), the embedder should answer every outstanding
//! fault for which [`Fault::wants_reply`] returned `true`.
//!
//! [`ThreadControl`]: crate::target::ThreadControl

use managed::ManagedSlice;

use crate::common::{NativeId, Pid};
use crate::conn::{Connection, ConnectionExt};
use crate::protocol::RecvPacketStateMachine;
use crate::target::registry::{Registry, RegistryError, ThreadRef};
use crate::target::Target;

mod builder;
mod core_impl;
mod error;
mod stop_reason;

pub use builder::{GdbStubBuilder, GdbStubBuilderError};
pub use error::GdbStubError;
pub use stop_reason::{DebugException, DebugExceptionReason, Fault};

use core_impl::GdbStubImpl;
use GdbStubError as Error;

/// Session state changes reported by [`GdbStub::pump`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// GDB resumed execution. Threads flagged for wakeup have been resumed.
    Resumed,
    /// GDB detached. All debug state has been removed and every thread
    /// resumed.
    Detached,
}

/// Debug a collection of protection domains over a given `Connection`.
///
/// Create with [`GdbStub::builder`], register the inferiors and threads to be
/// debugged, then feed it bytes and faults.
pub struct GdbStub<'a, T: Target, C: Connection> {
    conn: C,
    packet_buffer: ManagedSlice<'a, u8>,
    recv: RecvPacketStateMachine,
    inner: GdbStubImpl<T>,
}

impl<'a, T: Target, C: Connection> GdbStub<'a, T, C> {
    /// Create a [`GdbStubBuilder`] using the provided Connection.
    pub fn builder(conn: C) -> GdbStubBuilder<'a, T, C> {
        GdbStubBuilder::new(conn)
    }

    /// Feed one byte received from the GDB client.
    pub fn pump(&mut self, byte: u8) -> Result<Option<SessionEvent>, Error<C::Error>> {
        if self.inner.awaiting_ack() {
            self.inner.handle_ack(&mut self.conn, byte)?;
            return Ok(None);
        }

        match self.recv.pump(&mut self.packet_buffer, byte) {
            Some(event) => self.inner.handle_event(&mut self.conn, event),
            None => Ok(None),
        }
    }

    /// Report a fault raised by thread `thread` of inferior `inferior` (both
    /// kernel-native ids).
    ///
    /// Every enabled thread is suspended. The stop reply is sent right away if
    /// the targets were running, or queued until GDB next resumes them.
    pub fn report_fault(
        &mut self,
        inferior: NativeId,
        thread: NativeId,
        fault: Fault,
    ) -> Result<(), Error<C::Error>> {
        self.inner
            .report_fault(&mut self.conn, inferior, thread, fault)
    }

    /// Register thread `child` of inferior `inferior`, spawned by `parent`,
    /// and report the clone event to GDB.
    pub fn thread_spawned(
        &mut self,
        inferior: NativeId,
        parent: NativeId,
        child: NativeId,
        handle: T::Thread,
    ) -> Result<ThreadRef, Error<C::Error>> {
        self.inner
            .thread_spawned(&mut self.conn, inferior, parent, child, handle)
    }

    /// Report the exit of `thread` to GDB and disable it.
    pub fn thread_exited(
        &mut self,
        inferior: NativeId,
        thread: NativeId,
    ) -> Result<(), Error<C::Error>> {
        self.inner.thread_exited(&mut self.conn, inferior, thread)
    }

    /// Register an inferior, returning its protocol id.
    pub fn register_inferior(
        &mut self,
        native_id: NativeId,
        address_space: T::AddressSpace,
    ) -> Result<Pid, RegistryError> {
        self.inner
            .registry_mut()
            .register_inferior(native_id, address_space)
    }

    /// Register a thread of inferior `pid` without reporting it to GDB (e.g:
    /// the initial thread of a protection domain).
    pub fn register_thread(
        &mut self,
        pid: Pid,
        native_id: NativeId,
        handle: T::Thread,
    ) -> Result<ThreadRef, RegistryError> {
        self.inner
            .registry_mut()
            .register_thread(pid, native_id, handle)
    }

    /// Disable an inferior and all of its threads.
    pub fn disable_inferior(&mut self, pid: Pid) -> Result<(), RegistryError> {
        self.inner.registry_mut().disable_inferior(pid)
    }

    /// Inferiors and threads known to the stub.
    pub fn registry(&self) -> &Registry<T> {
        self.inner.registry()
    }

    /// Whether the debuggee is running (as opposed to stopped under GDB's
    /// control).
    pub fn is_running(&self) -> bool {
        self.inner.is_running()
    }

    /// Return a mutable reference to the underlying connection.
    pub fn borrow_conn(&mut self) -> &mut C {
        &mut self.conn
    }
}

impl<'a, T: Target, C: ConnectionExt> GdbStub<'a, T, C> {
    /// Run a session by reading bytes from the connection until GDB detaches.
    ///
    /// Faults cannot be delivered while this is blocked in `read`, so this is
    /// mostly useful once every fault source has been routed elsewhere (or
    /// for tests).
    pub fn run_blocking(&mut self) -> Result<(), Error<C::Error>> {
        self.conn.on_session_start().map_err(Error::ConnectionWrite)?;

        loop {
            let byte = self.conn.read().map_err(Error::ConnectionRead)?;
            if let Some(SessionEvent::Detached) = self.pump(byte)? {
                return Ok(());
            }
        }
    }
}
