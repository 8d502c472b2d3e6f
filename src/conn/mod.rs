//! Traits to perform in-order, serial, byte-wise I/O.
//!
//! The stub never owns the physical transport. A UART driver, a shared-memory
//! serial ring or a socket only needs to provide these two traits.

/// A trait to perform in-order, serial, byte-wise output.
pub trait Connection {
    /// Transport-specific error type.
    type Error;

    /// Write a single byte.
    fn write(&mut self, byte: u8) -> Result<(), Self::Error>;

    /// Write the entire buffer, blocking until complete.
    ///
    /// This method's default implementation calls `self.write()` on each byte
    /// in the buffer. If the transport can enqueue a whole buffer at once (e.g:
    /// a ring-buffer based serial multiplexer), this method should be
    /// overridden.
    fn write_all(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
        for b in buf {
            self.write(*b)?;
        }
        Ok(())
    }

    /// Flush this Connection, ensuring that all intermediately buffered
    /// contents reach their destination.
    ///
    /// _Note:_ Not all `Connection`s have internal buffering (e.g: writing data
    /// to a UART TX register with FIFOs disabled). In these cases, it's fine to
    /// simply return `Ok(())`.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Called at the start of a debugging session _before_ any GDB packets have
    /// been sent/received.
    ///
    /// This method's default implementation is a no-op.
    fn on_session_start(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Extends [`Connection`] with a blocking `read` method.
///
/// This trait is only required by
/// [`GdbStub::run_blocking`](crate::GdbStub::run_blocking). Event-driven
/// embedders deliver bytes through [`GdbStub::pump`](crate::GdbStub::pump)
/// instead.
pub trait ConnectionExt: Connection {
    /// Read a single byte, blocking until one is available.
    fn read(&mut self) -> Result<u8, Self::Error>;
}
