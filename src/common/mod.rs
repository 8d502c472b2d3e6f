//! Common types and definitions used across `capstub`.

mod signal;

pub use self::signal::Signal;

/// Thread ID, as seen by GDB.
pub type Tid = core::num::NonZeroUsize;

/// Process (inferior) ID, as seen by GDB.
pub type Pid = core::num::NonZeroUsize;

/// Kernel-native identifier supplied by the embedder for an inferior or
/// thread. Opaque to the stub.
pub type NativeId = u64;
