//! Inferior / thread bookkeeping.
//!
//! Every inferior and thread is given a protocol id, distinct from the
//! kernel-native id supplied by the embedder. Protocol ids are dense, start at
//! 1 (GDB reserves 0 for "any"), resolve in O(1), and are never reused: a
//! retired slot that is claimed again gets a fresh, larger id.

use core::fmt::{self, Display};

use super::breakpoints::BreakpointTable;
use super::{Target, ThreadControl};
use crate::common::{NativeId, Pid, Tid};
use crate::protocol::common::thread_id::{IdKind, ThreadId};
use crate::util::arena::Arena;

/// An error which may occur while registering or retiring inferiors and
/// threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// No free slot left.
    Full,
    /// An enabled inferior (or thread, within its inferior) already has this
    /// native id.
    AlreadyRegistered,
    /// No enabled inferior with this id.
    UnknownInferior,
    /// No enabled thread with this id.
    UnknownThread,
    /// The inferior's hardware breakpoints and watchpoints could not be
    /// programmed onto a new thread.
    DebugSlots,
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use self::RegistryError::*;
        match self {
            Full => write!(f, "no free registry slot"),
            AlreadyRegistered => write!(f, "native id is already registered"),
            UnknownInferior => write!(f, "unknown inferior"),
            UnknownThread => write!(f, "unknown thread"),
            DebugSlots => write!(f, "could not program debug slots onto the thread"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RegistryError {}

/// Protocol-level reference to a thread, i.e: `p<pid>.<tid>` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadRef {
    /// Protocol id of the owning inferior.
    pub pid: Pid,
    /// Protocol id of the thread, unique within its inferior.
    pub tid: Tid,
}

impl Display for ThreadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{:x}.{:x}", self.pid, self.tid)
    }
}

bitflags::bitflags! {
    /// Per-thread execution control state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ThreadFlags: u8 {
        /// Resume this thread once the client lets the targets run.
        const WAKEUP = 1 << 0;
        /// Single-stepping is enabled on this thread.
        const SINGLE_STEP = 1 << 1;
    }
}

/// One schedulable execution context of an inferior.
pub struct Thread<T: Target> {
    native_id: NativeId,
    pub(crate) handle: T::Thread,
    pub(crate) flags: ThreadFlags,
}

impl<T: Target> Thread<T> {
    /// Kernel-native id supplied at registration.
    pub fn native_id(&self) -> NativeId {
        self.native_id
    }

    /// Execution control flags.
    pub fn flags(&self) -> ThreadFlags {
        self.flags
    }

    /// Thread control capability.
    pub fn handle(&self) -> &T::Thread {
        &self.handle
    }
}

/// One protection domain under debug.
pub struct Inferior<T: Target> {
    native_id: NativeId,
    pub(crate) address_space: T::AddressSpace,
    pub(crate) threads: Arena<Thread<T>>,
    pub(crate) breakpoints: BreakpointTable,
}

impl<T: Target> Inferior<T> {
    /// Kernel-native id supplied at registration.
    pub fn native_id(&self) -> NativeId {
        self.native_id
    }

    /// Address space capability.
    pub fn address_space(&self) -> &T::AddressSpace {
        &self.address_space
    }

    /// Look up an enabled thread of this inferior.
    pub fn thread(&self, tid: Tid) -> Option<&Thread<T>> {
        self.threads.get(tid)
    }

    /// Iterate over this inferior's enabled threads, in registration slot
    /// order.
    pub fn threads(&self) -> impl Iterator<Item = (Tid, &Thread<T>)> {
        self.threads.iter()
    }

    /// Software, hardware breakpoint and watchpoint slots.
    pub fn breakpoints(&self) -> &BreakpointTable {
        &self.breakpoints
    }

    fn first_thread(&self) -> Option<Tid> {
        self.threads.iter().map(|(tid, _)| tid).next()
    }
}

/// Owns every inferior and thread known to the stub, along with the current
/// target thread selection.
pub struct Registry<T: Target> {
    inferiors: Arena<Inferior<T>>,
    max_threads: usize,
    max_sw_breakpoints: usize,
    current: Option<ThreadRef>,
}

impl<T: Target> Registry<T> {
    /// Create an empty registry with the given capacities.
    pub fn new(max_inferiors: usize, max_threads: usize, max_sw_breakpoints: usize) -> Self {
        Registry {
            inferiors: Arena::with_capacity(max_inferiors),
            max_threads,
            max_sw_breakpoints,
            current: None,
        }
    }

    /// Register a new inferior, returning its protocol id.
    pub fn register_inferior(
        &mut self,
        native_id: NativeId,
        address_space: T::AddressSpace,
    ) -> Result<Pid, RegistryError> {
        if self.find_inferior(native_id).is_some() {
            return Err(RegistryError::AlreadyRegistered);
        }

        let pid = self
            .inferiors
            .insert(Inferior {
                native_id,
                address_space,
                threads: Arena::with_capacity(self.max_threads),
                breakpoints: BreakpointTable::new::<T::Arch>(self.max_sw_breakpoints),
            })
            .map_err(|_| RegistryError::Full)?;

        debug!("registered inferior {:#x} as pid {:x}", native_id, pid);
        Ok(pid)
    }

    /// Register a new thread of inferior `pid`.
    ///
    /// Every hardware breakpoint and watchpoint currently set on the inferior
    /// is programmed onto the new thread. If that fails, the thread is not
    /// registered. The first thread registered while no
    /// thread is selected becomes the current target thread.
    pub fn register_thread(
        &mut self,
        pid: Pid,
        native_id: NativeId,
        mut handle: T::Thread,
    ) -> Result<ThreadRef, RegistryError> {
        let inferior = self
            .inferiors
            .get_mut(pid)
            .ok_or(RegistryError::UnknownInferior)?;

        if inferior
            .threads
            .iter()
            .any(|(_, t)| t.native_id == native_id)
        {
            return Err(RegistryError::AlreadyRegistered);
        }

        if inferior.threads.is_full() {
            return Err(RegistryError::Full);
        }

        if let Err(e) = inferior.breakpoints.program_thread::<T>(&mut handle) {
            warn!(
                "could not mirror debug slots onto new thread {:#x}: {:?}",
                native_id, e
            );
            return Err(RegistryError::DebugSlots);
        }

        let tid = inferior
            .threads
            .insert(Thread {
                native_id,
                handle,
                flags: ThreadFlags::empty(),
            })
            .map_err(|_| RegistryError::Full)?;

        let thread = ThreadRef { pid, tid };
        debug!("registered thread {:#x} as {}", native_id, thread);

        if self.current.is_none() {
            self.current = Some(thread);
        }

        Ok(thread)
    }

    /// Disable an inferior along with all of its threads, freeing its slot for
    /// a later registration.
    pub fn disable_inferior(&mut self, pid: Pid) -> Result<(), RegistryError> {
        let inferior = self
            .inferiors
            .get_mut(pid)
            .ok_or(RegistryError::UnknownInferior)?;

        let tids = inferior.threads.iter().map(|(tid, _)| tid).collect::<alloc::vec::Vec<_>>();
        for tid in tids {
            inferior.threads.retire(tid);
        }
        self.inferiors.retire(pid);
        debug!("disabled inferior {:x}", pid);

        if matches!(self.current, Some(cur) if cur.pid == pid) {
            let next = self.threads().next();
            self.current = next;
        }
        Ok(())
    }

    /// Disable a thread. Its protocol id will never be handed out again.
    pub fn mark_thread_exited(&mut self, thread: ThreadRef) -> Result<(), RegistryError> {
        let inferior = self
            .inferiors
            .get_mut(thread.pid)
            .ok_or(RegistryError::UnknownInferior)?;
        if !inferior.threads.retire(thread.tid) {
            return Err(RegistryError::UnknownThread);
        }
        debug!("thread {} exited", thread);

        if self.current == Some(thread) {
            let next = self.threads().next();
            self.current = next;
        }
        Ok(())
    }

    /// Look up an enabled inferior.
    pub fn inferior(&self, pid: Pid) -> Option<&Inferior<T>> {
        self.inferiors.get(pid)
    }

    pub(crate) fn inferior_mut(&mut self, pid: Pid) -> Option<&mut Inferior<T>> {
        self.inferiors.get_mut(pid)
    }

    /// Look up an enabled thread.
    pub fn thread(&self, thread: ThreadRef) -> Option<&Thread<T>> {
        self.inferiors.get(thread.pid)?.threads.get(thread.tid)
    }

    pub(crate) fn thread_mut(&mut self, thread: ThreadRef) -> Option<&mut Thread<T>> {
        self.inferiors
            .get_mut(thread.pid)?
            .threads
            .get_mut(thread.tid)
    }

    /// Find the enabled inferior registered with `native_id`.
    pub fn find_inferior(&self, native_id: NativeId) -> Option<Pid> {
        self.inferiors
            .iter()
            .find(|(_, inf)| inf.native_id == native_id)
            .map(|(pid, _)| pid)
    }

    /// Find an enabled thread by native ids.
    pub fn find_thread(&self, inferior: NativeId, thread: NativeId) -> Option<ThreadRef> {
        let pid = self.find_inferior(inferior)?;
        self.inferiors
            .get(pid)?
            .threads
            .iter()
            .find(|(_, t)| t.native_id == thread)
            .map(|(tid, _)| ThreadRef { pid, tid })
    }

    /// The current target thread (selected by `H`, or by the last stop).
    pub fn current(&self) -> Option<ThreadRef> {
        self.current
    }

    pub(crate) fn set_current(&mut self, thread: ThreadRef) {
        if self.current != Some(thread) {
            trace!("current thread is now {}", thread);
        }
        self.current = Some(thread);
    }

    /// Iterate over every enabled thread of every enabled inferior.
    pub fn threads(&self) -> impl Iterator<Item = ThreadRef> + '_ {
        self.inferiors.iter().flat_map(|(pid, inf)| {
            inf.threads.iter().map(move |(tid, _)| ThreadRef { pid, tid })
        })
    }

    pub(crate) fn threads_mut(&mut self) -> impl Iterator<Item = (ThreadRef, &mut Thread<T>)> {
        self.inferiors.iter_mut().flat_map(|(pid, inf)| {
            inf.threads
                .iter_mut()
                .map(move |(tid, t)| (ThreadRef { pid, tid }, t))
        })
    }

    /// Iterate over every enabled inferior.
    pub fn inferiors(&self) -> impl Iterator<Item = (Pid, &Inferior<T>)> {
        self.inferiors.iter()
    }

    pub(crate) fn inferiors_mut(&mut self) -> impl Iterator<Item = (Pid, &mut Inferior<T>)> {
        self.inferiors.iter_mut()
    }

    /// Resolve a wire thread-id into an enabled thread.
    ///
    /// A missing, "any" or "all" process id refers to the current inferior. A
    /// "any" or "all" thread id refers to the first enabled thread of the
    /// inferior.
    pub(crate) fn resolve(&self, id: ThreadId) -> Option<ThreadRef> {
        let pid = match id.pid {
            Some(IdKind::WithId(pid)) => pid,
            _ => match self.current {
                Some(cur) => cur.pid,
                None => self.inferiors.iter().map(|(pid, _)| pid).next()?,
            },
        };
        let inferior = self.inferiors.get(pid)?;

        let tid = match id.tid {
            IdKind::WithId(tid) => {
                inferior.threads.get(tid)?;
                tid
            }
            IdKind::Any | IdKind::All => inferior.first_thread()?,
        };

        Some(ThreadRef { pid, tid })
    }

    /// Suspend every enabled thread. Failures are logged and skipped.
    pub(crate) fn suspend_all(&mut self) {
        for (thread, t) in self.threads_mut() {
            if let Err(e) = t.handle.suspend() {
                warn!("failed to suspend {}: {:?}", thread, e);
            }
        }
    }

    /// Resume every enabled thread with a pending wakeup, clearing the flag.
    pub(crate) fn resume_woken(&mut self) {
        for (thread, t) in self.threads_mut() {
            if !t.flags.contains(ThreadFlags::WAKEUP) {
                continue;
            }
            t.flags.remove(ThreadFlags::WAKEUP);
            trace!("resuming {}", thread);
            if let Err(e) = t.handle.resume() {
                warn!("failed to resume {}: {:?}", thread, e);
            }
        }
    }
}
