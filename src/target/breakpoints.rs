//! Software breakpoints, hardware breakpoints and watchpoints.
//!
//! Software breakpoints patch the inferior's memory. Hardware breakpoints and
//! watchpoints are per-thread debug registers: the same logical slot is
//! programmed onto every enabled thread of the inferior, and onto every thread
//! registered later on.

use alloc::vec::Vec;
use core::fmt::{self, Display};

use super::registry::{Inferior, Thread, ThreadFlags};
use super::{AddressSpace, HwBreakpointKind, Target, ThreadControl, WatchKind};
use crate::arch::Arch;

/// An error which may occur while setting or removing a breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakpointError {
    /// Address 0 cannot host a breakpoint.
    ZeroAddress,
    /// Watchpoint size unsupported by the hardware.
    InvalidSize,
    /// Every slot of the requested kind is in use.
    NoFreeSlot,
    /// No breakpoint of the requested kind is set at this address.
    NotFound,
    /// The address space capability failed.
    Memory,
    /// A thread capability failed.
    Thread,
}

impl Display for BreakpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use self::BreakpointError::*;
        match self {
            ZeroAddress => write!(f, "cannot set a breakpoint at address 0"),
            InvalidSize => write!(f, "unsupported watchpoint size"),
            NoFreeSlot => write!(f, "no free breakpoint slot"),
            NotFound => write!(f, "no such breakpoint"),
            Memory => write!(f, "could not access inferior memory"),
            Thread => write!(f, "could not program thread debug registers"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BreakpointError {}

/// A software breakpoint, along with the word it replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwBreakpoint {
    /// Breakpoint address.
    pub addr: u64,
    /// Word found at `addr` before the trap was spliced in. Only the
    /// instruction at its lowest address is ever written back.
    pub original: u64,
}

/// A hardware watchpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watchpoint {
    /// Watched address.
    pub addr: u64,
    /// Access type triggering the watchpoint.
    pub access: WatchKind,
    /// Watched region size, in bytes.
    pub size: u64,
}

/// Per-inferior breakpoint bookkeeping.
#[derive(Debug)]
pub struct BreakpointTable {
    sw: Vec<Option<SwBreakpoint>>,
    hw: Vec<Option<u64>>,
    watch: Vec<Option<Watchpoint>>,
    first_hw: usize,
    first_watch: usize,
}

impl BreakpointTable {
    pub(crate) fn new<A: Arch>(max_sw_breakpoints: usize) -> Self {
        let mut sw = Vec::new();
        sw.resize_with(max_sw_breakpoints, || None);
        let mut hw = Vec::new();
        hw.resize_with(A::NUM_HW_BREAKPOINTS, || None);
        let mut watch = Vec::new();
        watch.resize_with(A::NUM_HW_WATCHPOINTS, || None);

        BreakpointTable {
            sw,
            hw,
            watch,
            first_hw: A::FIRST_HW_BREAKPOINT,
            first_watch: A::FIRST_HW_WATCHPOINT,
        }
    }

    /// Active software breakpoints.
    pub fn sw_breakpoints(&self) -> impl Iterator<Item = &SwBreakpoint> {
        self.sw.iter().flatten()
    }

    /// Active hardware breakpoints, as `(kernel slot, address)`.
    pub fn hw_breakpoints(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.hw
            .iter()
            .enumerate()
            .filter_map(move |(i, bp)| bp.map(|addr| (self.first_hw + i, addr)))
    }

    /// Active hardware watchpoints, as `(kernel slot, watchpoint)`.
    pub fn watchpoints(&self) -> impl Iterator<Item = (usize, &Watchpoint)> {
        let first = self.first_watch;
        self.watch
            .iter()
            .enumerate()
            .filter_map(move |(i, wp)| wp.as_ref().map(|wp| (first + i, wp)))
    }

    /// The watchpoint programmed into kernel slot `slot`, if any.
    pub fn watchpoint_at_slot(&self, slot: usize) -> Option<&Watchpoint> {
        self.watch.get(slot.checked_sub(self.first_watch)?)?.as_ref()
    }

    /// Program every active hardware breakpoint and watchpoint onto `handle`.
    ///
    /// All-or-none: on failure, the slots already programmed are cleared again.
    pub(crate) fn program_thread<T: Target>(
        &self,
        handle: &mut T::Thread,
    ) -> Result<(), <T::Thread as ThreadControl>::Error> {
        let slots = self
            .hw_breakpoints()
            .map(|(slot, addr)| (slot, addr, HwBreakpointKind::Instruction))
            .chain(self.watchpoints().map(|(slot, wp)| {
                let kind = HwBreakpointKind::Data {
                    access: wp.access,
                    size: wp.size,
                };
                (slot, wp.addr, kind)
            }))
            .collect::<Vec<_>>();

        for (i, &(slot, addr, kind)) in slots.iter().enumerate() {
            if let Err(e) = handle.set_breakpoint(slot, addr, kind) {
                for &(done, _, _) in &slots[..i] {
                    if let Err(e) = handle.clear_breakpoint(done) {
                        warn!("rollback of slot {} failed: {:?}", done, e);
                    }
                }
                return Err(e);
            }
        }
        Ok(())
    }
}

/// Program `slot` onto every enabled thread, undoing the threads already
/// programmed if any of them fails.
fn program_all<T: Target>(
    inferior: &mut Inferior<T>,
    slot: usize,
    addr: u64,
    kind: HwBreakpointKind,
) -> Result<(), BreakpointError> {
    let mut done = Vec::new();
    let mut failed = false;
    for (tid, thread) in inferior.threads.iter_mut() {
        match thread.handle.set_breakpoint(slot, addr, kind) {
            Ok(()) => done.push(tid),
            Err(e) => {
                warn!(
                    "failed to program debug slot {} on thread {:x}: {:?}",
                    slot, tid, e
                );
                failed = true;
                break;
            }
        }
    }

    if !failed {
        return Ok(());
    }

    for (tid, thread) in inferior.threads.iter_mut() {
        if !done.contains(&tid) {
            continue;
        }
        if let Err(e) = thread.handle.clear_breakpoint(slot) {
            warn!("rollback of slot {} on thread {:x} failed: {:?}", slot, tid, e);
        }
    }
    Err(BreakpointError::Thread)
}

/// Clear `slot` on every enabled thread. Keeps going after a failure.
fn clear_all<T: Target>(inferior: &mut Inferior<T>, slot: usize) -> Result<(), BreakpointError> {
    let mut res = Ok(());
    for (tid, thread) in inferior.threads.iter_mut() {
        if let Err(e) = thread.handle.clear_breakpoint(slot) {
            warn!(
                "failed to clear debug slot {} on thread {:x}: {:?}",
                slot, tid, e
            );
            res = Err(BreakpointError::Thread);
        }
    }
    res
}

impl<T: Target> Inferior<T> {
    /// Patch a breakpoint trap into the instruction at `addr`.
    ///
    /// Setting a breakpoint twice at the same address is a no-op. Memory is
    /// left untouched on failure.
    pub fn set_sw_breakpoint(&mut self, addr: u64) -> Result<(), BreakpointError> {
        if addr == 0 {
            return Err(BreakpointError::ZeroAddress);
        }

        let table = &mut self.breakpoints;
        if table.sw.iter().flatten().any(|bp| bp.addr == addr) {
            return Ok(());
        }
        let slot = table
            .sw
            .iter()
            .position(Option::is_none)
            .ok_or(BreakpointError::NoFreeSlot)?;

        let original = self.address_space.read_word(addr).map_err(|e| {
            warn!("failed to read word at {:#x}: {:?}", addr, e);
            BreakpointError::Memory
        })?;
        let patched = <T::Arch as Arch>::insert_sw_breakpoint(original);
        self.address_space.write_word(addr, patched).map_err(|e| {
            warn!("failed to write word at {:#x}: {:?}", addr, e);
            BreakpointError::Memory
        })?;

        table.sw[slot] = Some(SwBreakpoint { addr, original });
        debug!("set sw breakpoint at {:#x}", addr);
        Ok(())
    }

    /// Restore the original instruction at `addr`.
    ///
    /// Succeeds if no software breakpoint is set at `addr`. On a failed memory
    /// access the breakpoint stays recorded.
    pub fn unset_sw_breakpoint(&mut self, addr: u64) -> Result<(), BreakpointError> {
        let table = &mut self.breakpoints;
        let slot = match table
            .sw
            .iter()
            .position(|bp| matches!(bp, Some(bp) if bp.addr == addr))
        {
            Some(slot) => slot,
            None => return Ok(()),
        };

        if let Some(bp) = table.sw[slot] {
            // the rest of the word may hold a neighbouring trap
            let current = self.address_space.read_word(addr).map_err(|e| {
                warn!("failed to read word at {:#x}: {:?}", addr, e);
                BreakpointError::Memory
            })?;
            let restored = <T::Arch as Arch>::remove_sw_breakpoint(current, bp.original);
            self.address_space
                .write_word(addr, restored)
                .map_err(|e| {
                    warn!("failed to restore word at {:#x}: {:?}", addr, e);
                    BreakpointError::Memory
                })?;
        }

        table.sw[slot] = None;
        debug!("removed sw breakpoint at {:#x}", addr);
        Ok(())
    }

    /// Set a hardware instruction breakpoint on every enabled thread.
    ///
    /// All-or-none: if any thread fails, threads already programmed are
    /// cleared again and the slot stays free.
    pub fn set_hw_breakpoint(&mut self, addr: u64) -> Result<(), BreakpointError> {
        if addr == 0 {
            return Err(BreakpointError::ZeroAddress);
        }
        if self.breakpoints.hw.contains(&Some(addr)) {
            return Ok(());
        }
        let idx = self
            .breakpoints
            .hw
            .iter()
            .position(Option::is_none)
            .ok_or(BreakpointError::NoFreeSlot)?;
        let slot = self.breakpoints.first_hw + idx;

        program_all(self, slot, addr, HwBreakpointKind::Instruction)?;
        self.breakpoints.hw[idx] = Some(addr);
        debug!("set hw breakpoint {} at {:#x}", slot, addr);
        Ok(())
    }

    /// Remove a hardware instruction breakpoint from every enabled thread.
    ///
    /// Best-effort: the slot is freed even if some thread fails to clear it,
    /// in which case the failure is still reported.
    pub fn unset_hw_breakpoint(&mut self, addr: u64) -> Result<(), BreakpointError> {
        let idx = self
            .breakpoints
            .hw
            .iter()
            .position(|bp| *bp == Some(addr))
            .ok_or(BreakpointError::NotFound)?;
        let slot = self.breakpoints.first_hw + idx;

        self.breakpoints.hw[idx] = None;
        debug!("removed hw breakpoint {} at {:#x}", slot, addr);
        clear_all(self, slot)
    }

    /// Set a hardware watchpoint on every enabled thread. Same all-or-none
    /// policy as [`set_hw_breakpoint`](Self::set_hw_breakpoint).
    pub fn set_hw_watchpoint(
        &mut self,
        addr: u64,
        access: WatchKind,
        size: u64,
    ) -> Result<(), BreakpointError> {
        if addr == 0 {
            return Err(BreakpointError::ZeroAddress);
        }
        if !size.is_power_of_two() || size > <T::Arch as Arch>::MAX_WATCHPOINT_SIZE {
            return Err(BreakpointError::InvalidSize);
        }

        let wp = Watchpoint { addr, access, size };
        if self.breakpoints.watch.contains(&Some(wp)) {
            return Ok(());
        }
        let idx = self
            .breakpoints
            .watch
            .iter()
            .position(Option::is_none)
            .ok_or(BreakpointError::NoFreeSlot)?;
        let slot = self.breakpoints.first_watch + idx;

        program_all(self, slot, addr, HwBreakpointKind::Data { access, size })?;
        self.breakpoints.watch[idx] = Some(wp);
        debug!("set {:?} watchpoint {} at {:#x} ({} bytes)", access, slot, addr, size);
        Ok(())
    }

    /// Remove the hardware watchpoint matching `{addr, access, size}`. Same
    /// best-effort policy as [`unset_hw_breakpoint`](Self::unset_hw_breakpoint).
    pub fn unset_hw_watchpoint(
        &mut self,
        addr: u64,
        access: WatchKind,
        size: u64,
    ) -> Result<(), BreakpointError> {
        let wp = Watchpoint { addr, access, size };
        let idx = self
            .breakpoints
            .watch
            .iter()
            .position(|w| *w == Some(wp))
            .ok_or(BreakpointError::NotFound)?;
        let slot = self.breakpoints.first_watch + idx;

        self.breakpoints.watch[idx] = None;
        debug!("removed watchpoint {} at {:#x}", slot, addr);
        clear_all(self, slot)
    }

    /// Remove every breakpoint and watchpoint, and disable single-stepping on
    /// every thread. Failures are logged and skipped.
    pub(crate) fn clear_debug_state(&mut self) {
        let sw = self.breakpoints.sw_breakpoints().map(|bp| bp.addr).collect::<Vec<_>>();
        for addr in sw {
            if let Err(e) = self.unset_sw_breakpoint(addr) {
                warn!("could not remove sw breakpoint at {:#x}: {}", addr, e);
                // keep the session going: forget about it
                if let Some(bp) = self
                    .breakpoints
                    .sw
                    .iter_mut()
                    .find(|bp| matches!(bp, Some(bp) if bp.addr == addr))
                {
                    *bp = None;
                }
            }
        }

        let hw = self.breakpoints.hw.iter().flatten().copied().collect::<Vec<_>>();
        for addr in hw {
            // slot is freed regardless of the outcome
            let _ = self.unset_hw_breakpoint(addr);
        }

        let watch = self.breakpoints.watch.iter().flatten().copied().collect::<Vec<_>>();
        for wp in watch {
            let _ = self.unset_hw_watchpoint(wp.addr, wp.access, wp.size);
        }

        for (tid, thread) in self.threads.iter_mut() {
            if let Err(e) = thread.disable_single_step() {
                warn!("could not disable single-step on thread {:x}: {:?}", tid, e);
            }
        }
    }
}

impl<T: Target> Thread<T> {
    /// Turn on single-stepping. Returns `Ok(false)` (without touching the
    /// capability) if it was already on.
    pub fn enable_single_step(&mut self) -> Result<bool, <T::Thread as ThreadControl>::Error> {
        self.set_single_step(true)
    }

    /// Turn off single-stepping. Returns `Ok(false)` (without touching the
    /// capability) if it was already off.
    pub fn disable_single_step(&mut self) -> Result<bool, <T::Thread as ThreadControl>::Error> {
        self.set_single_step(false)
    }

    fn set_single_step(
        &mut self,
        enabled: bool,
    ) -> Result<bool, <T::Thread as ThreadControl>::Error> {
        if self.flags.contains(ThreadFlags::SINGLE_STEP) == enabled {
            return Ok(false);
        }
        self.handle.configure_single_step(enabled)?;
        self.flags.set(ThreadFlags::SINGLE_STEP, enabled);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::aarch64::AArch64;
    use crate::common::Pid;
    use crate::target::mock::{MockTarget, MockThread, MockVSpace, SlotState};
    use crate::target::registry::Registry;

    const CODE: u64 = 0x40_0000;

    fn setup(threads: usize) -> (Registry<MockTarget>, Pid) {
        let mut reg = Registry::new(4, 8, 2);
        let mut vspace = MockVSpace::default();
        vspace.fill(CODE, 4, 0x1122_3344_5566_7788);
        let pid = reg.register_inferior(0, vspace).unwrap();
        for native in 0..threads {
            reg.register_thread(pid, native as u64, MockThread::default())
                .unwrap();
        }
        (reg, pid)
    }

    #[test]
    fn sw_breakpoint_round_trip() {
        let (mut reg, pid) = setup(1);
        let inf = reg.inferior_mut(pid).unwrap();

        inf.set_sw_breakpoint(CODE).unwrap();
        assert_eq!(inf.address_space.peek(CODE), 0x1122_3344_d420_8000);

        // a second breakpoint doesn't disturb the first
        inf.set_sw_breakpoint(CODE + 8).unwrap();
        assert_eq!(inf.address_space.peek(CODE), 0x1122_3344_d420_8000);

        inf.unset_sw_breakpoint(CODE).unwrap();
        assert_eq!(inf.address_space.peek(CODE), 0x1122_3344_5566_7788);
        assert_eq!(inf.address_space.peek(CODE + 8), 0x1122_3344_d420_8000);

        inf.unset_sw_breakpoint(CODE + 8).unwrap();
        assert_eq!(inf.address_space.peek(CODE + 8), 0x1122_3344_5566_7788);
        assert_eq!(inf.breakpoints().sw_breakpoints().count(), 0);
    }

    #[test]
    fn adjacent_sw_breakpoints_set_high_first() {
        let (mut reg, pid) = setup(1);
        let inf = reg.inferior_mut(pid).unwrap();

        inf.set_sw_breakpoint(CODE + 4).unwrap();
        inf.set_sw_breakpoint(CODE).unwrap();
        assert_eq!(inf.address_space.peek(CODE), 0xd420_8000_d420_8000);

        inf.unset_sw_breakpoint(CODE + 4).unwrap();
        assert_eq!(inf.address_space.peek(CODE), 0x1122_3344_d420_8000);
        inf.unset_sw_breakpoint(CODE).unwrap();
        assert_eq!(inf.address_space.peek(CODE), 0x1122_3344_5566_7788);
        assert_eq!(inf.address_space.peek(CODE + 4) >> 32, 0x5566_7788);
    }

    #[test]
    fn adjacent_sw_breakpoints_unset_low_first() {
        let (mut reg, pid) = setup(1);
        let inf = reg.inferior_mut(pid).unwrap();

        inf.set_sw_breakpoint(CODE).unwrap();
        inf.set_sw_breakpoint(CODE + 4).unwrap();
        assert_eq!(inf.address_space.peek(CODE), 0xd420_8000_d420_8000);

        // the neighbouring trap stays in place
        inf.unset_sw_breakpoint(CODE).unwrap();
        assert_eq!(inf.address_space.peek(CODE), 0xd420_8000_5566_7788);
        assert_eq!(inf.breakpoints().sw_breakpoints().count(), 1);

        inf.unset_sw_breakpoint(CODE + 4).unwrap();
        assert_eq!(inf.address_space.peek(CODE), 0x1122_3344_5566_7788);
    }

    #[test]
    fn sw_breakpoint_overflow_leaves_memory_alone() {
        let (mut reg, pid) = setup(1);
        let inf = reg.inferior_mut(pid).unwrap();

        inf.set_sw_breakpoint(CODE).unwrap();
        inf.set_sw_breakpoint(CODE + 8).unwrap();
        let writes = inf.address_space.writes;
        assert_eq!(
            inf.set_sw_breakpoint(CODE + 16),
            Err(BreakpointError::NoFreeSlot)
        );
        assert_eq!(inf.address_space.peek(CODE + 16), 0x1122_3344_5566_7788);
        assert_eq!(inf.address_space.writes, writes);
    }

    #[test]
    fn sw_breakpoint_idempotent_and_lenient_unset() {
        let (mut reg, pid) = setup(1);
        let inf = reg.inferior_mut(pid).unwrap();

        inf.set_sw_breakpoint(CODE).unwrap();
        inf.set_sw_breakpoint(CODE).unwrap();
        assert_eq!(inf.breakpoints().sw_breakpoints().count(), 1);
        // the saved word is the original one, not the trap
        inf.unset_sw_breakpoint(CODE).unwrap();
        assert_eq!(inf.address_space.peek(CODE), 0x1122_3344_5566_7788);

        assert_eq!(inf.unset_sw_breakpoint(CODE + 0x100), Ok(()));
    }

    #[test]
    fn sw_breakpoint_unmapped() {
        let (mut reg, pid) = setup(1);
        let inf = reg.inferior_mut(pid).unwrap();
        assert_eq!(
            inf.set_sw_breakpoint(0xdead_0000),
            Err(BreakpointError::Memory)
        );
        assert_eq!(inf.breakpoints().sw_breakpoints().count(), 0);
    }

    #[test]
    fn zero_address_rejected() {
        let (mut reg, pid) = setup(1);
        let inf = reg.inferior_mut(pid).unwrap();
        assert_eq!(inf.set_sw_breakpoint(0), Err(BreakpointError::ZeroAddress));
        assert_eq!(inf.set_hw_breakpoint(0), Err(BreakpointError::ZeroAddress));
        assert_eq!(
            inf.set_hw_watchpoint(0, WatchKind::Write, 4),
            Err(BreakpointError::ZeroAddress)
        );
    }

    #[test]
    fn hw_breakpoint_mirrored_on_all_threads() {
        let (mut reg, pid) = setup(3);
        let inf = reg.inferior_mut(pid).unwrap();
        inf.set_hw_breakpoint(CODE).unwrap();

        for (_, t) in inf.threads() {
            assert_eq!(
                t.handle().slots[AArch64::FIRST_HW_BREAKPOINT],
                Some(SlotState {
                    addr: CODE,
                    kind: HwBreakpointKind::Instruction
                })
            );
        }

        inf.unset_hw_breakpoint(CODE).unwrap();
        for (_, t) in inf.threads() {
            assert_eq!(t.handle().slots[AArch64::FIRST_HW_BREAKPOINT], None);
        }
        assert_eq!(
            inf.unset_hw_breakpoint(CODE),
            Err(BreakpointError::NotFound)
        );
    }

    #[test]
    fn hw_breakpoint_rollback() {
        let (mut reg, pid) = setup(0);
        for native in 0..3 {
            let mut t = MockThread::default();
            t.fail_set_breakpoint = native == 2;
            reg.register_thread(pid, native, t).unwrap();
        }
        let inf = reg.inferior_mut(pid).unwrap();

        assert_eq!(inf.set_hw_breakpoint(CODE), Err(BreakpointError::Thread));
        for (_, t) in inf.threads() {
            assert!(t.handle().slots.iter().all(Option::is_none));
        }
        assert_eq!(inf.breakpoints().hw_breakpoints().count(), 0);
    }

    #[test]
    fn watchpoint_rollback() {
        let (mut reg, pid) = setup(0);
        for native in 0..3 {
            let mut t = MockThread::default();
            t.fail_set_breakpoint = native == 1;
            reg.register_thread(pid, native, t).unwrap();
        }
        let inf = reg.inferior_mut(pid).unwrap();

        assert_eq!(
            inf.set_hw_watchpoint(0x8000, WatchKind::Read, 4),
            Err(BreakpointError::Thread)
        );
        for (_, t) in inf.threads() {
            assert!(t.handle().slots.iter().all(Option::is_none));
        }
        assert_eq!(inf.breakpoints().watchpoints().count(), 0);

        // the slot is still free for the next request
        for (_, t) in inf.threads.iter_mut() {
            t.handle.fail_set_breakpoint = false;
        }
        inf.set_hw_watchpoint(0x8000, WatchKind::Read, 4).unwrap();
        assert_eq!(
            inf.breakpoints().watchpoints().next().map(|(slot, _)| slot),
            Some(AArch64::FIRST_HW_WATCHPOINT)
        );
    }

    #[test]
    fn hw_unset_is_best_effort() {
        let (mut reg, pid) = setup(2);
        let inf = reg.inferior_mut(pid).unwrap();
        inf.set_hw_breakpoint(CODE).unwrap();
        inf.set_hw_watchpoint(0x8000, WatchKind::Write, 8).unwrap();

        let stuck = inf.threads.iter().map(|(tid, _)| tid).nth(1).unwrap();
        inf.threads.get_mut(stuck).unwrap().handle.fail_clear_breakpoint = true;

        assert_eq!(inf.unset_hw_breakpoint(CODE), Err(BreakpointError::Thread));
        assert_eq!(
            inf.unset_hw_watchpoint(0x8000, WatchKind::Write, 8),
            Err(BreakpointError::Thread)
        );

        // both slots are freed, and the healthy thread was cleared
        assert_eq!(inf.breakpoints().hw_breakpoints().count(), 0);
        assert_eq!(inf.breakpoints().watchpoints().count(), 0);
        let (_, healthy) = inf.threads().next().unwrap();
        assert!(healthy.handle().slots.iter().all(Option::is_none));
        assert_eq!(
            inf.unset_hw_breakpoint(CODE),
            Err(BreakpointError::NotFound)
        );
    }

    #[test]
    fn hw_slots_exhaust() {
        let (mut reg, pid) = setup(1);
        let inf = reg.inferior_mut(pid).unwrap();
        for i in 0..AArch64::NUM_HW_BREAKPOINTS as u64 {
            inf.set_hw_breakpoint(CODE + i * 4).unwrap();
        }
        assert_eq!(
            inf.set_hw_breakpoint(CODE + 0x100),
            Err(BreakpointError::NoFreeSlot)
        );
    }

    #[test]
    fn watchpoints_programmed_onto_new_threads() {
        let (mut reg, pid) = setup(1);
        let inf = reg.inferior_mut(pid).unwrap();
        inf.set_hw_watchpoint(0x8000, WatchKind::Write, 8).unwrap();
        inf.set_hw_watchpoint(0x9000, WatchKind::ReadWrite, 4).unwrap();

        let t = reg.register_thread(pid, 99, MockThread::default()).unwrap();
        let handle = reg.thread(t).unwrap().handle();
        let first = AArch64::FIRST_HW_WATCHPOINT;
        assert_eq!(
            handle.slots[first],
            Some(SlotState {
                addr: 0x8000,
                kind: HwBreakpointKind::Data {
                    access: WatchKind::Write,
                    size: 8
                }
            })
        );
        assert_eq!(
            handle.slots[first + 1],
            Some(SlotState {
                addr: 0x9000,
                kind: HwBreakpointKind::Data {
                    access: WatchKind::ReadWrite,
                    size: 4
                }
            })
        );

        let table = reg.inferior(pid).unwrap().breakpoints();
        assert_eq!(
            table.watchpoint_at_slot(first + 1).map(|wp| wp.access),
            Some(WatchKind::ReadWrite)
        );
        assert!(table.watchpoint_at_slot(first + 2).is_none());
        assert!(table.watchpoint_at_slot(0).is_none());
    }

    #[test]
    fn program_thread_rolls_back() {
        let (mut reg, pid) = setup(1);
        let inf = reg.inferior_mut(pid).unwrap();
        inf.set_hw_breakpoint(CODE).unwrap();
        inf.set_hw_breakpoint(CODE + 4).unwrap();
        inf.set_hw_watchpoint(0x8000, WatchKind::Write, 8).unwrap();

        let mut handle = MockThread::default();
        handle.fail_slot = Some(AArch64::FIRST_HW_WATCHPOINT);
        assert!(inf
            .breakpoints()
            .program_thread::<MockTarget>(&mut handle)
            .is_err());
        assert!(handle.slots.iter().all(Option::is_none));

        let mut handle = MockThread::default();
        inf.breakpoints()
            .program_thread::<MockTarget>(&mut handle)
            .unwrap();
        assert_eq!(handle.slots.iter().flatten().count(), 3);
    }

    #[test]
    fn watchpoint_sizes() {
        let (mut reg, pid) = setup(1);
        let inf = reg.inferior_mut(pid).unwrap();
        assert_eq!(
            inf.set_hw_watchpoint(0x8000, WatchKind::Read, 3),
            Err(BreakpointError::InvalidSize)
        );
        assert_eq!(
            inf.set_hw_watchpoint(0x8000, WatchKind::Read, 16),
            Err(BreakpointError::InvalidSize)
        );
        inf.set_hw_watchpoint(0x8000, WatchKind::Read, 1).unwrap();

        // unset must match the access type
        assert_eq!(
            inf.unset_hw_watchpoint(0x8000, WatchKind::Write, 1),
            Err(BreakpointError::NotFound)
        );
        inf.unset_hw_watchpoint(0x8000, WatchKind::Read, 1).unwrap();
    }

    #[test]
    fn single_step_toggles_are_idempotent() {
        let (mut reg, _) = setup(1);
        let t = reg.threads().next().unwrap();
        let thread = reg.thread_mut(t).unwrap();

        assert_eq!(thread.enable_single_step().unwrap(), true);
        assert_eq!(thread.enable_single_step().unwrap(), false);
        assert_eq!(thread.handle().single_step_calls, 1);
        assert!(thread.handle().single_step);

        assert_eq!(thread.disable_single_step().unwrap(), true);
        assert_eq!(thread.disable_single_step().unwrap(), false);
        assert_eq!(thread.handle().single_step_calls, 2);
        assert!(!thread.flags().contains(ThreadFlags::SINGLE_STEP));
    }

    #[test]
    fn clear_debug_state_removes_everything() {
        let (mut reg, pid) = setup(2);
        let inf = reg.inferior_mut(pid).unwrap();
        inf.set_sw_breakpoint(CODE).unwrap();
        inf.set_hw_breakpoint(CODE + 4).unwrap();
        inf.set_hw_watchpoint(0x8000, WatchKind::Write, 8).unwrap();
        for (_, t) in inf.threads.iter_mut() {
            t.enable_single_step().unwrap();
        }

        inf.clear_debug_state();

        assert_eq!(inf.address_space.peek(CODE), 0x1122_3344_5566_7788);
        assert_eq!(inf.breakpoints().sw_breakpoints().count(), 0);
        assert_eq!(inf.breakpoints().hw_breakpoints().count(), 0);
        assert_eq!(inf.breakpoints().watchpoints().count(), 0);
        for (_, t) in inf.threads() {
            assert!(t.handle().slots.iter().all(Option::is_none));
            assert!(!t.handle().single_step);
        }
    }
}
