use super::prelude::*;

use crate::arch::Arch;
use crate::protocol::commands::breakpoint::{BasicBreakpoint, BreakpointType};
use crate::target::breakpoints::BreakpointError;
use crate::target::WatchKind;

impl<T: Target> GdbStubImpl<T> {
    /// `Z` (`insert == true`) and `z` packets. Breakpoints always apply to the
    /// inferior of the current thread.
    pub(super) fn handle_breakpoint(
        &mut self,
        res: &mut ResponseWriter<'_>,
        bp: BasicBreakpoint,
        insert: bool,
    ) -> Result<(), CapacityError> {
        let inferior = match self
            .registry
            .current()
            .and_then(|t| self.registry.inferior_mut(t.pid))
        {
            Some(inferior) => inferior,
            None => return res.write_str("E01"),
        };

        let access = match bp.type_ {
            BreakpointType::WriteWatchpoint => Some(WatchKind::Write),
            BreakpointType::ReadWatchpoint => Some(WatchKind::Read),
            BreakpointType::AccessWatchpoint => Some(WatchKind::ReadWrite),
            BreakpointType::Software | BreakpointType::Hardware => None,
        };

        let result = match (bp.type_, access) {
            (_, Some(access)) if insert => inferior.set_hw_watchpoint(bp.addr, access, bp.kind),
            (_, Some(access)) => inferior.unset_hw_watchpoint(bp.addr, access, bp.kind),
            _ if bp.kind != <T::Arch as Arch>::BREAKPOINT_KIND => Err(BreakpointError::InvalidSize),
            (BreakpointType::Software, _) if insert => inferior.set_sw_breakpoint(bp.addr),
            (BreakpointType::Software, _) => inferior.unset_sw_breakpoint(bp.addr),
            _ if insert => inferior.set_hw_breakpoint(bp.addr),
            _ => inferior.unset_hw_breakpoint(bp.addr),
        };

        match result {
            Ok(()) => res.write_str("OK"),
            Err(e) => {
                warn!(
                    "{} {:?} at {:#x} failed: {}",
                    if insert { "inserting" } else { "removing" },
                    bp.type_,
                    bp.addr,
                    e
                );
                res.write_str("E01")
            }
        }
    }
}
