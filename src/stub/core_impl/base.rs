use super::prelude::*;

use alloc::vec;

use crate::arch::{Arch, Registers};
use crate::protocol::commands::_h_upcase::H;
use crate::protocol::commands::_qSupported::qSupported;
use crate::protocol::common::hex::hex_to_mem;
use crate::protocol::common::thread_id::{IdKind, ThreadId};
use crate::target::registry::ThreadRef;
use crate::target::ThreadControl;

impl<T: Target> GdbStubImpl<T> {
    pub(super) fn read_registers(&mut self, res: &mut ResponseWriter<'_>) -> Result<(), CapacityError> {
        let thread = match self.registry.current().and_then(|t| self.registry.thread_mut(t)) {
            Some(thread) => thread,
            None => return res.write_str("E01"),
        };

        let mut regs = <T::Arch as Arch>::Registers::default();
        if let Err(e) = thread.handle.read_registers(&mut regs) {
            warn!("failed to read registers: {:?}", e);
            return res.write_str("E04");
        }

        let mut err = Ok(());
        regs.gdb_serialize(|val| {
            if err.is_ok() {
                err = res.write_hex(val);
            }
        });
        err
    }

    pub(super) fn write_registers(
        &mut self,
        res: &mut ResponseWriter<'_>,
        vals: &[u8],
    ) -> Result<(), CapacityError> {
        let thread = match self.registry.current().and_then(|t| self.registry.thread_mut(t)) {
            Some(thread) => thread,
            None => return res.write_str("E01"),
        };

        let mut bytes = vec![0; vals.len() / 2];
        let mut regs = <T::Arch as Arch>::Registers::default();
        if hex_to_mem(vals, &mut bytes).is_err() || regs.gdb_deserialize(&bytes).is_err() {
            return res.write_str("E01");
        }

        match thread.handle.write_registers(&regs) {
            Ok(()) => res.write_str("OK"),
            Err(e) => {
                warn!("failed to write registers: {:?}", e);
                res.write_str("E03")
            }
        }
    }

    pub(super) fn q_supported(
        &mut self,
        res: &mut ResponseWriter<'_>,
        cmd: qSupported<'_>,
    ) -> Result<(), CapacityError> {
        for feature in cmd.features.iter() {
            match feature {
                Some(feature) => debug!(
                    "client feature {}: {:?}",
                    core::str::from_utf8(feature.name).unwrap_or("<invalid>"),
                    feature.status
                ),
                None => debug!("malformed client feature"),
            }
        }

        res.write_str("PacketSize=")?;
        res.write_num(self.reply_capacity)?;
        res.write_str(
            ";QThreadEvents+;swbreak+;hwbreak+;vContSupported+;multiprocess+",
        )
    }

    pub(super) fn current_thread(&mut self, res: &mut ResponseWriter<'_>) -> Result<(), CapacityError> {
        if let Some(thread) = self.registry.current() {
            res.write_str("QC")?;
            res.write_thread_id(thread.pid, thread.tid)?;
        }
        Ok(())
    }

    pub(super) fn thread_info_first(
        &mut self,
        res: &mut ResponseWriter<'_>,
    ) -> Result<(), CapacityError> {
        self.thread_list.clear();
        self.thread_list.extend(self.registry.threads());
        self.thread_list_pos = 0;
        self.thread_info_next(res)
    }

    /// Write as many thread ids as fit into one reply, or `l` once the list
    /// is exhausted.
    pub(super) fn thread_info_next(
        &mut self,
        res: &mut ResponseWriter<'_>,
    ) -> Result<(), CapacityError> {
        if self.thread_list_pos >= self.thread_list.len() {
            return res.write(b'l');
        }

        res.write(b'm')?;
        let mut first = true;
        while let Some(&thread) = self.thread_list.get(self.thread_list_pos) {
            let mark = res.len();
            if let Err(e) = write_list_entry(res, first, thread) {
                if first {
                    return Err(e);
                }
                res.truncate(mark);
                break;
            }
            first = false;
            self.thread_list_pos += 1;
        }
        Ok(())
    }

    pub(super) fn select_thread(&mut self, res: &mut ResponseWriter<'_>, cmd: H) -> Result<(), CapacityError> {
        let id = match cmd.thread {
            Some(id) => id,
            None => return res.write_str("E02"),
        };

        // `-1` / `0` keep the current selection
        let specific = matches!(id.pid, Some(IdKind::WithId(_))) || matches!(id.tid, IdKind::WithId(_));
        if !specific {
            return res.write_str("OK");
        }

        match self.registry.resolve(id) {
            Some(thread) => {
                self.registry.set_current(thread);
                res.write_str("OK")
            }
            None => {
                warn!("H{:?}: unknown thread {:?}", cmd.kind, id);
                res.write_str("E02")
            }
        }
    }

    pub(super) fn thread_alive(
        &mut self,
        res: &mut ResponseWriter<'_>,
        id: ThreadId,
    ) -> Result<(), CapacityError> {
        if self.registry.resolve(id).is_some() {
            res.write_str("OK")?;
        }
        Ok(())
    }
}

fn write_list_entry(
    res: &mut ResponseWriter<'_>,
    first: bool,
    thread: ThreadRef,
) -> Result<(), CapacityError> {
    if !first {
        res.write(b',')?;
    }
    res.write_thread_id(thread.pid, thread.tid)
}
