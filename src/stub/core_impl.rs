use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::common::{NativeId, Signal};
use crate::conn::Connection;
use crate::protocol::commands::Command;
use crate::protocol::recv_packet::INTERRUPT;
use crate::protocol::send_packet::{frame_packet, transmit};
use crate::protocol::{split_sequence_id, CapacityError, CommandParseError, RecvEvent};
use crate::protocol::ResponseWriter;
use crate::target::registry::{Registry, RegistryError, ThreadRef};
use crate::target::Target;

use super::error::GdbStubError as Error;
use super::stop_reason::{Fault, StopReason};
use super::SessionEvent;

/// Common imports used by every command handler.
mod prelude {
    pub(super) use crate::protocol::{CapacityError, ResponseWriter};
    pub(super) use crate::stub::core_impl::GdbStubImpl;
    pub(super) use crate::stub::core_impl::HandlerStatus;
    pub(super) use crate::target::Target;
}

mod base;
mod breakpoints;
mod memory;
mod resume;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Every thread is suspended and GDB is driving the session.
    Idle,
    /// Threads with a pending wakeup have been resumed. The next stop event is
    /// reported straight away.
    Running,
}

pub enum HandlerStatus {
    Handled,
    /// The reply buffer is left untouched. Let the woken threads run.
    Resume,
    /// Debug state has been torn down and an `OK` rendered.
    Detach,
}

pub(crate) struct GdbStubImpl<T: Target> {
    registry: Registry<T>,
    state: State,

    reply: Vec<u8>,
    reply_capacity: usize,
    /// Last frame sent, kept around for retransmission.
    frame: Vec<u8>,
    awaiting_ack: bool,
    /// An interrupt arrived while `awaiting_ack`.
    interrupt_pending: bool,
    pending: VecDeque<StopReason>,

    // qfThreadInfo / qsThreadInfo paging
    thread_list: Vec<ThreadRef>,
    thread_list_pos: usize,
}

impl<T: Target> GdbStubImpl<T> {
    pub fn new(registry: Registry<T>, packet_size: usize) -> GdbStubImpl<T> {
        GdbStubImpl {
            registry,
            // the embedder starts its protection domains before GDB attaches
            state: State::Running,

            reply: Vec::with_capacity(packet_size),
            reply_capacity: packet_size,
            frame: Vec::with_capacity(packet_size + 4),
            awaiting_ack: false,
            interrupt_pending: false,
            pending: VecDeque::new(),

            thread_list: Vec::new(),
            thread_list_pos: 0,
        }
    }

    pub fn registry(&self) -> &Registry<T> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry<T> {
        &mut self.registry
    }

    pub fn is_running(&self) -> bool {
        self.state == State::Running
    }

    pub fn awaiting_ack(&self) -> bool {
        self.awaiting_ack
    }

    /// Handle a byte received while the last frame is unacknowledged.
    pub fn handle_ack<C: Connection>(
        &mut self,
        conn: &mut C,
        byte: u8,
    ) -> Result<(), Error<C::Error>> {
        if byte != b'+' {
            if byte == INTERRUPT {
                debug!("<-- interrupt while awaiting an ACK, deferred");
                self.interrupt_pending = true;
            }
            debug!("<-- {:?} instead of an ACK, retransmitting", byte as char);
            return transmit(conn, &self.frame).map_err(Error::ConnectionWrite);
        }

        self.awaiting_ack = false;
        if self.interrupt_pending {
            self.interrupt_pending = false;
            return self.interrupt(conn);
        }
        if self.state == State::Running {
            if let Some(stop) = self.pending.pop_front() {
                self.send_stop(conn, stop)?;
            }
        }
        Ok(())
    }

    pub fn handle_event<C: Connection>(
        &mut self,
        conn: &mut C,
        event: RecvEvent<'_>,
    ) -> Result<Option<SessionEvent>, Error<C::Error>> {
        match event {
            RecvEvent::Interrupt => {
                debug!("<-- interrupt packet");
                self.interrupt(conn)?;
                Ok(None)
            }
            RecvEvent::ChecksumMismatch {
                checksum,
                calculated,
            } => {
                warn!(
                    "packet checksum mismatch: expected {:02x?}, got {:02x}",
                    checksum, calculated
                );
                conn.write(b'-').map_err(Error::ConnectionWrite)?;
                conn.flush().map_err(Error::ConnectionWrite)?;
                Ok(None)
            }
            RecvEvent::Packet(body) => {
                let (seq, body) = split_sequence_id(body);
                conn.write(b'+').map_err(Error::ConnectionWrite)?;
                if let Some(seq) = seq {
                    conn.write_all(&seq).map_err(Error::ConnectionWrite)?;
                }
                conn.flush().map_err(Error::ConnectionWrite)?;

                self.handle_packet(conn, body)
            }
        }
    }

    /// Stop every thread and report `SIGINT`.
    fn interrupt<C: Connection>(&mut self, conn: &mut C) -> Result<(), Error<C::Error>> {
        self.registry.suspend_all();
        self.state = State::Idle;
        let mut res = ResponseWriter::new(&mut self.reply, self.reply_capacity);
        res.write(b'S')?;
        res.write_hex(Signal::SIGINT.0)?;
        self.send_reply(conn)
    }

    fn handle_packet<C: Connection>(
        &mut self,
        conn: &mut C,
        body: &[u8],
    ) -> Result<Option<SessionEvent>, Error<C::Error>> {
        let mut reply = core::mem::take(&mut self.reply);
        let status = {
            let mut res = ResponseWriter::new(&mut reply, self.reply_capacity);
            match Command::from_packet_body(body) {
                Ok(command) => self.handle_command(&mut res, command),
                Err(e) => handle_parse_error(&mut res, e).map(|_| HandlerStatus::Handled),
            }
        };
        self.reply = reply;

        match status? {
            HandlerStatus::Handled => {
                self.send_reply(conn)?;
                Ok(None)
            }
            HandlerStatus::Resume => self.resume(conn),
            HandlerStatus::Detach => {
                self.send_reply(conn)?;
                self.state = State::Running;
                trace!("session detached");
                Ok(Some(SessionEvent::Detached))
            }
        }
    }

    fn handle_command(
        &mut self,
        res: &mut ResponseWriter<'_>,
        command: Command<'_>,
    ) -> Result<HandlerStatus, CapacityError> {
        match command {
            Command::QuestionMark(_) => res.write_str("T05swbreak:;")?,
            Command::g(_) => self.read_registers(res)?,
            Command::G(cmd) => self.write_registers(res, cmd.vals)?,
            Command::m(cmd) => self.read_memory(res, cmd.addr, cmd.len)?,
            Command::M(cmd) => self.write_memory(res, cmd.addr, cmd.len, cmd.val)?,
            Command::qSupported(cmd) => self.q_supported(res, cmd)?,
            Command::qAttached(_) => res.write_str("1")?,
            Command::qC(_) => self.current_thread(res)?,
            Command::qfThreadInfo(_) => self.thread_info_first(res)?,
            Command::qsThreadInfo(_) => self.thread_info_next(res)?,
            Command::qSymbol(_) => res.write_str("OK")?,
            Command::qTStatus(_) => res.write_str("T0")?,
            Command::H(cmd) => self.select_thread(res, cmd)?,
            Command::T(cmd) => self.thread_alive(res, cmd.thread)?,
            Command::D(cmd) => {
                if let Some(pid) = cmd.pid {
                    debug!("detach from {:x} requested, detaching from everything", pid);
                }
                self.detach();
                res.write_str("OK")?;
                return Ok(HandlerStatus::Detach);
            }
            Command::vContQuestionMark(_) => res.write_str("vCont;c;C;s;S")?,
            Command::vCont(cmd) => return self.vcont(res, cmd.actions),
            Command::z(cmd) => self.handle_breakpoint(res, cmd.0, false)?,
            Command::Z(cmd) => self.handle_breakpoint(res, cmd.0, true)?,
            Command::Unknown(cmd) => {
                info!(
                    "Unknown command: {}",
                    core::str::from_utf8(cmd).unwrap_or("<invalid packet>")
                );
            }
        }

        Ok(HandlerStatus::Handled)
    }

    /// Let every thread flagged for wakeup run, unless a stop event is queued,
    /// in which case that event is reported instead.
    fn resume<C: Connection>(
        &mut self,
        conn: &mut C,
    ) -> Result<Option<SessionEvent>, Error<C::Error>> {
        if let Some(stop) = self.pending.pop_front() {
            debug!("reporting queued stop instead of resuming");
            self.send_stop(conn, stop)?;
            return Ok(None);
        }

        self.registry.resume_woken();
        self.state = State::Running;
        trace!("targets running");
        Ok(Some(SessionEvent::Resumed))
    }

    /// Frame and send whatever is in the reply buffer.
    fn send_reply<C: Connection>(&mut self, conn: &mut C) -> Result<(), Error<C::Error>> {
        frame_packet(&self.reply, &mut self.frame);
        transmit(conn, &self.frame).map_err(Error::ConnectionWrite)?;
        self.awaiting_ack = true;
        Ok(())
    }

    fn send_stop<C: Connection>(
        &mut self,
        conn: &mut C,
        stop: StopReason,
    ) -> Result<(), Error<C::Error>> {
        if let Some(thread) = stop.thread() {
            self.registry.set_current(thread);
        }
        self.state = State::Idle;
        stop.write_reply(&mut ResponseWriter::new(&mut self.reply, self.reply_capacity))?;
        self.send_reply(conn)
    }

    /// Report `stop` right away if GDB is waiting for one, or queue it.
    fn report_stop<C: Connection>(
        &mut self,
        conn: &mut C,
        stop: StopReason,
    ) -> Result<(), Error<C::Error>> {
        if self.state == State::Running && !self.awaiting_ack {
            self.send_stop(conn, stop)
        } else {
            debug!("queueing stop event {:?}", stop);
            self.pending.push_back(stop);
            Ok(())
        }
    }

    pub fn report_fault<C: Connection>(
        &mut self,
        conn: &mut C,
        inferior: NativeId,
        thread: NativeId,
        fault: Fault,
    ) -> Result<(), Error<C::Error>> {
        let faulting = self
            .registry
            .find_thread(inferior, thread)
            .ok_or(Error::UnknownFaultingThread { inferior, thread })?;

        self.registry.suspend_all();
        let stop = StopReason::from_fault(&self.registry, faulting, fault);
        self.report_stop(conn, stop)
    }

    pub fn thread_spawned<C: Connection>(
        &mut self,
        conn: &mut C,
        inferior: NativeId,
        parent: NativeId,
        child: NativeId,
        handle: T::Thread,
    ) -> Result<ThreadRef, Error<C::Error>> {
        let pid = self
            .registry
            .find_inferior(inferior)
            .ok_or(RegistryError::UnknownInferior)?;
        let parent = self
            .registry
            .find_thread(inferior, parent)
            .ok_or(RegistryError::UnknownThread)?;
        let child = self.registry.register_thread(pid, child, handle)?;

        self.registry.suspend_all();
        self.report_stop(conn, StopReason::Clone { parent, child })?;
        Ok(child)
    }

    pub fn thread_exited<C: Connection>(
        &mut self,
        conn: &mut C,
        inferior: NativeId,
        thread: NativeId,
    ) -> Result<(), Error<C::Error>> {
        let exited = self
            .registry
            .find_thread(inferior, thread)
            .ok_or(RegistryError::UnknownThread)?;

        self.registry.suspend_all();
        self.registry.mark_thread_exited(exited)?;
        self.report_stop(conn, StopReason::Exited(exited))
    }
}

fn handle_parse_error(
    res: &mut ResponseWriter<'_>,
    e: CommandParseError<'_>,
) -> Result<(), CapacityError> {
    let prefix = match e {
        CommandParseError::Empty => return Ok(()),
        CommandParseError::MalformedCommand(prefix) => prefix,
    };

    debug!(
        "malformed {} command",
        core::str::from_utf8(prefix).unwrap_or("<invalid>")
    );
    match prefix {
        b"m" | b"G" | b"H" | b"z" | b"Z" => res.write_str("E01"),
        b"M" => res.write_str("E02"),
        b"vCont" => res.write_str("E04"),
        // queries (and `T`) fall back to the empty "unsupported" reply
        _ => Ok(()),
    }
}
