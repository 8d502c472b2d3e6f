use super::prelude::*;

use alloc::vec::Vec;

use crate::protocol::commands::_vCont::{Actions, VContAction, VContKind};
use crate::protocol::common::thread_id::{IdKind, ThreadId};
use crate::target::registry::{ThreadFlags, ThreadRef};

impl<T: Target> GdbStubImpl<T> {
    /// Apply a `vCont` packet.
    ///
    /// Actions are applied left to right and the first action naming a thread
    /// wins. Before its own threads are applied, every action also resets the
    /// wakeup flag of all not-yet-handled threads: a step clears it (only the
    /// stepped threads run), a continue sets it.
    pub(super) fn vcont(
        &mut self,
        res: &mut ResponseWriter<'_>,
        actions: Actions<'_>,
    ) -> Result<HandlerStatus, CapacityError> {
        let mut parsed: Vec<VContAction> = Vec::new();
        for action in actions.iter() {
            match action {
                Some(action) => parsed.push(action),
                None => {
                    res.write_str("E04")?;
                    return Ok(HandlerStatus::Handled);
                }
            }
        }

        let mut handled: Vec<ThreadRef> = Vec::new();
        for action in parsed {
            let step = action.kind.is_step();
            if let VContKind::ContinueWithSig(sig) | VContKind::StepWithSig(sig) = action.kind {
                debug!("ignoring signal {:#x} in vCont action", sig);
            }

            for (thread, t) in self.registry.threads_mut() {
                if !handled.contains(&thread) {
                    t.flags.set(ThreadFlags::WAKEUP, !step);
                }
            }

            for thread in self.vcont_targets(action.thread) {
                if handled.contains(&thread) {
                    continue;
                }
                let t = match self.registry.thread_mut(thread) {
                    Some(t) => t,
                    None => continue,
                };

                let toggled = if step {
                    t.enable_single_step()
                } else {
                    t.disable_single_step()
                };
                if let Err(e) = toggled {
                    warn!("could not configure single-step on {}: {:?}", thread, e);
                }

                t.flags.insert(ThreadFlags::WAKEUP);
                handled.push(thread);
            }
        }

        Ok(HandlerStatus::Resume)
    }

    fn vcont_targets(&self, id: Option<ThreadId>) -> Vec<ThreadRef> {
        let id = match id {
            Some(id) => id,
            None => return self.registry.threads().collect(),
        };

        match (id.pid, id.tid) {
            (Some(IdKind::All), _) | (None, IdKind::All) => self.registry.threads().collect(),
            (Some(IdKind::WithId(pid)), IdKind::All) => self
                .registry
                .threads()
                .filter(|thread| thread.pid == pid)
                .collect(),
            _ => match self.registry.resolve(id) {
                Some(thread) => alloc::vec![thread],
                None => {
                    warn!("vCont: unknown thread {:?}", id);
                    Vec::new()
                }
            },
        }
    }

    /// Remove every breakpoint, watchpoint and single-step setting, then let
    /// every thread run.
    pub(super) fn detach(&mut self) {
        for (_, inferior) in self.registry.inferiors_mut() {
            inferior.clear_debug_state();
        }
        for (_, t) in self.registry.threads_mut() {
            t.flags.insert(ThreadFlags::WAKEUP);
        }
        self.pending.clear();
        self.registry.resume_woken();
    }
}

#[cfg(test)]
mod tests {
    use crate::stub::tests::{session, Session};
    use crate::stub::SessionEvent;
    use crate::target::registry::ThreadFlags;

    fn three_threads() -> Session {
        let mut s = session();
        let pid = s.add_inferior(0x10);
        for native in 0..3 {
            s.add_thread(pid, native);
        }
        s
    }

    #[test]
    fn step_one_continue_the_rest() {
        let mut s = three_threads();
        s.interrupt();

        assert_eq!(s.send("vCont;s:p1.2;c"), Some(SessionEvent::Resumed));
        assert_eq!(s.wire(), "+");

        for tid in 1..=3 {
            let t = s.thread_mut(1, tid);
            assert_eq!(t.single_step, tid == 2, "thread {}", tid);
            assert!(!t.suspended, "thread {}", tid);
            assert_eq!(t.resume_calls, 1);
        }
        assert!(s.stub.is_running());
    }

    #[test]
    fn step_only_leaves_others_suspended() {
        let mut s = three_threads();
        s.interrupt();

        assert_eq!(s.send("vCont;s:p1.3"), Some(SessionEvent::Resumed));
        assert!(s.thread_mut(1, 1).suspended);
        assert!(s.thread_mut(1, 2).suspended);
        assert!(!s.thread_mut(1, 3).suspended);
        assert!(s.thread_mut(1, 3).single_step);
    }

    #[test]
    fn first_action_wins() {
        let mut s = three_threads();
        s.interrupt();

        s.send("vCont;c:p1.1;s:p1.1;s:p-1.-1");
        assert!(!s.thread_mut(1, 1).single_step);
        assert!(s.thread_mut(1, 2).single_step);
        assert!(s.thread_mut(1, 3).single_step);
        for tid in 1..=3 {
            assert!(!s.thread_mut(1, tid).suspended);
        }
    }

    #[test]
    fn continue_clears_previous_step() {
        let mut s = three_threads();
        s.interrupt();
        s.send("vCont;s:p1.1");
        assert!(s.thread_mut(1, 1).single_step);

        s.interrupt();
        s.send("vCont;c");
        assert!(!s.thread_mut(1, 1).single_step);
        assert_eq!(s.thread_mut(1, 1).single_step_calls, 2);
    }

    #[test]
    fn whole_process_actions() {
        let mut s = three_threads();
        let other = s.add_inferior(0x20);
        s.add_thread(other, 0);
        s.interrupt();

        s.send("vCont;s:p2.-1");
        assert!(s.thread_mut(2, 1).single_step);
        assert!(!s.thread_mut(2, 1).suspended);
        for tid in 1..=3 {
            assert!(s.thread_mut(1, tid).suspended);
        }
    }

    #[test]
    fn malformed_actions() {
        let mut s = three_threads();
        s.interrupt();
        assert_eq!(s.request("vCont;x"), "E04");
        assert_eq!(s.request("vCont;c:zz"), "E04");
        assert_eq!(s.request("vCont"), "E04");
        for tid in 1..=3 {
            assert!(s.thread_mut(1, tid).suspended);
        }
    }

    #[test]
    fn wakeup_flags_are_consumed() {
        let mut s = three_threads();
        s.interrupt();
        s.send("vCont;c");
        for thread in s.stub.registry().threads() {
            let flags = s.stub.registry().thread(thread).unwrap().flags();
            assert!(!flags.contains(ThreadFlags::WAKEUP));
        }
    }
}
