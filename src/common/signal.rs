/// Signal numbers defined by the GDB Remote Serial Protocol.
///
/// Only the signals the stub actually reports are named here. See
/// <https://github.com/bminor/binutils-gdb/blob/master/include/gdb/signals.def>
/// for the full list.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Signal(pub u8);

#[allow(clippy::upper_case_acronyms)]
#[rustfmt::skip]
impl Signal {
    #[doc = "Interrupt"]                       pub const SIGINT:     Self = Self(2);
    #[doc = "Trace/breakpoint trap"]           pub const SIGTRAP:    Self = Self(5);
    #[doc = "Aborted"]                         pub const SIGABRT:    Self = Self(6);
}

impl core::fmt::Display for Signal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        #[rustfmt::skip]
        let s = match *self {
            Signal::SIGINT              => "SIGINT - Interrupt",
            Signal::SIGTRAP             => "SIGTRAP - Trace/breakpoint trap",
            Signal::SIGABRT             => "SIGABRT - Aborted",
            _                           => return write!(f, "signal {}", self.0),
        };

        write!(f, "{}", s)
    }
}
