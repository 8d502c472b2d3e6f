mod prelude {
    pub use core::convert::TryFrom;

    pub use super::ParseCommand;
    pub use crate::protocol::common::hex::{decode_hex, is_hex};
    pub use crate::protocol::common::thread_id::{IdKind, ThreadId};
}

/// Parse a command from the body of a packet (i.e: with the command prefix
/// already stripped).
pub trait ParseCommand<'a>: Sized {
    /// Try to extract a command from the packet body.
    fn from_packet(body: &'a [u8]) -> Option<Self>;
}

macro_rules! prefix_match {
    (
        match $val:expr => [$name:ident|$rest:ident] {
            $($prefix:literal => $arm:block)*
            _ => $other:block
        }
    ) => {{
        let $name;
        let $rest;
        match $val {
            $(_ if $val.starts_with($prefix.as_bytes()) => {
                $name = &$val[..$prefix.len()];
                $rest = &$val[$prefix.len()..];
                $arm
            })*
            _ => $other
        }
    }};
}

macro_rules! commands {
    ($($name:literal => $mod:ident::$command:ident$(<$lifetime:lifetime>)?,)*) => {
        $(
            #[allow(non_snake_case, non_camel_case_types)]
            pub mod $mod;
        )*
        $(pub use $mod::$command;)*

        /// GDB commands
        #[allow(non_camel_case_types, missing_docs)]
        #[derive(Debug)]
        pub enum Command<'a> {
            $($command($command<$($lifetime)?>),)*
            Unknown(&'a [u8]),
        }

        impl<'a> Command<'a> {
            /// Parse a packet body into a command.
            pub fn from_packet_body(body: &'a [u8]) -> Result<Command<'a>, CommandParseError<'a>> {
                if body.is_empty() {
                    return Err(CommandParseError::Empty);
                }

                let command = prefix_match! {
                    match body => [name | rest] {
                        $($name => {
                            let cmd = $command::from_packet(rest)
                                .ok_or(CommandParseError::MalformedCommand(name))?;
                            Command::$command(cmd)
                        })*
                        _ => { Command::Unknown(body) }
                    }
                };

                Ok(command)
            }
        }
    };
}

/// Command parse error
#[derive(Debug, PartialEq, Eq)]
pub enum CommandParseError<'a> {
    /// The packet had an empty body.
    Empty,
    /// The command prefix was recognized, but its arguments were malformed.
    /// Contains the command prefix.
    MalformedCommand(&'a [u8]),
}

commands! {
    "?" => question_mark::QuestionMark,
    "D" => _d_upcase::D,
    "g" => _g::g,
    "G" => _g_upcase::G<'a>,
    "H" => _h_upcase::H,
    "m" => _m::m,
    "M" => _m_upcase::M<'a>,
    "qAttached" => _qAttached::qAttached,
    "qC" => _qC::qC,
    "qfThreadInfo" => _qfThreadInfo::qfThreadInfo,
    "qsThreadInfo" => _qsThreadInfo::qsThreadInfo,
    "qSupported" => _qSupported::qSupported<'a>,
    "qSymbol" => _qSymbol::qSymbol,
    "qTStatus" => _qTStatus::qTStatus,
    "T" => _t_upcase::T,
    "z" => _z::z,
    "Z" => _z_upcase::Z,

    // Order Matters (because of prefix matching)
    "vCont?" => vCont_question_mark::vContQuestionMark,
    "vCont" => _vCont::vCont<'a>,
}

pub mod breakpoint;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_command() {
        match Command::from_packet_body(b"qOffsets") {
            Ok(Command::Unknown(body)) => assert_eq!(body, b"qOffsets"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn empty_body() {
        assert_eq!(
            Command::from_packet_body(b"").unwrap_err(),
            CommandParseError::Empty
        );
    }

    #[test]
    fn malformed_reports_prefix() {
        assert_eq!(
            Command::from_packet_body(b"mzz,4").unwrap_err(),
            CommandParseError::MalformedCommand(b"m")
        );
    }

    #[test]
    fn vcont_query_before_vcont() {
        assert!(matches!(
            Command::from_packet_body(b"vCont?"),
            Ok(Command::vContQuestionMark(_))
        ));
        assert!(matches!(
            Command::from_packet_body(b"vCont;c"),
            Ok(Command::vCont(_))
        ));
    }

    #[test]
    fn longest_q_prefixes() {
        assert!(matches!(
            Command::from_packet_body(b"qSupported:multiprocess+"),
            Ok(Command::qSupported(_))
        ));
        assert!(matches!(
            Command::from_packet_body(b"qSymbol::"),
            Ok(Command::qSymbol(_))
        ));
        assert!(matches!(
            Command::from_packet_body(b"qC"),
            Ok(Command::qC(_))
        ));
    }
}
