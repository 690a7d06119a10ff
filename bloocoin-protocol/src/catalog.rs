//! The fixed table of commands the server understands.

use crate::error::ProtocolError;

/// Argument resolved from the caller's address.
pub const ARG_ADDR: &str = "addr";

/// Argument resolved from the caller's password.
pub const ARG_PWD: &str = "pwd";

/// A command name and the arguments it requires, besides `cmd` itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandDescriptor {
    pub name: &'static str,
    pub args: &'static [&'static str],
}

impl CommandDescriptor {
    /// Returns whether the command needs `addr` or `pwd`.
    pub fn requires_credentials(&self) -> bool {
        self.args.iter().any(|a| is_credential(a))
    }

    /// Returns whether `arg` is one of this command's required arguments.
    pub fn requires(&self, arg: &str) -> bool {
        self.args.contains(&arg)
    }
}

/// Returns whether `arg` is filled from credentials rather than caller arguments.
pub fn is_credential(arg: &str) -> bool {
    arg == ARG_ADDR || arg == ARG_PWD
}

const CATALOG: [CommandDescriptor; 8] = [
    // payload: difficulty
    CommandDescriptor {
        name: "get_coin",
        args: &[],
    },
    // payload: addr
    CommandDescriptor {
        name: "register",
        args: &["addr", "pwd"],
    },
    // payload: to, from, amount
    CommandDescriptor {
        name: "send_coin",
        args: &["to", "addr", "pwd", "amount"],
    },
    // payload: amount
    CommandDescriptor {
        name: "my_coins",
        args: &["addr", "pwd"],
    },
    // payload: hash
    CommandDescriptor {
        name: "check",
        args: &["winning_string", "winning_hash", "addr"],
    },
    CommandDescriptor {
        name: "transactions",
        args: &["addr", "pwd"],
    },
    // payload: amount
    CommandDescriptor {
        name: "total_coins",
        args: &[],
    },
    // payload: addr, amount
    CommandDescriptor {
        name: "check_addr",
        args: &["addr"],
    },
];

/// Looks up a command by exact, case-sensitive name.
pub fn describe(name: &str) -> Result<&'static CommandDescriptor, ProtocolError> {
    CATALOG
        .iter()
        .find(|d| d.name == name)
        .ok_or_else(|| ProtocolError::UnknownCommand(name.to_string()))
}

/// Returns every known command, in catalog order.
pub fn commands() -> &'static [CommandDescriptor] {
    &CATALOG
}
