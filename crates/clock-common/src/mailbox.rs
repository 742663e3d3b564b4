//! Command mailbox between the command endpoints and the tick loop.
//!
//! Each [`CommandKind`] owns one slot. Posting overwrites any unconsumed
//! command of the same kind, so at most one command per kind is pending.
//! The tick loop drains every slot once per tick.

use crate::snapshot::{Command, CommandKind};
use std::sync::Mutex;
use tracing::debug;

/// Per-kind single-slot command mailbox.
#[derive(Debug, Default)]
pub struct CommandMailbox {
    slots: Mutex<[Option<Command>; CommandKind::COUNT]>,
}

impl CommandMailbox {
    /// Create an empty mailbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a command, replacing a pending command of the same kind.
    ///
    /// Returns the replaced command, if any.
    pub fn post(&self, command: Command) -> Option<Command> {
        let kind = command.kind();
        let replaced = match self.slots.lock() {
            Ok(mut slots) => slots[kind.index()].replace(command),
            Err(poisoned) => poisoned.into_inner()[kind.index()].replace(command),
        };
        if let Some(ref old) = replaced {
            debug!(%kind, replaced = %old, "Overwrote pending command");
        }
        replaced
    }

    /// Take every pending command in application order, leaving the mailbox empty.
    pub fn take_pending(&self) -> Vec<Command> {
        let mut slots = match self.slots.lock() {
            Ok(slots) => slots,
            Err(poisoned) => poisoned.into_inner(),
        };
        CommandKind::ALL
            .iter()
            .filter_map(|kind| slots[kind.index()].take())
            .collect()
    }

    /// Check whether a command of `kind` is waiting.
    pub fn is_pending(&self, kind: CommandKind) -> bool {
        match self.slots.lock() {
            Ok(slots) => slots[kind.index()].is_some(),
            Err(poisoned) => poisoned.into_inner()[kind.index()].is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_mailbox() {
        let mailbox = CommandMailbox::new();
        assert!(mailbox.take_pending().is_empty());
        assert!(!mailbox.is_pending(CommandKind::Resync));
    }

    #[test]
    fn test_later_post_overwrites_same_kind() {
        let mailbox = CommandMailbox::new();
        assert!(mailbox
            .post(Command::SetAlarm { hour: 6, minute: 0 })
            .is_none());
        let replaced = mailbox.post(Command::SetAlarm { hour: 7, minute: 15 });
        assert_eq!(replaced, Some(Command::SetAlarm { hour: 6, minute: 0 }));

        assert_eq!(
            mailbox.take_pending(),
            vec![Command::SetAlarm { hour: 7, minute: 15 }]
        );
    }

    #[test]
    fn test_take_drains_in_kind_order() {
        let mailbox = CommandMailbox::new();
        mailbox.post(Command::ClearAlarm);
        mailbox.post(Command::Resync);
        mailbox.post(Command::SetTime {
            hour: 1,
            minute: 2,
            second: 3,
        });
        mailbox.post(Command::SetAlarm { hour: 8, minute: 30 });

        let kinds: Vec<_> = mailbox.take_pending().iter().map(Command::kind).collect();
        assert_eq!(kinds, CommandKind::ALL.to_vec());

        // Consumed-then-discarded
        assert!(mailbox.take_pending().is_empty());
    }

    #[test]
    fn test_is_pending() {
        let mailbox = CommandMailbox::new();
        mailbox.post(Command::Resync);
        assert!(mailbox.is_pending(CommandKind::Resync));
        assert!(!mailbox.is_pending(CommandKind::SetTime));
    }
}
