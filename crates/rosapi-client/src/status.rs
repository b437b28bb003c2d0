use bitflags::bitflags;

bitflags! {
    /// Channel lifecycle flags.
    ///
    /// Several flags legitimately coexist: a channel being closed while
    /// commands are still draining is `RUNNING | CLOSING`. `CLOSED` is
    /// terminal and assigned exclusively.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChannelStatus: u8 {
        /// Opened, no command issued yet.
        const OPEN    = 0b00_0001;
        /// At least one command is pending.
        const RUNNING = 0b00_0010;
        /// The most recent command has settled.
        const DONE    = 0b00_0100;
        /// Close requested; draining pending commands.
        const CLOSING = 0b00_1000;
        /// Fully closed. Terminal.
        const CLOSED  = 0b01_0000;
        /// The peer sent `!fatal` on this channel.
        const FATAL   = 0b10_0000;
    }
}

/// Connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Login in progress.
    Connecting,
    /// Authenticated; the dispatcher is running.
    Connected,
    /// Teardown in progress.
    Closing,
    /// The event stream terminated with an error.
    Error,
    /// Fully closed.
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closing_coexists_with_running() {
        let mut status = ChannelStatus::OPEN;
        status.insert(ChannelStatus::RUNNING);
        status.insert(ChannelStatus::CLOSING);

        assert!(status.contains(ChannelStatus::RUNNING));
        assert!(status.contains(ChannelStatus::CLOSING));
        assert!(!status.contains(ChannelStatus::CLOSED));
    }
}
