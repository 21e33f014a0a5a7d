//! Caller supplied PO command

use calypso_apdu_core::{Command, Response, StatusWord};

use crate::{Result, commands::CommandKind};

/// A raw frame the catalog has no builder for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomCommand {
    name: String,
    command: Command,
    sendable_in_session: bool,
    success_codes: Vec<StatusWord>,
}

impl CustomCommand {
    /// Wrap a frame, only `90 00` being successful
    pub fn new(name: impl Into<String>, command: Command) -> Self {
        Self {
            name: name.into(),
            command,
            sendable_in_session: false,
            success_codes: Vec::new(),
        }
    }

    /// Allow the command inside a secure session
    pub fn sendable_in_session(mut self) -> Self {
        self.sendable_in_session = true;
        self
    }

    /// Accept an extra status word as success
    pub fn with_success_code(mut self, status: impl Into<StatusWord>) -> Self {
        self.success_codes.push(status.into());
        self
    }

    /// Caller given name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the command may be digested in a secure session
    pub const fn is_sendable_in_session(&self) -> bool {
        self.sendable_in_session
    }

    /// The wrapped frame
    pub fn build(&self) -> Command {
        self.command.clone()
    }

    /// Check the response and hand it back
    pub fn parse(&self, response: &Response) -> Result<Response> {
        CommandKind::Custom
            .descriptor()
            .check(response, &self.success_codes)?;
        Ok(response.clone())
    }
}
