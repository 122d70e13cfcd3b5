mod input;
mod message;
mod transport;

use std::fmt;

pub use input::{MailConfig, MailEntry, MailFile, MailUser};
pub use message::{Message, BASE64_LINE_WIDTH, BOUNDARY};
pub use transport::{Config, Envelope, FileTransport, Outbox, Transport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    File(String),
    Config(String),
    MailBoxName(String),
    NoRecipients,
    Transport(String),
}

impl Error {
    pub fn retriable(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::File(path) => write!(f, "failed to read file: {}", path),
            Error::Config(reason) => write!(f, "invalid mail file: {}", reason),
            Error::MailBoxName(mailbox) => write!(f, "invalid email address <{}>", mailbox),
            Error::NoRecipients => write!(f, "message has no recipients"),
            Error::Transport(reason) => write!(f, "transport failed: {}", reason),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Rendered { subject: String, size: usize },
    Sent { subject: String, to: String },
    Failed { subject: String, to: String, error: Error },
    Retry,
}

pub trait Logger {
    fn event(&self, event: Event);
    fn disable(&mut self);
    fn enable(&mut self);
}

/// Logger that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn event(&self, _event: Event) {}
    fn disable(&mut self) {}
    fn enable(&mut self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: String, password: String) -> Credentials {
        Credentials { username, password }
    }
}

/// Loose syntax check for a mailbox. The message builder never calls this;
/// it is for callers and transports that want to reject bad addresses early.
pub fn check_address(address: &str) -> Result<()> {
    let re = regex::Regex::new(
        r"^([a-zA-Z0-9_+]([a-zA-Z0-9_+.\-]*[a-zA-Z0-9_+])?)@([a-zA-Z0-9]+([\-\.]{1}[a-zA-Z0-9]+)*\.[a-zA-Z]{2,63})$",
    )
    .map_err(|e| Error::Config(e.to_string()))?;
    if re.is_match(address) {
        Ok(())
    } else {
        Err(Error::MailBoxName(address.to_string()))
    }
}
