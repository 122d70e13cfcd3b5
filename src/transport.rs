use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::{check_address, Credentials, Error, Event, Logger, Message, Result};

pub struct Config {
    pub(crate) retries: u32,
    pub(crate) outbox: Option<String>,
}

impl Config {
    pub fn new() -> Config {
        Config {
            retries: 0,
            outbox: None,
        }
    }
    pub fn retries(&mut self, value: u32) -> &mut Config {
        self.retries = value;
        self
    }
    pub fn outbox(&mut self, dir: String) -> &mut Config {
        self.outbox = Some(dir);
        self
    }
    pub fn outbox_dir(&self) -> Option<&str> {
        self.outbox.as_deref()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

/// Addresses a transport needs for MAIL FROM and RCPT TO.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub from: Option<String>,
    pub to: Vec<String>,
}

impl From<&Message> for Envelope {
    fn from(message: &Message) -> Self {
        Envelope {
            from: message.sender().map(str::to_string),
            to: message.recipients().to_vec(),
        }
    }
}

/// Whatever actually puts a rendered message on the wire.
pub trait Transport {
    fn deliver(
        &mut self,
        envelope: &Envelope,
        credentials: Option<&Credentials>,
        payload: &[u8],
    ) -> Result<()>;
}

/// Drops each payload into `<dir>/<n>.eml`. Numbering continues after the
/// highest `<n>.eml` already in the directory, existing files are never
/// overwritten.
pub struct FileTransport {
    dir: PathBuf,
    next: usize,
    count: usize,
}

fn last_number(dir: &Path) -> Result<usize> {
    let entries = fs::read_dir(dir).map_err(|_| Error::File(dir.display().to_string()))?;
    Ok(entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            entry
                .file_name()
                .to_str()?
                .strip_suffix(".eml")?
                .parse::<usize>()
                .ok()
        })
        .max()
        .unwrap_or(0))
}

impl FileTransport {
    pub fn new(dir: impl Into<PathBuf>) -> Result<FileTransport> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|_| Error::File(dir.display().to_string()))?;
        let next = last_number(&dir)? + 1;
        Ok(FileTransport {
            dir,
            next,
            count: 0,
        })
    }
    pub fn delivered(&self) -> usize {
        self.count
    }
}

impl Transport for FileTransport {
    fn deliver(
        &mut self,
        _envelope: &Envelope,
        _credentials: Option<&Credentials>,
        payload: &[u8],
    ) -> Result<()> {
        loop {
            let path = self.dir.join(format!("{}.eml", self.next));
            self.next += 1;
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(mut file) => {
                    file.write_all(payload)
                        .map_err(|e| Error::Transport(e.to_string()))?;
                    self.count += 1;
                    return Ok(());
                }
                // another writer got there first
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(Error::Transport(e.to_string())),
            }
        }
    }
}

pub struct Outbox<T, L>
where
    T: Transport,
    L: Logger,
{
    config: Config,
    transport: T,
    logger: L,
}

impl<T, L> Outbox<T, L>
where
    T: Transport,
    L: Logger,
{
    pub fn new(transport: T, config: Config, logger: L) -> Outbox<T, L> {
        Outbox {
            config,
            transport,
            logger,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn check_envelope(envelope: &Envelope) -> Result<()> {
        if envelope.to.is_empty() {
            return Err(Error::NoRecipients);
        }
        if let Some(from) = envelope.from.as_ref() {
            check_address(from)?;
        }
        for to in envelope.to.iter() {
            check_address(to)?;
        }
        Ok(())
    }

    fn try_send(&mut self, message: &Message) -> Result<()> {
        let envelope = Envelope::from(message);
        Self::check_envelope(&envelope)?;
        let payload = message.to_bytes();
        let credentials = message.credentials();
        self.logger.event(Event::Rendered {
            subject: message.subject().to_string(),
            size: payload.len(),
        });

        let mut retries = self.config.retries;
        loop {
            match self
                .transport
                .deliver(&envelope, credentials.as_ref(), &payload)
            {
                Ok(_) => return Ok(()),
                Err(e) if e.retriable() && retries > 0 => {
                    retries -= 1;
                    self.logger.event(Event::Retry);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Validates and renders the message once, then hands it to the
    /// transport, retrying only the delivery.
    pub fn send(&mut self, message: &Message) -> Result<()> {
        let subject = message.subject().to_string();
        let to = message.recipients().join(",");
        match self.try_send(message) {
            Ok(_) => {
                self.logger.event(Event::Sent { subject, to });
                Ok(())
            }
            Err(e) => {
                self.logger.event(Event::Failed {
                    subject,
                    to,
                    error: e.clone(),
                });
                Err(e)
            }
        }
    }
}
