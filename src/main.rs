mod logger;

use logger::FileLogger;
use smtp_msg::{Error, FileTransport, MailFile, Message, Outbox};
use std::io::Write;

fn usage() -> ! {
    eprintln!("usage: smtp-msg <mail.toml>");
    std::process::exit(2);
}

/// Writes each payload byte for byte, each one followed by a line holding a
/// single `.` as in the DATA phase of SMTP.
fn write_messages(out: &mut impl Write, messages: &[Message]) -> std::io::Result<()> {
    for message in messages.iter() {
        out.write_all(&message.to_bytes())?;
        out.write_all(b".\r\n")?;
    }
    out.flush()
}

fn run(path: &str) -> Result<(), Error> {
    let (messages, config, logfile) = MailFile::load(path)?.destruct()?;

    match config.outbox_dir().map(str::to_string) {
        Some(dir) => {
            let logger = FileLogger::new(logfile)?;
            let mut outbox = Outbox::new(FileTransport::new(dir)?, config, logger);
            let mut failed = None;
            for message in messages.iter() {
                if let Err(e) = outbox.send(message) {
                    failed = Some(e);
                }
            }
            failed.map_or(Ok(()), Err)
        }
        None => write_messages(&mut std::io::stdout().lock(), &messages)
            .map_err(|e| Error::Transport(e.to_string())),
    }
}

fn main() {
    let mut args = std::env::args().skip(1);
    let path = match (args.next(), args.next()) {
        (Some(path), None) => path,
        _ => usage(),
    };
    if let Err(e) = run(&path) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
