use smtp_msg::{Error, Event, Logger};
use std::cell::RefCell;
use std::fs;
use std::io::Write;

pub(crate) struct FileLogger {
    pub(crate) enabled: bool,
    pub(crate) file: Option<RefCell<fs::File>>,
}

impl FileLogger {
    fn open(path: &str) -> Result<fs::File, Error> {
        fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .map_err(|_| Error::File(path.to_string()))
    }
    pub(crate) fn none() -> FileLogger {
        FileLogger {
            enabled: true,
            file: None,
        }
    }
    pub(crate) fn new(path: Option<String>) -> Result<FileLogger, Error> {
        match path {
            Some(logfile) => Ok(FileLogger {
                enabled: true,
                file: Some(RefCell::new(FileLogger::open(&logfile)?)),
            }),
            None => Ok(FileLogger::none()),
        }
    }

    fn record(&self, line: &str) {
        if let Some(file) = self.file.as_ref() {
            let _ = writeln!(file.borrow_mut(), "{}", line);
        }
    }

    fn event_rendered(&self, subject: String, size: usize) {
        self.record(&format!("rendered [{}] ({} bytes)", subject, size));
    }
    fn event_mail_sent(&self, subject: String, to: String) {
        let line = format!("--> sent [{}] to <{}>.", subject, to);
        println!("{}", line);
        self.record(&line);
    }
    fn event_mail_failed(&self, subject: String, to: String, error: Error) {
        let line = format!("--> sending [{}] to <{}> failed: {}", subject, to, error);
        eprintln!("{}", line);
        self.record(&line);
    }
    fn event_retrying(&self) {
        eprintln!("--> retrying...");
        self.record("--> retrying...");
    }
}

impl Logger for FileLogger {
    fn event(&self, event: Event) {
        if self.enabled {
            match event {
                Event::Rendered { subject, size } => self.event_rendered(subject, size),
                Event::Sent { subject, to } => self.event_mail_sent(subject, to),
                Event::Failed { subject, to, error } => self.event_mail_failed(subject, to, error),
                Event::Retry => self.event_retrying(),
            }
        }
    }

    fn disable(&mut self) {
        self.enabled = false;
    }

    fn enable(&mut self) {
        self.enabled = true;
    }
}

impl Drop for FileLogger {
    fn drop(&mut self) {
        if let Some(file) = self.file.as_ref() {
            let _ = file.borrow_mut().flush();
        }
    }
}
