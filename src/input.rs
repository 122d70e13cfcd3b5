use std::fs;
use std::path::Path;

use serde_derive::Deserialize;

use crate::{Config, Error, Message, Result};

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MailConfig {
    pub retries: Option<u32>,
    pub logfile: Option<String>,
    pub outbox: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MailEntry {
    to: Vec<String>,
    subject: Option<String>,
    text: String,
    attach: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MailUser {
    pub address: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MailFile {
    pub user: MailUser,
    pub config: Option<MailConfig>,
    #[serde(rename = "mail")]
    pub mails: Option<Vec<MailEntry>>,
}

fn prompt_password(username: &String) -> Result<String> {
    println!("Enter password for {}:", username);
    rpassword::read_password().map_err(|e| Error::Config(e.to_string()))
}

fn path_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

impl MailConfig {
    pub fn destruct(self) -> (Config, Option<String>) {
        let mut config = Config::new();

        if let Some(value) = self.retries {
            config.retries(value);
        }
        if let Some(dir) = self.outbox {
            config.outbox(dir);
        }

        (config, self.logfile)
    }
}

impl MailEntry {
    fn into_message(
        self,
        user: &MailUser,
        credentials: Option<&(String, String)>,
    ) -> Result<Message> {
        let mut message = Message::new();
        message.set_from(user.address.as_str()).set_body(self.text);
        for to in self.to {
            message.add_recipient(to);
        }
        if let Some(subject) = self.subject {
            message.set_subject(subject);
        }
        if let Some((username, password)) = credentials {
            message.set_auth(username.as_str(), password.as_str());
        }
        if let Some(path) = self.attach {
            let data = fs::read(&path).map_err(|_| Error::File(path.clone()))?;
            message.set_attachment(path_file_name(&path), data);
        }
        Ok(message)
    }
}

impl MailFile {
    pub fn load(path: &str) -> Result<MailFile> {
        let text = fs::read_to_string(path).map_err(|_| Error::File(path.to_string()))?;
        MailFile::parse(&text)
    }

    pub fn parse(text: &str) -> Result<MailFile> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Builds one `Message` per `[[mail]]` entry. When a username is given
    /// without a password the password is read from the terminal.
    pub fn destruct(mut self) -> Result<(Vec<Message>, Config, Option<String>)> {
        let (config, logfile) = if let Some(cfg) = self.config.take() {
            cfg.destruct()
        } else {
            (Config::new(), None)
        };

        let credentials = match self.user.username.clone() {
            Some(username) => {
                let password = match self.user.password.clone() {
                    Some(password) => password,
                    None => prompt_password(&username)?,
                };
                Some((username, password))
            }
            None => None,
        };

        let mut messages = vec![];
        if let Some(mut file_mails) = self.mails.take() {
            for m in file_mails.drain(..) {
                messages.push(m.into_message(&self.user, credentials.as_ref())?);
            }
        }
        Ok((messages, config, logfile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_messages_from_file() {
        let file = MailFile::parse(
            r#"
            [user]
            address = "a@x.io"
            username = "a"
            password = "pw"

            [config]
            retries = 3
            logfile = "mail.log"

            [[mail]]
            to = ["b@x.io", "c@x.io"]
            subject = "hi"
            text = "hello"

            [[mail]]
            to = ["d@x.io"]
            text = "no subject"
            "#,
        )
        .unwrap();
        let (messages, config, logfile) = file.destruct().unwrap();

        assert_eq!(config.retries, 3);
        assert_eq!(config.outbox_dir(), None);
        assert_eq!(logfile.as_deref(), Some("mail.log"));
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender(), Some("a@x.io"));
        assert_eq!(messages[0].recipients(), ["b@x.io", "c@x.io"]);
        assert_eq!(
            messages[0].render(),
            "To: b@x.io,c@x.io\r\nSubject: hi\r\nMIME-Version: 1.0\r\n\r\nhello\r\n"
        );
        assert_eq!(messages[1].subject(), "");
        assert_eq!(messages[1].credentials().unwrap().username, "a");
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = MailFile::parse(
            r#"
            [user]
            address = "a@x.io"
            nickname = "a"
            "#,
        );
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[test]
    fn reads_attachment_from_disk() {
        let path = std::env::temp_dir().join(format!("smtp-msg-attach-{}.txt", std::process::id()));
        fs::write(&path, "hello").unwrap();
        let text = format!(
            "[user]\naddress = \"a@x.io\"\n\n[[mail]]\nto = [\"b@x.io\"]\ntext = \"body\"\nattach = {:?}\n",
            path.display().to_string()
        );
        let (messages, _, _) = MailFile::parse(&text).unwrap().destruct().unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();

        assert_eq!(messages[0].attachment(), Some((name.as_str(), &b"hello"[..])));
        assert!(messages[0].credentials().is_none());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_attachment_is_a_file_error() {
        let text = "[user]\naddress = \"a@x.io\"\n\n[[mail]]\nto = []\ntext = \"\"\nattach = \"/nonexistent/smtp-msg/file.bin\"\n";
        let result = MailFile::parse(text).unwrap().destruct();
        assert!(matches!(
            result,
            Err(Error::File(path)) if path == "/nonexistent/smtp-msg/file.bin"
        ));
    }
}
