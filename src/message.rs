use std::fmt;

use base64::{engine::general_purpose, Engine};

use crate::Credentials;

/// Boundary between the parts of a multipart message. It is a fixed literal,
/// receivers of this format match on it, so it carries no uniqueness.
pub const BOUNDARY: &str = "my-boundary-12345";

/// Width of the base64 lines in the attachment part.
pub const BASE64_LINE_WIDTH: usize = 76;

/// A mail message built up field by field and rendered to MIME text.
///
/// Setters take `&mut self` and hand it back so calls can be chained:
///
/// ```
/// let mut msg = smtp_msg::Message::new();
/// msg.set_from("a@x.io").add_recipient("b@x.io").set_subject("hi").set_body("hello");
/// assert!(msg.render().starts_with("To: b@x.io\r\nSubject: hi\r\n"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    from: Option<String>,
    to: Vec<String>,
    subject: String,
    body: Vec<u8>,
    user: Option<String>,
    pass: Option<String>,
    attachment: String,
    attach_data: Vec<u8>,
}

fn line(out: &mut Vec<u8>, text: &[u8]) {
    out.extend_from_slice(text);
    out.extend_from_slice(b"\r\n");
}

impl Message {
    pub fn new() -> Message {
        Message::default()
    }

    pub fn set_from(&mut self, address: impl Into<String>) -> &mut Message {
        self.from = Some(address.into());
        self
    }

    pub fn add_recipient(&mut self, address: impl Into<String>) -> &mut Message {
        self.to.push(address.into());
        self
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) -> &mut Message {
        self.subject = subject.into();
        self
    }

    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) -> &mut Message {
        self.body = body.into();
        self
    }

    /// Stores credentials for whoever ends up sending the message. They never
    /// appear in the rendered text.
    pub fn set_auth(
        &mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> &mut Message {
        self.user = Some(username.into());
        self.pass = Some(password.into());
        self
    }

    /// Replaces the attachment. Only one is kept.
    pub fn set_attachment(
        &mut self,
        filename: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> &mut Message {
        self.attachment = filename.into();
        self.attach_data = data.into();
        self
    }

    pub fn sender(&self) -> Option<&str> {
        self.from.as_deref()
    }

    pub fn recipients(&self) -> &[String] {
        &self.to
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.user, &self.pass) {
            (Some(username), Some(password)) => {
                Some(Credentials::new(username.clone(), password.clone()))
            }
            _ => None,
        }
    }

    /// Attachment name and data, if a named attachment is set.
    pub fn attachment(&self) -> Option<(&str, &[u8])> {
        if self.attachment.is_empty() {
            None
        } else {
            Some((self.attachment.as_str(), self.attach_data.as_slice()))
        }
    }

    /// Serializes headers and body as CRLF-terminated lines.
    ///
    /// The body bytes are copied verbatim: nothing is re-encoded and line
    /// breaks inside the body are not escaped.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();

        line(&mut out, format!("To: {}", self.to.join(",")).as_bytes());
        if !self.subject.is_empty() {
            line(&mut out, format!("Subject: {}", self.subject).as_bytes());
        }
        line(&mut out, b"MIME-Version: 1.0");

        if self.attachment.is_empty() {
            out.extend_from_slice(b"\r\n");
            line(&mut out, &self.body);
            return out;
        }

        line(
            &mut out,
            format!("Content-Type: multipart/mixed; boundary={}", BOUNDARY).as_bytes(),
        );
        line(&mut out, format!("\r\n--{}", BOUNDARY).as_bytes());
        line(&mut out, b"Content-Type: text/plain; charset=\"utf-8\"");
        out.extend_from_slice(b"\r\n");
        line(&mut out, &self.body);
        line(&mut out, format!("\r\n--{}", BOUNDARY).as_bytes());
        line(
            &mut out,
            format!(
                "Content-Type: application/octet-stream; name=\"{}\"",
                self.attachment
            )
            .as_bytes(),
        );
        line(&mut out, b"Content-Transfer-Encoding: base64");
        line(
            &mut out,
            format!(
                "Content-Disposition: attachment; filename=\"{}\"",
                self.attachment
            )
            .as_bytes(),
        );
        let encoded = general_purpose::STANDARD.encode(&self.attach_data);
        for chunk in encoded.as_bytes().chunks(BASE64_LINE_WIDTH) {
            line(&mut out, chunk);
        }
        line(&mut out, format!("\r\n--{}--", BOUNDARY).as_bytes());
        out
    }

    /// Text view of [`Message::to_bytes`]. Body bytes that are not UTF-8 show
    /// up as U+FFFD here; transports should send `to_bytes()` instead.
    pub fn render(&self) -> String {
        String::from_utf8_lossy(&self.to_bytes()).into_owned()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
