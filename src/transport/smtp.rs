//! Blocking SMTP client used to deliver log mail.
//!
//! Each [`SmtpTransport::send`] opens a fresh connection, runs one mail
//! transaction and quits. Log mail is rare enough that connection reuse is not
//! worth the state it would add to the handler.

use std::{
    io::{BufRead, BufReader, Write},
    time::Duration,
};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use log::debug;

use super::connection::{ActiveConnection, TlsOptions};
use super::{MailTransport, TransportError};

/// Default SMTP port.
pub const DEFAULT_SMTP_PORT: u16 = 25;
/// Default connect/read/write timeout for SMTP sessions.
pub const DEFAULT_SMTP_TIMEOUT: Duration = Duration::from_secs(10);

/// How the transport secures the connection.
#[derive(Clone, Debug, Default)]
pub enum SmtpTls {
    /// Plain text SMTP.
    #[default]
    None,
    /// Upgrade with `STARTTLS` after the first `EHLO`.
    StartTls(TlsOptions),
    /// TLS from the first byte (SMTPS, usually port 465).
    Implicit(TlsOptions),
}

/// Credentials for `AUTH PLAIN`.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Configuration for [`SmtpTransport`].
#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// Applied to connect, every read and every write.
    pub timeout: Duration,
    pub tls: SmtpTls,
    pub credentials: Option<Credentials>,
    /// Name announced in `EHLO`/`HELO`.
    pub helo_name: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: DEFAULT_SMTP_PORT,
            timeout: DEFAULT_SMTP_TIMEOUT,
            tls: SmtpTls::None,
            credentials: None,
            helo_name: "localhost".into(),
        }
    }
}

/// Transport delivering messages to an SMTP server.
#[derive(Clone, Debug)]
pub struct SmtpTransport {
    config: SmtpConfig,
}

impl SmtpTransport {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SmtpConfig {
        &self.config
    }

    fn open_session(&self) -> Result<Session, TransportError> {
        let config = &self.config;
        let mut conn = ActiveConnection::connect(&config.host, config.port, config.timeout)?;
        if let SmtpTls::Implicit(options) = &config.tls {
            conn = conn.into_tls(options)?;
        }
        let mut session = Session::new(conn);
        session.expect_reply("greeting", &[220])?;

        let capabilities = session.hello(&config.helo_name)?;
        if let SmtpTls::StartTls(options) = &config.tls {
            if !capabilities.iter().any(|cap| cap.eq_ignore_ascii_case("STARTTLS")) {
                return Err(TransportError::Protocol(
                    "server does not advertise STARTTLS".into(),
                ));
            }
            session.command("STARTTLS", &[220])?;
            session = session.upgrade(options)?;
            session.hello(&config.helo_name)?;
        }

        if let Some(credentials) = &config.credentials {
            let token = BASE64_STANDARD.encode(format!(
                "\0{}\0{}",
                credentials.username, credentials.password
            ));
            session.send_line(&format!("AUTH PLAIN {token}"))?;
            session.expect_reply("AUTH PLAIN", &[235])?;
        }
        Ok(session)
    }
}

impl MailTransport for SmtpTransport {
    fn send(&self, from: &str, to: &[String], message: &[u8]) -> Result<(), TransportError> {
        let mut session = self.open_session()?;
        session.command(&format!("MAIL FROM:<{}>", envelope_address(from)), &[250])?;
        for recipient in to {
            session.command(
                &format!("RCPT TO:<{}>", envelope_address(recipient)),
                &[250, 251],
            )?;
        }
        session.command("DATA", &[354])?;
        session.write_raw(&encode_data(message))?;
        session.expect_reply("message body", &[250])?;

        // The message is accepted at this point; a failed QUIT changes nothing.
        if let Err(err) = session.command("QUIT", &[221]) {
            debug!("SmtpTransport: QUIT failed after delivery: {err}");
        }
        Ok(())
    }
}

/// A parsed server reply.
#[derive(Debug, PartialEq, Eq)]
pub(super) struct Reply {
    pub(super) code: u16,
    pub(super) lines: Vec<String>,
}

impl Reply {
    fn text(&self) -> String {
        self.lines.join(" ")
    }
}

struct Session {
    reader: BufReader<ActiveConnection>,
}

impl Session {
    fn new(conn: ActiveConnection) -> Self {
        Self {
            reader: BufReader::new(conn),
        }
    }

    fn upgrade(self, options: &TlsOptions) -> Result<Self, TransportError> {
        if !self.reader.buffer().is_empty() {
            return Err(TransportError::Protocol(
                "server sent data before TLS negotiation".into(),
            ));
        }
        let conn = self.reader.into_inner().into_tls(options)?;
        Ok(Self::new(conn))
    }

    /// Send `EHLO`, falling back to `HELO`; returns the advertised extensions.
    fn hello(&mut self, name: &str) -> Result<Vec<String>, TransportError> {
        self.send_line(&format!("EHLO {name}"))?;
        let reply = read_reply(&mut self.reader)?;
        if reply.code == 250 {
            return Ok(reply.lines.into_iter().skip(1).collect());
        }
        self.command(&format!("HELO {name}"), &[250])?;
        Ok(Vec::new())
    }

    fn command(&mut self, line: &str, expected: &[u16]) -> Result<Reply, TransportError> {
        self.send_line(line)?;
        let verb = line.split([' ', ':']).next().unwrap_or(line);
        self.expect_reply(verb, expected)
    }

    fn send_line(&mut self, line: &str) -> Result<(), TransportError> {
        let conn = self.reader.get_mut();
        conn.write_all(line.as_bytes())?;
        conn.write_all(b"\r\n")?;
        conn.flush()?;
        Ok(())
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let conn = self.reader.get_mut();
        conn.write_all(bytes)?;
        conn.flush()?;
        Ok(())
    }

    fn expect_reply(&mut self, command: &str, expected: &[u16]) -> Result<Reply, TransportError> {
        let reply = read_reply(&mut self.reader)?;
        if expected.contains(&reply.code) {
            Ok(reply)
        } else {
            Err(TransportError::Rejected {
                command: command.to_owned(),
                code: reply.code,
                message: reply.text(),
            })
        }
    }
}

/// Read one (possibly multi-line) reply.
pub(super) fn read_reply<R: BufRead>(reader: &mut R) -> Result<Reply, TransportError> {
    let mut lines = Vec::new();
    loop {
        let mut raw = String::new();
        if reader.read_line(&mut raw)? == 0 {
            return Err(TransportError::Protocol(
                "connection closed while awaiting reply".into(),
            ));
        }
        let line = raw.trim_end_matches(['\r', '\n']);
        let code = line
            .get(..3)
            .filter(|digits| digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse::<u16>().ok())
            .ok_or_else(|| TransportError::Protocol(format!("malformed reply line: {line:?}")))?;
        let separator = line.as_bytes().get(3).copied();
        lines.push(line.get(4..).unwrap_or("").to_owned());
        if separator != Some(b'-') {
            return Ok(Reply { code, lines });
        }
    }
}

/// Normalise line endings to CRLF, dot-stuff, and append the terminator.
pub(super) fn encode_data(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + 16);
    let body = message.strip_suffix(b"\n").unwrap_or(message);
    for line in body.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.first() == Some(&b'.') {
            out.push(b'.');
        }
        out.extend_from_slice(line);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b".\r\n");
    out
}

/// Extract the bare address from `Display Name <addr>` forms.
pub(super) fn envelope_address(address: &str) -> &str {
    let trimmed = address.trim();
    match (trimmed.rfind('<'), trimmed.rfind('>')) {
        (Some(open), Some(close)) if open < close => &trimmed[open + 1..close],
        _ => trimmed,
    }
}
