//! Type-state SMTP client.

use super::{ServerInfo, SmtpStream};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::{is_last_reply_line, parse_reply};
use crate::types::{Address, AuthMechanism, Reply, ReplyCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::marker::PhantomData;
use tracing::debug;

/// Type-state marker: greeted, possibly after EHLO/STARTTLS.
#[derive(Debug)]
pub struct Connected;

/// Type-state marker: AUTH succeeded.
#[derive(Debug)]
pub struct Authenticated;

/// Type-state marker: MAIL FROM accepted.
#[derive(Debug)]
pub struct MailTransaction;

/// Type-state marker: RCPT TO accepted.
#[derive(Debug)]
pub struct RecipientAdded;

/// Type-state marker: DATA accepted, server waits for the message.
#[derive(Debug)]
pub struct Data;

/// SMTP client with type-state pattern.
#[derive(Debug)]
pub struct Client<State> {
    stream: SmtpStream,
    server_info: ServerInfo,
    client_name: String,
    _state: PhantomData<State>,
}

/// Read access shared by every state.
pub trait SmtpConnection {
    /// Returns the server information.
    fn server_info(&self) -> &ServerInfo;

    /// Returns true once the session runs over TLS.
    fn is_encrypted(&self) -> bool;
}

impl<S> SmtpConnection for Client<S> {
    fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    fn is_encrypted(&self) -> bool {
        self.stream.is_tls()
    }
}

impl Client<Connected> {
    /// Creates a client from a stream and reads the 220 greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the greeting fails or the server refuses
    /// the session.
    pub async fn from_stream(mut stream: SmtpStream) -> Result<Self> {
        let greeting = read_reply(&mut stream).await?;
        if greeting.code != ReplyCode::SERVICE_READY {
            return Err(Error::rejected(&greeting));
        }

        let hostname = greeting
            .first_line()
            .split_whitespace()
            .next()
            .unwrap_or("unknown")
            .to_string();
        debug!(server = %hostname, "Greeting received");

        Ok(Self {
            stream,
            server_info: ServerInfo {
                hostname,
                ..ServerInfo::default()
            },
            client_name: String::new(),
            _state: PhantomData,
        })
    }

    /// Sends EHLO and records the advertised extensions.
    ///
    /// # Errors
    ///
    /// Returns an error if the EHLO command fails.
    pub async fn ehlo(mut self, client_hostname: &str) -> Result<Self> {
        self.client_name = client_hostname.to_string();
        self.send_ehlo().await?;
        Ok(self)
    }

    /// Upgrades the connection with STARTTLS and repeats EHLO over TLS.
    ///
    /// Must follow [`Client::ehlo`], which tells us whether STARTTLS is on
    /// offer. `server_hostname` is the name the certificate is checked
    /// against.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] if the server does not advertise
    /// STARTTLS, or an error if the server refuses it or the handshake fails.
    pub async fn starttls(mut self, server_hostname: &str) -> Result<Self> {
        if !self.server_info.supports_starttls() {
            return Err(Error::NotSupported("STARTTLS".into()));
        }

        let reply = self.send_command(Command::StartTls).await?;
        if reply.code != ReplyCode::SERVICE_READY {
            return Err(Error::rejected(&reply));
        }

        self.stream = self.stream.upgrade_to_tls(server_hostname).await?;

        // Capabilities learned in plaintext are void after the upgrade.
        self.send_ehlo().await?;
        Ok(self)
    }

    /// Authenticates with the best mechanism the server offers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] if neither PLAIN nor LOGIN is offered,
    /// or [`Error::Rejected`] if the server refuses the credentials.
    pub async fn authenticate(
        self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        match self.server_info.preferred_auth() {
            Some(AuthMechanism::Login) => self.auth_login(username, password).await,
            Some(_) => self.auth_plain(username, password).await,
            None => Err(Error::NotSupported(
                "a password authentication mechanism (PLAIN or LOGIN)".into(),
            )),
        }
    }

    /// Authenticates using PLAIN with an initial response.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_plain(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        let token = STANDARD.encode(format!("\0{username}\0{password}"));

        let mut reply = self
            .send_command(Command::Auth {
                mechanism: AuthMechanism::Plain,
                initial_response: Some(token.clone()),
            })
            .await?;

        // Servers without SASL-IR ask for the token after an empty challenge.
        if reply.code == ReplyCode::AUTH_CONTINUE {
            reply = self.send_command(Command::AuthResponse(token)).await?;
        }

        if !reply.is_success() {
            return Err(Error::rejected(&reply));
        }

        debug!(mechanism = "PLAIN", "Authenticated");
        Ok(self.transition())
    }

    /// Authenticates using the LOGIN username/password prompts.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        let reply = self
            .send_command(Command::Auth {
                mechanism: AuthMechanism::Login,
                initial_response: None,
            })
            .await?;
        if reply.code != ReplyCode::AUTH_CONTINUE {
            return Err(Error::rejected(&reply));
        }

        let reply = self
            .send_command(Command::AuthResponse(STANDARD.encode(username)))
            .await?;
        if reply.code != ReplyCode::AUTH_CONTINUE {
            return Err(Error::rejected(&reply));
        }

        let reply = self
            .send_command(Command::AuthResponse(STANDARD.encode(password)))
            .await?;
        if !reply.is_success() {
            return Err(Error::rejected(&reply));
        }

        debug!(mechanism = "LOGIN", "Authenticated");
        Ok(self.transition())
    }

    /// Starts a mail transaction without authenticating, for relays that
    /// accept it.
    ///
    /// # Errors
    ///
    /// Same as the authenticated `mail_from`.
    pub async fn mail_from(
        self,
        from: Address,
        size: Option<usize>,
    ) -> Result<Client<MailTransaction>> {
        self.start_transaction(from, size).await
    }

    async fn send_ehlo(&mut self) -> Result<()> {
        let reply = self
            .send_command(Command::Ehlo {
                hostname: self.client_name.clone(),
            })
            .await?;

        if !reply.is_success() {
            return Err(Error::rejected(&reply));
        }

        self.server_info.update_from_ehlo(&reply.message);
        debug!(extensions = ?self.server_info.extensions, "EHLO accepted");
        Ok(())
    }
}

impl Client<Authenticated> {
    /// Starts a mail transaction.
    ///
    /// `size` is the message size in bytes; it is declared with the SIZE
    /// parameter when the server supports it, and checked against the
    /// advertised limit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MessageTooLarge`] if the message exceeds the server
    /// limit, or an error if MAIL FROM is refused.
    pub async fn mail_from(
        self,
        from: Address,
        size: Option<usize>,
    ) -> Result<Client<MailTransaction>> {
        self.start_transaction(from, size).await
    }
}

impl Client<MailTransaction> {
    /// Adds the envelope recipient.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: Address) -> Result<Client<RecipientAdded>> {
        let reply = self.send_command(Command::RcptTo { to }).await?;
        if !reply.is_success() {
            return Err(Error::rejected(&reply));
        }

        Ok(self.transition())
    }
}

impl Client<RecipientAdded> {
    /// Asks the server to accept message content.
    ///
    /// # Errors
    ///
    /// Returns an error unless the server answers 354.
    pub async fn data(mut self) -> Result<Client<Data>> {
        let reply = self.send_command(Command::Data).await?;
        if reply.code != ReplyCode::START_DATA {
            return Err(Error::rejected(&reply));
        }

        Ok(self.transition())
    }
}

impl Client<Data> {
    /// Sends the message content and completes the transaction.
    ///
    /// Line endings are normalized to CRLF, lines starting with `.` are
    /// dot-stuffed and the terminating `.` line is appended. The whole
    /// payload goes out in one write.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or the server rejects the message.
    pub async fn send_message(mut self, message: &[u8]) -> Result<Client<Connected>> {
        let payload = dot_stuff(message);
        debug!(bytes = payload.len(), "Sending message content");
        self.stream.write_all(&payload).await?;

        let reply = read_reply(&mut self.stream).await?;
        if !reply.is_success() {
            return Err(Error::rejected(&reply));
        }

        debug!(reply = %reply.message_text(), "Message accepted");
        Ok(self.transition())
    }
}

impl<S> Client<S> {
    async fn send_command(&mut self, cmd: Command) -> Result<Reply> {
        debug!(command = ?cmd, "C:");
        self.stream.write_all(&cmd.serialize()).await?;
        let reply = read_reply(&mut self.stream).await?;
        debug!(code = reply.code.as_u16(), "S:");
        Ok(reply)
    }

    async fn start_transaction(
        mut self,
        from: Address,
        size: Option<usize>,
    ) -> Result<Client<MailTransaction>> {
        if let (Some(size), Some(limit)) = (size, self.server_info.max_message_size()) {
            if limit > 0 && size > limit {
                return Err(Error::MessageTooLarge { size, limit });
            }
        }

        let size = size.filter(|_| self.server_info.supports_size());
        let reply = self.send_command(Command::MailFrom { from, size }).await?;
        if !reply.is_success() {
            return Err(Error::rejected(&reply));
        }

        Ok(self.transition())
    }

    fn transition<T>(self) -> Client<T> {
        Client {
            stream: self.stream,
            server_info: self.server_info,
            client_name: self.client_name,
            _state: PhantomData,
        }
    }

    /// Sends QUIT and closes the connection (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error if the QUIT command fails.
    pub async fn quit(mut self) -> Result<()> {
        let reply = self.send_command(Command::Quit).await?;
        if !reply.is_success() {
            return Err(Error::rejected(&reply));
        }

        Ok(())
    }
}

async fn read_reply(stream: &mut SmtpStream) -> Result<Reply> {
    let mut lines = Vec::new();
    loop {
        let line = stream.read_line().await?;
        let is_last = is_last_reply_line(&line);
        lines.push(line);

        if is_last {
            break;
        }
    }

    parse_reply(&lines)
}

/// Normalizes line endings to CRLF, dot-stuffs and appends the final `.`.
fn dot_stuff(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + message.len() / 64 + 5);
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    const GREETING: &[u8] = b"220 mx.example.com ESMTP ready\r\n";

    fn plain_ehlo() -> &'static [u8] {
        b"250-mx.example.com greets localhost\r\n250-SIZE 1000\r\n250 AUTH LOGIN PLAIN\r\n"
    }

    #[test]
    fn dot_stuffing_and_crlf() {
        assert_eq!(dot_stuff(b"a\n.b\r\nc\n"), b"a\r\n..b\r\nc\r\n.\r\n");
        assert_eq!(dot_stuff(b"no newline"), b"no newline\r\n.\r\n");
        assert_eq!(dot_stuff(b"."), b"..\r\n.\r\n");
    }

    #[tokio::test]
    async fn greeting_sets_server_hostname() {
        let mock = Builder::new().read(GREETING).build();
        let client = Client::from_stream(SmtpStream::from_io(mock)).await.unwrap();
        assert_eq!(client.server_info().hostname, "mx.example.com");
        assert!(!client.is_encrypted());
    }

    #[tokio::test]
    async fn refused_greeting() {
        let mock = Builder::new()
            .read(b"554 No SMTP service here\r\n")
            .build();
        let err = Client::from_stream(SmtpStream::from_io(mock))
            .await
            .unwrap_err();
        assert_eq!(err.reply_code(), Some(554));
    }

    #[tokio::test]
    async fn starttls_requires_advertisement() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"EHLO localhost\r\n")
            .read(plain_ehlo())
            .build();
        let client = Client::from_stream(SmtpStream::from_io(mock))
            .await
            .unwrap()
            .ehlo("localhost")
            .await
            .unwrap();

        let err = client.starttls("mx.example.com").await.unwrap_err();
        assert!(matches!(err, Error::NotSupported(ref what) if what == "STARTTLS"));
    }

    #[tokio::test]
    async fn starttls_refused_by_server() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"EHLO localhost\r\n")
            .read(b"250-mx.example.com\r\n250 STARTTLS\r\n")
            .write(b"STARTTLS\r\n")
            .read(b"454 TLS not available due to temporary reason\r\n")
            .build();
        let client = Client::from_stream(SmtpStream::from_io(mock))
            .await
            .unwrap()
            .ehlo("localhost")
            .await
            .unwrap();

        let err = client.starttls("mx.example.com").await.unwrap_err();
        assert_eq!(err.reply_code(), Some(454));
    }

    #[tokio::test]
    async fn auth_plain_rejected() {
        // "\0a@x.com\0wrong"
        let mock = Builder::new()
            .read(GREETING)
            .write(b"EHLO localhost\r\n")
            .read(plain_ehlo())
            .write(b"AUTH PLAIN AGFAeC5jb20Ad3Jvbmc=\r\n")
            .read(b"535 5.7.8 Username and Password not accepted\r\n")
            .build();
        let client = Client::from_stream(SmtpStream::from_io(mock))
            .await
            .unwrap()
            .ehlo("localhost")
            .await
            .unwrap();

        let err = client.authenticate("a@x.com", "wrong").await.unwrap_err();
        assert_eq!(err.reply_code(), Some(535));
    }

    #[tokio::test]
    async fn auth_plain_after_empty_challenge() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"AUTH PLAIN AGFAeC5jb20Ac2VjcmV0\r\n")
            .read(b"334 \r\n")
            .write(b"AGFAeC5jb20Ac2VjcmV0\r\n")
            .read(b"235 2.7.0 Accepted\r\n")
            .build();
        let client = Client::from_stream(SmtpStream::from_io(mock)).await.unwrap();
        client.auth_plain("a@x.com", "secret").await.unwrap();
    }

    #[tokio::test]
    async fn auth_login_when_plain_not_offered() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"EHLO localhost\r\n")
            .read(b"250-mx.example.com\r\n250 AUTH LOGIN\r\n")
            .write(b"AUTH LOGIN\r\n")
            .read(b"334 VXNlcm5hbWU6\r\n")
            .write(b"YUB4LmNvbQ==\r\n")
            .read(b"334 UGFzc3dvcmQ6\r\n")
            .write(b"c2VjcmV0\r\n")
            .read(b"235 Authentication successful\r\n")
            .build();
        let client = Client::from_stream(SmtpStream::from_io(mock))
            .await
            .unwrap()
            .ehlo("localhost")
            .await
            .unwrap();
        client.authenticate("a@x.com", "secret").await.unwrap();
    }

    #[tokio::test]
    async fn full_transaction() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"EHLO localhost\r\n")
            .read(plain_ehlo())
            .write(b"AUTH PLAIN AGFAeC5jb20Ac2VjcmV0\r\n")
            .read(b"235 2.7.0 Accepted\r\n")
            .write(b"MAIL FROM:<a@x.com> SIZE=21\r\n")
            .read(b"250 2.1.0 OK\r\n")
            .write(b"RCPT TO:<b@y.com>\r\n")
            .read(b"250 2.1.5 OK\r\n")
            .write(b"DATA\r\n")
            .read(b"354 Go ahead\r\n")
            .write(b"Subject: Hi\r\n\r\n..hidden\r\n.\r\n")
            .read(b"250 2.0.0 OK queued\r\n")
            .write(b"QUIT\r\n")
            .read(b"221 2.0.0 closing connection\r\n")
            .build();

        let message = b"Subject: Hi\n\n.hidden\n";
        let client = Client::from_stream(SmtpStream::from_io(mock))
            .await
            .unwrap()
            .ehlo("localhost")
            .await
            .unwrap()
            .authenticate("a@x.com", "secret")
            .await
            .unwrap()
            .mail_from(Address::new("a@x.com").unwrap(), Some(message.len()))
            .await
            .unwrap()
            .rcpt_to(Address::new("b@y.com").unwrap())
            .await
            .unwrap()
            .data()
            .await
            .unwrap()
            .send_message(message)
            .await
            .unwrap();
        client.quit().await.unwrap();
    }

    #[tokio::test]
    async fn oversized_message_never_reaches_the_wire() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"EHLO localhost\r\n")
            .read(plain_ehlo())
            .build();
        let client = Client::from_stream(SmtpStream::from_io(mock))
            .await
            .unwrap()
            .ehlo("localhost")
            .await
            .unwrap();

        let err = client
            .mail_from(Address::new("a@x.com").unwrap(), Some(5000))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MessageTooLarge {
                size: 5000,
                limit: 1000
            }
        ));
    }

    #[tokio::test]
    async fn recipient_refused() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"MAIL FROM:<a@x.com>\r\n")
            .read(b"250 OK\r\n")
            .write(b"RCPT TO:<nobody@y.com>\r\n")
            .read(b"550 5.1.1 No such user\r\n")
            .build();
        let err = Client::from_stream(SmtpStream::from_io(mock))
            .await
            .unwrap()
            .mail_from(Address::new("a@x.com").unwrap(), None)
            .await
            .unwrap()
            .rcpt_to(Address::new("nobody@y.com").unwrap())
            .await
            .unwrap_err();
        assert!(err.is_permanent());
    }
}
