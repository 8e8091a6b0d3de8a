//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use mailpost_core::config::{DEFAULT_HOST, DEFAULT_PORT};
use mailpost_core::{Provider, SendRequest, Security, ServerConfig};

#[derive(Debug, Parser)]
#[command(name = "mailpost", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compose a message and send it through an SMTP relay
    Send(SendArgs),
}

/// The fields of the send form. Required fields are optional here so every
/// missing one can be reported at once.
#[derive(Debug, Args)]
pub struct SendArgs {
    /// Your email address (also the SMTP login)
    #[arg(long, env = "MAILPOST_FROM", value_name = "EMAIL")]
    pub from: Option<String>,

    /// App password for your account
    #[arg(long, env = "MAILPOST_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Recipient address
    #[arg(long, value_name = "EMAIL")]
    pub to: Option<String>,

    /// Subject line
    #[arg(short, long)]
    pub subject: Option<String>,

    /// Message body
    #[arg(short, long, conflicts_with = "body_file")]
    pub body: Option<String>,

    /// Read the message body from a file
    #[arg(long, value_name = "PATH")]
    pub body_file: Option<PathBuf>,

    /// File to attach
    #[arg(short, long, value_name = "PATH")]
    pub attach: Option<PathBuf>,

    /// Relay preset; inferred from your address when omitted
    #[arg(long, value_enum)]
    pub provider: Option<ProviderArg>,

    /// SMTP server hostname
    #[arg(long, env = "MAILPOST_SMTP_HOST")]
    pub host: Option<String>,

    /// SMTP server port
    #[arg(long, env = "MAILPOST_SMTP_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Connection security
    #[arg(long, value_enum, default_value_t = SecurityArg::Starttls)]
    pub security: SecurityArg,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,

    /// Print the composed message instead of sending it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderArg {
    Gmail,
    Outlook,
    Yahoo,
}

impl From<ProviderArg> for Provider {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Gmail => Self::Gmail,
            ProviderArg::Outlook => Self::Outlook,
            ProviderArg::Yahoo => Self::Yahoo,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SecurityArg {
    Starttls,
    Tls,
    None,
}

impl From<SecurityArg> for Security {
    fn from(arg: SecurityArg) -> Self {
        match arg {
            SecurityArg::Starttls => Self::StartTls,
            SecurityArg::Tls => Self::Tls,
            SecurityArg::None => Self::None,
        }
    }
}

impl SendArgs {
    /// Resolves the relay: `--host`, then `--provider`, then the preset for
    /// the sender's domain, then the default.
    pub fn server(&self) -> ServerConfig {
        let host = match (&self.host, self.provider) {
            (Some(host), _) => host.clone(),
            (None, Some(provider)) => Provider::from(provider).host().to_string(),
            (None, None) => self
                .from
                .as_deref()
                .and_then(Provider::detect)
                .map_or_else(|| DEFAULT_HOST.to_string(), |p| p.host().to_string()),
        };

        ServerConfig::new(host, self.port).with_security(self.security.into())
    }

    /// Builds the request. `body` is the already-resolved body text.
    pub fn request(&self, body: String) -> SendRequest {
        let mut request = SendRequest::new(
            self.from.clone().unwrap_or_default(),
            self.password.clone().unwrap_or_default(),
            self.to.clone().unwrap_or_default(),
            self.subject.clone().unwrap_or_default(),
            body,
        )
        .with_server(self.server());
        request.attachment.clone_from(&self.attach);
        request
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> SendArgs {
        let cli = Cli::try_parse_from(["mailpost", "send"].iter().chain(args)).unwrap();
        let Commands::Send(args) = cli.command;
        args
    }

    #[test]
    fn parses_full_form() {
        let args = parse(&[
            "--from", "a@x.com", "--password", "pw", "--to", "b@y.com", "-s", "Hi", "-b",
            "Hello", "-a", "report.pdf", "--json",
        ]);
        assert_eq!(args.to.as_deref(), Some("b@y.com"));
        assert_eq!(args.attach, Some(PathBuf::from("report.pdf")));
        assert!(args.json);
        assert!(!args.dry_run);

        let request = args.request("Hello".into());
        assert_eq!(request.sender, "a@x.com");
        assert_eq!(request.attachment, Some(PathBuf::from("report.pdf")));
        assert_eq!(request.server.host, "smtp.gmail.com");
        assert_eq!(request.server.port, 587);
        assert_eq!(request.server.security, Security::StartTls);
    }

    #[test]
    fn host_resolution_order() {
        let args = parse(&["--from", "me@hotmail.com"]);
        assert_eq!(args.server().host, "smtp.outlook.com");

        let args = parse(&["--from", "me@hotmail.com", "--provider", "yahoo"]);
        assert_eq!(args.server().host, "smtp.mail.yahoo.com");

        let args = parse(&["--from", "me@hotmail.com", "--host", "mail.example.org"]);
        assert_eq!(args.server().host, "mail.example.org");

        let args = parse(&["--from", "me@example.org", "--port", "2525", "--security", "none"]);
        let server = args.server();
        assert_eq!(server.host, "smtp.gmail.com");
        assert_eq!(server.port, 2525);
        assert_eq!(server.security, Security::None);
    }

    #[test]
    fn body_and_body_file_conflict() {
        let result =
            Cli::try_parse_from(["mailpost", "send", "--body", "x", "--body-file", "b.txt"]);
        assert!(result.is_err());
    }

    #[test]
    fn missing_fields_are_left_for_validation() {
        let args = parse(&[]);
        let request = args.request(String::new());
        assert!(request.recipient.is_empty());
        assert!(request.subject.is_empty());
        assert!(request.attachment.is_none());
    }
}
