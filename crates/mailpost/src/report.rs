//! Human-readable rendering of outcomes and validation problems.

use std::fmt::Write as _;

use mailpost_core::{SendOutcome, ValidationError};

/// Renders a send outcome the way the summary panel shows it.
pub fn render_outcome(outcome: &SendOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", outcome.message);

    let Some(details) = &outcome.details else {
        return out;
    };

    let _ = writeln!(out, "  From:         {}", details.from);
    let _ = writeln!(out, "  To:           {}", details.to);
    let _ = writeln!(out, "  Subject:      {}", details.subject);
    let _ = writeln!(out, "  Body Length:  {} characters", details.body_length);
    let _ = writeln!(out, "  SMTP Server:  {}:{}", details.smtp_server, details.port);
    let _ = writeln!(
        out,
        "  HTML Version: {}",
        if details.html_included { "Yes" } else { "No" }
    );
    if let Some(attachment) = &details.attachment {
        let _ = writeln!(
            out,
            "  Attachment:   {} ({:.2} MB)",
            attachment.filename, attachment.size_mb
        );
    }

    out
}

/// Renders every validation problem under one heading.
pub fn render_validation(errors: &[ValidationError]) -> String {
    let mut out = String::from("Please fill all required fields!\n");
    for error in errors {
        let _ = writeln!(out, "  --{}: {error}", error.field());
    }
    out
}
