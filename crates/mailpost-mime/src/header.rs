//! MIME header handling.

use std::fmt;

/// Column at which long header lines are folded (RFC 5322 §2.1.1).
const FOLD_COLUMN: usize = 78;

/// Ordered collection of message headers.
///
/// Names are matched case-insensitively but written back exactly as they
/// were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header. CR and LF are stripped from the value so it cannot
    /// inject further headers.
    pub fn add(&mut self, name: impl Into<String>, value: impl AsRef<str>) {
        self.entries.push((name.into(), sanitize(value.as_ref())));
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the number of header lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over all headers in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Parses a header block, unfolding continuation lines.
    ///
    /// Parsing stops at the first empty line. Lines without a colon are
    /// skipped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut headers = Self::new();
        let mut current: Option<(String, String)> = None;

        for line in text.lines() {
            if line.is_empty() {
                break;
            }

            if line.starts_with([' ', '\t']) {
                if let Some((_, value)) = current.as_mut() {
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(line.trim());
                }
                continue;
            }

            if let Some((name, value)) = current.take() {
                headers.add(name, value);
            }

            if let Some((name, value)) = line.split_once(':') {
                current = Some((name.trim().to_string(), value.trim().to_string()));
            }
        }

        if let Some((name, value)) = current {
            headers.add(name, value);
        }

        headers
    }
}

impl fmt::Display for Headers {
    /// Writes every header as `Name: value` terminated by CRLF, folding
    /// lines longer than 78 characters at spaces.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            write!(f, "{name}:")?;
            let mut column = name.len() + 1;
            for word in value.split(' ') {
                if !word.is_empty() && column + 1 + word.len() > FOLD_COLUMN {
                    f.write_str("\r\n")?;
                    column = 0;
                }
                write!(f, " {word}")?;
                column += 1 + word.len();
            }
            f.write_str("\r\n")?;
        }
        Ok(())
    }
}

fn sanitize(value: &str) -> String {
    if value.contains(['\r', '\n']) {
        value
            .split(['\r', '\n'])
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        value.to_string()
    }
}
