//! Header-block reader for one message file on disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{MailIndexError, Result};

#[derive(Debug, Clone)]
pub struct MessageFile {
    path: PathBuf,
    raw: Vec<u8>,
    headers: Vec<(String, String)>,
    body: String,
}

impl MessageFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let raw = fs::read(&path).map_err(|source| MailIndexError::File {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            raw,
            headers: Vec::new(),
            body: String::new(),
        })
    }

    /// Parses the header block. Folded lines are unfolded; the first
    /// occurrence of a repeated header wins.
    pub fn parse(&mut self) -> Result<()> {
        let text = String::from_utf8_lossy(&self.raw).into_owned();
        if text.trim().is_empty() {
            return Err(MailIndexError::Parse(format!(
                "{} is empty",
                self.path.display()
            )));
        }

        let mut headers: Vec<(String, String)> = Vec::new();
        let mut body_start = text.len();
        let mut offset = 0;
        let mut first = true;

        for raw_line in text.split_inclusive('\n') {
            let line_start = offset;
            offset += raw_line.len();
            let line = raw_line.trim_end_matches(['\r', '\n']);

            if first {
                first = false;
                if line.starts_with("From ") {
                    continue;
                }
            }
            if line.is_empty() {
                body_start = offset;
                break;
            }
            if line.starts_with([' ', '\t']) {
                let Some((_, value)) = headers.last_mut() else {
                    return Err(MailIndexError::Parse(format!(
                        "{} starts with a continuation line",
                        self.path.display()
                    )));
                };
                value.push_str(line);
                continue;
            }
            match split_header_line(line) {
                Some((name, value)) => headers.push((name, value.to_string())),
                None if headers.is_empty() => {
                    return Err(MailIndexError::Parse(format!(
                        "{} does not start with a header block",
                        self.path.display()
                    )));
                }
                None => {
                    body_start = line_start;
                    break;
                }
            }
        }

        for (_, value) in &mut headers {
            *value = value.trim().to_string();
        }
        self.headers = headers;
        self.body = text[body_start..].to_string();
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Header value by case-insensitive name. Empty before `parse`.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn content_hash(&self) -> String {
        blake3::hash(&self.raw).to_hex().to_string()
    }
}

fn split_header_line(line: &str) -> Option<(String, &str)> {
    let (name, value) = line.split_once(':')?;
    let valid = !name.is_empty() && name.bytes().all(|b| b.is_ascii_graphic());
    valid.then(|| (name.to_ascii_lowercase(), value))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    fn parse_text(text: &str) -> Result<MessageFile> {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("msg");
        fs::write(&path, text).expect("write message");
        let mut file = MessageFile::open(&path)?;
        file.parse()?;
        Ok(file)
    }

    #[test]
    fn headers_are_case_insensitive_and_unfolded() {
        let file = parse_text(
            "From: a@x\r\nSubject: hello\r\n  world\r\nReferences: <a@x>\r\n\t<b@x>\r\n\r\nbody text\r\n",
        )
        .expect("parse");
        assert_eq!(file.header("FROM"), Some("a@x"));
        assert_eq!(file.header("subject"), Some("hello  world"));
        assert_eq!(file.header("references"), Some("<a@x>\t<b@x>"));
        assert_eq!(file.header("to"), None);
        assert_eq!(file.body(), "body text\r\n");
    }

    #[test]
    fn first_occurrence_of_repeated_header_wins() {
        let file = parse_text("Subject: one\nSubject: two\n\n").expect("parse");
        assert_eq!(file.header("subject"), Some("one"));
    }

    #[test]
    fn mbox_separator_line_is_skipped() {
        let file = parse_text("From bob@x Mon Jan  1 00:00:00 2024\nTo: c@x\n\nhi\n").expect("parse");
        assert_eq!(file.header("to"), Some("c@x"));
    }

    #[test]
    fn non_header_first_line_is_a_parse_error() {
        let err = parse_text("this is not mail\n").expect_err("must fail");
        assert_eq!(err.code(), "PARSE_ERROR");
    }

    #[test]
    fn empty_file_is_a_parse_error() {
        let err = parse_text("  \n").expect_err("must fail");
        assert_eq!(err.code(), "PARSE_ERROR");
    }

    #[test]
    fn missing_file_is_a_file_error() {
        let temp = tempdir().expect("tempdir");
        let err = MessageFile::open(temp.path().join("absent")).expect_err("must fail");
        assert_eq!(err.code(), "FILE_ERROR");
    }

    #[test]
    fn content_hash_depends_only_on_bytes() {
        let a = parse_text("Subject: same\n\n").expect("a");
        let b = parse_text("Subject: same\n\n").expect("b");
        assert_eq!(a.content_hash(), b.content_hash());
        assert_eq!(a.content_hash().len(), 64);
    }
}
