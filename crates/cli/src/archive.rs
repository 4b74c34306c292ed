// ==============================================================================
// Modified-File Archive
// ==============================================================================
//
// Editors pass unsaved buffers on stdin as a sequence of entries, each one
// a file name line, a decimal byte count line, then exactly that many bytes
// of content:
//
//   /path/to/main.go
//   42
//   <42 bytes>

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArchiveError {
    #[error("archive entry {name:?}: missing size line")]
    MissingSize { name: String },
    #[error("archive entry {name:?}: invalid size {size:?}")]
    InvalidSize { name: String, size: String },
    #[error("archive entry {name:?}: expected {expected} bytes, found {found}")]
    Truncated {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("archive entry {name:?} is not valid UTF-8")]
    NotUtf8 { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: PathBuf,
    pub contents: String,
}

pub fn parse_archive(mut data: &[u8]) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    let mut entries = Vec::new();
    while !data.is_empty() {
        let (name, rest) = split_line(data);
        let name = String::from_utf8_lossy(name).into_owned();
        let Some((size, rest)) = (!rest.is_empty()).then(|| split_line(rest)) else {
            return Err(ArchiveError::MissingSize { name });
        };
        let size = String::from_utf8_lossy(size);
        let Ok(len) = size.trim().parse::<usize>() else {
            return Err(ArchiveError::InvalidSize {
                name,
                size: size.into_owned(),
            });
        };
        if rest.len() < len {
            return Err(ArchiveError::Truncated {
                name,
                expected: len,
                found: rest.len(),
            });
        }
        let (contents, rest) = rest.split_at(len);
        let Ok(contents) = String::from_utf8(contents.to_vec()) else {
            return Err(ArchiveError::NotUtf8 { name });
        };
        entries.push(ArchiveEntry {
            name: PathBuf::from(name),
            contents,
        });
        data = rest;
    }
    Ok(entries)
}

/// Line up to (not including) the next `\n`, and everything after it.
fn split_line(data: &[u8]) -> (&[u8], &[u8]) {
    match data.iter().position(|&b| b == b'\n') {
        Some(i) => (&data[..i], &data[i + 1..]),
        None => (data, &[]),
    }
}

/// Contents of the entry naming `file`. Names are compared as written
/// first, then canonicalized, since editors may send either form.
pub fn find_entry<'a>(entries: &'a [ArchiveEntry], file: &Path) -> Option<&'a str> {
    let exact = entries.iter().find(|e| e.name == file);
    exact
        .or_else(|| {
            let file = file.canonicalize().ok()?;
            entries
                .iter()
                .find(|e| e.name.canonicalize().is_ok_and(|name| name == file))
        })
        .map(|e| e.contents.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_several_entries() {
        let data = b"a.go\n5\nhellob.go\n0\nc.go\n3\nx\ny";
        let entries = parse_archive(data).unwrap();
        assert_eq!(
            entries,
            vec![
                ArchiveEntry {
                    name: "a.go".into(),
                    contents: "hello".into()
                },
                ArchiveEntry {
                    name: "b.go".into(),
                    contents: String::new()
                },
                ArchiveEntry {
                    name: "c.go".into(),
                    contents: "x\ny".into()
                },
            ]
        );
    }

    #[test]
    fn empty_archive() {
        assert_eq!(parse_archive(b""), Ok(Vec::new()));
    }

    #[test]
    fn malformed_archives() {
        assert_eq!(
            parse_archive(b"a.go\n"),
            Err(ArchiveError::MissingSize {
                name: "a.go".into()
            })
        );
        assert_eq!(
            parse_archive(b"a.go\nten\n"),
            Err(ArchiveError::InvalidSize {
                name: "a.go".into(),
                size: "ten".into()
            })
        );
        assert_eq!(
            parse_archive(b"a.go\n10\nshort"),
            Err(ArchiveError::Truncated {
                name: "a.go".into(),
                expected: 10,
                found: 5
            })
        );
        assert_eq!(
            parse_archive(b"a.go\n1\n\xff"),
            Err(ArchiveError::NotUtf8 {
                name: "a.go".into()
            })
        );
    }

    #[test]
    fn finds_entry_by_exact_name() {
        let entries = parse_archive(b"/x/main.go\n2\nok").unwrap();
        assert_eq!(find_entry(&entries, Path::new("/x/main.go")), Some("ok"));
        assert_eq!(find_entry(&entries, Path::new("/x/other.go")), None);
    }
}
