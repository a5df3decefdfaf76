use std::io::Write;
use std::path::Path;
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// The splice primitive: byte-span replacement with verification.
///
/// Every patch a collaborator file receives (an import rewrite, a route block,
/// a mapping entry) is planned as a set of these against the text that was
/// read, then spliced in a single pass. Insertions are empty spans.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Edit does nothing until spliced"]
pub struct Edit {
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    /// Text that replaces [byte_start, byte_end)
    pub new_text: String,
    /// What the span must contain when the edit is spliced
    pub expected_before: EditVerification,
}

/// Verification strategy for edit safety.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (for large spans)
    Hash(u64),
}

impl EditVerification {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Create verification from text, using hash for text over 1KB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            EditVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            EditVerification::ExactMatch(text.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("before-text verification failed at byte {byte_start}: found {found:?}")]
    BeforeTextMismatch {
        byte_start: usize,
        byte_end: usize,
        found: String,
    },

    #[error("invalid byte range: [{byte_start}, {byte_end}) in text of length {len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        len: usize,
    },

    #[error("edits overlap at byte {0}")]
    Overlap(usize),

    #[error("edit at byte {0} does not fall on a UTF-8 character boundary")]
    NotCharBoundary(usize),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Edit {
    /// Insert `text` at `offset` without replacing anything.
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self {
            byte_start: offset,
            byte_end: offset,
            new_text: text.into(),
            expected_before: EditVerification::ExactMatch(String::new()),
        }
    }

    /// Replace `[byte_start, byte_end)`, which must currently read `expected_before`.
    pub fn replace(
        byte_start: usize,
        byte_end: usize,
        new_text: impl Into<String>,
        expected_before: &str,
    ) -> Self {
        Self {
            byte_start,
            byte_end,
            new_text: new_text.into(),
            expected_before: EditVerification::from_text(expected_before),
        }
    }

    pub fn is_insertion(&self) -> bool {
        self.byte_start == self.byte_end
    }

    fn validate(&self, content: &str) -> Result<(), EditError> {
        if self.byte_start > self.byte_end || self.byte_end > content.len() {
            return Err(EditError::InvalidByteRange {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                len: content.len(),
            });
        }
        for offset in [self.byte_start, self.byte_end] {
            if !content.is_char_boundary(offset) {
                return Err(EditError::NotCharBoundary(offset));
            }
        }

        let current = &content[self.byte_start..self.byte_end];
        if !self.expected_before.matches(current) {
            return Err(EditError::BeforeTextMismatch {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                found: current.to_string(),
            });
        }
        Ok(())
    }
}

/// Splice a set of edits into `content` and return the new text.
///
/// Edits are validated against the original text, sorted by byte_start
/// descending and applied bottom-to-top so earlier offsets stay valid.
/// Insertions at the same offset keep their given order.
pub fn splice(content: &str, edits: &[Edit]) -> Result<String, EditError> {
    for edit in edits {
        edit.validate(content)?;
    }

    let mut ordered: Vec<(usize, &Edit)> = edits.iter().enumerate().collect();
    // Descending by start; among equal starts, later-listed edits go first so
    // the final text reads in listing order.
    ordered.sort_by(|(ia, a), (ib, b)| b.byte_start.cmp(&a.byte_start).then(ib.cmp(ia)));

    for window in ordered.windows(2) {
        let (later, earlier) = (window[0].1, window[1].1);
        if earlier.byte_end > later.byte_start {
            return Err(EditError::Overlap(later.byte_start));
        }
    }

    let mut out = content.to_string();
    for (_, edit) in ordered {
        out.replace_range(edit.byte_start..edit.byte_end, &edit.new_text);
    }
    Ok(out)
}

/// Atomic file write: tempfile + fsync + rename, then bump mtime.
///
/// Readers observe either the old contents or the new ones, never a partial write.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), EditError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    // Dev servers watching the tree key off mtime.
    filetime::set_file_mtime(path, filetime::FileTime::now())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_edit_verification_exact_match() {
        let verify = EditVerification::ExactMatch("hello world".to_string());
        assert!(verify.matches("hello world"));
        assert!(!verify.matches("hello"));
    }

    #[test]
    fn test_edit_verification_from_text_large() {
        let text = "x".repeat(2000);
        let verify = EditVerification::from_text(&text);
        assert!(matches!(verify, EditVerification::Hash(_)));
        assert!(verify.matches(&text));
        assert!(!verify.matches("x"));
    }

    #[test]
    fn test_splice_insert_and_replace() {
        let content = "import { a } from 'x';\nbody\n";
        let edits = vec![
            Edit::replace(0, 22, "import { a, b } from 'x';", "import { a } from 'x';"),
            Edit::insert(content.len(), "tail\n"),
        ];
        let out = splice(content, &edits).unwrap();
        assert_eq!(out, "import { a, b } from 'x';\nbody\ntail\n");
    }

    #[test]
    fn test_splice_same_point_keeps_order() {
        let edits = vec![Edit::insert(3, "1"), Edit::insert(3, "2")];
        assert_eq!(splice("abcdef", &edits).unwrap(), "abc12def");
    }

    #[test]
    fn test_splice_rejects_overlap() {
        let edits = vec![
            Edit::replace(0, 4, "X", "abcd"),
            Edit::replace(2, 6, "Y", "cdef"),
        ];
        assert!(matches!(
            splice("abcdef", &edits),
            Err(EditError::Overlap(_))
        ));
    }

    #[test]
    fn test_splice_rejects_stale_before_text() {
        let edits = vec![Edit::replace(0, 5, "HELLO", "howdy")];
        assert!(matches!(
            splice("hello world", &edits),
            Err(EditError::BeforeTextMismatch { .. })
        ));
    }

    #[test]
    fn test_splice_invalid_range() {
        let edits = vec![Edit::insert(50, "x")];
        assert!(matches!(
            splice("short", &edits),
            Err(EditError::InvalidByteRange { .. })
        ));
    }

    #[test]
    fn test_splice_rejects_mid_character_offset() {
        let edits = vec![Edit::insert(1, "x")];
        assert!(matches!(
            splice("é", &edits),
            Err(EditError::NotCharBoundary(1))
        ));
    }

    #[test]
    fn test_atomic_write_replaces_contents() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("test.ts");
        fs::write(&file_path, b"original content").unwrap();

        atomic_write(&file_path, b"modified content").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "modified content");
        let leftovers = fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
