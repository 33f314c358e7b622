//! Registry line format
//!
//! A registry artifact lists one implementation identifier per line, in the
//! entry total order. Ranked positions and supersede lists are kept as `#`
//! metadata lines directly below their identifier so that a later pass can
//! reconstruct the same entries:
//!
//! ```text
//! org.acme.FastCodec
//! #position=10
//! org.acme.PortableCodec
//! #-org.acme.LegacyCodec
//! ```
//!
//! Plain service-loader readers treat `#` lines as comments.

use crate::entry::{Entry, EntrySet};
use crate::error::LineFormatError;
use crate::id::ImplementationId;
use crate::position::Position;
use std::fmt::Write as _;

/// Prefix of the position metadata line
pub const POSITION_PREFIX: &str = "#position=";

/// Prefix of a supersede metadata line
pub const SUPERSEDE_PREFIX: &str = "#-";

/// Entry being assembled while parsing
struct PendingEntry {
    id: ImplementationId,
    position: Position,
    supersedes: Vec<ImplementationId>,
}

impl PendingEntry {
    fn finish(self, into: &mut EntrySet) {
        into.upsert(
            Entry::new(self.id)
                .with_position(self.position)
                .with_supersedes(self.supersedes),
        );
    }
}

/// Parse an artifact into an entry set
///
/// The artifact holds an already merged set, so entries are rebuilt as
/// written: `#-` lines are kept on their entry and only act on later merges.
/// A repeated identifier replaces the earlier one. Blank lines and `#`
/// comments other than the metadata prefixes are ignored.
///
/// # Errors
/// Returns [`LineFormatError`] for metadata lines with no preceding
/// identifier, non-integer positions, and invalid identifiers.
pub fn parse(text: &str) -> Result<EntrySet, LineFormatError> {
    let mut set = EntrySet::new();
    let mut pending: Option<PendingEntry> = None;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();

        if line.is_empty() {
            continue;
        }

        if let Some(value) = line.strip_prefix(POSITION_PREFIX) {
            let current = pending.as_mut().ok_or_else(|| LineFormatError::DanglingMetadata {
                line: line_no,
                text: line.to_string(),
            })?;
            let rank = value
                .trim()
                .parse::<i32>()
                .map_err(|_| LineFormatError::InvalidPosition {
                    line: line_no,
                    value: value.to_string(),
                })?;
            current.position = Position::Ranked(rank);
        } else if let Some(victim) = line.strip_prefix(SUPERSEDE_PREFIX) {
            let current = pending.as_mut().ok_or_else(|| LineFormatError::DanglingMetadata {
                line: line_no,
                text: line.to_string(),
            })?;
            let victim = ImplementationId::new(victim.trim()).map_err(|source| {
                LineFormatError::InvalidIdentifier {
                    line: line_no,
                    source,
                }
            })?;
            current.supersedes.push(victim);
        } else if line.starts_with('#') {
            continue;
        } else {
            let id = ImplementationId::new(line).map_err(|source| {
                LineFormatError::InvalidIdentifier {
                    line: line_no,
                    source,
                }
            })?;
            if let Some(done) = pending.replace(PendingEntry {
                id,
                position: Position::Unranked,
                supersedes: Vec::new(),
            }) {
                done.finish(&mut set);
            }
        }
    }

    if let Some(done) = pending {
        done.finish(&mut set);
    }

    Ok(set)
}

/// Render an entry set in the total order
#[must_use]
pub fn render(set: &EntrySet) -> String {
    let mut out = String::new();
    for entry in set.sorted() {
        render_entry(entry, &mut out);
    }
    out
}

fn render_entry(entry: &Entry, out: &mut String) {
    // Writing into a String cannot fail.
    let _ = writeln!(out, "{}", entry.id());
    if let Position::Ranked(rank) = entry.position() {
        let _ = writeln!(out, "{POSITION_PREFIX}{rank}");
    }
    for victim in entry.supersedes() {
        let _ = writeln!(out, "{SUPERSEDE_PREFIX}{victim}");
    }
}

/// Identifier lines of an artifact, skipping metadata and comments
///
/// This is the view a plain service loader has of the file.
pub fn identifier_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}
