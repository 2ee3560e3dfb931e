//! Managed-region document patcher.
//!
//! A managed region is a span of a text document delimited by two literal
//! marker lines. The interior of the region is fully owned by the patcher
//! and replaced on every run; every byte outside the marker pair belongs to
//! the user and is preserved exactly.
//!
//! The patcher computes the document's next text; writing it back (and
//! reading the prior content) is the caller's job.

mod error;

pub use error::{Result, StructureError};

/// Byte offsets of a well-formed managed region within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Offset of the begin marker literal.
    pub begin_at: usize,
    /// First byte strictly after the begin marker's line.
    pub interior_start: usize,
    /// First byte of the line containing the end marker.
    pub interior_end: usize,
    /// Offset of the end marker literal.
    pub end_at: usize,
}

fn find_unique(document: &str, text: &str, marker: &str) -> Result<Option<usize>> {
    let mut occurrences = text.match_indices(marker).map(|(at, _)| at);
    let first = occurrences.next();
    if first.is_some() && occurrences.next().is_some() {
        return Err(StructureError::DuplicateMarker {
            document: document.to_string(),
            marker: marker.to_string(),
        });
    }
    Ok(first)
}

/// Locates the managed region delimited by `begin` and `end` in `text`.
///
/// Returns `Ok(None)` when neither marker is present, and a
/// [`StructureError`] for every malformed marker state: one marker without
/// the other, end before begin, a marker occurring more than once, or both
/// markers sharing a line. The patcher never guesses a boundary.
pub fn find_region(
    document: &str,
    text: &str,
    begin: &str,
    end: &str,
) -> Result<Option<Region>> {
    let begin_at = find_unique(document, text, begin)?;
    let end_at = find_unique(document, text, end)?;

    let (begin_at, end_at) = match (begin_at, end_at) {
        (None, None) => return Ok(None),
        (Some(_), None) => {
            return Err(StructureError::MissingEnd {
                document: document.to_string(),
            })
        }
        (None, Some(_)) => {
            return Err(StructureError::MissingBegin {
                document: document.to_string(),
            })
        }
        (Some(b), Some(e)) => (b, e),
    };

    if end_at < begin_at {
        return Err(StructureError::EndBeforeBegin {
            document: document.to_string(),
        });
    }

    // Interior runs from the byte after the begin marker's newline to the
    // start of the line holding the end marker.
    let interior_start = match text[begin_at..].find('\n') {
        Some(offset) => begin_at + offset + 1,
        None => text.len(),
    };
    let interior_end = text[..end_at].rfind('\n').map(|at| at + 1).unwrap_or(0);

    if interior_end < interior_start {
        return Err(StructureError::MarkersShareLine {
            document: document.to_string(),
        });
    }

    Ok(Some(Region {
        begin_at,
        interior_start,
        interior_end,
        end_at,
    }))
}

fn render_region(begin: &str, end: &str, block: &str) -> String {
    format!("{begin}\n{block}\n{end}\n")
}

/// Computes the next text of `document` with `block` installed as the
/// interior of the managed region delimited by `begin` and `end`.
///
/// - No prior document: the result is the minimal document of begin marker,
///   block, end marker.
/// - Prior document without markers: the region is appended after one blank
///   line; prior content is unchanged.
/// - Prior document with a well-formed marker pair: only the text strictly
///   between the marker lines is replaced.
///
/// Patching twice with the same block yields byte-identical output, so
/// callers may rerun freely.
pub fn patch(
    document: &str,
    existing: Option<&str>,
    begin: &str,
    end: &str,
    block: &str,
) -> Result<String> {
    let text = match existing {
        None | Some("") => return Ok(render_region(begin, end, block)),
        Some(text) => text,
    };

    let Some(region) = find_region(document, text, begin, end)? else {
        let mut next = String::with_capacity(text.len() + block.len() + 64);
        next.push_str(text);
        if !next.ends_with('\n') {
            next.push('\n');
        }
        next.push('\n');
        next.push_str(&render_region(begin, end, block));
        return Ok(next);
    };

    let mut next = String::with_capacity(text.len() + block.len());
    next.push_str(&text[..region.interior_start]);
    next.push_str(block);
    next.push('\n');
    next.push_str(&text[region.interior_end..]);
    Ok(next)
}
