use thiserror::Error;

pub type Result<T> = std::result::Result<T, StructureError>;

/// Malformed managed-region markers in a document.
///
/// These are diagnostics, not fatal failures: callers collect them so that
/// structural problems across many files can be reported in one pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("{document}: begin marker present without matching end marker")]
    MissingEnd { document: String },

    #[error("{document}: end marker present without matching begin marker")]
    MissingBegin { document: String },

    #[error("{document}: end marker appears before begin marker")]
    EndBeforeBegin { document: String },

    #[error("{document}: marker {marker:?} occurs more than once")]
    DuplicateMarker { document: String, marker: String },

    #[error("{document}: begin and end markers must be on separate lines")]
    MarkersShareLine { document: String },
}
