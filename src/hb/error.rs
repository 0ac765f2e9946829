use thiserror::Error;

/// An error reported by a GSUB or GPOS table provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// None of the active lookups matched anything in the buffer.
    ///
    /// This is not a failure: the buffer is left untouched.
    #[error("no lookup applied to the buffer")]
    NotCovered,
    /// A lookup references data that is missing or out of range.
    #[error("lookup {lookup} references missing subtable data")]
    InvalidSubtable {
        /// Index of the offending lookup.
        lookup: u16,
    },
    /// A feature references a lookup the table does not have.
    #[error("feature references unknown lookup {lookup}")]
    InvalidLookup {
        /// Index of the missing lookup.
        lookup: u16,
    },
}

/// A shaping failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// The output buffers are too small.
    ///
    /// Nothing was written. Grow the buffers to `required` glyphs and retry.
    #[error("output buffers are too small, {required} glyphs required")]
    Capacity {
        /// Required glyph capacity.
        required: usize,
    },
    /// A GSUB or GPOS table could not be applied.
    #[error("layout table application failed: {0}")]
    TableApplication(LayoutError),
    /// The script run does not lie inside the input string.
    #[error("run {pos}..{end} is outside of a string with {len} code units")]
    InvalidRun {
        /// Start of the run.
        pos: usize,
        /// End of the run.
        end: usize,
        /// Length of the string.
        len: usize,
    },
    /// The glyph count does not match the one-to-one character mapping.
    #[error("expected {expected} glyphs for a one-to-one mapping, got {actual}")]
    GlyphCount {
        /// Number of code points in the run.
        expected: usize,
        /// Number of glyphs provided.
        actual: usize,
    },
}

impl ShapeError {
    /// Checks that the call can be retried with larger output buffers.
    #[inline]
    pub fn is_capacity(&self) -> bool {
        matches!(self, ShapeError::Capacity { .. })
    }
}

impl From<LayoutError> for ShapeError {
    #[inline]
    fn from(e: LayoutError) -> Self {
        ShapeError::TableApplication(e)
    }
}
