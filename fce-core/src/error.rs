//! Error types for mesh editing and FCE codec operations

/// Error type for mesh editing and FCE codec operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FceError {
    /// Buffer head does not identify any known FCE format.
    #[error("Unrecognized FCE header (leading word 0x{0:08X})")]
    UnknownMagic(u32),

    /// Structural decode failure: truncated buffer, out-of-bounds
    /// offset/count, or a reference outside the flat tables.
    #[error("Malformed FCE data: {0}")]
    Malformed(String),

    /// Operation was given a vertex/triangle/part id that is not live.
    #[error("Invalid {kind} reference: {id}")]
    InvalidReference {
        /// Entity kind ("vertex", "triangle", "part").
        kind: &'static str,
        /// Raw id value.
        id: u32,
    },

    /// Index or count beyond current bounds.
    #[error("{what} out of range: {value} (limit {limit})")]
    OutOfRange {
        /// What was being indexed.
        what: &'static str,
        /// Offending value.
        value: usize,
        /// Exclusive limit in effect.
        limit: usize,
    },

    /// Bulk geometry insertion with mismatched array lengths or
    /// out-of-range face indices.
    #[error("Malformed geometry: {0}")]
    MalformedGeometry(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, FceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            FceError::UnknownMagic(0xDEAD_BEEF).to_string(),
            "Unrecognized FCE header (leading word 0xDEADBEEF)"
        );
        assert_eq!(
            FceError::OutOfRange {
                what: "part rank",
                value: 64,
                limit: 64
            }
            .to_string(),
            "part rank out of range: 64 (limit 64)"
        );
        assert_eq!(
            FceError::InvalidReference {
                kind: "vertex",
                id: 7
            }
            .to_string(),
            "Invalid vertex reference: 7"
        );
    }
}
