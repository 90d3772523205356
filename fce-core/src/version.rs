//! FCE format versions and version sniffing

use core::fmt;
use core::str::FromStr;

use crate::error::{FceError, Result};

/// Wire version word for FCE4.
pub const FCE4_VERSION_WORD: u32 = 0x0010_1014;
/// Wire version word for FCE4M.
pub const FCE4M_VERSION_WORD: u32 = 0x0010_1015;

/// FCE format version.
///
/// FCE3 carries no version word; any buffer whose leading word is not
/// one of the FCE4-family words is treated as FCE3, provided it is at
/// least one FCE3 header long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FceVersion {
    /// Original format: single model, no damage tables.
    Fce3,
    /// Adds damage geometry, animation flags, and two color categories.
    Fce4,
    /// FCE4 variant with a vertex-dependent trailing reserve area.
    Fce4M,
}

impl FceVersion {
    /// Fixed header size in bytes for this version.
    pub const fn header_size(self) -> usize {
        match self {
            FceVersion::Fce3 => 0x1F04,
            FceVersion::Fce4 | FceVersion::Fce4M => 0x2038,
        }
    }

    /// Total encoded file size for the given vertex/triangle counts.
    pub const fn file_size(self, num_vertices: usize, num_triangles: usize) -> usize {
        match self {
            FceVersion::Fce3 => 0x1F04 + 80 * num_vertices + 56 * num_triangles,
            FceVersion::Fce4 => 0x2038 + 140 * num_vertices + 68 * num_triangles,
            FceVersion::Fce4M => 0x2038 + 141 * num_vertices + 68 * num_triangles,
        }
    }

    /// Version word written at offset 0, if this version has one.
    pub const fn version_word(self) -> Option<u32> {
        match self {
            FceVersion::Fce3 => None,
            FceVersion::Fce4 => Some(FCE4_VERSION_WORD),
            FceVersion::Fce4M => Some(FCE4M_VERSION_WORD),
        }
    }
}

impl fmt::Display for FceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FceVersion::Fce3 => write!(f, "FCE3"),
            FceVersion::Fce4 => write!(f, "FCE4"),
            FceVersion::Fce4M => write!(f, "FCE4M"),
        }
    }
}

impl FromStr for FceVersion {
    type Err = FceError;

    /// Canonical normalization of the ad hoc version spellings used by
    /// calling scripts ("3", "4", "4m", "4M", "5").
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "3" => Ok(FceVersion::Fce3),
            "4" => Ok(FceVersion::Fce4),
            "4m" | "4M" | "5" => Ok(FceVersion::Fce4M),
            other => Err(FceError::Malformed(format!(
                "unknown FCE version \"{other}\""
            ))),
        }
    }
}

/// Identify the FCE version of a byte buffer from its header prefix.
///
/// Returns `UnknownMagic` when the buffer is too short to be any FCE
/// file; an unrecognized leading word on a header-sized buffer means
/// FCE3, which stores no version word.
pub fn sniff_version(bytes: &[u8]) -> Result<FceVersion> {
    if bytes.len() < 4 {
        return Err(FceError::UnknownMagic(0));
    }
    let word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    match word {
        FCE4_VERSION_WORD => Ok(FceVersion::Fce4),
        FCE4M_VERSION_WORD => Ok(FceVersion::Fce4M),
        other => {
            if bytes.len() >= FceVersion::Fce3.header_size() {
                Ok(FceVersion::Fce3)
            } else {
                Err(FceError::UnknownMagic(other))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalization() {
        assert_eq!("3".parse::<FceVersion>().unwrap(), FceVersion::Fce3);
        assert_eq!("4".parse::<FceVersion>().unwrap(), FceVersion::Fce4);
        assert_eq!("4m".parse::<FceVersion>().unwrap(), FceVersion::Fce4M);
        assert_eq!("4M".parse::<FceVersion>().unwrap(), FceVersion::Fce4M);
        assert_eq!("5".parse::<FceVersion>().unwrap(), FceVersion::Fce4M);
        assert!("6".parse::<FceVersion>().is_err());
    }

    #[test]
    fn test_sniff_fce4_family() {
        let mut buf = vec![0u8; 16];
        buf[0..4].copy_from_slice(&FCE4_VERSION_WORD.to_le_bytes());
        assert_eq!(sniff_version(&buf).unwrap(), FceVersion::Fce4);
        buf[0..4].copy_from_slice(&FCE4M_VERSION_WORD.to_le_bytes());
        assert_eq!(sniff_version(&buf).unwrap(), FceVersion::Fce4M);
    }

    #[test]
    fn test_sniff_fce3_requires_full_header() {
        let buf = vec![0u8; FceVersion::Fce3.header_size()];
        assert_eq!(sniff_version(&buf).unwrap(), FceVersion::Fce3);
        assert!(matches!(
            sniff_version(&buf[..128]),
            Err(FceError::UnknownMagic(_))
        ));
        assert!(matches!(sniff_version(&[]), Err(FceError::UnknownMagic(0))));
    }

    #[test]
    fn test_file_size() {
        assert_eq!(FceVersion::Fce3.file_size(0, 0), 0x1F04);
        assert_eq!(FceVersion::Fce4.file_size(1, 1), 0x2038 + 140 + 68);
        assert_eq!(FceVersion::Fce4M.file_size(1, 1), 0x2038 + 141 + 68);
    }
}
