//! fce-core
//!
//! In-memory editable mesh engine and binary codec for the FCE3/FCE4/
//! FCE4M vehicle mesh formats: parts, triangles, vertices, attachment
//! dummies, and paint-color sets.
//!
//! The editing model is arena-backed: vertices and triangles live in
//! slot arenas addressed by stable opaque ids, parts own ordered id
//! lists, and the canonical flat wire ordering is computed on demand by
//! the order resolver rather than maintained incrementally. Decode
//! validates structurally before constructing anything; encode is
//! deterministic and byte-exact across re-encodes of the same state.
//!
//! ```
//! use fce_core::{decode, encode, FceVersion};
//!
//! # fn demo(bytes: &[u8]) -> fce_core::Result<()> {
//! let mut mesh = decode(bytes)?;
//! let out = encode(&mut mesh, FceVersion::Fce4, false)?;
//! assert!(fce_core::validate(&out));
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod error;
pub mod info;
pub mod mesh;
pub mod version;

pub use codec::{decode, encode, validate};
pub use error::{FceError, Result};
pub use mesh::order::MeshOrder;
pub use mesh::part::{Part, PartId, MAX_PARTS, MAX_PART_NAME_LEN};
pub use mesh::store::{Triangle, TriangleId, Vertex, VertexId};
pub use mesh::{Color, ColorSet, Dummy, Mesh, MAX_COLORS, MAX_DUMMIES, MAX_DUMMY_NAME_LEN};
pub use version::{sniff_version, FceVersion};
