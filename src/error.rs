use thiserror::Error;

/// Failure modes of a [`crate::repair_seams`] call.
///
/// All variants are terminal: the core never recovers from one of these
/// internally, it surfaces the failure and produces no partial output.
#[derive(Debug, Error)]
pub enum SeamRepairError {
    /// The OBJ stream had no `vt` directives at all.
    #[error("mesh has no UV (vt) data; seam-aware repair requires UVs")]
    MeshMissingUvs,

    /// The OBJ stream produced no triangles.
    #[error("mesh has no faces (f directives)")]
    MeshNoFaces,

    /// A face corner referenced no UV index where one was required.
    #[error("face {face_index} is missing a UV index on corner {corner}")]
    FaceMissingUv {
        /// Index of the offending face in parse order.
        face_index: usize,
        /// Which corner (0, 1 or 2) of the face lacks a UV index.
        corner: usize,
    },

    /// An OBJ line could not be parsed as expected.
    #[error("line {line}: {message}")]
    MalformedObj {
        /// 1-based source line number.
        line: usize,
        /// Human-readable description of the problem.
        message: String,
    },

    /// An enumerated configuration field held a value that does not make
    /// sense for the operation being requested.
    #[error("invalid config: {field} = {value:?}")]
    InvalidConfig {
        /// Name of the offending configuration field.
        field: &'static str,
        /// The value supplied, rendered for diagnostics.
        value: String,
    },
}

pub type Result<T> = std::result::Result<T, SeamRepairError>;
