//! Services module - the collaborators the render pipeline drives.
//!
//! # Components
//!
//! - [`Encoder`]: the narrow contract through which a configuration becomes pixels.
//!   [`QrEncoder`] is the default implementation; symbol construction (versions, Reed–Solomon,
//!   masking) is delegated to the `qrcode` crate and treated as opaque.
//! - [`SizeEstimate`] / [`estimate`]: display-only estimate of the exported file size.
//! - [`ExportManager`]: turns the last committed surface into a named PNG [`Artifact`], and
//!   [`ArtifactSink`] hands it to the host ([`DirectorySink`] writes it to disk).
//!
//! None of these services hold session state; the pipeline and session pass everything in.

pub mod encoder;
pub mod export;
pub mod size_estimate;

pub use encoder::{Background, EncodeError, EncodeRequest, Encoder, QrEncoder};
pub use export::{
    Artifact, ArtifactSink, DirectorySink, ExportError, ExportManager, artifact_file_name,
};
pub use size_estimate::{SizeEstimate, estimate};
