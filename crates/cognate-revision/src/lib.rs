//! Cognate revision analysis
//!
//! Decides what must be regenerated and retrained after a source edit.
//! Each previously compiled declaration left a fingerprint of its canonical
//! specification in the header of its generated source file; this crate
//! reads those fingerprints back, compares them against the current
//! program, and propagates revisions forward through the dependor graph.

pub mod fingerprint;
pub mod oracle;
pub mod status;
pub mod store;

pub use fingerprint::{DISCLAIMER, Fingerprint, FingerprintError, write_generated_source};
pub use oracle::{RevisionError, classify};
pub use status::{LearnerRevision, RevisionReport, RevisionStatus};
pub use store::{ArtifactPresence, FingerprintStore};
