//! Pipeline stages for upload-validate-render.
//!
//! Each submodule implements exactly one step so each is testable on its
//! own; the report views live separately in [`crate::report`].
//!
//! ## Data Flow
//!
//! ```text
//! intake ──▶ transfer ──▶ normalize ──▶ report
//! (gate)     (multipart)   (shape)      (table / chart / pdf)
//! ```
//!
//! 1. [`intake`]   : describe the selected file and gate it on type and size
//!    before anything touches the network
//! 2. [`transfer`] : stream the file to the kind-specific endpoint as a
//!    single-part multipart body, counting bytes for progress
//! 3. [`normalize`]: branch on the response shape (bare list or bundle)
//!    and produce the canonical [`crate::output::ValidationResult`]

pub mod intake;
pub mod normalize;
pub mod transfer;
