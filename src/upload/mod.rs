//! Upload inputs and per-upload state
//!
//! [`UploadSource`] is chosen once when an upload starts and decides between
//! the monolithic and the chunked path. [`UploadSession`] is the value threaded
//! through each step of the upload. [`ObservedStream`] hashes and counts body
//! bytes as the transport pulls them.

pub mod session;
pub mod source;
pub mod streaming;

pub use session::{BlobDescriptor, UploadSession, UploadState};
pub use source::UploadSource;
pub use streaming::{DEFAULT_READ_CHUNK, Observed, ObservedStream, reader_stream};
