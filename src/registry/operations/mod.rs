//! Registry operations, one service per protocol concern
//!
//! Every service holds the same shared [`RegistryContext`](super::context::RegistryContext)
//! and is cheap to clone.

pub mod blob_reader;
pub mod blob_writer;
pub mod manifest_operations;
pub mod mount_operations;
pub mod repository_operations;

pub use blob_reader::{BlobContent, BlobReader, BlobStream, FetchMode, MAX_REDIRECT_HOPS};
pub use blob_writer::{BlobWriter, DOCKER_UPLOAD_UUID};
pub use manifest_operations::{DOCKER_CONTENT_DIGEST, ManifestPayload, ManifestService};
pub use mount_operations::MountService;
pub use repository_operations::TagService;
