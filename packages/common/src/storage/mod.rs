mod credential;
mod error;
mod traits;

pub mod memory;

pub use credential::{DriveCredential, ServiceAccountKey};
pub use error::StorageError;
pub use traits::{BlobStore, BlobStream, ByteStream, NewBlob};
