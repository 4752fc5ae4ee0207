mod auth;
mod drive;

pub use auth::{DRIVE_FILE_SCOPE, GoogleAuth, GoogleEndpoints, service_account_assertion};
pub use drive::DriveBlobStore;
