pub mod best_effort;
pub mod credentials;
pub mod device;
pub mod events;
pub mod ledger;
pub mod proxy;

pub use best_effort::best_effort;
pub use credentials::{CredentialResolver, CredentialSource};
pub use device::DeviceHash;
pub use events::{EventStore, NewEvent};
pub use ledger::UploadLedger;
pub use proxy::{BlobProxy, UploadFile};
