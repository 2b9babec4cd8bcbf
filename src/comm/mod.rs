pub mod manager;
pub mod router;

pub use manager::{MessageManager, SyncChannel};
pub use router::{Envelope, Router, SyncPayload};
