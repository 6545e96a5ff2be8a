//! Remote synchronization against a hosted row store.
//!
//! Each data key is stored as one row `{key, content, updated_at}` and
//! replaced whole on every push, so concurrent writers resolve last write
//! wins per key. A realtime channel signals row changes; the receiver
//! reacts by pulling every row again.

pub mod client;
pub mod error;
pub mod key;
pub mod memory;
pub mod protocol;
pub mod realtime;
pub mod remote;

pub use client::{HostedClient, HostedConnector};
pub use error::RemoteError;
pub use key::{DataKey, Module};
pub use memory::{MemoryConnector, MemoryRemote};
pub use protocol::{ChannelMessage, RemoteRow};
pub use realtime::Subscription;
pub use remote::{ChangeNotifier, RemoteConnector, RemoteStore};
