//! Resolution against the remote repository and the local filesystem.

mod local;
mod remote;

pub use local::LocalResolver;
pub use remote::{QueryClient, RemoteResolver, Resolved};
