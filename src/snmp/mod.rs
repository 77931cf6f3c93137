//! Protocol plumbing: OIDs, owned values and the bulk-walk capability.

use crate::error::Result;

pub mod oid;
pub mod v2c;
pub mod value;

pub use oid::Oid;
pub use v2c::{SessionOptions, SnmpClientV2c};
pub use value::{Value, VarBind};

/// A session able to walk a subtree with GETBULK.
///
/// Implementations stream each varbind under `root` to `on_each` in the order
/// the agent returned them and stop at the end of the subtree. An error
/// returned by `on_each` aborts the walk and is passed through unchanged.
#[allow(async_fn_in_trait)]
pub trait BulkWalker {
    /// Address of the agent, for errors and logs.
    fn target(&self) -> &str;

    async fn bulk_walk<F>(&mut self, root: &Oid, on_each: F) -> Result<()>
    where
        F: FnMut(VarBind) -> Result<()>;
}
