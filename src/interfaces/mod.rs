pub mod cli;
pub mod line;

use anyhow::Result;
use async_trait::async_trait;

/// A presentation of one [`crate::core::session::QuerySession`]. Frontends
/// own their session and drive it until the user leaves.
#[async_trait(?Send)]
pub trait Frontend {
    async fn run(&mut self) -> Result<()>;
}
