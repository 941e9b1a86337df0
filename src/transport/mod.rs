//! Message transports.
//!
//! [`Transport`] moves whole typed messages and backs the request/response
//! surface. [`line`] frames the newline-delimited text of push connections.

pub mod in_memory;
pub mod line;
pub mod tcp;

#[async_trait::async_trait]
pub trait Transport<M>: Send {
    async fn send(&mut self, msg: M) -> anyhow::Result<()>;
    async fn recv(&mut self) -> anyhow::Result<M>;
}
