use tokio::sync::mpsc;

use crate::transport::Transport;

/// One end of an in-process channel pair.
pub struct InMemoryTransport<M> {
    tx: mpsc::UnboundedSender<M>,
    rx: mpsc::UnboundedReceiver<M>,
}

impl<M> InMemoryTransport<M> {
    pub fn pair() -> (Self, Self) {
        let (tx1, rx1) = mpsc::unbounded_channel();
        let (tx2, rx2) = mpsc::unbounded_channel();
        (Self { tx: tx1, rx: rx2 }, Self { tx: tx2, rx: rx1 })
    }
}

#[async_trait::async_trait]
impl<M: Send + 'static> Transport<M> for InMemoryTransport<M> {
    async fn send(&mut self, msg: M) -> anyhow::Result<()> {
        self.tx
            .send(msg)
            .map_err(|_| anyhow::anyhow!("Channel closed"))
    }

    async fn recv(&mut self) -> anyhow::Result<M> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| anyhow::anyhow!("Channel closed"))
    }
}
