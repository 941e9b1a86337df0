//! Listeners for the push and request/response surfaces.

use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::service::GameService;
use crate::session::serve_connection;
use crate::skeleton::Skeleton;
use crate::transport::tcp::TcpTransport;

/// Bind both listeners and serve until one of them fails to bind.
pub async fn run(config: ServerConfig, service: GameService) -> anyhow::Result<()> {
    let push = TcpListener::bind(config.push_bind).await?;
    let rpc = TcpListener::bind(config.rpc_bind).await?;
    log::info!("push connections on {}", push.local_addr()?);
    log::info!("rpc connections on {}", rpc.local_addr()?);
    tokio::join!(accept_push(push, service.clone()), accept_rpc(rpc, service));
    Ok(())
}

/// Accept push connections forever, one task each.
pub async fn accept_push(listener: TcpListener, service: GameService) {
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                log::warn!("push accept failed: {}", e);
                continue;
            }
        };
        if let Err(e) = stream.set_nodelay(true) {
            log::debug!("set_nodelay failed for {}: {}", addr, e);
        }
        log::debug!("push connection from {}", addr);
        let service = service.clone();
        tokio::spawn(async move {
            let (reader, writer) = stream.into_split();
            if let Err(e) = serve_connection(service, reader, writer).await {
                log::info!("push session from {} ended: {}", addr, e);
            }
        });
    }
}

/// Accept RPC connections forever, one skeleton each.
pub async fn accept_rpc(listener: TcpListener, service: GameService) {
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                log::warn!("rpc accept failed: {}", e);
                continue;
            }
        };
        if let Err(e) = stream.set_nodelay(true) {
            log::debug!("set_nodelay failed for {}: {}", addr, e);
        }
        log::debug!("rpc connection from {}", addr);
        let service = service.clone();
        tokio::spawn(async move {
            let mut skeleton = Skeleton::new(service, TcpTransport::new(stream));
            if let Err(e) = skeleton.run().await {
                log::info!("rpc session from {} ended: {}", addr, e);
            }
        });
    }
}
