//! One push connection from handshake to disconnect.
//!
//! The first frame must be `Hello|<userId>`. After that the session reads
//! action frames and runs them against the [`GameService`], while a writer
//! task drains the connection's outbound queue. Replies and pushes share that
//! queue, so a client sees them in the order the core produced them.

use tokio::io::{AsyncRead, AsyncWrite};

use crate::game::{GameError, UserId};
use crate::protocol::{Action, Event, MatchmakingCommand, ParseError};
use crate::registry::{ConnectionHandle, Outbound, OutboundReceiver};
use crate::service::GameService;
use crate::transport::line::{FrameReader, FrameWriter};

pub struct PushSession<R, W> {
    service: GameService,
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
}

impl<R, W> PushSession<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(service: GameService, reader: R, writer: W) -> Self {
        Self {
            service,
            reader: FrameReader::new(reader),
            writer: FrameWriter::new(writer),
        }
    }

    /// Wait for `Hello`. `None` if the peer left first.
    async fn handshake(&mut self) -> anyhow::Result<Option<UserId>> {
        loop {
            let Some(frame) = self.reader.next_frame().await? else {
                return Ok(None);
            };
            match Action::parse(&frame) {
                Ok(Action::Hello { user }) => return Ok(Some(user)),
                Err(ParseError::Empty) => continue,
                Ok(other) => {
                    log::debug!("action before Hello: {:?}", other);
                    self.writer
                        .send(&Event::Error("Expected Hello|<userId> first".to_string()).encode())
                        .await?;
                    return Err(anyhow::anyhow!("Expected Hello, got another action"));
                }
                Err(e) => {
                    self.writer.send(&Event::Error(e.to_string()).encode()).await?;
                    return Err(anyhow::anyhow!("Invalid handshake: {}", e));
                }
            }
        }
    }

    /// Serve the connection until either side closes it.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let Some(user) = self.handshake().await? else {
            return Ok(());
        };

        let (handle, rx) = ConnectionHandle::new();
        if let Err(e) = self.service.registry().register(user, handle.clone()) {
            log::warn!("refused connection for user {}: {}", user, e);
            self.writer.send(&Event::Error(e.to_string()).encode()).await?;
            if let Err(e) = self.writer.shutdown().await {
                log::debug!("shutdown of refused connection failed: {}", e);
            }
            return Err(e.into());
        }
        handle.send(Event::Welcome(user));

        let PushSession {
            service,
            mut reader,
            writer,
        } = self;
        let writer_task = tokio::spawn(write_loop(writer, rx));

        let result = read_loop(&service, user, &handle, &mut reader).await;
        service.disconnect(user, handle.id()).await;
        drop(handle);
        if let Err(e) = writer_task.await {
            log::warn!("writer task for user {} failed: {}", user, e);
        }
        result
    }
}

/// Convenience wrapper for a split stream.
pub async fn serve_connection<R, W>(service: GameService, reader: R, writer: W) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    PushSession::new(service, reader, writer).run().await
}

async fn read_loop<R: AsyncRead + Unpin>(
    service: &GameService,
    user: UserId,
    handle: &ConnectionHandle,
    reader: &mut FrameReader<R>,
) -> anyhow::Result<()> {
    loop {
        let frame = tokio::select! {
            frame = reader.next_frame() => frame,
            _ = handle.closed() => {
                log::debug!("connection of user {} closed by the server", user);
                return Ok(());
            }
        };
        let frame = match frame {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok(()),
            Err(e) => {
                handle.send(Event::Error(e.to_string()));
                return Err(e);
            }
        };

        match Action::parse(&frame) {
            Ok(action) => perform(service, user, handle, action).await,
            Err(ParseError::Empty) => {}
            Err(ParseError::UnknownAction(name)) => {
                log::debug!("user {} sent unknown action {}", user, name);
                handle.send(Event::UnknownAction(name));
            }
            Err(e) => {
                handle.send(Event::Error(e.to_string()));
            }
        }
    }
}

async fn perform(service: &GameService, user: UserId, handle: &ConnectionHandle, action: Action) {
    let result: Result<(), GameError> = match action {
        Action::Hello { .. } => {
            handle.send(Event::Error("Already identified".to_string()));
            Ok(())
        }
        Action::CreateGame => service.create_game(user).await.map(drop),
        Action::PlayBot => service.create_bot_game(user).await.map(drop),
        Action::JoinGame { game } => service.join_game(game, user).await.map(drop),
        Action::PlaceShips { game, player, ships } => {
            if player == user {
                service.place_ships(game, user, &ships).await.map(drop)
            } else {
                Err(GameError::UnknownParticipant { game, user: player })
            }
        }
        Action::PassTurn { game } => service.pass_turn(game, user).await.map(drop),
        Action::Attack { game, x, y } => service.attack(game, user, x, y).await.map(drop),
        Action::Chat { game, text } => service.chat(game, user, &text).await,
        Action::Matchmaking(MatchmakingCommand::Random) => service.enqueue_match(user).await.map(drop),
        Action::Matchmaking(MatchmakingCommand::Cancel) => {
            service.cancel_match(user);
            Ok(())
        }
        Action::Abandon { game } => service.abandon(game, user).await.map(drop),
        Action::Rematch { game } => service.request_rematch(game, user).await.map(drop),
        Action::GetState { game } => service.snapshot(game, user).await.map(|snapshot| {
            handle.send(Event::game_state(&snapshot));
        }),
    };
    if let Err(e) = result {
        log::debug!("action from user {} rejected: {}", user, e);
        handle.send(Event::Error(e.to_string()));
    }
}

async fn write_loop<W: AsyncWrite + Unpin>(mut writer: FrameWriter<W>, mut rx: OutboundReceiver) {
    while let Some(item) = rx.recv().await {
        match item {
            Outbound::Event(event) => {
                if let Err(e) = writer.send(&event.encode()).await {
                    log::debug!("dropping connection after write failure: {}", e);
                    break;
                }
            }
            Outbound::Close(reason) => {
                if let Err(e) = writer.send(&Event::Error(reason).encode()).await {
                    log::debug!("close notice not delivered: {}", e);
                }
                break;
            }
        }
    }
    if let Err(e) = writer.shutdown().await {
        log::debug!("shutdown after close failed: {}", e);
    }
}
