use broadside::transport::line::{FrameReader, FrameWriter};
use tokio::io::AsyncWriteExt;
use tokio::time::{timeout, Duration};

#[tokio::test(flavor = "multi_thread")]
async fn splits_frames_and_strips_line_endings() -> anyhow::Result<()> {
    let (mut client, server) = tokio::io::duplex(1024);
    let mut reader = FrameReader::new(server);

    client.write_all(b"Hello|1\r\nplayBot\nAttack|1|2").await?;
    client.write_all(b"|3\n").await?;
    drop(client);

    assert_eq!(reader.next_frame().await?.as_deref(), Some("Hello|1"));
    assert_eq!(reader.next_frame().await?.as_deref(), Some("playBot"));
    assert_eq!(reader.next_frame().await?.as_deref(), Some("Attack|1|2|3"));
    assert_eq!(reader.next_frame().await?, None);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn last_unterminated_line_is_a_frame() -> anyhow::Result<()> {
    let (mut client, server) = tokio::io::duplex(1024);
    let mut reader = FrameReader::new(server);
    client.write_all(b"getState|4").await?;
    drop(client);
    assert_eq!(reader.next_frame().await?.as_deref(), Some("getState|4"));
    assert_eq!(reader.next_frame().await?, None);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn long_frames_are_refused() -> anyhow::Result<()> {
    let (mut client, server) = tokio::io::duplex(64 * 1024);
    let mut reader = FrameReader::with_max_len(server, 16);
    client.write_all(b"0123456789abcdef\n").await?;
    client.write_all(b"0123456789abcdefg\n").await?;
    assert_eq!(reader.next_frame().await?.as_deref(), Some("0123456789abcdef"));
    assert!(reader.next_frame().await.unwrap_err().to_string().contains("too large"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_utf8_is_an_error() -> anyhow::Result<()> {
    let (mut client, server) = tokio::io::duplex(1024);
    let mut reader = FrameReader::new(server);
    client.write_all(&[0xff, 0xfe, b'\n']).await?;
    assert!(reader.next_frame().await.is_err());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelled_reads_lose_nothing() -> anyhow::Result<()> {
    let (mut client, server) = tokio::io::duplex(1024);
    let mut reader = FrameReader::new(server);

    client.write_all(b"Attack|1|").await?;
    assert!(timeout(Duration::from_millis(50), reader.next_frame()).await.is_err());
    client.write_all(b"4|5\n").await?;
    assert_eq!(reader.next_frame().await?.as_deref(), Some("Attack|1|4|5"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn writer_appends_newlines() -> anyhow::Result<()> {
    let (client, server) = tokio::io::duplex(1024);
    let mut writer = FrameWriter::new(client);
    let mut reader = FrameReader::new(server);
    writer.send("Welcome|3").await?;
    writer.send("YourTurn|1").await?;
    writer.shutdown().await?;
    assert_eq!(reader.next_frame().await?.as_deref(), Some("Welcome|3"));
    assert_eq!(reader.next_frame().await?.as_deref(), Some("YourTurn|1"));
    assert_eq!(reader.next_frame().await?, None);
    Ok(())
}
