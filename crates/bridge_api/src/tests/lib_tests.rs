use super::*;
use endpoints::memory::{MemoryStatusSource, RecordingCommandSink};

const SETTLE: Duration = Duration::from_millis(25);

fn playing(channel_number: i64) -> PlaybackStatus {
    PlaybackStatus {
        status: "playing".into(),
        network_name: "WXYZ".into(),
        channel_number,
        timestamp: "2024-01-01T00:00:00Z".into(),
        title: "News".into(),
    }
}

fn setup(
    source: MemoryStatusSource,
) -> (BridgeContext, MemoryStatusSource, RecordingCommandSink) {
    let sink = RecordingCommandSink::new();
    let ctx = BridgeContext::new(source.clone(), sink.clone(), SETTLE);
    (ctx, source, sink)
}

#[tokio::test]
async fn get_status_returns_source_document() {
    let (ctx, _source, sink) = setup(MemoryStatusSource::with_status(&playing(4)));
    let status = get_status(&ctx).await.expect("status");
    assert_eq!(status, playing(4));
    assert!(sink.sent().await.is_empty());
}

#[tokio::test]
async fn get_status_maps_read_failures_to_internal() {
    let (ctx, source, sink) = setup(MemoryStatusSource::unavailable());
    let err = get_status(&ctx).await.expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Internal);
    assert_eq!(err.message, "Error getting status");

    source.set_raw(Some(b"{\"status\":".to_vec())).await;
    let err = get_status(&ctx).await.expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Internal);
    assert!(sink.sent().await.is_empty());
}

#[tokio::test]
async fn step_writes_one_command_then_rereads_after_delay() {
    for direction in [Direction::Up, Direction::Down] {
        let (ctx, source, sink) = setup(MemoryStatusSource::with_status(&playing(5)));
        let status = step_channel(&ctx, direction).await.expect("status");
        assert_eq!(status.channel_number, 5);

        let sent = sink.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].command, ChannelCommand::Step(direction));

        let reads = source.reads().await;
        assert_eq!(reads.len(), 1);
        assert!(reads[0].duration_since(sent[0].at) >= SETTLE);
    }
}

#[tokio::test]
async fn direct_tune_writes_requested_channel() {
    let (ctx, source, sink) = setup(MemoryStatusSource::with_status(&playing(7)));
    let status = set_channel_direct(&ctx, 7).await.expect("status");
    assert_eq!(status.channel_number, 7);

    let sent = sink.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(
        serde_json::to_string(&sent[0].command).expect("json"),
        r#"{"command":"direct","channel":7}"#
    );
    let reads = source.reads().await;
    assert_eq!(reads.len(), 1);
    assert!(reads[0].duration_since(sent[0].at) >= SETTLE);
}

#[tokio::test]
async fn direct_tune_rejects_non_positive_channels_without_writing() {
    let (ctx, source, sink) = setup(MemoryStatusSource::with_status(&playing(3)));
    for channel in [0, -1, i64::MIN] {
        let err = set_channel_direct(&ctx, channel)
            .await
            .expect_err("should fail");
        assert_eq!(err.code, ErrorCode::Validation);
        assert_eq!(err.message, "Channel number must be positive");
    }
    assert!(sink.sent().await.is_empty());
    assert!(source.reads().await.is_empty());
}

#[tokio::test]
async fn sink_failure_skips_status_read() {
    let source = MemoryStatusSource::with_status(&playing(3));
    let ctx = BridgeContext::new(source.clone(), RecordingCommandSink::refusing(), SETTLE);
    let err = step_channel(&ctx, Direction::Up)
        .await
        .expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Internal);
    assert_eq!(err.message, "Error changing channel");
    assert!(source.reads().await.is_empty());
}

#[tokio::test]
async fn reread_failure_keeps_the_written_command() {
    let (ctx, _source, sink) = setup(MemoryStatusSource::with_raw("not json"));
    let err = set_channel_direct(&ctx, 12).await.expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Internal);
    assert_eq!(err.message, "Error getting status");
    assert_eq!(sink.sent().await.len(), 1);
}
