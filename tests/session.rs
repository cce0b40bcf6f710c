use pretty_assertions::assert_eq;
use stream_restore_volume::{
    Category, ChannelMap, ChannelVolumes, ExitStatus, MemoryTransport, Mutation, Operation,
    OperationKind, Record, StreamRestoreClient, StreamRestoreError, Volume,
};

fn database() -> Vec<Record> {
    vec![
        Record::application("mpv")
            .with_stereo_volume(Volume::from_fraction(0.5))
            .with_device("hdmi"),
        Record::new("source-output-by-application-name:arecord"),
        Record::application("firefox").with_stereo_volume(Volume::NORM).with_muted(true),
        Record::new(Category::MediaRole.key("event")),
    ]
}

fn seeded() -> MemoryTransport {
    MemoryTransport::with_records(database())
}

async fn run(
    transport: MemoryTransport,
    operation: Operation,
) -> (MemoryTransport, Result<ExitStatus, StreamRestoreError>, String) {
    let mut client = StreamRestoreClient::new(transport);
    let mut out = Vec::new();
    let result = client.run(operation, &mut out).await;
    let output = String::from_utf8(out).unwrap();
    (client.into_transport(), result, output)
}

#[tokio::test]
async fn test_report_all_lists_entries_in_order() {
    let (transport, result, output) = run(seeded(), Operation::report_all()).await;

    assert_eq!(result.unwrap(), ExitStatus::Success);
    assert_eq!(
        output,
        "client: mpv 50%\nclient: firefox 100% (muted)\nclient: event 100%\n"
    );
    assert!(transport.writes().is_empty());
    assert!(!transport.is_connected());
}

#[tokio::test]
async fn test_report_with_devices() {
    let operation = Operation::report_all().with_show_device(true);
    let (_, result, output) = run(seeded(), operation).await;

    assert_eq!(result.unwrap(), ExitStatus::Success);
    assert_eq!(
        output,
        "client: mpv 50% [hdmi]\n\
         client: firefox 100% [default] (muted)\n\
         client: event 100% [default]\n"
    );
}

#[tokio::test]
async fn test_report_single_client() {
    let (_, result, output) = run(seeded(), Operation::report("firefox")).await;

    assert_eq!(result.unwrap(), ExitStatus::Success);
    assert_eq!(output, "client: firefox 100% (muted)\n");
}

#[tokio::test]
async fn test_empty_database_succeeds_without_output() {
    let (transport, result, output) = run(MemoryTransport::new(), Operation::report_all()).await;

    assert_eq!(result.unwrap(), ExitStatus::Success);
    assert_eq!(output, "");
    assert_eq!(transport.read_count(), 1);
}

#[tokio::test]
async fn test_unknown_target_is_not_found() {
    let records = vec![
        Record::application("mpv"),
        Record::application("firefox"),
        Record::application("vlc"),
    ];
    let operation = Operation::mutate("paplay", Mutation::Mute);
    let (transport, result, output) = run(MemoryTransport::with_records(records), operation).await;

    assert_eq!(result.unwrap(), ExitStatus::ClientNotFound);
    assert_eq!(output, "");
    assert!(transport.writes().is_empty());
}

#[tokio::test]
async fn test_report_of_unknown_target_is_not_found() {
    let (_, result, _) = run(seeded(), Operation::report("paplay")).await;
    assert_eq!(result.unwrap(), ExitStatus::ClientNotFound);
}

#[tokio::test]
async fn test_set_volume_replaces_only_target() {
    let before = database();
    let operation = Operation::mutate("mpv", Mutation::SetVolume(0.66));
    let (transport, result, output) =
        run(MemoryTransport::with_records(before.clone()), operation).await;

    assert_eq!(result.unwrap(), ExitStatus::Success);
    assert_eq!(output, "");

    let mpv = transport.record(&before[0].key).unwrap();
    assert_eq!(mpv.volume, ChannelVolumes::uniform(2, Volume(43253)));
    assert_eq!(mpv.device.as_deref(), Some("hdmi"));

    assert_eq!(transport.records().len(), before.len());
    for untouched in &before[1..] {
        assert_eq!(transport.record(&untouched.key), Some(untouched));
    }
}

#[tokio::test]
async fn test_media_role_entries_can_be_updated() {
    let key = Category::MediaRole.key("event");
    let operation =
        Operation::mutate("event", Mutation::AdjustVolume(0.25)).with_device("speakers");
    let (transport, result, _) = run(seeded(), operation).await;

    assert_eq!(result.unwrap(), ExitStatus::Success);
    let event = transport.record(&key).unwrap();
    assert_eq!(event.channel_map, ChannelMap::stereo());
    assert_eq!(event.volume, ChannelVolumes::uniform(2, Volume(0x4000)));
    assert_eq!(event.device.as_deref(), Some("speakers"));
    assert_eq!(transport.writes().len(), 1);
}

#[tokio::test]
async fn test_toggle_mute_twice_restores_state() {
    let mut transport = seeded();
    for _ in 0..2 {
        let operation = Operation::mutate("firefox", Mutation::ToggleMute);
        let (t, result, _) = run(transport, operation).await;
        assert_eq!(result.unwrap(), ExitStatus::Success);
        transport = t;
    }
    assert_eq!(transport.records(), database().as_slice());
    assert_eq!(transport.writes().len(), 2);
}

#[tokio::test]
async fn test_connection_failure_is_general_failure() {
    let transport = seeded().with_connection_failure("Connection refused");
    let (transport, result, output) = run(transport, Operation::report_all()).await;

    assert!(matches!(
        result,
        Err(StreamRestoreError::ConnectionFailed(reason)) if reason == "Connection refused"
    ));
    assert_eq!(output, "");
    assert_eq!(transport.read_count(), 0);
}

#[tokio::test]
async fn test_absent_extension_exits_quietly() {
    let transport = seeded().with_extension_version(0);
    let (transport, result, output) = run(transport, Operation::report_all()).await;

    assert_eq!(result.unwrap(), ExitStatus::Success);
    assert_eq!(output, "");
    assert_eq!(transport.read_count(), 0);
}

#[tokio::test]
async fn test_extension_query_dispatch_failure() {
    let transport = seeded().failing_dispatch(OperationKind::Query);
    let (_, result, _) = run(transport, Operation::report_all()).await;

    assert!(matches!(
        result,
        Err(StreamRestoreError::Operation { operation: OperationKind::Query, .. })
    ));
}

#[tokio::test]
async fn test_read_dispatch_failure() {
    let transport = seeded().failing_dispatch(OperationKind::Read);
    let (_, result, _) = run(transport, Operation::report("mpv")).await;

    assert!(matches!(
        result,
        Err(StreamRestoreError::Operation { operation: OperationKind::Read, .. })
    ));
}

#[tokio::test]
async fn test_write_dispatch_failure() {
    let transport = seeded().failing_dispatch(OperationKind::Write);
    let (transport, result, _) = run(transport, Operation::mutate("mpv", Mutation::Unmute)).await;

    assert!(matches!(
        result,
        Err(StreamRestoreError::Operation { operation: OperationKind::Write, .. })
    ));
    assert_eq!(transport.records(), database().as_slice());
}

#[tokio::test]
async fn test_rejected_write_is_failure() {
    let transport = seeded().rejecting(OperationKind::Write);
    let (_, result, _) = run(transport, Operation::mutate("mpv", Mutation::Mute)).await;

    assert!(matches!(
        result,
        Err(StreamRestoreError::Operation { operation: OperationKind::Write, .. })
    ));
}

#[tokio::test]
async fn test_connect_dispatch_failure() {
    let transport = MemoryTransport::new().failing_dispatch(OperationKind::Connect);
    let (_, result, _) = run(transport, Operation::report_all()).await;

    assert!(matches!(
        result,
        Err(StreamRestoreError::Operation { operation: OperationKind::Connect, .. })
    ));
}
