mod helpers;

use helpers::{corrupt_video, video, FakeToolkit, RecordingObserver};
use std::sync::Arc;
use std::time::Duration;
use touchline_core::{
    BatchError, CompressionSettings, CompressionStage, MediaKind, PlatformCapabilities, RawFile,
};
use touchline_processing::UploadQueueOrchestrator;

fn orchestrator(
    toolkit: Arc<FakeToolkit>,
    capabilities: PlatformCapabilities,
    settings: CompressionSettings,
) -> (UploadQueueOrchestrator, Arc<RecordingObserver>) {
    let observer = Arc::new(RecordingObserver::default());
    let orchestrator = UploadQueueOrchestrator::new(toolkit, capabilities, settings)
        .with_observer(observer.clone())
        .with_upload_tick(Duration::from_millis(5));
    (orchestrator, observer)
}

#[tokio::test]
async fn test_batch_over_limit_is_rejected_before_any_work() {
    let toolkit = Arc::new(FakeToolkit::new(1280, 720, 4.0));
    let (orchestrator, observer) = orchestrator(
        toolkit.clone(),
        PlatformCapabilities::supported(),
        CompressionSettings::default(),
    );

    let files = vec![
        video("a.mp4", 1024),
        video("b.mp4", 1024),
        RawFile::new("c.pdf", "application/pdf", "pdf"),
    ];
    let result = orchestrator.process(files, 3).await;

    assert!(matches!(
        result,
        Err(BatchError::BatchTooLarge {
            existing: 3,
            incoming: 3,
            max: 5
        })
    ));
    assert_eq!(toolkit.probes(), 0);
    assert!(observer.done.lock().unwrap().is_empty());
    assert!(observer.rejections.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unsupported_platform_keeps_video_and_still_thumbnails() {
    let toolkit = Arc::new(FakeToolkit::new(1920, 1080, 12.0));
    let (orchestrator, _) = orchestrator(
        toolkit.clone(),
        PlatformCapabilities::unsupported(),
        CompressionSettings::default(),
    );

    let original = video("kickoff.mp4", 8192);
    let attachments = orchestrator
        .process(vec![original.clone()], 0)
        .await
        .unwrap();

    assert_eq!(toolkit.encodes(), 0);
    let attachment = &attachments[0];
    assert_eq!(attachment.file().data, original.data);
    assert_eq!(attachment.final_size(), attachment.original_size);
    let times: Vec<f64> = attachment
        .thumbnails()
        .iter()
        .map(|t| t.timestamp_seconds)
        .collect();
    assert_eq!(times, vec![3.0, 6.0, 9.0]);
    assert_eq!(attachment.duration_seconds, Some(12.0));
}

#[tokio::test]
async fn test_corrupt_video_falls_back_without_affecting_siblings() {
    let toolkit = Arc::new(FakeToolkit::new(1920, 1080, 8.0));
    let (orchestrator, observer) = orchestrator(
        toolkit.clone(),
        PlatformCapabilities::supported(),
        CompressionSettings::default(),
    );

    let broken = corrupt_video("broken.mp4");
    let files = vec![
        video("good.mp4", 4096),
        broken.clone(),
        RawFile::new("lineup.pdf", "application/pdf", "pdf"),
    ];
    let attachments = orchestrator.process(files, 0).await.unwrap();
    assert_eq!(attachments.len(), 3);

    let good = &attachments[0];
    assert!(good.is_compressed());
    assert_eq!(good.file().content_type, "video/webm");
    assert_eq!(good.thumbnails().len(), 3);

    let bad = &attachments[1];
    assert_eq!(bad.original_name, "broken.mp4");
    assert_eq!(bad.file().data, broken.data);
    assert!(bad.thumbnail().is_none());
    assert_eq!(bad.width, None);
    assert_eq!(bad.duration_seconds, None);

    assert_eq!(attachments[2].kind, MediaKind::Document);
    assert!(observer.progress_for("broken.mp4").is_empty());
    assert_eq!(observer.done.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_large_video_progress_ordering() {
    let toolkit = Arc::new(FakeToolkit::new(3840, 2160, 30.0));
    let settings = CompressionSettings {
        max_file_size_mb: 64,
        ..CompressionSettings::default()
    };
    let (orchestrator, observer) =
        orchestrator(toolkit.clone(), PlatformCapabilities::supported(), settings);

    let attachments = orchestrator
        .process(vec![video("final.mp4", 50 * 1024 * 1024)], 0)
        .await
        .unwrap();

    let events = observer.progress_for("final.mp4");
    assert_eq!(
        (events[0].stage, events[0].progress),
        (CompressionStage::Analyzing, 0)
    );
    let last = events.last().unwrap();
    assert_eq!((last.stage, last.progress), (CompressionStage::Complete, 100));

    for pair in events.windows(2) {
        assert!(pair[0].stage <= pair[1].stage);
        if pair[0].stage == pair[1].stage && pair[0].stage == CompressionStage::Compressing {
            assert!(pair[0].progress <= pair[1].progress);
        }
    }

    let attachment = &attachments[0];
    assert_eq!((attachment.width, attachment.height), (Some(1280), Some(720)));
    assert!(attachment.compression_savings_percent() > 99);
}

#[tokio::test]
async fn test_transcodes_run_one_at_a_time_while_thumbnails_continue() {
    let toolkit = Arc::new(
        FakeToolkit::new(1920, 1080, 8.0)
            .with_delays(Duration::from_millis(15), Duration::from_millis(5)),
    );
    let (orchestrator, _) = orchestrator(
        toolkit.clone(),
        PlatformCapabilities::supported(),
        CompressionSettings::default(),
    );

    let files = vec![
        video("one.mp4", 2048),
        video("two.mp4", 2048),
        video("three.mp4", 2048),
    ];
    let attachments = orchestrator.process(files, 0).await.unwrap();

    assert_eq!(toolkit.encodes(), 3);
    assert_eq!(toolkit.peak_encodes(), 1);
    assert!(toolkit.frames_during_encode() > 0);
    assert_eq!(toolkit.frames(), 9);
    assert!(attachments.iter().all(|a| a.is_compressed()));

    let names: Vec<&str> = attachments.iter().map(|a| a.original_name.as_str()).collect();
    assert_eq!(names, vec!["one.mp4", "two.mp4", "three.mp4"]);
}

#[tokio::test]
async fn test_rejected_files_are_reported_not_returned() {
    let toolkit = Arc::new(FakeToolkit::new(1280, 720, 4.0));
    let (orchestrator, observer) = orchestrator(
        toolkit,
        PlatformCapabilities::supported(),
        CompressionSettings::default(),
    );

    let files = vec![
        video("too-big.mp4", 10 * 1024 * 1024 + 1),
        RawFile::new("macro.xlsm", "application/vnd.ms-excel", "x"),
        RawFile::new("notes.txt", "text/plain", "selection notes"),
    ];
    let attachments = orchestrator.process(files, 0).await.unwrap();

    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].original_name, "notes.txt");

    let rejections = observer.rejections.lock().unwrap();
    let rejected: Vec<&str> = rejections.iter().map(|r| r.file_name.as_str()).collect();
    assert_eq!(rejected, vec!["too-big.mp4", "macro.xlsm"]);
    assert_eq!(
        rejections[0].user_message(),
        "too-big.mp4 is too large. Maximum size is 10 MB."
    );
}

#[tokio::test]
async fn test_process_does_not_wait_for_upload_simulation() {
    let toolkit = Arc::new(FakeToolkit::new(1280, 720, 4.0));
    let observer = Arc::new(RecordingObserver::default());
    let orchestrator = UploadQueueOrchestrator::new(
        toolkit,
        PlatformCapabilities::supported(),
        CompressionSettings::default(),
    )
    .with_observer(observer)
    .with_upload_tick(Duration::from_secs(60));

    let attachments = orchestrator
        .process(vec![RawFile::new("notes.txt", "text/plain", "n")], 0)
        .await
        .unwrap();

    let snapshot = orchestrator.upload_progress().snapshot();
    assert_eq!(snapshot.get(&attachments[0].id), Some(&0));
    orchestrator.shutdown();
}
