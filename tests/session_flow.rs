use serde_json::Value;
use signscribe::classify::{GlossClassifier, MockClassifier, Prediction};
use signscribe::clock::MockClock;
use signscribe::config::Config;
use signscribe::detect::MockDetector;
use signscribe::generate::MockGenerator;
use signscribe::landmarks::CorrectedFrame;
use signscribe::protocol::{IngestReport, Reply, encode_frame_payload};
use signscribe::session::{ClientEnd, CollectingReporter, SessionState, channel_transport};
use signscribe::{Engine, StreamSession};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn config() -> Config {
    let mut config = Config::default();
    config.frames.min_sequence = 1;
    config
}

fn greeting_classifier() -> MockClassifier {
    MockClassifier::new("mock-lstm").with_script(
        ["HELLO", "HOW", "YOU", "FEEL"]
            .into_iter()
            .map(|gloss| Prediction::new(gloss, 0.995)),
    )
}

/// Stands in for real inference: holds its thread for `delay`.
struct SlowClassifier {
    delay: Duration,
}

impl GlossClassifier for SlowClassifier {
    fn classify(&self, _frames: &[CorrectedFrame]) -> signscribe::Result<Prediction> {
        std::thread::sleep(self.delay);
        Ok(Prediction::new("SLOW", 0.5))
    }

    fn model_name(&self) -> &str {
        "slow"
    }
}

fn slow_engine(delay: Duration) -> Engine {
    let mut config = config();
    config.session.generation_interval_ms = 200;
    Engine::new(
        config,
        Arc::new(MockDetector::new()),
        Arc::new(SlowClassifier { delay }),
        Arc::new(MockGenerator::new()),
    )
}

fn frame() -> String {
    encode_frame_payload("image/jpeg", b"\xff\xd8jpeg")
}

/// Parses the next ingest reply, skipping generation replies.
async fn next_ingest(client: &mut ClientEnd) -> Reply<IngestReport> {
    loop {
        let raw = client.recv_reply().await.expect("session ended early");
        let value: Value = serde_json::from_str(&raw).unwrap();
        if value["result"].get("text").is_none() {
            return Reply::from_json(&raw).unwrap();
        }
    }
}

/// Text of the next generation reply, skipping ingest replies.
async fn next_generation(client: &mut ClientEnd) -> String {
    loop {
        let raw = client.recv_reply().await.expect("session ended early");
        let value: Value = serde_json::from_str(&raw).unwrap();
        if let Some(text) = value["result"].get("text") {
            assert_eq!(value["status"], "success");
            return text.as_str().unwrap().to_string();
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_confirmed_glosses_become_one_sentence() {
    let generator = MockGenerator::new().with_response("Hello, how do you feel?");
    let engine = Engine::new(
        config(),
        Arc::new(MockDetector::new()),
        Arc::new(greeting_classifier()),
        Arc::new(generator.clone()),
    );
    let session = StreamSession::new(Arc::new(engine));
    let handle = session.handle();
    let (mut client, source, sink) = session.channel_transport();
    let task = tokio::spawn(session.run(source, sink));

    for expected in ["HELLO", "HOW", "YOU", "FEEL"] {
        client.send_frame(frame()).await.unwrap();
        let reply = next_ingest(&mut client).await;
        let report = reply.result().unwrap();
        assert_eq!(report.word_gloss, expected);
        assert!(report.confirmed);
    }

    let text = next_generation(&mut client).await;
    assert_eq!(text, "Hello, how do you feel?");
    assert_eq!(generator.call_count(), 1);
    assert_eq!(generator.requests()[0].gloss, "HELLO HOW YOU FEEL");
    assert_eq!(generator.requests()[0].context, "");

    client.disconnect();
    let summary = task.await.unwrap().unwrap();

    assert_eq!(summary.frames_received, 4);
    assert_eq!(summary.glosses_confirmed, 4);
    assert_eq!(summary.generations, 1);
    assert_eq!(summary.text, "Hello, how do you feel?");
    assert_eq!(handle.state(), SessionState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_empty_generation_leaves_text_untouched() {
    let generator = MockGenerator::new().with_response("");
    let engine = Engine::new(
        config(),
        Arc::new(MockDetector::new()),
        Arc::new(greeting_classifier()),
        Arc::new(generator.clone()),
    );
    let session = StreamSession::new(Arc::new(engine));
    let (mut client, source, sink) = channel_transport(32);
    let task = tokio::spawn(session.run(source, sink));

    for _ in 0..4 {
        client.send_frame(frame()).await.unwrap();
        next_ingest(&mut client).await;
    }

    assert_eq!(next_generation(&mut client).await, "");
    assert_eq!(generator.call_count(), 1);

    client.disconnect();
    let summary = task.await.unwrap().unwrap();
    assert_eq!(summary.generations, 0);
    assert_eq!(summary.text, "");
}

#[tokio::test(start_paused = true)]
async fn test_bad_frames_get_error_replies_and_session_continues() {
    let reporter = CollectingReporter::new();
    let engine = Engine::new(
        config(),
        Arc::new(MockDetector::new()),
        Arc::new(MockClassifier::new("mock").with_prediction("HELLO", 0.2)),
        Arc::new(MockGenerator::new()),
    )
    .with_error_reporter(Arc::new(reporter.clone()));
    let session = StreamSession::new(Arc::new(engine));
    let handle = session.handle();
    let (mut client, source, sink) = channel_transport(32);
    let task = tokio::spawn(session.run(source, sink));

    client.send_frame("not a data url").await.unwrap();
    let reply = next_ingest(&mut client).await;
    assert!(!reply.is_success());

    client.send_frame("data:image/jpeg;base64,@@@").await.unwrap();
    assert!(!next_ingest(&mut client).await.is_success());

    client.send_frame(frame()).await.unwrap();
    let reply = next_ingest(&mut client).await;
    let report = reply.result().unwrap();
    assert_eq!(report.word_gloss, "HELLO");
    assert!(!report.confirmed);
    assert_eq!(report.buffered_frames, 1);
    assert_eq!(handle.state(), SessionState::Streaming);

    client.disconnect();
    let summary = task.await.unwrap().unwrap();
    assert_eq!(summary.frames_received, 3);
    assert_eq!(summary.glosses_confirmed, 0);
    assert_eq!(reporter.messages_for("ingest").len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_detector_failure_is_reported_per_frame() {
    let reporter = CollectingReporter::new();
    let engine = Engine::new(
        config(),
        Arc::new(MockDetector::new().with_failure()),
        Arc::new(MockClassifier::new("mock")),
        Arc::new(MockGenerator::new()),
    )
    .with_error_reporter(Arc::new(reporter.clone()));
    let session = StreamSession::new(Arc::new(engine));
    let (mut client, source, sink) = channel_transport(32);
    let task = tokio::spawn(session.run(source, sink));

    for _ in 0..2 {
        client.send_frame(frame()).await.unwrap();
        assert!(!next_ingest(&mut client).await.is_success());
    }

    client.disconnect();
    task.await.unwrap().unwrap();
    assert_eq!(reporter.messages_for("ingest").len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_silence_splits_phrases() {
    let clock = MockClock::new();
    let generator = MockGenerator::new().with_response("unused");
    let engine = Engine::new(
        config(),
        Arc::new(MockDetector::new()),
        Arc::new(greeting_classifier()),
        Arc::new(generator.clone()),
    )
    .with_clock(Arc::new(clock.clone()));
    let session = StreamSession::new(Arc::new(engine));
    let (mut client, source, sink) = channel_transport(32);
    let task = tokio::spawn(session.run(source, sink));

    for i in 0..4 {
        if i == 2 {
            clock.advance(Duration::from_millis(3500));
        }
        client.send_frame(frame()).await.unwrap();
        assert!(next_ingest(&mut client).await.result().unwrap().confirmed);
    }

    // Only YOU and FEEL survive the pause, below the trigger size.
    assert_eq!(next_generation(&mut client).await, "");
    assert_eq!(generator.call_count(), 0);

    client.disconnect();
    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_handle_close_ends_streaming_session() {
    let generator = MockGenerator::new().with_response("Hello.");
    let engine = Engine::new(
        config(),
        Arc::new(MockDetector::new()),
        Arc::new(greeting_classifier()),
        Arc::new(generator.clone()),
    );
    let session = StreamSession::new(Arc::new(engine));
    let handle = session.handle();
    let (mut client, source, sink) = channel_transport(32);
    let task = tokio::spawn(session.run(source, sink));

    for _ in 0..4 {
        client.send_frame(frame()).await.unwrap();
        next_ingest(&mut client).await;
    }
    assert_eq!(next_generation(&mut client).await, "Hello.");

    assert!(handle.close());
    handle.wait_closed().await;

    let summary = task.await.unwrap().unwrap();
    assert_eq!(summary.generations, 1);
    assert_eq!(handle.state(), SessionState::Closed);
    assert!(client.send_frame(frame()).await.is_err());
}

#[test]
fn test_upload_recognizes_single_image() {
    let engine = Engine::new(
        Config::default(),
        Arc::new(MockDetector::new()),
        Arc::new(MockClassifier::new("mock").with_prediction("THANK-YOU", 0.999)),
        Arc::new(MockGenerator::new()),
    );

    let reply = engine.recognize_image(b"\xff\xd8jpeg");
    let json = reply.to_json().unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["status"], "success");
    assert_eq!(value["result"]["text"], "thank-you");
}

#[tokio::test]
async fn test_slow_classifier_does_not_delay_generation_ticks() {
    let session = StreamSession::new(Arc::new(slow_engine(Duration::from_millis(1500))));
    let (mut client, source, sink) = channel_transport(32);
    let task = tokio::spawn(session.run(source, sink));

    let started = Instant::now();
    client.send_frame(frame()).await.unwrap();
    let first = client.recv_reply().await.unwrap();
    let elapsed = started.elapsed();

    let value: Value = serde_json::from_str(&first).unwrap();
    assert!(
        value["result"].get("text").is_some(),
        "expected a generation reply before the frame finished, got {}",
        first
    );
    assert!(elapsed < Duration::from_millis(1000), "first reply after {:?}", elapsed);

    let reply = next_ingest(&mut client).await;
    assert_eq!(reply.result().unwrap().word_gloss, "SLOW");

    client.disconnect();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_close_does_not_wait_for_inference() {
    let session = StreamSession::new(Arc::new(slow_engine(Duration::from_millis(1500))));
    let handle = session.handle();
    let (client, source, sink) = channel_transport(32);
    let task = tokio::spawn(session.run(source, sink));

    client.send_frame(frame()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let started = Instant::now();
    handle.close();
    handle.wait_closed().await;

    assert!(started.elapsed() < Duration::from_millis(1000), "close took {:?}", started.elapsed());
    let summary = task.await.unwrap().unwrap();
    assert_eq!(summary.frames_received, 1);
    assert_eq!(summary.glosses_confirmed, 0);
}
