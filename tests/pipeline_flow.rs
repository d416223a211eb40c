use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, TimeZone, Utc};
use gesture_basket::{
    CentroidClassifier, FramePipeline, GestureError, Interpretation, PipelineConfig,
    RecordedFrame, RecordedLandmarks, SpeechDispatcher, SpeechService,
};
use pretty_assertions::assert_eq;

const FRAME_MS: i64 = 33;
const HOLD_FRAMES: i64 = 100;

struct ChannelSpeech(Mutex<mpsc::Sender<String>>);

impl SpeechService for ChannelSpeech {
    fn speak(&self, text: &str) -> Result<(), GestureError> {
        let _ = self.0.lock().unwrap().send(text.to_string());
        Ok(())
    }
}

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
}

/// Hand shape for class `index`: a wrist at the origin and one fingertip whose
/// distance encodes the class
fn hand_for(index: usize) -> Vec<[f64; 2]> {
    vec![[0.3, 0.4], [0.3 + 0.05 * (index as f64 + 1.0), 0.4]]
}

/// Centroids matching `hand_for` after normalization
fn model(labels: usize) -> CentroidClassifier {
    CentroidClassifier::new(
        (0..labels)
            .map(|index| {
                let mut centroid = vec![0.0; 42];
                centroid[2] = 0.05 * (index as f64 + 1.0);
                centroid
            })
            .collect(),
    )
}

/// Frames holding each gesture in turn, `HOLD_FRAMES` per gesture
fn script(gestures: &[usize]) -> Vec<RecordedFrame> {
    gestures
        .iter()
        .enumerate()
        .flat_map(|(slot, &index)| {
            (0..HOLD_FRAMES).map(move |i| {
                let frame = slot as i64 * HOLD_FRAMES + i;
                RecordedFrame::new(
                    epoch() + Duration::milliseconds(frame * FRAME_MS),
                    Some(hand_for(index)),
                )
            })
        })
        .collect()
}

fn build(
    config: &PipelineConfig,
    speech: SpeechDispatcher,
) -> FramePipeline<RecordedLandmarks, CentroidClassifier> {
    FramePipeline::new(
        config,
        RecordedLandmarks,
        model(config.labels.len()),
        speech,
        epoch() - Duration::seconds(10),
    )
    .unwrap()
}

fn replay(
    pipeline: &FramePipeline<RecordedLandmarks, CentroidClassifier>,
    frames: Vec<RecordedFrame>,
) -> Vec<String> {
    frames
        .into_iter()
        .map(|frame| {
            let now = frame.timestamp.unwrap();
            pipeline.process_frame_at(frame, now)
        })
        .filter(|outcome| outcome.committed())
        .map(|outcome| outcome.symbol)
        .collect()
}

#[test]
fn test_basket_scenario() {
    let pipeline = build(&PipelineConfig::default(), SpeechDispatcher::default());

    // Apple, Add, Banana, Remove
    let committed = replay(&pipeline, script(&[0, 8, 1, 9]));

    assert_eq!(committed, vec!["Apple", "Add", "Banana", "Remove"]);
    let session = pipeline.session();
    assert!(session.get_basket().is_empty());
    assert_eq!(session.get_pending_product(), Some("Banana".to_string()));
}

#[test]
fn test_add_then_reset() {
    let pipeline = build(&PipelineConfig::default(), SpeechDispatcher::default());
    replay(&pipeline, script(&[6, 8]));

    let session = pipeline.session();
    let basket = session.get_basket();
    assert_eq!(basket.len(), 1);
    assert_eq!(basket[0].name, "Tomato");
    assert_eq!(basket[0].price, 1.1);

    session.reset();
    assert!(session.get_basket().is_empty());
    assert_eq!(session.get_pending_product(), None);
}

#[test]
fn test_spelling_and_speech() {
    let config = PipelineConfig::from_json(r#"{"labels": ["h", "i", " ", "."]}"#).unwrap();
    let (tx, rx) = mpsc::channel();
    let pipeline = build(&config, SpeechDispatcher::new(ChannelSpeech(Mutex::new(tx))));

    let committed = replay(&pipeline, script(&[0, 1, 2]));
    assert_eq!(committed, vec!["h", "i", " "]);

    let snapshot = pipeline.session().snapshot();
    assert_eq!(snapshot.word_buffer, "");
    assert_eq!(snapshot.sentence, "hi ");
    assert_eq!(rx.recv_timeout(StdDuration::from_secs(5)).unwrap(), "hi");
    assert!(rx.recv_timeout(StdDuration::from_millis(200)).is_err());
}

#[test]
fn test_gaps_without_hand_do_not_break_hold() {
    let pipeline = build(&PipelineConfig::default(), SpeechDispatcher::default());

    // Every third frame loses the hand; absent frames are not votes
    let frames: Vec<RecordedFrame> = (0..60)
        .map(|i| {
            let landmarks = if i % 3 == 2 { None } else { Some(hand_for(4)) };
            RecordedFrame::new(epoch() + Duration::milliseconds(i * FRAME_MS), landmarks)
        })
        .collect();

    assert_eq!(replay(&pipeline, frames), vec!["Bread"]);
}

#[test]
fn test_request_layer_runs_concurrently() {
    let pipeline = build(&PipelineConfig::default(), SpeechDispatcher::default());
    let session = pipeline.session();

    // Milk, Add, Milk, Add, Carrot, Add
    let frames = script(&[3, 8, 3, 8, 5, 8]);
    let worker = thread::spawn(move || replay(&pipeline, frames));

    // Every snapshot sees a whole frame's effect, never a partial one
    let mut observed = 0;
    loop {
        let snapshot = session.snapshot();
        assert!(snapshot.basket.len() <= 3);
        assert!(snapshot
            .basket
            .iter()
            .all(|item| !item.image.is_empty() && item.price > 0.0));
        observed += 1;
        if worker.is_finished() {
            break;
        }
        thread::yield_now();
    }

    let committed = worker.join().unwrap();
    assert_eq!(committed.len(), 6);
    assert!(observed > 0);

    let names: Vec<String> = session.get_basket().into_iter().map(|i| i.name).collect();
    assert_eq!(names, vec!["Milk", "Milk", "Carrot"]);
}

#[test]
fn test_pause_from_request_layer() {
    let pipeline = build(&PipelineConfig::default(), SpeechDispatcher::default());
    let session = pipeline.session();

    assert!(session.toggle_pause());
    let frames = script(&[2]);
    let outcomes: Vec<_> = frames
        .into_iter()
        .map(|frame| {
            let now = frame.timestamp.unwrap();
            pipeline.process_frame_at(frame, now)
        })
        .collect();

    assert!(outcomes.iter().all(|o| o.symbol == "---" && o.overlay.is_none()));
    // Frames still pass through
    assert!(outcomes.iter().all(|o| o.frame.landmarks.is_some()));
    assert_eq!(session.get_pending_product(), None);
}

#[test]
fn test_commit_interpretation_reported() {
    let pipeline = build(&PipelineConfig::default(), SpeechDispatcher::default());
    let outcome = script(&[9])
        .into_iter()
        .map(|frame| {
            let now = frame.timestamp.unwrap();
            pipeline.process_frame_at(frame, now)
        })
        .find(|outcome| outcome.committed())
        .unwrap();

    assert_eq!(outcome.interpretation, Some(Interpretation::BasketEmpty));
}
