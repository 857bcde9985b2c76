//! Integration tests for artindex
//!
//! These tests drive the coordinator end to end against a scripted transport.

use artindex::{
    bulk::{BulkItem, BulkResponse, BulkTransport, DocumentEncoder, JsonEncoder},
    error::{IndexerError, SerializationError, TransportError},
    import::{
        BatchProgress, FailureLog, FailureStage, IndexCoordinatorBuilder, JsonLinesSource,
        ProgressObserver,
    },
    types::Article,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// What the scripted backend does with one bulk call
#[derive(Debug, Clone)]
enum Reply {
    /// Accept every document
    Accept,
    /// Reject the documents at these positions
    Reject(Vec<usize>),
    /// Fail the call at transport level
    Unreachable,
    /// Answer with one item fewer than requested
    Truncated,
}

/// Transport that answers calls from a script and records every payload
#[derive(Default)]
struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    payloads: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            payloads: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }
}

impl BulkTransport for ScriptedTransport {
    fn submit(&self, index: &str, payload: &str) -> Result<BulkResponse, TransportError> {
        self.payloads.lock().unwrap().push(payload.to_string());
        let actions = payload.lines().count() / 2;
        let reply = self.replies.lock().unwrap().pop_front().unwrap_or(Reply::Accept);

        let items = |rejected: &[usize]| -> Vec<BulkItem> {
            (0..actions)
                .map(|i| {
                    if rejected.contains(&i) {
                        BulkItem::failure(
                            index,
                            400,
                            "illegal_argument_exception",
                            "failed to parse date field [foo] with format [strict_date_optional_time||epoch_millis]",
                        )
                    } else {
                        BulkItem::success(index, format!("doc-{}", i))
                    }
                })
                .collect()
        };

        match reply {
            Reply::Accept => Ok(BulkResponse::new(items(&[]))),
            Reply::Reject(positions) => Ok(BulkResponse::new(items(&positions))),
            Reply::Unreachable => Err(TransportError::Request("connection refused".to_string())),
            Reply::Truncated => {
                let mut all = items(&[]);
                all.pop();
                Ok(BulkResponse::new(all))
            }
        }
    }
}

/// Observer that keeps every progress observation
#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<BatchProgress>>>);

impl ProgressObserver for Recorder {
    fn batch_finished(&mut self, progress: &BatchProgress) {
        self.0.lock().unwrap().push(*progress);
    }
}

fn articles(n: usize) -> Vec<Article> {
    (0..n)
        .map(|i| Article::new(format!("article-{}", i)).with_title(format!("Title {}", i)))
        .collect()
}

fn write_articles(path: &std::path::Path, articles: &[Article]) {
    let body: String = articles
        .iter()
        .map(|a| serde_json::to_string(a).unwrap() + "\n")
        .collect();
    std::fs::write(path, body).unwrap();
}

/// Three records in one batch, all accepted
#[test]
fn test_small_run_indexes_everything() {
    let transport = ScriptedTransport::new(vec![Reply::Accept]);
    let mut coordinator = IndexCoordinatorBuilder::new()
        .with_transport(transport.clone())
        .build()
        .unwrap();

    let result = coordinator.index_all("articles", &articles(3), 100).unwrap();

    assert_eq!(transport.calls(), 1);
    assert_eq!(result.batches_processed, 1);
    assert_eq!(result.records_attempted, 3);
    assert_eq!(result.records_indexed, 3);
    assert!(result.failed_ids().is_empty());
    assert!(result.is_clean());
}

/// 250 records in batches of 100; the second submission fails at transport level
#[test]
fn test_transport_failure_skips_only_that_batch() {
    let transport = ScriptedTransport::new(vec![Reply::Accept, Reply::Unreachable, Reply::Accept]);
    let mut coordinator = IndexCoordinatorBuilder::new()
        .with_transport(transport.clone())
        .build()
        .unwrap();

    let result = coordinator.index_all("articles", &articles(250), 100).unwrap();

    let sizes: Vec<usize> = result.batches.iter().map(|b| b.size).collect();
    assert_eq!(sizes, vec![100, 100, 50]);
    assert_eq!(transport.calls(), 3);

    assert!(result.batches[0].is_completed());
    assert_eq!(result.batches[1].failure_stage(), Some(FailureStage::Transport));
    assert_eq!(result.batches[1].indexed, 0);
    assert!(result.batches[2].is_completed());

    assert_eq!(result.batches_failed, 1);
    assert_eq!(result.records_indexed, 150);
    assert!(!result.is_clean());
}

/// A batch of two where the backend rejects the second record
#[test]
fn test_rejected_document_is_reported_by_id() {
    let transport = ScriptedTransport::new(vec![Reply::Reject(vec![1])]);
    let mut coordinator = IndexCoordinatorBuilder::new()
        .with_transport(transport)
        .build()
        .unwrap();

    let records = vec![
        Article::new("good").with_pub_date("2020-01-01"),
        Article::new("bad").with_pub_date("foo"),
    ];
    let result = coordinator.index_all("articles", &records, 2).unwrap();

    assert_eq!(result.batches.len(), 1);
    let batch = &result.batches[0];
    assert!(batch.is_completed(), "per-document rejections do not fail the batch");
    assert_eq!(batch.indexed, 1);

    let report = batch.report().unwrap();
    assert_eq!(report.failed_ids, vec!["bad"]);
    assert!(report.message.as_ref().unwrap().contains("failed to parse date field"));
    assert_eq!(result.records_indexed, 1);
}

#[test]
fn test_rejections_in_several_batches_are_aggregated() {
    let transport = ScriptedTransport::new(vec![Reply::Reject(vec![0]), Reply::Accept, Reply::Reject(vec![1, 3])]);
    let mut coordinator = IndexCoordinatorBuilder::new()
        .with_transport(transport)
        .build()
        .unwrap();

    let result = coordinator.index_all("articles", &articles(12), 4).unwrap();

    assert_eq!(result.failure_reports().count(), 2);
    assert_eq!(result.failed_ids(), vec!["article-0", "article-9", "article-11"]);
    assert_eq!(result.records_indexed, 9);
    assert_eq!(result.batches_failed, 0);
}

#[test]
fn test_encoding_failure_fails_batch_without_submitting() {
    struct FailOn(&'static str);

    impl DocumentEncoder for FailOn {
        fn encode(&self, article: &Article) -> Result<String, SerializationError> {
            if article.id == self.0 {
                return Err(SerializationError {
                    record_id: article.id.clone(),
                    reason: "cannot encode".to_string(),
                });
            }
            JsonEncoder.encode(article)
        }
    }

    let transport = ScriptedTransport::new(vec![]);
    let mut coordinator = IndexCoordinatorBuilder::new()
        .with_transport(transport.clone())
        .with_encoder(FailOn("article-3"))
        .build()
        .unwrap();

    let result = coordinator.index_all("articles", &articles(6), 2).unwrap();

    // Batch 2 holds article-2 and article-3 and never reaches the backend
    assert_eq!(transport.calls(), 2);
    assert_eq!(result.batches[1].failure_stage(), Some(FailureStage::Build));
    assert_eq!(result.batches[1].indexed, 0);
    assert_eq!(result.records_indexed, 4);
    assert_eq!(result.batches_processed, 3);
}

#[test]
fn test_short_response_is_protocol_mismatch() {
    let transport = ScriptedTransport::new(vec![Reply::Accept, Reply::Truncated]);
    let mut coordinator = IndexCoordinatorBuilder::new()
        .with_transport(transport)
        .build()
        .unwrap();

    match coordinator.index_all("articles", &articles(4), 2) {
        Err(IndexerError::ProtocolMismatch { file, batch, expected, actual }) => {
            assert_eq!(file, None);
            assert_eq!(batch, 2);
            assert_eq!(expected, 2);
            assert_eq!(actual, 1);
        }
        other => panic!("Expected ProtocolMismatch, got {:?}", other.map(|r| r.records_indexed)),
    }
}

/// Observer that remembers why a run was aborted
#[derive(Clone, Default)]
struct AbortRecorder(Arc<Mutex<Vec<String>>>);

impl ProgressObserver for AbortRecorder {
    fn batch_finished(&mut self, _progress: &BatchProgress) {}

    fn run_aborted(&mut self, error: &IndexerError) {
        self.0.lock().unwrap().push(error.to_string());
    }
}

#[test]
fn test_protocol_mismatch_is_audited_with_its_batch_and_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("part-0.json");
    let log_path = dir.path().join("failed-indexed-articles.log");
    write_articles(&input, &articles(4));

    let aborts = AbortRecorder::default();
    let transport = ScriptedTransport::new(vec![Reply::Reject(vec![0]), Reply::Truncated]);
    let mut coordinator = IndexCoordinatorBuilder::new()
        .with_transport(transport)
        .with_batch_size(2)
        .with_failure_log(Some(&log_path))
        .with_observer(aborts.clone())
        .build()
        .unwrap();

    let err = coordinator
        .run(&[input.clone()], &JsonLinesSource::new())
        .unwrap_err();
    match err {
        IndexerError::ProtocolMismatch { ref file, batch, .. } => {
            assert_eq!(file.as_deref(), Some(input.as_path()));
            assert_eq!(batch, 2);
        }
        ref other => panic!("Expected ProtocolMismatch, got {:?}", other),
    }
    assert!(err.to_string().contains("batch 2 of"));

    let entries = FailureLog::read_entries(&log_path).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].batch, 1);
    assert_eq!(entries[0].failed_ids, vec!["article-0"]);

    assert_eq!(entries[1].batch, 2);
    assert_eq!(entries[1].stage, Some(FailureStage::Protocol));
    assert_eq!(entries[1].file.as_deref(), Some(input.as_path()));
    assert_eq!(entries[1].failed_ids, vec!["article-2", "article-3"]);

    let seen = aborts.0.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].contains("has 1 items but the request had 2 actions"));
}

#[test]
fn test_payload_preserves_batch_order() {
    let transport = ScriptedTransport::new(vec![]);
    let mut coordinator = IndexCoordinatorBuilder::new()
        .with_transport(transport.clone())
        .build()
        .unwrap();

    coordinator.index_all("articles", &articles(5), 5).unwrap();

    let payloads = transport.payloads.lock().unwrap();
    let ids: Vec<String> = payloads[0]
        .lines()
        .skip(1)
        .step_by(2)
        .map(|line| serde_json::from_str::<Article>(line).unwrap().id)
        .collect();
    assert_eq!(ids, vec!["article-0", "article-1", "article-2", "article-3", "article-4"]);
}

#[test]
fn test_progress_reported_once_per_batch() {
    let recorder = Recorder::default();
    let mut coordinator = IndexCoordinatorBuilder::new()
        .with_transport(ScriptedTransport::new(vec![]))
        .with_observer(recorder.clone())
        .build()
        .unwrap();

    coordinator.index_all("articles", &articles(250), 100).unwrap();

    let seen = recorder.0.lock().unwrap();
    let so_far: Vec<usize> = seen.iter().map(|p| p.records_in_file).collect();
    assert_eq!(so_far, vec![100, 200, 250]);
    assert!(seen.iter().all(|p| p.file_index == 1 && p.total_files == 1 && p.total_records_in_file == 250));
}

#[test]
fn test_unreadable_file_does_not_stop_the_run() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("a.json");
    let broken = dir.path().join("b.json");
    let last = dir.path().join("c.json");
    write_articles(&first, &articles(3));
    std::fs::write(&broken, "{\"id\":\"1\"}\nnot json\n").unwrap();
    write_articles(&last, &articles(5));

    let recorder = Recorder::default();
    let transport = ScriptedTransport::new(vec![]);
    let mut coordinator = IndexCoordinatorBuilder::new()
        .with_transport(transport.clone())
        .with_observer(recorder.clone())
        .with_batch_size(2)
        .build()
        .unwrap();

    let paths = artindex::import::discover_files(dir.path(), "json");
    let result = coordinator.run(&paths, &JsonLinesSource::new()).unwrap();

    assert_eq!(result.files_processed, 2);
    assert_eq!(result.files_failed, 1);
    assert_eq!(result.file_failures[0].path, broken);
    assert_eq!(result.records_indexed, 8);
    assert_eq!(result.batches_processed, 5);
    assert_eq!(transport.calls(), 5);

    let seen = recorder.0.lock().unwrap();
    let files: Vec<(usize, usize)> = seen.iter().map(|p| (p.file_index, p.total_files)).collect();
    assert_eq!(files, vec![(1, 3), (1, 3), (3, 3), (3, 3), (3, 3)]);
    assert_eq!(result.batches[2].file.as_deref(), Some(last.as_path()));
}

#[test]
fn test_failures_are_written_to_audit_log() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("failed-indexed-articles.log");

    let transport = ScriptedTransport::new(vec![Reply::Reject(vec![1]), Reply::Unreachable]);
    let mut coordinator = IndexCoordinatorBuilder::new()
        .with_transport(transport)
        .with_failure_log(Some(&log_path))
        .build()
        .unwrap();

    coordinator.index_all("articles", &articles(4), 2).unwrap();

    let entries = FailureLog::read_entries(&log_path).unwrap();
    assert_eq!(entries.len(), 2);

    assert_eq!(entries[0].batch, 1);
    assert_eq!(entries[0].stage, None);
    assert_eq!(entries[0].failed_ids, vec!["article-1"]);

    assert_eq!(entries[1].batch, 2);
    assert_eq!(entries[1].stage, Some(FailureStage::Transport));
    assert_eq!(entries[1].failed_ids, vec!["article-2", "article-3"]);
    assert!(entries[1].message.contains("connection refused"));
}

#[test]
fn test_record_ids_are_sent_as_document_ids() {
    let transport = ScriptedTransport::new(vec![]);
    let mut coordinator = IndexCoordinatorBuilder::new()
        .with_transport(transport.clone())
        .with_record_ids(true)
        .build()
        .unwrap();

    coordinator.index_all("articles", &articles(1), 1).unwrap();

    let payloads = transport.payloads.lock().unwrap();
    let meta: serde_json::Value = serde_json::from_str(payloads[0].lines().next().unwrap()).unwrap();
    assert_eq!(meta["index"]["_id"], "article-0");
}

#[test]
fn test_cancelled_run_submits_nothing() {
    let transport = ScriptedTransport::new(vec![]);
    let mut coordinator = IndexCoordinatorBuilder::new()
        .with_transport(transport.clone())
        .build()
        .unwrap();

    coordinator
        .cancel_handle()
        .store(true, std::sync::atomic::Ordering::Relaxed);
    let result = coordinator.index_all("articles", &articles(10), 3).unwrap();

    assert!(result.cancelled);
    assert_eq!(transport.calls(), 0);
    assert!(result.batches.is_empty());
}
