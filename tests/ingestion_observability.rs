use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use time_use_summary::ingestion::{
    ingest_from_path, CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionOptions,
    IngestionSeverity, IngestionStats, TracingObserver,
};
use time_use_summary::SummaryError;

#[derive(Default)]
struct RecordingObserver {
    successes: Mutex<Vec<IngestionStats>>,
    failures: Mutex<Vec<IngestionSeverity>>,
    alerts: Mutex<Vec<IngestionSeverity>>,
}

impl IngestionObserver for RecordingObserver {
    fn on_success(&self, _ctx: &IngestionContext, stats: IngestionStats) {
        self.successes.lock().unwrap().push(stats);
    }

    fn on_failure(&self, _ctx: &IngestionContext, severity: IngestionSeverity, _error: &SummaryError) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(&self, _ctx: &IngestionContext, severity: IngestionSeverity, _error: &SummaryError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn tmp_path(ext: &str) -> std::path::PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("time-use-summary-observe-{nanos}.{ext}"))
}

#[test]
fn observer_receives_stats_on_success() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = IngestionOptions {
        observer: Some(obs.clone()),
        ..Default::default()
    };

    ingest_from_path("tests/fixtures/time_use_sample.csv", &opts).unwrap();

    let successes = obs.successes.lock().unwrap().clone();
    assert_eq!(successes, vec![IngestionStats { rows: 6, columns: 15 }]);
    assert!(obs.failures.lock().unwrap().is_empty());
}

#[test]
fn observer_receives_failure_and_alert_on_critical_io_error() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = IngestionOptions {
        observer: Some(obs.clone()),
        alert_at_or_above: IngestionSeverity::Critical,
        ..Default::default()
    };

    // Missing file -> I/O error -> Critical
    let _ = ingest_from_path("tests/fixtures/does_not_exist.csv", &opts).unwrap_err();

    let failures = obs.failures.lock().unwrap().clone();
    let alerts = obs.alerts.lock().unwrap().clone();
    assert_eq!(failures, vec![IngestionSeverity::Critical]);
    assert_eq!(alerts, vec![IngestionSeverity::Critical]);
}

#[test]
fn observer_receives_failure_without_alert_for_parse_error() {
    let path = tmp_path("csv");
    std::fs::write(&path, "id,t010101\n1,abc\n").unwrap();

    let obs = Arc::new(RecordingObserver::default());
    let opts = IngestionOptions {
        observer: Some(obs.clone()),
        alert_at_or_above: IngestionSeverity::Critical,
        ..Default::default()
    };

    // Parse error -> Error severity (not Critical) -> should not alert
    let err = ingest_from_path(&path, &opts).unwrap_err();
    assert!(err.is_parse_error());

    let failures = obs.failures.lock().unwrap().clone();
    assert_eq!(failures, vec![IngestionSeverity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());

    let _ = std::fs::remove_file(&path);
}

#[test]
fn composite_fans_out_to_file_log() {
    let log = tmp_path("log");
    let recorder = Arc::new(RecordingObserver::default());
    let observers: Vec<Arc<dyn IngestionObserver>> = vec![recorder.clone(), Arc::new(FileObserver::new(&log))];
    let composite = CompositeObserver::new(observers);
    let opts = IngestionOptions {
        observer: Some(Arc::new(composite)),
        alert_at_or_above: IngestionSeverity::Error,
        ..Default::default()
    };

    let _ = ingest_from_path("tests/fixtures/does_not_exist.csv", &opts).unwrap_err();
    ingest_from_path("tests/fixtures/time_use_sample.csv", &opts).unwrap();

    assert_eq!(recorder.alerts.lock().unwrap().len(), 1);
    assert_eq!(recorder.successes.lock().unwrap().len(), 1);

    let contents = std::fs::read_to_string(&log).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("fail severity=Critical"));
    assert!(lines[1].contains("ALERT severity=Critical"));
    assert!(lines[2].contains("ok path=tests/fixtures/time_use_sample.csv rows=6 columns=15"));

    let _ = std::fs::remove_file(&log);
}

#[test]
fn tracing_observer_sits_alongside_other_observers() {
    let recorder = Arc::new(RecordingObserver::default());
    let observers: Vec<Arc<dyn IngestionObserver>> = vec![Arc::new(TracingObserver), recorder.clone()];
    let opts = IngestionOptions {
        observer: Some(Arc::new(CompositeObserver::new(observers))),
        alert_at_or_above: IngestionSeverity::Critical,
        ..Default::default()
    };

    let ds = ingest_from_path("tests/fixtures/time_use_sample.csv", &opts).unwrap();
    assert_eq!(ds.row_count(), 6);
    let _ = ingest_from_path("tests/fixtures/does_not_exist.csv", &opts).unwrap_err();

    assert_eq!(recorder.successes.lock().unwrap().len(), 1);
    assert_eq!(*recorder.alerts.lock().unwrap(), vec![IngestionSeverity::Critical]);
}
