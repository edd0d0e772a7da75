//! Integration Tests for the Measurement Pipeline
//!
//! Exercises discovery, parsing, summarizing and publishing against real
//! files laid out the way the camera writes them.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use test_utils::fixtures::gradient;
use test_utils::{write_measurement_file, SENSOR_SUFFIX};
use thermocap::config::{PipelineConfig, SinkConfig};
use thermocap::measurement::stats::{METRIC_MAX, METRIC_MEAN, METRIC_MIN, METRIC_STD_DEV};
use thermocap::sink::jsonl::MetricRecord;
use thermocap::sink::{build_sinks, MemorySink, SinkEvent};
use thermocap::Pipeline;

fn pipeline_config(dir: &Path) -> PipelineConfig {
    PipelineConfig {
        data_dir: dir.to_path_buf(),
        file_suffix: SENSOR_SUFFIX.to_string(),
        enforce_dimensions: true,
        clean_before_capture: false,
    }
}

fn memory_pipeline(dir: &Path, sink: &MemorySink) -> Pipeline {
    Pipeline::new(
        &pipeline_config(dir),
        Box::new(sink.clone()),
        Box::new(sink.clone()),
    )
}

#[test]
fn test_full_sensor_frame_is_summarized() {
    let dir = TempDir::new().unwrap();
    let path = write_measurement_file(dir.path(), "frame_0001", SENSOR_SUFFIX, &gradient(252, 336));

    let sink = MemorySink::new();
    let report = memory_pipeline(dir.path(), &sink).run().unwrap();

    assert_eq!(report.processed.len(), 1);
    assert!(report.skipped.is_empty());

    let file = &report.processed[0];
    assert_eq!(file.path, path);
    assert_eq!((file.rows, file.cols), (252, 336));

    let stats = &file.summary.stats;
    assert_eq!(stats.min, 15.0);
    // 15.0 + (251 + 335) * 0.25
    assert_eq!(stats.max, 161.5);
    assert!((stats.mean - 88.25).abs() < 1e-9);
    assert!(stats.std_dev > 0.0);

    let names: Vec<String> = sink.metrics().into_iter().map(|(name, _, _)| name).collect();
    assert_eq!(names, vec![METRIC_MEAN, METRIC_STD_DEV, METRIC_MAX, METRIC_MIN]);
}

#[test]
fn test_files_are_processed_in_sorted_order() {
    let dir = TempDir::new().unwrap();
    for stem in ["c", "a", "b"] {
        write_measurement_file(dir.path(), stem, SENSOR_SUFFIX, &gradient(252, 336));
    }
    fs::write(dir.path().join("notes.txt"), "not a measurement").unwrap();

    let sink = MemorySink::new();
    let report = memory_pipeline(dir.path(), &sink).run().unwrap();

    let names: Vec<String> = report
        .processed
        .iter()
        .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            format!("a{}", SENSOR_SUFFIX),
            format!("b{}", SENSOR_SUFFIX),
            format!("c{}", SENSOR_SUFFIX),
        ]
    );

    let uploads = sink.uploads();
    assert_eq!(uploads.len(), 3);
    assert!(uploads[0].1 <= uploads[1].1 && uploads[1].1 <= uploads[2].1);
}

#[test]
fn test_each_file_is_bracketed_by_open_and_close() {
    let dir = TempDir::new().unwrap();
    write_measurement_file(dir.path(), "a", SENSOR_SUFFIX, &gradient(252, 336));

    let sink = MemorySink::new();
    memory_pipeline(dir.path(), &sink).run().unwrap();

    let events = sink.events();
    assert_eq!(events.len(), 9);
    assert_eq!(events[0], SinkEvent::Opened);
    assert!(matches!(events[1], SinkEvent::Upload { .. }));
    assert_eq!(events[2], SinkEvent::Closed);
    assert_eq!(events[3], SinkEvent::Opened);
    assert!(events[4..8]
        .iter()
        .all(|e| matches!(e, SinkEvent::Metric { .. })));
    assert_eq!(events[8], SinkEvent::Closed);
}

#[test]
fn test_unusable_files_are_skipped() {
    let dir = TempDir::new().unwrap();
    write_measurement_file(dir.path(), "a_good", SENSOR_SUFFIX, &gradient(252, 336));
    write_measurement_file(dir.path(), "b_short", SENSOR_SUFFIX, &gradient(10, 336));
    fs::write(
        dir.path().join(format!("c_ragged{}", SENSOR_SUFFIX)),
        "1;2;3\n4;5\n",
    )
    .unwrap();
    fs::write(
        dir.path().join(format!("d_metadata_only{}", SENSOR_SUFFIX)),
        "Camera;M16\nUnit;Celsius\n",
    )
    .unwrap();

    let sink = MemorySink::new();
    let report = memory_pipeline(dir.path(), &sink).run().unwrap();

    assert_eq!(report.processed.len(), 1);
    let kinds: Vec<&str> = report.skipped.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec!["dimension_mismatch", "malformed_grid", "empty_grid"]);

    // Nothing is published for a skipped file
    assert_eq!(sink.uploads().len(), 1);
    assert_eq!(sink.metrics().len(), 4);
}

#[test]
fn test_dimension_check_can_be_disabled() {
    let dir = TempDir::new().unwrap();
    write_measurement_file(dir.path(), "small", SENSOR_SUFFIX, &gradient(4, 5));

    let mut config = pipeline_config(dir.path());
    config.enforce_dimensions = false;
    let sink = MemorySink::new();
    let report = Pipeline::new(&config, Box::new(sink.clone()), Box::new(sink.clone()))
        .run()
        .unwrap();

    assert_eq!(report.processed.len(), 1);
    assert_eq!((report.processed[0].rows, report.processed[0].cols), (4, 5));
}

#[test]
fn test_empty_directory_publishes_nothing() {
    let dir = TempDir::new().unwrap();
    let sink = MemorySink::new();
    let report = memory_pipeline(dir.path(), &sink).run().unwrap();

    assert!(report.is_empty());
    assert!(sink.events().is_empty());
}

#[test]
fn test_missing_directory_is_empty() {
    let dir = TempDir::new().unwrap();
    let sink = MemorySink::new();
    let report = memory_pipeline(&dir.path().join("absent"), &sink)
        .run()
        .unwrap();
    assert!(report.is_empty());
}

#[test]
fn test_configured_sinks_write_metrics_and_outbox() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();
    let source = write_measurement_file(&data_dir, "frame", SENSOR_SUFFIX, &gradient(252, 336));

    let sink_config = SinkConfig {
        log_metrics: true,
        metrics_file: Some(dir.path().join("out").join("metrics.jsonl")),
        outbox_dir: Some(dir.path().join("outbox")),
    };
    let (metrics, blobs) = build_sinks(&sink_config);
    let report = Pipeline::new(&pipeline_config(&data_dir), metrics, blobs)
        .run()
        .unwrap();
    let timestamp = report.processed[0].summary.timestamp_ns;

    let content = fs::read_to_string(dir.path().join("out").join("metrics.jsonl")).unwrap();
    let records: Vec<MetricRecord> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 4);
    assert_eq!(records[0].name, METRIC_MEAN);
    assert!(records.iter().all(|r| r.timestamp == timestamp));

    let uploaded = dir.path().join("outbox").join(format!(
        "{}-{}",
        timestamp,
        source.file_name().unwrap().to_string_lossy()
    ));
    assert_eq!(fs::read(uploaded).unwrap(), fs::read(&source).unwrap());
}
