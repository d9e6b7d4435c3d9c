mod common;

use std::sync::Mutex;

use ndarray::Array3;

use stacknorm_core::error::StackNormError;
use stacknorm_core::io::tiff_io::read_stack;
use stacknorm_core::metadata::{read_group_metadata, GroupMetadataRecord};
use stacknorm_core::pipeline::config::RunConfig;
use stacknorm_core::pipeline::{run_batch, FailureKind, NoOpReporter, ProgressReporter};
use stacknorm_core::preview::{CompositePngPreview, NoPreview, PreviewGroup, PreviewSink};
use stacknorm_core::stack::RawStack;

use common::{ramp_u16, write_i16_tiff, write_three_channel_sample, write_u16_tiff};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Dirs {
    _root: tempfile::TempDir,
    input: std::path::PathBuf,
    output: std::path::PathBuf,
}

fn dirs() -> Dirs {
    let root = tempfile::tempdir().unwrap();
    let input = root.path().join("raw");
    let output = root.path().join("normalized");
    std::fs::create_dir(&input).unwrap();
    Dirs {
        input,
        output,
        _root: root,
    }
}

/// Records every handoff so tests can inspect what the collaborator saw.
#[derive(Default)]
struct RecordingPreview {
    calls: Vec<(String, Vec<(String, String, (u32, u32))>)>,
}

impl PreviewSink for RecordingPreview {
    fn render(&mut self, group: &PreviewGroup<'_>) -> stacknorm_core::error::Result<()> {
        self.calls.push((
            group.title.clone(),
            group
                .layers
                .iter()
                .map(|l| (l.label.clone(), l.color.clone(), l.contrast_limits))
                .collect(),
        ));
        Ok(())
    }
}

#[derive(Default)]
struct RecordingReporter {
    events: Mutex<Vec<String>>,
}

impl ProgressReporter for RecordingReporter {
    fn begin_group(&self, base_name: &str, channels: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("group {base_name} {channels}"));
    }

    fn channel_done(&self, channel_id: &str, succeeded: bool) {
        self.events
            .lock()
            .unwrap()
            .push(format!("channel {channel_id} {succeeded}"));
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_three_channel_group_with_saturated_channel() {
    let d = dirs();
    write_three_channel_sample(&d.input);

    let config = RunConfig::new(&d.input, &d.output);
    let summary = run_batch(&config, &mut NoPreview, &NoOpReporter).unwrap();

    assert_eq!(summary.groups_total, 1);
    assert_eq!(summary.groups_succeeded, 1);
    assert_eq!(summary.channels_succeeded, 3);
    assert_eq!(summary.channels_failed, 0);
    assert!(summary.is_clean());

    for channel in ["C00", "C01", "C02"] {
        let path = d.output.join(format!("sample_{channel}_normalized.tiff"));
        assert!(path.exists(), "missing {}", path.display());
        assert_eq!(read_stack(&path).unwrap().dim(), (2, 16, 16));
    }

    let records = read_group_metadata(&d.output.join("sample_metadata.json")).unwrap();
    assert_eq!(
        records,
        [
            GroupMetadataRecord {
                file_name: "sample_C00_normalized.tiff".into(),
                original_channel_id: "C00".into(),
                colormap: "blue".into(),
            },
            GroupMetadataRecord {
                file_name: "sample_C01_normalized.tiff".into(),
                original_channel_id: "C01".into(),
                colormap: "green".into(),
            },
            GroupMetadataRecord {
                file_name: "sample_C02_normalized.tiff".into(),
                original_channel_id: "C02".into(),
                colormap: "red".into(),
            },
        ]
    );
}

#[test]
fn test_only_saturated_channel_skips_equalization() {
    let d = dirs();
    // Identical data on every channel: only the enhancement decision differs.
    for channel in ["C00", "C01", "C02"] {
        write_u16_tiff(
            &d.input.join(format!("sample_{channel}.tif")),
            ramp_u16(1, 32, 32, 1000, 9000),
        );
    }

    let config = RunConfig::new(&d.input, &d.output);
    run_batch(&config, &mut NoPreview, &NoOpReporter).unwrap();

    let load = |c: &str| read_stack(&d.output.join(format!("sample_{c}_normalized.tiff"))).unwrap();
    let (c00, c01, c02) = (load("C00"), load("C01"), load("C02"));
    assert_eq!(c00, c02);
    assert_ne!(c00, c01);

    // The saturated channel is a plain linear stretch of the ramp.
    let RawStack::U16(c01) = c01 else {
        panic!("expected 16-bit output");
    };
    assert_eq!(c01[[0, 0, 0]], 0);
    assert_eq!(c01[[0, 31, 31]], 65535);
    assert!(c01.iter().zip(c01.iter().skip(1)).all(|(a, b)| a <= b));
}

#[test]
fn test_single_channel_file() {
    let d = dirs();
    write_u16_tiff(&d.input.join("lonescan.tif"), ramp_u16(1, 8, 8, 0, 500));

    let config = RunConfig::new(&d.input, &d.output);
    let summary = run_batch(&config, &mut NoPreview, &NoOpReporter).unwrap();

    assert_eq!(summary.groups_total, 1);
    assert!(d.output.join("lonescan_SINGLECHANNEL_normalized.tiff").exists());
    let records = read_group_metadata(&d.output.join("lonescan_metadata.json")).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].original_channel_id, "SINGLECHANNEL");
    assert_eq!(records[0].colormap, "gray");
}

#[test]
fn test_signed_channel_is_normalized() {
    let d = dirs();
    let data = Array3::from_shape_fn((1, 8, 8), |(_, r, c)| (r as i16 * 8 + c as i16) * 400 - 12000);
    write_i16_tiff(&d.input.join("s_C00.tif"), &data);

    let config = RunConfig::new(&d.input, &d.output);
    let summary = run_batch(&config, &mut NoPreview, &NoOpReporter).unwrap();

    assert_eq!(summary.channels_succeeded, 1);
    assert_eq!(summary.channels_failed, 0);
    let RawStack::U16(out) = read_stack(&d.output.join("s_C00_normalized.tiff")).unwrap() else {
        panic!("expected 16-bit output");
    };
    assert_eq!(out[[0, 0, 0]], 0);
    assert_eq!(out[[0, 7, 7]], 65535);
}

#[test]
fn test_ambiguous_channel_processed_once() {
    let d = dirs();
    write_u16_tiff(&d.input.join("s_C00.tif"), ramp_u16(1, 8, 8, 0, 1000));
    write_u16_tiff(&d.input.join("s_C00_extra.tif"), ramp_u16(1, 8, 8, 0, 9000));
    write_u16_tiff(&d.input.join("s_C02.tif"), ramp_u16(1, 8, 8, 0, 500));

    let config = RunConfig::new(&d.input, &d.output);
    let summary = run_batch(&config, &mut NoPreview, &NoOpReporter).unwrap();

    assert_eq!(summary.ambiguities.len(), 1);
    assert_eq!(summary.channels_succeeded, 2);
    assert_eq!(summary.channels_failed, 1);
    assert_eq!(summary.groups_failed, 1);

    let failure = &summary.failures[0];
    assert_eq!(failure.kind, FailureKind::Ambiguous);
    assert_eq!(failure.file_name, "s_C00_extra.tif");
    assert!(failure.message.contains("s_C00.tif"), "{}", failure.message);

    let records = read_group_metadata(&d.output.join("s_metadata.json")).unwrap();
    let names: Vec<&str> = records.iter().map(|r| r.file_name.as_str()).collect();
    assert_eq!(names, ["s_C00_normalized.tiff", "s_C02_normalized.tiff"]);
}

#[test]
fn test_corrupt_channel_is_isolated() {
    let d = dirs();
    write_three_channel_sample(&d.input);
    std::fs::write(d.input.join("sample_C01.tif"), b"truncated").unwrap();
    write_u16_tiff(&d.input.join("other_C00.tif"), ramp_u16(1, 8, 8, 0, 100));

    let config = RunConfig::new(&d.input, &d.output);
    let summary = run_batch(&config, &mut NoPreview, &NoOpReporter).unwrap();

    assert_eq!(summary.groups_total, 2);
    assert_eq!(summary.groups_succeeded, 1);
    assert_eq!(summary.groups_failed, 1);
    assert_eq!(summary.channels_succeeded, 3);
    assert_eq!(summary.channels_failed, 1);
    assert!(!summary.is_clean());

    let failure = &summary.failures[0];
    assert_eq!(failure.base_name, "sample");
    assert_eq!(failure.channel_id, "C01");
    assert_eq!(failure.file_name, "sample_C01.tif");
    assert_eq!(failure.kind, FailureKind::Decode);

    assert!(d.output.join("sample_C00_normalized.tiff").exists());
    assert!(!d.output.join("sample_C01_normalized.tiff").exists());
    assert!(d.output.join("sample_C02_normalized.tiff").exists());

    let records = read_group_metadata(&d.output.join("sample_metadata.json")).unwrap();
    let ids: Vec<&str> = records.iter().map(|r| r.original_channel_id.as_str()).collect();
    assert_eq!(ids, ["C00", "C02"]);
}

#[test]
fn test_empty_channel_file_fails_alone() {
    let d = dirs();
    write_u16_tiff(&d.input.join("s_C00.tif"), ramp_u16(1, 4, 4, 0, 10));
    std::fs::write(d.input.join("s_C01.tif"), b"").unwrap();

    let config = RunConfig::new(&d.input, &d.output);
    let summary = run_batch(&config, &mut NoPreview, &NoOpReporter).unwrap();

    assert_eq!(summary.channels_succeeded, 1);
    assert_eq!(summary.channels_failed, 1);
    assert_eq!(summary.failures[0].channel_id, "C01");
    assert!(d.output.join("s_metadata.json").exists());
}

#[test]
fn test_preview_receives_layers_in_channel_order() {
    let d = dirs();
    write_three_channel_sample(&d.input);
    write_u16_tiff(&d.input.join("flat.tif"), Array3::from_elem((1, 4, 4), 77));

    let mut config = RunConfig::new(&d.input, &d.output);
    config.show_preview = true;
    let mut preview = RecordingPreview::default();
    run_batch(&config, &mut preview, &NoOpReporter).unwrap();

    assert_eq!(preview.calls.len(), 2);
    let (title, layers) = &preview.calls[0];
    assert_eq!(title, "QC: flat");
    assert_eq!(
        layers,
        &[("SINGLECHANNEL (Norm)".to_string(), "gray".to_string(), (0, 65535))]
    );

    let (title, layers) = &preview.calls[1];
    assert_eq!(title, "QC: sample");
    let labels: Vec<&str> = layers.iter().map(|l| l.0.as_str()).collect();
    assert_eq!(labels, ["C00 (Norm)", "C01 (Norm)", "C02 (Norm)"]);
    let colors: Vec<&str> = layers.iter().map(|l| l.1.as_str()).collect();
    assert_eq!(colors, ["blue", "green", "red"]);
    for (_, _, (lo, hi)) in layers {
        assert!(lo < hi);
    }
}

#[test]
fn test_preview_not_called_when_disabled() {
    let d = dirs();
    write_three_channel_sample(&d.input);

    let config = RunConfig::new(&d.input, &d.output);
    let mut preview = RecordingPreview::default();
    run_batch(&config, &mut preview, &NoOpReporter).unwrap();
    assert!(preview.calls.is_empty());
}

#[test]
fn test_composite_preview_written_per_group() {
    let d = dirs();
    write_three_channel_sample(&d.input);

    let mut config = RunConfig::new(&d.input, &d.output);
    config.show_preview = true;
    let mut preview = CompositePngPreview::new(&d.output);
    run_batch(&config, &mut preview, &NoOpReporter).unwrap();

    assert!(d.output.join("sample_preview.png").exists());
}

#[test]
fn test_reporter_sees_groups_and_channels_in_order() {
    let d = dirs();
    write_three_channel_sample(&d.input);
    write_u16_tiff(&d.input.join("alpha_C00.tif"), ramp_u16(1, 4, 4, 0, 10));

    let config = RunConfig::new(&d.input, &d.output);
    let reporter = RecordingReporter::default();
    run_batch(&config, &mut NoPreview, &reporter).unwrap();

    let events = reporter.events.into_inner().unwrap();
    assert_eq!(
        events,
        [
            "group alpha 1",
            "channel C00 true",
            "group sample 3",
            "channel C00 true",
            "channel C01 true",
            "channel C02 true",
        ]
    );
}

#[test]
fn test_non_tiff_files_ignored_and_output_dir_created() {
    let d = dirs();
    write_three_channel_sample(&d.input);
    std::fs::write(d.input.join("notes.txt"), b"hello").unwrap();

    let config = RunConfig::new(&d.input, d.output.join("nested"));
    let summary = run_batch(&config, &mut NoPreview, &NoOpReporter).unwrap();
    assert_eq!(summary.channels_succeeded, 3);
    assert!(d.output.join("nested").join("sample_metadata.json").exists());
}

#[test]
fn test_missing_input_dir_is_fatal() {
    let d = dirs();
    let config = RunConfig::new(d.input.join("absent"), &d.output);
    let err = run_batch(&config, &mut NoPreview, &NoOpReporter).unwrap_err();
    assert!(matches!(err, StackNormError::InputDirectory { .. }));
    assert!(err.is_fatal());
}

#[test]
fn test_unwritable_output_is_fatal() {
    let d = dirs();
    write_three_channel_sample(&d.input);
    // A regular file where the output directory should be.
    std::fs::write(&d.output, b"occupied").unwrap();

    let config = RunConfig::new(&d.input, &d.output);
    let err = run_batch(&config, &mut NoPreview, &NoOpReporter).unwrap_err();
    assert!(matches!(err, StackNormError::OutputWrite { .. }));
}

#[test]
fn test_rerun_is_bit_exact() {
    let d = dirs();
    write_three_channel_sample(&d.input);
    let config = RunConfig::new(&d.input, &d.output);

    run_batch(&config, &mut NoPreview, &NoOpReporter).unwrap();
    let first = std::fs::read(d.output.join("sample_C00_normalized.tiff")).unwrap();
    run_batch(&config, &mut NoPreview, &NoOpReporter).unwrap();
    let second = std::fs::read(d.output.join("sample_C00_normalized.tiff")).unwrap();
    assert_eq!(first, second);
}
