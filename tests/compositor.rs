mod common;

use common::sprites::{bordered_sprite, read_rgba, scratch_dir, sprite_row, write_png};
use image::{GrayImage, Luma, Rgba, RgbaImage};
use sprite_composite::config::{ErrorPolicy, RunConfig};
use sprite_composite::pipeline::{ConsoleProgress, FileOutcome};
use sprite_composite::{CompositeError, Compositor, blend_rgba};
use std::fs;
use std::path::PathBuf;

fn template_dirs(root: &std::path::Path, game: &str) -> RunConfig {
    let config = RunConfig::for_game(root, game);
    fs::create_dir_all(&config.input_dir).expect("input dir");
    config
}

#[test]
fn opaque_pair_scenario_writes_blended_pixel() {
    let root = scratch_dir("scenario_a");
    let config = template_dirs(&root, "Sonic 1");
    write_png(
        &config.input_dir.join("digit.png"),
        &sprite_row(&[[100, 50, 200, 255], [50, 150, 100, 255]]),
    );

    let mut trace = Vec::new();
    let report = Compositor::new(config.clone())
        .process_directory(&mut trace)
        .expect("batch");

    let output = read_rgba(&config.output_dir.join("digit.png"));
    assert_eq!(output.dimensions(), (1, 1));
    assert_eq!(*output.get_pixel(0, 0), Rgba([75, 100, 150, 255]));
    assert_eq!(trace, vec![config.input_dir.join("digit.png")]);
    assert!(report.is_clean());
}

#[test]
fn transparent_pair_scenario_writes_transparent_black() {
    let root = scratch_dir("scenario_b");
    let config = template_dirs(&root, "Sonic 1");
    write_png(
        &config.input_dir.join("edge.png"),
        &sprite_row(&[[10, 10, 10, 0], [200, 200, 200, 255]]),
    );

    Compositor::new(config.clone())
        .process_directory(&mut Vec::new())
        .expect("batch");

    let output = read_rgba(&config.output_dir.join("edge.png"));
    assert_eq!(*output.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
}

#[test]
fn single_column_scenario_is_reported_empty_and_not_written() {
    let root = scratch_dir("scenario_c");
    let config = template_dirs(&root, "Sonic 1");
    let source = config.input_dir.join("bar.png");
    write_png(&source, &RgbaImage::from_pixel(1, 5, Rgba([9, 9, 9, 255])));

    let report = Compositor::new(config.clone())
        .process_directory(&mut Vec::new())
        .expect("batch");

    assert_eq!(report.empty, vec![source]);
    assert!(report.written.is_empty());
    assert!(report.is_clean());
    assert!(!config.output_dir.join("bar.png").exists());
}

#[test]
fn invalid_entry_is_skipped_and_others_are_written() {
    let root = scratch_dir("scenario_d_skip");
    let config = template_dirs(&root, "Sonic 2");
    write_png(&config.input_dir.join("a.png"), &bordered_sprite(8, 6));
    fs::write(config.input_dir.join("b.txt"), b"notes, not a sprite").expect("write");
    write_png(&config.input_dir.join("c.png"), &bordered_sprite(5, 3));

    let mut trace = Vec::new();
    let report = Compositor::new(config.clone())
        .process_directory(&mut trace)
        .expect("batch");

    assert_eq!(
        trace,
        ["a.png", "b.txt", "c.png"]
            .iter()
            .map(|name| config.input_dir.join(name))
            .collect::<Vec<PathBuf>>()
    );
    assert_eq!(report.written.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, config.input_dir.join("b.txt"));
    assert!(matches!(
        report.failures[0].error,
        CompositeError::UnreadableImage { .. }
    ));
    assert!(!config.output_dir.join("b.txt").exists());

    for (name, width, height) in [("a.png", 8, 6), ("c.png", 5, 3)] {
        let expected = blend_rgba(&bordered_sprite(width, height)).expect("blend");
        let output = read_rgba(&config.output_dir.join(name));
        assert_eq!(output.dimensions(), (width - 1, height));
        assert_eq!(output.as_raw(), expected.as_raw(), "{name}");
    }
}

#[test]
fn abort_policy_stops_at_first_failure_and_keeps_earlier_outputs() {
    let root = scratch_dir("scenario_d_abort");
    let config = template_dirs(&root, "Sonic 2").with_error_policy(ErrorPolicy::Abort);
    write_png(&config.input_dir.join("a.png"), &bordered_sprite(4, 4));
    fs::write(config.input_dir.join("b.png"), b"truncated").expect("write");
    write_png(&config.input_dir.join("c.png"), &bordered_sprite(4, 4));

    let mut trace = Vec::new();
    let error = Compositor::new(config.clone())
        .process_directory(&mut trace)
        .expect_err("abort on b.png");

    match error {
        CompositeError::UnreadableImage { path, .. } => {
            assert_eq!(path, config.input_dir.join("b.png"))
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(trace.len(), 2);
    assert!(config.output_dir.join("a.png").exists());
    assert!(!config.output_dir.join("b.png").exists());
    assert!(!config.output_dir.join("c.png").exists());
}

#[test]
fn subdirectory_entry_is_a_per_file_failure() {
    let root = scratch_dir("subdir");
    let config = template_dirs(&root, "Sonic CD");
    fs::create_dir_all(config.input_dir.join("extras")).expect("mkdir");
    write_png(&config.input_dir.join("ring.png"), &bordered_sprite(6, 6));

    let report = Compositor::new(config.clone())
        .process_directory(&mut Vec::new())
        .expect("batch");

    assert_eq!(report.written, vec![config.output_dir.join("ring.png")]);
    assert!(matches!(
        report.failures[0].error,
        CompositeError::NotAFile { .. }
    ));
}

#[test]
fn missing_input_directory_aborts_before_creating_output() {
    let root = scratch_dir("missing_input");
    let config = RunConfig::for_game(&root, "Nowhere");

    let mut trace = Vec::new();
    let error = Compositor::new(config.clone())
        .process_directory(&mut trace)
        .expect_err("missing input");

    assert!(matches!(error, CompositeError::InputDirectoryNotFound { .. }));
    assert!(trace.is_empty());
    assert!(!config.output_dir.exists());
}

#[test]
fn rerun_overwrites_outputs_deterministically() {
    let root = scratch_dir("rerun");
    let config = template_dirs(&root, "Sonic 3");
    write_png(&config.input_dir.join("life.png"), &bordered_sprite(12, 9));
    let output_path = config.output_dir.join("life.png");
    let compositor = Compositor::new(config);

    compositor.process_directory(&mut Vec::new()).expect("first run");
    let first = fs::read(&output_path).expect("first output");
    compositor.process_directory(&mut Vec::new()).expect("second run");
    let second = fs::read(&output_path).expect("second output");

    assert_eq!(first, second);
}

#[test]
fn grayscale_sources_are_composited_as_opaque_rgba() {
    let root = scratch_dir("grayscale");
    let config = template_dirs(&root, "Sonic 1");
    let mut gray = GrayImage::new(3, 1);
    gray.put_pixel(0, 0, Luma([0]));
    gray.put_pixel(1, 0, Luma([101]));
    gray.put_pixel(2, 0, Luma([255]));
    gray.save(config.input_dir.join("gray.png")).expect("write fixture");

    let report = Compositor::new(config.clone())
        .process_directory(&mut Vec::new())
        .expect("batch");

    assert!(matches!(
        report.written.as_slice(),
        [path] if path.ends_with("gray.png")
    ));
    let output = read_rgba(&config.output_dir.join("gray.png"));
    assert_eq!(*output.get_pixel(0, 0), Rgba([50, 50, 50, 255]));
    assert_eq!(*output.get_pixel(1, 0), Rgba([178, 178, 178, 255]));
}

#[test]
fn process_file_keeps_name_and_format() {
    let root = scratch_dir("format");
    let output_dir = root.join("out");
    fs::create_dir_all(&output_dir).expect("mkdir");
    let source = root.join("time.bmp");
    bordered_sprite(6, 4).save(&source).expect("write fixture");

    let outcome = sprite_composite::pipeline::process_file(&source, &output_dir).expect("process");

    let destination = output_dir.join("time.bmp");
    assert_eq!(outcome, FileOutcome::Written(destination.clone()));
    let format = image::ImageReader::open(&destination)
        .expect("open")
        .with_guessed_format()
        .expect("guess")
        .format();
    assert_eq!(format, Some(image::ImageFormat::Bmp));
}

#[test]
fn console_progress_prints_one_input_path_per_file() {
    let root = scratch_dir("console_trace");
    let config = template_dirs(&root, "Sonic 1");
    write_png(&config.input_dir.join("1.png"), &bordered_sprite(5, 5));
    fs::write(config.input_dir.join("2.png"), b"junk").expect("write");
    write_png(&config.input_dir.join("3.png"), &bordered_sprite(5, 5));

    let mut progress = ConsoleProgress::new(Vec::new());
    let report = Compositor::new(config.clone())
        .process_directory(&mut progress)
        .expect("batch");

    let printed = String::from_utf8(progress.into_inner()).expect("utf8");
    let expected: String = ["1.png", "2.png", "3.png"]
        .iter()
        .map(|name| format!("{}\n", config.input_dir.join(name).display()))
        .collect();
    assert_eq!(printed, expected);
    assert_eq!(report.summary(), "1 of 3 files could not be composited");
}
