//! Runs the pipeline over generated images, in-process and through the
//! isolated backend's real `pixel_worker` binary.

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use new_zealand::nz;
use par_sweep::{
    BaselinePolicy, Granularity, PoolModel, Strategy, Sweep, SweepConfig, WorkerCommand,
    units_from,
};
use pixel_pipeline::PixelProcessor;

/// Writes `count` small gradient images into `dir`, returning their paths.
fn generate_images(dir: &Path, count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "test images are tiny"
            )]
            let image = RgbImage::from_fn(24, 24, |x, y| {
                Rgb([(x * 10) as u8, (y * 10) as u8, (i * 40) as u8])
            });

            let path = dir.join(format!("image_{i}.png"));
            image.save(&path).unwrap();
            path
        })
        .collect()
}

#[test]
fn processes_one_image_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = generate_images(dir.path(), 1);
    let output_dir = dir.path().join("out");

    PixelProcessor.process_path(&inputs[0], &output_dir).unwrap();

    let output = output_dir.join("image_0.png");
    let written = image::open(&output).unwrap();
    assert_eq!(written.width(), 24);
    assert_eq!(written.height(), 24);
}

#[test]
fn reprocessing_the_same_image_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = generate_images(dir.path(), 1);
    let output_dir = dir.path().join("out");

    PixelProcessor.process_path(&inputs[0], &output_dir).unwrap();
    let first = std::fs::read(output_dir.join("image_0.png")).unwrap();

    PixelProcessor.process_path(&inputs[0], &output_dir).unwrap();
    let second = std::fs::read(output_dir.join("image_0.png")).unwrap();

    assert_eq!(first, second);
}

#[test]
fn isolated_chunked_sweep_transforms_every_image() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = generate_images(dir.path(), 6);
    let units = units_from(inputs.iter().map(|p| p.display().to_string()));

    let sink_base = dir.path().join("output");
    let config = SweepConfig::new(Strategy::new(PoolModel::Isolated, Granularity::Chunked))
        .with_worker_counts(vec![nz!(1), nz!(2)])
        .with_baseline_policy(BaselinePolicy::SelfRelative)
        .with_sink_base(sink_base.display().to_string())
        .with_worker(WorkerCommand::new(env!("CARGO_BIN_EXE_pixel_worker")));

    let run = Sweep::new(config).execute(&units, &PixelProcessor).unwrap();

    assert_eq!(run.rows().len(), 2);
    assert!(run.failed().is_empty());

    // Every sweep point wrote all six images into its own sink.
    for point in ["isolated_chunked_1", "isolated_chunked_2"] {
        for i in 0..6 {
            let output = sink_base.join(point).join(format!("image_{i}.png"));
            assert!(output.exists(), "missing {}", output.display());
        }
    }
}
