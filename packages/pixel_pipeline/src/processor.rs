use std::fs;
use std::io;
use std::path::Path;

use par_sweep::{ItemError, ItemProcessor, OutputSink, WorkUnit};
use thiserror::Error;

use crate::filters::{adjust_brightness, gaussian_blur, grayscale, sharpen, sobel_edge};

/// Errors produced while processing one image.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// The input image could not be read or decoded.
    #[error("failed to read image '{path}': {source}")]
    Read {
        /// The input path.
        path: String,

        /// The underlying decoding error.
        source: image::ImageError,
    },

    /// The input path has no file name to derive the output name from.
    #[error("input path '{path}' has no file name")]
    NoFileName {
        /// The input path.
        path: String,
    },

    /// The output directory could not be created.
    #[error("failed to create output directory '{path}': {source}")]
    Sink {
        /// The output directory.
        path: String,

        /// The underlying I/O error.
        source: io::Error,
    },

    /// The transformed image could not be encoded or written.
    #[error("failed to write image '{path}': {source}")]
    Write {
        /// The output path.
        path: String,

        /// The underlying encoding error.
        source: image::ImageError,
    },
}

/// Applies the full transform pipeline to single images: grayscale,
/// gaussian blur, sobel edge detection, sharpen, brightness adjustment.
///
/// As a [`par_sweep`] workload each item is an input image path and the
/// sink is the output directory; the transformed image keeps the input's
/// file name. Re-processing the same item overwrites the same output, so
/// the processor is idempotent as the harness requires.
#[derive(Clone, Copy, Debug, Default)]
pub struct PixelProcessor;

impl PixelProcessor {
    /// Processes one image file, writing the transformed result into the
    /// output directory (created if missing).
    ///
    /// # Errors
    ///
    /// Fails when the input cannot be decoded or the output cannot be
    /// written; see [`PipelineError`].
    pub fn process_path(&self, input: &Path, output_dir: &Path) -> Result<(), PipelineError> {
        let rgb = image::open(input)
            .map_err(|source| PipelineError::Read {
                path: input.display().to_string(),
                source,
            })?
            .to_rgb8();

        let transformed = adjust_brightness(&sharpen(&sobel_edge(&gaussian_blur(&grayscale(
            &rgb,
        )))));

        let file_name = input.file_name().ok_or_else(|| PipelineError::NoFileName {
            path: input.display().to_string(),
        })?;

        fs::create_dir_all(output_dir).map_err(|source| PipelineError::Sink {
            path: output_dir.display().to_string(),
            source,
        })?;

        let output = output_dir.join(file_name);

        transformed.save(&output).map_err(|source| PipelineError::Write {
            path: output.display().to_string(),
            source,
        })?;

        Ok(())
    }
}

impl ItemProcessor for PixelProcessor {
    fn process(&self, unit: &WorkUnit, sink: &OutputSink) -> Result<(), ItemError> {
        self.process_path(Path::new(unit.item()), Path::new(sink.as_str()))
            .map_err(Into::into)
    }
}
