//! Isolated-pool worker running the image transform pipeline.
//!
//! Speaks the `par_sweep::proto` protocol on stdin/stdout; spawned by the
//! isolated backend, one process per pool worker.

use par_sweep::proto;
use pixel_pipeline::PixelProcessor;

fn main() -> std::io::Result<()> {
    proto::serve(&PixelProcessor)
}
