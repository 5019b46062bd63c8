//! Isolated-pool worker running the synthetic spin workload.
//!
//! Speaks the `par_sweep::proto` protocol on stdin/stdout; spawned by the
//! isolated backend when the workload under measurement is the built-in
//! [`SpinProcessor`].

use par_sweep::{SpinProcessor, proto};

fn main() -> std::io::Result<()> {
    proto::serve(&SpinProcessor)
}
