//! # Curved Voxel Engine Entry Point
//!
//! Starts a headless session driven by commands on stdin.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release
//! ```

fn main() {
    curved_voxel_engine::run();
}
