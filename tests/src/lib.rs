//! # OCR Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/      # Whole-committee scenarios on the local devnet
//!     ├── harness.rs    # Fast timings, event waiting helpers
//!     ├── happy_path.rs
//!     ├── faults.rs     # Data source outages, leader failure
//!     ├── transmission.rs
//!     └── reconfiguration.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ocr-tests
//! cargo test -p ocr-tests integration::faults::
//!
//! # Benchmarks
//! cargo bench -p ocr-tests
//! ```

#![allow(dead_code)]

pub mod integration;
