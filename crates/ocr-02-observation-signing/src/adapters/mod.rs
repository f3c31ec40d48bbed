//! Port implementations backed by in-process key material.

pub mod keys;
