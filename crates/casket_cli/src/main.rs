//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `casket_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("casket_core version={}", casket_core::core_version());
    println!("casket_core stamp_format={}", casket_core::STAMP_FORMAT);
}
