//! Rebuilds the crate when the embedded review schema migrations change.
//!
//! `embed_migrations!` pulls the SQL in at compile time, which Cargo does not
//! track on its own.

fn main() {
    println!("cargo:rerun-if-changed=migrations");
    println!("cargo:rerun-if-changed=build.rs");
}
