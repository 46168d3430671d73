//! Shared test utilities for the simple-gallery test suite.
//!
//! Image generators produce small real encodings so the pure-Rust backend can
//! decode them, and [`registry`] builds a user table covering every access
//! profile shape.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let source = jpeg_bytes(400, 300);
//! let users = registry();
//! assert!(users.verify("alice", "alice-pw"));
//! ```

use crate::users::{UserRecord, UserRegistry};
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

// =========================================================================
// Image fixtures
// =========================================================================

/// A gradient JPEG of the given size.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Jpeg).unwrap();
    out.into_inner()
}

/// A PNG with an alpha channel, so encoders that drop alpha get exercised.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        let alpha = if (x + y) % 2 == 0 { 255 } else { 128 };
        Rgba([(x % 256) as u8, 64, (y % 256) as u8, alpha])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

// =========================================================================
// Users
// =========================================================================

/// Users JSON with one user per profile shape. `mallory` has no access level.
pub const USERS_JSON: &str = r#"[
    { "userName": "admin", "password": "admin-pw", "accessLevel": "all" },
    { "userName": "alice", "password": "alice-pw", "accessLevel": { "allow": ["vacation"] } },
    { "userName": "bob", "password": "bob-pw", "accessLevel": { "deny": ["work"] } },
    { "userName": "mallory", "password": "mallory-pw" }
]"#;

pub fn registry() -> UserRegistry {
    let records: Vec<UserRecord> = serde_json::from_str(USERS_JSON).unwrap();
    UserRegistry::from_records(records).unwrap()
}
