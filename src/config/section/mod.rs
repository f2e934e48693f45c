//! Configuration section definitions.
//!
//! Each module corresponds to a section in `cdnify.toml`:
//!
//! | Module     | TOML Section   | Purpose                                   |
//! |------------|----------------|-------------------------------------------|
//! | `build`    | `[build]`      | Build output layout, bootstrap file names |
//! | `upload`   | `[upload]`     | Upload command and retry budget           |
//! | `manifest` | `[manifest]`   | Fingerprint manifest location             |

mod build;
mod manifest;
mod upload;

pub use build::BuildConfig;
pub use manifest::ManifestConfig;
pub use upload::UploadConfig;
