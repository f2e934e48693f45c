//! Fingerprint manifest: persisted `identity → remote location` table and
//! the diff engine that decides what must be uploaded.

mod diff;
mod store;

pub use diff::diff_assets;
pub use store::FingerprintStore;
