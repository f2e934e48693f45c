//! Build output assets: discovery and content identities.
//!
//! - [`scan`]: enumerate uploadable assets and HTML documents
//! - [`identity`]: `(local path, content hash)` pairs used as manifest keys

mod identity;
mod scan;

pub use identity::Identity;
pub use scan::scan_output;
