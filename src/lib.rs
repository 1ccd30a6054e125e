/// FormKit - typed form definitions and response binding
///
/// This is the root crate that provides workspace-level documentation.
/// The implementation is in `formkit-core`, re-exported here.
pub use formkit_core::*;

/// Returns the version of the package.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
