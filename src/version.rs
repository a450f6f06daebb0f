// Crate identity, reported by GET /version and logged at startup

pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// "name version", e.g. for startup log lines.
pub fn banner() -> String {
    format!("{NAME} {VERSION}")
}
