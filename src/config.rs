//! Defaults shared by the engine and both binaries.

/// Default sheet width when none is given.
pub const DEFAULT_SHEET_WIDTH: f64 = 2050.0;

/// Default sheet height when none is given.
pub const DEFAULT_SHEET_HEIGHT: f64 = 3050.0;

/// Upper bound on expanded piece instances per run. Packing is quadratic in
/// this count.
pub const DEFAULT_MAX_INSTANCES: usize = 100_000;

/// Tighter cap for HTTP requests, which share the server's blocking pool.
pub const SERVER_MAX_INSTANCES: usize = 10_000;

/// Port the HTTP server binds when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 3001;

/// Log file the HTTP server appends to when `LOG_FILE` is unset.
pub const DEFAULT_LOG_FILE: &str = "development.log";

/// ASCII drawing bounds, in character cells.
pub const RENDER_MAX_WIDTH: f64 = 80.0;
pub const RENDER_MAX_HEIGHT: f64 = 40.0;
