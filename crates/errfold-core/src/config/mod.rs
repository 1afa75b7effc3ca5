//! Configuration
//!
//! Settings are loaded from `errfold.toml` (or `.errfold.toml`) in the
//! project root:
//!
//! ```toml
//! [detection]
//! error_variables = ["err", "error"]
//!
//! [cache]
//! ttl_ms = 5000
//! debounce_ms = 300
//!
//! [display]
//! max_preview_chars = 50
//! ```
//!
//! Settings are re-read on demand. Reloading them never touches cached scan
//! results; callers invalidate documents themselves when a change should
//! apply immediately.

mod settings;


pub use settings::{
    CacheSettings, DetectionSettings, DisplaySettings, Settings, CONFIG_FILE_NAMES,
    DEFAULT_ERROR_VARIABLES,
};
