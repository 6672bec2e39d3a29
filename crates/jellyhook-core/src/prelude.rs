pub use crate::app::App;
pub use jellyhook_types::error::{ClResult, Error};
pub use jellyhook_types::types::{RefreshScope, TargetKey};

pub use tracing::{debug, error, info, warn};

// vim: ts=4
