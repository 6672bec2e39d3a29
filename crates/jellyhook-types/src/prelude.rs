pub use crate::error::{ClResult, Error};
pub use crate::types::{RefreshScope, TargetKey};

pub use tracing::{debug, error, info, warn};

// vim: ts=4
