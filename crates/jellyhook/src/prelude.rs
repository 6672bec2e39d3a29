pub use jellyhook_core::prelude::*;

// vim: ts=4
