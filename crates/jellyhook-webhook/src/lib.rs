//! Webhook module
//!
//! Accepts Radarr and Sonarr notifications and turns them into Jellyfin
//! refresh requests.
//!
//! # Headers
//!
//! - `X-Jellyfin-Url` / `X-Jellyfin-Api-Key` - Target server, falling back to
//!   `JELLYFIN_URL` / `JELLYFIN_API_KEY`
//! - `X-Jellyfin-Library-Ids` - Comma-separated library ids to refresh
//! - `X-Jellyfin-Collection-Types` - Comma-separated collection types
//!   (`movies`, `tvshows`, ...) resolved to library ids
//!
//! Without ids or collection types the whole server is refreshed.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod handler;
pub mod headers;
pub mod select;

mod prelude;

pub use handler::{get_libraries, post_radarr, post_sonarr};
pub use select::{select_library_ids_by_collection, CollectionSelection};

// vim: ts=4
