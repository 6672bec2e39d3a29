//! Adapter that talks to the downstream media server

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::prelude::*;

/// One library as reported by the media server.
///
/// Deserialized from the Jellyfin `VirtualFolders` shape (`Name`, `ItemId` or
/// `Id`, `CollectionType`, `Locations` or `LibraryOptions.PathInfos[].Path`),
/// serialized in the camelCase shape served by `/libraries`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawVirtualFolder")]
pub struct VirtualFolder {
	pub name: Option<Box<str>>,
	pub item_id: Option<Box<str>>,
	pub collection_type: Option<Box<str>>,
	pub locations: Vec<Box<str>>,
}

impl VirtualFolder {
	/// Lower-cased collection type, `None` when unset or empty
	pub fn collection_kind(&self) -> Option<String> {
		self.collection_type.as_deref().filter(|s| !s.is_empty()).map(str::to_lowercase)
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawVirtualFolder {
	name: Option<String>,
	item_id: Option<String>,
	id: Option<String>,
	collection_type: Option<String>,
	locations: Option<Vec<Option<String>>>,
	library_options: Option<RawLibraryOptions>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawLibraryOptions {
	path_infos: Option<Vec<RawPathInfo>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawPathInfo {
	path: Option<String>,
}

fn non_empty(s: Option<String>) -> Option<Box<str>> {
	s.filter(|s| !s.is_empty()).map(Into::into)
}

impl From<RawVirtualFolder> for VirtualFolder {
	fn from(raw: RawVirtualFolder) -> Self {
		let mut locations: Vec<Box<str>> =
			raw.locations.unwrap_or_default().into_iter().filter_map(non_empty).collect();
		if locations.is_empty() {
			locations = raw
				.library_options
				.and_then(|opts| opts.path_infos)
				.unwrap_or_default()
				.into_iter()
				.filter_map(|info| non_empty(info.path))
				.collect();
		}

		VirtualFolder {
			name: raw.name.map(Into::into),
			item_id: non_empty(raw.item_id).or_else(|| non_empty(raw.id)),
			collection_type: raw.collection_type.map(Into::into),
			locations,
		}
	}
}

/// Performs one refresh against a target
#[async_trait]
pub trait RefreshSink: Debug + Send + Sync {
	/// Refresh `scope` on `target`. The message is reported back to synchronous callers.
	async fn refresh(&self, target: &TargetKey, scope: &RefreshScope) -> ClResult<Box<str>>;
}

/// Full media server client: reachability, library listing, refresh
#[async_trait]
pub trait MediaServerAdapter: RefreshSink {
	/// Check that the server answers and accepts the API key
	async fn ping(&self, target: &TargetKey) -> ClResult<Box<str>>;

	/// List libraries, sorted by lower-cased name then item id
	async fn virtual_folders(&self, target: &TargetKey) -> ClResult<Vec<VirtualFolder>>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_item_id_falls_back_to_id() {
		let folder: VirtualFolder =
			serde_json::from_str(r#"{"Name":"Movies","Id":"abc","CollectionType":"movies"}"#)
				.unwrap();
		assert_eq!(folder.item_id.as_deref(), Some("abc"));
		assert_eq!(folder.collection_kind().as_deref(), Some("movies"));
	}

	#[test]
	fn test_locations_fall_back_to_path_infos() {
		let folder: VirtualFolder = serde_json::from_str(
			r#"{"Name":"Shows","ItemId":"s1","Locations":[],
				"LibraryOptions":{"PathInfos":[{"Path":"/tv"},{"Path":""},{}]}}"#,
		)
		.unwrap();
		assert_eq!(folder.locations, vec![Box::from("/tv")]);
	}

	#[test]
	fn test_serializes_camel_case() {
		let folder = VirtualFolder {
			name: Some("Movies".into()),
			item_id: Some("m1".into()),
			collection_type: None,
			locations: vec!["/movies".into()],
		};
		let json = serde_json::to_value(&folder).unwrap();
		assert_eq!(
			json,
			serde_json::json!({
				"name": "Movies",
				"itemId": "m1",
				"collectionType": null,
				"locations": ["/movies"],
			})
		);
	}
}

// vim: ts=4
