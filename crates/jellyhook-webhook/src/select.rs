//! Library selection by collection type

use std::collections::{BTreeSet, HashSet};

use jellyhook_types::media_adapter::{MediaServerAdapter, VirtualFolder};

use crate::prelude::*;

/// Libraries matching a set of requested collection types
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CollectionSelection {
	/// Item ids of matching libraries, in folder order
	pub ids: Vec<Box<str>>,
	/// Requested types no library has, sorted
	pub missing: Vec<String>,
	/// Every collection type the server reports, sorted
	pub available: Vec<String>,
}

/// Pick the libraries whose collection type was requested.
///
/// Folders without a collection type are ignored. `requested` is expected
/// lower-cased.
pub fn select_library_ids_by_collection(
	folders: &[VirtualFolder],
	requested: &[String],
) -> CollectionSelection {
	let requested: HashSet<&str> = requested.iter().map(String::as_str).collect();
	let mut available = BTreeSet::new();
	let mut ids = Vec::new();

	for folder in folders {
		let Some(kind) = folder.collection_kind() else {
			continue;
		};
		if requested.contains(kind.as_str()) {
			if let Some(item_id) = &folder.item_id {
				ids.push(item_id.clone());
			}
		}
		available.insert(kind);
	}

	let mut missing: Vec<String> = requested
		.into_iter()
		.filter(|kind| !available.contains(*kind))
		.map(str::to_string)
		.collect();
	missing.sort();

	CollectionSelection { ids, missing, available: available.into_iter().collect() }
}

/// 400 listing unknown collection types together with the known ones
pub fn unknown_types_error(selection: &CollectionSelection) -> Error {
	Error::ValidationError(format!(
		"Unknown collection types: {}. Available: {}",
		selection.missing.join(", "),
		selection.available.join(", ")
	))
}

/// Resolve collection types to library ids on `target`
pub async fn resolve_collection_types(
	adapter: &dyn MediaServerAdapter,
	target: &TargetKey,
	collection_types: &[String],
) -> ClResult<Vec<Box<str>>> {
	let folders = adapter.virtual_folders(target).await?;
	let selection = select_library_ids_by_collection(&folders, collection_types);

	if !selection.missing.is_empty() {
		return Err(unknown_types_error(&selection));
	}
	if selection.ids.is_empty() {
		return Err(Error::ValidationError(format!(
			"No libraries matched collection types: {}",
			collection_types.join(", ")
		)));
	}

	debug!(
		endpoint = %target,
		collection_types = %collection_types.join(", "),
		ids = %selection.ids.join(", "),
		"Collection types resolved"
	);
	Ok(selection.ids)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn folder(name: &str, item_id: Option<&str>, kind: Option<&str>) -> VirtualFolder {
		VirtualFolder {
			name: Some(name.into()),
			item_id: item_id.map(Into::into),
			collection_type: kind.map(Into::into),
			locations: Vec::new(),
		}
	}

	fn types(list: &[&str]) -> Vec<String> {
		list.iter().map(ToString::to_string).collect()
	}

	#[test]
	fn test_selects_in_folder_order() {
		let folders = [
			folder("Shows", Some("s1"), Some("tvshows")),
			folder("Movies", Some("m1"), Some("Movies")),
			folder("Kids", Some("m2"), Some("movies")),
			folder("Music", Some("x1"), Some("music")),
		];
		let selection = select_library_ids_by_collection(&folders, &types(&["movies", "tvshows"]));
		assert_eq!(selection.ids, vec![Box::from("s1"), Box::from("m1"), Box::from("m2")]);
		assert!(selection.missing.is_empty());
		assert_eq!(selection.available, types(&["movies", "music", "tvshows"]));
	}

	#[test]
	fn test_reports_missing_sorted() {
		let folders = [folder("Movies", Some("m1"), Some("movies")), folder("Mixed", Some("x"), None)];
		let selection =
			select_library_ids_by_collection(&folders, &types(&["tvshows", "books", "movies"]));
		assert_eq!(selection.missing, types(&["books", "tvshows"]));
		assert_eq!(selection.available, types(&["movies"]));
		assert_eq!(
			unknown_types_error(&selection).to_string(),
			"Unknown collection types: books, tvshows. Available: movies"
		);
	}

	#[test]
	fn test_folders_without_ids_are_skipped() {
		let folders = [folder("Movies", None, Some("movies"))];
		let selection = select_library_ids_by_collection(&folders, &types(&["movies"]));
		assert!(selection.ids.is_empty());
		assert!(selection.missing.is_empty());
	}
}

// vim: ts=4
