//! Common types used throughout jellyhook.

use std::collections::HashSet;

// TargetKey //
//***********//
/// One independent refresh destination: a Jellyfin server URL and its API key.
///
/// Ordering is by URL, then key. The API key is never part of the `Display`
/// form so targets can be logged safely.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetKey {
	pub url: Box<str>,
	pub api_key: Box<str>,
}

impl TargetKey {
	pub fn new(url: impl Into<Box<str>>, api_key: impl Into<Box<str>>) -> Self {
		Self { url: url.into(), api_key: api_key.into() }
	}

	/// Base URL without trailing slashes
	pub fn base_url(&self) -> &str {
		self.url.trim_end_matches('/')
	}
}

impl std::fmt::Display for TargetKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.base_url())
	}
}

// RefreshScope //
//**************//
/// What a refresh asks for
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshScope {
	/// Refresh the whole server
	All,
	/// Refresh specific library ids (deduplicated, first-seen order)
	Ids(Vec<Box<str>>),
}

impl RefreshScope {
	/// Build a scope from library ids. No ids means everything.
	pub fn from_ids<I, S>(ids: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let ids = merge_ids([ids]);
		if ids.is_empty() { RefreshScope::All } else { RefreshScope::Ids(ids) }
	}

	pub fn is_all(&self) -> bool {
		matches!(self, RefreshScope::All)
	}

	/// Merge another request into this one. `All` absorbs everything.
	pub fn merge(&mut self, other: RefreshScope) {
		match other {
			RefreshScope::All => *self = RefreshScope::All,
			RefreshScope::Ids(more) => {
				if let RefreshScope::Ids(ids) = self {
					*ids = merge_ids([ids.as_slice(), more.as_slice()]);
				}
			}
		}
	}

	/// Library ids, or `None` when the whole server is targeted
	pub fn ids(&self) -> Option<&[Box<str>]> {
		match self {
			RefreshScope::All => None,
			RefreshScope::Ids(ids) => Some(ids),
		}
	}
}

impl std::fmt::Display for RefreshScope {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			RefreshScope::All => write!(f, "(all)"),
			RefreshScope::Ids(ids) => write!(f, "{}", ids.join(", ")),
		}
	}
}

/// Concatenate id lists, dropping empty and repeated ids while keeping the
/// first-seen order.
pub fn merge_ids<L, I, S>(lists: L) -> Vec<Box<str>>
where
	L: IntoIterator<Item = I>,
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let mut seen = HashSet::new();
	let mut merged = Vec::new();
	for list in lists {
		for id in list {
			let id = id.as_ref();
			if !id.is_empty() && seen.insert(id.to_string()) {
				merged.push(Box::from(id));
			}
		}
	}
	merged
}


// vim: ts=4
