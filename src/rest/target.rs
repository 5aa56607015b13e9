//! Request targets relative to (or inside) a client's base URL.

// crates.io
use url::form_urlencoded;
// self
use crate::{_prelude::*, error::ConfigError};

/// Where a request goes, relative to the client's base URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
	/// Unescaped path segments; each one is form-escaped and the results are joined with `/`.
	Segments(Vec<String>),
	/// An already-escaped path relative to the base URL.
	Path(String),
	/// A fully-qualified URL which must start with the base URL.
	Url(Url),
}
impl Target {
	/// Builds a target from unescaped path segments.
	pub fn segments<I, S>(parts: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::Segments(parts.into_iter().map(Into::into).collect())
	}

	/// Builds a target from an already-escaped relative path.
	pub fn path(path: impl Into<String>) -> Self {
		Self::Path(path.into())
	}

	/// Resolves the target against `base`, refusing anything that escapes it.
	pub(crate) fn resolve(self, base: &Url) -> Result<Url> {
		let url = match self {
			Self::Url(url) => url,
			Self::Path(path) => join(base, path.trim_start_matches('/'))?,
			Self::Segments(parts) => join(base, &escape_segments(&parts))?,
		};

		if url.as_str().starts_with(base.as_str()) {
			Ok(url)
		} else {
			Err(Error::InvalidTarget { url: url.to_string(), base: base.to_string() })
		}
	}
}
impl From<&str> for Target {
	fn from(segment: &str) -> Self {
		Self::Segments(vec![segment.to_owned()])
	}
}
impl From<String> for Target {
	fn from(segment: String) -> Self {
		Self::Segments(vec![segment])
	}
}
impl<const N: usize> From<[&str; N]> for Target {
	fn from(parts: [&str; N]) -> Self {
		Self::segments(parts)
	}
}
impl From<Vec<String>> for Target {
	fn from(parts: Vec<String>) -> Self {
		Self::Segments(parts)
	}
}
impl From<Url> for Target {
	fn from(url: Url) -> Self {
		Self::Url(url)
	}
}

fn escape_segments(parts: &[String]) -> String {
	parts
		.iter()
		.map(|part| form_urlencoded::byte_serialize(part.as_bytes()).collect::<String>())
		.collect::<Vec<_>>()
		.join("/")
}

fn join(base: &Url, relative: &str) -> Result<Url> {
	base.join(relative).map_err(|source| ConfigError::invalid_url(relative, source).into())
}
