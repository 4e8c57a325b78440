//! Response body decoding by content-type sniffing.

mod multipart;

pub use multipart::FormPart;

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, error::DecodeError};

/// Decoded response payload.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody {
	/// Zero-length body (e.g., `204 No Content`).
	Empty,
	/// `application/json` or `*+json` payload.
	Json(JsonValue),
	/// `text/*` payload, decoded as lossy UTF-8.
	Text(String),
	/// `application/x-www-form-urlencoded` payload as ordered pairs.
	Form(Vec<(String, String)>),
	/// `multipart/form-data` payload as ordered parts.
	Multipart(Vec<FormPart>),
	/// Any other payload, including responses without a content type.
	Blob(Vec<u8>),
}
impl ResponseBody {
	/// Decodes `body` according to `content_type`.
	///
	/// Only a body announced as JSON or multipart form data can fail to decode; every other
	/// kind falls back to a lossless representation.
	pub fn decode(
		status: u16,
		content_type: Option<&str>,
		body: &[u8],
	) -> Result<Self, DecodeError> {
		if body.is_empty() {
			return Ok(Self::Empty);
		}

		let kind = content_type.map(BodyKind::sniff).unwrap_or(BodyKind::Blob);
		let decoded = match kind {
			BodyKind::Json => Self::Json(
				serde_json::from_slice(body)
					.map_err(|source| DecodeError::MalformedJson { status, source })?,
			),
			BodyKind::Text => Self::Text(String::from_utf8_lossy(body).into_owned()),
			BodyKind::Form => Self::Form(url::form_urlencoded::parse(body).into_owned().collect()),
			BodyKind::Multipart => Self::Multipart(
				multipart::parse(content_type.unwrap_or_default(), body)
					.map_err(|reason| DecodeError::MalformedMultipart { status, reason })?,
			),
			BodyKind::Blob => Self::Blob(body.to_vec()),
		};

		Ok(decoded)
	}

	/// Returns a stable label for the body kind.
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::Empty => "empty",
			Self::Json(_) => "json",
			Self::Text(_) => "text",
			Self::Form(_) => "form",
			Self::Multipart(_) => "multipart",
			Self::Blob(_) => "blob",
		}
	}

	/// Deserializes a JSON body into `T`; an empty body deserializes from `null`.
	pub fn json<T>(&self) -> Result<T, DecodeError>
	where
		T: DeserializeOwned,
	{
		let value = match self {
			Self::Json(value) => value.clone(),
			Self::Empty => JsonValue::Null,
			other => return Err(DecodeError::NotJson { found: other.kind() }),
		};

		serde_path_to_error::deserialize(value).map_err(|source| DecodeError::Shape { source })
	}

	/// Returns the JSON value, if the body is JSON.
	pub fn as_json(&self) -> Option<&JsonValue> {
		match self {
			Self::Json(value) => Some(value),
			_ => None,
		}
	}

	/// Returns the text, if the body is text.
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Text(text) => Some(text),
			_ => None,
		}
	}

	/// Returns the raw bytes, if the body is a blob.
	pub fn as_bytes(&self) -> Option<&[u8]> {
		match self {
			Self::Blob(bytes) => Some(bytes),
			_ => None,
		}
	}

	/// Returns the form pairs, if the body is form data.
	pub fn as_form(&self) -> Option<&[(String, String)]> {
		match self {
			Self::Form(pairs) => Some(pairs),
			_ => None,
		}
	}

	/// Returns the multipart parts, if the body is multipart form data.
	pub fn as_multipart(&self) -> Option<&[FormPart]> {
		match self {
			Self::Multipart(parts) => Some(parts),
			_ => None,
		}
	}

	/// Builds the body kept on an [`HttpError`](crate::error::HttpError).
	///
	/// Error bodies never fail: a body that does not decode as announced is kept as lossy
	/// text.
	pub(crate) fn decode_lossy(status: u16, content_type: Option<&str>, body: &[u8]) -> Self {
		Self::decode(status, content_type, body)
			.unwrap_or_else(|_| Self::Text(String::from_utf8_lossy(body).into_owned()))
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BodyKind {
	Json,
	Text,
	Form,
	Multipart,
	Blob,
}
impl BodyKind {
	fn sniff(content_type: &str) -> Self {
		let essence =
			content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();

		if essence == "application/json" || essence.ends_with("+json") {
			Self::Json
		} else if essence.starts_with("text/") {
			Self::Text
		} else if essence == "application/x-www-form-urlencoded" {
			Self::Form
		} else if essence == "multipart/form-data" {
			Self::Multipart
		} else {
			Self::Blob
		}
	}
}
