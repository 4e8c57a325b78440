//! `multipart/form-data` decoding for buffered bodies.

/// One field of a `multipart/form-data` body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormPart {
	/// Field name from `Content-Disposition`.
	pub name: String,
	/// File name from `Content-Disposition`, when the part is a file.
	pub filename: Option<String>,
	/// Part-level `Content-Type`, if declared.
	pub content_type: Option<String>,
	/// Raw part payload.
	pub data: Vec<u8>,
}
impl FormPart {
	/// Returns the payload as lossy UTF-8 text.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.data).into_owned()
	}
}

/// Splits `body` on the boundary declared in `content_type`.
pub(super) fn parse(content_type: &str, body: &[u8]) -> Result<Vec<FormPart>, &'static str> {
	let boundary = parameter(content_type, "boundary")
		.filter(|boundary| !boundary.is_empty())
		.ok_or("missing boundary parameter")?;
	let delimiter = format!("--{boundary}").into_bytes();
	let separator = [b"\r\n".as_slice(), &delimiter].concat();
	let start = find(body, &delimiter).ok_or("missing opening boundary")?;
	let mut rest = &body[start + delimiter.len()..];
	let mut parts = Vec::new();

	loop {
		if rest.starts_with(b"--") {
			return Ok(parts);
		}

		rest = rest.strip_prefix(b"\r\n").ok_or("malformed boundary line")?;

		let end = find(rest, &separator).ok_or("unterminated part")?;

		parts.push(parse_part(&rest[..end])?);
		rest = &rest[end + separator.len()..];
	}
}

fn parse_part(raw: &[u8]) -> Result<FormPart, &'static str> {
	let split = find(raw, b"\r\n\r\n").ok_or("missing part headers")?;
	let head = String::from_utf8_lossy(&raw[..split]);
	let mut disposition = None;
	let mut content_type = None;

	for line in head.split("\r\n") {
		let Some((name, value)) = line.split_once(':') else {
			continue;
		};
		let name = name.trim();

		if name.eq_ignore_ascii_case("content-disposition") {
			disposition = Some(value.trim().to_owned());
		} else if name.eq_ignore_ascii_case("content-type") {
			content_type = Some(value.trim().to_owned());
		}
	}

	let disposition = disposition.ok_or("missing content disposition")?;

	Ok(FormPart {
		name: parameter(&disposition, "name").ok_or("missing field name")?,
		filename: parameter(&disposition, "filename"),
		content_type,
		data: raw[split + 4..].to_vec(),
	})
}

fn parameter(header: &str, key: &str) -> Option<String> {
	header.split(';').skip(1).find_map(|param| {
		let (name, value) = param.split_once('=')?;

		name.trim().eq_ignore_ascii_case(key).then(|| value.trim().trim_matches('"').to_owned())
	})
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
	haystack.windows(needle.len()).position(|window| window == needle)
}
