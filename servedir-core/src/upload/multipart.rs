//! Minimal `multipart/form-data` reader: finds the first part that carries a
//! file name and borrows its raw bytes from the buffered body.

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct FilePart<'a> {
    pub filename: String,
    pub data: &'a [u8],
}

enum State {
    /// Looking for the first delimiter.
    Preamble,
    /// Just past a delimiter line; part headers follow.
    Headers,
    /// Inside a part body that began at `start`.
    Body {
        start: usize,
        filename: Option<String>,
    },
}

/// Extracts `boundary` from a `multipart/form-data` content type.
pub(crate) fn parse_boundary(content_type: &str) -> Option<String> {
    let mut params = content_type.split(';');
    let mime = params.next()?.trim();
    if !mime.eq_ignore_ascii_case("multipart/form-data") {
        return None;
    }

    params
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|boundary| !boundary.is_empty())
}

/// First part whose `Content-Disposition` has a `filename` parameter.
///
/// Part bodies run from the blank line after the headers up to, not
/// including, the CRLF before the next delimiter. Later file parts are
/// ignored.
pub(crate) fn first_file_part<'a>(body: &'a [u8], boundary: &str) -> Option<FilePart<'a>> {
    let delimiter = format!("--{boundary}");
    let closing = format!("\r\n--{boundary}");
    let mut state = State::Preamble;
    let mut pos = 0;

    loop {
        state = match state {
            State::Preamble => {
                let idx = find(&body[pos..], delimiter.as_bytes())?;
                pos += idx + delimiter.len();
                State::Headers
            }
            State::Headers => {
                // `--` right after a delimiter closes the body.
                if body[pos..].starts_with(b"--") {
                    return None;
                }
                let line_end = find(&body[pos..], b"\r\n")?;
                pos += line_end + 2;

                let headers_end = find(&body[pos..], b"\r\n\r\n")?;
                let headers = String::from_utf8_lossy(&body[pos..pos + headers_end]);
                let filename = headers.split("\r\n").find_map(disposition_filename);
                pos += headers_end + 4;

                State::Body {
                    start: pos,
                    filename,
                }
            }
            State::Body { start, filename } => {
                let end = start + find(&body[start..], closing.as_bytes())?;
                if let Some(filename) = filename {
                    return Some(FilePart {
                        filename,
                        data: &body[start..end],
                    });
                }
                pos = end + closing.len();
                State::Headers
            }
        };
    }
}

/// `filename` from a `Content-Disposition` header line, if present.
fn disposition_filename(line: &str) -> Option<String> {
    let (name, value) = line.split_once(':')?;
    if !name.trim().eq_ignore_ascii_case("content-disposition") {
        return None;
    }

    value
        .split(';')
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("filename"))
        .map(|(_, value)| {
            let value = value.trim();
            value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value)
                .to_string()
        })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
