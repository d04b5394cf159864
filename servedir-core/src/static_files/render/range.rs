#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64, // inclusive
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum RangeRequest {
    Satisfiable(ByteRange),
    Unsatisfiable,
}

/// Parses a `Range` header against a body of `size` bytes.
///
/// Only the `bytes` unit is understood. When several ranges are listed the
/// first satisfiable one is served; ends past the body are clamped.
pub(crate) fn parse_range_header(header: &str, size: u64) -> RangeRequest {
    let Some(ranges) = header.trim().strip_prefix("bytes=") else {
        return RangeRequest::Unsatisfiable;
    };

    ranges
        .split(',')
        .find_map(|spec| parse_one(spec.trim(), size))
        .map(RangeRequest::Satisfiable)
        .unwrap_or(RangeRequest::Unsatisfiable)
}

fn parse_one(spec: &str, size: u64) -> Option<ByteRange> {
    let (start, end) = spec.split_once('-')?;
    let last = size.checked_sub(1)?;

    if start.is_empty() {
        // Suffix range: the final `n` bytes.
        let suffix = end.parse::<u64>().ok().filter(|n| *n > 0)?;
        return Some(ByteRange {
            start: size.saturating_sub(suffix),
            end: last,
        });
    }

    let start = start.parse::<u64>().ok()?;
    let end = match end {
        "" => last,
        v => v.parse::<u64>().ok()?.min(last),
    };

    if start > end {
        return None;
    }

    Some(ByteRange { start, end })
}
