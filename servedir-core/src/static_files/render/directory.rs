use std::fs::Metadata;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use http::StatusCode;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::Serialize;
use tokio::fs;

use crate::conf::ServeConfig;
use crate::static_files::{ServeError, StaticResponse};

/// Names never shown in a listing.
const HOUSEKEEPING: [&str; 2] = [".DS_Store", ".git"];

const HREF: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'?')
    .add(b'%');

#[derive(Debug)]
pub enum DirectoryOutcome {
    Listing(Listing),
    /// The directory holds exactly one file, served in its place.
    Single { path: PathBuf, metadata: Metadata },
    /// Listing is disabled here and nothing collapsed.
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Folder,
    Parent,
}

impl Serialize for EntryKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(match self {
            EntryKind::File => "file",
            EntryKind::Folder | EntryKind::Parent => "directory",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub base: String,
    pub relative: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub files: Vec<ListingEntry>,
    pub directory: String,
    pub paths: Vec<Breadcrumb>,
}

/// Lists `dir`, which the decoded URL `request_path` resolved to.
///
/// Collapsing looks at the raw child count, before housekeeping and
/// `unlisted` names are dropped.
pub async fn render_directory(
    dir: &Path,
    request_path: &str,
    config: &ServeConfig,
) -> Result<DirectoryOutcome, ServeError> {
    let listable = config.directory_listing.applies_to(request_path);
    if !listable && !config.render_single {
        return Ok(DirectoryOutcome::Hidden);
    }

    let names = read_names(dir).await?;

    // Excluded names are counted but never served in place of the listing.
    if config.render_single
        && let [only] = names.as_slice()
        && !is_excluded(only, config)
    {
        let path = dir.join(only);
        if let Some(metadata) = stat_child(&path).await?
            && metadata.is_file()
        {
            return Ok(DirectoryOutcome::Single { path, metadata });
        }
    }

    if !listable {
        return Ok(DirectoryOutcome::Hidden);
    }

    let suffix = config.folder_suffix();
    let base_url = request_path.trim_end_matches('/');

    let mut files = Vec::with_capacity(names.len());
    for name in names.iter().filter(|n| !is_excluded(n, config)) {
        let Some(metadata) = stat_child(&dir.join(name)).await? else {
            continue;
        };

        let entry = if metadata.is_dir() {
            let base = format!("{name}{suffix}");
            ListingEntry {
                kind: EntryKind::Folder,
                relative: format!("{base_url}/{base}"),
                title: base.clone(),
                base,
                ext: None,
                size: None,
            }
        } else {
            ListingEntry {
                kind: EntryKind::File,
                base: name.clone(),
                relative: format!("{base_url}/{name}"),
                title: name.clone(),
                ext: Some(file_ext(name)),
                size: Some(human_size(metadata.len())),
            }
        };
        files.push(entry);
    }

    files.sort_by(|a, b| {
        let a_dir = a.kind != EntryKind::File;
        let b_dir = b.kind != EntryKind::File;
        b_dir.cmp(&a_dir).then_with(|| a.base.cmp(&b.base))
    });

    if dir != config.public.as_path() {
        let parent = match base_url.rsplit_once('/') {
            Some((parent, _)) => parent,
            None => "",
        };
        let relative = if parent.is_empty() {
            "/".to_string()
        } else {
            format!("{parent}{suffix}")
        };
        files.insert(
            0,
            ListingEntry {
                kind: EntryKind::Parent,
                base: "..".to_string(),
                title: relative.clone(),
                relative,
                ext: None,
                size: None,
            },
        );
    }

    let root_name = config
        .public
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(DirectoryOutcome::Listing(Listing {
        files,
        directory: format!("{root_name}{base_url}{suffix}"),
        paths: breadcrumbs(&root_name, base_url, suffix),
    }))
}

impl Listing {
    pub fn into_response(self, json: bool) -> StaticResponse {
        if json {
            let value = serde_json::to_value(&self).unwrap_or_default();
            return StaticResponse::json(StatusCode::OK, &value);
        }

        StaticResponse::html(StatusCode::OK, self.to_html())
    }

    fn to_html(&self) -> String {
        let mut html = String::with_capacity(4096);

        html.push_str("<!DOCTYPE html>\n");
        html.push_str("<html>\n<head>\n");
        html.push_str("<meta charset=\"utf-8\">\n");
        html.push_str("<title>Files within ");
        html.push_str(&escape_html(&self.directory));
        html.push_str("</title>\n");
        html.push_str("</head>\n<body>\n");

        html.push_str("<h1>");
        for crumb in &self.paths {
            html.push_str("<a href=\"");
            html.push_str(&escape_href(&crumb.url));
            html.push_str("\">");
            html.push_str(&escape_html(&crumb.name));
            html.push_str("</a>");
        }
        html.push_str("</h1>\n");

        html.push_str("<ul>\n");
        for entry in &self.files {
            let class = match entry.kind {
                EntryKind::File => "file",
                EntryKind::Folder => "folder",
                EntryKind::Parent => "parent",
            };
            html.push_str("<li class=\"");
            html.push_str(class);
            html.push_str("\"><a href=\"");
            html.push_str(&escape_href(&entry.relative));
            html.push_str("\" title=\"");
            html.push_str(&escape_html(&entry.title));
            html.push_str("\">");
            html.push_str(&escape_html(&entry.base));
            html.push_str("</a>");
            if let Some(size) = &entry.size {
                html.push_str(" <span class=\"size\">");
                html.push_str(size);
                html.push_str("</span>");
            }
            html.push_str("</li>\n");
        }
        html.push_str("</ul>\n");
        html.push_str("</body>\n</html>\n");

        html
    }
}

async fn read_names(dir: &Path) -> Result<Vec<String>, ServeError> {
    let mut reader = fs::read_dir(dir).await.map_err(|err| listing_failure(dir, err))?;

    let mut names = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(|err| listing_failure(dir, err))?
    {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }

    Ok(names)
}

/// `None` when the child vanished between listing and stat.
async fn stat_child(path: &Path) -> Result<Option<Metadata>, ServeError> {
    match fs::symlink_metadata(path).await {
        Ok(metadata) => Ok(Some(metadata)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(listing_failure(path, err)),
    }
}

fn listing_failure(path: &Path, err: std::io::Error) -> ServeError {
    match err.kind() {
        ErrorKind::NotFound | ErrorKind::NotADirectory => ServeError::NotFound,
        _ => {
            tracing::error!(path = %path.display(), error = %err, "failed to list directory");
            ServeError::Internal
        }
    }
}

fn is_excluded(name: &str, config: &ServeConfig) -> bool {
    if HOUSEKEEPING.contains(&name) {
        return true;
    }

    let slashed = format!("/{name}");
    config
        .unlisted
        .iter()
        .any(|pattern| pattern.matches(&slashed, false).is_some())
}

fn breadcrumbs(root_name: &str, base_url: &str, suffix: &str) -> Vec<Breadcrumb> {
    let segments: Vec<&str> = base_url.split('/').filter(|s| !s.is_empty()).collect();

    let mut crumbs = vec![Breadcrumb {
        name: format!("{root_name}/"),
        url: "/".to_string(),
    }];

    let mut url = String::new();
    for (idx, segment) in segments.iter().enumerate() {
        let last = idx + 1 == segments.len();
        url.push('/');
        url.push_str(segment);
        crumbs.push(Breadcrumb {
            name: format!("{segment}{}", if last { suffix } else { "/" }),
            url: format!("{url}{suffix}"),
        });
    }

    crumbs
}

fn file_ext(name: &str) -> String {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => name[idx + 1..].to_string(),
        _ => "txt".to_string(),
    }
}

/// Base-1024 size without decimals (`512 B`, `2 KB`).
pub(crate) fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }

    format!("{} {}", value.round() as u64, UNITS[unit])
}

/// Minimal HTML escaping (sufficient for filenames)
fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Percent-encodes a URL path for an href attribute. Slashes are kept.
fn escape_href(input: &str) -> String {
    utf8_percent_encode(input, HREF).to_string()
}
