mod directory;
pub(crate) mod etag;
mod file;
pub(crate) mod headers;
pub(crate) mod range;

pub use directory::{
    Breadcrumb, DirectoryOutcome, EntryKind, Listing, ListingEntry, render_directory,
};
pub use file::render_file;
