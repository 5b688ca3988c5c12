// Run configuration: the collection being downloaded plus where to put it.
// Values come from the command line with environment fallbacks handled by
// clap; this module only holds the validated, immutable result.

use std::path::{Path, PathBuf};

/// Environment variable consulted for the listing endpoint.
pub const API_URL_ENV: &str = "GALLERY_API_URL";
/// Environment variable consulted for the `PHPSESSID` session value.
pub const SESSION_ENV: &str = "GALLERY_SESSION";
/// Output root used when none is given.
pub const DEFAULT_OUTPUT_DIR: &str = "./downloads";

/// Everything needed to address one gallery on the photo-hosting API.
/// Built once per run and never mutated.
#[derive(Debug, Clone)]
pub struct CollectionRef {
    pub base_url: String,
    pub collection_id: u64,
    pub collection_key: String,
    pub gallery_name: String,
    pub session: String,
}

impl CollectionRef {
    pub fn new(
        base_url: impl Into<String>,
        collection_id: u64,
        collection_key: impl Into<String>,
        gallery_name: impl Into<String>,
        session: impl Into<String>,
    ) -> Self {
        CollectionRef {
            base_url: base_url.into(),
            collection_id,
            collection_key: collection_key.into(),
            gallery_name: gallery_name.into(),
            session: session.into(),
        }
    }

    /// Directory the gallery's images and manifest are written to:
    /// `<output_root>/<gallery_name>`.
    pub fn gallery_dir(&self, output_root: &Path) -> PathBuf {
        output_root.join(&self.gallery_name)
    }
}
