// Gallery fetcher: walks the listing pages of one collection, downloads
// every photo it finds and leaves a JSON manifest next to the images.
//
// The run is strictly sequential. Nothing past output directory creation
// stops it early:
// - a failed listing page ends pagination, and is recorded;
// - a failed image is recorded and the next one is tried;
// - the manifest always lists every discovered record.

use crate::api::{ApiClient, PhotoEntry};
use crate::config::CollectionRef;
use crate::error::{Error, Result};
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name of the manifest written inside the gallery directory.
pub const MANIFEST_FILE: &str = "image_urls.json";

/// Buffer size used when streaming image bodies to disk.
pub const CHUNK_SIZE: usize = 8192;

/// A photo discovered during pagination: where to get it and what to
/// call it locally. This is also the manifest entry shape.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PhotoRecord {
    pub url: String,
    pub name: String,
}

/// Outcome of the listing phase.
#[derive(Debug, Default)]
pub struct Pagination {
    pub records: Vec<PhotoRecord>,
    pub pages_requested: u32,
    /// Set when pagination stopped because a page failed rather than
    /// because the gallery ran out.
    pub failure: Option<Error>,
}

/// Everything a finished run knows about itself.
#[derive(Debug)]
pub struct FetchReport {
    pub output_dir: PathBuf,
    pub manifest_path: PathBuf,
    /// All discovered records in discovery order, downloaded or not.
    pub records: Vec<PhotoRecord>,
    pub pages_requested: u32,
    pub downloaded: usize,
    /// Page and download failures in the order they happened.
    pub failures: Vec<Error>,
}

impl FetchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Pick the best available URL for an entry: full size, then large, then
/// the generic one. Empty strings count as missing. Protocol-relative
/// URLs are pinned to https.
pub fn resolve_url(entry: &PhotoEntry) -> Option<String> {
    [&entry.fullsize_url, &entry.large_url, &entry.url]
        .into_iter()
        .flatten()
        .find(|u| !u.is_empty())
        .map(|u| with_https_scheme(u))
}

fn with_https_scheme(url: &str) -> String {
    match url.strip_prefix("//") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}

/// Local file name for an entry. `position` is the 1-based position the
/// record will take in the accumulated list, used for `image_<n>.jpg`
/// when the API gives no usable name. Only the last path component of
/// an API name is kept.
pub fn record_name(entry: &PhotoEntry, position: usize) -> String {
    entry
        .filename
        .as_deref()
        .and_then(|name| Path::new(name).file_name())
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("image_{position}.jpg"))
}

/// Append the records for one page of entries. Entries without any URL
/// are skipped and do not consume a position.
pub fn append_records(records: &mut Vec<PhotoRecord>, entries: &[PhotoEntry]) {
    for entry in entries {
        let Some(url) = resolve_url(entry) else {
            debug!(?entry, "skipping photo without a URL");
            continue;
        };
        let name = record_name(entry, records.len() + 1);
        records.push(PhotoRecord { url, name });
    }
}

/// Write `image_urls.json` (pretty-printed) into `dir` and return its path.
pub fn write_manifest(records: &[PhotoRecord], dir: &Path) -> Result<PathBuf> {
    let path = dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(records)?;
    fs::write(&path, json).map_err(|source| Error::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Drives one gallery run against the listing API.
pub struct GalleryFetcher {
    api: ApiClient,
    progress: ProgressBar,
}

impl GalleryFetcher {
    pub fn new() -> Result<Self> {
        Ok(Self::with_client(ApiClient::new()?))
    }

    pub fn with_client(api: ApiClient) -> Self {
        GalleryFetcher {
            api,
            progress: ProgressBar::hidden(),
        }
    }

    /// Report download progress on `bar`. Its length is set once the
    /// number of records is known.
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = bar;
        self
    }

    /// List every page of the collection, starting at page 1. Stops on an
    /// empty page, on `isLastPage`, or on the first page that fails.
    pub fn collect_records(&self, collection: &CollectionRef) -> Pagination {
        let mut out = Pagination::default();
        let mut page = 1;
        loop {
            info!(page, "fetching page");
            out.pages_requested += 1;
            let response = match self.api.fetch_page(collection, page) {
                Ok(response) => response,
                Err(source) => {
                    warn!(page, error = %source, "page fetch failed, stopping pagination");
                    out.failure = Some(Error::Page { page, source });
                    break;
                }
            };

            // An empty page means the gallery is exhausted, whatever
            // `isLastPage` says.
            if response.photos.is_empty() {
                info!(page, "no more photos");
                break;
            }

            append_records(&mut out.records, &response.photos);
            info!(page, found = response.photos.len(), "page listed");

            if response.is_last_page {
                break;
            }
            page += 1;
        }
        info!(total = out.records.len(), "pagination finished");
        out
    }

    /// Stream one record to `dir/<name>` and return the bytes written. A
    /// partially written file is removed when the transfer fails.
    pub fn download_one(&self, record: &PhotoRecord, dir: &Path) -> Result<u64> {
        let mut response = self
            .api
            .get_image(&record.url)
            .map_err(|source| Error::Download {
                name: record.name.clone(),
                source,
            })?;

        let path = dir.join(&record.name);
        let write_err = |source: std::io::Error| Error::Write {
            path: path.clone(),
            source,
        };
        let mut file = File::create(&path).map_err(write_err)?;

        let mut buf = [0u8; CHUNK_SIZE];
        let mut written = 0u64;
        let result = loop {
            let n = match response.read(&mut buf) {
                Ok(0) => break Ok(written),
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    break Err(Error::Stream {
                        name: record.name.clone(),
                        source,
                    })
                }
            };
            if let Err(source) = file.write_all(&buf[..n]) {
                break Err(write_err(source));
            }
            written += n as u64;
        };

        if result.is_err() {
            // Close before removing; some platforms refuse to delete open files.
            drop(file);
            let _ = fs::remove_file(&path);
        }
        result
    }

    /// Download every record in order, continuing past failures. Returns
    /// the number of successful downloads and the failures.
    pub fn download_all(&self, records: &[PhotoRecord], dir: &Path) -> (usize, Vec<Error>) {
        let mut downloaded = 0;
        let mut failures = Vec::new();
        self.progress.set_length(records.len() as u64);

        for (i, record) in records.iter().enumerate() {
            // The bar already shows which file is in flight.
            debug!("Downloading {}/{}: {}", i + 1, records.len(), record.name);
            self.progress.set_message(record.name.clone());
            match self.download_one(record, dir) {
                Ok(bytes) => {
                    debug!(name = %record.name, bytes, "saved");
                    downloaded += 1;
                }
                Err(e) => {
                    // Suspend so the warning lands above the bar instead of
                    // through it.
                    self.progress.suspend(|| {
                        warn!(name = %record.name, error = %e, "download failed, continuing");
                    });
                    failures.push(e);
                }
            }
            self.progress.inc(1);
        }
        self.progress.finish_and_clear();
        (downloaded, failures)
    }

    /// Full run: create `<output_root>/<gallery>`, list, download, write
    /// the manifest. Only directory creation and the manifest write can
    /// fail the run; everything else ends up in the report.
    pub fn fetch(&self, collection: &CollectionRef, output_root: &Path) -> Result<FetchReport> {
        let output_dir = collection.gallery_dir(output_root);
        fs::create_dir_all(&output_dir).map_err(|source| Error::OutputDir {
            path: output_dir.clone(),
            source,
        })?;
        info!(dir = %output_dir.display(), "downloading gallery");

        let Pagination {
            records,
            pages_requested,
            failure,
        } = self.collect_records(collection);
        let mut failures: Vec<Error> = failure.into_iter().collect();

        let (downloaded, download_failures) = self.download_all(&records, &output_dir);
        failures.extend(download_failures);
        info!(downloaded, total = records.len(), dir = %output_dir.display(), "downloads finished");

        let manifest_path = write_manifest(&records, &output_dir)?;
        info!(path = %manifest_path.display(), "manifest written");

        Ok(FetchReport {
            output_dir,
            manifest_path,
            records,
            pages_requested,
            downloaded,
            failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(full: Option<&str>, large: Option<&str>, url: Option<&str>) -> PhotoEntry {
        PhotoEntry {
            fullsize_url: full.map(String::from),
            large_url: large.map(String::from),
            url: url.map(String::from),
            filename: None,
        }
    }

    #[test]
    fn resolve_prefers_fullsize_then_large_then_url() {
        let all = entry(Some("https://a/full.jpg"), Some("https://a/large.jpg"), Some("https://a/u.jpg"));
        assert_eq!(resolve_url(&all).as_deref(), Some("https://a/full.jpg"));

        let no_full = entry(None, Some("https://a/large.jpg"), Some("https://a/u.jpg"));
        assert_eq!(resolve_url(&no_full).as_deref(), Some("https://a/large.jpg"));

        let only_url = entry(None, None, Some("https://a/u.jpg"));
        assert_eq!(resolve_url(&only_url).as_deref(), Some("https://a/u.jpg"));

        assert_eq!(resolve_url(&entry(None, None, None)), None);
    }

    #[test]
    fn resolve_treats_empty_strings_as_missing() {
        let e = entry(Some(""), Some(""), Some("//cdn.example/u.jpg"));
        assert_eq!(resolve_url(&e).as_deref(), Some("https://cdn.example/u.jpg"));
        assert_eq!(resolve_url(&entry(Some(""), None, Some(""))), None);
    }

    #[test]
    fn resolve_rewrites_protocol_relative_urls() {
        let e = entry(Some("//images.example.com/p/1.jpg"), None, None);
        assert_eq!(
            resolve_url(&e).as_deref(),
            Some("https://images.example.com/p/1.jpg")
        );
        let plain = entry(Some("http://images.example.com/p/1.jpg"), None, None);
        assert_eq!(
            resolve_url(&plain).as_deref(),
            Some("http://images.example.com/p/1.jpg")
        );
    }

    #[test]
    fn record_name_falls_back_to_position() {
        let mut e = entry(Some("https://a/x.jpg"), None, None);
        assert_eq!(record_name(&e, 4), "image_4.jpg");
        e.filename = Some(String::new());
        assert_eq!(record_name(&e, 1), "image_1.jpg");
        e.filename = Some("DSC_0001.jpg".into());
        assert_eq!(record_name(&e, 1), "DSC_0001.jpg");
    }

    #[test]
    fn record_name_keeps_only_last_component() {
        let mut e = entry(Some("https://a/x.jpg"), None, None);
        e.filename = Some("../../etc/evil.jpg".into());
        assert_eq!(record_name(&e, 1), "evil.jpg");
        e.filename = Some("..".into());
        assert_eq!(record_name(&e, 2), "image_2.jpg");
    }

    #[test]
    fn append_skips_urlless_entries_without_consuming_positions() {
        let mut records = vec![PhotoRecord {
            url: "https://a/0.jpg".into(),
            name: "first.jpg".into(),
        }];
        let entries = vec![
            entry(None, None, None),
            entry(None, Some("//a/1.jpg"), None),
            entry(None, None, Some("https://a/2.jpg")),
        ];
        append_records(&mut records, &entries);

        assert_eq!(records.len(), 3);
        assert_eq!(records[1].url, "https://a/1.jpg");
        assert_eq!(records[1].name, "image_2.jpg");
        assert_eq!(records[2].name, "image_3.jpg");
    }

    #[test]
    fn manifest_lists_records_in_order() {
        let tmp = TempDir::new().unwrap();
        let records = vec![
            PhotoRecord { url: "https://a/1.jpg".into(), name: "one.jpg".into() },
            PhotoRecord { url: "https://a/2.jpg".into(), name: "two.jpg".into() },
        ];
        let path = write_manifest(&records, tmp.path()).unwrap();
        assert_eq!(path, tmp.path().join(MANIFEST_FILE));

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  {"), "manifest should be indented: {text}");
        let back: Vec<PhotoRecord> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, records);
    }

    #[test]
    fn download_all_advances_bar_past_failures() {
        let tmp = TempDir::new().unwrap();
        let bar = ProgressBar::with_draw_target(Some(0), indicatif::ProgressDrawTarget::hidden());
        let fetcher = GalleryFetcher::new().unwrap().with_progress(bar.clone());
        let records = vec![
            PhotoRecord { url: "http://127.0.0.1:1/a.jpg".into(), name: "a.jpg".into() },
            PhotoRecord { url: "http://127.0.0.1:1/b.jpg".into(), name: "b.jpg".into() },
        ];

        let (downloaded, failures) = fetcher.download_all(&records, tmp.path());

        assert_eq!(downloaded, 0);
        assert_eq!(failures.len(), 2);
        assert_eq!(bar.length(), Some(2));
        assert_eq!(bar.position(), 2);
        assert!(bar.is_finished());
    }

    #[test]
    fn empty_manifest_is_an_empty_array() {
        let tmp = TempDir::new().unwrap();
        let path = write_manifest(&[], tmp.path()).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "[]");
    }
}
