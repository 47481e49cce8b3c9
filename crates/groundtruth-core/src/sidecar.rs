use crate::config::DirectoryLayout;
use crate::error::SidecarError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// How a source stores its companion metadata table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SidecarLayout {
    /// A header line of column names followed by data rows; the first row is used.
    Row,
    /// A header line to skip, then one `key|value` pair per line.
    Transposed,
}

impl std::fmt::Display for SidecarLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SidecarLayout::Row => write!(f, "row"),
            SidecarLayout::Transposed => write!(f, "transposed"),
        }
    }
}

/// Flat publisher-supplied metadata read from a page's sidecar table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SidecarMetadata {
    entries: BTreeMap<String, String>,
}

impl SidecarMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value for `key`, if it carries data. Empty strings and the `nan`
    /// placeholder written by dataframe exports count as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("nan"))
    }

    /// First present value among `keys`.
    pub fn get_any(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.get(key))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Sidecar path of a page: `.../html/<stem>.html` -> `.../csv/<stem>.csv`.
pub fn sidecar_path(page: &Path, layout: &DirectoryLayout) -> PathBuf {
    swap_directory_and_extension(
        page,
        &layout.page_dir,
        &layout.sidecar_dir,
        &layout.sidecar_extension,
    )
}

/// Companion artifact path of a page: `.../html/<stem>.html` -> `.../pdf/<stem>.pdf`.
pub fn companion_path(page: &Path, layout: &DirectoryLayout) -> PathBuf {
    swap_directory_and_extension(
        page,
        &layout.page_dir,
        &layout.companion_dir,
        &layout.companion_extension,
    )
}

/// Replace the nearest ancestor directory named `from` with `to` and set the
/// file extension. Pure and total: paths without a matching ancestor only get
/// their extension swapped.
fn swap_directory_and_extension(page: &Path, from: &str, to: &str, extension: &str) -> PathBuf {
    let mut components: Vec<Component<'_>> = page.components().collect();
    let parents = components.len().saturating_sub(1);

    if let Some(idx) = (0..parents)
        .rev()
        .find(|&i| components[i].as_os_str() == OsStr::new(from))
    {
        components[idx] = Component::Normal(OsStr::new(to));
    }

    let mut swapped: PathBuf = components.iter().collect();
    swapped.set_extension(extension);
    swapped
}

/// Load the sidecar of `page`. A missing file gives an empty mapping; an
/// unreadable or malformed one is logged and also gives an empty mapping.
pub fn load_sidecar(
    page: &Path,
    layout: &DirectoryLayout,
    shape: SidecarLayout,
) -> SidecarMetadata {
    let path = sidecar_path(page, layout);
    if !path.is_file() {
        debug!(page = %page.display(), "no sidecar found");
        return SidecarMetadata::new();
    }

    match read_sidecar(&path, shape) {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!("{e}; continuing without sidecar data");
            SidecarMetadata::new()
        }
    }
}

fn read_sidecar(path: &Path, shape: SidecarLayout) -> Result<SidecarMetadata, SidecarError> {
    let content = std::fs::read_to_string(path).map_err(|e| SidecarError::MalformedSidecar {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_sidecar(&content, shape).map_err(|e| SidecarError::MalformedSidecar {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Parse `|`-delimited sidecar content. A table without data rows yields an
/// empty mapping.
pub fn parse_sidecar(content: &str, shape: SidecarLayout) -> Result<SidecarMetadata, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut entries = BTreeMap::new();

    match shape {
        SidecarLayout::Row => {
            let headers = reader.headers()?.clone();
            if let Some(record) = reader.records().next() {
                let record = record?;
                for (name, value) in headers.iter().zip(record.iter()) {
                    let name = name.trim();
                    if !name.is_empty() {
                        entries.insert(name.to_string(), value.trim().to_string());
                    }
                }
            }
        }
        SidecarLayout::Transposed => {
            for record in reader.records() {
                let record = record?;
                let (Some(key), Some(value)) = (record.get(0), record.get(1)) else {
                    continue;
                };
                let key = key.trim();
                if !key.is_empty() {
                    entries.insert(key.to_string(), value.trim().to_string());
                }
            }
        }
    }

    Ok(SidecarMetadata { entries })
}
