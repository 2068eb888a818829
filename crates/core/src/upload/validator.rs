//! Candidate screening: size, accept filter and selection count.

use std::fmt;
use std::path::Path;

use kindred_shared::UploadSettings;

use super::error::ValidationError;
use super::types::LocalFile;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

/// Client-side upload options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Maximum size of one file in bytes.
    pub max_size: u64,
    /// Maximum number of files in one selection when `multiple` is set.
    pub max_files: usize,
    /// Whether a selection may hold more than one file.
    pub multiple: bool,
    /// Accepted MIME types and extensions.
    pub accept: AcceptFilter,
    /// Logical folder sent with every batch.
    pub folder: String,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self::from(&UploadSettings::default())
    }
}

impl From<&UploadSettings> for UploadOptions {
    fn from(settings: &UploadSettings) -> Self {
        Self {
            max_size: settings.max_size,
            max_files: settings.max_files,
            multiple: true,
            accept: AcceptFilter::any(),
            folder: settings.default_folder.clone(),
        }
    }
}

impl UploadOptions {
    /// Set maximum file size.
    #[must_use]
    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set maximum files per selection.
    #[must_use]
    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    /// Allow exactly one file per selection.
    #[must_use]
    pub fn single(mut self) -> Self {
        self.multiple = false;
        self
    }

    /// Set the accept filter.
    #[must_use]
    pub fn with_accept(mut self, accept: AcceptFilter) -> Self {
        self.accept = accept;
        self
    }

    /// Set the target folder.
    #[must_use]
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    /// Largest selection the options admit.
    #[must_use]
    pub fn selection_limit(&self) -> usize {
        if self.multiple { self.max_files } else { 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AcceptRule {
    /// Exact MIME type, `application/pdf`.
    Mime(String),
    /// MIME family, `image/*`.
    Family(String),
    /// Extension with its dot, `.pdf`.
    Extension(String),
}

/// Accept filter in the `<input accept>` syntax: `image/*,.pdf,video/mp4`.
///
/// An empty filter accepts everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptFilter {
    rules: Vec<AcceptRule>,
}

impl AcceptFilter {
    /// Filter accepting every file.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Parses a comma separated accept list. Blank entries are ignored.
    #[must_use]
    pub fn parse(list: &str) -> Self {
        let rules = list
            .split(',')
            .map(|entry| entry.trim().to_ascii_lowercase())
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                if entry.starts_with('.') {
                    AcceptRule::Extension(entry)
                } else if let Some(family) = entry.strip_suffix("/*") {
                    AcceptRule::Family(format!("{family}/"))
                } else {
                    AcceptRule::Mime(entry)
                }
            })
            .collect();
        Self { rules }
    }

    /// True when the filter accepts everything.
    #[must_use]
    pub fn is_any(&self) -> bool {
        self.rules.is_empty()
    }

    /// Checks a file by name and declared MIME type.
    #[must_use]
    pub fn matches(&self, name: &str, content_type: &str) -> bool {
        if self.is_any() {
            return true;
        }

        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        let extension = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()));

        self.rules.iter().any(|rule| match rule {
            AcceptRule::Mime(expected) => *expected == mime,
            AcceptRule::Family(prefix) => mime.starts_with(prefix.as_str()),
            AcceptRule::Extension(expected) => extension.as_deref() == Some(expected.as_str()),
        })
    }
}

impl fmt::Display for AcceptFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any() {
            return f.write_str("any file");
        }
        let parts: Vec<String> = self
            .rules
            .iter()
            .map(|rule| match rule {
                AcceptRule::Mime(mime) | AcceptRule::Extension(mime) => mime.clone(),
                AcceptRule::Family(prefix) => format!("{prefix}*"),
            })
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// Checks one candidate against the size limit.
///
/// # Errors
///
/// Returns `ValidationError::FileTooLarge` when `file.size() > max_size`.
pub fn validate_size(file: &LocalFile, max_size: u64) -> Result<(), ValidationError> {
    if file.size() > max_size {
        return Err(ValidationError::FileTooLarge {
            name: file.name.clone(),
            size: file.size(),
            max: max_size,
        });
    }
    Ok(())
}

/// Result of screening one selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Screening {
    /// Candidates that may be uploaded, in selection order.
    pub admitted: Vec<LocalFile>,
    /// Reasons for every rejection, in selection order.
    pub rejected: Vec<ValidationError>,
}

/// Screens a whole selection.
///
/// A selection over the count limit is rejected as a whole. Otherwise every
/// candidate is checked against the accept filter and the size limit on its own.
#[must_use]
pub fn screen(options: &UploadOptions, candidates: Vec<LocalFile>) -> Screening {
    let count = candidates.len();
    if !options.multiple && count > 1 {
        return Screening {
            admitted: Vec::new(),
            rejected: vec![ValidationError::SingleFileOnly { count }],
        };
    }
    if options.multiple && count > options.max_files {
        return Screening {
            admitted: Vec::new(),
            rejected: vec![ValidationError::TooManyFiles {
                count,
                max: options.max_files,
            }],
        };
    }

    let mut screening = Screening::default();
    for file in candidates {
        if !options.accept.matches(&file.name, &file.content_type) {
            screening
                .rejected
                .push(ValidationError::NotAccepted { name: file.name });
            continue;
        }
        match validate_size(&file, options.max_size) {
            Ok(()) => screening.admitted.push(file),
            Err(e) => screening.rejected.push(e),
        }
    }
    screening
}

/// Formats a byte count as megabytes with two decimals, `10.00`.
#[must_use]
pub fn format_megabytes(bytes: u64) -> String {
    hundredths(bytes, MIB)
}

/// Human readable size, `512 B`, `1.50 KB`, `2.00 MB`.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    if bytes < KIB {
        format!("{bytes} B")
    } else if bytes < MIB {
        format!("{} KB", hundredths(bytes, KIB))
    } else if bytes < GIB {
        format!("{} MB", hundredths(bytes, MIB))
    } else {
        format!("{} GB", hundredths(bytes, GIB))
    }
}

/// `value / unit` rounded to two decimals, in integer arithmetic.
fn hundredths(value: u64, unit: u64) -> String {
    let unit = u128::from(unit);
    let scaled = (u128::from(value) * 100 + unit / 2) / unit;
    format!("{}.{:02}", scaled / 100, scaled % 100)
}
