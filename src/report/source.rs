use anyhow::{Context, Result, anyhow, bail};
use std::fmt;
use std::fs::{self, File};
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Where the report text came from. Carried along for messages only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOrigin {
    File(PathBuf),
    Url(String),
    /// First member of a zip archive, which is how the recorder saves reports.
    Archive { archive: String, member: String },
}

impl fmt::Display for ReportOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportOrigin::File(path) => write!(f, "{}", path.display()),
            ReportOrigin::Url(url) => write!(f, "{url}"),
            ReportOrigin::Archive { archive, member } => write!(f, "{archive}!{member}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedReport {
    pub text: String,
    pub origin: ReportOrigin,
}

impl LoadedReport {
    /// Short name used for work directories and default output names.
    pub fn project_name(&self) -> String {
        let raw = match &self.origin {
            ReportOrigin::File(path) => file_stem(path),
            ReportOrigin::Archive { archive, .. } => {
                last_segment(archive).unwrap_or_else(|| "report".to_string())
            }
            ReportOrigin::Url(url) => last_segment(url).unwrap_or_else(|| "report".to_string()),
        };
        raw.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect()
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("report")
        .to_string()
}

fn last_segment(location: &str) -> Option<String> {
    location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|last| last.split('.').next())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

fn is_zip(location: &str) -> bool {
    Path::new(location)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

/// Reads a report from a local path or an http(s) URL. Zip archives yield
/// their first member.
pub async fn load_report(location: &str) -> Result<LoadedReport> {
    if location.starts_with("http://") || location.starts_with("https://") {
        return fetch_report(location).await;
    }
    read_report_file(Path::new(location))
}

pub fn read_report_file(path: &Path) -> Result<LoadedReport> {
    if is_zip(&path.to_string_lossy()) {
        let file = File::open(path)
            .with_context(|| format!("Failed to open archive {}", path.display()))?;
        let (member, text) = first_member(file)
            .with_context(|| format!("Failed to read report from {}", path.display()))?;
        return Ok(LoadedReport {
            text,
            origin: ReportOrigin::Archive {
                archive: path.display().to_string(),
                member,
            },
        });
    }

    let bytes =
        fs::read(path).with_context(|| format!("Failed to read report {}", path.display()))?;
    Ok(LoadedReport {
        text: String::from_utf8_lossy(&bytes).into_owned(),
        origin: ReportOrigin::File(path.to_path_buf()),
    })
}

/// Name and lossy text of the archive's first entry.
fn first_member<R: Read + Seek>(reader: R) -> Result<(String, String)> {
    let mut archive = ZipArchive::new(reader).context("not a readable zip archive")?;
    if archive.len() == 0 {
        bail!("zip archive is empty");
    }

    let mut entry = archive.by_index(0).context("reading first archive entry")?;
    let mut bytes = Vec::new();
    entry
        .read_to_end(&mut bytes)
        .with_context(|| format!("decompressing {}", entry.name()))?;
    Ok((
        entry.name().to_string(),
        String::from_utf8_lossy(&bytes).into_owned(),
    ))
}

async fn fetch_report(url: &str) -> Result<LoadedReport> {
    let client = reqwest::Client::builder()
        .user_agent(format!("steps-narrator/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")?;

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch report from {url}"))?;

    if !response.status().is_success() {
        return Err(anyhow!("{url} returned status: {}", response.status()));
    }

    let bytes = response
        .bytes()
        .await
        .with_context(|| format!("Failed to read report body from {url}"))?;

    if is_zip(url) {
        let (member, text) = first_member(Cursor::new(bytes.to_vec()))
            .with_context(|| format!("Failed to read report from {url}"))?;
        return Ok(LoadedReport {
            text,
            origin: ReportOrigin::Archive {
                archive: url.to_string(),
                member,
            },
        });
    }

    Ok(LoadedReport {
        text: String::from_utf8_lossy(&bytes).into_owned(),
        origin: ReportOrigin::Url(url.to_string()),
    })
}
