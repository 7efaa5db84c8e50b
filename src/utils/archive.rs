use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use flate2::write::GzEncoder;
use flate2::Compression;
use lazy_static::lazy_static;
use log::{debug, info, warn};
use rand::Rng;
use regex::Regex;

use crate::constants::{
    ARCHIVE_EXTENSION, ARCHIVE_PREFIX, ARCHIVE_SUFFIX_LEN, DIAGNOSTIC_LOG_NAME, REPORT_FILE_PATTERN,
    TRANSCRIPT_LOG_NAME, WORK_DIR_PREFIX,
};
use crate::error::{CollectorError, Result};
use crate::reporting::LogFiles;
use crate::security::sanitize_name_component;

lazy_static! {
    static ref REPORT_FILE: Regex = Regex::new(REPORT_FILE_PATTERN).unwrap();
}

/// Directory the collected reports and run logs are gathered in
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
    created: bool,
}

impl WorkDir {
    /// Use `dir` when given, otherwise create a fresh temporary directory
    pub fn create(dir: Option<&Path>) -> Result<Self> {
        match dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                Ok(Self {
                    path: dir.to_path_buf(),
                    created: false,
                })
            }
            None => {
                let path = tempfile::Builder::new()
                    .prefix(WORK_DIR_PREFIX)
                    .tempdir()?
                    .keep();
                debug!("Created working directory {}", path.display());
                Ok(Self { path, created: true })
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this run created the directory
    pub fn is_owned(&self) -> bool {
        self.created
    }

    /// Remove what the run left behind. A directory this run created goes
    /// entirely; a user-supplied one only loses its sosreport archives.
    pub fn cleanup(&self) -> Result<()> {
        if self.created {
            debug!("Removing working directory {}", self.path.display());
            fs::remove_dir_all(&self.path)?;
            return Ok(());
        }

        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            let name = entry.file_name();
            if REPORT_FILE.is_match(&name.to_string_lossy()) && entry.file_type()?.is_file() {
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }
}

/// A finished archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    pub name: String,
    pub path: PathBuf,
    pub members: Vec<String>,
}

/// Generate an archive name:
/// `sos-collector[-<label>][-<case>]-<YYYY-MM-DD>-<5 lowercase letters>`
pub fn archive_name<R: Rng>(label: Option<&str>, case_id: Option<&str>, date: NaiveDate, rng: &mut R) -> String {
    let mut name = ARCHIVE_PREFIX.to_string();

    for component in [label, case_id].into_iter().flatten() {
        if let Some(clean) = sanitize_name_component(component) {
            name.push('-');
            name.push_str(&clean);
        }
    }

    let suffix: String = (0..ARCHIVE_SUFFIX_LEN)
        .map(|_| rng.gen_range(b'a'..=b'z') as char)
        .collect();

    format!("{}-{}-{}", name, date.format("%Y-%m-%d"), suffix)
}

/// Bundles a working directory into `<name>.tar.gz`
pub struct ArchiveBuilder {
    label: Option<String>,
    case_id: Option<String>,
}

impl ArchiveBuilder {
    pub fn new(label: Option<&str>, case_id: Option<&str>) -> Self {
        Self {
            label: label.map(str::to_string),
            case_id: case_id.map(str::to_string),
        }
    }

    /// Archive every entry of `work_dir` into `out_dir`.
    ///
    /// The archive is written under a hidden `.part` name and renamed into
    /// place once complete, so a failure never leaves a file at the final
    /// path.
    pub fn build(&self, work_dir: &Path, out_dir: &Path, logs: Option<&LogFiles>) -> Result<Archive> {
        let name = archive_name(
            self.label.as_deref(),
            self.case_id.as_deref(),
            Local::now().date_naive(),
            &mut rand::thread_rng(),
        );
        let file_name = format!("{}.{}", name, ARCHIVE_EXTENSION);
        let final_path = out_dir.join(&file_name);
        let part_path = out_dir.join(format!(".{}.part", file_name));

        info!("Creating archive of sosreports...");

        let members = match write_archive(work_dir, &part_path, &final_path, &name, logs) {
            Ok(members) => members,
            Err(source) => {
                let _ = fs::remove_file(&part_path);
                return Err(CollectorError::Archive {
                    path: final_path,
                    source,
                });
            }
        };

        fs::rename(&part_path, &final_path).map_err(|source| {
            let _ = fs::remove_file(&part_path);
            CollectorError::Archive {
                path: final_path.clone(),
                source,
            }
        })?;

        info!("The following archive has been created. Please provide it to your support team.");
        info!("    {}", final_path.display());

        Ok(Archive {
            name,
            path: final_path,
            members,
        })
    }
}

fn write_archive(
    work_dir: &Path,
    part_path: &Path,
    final_path: &Path,
    name: &str,
    logs: Option<&LogFiles>,
) -> io::Result<Vec<String>> {
    let file = File::create(part_path)?;
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    let mut tar = tar::Builder::new(encoder);

    let mut entries: Vec<PathBuf> = fs::read_dir(work_dir)?
        .map(|e| e.map(|e| e.path()))
        .collect::<io::Result<_>>()?;
    entries.sort();

    let mut used = HashSet::new();
    let mut members = Vec::with_capacity(entries.len());

    for path in entries {
        if path == part_path || path == final_path {
            continue;
        }

        let member = unique_member(member_name(&path, logs), &mut used);
        let archive_path = format!("{}/{}", name, member);

        if path.is_dir() {
            tar.append_dir_all(&archive_path, &path)?;
        } else {
            tar.append_path_with_name(&path, &archive_path)?;
        }
        members.push(member);
    }

    let mut writer = tar.into_inner()?.finish()?;
    writer.flush()?;
    Ok(members)
}

/// Name of a working directory entry inside the archive. The two run logs
/// get their canonical names.
fn member_name(path: &Path, logs: Option<&LogFiles>) -> String {
    if let Some(logs) = logs {
        if path == logs.diagnostic {
            return DIAGNOSTIC_LOG_NAME.to_string();
        }
        if path == logs.transcript {
            return TRANSCRIPT_LOG_NAME.to_string();
        }
    }
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn unique_member(name: String, used: &mut HashSet<String>) -> String {
    if used.insert(name.clone()) {
        return name;
    }

    let mut n = 1;
    loop {
        let candidate = format!("{}_{}", name, n);
        if used.insert(candidate.clone()) {
            warn!("Duplicate archive member {} renamed to {}", name, candidate);
            return candidate;
        }
        n += 1;
    }
}
