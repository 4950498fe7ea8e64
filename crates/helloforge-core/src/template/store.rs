use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{BrowserTemplate, TemplateError};

/// Directory of `chrome-<version>.json` template files.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, version: &str) -> PathBuf {
        self.dir.join(format!("chrome-{version}.json"))
    }

    pub fn contains(&self, version: &str) -> bool {
        self.path_for(version).exists()
    }

    /// Write `template` as pretty JSON. Refuses to replace an existing file
    /// unless `overwrite` is set.
    pub fn save(&self, template: &BrowserTemplate, overwrite: bool) -> Result<PathBuf, TemplateError> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(&template.version);
        if path.exists() && !overwrite {
            return Err(TemplateError::AlreadyExists(path));
        }

        let mut writer = BufWriter::new(fs::File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, template)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        info!("Template written: {}", path.display());
        Ok(path)
    }

    /// Read a template from any path.
    pub fn load(path: &Path) -> Result<BrowserTemplate, TemplateError> {
        let reader = BufReader::new(fs::File::open(path)?);
        let template = serde_json::from_reader(reader)?;
        debug!("Template loaded: {}", path.display());
        Ok(template)
    }

    pub fn load_version(&self, version: &str) -> Result<BrowserTemplate, TemplateError> {
        Self::load(&self.path_for(version))
    }

    /// Paths of all `*.json` files in the store, sorted. A missing directory
    /// is an empty store.
    pub fn list(&self) -> Result<Vec<PathBuf>, TemplateError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == "json") {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}
