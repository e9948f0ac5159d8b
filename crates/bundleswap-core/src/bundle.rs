use std::path::{Path, PathBuf};

/// Name of an installed bundle, split into stem and extension.
///
/// `/Applications/Foo.app` becomes stem `Foo` with extension `app`. The stem
/// doubles as the display name handed to the OS launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleName {
    stem: String,
    extension: Option<String>,
}

impl BundleName {
    pub fn from_app_path(app_path: &Path) -> Option<Self> {
        let file_name = app_path.file_name()?;
        let as_path = Path::new(file_name);
        let stem = as_path.file_stem()?.to_string_lossy().into_owned();
        if stem.is_empty() {
            return None;
        }
        let extension = as_path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .filter(|ext| !ext.is_empty());
        Some(Self { stem, extension })
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    pub fn file_name(&self) -> String {
        match &self.extension {
            Some(ext) => format!("{}.{ext}", self.stem),
            None => self.stem.clone(),
        }
    }

    /// Where the extracted update is expected to hold the replacement bundle.
    pub fn source_bundle_path(&self, update_source: &Path) -> PathBuf {
        update_source.join(self.file_name())
    }
}
