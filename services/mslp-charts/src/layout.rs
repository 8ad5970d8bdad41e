//! On-disk layout of a run.
//!
//! ```text
//! <root>/static/MSLP/MSLP_00.png ...
//! <root>/static/MSLP/grib_files/hrrr.tHHz.wrfsfcfNN.grib2 ...
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use mslp_common::{grib_file_name, png_file_name, ForecastCycle, ForecastStep};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct OutputLayout {
    mslp_dir: PathBuf,
    grib_dir: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let mslp_dir = root.as_ref().join("static").join("MSLP");
        let grib_dir = mslp_dir.join("grib_files");
        Self { mslp_dir, grib_dir }
    }

    /// Directory holding the charts.
    pub fn mslp_dir(&self) -> &Path {
        &self.mslp_dir
    }

    /// Directory holding the downloaded grids.
    pub fn grib_dir(&self) -> &Path {
        &self.grib_dir
    }

    pub fn grib_path(&self, cycle: &ForecastCycle, step: ForecastStep) -> PathBuf {
        self.grib_dir.join(grib_file_name(cycle, step))
    }

    pub fn chart_path(&self, step: ForecastStep) -> PathBuf {
        self.mslp_dir.join(png_file_name(step))
    }

    /// Empty both directories of regular files, then make sure they exist.
    ///
    /// Subdirectories other than `grib_files` are left alone.
    pub async fn prepare(&self) -> std::io::Result<()> {
        for dir in [&self.mslp_dir, &self.grib_dir] {
            remove_files(dir).await?;
        }
        tokio::fs::create_dir_all(&self.grib_dir).await
    }
}

async fn remove_files(dir: &Path) -> std::io::Result<()> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            debug!(path = %entry.path().display(), "Removing previous output");
            tokio::fs::remove_file(entry.path()).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let layout = OutputLayout::new("Hrrr");
        let cycle: ForecastCycle = "2024061512".parse().unwrap();
        let step = ForecastStep::new(3).unwrap();

        assert_eq!(layout.mslp_dir(), Path::new("Hrrr/static/MSLP"));
        assert_eq!(
            layout.grib_path(&cycle, step),
            Path::new("Hrrr/static/MSLP/grib_files/hrrr.t12z.wrfsfcf03.grib2")
        );
        assert_eq!(layout.chart_path(step), Path::new("Hrrr/static/MSLP/MSLP_03.png"));
    }

    #[tokio::test]
    async fn test_prepare_clears_files_only() {
        let root = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(root.path());

        layout.prepare().await.unwrap();
        assert!(layout.grib_dir().is_dir());

        let keep = layout.mslp_dir().join("archive");
        std::fs::create_dir(&keep).unwrap();
        std::fs::write(layout.mslp_dir().join("MSLP_00.png"), b"old").unwrap();
        std::fs::write(layout.grib_dir().join("old.grib2"), b"old").unwrap();

        layout.prepare().await.unwrap();
        assert!(!layout.mslp_dir().join("MSLP_00.png").exists());
        assert!(!layout.grib_dir().join("old.grib2").exists());
        assert!(keep.is_dir());
        assert!(layout.grib_dir().is_dir());
    }
}
