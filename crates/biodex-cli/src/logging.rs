// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use env_logger::{Builder, Env, Target};
use log::LevelFilter;
use std::fs::{self, OpenOptions};
use std::path::Path;

/// Route log output to `path`; the terminal belongs to the UI.
/// `RUST_LOG` wins over `level` when set.
pub fn init(path: &Path, level: LevelFilter) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| {
            format!(
                "open log file {} -- set [log].path to a writable location",
                path.display()
            )
        })?;

    builder(level)
        .target(Target::Pipe(Box::new(file)))
        .try_init()
        .context("install logger")
}

fn builder(level: LevelFilter) -> Builder {
    let mut builder = Builder::new();
    builder.filter_level(level);
    builder.parse_env(Env::default());
    builder.format_timestamp_secs();
    builder
}

#[cfg(test)]
mod tests {
    use super::init;
    use anyhow::Result;
    use log::LevelFilter;

    #[test]
    fn init_creates_log_file_and_parent_directories() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("nested").join("biodex.log");

        // A second install in the same test binary fails; only the file matters.
        let _ = init(&path, LevelFilter::Info);
        assert!(path.exists());
        Ok(())
    }

    #[test]
    fn unwritable_log_path_is_actionable() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let error = init(temp.path(), LevelFilter::Info).expect_err("directory is not a file");
        assert!(format!("{error:#}").contains("[log].path"));
        Ok(())
    }
}
