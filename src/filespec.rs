//! Functions to read and write text files. Allows use of "-" as a way to
//! specify stdin.

use std::fmt;
use std::fs::{self, File};
use std::io::{stdin, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context, Error, Result};
use serde::de::DeserializeOwned;

/// Specifies a file to read from.
#[derive(Clone, Debug)]
pub enum FileSpec {
    /// Read from stdin.
    Stdio,
    /// Read from the file at the given path.
    Path(PathBuf),
}

impl fmt::Display for FileSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        use FileSpec::*;
        match self {
            Stdio => f.write_str("<stdio>"),
            Path(path) => write!(f, "{:?}", path),
        }
    }
}

impl FileSpec {
    pub fn reader(&self) -> Result<Box<dyn Read>> {
        use FileSpec::*;
        Ok(match self {
            Stdio => Box::new(stdin()),
            Path(path) => Box::new(
                File::open(path).with_context(|| format!("opening {:?} for reading", path))?,
            ),
        })
    }
}

impl FromStr for FileSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use FileSpec::*;
        if s == "-" {
            Ok(Stdio)
        } else {
            Ok(Path(s.into()))
        }
    }
}

/// Reads a RON encoded value from `file_spec`.
pub fn read_ron<T: DeserializeOwned>(file_spec: &FileSpec) -> Result<T> {
    let reader = file_spec.reader()?;
    ron::de::from_reader(reader).with_context(|| format!("parsing {}", file_spec))
}

/// Replaces the whole content of the file at `path`.
///
/// The content is written to a temporary file in the same directory which is
/// then renamed over `path`, so readers never observe a partial write.
pub fn replace_file(path: &Path, content: &str) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| anyhow!("no parent directory for {:?}", path))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temporary file in {:?}", dir))?;
    tmp.write_all(content.as_bytes())
        .with_context(|| format!("writing temporary file for {:?}", path))?;
    tmp.persist(path)
        .with_context(|| format!("replacing {:?}", path))?;
    Ok(())
}

/// Writes `content` to `path` unless a file already exists there. Returns
/// whether the file was written.
pub fn write_new_file(path: &Path, content: &str) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating directory {:?}", dir))?;
    }
    fs::write(path, content).with_context(|| format!("writing {:?}", path))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    #[test]
    fn replace_file_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("total.tex");
        replace_file(&path, "first").unwrap();
        replace_file(&path, "second").unwrap();
        assert_eq!("second", fs::read_to_string(&path).unwrap());
        assert_eq!(1, fs::read_dir(dir.path()).unwrap().count());
    }

    #[test]
    fn write_new_file_keeps_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("a.txt");
        assert!(write_new_file(&path, "one").unwrap());
        assert!(!write_new_file(&path, "two").unwrap());
        assert_eq!("one", fs::read_to_string(&path).unwrap());
    }

    #[test]
    fn read_ron_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.ron");
        fs::write(&path, r#"{"cost": "2", "purpose": "pens"}"#).unwrap();
        let got: HashMap<String, String> =
            read_ron(&FileSpec::from_str(path.to_str().unwrap()).unwrap()).unwrap();
        assert_eq!(Some("2"), got.get("cost").map(String::as_str));
        assert_eq!(2, got.len());
    }
}
