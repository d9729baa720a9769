//! Capability-based file access for data artefacts.
//!
//! Paths are UTF-8 (`camino`) and files are opened through `cap-std`
//! directories resolved with ambient authority, so every open names the
//! directory it is allowed to touch.

use std::io;
use std::path::Component;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};

/// Open an existing file for reading.
pub(crate) fn open_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Create or truncate a file, creating missing parent directories first.
pub(crate) fn create_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    ensure_parent_dir(path)?;
    let (dir, file_name) = parent_dir_and_name(path)?;
    dir.create(file_name.as_str())
}

/// Report whether `path` names an existing regular file.
pub(crate) fn is_file(path: &Utf8Path) -> bool {
    parent_dir_and_name(path)
        .and_then(|(dir, name)| dir.metadata(name.as_str()))
        .is_ok_and(|meta| meta.is_file())
}

fn parent_dir_and_name(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("{path} does not name a file")))?
        .to_owned();
    let parent = match path.parent() {
        Some(dir) if !dir.as_str().is_empty() => dir,
        _ => Utf8Path::new("."),
    };
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name))
}

fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() {
        return Ok(());
    }
    let (base, relative) = split_root(parent)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?.create_dir_all(&relative)
}

/// Split a directory into an ambient base (root or `.`) and a relative rest.
fn split_root(dir: &Utf8Path) -> io::Result<(Utf8PathBuf, Utf8PathBuf)> {
    let std_dir = dir.as_std_path();
    match std_dir.components().next() {
        Some(Component::Prefix(_) | Component::RootDir) => {
            let base: std::path::PathBuf = std_dir
                .components()
                .take_while(|component| {
                    matches!(component, Component::Prefix(_) | Component::RootDir)
                })
                .collect();
            let relative = std_dir
                .strip_prefix(&base)
                .map_err(|_| io::Error::other(format!("cannot split root from {dir}")))?;
            let to_utf8 = |raw: &std::path::Path| {
                Utf8PathBuf::from_path_buf(raw.to_path_buf())
                    .map_err(|_| io::Error::other("non-UTF-8 path component"))
            };
            Ok((to_utf8(&base)?, to_utf8(relative)?))
        }
        _ => Ok((Utf8PathBuf::from("."), dir.to_path_buf())),
    }
}
