use super::ids::generate_uuid;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Sibling temp file that is removed on drop unless it was renamed into
/// place.
struct StagedFile {
    path: PathBuf,
    committed: bool,
}

impl StagedFile {
    fn beside(target: &Path, dir: &Path) -> Self {
        let stem = target
            .file_name()
            .and_then(|v| v.to_str())
            .unwrap_or("record");
        Self {
            path: dir.join(format!(".{stem}.{}.partial", generate_uuid())),
            committed: false,
        }
    }

    fn write(&self, content: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)?;
        file.write_all(content)?;
        file.sync_all()
    }

    fn commit(mut self, target: &Path) -> io::Result<()> {
        fs::rename(&self.path, target)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.path);
        }
    }
}

/// Replaces `path` with `content` so readers see either the old or the new
/// bytes, never a partial write.
pub fn atomic_write_file(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        Some(_) => Path::new("."),
        None => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("`{}` has no parent directory", path.display()),
            ))
        }
    };
    fs::create_dir_all(dir)?;
    let staged = StagedFile::beside(path, dir);
    staged.write(content)?;
    staged.commit(path)?;
    sync_dir(dir)
}

/// Appends one line, creating the file and its parent directories on demand.
pub fn append_line(path: &Path, line: &str) -> io::Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(format!("{line}\n").as_bytes())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrite_leaves_no_partial_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("nested").join("canvas.json");
        atomic_write_file(&target, b"one").expect("first write");
        atomic_write_file(&target, b"two").expect("second write");
        assert_eq!(fs::read(&target).expect("read"), b"two");
        let names: Vec<_> = fs::read_dir(target.parent().expect("parent"))
            .expect("list")
            .map(|entry| entry.expect("entry").file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("canvas.json")]);
    }

    #[test]
    fn append_line_accumulates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out").join("lines.txt");
        append_line(&path, "a=1").expect("append");
        append_line(&path, "b=2").expect("append");
        assert_eq!(fs::read_to_string(&path).expect("read"), "a=1\nb=2\n");
    }
}
