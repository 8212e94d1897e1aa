//! Copy, compress and materialize database files.
//!
//! Every writer here either produces a complete file or removes what it
//! started. Materialization into an existing path goes through a sibling
//! `.partial` file and a rename, so the target never holds a truncated file.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::debug;

use super::naming::GZ_EXT;

const PARTIAL_SUFFIX: &str = ".partial";

/// Copy `src` to a new file at `dst`. A failed copy leaves no `dst` behind.
pub fn copy_file(src: &Path, dst: &Path) -> io::Result<u64> {
    match fs::copy(src, dst) {
        Ok(n) => Ok(n),
        Err(e) => {
            let _ = fs::remove_file(dst);
            Err(e)
        }
    }
}

/// Gzip `raw` into `raw.gz` and remove `raw`. On any failure the `.gz` is
/// removed and `raw` is left as it was.
pub fn compress_in_place(raw: &Path) -> io::Result<PathBuf> {
    let gz = with_suffix(raw, GZ_EXT);

    if let Err(e) = write_gzip(raw, &gz) {
        let _ = fs::remove_file(&gz);
        return Err(e);
    }

    drop_raw(raw, &gz)?;
    Ok(gz)
}

/// Remove `raw` now that `gz` holds its content. When that fails the `.gz`
/// goes instead, so one timestamp never has both forms on disk.
fn drop_raw(raw: &Path, gz: &Path) -> io::Result<()> {
    if let Err(e) = fs::remove_file(raw) {
        let _ = fs::remove_file(gz);
        return Err(e);
    }
    Ok(())
}

fn write_gzip(src: &Path, dst: &Path) -> io::Result<()> {
    let mut reader = BufReader::new(File::open(src)?);
    let mut encoder = GzEncoder::new(BufWriter::new(File::create(dst)?), Compression::default());
    io::copy(&mut reader, &mut encoder)?;
    let writer = encoder.finish()?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}

/// Write the content of `src` to `dst`, gunzipping when `gunzip` is set.
/// Returns the number of bytes written to `dst`.
///
/// The content lands in `dst.partial` first and is renamed over `dst` once
/// flushed to disk; on error `dst` keeps whatever it held before. The result
/// keeps the permissions (and on unix, when allowed, the owner) of the `dst`
/// it replaces, or of `src` when `dst` did not exist.
pub fn materialize(src: &Path, dst: &Path, gunzip: bool) -> io::Result<u64> {
    let partial = with_suffix(dst, PARTIAL_SUFFIX);

    // the file being replaced sets mode and owner, a new file takes the source's
    let template = if dst.is_file() { dst } else { src };
    let written = match write_materialized(src, &partial, gunzip)
        .and_then(|n| carry_metadata(template, &partial).map(|()| n))
    {
        Ok(n) => n,
        Err(e) => {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }
    };

    if let Err(e) = fs::rename(&partial, dst) {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }

    Ok(written)
}

fn write_materialized(src: &Path, dst: &Path, gunzip: bool) -> io::Result<u64> {
    let input = BufReader::new(File::open(src)?);
    let mut reader: Box<dyn Read> = if gunzip {
        Box::new(MultiGzDecoder::new(input))
    } else {
        Box::new(input)
    };

    let mut writer = BufWriter::new(File::create(dst)?);
    let written = io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(written)
}

fn carry_metadata(template: &Path, target: &Path) -> io::Result<()> {
    let meta = fs::metadata(template)?;
    fs::set_permissions(target, meta.permissions())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        // only root may hand a file to another user
        if let Err(e) = std::os::unix::fs::chown(target, Some(meta.uid()), Some(meta.gid())) {
            debug!(path = %target.display(), "kept invoking user as owner: {e}");
        }
    }

    Ok(())
}

pub fn is_gzip_path(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().ends_with(GZ_EXT))
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
