use crate::error::PipelineError;
use crate::results::OutputDocument;
use crate::utils::generate_slug;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub fn ensure_directory(path: &Path) -> Result<(), PipelineError> {
    fs::create_dir_all(path).map_err(|source| PipelineError::Output {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_file(path: &Path, bytes: &[u8]) -> Result<(), PipelineError> {
    fs::write(path, bytes).map_err(|source| PipelineError::Output {
        path: path.to_path_buf(),
        source,
    })?;
    ::log::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Writes the run's output under `dir` and returns the written paths.
///
/// A combined document is named after the seed URL, separate documents after
/// their page URL. Pages whose slugs collide get a numeric suffix. If a write
/// fails in separate mode, the files already written by this call are removed
/// before the error is returned.
pub fn write_document(
    dir: &Path,
    seed: &str,
    document: &OutputDocument,
) -> Result<Vec<PathBuf>, PipelineError> {
    ensure_directory(dir)?;

    match document {
        OutputDocument::Combined { bytes, .. } => {
            let path = dir.join(file_name(&generate_slug(seed)));
            write_file(&path, bytes)?;
            Ok(vec![path])
        }
        OutputDocument::Separate(docs) => {
            let mut used = HashSet::new();
            let mut written = Vec::with_capacity(docs.len());
            for doc in docs {
                let slug = unique_slug(generate_slug(&doc.url), &mut used);
                let path = dir.join(file_name(&slug));
                if let Err(e) = write_file(&path, &doc.bytes) {
                    remove_partial(&written);
                    return Err(e);
                }
                written.push(path);
            }
            Ok(written)
        }
    }
}

fn remove_partial(written: &[PathBuf]) {
    for path in written {
        if let Err(e) = fs::remove_file(path) {
            ::log::warn!("Could not remove partial output {}: {}", path.display(), e);
        }
    }
}

fn file_name(slug: &str) -> String {
    if slug.is_empty() {
        "page.pdf".to_string()
    } else {
        format!("{slug}.pdf")
    }
}

fn unique_slug(slug: String, used: &mut HashSet<String>) -> String {
    if used.insert(slug.clone()) {
        return slug;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{slug}-{n}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
