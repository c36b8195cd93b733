use std::path::{Path, PathBuf};

use crate::error::{ConvertError, ConvertResult};

/// Return true when the entry is one the pipeline converts rather than
/// copies. The match is against the literal `md` extension; `.markdown` and
/// case variants are deliberately left alone.
pub fn is_markdown(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "md")
}

/// Compute where an entry under `source_root` lands beneath `dest_root`.
///
/// The relative layout is preserved as-is. For Markdown entries the file
/// name has its final `.`-delimited extension replaced with `html`; a name
/// with no dot at all gains `.html` appended, so `README` maps to
/// `README.html` rather than disappearing into a bare `.html`. Pure path
/// arithmetic, no filesystem access.
pub fn map_dest_path(
    source_root: &Path,
    dest_root: &Path,
    entry: &Path,
    is_markdown: bool,
) -> ConvertResult<PathBuf> {
    let rel = entry
        .strip_prefix(source_root)
        .map_err(|_| ConvertError::OutsideRoot {
            path: entry.to_path_buf(),
            root: source_root.to_path_buf(),
        })?;

    if !is_markdown {
        return Ok(dest_root.join(rel));
    }

    let name = match rel.file_name() {
        Some(name) => name.to_string_lossy(),
        None => return Ok(dest_root.join(rel)),
    };

    let mut mapped = dest_root.to_path_buf();
    if let Some(parent) = rel.parent() {
        mapped.push(parent);
    }
    mapped.push(html_file_name(&name));
    Ok(mapped)
}

fn html_file_name(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, _)) => format!("{stem}.html"),
        None => format!("{name}.html"),
    }
}
