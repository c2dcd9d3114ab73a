//! File name conventions: `<project><delimiter><raw name>.avi` in, project
//! directories and archive names out.

use std::path::Path;

/// Extension of raw recordings picked up from the input directory.
pub const INPUT_EXTENSION: &str = "avi";
/// Extension of transcoded output.
pub const OUTPUT_EXTENSION: &str = "mp4";

/// Project and raw name parsed from one input file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub project: String,
    pub raw_name: String,
}

/// Split the extension-less file name at the first literal occurrence of
/// `delimiter`.
///
/// `None` when the delimiter does not occur or when either side is empty
/// after trimming, so `-clip1.avi` has no project. The extension is never
/// searched for the delimiter.
pub fn parse(file_name: &str, delimiter: &str) -> Option<ParsedName> {
    if delimiter.is_empty() {
        return None;
    }

    let stem = Path::new(file_name).file_stem()?.to_str()?;
    let (project, rest) = stem.split_once(delimiter)?;
    let (project, raw_name) = (project.trim(), rest.trim());

    if project.is_empty() || raw_name.is_empty() {
        return None;
    }

    Some(ParsedName {
        project: project.to_string(),
        raw_name: raw_name.to_string(),
    })
}

/// `<raw><suffix>.mp4`
pub fn output_file_name(raw_name: &str, suffix: Option<&str>) -> String {
    format!("{}{}.{}", raw_name, suffix.unwrap_or_default(), OUTPUT_EXTENSION)
}

/// `<raw> <suffix>.avi`, or `<raw>.avi` without a suffix.
pub fn archive_file_name(raw_name: &str, suffix: Option<&str>) -> String {
    match suffix {
        Some(suffix) => format!("{} {}.{}", raw_name, suffix, INPUT_EXTENSION),
        None => format!("{}.{}", raw_name, INPUT_EXTENSION),
    }
}

/// Whether `path` carries the raw recording extension. Case-sensitive.
pub fn has_input_extension(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == INPUT_EXTENSION)
}
