//! Flat key/value configuration table with profile-prefixed lookups.

use std::collections::BTreeMap;
use std::path::Path;

use super::ConfigError;

/// Resolve `key` in `table`, trying `<prefix><key>` before the bare key.
///
/// Empty values count as absent.
pub fn resolve<'a>(table: &'a BTreeMap<String, String>, prefix: &str, key: &str) -> Option<&'a str> {
    let non_empty = |k: &str| table.get(k).map(String::as_str).filter(|v| !v.is_empty());

    if !prefix.is_empty() {
        if let Some(value) = non_empty(&format!("{prefix}{key}")) {
            return Some(value);
        }
    }
    non_empty(key)
}

/// Normalize a profile name to its lookup prefix: `test` and `test.` both
/// become `test.`, no profile becomes the empty prefix.
pub fn profile_prefix(profile: Option<&str>) -> String {
    match profile.map(str::trim) {
        None | Some("") => String::new(),
        Some(p) if p.ends_with('.') => p.to_string(),
        Some(p) => format!("{p}."),
    }
}

/// Loaded configuration table plus the active profile.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    table: BTreeMap<String, String>,
    prefix: String,
}

impl Settings {
    /// Load and flatten a TOML file, then log the resulting table.
    pub fn load(path: &Path, profile: Option<&str>) -> Result<Self, ConfigError> {
        tracing::debug!("Loading configuration from {:?}", path);

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::parse(&content, profile).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;

        settings.log_table();
        Ok(settings)
    }

    /// Parse TOML text. Nested tables become dotted keys.
    pub fn parse(content: &str, profile: Option<&str>) -> Result<Self, ConfigError> {
        let document: toml::Table = content.parse().map_err(|source| ConfigError::Parse {
            path: Default::default(),
            source,
        })?;

        let mut table = BTreeMap::new();
        flatten("", &document, &mut table)?;

        Ok(Self {
            table,
            prefix: profile_prefix(profile),
        })
    }

    /// Build settings directly from key/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            table: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            prefix: String::new(),
        }
    }

    /// The active profile prefix, empty without a profile.
    pub fn profile(&self) -> &str {
        &self.prefix
    }

    pub fn set_profile(&mut self, profile: Option<&str>) {
        self.prefix = profile_prefix(profile);
    }

    /// Override a single key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.table.insert(key.into(), value.into());
    }

    /// Resolved non-empty value of `key`, or [`ConfigError::Missing`].
    pub fn required(&self, key: &str) -> Result<&str, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::Missing { key: key.to_string() })
    }

    pub fn optional(&self, key: &str) -> Option<&str> {
        resolve(&self.table, &self.prefix, key)
    }

    /// `true` only for a case-insensitive `"true"`; anything else, including
    /// absence, is `false`.
    pub fn flag(&self, key: &str) -> bool {
        self.optional(key)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.table.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn log_table(&self) {
        tracing::info!("Current configuration is:");
        for (key, value) in self.iter() {
            tracing::info!("[{}] = [{}]", key, value);
        }
        if !self.prefix.is_empty() {
            tracing::info!("Using profile [{}]", self.prefix.trim_end_matches('.'));
        }
    }
}

fn flatten(
    prefix: &str,
    table: &toml::Table,
    out: &mut BTreeMap<String, String>,
) -> Result<(), ConfigError> {
    for (key, value) in table {
        let full_key = format!("{prefix}{key}");
        let text = match value {
            toml::Value::Table(inner) => {
                flatten(&format!("{full_key}."), inner, out)?;
                continue;
            }
            toml::Value::String(s) => s.clone(),
            toml::Value::Integer(i) => i.to_string(),
            toml::Value::Float(f) => f.to_string(),
            toml::Value::Boolean(b) => b.to_string(),
            toml::Value::Datetime(d) => d.to_string(),
            toml::Value::Array(_) => {
                return Err(ConfigError::Invalid {
                    key: full_key,
                    value: value.to_string(),
                    reason: "arrays are not supported".to_string(),
                })
            }
        };
        out.insert(full_key, text);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
ffmpeg_root = "path/to/ffmpeg/"
output_directory = "testdirectory"
project_delimiter = "-"
delete_input_file = true
fading_duration = 2
output_file_suffix = ""

[test]
project_delimiter = "test"
"#;

    #[test]
    fn test_parse_flattens_profiles() {
        let settings = Settings::parse(SAMPLE, None).unwrap();
        assert!(settings.iter().any(|(k, _)| k == "test.project_delimiter"));
        assert_eq!(settings.optional("test.project_delimiter"), Some("test"));
        assert_eq!(settings.optional("fading_duration"), Some("2"));
    }

    #[test]
    fn test_profile_overrides_bare_key() {
        let settings = Settings::parse(SAMPLE, Some("test")).unwrap();
        assert_eq!(settings.required("project_delimiter").unwrap(), "test");
    }

    #[test]
    fn test_profile_falls_back_to_bare_key() {
        let settings = Settings::parse(SAMPLE, Some("test")).unwrap();
        assert_eq!(settings.required("output_directory").unwrap(), "testdirectory");
    }

    #[test]
    fn test_profile_prefix_normalization() {
        assert_eq!(profile_prefix(None), "");
        assert_eq!(profile_prefix(Some("")), "");
        assert_eq!(profile_prefix(Some("test")), "test.");
        assert_eq!(profile_prefix(Some("test.")), "test.");
    }

    #[test]
    fn test_set_profile() {
        let mut settings = Settings::parse(SAMPLE, None).unwrap();
        assert_eq!(settings.required("project_delimiter").unwrap(), "-");
        settings.set_profile(Some("test"));
        assert_eq!(settings.profile(), "test.");
        assert_eq!(settings.required("project_delimiter").unwrap(), "test");
    }

    #[test]
    fn test_required_missing_key() {
        let settings = Settings::parse(SAMPLE, None).unwrap();
        let err = settings.required("input_directory").unwrap_err();
        assert!(matches!(err, ConfigError::Missing { ref key } if key == "input_directory"));
        assert!(err.to_string().contains("input_directory"));
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let settings = Settings::parse(SAMPLE, None).unwrap();
        assert!(settings.optional("output_file_suffix").is_none());
        assert!(settings.required("output_file_suffix").is_err());
    }

    #[test]
    fn test_empty_profile_value_falls_back() {
        let settings = Settings::from_pairs([("a.key", ""), ("key", "bare")]);
        assert_eq!(resolve(&settings.table, "a.", "key"), Some("bare"));
    }

    #[test]
    fn test_flag_happy_case() {
        let settings = Settings::parse(SAMPLE, None).unwrap();
        assert!(settings.flag("delete_input_file"));
    }

    #[test]
    fn test_flag_missing_is_false() {
        let settings = Settings::parse(SAMPLE, None).unwrap();
        assert!(!settings.flag("dry_run"));
    }

    #[test]
    fn test_flag_text_value_is_false() {
        let settings = Settings::parse(SAMPLE, None).unwrap();
        assert!(!settings.flag("ffmpeg_root"));
    }

    #[test]
    fn test_flag_is_case_insensitive() {
        let settings = Settings::from_pairs([("dry_run", "TRUE"), ("copy_only", "yes")]);
        assert!(settings.flag("dry_run"));
        assert!(!settings.flag("copy_only"));
    }

    #[test]
    fn test_set_overrides_value() {
        let mut settings = Settings::parse(SAMPLE, None).unwrap();
        settings.set("dry_run", "true");
        assert!(settings.flag("dry_run"));
    }

    #[test]
    fn test_arrays_are_rejected() {
        let err = Settings::parse("paths = [\"a\", \"b\"]", None).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clipvault.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let settings = Settings::load(&path, Some("test")).unwrap();
        assert_eq!(settings.required("project_delimiter").unwrap(), "test");
    }

    #[test]
    fn test_load_missing_file() {
        let err = Settings::load(Path::new("/nonexistent/clipvault.toml"), None).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
