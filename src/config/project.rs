use std::path::{Path, PathBuf};

use snafu::ResultExt;

use crate::transpile::error::{ConfigSnafu, ReadInputSnafu, Result};
use crate::transpile::Options;

pub const CONFIG_FILE: &str = "tinycompute.toml";

/// The `[transpile]` table of a tinycompute.toml. Absent keys stay `None`
/// and leave the corresponding option untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectConfig {
    /// Directory holding the config file; relative paths resolve here.
    pub root_dir: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub extension: Option<String>,
    pub version: Option<String>,
    pub namespaces: Option<Vec<String>>,
    pub validate: Option<bool>,
    pub validator: Option<String>,
    pub parallel: Option<bool>,
}

/// Parse a minimal TOML string array: `["a", "b", "c"]` → `vec!["a", "b", "c"]`.
fn parse_string_array(s: &str) -> Option<Vec<String>> {
    let s = s.trim();
    let inner = s.strip_prefix('[')?.strip_suffix(']')?;
    Some(
        inner
            .split(',')
            .map(|part| part.trim().trim_matches('"').to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    )
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// A quoted string, or a bare word for numbers like `version = 450`.
fn parse_string(s: &str) -> String {
    s.trim_matches('"').to_string()
}

impl ProjectConfig {
    /// Load a tinycompute.toml file.
    pub fn load(toml_path: &Path) -> Result<ProjectConfig> {
        let content = std::fs::read_to_string(toml_path).context(ReadInputSnafu { path: toml_path })?;
        let root_dir = toml_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        Self::parse(&content, root_dir).map_err(|reason| {
            ConfigSnafu {
                path: toml_path,
                reason,
            }
            .build()
        })
    }

    /// Section-aware minimal TOML parsing. Other sections are ignored.
    pub fn parse(content: &str, root_dir: PathBuf) -> std::result::Result<ProjectConfig, String> {
        let mut config = ProjectConfig {
            root_dir,
            ..ProjectConfig::default()
        };
        let mut current_section = String::new();

        for (i, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.starts_with('#') || trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                current_section = trimmed[1..trimmed.len() - 1].trim().to_string();
                continue;
            }
            if current_section != "transpile" {
                continue;
            }
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(format!("line {}: expected 'key = value'", i + 1));
            };
            let key = key.trim().trim_matches('"');
            let value = value.trim();
            let invalid = |what: &str| format!("line {}: '{}' must be {}", i + 1, key, what);

            match key {
                "output_dir" => config.output_dir = Some(PathBuf::from(parse_string(value))),
                "extension" => config.extension = Some(parse_string(value)),
                "version" => config.version = Some(parse_string(value)),
                "validator" => config.validator = Some(parse_string(value)),
                "namespaces" => {
                    config.namespaces =
                        Some(parse_string_array(value).ok_or_else(|| invalid("a string array"))?)
                }
                "validate" => {
                    config.validate = Some(parse_bool(value).ok_or_else(|| invalid("true or false"))?)
                }
                "parallel" => {
                    config.parallel = Some(parse_bool(value).ok_or_else(|| invalid("true or false"))?)
                }
                other => return Err(format!("line {}: unknown key '{}'", i + 1, other)),
            }
        }
        Ok(config)
    }

    /// Try to find a tinycompute.toml in the given directory or its ancestors.
    pub fn find(start_dir: &Path) -> Option<PathBuf> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.exists() {
                return Some(candidate);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// Overlay the configured values onto `options`.
    pub fn apply(&self, options: &mut Options) {
        if let Some(dir) = &self.output_dir {
            options.output_dir = self.root_dir.join(dir);
        }
        if let Some(ext) = &self.extension {
            options.extension = ext.clone();
        }
        if let Some(version) = &self.version {
            options.version = version.clone();
        }
        if let Some(namespaces) = &self.namespaces {
            options.namespaces = namespaces.clone();
        }
        if let Some(validate) = self.validate {
            options.validate = validate;
        }
        if let Some(validator) = &self.validator {
            options.validator = validator.clone();
        }
        if let Some(parallel) = self.parallel {
            options.parallel = parallel;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join(CONFIG_FILE);
        fs::write(
            &toml_path,
            r#"# shaders for the demos
[transpile]
output_dir = "shaders"
extension = "glsl"
version = "450"
namespaces = ["tc", "tinycompute"]
validate = true
parallel = false
"#,
        )
        .unwrap();

        let config = ProjectConfig::load(&toml_path).unwrap();
        assert_eq!(config.output_dir, Some(PathBuf::from("shaders")));
        assert_eq!(config.extension.as_deref(), Some("glsl"));
        assert_eq!(config.version.as_deref(), Some("450"));
        assert_eq!(
            config.namespaces,
            Some(vec!["tc".to_string(), "tinycompute".to_string()])
        );
        assert_eq!(config.validate, Some(true));
        assert_eq!(config.parallel, Some(false));
        assert_eq!(config.validator, None);

        let mut options = Options::default();
        config.apply(&mut options);
        assert_eq!(options.output_dir, dir.path().join("shaders"));
        assert_eq!(options.extension, "glsl");
        assert!(options.validate);
        assert_eq!(options.validator, "glslangValidator");
    }

    #[test]
    fn test_other_sections_are_ignored() {
        let config = ProjectConfig::parse(
            "[package]\nname = \"demo\"\n\n[transpile]\nversion = 460\n",
            PathBuf::from("."),
        )
        .unwrap();
        assert_eq!(config.version.as_deref(), Some("460"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = ProjectConfig::parse("[transpile]\nvalidate = maybe\n", PathBuf::new()).unwrap_err();
        assert_eq!(err, "line 2: 'validate' must be true or false");
        let err = ProjectConfig::parse("[transpile]\noutdir = \"x\"\n", PathBuf::new()).unwrap_err();
        assert_eq!(err, "line 2: unknown key 'outdir'");
        let err = ProjectConfig::parse("[transpile]\nnamespaces = \"tc\"\n", PathBuf::new()).unwrap_err();
        assert_eq!(err, "line 2: 'namespaces' must be a string array");
    }

    #[test]
    fn test_load_reports_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join(CONFIG_FILE);
        fs::write(&toml_path, "[transpile]\nparallel = 1\n").unwrap();
        let err = ProjectConfig::load(&toml_path).unwrap_err();
        assert!(err.to_string().starts_with("invalid configuration"));
    }

    #[test]
    fn test_find_searches_ancestors() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("kernels").join("life");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "[transpile]\n").unwrap();
        assert_eq!(
            ProjectConfig::find(&nested),
            Some(dir.path().join(CONFIG_FILE))
        );
    }

    #[test]
    fn test_parse_string_array() {
        assert_eq!(
            parse_string_array(r#"["a", "b", "c"]"#),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
        assert_eq!(parse_string_array("[]"), Some(Vec::new()));
        assert!(parse_string_array("not_an_array").is_none());
    }
}
