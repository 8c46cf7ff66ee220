use std::path::PathBuf;

/// Runtime configuration. Scoring constants are not configurable.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Analyze independent courses on the rayon pool
    pub parallel: bool,
    /// Field delimiter of the input file
    pub delimiter: u8,
    /// Where `report` writes when no `--out` is given
    pub report_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            parallel: true,
            delimiter: b',',
            report_path: PathBuf::from("report.md"),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();
        Self {
            parallel: lookup("COURSE_COMPLEXITY_PARALLEL")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(default.parallel),
            delimiter: lookup("COURSE_COMPLEXITY_DELIMITER")
                .and_then(|v| parse_delimiter(&v))
                .unwrap_or(default.delimiter),
            report_path: lookup("COURSE_COMPLEXITY_REPORT")
                .map(PathBuf::from)
                .unwrap_or(default.report_path),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Accepts a single ASCII character, or `\t` / `tab` for tabs.
pub fn parse_delimiter(value: &str) -> Option<u8> {
    match value {
        "\\t" | "tab" => Some(b'\t'),
        _ => match value.as_bytes() {
            [byte] if byte.is_ascii() => Some(*byte),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_without_environment() {
        assert_eq!(config_from(&[]), Config::default());
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = config_from(&[
            ("COURSE_COMPLEXITY_PARALLEL", "off"),
            ("COURSE_COMPLEXITY_DELIMITER", ";"),
            ("COURSE_COMPLEXITY_REPORT", "out/courses.md"),
        ]);
        assert!(!config.parallel);
        assert_eq!(config.delimiter, b';');
        assert_eq!(config.report_path, PathBuf::from("out/courses.md"));
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = config_from(&[
            ("COURSE_COMPLEXITY_PARALLEL", "maybe"),
            ("COURSE_COMPLEXITY_DELIMITER", ",,"),
        ]);
        assert!(config.parallel);
        assert_eq!(config.delimiter, b',');
        assert_eq!(parse_delimiter("tab"), Some(b'\t'));
    }
}
