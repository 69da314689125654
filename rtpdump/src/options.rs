use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use rtpdump_core::codec::CodecOptions;

/// Scalar option value as written in an options file, `octet-aligned: 1` and
/// `octet-aligned: "1"` mean the same.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OptionValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl From<OptionValue> for String {
    fn from(value: OptionValue) -> Self {
        match value {
            OptionValue::Bool(b) => b.to_string(),
            OptionValue::Int(i) => i.to_string(),
            OptionValue::Str(s) => s,
        }
    }
}

/// Parse `name:value,name:value` codec flags.
pub fn parse_flags(flags: &str) -> Result<CodecOptions> {
    let mut options = CodecOptions::new();
    for flag in flags.split(',').map(str::trim).filter(|f| !f.is_empty()) {
        let Some((name, value)) = flag.split_once(':') else {
            bail!("invalid flag '{}', expected \"option:value\"", flag);
        };
        if name.is_empty() || value.is_empty() || value.contains(':') {
            bail!("invalid flag '{}', expected \"option:value\"", flag);
        }
        options.insert(name.to_string(), value.to_string());
    }
    Ok(options)
}

pub fn parse_options_yaml(yaml: &str) -> Result<CodecOptions> {
    if yaml.trim().is_empty() {
        return Ok(CodecOptions::new());
    }
    let values: HashMap<String, OptionValue> =
        serde_yaml::from_str(yaml).context("options file must be a mapping of option: value")?;
    Ok(values.into_iter().map(|(k, v)| (k, v.into())).collect())
}

/// Options from an optional YAML file, overridden by command line flags
pub fn load(file: Option<&Path>, flags: Option<&str>) -> Result<CodecOptions> {
    let mut options = match file {
        Some(path) => {
            let yaml = fs::read_to_string(path)
                .with_context(|| format!("failed to read options file {}", path.display()))?;
            parse_options_yaml(&yaml)
                .with_context(|| format!("invalid options file {}", path.display()))?
        }
        None => CodecOptions::new(),
    };

    if let Some(flags) = flags {
        options.extend(parse_flags(flags)?);
    }
    Ok(options)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let opts = parse_flags("sample-rate:nb, octet-aligned:0").unwrap();
        assert_eq!(opts.len(), 2);
        assert_eq!(opts["sample-rate"], "nb");
        assert_eq!(opts["octet-aligned"], "0");

        assert!(parse_flags("").unwrap().is_empty());
        assert!(parse_flags("sample-rate").is_err());
        assert!(parse_flags("sample-rate:nb:wb").is_err());
        assert!(parse_flags(":nb").is_err());
    }

    #[test]
    fn test_parse_yaml() {
        let opts = parse_options_yaml("octet-aligned: 1\nsample-rate: wb\n").unwrap();
        assert_eq!(opts["octet-aligned"], "1");
        assert_eq!(opts["sample-rate"], "wb");

        assert!(parse_options_yaml("").unwrap().is_empty());
        assert!(parse_options_yaml("- a\n- b\n").is_err());
        assert!(parse_options_yaml("header-format: [0, 1]\n").is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let path = std::env::temp_dir().join(format!("rtpdump-options-{}.yaml", std::process::id()));
        fs::write(&path, "sample-rate: wb\noctet-aligned: 1\n").unwrap();
        let opts = load(Some(&path), Some("sample-rate:nb")).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(opts["sample-rate"], "nb");
        assert_eq!(opts["octet-aligned"], "1");

        assert!(load(Some(Path::new("/nonexistent/options.yaml")), None).is_err());
    }
}
