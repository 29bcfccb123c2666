//! Named generation options and their JSON/name-value parsing.

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde_json::{json, Map, Value};

use crate::combine::Combine;
use crate::error::{MixgenError, Result};
use crate::params::{Matrix, DEFAULT_FOLDER, DEFAULT_FS};

/// Option names recognised by [`Options::from_value`].
pub const OPTION_NAMES: [&str; 8] = [
    "azimuths",
    "elevations",
    "hrtfs",
    "tirs",
    "fs",
    "cache",
    "combine",
    "folder",
];

/// Optional overrides for a parameter set. Unset fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    pub azimuths: Option<Matrix>,
    pub elevations: Option<Matrix>,
    pub hrtfs: Option<Vec<String>>,
    pub tirs: Option<Vec<f64>>,
    pub fs: Option<u32>,
    pub cache: Option<bool>,
    pub combine: Option<Combine>,
    pub folder: Option<PathBuf>,
}

impl Options {
    /// Parse options from a JSON object.
    ///
    /// Unknown names are ignored with a warning; `null` values leave the
    /// option unset.
    ///
    /// # Errors
    /// Returns [`MixgenError::Type`] when a value has the wrong type,
    /// [`MixgenError::Shape`] for ragged matrices, and
    /// [`MixgenError::Configuration`] for an unknown combine mode or a
    /// non-positive sampling rate.
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| MixgenError::Type("options must be a JSON object".to_string()))?;

        let mut options = Options::default();
        for (name, value) in object {
            if value.is_null() {
                continue;
            }
            match name.as_str() {
                "azimuths" => options.azimuths = Some(parse_matrix(name, value)?),
                "elevations" => options.elevations = Some(parse_matrix(name, value)?),
                "hrtfs" => options.hrtfs = Some(parse_hrtfs(value)?),
                "tirs" => options.tirs = Some(parse_tirs(value)?),
                "fs" => options.fs = Some(parse_fs(value)?),
                "cache" => {
                    options.cache = Some(value.as_bool().ok_or_else(|| {
                        MixgenError::Type(format!("cache must be a boolean, got {}", value))
                    })?)
                }
                "combine" => {
                    let combine = value.as_str().ok_or_else(|| {
                        MixgenError::Type(format!("combine must be a string, got {}", value))
                    })?;
                    options.combine = Some(combine.parse()?);
                }
                "folder" => {
                    let folder = value.as_str().ok_or_else(|| {
                        MixgenError::Type(format!("folder must be a string, got {}", value))
                    })?;
                    options.folder = Some(PathBuf::from(folder));
                }
                _ => warn!(
                    "ignoring unknown option \"{}\" (expected one of {})",
                    name,
                    OPTION_NAMES.join(", ")
                ),
            }
        }

        Ok(options)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Read options from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Reading options from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parse a flat `name, value, name, value, ...` list.
    ///
    /// Values are read as JSON; anything that is not valid JSON is taken as a
    /// bare string, so `combine all` and `combine "all"` are equivalent.
    /// For the string options (`folder`, `combine`, and `hrtfs` unless given
    /// as a JSON list) any non-string JSON value is kept as its raw text, so
    /// `folder 2024` names the folder `2024`.
    ///
    /// # Errors
    /// Returns [`MixgenError::Configuration`] for an odd number of entries,
    /// plus any error [`Options::from_value`] reports.
    pub fn from_pairs<T: AsRef<str>>(items: &[T]) -> Result<Self> {
        if items.len() % 2 != 0 {
            return Err(MixgenError::Configuration(format!(
                "options must be given as name/value pairs, got {} entries",
                items.len()
            )));
        }

        let mut object = Map::new();
        for pair in items.chunks(2) {
            let name = pair[0].as_ref().trim_start_matches('-').to_string();
            let raw = pair[1].as_ref();
            let value = pair_value(&name, raw);
            object.insert(name, value);
        }

        Self::from_value(&Value::Object(object))
    }

    /// Field-by-field merge where `other` wins.
    pub fn merge(self, other: Options) -> Options {
        Options {
            azimuths: other.azimuths.or(self.azimuths),
            elevations: other.elevations.or(self.elevations),
            hrtfs: other.hrtfs.or(self.hrtfs),
            tirs: other.tirs.or(self.tirs),
            fs: other.fs.or(self.fs),
            cache: other.cache.or(self.cache),
            combine: other.combine.or(self.combine),
            folder: other.folder.or(self.folder),
        }
    }

    /// Default options payload for the given number of interferers.
    pub fn template(interferer_count: usize) -> Value {
        let zeros = vec![0.0; interferer_count + 1];
        json!({
            "azimuths": [zeros.clone()],
            "elevations": [zeros],
            "hrtfs": [],
            "tirs": 0.0,
            "fs": DEFAULT_FS,
            "cache": false,
            "combine": Value::Null,
            "folder": DEFAULT_FOLDER,
        })
    }
}

fn pair_value(name: &str, raw: &str) -> Value {
    let bare = || Value::String(raw.to_string());
    match (name, serde_json::from_str::<Value>(raw)) {
        ("folder" | "combine", Ok(value @ Value::String(_))) => value,
        ("hrtfs", Ok(value @ (Value::String(_) | Value::Array(_)))) => value,
        ("folder" | "combine" | "hrtfs", _) => bare(),
        (_, Ok(value)) => value,
        (_, Err(_)) => bare(),
    }
}

fn parse_number(name: &str, value: &Value) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| MixgenError::Type(format!("{} must be numeric, got {}", name, value)))
}

fn parse_numbers(name: &str, values: &[Value]) -> Result<Vec<f64>> {
    values.iter().map(|value| parse_number(name, value)).collect()
}

fn parse_matrix(name: &str, value: &Value) -> Result<Matrix> {
    match value {
        Value::Number(_) => Ok(Matrix::row(vec![parse_number(name, value)?])),
        Value::Array(items) if items.iter().all(Value::is_array) && !items.is_empty() => {
            let rows = items
                .iter()
                .map(|row| parse_numbers(name, row.as_array().map(Vec::as_slice).unwrap_or(&[])))
                .collect::<Result<Vec<_>>>()?;
            Matrix::new(rows)
        }
        Value::Array(items) if items.is_empty() => Matrix::new(Vec::new()),
        Value::Array(items) => Ok(Matrix::row(parse_numbers(name, items)?)),
        _ => Err(MixgenError::Type(format!(
            "{} must be a number or numeric matrix, got {}",
            name, value
        ))),
    }
}

fn parse_hrtfs(value: &Value) -> Result<Vec<String>> {
    match value {
        Value::String(hrtf) if hrtf.is_empty() => Ok(Vec::new()),
        Value::String(hrtf) => Ok(vec![hrtf.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    MixgenError::Type(format!(
                        "hrtfs must be a string or a list of strings, got {}",
                        item
                    ))
                })
            })
            .collect(),
        _ => Err(MixgenError::Type(format!(
            "hrtfs must be a string or a list of strings, got {}",
            value
        ))),
    }
}

/// Reduce a number, vector, or matrix to a single column, column by column.
fn parse_tirs(value: &Value) -> Result<Vec<f64>> {
    let matrix = parse_matrix("tirs", value)?;
    let mut column = Vec::with_capacity(matrix.row_count() * matrix.width());
    for col in 0..matrix.width() {
        for row in 0..matrix.row_count() {
            column.push(matrix.get_row(row)[col]);
        }
    }
    Ok(column)
}

fn parse_fs(value: &Value) -> Result<u32> {
    let fs = parse_number("fs", value)?;
    if !fs.is_finite() || fs < 1.0 || fs > u32::MAX as f64 {
        return Err(MixgenError::Configuration(format!(
            "fs must be a positive sampling rate, got {}",
            value
        )));
    }
    Ok(fs.round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_recognised_option() {
        let options = Options::from_json_str(
            r#"{
                "azimuths": [[0, 30], [0, 60]],
                "elevations": [0, 10],
                "hrtfs": ["kemar.sofa", "cipic.sofa"],
                "tirs": [0, 5, 10],
                "fs": 44100,
                "cache": true,
                "combine": "ALL",
                "folder": "corpus"
            }"#,
        )
        .unwrap();

        assert_eq!(
            options.azimuths,
            Some(Matrix::new(vec![vec![0.0, 30.0], vec![0.0, 60.0]]).unwrap())
        );
        assert_eq!(options.elevations, Some(Matrix::row(vec![0.0, 10.0])));
        assert_eq!(
            options.hrtfs,
            Some(vec!["kemar.sofa".to_string(), "cipic.sofa".to_string()])
        );
        assert_eq!(options.tirs, Some(vec![0.0, 5.0, 10.0]));
        assert_eq!(options.fs, Some(44_100));
        assert_eq!(options.cache, Some(true));
        assert_eq!(options.combine, Some(Combine::All));
        assert_eq!(options.folder, Some(PathBuf::from("corpus")));
    }

    #[test]
    fn unknown_names_are_ignored() {
        let options = Options::from_json_str(r#"{"tirs": 3, "reverb": true}"#).unwrap();
        assert_eq!(options.tirs, Some(vec![3.0]));
    }

    #[test]
    fn wrong_types_are_type_errors() {
        for json in [
            r#"{"hrtfs": 12}"#,
            r#"{"hrtfs": ["a.sofa", 3]}"#,
            r#"{"cache": "yes"}"#,
            r#"{"folder": 1}"#,
            r#"{"combine": 2}"#,
            r#"{"fs": "fast"}"#,
            r#"{"azimuths": "left"}"#,
            r#"{"elevations": [[0, "up"]]}"#,
            r#"[1, 2]"#,
        ] {
            let err = Options::from_json_str(json).unwrap_err();
            assert!(matches!(err, MixgenError::Type(_)), "{} gave {}", json, err);
        }
    }

    #[test]
    fn unknown_combine_mode_is_configuration_error() {
        let err = Options::from_json_str(r#"{"combine": "pairs"}"#).unwrap_err();
        assert!(matches!(err, MixgenError::Configuration(_)));
    }

    #[test]
    fn tir_matrices_flatten_column_by_column() {
        let options = Options::from_json_str(r#"{"tirs": [[1, 2], [3, 4]]}"#).unwrap();
        assert_eq!(options.tirs, Some(vec![1.0, 3.0, 2.0, 4.0]));
    }

    #[test]
    fn pairs_accept_json_and_bare_words() {
        let options =
            Options::from_pairs(&["combine", "all", "tirs", "[0, 6]", "--folder", "out"]).unwrap();
        assert_eq!(options.combine, Some(Combine::All));
        assert_eq!(options.tirs, Some(vec![0.0, 6.0]));
        assert_eq!(options.folder, Some(PathBuf::from("out")));
    }

    #[test]
    fn pairs_keep_numeric_looking_words_for_string_options() {
        let options =
            Options::from_pairs(&["folder", "2024", "hrtfs", "123", "fs", "8000"]).unwrap();
        assert_eq!(options.folder, Some(PathBuf::from("2024")));
        assert_eq!(options.hrtfs, Some(vec!["123".to_string()]));
        assert_eq!(options.fs, Some(8_000));

        let options = Options::from_pairs(&["folder", "null", "hrtfs", r#"["a", "b"]"#]).unwrap();
        assert_eq!(options.folder, Some(PathBuf::from("null")));
        assert_eq!(options.hrtfs, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn odd_pair_lists_are_configuration_errors() {
        let err = Options::from_pairs(&["combine", "all", "tirs"]).unwrap_err();
        assert!(matches!(err, MixgenError::Configuration(_)));
    }

    #[test]
    fn merge_prefers_later_values() {
        let base = Options {
            fs: Some(8_000),
            folder: Some(PathBuf::from("a")),
            ..Options::default()
        };
        let overrides = Options {
            folder: Some(PathBuf::from("b")),
            ..Options::default()
        };
        let merged = base.merge(overrides);
        assert_eq!(merged.fs, Some(8_000));
        assert_eq!(merged.folder, Some(PathBuf::from("b")));
    }

    #[test]
    fn template_round_trips_through_parser() {
        let options = Options::from_value(&Options::template(2)).unwrap();
        assert_eq!(options.azimuths, Some(Matrix::zeros(3)));
        assert_eq!(options.fs, Some(DEFAULT_FS));
        assert_eq!(options.hrtfs, Some(Vec::new()));
        assert_eq!(options.combine, None);
    }
}
