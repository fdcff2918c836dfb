use serde::{Deserialize, Serialize};

use crate::error::GeneratorError;

/// Knobs for one generation run. Every field has a default, so a partial JSON document is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Schema file declaring the generator's own options; never emitted.
    pub options_file: String,
    /// Shared schema base file; emitted only when a user file imports it directly.
    pub base_file: String,
    /// Extension replacing the schema file's own in artifact and include names.
    pub output_extension: String,
    /// Upper bound on parameter registration passes.
    pub max_resolution_passes: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            options_file: "embedded_proto_options.proto".to_owned(),
            base_file: "google/protobuf/descriptor.proto".to_owned(),
            output_extension: "h".to_owned(),
            max_resolution_passes: 3,
        }
    }
}

impl GeneratorConfig {
    pub fn from_json(json: &str) -> Result<GeneratorConfig, GeneratorError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The pass bound actually used; at least one pass always runs.
    pub fn resolution_passes(&self) -> usize {
        self.max_resolution_passes.max(1)
    }

    pub fn is_options_file(&self, name: &str) -> bool {
        name.contains(self.options_file.as_str())
    }

    pub fn is_base_file(&self, name: &str) -> bool {
        name.contains(self.base_file.as_str())
    }

    /// `geo/shapes.proto` becomes `geo/shapes.h`.
    pub fn output_name(&self, schema_file: &str) -> String {
        let stem = match schema_file.rfind('.') {
            Some(dot) if !schema_file[dot..].contains('/') => &schema_file[..dot],
            _ => schema_file,
        };
        format!("{}.{}", stem, self.output_extension)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = GeneratorConfig::from_json(r#"{ "output_extension": "hpp" }"#).unwrap();
        assert_eq!(config.output_extension, "hpp");
        assert_eq!(config.max_resolution_passes, 3);
        assert_eq!(config.options_file, "embedded_proto_options.proto");
    }

    #[test]
    fn zero_passes_still_runs_once() {
        let config = GeneratorConfig {
            max_resolution_passes: 0,
            ..GeneratorConfig::default()
        };
        assert_eq!(config.resolution_passes(), 1);
    }

    #[rstest]
    #[case("shapes.proto", "shapes.h")]
    #[case("geo/shapes.proto", "geo/shapes.h")]
    #[case("v1.2/shapes", "v1.2/shapes.h")]
    #[case("noext", "noext.h")]
    fn output_name_swaps_extension(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(GeneratorConfig::default().output_name(input), expected);
    }

    #[test]
    fn special_files_match_by_path() {
        let config = GeneratorConfig::default();
        assert!(config.is_options_file("embedded_proto_options.proto"));
        assert!(config.is_base_file("google/protobuf/descriptor.proto"));
        assert!(!config.is_base_file("geo/shapes.proto"));
    }
}
