use schemars::schema::RootSchema;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse extract-method options: {0}")]
    Toml(String),
    #[error("`[extract_method]` must be a table")]
    NotATable,
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // `Display` includes a source snippet; keep only the message.
        ConfigError::Toml(err.message().to_string())
    }
}

/// Knobs for one extract-method analysis.
///
/// All fields default to the behavior of an interactive "Extract Method"
/// command; hosts usually load them from the `[extract_method]` table of their
/// configuration file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractMethodOptions {
    /// Degrade variables whose data-flow facts match no classification rule to
    /// "ignored" instead of reporting them as unresolved.
    pub best_effort: bool,

    /// Widen a selection that starts or ends inside a statement to the
    /// smallest statement range containing it. When disabled, the largest
    /// statement range contained in the selection is used instead.
    pub allow_selection_expansion: bool,

    /// The target language can return tuples and deconstruct them at the call
    /// site, so outputs of an async method can be returned instead of passed
    /// by reference.
    pub supports_tuple_deconstruction: bool,

    /// Extract into a local function. Calls to other local functions declared
    /// outside the selection are then allowed.
    pub extract_local_function: bool,

    /// Return a lone by-reference variable instead of passing it by `ref`.
    pub promote_single_ref: bool,

    /// Return written struct variables instead of passing them by `ref`/`out`.
    /// Every other output is returned along with them, as a tuple.
    pub prefer_return_for_structs: bool,
}

impl Default for ExtractMethodOptions {
    fn default() -> Self {
        Self {
            best_effort: false,
            allow_selection_expansion: true,
            supports_tuple_deconstruction: true,
            extract_local_function: false,
            promote_single_ref: true,
            prefer_return_for_structs: false,
        }
    }
}

impl ExtractMethodOptions {
    /// Parse options from a TOML document containing only these keys.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read the `[extract_method]` table of a larger TOML document. A missing
    /// table yields the defaults; other tables are ignored.
    pub fn from_toml_table(document: &str) -> Result<Self, ConfigError> {
        let mut table: toml::Table = toml::from_str(document)?;
        match table.remove("extract_method") {
            None => Ok(Self::default()),
            Some(value @ toml::Value::Table(_)) => Ok(value.try_into()?),
            Some(_) => Err(ConfigError::NotATable),
        }
    }
}

/// JSON schema for [`ExtractMethodOptions`], for editor tooling.
#[must_use]
pub fn json_schema() -> RootSchema {
    schema_for!(ExtractMethodOptions)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let options = ExtractMethodOptions::from_toml_str("").unwrap();
        assert_eq!(options, ExtractMethodOptions::default());
        assert!(options.allow_selection_expansion);
        assert!(options.promote_single_ref);
        assert!(!options.best_effort);
    }

    #[test]
    fn reads_extract_method_table() {
        let text = r#"
            [logging]
            level = "debug"

            [extract_method]
            best_effort = true
            promote_single_ref = false
        "#;
        let options = ExtractMethodOptions::from_toml_table(text).unwrap();
        assert_eq!(
            options,
            ExtractMethodOptions {
                best_effort: true,
                promote_single_ref: false,
                ..ExtractMethodOptions::default()
            }
        );

        let options = ExtractMethodOptions::from_toml_table("[logging]\nlevel = 1").unwrap();
        assert_eq!(options, ExtractMethodOptions::default());
    }

    #[test]
    fn rejects_unknown_keys_and_non_tables() {
        let err = ExtractMethodOptions::from_toml_str("best_efort = true").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(message) if message.contains("best_efort")));

        let err = ExtractMethodOptions::from_toml_table("extract_method = 3").unwrap_err();
        assert!(matches!(err, ConfigError::NotATable));
    }

    #[test]
    fn schema_lists_every_option() {
        let schema = serde_json::to_value(json_schema()).unwrap();
        let properties = schema["properties"].as_object().unwrap();
        let mut keys: Vec<_> = properties.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "allow_selection_expansion",
                "best_effort",
                "extract_local_function",
                "prefer_return_for_structs",
                "promote_single_ref",
                "supports_tuple_deconstruction",
            ]
        );
        assert_eq!(schema["additionalProperties"], serde_json::json!(false));
    }
}
