use serde::de::Error;
use serde::{Deserialize, Deserializer};

/// Compile-time options. Both can also be changed part way through a
/// template with `{pragma ...}`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    /// Keep newline-led whitespace runs instead of dropping them
    pub keep_whitespace: bool,
    #[serde(deserialize_with = "deserialize_default_escape")]
    pub default_escape: DefaultEscape,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            keep_whitespace: false,
            default_escape: DefaultEscape::default(),
        }
    }
}

/// The escaper wrapped around unprotected call results.
#[derive(Clone, Debug, PartialEq)]
pub enum DefaultEscape {
    Disabled,
    /// `name` or `namespace::name`
    Named(String),
}

impl Default for DefaultEscape {
    fn default() -> Self {
        DefaultEscape::Named("escapeHtml".to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEscape {
    Name(String),
    Flag(bool),
}

fn deserialize_default_escape<'de, D>(deserializer: D) -> Result<DefaultEscape, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawEscape>::deserialize(deserializer)? {
        None | Some(RawEscape::Flag(false)) => Ok(DefaultEscape::Disabled),
        Some(RawEscape::Name(name)) => Ok(DefaultEscape::Named(name)),
        Some(RawEscape::Flag(true)) => Err(D::Error::custom(
            "defaultEscape must be the name of an escaper or false",
        )),
    }
}
