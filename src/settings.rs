/// User-facing options persisted under the `settings` key
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Color theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::System, Theme::Light, Theme::Dark];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::System => "system",
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Theme::System => "System",
            Theme::Light => "Light",
            Theme::Dark => "Dark",
        }
    }
}

// Anything we don't recognize falls back to following the OS.
impl From<String> for Theme {
    fn from(value: String) -> Self {
        match value.as_str() {
            "light" => Theme::Light,
            "dark" => Theme::Dark,
            _ => Theme::System,
        }
    }
}

// Null, a non-string or an unknown name all mean "follow the OS".
fn lenient_theme<'de, D>(deserializer: D) -> Result<Theme, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(name) => Theme::from(name),
        _ => Theme::System,
    })
}

/// Open mapping of option name to value.
///
/// `theme` is the only key the popup understands; any other keys written by
/// other versions of the extension are carried through untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, deserialize_with = "lenient_theme")]
    pub theme: Theme,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Settings {
    /// Overlay `patch` on top of the current mapping.
    ///
    /// The accessor layer always replaces the whole record, so callers merge
    /// here first and persist the result.
    pub fn merge(&self, patch: Map<String, Value>) -> Result<Settings, serde_json::Error> {
        let mut merged = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        merged.extend(patch);
        serde_json::from_value(Value::Object(merged))
    }

    pub fn with_theme(&self, theme: Theme) -> Settings {
        Settings {
            theme,
            extra: self.extra.clone(),
        }
    }
}
