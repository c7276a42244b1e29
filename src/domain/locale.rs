use serde::Deserialize;

/// Supported content locales. The legacy unqualified columns predate the
/// translation columns and act as a fallback for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Es,
    En,
}

impl Locale {
    pub fn from_tag(tag: &str) -> Option<Locale> {
        match tag.to_lowercase().as_str() {
            "es" => Some(Locale::Es),
            "en" => Some(Locale::En),
            _ => None,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Picks the locale-specific value if present and non-empty, else the legacy
/// unqualified value, else the empty string. The chosen value is returned
/// verbatim.
pub fn resolve<'a>(specific: Option<&'a str>, legacy: Option<&'a str>) -> &'a str {
    non_empty(specific)
        .or_else(|| non_empty(legacy))
        .unwrap_or("")
}

/// Whether a genuine locale-specific value exists. A record that merely
/// inherits the legacy value reports `false` here even though `resolve`
/// still yields text for it.
pub fn has_translation(specific: Option<&str>) -> bool {
    non_empty(specific).is_some()
}
