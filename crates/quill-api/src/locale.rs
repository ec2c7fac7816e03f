use serde::{Deserialize, Serialize};
use std::fmt;

/// Content locale. Every instance stores one document per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "EN")]
    En,
    #[serde(rename = "AR")]
    Ar,
}

impl Locale {
    pub const PRIMARY: Locale = Locale::En;

    pub fn is_primary(self) -> bool {
        self == Self::PRIMARY
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Locale::En => "EN",
            Locale::Ar => "AR",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
