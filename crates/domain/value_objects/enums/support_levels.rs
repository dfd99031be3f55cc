use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SupportLevel {
    Standard,
    Priority,
    Dedicated,
}

impl Display for SupportLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self {
            SupportLevel::Standard => "STANDARD",
            SupportLevel::Priority => "PRIORITY",
            SupportLevel::Dedicated => "DEDICATED",
        };
        write!(f, "{}", level)
    }
}
