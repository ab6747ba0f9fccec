use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Social networks the public page can link to.
///
/// Social click labels are validated against this list when recorded, so
/// stored labels are always one of the canonical names below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialPlatform {
    Instagram,
    LinkedIn,
    TikTok,
    Email,
    Website,
}

impl SocialPlatform {
    pub const ALL: [SocialPlatform; 5] = [
        SocialPlatform::Instagram,
        SocialPlatform::LinkedIn,
        SocialPlatform::TikTok,
        SocialPlatform::Email,
        SocialPlatform::Website,
    ];

    /// Display label, also the label stored on click events.
    pub fn label(&self) -> &'static str {
        match self {
            SocialPlatform::Instagram => "Instagram",
            SocialPlatform::LinkedIn => "LinkedIn",
            SocialPlatform::TikTok => "TikTok",
            SocialPlatform::Email => "Email",
            SocialPlatform::Website => "Website",
        }
    }

    /// Glyph name in the page's icon set.
    pub fn icon_name(&self) -> &'static str {
        match self {
            SocialPlatform::Instagram => "instagram",
            SocialPlatform::LinkedIn => "linkedin",
            SocialPlatform::TikTok => "music",
            SocialPlatform::Email => "mail",
            SocialPlatform::Website => "globe",
        }
    }
}

impl FromStr for SocialPlatform {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim();
        SocialPlatform::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CoreError::UnknownSocialPlatform(wanted.to_string()))
    }
}

impl fmt::Display for SocialPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
