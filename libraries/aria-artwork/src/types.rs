use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 8-bit RGB colour, serialized as `[r, g, b]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const DEFAULT_BLUE: Rgb = Rgb(64, 158, 255);

    /// `#rrggbb`
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.0, self.1, self.2)
    }
}

/// Where the accent colour comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    /// User-chosen palette colour
    #[default]
    MaterialYou,

    /// Colour extracted from the playing track's cover
    AlbumCover,
}

impl ThemeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MaterialYou => "material_you",
            Self::AlbumCover => "album_cover",
        }
    }
}

impl FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "material_you" => Ok(Self::MaterialYou),
            "album_cover" => Ok(Self::AlbumCover),
            other => Err(format!("unknown theme mode: {other}")),
        }
    }
}

/// Named preset colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub name: &'static str,
    pub color: Rgb,
}

/// Built-in Material You presets
pub const PALETTES: [Palette; 5] = [
    Palette {
        name: "Default Blue",
        color: Rgb::DEFAULT_BLUE,
    },
    Palette {
        name: "Vibrant Orange",
        color: Rgb(255, 152, 0),
    },
    Palette {
        name: "Fresh Green",
        color: Rgb(76, 175, 80),
    },
    Palette {
        name: "Elegant Purple",
        color: Rgb(156, 39, 176),
    },
    Palette {
        name: "Passion Red",
        color: Rgb(244, 67, 54),
    },
];

/// Persisted theme settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemePreference {
    #[serde(default)]
    pub mode: ThemeMode,

    #[serde(default = "default_color")]
    pub album_cover_color: Rgb,

    #[serde(default = "default_color")]
    pub material_you_color: Rgb,
}

fn default_color() -> Rgb {
    Rgb::DEFAULT_BLUE
}

impl Default for ThemePreference {
    fn default() -> Self {
        Self {
            mode: ThemeMode::default(),
            album_cover_color: default_color(),
            material_you_color: default_color(),
        }
    }
}

impl ThemePreference {
    /// Colour for the current mode
    pub fn accent(&self) -> Rgb {
        match self.mode {
            ThemeMode::MaterialYou => self.material_you_color,
            ThemeMode::AlbumCover => self.album_cover_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parses_known_names() {
        assert_eq!("material_you".parse(), Ok(ThemeMode::MaterialYou));
        assert_eq!("album_cover".parse(), Ok(ThemeMode::AlbumCover));
        assert!("sepia".parse::<ThemeMode>().is_err());
    }

    #[test]
    fn test_preference_serializes_colors_as_arrays() {
        let json = serde_json::to_string(&ThemePreference::default()).unwrap();
        assert!(json.contains("[64,158,255]"));
        assert!(json.contains("\"material_you\""));
    }

    #[test]
    fn test_accent_follows_mode() {
        let mut pref = ThemePreference {
            album_cover_color: Rgb(1, 2, 3),
            ..ThemePreference::default()
        };
        assert_eq!(pref.accent(), Rgb::DEFAULT_BLUE);
        pref.mode = ThemeMode::AlbumCover;
        assert_eq!(pref.accent(), Rgb(1, 2, 3));
    }

    #[test]
    fn test_hex() {
        assert_eq!(Rgb(64, 158, 255).to_hex(), "#409eff");
    }
}
