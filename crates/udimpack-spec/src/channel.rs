//! Semantic texture channels and colorspace tags.
//!
//! Every channel is either one of the well-known shader inputs or a custom
//! name. All per-kind knowledge (socket name, expected colorspace, neutral
//! fill value) lives in one lookup table, [`CHANNEL_TABLE`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// How the pixel values of an image are meant to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Colorspace {
    /// Perceptually encoded color (sRGB and friends).
    Color,
    /// Non-color data such as roughness or normal maps.
    NonColor,
    /// Raw numeric data (displacement, masks stored as float).
    Data,
}

impl Colorspace {
    /// Short lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Colorspace::Color => "color",
            Colorspace::NonColor => "non_color",
            Colorspace::Data => "data",
        }
    }
}

impl fmt::Display for Colorspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A well-known shader input channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WellKnownChannel {
    BaseColor,
    Metallic,
    Roughness,
    Normal,
    Specular,
    Emission,
    EmissionColor,
    Alpha,
    Transmission,
    SubsurfaceColor,
}

/// Static properties of a well-known channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelProfile {
    pub kind: WellKnownChannel,
    /// Socket name used by shader nodes for this input.
    pub socket: &'static str,
    /// Colorspace this channel is normally authored in.
    pub expected_colorspace: Colorspace,
    /// Neutral RGBA value used for cells without a source image.
    pub fill: [f32; 4],
}

/// The single kind -> properties table.
pub const CHANNEL_TABLE: &[ChannelProfile] = &[
    ChannelProfile {
        kind: WellKnownChannel::BaseColor,
        socket: "Base Color",
        expected_colorspace: Colorspace::Color,
        fill: [0.5, 0.5, 0.5, 1.0],
    },
    ChannelProfile {
        kind: WellKnownChannel::Metallic,
        socket: "Metallic",
        expected_colorspace: Colorspace::NonColor,
        fill: [0.0, 0.0, 0.0, 1.0],
    },
    ChannelProfile {
        kind: WellKnownChannel::Roughness,
        socket: "Roughness",
        expected_colorspace: Colorspace::NonColor,
        fill: [0.5, 0.5, 0.5, 1.0],
    },
    ChannelProfile {
        kind: WellKnownChannel::Normal,
        socket: "Normal",
        expected_colorspace: Colorspace::NonColor,
        fill: [0.5, 0.5, 1.0, 1.0],
    },
    ChannelProfile {
        kind: WellKnownChannel::Specular,
        socket: "Specular",
        expected_colorspace: Colorspace::NonColor,
        fill: [0.5, 0.5, 0.5, 1.0],
    },
    ChannelProfile {
        kind: WellKnownChannel::Emission,
        socket: "Emission",
        expected_colorspace: Colorspace::Color,
        fill: [0.0, 0.0, 0.0, 1.0],
    },
    ChannelProfile {
        kind: WellKnownChannel::EmissionColor,
        socket: "Emission Color",
        expected_colorspace: Colorspace::Color,
        fill: [0.0, 0.0, 0.0, 1.0],
    },
    ChannelProfile {
        kind: WellKnownChannel::Alpha,
        socket: "Alpha",
        expected_colorspace: Colorspace::NonColor,
        fill: [1.0, 1.0, 1.0, 1.0],
    },
    ChannelProfile {
        kind: WellKnownChannel::Transmission,
        socket: "Transmission",
        expected_colorspace: Colorspace::NonColor,
        fill: [0.0, 0.0, 0.0, 1.0],
    },
    ChannelProfile {
        kind: WellKnownChannel::SubsurfaceColor,
        socket: "Subsurface Color",
        expected_colorspace: Colorspace::Color,
        fill: [0.5, 0.5, 0.5, 1.0],
    },
];

/// Fill used for custom channels.
pub const CUSTOM_FILL: [f32; 4] = [0.5, 0.5, 0.5, 1.0];

impl WellKnownChannel {
    /// Looks up the table entry for this channel.
    pub fn profile(&self) -> &'static ChannelProfile {
        // Table covers every variant; indexing by position keeps it in one place.
        &CHANNEL_TABLE[*self as usize]
    }

    /// Finds the channel matching a shader socket name.
    pub fn from_socket(socket: &str) -> Option<Self> {
        CHANNEL_TABLE
            .iter()
            .find(|p| p.socket == socket)
            .map(|p| p.kind)
    }
}

/// A semantic channel: well-known shader input or a custom name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChannelKind {
    WellKnown(WellKnownChannel),
    Custom(String),
}

impl ChannelKind {
    /// Classifies a name, preferring the well-known channel with that socket name.
    pub fn from_name(name: &str) -> Self {
        match WellKnownChannel::from_socket(name) {
            Some(kind) => ChannelKind::WellKnown(kind),
            None => ChannelKind::Custom(name.to_string()),
        }
    }

    /// Display name, unique per material.
    pub fn name(&self) -> &str {
        match self {
            ChannelKind::WellKnown(kind) => kind.profile().socket,
            ChannelKind::Custom(name) => name,
        }
    }

    /// The name as used in output file names (spaces become underscores).
    pub fn file_token(&self) -> String {
        self.name().replace(' ', "_")
    }

    /// Colorspace this channel is normally authored in, if known.
    pub fn expected_colorspace(&self) -> Option<Colorspace> {
        match self {
            ChannelKind::WellKnown(kind) => Some(kind.profile().expected_colorspace),
            ChannelKind::Custom(_) => None,
        }
    }

    /// Neutral RGBA fill for cells that have no source image.
    pub fn fill(&self) -> [f32; 4] {
        match self {
            ChannelKind::WellKnown(kind) => kind.profile().fill,
            ChannelKind::Custom(_) => CUSTOM_FILL,
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for ChannelKind {
    fn from(value: String) -> Self {
        ChannelKind::from_name(&value)
    }
}

impl From<ChannelKind> for String {
    fn from(value: ChannelKind) -> Self {
        value.name().to_string()
    }
}

/// Derives a custom channel name from an image name.
///
/// The name is cut at the first `.`, underscores become spaces, and each
/// word is title-cased: `ao_map.001` becomes `Ao Map`.
pub fn custom_name_from_image(image_name: &str) -> String {
    let stem = image_name.split('.').next().unwrap_or(image_name);
    stem.split(|c: char| c == '_' || c == ' ')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// One discovered texture channel of one material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    /// Semantic channel; unique within one material.
    pub channel: ChannelKind,
    /// Name of the source image in the scene.
    pub image: String,
    /// Colorspace declared on the source image.
    pub colorspace: Colorspace,
    /// Id of the image-texture node holding the image.
    pub node: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_indexed_by_variant() {
        for (i, profile) in CHANNEL_TABLE.iter().enumerate() {
            assert_eq!(profile.kind as usize, i);
            assert_eq!(profile.kind.profile().socket, profile.socket);
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(
            ChannelKind::from_name("Base Color"),
            ChannelKind::WellKnown(WellKnownChannel::BaseColor)
        );
        assert_eq!(
            ChannelKind::from_name("Ambient Occlusion"),
            ChannelKind::Custom("Ambient Occlusion".to_string())
        );
    }

    #[test]
    fn test_expected_colorspace() {
        assert_eq!(
            ChannelKind::from_name("Normal").expected_colorspace(),
            Some(Colorspace::NonColor)
        );
        assert_eq!(
            ChannelKind::from_name("Base Color").expected_colorspace(),
            Some(Colorspace::Color)
        );
        assert_eq!(ChannelKind::from_name("Dirt").expected_colorspace(), None);
    }

    #[test]
    fn test_file_token() {
        assert_eq!(ChannelKind::from_name("Base Color").file_token(), "Base_Color");
        assert_eq!(ChannelKind::from_name("Ao Map").file_token(), "Ao_Map");
    }

    #[test]
    fn test_custom_name_from_image() {
        assert_eq!(custom_name_from_image("ao_map.001"), "Ao Map");
        assert_eq!(custom_name_from_image("DIRT_mask.png"), "Dirt Mask");
        assert_eq!(custom_name_from_image("rust"), "Rust");
    }

    #[test]
    fn test_channel_serde_as_name() {
        let kind = ChannelKind::from_name("Emission Color");
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, "\"Emission Color\"");
        let parsed: ChannelKind = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, kind);
    }
}
