//! `#rrggbb` / `#rrggbbaa` serialization for colors in element drafts.

use egui::Color32;
use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

pub fn to_hex(color: Color32) -> String {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    if a == u8::MAX {
        format!("#{r:02x}{g:02x}{b:02x}")
    } else {
        format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
    }
}

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`, plus the few named colors the tools offer.
pub fn parse_hex(text: &str) -> Option<Color32> {
    match text.trim().to_ascii_lowercase().as_str() {
        "black" => return Some(Color32::BLACK),
        "white" => return Some(Color32::WHITE),
        "red" => return Some(Color32::from_rgb(255, 0, 0)),
        "blue" => return Some(Color32::from_rgb(0, 0, 255)),
        "gray" | "grey" => return Some(Color32::from_rgb(128, 128, 128)),
        _ => {}
    }

    let hex = text.trim().strip_prefix('#')?;
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        3 => {
            let nibble = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok().map(|v| v * 17);
            Some(Color32::from_rgb(nibble(0)?, nibble(1)?, nibble(2)?))
        }
        6 => Some(Color32::from_rgb(channel(0)?, channel(2)?, channel(4)?)),
        8 => Some(Color32::from_rgba_unmultiplied(
            channel(0)?,
            channel(2)?,
            channel(4)?,
            channel(6)?,
        )),
        _ => None,
    }
}

pub fn serialize<S: Serializer>(color: &Color32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&to_hex(*color))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color32, D::Error> {
    let text = String::deserialize(deserializer)?;
    parse_hex(&text).ok_or_else(|| D::Error::custom(format!("invalid color `{text}`")))
}

pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(color: &Option<Color32>, serializer: S) -> Result<S::Ok, S::Error> {
        match color {
            Some(color) => serializer.serialize_some(&to_hex(*color)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Color32>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|text| parse_hex(&text).ok_or_else(|| D::Error::custom(format!("invalid color `{text}`"))))
            .transpose()
    }
}
