// Node color theme: per-scope configured colors with palette fallback.

use std::collections::HashMap;

use eframe::egui::Color32;
use once_cell::sync::Lazy;

pub const BACKGROUND: Color32 = Color32::from_rgb(0xf8, 0xf8, 0xf8);
pub const SELECTION_STROKE: Color32 = Color32::from_rgb(0x00, 0xae, 0xeb);
pub const LABEL_COLOR: Color32 = Color32::from_rgb(0x33, 0x33, 0x33);
pub const EDGE_COLOR: Color32 = Color32::from_rgb(0x55, 0x55, 0x55);
pub const EDGE_HIGHLIGHT: Color32 = Color32::from_rgb(0x20, 0x20, 0x20);

/// Built-in fills for the well-known color keys. Settings from storage
/// override these; anything else falls through to the categorical palette.
static DEFAULT_FILLS: Lazy<HashMap<&'static str, Color32>> = Lazy::new(|| {
    HashMap::from([
        ("reading", Color32::from_rgb(0xcc, 0xe0, 0xf5)),
        ("tag", Color32::from_rgb(0xcc, 0xe8, 0xcc)),
        ("default", Color32::from_rgb(0xcc, 0xcc, 0xcc)),
    ])
});

/// Resolves node color keys to fill and border colors. Built from the
/// per-scope color settings on every reload.
#[derive(Default)]
pub struct ColorTheme {
    configured: HashMap<String, Color32>,
}

impl ColorTheme {
    /// Parses raw `#rrggbb` settings; entries that fail to parse are
    /// dropped with a warning and fall back like missing ones.
    pub fn from_settings(settings: &HashMap<String, String>) -> Self {
        let mut configured = HashMap::new();
        for (key, raw) in settings {
            match parse_hex(raw) {
                Some(color) => {
                    configured.insert(key.clone(), color);
                }
                None => log::warn!("unparsable color {raw:?} for key {key:?}"),
            }
        }
        Self { configured }
    }

    pub fn fill(&self, key: &str) -> Color32 {
        if let Some(&c) = self.configured.get(key) {
            return c;
        }
        if let Some(&c) = DEFAULT_FILLS.get(key) {
            return c;
        }
        if let Some(&c) = self.configured.get("default") {
            return c;
        }
        palette_color(key)
    }

    /// Border is a darkened fill, so configured themes stay coherent
    /// without needing a second setting per key.
    pub fn border(&self, key: &str) -> Color32 {
        darken(self.fill(key))
    }
}

fn parse_hex(raw: &str) -> Option<Color32> {
    let hex = raw.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color32::from_rgb(r, g, b))
}

/// Divides each channel by 1.2.
fn darken(c: Color32) -> Color32 {
    Color32::from_rgb(
        (c.r() as u32 * 10 / 12) as u8,
        (c.g() as u32 * 10 / 12) as u8,
        (c.b() as u32 * 10 / 12) as u8,
    )
}

/// Deterministic categorical color for keys with no configured entry.
fn palette_color(key: &str) -> Color32 {
    let hash: usize = key.bytes().fold(0usize, |acc, b| {
        acc.wrapping_mul(31).wrapping_add(b as usize)
    });
    let c = colorous::CATEGORY10[hash % colorous::CATEGORY10.len()];
    Color32::from_rgb(c.r, c.g, c.b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_settings_round_trip() {
        let settings = HashMap::from([("reading".to_string(), "#102030".to_string())]);
        let theme = ColorTheme::from_settings(&settings);
        assert_eq!(theme.fill("reading"), Color32::from_rgb(0x10, 0x20, 0x30));
    }

    #[test]
    fn bad_hex_falls_back_to_the_default_fill() {
        let settings = HashMap::from([
            ("reading".to_string(), "not-a-color".to_string()),
            ("tag".to_string(), "#12345".to_string()),
        ]);
        let theme = ColorTheme::from_settings(&settings);
        assert_eq!(theme.fill("reading"), *DEFAULT_FILLS.get("reading").unwrap());
        assert_eq!(theme.fill("tag"), *DEFAULT_FILLS.get("tag").unwrap());
    }

    #[test]
    fn unknown_keys_get_a_stable_palette_color() {
        let theme = ColorTheme::default();
        let a = theme.fill("proposition");
        let b = theme.fill("proposition");
        assert_eq!(a, b);
        assert_ne!(a, Color32::TRANSPARENT);
    }

    #[test]
    fn configured_default_overrides_the_palette() {
        let settings = HashMap::from([("default".to_string(), "#aabbcc".to_string())]);
        let theme = ColorTheme::from_settings(&settings);
        assert_eq!(
            theme.fill("some-unknown-kind"),
            Color32::from_rgb(0xaa, 0xbb, 0xcc)
        );
    }

    #[test]
    fn border_is_darker_than_fill() {
        let theme = ColorTheme::default();
        let fill = theme.fill("tag");
        let border = theme.border("tag");
        assert!(border.r() < fill.r());
        assert!(border.g() < fill.g());
    }
}
