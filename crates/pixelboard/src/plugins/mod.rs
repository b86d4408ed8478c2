//! Built-in Content Plugins
//!
//! Plugins shipped with the binary. All of them are registered at startup by
//! [`register_builtin`] and can then be installed into slots by type name.

mod clock;
mod just_text;
mod scroll;
mod text_lamp;

pub use clock::Clock;
pub use just_text::JustText;
pub use scroll::ScrollingText;
pub use text_lamp::TextLamp;

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use serde_json::Value;

use display_runtime::{PluginError, PluginRegistry};

use crate::config::PluginsConfig;

/// Register every built-in plugin type
pub fn register_builtin(
    registry: &mut PluginRegistry,
    config: &PluginsConfig,
) -> display_runtime::Result<()> {
    registry.register_type(JustText::TYPE_NAME, |_uid| Box::new(JustText::default()))?;

    let min_item_duration = config.min_item_duration();
    registry.register_type(Clock::TYPE_NAME, move |_uid| {
        Box::new(Clock::new(min_item_duration))
    })?;

    registry.register_type(TextLamp::TYPE_NAME, |_uid| Box::new(TextLamp::default()))?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Topic helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Parse `#RRGGBB`
pub fn parse_color(value: &str) -> Option<Rgb888> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let rgb = u32::from_str_radix(hex, 16).ok()?;
    Some(Rgb888::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8))
}

/// Format as `#RRGGBB`
pub fn format_color(color: Rgb888) -> String {
    format!("#{:02X}{:02X}{:02X}", color.r(), color.g(), color.b())
}

fn string_field<'a>(topic: &str, value: &'a Value, key: &str) -> Result<Option<&'a str>, PluginError> {
    match value.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(PluginError::invalid(topic, format!("{key} must be a string"))),
    }
}

fn bool_field(topic: &str, value: &Value, key: &str) -> Result<Option<bool>, PluginError> {
    match value.get(key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(PluginError::invalid(topic, format!("{key} must be a boolean"))),
    }
}

fn color_field(topic: &str, value: &Value) -> Result<Option<Rgb888>, PluginError> {
    string_field(topic, value, "color")?
        .map(|s| parse_color(s).ok_or_else(|| PluginError::invalid(topic, "color must be #RRGGBB")))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_builtin() {
        let mut registry = PluginRegistry::new();
        register_builtin(&mut registry, &PluginsConfig::default()).unwrap();

        assert_eq!(registry.type_names(), vec!["Clock", "JustText", "TextLamp"]);
        assert!(registry.create("Clock", 1).is_ok());
        assert!(register_builtin(&mut registry, &PluginsConfig::default()).is_err());
    }

    #[test]
    fn test_colors() {
        assert_eq!(parse_color("#FF8000"), Some(Rgb888::new(255, 128, 0)));
        assert_eq!(parse_color("#ff8000"), Some(Rgb888::new(255, 128, 0)));
        assert_eq!(parse_color("FF8000"), None);
        assert_eq!(parse_color("#FF80"), None);
        assert_eq!(parse_color("#+FFFFF"), None);
        assert_eq!(parse_color("#-00001"), None);
        assert_eq!(format_color(Rgb888::new(1, 2, 255)), "#0102FF");
    }
}
