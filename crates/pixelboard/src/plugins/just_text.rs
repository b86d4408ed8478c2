// JustText - a single line of user supplied text

use embedded_graphics::mono_font::ascii::FONT_5X7;
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use serde_json::{Value, json};

use display_runtime::{Canvas, Plugin, PluginError};

use super::{ScrollingText, color_field, format_color, string_field};

const TOPIC_TEXT: &str = "/text";

/// Shows one line of text, scrolling it when it does not fit
#[derive(Debug)]
pub struct JustText {
    line: ScrollingText,
    color: Rgb888,
}

impl JustText {
    pub const TYPE_NAME: &'static str = "JustText";
}

impl Default for JustText {
    fn default() -> Self {
        Self {
            line: ScrollingText::new(&FONT_5X7),
            color: Rgb888::WHITE,
        }
    }
}

impl Plugin for JustText {
    fn active(&mut self) {
        self.line.reset();
    }

    fn render(&mut self, canvas: &mut Canvas) -> Result<(), PluginError> {
        let y = (canvas.height() as i32 - 7) / 2;
        self.line.draw(canvas, y.max(0), self.color);
        Ok(())
    }

    fn topics(&self) -> Vec<String> {
        vec![TOPIC_TEXT.to_string()]
    }

    fn get_topic(&self, topic: &str) -> Option<Value> {
        match topic {
            TOPIC_TEXT => Some(json!({
                "text": self.line.text(),
                "color": format_color(self.color),
            })),
            _ => None,
        }
    }

    fn set_topic(&mut self, topic: &str, value: &Value) -> Result<(), PluginError> {
        if topic != TOPIC_TEXT {
            return Err(PluginError::UnknownTopic(topic.to_string()));
        }

        // Validate everything before applying anything
        let text = string_field(topic, value, "text")?;
        let color = color_field(topic, value)?;

        if let Some(text) = text {
            self.line.set_text(text);
        }
        if let Some(color) = color {
            self.color = color;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_renders_black() {
        let mut plugin = JustText::default();
        let mut canvas = Canvas::new(32, 8);
        plugin.render(&mut canvas).unwrap();
        assert!(canvas.is_filled_with(Rgb888::BLACK));
    }

    #[test]
    fn test_set_text_and_color() {
        let mut plugin = JustText::default();
        plugin
            .set_topic("/text", &json!({"text": "Hi", "color": "#FF0000"}))
            .unwrap();

        assert_eq!(
            plugin.get_topic("/text"),
            Some(json!({"text": "Hi", "color": "#FF0000"}))
        );

        let mut canvas = Canvas::new(32, 8);
        plugin.render(&mut canvas).unwrap();
        assert!(canvas.pixels().iter().any(|p| *p == Rgb888::RED));
        assert!(canvas.pixels().iter().all(|p| *p == Rgb888::RED || *p == Rgb888::BLACK));
    }

    #[test]
    fn test_invalid_values_leave_state_untouched() {
        let mut plugin = JustText::default();
        plugin.set_topic("/text", &json!({"text": "keep"})).unwrap();

        let result = plugin.set_topic("/text", &json!({"text": "new", "color": "red"}));
        assert!(matches!(result, Err(PluginError::InvalidValue { .. })));
        assert!(plugin.set_topic("/text", &json!({"text": 5})).is_err());
        assert_eq!(plugin.get_topic("/text").unwrap()["text"], "keep");
    }

    #[test]
    fn test_unknown_topic() {
        let mut plugin = JustText::default();
        assert_eq!(plugin.topics(), vec!["/text"]);
        assert_eq!(plugin.get_topic("/nope"), None);
        assert_eq!(
            plugin.set_topic("/nope", &json!({})),
            Err(PluginError::UnknownTopic("/nope".to_string()))
        );
    }
}
