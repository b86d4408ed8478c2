// TextLamp - text line with a row of status lamps underneath
//
// Topics:
// - `/text`  `{"text": "...", "color": "#RRGGBB"}`
// - `/lamps` `{"lamps": [true, false, ...]}` all lamps at once
// - `/lamp`  `{"id": 0, "on": true}` one lamp, write only

use embedded_graphics::mono_font::ascii::FONT_4X6;
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use serde_json::{Value, json};

use display_runtime::{Canvas, Plugin, PluginError};

use super::{ScrollingText, bool_field, color_field, format_color, string_field};

const TOPIC_TEXT: &str = "/text";
const TOPIC_LAMPS: &str = "/lamps";
const TOPIC_LAMP: &str = "/lamp";

pub const MAX_LAMPS: usize = 4;

const LAMP_ON: Rgb888 = Rgb888::new(0, 200, 0);
const LAMP_OFF: Rgb888 = Rgb888::new(40, 40, 40);

#[derive(Debug)]
pub struct TextLamp {
    line: ScrollingText,
    color: Rgb888,
    lamps: [bool; MAX_LAMPS],
}

impl TextLamp {
    pub const TYPE_NAME: &'static str = "TextLamp";

    pub fn lamp(&self, id: usize) -> Option<bool> {
        self.lamps.get(id).copied()
    }

    fn draw_lamps(&self, canvas: &mut Canvas) {
        let width = canvas.width() / MAX_LAMPS as u32;
        if width < 3 || canvas.height() == 0 {
            return;
        }
        let y = canvas.height() as i32 - 1;

        for (id, on) in self.lamps.iter().enumerate() {
            let color = if *on { LAMP_ON } else { LAMP_OFF };
            // One pixel gap on each side
            let x = (id as u32 * width + 1) as i32;
            let Ok(_) = Rectangle::new(Point::new(x, y), Size::new(width - 2, 1))
                .into_styled(PrimitiveStyle::with_fill(color))
                .draw(canvas);
        }
    }

    fn set_lamps(&mut self, topic: &str, value: &Value) -> Result<(), PluginError> {
        let lamps = value
            .get("lamps")
            .and_then(Value::as_array)
            .ok_or_else(|| PluginError::invalid(topic, "lamps must be an array"))?;
        if lamps.len() > MAX_LAMPS {
            return Err(PluginError::invalid(
                topic,
                format!("at most {MAX_LAMPS} lamps"),
            ));
        }

        let states = lamps
            .iter()
            .map(|v| {
                v.as_bool()
                    .ok_or_else(|| PluginError::invalid(topic, "lamp state must be a boolean"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (lamp, on) in self.lamps.iter_mut().zip(states) {
            *lamp = on;
        }
        Ok(())
    }

    fn set_lamp(&mut self, topic: &str, value: &Value) -> Result<(), PluginError> {
        let id = value
            .get("id")
            .and_then(Value::as_u64)
            .ok_or_else(|| PluginError::invalid(topic, "id must be a number"))?;
        let on = bool_field(topic, value, "on")?
            .ok_or_else(|| PluginError::invalid(topic, "on is required"))?;

        let lamp = self
            .lamps
            .get_mut(id as usize)
            .ok_or_else(|| PluginError::invalid(topic, format!("lamp {id} does not exist")))?;
        *lamp = on;
        Ok(())
    }
}

impl Default for TextLamp {
    fn default() -> Self {
        Self {
            line: ScrollingText::new(&FONT_4X6),
            color: Rgb888::WHITE,
            lamps: [false; MAX_LAMPS],
        }
    }
}

impl Plugin for TextLamp {
    fn active(&mut self) {
        self.line.reset();
    }

    fn render(&mut self, canvas: &mut Canvas) -> Result<(), PluginError> {
        self.line.draw(canvas, 0, self.color);
        self.draw_lamps(canvas);
        Ok(())
    }

    fn topics(&self) -> Vec<String> {
        [TOPIC_TEXT, TOPIC_LAMPS, TOPIC_LAMP]
            .iter()
            .map(|t| t.to_string())
            .collect()
    }

    fn get_topic(&self, topic: &str) -> Option<Value> {
        match topic {
            TOPIC_TEXT => Some(json!({
                "text": self.line.text(),
                "color": format_color(self.color),
            })),
            TOPIC_LAMPS => Some(json!({ "lamps": self.lamps })),
            _ => None,
        }
    }

    fn set_topic(&mut self, topic: &str, value: &Value) -> Result<(), PluginError> {
        match topic {
            TOPIC_TEXT => {
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
            TOPIC_LAMPS => self.set_lamps(topic, value),
            TOPIC_LAMP => self.set_lamp(topic, value),
            _ => Err(PluginError::UnknownTopic(topic.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lamps_drawn_on_bottom_row() {
        let mut plugin = TextLamp::default();
        plugin.set_topic("/lamps", &json!({"lamps": [true, false]})).unwrap();

        let mut canvas = Canvas::new(32, 8);
        plugin.render(&mut canvas).unwrap();

        assert_eq!(canvas.pixel(0, 7), Some(Rgb888::BLACK));
        assert_eq!(canvas.pixel(1, 7), Some(LAMP_ON));
        assert_eq!(canvas.pixel(6, 7), Some(LAMP_ON));
        assert_eq!(canvas.pixel(7, 7), Some(Rgb888::BLACK));
        assert_eq!(canvas.pixel(9, 7), Some(LAMP_OFF));
        assert_eq!(canvas.pixel(25, 7), Some(LAMP_OFF));
    }

    #[test]
    fn test_single_lamp() {
        let mut plugin = TextLamp::default();
        plugin.set_topic("/lamp", &json!({"id": 3, "on": true})).unwrap();
        assert_eq!(plugin.lamp(3), Some(true));
        assert_eq!(
            plugin.get_topic("/lamps"),
            Some(json!({"lamps": [false, false, false, true]}))
        );

        assert!(plugin.set_topic("/lamp", &json!({"id": 4, "on": true})).is_err());
        assert!(plugin.set_topic("/lamp", &json!({"id": 0})).is_err());
        assert_eq!(plugin.get_topic("/lamp"), None);
    }

    #[test]
    fn test_lamps_validation() {
        let mut plugin = TextLamp::default();
        plugin.set_topic("/lamps", &json!({"lamps": [true, true]})).unwrap();

        assert!(plugin.set_topic("/lamps", &json!({"lamps": [true, true, true, true, true]})).is_err());
        assert!(plugin.set_topic("/lamps", &json!({"lamps": [false, 1]})).is_err());
        assert!(plugin.set_topic("/lamps", &json!({})).is_err());
        assert_eq!(plugin.lamp(0), Some(true));
        assert_eq!(plugin.lamp(1), Some(true));
    }

    #[test]
    fn test_text_above_lamps() {
        let mut plugin = TextLamp::default();
        plugin.set_topic("/text", &json!({"text": "OK"})).unwrap();
        assert_eq!(plugin.topics(), vec!["/text", "/lamps", "/lamp"]);

        let mut canvas = Canvas::new(32, 8);
        plugin.render(&mut canvas).unwrap();
        let text_lit = (0..32).any(|x| (0..6).any(|y| canvas.pixel(x, y) == Some(Rgb888::WHITE)));
        assert!(text_lit);
    }
}
