// Clock - local time, optionally alternating with the date
//
// Time and date are sub-items sharing the slot's view duration.

use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use embedded_graphics::mono_font::ascii::FONT_5X7;
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use serde_json::{Value, json};

use display_runtime::{Canvas, Plugin, PluginError, SubItemRotation};

use super::{ScrollingText, bool_field, color_field, format_color};

const TOPIC_CLOCK: &str = "/clock";

const ITEM_TIME: usize = 0;
const ITEM_DATE: usize = 1;
const ITEM_COUNT: usize = 2;

#[derive(Debug)]
pub struct Clock {
    rotation: SubItemRotation,
    line: ScrollingText,
    use_24h: bool,
    color: Rgb888,
}

impl Clock {
    pub const TYPE_NAME: &'static str = "Clock";

    pub fn new(min_item_duration: Duration) -> Self {
        Self {
            rotation: SubItemRotation::new(ITEM_COUNT, min_item_duration),
            line: ScrollingText::new(&FONT_5X7),
            use_24h: true,
            color: Rgb888::WHITE,
        }
    }

    fn show_date(&self) -> bool {
        self.rotation.is_item_enabled(ITEM_DATE)
    }

    fn format_time(&self, now: &NaiveDateTime) -> String {
        if self.use_24h {
            now.format("%H:%M").to_string()
        } else {
            now.format("%I:%M").to_string()
        }
    }

    fn format_date(now: &NaiveDateTime) -> String {
        now.format("%d.%m.").to_string()
    }

    fn render_at(&mut self, canvas: &mut Canvas, now: NaiveDateTime) {
        let text = match self.rotation.tick() {
            Some(ITEM_DATE) => Self::format_date(&now),
            _ => self.format_time(&now),
        };
        self.line.set_text(text);

        let y = (canvas.height() as i32 - 7) / 2;
        self.line.draw(canvas, y.max(0), self.color);
    }
}

impl Plugin for Clock {
    fn active(&mut self) {
        self.rotation.reset();
        self.line.reset();
    }

    fn set_view_duration(&mut self, duration: Option<Duration>) {
        self.rotation.set_view_duration(duration);
    }

    fn render(&mut self, canvas: &mut Canvas) -> Result<(), PluginError> {
        self.render_at(canvas, Local::now().naive_local());
        Ok(())
    }

    fn topics(&self) -> Vec<String> {
        vec![TOPIC_CLOCK.to_string()]
    }

    fn get_topic(&self, topic: &str) -> Option<Value> {
        (topic == TOPIC_CLOCK).then(|| {
            json!({
                "use_24h": self.use_24h,
                "show_date": self.show_date(),
                "color": format_color(self.color),
            })
        })
    }

    fn set_topic(&mut self, topic: &str, value: &Value) -> Result<(), PluginError> {
        if topic != TOPIC_CLOCK {
            return Err(PluginError::UnknownTopic(topic.to_string()));
        }

        let use_24h = bool_field(topic, value, "use_24h")?;
        let show_date = bool_field(topic, value, "show_date")?;
        let color = color_field(topic, value)?;

        if let Some(use_24h) = use_24h {
            self.use_24h = use_24h;
        }
        if let Some(show_date) = show_date {
            self.rotation.set_item_enabled(ITEM_DATE, show_date);
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
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 7)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_time_formats() {
        let mut clock = Clock::new(Duration::from_secs(2));
        assert_eq!(clock.format_time(&at(15, 4)), "15:04");

        clock.set_topic("/clock", &json!({"use_24h": false})).unwrap();
        assert_eq!(clock.format_time(&at(15, 4)), "03:04");
        assert_eq!(Clock::format_date(&at(15, 4)), "07.03.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_alternates_time_and_date() {
        let mut clock = Clock::new(Duration::from_secs(2));
        clock.set_view_duration(Some(Duration::from_secs(10)));
        clock.active();

        let mut canvas = Canvas::new(32, 8);
        clock.render_at(&mut canvas, at(9, 30));
        assert_eq!(clock.line.text(), "09:30");
        assert!(!canvas.is_filled_with(Rgb888::BLACK));

        tokio::time::advance(Duration::from_secs(5)).await;
        clock.render_at(&mut canvas, at(9, 30));
        assert_eq!(clock.line.text(), "07.03.");

        tokio::time::advance(Duration::from_secs(5)).await;
        clock.render_at(&mut canvas, at(9, 30));
        assert_eq!(clock.line.text(), "09:30");
    }

    #[tokio::test(start_paused = true)]
    async fn test_date_can_be_hidden() {
        let mut clock = Clock::new(Duration::from_secs(2));
        clock.set_topic("/clock", &json!({"show_date": false})).unwrap();
        clock.set_view_duration(Some(Duration::from_secs(10)));

        let mut canvas = Canvas::new(32, 8);
        for _ in 0..4 {
            clock.render_at(&mut canvas, at(12, 0));
            assert_eq!(clock.line.text(), "12:00");
            tokio::time::advance(Duration::from_secs(6)).await;
        }

        assert_eq!(
            clock.get_topic("/clock"),
            Some(json!({"use_24h": true, "show_date": false, "color": "#FFFFFF"}))
        );
    }

    #[test]
    fn test_invalid_topic_values() {
        let mut clock = Clock::new(Duration::from_secs(2));
        assert!(clock.set_topic("/clock", &json!({"use_24h": "yes"})).is_err());
        assert!(clock.set_topic("/time", &json!({})).is_err());
        assert!(clock.get_topic("/time").is_none());
    }
}
