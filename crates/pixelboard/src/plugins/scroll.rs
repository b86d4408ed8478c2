// Scrolling text line shared by the text plugins
//
// Text that fits is centered. Longer text enters from the right edge, moves
// one pixel every `frames_per_step` renders and starts over once it has left
// on the left.

use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::text::renderer::TextRenderer;
use embedded_graphics::text::{Baseline, Text};

use display_runtime::Canvas;

/// One line of text that scrolls when it is wider than the canvas
#[derive(Clone)]
pub struct ScrollingText {
    text: String,
    font: &'static MonoFont<'static>,
    frames_per_step: u32,
    frame: u32,
    x: Option<i32>,
}

impl ScrollingText {
    pub fn new(font: &'static MonoFont<'static>) -> Self {
        Self {
            text: String::new(),
            font,
            frames_per_step: 2,
            frame: 0,
            x: None,
        }
    }

    pub fn with_frames_per_step(mut self, frames: u32) -> Self {
        self.frames_per_step = frames.max(1);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text; restarts scrolling if it changed
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.text {
            self.text = text;
            self.reset();
        }
    }

    /// Start scrolling again from the right edge
    pub fn reset(&mut self) {
        self.x = None;
        self.frame = 0;
    }

    /// Rendered width of the text in pixels
    pub fn text_width(&self) -> u32 {
        let style = MonoTextStyle::new(self.font, Rgb888::WHITE);
        style
            .measure_string(&self.text, Point::zero(), Baseline::Top)
            .bounding_box
            .size
            .width
    }

    /// Draw the line with its top edge at `y`
    pub fn draw(&mut self, canvas: &mut Canvas, y: i32, color: Rgb888) {
        if self.text.is_empty() {
            return;
        }

        let canvas_width = canvas.width() as i32;
        let text_width = self.text_width() as i32;

        let x = if text_width <= canvas_width {
            (canvas_width - text_width) / 2
        } else {
            self.step(canvas_width, text_width)
        };

        let style = MonoTextStyle::new(self.font, color);
        let Ok(_) = Text::with_baseline(&self.text, Point::new(x, y), style, Baseline::Top)
            .draw(canvas);
    }

    fn step(&mut self, canvas_width: i32, text_width: i32) -> i32 {
        let x = *self.x.get_or_insert(canvas_width);

        self.frame += 1;
        if self.frame >= self.frames_per_step {
            self.frame = 0;
            let next = x - 1;
            self.x = Some(if next < -text_width { canvas_width } else { next });
        }
        x
    }
}

impl std::fmt::Debug for ScrollingText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollingText")
            .field("text", &self.text)
            .field("frames_per_step", &self.frames_per_step)
            .field("x", &self.x)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::mono_font::ascii::FONT_5X7;

    fn lit_columns(canvas: &Canvas) -> Vec<u32> {
        (0..canvas.width())
            .filter(|x| (0..canvas.height()).any(|y| canvas.pixel(*x, y) != Some(Rgb888::BLACK)))
            .collect()
    }

    #[test]
    fn test_short_text_is_centered() {
        let mut line = ScrollingText::new(&FONT_5X7);
        line.set_text("AB");
        assert_eq!(line.text_width(), 10);

        let mut canvas = Canvas::new(32, 8);
        line.draw(&mut canvas, 0, Rgb888::WHITE);

        let columns = lit_columns(&canvas);
        assert!(!columns.is_empty());
        assert!(*columns.first().unwrap() >= 11);
        assert!(*columns.last().unwrap() <= 20);
    }

    #[test]
    fn test_long_text_scrolls_in_from_the_right() {
        let mut line = ScrollingText::new(&FONT_5X7).with_frames_per_step(1);
        line.set_text("HELLO WORLD, THIS IS LONG");

        let mut canvas = Canvas::new(32, 8);
        line.draw(&mut canvas, 0, Rgb888::WHITE);
        assert!(canvas.is_filled_with(Rgb888::BLACK));

        for _ in 0..10 {
            canvas.fill(Rgb888::BLACK);
            line.draw(&mut canvas, 0, Rgb888::WHITE);
        }
        assert!(!canvas.is_filled_with(Rgb888::BLACK));
    }

    #[test]
    fn test_scroll_wraps_around() {
        let mut line = ScrollingText::new(&FONT_5X7).with_frames_per_step(1);
        line.set_text("0123456789");
        let width = line.text_width() as i32;

        let mut canvas = Canvas::new(16, 8);
        let first = line.step(16, width);
        assert_eq!(first, 16);

        // Full pass: from the right edge until fully out on the left
        for _ in 0..(16 + width) {
            line.step(16, width);
        }
        assert_eq!(line.step(16, width), 16);

        line.draw(&mut canvas, 0, Rgb888::WHITE);
    }

    #[test]
    fn test_set_text_resets_position() {
        let mut line = ScrollingText::new(&FONT_5X7).with_frames_per_step(1);
        line.set_text("0123456789");
        let width = line.text_width() as i32;
        line.step(16, width);
        line.step(16, width);

        line.set_text("0123456789");
        assert_eq!(line.step(16, width), 14);

        line.set_text("9876543210");
        assert_eq!(line.step(16, width), 16);
    }
}
