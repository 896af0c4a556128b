// SPDX-License-Identifier: GPL-3.0-only

//! Terminal rendering of the capture screen
//!
//! Pixels are drawn with the upper half block (`▀`): the foreground colors
//! the top pixel of a cell and the background the bottom one, doubling the
//! vertical resolution.
//!
//! ```text
//!  ⚡ AUTO                      ⟲ Flip
//!        ┌──────────────────┐
//!        │                  │
//!        │      photo       │  78 % of the frame
//!        │                  │
//!        │    2024/03/05    │  caption strip
//!        └──────────────────┘
//!    ▣ Gallery   ( ◉ )   ⋯ More
//!  status line
//! ```

use super::state::{NoticeKind, ViewKind};
use super::CaptureScreen;
use crate::backends::camera::format_converters::sample_pixel_rgb;
use crate::backends::camera::types::{CameraFrame, Facing};
use crate::constants::{self, polaroid};
use image::RgbImage;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Widget};

const PAPER: Color = Color::Rgb(245, 242, 235);
const INK: Color = Color::Rgb(40, 40, 40);
const ACCENT: Color = Color::Rgb(255, 204, 0);

/// Where the parts of the instant-film frame go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    pub outer: Rect,
    pub photo: Rect,
    pub caption: Rect,
}

/// Fit a portrait 3:4 frame, 80 % of the width, into `area`.
///
/// Terminal cells are about twice as tall as wide, so one row holds two
/// pixels of height.
pub fn frame_geometry(area: Rect) -> FrameGeometry {
    let mut width = (area.width as f32 * polaroid::FRAME_WIDTH_RATIO).floor();
    let mut height = (width / polaroid::FRAME_ASPECT / 2.0).round();
    if height > area.height as f32 {
        height = area.height as f32;
        width = (height * 2.0 * polaroid::FRAME_ASPECT).round().min(area.width as f32);
    }
    let (width, height) = (width as u16, height as u16);

    let outer = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    let photo_rows = (height as f32 * polaroid::PHOTO_HEIGHT_RATIO).round() as u16;
    let side = if width > 4 { 1 } else { 0 };
    let top = if height > 4 { 1 } else { 0 };

    FrameGeometry {
        outer,
        photo: Rect {
            x: outer.x + side,
            y: outer.y + top,
            width: width.saturating_sub(2 * side),
            height: photo_rows.saturating_sub(top),
        },
        caption: Rect {
            x: outer.x,
            y: outer.y + photo_rows,
            width,
            height: height - photo_rows.min(height),
        },
    }
}

/// Pixels shown inside the frame
#[derive(Clone, Copy)]
pub enum PhotoSource<'a> {
    Preview(&'a CameraFrame),
    Captured(&'a RgbImage),
}

impl PhotoSource<'_> {
    fn dimensions(&self) -> (u32, u32) {
        match self {
            PhotoSource::Preview(frame) => (frame.width, frame.height),
            PhotoSource::Captured(image) => image.dimensions(),
        }
    }

    fn sample(&self, x: u32, y: u32) -> Color {
        let (r, g, b) = match self {
            PhotoSource::Preview(frame) => sample_pixel_rgb(frame, x, y),
            PhotoSource::Captured(image) => {
                let x = x.min(image.width().saturating_sub(1));
                let y = y.min(image.height().saturating_sub(1));
                let p = image.get_pixel(x, y).0;
                (p[0], p[1], p[2])
            }
        };
        Color::Rgb(r, g, b)
    }
}

/// Instant-film frame: photo on top, caption strip below
pub struct PolaroidFrame<'a> {
    pub source: Option<PhotoSource<'a>>,
    pub caption: &'a str,
    /// Shown in the photo area when there is nothing to draw
    pub placeholder: &'a str,
    pub mirror: bool,
}

impl Widget for PolaroidFrame<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let geometry = frame_geometry(area);
        if geometry.outer.is_empty() {
            return;
        }

        buf.set_style(geometry.outer, Style::default().bg(PAPER));
        buf.set_style(geometry.photo, Style::default().bg(Color::Black));

        match self.source {
            Some(source) => render_pixels(source, self.mirror, geometry.photo, buf),
            None => {
                let y = geometry.photo.y + geometry.photo.height / 2;
                let line = Rect { y, height: 1, ..geometry.photo };
                Paragraph::new(self.placeholder)
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(Color::Gray).bg(Color::Black))
                    .render(line, buf);
            }
        }

        if !geometry.caption.is_empty() {
            let y = geometry.caption.y + geometry.caption.height / 2;
            let line = Rect { y, height: 1, ..geometry.caption };
            Paragraph::new(self.caption)
                .alignment(Alignment::Center)
                .style(Style::default().fg(INK).bg(PAPER).add_modifier(Modifier::ITALIC))
                .render(line, buf);
        }
    }
}

/// Cover `area` with the source, cropping the overflow around the center
fn render_pixels(source: PhotoSource<'_>, mirror: bool, area: Rect, buf: &mut Buffer) {
    let (src_w, src_h) = source.dimensions();
    if src_w == 0 || src_h == 0 || area.is_empty() {
        return;
    }

    let dst_w = area.width as f64;
    let dst_h = area.height as f64 * 2.0;
    let scale = (src_w as f64 / dst_w).min(src_h as f64 / dst_h);
    let x0 = (src_w as f64 - dst_w * scale) / 2.0;
    let y0 = (src_h as f64 - dst_h * scale) / 2.0;

    for ty in 0..area.height {
        for tx in 0..area.width {
            let column = if mirror { area.width - 1 - tx } else { tx };
            let src_x = (x0 + column as f64 * scale) as u32;
            let src_top = (y0 + ty as f64 * 2.0 * scale) as u32;
            let src_bottom = (y0 + (ty as f64 * 2.0 + 1.0) * scale) as u32;

            if let Some(cell) = buf.cell_mut((area.x + tx, area.y + ty)) {
                cell.set_char('▀');
                cell.set_fg(source.sample(src_x, src_top));
                cell.set_bg(source.sample(src_x, src_bottom));
            }
        }
    }
}

/// Draw the whole screen
pub fn draw(frame: &mut Frame, screen: &CaptureScreen, mirror_preview: bool) {
    let [top, body, bottom, status] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    match screen.view_kind() {
        ViewKind::PermissionPending => {
            let y = body.y + body.height / 2;
            frame.render_widget(
                Paragraph::new("Requesting permissions…").alignment(Alignment::Center),
                Rect { y, height: 1, ..body },
            );
        }
        ViewKind::Live => {
            frame.render_widget(live_top_bar(screen), top);

            let placeholder = if screen.permissions().camera.is_granted() {
                "Waiting for camera…"
            } else {
                "No camera access (press a)"
            };
            frame.render_widget(
                PolaroidFrame {
                    source: screen.preview_frame().map(PhotoSource::Preview),
                    caption: screen.caption(),
                    placeholder,
                    mirror: mirror_preview && screen.facing() == Facing::Front,
                },
                body,
            );

            frame.render_widget(live_bottom_bar(screen), bottom);
        }
        ViewKind::Review => {
            frame.render_widget(
                PolaroidFrame {
                    source: screen
                        .captured_photo()
                        .map(|photo| PhotoSource::Captured(photo.image())),
                    caption: screen.caption(),
                    placeholder: "",
                    mirror: false,
                },
                body,
            );
            frame.render_widget(review_bottom_bar(screen), bottom);
        }
    }

    frame.render_widget(status_line(screen), status);

    if screen.show_help() {
        render_help(frame);
    }
}

fn key(label: &str) -> Span<'_> {
    Span::styled(label, Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
}

fn live_top_bar(screen: &CaptureScreen) -> Paragraph<'static> {
    let line = Line::from(vec![
        Span::raw(" ⚡ "),
        Span::styled(
            screen.flash().label(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        key("[f]"),
        Span::raw("    ⟲ Flip "),
        key("[c]"),
        Span::raw(format!("  ({})", screen.facing())),
    ]);
    Paragraph::new(line)
}

fn live_bottom_bar(screen: &CaptureScreen) -> Paragraph<'static> {
    let shutter = if screen.is_capturing() {
        Span::styled("( … )", Style::default().fg(Color::Gray))
    } else {
        Span::styled("( ◉ )", Style::default().add_modifier(Modifier::BOLD))
    };
    let line = Line::from(vec![
        Span::raw("▣ Gallery "),
        key("[g]"),
        Span::raw("     "),
        shutter,
        Span::raw(" "),
        key("[Space]"),
        Span::raw("     ⋯ More "),
        key("[m]"),
    ]);
    Paragraph::new(line).alignment(Alignment::Center)
}

fn review_bottom_bar(screen: &CaptureScreen) -> Paragraph<'static> {
    let save = if screen.is_saving() {
        Span::styled("Saving…", Style::default().fg(Color::Gray))
    } else if !screen.permissions().library.is_granted() {
        Span::styled("Save unavailable", Style::default().fg(Color::Gray))
    } else {
        Span::styled("Save", Style::default().add_modifier(Modifier::BOLD))
    };
    let line = Line::from(vec![
        Span::styled("Retake", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" "),
        key("[r]"),
        Span::raw("          "),
        save,
        Span::raw(" "),
        key("[s]"),
    ]);
    Paragraph::new(line).alignment(Alignment::Center)
}

fn status_line(screen: &CaptureScreen) -> Paragraph<'static> {
    let base = Style::default().fg(Color::White).bg(Color::DarkGray);
    match screen.notice() {
        Some(notice) => {
            let style = match notice.kind {
                NoticeKind::Info => base,
                NoticeKind::Error => base.fg(Color::LightRed),
            };
            Paragraph::new(format!(" {}", notice.text)).style(style)
        }
        None => Paragraph::new(format!(
            " Polaroid {} | h: help | q: quit",
            constants::app_version()
        ))
        .style(base),
    }
}

const HELP: [(&str, &str); 9] = [
    ("Space / Enter", "Take photo"),
    ("f", "Cycle flash (off, on, auto)"),
    ("c", "Flip camera"),
    ("r", "Retake"),
    ("s", "Save to library"),
    ("a", "Ask for camera access"),
    ("g / m", "Gallery / more (not available)"),
    ("h", "Toggle help"),
    ("q / Ctrl+C", "Quit"),
];

fn render_help(frame: &mut Frame) {
    let area = frame.area();
    let width = 46.min(area.width);
    let height = (HELP.len() as u16 + 2).min(area.height);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    let lines: Vec<Line> = HELP
        .iter()
        .map(|(keys, action)| {
            Line::from(vec![
                Span::styled(format!(" {:<14}", keys), Style::default().fg(ACCENT)),
                Span::raw(*action),
            ])
        })
        .collect();

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines).block(Block::bordered().title(" Keys ")),
        popup,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_is_portrait_and_centered() {
        let area = Rect::new(0, 0, 100, 60);
        let g = frame_geometry(area);
        assert_eq!(g.outer.width, 80);
        // 80 cells wide, 3:4, two pixels per row
        assert_eq!(g.outer.height, 53);
        assert_eq!(g.outer.x, 10);
        assert!(g.photo.height > g.caption.height);
        assert_eq!(g.caption.y + g.caption.height, g.outer.y + g.outer.height);
    }

    #[test]
    fn short_terminals_shrink_the_frame() {
        let g = frame_geometry(Rect::new(0, 0, 100, 20));
        assert_eq!(g.outer.height, 20);
        assert_eq!(g.outer.width, 30);
    }

    #[test]
    fn tiny_areas_do_not_panic() {
        let g = frame_geometry(Rect::new(0, 0, 1, 1));
        assert!(g.photo.width <= g.outer.width);
        let mut buf = Buffer::empty(Rect::new(0, 0, 1, 1));
        PolaroidFrame {
            source: None,
            caption: "x",
            placeholder: "y",
            mirror: false,
        }
        .render(Rect::new(0, 0, 1, 1), &mut buf);
    }

    #[test]
    fn pixels_fill_the_photo_area() {
        let image = RgbImage::from_pixel(30, 40, image::Rgb([200, 0, 0]));
        let area = Rect::new(0, 0, 20, 12);
        let mut buf = Buffer::empty(area);
        PolaroidFrame {
            source: Some(PhotoSource::Captured(&image)),
            caption: "2024/03/05",
            placeholder: "",
            mirror: false,
        }
        .render(area, &mut buf);

        let g = frame_geometry(area);
        let cell = &buf[(g.photo.x, g.photo.y)];
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(200, 0, 0));
    }
}
