//! SVG preview image for a frame state.

use truths_core::GAME_TITLE;
use truths_types::PreviewCard;

use crate::frame_html::escape_html;

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 630;
const BACKGROUND_COLOR: &str = "#1e293b";
const TEXT_COLOR: &str = "#f8fafc";
const ACCENT_COLOR: &str = "#3b82f6";

const LINES_TOP: u32 = 280;
const LINE_SPACING: u32 = 60;
const MAX_LINES: usize = 5;

pub fn render_preview_svg(card: &PreviewCard) -> String {
    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
        w = WIDTH,
        h = HEIGHT
    );
    svg.push_str(&format!(
        "  <rect width=\"{}\" height=\"{}\" fill=\"{}\" />\n",
        WIDTH, HEIGHT, BACKGROUND_COLOR
    ));
    svg.push_str(&format!(
        "  <rect x=\"20\" y=\"20\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"10\" />\n",
        WIDTH - 40,
        HEIGHT - 40,
        ACCENT_COLOR
    ));
    svg.push_str(&text(100, 60, "bold", GAME_TITLE));

    if card.headline != GAME_TITLE {
        svg.push_str(&text(200, 40, "normal", &card.headline));
    }

    for (index, line) in card.lines.iter().take(MAX_LINES).enumerate() {
        let y = LINES_TOP + index as u32 * LINE_SPACING;
        svg.push_str(&text(y, 30, "normal", line));
    }

    svg.push_str("</svg>\n");
    svg
}

fn text(y: u32, size: u32, weight: &str, content: &str) -> String {
    format!(
        "  <text x=\"{}\" y=\"{}\" fill=\"{}\" font-family=\"Arial, sans-serif\" font-size=\"{}\" font-weight=\"{}\" text-anchor=\"middle\">{}</text>\n",
        WIDTH / 2,
        y,
        TEXT_COLOR,
        size,
        weight,
        escape_html(content)
    )
}
