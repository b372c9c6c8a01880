//! Frame document markup.

use truths_types::FrameContent;

pub const INPUT_PLACEHOLDER: &str = "Enter your statements";

/// Escapes text for use inside HTML attribute values and element bodies.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn meta(property: &str, content: &str) -> String {
    format!(
        "    <meta property=\"{}\" content=\"{}\" />\n",
        property,
        escape_html(content)
    )
}

pub fn render_frame_document(content: &FrameContent) -> String {
    let mut head = String::new();
    head.push_str(&meta("fc:frame", "vNext"));
    head.push_str(&meta("fc:frame:image", &content.image_url));
    head.push_str(&meta("fc:frame:post_url", &content.post_url));
    head.push_str(&meta("fc:frame:state", &content.state));
    head.push_str(&meta("og:title", &content.title));
    head.push_str(&meta("og:description", &content.description));
    head.push_str(&meta("og:image", &content.image_url));

    for (index, label) in content.buttons.iter().enumerate() {
        head.push_str(&meta(&format!("fc:frame:button:{}", index + 1), label));
    }
    if content.accepts_input {
        head.push_str(&meta("fc:frame:input:text", INPUT_PLACEHOLDER));
    }

    format!(
        "<!DOCTYPE html>\n<html>\n  <head>\n    <title>{title}</title>\n{head}  </head>\n  <body>\n    <h1>{title}</h1>\n    <p>{description}</p>\n  </body>\n</html>\n",
        title = escape_html(&content.title),
        head = head,
        description = escape_html(&content.description),
    )
}
