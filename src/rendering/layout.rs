//! Block layout for captured subtrees
//!
//! Every block-level element becomes one box, stacked top to bottom. The
//! viewport width drives line wrapping; the viewport height never clips, so
//! the resulting `scroll_height` covers all content.

use crate::{Error, Result, Viewport};
use scraper::{ElementRef, Node};

/// Glyph cell size at scale 1, in CSS pixels
pub const GLYPH_WIDTH: u32 = 8;
pub const GLYPH_HEIGHT: u32 = 8;
const LINE_GAP: u32 = 2;

/// Gap between the surface edge and its content
pub const SURFACE_MARGIN: u32 = 8;
const LIST_INDENT: u32 = 16;
const DEFAULT_IMAGE_WIDTH: u32 = 150;
const DEFAULT_IMAGE_HEIGHT: u32 = 100;

/// Largest scroll extent on either axis, in CSS pixels. Box coordinates stay
/// well inside `i32` below it.
pub const MAX_EXTENT: u32 = 1 << 30;

#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxModel {
    pub margin: u32,
    pub border: u32,
    pub padding: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBox {
    pub rect: Rect,
    pub box_model: BoxModel,
}

impl LayoutBox {
    /// Top-left corner of the content area
    pub fn content_origin(&self) -> (i32, i32) {
        let inset = (self.box_model.border + self.box_model.padding) as i32;
        (self.rect.x + inset, self.rect.y + inset)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementType {
    Heading(u8),
    Paragraph,
    ListItem,
    Preformatted,
    Image { src: String },
    Rule,
}

/// A laid-out box with its wrapped text (one line per `\n`)
#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub lb: LayoutBox,
    pub text: String,
    pub elem_type: ElementType,
    pub scale: u32,
}

/// Layout of a whole subtree, sized to its full scrollable extent
#[derive(Debug, Clone)]
pub struct Layout {
    pub nodes: Vec<LayoutNode>,
    pub scroll_width: u32,
    pub scroll_height: u32,
}

pub fn line_height(scale: u32) -> u32 {
    GLYPH_HEIGHT * scale + LINE_GAP
}

#[derive(Debug, Clone)]
enum Block {
    Text { kind: ElementType, text: String },
    Image { src: String, width: u32, height: u32 },
    Rule,
}

/// Lay out the subtree rooted at `root`.
///
/// Fails with `CaptureError` when the subtree holds content the rasterizer
/// cannot paint (embedded frames, media, plugins) or is wider than
/// [`MAX_EXTENT`], and with `ContentTooLarge` when it is taller.
pub fn layout_subtree(root: ElementRef<'_>, viewport: Viewport) -> Result<Layout> {
    let mut blocks = Vec::new();
    collect_element(root, &mut blocks)?;
    layout_blocks(&blocks, viewport)
}

fn collect_children(el: ElementRef<'_>, out: &mut Vec<Block>) -> Result<()> {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => {
                let text = collapse_whitespace(text);
                if !text.is_empty() {
                    out.push(Block::Text {
                        kind: ElementType::Paragraph,
                        text,
                    });
                }
            }
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_element(child_el, out)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn collect_element(el: ElementRef<'_>, out: &mut Vec<Block>) -> Result<()> {
    let name = el.value().name();
    match name {
        "head" | "title" | "script" | "style" | "template" | "noscript" | "meta" | "link" | "br" => {}
        "iframe" | "video" | "object" | "embed" => {
            return Err(Error::CaptureError(format!(
                "unsupported content: <{}> cannot be rasterized",
                name
            )));
        }
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = name.as_bytes()[1] - b'0';
            push_text(out, ElementType::Heading(level), collapse_whitespace(&element_text(el)));
        }
        "p" | "blockquote" | "dt" | "dd" | "figcaption" | "caption" | "td" | "th" | "label"
        | "button" => {
            push_text(out, ElementType::Paragraph, collapse_whitespace(&element_text(el)));
        }
        "li" => push_text(out, ElementType::ListItem, collapse_whitespace(&element_text(el))),
        "pre" => {
            let text = element_text(el);
            push_text(out, ElementType::Preformatted, text.trim_matches('\n').to_string());
        }
        "img" => {
            let dim = |attr: &str, default: u32| {
                el.value()
                    .attr(attr)
                    .and_then(|v| v.trim().trim_end_matches("px").parse::<u32>().ok())
                    .unwrap_or(default)
            };
            out.push(Block::Image {
                src: el.value().attr("src").unwrap_or_default().to_string(),
                width: dim("width", DEFAULT_IMAGE_WIDTH),
                height: dim("height", DEFAULT_IMAGE_HEIGHT),
            });
        }
        "hr" => out.push(Block::Rule),
        _ => collect_children(el, out)?,
    }
    Ok(())
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>()
}

fn push_text(out: &mut Vec<Block>, kind: ElementType, text: String) {
    if !text.trim().is_empty() {
        out.push(Block::Text { kind, text });
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Greedy word wrap at `chars_per_line`; words longer than a line overflow.
fn wrap_text(text: &str, chars_per_line: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        let cur_len = cur.chars().count();
        if cur_len + word.chars().count() + 1 > chars_per_line && !cur.is_empty() {
            lines.push(std::mem::take(&mut cur));
        }
        if !cur.is_empty() {
            cur.push(' ');
        }
        cur.push_str(word);
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines
}

fn text_node(kind: &ElementType, text: &str, top: i32, page_width: u32) -> LayoutNode {
    let (scale, padding, margin, indent) = match kind {
        ElementType::Heading(1) | ElementType::Heading(2) => (2, 8, 8, 0),
        ElementType::Heading(_) => (1, 8, 8, 0),
        ElementType::ListItem => (1, 6, 6, LIST_INDENT),
        _ => (1, 6, 6, 0),
    };
    let x = SURFACE_MARGIN + indent;
    let box_width = page_width.saturating_sub(x + SURFACE_MARGIN);
    let content_w = box_width.saturating_sub(padding * 2);

    let lines = if *kind == ElementType::Preformatted {
        text.lines().map(str::to_string).collect::<Vec<_>>()
    } else {
        let chars_per_line = (content_w / (GLYPH_WIDTH * scale)).max(1) as usize;
        wrap_text(text, chars_per_line)
    };
    let widest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let widest = u32::try_from(widest).unwrap_or(u32::MAX);
    let line_count = u32::try_from(lines.len()).unwrap_or(u32::MAX).max(1);
    let text_width = widest
        .saturating_mul(GLYPH_WIDTH * scale)
        .saturating_add(padding * 2);

    LayoutNode {
        lb: LayoutBox {
            rect: Rect {
                x: x as i32,
                y: top,
                width: box_width.max(text_width),
                height: line_count
                    .saturating_mul(line_height(scale))
                    .saturating_add(padding * 2),
            },
            box_model: BoxModel {
                margin,
                border: 0,
                padding,
            },
        },
        text: lines.join("\n"),
        elem_type: kind.clone(),
        scale,
    }
}

/// Convert a vertical position to a box coordinate, failing past [`MAX_EXTENT`].
fn coord(y: u64) -> Result<i32> {
    if y > u64::from(MAX_EXTENT) {
        return Err(Error::ContentTooLarge {
            height: y,
            max: MAX_EXTENT,
        });
    }
    // MAX_EXTENT < i32::MAX
    Ok(y as i32)
}

fn layout_blocks(blocks: &[Block], viewport: Viewport) -> Result<Layout> {
    let page_width = viewport.width.clamp(SURFACE_MARGIN * 4, MAX_EXTENT);
    let mut y = u64::from(SURFACE_MARGIN);
    let mut right = u64::from(page_width);
    let mut nodes = Vec::with_capacity(blocks.len());

    for block in blocks {
        let top = coord(y)?;
        let node = match block {
            Block::Text { kind, text } => text_node(kind, text, top, page_width),
            Block::Image { src, width, height } => LayoutNode {
                lb: LayoutBox {
                    rect: Rect {
                        x: SURFACE_MARGIN as i32,
                        y: top,
                        width: *width,
                        height: *height,
                    },
                    box_model: BoxModel {
                        margin: 8,
                        border: 1,
                        padding: 0,
                    },
                },
                text: String::new(),
                elem_type: ElementType::Image { src: src.clone() },
                scale: 1,
            },
            Block::Rule => LayoutNode {
                lb: LayoutBox {
                    rect: Rect {
                        x: SURFACE_MARGIN as i32,
                        y: coord(y + 4)?,
                        width: page_width.saturating_sub(SURFACE_MARGIN * 2),
                        height: 1,
                    },
                    box_model: BoxModel {
                        margin: 8,
                        border: 0,
                        padding: 0,
                    },
                },
                text: String::new(),
                elem_type: ElementType::Rule,
                scale: 1,
            },
        };
        let rect = &node.lb.rect;
        let left = u64::from(rect.x.unsigned_abs());
        let bottom = u64::from(rect.y.unsigned_abs()) + u64::from(rect.height);
        right = right.max(left + u64::from(rect.width) + u64::from(SURFACE_MARGIN));
        y = bottom + u64::from(node.lb.box_model.margin);
        nodes.push(node);
    }

    let scroll_height = coord(y + u64::from(SURFACE_MARGIN))? as u32;
    if right > u64::from(MAX_EXTENT) {
        return Err(Error::CaptureError(format!(
            "content width {}px exceeds the {}px layout limit",
            right, MAX_EXTENT
        )));
    }

    Ok(Layout {
        nodes,
        scroll_width: right as u32,
        scroll_height,
    })
}
