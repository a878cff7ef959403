//! Paint commands for laid-out surfaces

use crate::rendering::layout::{ElementType, Layout, LayoutNode};
use crate::Color;

pub type Rgba = (u8, u8, u8, u8);

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: Rgba,
    },
    StrokeRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: Rgba,
    },
    /// Text lines separated by `\n`, glyph cells sized by `scale`
    Text {
        x: i32,
        y: i32,
        text: String,
        scale: u32,
        rgba: Rgba,
    },
}

/// Colors derived from the surface background
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub background: Rgba,
    pub foreground: Rgba,
    pub muted: Rgba,
}

impl Palette {
    /// Light text on dark backgrounds, dark text on light ones
    pub fn for_background(background: Color) -> Self {
        if background.luminance() < 0.5 {
            Self {
                background: background.to_rgba(),
                foreground: (0xf5, 0xf5, 0xf5, 255),
                muted: (0x3a, 0x3a, 0x3a, 255),
            }
        } else {
            Self {
                background: background.to_rgba(),
                foreground: (0, 0, 0, 255),
                muted: (0xc8, 0xc8, 0xc8, 255),
            }
        }
    }
}

fn paint_node(node: &LayoutNode, palette: &Palette, out: &mut Vec<PaintCommand>) {
    let r = &node.lb.rect;
    let (cx, cy) = node.lb.content_origin();
    match &node.elem_type {
        ElementType::Image { .. } => {
            // Placeholder frame; image pixels are not fetched.
            out.push(PaintCommand::SolidRect {
                x: r.x,
                y: r.y,
                width: r.width,
                height: r.height,
                rgba: palette.muted,
            });
            out.push(PaintCommand::StrokeRect {
                x: r.x,
                y: r.y,
                width: r.width,
                height: r.height,
                rgba: palette.foreground,
            });
        }
        ElementType::Rule => out.push(PaintCommand::SolidRect {
            x: r.x,
            y: r.y,
            width: r.width,
            height: r.height,
            rgba: palette.muted,
        }),
        ElementType::ListItem => {
            out.push(PaintCommand::SolidRect {
                x: r.x - 8,
                y: cy + 2,
                width: 4,
                height: 4,
                rgba: palette.foreground,
            });
            out.push(text_command(node, cx, cy, palette));
        }
        ElementType::Preformatted => {
            out.push(PaintCommand::SolidRect {
                x: r.x,
                y: r.y,
                width: r.width,
                height: r.height,
                rgba: palette.muted,
            });
            out.push(text_command(node, cx, cy, palette));
        }
        ElementType::Heading(_) | ElementType::Paragraph => {
            out.push(text_command(node, cx, cy, palette));
        }
    }
}

fn text_command(node: &LayoutNode, x: i32, y: i32, palette: &Palette) -> PaintCommand {
    PaintCommand::Text {
        x,
        y,
        text: node.text.clone(),
        scale: node.scale,
        rgba: palette.foreground,
    }
}

/// Build the display list for `layout`, in paint order
pub fn build_display_list(layout: &Layout, palette: &Palette) -> Vec<PaintCommand> {
    let mut out = Vec::with_capacity(layout.nodes.len() * 2);
    for node in &layout.nodes {
        paint_node(node, palette, &mut out);
    }
    out
}
