//! Rendering pipeline used by the HTML capture backend
//!
//! `layout` stacks block boxes for the captured subtree at its full scroll
//! extent, `paint` turns them into a display list and `raster` fills an RGBA
//! bitmap from that list.

pub mod layout;
pub mod paint;
pub mod raster;

pub use layout::{Layout, LayoutNode};
pub use paint::{PaintCommand, Palette};
