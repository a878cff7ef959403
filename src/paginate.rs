//! Page geometry and the pagination algorithm
//!
//! A snapshot is scaled to the page width, keeping its aspect ratio. Every
//! page shows the same full image shifted upward by one page height per page;
//! the page boundary clips it, so each page reveals the next vertical band.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Remaining heights at or below this are treated as fully placed.
const REMAINDER_EPSILON: f64 = 1e-6;

/// Linear unit for page dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[serde(alias = "mm")]
    Millimeter,
    #[serde(alias = "pt")]
    Point,
    #[serde(alias = "in")]
    Inch,
}

impl Unit {
    /// Number of PDF points (1/72 inch) in one unit
    pub fn points_per_unit(&self) -> f64 {
        match self {
            Unit::Millimeter => 72.0 / 25.4,
            Unit::Point => 1.0,
            Unit::Inch => 72.0,
        }
    }
}

/// Recognized portrait paper sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaperSize {
    A3,
    A4,
    A5,
    Letter,
    Legal,
}

impl PaperSize {
    pub fn geometry(&self) -> PageGeometry {
        match self {
            PaperSize::A3 => PageGeometry::new_unchecked(297.0, 420.0, Unit::Millimeter),
            PaperSize::A4 => PageGeometry::new_unchecked(210.0, 297.0, Unit::Millimeter),
            PaperSize::A5 => PageGeometry::new_unchecked(148.0, 210.0, Unit::Millimeter),
            PaperSize::Letter => PageGeometry::new_unchecked(8.5, 11.0, Unit::Inch),
            PaperSize::Legal => PageGeometry::new_unchecked(8.5, 14.0, Unit::Inch),
        }
    }
}

impl FromStr for PaperSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a3" => Ok(PaperSize::A3),
            "a4" => Ok(PaperSize::A4),
            "a5" => Ok(PaperSize::A5),
            "letter" => Ok(PaperSize::Letter),
            "legal" => Ok(PaperSize::Legal),
            other => Err(Error::ConfigError(format!("unknown paper size `{}`", other))),
        }
    }
}

/// Physical page size of the exported document
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub unit: Unit,
}

impl Default for PageGeometry {
    fn default() -> Self {
        PaperSize::A4.geometry()
    }
}

impl PageGeometry {
    pub fn new(width: f64, height: f64, unit: Unit) -> Result<Self> {
        let g = Self::new_unchecked(width, height, unit);
        g.validate()?;
        Ok(g)
    }

    const fn new_unchecked(width: f64, height: f64, unit: Unit) -> Self {
        Self {
            width,
            height,
            unit,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if !ok(self.width) || !ok(self.height) {
            return Err(Error::ConfigError(format!(
                "page dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    pub fn width_pt(&self) -> f64 {
        self.width * self.unit.points_per_unit()
    }

    pub fn height_pt(&self) -> f64 {
        self.height * self.unit.points_per_unit()
    }
}

/// Placement of the scaled image on one page, in page units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagePlacement {
    pub index: usize,
    /// Vertical offset of the image's top edge below the page's top edge.
    /// Zero on the first page, negative afterwards.
    pub offset: f64,
    pub image_width: f64,
    pub image_height: f64,
}

/// Result of paginating one snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct Pagination {
    /// Full image height once scaled to the page width
    pub scaled_height: f64,
    pub page_height: f64,
    pub placements: Vec<PagePlacement>,
}

impl Pagination {
    pub fn page_count(&self) -> usize {
        self.placements.len()
    }
}

/// Lay out a `raster_width` x `raster_height` image across pages of `geometry`.
///
/// The image is scaled to the page width. The first page places it at offset
/// zero; each following page places the same image one page height higher,
/// until the remaining height is used up. Yields `ceil(scaled / page_height)`
/// pages, and exactly one when the image fits on a single page.
pub fn paginate(raster_width: u32, raster_height: u32, geometry: &PageGeometry) -> Result<Pagination> {
    geometry.validate()?;
    if raster_width == 0 || raster_height == 0 {
        return Err(Error::AssemblyError(format!(
            "cannot paginate an empty raster ({}x{})",
            raster_width, raster_height
        )));
    }

    let page_width = geometry.width;
    let page_height = geometry.height;
    let scaled_height = raster_height as f64 * page_width / raster_width as f64;

    let place = |index: usize, offset: f64| PagePlacement {
        index,
        offset,
        image_width: page_width,
        image_height: scaled_height,
    };

    let mut remaining = scaled_height;
    let mut placements = vec![place(0, 0.0)];
    remaining -= page_height;

    while remaining > REMAINDER_EPSILON {
        let position = remaining - scaled_height;
        placements.push(place(placements.len(), position));
        remaining -= page_height;
    }

    log::debug!(
        "paginated {}x{} raster: scaled height {:.3}, {} page(s) of {:.3}",
        raster_width,
        raster_height,
        scaled_height,
        placements.len(),
        page_height
    );

    Ok(Pagination {
        scaled_height,
        page_height,
        placements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a4() -> PageGeometry {
        PageGeometry::default()
    }

    #[test]
    fn short_content_fits_one_page() {
        let p = paginate(1000, 500, &a4()).unwrap();
        assert_eq!(p.page_count(), 1);
        assert_eq!(p.placements[0].offset, 0.0);
        assert!((p.scaled_height - 105.0).abs() < 1e-9);
    }

    #[test]
    fn exact_fill_is_one_page() {
        let p = paginate(210, 297, &a4()).unwrap();
        assert_eq!(p.scaled_height, 297.0);
        assert_eq!(p.page_count(), 1);
    }

    #[test]
    fn offsets_step_by_page_height() {
        // 210x594 scales to 594mm on A4, exactly two pages
        let p = paginate(210, 594, &a4()).unwrap();
        let offsets: Vec<f64> = p.placements.iter().map(|pl| pl.offset).collect();
        assert_eq!(offsets, vec![0.0, -297.0]);
        assert!(p.placements.iter().all(|pl| pl.image_height == p.scaled_height));
        assert!(p.placements.iter().all(|pl| pl.image_width == 210.0));
    }

    #[test]
    fn rejects_empty_raster() {
        assert!(matches!(paginate(0, 100, &a4()), Err(Error::AssemblyError(_))));
        assert!(paginate(100, 0, &a4()).is_err());
    }

    #[test]
    fn paper_sizes_parse() {
        assert_eq!("Letter".parse::<PaperSize>().unwrap(), PaperSize::Letter);
        assert!("b5".parse::<PaperSize>().is_err());
        let letter = PaperSize::Letter.geometry();
        assert_eq!(letter.width_pt(), 612.0);
        assert_eq!(letter.height_pt(), 792.0);
    }

    #[test]
    fn a4_in_points() {
        let g = a4();
        assert!((g.width_pt() - 595.2756).abs() < 1e-3);
        assert!((g.height_pt() - 841.8898).abs() < 1e-3);
    }

    #[test]
    fn geometry_rejects_non_positive() {
        assert!(PageGeometry::new(0.0, 297.0, Unit::Millimeter).is_err());
        assert!(PageGeometry::new(210.0, f64::NAN, Unit::Millimeter).is_err());
    }
}
