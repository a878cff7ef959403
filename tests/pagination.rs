//! Pagination geometry: page counts and offsets

use proptest::prelude::*;
use rfexport::{paginate, PageGeometry, Unit};

fn a4() -> PageGeometry {
    PageGeometry::default()
}

#[test]
fn tall_report_spans_three_a4_pages() {
    // 210 px wide, 826 px tall: scales 1:1 to 826mm on a 210mm page
    let p = paginate(210, 826, &a4()).expect("paginate");
    assert_eq!(p.scaled_height, 826.0);
    assert_eq!(p.page_count(), 3);
    let offsets: Vec<f64> = p.placements.iter().map(|pl| pl.offset).collect();
    assert_eq!(offsets, vec![0.0, -297.0, -594.0]);
}

#[test]
fn hi_dpi_raster_keeps_aspect_ratio() {
    // a 2x capture of a 1000x3934 css px surface
    let p = paginate(2000, 7868, &a4()).expect("paginate");
    assert!((p.scaled_height - 826.14).abs() < 1e-9);
    assert_eq!(p.page_count(), 3);
}

#[test]
fn exact_page_fill_never_enters_the_loop() {
    let p = paginate(420, 594, &a4()).expect("paginate");
    assert_eq!(p.scaled_height, 297.0);
    assert_eq!(p.page_count(), 1);
    assert_eq!(p.placements[0].offset, 0.0);
}

#[test]
fn every_page_places_the_full_image() {
    let p = paginate(100, 1000, &a4()).expect("paginate");
    for (i, pl) in p.placements.iter().enumerate() {
        assert_eq!(pl.index, i);
        assert_eq!(pl.image_width, 210.0);
        assert_eq!(pl.image_height, p.scaled_height);
    }
}

#[test]
fn same_input_gives_same_pagination() {
    let g = PageGeometry::new(8.5, 11.0, Unit::Inch).unwrap();
    assert_eq!(paginate(1700, 9000, &g).unwrap(), paginate(1700, 9000, &g).unwrap());
}

proptest! {
    // Page width equals raster width so scaled height is the integer raster
    // height and every comparison is exact.
    #[test]
    fn page_count_is_ceiling(h in 1u32..20_000, p in 1u32..2_000) {
        let g = PageGeometry::new(100.0, f64::from(p), Unit::Point).unwrap();
        let pagination = paginate(100, h, &g).unwrap();
        let expected = ((h + p - 1) / p) as usize;
        prop_assert_eq!(pagination.page_count(), expected);
        if h <= p {
            prop_assert_eq!(pagination.page_count(), 1);
        }
    }

    #[test]
    fn offsets_shift_by_one_page_height(h in 1u32..20_000, p in 1u32..2_000) {
        let g = PageGeometry::new(100.0, f64::from(p), Unit::Point).unwrap();
        let pagination = paginate(100, h, &g).unwrap();
        for (i, pl) in pagination.placements.iter().enumerate() {
            prop_assert_eq!(pl.offset, -((i as u32 * p) as f64));
        }
        // the last page still shows the bottom of the image
        let last = pagination.placements.last().unwrap();
        prop_assert!(-last.offset < f64::from(h));
    }
}
