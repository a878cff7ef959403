//! PDF assembly for paginated snapshots
//!
//! The snapshot is embedded once as a Flate-compressed RGB image XObject.
//! Every page draws that same XObject at the page width and full scaled
//! height, shifted by the page's offset; the MediaBox clips what falls
//! outside the page.

use crate::paginate::{PageGeometry, PagePlacement, Pagination};
use crate::snapshot::RasterSnapshot;
use crate::{Error, Result};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};
use std::io::Write;

/// Resource name the page content streams use for the shared image
pub const IMAGE_RESOURCE: &str = "Im0";

const PRODUCER: &str = concat!("rfexport ", env!("CARGO_PKG_VERSION"));

/// Lossless image payload ready for embedding
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub width: u32,
    pub height: u32,
    /// zlib stream of 8-bit RGB samples, row-major
    pub data: Vec<u8>,
}

impl ImagePayload {
    pub fn encode(snapshot: &RasterSnapshot) -> Result<Self> {
        let rgb = snapshot.decode_rgb()?;
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(rgb.as_raw())
            .map_err(|e| Error::EncodingError(e.to_string()))?;
        let data = encoder
            .finish()
            .map_err(|e| Error::EncodingError(e.to_string()))?;
        Ok(Self {
            width: snapshot.width,
            height: snapshot.height,
            data,
        })
    }

    fn into_stream(self) -> Stream {
        let dict = Dictionary::from_iter([
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Image".to_vec())),
            ("Width", Object::Integer(i64::from(self.width))),
            ("Height", Object::Integer(i64::from(self.height))),
            ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
            ("BitsPerComponent", Object::Integer(8)),
            ("Filter", Object::Name(b"FlateDecode".to_vec())),
        ]);
        Stream::new(dict, self.data).with_compression(false)
    }
}

/// Build the image placement operations for one page.
///
/// `offset` is measured downward from the top edge of the page; PDF space
/// grows upward from the bottom edge, so the image's bottom edge sits at
/// `page_height - offset - image_height`.
fn page_operations(placement: &PagePlacement, geometry: &PageGeometry) -> Vec<Operation> {
    let k = geometry.unit.points_per_unit();
    let width = placement.image_width * k;
    let height = placement.image_height * k;
    let bottom = geometry.height_pt() - placement.offset * k - height;

    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                Object::Real(width as f32),
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(height as f32),
                Object::Integer(0),
                Object::Real(bottom as f32),
            ],
        ),
        Operation::new("Do", vec![Object::Name(IMAGE_RESOURCE.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}

/// Assemble a complete PDF document.
///
/// Either the full document is returned or an error; no partial output.
pub fn assemble(
    payload: ImagePayload,
    pagination: &Pagination,
    geometry: &PageGeometry,
    title: &str,
) -> Result<Vec<u8>> {
    if pagination.placements.is_empty() {
        return Err(Error::AssemblyError("pagination produced no pages".into()));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(payload.into_stream());
    let resources_id = doc.add_object(Dictionary::from_iter([(
        "XObject",
        Object::Dictionary(Dictionary::from_iter([(
            IMAGE_RESOURCE,
            Object::Reference(image_id),
        )])),
    )]));

    let media_box = Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Real(geometry.width_pt() as f32),
        Object::Real(geometry.height_pt() as f32),
    ]);

    let mut kids = Vec::with_capacity(pagination.page_count());
    for placement in &pagination.placements {
        let content = Content {
            operations: page_operations(placement, geometry),
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));
        let page_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(resources_id)),
            ("MediaBox", media_box.clone()),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(page_count)),
        ])),
    );

    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    let info_id = doc.add_object(Dictionary::from_iter([
        ("Title", Object::string_literal(title)),
        ("Producer", Object::string_literal(PRODUCER)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc.trailer.set("Info", Object::Reference(info_id));

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| Error::AssemblyError(format!("failed to serialize PDF: {}", e)))?;
    Ok(output)
}
