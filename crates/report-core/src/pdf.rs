//! PDF encoding of a laid-out [`Document`]

use std::io::Write;

use flate2::{write::ZlibEncoder, Compression};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object, ObjectId, Stream, StringFormat};

use crate::error::ReportError;
use crate::layout::{Color, Document, DrawOp, EmbeddedImage, FontStyle, PageGeometry};

const MM_TO_PT: f64 = 72.0 / 25.4;

fn font_resource(style: FontStyle) -> &'static str {
    match style {
        FontStyle::Regular => "F1",
        FontStyle::Bold => "F2",
        FontStyle::Italic => "F3",
    }
}

fn pt(mm: f64) -> Object {
    Object::Real((mm * MM_TO_PT) as f32)
}

fn rgb(color: Color) -> Vec<Object> {
    [color.0, color.1, color.2]
        .into_iter()
        .map(|c| Object::Real(c as f32 / 255.0))
        .collect()
}

/// Map to WinAnsi; characters outside Latin-1 print as `?`
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
            _ => b'?',
        })
        .collect()
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, ReportError> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| ReportError::PdfError(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| ReportError::PdfError(e.to_string()))
}

/// Encode `document` as PDF bytes using page size `geometry`
pub fn render_pdf(document: &Document, geometry: &PageGeometry) -> Result<Vec<u8>, ReportError> {
    let mut doc = lopdf::Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for (name, base) in [
        ("F1", "Helvetica"),
        ("F2", "Helvetica-Bold"),
        ("F3", "Helvetica-Oblique"),
    ] {
        let font_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(base.as_bytes().to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ]));
        fonts.set(name, Object::Reference(font_id));
    }

    let mut xobjects = Dictionary::new();
    for (index, image) in document.images.iter().enumerate() {
        let image_id = add_image(&mut doc, image)?;
        xobjects.set(format!("Im{}", index), Object::Reference(image_id));
    }

    let resources_id = doc.add_object(Dictionary::from_iter(vec![
        ("Font", Object::Dictionary(fonts)),
        ("XObject", Object::Dictionary(xobjects)),
    ]));

    let mut page_ids = Vec::with_capacity(document.pages.len());
    for page in &document.pages {
        let content: Content<Vec<Operation>> = Content {
            operations: page
                .ops
                .iter()
                .flat_map(|op| operations(op, geometry.height))
                .collect(),
        };
        let encoded = content
            .encode()
            .map_err(|e| ReportError::PdfError(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));

        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    pt(geometry.width),
                    pt(geometry.height),
                ]),
            ),
            ("Resources", Object::Reference(resources_id)),
            ("Contents", Object::Reference(content_id)),
        ]));
        page_ids.push(page_id);
    }

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(page_ids.len() as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| ReportError::PdfError(e.to_string()))?;

    tracing::debug!(
        "Encoded {} page(s) with {} image(s) into {} bytes",
        page_ids.len(),
        document.images.len(),
        output.len()
    );
    Ok(output)
}

fn add_image(doc: &mut lopdf::Document, image: &EmbeddedImage) -> Result<ObjectId, ReportError> {
    let dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(image.width as i64)),
        ("Height", Object::Integer(image.height as i64)),
        ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
        ("Filter", Object::Name(b"FlateDecode".to_vec())),
    ]);
    let stream = Stream::new(dict, deflate(&image.rgb)?);
    Ok(doc.add_object(stream))
}

/// Content operators for one draw op; y is flipped to PDF's bottom-left origin
fn operations(op: &DrawOp, page_height: f64) -> Vec<Operation> {
    match op {
        DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill,
            stroke,
        } => {
            let mut ops = vec![Operation::new("q", vec![])];
            if let Some(color) = fill {
                ops.push(Operation::new("rg", rgb(*color)));
            }
            if let Some(stroke) = stroke {
                ops.push(Operation::new("RG", rgb(stroke.color)));
                ops.push(Operation::new("w", vec![pt(stroke.width)]));
            }
            ops.push(Operation::new(
                "re",
                vec![pt(*x), pt(page_height - y - height), pt(*width), pt(*height)],
            ));
            let paint = match (fill.is_some(), stroke.is_some()) {
                (true, true) => "B",
                (true, false) => "f",
                (false, true) => "S",
                (false, false) => "n",
            };
            ops.push(Operation::new(paint, vec![]));
            ops.push(Operation::new("Q", vec![]));
            ops
        }
        DrawOp::Text {
            x,
            y,
            text,
            size,
            style,
            color,
        } => vec![
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![
                    Object::Name(font_resource(*style).as_bytes().to_vec()),
                    Object::Real(*size as f32),
                ],
            ),
            Operation::new("rg", rgb(*color)),
            Operation::new("Td", vec![pt(*x), pt(page_height - y)]),
            Operation::new(
                "Tj",
                vec![Object::String(win_ansi(text), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ],
        DrawOp::Image {
            x,
            y,
            width,
            height,
            image,
        } => vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    pt(*width),
                    Object::Integer(0),
                    Object::Integer(0),
                    pt(*height),
                    pt(*x),
                    pt(page_height - y - height),
                ],
            ),
            Operation::new("Do", vec![Object::Name(format!("Im{}", image).into_bytes())]),
            Operation::new("Q", vec![]),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{ImageContent, LayoutEngine, ReportBlock};
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use shared_types::RasterImage;
    use std::io::Cursor;

    fn page_strings(doc: &lopdf::Document, page_id: ObjectId) -> Vec<String> {
        let content = doc.get_page_content(page_id).unwrap();
        Content::decode(&content)
            .unwrap()
            .operations
            .into_iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| match op.operands.first() {
                Some(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).into_owned()),
                _ => None,
            })
            .collect()
    }

    fn png() -> RasterImage {
        let img = RgbImage::from_pixel(3, 2, Rgb([200, 10, 10]));
        let mut buffer = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        RasterImage::new(buffer)
    }

    #[test]
    fn test_output_parses_with_expected_pages() {
        let blocks: Vec<_> = (0..60)
            .map(|i| ReportBlock::Paragraph {
                text: format!("Paragraph number {}", i),
            })
            .collect();
        let layout = LayoutEngine::layout(PageGeometry::A4, &blocks);
        let bytes = render_pdf(&layout, &PageGeometry::A4).unwrap();

        assert!(bytes.starts_with(b"%PDF-1.7"));
        let parsed = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(parsed.get_pages().len(), layout.page_count());
        assert!(layout.page_count() > 1);
    }

    #[test]
    fn test_text_is_written_in_page_order() {
        let blocks = [
            ReportBlock::SectionHeader {
                title: "RECOMMENDED ACTION".into(),
            },
            ReportBlock::Paragraph {
                text: "Replace bushing".into(),
            },
        ];
        let layout = LayoutEngine::layout(PageGeometry::A4, &blocks);
        let bytes = render_pdf(&layout, &PageGeometry::A4).unwrap();
        let parsed = lopdf::Document::load_mem(&bytes).unwrap();
        let first_page = *parsed.get_pages().get(&1).unwrap();

        assert_eq!(
            page_strings(&parsed, first_page),
            vec!["RECOMMENDED ACTION", "Replace bushing"]
        );
    }

    #[test]
    fn test_images_become_flate_xobjects() {
        let layout = LayoutEngine::layout(
            PageGeometry::A4,
            &[ReportBlock::Image(ImageContent::Raster(png()))],
        );
        let bytes = render_pdf(&layout, &PageGeometry::A4).unwrap();
        let parsed = lopdf::Document::load_mem(&bytes).unwrap();

        let images: Vec<_> = parsed
            .objects
            .values()
            .filter_map(|obj| obj.as_stream().ok())
            .filter(|stream| {
                stream
                    .dict
                    .get(b"Subtype")
                    .and_then(|s| s.as_name())
                    .map(|name| name == b"Image")
                    .unwrap_or(false)
            })
            .collect();
        assert_eq!(images.len(), 1);

        let stream = images[0];
        assert_eq!(stream.dict.get(b"Width").unwrap().as_i64().unwrap(), 3);
        assert_eq!(stream.dict.get(b"Height").unwrap().as_i64().unwrap(), 2);
        assert_eq!(stream.decompressed_content().unwrap().len(), 3 * 2 * 3);
    }

    #[test]
    fn test_non_latin_text_is_replaced() {
        assert_eq!(win_ansi("Café ✓"), b"Caf\xe9 ?".to_vec());
    }
}
