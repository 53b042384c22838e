//! Structured page source backed by lopdf.
//!
//! Walks each page's content stream and reports text in `BT`/`ET` sections
//! as blocks of lines, and image XObjects painted with `Do` as image
//! primitives at their position in the stream.

use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Read};
use std::path::Path;

use flate2::read::{DeflateDecoder, ZlibDecoder};
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::content::Content;
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use super::PageSource;
use crate::detect::{detect_input_kind, InputKind};
use crate::error::{Error, Result};
use crate::model::{ImagePrimitive, Line, Page, PrimitiveBlock, RawSpan, TextBlock};

/// Vertical distance (text space units) beyond which a span starts a new line.
const LINE_TOLERANCE: f32 = 0.5;

/// A PDF opened for structured extraction.
pub struct PdfSource {
    doc: LopdfDocument,
    name: String,
    pages: Vec<ObjectId>,
}

impl PdfSource {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        match detect_input_kind(path)? {
            InputKind::Pdf(_) => {}
            InputKind::Image { .. } => return Err(Error::UnknownFormat),
        }

        let doc = LopdfDocument::load(path).map_err(load_error)?;
        Ok(Self::from_document(doc, path.display().to_string()))
    }

    /// Open a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data).map_err(load_error)?;
        Ok(Self::from_document(doc, "<memory>".to_string()))
    }

    fn from_document(doc: LopdfDocument, name: String) -> Self {
        let pages = doc.get_pages().into_values().collect();
        Self { doc, name, pages }
    }

    fn page_id(&self, index: u32) -> Result<ObjectId> {
        self.pages
            .get(index as usize)
            .copied()
            .ok_or(Error::PageOutOfRange(index + 1, self.page_count()))
    }

    /// Get the concatenated content stream of a page.
    fn page_content(&self, index: u32, page_id: ObjectId) -> Result<Vec<u8>> {
        let malformed = |reason: String| Error::MalformedPage {
            page: index,
            reason,
        };

        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| malformed(e.to_string()))?;

        let contents = match page_dict.get(b"Contents") {
            Ok(contents) => contents,
            // A page without content is blank, not broken
            Err(_) => return Ok(Vec::new()),
        };

        match contents {
            Object::Reference(r) => match self.doc.get_object(*r) {
                Ok(Object::Stream(s)) => Ok(s
                    .decompressed_content()
                    .unwrap_or_else(|_| s.content.clone())),
                Ok(Object::Array(arr)) => Ok(self.concat_streams(arr)),
                _ => Err(malformed("invalid content stream".to_string())),
            },
            Object::Array(arr) => Ok(self.concat_streams(arr)),
            _ => Err(malformed("invalid content stream".to_string())),
        }
    }

    fn concat_streams(&self, refs: &[Object]) -> Vec<u8> {
        let mut content = Vec::new();
        for obj in refs {
            if let Ok(r) = obj.as_reference() {
                if let Ok(Object::Stream(s)) = self.doc.get_object(r) {
                    match s.decompressed_content() {
                        Ok(data) => content.extend_from_slice(&data),
                        Err(_) => content.extend_from_slice(&s.content),
                    }
                    content.push(b' ');
                }
            }
        }
        content
    }

    /// Collect image XObjects visible from a page, following inherited
    /// resources up the page tree.
    fn page_xobjects(&self, page_id: ObjectId) -> HashMap<Vec<u8>, ObjectId> {
        let mut xobjects = HashMap::new();
        let mut node = Some(page_id);
        let mut depth = 0;

        while let Some(id) = node {
            let Ok(dict) = self.doc.get_dictionary(id) else {
                break;
            };

            if let Some(xobj_dict) = dict
                .get(b"Resources")
                .ok()
                .and_then(|r| self.resolve_dict(r))
                .and_then(|res| res.get(b"XObject").ok())
                .and_then(|x| self.resolve_dict(x))
            {
                for (name, obj) in xobj_dict.iter() {
                    if let Ok(r) = obj.as_reference() {
                        xobjects.entry(name.clone()).or_insert(r);
                    }
                }
            }

            depth += 1;
            node = if depth < 32 {
                dict.get(b"Parent").ok().and_then(|p| p.as_reference().ok())
            } else {
                None
            };
        }

        xobjects
    }

    fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        match obj {
            Object::Reference(r) => self.doc.get_dictionary(*r).ok(),
            Object::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    fn walk_content(&self, index: u32, page_id: ObjectId) -> Result<Vec<PrimitiveBlock>> {
        let raw = self.page_content(index, page_id)?;
        let content = Content::decode(&raw).map_err(|e| Error::MalformedPage {
            page: index,
            reason: e.to_string(),
        })?;

        let lopdf_fonts = self
            .doc
            .get_page_fonts(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;
        let font_names = base_font_names(&lopdf_fonts);
        let xobjects = self.page_xobjects(page_id);

        let mut walker = ContentWalker::new(self, &lopdf_fonts, &font_names);

        for op in &content.operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "BT" => walker.begin_text(),
                "ET" => walker.end_text(),
                "Tf" => {
                    if operands.len() >= 2 {
                        if let Object::Name(font) = &operands[0] {
                            walker.font = font.clone();
                        }
                        walker.font_size = get_number(&operands[1]).unwrap_or(walker.font_size);
                    }
                }
                "TL" => {
                    if let Some(leading) = operands.first().and_then(get_number) {
                        walker.matrix.leading = leading;
                    }
                }
                "Td" => {
                    if operands.len() >= 2 {
                        let tx = get_number(&operands[0]).unwrap_or(0.0);
                        let ty = get_number(&operands[1]).unwrap_or(0.0);
                        walker.matrix.translate(tx, ty);
                    }
                }
                "TD" => {
                    if operands.len() >= 2 {
                        let tx = get_number(&operands[0]).unwrap_or(0.0);
                        let ty = get_number(&operands[1]).unwrap_or(0.0);
                        walker.matrix.leading = -ty;
                        walker.matrix.translate(tx, ty);
                    }
                }
                "Tm" => {
                    if operands.len() >= 6 {
                        let n: Vec<f32> = operands
                            .iter()
                            .take(6)
                            .map(|o| get_number(o).unwrap_or(0.0))
                            .collect();
                        walker.matrix.set(n[0], n[1], n[2], n[3], n[4], n[5]);
                    }
                }
                "T*" => walker.matrix.next_line(),
                "Tj" => {
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        let text = walker.decode(bytes);
                        walker.show(text);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        let text = walker.decode_array(items);
                        walker.show(text);
                    }
                }
                "'" | "\"" => {
                    walker.matrix.next_line();
                    let text_idx = if op.operator == "\"" { 2 } else { 0 };
                    if let Some(Object::String(bytes, _)) = operands.get(text_idx) {
                        let text = walker.decode(bytes);
                        walker.show(text);
                    }
                }
                "Do" => {
                    if let Some(Object::Name(name)) = operands.first() {
                        if let Some(&id) = xobjects.get(name) {
                            if let Some(image) = self.image_primitive(id) {
                                walker.push_image(image);
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(walker.finish())
    }

    /// Resolve an image XObject into displayable bytes where possible.
    fn image_primitive(&self, id: ObjectId) -> Option<ImagePrimitive> {
        let stream = match self.doc.get_object(id) {
            Ok(Object::Stream(stream)) => stream,
            _ => return None,
        };

        let subtype = stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(|s| s.as_name_str().ok());
        if subtype != Some("Image") {
            log::debug!("Ignoring non-image XObject {:?}", id);
            return None;
        }

        Some(convert_image_stream(stream))
    }
}

impl PageSource for PdfSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn load_page(&self, index: u32) -> Result<Page> {
        let page_id = self.page_id(index)?;
        let blocks = self.walk_content(index, page_id)?;
        Ok(Page::structured(index, blocks))
    }

    fn pdf_version(&self) -> Option<&str> {
        Some(&self.doc.version)
    }
}

/// Map resource names (e.g. "F1") to the fonts' `BaseFont` names.
fn base_font_names(fonts: &BTreeMap<Vec<u8>, &Dictionary>) -> HashMap<Vec<u8>, String> {
    fonts
        .iter()
        .map(|(name, font)| {
            let base_font = font
                .get(b"BaseFont")
                .ok()
                .and_then(|o| o.as_name().ok())
                .map(|n| String::from_utf8_lossy(n).to_string())
                .unwrap_or_else(|| String::from_utf8_lossy(name).to_string());
            (name.clone(), base_font)
        })
        .collect()
}

pub(super) fn load_error(err: lopdf::Error) -> Error {
    match err {
        lopdf::Error::IO(e) => Error::Io(e),
        lopdf::Error::Decryption(_) => Error::Encrypted,
        other => Error::SourceLoad(other.to_string()),
    }
}

/// Per-page state while walking a content stream.
struct ContentWalker<'a> {
    source: &'a PdfSource,
    lopdf_fonts: &'a BTreeMap<Vec<u8>, &'a Dictionary>,
    font_names: &'a HashMap<Vec<u8>, String>,
    font: Vec<u8>,
    font_size: f32,
    matrix: TextMatrix,
    blocks: Vec<PrimitiveBlock>,
    lines: Vec<Line>,
    line_y: Option<f32>,
}

impl<'a> ContentWalker<'a> {
    fn new(
        source: &'a PdfSource,
        lopdf_fonts: &'a BTreeMap<Vec<u8>, &'a Dictionary>,
        font_names: &'a HashMap<Vec<u8>, String>,
    ) -> Self {
        Self {
            source,
            lopdf_fonts,
            font_names,
            font: Vec::new(),
            font_size: 12.0,
            matrix: TextMatrix::default(),
            blocks: Vec::new(),
            lines: Vec::new(),
            line_y: None,
        }
    }

    fn begin_text(&mut self) {
        self.flush_text();
        self.matrix = TextMatrix {
            leading: self.matrix.leading,
            ..TextMatrix::default()
        };
    }

    fn end_text(&mut self) {
        self.flush_text();
    }

    fn flush_text(&mut self) {
        if !self.lines.is_empty() {
            let lines = std::mem::take(&mut self.lines);
            self.blocks.push(PrimitiveBlock::Text(TextBlock { lines }));
        }
        self.line_y = None;
    }

    fn push_image(&mut self, image: ImagePrimitive) {
        self.flush_text();
        self.blocks.push(PrimitiveBlock::Image(image));
    }

    fn decode(&self, bytes: &[u8]) -> String {
        let encoding = self
            .lopdf_fonts
            .get(&self.font)
            .and_then(|f| f.get_font_encoding(&self.source.doc).ok());

        match encoding {
            Some(enc) => LopdfDocument::decode_text(&enc, bytes)
                .unwrap_or_else(|_| decode_text_simple(bytes)),
            None => decode_text_simple(bytes),
        }
    }

    /// Decode a `TJ` array; large negative adjustments become word spaces.
    fn decode_array(&self, items: &[Object]) -> String {
        const SPACE_THRESHOLD: f32 = 200.0;

        let mut combined = String::new();
        for item in items {
            match item {
                Object::String(bytes, _) => combined.push_str(&self.decode(bytes)),
                other => {
                    if let Some(adjustment) = get_number(other) {
                        if -adjustment > SPACE_THRESHOLD
                            && !combined.is_empty()
                            && !combined.ends_with(' ')
                        {
                            combined.push(' ');
                        }
                    }
                }
            }
        }
        combined
    }

    fn show(&mut self, text: String) {
        if text.is_empty() {
            return;
        }

        let (_, y) = self.matrix.position();
        let starts_line = match self.line_y {
            Some(prev) => (prev - y).abs() > LINE_TOLERANCE,
            None => true,
        };
        if starts_line || self.lines.is_empty() {
            self.lines.push(Line::default());
            self.line_y = Some(y);
        }

        let font = self
            .font_names
            .get(&self.font)
            .cloned()
            .unwrap_or_else(|| String::from_utf8_lossy(&self.font).to_string());
        let size = self.font_size * self.matrix.scale();

        if let Some(line) = self.lines.last_mut() {
            line.spans.push(RawSpan::new(text, size, font));
        }
    }

    fn finish(mut self) -> Vec<PrimitiveBlock> {
        self.flush_text();
        self.blocks
    }
}

/// Text matrix for tracking position in a content stream.
#[derive(Debug, Clone)]
struct TextMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
    leading: f32,
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
            leading: 0.0,
        }
    }
}

impl TextMatrix {
    fn set(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        self.a = a;
        self.b = b;
        self.c = c;
        self.d = d;
        self.e = e;
        self.f = f;
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.e += tx * self.a + ty * self.c;
        self.f += tx * self.b + ty * self.d;
    }

    fn next_line(&mut self) {
        // 12pt when no TL was given
        let leading = if self.leading != 0.0 { self.leading } else { 12.0 };
        self.translate(0.0, -leading);
    }

    fn position(&self) -> (f32, f32) {
        (self.e, self.f)
    }

    fn scale(&self) -> f32 {
        (self.a * self.a + self.c * self.c).sqrt()
    }
}

/// Helper to extract number from PDF object.
fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Decode text without a font encoding: UTF-16BE with BOM, then UTF-8,
/// then Latin-1.
fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    bytes.iter().map(|&b| b as char).collect()
}

fn filter_names(dict: &Dictionary) -> Vec<String> {
    match dict.get(b"Filter") {
        Ok(Object::Name(n)) => vec![String::from_utf8_lossy(n).to_string()],
        Ok(Object::Array(arr)) => arr
            .iter()
            .filter_map(|o| o.as_name_str().ok())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

/// Turn an image XObject stream into bytes a decoder can read.
///
/// JPEG and JPEG 2000 data pass through unchanged. Uncompressed or
/// Flate-compressed 8-bit RGB and gray samples are re-encoded as PNG.
/// Anything else is passed through raw and will fail to decode later.
fn convert_image_stream(stream: &Stream) -> ImagePrimitive {
    let dict = &stream.dict;
    let filters = filter_names(dict);

    match filters.as_slice() {
        [f] if f == "DCTDecode" => {
            return ImagePrimitive::with_hint(stream.content.clone(), "jpeg")
        }
        [f] if f == "JPXDecode" => return ImagePrimitive::with_hint(stream.content.clone(), "jp2"),
        _ => {}
    }

    let samples = match filters.as_slice() {
        [] => Some(stream.content.clone()),
        [f] if f == "FlateDecode" && !has_predictor(dict) => stream
            .decompressed_content()
            .ok()
            .or_else(|| inflate(&stream.content)),
        _ => None,
    };

    samples
        .and_then(|data| encode_samples_png(dict, data))
        .map(|png| ImagePrimitive::with_hint(png, "png"))
        .unwrap_or_else(|| ImagePrimitive {
            data: stream.content.clone(),
            format_hint: filters.first().cloned(),
        })
}

fn has_predictor(dict: &Dictionary) -> bool {
    dict.get(b"DecodeParms")
        .ok()
        .and_then(|p| p.as_dict().ok())
        .and_then(|p| p.get(b"Predictor").ok())
        .and_then(|p| p.as_i64().ok())
        .map(|p| p > 1)
        .unwrap_or(false)
}

/// Inflate zlib data, falling back to a raw deflate stream.
fn inflate(data: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    if ZlibDecoder::new(data).read_to_end(&mut out).is_ok() {
        return Some(out);
    }
    out.clear();
    DeflateDecoder::new(data).read_to_end(&mut out).ok()?;
    Some(out)
}

fn encode_samples_png(dict: &Dictionary, samples: Vec<u8>) -> Option<Vec<u8>> {
    let dim = |key: &[u8]| {
        dict.get(key)
            .ok()
            .and_then(|v| v.as_i64().ok())
            .and_then(|v| u32::try_from(v).ok())
    };
    let width = dim(b"Width")?;
    let height = dim(b"Height")?;
    if dict.get(b"BitsPerComponent").ok()?.as_i64().ok()? != 8 {
        return None;
    }

    let image = match dict.get(b"ColorSpace").ok()?.as_name_str().ok()? {
        "DeviceRGB" => DynamicImage::ImageRgb8(RgbImage::from_raw(width, height, samples)?),
        "DeviceGray" => DynamicImage::ImageLuma8(GrayImage::from_raw(width, height, samples)?),
        _ => return None,
    };

    let mut png = Cursor::new(Vec::new());
    image.write_to(&mut png, ImageFormat::Png).ok()?;
    Some(png.into_inner())
}
