//! A4 PDF export of a [`PrintableDocument`].

use std::io::BufWriter;

use printpdf::*;

use super::layout::{wrap_text, Block, PrintableDocument, Signature};
use super::DocumentError;
use crate::config::{CLINIC_ADDRESS, CLINIC_NAME};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const TOP: f32 = 280.0;
const BOTTOM: f32 = 20.0;
const LEFT: f32 = 20.0;
const META_X: f32 = 120.0;
const BODY_CHARS: usize = 95;

fn pdf_err(e: impl std::fmt::Display) -> DocumentError {
    DocumentError::Pdf(e.to_string())
}

/// Cursor over the pages of one document.
struct Pages<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Pages<'_> {
    fn reserve(&mut self, height: f32) {
        if self.y - height < BOTTOM {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP;
        }
    }

    fn text(&mut self, text: &str, size: f32, x: f32, bold: bool, advance: f32) {
        self.reserve(advance);
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
        self.y -= advance;
    }

    fn wrapped(&mut self, text: &str, size: f32, bold: bool) {
        for paragraph in text.split('\n') {
            for line in wrap_text(paragraph, BODY_CHARS) {
                self.text(&line, size, LEFT, bold, 4.5);
            }
        }
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }
}

pub fn to_pdf(document: &PrintableDocument) -> Result<Vec<u8>, DocumentError> {
    let (doc, page1, layer1) = PdfDocument::new(document.title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_err)?;

    {
        let mut pages = Pages {
            doc: &doc,
            layer: doc.get_page(page1).get_layer(layer1),
            y: TOP,
            regular,
            bold,
        };
        write_header(&mut pages, document);
        for block in &document.blocks {
            write_block(&mut pages, block);
        }
        write_signatures(&mut pages, &document.signatures);
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf).map_err(pdf_err)?;
    buf.into_inner().map_err(pdf_err)
}

fn write_header(pages: &mut Pages<'_>, document: &PrintableDocument) {
    let top = pages.y;
    pages.text(CLINIC_NAME, 14.0, LEFT, true, 6.0);
    pages.text(CLINIC_ADDRESS, 9.0, LEFT, false, 4.5);
    let left_bottom = pages.y;

    pages.y = top;
    for line in &document.header {
        pages.text(&format!("{}: {}", line.label, line.value), 9.0, META_X, false, 4.5);
    }
    pages.y = pages.y.min(left_bottom);

    pages.gap(8.0);
    pages.text(document.title, 13.0, LEFT, true, 10.0);
}

fn write_block(pages: &mut Pages<'_>, block: &Block) {
    match block {
        Block::Field { label, value } => pages.wrapped(&format!("{label}: {value}"), 9.0, false),
        Block::FieldRow(pairs) => {
            let row = pairs
                .iter()
                .map(|(label, value)| format!("{label}: {value}"))
                .collect::<Vec<_>>()
                .join(", ");
            pages.wrapped(&row, 9.0, false);
        }
        Block::Section { heading, body } => {
            pages.gap(2.0);
            pages.text(heading, 10.0, LEFT, true, 5.5);
            pages.wrapped(body, 9.0, false);
        }
        Block::Heading(heading) => {
            pages.gap(2.0);
            pages.text(heading, 10.0, LEFT, true, 5.5);
        }
        Block::Paragraph(text) => {
            pages.wrapped(text, 9.0, false);
            pages.gap(1.5);
        }
        Block::Statement(text) => pages.wrapped(text, 9.0, true),
        Block::Notice(text) => {
            for line in wrap_text(text, 110) {
                pages.text(&line, 7.5, LEFT, false, 3.8);
            }
            pages.gap(1.5);
        }
    }
}

fn write_signatures(pages: &mut Pages<'_>, rows: &[Vec<Signature>]) {
    for row in rows {
        if row.is_empty() {
            continue;
        }
        pages.gap(20.0);
        pages.reserve(12.0);
        let column = (PAGE_WIDTH - 2.0 * LEFT) / row.len() as f32;
        let line_y = pages.y;
        for (i, signature) in row.iter().enumerate() {
            let x = LEFT + column * i as f32 + 4.0;
            pages.y = line_y;
            pages.text("______________________________", 9.0, x, false, 4.5);
            pages.text(&signature.name, 9.0, x, false, 4.5);
            if let Some(caption) = &signature.caption {
                pages.text(caption, 8.0, x, false, 4.0);
            }
        }
        pages.y = line_y - 13.0;
    }
}
