//! Print-ready HTML. The page opens the browser print dialog on load.

use std::fmt::Write;

use super::layout::{Block, PrintableDocument, Signature};
use crate::config::{CLINIC_ADDRESS, CLINIC_NAME};

const STYLE: &str = "\
body{font-family:Helvetica,Arial,sans-serif;color:#111;margin:0;padding:24px;font-size:13px;line-height:1.5}\
.doc-header{display:flex;justify-content:space-between;align-items:flex-start;border-bottom:1px solid #ccc;padding-bottom:12px}\
.doc-header h1{font-size:22px;margin:0}\
.doc-header p{margin:2px 0}\
.meta{text-align:right}\
h2{text-align:center;font-size:18px;margin:24px 0}\
h3{font-size:14px;margin:16px 0 4px;border-top:1px solid #ddd;padding-top:8px}\
.pre{white-space:pre-wrap}\
.notice{font-size:11px;color:#555;text-align:justify}\
.firmas{margin-top:80px}\
.firma-row{display:flex;justify-content:space-around;margin-top:48px;text-align:center}\
.firma{flex:1;margin:0 16px;border-top:1px solid #555;padding-top:6px}\
.firma p{margin:0}\
@page{size:A4;margin:15mm}\
@media print{body{padding:0}}";

/// Escape text for element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

pub fn to_html(doc: &PrintableDocument) -> String {
    let mut html = String::with_capacity(8 * 1024);
    let patient = doc
        .header
        .first()
        .map(|line| format!(" - {}", escape(&line.value)))
        .unwrap_or_default();

    // Writing into a String cannot fail.
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"es\">\n<head>\n<meta charset=\"utf-8\">\n\
<title>{}{}</title>\n<style>{}</style>\n</head>\n<body>\n",
        escape(doc.title),
        patient,
        STYLE
    );

    html.push_str("<header class=\"doc-header\">\n<div>\n");
    let _ = writeln!(html, "<h1>{}</h1>", escape(CLINIC_NAME));
    let _ = writeln!(html, "<p>{}</p>", escape(CLINIC_ADDRESS));
    html.push_str("</div>\n<div class=\"meta\">\n");
    for line in &doc.header {
        let _ = writeln!(
            html,
            "<p><strong>{}:</strong> {}</p>",
            escape(line.label),
            escape(&line.value)
        );
    }
    html.push_str("</div>\n</header>\n");

    let _ = writeln!(html, "<h2>{}</h2>", escape(doc.title));

    html.push_str("<main>\n");
    for block in &doc.blocks {
        write_block(&mut html, block);
    }
    html.push_str("</main>\n");

    if !doc.signatures.is_empty() {
        html.push_str("<footer class=\"firmas\">\n");
        for row in &doc.signatures {
            html.push_str("<div class=\"firma-row\">\n");
            for signature in row {
                write_signature(&mut html, signature);
            }
            html.push_str("</div>\n");
        }
        html.push_str("</footer>\n");
    }

    html.push_str("<script>window.addEventListener('load', function () { window.print(); });</script>\n");
    html.push_str("</body>\n</html>\n");
    html
}

fn write_block(html: &mut String, block: &Block) {
    let _ = match block {
        Block::Field { label, value } => writeln!(
            html,
            "<p><strong>{}:</strong> {}</p>",
            escape(label),
            escape(value)
        ),
        Block::FieldRow(pairs) => {
            let row = pairs
                .iter()
                .map(|(label, value)| format!("<strong>{}:</strong> {}", escape(label), escape(value)))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(html, "<p>{row}</p>")
        }
        Block::Section { heading, body } => writeln!(
            html,
            "<h3>{}</h3>\n<p class=\"pre\">{}</p>",
            escape(heading),
            escape(body)
        ),
        Block::Heading(heading) => writeln!(html, "<h3>{}</h3>", escape(heading)),
        Block::Paragraph(text) => writeln!(html, "<p>{}</p>", escape(text)),
        Block::Statement(text) => writeln!(html, "<p><strong>{}</strong></p>", escape(text)),
        Block::Notice(text) => writeln!(html, "<p class=\"notice\">{}</p>", escape(text)),
    };
}

fn write_signature(html: &mut String, signature: &Signature) {
    html.push_str("<div class=\"firma\">");
    let _ = write!(html, "<p>{}</p>", escape(&signature.name));
    if let Some(caption) = &signature.caption {
        let _ = write!(html, "<p>{}</p>", escape(caption));
    }
    html.push_str("</div>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::layout::HeaderLine;

    fn sample() -> PrintableDocument {
        PrintableDocument {
            title: "Nota de Ingreso",
            header: vec![HeaderLine::new("Paciente", "Lucía Pérez")],
            blocks: vec![
                Block::field("Diagnóstico", "Dolor <agudo> & fiebre"),
                Block::section("Plan", "línea 1\nlínea 2"),
            ],
            signatures: vec![vec![Signature::captioned("Dr. Carlos Méndez", "Cirujano")]],
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("<b a=\"x\">'&'</b>"), "&lt;b a=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/b&gt;");
    }

    #[test]
    fn document_shape() {
        let html = to_html(&sample());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Nota de Ingreso - Lucía Pérez</title>"));
        assert!(html.contains("<h1>Clínica SIC</h1>"));
        assert!(html.contains("<p>Dirección de la Clínica, Cancún, Q.Roo</p>"));
        assert!(html.contains("<strong>Diagnóstico:</strong> Dolor &lt;agudo&gt; &amp; fiebre"));
        assert!(html.contains("<p class=\"pre\">línea 1\nlínea 2</p>"));
        assert!(html.contains("<div class=\"firma\"><p>Dr. Carlos Méndez</p><p>Cirujano</p></div>"));
        assert!(html.contains("window.print()"));
    }

    #[test]
    fn field_rows_join_on_one_line() {
        let doc = PrintableDocument {
            blocks: vec![Block::FieldRow(vec![("TA", "120/80".into()), ("FC", "72".into())])],
            ..sample()
        };
        assert!(to_html(&doc).contains("<p><strong>TA:</strong> 120/80, <strong>FC:</strong> 72</p>"));
    }

    #[test]
    fn no_footer_without_signatures() {
        let doc = PrintableDocument {
            signatures: Vec::new(),
            ..sample()
        };
        assert!(!to_html(&doc).contains("<footer"));
    }
}
