//! `.docx` package serialization
//!
//! Builds every package part as a string and streams them into a zip
//! archive. [`save_docx`] writes to a temporary file in the target
//! directory and renames it into place once the archive is complete.

use chrono::{SecondsFormat, Utc};
use quick_xml::escape::escape;
use std::fmt::Write as _;
use std::io::{Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{Block, Document, Drawing, Indent, Inline, Paragraph, Run, Table};
use crate::config::Settings;
use crate::data::constants::{cm_to_twips, pt_to_half_points};
use crate::docx::styles::styles_xml;
use crate::utils::error::{CompileError, CompileResult};

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const DOCUMENT_NAMESPACES: &str = concat!(
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:m="http://schemas.openxmlformats.org/officeDocument/2006/math" "#,
    r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture""#
);

const ROOT_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
    r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#,
    r#"<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>"#,
    r#"</Relationships>"#
);

/// Asks Word to refresh the TOC fields when the file is opened
const SETTINGS_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<w:settings xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:m="http://schemas.openxmlformats.org/officeDocument/2006/math">"#,
    r#"<w:updateFields w:val="true"/>"#,
    r#"<w:defaultTabStop w:val="720"/>"#,
    r#"<w:compat><w:compatSetting w:name="compatibilityMode" w:uri="http://schemas.microsoft.com/office/word" w:val="15"/></w:compat>"#,
    r#"<m:mathPr><m:mathFont m:val="Cambria Math"/></m:mathPr>"#,
    r#"</w:settings>"#
);

const APP_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">"#,
    r#"<Application>thesisdoc</Application>"#,
    r#"</Properties>"#
);

// ============================================================================
// Body serialization
// ============================================================================

/// Serializes body content, numbering drawing ids as it goes
struct BodyWriter {
    out: String,
    next_drawing_id: u32,
    text_width_twips: i64,
}

impl BodyWriter {
    fn new(doc: &Document) -> Self {
        Self {
            out: String::with_capacity(64 * 1024),
            next_drawing_id: 1,
            text_width_twips: cm_to_twips(doc.page.text_width_cm()),
        }
    }

    fn block(&mut self, block: &Block) {
        match block {
            Block::Paragraph(p) => self.paragraph(p),
            Block::Table(t) => self.table(t),
        }
    }

    fn paragraph(&mut self, p: &Paragraph) {
        self.out.push_str("<w:p>");
        self.paragraph_properties(p);
        for child in &p.children {
            self.inline(child);
        }
        self.out.push_str("</w:p>");
    }

    fn paragraph_properties(&mut self, p: &Paragraph) {
        let has_props = p.style.is_some()
            || p.keep_next
            || !p.tab_stops_cm.is_empty()
            || p.spacing_pt.is_some()
            || p.indent.is_some()
            || p.align.is_some();
        if !has_props {
            return;
        }

        let out = &mut self.out;
        out.push_str("<w:pPr>");
        if let Some(style) = &p.style {
            let _ = write!(out, r#"<w:pStyle w:val="{}"/>"#, escape(style.as_str()));
        }
        if p.keep_next {
            out.push_str("<w:keepNext/>");
        }
        if !p.tab_stops_cm.is_empty() {
            out.push_str("<w:tabs>");
            for &stop in &p.tab_stops_cm {
                let _ = write!(out, r#"<w:tab w:val="left" w:pos="{}"/>"#, cm_to_twips(stop));
            }
            out.push_str("</w:tabs>");
        }
        if let Some((before, after)) = p.spacing_pt {
            let _ = write!(
                out,
                r#"<w:spacing w:before="{}" w:after="{}"/>"#,
                (before * 20.0).round() as i64,
                (after * 20.0).round() as i64
            );
        }
        if let Some(indent) = &p.indent {
            write_indent(out, indent);
        }
        if let Some(align) = p.align {
            let _ = write!(out, r#"<w:jc w:val="{}"/>"#, align.as_ooxml());
        }
        out.push_str("</w:pPr>");
    }

    fn inline(&mut self, inline: &Inline) {
        match inline {
            Inline::Text(run) => write_run(&mut self.out, run),
            Inline::Break => self.out.push_str("<w:r><w:br/></w:r>"),
            Inline::PageBreak => self.out.push_str(r#"<w:r><w:br w:type="page"/></w:r>"#),
            Inline::Tab => self.out.push_str("<w:r><w:tab/></w:r>"),
            Inline::Field {
                instruction,
                placeholder,
            } => {
                let out = &mut self.out;
                out.push_str(r#"<w:r><w:fldChar w:fldCharType="begin" w:dirty="true"/></w:r>"#);
                let _ = write!(
                    out,
                    r#"<w:r><w:instrText xml:space="preserve"> {} </w:instrText></w:r>"#,
                    escape(instruction.as_str())
                );
                out.push_str(r#"<w:r><w:fldChar w:fldCharType="separate"/></w:r>"#);
                write_run(out, &Run::new(placeholder.as_str()));
                out.push_str(r#"<w:r><w:fldChar w:fldCharType="end"/></w:r>"#);
            }
            Inline::Math(omml) => self.out.push_str(omml),
            Inline::Image(drawing) => self.drawing(drawing),
        }
    }

    fn drawing(&mut self, d: &Drawing) {
        let id = self.next_drawing_id;
        self.next_drawing_id += 1;
        let name = escape(d.name.as_str());
        let out = &mut self.out;

        out.push_str("<w:r>");
        if let Some(position) = d.position_half_points {
            let _ = write!(out, r#"<w:rPr><w:position w:val="{}"/></w:rPr>"#, position);
        }
        let _ = write!(
            out,
            concat!(
                r#"<w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
                r#"<wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{id}" name="{name}"/>"#,
                r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
                r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                r#"<pic:pic><pic:nvPicPr><pic:cNvPr id="{id}" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
                r#"<pic:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
                r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
                r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic>"#,
                r#"</a:graphicData></a:graphic></wp:inline></w:drawing>"#
            ),
            cx = d.width_emu,
            cy = d.height_emu,
            id = id,
            name = name,
            rel = d.rel_id
        );
        out.push_str("</w:r>");
    }

    fn table(&mut self, table: &Table) {
        let cols = table.column_count().max(1);
        let weights: Vec<f64> = if table.column_weights.len() == cols {
            table.column_weights.clone()
        } else {
            vec![1.0; cols]
        };
        let total: f64 = weights.iter().sum::<f64>().max(f64::EPSILON);
        let widths: Vec<i64> = weights
            .iter()
            .map(|w| (self.text_width_twips as f64 * w / total).round() as i64)
            .collect();

        self.out.push_str("<w:tbl><w:tblPr>");
        if let Some(style) = &table.style {
            let _ = write!(self.out, r#"<w:tblStyle w:val="{}"/>"#, escape(style.as_str()));
        }
        self.out.push_str(r#"<w:tblW w:w="5000" w:type="pct"/><w:tblLook w:val="04A0" w:firstRow="1" w:lastRow="0" w:firstColumn="0" w:lastColumn="0" w:noHBand="0" w:noVBand="1"/></w:tblPr>"#);
        self.out.push_str("<w:tblGrid>");
        for w in &widths {
            let _ = write!(self.out, r#"<w:gridCol w:w="{}"/>"#, w);
        }
        self.out.push_str("</w:tblGrid>");

        for (i, row) in table.rows.iter().enumerate() {
            self.out.push_str("<w:tr>");
            if i < table.header_rows {
                self.out.push_str("<w:trPr><w:tblHeader/></w:trPr>");
            }
            for (col, width) in widths.iter().enumerate() {
                let _ = write!(
                    self.out,
                    r#"<w:tc><w:tcPr><w:tcW w:w="{}" w:type="dxa"/></w:tcPr>"#,
                    width
                );
                match row.get(col) {
                    Some(cell) => self.paragraph(&cell.paragraph),
                    None => self.out.push_str("<w:p/>"),
                }
                self.out.push_str("</w:tc>");
            }
            self.out.push_str("</w:tr>");
        }
        self.out.push_str("</w:tbl>");
    }
}

fn write_indent(out: &mut String, indent: &Indent) {
    out.push_str("<w:ind");
    if let Some(left) = indent.left_cm {
        let _ = write!(out, r#" w:left="{}""#, cm_to_twips(left));
    }
    if let Some(right) = indent.right_cm {
        let _ = write!(out, r#" w:right="{}""#, cm_to_twips(right));
    }
    if let Some(hanging) = indent.hanging_cm {
        let _ = write!(out, r#" w:hanging="{}""#, cm_to_twips(hanging));
    } else if let Some(first) = indent.first_line_cm {
        let _ = write!(out, r#" w:firstLine="{}""#, cm_to_twips(first));
    }
    out.push_str("/>");
}

fn write_run(out: &mut String, run: &Run) {
    out.push_str("<w:r>");
    let has_props =
        run.bold || run.italic || run.underline || run.color.is_some() || run.size_pt.is_some();
    if has_props {
        out.push_str("<w:rPr>");
        if run.bold {
            out.push_str("<w:b/><w:bCs/>");
        }
        if run.italic {
            out.push_str("<w:i/><w:iCs/>");
        }
        if let Some(color) = &run.color {
            let _ = write!(out, r#"<w:color w:val="{}"/>"#, escape(color.as_str()));
        }
        if let Some(size) = run.size_pt {
            let _ = write!(
                out,
                r#"<w:sz w:val="{0}"/><w:szCs w:val="{0}"/>"#,
                pt_to_half_points(size)
            );
        }
        if run.underline {
            out.push_str(r#"<w:u w:val="single"/>"#);
        }
        out.push_str("</w:rPr>");
    }
    let _ = write!(
        out,
        r#"<w:t xml:space="preserve">{}</w:t></w:r>"#,
        escape(run.text.as_str())
    );
}

/// `word/document.xml`
pub fn document_xml(doc: &Document) -> String {
    let mut body = BodyWriter::new(doc);
    body.out.push_str(XML_DECL);
    let _ = write!(body.out, "<w:document {}><w:body>", DOCUMENT_NAMESPACES);
    for block in &doc.body {
        body.block(block);
    }

    let page = &doc.page;
    let _ = write!(
        body.out,
        concat!(
            r#"<w:sectPr><w:pgSz w:w="{}" w:h="{}"/>"#,
            r#"<w:pgMar w:top="{}" w:right="{}" w:bottom="{}" w:left="{}" w:header="720" w:footer="720" w:gutter="0"/>"#,
            r#"</w:sectPr>"#
        ),
        cm_to_twips(page.width_cm),
        cm_to_twips(page.height_cm),
        cm_to_twips(page.margin_top_cm),
        cm_to_twips(page.margin_right_cm),
        cm_to_twips(page.margin_bottom_cm),
        cm_to_twips(page.margin_left_cm)
    );
    body.out.push_str("</w:body></w:document>");
    body.out
}

fn content_types_xml(doc: &Document) -> String {
    let mut out = String::new();
    out.push_str(XML_DECL);
    out.push_str(
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    );
    out.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    out.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);

    let mut extensions: Vec<&str> = doc
        .media
        .iter()
        .filter_map(|m| m.file_name.rsplit_once('.').map(|(_, ext)| ext))
        .collect();
    extensions.sort_unstable();
    extensions.dedup();
    for ext in extensions {
        let mime = match ext {
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "bmp" => "image/bmp",
            _ => "image/png",
        };
        let _ = write!(out, r#"<Default Extension="{}" ContentType="{}"/>"#, ext, mime);
    }

    out.push_str(r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#);
    out.push_str(r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#);
    out.push_str(r#"<Override PartName="/word/settings.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml"/>"#);
    out.push_str(r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#);
    out.push_str(r#"<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#);
    out.push_str("</Types>");
    out
}

fn document_rels_xml(doc: &Document) -> String {
    let mut out = String::new();
    out.push_str(XML_DECL);
    out.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    out.push_str(r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#);
    out.push_str(r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/settings" Target="settings.xml"/>"#);
    for media in &doc.media {
        let _ = write!(
            out,
            r#"<Relationship Id="{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/{}"/>"#,
            media.rel_id, media.file_name
        );
    }
    out.push_str("</Relationships>");
    out
}

fn core_xml() -> String {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            r#"<dc:creator>thesisdoc</dc:creator>"#,
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">{0}</dcterms:created>"#,
            r#"<dcterms:modified xsi:type="dcterms:W3CDTF">{0}</dcterms:modified>"#,
            r#"</cp:coreProperties>"#
        ),
        now
    )
}

/// Write the complete package to any seekable writer
pub fn write_docx<W: Write + Seek>(
    doc: &Document,
    settings: &Settings,
    writer: W,
) -> CompileResult<W> {
    let mut zip = ZipWriter::new(writer);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts: [(&str, String); 7] = [
        ("[Content_Types].xml", content_types_xml(doc)),
        ("_rels/.rels", ROOT_RELS.to_string()),
        ("docProps/core.xml", core_xml()),
        ("docProps/app.xml", APP_XML.to_string()),
        ("word/document.xml", document_xml(doc)),
        ("word/styles.xml", styles_xml(settings)),
        ("word/settings.xml", SETTINGS_XML.to_string()),
    ];
    for (name, content) in parts.iter() {
        zip.start_file(*name, deflated)?;
        zip.write_all(content.as_bytes())?;
    }

    zip.start_file("word/_rels/document.xml.rels", deflated)?;
    zip.write_all(document_rels_xml(doc).as_bytes())?;

    for media in &doc.media {
        zip.start_file(format!("word/media/{}", media.file_name), deflated)?;
        zip.write_all(&media.bytes)?;
    }

    Ok(zip.finish()?)
}

/// Write the package to `path`, replacing it only when complete
pub fn save_docx(doc: &Document, settings: &Settings, path: &Path) -> CompileResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir()?,
    };
    let tmp = tempfile::NamedTempFile::new_in(&dir)?;
    let file = write_docx(doc, settings, tmp.reopen()?)?;
    file.sync_all()?;
    tmp.persist(path)
        .map_err(|e| CompileError::io(format!("{}: {}", path.display(), e.error)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::{Alignment, PageSetup, TableCell};
    use std::io::{Cursor, Read};

    fn doc() -> Document {
        Document::new(PageSetup::from_settings(&Settings::default()))
    }

    #[test]
    fn test_paragraph_and_run_xml() {
        let mut d = doc();
        d.push_paragraph(
            Paragraph::styled("Heading1")
                .align(Alignment::Center)
                .with_run(Run::new("A & B").bold().underline()),
        );
        let xml = document_xml(&d);
        assert!(xml.contains(r#"<w:pStyle w:val="Heading1"/>"#));
        assert!(xml.contains(r#"<w:jc w:val="center"/>"#));
        assert!(xml.contains("<w:b/>"));
        assert!(xml.contains(r#"<w:u w:val="single"/>"#));
        assert!(xml.contains("A &amp; B"));
        assert!(xml.contains("<w:sectPr>"));
    }

    #[test]
    fn test_field_xml() {
        let mut d = doc();
        d.push_paragraph(Paragraph::new().with(Inline::Field {
            instruction: r#"TOC \o "1-3""#.into(),
            placeholder: "x".into(),
        }));
        let xml = document_xml(&d);
        assert!(xml.contains(r#"w:fldCharType="begin""#));
        assert!(xml.contains("TOC \\o &quot;1-3&quot;"));
        assert!(xml.contains(r#"w:fldCharType="end""#));
    }

    #[test]
    fn test_ragged_table_is_padded() {
        let mut d = doc();
        let cell = |t: &str| TableCell {
            paragraph: Paragraph::new().with_run(Run::new(t)),
        };
        d.push_table(Table {
            style: Some("TableGrid".into()),
            rows: vec![vec![cell("a"), cell("b")], vec![cell("c")]],
            header_rows: 1,
            column_weights: Vec::new(),
        });
        let xml = document_xml(&d);
        assert_eq!(xml.matches("<w:tc>").count(), 4);
        assert_eq!(xml.matches("<w:gridCol").count(), 2);
        assert!(xml.contains("<w:tblHeader/>"));
    }

    #[test]
    fn test_package_parts() {
        let mut d = doc();
        let rel = d.add_media(vec![0u8; 4], "png");
        d.push_paragraph(Paragraph::new().with(Inline::Image(Drawing {
            rel_id: rel,
            name: "fig".into(),
            width_emu: 100,
            height_emu: 50,
            position_half_points: Some(-4),
        })));

        let cursor = write_docx(&d, &Settings::default(), Cursor::new(Vec::new())).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap();
        for name in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/styles.xml",
            "word/settings.xml",
            "word/_rels/document.xml.rels",
            "word/media/image1.png",
        ] {
            assert!(archive.by_name(name).is_ok(), "missing part {}", name);
        }

        let mut settings = String::new();
        archive
            .by_name("word/settings.xml")
            .unwrap()
            .read_to_string(&mut settings)
            .unwrap();
        assert!(settings.contains("updateFields"));

        let mut document = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut document)
            .unwrap();
        assert!(document.contains(r#"r:embed="rIdImg1""#));
        assert!(document.contains(r#"<w:position w:val="-4"/>"#));
    }

    #[test]
    fn test_save_is_atomic_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.docx");
        save_docx(&doc(), &Settings::default(), &path).unwrap();
        assert!(path.exists());
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.docx");
        assert!(save_docx(&doc(), &Settings::default(), &path).is_err());
        assert!(!path.exists());
    }
}
