//! WordprocessingML (.docx) renderer.
//!
//! The package holds the minimum parts Word needs: content types, the
//! package and document relationships, a style sheet defining `Heading1` and
//! `TableGrid`, the document body, and optionally the letterhead image.

use std::borrow::Cow;
use std::io::{Cursor, Write};

use image::ImageFormat;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{
    report_file_name, RenderError, ReportArtifact, ReportContent, ReportOptions, DOCX_MIME,
};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const WP_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const PIC_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Default Extension="png" ContentType="image/png"/>
<Default Extension="jpeg" ContentType="image/jpeg"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
</Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:docDefaults>
<w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/><w:sz w:val="22"/></w:rPr></w:rPrDefault>
<w:pPrDefault><w:pPr><w:spacing w:after="160" w:line="259" w:lineRule="auto"/></w:pPr></w:pPrDefault>
</w:docDefaults>
<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
<w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:color w:val="2F5496"/><w:sz w:val="32"/></w:rPr></w:style>
<w:style w:type="table" w:default="1" w:styleId="TableNormal"><w:name w:val="Normal Table"/><w:tblPr><w:tblCellMar><w:left w:w="108" w:type="dxa"/><w:right w:w="108" w:type="dxa"/></w:tblCellMar></w:tblPr></w:style>
<w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/><w:basedOn w:val="TableNormal"/><w:pPr><w:spacing w:after="0" w:line="240" w:lineRule="auto"/></w:pPr><w:tblPr><w:tblBorders><w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/></w:tblBorders></w:tblPr></w:style>
</w:styles>"#;

/// Column widths in twentieths of a point; sums to the A4 text width.
const COLUMN_WIDTHS: [u32; 4] = [2268, 1588, 2268, 2902];

/// Widest the letterhead may be drawn, in EMU (6 inches).
const MAX_IMAGE_WIDTH_EMU: u64 = 5_486_400;
/// EMU per pixel at 96 dpi.
const EMU_PER_PIXEL: u64 = 9_525;

const SIGNATURE_RULE: &str = "______________________________";
const DATE_RULE: &str = "______________";

const STYLES_REL_ID: &str = "rId1";
const IMAGE_REL_ID: &str = "rId2";

/// Render the report as a Word document.
pub fn render_docx(
    content: &ReportContent,
    options: &ReportOptions,
) -> Result<ReportArtifact, RenderError> {
    content.ensure_records()?;

    let letterhead = options.letterhead.as_deref().and_then(Letterhead::probe);
    let document = document_xml(content, options, letterhead.as_ref())?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let file_options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("[Content_Types].xml", file_options)?;
    zip.write_all(CONTENT_TYPES_XML.as_bytes())?;
    zip.start_file("_rels/.rels", file_options)?;
    zip.write_all(PACKAGE_RELS_XML.as_bytes())?;
    zip.start_file("word/_rels/document.xml.rels", file_options)?;
    zip.write_all(document_rels_xml(letterhead.as_ref()).as_bytes())?;
    zip.start_file("word/styles.xml", file_options)?;
    zip.write_all(STYLES_XML.as_bytes())?;
    zip.start_file("word/document.xml", file_options)?;
    zip.write_all(&document)?;
    if let Some(image) = &letterhead {
        zip.start_file(format!("word/media/{}", image.file_name()), file_options)?;
        zip.write_all(image.bytes)?;
    }
    let bytes = zip.finish()?.into_inner();

    Ok(ReportArtifact {
        bytes,
        mime_type: DOCX_MIME,
        file_name: report_file_name(&content.patient, "docx"),
    })
}

/// A letterhead image that decoded far enough to know its size.
struct Letterhead<'a> {
    bytes: &'a [u8],
    extension: &'static str,
    width_emu: u64,
    height_emu: u64,
}

impl<'a> Letterhead<'a> {
    /// `None` when the bytes are not a PNG/JPEG we can size; the document is
    /// then rendered without a letterhead.
    fn probe(bytes: &'a [u8]) -> Option<Self> {
        let extension = match image::guess_format(bytes).ok()? {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            other => {
                tracing::debug!(format = ?other, "unsupported letterhead format, skipping");
                return None;
            }
        };
        let (width, height) = image::io::Reader::new(Cursor::new(bytes))
            .with_guessed_format()
            .ok()?
            .into_dimensions()
            .ok()?;
        if width == 0 || height == 0 {
            return None;
        }
        let mut width_emu = u64::from(width) * EMU_PER_PIXEL;
        let mut height_emu = u64::from(height) * EMU_PER_PIXEL;
        if width_emu > MAX_IMAGE_WIDTH_EMU {
            height_emu = height_emu * MAX_IMAGE_WIDTH_EMU / width_emu;
            width_emu = MAX_IMAGE_WIDTH_EMU;
        }
        Some(Self { bytes, extension, width_emu, height_emu })
    }

    fn file_name(&self) -> String {
        format!("letterhead.{}", self.extension)
    }
}

fn document_rels_xml(letterhead: Option<&Letterhead<'_>>) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\n",
    );
    xml.push_str(&format!(
        "<Relationship Id=\"{STYLES_REL_ID}\" \
         Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" \
         Target=\"styles.xml\"/>\n"
    ));
    if let Some(image) = letterhead {
        xml.push_str(&format!(
            "<Relationship Id=\"{IMAGE_REL_ID}\" \
             Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/image\" \
             Target=\"media/{}\"/>\n",
            image.file_name()
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

/// Formatting for a single text run.
#[derive(Clone, Copy, Default)]
struct RunStyle {
    bold: bool,
    italic: bool,
    /// Half-points.
    size: Option<u32>,
}

impl RunStyle {
    const PLAIN: RunStyle = RunStyle { bold: false, italic: false, size: None };
    const BOLD: RunStyle = RunStyle { bold: true, italic: false, size: None };
}

/// Text with line endings folded to `\n` and characters XML 1.0 forbids
/// (C0 controls other than tab and newline, U+FFFE, U+FFFF) dropped.
fn xml_text(text: &str) -> Cow<'_, str> {
    let forbidden = |c: char| {
        (c < ' ' && c != '\t' && c != '\n') || c == '\u{FFFE}' || c == '\u{FFFF}'
    };
    if !text.chars().any(forbidden) {
        return Cow::Borrowed(text);
    }
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    Cow::Owned(text.chars().filter(|&c| !forbidden(c)).collect())
}

/// Thin element writer over quick-xml.
struct Body {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl Body {
    fn new() -> Self {
        Self { writer: Writer::new(Cursor::new(Vec::new())) }
    }

    fn open(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), RenderError> {
        let mut start = BytesStart::new(name);
        for attr in attrs {
            start.push_attribute(*attr);
        }
        self.writer.write_event(Event::Start(start))?;
        Ok(())
    }

    fn close(&mut self, name: &str) -> Result<(), RenderError> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), RenderError> {
        let mut start = BytesStart::new(name);
        for attr in attrs {
            start.push_attribute(*attr);
        }
        self.writer.write_event(Event::Empty(start))?;
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), RenderError> {
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        Ok(())
    }

    /// A run of text; embedded newlines become line breaks and tabs become tab stops.
    fn run(&mut self, text: &str, style: RunStyle) -> Result<(), RenderError> {
        self.open("w:r", &[])?;
        if style.bold || style.italic || style.size.is_some() {
            self.open("w:rPr", &[])?;
            if style.bold {
                self.empty("w:b", &[])?;
            }
            if style.italic {
                self.empty("w:i", &[])?;
            }
            if let Some(size) = style.size {
                let size = size.to_string();
                self.empty("w:sz", &[("w:val", size.as_str())])?;
            }
            self.close("w:rPr")?;
        }
        let text = xml_text(text);
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                self.empty("w:br", &[])?;
            }
            for (j, segment) in line.split('\t').enumerate() {
                if j > 0 {
                    self.empty("w:tab", &[])?;
                }
                if !segment.is_empty() {
                    self.open("w:t", &[("xml:space", "preserve")])?;
                    self.text(segment)?;
                    self.close("w:t")?;
                }
            }
        }
        self.close("w:r")
    }

    fn paragraph(&mut self, runs: &[(&str, RunStyle)]) -> Result<(), RenderError> {
        self.open("w:p", &[])?;
        for (text, style) in runs {
            self.run(text, *style)?;
        }
        self.close("w:p")
    }

    fn heading(&mut self, text: &str) -> Result<(), RenderError> {
        self.open("w:p", &[])?;
        self.open("w:pPr", &[])?;
        self.empty("w:pStyle", &[("w:val", "Heading1")])?;
        self.close("w:pPr")?;
        self.run(text, RunStyle::PLAIN)?;
        self.close("w:p")
    }

    fn letterhead(&mut self, image: &Letterhead<'_>) -> Result<(), RenderError> {
        let cx = image.width_emu.to_string();
        let cy = image.height_emu.to_string();
        let file_name = image.file_name();

        self.open("w:p", &[])?;
        self.open("w:pPr", &[])?;
        self.empty("w:jc", &[("w:val", "center")])?;
        self.close("w:pPr")?;
        self.open("w:r", &[])?;
        self.open("w:drawing", &[])?;
        self.open("wp:inline", &[("distT", "0"), ("distB", "0"), ("distL", "0"), ("distR", "0")])?;
        self.empty("wp:extent", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
        self.empty("wp:docPr", &[("id", "1"), ("name", "Letterhead")])?;
        self.open("a:graphic", &[("xmlns:a", A_NS)])?;
        self.open("a:graphicData", &[("uri", PIC_NS)])?;
        self.open("pic:pic", &[("xmlns:pic", PIC_NS)])?;
        self.open("pic:nvPicPr", &[])?;
        self.empty("pic:cNvPr", &[("id", "0"), ("name", file_name.as_str())])?;
        self.empty("pic:cNvPicPr", &[])?;
        self.close("pic:nvPicPr")?;
        self.open("pic:blipFill", &[])?;
        self.empty("a:blip", &[("r:embed", IMAGE_REL_ID)])?;
        self.open("a:stretch", &[])?;
        self.empty("a:fillRect", &[])?;
        self.close("a:stretch")?;
        self.close("pic:blipFill")?;
        self.open("pic:spPr", &[])?;
        self.open("a:xfrm", &[])?;
        self.empty("a:off", &[("x", "0"), ("y", "0")])?;
        self.empty("a:ext", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
        self.close("a:xfrm")?;
        self.open("a:prstGeom", &[("prst", "rect")])?;
        self.empty("a:avLst", &[])?;
        self.close("a:prstGeom")?;
        self.close("pic:spPr")?;
        self.close("pic:pic")?;
        self.close("a:graphicData")?;
        self.close("a:graphic")?;
        self.close("wp:inline")?;
        self.close("w:drawing")?;
        self.close("w:r")?;
        self.close("w:p")
    }

    fn table(&mut self, headers: [&str; 4], rows: &[[&str; 4]]) -> Result<(), RenderError> {
        self.open("w:tbl", &[])?;
        self.open("w:tblPr", &[])?;
        self.empty("w:tblStyle", &[("w:val", "TableGrid")])?;
        self.empty("w:tblW", &[("w:w", "0"), ("w:type", "auto")])?;
        self.close("w:tblPr")?;
        self.open("w:tblGrid", &[])?;
        for width in COLUMN_WIDTHS {
            let width = width.to_string();
            self.empty("w:gridCol", &[("w:w", width.as_str())])?;
        }
        self.close("w:tblGrid")?;

        self.table_row(headers, RunStyle::BOLD, true)?;
        for row in rows {
            self.table_row(*row, RunStyle::PLAIN, false)?;
        }
        self.close("w:tbl")
    }

    fn table_row(
        &mut self,
        cells: [&str; 4],
        style: RunStyle,
        header: bool,
    ) -> Result<(), RenderError> {
        self.open("w:tr", &[])?;
        if header {
            self.open("w:trPr", &[])?;
            self.empty("w:tblHeader", &[])?;
            self.close("w:trPr")?;
        }
        for (cell, width) in cells.iter().zip(COLUMN_WIDTHS) {
            let width = width.to_string();
            self.open("w:tc", &[])?;
            self.open("w:tcPr", &[])?;
            self.empty("w:tcW", &[("w:w", width.as_str()), ("w:type", "dxa")])?;
            self.close("w:tcPr")?;
            self.paragraph(&[(*cell, style)])?;
            self.close("w:tc")?;
        }
        self.close("w:tr")
    }

    fn footer(&mut self, text: &str) -> Result<(), RenderError> {
        self.open("w:p", &[])?;
        self.open("w:pPr", &[])?;
        self.empty("w:jc", &[("w:val", "right")])?;
        self.close("w:pPr")?;
        self.run(text, RunStyle { bold: false, italic: true, size: Some(18) })?;
        self.close("w:p")
    }

    fn section(&mut self) -> Result<(), RenderError> {
        self.open("w:sectPr", &[])?;
        self.empty("w:pgSz", &[("w:w", "11906"), ("w:h", "16838")])?;
        self.empty(
            "w:pgMar",
            &[
                ("w:top", "1440"),
                ("w:right", "1440"),
                ("w:bottom", "1440"),
                ("w:left", "1440"),
                ("w:header", "708"),
                ("w:footer", "708"),
                ("w:gutter", "0"),
            ],
        )?;
        self.close("w:sectPr")
    }

    fn into_bytes(self) -> Vec<u8> {
        self.writer.into_inner().into_inner()
    }
}

fn document_xml(
    content: &ReportContent,
    options: &ReportOptions,
    letterhead: Option<&Letterhead<'_>>,
) -> Result<Vec<u8>, RenderError> {
    let labels = options.locale.labels();
    let mut body = Body::new();

    body.writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    body.open(
        "w:document",
        &[
            ("xmlns:w", W_NS),
            ("xmlns:r", R_NS),
            ("xmlns:wp", WP_NS),
            ("xmlns:a", A_NS),
            ("xmlns:pic", PIC_NS),
        ],
    )?;
    body.open("w:body", &[])?;

    if let Some(image) = letterhead {
        body.letterhead(image)?;
    }

    body.heading(labels.title)?;

    let patient_label = format!("{}: ", labels.patient);
    let dob_label = format!("\t{}: ", labels.date_of_birth);
    let dob = content.date_of_birth_text();
    body.paragraph(&[
        (patient_label.as_str(), RunStyle::BOLD),
        (content.patient.name.as_str(), RunStyle::PLAIN),
        (dob_label.as_str(), RunStyle::BOLD),
        (dob.as_str(), RunStyle::PLAIN),
    ])?;
    if let Some(facility) = &content.patient.facility {
        let facility_label = format!("{}: ", labels.facility);
        body.paragraph(&[
            (facility_label.as_str(), RunStyle::BOLD),
            (facility.as_str(), RunStyle::PLAIN),
        ])?;
    }
    let date_label = format!("{}: ", labels.report_date);
    let generated = content.generated_at_text();
    body.paragraph(&[
        (date_label.as_str(), RunStyle::BOLD),
        (generated.as_str(), RunStyle::PLAIN),
    ])?;

    let disclaimer = labels.disclaimer_line();
    body.paragraph(&[(disclaimer.as_str(), RunStyle::BOLD)])?;

    body.table(labels.headers, &content.rows())?;

    if options.signature_lines {
        body.paragraph(&[])?;
        for role in labels.signature_roles {
            let line = format!(
                "{role}: {SIGNATURE_RULE}\t{}: {DATE_RULE}",
                labels.signature_date
            );
            body.paragraph(&[(line.as_str(), RunStyle::PLAIN)])?;
        }
    }

    body.footer(&options.attribution)?;
    body.section()?;

    body.close("w:body")?;
    body.close("w:document")?;
    Ok(body.into_bytes())
}
