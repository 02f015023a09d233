//! EPUB writer.
//!
//! Stages an in-memory archive from the moment the writer is created. The body
//! is split into XHTML sections at each top-level level-1 heading, and every
//! section is written to the archive as soon as it closes. The package
//! document, navigation document and NCX are added at `EndDocument`.

use std::fmt::Write as _;
use std::io::{Cursor, Write};

use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::config::EpubConfig;
use crate::error::Result;
use crate::stream::{Event, Nesting};

use super::escape::escape_xml;
use super::html::{HtmlBody, xhtml_document};
use super::{Format, FormatWriter, Output};

/// Container.xml template.
const CONTAINER_XML: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

const DEFAULT_LANGUAGE: &str = "en";
const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Metadata captured from `StartDocument`.
#[derive(Debug, Default)]
struct Metadata {
    identifier: String,
    title: String,
    description: String,
}

/// A heading linked from the navigation documents.
#[derive(Debug)]
struct NavPoint {
    title: String,
    href: String,
}

/// Section currently being rendered.
#[derive(Debug, Default)]
struct SectionDraft {
    title: Option<String>,
    children: Vec<NavPoint>,
    remote_resources: bool,
}

/// A section already written to the archive.
#[derive(Debug)]
struct Section {
    id: String,
    file: String,
    title: String,
    children: Vec<NavPoint>,
    remote_resources: bool,
}

/// EPUB format writer.
pub struct EpubWriter {
    language: String,
    nesting: Nesting,
    zip: ZipWriter<Cursor<Vec<u8>>>,
    deflated: SimpleFileOptions,
    metadata: Metadata,
    body: HtmlBody,
    draft: SectionDraft,
    sections: Vec<Section>,
}

impl EpubWriter {
    /// Validate the configuration and start the archive.
    ///
    /// `mimetype` (stored) and `META-INF/container.xml` are written here.
    pub fn new(config: EpubConfig) -> Result<Self> {
        config.validate()?;

        let compression_level = config.compression_level.unwrap_or(DEFAULT_COMPRESSION_LEVEL);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(compression_level as i64));

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        // mimetype must be first and uncompressed
        zip.start_file("mimetype", stored)?;
        zip.write_all(b"application/epub+zip")?;

        zip.start_file("META-INF/container.xml", deflated)?;
        zip.write_all(CONTAINER_XML)?;

        Ok(Self {
            language: config
                .language
                .filter(|lang| !lang.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            nesting: Nesting::new(),
            zip,
            deflated,
            metadata: Metadata::default(),
            body: HtmlBody::new(),
            draft: SectionDraft::default(),
            sections: Vec::new(),
        })
    }

    fn write_member(&mut self, path: &str, data: &[u8]) -> Result<()> {
        self.zip.start_file(path, self.deflated)?;
        self.zip.write_all(data)?;
        Ok(())
    }

    /// Write the section being rendered, if it has content.
    ///
    /// A document with no content still gets one (empty) section.
    fn close_section(&mut self) -> Result<()> {
        if self.body.is_empty() && !self.sections.is_empty() {
            return Ok(());
        }

        let index = self.sections.len();
        let draft = std::mem::take(&mut self.draft);
        let title = draft
            .title
            .unwrap_or_else(|| self.metadata.title.clone());
        let file = format!("chapter_{index}.xhtml");

        let body = self.body.take();
        let document = xhtml_document(&title, None, &body);
        self.write_member(&format!("OEBPS/{file}"), document.as_bytes())?;
        log::debug!("wrote EPUB section {file} ({} bytes)", document.len());

        self.sections.push(Section {
            id: format!("chapter_{index}"),
            file,
            title,
            children: draft.children,
            remote_resources: draft.remote_resources,
        });
        Ok(())
    }

    fn write_package(&mut self) -> Result<()> {
        let nav = generate_nav(&self.metadata, &self.language, &self.sections);
        self.write_member("OEBPS/nav.xhtml", nav.as_bytes())?;

        let ncx = generate_ncx(&self.metadata, &self.sections);
        self.write_member("OEBPS/toc.ncx", ncx.as_bytes())?;

        let opf = generate_opf(&self.metadata, &self.language, &self.sections);
        self.write_member("OEBPS/content.opf", opf.as_bytes())
    }

    /// Record a heading that sits directly in the body.
    fn note_heading(&mut self, level: u8, text: &str, id: Option<String>) {
        if self.draft.title.is_none() {
            self.draft.title = Some(text.to_string());
        }
        if level == 2
            && let Some(id) = id
        {
            let file = format!("chapter_{}.xhtml", self.sections.len());
            self.draft.children.push(NavPoint {
                title: text.to_string(),
                href: format!("{file}#{id}"),
            });
        }
    }
}

impl FormatWriter for EpubWriter {
    fn format(&self) -> Format {
        Format::Epub
    }

    fn handle(&mut self, event: &Event<'_>) -> Result<()> {
        let top_level = self.nesting.depth() == 1;
        self.nesting.observe(event.kind())?;

        match event {
            Event::StartDocument(info) => {
                self.metadata = Metadata {
                    identifier: info.id.to_string(),
                    title: info.title.to_string(),
                    description: info.description.to_string(),
                };
            }
            Event::StartHeading(heading) if top_level => {
                if heading.level == 1 && !self.body.is_empty() {
                    self.close_section()?;
                }
                let id = self.body.render(event);
                self.note_heading(heading.level, &heading.text, id);
                return Ok(());
            }
            Event::Image(image) => {
                if image.url().is_some_and(is_remote) {
                    self.draft.remote_resources = true;
                }
            }
            Event::EndDocument => {
                self.close_section()?;
                self.write_package()?;
                return Ok(());
            }
            _ => {}
        }

        self.body.render(event);
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Output> {
        let this = *self;
        this.nesting.finish()?;
        let cursor = this.zip.finish()?;
        Ok(Output::binary(Format::Epub, cursor.into_inner()))
    }
}

fn is_remote(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Generate content.opf (EPUB 3 with an NCX for older readers).
fn generate_opf(metadata: &Metadata, language: &str, sections: &[Section]) -> String {
    let mut opf = String::new();

    opf.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="BookId">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
"#,
    );

    let _ = writeln!(
        opf,
        "    <dc:title id=\"title1\">{}</dc:title>",
        escape_xml(&metadata.title)
    );
    let _ = writeln!(opf, "    <dc:language>{}</dc:language>", escape_xml(language));

    if metadata.identifier.is_empty() {
        opf.push_str("    <dc:identifier id=\"BookId\">urn:uuid:00000000-0000-0000-0000-000000000000</dc:identifier>\n");
    } else {
        let _ = writeln!(
            opf,
            "    <dc:identifier id=\"BookId\">{}</dc:identifier>",
            escape_xml(&metadata.identifier)
        );
    }

    // required for EPUB 3; fixed so output is reproducible
    opf.push_str("    <meta property=\"dcterms:modified\">2024-01-01T00:00:00Z</meta>\n");

    if !metadata.description.is_empty() {
        let _ = writeln!(
            opf,
            "    <dc:description>{}</dc:description>",
            escape_xml(&metadata.description)
        );
    }
    opf.push_str("  </metadata>\n");

    opf.push_str("  <manifest>\n");
    opf.push_str(
        "    <item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/>\n",
    );
    opf.push_str(
        "    <item id=\"nav\" href=\"nav.xhtml\" media-type=\"application/xhtml+xml\" properties=\"nav\"/>\n",
    );
    for section in sections {
        let properties = if section.remote_resources {
            " properties=\"remote-resources\""
        } else {
            ""
        };
        let _ = writeln!(
            opf,
            "    <item id=\"{}\" href=\"{}\" media-type=\"application/xhtml+xml\"{properties}/>",
            section.id, section.file
        );
    }
    opf.push_str("  </manifest>\n");

    opf.push_str("  <spine toc=\"ncx\">\n");
    for section in sections {
        let _ = writeln!(opf, "    <itemref idref=\"{}\"/>", section.id);
    }
    opf.push_str("  </spine>\n");

    opf.push_str("</package>\n");
    opf
}

/// Generate the EPUB 3 navigation document.
fn generate_nav(metadata: &Metadata, language: &str, sections: &[Section]) -> String {
    let mut nav = String::new();
    let _ = write!(
        nav,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" xml:lang="{lang}" lang="{lang}">
<head>
  <title>{title}</title>
</head>
<body>
  <nav epub:type="toc" id="toc">
    <ol>
"#,
        lang = escape_xml(language),
        title = escape_xml(&metadata.title),
    );

    for section in sections {
        let _ = write!(
            nav,
            "      <li><a href=\"{}\">{}</a>",
            section.file,
            escape_xml(&section.title)
        );
        if !section.children.is_empty() {
            nav.push_str("\n        <ol>\n");
            for child in &section.children {
                let _ = writeln!(
                    nav,
                    "          <li><a href=\"{}\">{}</a></li>",
                    escape_xml(&child.href),
                    escape_xml(&child.title)
                );
            }
            nav.push_str("        </ol>\n      ");
        }
        nav.push_str("</li>\n");
    }

    nav.push_str("    </ol>\n  </nav>\n</body>\n</html>\n");
    nav
}

/// Generate toc.ncx from the written sections.
fn generate_ncx(metadata: &Metadata, sections: &[Section]) -> String {
    let mut ncx = String::new();
    let depth = if sections.iter().any(|s| !s.children.is_empty()) {
        2
    } else {
        1
    };

    let _ = write!(
        ncx,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content="{uid}"/>
    <meta name="dtb:depth" content="{depth}"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
    <text>{title}</text>
  </docTitle>
  <navMap>
"#,
        uid = escape_xml(&metadata.identifier),
        title = escape_xml(&metadata.title),
    );

    let mut play_order = 1;
    for section in sections {
        write_nav_point(&mut ncx, &section.title, &section.file, &mut play_order, 2);
        let indent = "  ".repeat(2);
        for child in &section.children {
            write_nav_point(&mut ncx, &child.title, &child.href, &mut play_order, 3);
            ncx.push_str(&indent);
            ncx.push_str("  </navPoint>\n");
        }
        ncx.push_str(&indent);
        ncx.push_str("</navPoint>\n");
    }

    ncx.push_str("  </navMap>\n</ncx>\n");
    ncx
}

/// Open a navPoint; the caller closes it after writing any children.
fn write_nav_point(ncx: &mut String, title: &str, href: &str, play_order: &mut usize, indent: usize) {
    let indent_str = "  ".repeat(indent);
    let _ = writeln!(
        ncx,
        "{indent_str}<navPoint id=\"navPoint-{order}\" playOrder=\"{order}\">",
        order = play_order
    );
    let _ = writeln!(
        ncx,
        "{indent_str}  <navLabel><text>{}</text></navLabel>",
        escape_xml(title)
    );
    let _ = writeln!(ncx, "{indent_str}  <content src=\"{}\"/>", escape_xml(href));
    *play_order += 1;
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use zip::ZipArchive;

    use super::*;
    use crate::error::Error;
    use crate::model::{
        Body, Book, ContentRun, Image, InlineObject, ListMembership, Paragraph,
        StructuralElement, Table, TableCell, TableRow,
    };
    use crate::stream::stream;

    fn render_with(book: &Book, config: EpubConfig) -> Vec<u8> {
        let mut writer = Box::new(EpubWriter::new(config).unwrap());
        for event in stream(book) {
            writer.handle(&event).unwrap();
        }
        writer.finish().unwrap().as_bytes().to_vec()
    }

    fn render(content: Vec<StructuralElement>) -> Vec<u8> {
        let book = Book::new("book-1", "A & B").with_body(Body::new(content));
        render_with(&book, EpubConfig::default())
    }

    fn read_member(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut text = String::new();
        file.read_to_string(&mut text).unwrap();
        text
    }

    fn member_names(bytes: &[u8]) -> Vec<String> {
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        archive.file_names().map(str::to_string).collect()
    }

    #[test]
    fn test_mimetype_is_first_and_stored() {
        let bytes = render(vec![Paragraph::new().with_text("x").into()]);
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut first = archive.by_index(0).unwrap();
        assert_eq!(first.name(), "mimetype");
        assert_eq!(first.compression(), CompressionMethod::Stored);
        let mut content = String::new();
        first.read_to_string(&mut content).unwrap();
        assert_eq!(content, "application/epub+zip");
    }

    #[test]
    fn test_package_documents() {
        let bytes = render(vec![Paragraph::new().with_text("x").into()]);
        assert!(read_member(&bytes, "META-INF/container.xml").contains("OEBPS/content.opf"));

        let opf = read_member(&bytes, "OEBPS/content.opf");
        assert!(opf.contains("<dc:title id=\"title1\">A &amp; B</dc:title>"));
        assert!(opf.contains("<dc:identifier id=\"BookId\">book-1</dc:identifier>"));
        assert!(opf.contains("<dc:language>en</dc:language>"));
        assert!(opf.contains("properties=\"nav\""));
        assert!(opf.contains("<itemref idref=\"chapter_0\"/>"));

        let ncx = read_member(&bytes, "OEBPS/toc.ncx");
        assert!(ncx.contains("<content src=\"chapter_0.xhtml\"/>"));
    }

    #[test]
    fn test_sections_split_at_top_level_headings() {
        let nested_heading = Table {
            rows: vec![TableRow {
                cells: vec![TableCell {
                    content: vec![Paragraph::heading(1).with_text("Inside").into()],
                }],
            }],
        };
        let bytes = render(vec![
            Paragraph::new().with_text("Preface").into(),
            Paragraph::heading(1).with_text("One").into(),
            Paragraph::heading(2).with_text("One A").into(),
            Paragraph::new().with_text("body").into(),
            Paragraph::heading(1).with_text("Two").into(),
            nested_heading.into(),
            Paragraph::heading(1)
                .with_text("Listed")
                .in_list(ListMembership::new("l", 0))
                .into(),
        ]);

        let names = member_names(&bytes);
        assert!(names.contains(&"OEBPS/chapter_2.xhtml".to_string()));
        assert!(!names.contains(&"OEBPS/chapter_3.xhtml".to_string()));

        let first = read_member(&bytes, "OEBPS/chapter_0.xhtml");
        assert!(first.contains("<title>A &amp; B</title>"));
        assert!(first.contains("<p>Preface</p>"));

        let second = read_member(&bytes, "OEBPS/chapter_1.xhtml");
        assert!(second.contains("<title>One</title>"));
        assert!(second.contains("<h2 id=\"one-a\">One A</h2>"));

        let third = read_member(&bytes, "OEBPS/chapter_2.xhtml");
        assert!(third.contains("Inside"));
        assert!(third.contains("Listed"));

        let nav = read_member(&bytes, "OEBPS/nav.xhtml");
        assert!(nav.contains("<a href=\"chapter_1.xhtml\">One</a>"));
        assert!(nav.contains("<a href=\"chapter_1.xhtml#one-a\">One A</a>"));
        assert!(nav.contains("<a href=\"chapter_2.xhtml\">Two</a>"));
    }

    #[test]
    fn test_empty_book_has_one_section() {
        let bytes = render_with(&Book::new("b", "Empty"), EpubConfig::default());
        let names = member_names(&bytes);
        assert!(names.contains(&"OEBPS/chapter_0.xhtml".to_string()));
        assert!(!names.contains(&"OEBPS/chapter_1.xhtml".to_string()));
    }

    #[test]
    fn test_remote_images_and_language() {
        let book = Book::new("b", "T")
            .with_body(Body::new(vec![
                Paragraph::new()
                    .with_run(ContentRun::InlineObject(InlineObject {
                        object_id: "img".to_string(),
                    }))
                    .into(),
            ]))
            .with_image(Image::new("img", "https://example.com/a.png"));
        let bytes = render_with(&book, EpubConfig::default().with_language("fr"));
        let opf = read_member(&bytes, "OEBPS/content.opf");
        assert!(opf.contains("properties=\"remote-resources\""));
        assert!(opf.contains("<dc:language>fr</dc:language>"));
    }

    #[test]
    fn test_invalid_compression_level() {
        let err = EpubWriter::new(EpubConfig::default().with_compression_level(11))
            .err()
            .unwrap();
        assert!(matches!(err, Error::InvalidConfig { format: Format::Epub, .. }));
    }

    #[test]
    fn test_truncated_stream_fails_finish() {
        let book = Book::new("b", "T").with_body(Body::new(vec![
            Paragraph::new().with_text("x").into(),
        ]));
        let mut writer = Box::new(EpubWriter::new(EpubConfig::default()).unwrap());
        for event in stream(&book).take(2) {
            writer.handle(&event).unwrap();
        }
        assert!(matches!(writer.finish(), Err(Error::Truncated { open: 2 })));
    }
}
