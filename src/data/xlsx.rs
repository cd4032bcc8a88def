// XLSX encoder and decoder
// Author: Gabriel Demetrios Lafis

use std::borrow::Cow;
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use log::debug;
use quick_xml::escape::{escape, resolve_xml_entity};
use quick_xml::events::{BytesDecl, BytesEnd, BytesRef, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use thiserror::Error;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::{DataError, DataSet, DataSink, DataType, Field, Row, Schema, Value};

/// Mime type of `.xlsx` files
pub const XLSX_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Sheet name used when none is configured
pub const DEFAULT_SHEET_NAME: &str = "DadosFiltrados";

/// File name suggested for downloads when none is configured
pub const DEFAULT_EXPORT_FILE_NAME: &str = "dados_filtrados.xlsx";

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/><Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

// Style 1 is the bold header
const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#;

const APP_PROPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Application>lance-analyzer</Application></Properties>"#;

const TAG_SHEET: QName = QName(b"sheet");
const TAG_RELATIONSHIP: QName = QName(b"Relationship");
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");
const TAG_TEXT: QName = QName(b"t");
const TAG_ROW: QName = QName(b"row");
const TAG_CELL: QName = QName(b"c");
const TAG_VALUE: QName = QName(b"v");

/// Errors raised while encoding or decoding a workbook
#[derive(Error, Debug)]
pub enum XlsxError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Zip(#[from] ZipError),

    #[error("{0}")]
    Xml(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncoding(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("Invalid sheet name '{0}'")]
    InvalidSheetName(String),

    #[error("Workbook part '{0}' is missing")]
    MissingPart(String),

    #[error("Invalid cell reference '{0}'")]
    InvalidReference(String),

    #[error("Invalid value '{value}' in cell {reference}")]
    InvalidCell { reference: String, value: String },
}

/// Encodes a dataset as a single-sheet workbook
#[derive(Debug, Clone)]
pub struct XlsxEncoder {
    sheet_name: String,
}

impl Default for XlsxEncoder {
    fn default() -> Self {
        XlsxEncoder {
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
        }
    }
}

impl XlsxEncoder {
    /// Create an encoder writing to a sheet with the given name
    pub fn new(sheet_name: &str) -> Result<Self, XlsxError> {
        let invalid = sheet_name.is_empty()
            || sheet_name.chars().count() > 31
            || sheet_name.contains(|c| matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'));
        if invalid {
            return Err(XlsxError::InvalidSheetName(sheet_name.to_string()));
        }

        Ok(XlsxEncoder {
            sheet_name: sheet_name.to_string(),
        })
    }

    /// Sheet name written to the workbook
    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// Encode the dataset into an in-memory `.xlsx` file
    pub fn encode(&self, data: &DataSet) -> Result<Vec<u8>, XlsxError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let parts: [(&str, Cow<'_, str>); 7] = [
            ("[Content_Types].xml", Cow::Borrowed(CONTENT_TYPES)),
            ("_rels/.rels", Cow::Borrowed(ROOT_RELS)),
            ("docProps/app.xml", Cow::Borrowed(APP_PROPS)),
            ("docProps/core.xml", Cow::Owned(core_props())),
            ("xl/workbook.xml", Cow::Owned(self.workbook_xml())),
            ("xl/_rels/workbook.xml.rels", Cow::Borrowed(WORKBOOK_RELS)),
            ("xl/styles.xml", Cow::Borrowed(STYLES)),
        ];
        for (name, contents) in parts.iter() {
            zip.start_file(*name, options)?;
            zip.write_all(contents.as_bytes())?;
        }

        zip.start_file("xl/worksheets/sheet1.xml", options)?;
        zip.write_all(&worksheet_xml(data)?)?;

        let bytes = zip.finish()?.into_inner();
        debug!("Encoded {} rows into {} bytes", data.len(), bytes.len());
        Ok(bytes)
    }

    fn workbook_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
            NS_MAIN,
            escape(self.sheet_name.as_str())
        )
    }
}

/// Encode a dataset with the default sheet name
pub fn encode_spreadsheet(data: &DataSet) -> Result<Vec<u8>, DataError> {
    Ok(XlsxEncoder::default().encode(data)?)
}

/// Decode the first sheet of a workbook. The first row is the header.
pub fn decode_spreadsheet(bytes: &[u8]) -> Result<DataSet, DataError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    Ok(read_first_sheet(&mut archive)?)
}

impl From<ZipError> for DataError {
    fn from(err: ZipError) -> Self {
        DataError::Spreadsheet(XlsxError::Zip(err))
    }
}

/// Spreadsheet ready to be offered for download
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: &'static str,
    pub rows: usize,
}

impl ExportArtifact {
    /// Encode the dataset and attach the download name and mime type
    pub fn from_dataset(data: &DataSet, encoder: &XlsxEncoder, file_name: &str) -> Result<Self, DataError> {
        Ok(ExportArtifact {
            bytes: encoder.encode(data)?,
            file_name: file_name.to_string(),
            mime_type: XLSX_MIME_TYPE,
            rows: data.len(),
        })
    }

    /// Empty tables are still encoded, but not offered for download
    pub fn offer_download(&self) -> bool {
        self.rows > 0
    }
}

/// XLSX data sink writing to a file
pub struct XlsxSink {
    path: String,
    encoder: XlsxEncoder,
}

impl XlsxSink {
    /// Create a new XLSX data sink
    pub fn new<P: AsRef<Path>>(path: P, encoder: XlsxEncoder) -> Self {
        XlsxSink {
            path: path.as_ref().to_string_lossy().to_string(),
            encoder,
        }
    }
}

impl DataSink for XlsxSink {
    fn write(&self, data: &DataSet) -> Result<(), DataError> {
        let bytes = self.encoder.encode(data)?;
        let mut file = File::create(&self.path)?;
        file.write_all(&bytes)?;
        file.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.path
    }
}

fn core_props() -> String {
    let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:creator>lance-analyzer</dc:creator><dcterms:created xsi:type="dcterms:W3CDTF">{0}</dcterms:created><dcterms:modified xsi:type="dcterms:W3CDTF">{0}</dcterms:modified></cp:coreProperties>"#,
        now
    )
}

fn worksheet_xml(data: &DataSet) -> Result<Vec<u8>, XlsxError> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

    let mut worksheet = BytesStart::new("worksheet");
    worksheet.push_attribute(("xmlns", NS_MAIN));
    writer.write_event(Event::Start(worksheet))?;
    writer.write_event(Event::Start(BytesStart::new("sheetData")))?;

    let header: Vec<Value> = data
        .schema
        .fields
        .iter()
        .map(|field| Value::String(field.name.clone()))
        .collect();
    write_row(&mut writer, 1, &header, Some("1"))?;

    for (i, row) in data.data.iter().enumerate() {
        write_row(&mut writer, i + 2, &row.values, None)?;
    }

    writer.write_event(Event::End(BytesEnd::new("sheetData")))?;
    writer.write_event(Event::End(BytesEnd::new("worksheet")))?;
    Ok(writer.into_inner())
}

fn write_row(
    writer: &mut Writer<Vec<u8>>,
    row_number: usize,
    values: &[Value],
    style: Option<&str>,
) -> Result<(), XlsxError> {
    let row_number_text = row_number.to_string();
    let mut row = BytesStart::new("row");
    row.push_attribute(("r", row_number_text.as_str()));
    writer.write_event(Event::Start(row))?;

    for (col, value) in values.iter().enumerate() {
        let (kind, text) = match value {
            Value::Null => continue,
            // NaN and infinities have no cell representation and are left empty
            Value::Float(f) if !f.is_finite() => continue,
            Value::Boolean(b) => (Some("b"), if *b { "1".to_string() } else { "0".to_string() }),
            Value::Integer(i) => (None, i.to_string()),
            // Debug keeps a fraction or exponent, so whole floats stay floats on decode
            Value::Float(f) => (None, format!("{:?}", f)),
            Value::String(s) => (Some("inlineStr"), s.clone()),
        };

        let reference = format!("{}{}", column_name(col), row_number);
        let mut cell = BytesStart::new("c");
        cell.push_attribute(("r", reference.as_str()));
        if let Some(style) = style {
            cell.push_attribute(("s", style));
        }
        if let Some(kind) = kind {
            cell.push_attribute(("t", kind));
        }
        writer.write_event(Event::Start(cell))?;

        if kind == Some("inlineStr") {
            writer.write_event(Event::Start(BytesStart::new("is")))?;
            let mut t = BytesStart::new("t");
            t.push_attribute(("xml:space", "preserve"));
            writer.write_event(Event::Start(t))?;
            writer.write_event(Event::Text(BytesText::new(&text)))?;
            writer.write_event(Event::End(BytesEnd::new("t")))?;
            writer.write_event(Event::End(BytesEnd::new("is")))?;
        } else {
            writer.write_event(Event::Start(BytesStart::new("v")))?;
            writer.write_event(Event::Text(BytesText::new(&text)))?;
            writer.write_event(Event::End(BytesEnd::new("v")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("c")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("row")))?;
    Ok(())
}

/// Zero-based column index to spreadsheet letters (`0` → `A`, `26` → `AA`)
pub fn column_name(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// Parse an `A1`-style reference into zero-based (row, column)
pub fn parse_reference(reference: &str) -> Option<(usize, usize)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() {
        return None;
    }

    let mut col = 0usize;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        col = col * 26 + (c.to_ascii_uppercase() as u8 - b'A' + 1) as usize;
    }
    let row = digits.parse::<usize>().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, col - 1))
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<String>, XlsxError> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(Some(contents))
}

fn xml_reader(xml: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(xml);
    let config = reader.config_mut();
    config.expand_empty_elements = true;
    config.trim_text(false);
    reader
}

fn attribute(event: &BytesStart, name: &str) -> Result<Option<String>, XlsxError> {
    match event.try_get_attribute(name)? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

fn push_reference(text: &mut String, reference: &BytesRef) -> Result<(), XlsxError> {
    let raw = reference.xml_content()?;
    if let Some(number) = raw.strip_prefix('#') {
        let code = match number.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => number.parse::<u32>().ok(),
        };
        if let Some(c) = code.and_then(char::from_u32) {
            text.push(c);
        }
    } else if let Some(entity) = resolve_xml_entity(&raw) {
        text.push_str(entity);
    }
    Ok(())
}

/// Locate the worksheet part of the first sheet listed in the workbook
fn first_sheet_path<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<String, XlsxError> {
    let workbook = read_part(archive, "xl/workbook.xml")?
        .ok_or_else(|| XlsxError::MissingPart("xl/workbook.xml".to_string()))?;

    let mut relationship_id = None;
    let mut reader = xml_reader(&workbook);
    loop {
        match reader.read_event()? {
            Event::Start(event) if event.name() == TAG_SHEET => {
                relationship_id = attribute(&event, "r:id")?;
                break;
            }
            Event::Eof => break,
            _ => (),
        }
    }

    let fallback = "xl/worksheets/sheet1.xml".to_string();
    let relationship_id = match relationship_id {
        Some(id) => id,
        None => return Ok(fallback),
    };
    let rels = match read_part(archive, "xl/_rels/workbook.xml.rels")? {
        Some(rels) => rels,
        None => return Ok(fallback),
    };

    let mut reader = xml_reader(&rels);
    loop {
        match reader.read_event()? {
            Event::Start(event) if event.name() == TAG_RELATIONSHIP => {
                if attribute(&event, "Id")?.as_deref() == Some(relationship_id.as_str()) {
                    let target = attribute(&event, "Target")?.unwrap_or_default();
                    return Ok(match target.strip_prefix('/') {
                        Some(absolute) => absolute.to_string(),
                        None => format!("xl/{}", target),
                    });
                }
            }
            Event::Eof => break,
            _ => (),
        }
    }
    Ok(fallback)
}

fn read_shared_strings<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<String>, XlsxError> {
    let xml = match read_part(archive, "xl/sharedStrings.xml")? {
        Some(xml) => xml,
        None => return Ok(Vec::new()),
    };

    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut in_phonetic = false;
    let mut reader = xml_reader(&xml);
    loop {
        match reader.read_event()? {
            Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => current.clear(),
            Event::End(event) if event.name() == TAG_SHARED_STRING_ITEM => {
                strings.push(std::mem::take(&mut current));
            }
            Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => in_phonetic = true,
            Event::End(event) if event.name() == TAG_PHONETIC_TEXT => in_phonetic = false,
            Event::Start(event) if !in_phonetic && event.name() == TAG_TEXT => in_text = true,
            Event::End(event) if event.name() == TAG_TEXT => in_text = false,
            Event::Text(event) if in_text => current.push_str(&event.xml_content()?),
            Event::GeneralRef(event) if in_text => push_reference(&mut current, &event)?,
            Event::Eof => break,
            _ => (),
        }
    }
    Ok(strings)
}

fn cell_value(
    kind: Option<&str>,
    text: String,
    shared_strings: &[String],
    reference: &str,
) -> Result<Value, XlsxError> {
    let invalid = |text: &str| XlsxError::InvalidCell {
        reference: reference.to_string(),
        value: text.to_string(),
    };

    match kind {
        Some("s") => text
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|i| shared_strings.get(i))
            .map(|s| Value::String(s.clone()))
            .ok_or_else(|| invalid(&text)),
        Some("inlineStr") | Some("str") => Ok(Value::String(text)),
        Some("b") => Ok(Value::Boolean(text.trim() == "1")),
        Some("e") => Ok(Value::Null),
        _ => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Ok(Value::Null)
            } else if let Ok(i) = trimmed.parse::<i64>() {
                Ok(Value::Integer(i))
            } else {
                trimmed.parse::<f64>().map(Value::Float).map_err(|_| invalid(&text))
            }
        }
    }
}

fn read_first_sheet<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<DataSet, XlsxError> {
    let shared_strings = read_shared_strings(archive)?;
    let sheet_path = first_sheet_path(archive)?;
    let xml = read_part(archive, &sheet_path)?.ok_or_else(|| XlsxError::MissingPart(sheet_path.clone()))?;

    let mut cells: Vec<(usize, usize, Value)> = Vec::new();
    let mut row_count = 0usize;
    let mut current_row = 0usize;
    let mut col_cursor = 0usize;

    let mut in_cell = false;
    let mut in_text = false;
    let mut in_phonetic = false;
    let mut position = (0usize, 0usize);
    let mut reference = String::new();
    let mut kind: Option<String> = None;
    let mut text = String::new();

    let mut reader = xml_reader(&xml);
    loop {
        match reader.read_event()? {
            Event::Start(event) if event.name() == TAG_ROW => {
                current_row = match attribute(&event, "r")? {
                    Some(r) => r
                        .parse::<usize>()
                        .ok()
                        .filter(|r| *r > 0)
                        .map(|r| r - 1)
                        .ok_or(XlsxError::InvalidReference(r))?,
                    None => row_count,
                };
                row_count = row_count.max(current_row + 1);
                col_cursor = 0;
            }
            Event::Start(event) if event.name() == TAG_CELL => {
                position = match attribute(&event, "r")? {
                    Some(r) => parse_reference(&r).ok_or_else(|| XlsxError::InvalidReference(r.clone()))?,
                    None => (current_row, col_cursor),
                };
                reference = format!("{}{}", column_name(position.1), position.0 + 1);
                row_count = row_count.max(position.0 + 1);
                col_cursor = position.1 + 1;
                kind = attribute(&event, "t")?;
                text.clear();
                in_cell = true;
            }
            Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => in_phonetic = true,
            Event::End(event) if event.name() == TAG_PHONETIC_TEXT => in_phonetic = false,
            Event::Start(event) if in_cell && !in_phonetic && (event.name() == TAG_VALUE || event.name() == TAG_TEXT) => {
                in_text = true;
            }
            Event::End(event) if event.name() == TAG_VALUE || event.name() == TAG_TEXT => in_text = false,
            Event::Text(event) if in_text => text.push_str(&event.xml_content()?),
            Event::CData(event) if in_text => text.push_str(&event.xml_content()?),
            Event::GeneralRef(event) if in_text => push_reference(&mut text, &event)?,
            Event::End(event) if event.name() == TAG_CELL => {
                let value = cell_value(kind.as_deref(), std::mem::take(&mut text), &shared_strings, &reference)?;
                if !value.is_null() {
                    cells.push((position.0, position.1, value));
                }
                in_cell = false;
            }
            Event::Eof => break,
            _ => (),
        }
    }

    build_dataset(cells, row_count)
}

fn build_dataset(cells: Vec<(usize, usize, Value)>, row_count: usize) -> Result<DataSet, XlsxError> {
    let width = cells
        .iter()
        .filter(|(row, _, _)| *row == 0)
        .map(|(_, col, _)| col + 1)
        .max()
        .unwrap_or(0);

    let mut header = vec![String::new(); width];
    let mut grid = vec![vec![Value::Null; width]; row_count.saturating_sub(1)];
    for (row, col, value) in cells {
        if col >= width {
            continue;
        }
        if row == 0 {
            header[col] = value.to_string();
        } else {
            grid[row - 1][col] = value;
        }
    }

    let fields = header
        .into_iter()
        .enumerate()
        .map(|(col, name)| {
            let data_type = infer_type(grid.iter().map(|row| &row[col]));
            let nullable = grid.iter().any(|row| row[col].is_null());
            Field::new(name, data_type, nullable)
        })
        .collect();

    let mut dataset = DataSet::new(Schema::new(fields));
    for values in grid {
        dataset.data.push(Row::new(values));
    }
    dataset.metadata.add("source".to_string(), "xlsx".to_string());
    Ok(dataset)
}

fn infer_type<'a>(values: impl Iterator<Item = &'a Value>) -> DataType {
    let mut data_type: Option<DataType> = None;
    for value in values {
        let next = match value {
            Value::Null => continue,
            Value::Boolean(_) => DataType::Boolean,
            Value::Integer(_) => DataType::Integer,
            Value::Float(_) => DataType::Float,
            Value::String(_) => DataType::String,
        };
        data_type = Some(match (data_type, next) {
            (None, next) => next,
            (Some(a), b) if a == b => a,
            (Some(DataType::Integer), DataType::Float) | (Some(DataType::Float), DataType::Integer) => DataType::Float,
            _ => DataType::String,
        });
    }
    data_type.unwrap_or(DataType::String)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataSet {
        let mut dataset = DataSet::new(Schema::new(vec![
            Field::new("grupo".to_string(), DataType::String, true),
            Field::new("lance máx".to_string(), DataType::Float, false),
            Field::new("prazo rest".to_string(), DataType::Integer, false),
        ]));
        dataset
            .add_row(Row::new(vec![
                Value::String("A & <B>".to_string()),
                Value::Float(20.0),
                Value::Integer(30),
            ]))
            .unwrap();
        dataset
            .add_row(Row::new(vec![Value::Null, Value::Float(12.5), Value::Integer(10)]))
            .unwrap();
        dataset
    }

    #[test]
    fn column_names_and_references() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
        assert_eq!(parse_reference("A1"), Some((0, 0)));
        assert_eq!(parse_reference("AA10"), Some((9, 26)));
        assert_eq!(parse_reference("10"), None);
        assert_eq!(parse_reference("A0"), None);
    }

    #[test]
    fn round_trip_keeps_header_rows_and_values() {
        let original = sample();
        let bytes = encode_spreadsheet(&original).unwrap();
        let decoded = decode_spreadsheet(&bytes).unwrap();

        assert_eq!(decoded.column_names(), original.column_names());
        assert_eq!(decoded.len(), original.len());
        assert_eq!(decoded.data, original.data);
        assert_eq!(decoded.schema.fields[1].data_type, DataType::Float);
        assert_eq!(decoded.schema.fields[2].data_type, DataType::Integer);
    }

    #[test]
    fn non_finite_floats_come_back_empty() {
        let mut data = sample().empty_like();
        data.add_row(Row::new(vec![Value::String("A".to_string()), Value::Float(f64::NAN), Value::Integer(1)]))
            .unwrap();
        data.add_row(Row::new(vec![Value::String("B".to_string()), Value::Float(f64::INFINITY), Value::Integer(2)]))
            .unwrap();
        data.add_row(Row::new(vec![Value::String("C".to_string()), Value::Float(7.5), Value::Integer(3)]))
            .unwrap();

        let decoded = decode_spreadsheet(&encode_spreadsheet(&data).unwrap()).unwrap();

        // NaN and infinity are written as empty cells and read back as nulls
        assert_eq!(
            decoded.column("lance máx").unwrap(),
            vec![&Value::Null, &Value::Null, &Value::Float(7.5)]
        );
        assert_eq!(decoded.schema.fields[1].data_type, DataType::Float);
    }

    #[test]
    fn zero_rows_produce_header_only_sheet() {
        let empty = sample().empty_like();
        let decoded = decode_spreadsheet(&encode_spreadsheet(&empty).unwrap()).unwrap();

        assert_eq!(decoded.column_names(), vec!["grupo", "lance máx", "prazo rest"]);
        assert!(decoded.is_empty());
    }

    #[test]
    fn no_columns_at_all() {
        let decoded = decode_spreadsheet(&encode_spreadsheet(&DataSet::empty()).unwrap()).unwrap();
        assert!(decoded.schema.fields.is_empty());
        assert!(decoded.is_empty());
    }

    #[test]
    fn workbook_carries_configured_sheet_name() {
        let encoder = XlsxEncoder::new("Lances & prazos").unwrap();
        let bytes = encoder.encode(&sample()).unwrap();

        let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let workbook = read_part(&mut archive, "xl/workbook.xml").unwrap().unwrap();
        assert!(workbook.contains(r#"name="Lances &amp; prazos""#));
    }

    #[test]
    fn rejects_invalid_sheet_names() {
        assert!(XlsxEncoder::new("").is_err());
        assert!(XlsxEncoder::new("a/b").is_err());
        assert!(XlsxEncoder::new(&"x".repeat(32)).is_err());
    }

    #[test]
    fn artifact_withholds_empty_downloads() {
        let encoder = XlsxEncoder::default();
        let full = ExportArtifact::from_dataset(&sample(), &encoder, DEFAULT_EXPORT_FILE_NAME).unwrap();
        let empty = ExportArtifact::from_dataset(&sample().empty_like(), &encoder, DEFAULT_EXPORT_FILE_NAME).unwrap();

        assert!(full.offer_download());
        assert!(!empty.offer_download());
        assert!(!empty.bytes.is_empty());
        assert_eq!(full.mime_type, XLSX_MIME_TYPE);
        assert_eq!(full.file_name, "dados_filtrados.xlsx");
    }

    #[test]
    fn garbage_is_not_a_workbook() {
        assert!(decode_spreadsheet(b"not a zip file").is_err());
    }
}
