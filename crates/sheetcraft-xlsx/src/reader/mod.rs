//! XLSX reader

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::styles::read_styles_xml;
use sheetcraft_core::style::Style;
use sheetcraft_core::{CellAddress, CellError, CellRange, CellValue, Workbook, Worksheet};

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// Excel uses this format to encode special characters in XML:
/// - `_x000d_` = CR (carriage return)
/// - `_x000a_` = LF (line feed)
/// - `_x0009_` = Tab
/// - `_x005f_` = Underscore (escaped underscore)
fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find("_x") {
        result.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let decoded = tail
            .get(2..6)
            .filter(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()))
            .filter(|_| tail.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);
        match decoded {
            Some(c) => {
                result.push(c);
                rest = &tail[7..];
            }
            None => {
                result.push('_');
                rest = &tail[1..];
            }
        }
    }
    result.push_str(rest);
    result
}

fn is_true(v: &str) -> bool {
    v == "1" || v.eq_ignore_ascii_case("true")
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn attr_parse<T: std::str::FromStr>(e: &BytesStart<'_>, key: &[u8]) -> Option<T> {
    attr_value(e, key).and_then(|v| v.parse().ok())
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let file = File::open(path)?;
        Self::read(file)
    }

    /// Read a workbook from in-memory bytes
    pub fn read_bytes(bytes: &[u8]) -> XlsxResult<Workbook> {
        Self::read(std::io::Cursor::new(bytes))
    }

    /// Read a workbook from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let mut archive = zip::ZipArchive::new(reader)?;

        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let shared_strings = Self::read_shared_strings(&mut archive)?;
        let cell_styles = Self::read_styles(&mut archive)?;
        let sheet_info = Self::read_workbook_xml(&mut archive)?;
        let sheet_paths = Self::read_workbook_rels(&mut archive)?;

        let mut workbook = Workbook::empty();
        for (name, r_id) in &sheet_info {
            let Some(path) = sheet_paths.get(r_id) else {
                log::warn!("sheet '{}' has no worksheet part ({}); skipped", name, r_id);
                continue;
            };
            let sheet_idx = workbook.add_worksheet_with_name(name)?;
            let worksheet = workbook
                .worksheet_mut(sheet_idx)
                .ok_or_else(|| XlsxError::InvalidFormat(format!("Sheet not found: {}", name)))?;
            Self::read_worksheet(
                &mut archive,
                path,
                worksheet,
                &shared_strings,
                &cell_styles,
            )?;
        }

        if workbook.is_empty() {
            workbook.add_worksheet_with_name("Sheet1")?;
        }

        log::debug!(
            "read workbook: {} sheets, {} shared strings, {} cell styles",
            workbook.sheet_count(),
            shared_strings.len(),
            cell_styles.len()
        );
        Ok(workbook)
    }

    /// Read the shared strings table
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<String>> {
        let mut strings = Vec::new();

        let file = match archive.by_name("xl/sharedStrings.xml") {
            Ok(f) => f,
            Err(_) => return Ok(strings),
        };

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut current = String::new();
        let mut in_si = false;
        let mut in_t = false;
        // Phonetic runs (<rPh>) carry readings, not cell text
        let mut in_phonetic = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current.clear();
                    }
                    b"rPh" => in_phonetic = true,
                    b"t" if in_si && !in_phonetic => in_t = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.name().as_ref() == b"si" => {
                    strings.push(String::new());
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"si" => {
                        strings.push(decode_excel_escapes(&current));
                        current.clear();
                        in_si = false;
                    }
                    b"rPh" => in_phonetic = false,
                    b"t" => in_t = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => {
                    if let Ok(text) = e.unescape() {
                        current.push_str(&text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(strings)
    }

    fn read_styles<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> XlsxResult<Vec<Style>> {
        match archive.by_name("xl/styles.xml") {
            Ok(file) => read_styles_xml(file),
            Err(_) => Ok(vec![Style::default()]),
        }
    }

    /// Sheet names and relationship ids, in workbook order
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<(String, String)>> {
        let file = archive
            .by_name("xl/workbook.xml")
            .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"sheet" => {
                    if let (Some(name), Some(r_id)) =
                        (attr_value(&e, b"name"), attr_value(&e, b"r:id"))
                    {
                        sheets.push((name, r_id));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(sheets)
    }

    /// Worksheet part paths keyed by relationship id
    fn read_workbook_rels<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<HashMap<String, String>> {
        let file = archive
            .by_name("xl/_rels/workbook.xml.rels")
            .map_err(|_| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let id = attr_value(&e, b"Id");
                    let target = attr_value(&e, b"Target");
                    let rel_type = attr_value(&e, b"Type");
                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        if rel_type.ends_with("/worksheet") {
                            // Relative targets resolve against xl/
                            let full_path = match target.strip_prefix('/') {
                                Some(absolute) => absolute.to_string(),
                                None => format!("xl/{}", target),
                            };
                            rels.insert(id, full_path);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    fn read_worksheet<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
        worksheet: &mut Worksheet,
        shared_strings: &[String],
        cell_styles: &[Style],
    ) -> XlsxResult<()> {
        let file = archive
            .by_name(path)
            .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut parser = SheetParser {
            worksheet,
            shared_strings,
            cell_styles,
            xf_to_local: HashMap::new(),
            cell: None,
            text_target: None,
        };

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => parser.start(&e)?,
                Ok(Event::Empty(e)) => {
                    parser.start(&e)?;
                    parser.end(e.name().as_ref())?;
                }
                Ok(Event::End(e)) => parser.end(e.name().as_ref())?,
                Ok(Event::Text(e)) => {
                    if let Ok(text) = e.unescape() {
                        parser.text(&text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(())
    }
}

/// Which child of `<c>` is collecting text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextTarget {
    Value,
    Formula,
    InlineText,
}

#[derive(Debug, Default)]
struct PendingCell {
    reference: Option<String>,
    cell_type: Option<String>,
    style: Option<u32>,
    value: Option<String>,
    formula: Option<String>,
    in_inline_str: bool,
}

/// Streaming state for one worksheet part. Self-closing elements are fed
/// to `start` and then `end`.
struct SheetParser<'a> {
    worksheet: &'a mut Worksheet,
    shared_strings: &'a [String],
    cell_styles: &'a [Style],
    /// Workbook xf id -> index in this sheet's style pool
    xf_to_local: HashMap<u32, u32>,
    cell: Option<PendingCell>,
    text_target: Option<TextTarget>,
}

impl SheetParser<'_> {
    fn start(&mut self, e: &BytesStart<'_>) -> XlsxResult<()> {
        match e.name().as_ref() {
            b"row" => {
                if let Some(r) = attr_parse::<u32>(e, b"r") {
                    let row_idx = r.saturating_sub(1);
                    let custom_height = attr_value(e, b"customHeight").is_some_and(|v| is_true(&v));
                    if custom_height {
                        if let Some(h) = attr_parse::<f64>(e, b"ht") {
                            self.worksheet.set_row_height(row_idx, h);
                        }
                    }
                    if attr_value(e, b"hidden").is_some_and(|v| is_true(&v)) {
                        self.worksheet.set_row_hidden(row_idx, true);
                    }
                }
            }
            b"col" => {
                let (Some(min), Some(max)) = (attr_parse::<u16>(e, b"min"), attr_parse::<u16>(e, b"max"))
                else {
                    return Ok(());
                };
                let custom_width = attr_value(e, b"customWidth").is_some_and(|v| is_true(&v));
                let width = attr_parse::<f64>(e, b"width");
                let hidden = attr_value(e, b"hidden").is_some_and(|v| is_true(&v));
                // min/max are 1-based and inclusive
                for col in min..=max.min(sheetcraft_core::MAX_COLS) {
                    let col_idx = col.saturating_sub(1);
                    if let (true, Some(w)) = (custom_width, width) {
                        self.worksheet.set_column_width(col_idx, w);
                    }
                    if hidden {
                        self.worksheet.set_column_hidden(col_idx, true);
                    }
                }
            }
            b"c" => {
                self.cell = Some(PendingCell {
                    reference: attr_value(e, b"r"),
                    cell_type: attr_value(e, b"t"),
                    style: attr_parse(e, b"s"),
                    ..PendingCell::default()
                });
            }
            b"v" if self.cell.is_some() => self.text_target = Some(TextTarget::Value),
            b"f" if self.cell.is_some() => self.text_target = Some(TextTarget::Formula),
            b"is" => {
                if let Some(cell) = self.cell.as_mut() {
                    cell.in_inline_str = true;
                    cell.cell_type = Some("inlineStr".to_string());
                }
            }
            b"t" if self.cell.as_ref().is_some_and(|c| c.in_inline_str) => {
                self.text_target = Some(TextTarget::InlineText)
            }
            b"rPh" => {
                // Phonetic hints inside inline strings are not cell text
                if let Some(cell) = self.cell.as_mut() {
                    cell.in_inline_str = false;
                }
            }
            b"mergeCell" => {
                if let Some(range) = attr_value(e, b"ref").and_then(|r| CellRange::parse(&r).ok()) {
                    if let Err(err) = self.worksheet.merge_cells(&range) {
                        log::warn!("skipping merge {}: {}", range, err);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        let (Some(cell), Some(target)) = (self.cell.as_mut(), self.text_target) else {
            return;
        };
        let slot = match target {
            TextTarget::Value | TextTarget::InlineText => &mut cell.value,
            TextTarget::Formula => &mut cell.formula,
        };
        slot.get_or_insert_with(String::new).push_str(text);
    }

    fn end(&mut self, name: &[u8]) -> XlsxResult<()> {
        match name {
            b"c" => {
                if let Some(cell) = self.cell.take() {
                    self.process_cell(cell)?;
                }
                self.text_target = None;
            }
            b"v" | b"f" | b"t" => self.text_target = None,
            b"is" => {
                if let Some(cell) = self.cell.as_mut() {
                    cell.in_inline_str = false;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Store one parsed `<c>` in the worksheet
    fn process_cell(&mut self, cell: PendingCell) -> XlsxResult<()> {
        let Some(cell_ref) = cell.reference.as_deref() else {
            return Ok(());
        };
        let addr = CellAddress::parse(cell_ref).map_err(|e| {
            XlsxError::Parse(format!("Invalid cell reference '{}': {}", cell_ref, e))
        })?;
        let cell_type = cell.cell_type.as_deref();

        if let Some(formula) = cell.formula {
            let cached = cell
                .value
                .as_deref()
                .and_then(|v| self.cached_value(cell_type, v));
            let text = formula.strip_prefix('=').unwrap_or(&formula).to_string();
            self.worksheet.set_cell_value_at(
                addr.row,
                addr.col,
                CellValue::Formula {
                    text,
                    cached_value: cached.map(Box::new),
                },
            )?;
        } else if let Some(value) = cell.value.as_deref() {
            let cell_value = match cell_type {
                Some("s") => {
                    let idx: usize = value.trim().parse().map_err(|_| {
                        XlsxError::Parse(format!("Invalid shared string index: {}", value))
                    })?;
                    let s = self.shared_strings.get(idx).ok_or_else(|| {
                        XlsxError::Parse(format!("Shared string index {} out of bounds", idx))
                    })?;
                    CellValue::string(s.as_str())
                }
                Some("b") => CellValue::Boolean(is_true(value.trim())),
                Some("e") => CellError::parse(value.trim())
                    .map(CellValue::Error)
                    .unwrap_or_else(|| CellValue::string(value)),
                Some("inlineStr") | Some("str") => CellValue::string(decode_excel_escapes(value)),
                None | Some("n") => match value.trim().parse::<f64>() {
                    Ok(n) => CellValue::Number(n),
                    Err(_) => CellValue::string(value),
                },
                // ISO 8601 date cells and anything unknown keep their text
                Some(_) => CellValue::string(value),
            };
            self.worksheet
                .set_cell_value_at(addr.row, addr.col, cell_value)?;
        } else if cell_type == Some("inlineStr") {
            // `<is><t/></is>` is an empty string, not a blank cell
            self.worksheet
                .set_cell_value_at(addr.row, addr.col, CellValue::string(""))?;
        }

        if let Some(xf) = cell.style.filter(|&s| s != 0) {
            let local = self.local_style_index(xf)?;
            self.worksheet
                .set_cell_style_index_at(addr.row, addr.col, local)?;
        }

        Ok(())
    }

    fn cached_value(&self, cell_type: Option<&str>, v: &str) -> Option<CellValue> {
        match cell_type {
            Some("b") => Some(CellValue::Boolean(is_true(v))),
            Some("e") => CellError::parse(v).map(CellValue::Error),
            Some("s") => {
                let idx: usize = v.parse().ok()?;
                self.shared_strings.get(idx).map(|s| CellValue::string(s.as_str()))
            }
            Some("str") | Some("inlineStr") => Some(CellValue::string(decode_excel_escapes(v))),
            None | Some("n") => v.parse::<f64>().ok().map(CellValue::Number),
            Some(_) => Some(CellValue::string(v)),
        }
    }

    /// Register a workbook xf in this sheet's pool once and reuse the index
    fn local_style_index(&mut self, xf: u32) -> XlsxResult<u32> {
        if let Some(&local) = self.xf_to_local.get(&xf) {
            return Ok(local);
        }
        let style = self
            .cell_styles
            .get(xf as usize)
            .ok_or_else(|| XlsxError::Parse(format!("Style index {} out of bounds", xf)))?;
        let local = self.worksheet.register_style(style.clone()).index();
        self.xf_to_local.insert(xf, local);
        Ok(local)
    }
}
