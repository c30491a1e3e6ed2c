//! XLSX styles (styles.xml) read/write helpers

use std::collections::HashMap;
use std::io::{BufReader, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use sheetcraft_core::style::{
    Alignment, BorderEdge, BorderLineStyle, BorderStyle, Color, DiagonalDirection, FillStyle,
    FontStyle, HorizontalAlignment, NumberFormat, PatternType, Protection, ReadingOrder, Style,
    Underline, VerticalAlignment,
};
use sheetcraft_core::Workbook;

/// First id available to custom number formats
const FIRST_CUSTOM_NUMFMT_ID: u32 = 164;

// === Writing ===

/// Workbook-wide `cellXfs` table built from every worksheet's style pool
#[derive(Debug)]
pub(crate) struct XlsxStyleTable {
    /// Deduplicated styles; position is the xf id
    styles: Vec<Style>,
    /// Per worksheet: local style index -> xf id
    sheet_maps: Vec<HashMap<u32, u32>>,
}

#[derive(Debug, Clone, Copy)]
struct ResolvedXfIds {
    font_id: u32,
    fill_id: u32,
    border_id: u32,
    num_fmt_id: u32,
}

/// Insert-or-get into a dedup table, returning the item's id
fn intern<T: Clone + Eq + std::hash::Hash>(
    items: &mut Vec<T>,
    ids: &mut HashMap<T, u32>,
    item: &T,
) -> u32 {
    if let Some(&id) = ids.get(item) {
        return id;
    }
    let id = items.len() as u32;
    items.push(item.clone());
    ids.insert(item.clone(), id);
    id
}

impl XlsxStyleTable {
    pub(crate) fn build(workbook: &Workbook) -> Self {
        let mut styles: Vec<Style> = Vec::new();
        let mut style_to_xf: HashMap<Style, u32> = HashMap::new();
        intern(&mut styles, &mut style_to_xf, &Style::default());

        let mut sheet_maps = Vec::with_capacity(workbook.sheet_count());
        for sheet in workbook.worksheets() {
            let mut map: HashMap<u32, u32> = HashMap::new();
            map.insert(0, 0);

            for (_row, _col, cell) in sheet.iter_cells() {
                let local_idx = cell.style_index;
                if map.contains_key(&local_idx) {
                    continue;
                }
                let xf_id = match sheet.style_by_index(local_idx) {
                    Some(style) => intern(&mut styles, &mut style_to_xf, style),
                    None => 0,
                };
                map.insert(local_idx, xf_id);
            }
            sheet_maps.push(map);
        }

        log::debug!(
            "built style table: {} xfs across {} sheets",
            styles.len(),
            sheet_maps.len()
        );
        Self { styles, sheet_maps }
    }

    pub(crate) fn xf_id_for(&self, sheet_index: usize, local_style_index: u32) -> u32 {
        self.sheet_maps
            .get(sheet_index)
            .and_then(|m| m.get(&local_style_index).copied())
            .unwrap_or(0)
    }

    pub(crate) fn to_styles_xml(&self) -> String {
        let mut fonts: Vec<FontStyle> = Vec::new();
        let mut font_ids: HashMap<FontStyle, u32> = HashMap::new();
        intern(&mut fonts, &mut font_ids, &FontStyle::default());

        // Excel expects fills 0 and 1 to be none and gray125
        let mut fills: Vec<FillStyle> = vec![
            FillStyle::None,
            FillStyle::Pattern {
                pattern: PatternType::Gray125,
                foreground: Color::Auto,
                background: Color::Auto,
            },
        ];
        let mut fill_ids: HashMap<FillStyle, u32> = HashMap::new();
        fill_ids.insert(FillStyle::None, 0);

        let mut borders: Vec<BorderStyle> = Vec::new();
        let mut border_ids: HashMap<BorderStyle, u32> = HashMap::new();
        intern(&mut borders, &mut border_ids, &BorderStyle::default());

        let mut numfmt_ids: HashMap<String, u32> = HashMap::new();
        let mut numfmts: Vec<(u32, String)> = Vec::new();

        let resolved: Vec<ResolvedXfIds> = self
            .styles
            .iter()
            .map(|style| {
                let num_fmt_id = match &style.number_format {
                    NumberFormat::General => 0,
                    NumberFormat::BuiltIn(id) => *id,
                    NumberFormat::Custom(code) => match numfmt_ids.get(code) {
                        Some(&id) => id,
                        None => {
                            let id = FIRST_CUSTOM_NUMFMT_ID + numfmts.len() as u32;
                            numfmt_ids.insert(code.clone(), id);
                            numfmts.push((id, code.clone()));
                            id
                        }
                    },
                };
                ResolvedXfIds {
                    font_id: intern(&mut fonts, &mut font_ids, &style.font),
                    fill_id: intern(&mut fills, &mut fill_ids, &style.fill),
                    border_id: intern(&mut borders, &mut border_ids, &style.border),
                    num_fmt_id,
                }
            })
            .collect();

        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        if !numfmts.is_empty() {
            xml.push_str(&format!("\n  <numFmts count=\"{}\">", numfmts.len()));
            for (id, code) in &numfmts {
                xml.push_str(&format!(
                    "\n    <numFmt numFmtId=\"{}\" formatCode=\"{}\"/>",
                    id,
                    escape_xml_attr(code)
                ));
            }
            xml.push_str("\n  </numFmts>");
        }

        push_section(&mut xml, "fonts", fonts.iter().map(write_font));
        push_section(&mut xml, "fills", fills.iter().map(write_fill));
        push_section(&mut xml, "borders", borders.iter().map(write_border));

        xml.push_str(
            r#"
  <cellStyleXfs count="1">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
  </cellStyleXfs>"#,
        );

        push_section(
            &mut xml,
            "cellXfs",
            self.styles
                .iter()
                .zip(&resolved)
                .map(|(style, ids)| write_xf(style, *ids)),
        );

        xml.push_str(
            r#"
  <cellStyles count="1">
    <cellStyle name="Normal" xfId="0" builtinId="0"/>
  </cellStyles>
  <dxfs count="0"/>
  <tableStyles count="0" defaultTableStyle="TableStyleMedium9" defaultPivotStyle="PivotStyleLight16"/>
</styleSheet>"#,
        );
        xml
    }
}

fn push_section<I: ExactSizeIterator<Item = String>>(xml: &mut String, tag: &str, items: I) {
    xml.push_str(&format!("\n  <{} count=\"{}\">", tag, items.len()));
    for item in items {
        xml.push_str("\n    ");
        xml.push_str(&item);
    }
    xml.push_str(&format!("\n  </{}>", tag));
}

fn escape_xml_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn color_attrs(color: &Color) -> String {
    if let Some(argb) = color.to_argb_hex() {
        return format!(" rgb=\"{}\"", argb);
    }
    match color {
        Color::Indexed(i) => format!(" indexed=\"{}\"", i),
        Color::Theme { index, tint: 0 } => format!(" theme=\"{}\"", index),
        Color::Theme { index, tint } => {
            format!(" theme=\"{}\" tint=\"{}\"", index, f64::from(*tint) / 100.0)
        }
        _ => " indexed=\"64\"".to_string(),
    }
}

fn write_color(tag: &str, color: &Color) -> String {
    format!("<{}{}/>", tag, color_attrs(color))
}

fn write_font(font: &FontStyle) -> String {
    let mut s = String::from("<font>");
    if font.bold {
        s.push_str("<b/>");
    }
    if font.italic {
        s.push_str("<i/>");
    }
    if font.strikethrough {
        s.push_str("<strike/>");
    }
    if font.underline != Underline::None {
        match font.underline.as_ooxml() {
            Some(val) => s.push_str(&format!("<u val=\"{}\"/>", val)),
            None => s.push_str("<u/>"),
        }
    }
    s.push_str(&format!("<sz val=\"{}\"/>", font.size));
    if !font.color.is_auto() {
        s.push_str(&write_color("color", &font.color));
    }
    s.push_str(&format!("<name val=\"{}\"/>", escape_xml_attr(&font.name)));
    s.push_str("</font>");
    s
}

fn write_fill(fill: &FillStyle) -> String {
    match fill {
        FillStyle::None => "<fill><patternFill patternType=\"none\"/></fill>".to_string(),
        FillStyle::Solid { color } => format!(
            "<fill><patternFill patternType=\"solid\">{}<bgColor indexed=\"64\"/></patternFill></fill>",
            write_color("fgColor", color)
        ),
        FillStyle::Pattern {
            pattern,
            foreground,
            background,
        } => format!(
            "<fill><patternFill patternType=\"{}\">{}{}</patternFill></fill>",
            pattern.as_ooxml(),
            write_color("fgColor", foreground),
            write_color("bgColor", background)
        ),
    }
}

fn write_border_edge(tag: &str, edge: &Option<BorderEdge>) -> String {
    match edge.as_ref().and_then(|e| e.style.as_ooxml().map(|st| (st, e))) {
        Some((style, e)) => format!(
            "<{tag} style=\"{}\">{}</{tag}>",
            style,
            write_color("color", &e.color)
        ),
        None => format!("<{tag}/>"),
    }
}

fn write_border(border: &BorderStyle) -> String {
    let attrs = match border.diagonal_direction {
        DiagonalDirection::None => "",
        DiagonalDirection::Down => " diagonalDown=\"1\"",
        DiagonalDirection::Up => " diagonalUp=\"1\"",
        DiagonalDirection::Both => " diagonalDown=\"1\" diagonalUp=\"1\"",
    };

    let mut s = format!("<border{}>", attrs);
    for (tag, edge) in border.edges() {
        s.push_str(&write_border_edge(tag, edge));
    }
    s.push_str("</border>");
    s
}

fn write_alignment(al: &Alignment) -> String {
    let default = Alignment::default();
    if al == &default {
        return String::new();
    }

    let mut s = String::from("<alignment");
    if al.horizontal != default.horizontal {
        s.push_str(&format!(" horizontal=\"{}\"", al.horizontal.as_ooxml()));
    }
    if al.vertical != default.vertical {
        s.push_str(&format!(" vertical=\"{}\"", al.vertical.as_ooxml()));
    }
    if al.wrap_text {
        s.push_str(" wrapText=\"1\"");
    }
    if al.shrink_to_fit {
        s.push_str(" shrinkToFit=\"1\"");
    }
    if al.indent != 0 {
        s.push_str(&format!(" indent=\"{}\"", al.indent));
    }
    if al.rotation != 0 {
        s.push_str(&format!(" textRotation=\"{}\"", al.rotation));
    }
    match al.reading_order {
        ReadingOrder::ContextDependent => {}
        ReadingOrder::LeftToRight => s.push_str(" readingOrder=\"1\""),
        ReadingOrder::RightToLeft => s.push_str(" readingOrder=\"2\""),
    }
    s.push_str("/>");
    s
}

fn write_protection(p: &Protection) -> String {
    let default = Protection::default();
    if p == &default {
        return String::new();
    }
    let mut s = String::from("<protection");
    if p.locked != default.locked {
        s.push_str(&format!(" locked=\"{}\"", u8::from(p.locked)));
    }
    if p.hidden != default.hidden {
        s.push_str(&format!(" hidden=\"{}\"", u8::from(p.hidden)));
    }
    s.push_str("/>");
    s
}

fn write_xf(style: &Style, ids: ResolvedXfIds) -> String {
    let mut attrs = String::new();
    if ids.num_fmt_id != 0 {
        attrs.push_str(" applyNumberFormat=\"1\"");
    }
    if style.font != FontStyle::default() {
        attrs.push_str(" applyFont=\"1\"");
    }
    if !style.fill.is_none() {
        attrs.push_str(" applyFill=\"1\"");
    }
    if style.border != BorderStyle::default() {
        attrs.push_str(" applyBorder=\"1\"");
    }
    if style.alignment != Alignment::default() {
        attrs.push_str(" applyAlignment=\"1\"");
    }
    if style.protection != Protection::default() {
        attrs.push_str(" applyProtection=\"1\"");
    }

    let mut s = format!(
        "<xf numFmtId=\"{}\" fontId=\"{}\" fillId=\"{}\" borderId=\"{}\" xfId=\"0\"{}",
        ids.num_fmt_id, ids.font_id, ids.fill_id, ids.border_id, attrs
    );

    let inner = write_alignment(&style.alignment) + &write_protection(&style.protection);
    if inner.is_empty() {
        s.push_str("/>");
    } else {
        s.push('>');
        s.push_str(&inner);
        s.push_str("</xf>");
    }
    s
}

// === Reading ===

/// A `<xf>` of `cellXfs` before its component ids are resolved
#[derive(Debug, Default)]
struct PendingXf {
    num_fmt_id: u32,
    font_id: u32,
    fill_id: u32,
    border_id: u32,
    alignment: Alignment,
    protection: Protection,
}

#[derive(Debug)]
struct PendingFill {
    pattern: Option<PatternType>,
    fg: Color,
    bg: Color,
}

/// Streaming state for styles.xml. Self-closing elements are fed to
/// `start` and then `end`, so both event kinds share one code path.
#[derive(Debug, Default)]
struct StylesParser {
    numfmts: HashMap<u32, String>,
    fonts: Vec<FontStyle>,
    fills: Vec<FillStyle>,
    borders: Vec<BorderStyle>,
    cell_xfs: Vec<Style>,

    in_cell_xfs: bool,
    font: Option<FontStyle>,
    fill: Option<PendingFill>,
    border: Option<BorderStyle>,
    border_edge: Option<&'static str>,
    xf: Option<PendingXf>,
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

/// `<b/>`, `<b val="1"/>` and `<b val="true"/>` are on; `val="0"` is off
fn flag_on(e: &BytesStart<'_>) -> bool {
    !matches!(attr_value(e, b"val").as_deref(), Some("0") | Some("false"))
}

impl StylesParser {
    fn start(&mut self, e: &BytesStart<'_>) {
        match e.name().as_ref() {
            b"numFmt" => {
                if let (Some(id), Some(code)) =
                    (attr_parse::<u32>(e, b"numFmtId"), attr_value(e, b"formatCode"))
                {
                    self.numfmts.insert(id, code);
                }
            }
            b"cellXfs" => self.in_cell_xfs = true,
            b"font" => self.font = Some(FontStyle::default()),
            b"fill" => {
                self.fill = Some(PendingFill {
                    pattern: None,
                    fg: Color::Auto,
                    bg: Color::Auto,
                })
            }
            b"patternFill" => {
                if let Some(fill) = self.fill.as_mut() {
                    fill.pattern =
                        attr_value(e, b"patternType").and_then(|v| PatternType::from_ooxml(&v));
                }
            }
            b"fgColor" => {
                if let Some(fill) = self.fill.as_mut() {
                    fill.fg = parse_color_attrs(e);
                }
            }
            b"bgColor" => {
                if let Some(fill) = self.fill.as_mut() {
                    fill.bg = parse_color_attrs(e);
                }
            }
            b"border" => {
                let up = attr_value(e, b"diagonalUp").as_deref() == Some("1");
                let down = attr_value(e, b"diagonalDown").as_deref() == Some("1");
                self.border = Some(BorderStyle {
                    diagonal_direction: match (up, down) {
                        (true, true) => DiagonalDirection::Both,
                        (true, false) => DiagonalDirection::Up,
                        (false, true) => DiagonalDirection::Down,
                        (false, false) => DiagonalDirection::None,
                    },
                    ..BorderStyle::default()
                });
            }
            name @ (b"left" | b"right" | b"top" | b"bottom" | b"diagonal") => {
                let Some(border) = self.border.as_mut() else {
                    return;
                };
                let edge_name = match name {
                    b"left" => "left",
                    b"right" => "right",
                    b"top" => "top",
                    b"bottom" => "bottom",
                    _ => "diagonal",
                };
                self.border_edge = Some(edge_name);
                let line = attr_value(e, b"style").and_then(|v| BorderLineStyle::from_ooxml(&v));
                if let (Some(line), Some(slot)) = (line, border.edge_mut(edge_name)) {
                    // Nested <color> may override the color
                    *slot = Some(BorderEdge::new(line, Color::Auto));
                }
            }
            b"xf" if self.in_cell_xfs => {
                self.xf = Some(PendingXf {
                    num_fmt_id: attr_parse(e, b"numFmtId").unwrap_or(0),
                    font_id: attr_parse(e, b"fontId").unwrap_or(0),
                    fill_id: attr_parse(e, b"fillId").unwrap_or(0),
                    border_id: attr_parse(e, b"borderId").unwrap_or(0),
                    ..PendingXf::default()
                });
            }
            b"alignment" => {
                if let Some(xf) = self.xf.as_mut() {
                    parse_alignment(e, &mut xf.alignment);
                }
            }
            b"protection" => {
                if let Some(xf) = self.xf.as_mut() {
                    if let Some(v) = attr_value(e, b"locked") {
                        xf.protection.locked = v == "1";
                    }
                    if let Some(v) = attr_value(e, b"hidden") {
                        xf.protection.hidden = v == "1";
                    }
                }
            }
            b"color" => {
                let color = parse_color_attrs(e);
                if let Some(font) = self.font.as_mut() {
                    font.color = color;
                } else if let (Some(border), Some(edge_name)) =
                    (self.border.as_mut(), self.border_edge)
                {
                    if let Some(Some(edge)) = border.edge_mut(edge_name) {
                        edge.color = color;
                    }
                }
            }
            tag => {
                if let Some(font) = self.font.as_mut() {
                    match tag {
                        b"sz" => {
                            font.size = attr_parse(e, b"val").unwrap_or(font.size);
                        }
                        b"name" => {
                            if let Some(v) = attr_value(e, b"val") {
                                font.name = v;
                            }
                        }
                        b"b" => font.bold = flag_on(e),
                        b"i" => font.italic = flag_on(e),
                        b"strike" => font.strikethrough = flag_on(e),
                        b"u" => {
                            font.underline = attr_value(e, b"val")
                                .map(|v| Underline::from_ooxml(&v))
                                .unwrap_or(Underline::Single);
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    fn end(&mut self, name: &[u8]) {
        match name {
            b"font" => {
                if let Some(f) = self.font.take() {
                    self.fonts.push(f);
                }
            }
            b"fill" => {
                if let Some(fill) = self.fill.take() {
                    self.fills.push(finalize_fill(fill));
                }
            }
            b"border" => {
                if let Some(b) = self.border.take() {
                    self.borders.push(b);
                }
                self.border_edge = None;
            }
            b"left" | b"right" | b"top" | b"bottom" | b"diagonal" => self.border_edge = None,
            b"xf" => {
                if let Some(xf) = self.xf.take() {
                    let style = self.resolve(xf);
                    self.cell_xfs.push(style);
                }
            }
            b"cellXfs" => self.in_cell_xfs = false,
            _ => {}
        }
    }

    fn resolve(&self, xf: PendingXf) -> Style {
        Style {
            font: self
                .fonts
                .get(xf.font_id as usize)
                .cloned()
                .unwrap_or_default(),
            fill: self
                .fills
                .get(xf.fill_id as usize)
                .cloned()
                .unwrap_or_default(),
            border: self
                .borders
                .get(xf.border_id as usize)
                .cloned()
                .unwrap_or_default(),
            alignment: xf.alignment,
            number_format: NumberFormat::from_id(
                xf.num_fmt_id,
                self.numfmts.get(&xf.num_fmt_id).map(String::as_str),
            ),
            protection: xf.protection,
        }
    }
}

fn parse_alignment(e: &BytesStart<'_>, align: &mut Alignment) {
    for attr in e.attributes().flatten() {
        let Ok(val) = attr.unescape_value() else {
            continue;
        };
        match attr.key.as_ref() {
            b"horizontal" => {
                if let Some(h) = HorizontalAlignment::from_ooxml(&val) {
                    align.horizontal = h;
                }
            }
            b"vertical" => {
                if let Some(v) = VerticalAlignment::from_ooxml(&val) {
                    align.vertical = v;
                }
            }
            b"wrapText" => align.wrap_text = val == "1",
            b"shrinkToFit" => align.shrink_to_fit = val == "1",
            b"indent" => align.indent = val.parse().unwrap_or(0),
            b"textRotation" => align.rotation = val.parse().unwrap_or(0),
            b"readingOrder" => {
                align.reading_order = match val.as_ref() {
                    "1" => ReadingOrder::LeftToRight,
                    "2" => ReadingOrder::RightToLeft,
                    _ => ReadingOrder::ContextDependent,
                }
            }
            _ => {}
        }
    }
}

/// Parse styles.xml into the `cellXfs` list; position is the `s` attribute
/// cells refer to. Always holds at least the default style.
pub(crate) fn read_styles_xml<R: Read>(reader: R) -> XlsxResult<Vec<Style>> {
    let mut xml_reader = Reader::from_reader(BufReader::new(reader));
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut parser = StylesParser::default();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => parser.start(&e),
            Ok(Event::Empty(e)) => {
                parser.start(&e);
                parser.end(e.name().as_ref());
            }
            Ok(Event::End(e)) => parser.end(e.name().as_ref()),
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    if parser.cell_xfs.is_empty() {
        parser.cell_xfs.push(Style::default());
    }
    Ok(parser.cell_xfs)
}

/// Gradient and gray125 placeholder fills collapse to `None`
fn finalize_fill(fill: PendingFill) -> FillStyle {
    match fill.pattern.unwrap_or(PatternType::None) {
        PatternType::None | PatternType::Gray125 => FillStyle::None,
        PatternType::Solid => FillStyle::Solid { color: fill.fg },
        p => FillStyle::Pattern {
            pattern: p,
            foreground: fill.fg,
            background: fill.bg,
        },
    }
}

/// Priority: rgb > theme > indexed > auto. Opaque ARGB reads back as RGB.
fn parse_color_attrs(e: &BytesStart<'_>) -> Color {
    if let Some(color) = attr_value(e, b"rgb").and_then(|v| Color::from_hex(&v)) {
        return match color {
            Color::Argb { a: 0xFF, r, g, b } => Color::Rgb { r, g, b },
            other => other,
        };
    }
    if let Some(index) = attr_parse::<u8>(e, b"theme") {
        let tint = attr_parse::<f64>(e, b"tint")
            .map(|t| (t * 100.0).round() as i8)
            .unwrap_or(0);
        return Color::Theme { index, tint };
    }
    match attr_parse::<u8>(e, b"indexed") {
        Some(64) | None => Color::Auto,
        Some(i) => Color::Indexed(i),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(xml: &str) -> Vec<Style> {
        read_styles_xml(xml.as_bytes()).unwrap()
    }

    #[test]
    fn test_written_table_parses_back() {
        let header = Style::new()
            .bold(true)
            .font_size(12.0)
            .fill_color(Color::GREY_25_PERCENT)
            .outline(BorderLineStyle::Thin, Color::BLACK)
            .number_format("0.00%")
            .wrap_text(true);

        let mut wb = Workbook::with_sheet("Styled").unwrap();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_cell_style_at(0, 0, &header).unwrap();

        let table = XlsxStyleTable::build(&wb);
        assert_eq!(table.xf_id_for(0, 0), 0);
        let xf = table.xf_id_for(0, sheet_style_index(&wb));
        assert_eq!(xf, 1);

        let parsed = parse(&table.to_styles_xml());
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1], header);
    }

    fn sheet_style_index(wb: &Workbook) -> u32 {
        wb.worksheet(0).unwrap().cell_style_index_at(0, 0)
    }

    #[test]
    fn test_custom_numfmt_ids_start_at_164() {
        let mut wb = Workbook::with_sheet("Formats").unwrap();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet
            .set_cell_style_at(0, 0, &Style::new().number_format("yyyy-mm-dd"))
            .unwrap();
        let xml = XlsxStyleTable::build(&wb).to_styles_xml();
        assert!(xml.contains(r#"<numFmt numFmtId="164" formatCode="yyyy-mm-dd"/>"#));
        assert!(xml.contains(r#"<fill><patternFill patternType="gray125">"#));
    }

    #[test]
    fn test_reads_self_closing_and_nested_elements() {
        let xml = r#"<?xml version="1.0"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <fonts count="2">
    <font><sz val="11"/><name val="Calibri"/></font>
    <font><b/><i val="0"/><u/><sz val="14"/><color theme="1" tint="-0.25"/><name val="Arial"/></font>
  </fonts>
  <fills count="3">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><patternFill patternType="solid"><fgColor rgb="FFFFFF00"/><bgColor indexed="64"/></patternFill></fill>
  </fills>
  <borders count="2">
    <border><left/><right/><top/><bottom/><diagonal/></border>
    <border diagonalUp="1"><left style="medium"><color indexed="10"/></left><right/><top/><bottom style="thin"/><diagonal/></border>
  </borders>
  <cellXfs count="2">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
    <xf numFmtId="14" fontId="1" fillId="2" borderId="1"><alignment horizontal="center" vertical="top"/></xf>
  </cellXfs>
</styleSheet>"#;

        let styles = parse(xml);
        assert_eq!(styles.len(), 2);
        assert_eq!(styles[0], Style::default());

        let s = &styles[1];
        assert!(s.font.bold);
        assert!(!s.font.italic);
        assert_eq!(s.font.underline, Underline::Single);
        assert_eq!(s.font.size, 14.0);
        assert_eq!(s.font.name, "Arial");
        assert_eq!(s.font.color, Color::Theme { index: 1, tint: -25 });
        assert_eq!(s.fill, FillStyle::solid(Color::rgb(0xFF, 0xFF, 0)));
        assert_eq!(
            s.border.left,
            Some(BorderEdge::new(BorderLineStyle::Medium, Color::Indexed(10)))
        );
        assert_eq!(
            s.border.bottom,
            Some(BorderEdge::new(BorderLineStyle::Thin, Color::Auto))
        );
        assert_eq!(s.border.diagonal_direction, DiagonalDirection::Up);
        assert_eq!(s.alignment.horizontal, HorizontalAlignment::Center);
        assert_eq!(s.alignment.vertical, VerticalAlignment::Top);
        assert!(s.number_format.is_date_format());
    }

    #[test]
    fn test_missing_cell_xfs_yields_default() {
        let styles = parse(r#"<styleSheet><fonts count="0"/></styleSheet>"#);
        assert_eq!(styles, vec![Style::default()]);
    }
}
