//! XLSX writer

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Cursor, Seek, Write};
use std::path::Path;

use crate::error::{XlsxError, XlsxResult};
use crate::styles::XlsxStyleTable;
use sheetcraft_core::{CellAddress, CellData, CellValue, Workbook, Worksheet};

/// XLSX file writer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write a workbook to a file path
    pub fn write_file<P: AsRef<Path>>(workbook: &Workbook, path: P) -> XlsxResult<()> {
        let file = File::create(path)?;
        Self::write(workbook, file)
    }

    /// Serialize a workbook into an in-memory package
    pub fn to_bytes(workbook: &Workbook) -> XlsxResult<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        Self::write(workbook, &mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Write a workbook to a writer
    pub fn write<W: Write + Seek>(workbook: &Workbook, writer: W) -> XlsxResult<()> {
        if workbook.is_empty() {
            return Err(XlsxError::InvalidFormat(
                "A workbook needs at least one worksheet".into(),
            ));
        }

        let mut zip = zip::ZipWriter::new(writer);
        let style_table = XlsxStyleTable::build(workbook);

        Self::write_content_types(&mut zip, workbook)?;
        Self::write_root_rels(&mut zip)?;
        Self::write_workbook_xml(&mut zip, workbook)?;
        Self::write_workbook_rels(&mut zip, workbook)?;
        Self::write_part(&mut zip, "xl/styles.xml", &style_table.to_styles_xml())?;

        for (i, sheet) in workbook.worksheets().enumerate() {
            let xml = Self::worksheet_xml(sheet, i, &style_table);
            Self::write_part(&mut zip, &format!("xl/worksheets/sheet{}.xml", i + 1), &xml)?;
        }

        zip.finish()?;
        log::debug!("wrote workbook with {} sheets", workbook.sheet_count());
        Ok(())
    }

    fn write_part<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        name: &str,
        content: &str,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_content_types<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
    <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
        );

        for i in 0..workbook.sheet_count() {
            content.push_str(&format!(
                r#"
    <Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i + 1
            ));
        }

        content.push_str("\n</Types>");
        Self::write_part(zip, "[Content_Types].xml", &content)
    }

    fn write_root_rels<W: Write + Seek>(zip: &mut zip::ZipWriter<W>) -> XlsxResult<()> {
        let content = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;
        Self::write_part(zip, "_rels/.rels", content)
    }

    fn write_workbook_xml<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
    <sheets>"#,
        );

        for (i, sheet) in workbook.worksheets().enumerate() {
            content.push_str(&format!(
                r#"
        <sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape_xml(sheet.name()),
                i + 1,
                i + 1
            ));
        }

        content.push_str(
            r#"
    </sheets>
</workbook>"#,
        );
        Self::write_part(zip, "xl/workbook.xml", &content)
    }

    fn write_workbook_rels<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );

        for i in 0..workbook.sheet_count() {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i + 1,
                i + 1
            ));
        }

        // Styles take the id after the last sheet
        content.push_str(&format!(
            r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#,
            workbook.sheet_count() + 1
        ));
        Self::write_part(zip, "xl/_rels/workbook.xml.rels", &content)
    }

    fn worksheet_xml(sheet: &Worksheet, index: usize, style_table: &XlsxStyleTable) -> String {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        Self::push_cols(&mut content, sheet);

        content.push_str("\n    <sheetData>");

        // Rows with cells plus rows that only carry a height or hidden flag
        let rows: BTreeSet<u32> = sheet
            .row_indices()
            .chain(sheet.custom_row_heights().keys().copied())
            .chain(
                sheet
                    .hidden_rows()
                    .iter()
                    .filter(|(_, hidden)| **hidden)
                    .map(|(&row, _)| row),
            )
            .collect();

        for row in rows {
            let mut attrs = format!(" r=\"{}\"", row + 1);
            if let Some(height) = sheet.custom_row_heights().get(&row) {
                attrs.push_str(&format!(" ht=\"{}\" customHeight=\"1\"", height));
            }
            if sheet.is_row_hidden(row) {
                attrs.push_str(" hidden=\"1\"");
            }

            let cells: Vec<String> = sheet
                .row_cells(row)
                .filter_map(|(col, cell)| {
                    let xf_id = style_table.xf_id_for(index, cell.style_index);
                    Self::cell_xml(row, col, cell, xf_id)
                })
                .collect();

            if cells.is_empty() {
                content.push_str(&format!("\n        <row{}/>", attrs));
            } else {
                content.push_str(&format!("\n        <row{}>", attrs));
                for cell in cells {
                    content.push_str("\n            ");
                    content.push_str(&cell);
                }
                content.push_str("\n        </row>");
            }
        }

        content.push_str("\n    </sheetData>");

        let merged_regions = sheet.merged_regions();
        if !merged_regions.is_empty() {
            content.push_str(&format!(
                "\n    <mergeCells count=\"{}\">",
                merged_regions.len()
            ));
            for range in merged_regions {
                content.push_str(&format!("\n        <mergeCell ref=\"{}\"/>", range));
            }
            content.push_str("\n    </mergeCells>");
        }

        content.push_str("\n</worksheet>");
        content
    }

    /// One `<col>` per column with a custom width or hidden flag
    fn push_cols(content: &mut String, sheet: &Worksheet) {
        let cols: BTreeSet<u16> = sheet
            .custom_column_widths()
            .keys()
            .copied()
            .chain(
                sheet
                    .hidden_columns()
                    .iter()
                    .filter(|(_, hidden)| **hidden)
                    .map(|(&col, _)| col),
            )
            .collect();
        if cols.is_empty() {
            return;
        }

        content.push_str("\n    <cols>");
        for col in cols {
            let mut attrs = format!(
                " min=\"{0}\" max=\"{0}\" width=\"{1}\"",
                col + 1,
                sheet.column_width(col)
            );
            if sheet.custom_column_widths().contains_key(&col) {
                attrs.push_str(" customWidth=\"1\"");
            }
            if sheet.is_column_hidden(col) {
                attrs.push_str(" hidden=\"1\"");
            }
            content.push_str(&format!("\n        <col{}/>", attrs));
        }
        content.push_str("\n    </cols>");
    }

    /// `<c>` element for one cell; `None` for a blank cell with the default style
    fn cell_xml(row: u32, col: u16, cell: &CellData, xf_id: u32) -> Option<String> {
        let cell_ref = CellAddress::new(row, col).to_a1_string();
        let style_attr = if xf_id != 0 {
            format!(" s=\"{}\"", xf_id)
        } else {
            String::new()
        };

        let xml = match &cell.value {
            CellValue::Empty => {
                if xf_id == 0 {
                    return None;
                }
                format!("<c r=\"{}\"{}/>", cell_ref, style_attr)
            }
            CellValue::Formula { text, cached_value } => {
                let (type_attr, cached) = match cached_value.as_deref() {
                    Some(v) => match Self::value_parts(v) {
                        Some((t, v)) => (t, format!("<v>{}</v>", v)),
                        None => ("", String::new()),
                    },
                    None => ("", String::new()),
                };
                // Inline strings cannot carry a formula; cached text uses t="str"
                let type_attr = if type_attr == " t=\"inlineStr\"" {
                    " t=\"str\""
                } else {
                    type_attr
                };
                format!(
                    "<c r=\"{}\"{}{}><f>{}</f>{}</c>",
                    cell_ref,
                    style_attr,
                    type_attr,
                    escape_xml(text),
                    cached
                )
            }
            CellValue::String(s) => format!(
                "<c r=\"{}\"{} t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
                cell_ref,
                style_attr,
                escape_xml(s.as_str())
            ),
            value => {
                let (type_attr, v) = Self::value_parts(value)?;
                format!(
                    "<c r=\"{}\"{}{}><v>{}</v></c>",
                    cell_ref, style_attr, type_attr, v
                )
            }
        };
        Some(xml)
    }

    /// Type attribute and `<v>` text of a plain value
    fn value_parts(value: &CellValue) -> Option<(&'static str, String)> {
        match value {
            CellValue::Number(n) if n.is_finite() => Some(("", n.to_string())),
            CellValue::Number(_) => Some((" t=\"e\"", "#NUM!".to_string())),
            CellValue::Boolean(b) => Some((" t=\"b\"", u8::from(*b).to_string())),
            CellValue::Error(e) => Some((" t=\"e\"", escape_xml(e.as_str()))),
            CellValue::String(s) => Some((" t=\"inlineStr\"", escape_xml(s.as_str()))),
            CellValue::Empty | CellValue::Formula { .. } => None,
        }
    }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // Control characters are not allowed in XML 1.0
            '\t' | '\n' | '\r' => out.push(c),
            c if (c as u32) < 0x20 => out.push_str(&format!("_x{:04X}_", c as u32)),
            c => out.push(c),
        }
    }
    out
}
