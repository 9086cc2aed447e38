//! Spreadsheet export of any shown table.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use rust_xlsxwriter::{DocProperties, ExcelDateTime, Workbook};

use crate::data::aggregate::ViewKind;
use crate::data::loader;
use crate::data::model::{CellValue, Table};
use crate::error::ExportError;

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Download name of the full filtered table.
pub const FILTERED_FILE_NAME: &str = "datos_filtrados.xlsx";

/// Sheet name used for the per-view downloads.
pub const VIEW_SHEET: &str = "Datos";

/// Sheet name used for the full filtered table.
pub const FILTERED_SHEET: &str = "Datos Filtrados";

/// Download name for a view: `<label>_datos.xlsx`.
pub fn file_name_for(view: ViewKind) -> String {
    format!("{}_datos.xlsx", view.label())
}

/// Serialize a table to an `.xlsx` buffer: one sheet, header row, no styling.
///
/// The document creation time is pinned so the same table always produces
/// the same bytes.
pub fn to_xlsx(table: &Table, sheet_name: &str) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let created = ExcelDateTime::from_ymd(2000, 1, 1)?;
    let properties = DocProperties::new().set_creation_datetime(&created);
    workbook.set_properties(&properties);

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (col, name) in table.columns.iter().enumerate() {
        worksheet.write_string(0, col as u16, name)?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let row_num = (r + 1) as u32;
        for (c, cell) in row.iter().enumerate() {
            let col_num = c as u16;
            match cell {
                CellValue::Null => {}
                CellValue::Bool(b) => {
                    worksheet.write_boolean(row_num, col_num, *b)?;
                }
                CellValue::Integer(i) => {
                    worksheet.write_number(row_num, col_num, *i as f64)?;
                }
                CellValue::Float(f) if f.is_finite() => {
                    worksheet.write_number(row_num, col_num, *f)?;
                }
                CellValue::Float(_) => {}
                CellValue::Text(s) => {
                    worksheet.write_string(row_num, col_num, s)?;
                }
            }
        }
    }

    let buffer = workbook.save_to_buffer()?;
    log::debug!(
        "Exported {} rows x {} columns to '{}' ({} bytes)",
        table.len(),
        table.columns.len(),
        sheet_name,
        buffer.len()
    );
    Ok(buffer)
}

/// Read the first sheet of an `.xlsx` buffer back into a [`Table`].
pub fn read_xlsx(bytes: &[u8]) -> Result<Table, ExportError> {
    let raw = loader::load_bytes("export.xlsx", bytes.to_vec())
        .map_err(|e| ExportError::Read(e.to_string()))?;
    Ok(Table {
        columns: raw.headers,
        rows: raw.rows,
    })
}

/// Content hash of a table, used as its identity in the cache.
pub fn content_hash(table: &Table) -> u64 {
    let mut hasher = DefaultHasher::new();
    table.hash(&mut hasher);
    hasher.finish()
}

// ---------------------------------------------------------------------------
// Export cache
// ---------------------------------------------------------------------------

/// Memoized export buffers, one per slot (for example the filtered-table
/// download). A slot is rebuilt only when the content of its table changes.
#[derive(Debug, Default)]
pub struct ExportCache {
    entries: HashMap<String, (u64, Vec<u8>)>,
    builds: usize,
}

impl ExportCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer for `table` in `slot`, built on first request and reused while
    /// the content is unchanged.
    pub fn get_or_build(
        &mut self,
        slot: &str,
        table: &Table,
        sheet_name: &str,
    ) -> Result<&[u8], ExportError> {
        let hash = content_hash(table);
        let fresh = matches!(self.entries.get(slot), Some((h, _)) if *h == hash);
        if fresh {
            log::debug!("Export cache hit for '{slot}'");
        } else {
            let buffer = to_xlsx(table, sheet_name)?;
            self.builds += 1;
            self.entries.insert(slot.to_string(), (hash, buffer));
        }
        Ok(self
            .entries
            .get(slot)
            .map(|(_, buffer)| buffer.as_slice())
            .unwrap_or_default())
    }

    /// Drop every cached buffer.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// How many buffers have been serialized so far.
    pub fn builds(&self) -> usize {
        self.builds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table {
            columns: vec!["Materia".into(), "Definitiva".into(), "Grupo".into()],
            rows: vec![
                vec![
                    CellValue::Text("Cálculo".into()),
                    CellValue::Float(4.25),
                    CellValue::Null,
                ],
                vec![
                    CellValue::Text("Física".into()),
                    CellValue::Integer(3),
                    CellValue::Text("B".into()),
                ],
            ],
        }
    }

    #[test]
    fn file_names_follow_view_labels() {
        assert_eq!(
            file_name_for(ViewKind::TopTeachers),
            "Top5_Profesores_Nota_Definitiva_datos.xlsx"
        );
        assert_eq!(FILTERED_FILE_NAME, "datos_filtrados.xlsx");
    }

    #[test]
    fn round_trip_keeps_shape() {
        let table = sample();
        let bytes = to_xlsx(&table, VIEW_SHEET).unwrap();
        let back = read_xlsx(&bytes).unwrap();
        assert_eq!(back.columns, table.columns);
        assert_eq!(back.len(), table.len());
        assert_eq!(back.rows[0][0], CellValue::Text("Cálculo".into()));
        assert_eq!(back.rows[0][1], CellValue::Float(4.25));
        assert_eq!(back.rows[0][2], CellValue::Null);
    }

    #[test]
    fn header_only_table_exports() {
        let table = Table {
            columns: vec!["Nombre".into(), "Definitiva".into()],
            rows: vec![],
        };
        let back = read_xlsx(&to_xlsx(&table, FILTERED_SHEET).unwrap()).unwrap();
        assert_eq!(back.columns, table.columns);
        assert!(back.is_empty());
    }

    #[test]
    fn identical_tables_give_identical_bytes() {
        let a = to_xlsx(&sample(), VIEW_SHEET).unwrap();
        let b = to_xlsx(&sample(), VIEW_SHEET).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn cache_reuses_until_content_changes() {
        let mut cache = ExportCache::new();
        let table = sample();
        let first = cache.get_or_build("filtered", &table, FILTERED_SHEET).unwrap().to_vec();
        let second = cache.get_or_build("filtered", &table, FILTERED_SHEET).unwrap().to_vec();
        assert_eq!(first, second);
        assert_eq!(cache.builds(), 1);

        let mut changed = table.clone();
        changed.rows.pop();
        cache.get_or_build("filtered", &changed, FILTERED_SHEET).unwrap();
        assert_eq!(cache.builds(), 2);

        cache.clear();
        cache.get_or_build("filtered", &changed, FILTERED_SHEET).unwrap();
        assert_eq!(cache.builds(), 3);
    }
}
