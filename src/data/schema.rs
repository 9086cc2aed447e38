use super::model::{CellValue, Column, EvaluationTable, Field, RawTable, Record};
use crate::error::SchemaError;

/// Required labels absent from the table, in template order.
pub fn missing_columns(raw: &RawTable) -> Vec<String> {
    Field::ALL
        .iter()
        .map(|f| f.label())
        .filter(|label| raw.column_index(label).is_none())
        .map(str::to_string)
        .collect()
}

/// Check the ten required columns and build typed records.
///
/// Score columns are coerced here: a value that does not parse as a number
/// becomes `None` instead of failing the run. Columns outside the template
/// are carried through untouched as extras.
pub fn validate(raw: &RawTable) -> Result<EvaluationTable, SchemaError> {
    let missing = missing_columns(raw);
    if !missing.is_empty() {
        log::error!("Missing required columns: {}", missing.join(", "));
        return Err(SchemaError::MissingColumns { missing });
    }

    // Every lookup succeeds after the check above.
    let idx: Vec<usize> = Field::ALL
        .iter()
        .filter_map(|f| raw.column_index(f.label()))
        .collect();
    let col = |f: Field| idx[f as usize];

    let extra_idx: Vec<usize> = (0..raw.headers.len()).filter(|i| !idx.contains(i)).collect();
    let extra_columns = extra_idx.iter().map(|&i| raw.headers[i].clone()).collect();
    let layout = (0..raw.headers.len())
        .filter_map(|i| match idx.iter().position(|&j| j == i) {
            Some(pos) => Some(Column::Required(Field::ALL[pos])),
            None => extra_idx.iter().position(|&j| j == i).map(Column::Extra),
        })
        .collect();

    let null = CellValue::Null;
    let records = raw
        .rows
        .iter()
        .map(|row| {
            let cell = |f: Field| row.get(col(f)).unwrap_or(&null);
            Record {
                name: cell(Field::Name).as_label(),
                program: cell(Field::Program).as_label(),
                subject: cell(Field::Subject).as_label(),
                code: cell(Field::Code).clone(),
                group: cell(Field::Group).clone(),
                student_score: cell(Field::StudentScore).clone(),
                director_score: cell(Field::DirectorScore).to_number(),
                self_evaluation: cell(Field::SelfEvaluation).to_number(),
                final_score: cell(Field::FinalScore).to_number(),
                period: cell(Field::Period).as_label(),
                extra: extra_idx
                    .iter()
                    .map(|&i| row.get(i).cloned().unwrap_or_default())
                    .collect(),
            }
        })
        .collect();

    Ok(EvaluationTable {
        records,
        extra_columns,
        layout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template_headers() -> Vec<String> {
        Field::ALL.iter().map(|f| f.label().to_string()).collect()
    }

    fn row(final_score: &str) -> Vec<CellValue> {
        vec![
            CellValue::Text("Ana".into()),
            CellValue::Text("Ingeniería".into()),
            CellValue::Text("Cálculo".into()),
            CellValue::Integer(101),
            CellValue::Text("A".into()),
            CellValue::Float(4.1),
            CellValue::Float(4.3),
            CellValue::Float(4.8),
            CellValue::infer(final_score),
            CellValue::Text("2023-2".into()),
        ]
    }

    #[test]
    fn full_template_passes() {
        let raw = RawTable {
            headers: template_headers(),
            rows: vec![row("4.4")],
        };
        let table = validate(&raw).unwrap();
        assert_eq!(table.len(), 1);
        let r = &table.records[0];
        assert_eq!(r.program.as_deref(), Some("Ingeniería"));
        assert_eq!(r.final_score, Some(4.4));
        assert_eq!(r.self_evaluation, Some(4.8));
        assert!(table.extra_columns.is_empty());
    }

    #[test]
    fn each_missing_column_is_reported() {
        for drop in Field::ALL {
            let headers: Vec<String> = template_headers()
                .into_iter()
                .filter(|h| h != drop.label())
                .collect();
            let raw = RawTable {
                headers,
                rows: vec![],
            };
            let err = validate(&raw).unwrap_err();
            assert_eq!(
                err,
                SchemaError::MissingColumns {
                    missing: vec![drop.label().to_string()]
                }
            );
        }
    }

    #[test]
    fn several_missing_columns_keep_template_order() {
        let raw = RawTable {
            headers: vec!["Nombre".into(), "Programa".into(), "Materia".into()],
            rows: vec![],
        };
        let missing = missing_columns(&raw);
        assert_eq!(missing.first().map(String::as_str), Some("Codigo"));
        assert_eq!(missing.last().map(String::as_str), Some("Periodo"));
        assert_eq!(missing.len(), 7);
    }

    #[test]
    fn unparseable_score_becomes_none() {
        let raw = RawTable {
            headers: template_headers(),
            rows: vec![row("N/A")],
        };
        let table = validate(&raw).unwrap();
        assert_eq!(table.records[0].final_score, None);
    }

    #[test]
    fn columns_may_appear_in_any_order_with_extras() {
        let mut headers = template_headers();
        headers.reverse();
        headers.insert(3, "Sede".into());
        let mut cells = row("3.9");
        cells.reverse();
        cells.insert(3, CellValue::Text("Cali".into()));

        let table = validate(&RawTable {
            headers,
            rows: vec![cells],
        })
        .unwrap();
        assert_eq!(table.extra_columns, vec!["Sede".to_string()]);
        let r = &table.records[0];
        assert_eq!(r.name.as_deref(), Some("Ana"));
        assert_eq!(r.final_score, Some(3.9));
        assert_eq!(r.extra, vec![CellValue::Text("Cali".into())]);

        let exported = table.to_table();
        assert_eq!(exported.columns[..4], ["Periodo", "Definitiva", "Autoevaluacion", "Sede"]);
        assert_eq!(exported.rows[0][3], CellValue::Text("Cali".into()));
        assert_eq!(exported.rows[0][9], CellValue::Text("Ingeniería".into()));
    }
}
