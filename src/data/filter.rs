use std::collections::BTreeSet;

use super::model::{EvaluationTable, Field, Record};

// ---------------------------------------------------------------------------
// Filter selection: which labels are allowed per categorical column
// ---------------------------------------------------------------------------

/// Chosen values for the three filterable columns.
///
/// An empty set means "no restriction" for that column, not "exclude all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterSelection {
    pub programs: BTreeSet<String>,
    pub subjects: BTreeSet<String>,
    pub periods: BTreeSet<String>,
}

impl FilterSelection {
    /// Selected values for a filterable field; other fields have no selection.
    pub fn values(&self, field: Field) -> Option<&BTreeSet<String>> {
        match field {
            Field::Program => Some(&self.programs),
            Field::Subject => Some(&self.subjects),
            Field::Period => Some(&self.periods),
            _ => None,
        }
    }

    fn values_mut(&mut self, field: Field) -> Option<&mut BTreeSet<String>> {
        match field {
            Field::Program => Some(&mut self.programs),
            Field::Subject => Some(&mut self.subjects),
            Field::Period => Some(&mut self.periods),
            _ => None,
        }
    }

    /// Add or remove a single value from a column's selection.
    pub fn toggle(&mut self, field: Field, value: &str) {
        if let Some(selected) = self.values_mut(field) {
            if !selected.remove(value) {
                selected.insert(value.to_string());
            }
        }
    }

    /// Replace a column's selection.
    pub fn set(&mut self, field: Field, values: BTreeSet<String>) {
        if let Some(selected) = self.values_mut(field) {
            *selected = values;
        }
    }

    /// Remove every restriction on a column.
    pub fn clear(&mut self, field: Field) {
        self.set(field, BTreeSet::new());
    }

    /// Whether no column is restricted.
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty() && self.subjects.is_empty() && self.periods.is_empty()
    }

    /// Whether a record passes every non-empty column selection.
    pub fn matches(&self, record: &Record) -> bool {
        Field::FILTERABLE.iter().all(|&field| match self.values(field) {
            Some(selected) if !selected.is_empty() => record
                .label(field)
                .is_some_and(|label| selected.contains(label)),
            _ => true,
        })
    }
}

/// The records of `table` that pass `selection`, in source order.
pub fn apply(table: &EvaluationTable, selection: &FilterSelection) -> EvaluationTable {
    let filtered = if selection.is_empty() {
        table.clone()
    } else {
        table.with_records(
            table
                .records
                .iter()
                .filter(|r| selection.matches(r))
                .cloned()
                .collect(),
        )
    };
    log::debug!("Filter {:?} kept {} of {} rows", selection, filtered.len(), table.len());
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(program: &str, subject: &str, period: &str) -> Record {
        Record {
            program: Some(program.into()),
            subject: Some(subject.into()),
            period: Some(period.into()),
            final_score: Some(4.0),
            ..Default::default()
        }
    }

    fn table() -> EvaluationTable {
        EvaluationTable {
            records: vec![
                record("Engineering", "Math", "2023-1"),
                record("Engineering", "Physics", "2023-2"),
                record("Arts", "Math", "2023-1"),
                record("Arts", "History", "2023-2"),
                record("Engineering", "Math", "2024-1"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn empty_selection_is_identity() {
        let t = table();
        assert_eq!(apply(&t, &FilterSelection::default()), t);
    }

    #[test]
    fn program_selection_keeps_exactly_those_rows() {
        let t = table();
        let mut sel = FilterSelection::default();
        sel.toggle(Field::Program, "Engineering");
        let out = apply(&t, &sel);
        let expected = t
            .records
            .iter()
            .filter(|r| r.program.as_deref() == Some("Engineering"))
            .count();
        assert_eq!(out.len(), expected);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn columns_combine_with_and() {
        let mut sel = FilterSelection::default();
        sel.toggle(Field::Program, "Engineering");
        sel.toggle(Field::Subject, "Math");
        sel.toggle(Field::Period, "2023-1");
        let out = apply(&table(), &sel);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn restricting_further_never_adds_rows() {
        let t = table();
        let mut sel = FilterSelection::default();
        let mut last = apply(&t, &sel).len();
        for (field, value) in [
            (Field::Period, "2023-1"),
            (Field::Program, "Arts"),
            (Field::Subject, "Math"),
        ] {
            sel.toggle(field, value);
            let now = apply(&t, &sel).len();
            assert!(now <= last);
            last = now;
        }
    }

    #[test]
    fn narrowing_a_column_never_adds_rows() {
        let t = table();
        let mut sel = FilterSelection::default();
        sel.set(
            Field::Subject,
            ["Math", "Physics", "History"].iter().map(|s| s.to_string()).collect(),
        );
        let wide = apply(&t, &sel).len();
        sel.toggle(Field::Subject, "History");
        let narrow = apply(&t, &sel).len();
        assert!(narrow <= wide);
        assert_eq!(narrow, 4);
    }

    #[test]
    fn missing_label_fails_a_non_empty_selection() {
        let mut t = table();
        t.records[0].program = None;
        let mut sel = FilterSelection::default();
        sel.toggle(Field::Program, "Engineering");
        assert_eq!(apply(&t, &sel).len(), 2);
        assert_eq!(apply(&t, &FilterSelection::default()).len(), 5);
    }

    #[test]
    fn toggle_twice_restores_selection() {
        let mut sel = FilterSelection::default();
        sel.toggle(Field::Period, "2023-1");
        sel.toggle(Field::Period, "2023-1");
        assert!(sel.is_empty());
        sel.toggle(Field::Name, "Ana");
        assert!(sel.is_empty());
    }
}
