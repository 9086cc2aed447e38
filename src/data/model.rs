use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

// ---------------------------------------------------------------------------
// Field – the ten required columns of the evaluation template
// ---------------------------------------------------------------------------

/// One of the required columns. The labels are an external contract with the
/// upstream spreadsheet template and are matched case-sensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Program,
    Subject,
    Code,
    Group,
    StudentScore,
    DirectorScore,
    SelfEvaluation,
    FinalScore,
    Period,
}

impl Field {
    /// All required fields in template order.
    pub const ALL: [Field; 10] = [
        Field::Name,
        Field::Program,
        Field::Subject,
        Field::Code,
        Field::Group,
        Field::StudentScore,
        Field::DirectorScore,
        Field::SelfEvaluation,
        Field::FinalScore,
        Field::Period,
    ];

    /// The fields the Cleaner requires to be numeric and present.
    pub const SCORES: [Field; 3] = [Field::SelfEvaluation, Field::DirectorScore, Field::FinalScore];

    /// The categorical fields offered as filters.
    pub const FILTERABLE: [Field; 3] = [Field::Program, Field::Subject, Field::Period];

    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Nombre",
            Field::Program => "Programa",
            Field::Subject => "Materia",
            Field::Code => "Codigo",
            Field::Group => "Grupo",
            Field::StudentScore => "Nota_Estudiante",
            Field::DirectorScore => "Nota_Director",
            Field::SelfEvaluation => "Autoevaluacion",
            Field::FinalScore => "Definitiva",
            Field::Period => "Periodo",
        }
    }

    pub fn from_label(label: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.label() == label)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// CellValue – a single raw cell as read from the source file
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value, mirroring what a spreadsheet or CSV
/// reader can hand back. Must be `Ord` + `Hash` so tables can be hashed for
/// the export cache and labels can live in `BTreeSet`s.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                Text(_) => 4,
            }
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Text(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{}", format_number(*v)),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => Ok(()),
        }
    }
}

impl From<Option<f64>> for CellValue {
    fn from(v: Option<f64>) -> Self {
        v.map(CellValue::Float).unwrap_or(CellValue::Null)
    }
}

impl From<Option<&str>> for CellValue {
    fn from(v: Option<&str>) -> Self {
        v.map(|s| CellValue::Text(s.to_string())).unwrap_or(CellValue::Null)
    }
}

/// Whole numbers render without a decimal part.
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

impl CellValue {
    /// Guess the type of a text cell (CSV/JSON sources carry no type info).
    pub fn infer(s: &str) -> CellValue {
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        CellValue::Text(s.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Lenient numeric coercion: anything that cannot be read as a finite
    /// number (NaN, infinities, blank or unparseable text) becomes `None`.
    pub fn to_number(&self) -> Option<f64> {
        let v = match self {
            CellValue::Null => return None,
            CellValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            CellValue::Integer(i) => *i as f64,
            CellValue::Float(f) => *f,
            CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        v.is_finite().then_some(v)
    }

    /// Render the cell as a categorical label. Null and blank text have no label.
    pub fn as_label(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Text(s) if s.trim().is_empty() => None,
            CellValue::Float(f) if f.is_nan() => None,
            other => Some(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// RawTable – untyped loader output
// ---------------------------------------------------------------------------

/// Header row plus cell rows, exactly as the loader found them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == label)
    }
}

// ---------------------------------------------------------------------------
// Record – one typed evaluation row
// ---------------------------------------------------------------------------

/// A single evaluation (one row of the source table) with typed accessors.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub name: Option<String>,
    pub program: Option<String>,
    pub subject: Option<String>,
    pub code: CellValue,
    pub group: CellValue,
    pub student_score: CellValue,
    pub director_score: Option<f64>,
    pub self_evaluation: Option<f64>,
    pub final_score: Option<f64>,
    pub period: Option<String>,
    /// Values of non-required columns, aligned with [`EvaluationTable::extra_columns`].
    pub extra: Vec<CellValue>,
}

impl Record {
    /// Categorical label of a text field. Returns `None` for numeric fields.
    pub fn label(&self, field: Field) -> Option<&str> {
        match field {
            Field::Name => self.name.as_deref(),
            Field::Program => self.program.as_deref(),
            Field::Subject => self.subject.as_deref(),
            Field::Period => self.period.as_deref(),
            _ => None,
        }
    }

    /// Numeric value of a score field. Returns `None` for text fields.
    pub fn score(&self, field: Field) -> Option<f64> {
        match field {
            Field::DirectorScore => self.director_score,
            Field::SelfEvaluation => self.self_evaluation,
            Field::FinalScore => self.final_score,
            Field::StudentScore => self.student_score.to_number(),
            _ => None,
        }
    }

    /// Whether the field holds a value.
    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::Code => !self.code.is_null(),
            Field::Group => !self.group.is_null(),
            Field::StudentScore => !self.student_score.is_null(),
            Field::DirectorScore | Field::SelfEvaluation | Field::FinalScore => {
                self.score(field).is_some()
            }
            Field::Name | Field::Program | Field::Subject | Field::Period => {
                self.label(field).is_some()
            }
        }
    }

    /// The field as a cell, for tables and exports.
    pub fn cell(&self, field: Field) -> CellValue {
        match field {
            Field::Code => self.code.clone(),
            Field::Group => self.group.clone(),
            Field::StudentScore => self.student_score.clone(),
            Field::DirectorScore | Field::SelfEvaluation | Field::FinalScore => {
                self.score(field).into()
            }
            Field::Name | Field::Program | Field::Subject | Field::Period => {
                self.label(field).into()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EvaluationTable – validated records
// ---------------------------------------------------------------------------

/// Where one source column lives in a validated table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Required(Field),
    /// Index into [`EvaluationTable::extra_columns`].
    Extra(usize),
}

/// The validated dataset: typed records plus any extra source columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationTable {
    pub records: Vec<Record>,
    pub extra_columns: Vec<String>,
    /// Column order of the source file. Empty means template order, then extras.
    pub layout: Vec<Column>,
}

impl EvaluationTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// A table with the same columns holding only `records`.
    pub fn with_records(&self, records: Vec<Record>) -> Self {
        EvaluationTable {
            records,
            extra_columns: self.extra_columns.clone(),
            layout: self.layout.clone(),
        }
    }

    /// Sorted distinct labels of a categorical field (nulls excluded).
    pub fn unique_values(&self, field: Field) -> BTreeSet<String> {
        self.records
            .iter()
            .filter_map(|r| r.label(field))
            .map(str::to_string)
            .collect()
    }

    /// Column order used for display and export.
    pub fn columns(&self) -> Vec<Column> {
        if !self.layout.is_empty() {
            return self.layout.clone();
        }
        Field::ALL
            .into_iter()
            .map(Column::Required)
            .chain((0..self.extra_columns.len()).map(Column::Extra))
            .collect()
    }

    /// Generic table view with every column, in source order.
    pub fn to_table(&self) -> Table {
        let layout = self.columns();
        let columns: Vec<String> = layout
            .iter()
            .map(|c| match c {
                Column::Required(f) => f.label().to_string(),
                Column::Extra(i) => self.extra_columns.get(*i).cloned().unwrap_or_default(),
            })
            .collect();

        let rows = self
            .records
            .iter()
            .map(|r| {
                layout
                    .iter()
                    .map(|c| match c {
                        Column::Required(f) => r.cell(*f),
                        Column::Extra(i) => r.extra.get(*i).cloned().unwrap_or_default(),
                    })
                    .collect::<Vec<CellValue>>()
            })
            .collect();

        Table { columns, rows }
    }

    /// Project the records onto a subset of fields (download tables of the raw views).
    pub fn project(&self, fields: &[Field]) -> Table {
        Table {
            columns: fields.iter().map(|f| f.label().to_string()).collect(),
            rows: self
                .records
                .iter()
                .map(|r| fields.iter().map(|f| r.cell(*f)).collect())
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Table – generic named-column table (display and export unit)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
