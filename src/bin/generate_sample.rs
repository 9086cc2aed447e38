//! Writes a synthetic evaluation template (`plantilla.xlsx` and
//! `plantilla.csv`) with the ten required columns.

use std::path::PathBuf;

use anyhow::{Context, Result};
use profe_score::data::model::{CellValue, Field, Table};
use profe_score::export::{to_xlsx, VIEW_SHEET};

const PROGRAMS: [(&str, &[&str]); 4] = [
    (
        "Ingeniería de Sistemas",
        &["Programación I", "Estructuras de Datos", "Cálculo Diferencial"],
    ),
    ("Contaduría Pública", &["Contabilidad General", "Matemática Financiera"]),
    ("Derecho", &["Derecho Civil", "Teoría del Estado"]),
    ("Psicología", &["Psicología del Desarrollo", "Estadística Descriptiva"]),
];

const TEACHERS: [&str; 10] = [
    "María Fernández",
    "José Muñoz",
    "Ana Gómez",
    "Luis Peña",
    "Camila Ríos",
    "Andrés Núñez",
    "Sofía Castaño",
    "Julián Ordóñez",
    "Valentina Ruiz",
    "Tomás Agudelo",
];

const PERIODS: [&str; 4] = ["2023-1", "2023-2", "2024-1", "2024-2"];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }

    /// Grade on the 0–5 scale around `center`, rounded to one decimal.
    fn grade(&mut self, center: f64) -> f64 {
        let g = center + (self.next_f64() - 0.5) * 1.6;
        (g.clamp(0.0, 5.0) * 10.0).round() / 10.0
    }
}

fn sample_table(rows: usize, rng: &mut SimpleRng) -> Table {
    let mut out = Vec::with_capacity(rows);
    for i in 0..rows {
        let (program, subjects) = *rng.pick(&PROGRAMS);
        let subject = *rng.pick(subjects);
        let teacher = *rng.pick(&TEACHERS);
        let period = *rng.pick(&PERIODS);
        let skill = 3.2 + (teacher.len() % 7) as f64 * 0.2;

        let student = rng.grade(skill);
        let director = rng.grade(skill);
        let self_eval = rng.grade(skill + 0.4);
        let weighted = student * 0.4 + director * 0.4 + self_eval * 0.2;
        let final_score = (weighted * 100.0).round() / 100.0;

        // A few unusable rows so the cleaning step has work to do.
        let director_cell = match i % 29 {
            7 => CellValue::Text("N/A".into()),
            13 => CellValue::Null,
            _ => CellValue::Float(director),
        };

        out.push(vec![
            CellValue::Text(teacher.into()),
            CellValue::Text(program.into()),
            CellValue::Text(subject.into()),
            CellValue::Integer(1000 + (rng.next_u64() % 9000) as i64),
            CellValue::Text(["A", "B", "C"][i % 3].into()),
            CellValue::Float(student),
            director_cell,
            CellValue::Float(self_eval),
            CellValue::Float(final_score),
            CellValue::Text(period.into()),
        ]);
    }

    Table {
        columns: Field::ALL.iter().map(|f| f.label().to_string()).collect(),
        rows: out,
    }
}

/// CSV in ISO-8859-1, the encoding the dashboard reads CSV files with.
fn to_latin1_csv(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|c| c.to_string()))?;
    }
    let utf8 = String::from_utf8(writer.into_inner().context("flushing CSV")?)?;
    Ok(utf8
        .chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect())
}

fn main() -> Result<()> {
    env_logger::init();

    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let mut rng = SimpleRng::new(42);
    let table = sample_table(400, &mut rng);

    let xlsx_path = out_dir.join("plantilla.xlsx");
    std::fs::write(&xlsx_path, to_xlsx(&table, VIEW_SHEET)?)
        .with_context(|| format!("writing {}", xlsx_path.display()))?;

    let csv_path = out_dir.join("plantilla.csv");
    std::fs::write(&csv_path, to_latin1_csv(&table)?)
        .with_context(|| format!("writing {}", csv_path.display()))?;

    log::info!("Wrote {} rows to {} and {}", table.len(), xlsx_path.display(), csv_path.display());
    println!("Wrote {} and {}", xlsx_path.display(), csv_path.display());
    Ok(())
}
