//! Write synthetic OpenBCI Cyton sessions for trying out `eegclean`.
//!
//! Usage: `generate_sample [OUT_DIR]` (default `sample_sessions`).

use std::f64::consts::PI;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const SAMPLE_RATE: f64 = 250.0;
const DURATION_SECS: usize = 30;
const EXG_CHANNELS: usize = 8;
/// Unix time of the first session start, 2024-05-01 10:00:00 UTC.
const START_EPOCH: f64 = 1_714_557_600.0;

/// Column layout of a Cyton recording exported by the OpenBCI GUI.
const NUMERIC_COLUMNS: &[&str] = &[
    "Sample Index",
    "EXG Channel 0",
    "EXG Channel 1",
    "EXG Channel 2",
    "EXG Channel 3",
    "EXG Channel 4",
    "EXG Channel 5",
    "EXG Channel 6",
    "EXG Channel 7",
    "Accel Channel 0",
    "Accel Channel 1",
    "Accel Channel 2",
    "Not Used",
    "Digital Channel 0 (D11)",
    "Digital Channel 1 (D12)",
    "Digital Channel 2 (D13)",
    "Digital Channel 3 (D17)",
    "Not Used",
    "Digital Channel 4 (D18)",
    "Analog Channel 0",
    "Analog Channel 1",
    "Analog Channel 2",
    "Timestamp",
    "Marker Channel",
];
const FORMATTED_TIMESTAMP: &str = "Timestamp (Formatted)";

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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
        mean + std_dev * z
    }
}

/// One synthetic recording, stored column-major in `NUMERIC_COLUMNS` order.
struct Recording {
    numeric: Vec<Vec<f64>>,
    formatted: Vec<String>,
}

impl Recording {
    fn rows(&self) -> usize {
        self.formatted.len()
    }
}

/// Eyes open for the first half, eyes closed (strong 10 Hz alpha) for the second.
fn synthesize(rng: &mut SimpleRng, start_offset_secs: f64) -> Recording {
    let rows = DURATION_SECS * SAMPLE_RATE as usize;
    let mut numeric = vec![Vec::with_capacity(rows); NUMERIC_COLUMNS.len()];
    let mut formatted = Vec::with_capacity(rows);

    // Electrode offsets and alpha strength; occipital channels (6, 7) carry the most alpha.
    let offsets: Vec<f64> = (0..EXG_CHANNELS).map(|_| rng.gauss(-1500.0, 400.0)).collect();
    let alpha_gain = [0.2, 0.2, 0.4, 0.4, 0.6, 0.6, 1.0, 1.0];
    let eyes_closed_from = rows / 2;

    for i in 0..rows {
        let t = i as f64 / SAMPLE_RATE;
        let closed = i >= eyes_closed_from;

        let mut row = Vec::with_capacity(NUMERIC_COLUMNS.len());
        row.push((i % 256) as f64);

        for ch in 0..EXG_CHANNELS {
            let phase = ch as f64 * 0.3;
            let alpha = if closed {
                25.0 * alpha_gain[ch] * (2.0 * PI * 10.0 * t + phase).sin()
            } else {
                3.0 * alpha_gain[ch] * (2.0 * PI * 10.0 * t + phase).sin()
            };
            let line = 8.0 * (2.0 * PI * 60.0 * t).sin();
            let drift = 40.0 * (2.0 * PI * 0.05 * t + phase).sin();
            row.push(offsets[ch] + drift + alpha + line + rng.gauss(0.0, 5.0));
        }

        row.push(rng.gauss(0.0, 0.01));
        row.push(rng.gauss(0.0, 0.01));
        row.push(rng.gauss(1.0, 0.01));

        // Not Used, five digital inputs, Not Used, three analog inputs.
        row.extend(std::iter::repeat(0.0).take(9));

        let timestamp = START_EPOCH + start_offset_secs + t;
        row.push(timestamp);
        row.push(if i == eyes_closed_from { 1.0 } else { 0.0 });

        for (col, value) in numeric.iter_mut().zip(row) {
            col.push(value);
        }
        formatted.push(format_timestamp(start_offset_secs + t));
    }

    Recording { numeric, formatted }
}

/// `2024-05-01 HH:MM:SS.mmm` for an offset from 10:00:00 on that day.
fn format_timestamp(offset_secs: f64) -> String {
    let millis = (offset_secs * 1000.0).round() as u64;
    let secs = millis / 1000;
    format!(
        "2024-05-01 {:02}:{:02}:{:02}.{:03}",
        10 + secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        millis % 1000
    )
}

fn write_openbci_txt(path: &Path, rec: &Recording) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "%OpenBCI Raw EXG Data")?;
    writeln!(out, "%Number of channels = {EXG_CHANNELS}")?;
    writeln!(out, "%Sample Rate = {SAMPLE_RATE} Hz")?;
    writeln!(out, "%Board = OpenBCI_GUI$BoardCytonSerial")?;

    let mut header: Vec<&str> = NUMERIC_COLUMNS.to_vec();
    header.push(FORMATTED_TIMESTAMP);
    writeln!(out, "{}", header.join(", "))?;

    for i in 0..rec.rows() {
        let mut cells: Vec<String> = rec
            .numeric
            .iter()
            .enumerate()
            .map(|(c, col)| match NUMERIC_COLUMNS[c] {
                "Sample Index" | "Marker Channel" => format!("{:.1}", col[i]),
                _ => format!("{:.6}", col[i]),
            })
            .collect();
        cells.push(rec.formatted[i].clone());
        writeln!(out, "{}", cells.join(", "))?;
    }

    out.flush()
        .with_context(|| format!("writing {}", path.display()))
}

fn write_parquet(path: &Path, rec: &Recording) -> anyhow::Result<()> {
    // Parquet field names must be unique.
    let mut seen: Vec<String> = Vec::new();
    let mut fields = Vec::new();
    let mut arrays: Vec<ArrayRef> = Vec::new();
    for (name, values) in NUMERIC_COLUMNS.iter().zip(&rec.numeric) {
        let count = seen.iter().filter(|s| s.as_str() == *name).count();
        seen.push(name.to_string());
        let field_name = if count == 0 {
            name.to_string()
        } else {
            format!("{name}.{count}")
        };
        fields.push(Field::new(field_name, DataType::Float64, false));
        arrays.push(Arc::new(Float64Array::from(values.clone())));
    }
    fields.push(Field::new(FORMATTED_TIMESTAMP, DataType::Utf8, false));
    arrays.push(Arc::new(StringArray::from(rec.formatted.clone())));

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_sessions".to_string());
    let out_dir = Path::new(&out_dir);

    let mut rng = SimpleRng::new(42);
    for (offset, stamp) in [(0.0, "2024-05-01_10-00-00"), (3600.0, "2024-05-01_11-00-00")] {
        let session = out_dir.join(format!("OpenBCISession_{stamp}"));
        std::fs::create_dir_all(&session)
            .with_context(|| format!("creating {}", session.display()))?;

        let rec = synthesize(&mut rng, offset);
        let txt = session.join(format!("OpenBCI-RAW-{stamp}.txt"));
        let parquet = session.join(format!("OpenBCI-Arrow-{stamp}.parquet"));
        write_openbci_txt(&txt, &rec)?;
        write_parquet(&parquet, &rec)?;

        println!(
            "Wrote {} samples ({} s at {SAMPLE_RATE} Hz) to {} and {}",
            rec.rows(),
            DURATION_SECS,
            txt.display(),
            parquet.display()
        );
    }
    Ok(())
}
