use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

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
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
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
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let regions = ["north", "south", "east", "west"];
    let first_year = 1998;

    let mut ids: Vec<i64> = Vec::new();
    let mut region_col: Vec<&str> = Vec::new();
    let mut years: Vec<Option<i64>> = Vec::new();
    let mut values: Vec<f64> = Vec::new();

    for (id, region) in regions.iter().cycle().take(24).enumerate() {
        ids.push(id as i64);
        region_col.push(*region);
        // Roughly one row in eight has no year, so the report has nulls to count.
        let year = first_year + (rng.next_u64() % 6) as i64;
        years.push((rng.next_f64() >= 0.125).then_some(year));
        values.push((rng.next_f64() * 1000.0).round() / 10.0);
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("region", DataType::Utf8, false),
        Field::new("year", DataType::Int64, true),
        Field::new("value", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(ids)),
            Arc::new(StringArray::from(region_col)),
            Arc::new(Int64Array::from(years)),
            Arc::new(Float64Array::from(values)),
        ],
    )
    .context("building record batch")?;

    let output_path = "sample_data.parquet";
    let file = std::fs::File::create(output_path)
        .with_context(|| format!("creating {output_path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;

    println!("Wrote {} rows to {output_path}", batch.num_rows());
    Ok(())
}
