use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Date32Type, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, Days};
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use seller_dashboard::data::repair::{
    derive_orders, derive_profit, BUY_BOX_CHOICES, CATEGORIES, FALLBACK_DATE, MARKETPLACES,
    TRAFFIC_SOURCES,
};

/// A catalogue entry: every row of the sample sells one of these.
struct Product {
    asin: String,
    title: String,
    category: &'static str,
    price: f64,
}

struct Row {
    date: chrono::NaiveDate,
    marketplace: &'static str,
    product: usize,
    sessions: i64,
    units_sold: i64,
    revenue: f64,
    orders: i64,
    buy_box: f64,
    profit: f64,
    traffic_source: &'static str,
}

const HEADERS: [&str; 12] = [
    "Date",
    "Marketplace",
    "Category",
    "ASIN",
    "Title",
    "Sessions",
    "Units Sold",
    "Revenue",
    "Orders",
    "Buy Box %",
    "Profit",
    "Traffic Source",
];

fn catalogue(rng: &mut StdRng) -> Vec<Product> {
    (0..40)
        .map(|i| {
            let category = CATEGORIES[i % CATEGORIES.len()];
            Product {
                asin: format!("B0{:08X}", rng.gen::<u32>()),
                title: format!("{category} item #{}", i + 1),
                category,
                price: (rng.gen_range(999..19_999) as f64) / 100.0,
            }
        })
        .collect()
}

fn generate_rows(n: usize, products: &[Product], rng: &mut StdRng) -> Vec<Row> {
    (0..n)
        .map(|i| {
            let date = FALLBACK_DATE
                .checked_add_days(Days::new((i % 365) as u64))
                .unwrap_or(FALLBACK_DATE);
            let product = rng.gen_range(0..products.len());
            // Busier towards the end of the year.
            let season = 1.0 + date.month() as f64 / 12.0;
            let sessions = (rng.gen_range(100..2_000) as f64 * season) as u64;
            let units_sold = (sessions as f64 * rng.gen_range(0.02..0.15)) as u64;
            let revenue = (units_sold as f64 * products[product].price * 100.0).round() / 100.0;
            Row {
                date,
                marketplace: MARKETPLACES[rng.gen_range(0..MARKETPLACES.len())],
                product,
                sessions: sessions as i64,
                units_sold: units_sold as i64,
                revenue,
                orders: derive_orders(units_sold) as i64,
                buy_box: BUY_BOX_CHOICES[rng.gen_range(0..BUY_BOX_CHOICES.len())],
                profit: derive_profit(revenue),
                traffic_source: TRAFFIC_SOURCES[rng.gen_range(0..TRAFFIC_SOURCES.len())],
            }
        })
        .collect()
}

fn write_csv(path: &Path, rows: &[Row], products: &[Product]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer.write_record(HEADERS)?;
    for r in rows {
        let p = &products[r.product];
        writer.write_record([
            r.date.to_string(),
            r.marketplace.to_string(),
            p.category.to_string(),
            p.asin.clone(),
            p.title.clone(),
            r.sessions.to_string(),
            r.units_sold.to_string(),
            format!("{:.2}", r.revenue),
            r.orders.to_string(),
            r.buy_box.to_string(),
            format!("{:.2}", r.profit),
            r.traffic_source.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[Row], products: &[Product]) -> Result<()> {
    let text = |values: Vec<&str>| -> ArrayRef { Arc::new(StringArray::from(values)) };
    let int = |values: Vec<i64>| -> ArrayRef { Arc::new(Int64Array::from(values)) };
    let float = |values: Vec<f64>| -> ArrayRef { Arc::new(Float64Array::from(values)) };

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Date32Array::from(
            rows.iter()
                .map(|r| Date32Type::from_naive_date(r.date))
                .collect::<Vec<_>>(),
        )),
        text(rows.iter().map(|r| r.marketplace).collect()),
        text(rows.iter().map(|r| products[r.product].category).collect()),
        text(rows.iter().map(|r| products[r.product].asin.as_str()).collect()),
        text(rows.iter().map(|r| products[r.product].title.as_str()).collect()),
        int(rows.iter().map(|r| r.sessions).collect()),
        int(rows.iter().map(|r| r.units_sold).collect()),
        float(rows.iter().map(|r| r.revenue).collect()),
        int(rows.iter().map(|r| r.orders).collect()),
        float(rows.iter().map(|r| r.buy_box).collect()),
        float(rows.iter().map(|r| r.profit).collect()),
        text(rows.iter().map(|r| r.traffic_source).collect()),
    ];

    let fields: Vec<Field> = HEADERS
        .iter()
        .zip(&columns)
        .map(|(name, col)| Field::new(*name, col.data_type().clone(), false))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let n_rows: usize = match args.next() {
        Some(n) => n.parse().with_context(|| format!("invalid row count '{n}'"))?,
        None => 1_000,
    };
    let out_dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("data"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = StdRng::seed_from_u64(42);
    let products = catalogue(&mut rng);
    let rows = generate_rows(n_rows, &products, &mut rng);

    let csv_path = out_dir.join("amazon.csv");
    let parquet_path = out_dir.join("amazon.parquet");
    write_csv(&csv_path, &rows, &products)?;
    write_parquet(&parquet_path, &rows, &products)?;

    println!(
        "Wrote {} sales rows ({} products) to {} and {}",
        rows.len(),
        products.len(),
        csv_path.display(),
        parquet_path.display()
    );
    Ok(())
}
