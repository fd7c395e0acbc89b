//! Benchmark for statement cache and metadata reuse.
//!
//! Runs a rotating set of statements against the in-memory driver with the
//! statement cache enabled and disabled, and reports executions per second
//! together with the driver calls each mode needed.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use rowbridge_rs::driver::{MemoryDriver, MemoryTable};
use rowbridge_rs::{Cell, ColumnDescriptor, PostgresTypeMap, ResultMode, Session, SessionConfig, SqlType};

#[derive(Parser, Debug)]
#[command(name = "benchmark_cache")]
#[command(about = "Benchmark statement caching and metadata reuse")]
struct Args {
    /// Number of distinct statements in the rotation
    #[arg(short, long, default_value = "50")]
    statements: usize,

    /// Statement cache size for the cached run
    #[arg(short, long, default_value = "100")]
    limit: i64,

    /// Rows returned per statement
    #[arg(short, long, default_value = "100")]
    rows: usize,

    /// Executions per run
    #[arg(short, long, default_value = "20000")]
    executions: usize,

    /// Number of warmup runs
    #[arg(short, long, default_value = "1")]
    warmup: usize,

    /// Output JSON file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

struct RunStats {
    elapsed: f64,
    prepared: usize,
    described: usize,
    closed: usize,
    hits: u64,
}

fn build_driver(statements: usize, rows: usize) -> MemoryDriver {
    let mut driver = MemoryDriver::new();
    for n in 0..statements {
        let table = MemoryTable::new(vec![
            ColumnDescriptor::new("id", SqlType::BIGINT, "int8"),
            ColumnDescriptor::new("name", SqlType::VARCHAR, "varchar"),
            ColumnDescriptor::new("amount", SqlType::NUMERIC, "numeric").with_precision_scale(12, 2),
            ColumnDescriptor::new("payload", SqlType::VARBINARY, "bytea"),
        ])
        .with_rows((0..rows).map(|i| {
            vec![
                Cell::Int(i as i64),
                Cell::Text(format!("row-{i}")),
                Cell::Text(format!("{i}.25")),
                Cell::Bytes(vec![(i % 256) as u8; 16]),
            ]
        }));
        driver.register(statement(n), table);
    }
    driver
}

fn statement(n: usize) -> String {
    format!("SELECT id, name, amount, payload FROM t{n} WHERE id > ?")
}

fn run(args: &Args, limit: i64) -> Result<RunStats, Box<dyn std::error::Error>> {
    let driver = build_driver(args.statements, args.rows);
    let stats = driver.stats();
    let config = SessionConfig::default().with_statement_limit(limit);
    let mut session =
        Session::new(driver, config).with_type_map_builder(PostgresTypeMap::standard());

    let sql: Vec<String> = (0..args.statements).map(statement).collect();
    let start = Instant::now();
    for i in 0..args.executions {
        let result = session.exec_query(
            &sql[i % sql.len()],
            Some("bench"),
            &[(i as i64).into()],
            ResultMode::Typed,
        )?;
        std::hint::black_box(result);
    }
    let elapsed = start.elapsed().as_secs_f64();

    let hits = session.cache_metrics().hits;
    session.close();
    Ok(RunStats {
        elapsed,
        prepared: stats.prepared(),
        described: stats.described(),
        closed: stats.closed(),
        hits,
    })
}

fn measure(args: &Args, label: &str, limit: i64) -> Result<RunStats, Box<dyn std::error::Error>> {
    for i in 0..args.warmup {
        let warm = run(args, limit)?;
        println!("  Warmup {} ({label}): {:.3}s", i + 1, warm.elapsed);
    }
    let stats = run(args, limit)?;
    println!(
        "  {label}: {:.3}s, {:.0} exec/s, prepared={}, described={}, closed={}, hits={}",
        stats.elapsed,
        args.executions as f64 / stats.elapsed,
        stats.prepared,
        stats.described,
        stats.closed,
        stats.hits
    );
    Ok(stats)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    if args.statements == 0 {
        eprintln!("--statements must be at least 1");
        std::process::exit(1);
    }

    println!(
        "rowbridge-rs Benchmark: {} statements, {} rows, {} executions",
        args.statements, args.rows, args.executions
    );
    println!();

    let cached = measure(&args, "cached", args.limit)?;
    let uncached = measure(&args, "uncached", 0)?;

    println!();
    println!("Results:");
    println!("  Speedup: {:.2}x", uncached.elapsed / cached.elapsed);

    let results = serde_json::json!({
        "statements": args.statements,
        "rows": args.rows,
        "executions": args.executions,
        "limit": args.limit,
        "cached": {
            "elapsed_secs": cached.elapsed,
            "prepared": cached.prepared,
            "described": cached.described,
            "closed": cached.closed,
            "hits": cached.hits,
        },
        "uncached": {
            "elapsed_secs": uncached.elapsed,
            "prepared": uncached.prepared,
            "described": uncached.described,
            "closed": uncached.closed,
        },
    });

    if let Some(ref output_path) = args.output {
        fs::write(output_path, serde_json::to_string_pretty(&results)?)?;
        println!("  Saved to: {}", output_path.display());
    }

    Ok(())
}
