use std::fs::File;
use std::collections::HashMap;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use clap::{Parser, Subcommand};
use lazyflow_api::environment::StreamEnvironment;
use lazyflow_api::{ExecutionConfig, collectors};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "lazyflow")]
#[command(about = "Run lazyflow demonstration pipelines", long_about = None)]
struct Cli {
    /// Worker threads for parallel evaluation (defaults to available cores).
    #[arg(long, global = true)]
    parallelism: Option<usize>,
    /// Fixed partition size for parallel evaluation.
    #[arg(long, global = true)]
    min_partition_len: Option<usize>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Collector walkthrough over a fixed product list.
    Walkthrough {
        #[arg(long)]
        parallel: bool,
    },
    /// Three-argument reduce, sequential vs parallel.
    Reduce {
        #[arg(long, default_value_t = 10)]
        identity: i64,
        #[arg(default_values_t = vec![1i64, 2, 3])]
        values: Vec<i64>,
    },
    /// Show how many times filter and map run for find_first.
    Laziness {
        #[arg(long, default_value = "2")]
        needle: String,
    },
    /// Sum and count an integer range.
    Range {
        start: i64,
        end: i64,
        #[arg(long)]
        closed: bool,
        #[arg(long)]
        parallel: bool,
    },
    /// Count words in a file, or stdin when no file is given.
    Wordcount {
        file: Option<PathBuf>,
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

#[derive(Debug, Clone)]
struct Product {
    price: i64,
    name: &'static str,
}

fn products() -> Vec<Product> {
    vec![
        Product { price: 23, name: "potatoes" },
        Product { price: 14, name: "orange" },
        Product { price: 13, name: "lemon" },
        Product { price: 23, name: "bread" },
        Product { price: 13, name: "sugar" },
    ]
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let mut config = ExecutionConfig::default();
    if let Some(parallelism) = cli.parallelism {
        config = config.with_parallelism(parallelism);
    }
    if let Some(len) = cli.min_partition_len {
        config = config.with_min_partition_len(len);
    }
    info!(
        "parallelism={} min_partition_len={:?}",
        config.parallelism, config.min_partition_len
    );
    let env = StreamEnvironment::with_config(config);

    match cli.command {
        Commands::Walkthrough { parallel } => walkthrough(&env, parallel),
        Commands::Reduce { identity, values } => reduce(&env, identity, values),
        Commands::Laziness { needle } => laziness(&env, needle),
        Commands::Range {
            start,
            end,
            closed,
            parallel,
        } => range(&env, start, end, closed, parallel),
        Commands::Wordcount { file, top } => wordcount(&env, file, top),
    }
}

fn walkthrough(env: &StreamEnvironment, parallel: bool) -> anyhow::Result<()> {
    let source = || {
        if parallel {
            env.par_of(products())
        } else {
            env.of(products())
        }
    };

    let names = source()
        .map(|p| p.name)?
        .collect(collectors::joining(", ", "[", "]"))?;
    println!("names: {names}");

    let average = source().collect(collectors::averaging_i64(|p: &Product| p.price))?;
    println!("average price: {average}");

    let sum = source().collect(collectors::summing_i64(|p: &Product| p.price))?;
    println!("total price: {sum}");

    let stats = source().collect(collectors::summarizing_i64(|p: &Product| p.price))?;
    println!("{stats}");

    let by_price = source().collect(collectors::grouping_by(|p: &Product| p.price))?;
    let mut prices: Vec<_> = by_price.into_iter().collect();
    prices.sort_by_key(|(price, _)| *price);
    for (price, group) in prices {
        let names: Vec<_> = group.iter().map(|p| p.name).collect();
        println!("price {price}: {names:?}");
    }

    let parts = source().collect(collectors::partitioning_by(|p: &Product| p.price > 15))?;
    println!(
        "price > 15: {} product(s), otherwise {}",
        parts[&true].len(),
        parts[&false].len()
    );

    let big_price = source()
        .map(|p| p.price * 12)?
        .any_match(|price| *price > 200)?;
    println!("any yearly price above 200: {big_price}");
    Ok(())
}

fn reduce(env: &StreamEnvironment, identity: i64, values: Vec<i64>) -> anyhow::Result<()> {
    for parallel in [false, true] {
        let combines = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&combines);
        let stream = if parallel {
            env.par_of(values.clone())
        } else {
            env.of(values.clone())
        };
        let result = stream.reduce_with(
            identity,
            |acc, x| acc + x,
            move |a, b| {
                counter.fetch_add(1, Ordering::SeqCst);
                a + b
            },
        )?;
        println!(
            "{}: result={} combiner_calls={}",
            if parallel { "parallel" } else { "sequential" },
            result,
            combines.load(Ordering::SeqCst)
        );
    }
    Ok(())
}

fn laziness(env: &StreamEnvironment, needle: String) -> anyhow::Result<()> {
    let filter_calls = Arc::new(AtomicUsize::new(0));
    let map_calls = Arc::new(AtomicUsize::new(0));
    let (f, m) = (Arc::clone(&filter_calls), Arc::clone(&map_calls));

    let first = env
        .of(vec!["abc1", "abc2", "abc3"])
        .filter(move |s| {
            f.fetch_add(1, Ordering::SeqCst);
            info!("filter() was called on {s}");
            s.contains(needle.as_str())
        })?
        .map(move |s| {
            m.fetch_add(1, Ordering::SeqCst);
            info!("map() was called on {s}");
            s.to_uppercase()
        })?
        .find_first()?;

    println!(
        "first={:?} filter_calls={} map_calls={}",
        first,
        filter_calls.load(Ordering::SeqCst),
        map_calls.load(Ordering::SeqCst)
    );
    Ok(())
}

fn range(
    env: &StreamEnvironment,
    start: i64,
    end: i64,
    closed: bool,
    parallel: bool,
) -> anyhow::Result<()> {
    let open = || {
        let stream = if closed {
            env.range_closed(start, end)
        } else {
            env.range(start, end)
        };
        if parallel { stream.parallel() } else { Ok(stream) }
    };

    let count = open()?.count()?;
    let sum = open()?.reduce(|a, b| a + b)?;
    match sum {
        Some(sum) => println!("count={count} sum={sum}"),
        None => println!("count={count} sum=<empty>"),
    }
    Ok(())
}

fn wordcount(env: &StreamEnvironment, file: Option<PathBuf>, top: usize) -> anyhow::Result<()> {
    let counts = match file {
        Some(path) => count_words(env, BufReader::new(File::open(path)?))?,
        None => count_words(env, BufReader::new(io::stdin()))?,
    };

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    for (word, count) in ranked.into_iter().take(top) {
        println!("{word}: {count}");
    }
    Ok(())
}

/// Lowercased word frequencies. The first unreadable line fails the count.
fn count_words<R>(env: &StreamEnvironment, reader: R) -> anyhow::Result<HashMap<String, usize>>
where
    R: BufRead + Send + 'static,
{
    // A failing reader keeps failing; end the stream after the first error.
    let lines = reader.lines().scan(false, |failed, line| {
        if *failed {
            return None;
        }
        *failed = line.is_err();
        Some(line)
    });
    let lines = env
        .from_iter(lines)
        .to_vec()?
        .into_iter()
        .collect::<io::Result<Vec<String>>>()?;

    let counts = env
        .of(lines)
        .flat_map(|line| {
            line.split_whitespace()
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
        })?
        .collect(collectors::grouping_by_with(
            |word: &String| word.clone(),
            collectors::counting(),
        ))?;
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    /// Yields one good line, then fails every read.
    struct BrokenReader {
        served: bool,
    }

    impl Read for BrokenReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.served {
                return Err(io::Error::other("disk went away"));
            }
            self.served = true;
            let line = b"alpha beta\n";
            buf[..line.len()].copy_from_slice(line);
            Ok(line.len())
        }
    }

    #[test]
    fn test_count_words_lowercases_and_counts() {
        let env = StreamEnvironment::new();
        let input = Cursor::new("The cat\nthe dog  the\n\nCat\n");
        let counts = count_words(&env, input).unwrap();
        assert_eq!(counts["the"], 3);
        assert_eq!(counts["cat"], 2);
        assert_eq!(counts["dog"], 1);
        assert_eq!(counts.len(), 3);
    }

    #[test]
    fn test_count_words_reports_read_errors() {
        let env = StreamEnvironment::new();
        let reader = BufReader::new(BrokenReader { served: false });
        let err = count_words(&env, reader).unwrap_err();
        assert!(err.to_string().contains("disk went away"));
    }
}
