use std::collections::HashSet;
use std::sync::Arc;

use clap::{crate_authors, crate_description, crate_name, crate_version, App, Arg, SubCommand};
use tracing_subscriber::EnvFilter;

use ftidx::{
    open_query_engine, open_store, run_indexing, Config, LogSink, OrderBy, OrderDir, SourceRoot,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let matches = App::new(crate_name!())
        .version(crate_version!())
        .about(crate_description!())
        .author(crate_authors!())
        .arg(
            Arg::with_name("db")
                .long("db")
                .takes_value(true)
                .default_value("ftidx.db")
                .help("Path to the SQLite index file"),
        )
        .subcommand(
            SubCommand::with_name("index")
                .about("Index one or more directories")
                .arg(
                    Arg::with_name("dir")
                        .multiple(true)
                        .required(true)
                        .help("Directories to index"),
                )
                .arg(
                    Arg::with_name("ext")
                        .long("ext")
                        .takes_value(true)
                        .multiple(true)
                        .help("File extensions to consider (default: a built-in text/code set)"),
                )
                .arg(
                    Arg::with_name("workers")
                        .long("workers")
                        .takes_value(true)
                        .help("Number of indexer worker threads"),
                ),
        )
        .subcommand(
            SubCommand::with_name("search")
                .about("Run a conjunctive query against the index")
                .arg(Arg::with_name("query").multiple(true).required(true))
                .arg(Arg::with_name("limit").long("limit").takes_value(true).default_value("10"))
                .arg(Arg::with_name("offset").long("offset").takes_value(true).default_value("0")),
        )
        .get_matches();

    let db_path = matches.value_of("db").unwrap();

    let result = match matches.subcommand() {
        ("index", Some(sub)) => run_index(db_path, sub),
        ("search", Some(sub)) => run_search(db_path, sub),
        _ => {
            eprintln!("{}", matches.usage());
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run_index(db_path: &str, sub: &clap::ArgMatches) -> Result<(), ftidx::Error> {
    let mut config = Config::default();
    if let Some(exts) = sub.values_of("ext") {
        config.extensions = exts.map(|e| e.to_string()).collect::<HashSet<_>>();
    }
    if let Some(workers) = sub.value_of("workers") {
        if let Ok(n) = workers.parse() {
            config.worker_count = n;
        }
    }

    // Configuration rejection is the CLI collaborator's job, not the core's
    // (spec.md §7): a bad value here must never reach `run_indexing`.
    if let Err(e) = config.validate() {
        eprintln!("error: invalid configuration: {e}");
        std::process::exit(1);
    }

    let roots: Vec<SourceRoot> = sub
        .values_of("dir")
        .unwrap()
        .map(|d| SourceRoot::Directory(d.into()))
        .collect();

    let log: Arc<dyn LogSink> = Arc::new(ftidx::logging::TracingSink);
    let status = run_indexing(db_path, roots, &config, log)?;
    let snapshot = status.dispatcher.snapshot();
    println!(
        "indexed: {} new, {} updated, {} unchanged, {} errors",
        snapshot.new_count, snapshot.outdated_count, snapshot.uptodate_count, snapshot.error_count
    );
    Ok(())
}

fn run_search(db_path: &str, sub: &clap::ArgMatches) -> Result<(), ftidx::Error> {
    let conn = open_store(db_path)?;
    let engine = open_query_engine(Config::default().hash_cache_capacity);

    let query = sub.values_of("query").unwrap().collect::<Vec<_>>().join(" ");
    let limit: usize = sub.value_of("limit").unwrap().parse().unwrap_or(10);
    let offset: usize = sub.value_of("offset").unwrap().parse().unwrap_or(0);

    let (total, hits) = engine.search(&conn, &query, limit, offset, OrderBy::Relevance, OrderDir::Descending)?;
    println!("{total} matching documents");
    for hit in hits {
        println!(
            "  [{:>6.1}] {} (freq={}, avg_pos={})",
            hit.relevance, hit.locator, hit.frequency, hit.average_position
        );
    }
    Ok(())
}
