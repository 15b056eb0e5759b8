//! Morpho GA CLI - Generate children for a project from a JSON search configuration.

use std::fs;
use std::path::PathBuf;

use morpho_ga::{
    compute::GaSearch,
    schema::{CompareOp, FitnessQuery, SearchConfig},
    store::{ExportDirSource, OfflineSource, ProjectCache, ProjectSource, RecordPool},
};

fn main() {
    env_logger::init();

    let mut args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--example" {
        print_example_config();
        return;
    }

    let put = args.iter().any(|a| a == "--put");
    args.retain(|a| a != "--put");

    if args.len() < 2 {
        eprintln!("Usage: {} <search.json> [count] [--put]", args[0]);
        eprintln!();
        eprintln!("Generate GA children for a project from a search configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  search.json  Path to search configuration file");
        eprintln!("  count        Number of generation attempts (default: 1)");
        eprintln!("  --put        Write the cached records back to source_dir afterwards");
        eprintln!();
        eprintln!("Example configuration is printed with --example flag.");
        std::process::exit(1);
    }

    let config_path = PathBuf::from(&args[1]);
    let count: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(1);

    // Load configuration
    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config: SearchConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = config.validate() {
        eprintln!("Invalid config: {}", e);
        std::process::exit(1);
    }

    if put && config.source_dir.is_none() {
        eprintln!("--put needs source_dir in the configuration");
        std::process::exit(1);
    }

    // Open cache and fill it if empty
    let mut cache = ProjectCache::open(&config.cache_dir, &config.project_id).unwrap_or_else(|e| {
        eprintln!("Error opening cache: {}", e);
        std::process::exit(1);
    });

    let source: Box<dyn ProjectSource> = match &config.source_dir {
        Some(dir) => Box::new(ExportDirSource::new(dir)),
        None => Box::new(OfflineSource),
    };

    let schema = cache.load_schema(source.as_ref()).unwrap_or_else(|e| {
        eprintln!("Error loading schema: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = cache.load_records(source.as_ref()) {
        eprintln!("Error loading records: {}", e);
        std::process::exit(1);
    }

    let pooled = cache.all_records().map(|r| r.len()).unwrap_or(0);

    println!("Morpho GA Search");
    println!("================");
    println!("Project: {}", config.project_id);
    println!("Fields: {}", schema.len());
    println!("Pooled records: {}", pooled);
    println!("Query: {}", config.request.query);
    println!();

    let mut search = GaSearch::with_seed(schema, cache, config.random_seed);
    let mut accepted = 0;

    for i in 0..count {
        match search.generate_child(&config.request) {
            Ok(Some(child)) => {
                accepted += 1;
                let json = search.schema().record_json(&child);
                println!("  Child {}/{}: {}", i + 1, count, json);
            }
            Ok(None) => {
                println!("  Child {}/{}: child generation failed, check logs.", i + 1, count);
            }
            Err(e) => {
                eprintln!("Error generating child: {}", e);
                std::process::exit(1);
            }
        }
    }

    println!();
    println!("Accepted: {}/{}", accepted, count);

    if put && let Some(dir) = &config.source_dir {
        let schema = search.schema().clone();
        let cache = search.into_pool();
        match cache.put_records(&schema, &ExportDirSource::new(dir)) {
            Ok(written) => println!("Put {} records to {}", written, dir.display()),
            Err(e) => {
                eprintln!("Error putting records: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn print_example_config() {
    let mut config = SearchConfig {
        source_dir: Some(PathBuf::from("exports")),
        random_seed: Some(42),
        ..Default::default()
    };
    config.request.query = FitnessQuery::compare("step", CompareOp::Lt, 59.0);
    config.request.sort_field = Some("height".to_string());
    config.request.ascending = false;
    config.request.limit = Some(10);

    println!("Example configuration (search.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing example: {}", e),
    }
}
