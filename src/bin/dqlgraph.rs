use std::{env, process};

use dqlgraph::{DqlError, client::CommandLineConfig, info::fetch_query};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        println!("{}", CommandLineConfig::help());
        return;
    }
    let arg_refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
    let config = match CommandLineConfig::from_args(&arg_refs) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(2);
        }
    };

    match run_command(&config) {
        Ok(query) => println!("{query}"),
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(2);
        }
    }
}

fn run_command(config: &CommandLineConfig) -> Result<String, DqlError> {
    match config.command.as_str() {
        "list" => config.list_query().compile(),
        "fetch" => {
            let fields: Vec<&str> = config.predicates.iter().map(String::as_str).collect();
            fetch_query(&config.dtype, &config.uid, &fields)
        }
        other => Err(DqlError::invalid_input(format!("unknown command {other}"))),
    }
}
