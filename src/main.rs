// Lance Analyzer - Main executable
// Author: Gabriel Demetrios Lafis

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::{Arg, ArgMatches, Command};
use log::{error, info, warn};

use lance_analyzer::{
    api::{AppState, Server, ServerConfig},
    data::{DataSink, XlsxSink},
    processing::{FilterPredicate, SortSpec, View, ViewRequest},
    storage::LoadCache,
    utils::{init_logging, AppError, AppResult, Config},
};

fn cli() -> Command<'static> {
    Command::new("lance-analyzer")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Gabriel Demetrios Lafis")
        .about("Filter, sort and export bid tables")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Sets a custom config file")
                .takes_value(true),
        )
        .subcommand(
            Command::new("server")
                .about("Run the API server")
                .arg(
                    Arg::new("host")
                        .short('H')
                        .long("host")
                        .value_name("HOST")
                        .help("Sets the server host")
                        .takes_value(true),
                )
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .value_name("PORT")
                        .help("Sets the server port")
                        .takes_value(true),
                )
                .arg(source_arg()),
        )
        .subcommand(
            Command::new("export")
                .about("Filter and sort the source file, then write it as .xlsx")
                .arg(source_arg())
                .arg(
                    Arg::new("filter")
                        .short('f')
                        .long("filter")
                        .value_name("COLUMN:OP:VALUE")
                        .help("Adds a filter, e.g. 'lance máx:>:30' (repeatable)")
                        .takes_value(true)
                        .multiple_occurrences(true),
                )
                .arg(
                    Arg::new("sort")
                        .short('s')
                        .long("sort")
                        .value_name("COLUMN")
                        .help("Adds a sort column (repeatable, in priority order)")
                        .takes_value(true)
                        .multiple_occurrences(true),
                )
                .arg(
                    Arg::new("descending")
                        .short('d')
                        .long("descending")
                        .help("Sorts in descending order"),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Sets the output file")
                        .takes_value(true),
                ),
        )
}

fn source_arg() -> Arg<'static> {
    Arg::new("source")
        .long("source")
        .value_name("FILE")
        .help("Sets the source CSV file")
        .takes_value(true)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();

    // Load configuration
    let config = match matches.value_of("config") {
        Some(config_path) => Config::from_file(config_path)
            .map_err(|err| anyhow!("Error loading config file '{}': {}", config_path, err))?,
        None => Config::default(),
    };

    // Initialize logging
    if let Err(err) = init_logging(config.log_level_filter()) {
        eprintln!("Error initializing logger: {}", err);
    }

    match matches.subcommand() {
        Some(("server", sub)) => run_server(&config, sub).await,
        Some(("export", sub)) => {
            let rows = run_export(&config, sub).context("Export failed")?;
            info!("Done, {} rows exported", rows);
            Ok(())
        }
        _ => {
            println!("No subcommand specified. Use --help for usage information.");
            Ok(())
        }
    }
}

async fn run_server(config: &Config, matches: &ArgMatches) -> anyhow::Result<()> {
    // Override config with command line arguments
    let host = matches.value_of("host").unwrap_or(&config.server.host);
    let port = match matches.value_of("port") {
        Some(port) => port
            .parse::<u16>()
            .with_context(|| format!("Invalid port '{}'", port))?,
        None => config.server.port,
    };
    let source = matches.value_of("source").unwrap_or(&config.source.path);

    let mut cache = LoadCache::new(config.cache.capacity);
    if let Some(ttl) = config.cache.ttl {
        cache = cache.with_ttl(Duration::from_secs(ttl));
    }

    let mut state = AppState::new(source, Arc::new(cache));
    state.loader = config.source.loader().map_err(|msg| anyhow!(msg))?;
    state.encoder = config.export.encoder().context("Invalid export sheet name")?;
    state.file_name = config.export.file_name.clone();

    let server_config = ServerConfig {
        host: host.to_string(),
        port,
        workers: config.server.workers.unwrap_or_else(num_cpus::get),
        enable_cors: config.server.enable_cors,
    };

    let server = Server::new(state, server_config);
    server.run().await?;

    Ok(())
}

fn run_export(config: &Config, matches: &ArgMatches) -> AppResult<usize> {
    let source = matches.value_of("source").unwrap_or(&config.source.path);
    let output = matches.value_of("output").unwrap_or(&config.export.file_name);

    let filters = matches
        .values_of("filter")
        .map(|values| values.map(str::parse::<FilterPredicate>).collect::<Result<Vec<_>, _>>())
        .transpose()?
        .unwrap_or_default();
    let columns = matches
        .values_of("sort")
        .map(|values| values.map(String::from).collect())
        .unwrap_or_default();
    let request = ViewRequest::new(filters, SortSpec::new(columns, !matches.is_present("descending")));

    let loader = config.source.loader().map_err(AppError::Config)?;
    let encoder = config.export.encoder()?;

    let report = loader.load(source)?;
    if !report.is_complete() {
        return Err(AppError::MissingColumns {
            source: source.to_string(),
            columns: report.missing_columns,
        });
    }

    let view = View::build(&report, &request)?;
    if view.dataset.is_empty() {
        warn!("No rows match the filters, nothing written");
        return Ok(0);
    }

    let sink = XlsxSink::new(output, encoder);
    if let Err(err) = sink.write(&view.dataset) {
        error!("Error writing '{}': {}", sink.name(), err);
        return Err(err.into());
    }
    info!("Wrote '{}'", sink.name());

    Ok(view.dataset.len())
}
