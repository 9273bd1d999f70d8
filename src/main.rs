use std::env;
use std::error::Error;

use clap::Parser;

use grapher_migrations::config::Cli;
use grapher_migrations::config::PostgresConfig;
use grapher_migrations::diagnostics::DiagnosticSink;
use grapher_migrations::diagnostics::TracingSink;
use grapher_migrations::diagnostics::WriterSink;
use grapher_migrations::migrations;
use grapher_migrations::store::PgStore;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<(), &'static str> {
    // Configure tracing subscriber
    let filter =
        env::var("GRAPHER_LOG").unwrap_or(String::from("grapher_migrations=info"));
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_max_level(tracing::Level::INFO)
        .with_env_filter(filter)
        .finish();

    let _guard = tracing::subscriber::set_global_default(subscriber);

    tracing::info!("starting grapher-migrations v{VERSION}");
    if cfg!(feature = "test-utilities") {
        tracing::warn!("build includes test-utilities, use cargo's `--no-default-features` flag");
    } else {
        tracing::debug!("compiled without test-utilities");
    }

    let cli = Cli::parse();

    // Env variables
    let pg_uri = env::var("GRAPHER_POSTGRES_URI").map_err(|_| {
        tracing::error!("missing GRAPHER_POSTGRES_URI environment variable");
        "GRAPHER_POSTGRES_URI is not set"
    })?;
    tracing::debug!("found GRAPHER_POSTGRES_URI environment variable");

    let pgconf = PostgresConfig::new(&pg_uri);
    let mut store = PgStore::connect(&pgconf).await.map_err(|e| {
        tracing::error!("{e}");
        "Failed connecting to database"
    })?;

    let mut sink: Box<dyn DiagnosticSink> = if cli.print_diagnostics {
        Box::new(WriterSink::new(std::io::stdout()))
    } else {
        Box::new(TracingSink)
    };

    match migrations::check(&mut store, cli.allow_migrations, sink.as_mut()).await {
        Ok(applied) => {
            for name in applied {
                tracing::info!("applied {name}");
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("{e}");
            let mut source = e.source();
            while let Some(cause) = source {
                tracing::error!("caused by: {cause}");
                source = cause.source();
            }
            Err("Migrations failed")
        }
    }
}
