use clap::Parser;

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Postgresql connection URI postgresql://[userspec@][hostspec][/dbname][?paramspec]
    pub connection_uri: String,
}

impl PostgresConfig {
    pub fn new(uri: &str) -> Self {
        Self {
            connection_uri: uri.to_owned(),
        }
    }
}

#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
pub struct Cli {
    /// Allow pending migrations to be applied
    #[clap(short = 'm', long)]
    pub allow_migrations: bool,

    /// Print rewritten selections to stdout
    #[clap(short = 'p', long)]
    pub print_diagnostics: bool,
}
