use anyhow::Result;
use clap::{crate_version, App, AppSettings, Arg};

use simple_drive_core::services::BlobService;

mod backends;
mod server;
mod settings;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = App::new("simple-drive")
        .version(crate_version!())
        .about("Blob store service with pluggable storage backends.")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            App::new("server").about("Start the server").arg(
                Arg::new("config")
                    .long("config")
                    .takes_value(true)
                    .help("Path to a configuration file"),
            ),
        )
        .get_matches();

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    if let Some(matches) = matches.subcommand_matches("server") {
        let settings = settings::Settings::load(matches.value_of("config"))?;

        let database = backends::SqliteDatabase::connect(&settings.database_url).await?;

        database.migrate().await?;

        let storage = backends::open_blob_storage(&settings, &database).await?;

        tracing::info!(backend = %storage.kind(), "starting server");

        let service = BlobService::new(storage, database.metadata_store());

        server::serve(service, &settings.api_token, &settings.host, settings.port).await?;
    }

    Ok(())
}
