use anyhow::Result;
use clap::{Parser, ValueEnum};

use ingest_worker::broker::JobPublisher;
use ingest_worker::document::extract::{JobMessage, SourceKind};
use ingest_worker::utils::logger;
use ingest_worker::Settings;

/// Publishes one ingestion job onto the broker (spec §4.10), the enqueue
/// side's CLI entry point — grounded in the teacher's clap-based operator
/// tooling convention.
#[derive(Parser, Debug)]
#[command(name = "enqueue", about = "Publish a single ingestion job")]
struct Cli {
    /// Logical document id this job belongs to. Must already have a row in
    /// the `documents` table.
    #[arg(long)]
    document_id: i64,

    #[arg(long)]
    connector_id: i64,

    #[arg(long, value_enum)]
    file_type: CliFileType,

    /// Source URL. Required for `url` and `yt` jobs.
    #[arg(long, default_value = "")]
    url: String,

    #[arg(long, default_value = "")]
    site_map: String,

    #[arg(long, default_value_t = false)]
    search_for_sitemap: bool,

    #[arg(long, default_value_t = false)]
    url_recursive: bool,

    #[arg(long)]
    collection_name: String,

    #[arg(long)]
    model_name: String,

    #[arg(long)]
    model_dimension: i32,

    #[arg(long)]
    tenant_id: Option<i64>,

    #[arg(long)]
    user_id: Option<i64>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum CliFileType {
    Url,
    Pdf,
    Doc,
    Txt,
    Md,
    Yt,
}

impl From<CliFileType> for SourceKind {
    fn from(value: CliFileType) -> Self {
        match value {
            CliFileType::Url => SourceKind::Url,
            CliFileType::Pdf => SourceKind::Pdf,
            CliFileType::Doc => SourceKind::Doc,
            CliFileType::Txt => SourceKind::Txt,
            CliFileType::Md => SourceKind::Md,
            CliFileType::Yt => SourceKind::Yt,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logger::init_logger()?;

    let cli = Cli::parse();
    let settings = Settings::load()?;

    let job = JobMessage {
        url: cli.url,
        site_map: cli.site_map,
        search_for_sitemap: cli.search_for_sitemap,
        document_id: cli.document_id,
        connector_id: cli.connector_id,
        file_type: cli.file_type.into(),
        url_recursive: cli.url_recursive,
        collection_name: cli.collection_name,
        model_name: cli.model_name,
        model_dimension: cli.model_dimension,
        tenant_id: cli.tenant_id,
        user_id: cli.user_id,
    };

    let publisher = JobPublisher::connect(&settings.broker).await?;
    publisher.publish(&job).await?;

    println!("published job for document_id={}", job.document_id);
    Ok(())
}
