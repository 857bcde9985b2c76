use anyhow::{Context, Result};
use artindex::{
    bulk::HttpTransport,
    config::Config,
    import::{discover_files, ConsoleProgress, IndexCoordinatorBuilder, JsonLinesSource, RunResult},
};
use tracing::{info, warn};

/// Index every input file under the configured data directory
pub fn index_articles(config: Config, quiet: bool, json_summary: bool) -> Result<()> {
    let data_dir = &config.indexing.data_dir;
    if !data_dir.is_dir() {
        anyhow::bail!("Data directory not found: {}", data_dir.display());
    }

    let paths = discover_files(data_dir, &config.indexing.file_extension);
    if paths.is_empty() {
        warn!(
            "No .{} files found under {}",
            config.indexing.file_extension,
            data_dir.display()
        );
    }
    info!("Found {} files under {}", paths.len(), data_dir.display());

    let transport = HttpTransport::new(&config.opensearch)
        .context("Failed to create OpenSearch transport")?;

    let mut coordinator = IndexCoordinatorBuilder::new()
        .with_transport(transport)
        .with_index_name(config.indexing.index_name.clone())
        .with_batch_size(config.indexing.batch_size)
        .with_record_ids(config.indexing.use_record_ids)
        .with_failure_log(config.indexing.failure_log.as_ref())
        .with_observer(ConsoleProgress::new(quiet))
        .build()
        .context("Failed to create index coordinator")?;

    let result = coordinator
        .run(&paths, &JsonLinesSource::new())
        .context("Indexing aborted")?;

    if json_summary {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if !quiet {
        print_summary(&config, &result);
    }

    Ok(())
}

fn print_summary(config: &Config, result: &RunResult) {
    println!("\nIndexing Summary");
    println!("================");
    println!("Files processed:   {}", result.files_processed);
    println!("Files unreadable:  {}", result.files_failed);
    println!("Batches:           {}", result.batches_processed);
    println!("Batches failed:    {}", result.batches_failed);
    println!("Articles read:     {}", result.records_attempted);
    println!("Articles indexed:  {}", result.records_indexed);
    println!("Articles rejected: {}", result.failed_ids().len());
    println!("Elapsed time:      {:.1}s", result.elapsed_seconds);
    println!("Processing rate:   {:.1} docs/s", result.rate());

    for batch in result.failed_batches() {
        if let Some(stage) = batch.failure_stage() {
            println!(
                "  batch {} of {} failed at {}",
                batch.number,
                batch
                    .file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<memory>".to_string()),
                stage
            );
        }
    }

    if !result.is_clean() {
        if let Some(ref log) = config.indexing.failure_log {
            println!("\nFailures recorded in: {}", log.display());
        }
    }
}
