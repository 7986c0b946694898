//! Operational maintenance CLI: image optimization, SEO audits, sitemap
//! generation, and order total repair. Runs against the same configuration
//! and database as the API server.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use marketplace_api::{
    config::{init_tracing, load_config},
    db,
    events::event_channel,
    services::{
        images::{collect_image_files, ImagePipeline},
        orders::OrderService,
        seo::SeoService,
    },
};

#[derive(Parser)]
#[command(name = "maintenance", about = "Marketplace maintenance tasks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate responsive JPEG variants for uploaded images
    OptimizeImages {
        /// Directory to scan; defaults to the configured uploads directory
        #[arg(long)]
        dir: Option<PathBuf>,
        /// How many images to process concurrently
        #[arg(long, default_value_t = 4)]
        batch_size: usize,
        /// Stamp the watermark even if no watermark text is configured
        #[arg(long)]
        watermark: bool,
    },
    /// Audit active products against the SEO heuristics
    SeoAudit {
        /// Backfill missing image alt text from the suggestion template
        #[arg(long)]
        fix_alt_text: bool,
    },
    /// Write sitemap.xml for the current catalog
    Sitemap {
        /// Output path
        #[arg(long, default_value = "sitemap.xml")]
        out: PathBuf,
    },
    /// Recompute order totals from their line items
    RepairOrderTotals,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = Arc::new(load_config()?);
    init_tracing(cfg.log_level(), cfg.log_json);

    match cli.command {
        Command::OptimizeImages {
            dir,
            batch_size,
            watermark,
        } => {
            let dir = dir.unwrap_or_else(|| PathBuf::from(&cfg.uploads_dir));
            let sources = collect_image_files(&dir)?;
            info!(dir = %dir.display(), count = sources.len(), "scanning for images");

            let pipeline = ImagePipeline::new(
                cfg.image_jpeg_quality,
                watermark || cfg.watermark_text.is_some(),
            );
            let report = pipeline.optimize_batch(&sources, batch_size).await;
            info!(
                processed = report.processed.len(),
                failed = report.failed.len(),
                "optimization run finished"
            );
            for failure in &report.failed {
                warn!(source = %failure.source.display(), "failed: {}", failure.error);
            }
        }
        Command::SeoAudit { fix_alt_text } => {
            let pool = Arc::new(db::establish_connection_from_app_config(&cfg).await?);
            let seo = SeoService::new(pool, cfg.public_base_url.clone());

            let products = seo.audit_catalog().await?;
            println!("{}", serde_json::to_string_pretty(&products)?);
            let categories = seo.audit_categories().await?;
            println!("{}", serde_json::to_string_pretty(&categories)?);

            if fix_alt_text {
                let updated = seo.fix_missing_alt_text().await?;
                info!(updated, "alt text backfilled");
            }
        }
        Command::Sitemap { out } => {
            let pool = Arc::new(db::establish_connection_from_app_config(&cfg).await?);
            let seo = SeoService::new(pool, cfg.public_base_url.clone());
            let xml = seo.generate_sitemap().await?;
            tokio::fs::write(&out, xml).await?;
            info!(out = %out.display(), "sitemap written");
        }
        Command::RepairOrderTotals => {
            let pool = Arc::new(db::establish_connection_from_app_config(&cfg).await?);
            let (event_sender, mut event_receiver) = event_channel(cfg.event_channel_capacity);
            // Drain events so sends never block on a full channel.
            tokio::spawn(async move { while event_receiver.recv().await.is_some() {} });

            let orders = OrderService::new(pool, Arc::new(event_sender));
            let repaired = orders.repair_all_order_totals().await?;
            if repaired.is_empty() {
                info!("all order totals already consistent");
            } else {
                for order_id in &repaired {
                    info!(%order_id, "order total repaired");
                }
                info!(count = repaired.len(), "order totals repaired");
            }
        }
    }

    Ok(())
}
