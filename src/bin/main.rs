use clap::Parser;
use pixlift::canva::{self, CanvaSession};
use pixlift::{Config, Layout, RunRecord, SearchClient};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "pixlift")]
#[command(about = "Fetch a Pixabay photo and stage it into Canva's uploads panel")]
#[command(version)]
struct Cli {
    /// Run the browser with a visible window (for selector maintenance)
    #[arg(long)]
    headed: bool,

    /// Verbose output (-v for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> pixlift::Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let layout = Layout::default();
    layout.ensure()?;

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let client = SearchClient::new()?;
    let url = match client.first_image_url(&config.api_key, &config.query).await? {
        Some(url) => url,
        None => {
            eprintln!("no Pixabay hits for query: {}", config.query);
            std::process::exit(1);
        }
    };

    let image_path = layout.image_path();
    pixlift::fetch::download(&url, &image_path).await?;
    info!("downloaded image to {}", image_path.display());

    match &config.credentials {
        None => info!("CANVA_EMAIL/CANVA_PASSWORD not set; skipping Canva upload"),
        Some(credentials) => {
            match CanvaSession::launch(
                credentials.clone(),
                layout.upload_screenshot_path(),
                cli.headed,
            )
            .await
            {
                Ok(session) => {
                    canva::run_upload(&session, &image_path, &layout.error_screenshot_path())
                        .await;
                    session.close().await;
                }
                // No page exists yet, so there is nothing to screenshot.
                Err(e) => warn!("canva automation failed: {}: {}", e.kind(), e),
            }
        }
    }

    RunRecord {
        pixabay_image_url: url,
        query: config.query,
    }
    .write(&layout.run_record_path())?;
    info!("done");

    Ok(())
}
