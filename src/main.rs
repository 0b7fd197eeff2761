use anyhow::Context;
use clap::Parser;
use site2pdf::{ConvertConfig, Job, OutputMode, RunSummary};

mod args;
use args::Args;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    match convert(args).await {
        Ok(summary) => report(&summary),
        Err(e) => {
            ::log::error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

async fn convert(args: Args) -> anyhow::Result<RunSummary> {
    let mode = if args.separate {
        OutputMode::Separate
    } else {
        OutputMode::Combined
    };
    let job = Job::new(
        args.url.as_deref(),
        args.url_pattern.as_deref(),
        mode,
        &args.output,
    )?;
    let config = load_config(&args)?;

    println!("Note: rendering requires a WebDriver server (e.g., ChromeDriver).");
    println!("Set WEBDRIVER_URL if not using {}", config.webdriver_url);
    ::log::info!("Converting {} into {}", job.seed, job.output_dir.display());

    let started = std::time::Instant::now();
    let summary = site2pdf::run(&job, &config)
        .await
        .with_context(|| format!("failed to convert {}", job.seed))?;
    ::log::info!(
        "Finished in {:.2} seconds",
        started.elapsed().as_secs_f64()
    );
    Ok(summary)
}

/// Config file first, then the environment, then command-line flags
fn load_config(args: &Args) -> anyhow::Result<ConvertConfig> {
    let mut config = match &args.config {
        Some(path) => ConvertConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ConvertConfig::default(),
    }
    .with_env_overrides();

    if let Some(url) = &args.webdriver_url {
        config.webdriver_url = url.clone();
    }
    if let Some(concurrency) = args.concurrency {
        config.max_concurrency = concurrency;
    }
    if args.quality {
        config.quality = true;
    }
    config.validate()?;
    Ok(config)
}

fn report(summary: &RunSummary) {
    for (url, error) in &summary.fetch_failures {
        println!("warning: could not crawl {url}: {error}");
    }
    for (url, error) in &summary.render_failures {
        println!("warning: skipped {url}: {error}");
    }
    println!(
        "Rendered {} page(s) into {} file(s):",
        summary.rendered_pages,
        summary.written.len()
    );
    for path in &summary.written {
        println!("  {}", path.display());
    }
}
