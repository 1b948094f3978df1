//! Analyse a food photo or description from the command line.
//!
//! ```text
//! NUTRILENS_API_KEY=... cargo run --example analyze -- prato.jpg
//! NUTRILENS_API_KEY=... cargo run --example analyze -- "pão francês com manteiga"
//! NUTRILENS_API_KEY=... cargo run --example analyze -- prato.jpg "sem o molho"
//! ```
//!
//! A first argument naming an existing file is read as the image; any other
//! argument is used as the text query. Settings come from the environment
//! (or a `.env` file), see `AnalyzerConfig::from_env`.

use anyhow::Context;
use dotenv::dotenv;
use nutrilens::prelude::*;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}

fn input_from_args(args: &[String]) -> anyhow::Result<AnalysisInput> {
    let mut image = None;
    let mut words = Vec::new();

    for (i, arg) in args.iter().enumerate() {
        let path = Path::new(arg);
        if i == 0 && path.is_file() {
            let bytes = std::fs::read(path)
                .with_context(|| format!("failed to read image {}", path.display()))?;
            image = Some(ImageInput::from_bytes(&bytes, mime_for(path)));
        } else {
            words.push(arg.as_str());
        }
    }

    let text = (!words.is_empty()).then(|| words.join(" "));
    Ok(AnalysisInput { image, text })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let input = input_from_args(&args)?;

    let config = AnalyzerConfig::from_env().context("invalid configuration")?;
    let analyzer = nutrilens::analyzer_from_config(&config)?;

    match analyzer.analyze(&input).await {
        Ok(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            println!();
            println!(
                "Saúde: {:?} ({}/100) | {}",
                record.health_rating(),
                record.health_score,
                record.processing_level
            );
            for share in record.macro_breakdown() {
                println!("  {:<12} {:>6.1} g", share.label, share.grams);
            }
            Ok(())
        }
        Err(err) if err.kind() == FailureKind::Precondition => {
            eprintln!("Envie uma foto ou descreva o alimento.");
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}
