use anyhow::Result;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use food_lens::{AnalyzerConfig, FoodAnalyzer};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger
    env_logger::init();

    let paths: Vec<PathBuf> = env::args().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        eprintln!("Usage: food-lens <image.jpg> [more images...]");
        std::process::exit(2);
    }

    let config = AnalyzerConfig::from_env()?;
    log::info!(
        "🚀 Food Lens starting ({:?}, model: {}, retries: {})",
        config.provider,
        config.model,
        config.max_retries
    );

    let analyzer = Arc::new(FoodAnalyzer::new(config));

    let mut tasks = tokio::task::JoinSet::new();
    for (index, path) in paths.into_iter().enumerate() {
        let analyzer = analyzer.clone();
        tasks.spawn(async move {
            let outcome = analyzer.analyze_image(&path).await;
            (index, path, outcome)
        });
    }

    let mut outcomes = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        outcomes.push(joined?);
    }
    outcomes.sort_by_key(|(index, _, _)| *index);

    let mut failed = false;
    for (_, path, outcome) in outcomes {
        match outcome {
            Ok(result) => {
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            Err(e) => {
                failed = true;
                log::error!("❌ {}: {}", path.display(), e);
                eprintln!("{}: {}", path.display(), e.user_message());
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}
