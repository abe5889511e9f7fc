//! Ask command - resolves a single prompt and prints the response

use clap::Args;

use crate::domain::semantic_cache::{Resolution, ResolutionSource};

#[derive(Args, Clone, Debug)]
pub struct AskArgs {
    /// Prompt to resolve
    pub prompt: String,

    /// Print the full resolution as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: AskArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let state = crate::create_app_state_with_config(&config).await?;

    let resolution = state
        .coordinator
        .resolve_text(&args.prompt, state.generator.clone())
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
    } else {
        println!("{}", resolution.response);
        eprintln!("[{}]", describe(&resolution));
    }

    Ok(())
}

fn describe(resolution: &Resolution) -> String {
    match &resolution.source {
        ResolutionSource::ExactHit => format!("exact hit, {} hits", resolution.hit_count),
        ResolutionSource::FuzzyHit { similarity, .. } => {
            format!("fuzzy hit, similarity {:.3}", similarity)
        }
        ResolutionSource::Generated { persisted } => format!(
            "generated by {}{}",
            resolution.model_id.as_deref().unwrap_or("backend"),
            if *persisted { ", cached" } else { ", not cached" }
        ),
    }
}
