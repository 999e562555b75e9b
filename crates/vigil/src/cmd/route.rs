//! Route command - Classify paths offline

use anyhow::{Result, bail};
use clap::Args;
use vigil_config::{Config, UnmatchPolicy};
use vigil_transform::RouteClassifier;

/// Route command arguments
#[derive(Args, Debug)]
pub struct RouteArgs {
    /// Paths to classify
    #[arg(required = true)]
    pub paths: Vec<String>,

    /// Extra route templates, tried after the configured ones
    #[arg(short, long = "pattern")]
    pub patterns: Vec<String>,

    /// Unmatch policy (unset, wildcard, literal, heuristic). Overrides config.
    #[arg(short, long)]
    pub unmatch: Option<String>,
}

pub fn run(config: &Config, args: RouteArgs) -> Result<()> {
    for line in classify(config, &args)? {
        println!("{line}");
    }
    Ok(())
}

/// One `path -> route` line per path
pub fn classify(config: &Config, args: &RouteArgs) -> Result<Vec<String>> {
    let mut routes = config.routes.clone().unwrap_or_default();
    routes.patterns.extend(args.patterns.iter().cloned());
    if let Some(unmatch) = &args.unmatch {
        if UnmatchPolicy::parse(unmatch).is_none() {
            bail!("unknown unmatch policy '{unmatch}'");
        }
        routes.unmatch = Some(unmatch.clone());
    }

    let classifier = RouteClassifier::new(&routes);
    Ok(args
        .paths
        .iter()
        .map(|path| {
            let route = classifier.route_for(path);
            if route.is_empty() {
                format!("{path} -> (unset)")
            } else {
                format!("{path} -> {route}")
            }
        })
        .collect())
}
