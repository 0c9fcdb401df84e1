use std::sync::Arc;

use anyhow::Context;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::debug;
use vxcam_core::api::ApiClient;
use vxcam_core::{SubmissionEvent, SubmissionOrchestrator};
use vxcam_model::Clip;

use crate::cli::SubmitArgs;
use crate::config::Config;

pub async fn run(config: &Config, args: &SubmitArgs) -> anyhow::Result<()> {
    let clip = Clip::from_path(&args.file)
        .with_context(|| format!("cannot open clip {}", args.file.display()))?;
    let api = ApiClient::new(config.api.clone())
        .context("failed to create API client")?;
    let orchestrator = SubmissionOrchestrator::from_api(Arc::new(api));
    let style = config.default_style;

    if !args.json {
        println!(
            "submitting {} ({}) as {style} to {}",
            clip.name, clip.content_type, config.api.base_url
        );
    }

    let printer = tokio::spawn(print_events(orchestrator.events(), args.json));
    let outcome = orchestrator.submit(&clip, style).await;

    // Closing the channel lets the printer drain and exit.
    drop(orchestrator);
    printer.await.context("event printer stopped unexpectedly")?;

    let job = match outcome {
        Ok(job) => job,
        Err(err) => {
            return Err(anyhow::Error::new(err).context("submission failed"));
        }
    };

    if args.json {
        println!("{}", serde_json::to_string(&job)?);
    } else if let Some(result) = &job.result {
        println!("primary:  {}", result.primary_asset_url);
        println!("vertical: {}", result.vertical_asset_url);
    }
    Ok(())
}

async fn print_events(
    mut events: broadcast::Receiver<SubmissionEvent>,
    json: bool,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if json {
                    match serde_json::to_string(&event) {
                        Ok(line) => println!("{line}"),
                        Err(err) => debug!(error = %err, "unserializable event"),
                    }
                } else if let Some(line) = describe(&event) {
                    println!("{line}");
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                debug!(skipped, "event printer lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn describe(event: &SubmissionEvent) -> Option<String> {
    match event {
        SubmissionEvent::StatusChanged { status, .. } => {
            Some(format!("[{status}]"))
        }
        SubmissionEvent::Progress { percent, .. } => {
            Some(format!("  upload {percent:>3}%"))
        }
        SubmissionEvent::Failed { message, .. } => {
            Some(format!("  error: {message}"))
        }
        SubmissionEvent::Completed { .. } => None,
    }
}
