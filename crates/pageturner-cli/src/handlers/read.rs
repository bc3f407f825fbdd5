//! `pageturner read`: the reading session.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use pageturner_core::{ReadOutcome, ReaderEvent};
use pageturner_reader::{ChannelObserver, ReadingLoop};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::bootstrap;
use crate::commands::ReadArgs;
use crate::error::CliError;
use crate::presentation::describe_event;

/// Execute the read command.
///
/// Runs until the text stops changing, Ctrl+C, or a fatal error. Progress is
/// printed from the reader's event stream.
pub async fn execute(settings_file: Option<&Path>, args: &ReadArgs) -> Result<ReadOutcome> {
    let settings = bootstrap::load_settings(settings_file, &args.settings_update())?;
    let screen = bootstrap::build_screen(&args.screen)?;
    let (target, label) = bootstrap::resolve_target(&args.target).await?;
    let speech = bootstrap::build_speech(&args.speech, &settings)?;

    let (observer, events) = ChannelObserver::new();
    let ctx = bootstrap::build_context(target, &screen, speech, Arc::new(observer));

    let stop = CancellationToken::new();
    let interrupt = tokio::spawn(cancel_on_ctrl_c(stop.clone()));
    let printer = tokio::spawn(print_events(events));

    println!("Reading {label} (Ctrl+C to stop)");
    let mut reader = ReadingLoop::new(ctx, settings);
    let result = reader.run(stop).await;

    // Dropping the loop drops the observer, which ends the printer.
    drop(reader);
    interrupt.abort();
    if let Err(e) = printer.await {
        tracing::warn!(error = %e, "Event printer failed");
    }

    let outcome = result.map_err(CliError::from)?;
    match outcome {
        ReadOutcome::Finished { pages_read } => {
            println!("Finished after {pages_read} page(s).");
        }
        ReadOutcome::Stopped { pages_read } => {
            println!("Stopped after {pages_read} page(s).");
        }
    }
    Ok(outcome)
}

async fn cancel_on_ctrl_c(stop: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Interrupt received, stopping");
            stop.cancel();
        }
        Err(e) => tracing::warn!(error = %e, "Cannot listen for Ctrl+C"),
    }
}

async fn print_events(mut events: mpsc::UnboundedReceiver<ReaderEvent>) {
    let mut page = 0;
    while let Some(event) = events.recv().await {
        match &event {
            ReaderEvent::StateChanged { from, to } => {
                tracing::debug!(%from, %to, "Reader state");
            }
            ReaderEvent::PageChanged { .. } => page += 1,
            ReaderEvent::Status { .. } | ReaderEvent::DurationEstimated { .. } => {}
        }
        if let Some(line) = describe_event(&event, page) {
            println!("{line}");
        }
    }
}
