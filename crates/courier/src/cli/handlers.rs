//! Command handlers.

use super::{Cli, Commands};
use courier::{
    CommentsQuery, CourierClient, CourierConfig, CourierResult, JsonError, ListingQuery,
    SearchQuery,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Run the parsed command, printing its result as pretty JSON on stdout.
///
/// Ctrl-C cancels every in-flight request.
pub async fn run_command(cli: &Cli) -> CourierResult<()> {
    let config = match &cli.config {
        Some(path) => CourierConfig::from_file(path)?,
        None => CourierConfig::load()?,
    };

    let token = CancellationToken::new();
    let interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling requests");
            interrupt.cancel();
        }
    });
    let client = CourierClient::new(&config)?.with_cancellation(token);

    match &cli.command {
        Commands::Listing {
            category,
            sort,
            time,
            limit,
            after,
            refresh,
        } => {
            let mut query = ListingQuery::new(category.clone().unwrap_or_default())
                .with_sort(*sort)
                .with_refresh(*refresh);
            if let Some(time) = time {
                query = query.with_time(*time);
            }
            if let Some(limit) = limit {
                query = query.with_limit(*limit);
            }
            if let Some(after) = after {
                query = query.with_after(after);
            }
            print_json(&client.listing(&query).await?)
        }

        Commands::Comments {
            permalink,
            limit,
            refresh,
        } => {
            let mut query = CommentsQuery::new(permalink).with_refresh(*refresh);
            if let Some(limit) = limit {
                query = query.with_limit(*limit);
            }
            print_json(&client.comments(&query).await?)
        }

        Commands::Search {
            query,
            scope,
            sort,
            time,
            limit,
            after,
            refresh,
        } => {
            let mut search = SearchQuery::new(query).with_sort(*sort).with_refresh(*refresh);
            if let Some(scope) = scope {
                search = search.within(scope);
            }
            if let Some(time) = time {
                search = search.with_time(*time);
            }
            if let Some(limit) = limit {
                search = search.with_limit(*limit);
            }
            if let Some(after) = after {
                search = search.with_after(after);
            }
            print_json(&client.search(&search).await?)
        }

        Commands::About { name, refresh } => print_json(&client.about(name, *refresh).await?),

        Commands::Expand { permalink } => {
            let mut thread = client.comments(&CommentsQuery::new(permalink)).await?;
            let placeholders: Vec<_> = thread.more_placeholders().into_iter().cloned().collect();
            info!(placeholders = placeholders.len(), "Expanding truncated branches");
            for more in placeholders.iter().filter(|more| !more.children().is_empty()) {
                client.expand(&mut thread, more).await?;
            }
            print_json(&thread)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> CourierResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| JsonError::new(format!("Failed to encode output: {}", e)))?;
    println!("{}", text);
    Ok(())
}
