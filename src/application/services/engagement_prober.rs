//! Engagement measurement for candidates that survived the filter chain.

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, warn};

use crate::domain::providers::{ScrapingBackend, ScrapingSession};
use crate::error::AppError;

/// Counts reaction elements on an article page.
///
/// Every call opens its own scraping session and closes it before returning,
/// so concurrent probes never share navigation state.
pub struct EngagementProber {
    backend: Arc<dyn ScrapingBackend>,
    max_expand_attempts: u32,
}

impl EngagementProber {
    pub fn new(backend: Arc<dyn ScrapingBackend>, max_expand_attempts: u32) -> Self {
        Self {
            backend,
            max_expand_attempts,
        }
    }

    /// Returns the engagement count of `url`, or 0 if it could not be measured.
    pub async fn probe(&self, url: &str) -> u32 {
        let mut session = match self.backend.open_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!(url, error = %e, "could not open scraping session");
                counter!("engagement_probes_total", "result" => "failed").increment(1);
                return 0;
            }
        };

        let result = expand_and_count(session.as_mut(), url, self.max_expand_attempts).await;
        session.close().await;

        match result {
            Ok(count) => {
                debug!(url, count, "engagement measured");
                counter!("engagement_probes_total", "result" => "ok").increment(1);
                count
            }
            Err(e) => {
                warn!(url, error = %e, "engagement probe failed");
                counter!("engagement_probes_total", "result" => "failed").increment(1);
                0
            }
        }
    }
}

/// Loads `url` and activates the reveal control until it disappears, stops
/// producing new elements, fails, or `max_attempts` activations have been made.
///
/// Only a failed load is an error. A failed activation keeps the count
/// measured so far.
async fn expand_and_count(
    session: &mut dyn ScrapingSession,
    url: &str,
    max_attempts: u32,
) -> Result<u32, AppError> {
    let mut snapshot = session.load(url).await?;
    let mut best = snapshot.reaction_count;
    let mut attempts = 0;

    while snapshot.reveal_available && attempts < max_attempts {
        attempts += 1;
        snapshot = match session.reveal_more().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!(url, attempts, error = %e, "reveal failed, keeping current count");
                break;
            }
        };
        if snapshot.reaction_count <= best {
            break;
        }
        best = snapshot.reaction_count;
    }

    debug!(url, attempts, "expansion finished");
    Ok(best)
}
