//! Comment counting through a Browserless `/function` endpoint.
//!
//! Every render runs in a fresh browser context on the Browserless side. A
//! session remembers the article URL and how many times the reveal control has
//! been clicked; `reveal_more` replays the page with one more click.

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{ClientError, build_http_client, ensure_success};
use crate::domain::providers::{PageSnapshot, ScrapingBackend, ScrapingSession};
use crate::error::AppError;

const RENDER_SCRIPT: &str = r#"
export default async function ({ page, context }) {
  await page.goto(context.url, { waitUntil: "networkidle2", timeout: 20000 });
  for (let i = 0; i < context.clicks; i++) {
    const more = await page.$(context.revealSelector);
    if (!more) break;
    await page.evaluate((el) => el.click(), more);
    await new Promise((resolve) => setTimeout(resolve, 400));
  }
  const more = await page.$(context.revealSelector);
  let revealAvailable = false;
  if (more) {
    revealAvailable = await page.evaluate(
      (el) => el.offsetParent !== null && getComputedStyle(el).display !== "none",
      more,
    );
  }
  return {
    data: { html: await page.content(), revealAvailable },
    type: "application/json",
  };
}
"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderResult {
    html: String,
    #[serde(default)]
    reveal_available: bool,
}

/// Counts elements matching `selector` in an HTML document.
pub fn count_reactions(html: &str, selector: &Selector) -> u32 {
    let document = Html::parse_document(html);
    let n = document.select(selector).count();
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Factory of Browserless-backed scraping sessions.
pub struct BrowserlessBackend {
    client: reqwest::Client,
    endpoint: String,
    reaction_selector: Arc<Selector>,
    reveal_selector: String,
}

impl BrowserlessBackend {
    /// # Errors
    ///
    /// Returns [`ClientError::Init`] if `reaction_selector` is not a valid CSS
    /// selector or the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        token: Option<&str>,
        reaction_selector: &str,
        reveal_selector: &str,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let selector = Selector::parse(reaction_selector)
            .map_err(|e| ClientError::Init(format!("invalid reaction selector: {e}")))?;

        let mut endpoint = format!("{}/function", base_url.trim_end_matches('/'));
        if let Some(token) = token {
            endpoint.push_str(&format!("?token={token}"));
        }

        Ok(Self {
            client: build_http_client(timeout)?,
            endpoint,
            reaction_selector: Arc::new(selector),
            reveal_selector: reveal_selector.to_string(),
        })
    }
}

#[async_trait]
impl ScrapingBackend for BrowserlessBackend {
    async fn open_session(&self) -> Result<Box<dyn ScrapingSession>, AppError> {
        Ok(Box::new(BrowserlessSession {
            client: self.client.clone(),
            endpoint: self.endpoint.clone(),
            reaction_selector: Arc::clone(&self.reaction_selector),
            reveal_selector: self.reveal_selector.clone(),
            url: None,
            clicks: 0,
        }))
    }
}

/// One probe's view of an article page.
pub struct BrowserlessSession {
    client: reqwest::Client,
    endpoint: String,
    reaction_selector: Arc<Selector>,
    reveal_selector: String,
    url: Option<String>,
    clicks: u32,
}

impl BrowserlessSession {
    async fn render(&self, url: &str, clicks: u32) -> Result<PageSnapshot, ClientError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({
                "code": RENDER_SCRIPT,
                "context": {
                    "url": url,
                    "clicks": clicks,
                    "revealSelector": self.reveal_selector,
                },
            }))
            .send()
            .await?;

        let result: RenderResult = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(format!("render result: {e}")))?;

        let snapshot = PageSnapshot {
            reaction_count: count_reactions(&result.html, &self.reaction_selector),
            reveal_available: result.reveal_available,
        };
        debug!(url, clicks, count = snapshot.reaction_count, "page rendered");
        Ok(snapshot)
    }
}

#[async_trait]
impl ScrapingSession for BrowserlessSession {
    async fn load(&mut self, url: &str) -> Result<PageSnapshot, AppError> {
        self.url = Some(url.to_string());
        self.clicks = 0;
        Ok(self.render(url, 0).await?)
    }

    async fn reveal_more(&mut self) -> Result<PageSnapshot, AppError> {
        let url = self.url.clone().ok_or_else(|| {
            AppError::internal("reveal_more called before load", json!({}))
        })?;
        self.clicks += 1;
        Ok(self.render(&url, self.clicks).await?)
    }

    async fn close(&mut self) {
        self.url = None;
        self.clicks = 0;
    }
}
