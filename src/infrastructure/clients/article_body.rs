//! Plain-HTTP article body extraction.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;
use std::time::Duration;

use super::{ClientError, build_http_client, ensure_success};
use crate::domain::providers::ArticleBodySource;
use crate::error::AppError;

/// Article containers, tried in order.
static ARTICLE_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    ["div#newsct_article", "div.article_body"]
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect()
});

/// Extracts the article text: one paragraph per non-empty line, separated by
/// blank lines. `<br>` counts as a line break. Returns `None` when no article
/// container is present.
pub fn extract_article_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let article = ARTICLE_SELECTORS
        .iter()
        .find_map(|selector| document.select(selector).next())?;

    let mut raw = String::new();
    collect_text(article, &mut raw);

    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    Some(lines.join("\n\n"))
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if el.name() == "br" => out.push('\n'),
            Node::Element(el) if matches!(el.name(), "script" | "style") => {}
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
            }
            _ => {}
        }
    }
}

/// Downloads article pages and extracts their text.
pub struct HttpArticleBodySource {
    client: reqwest::Client,
}

impl HttpArticleBodySource {
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            client: build_http_client(timeout)?,
        })
    }

    pub async fn fetch_article(&self, url: &str) -> Result<String, ClientError> {
        let html = ensure_success(self.client.get(url).send().await?)
            .await?
            .text()
            .await?;

        extract_article_text(&html)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ClientError::InvalidResponse("article body not found".into()))
    }
}

#[async_trait]
impl ArticleBodySource for HttpArticleBodySource {
    async fn fetch_body(&self, url: &str) -> Result<String, AppError> {
        Ok(self.fetch_article(url).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ARTICLE: &str = r#"<html><body>
        <div id="newsct_article">
            첫 문단입니다.<br>두 번째 줄<br><br>
            <p>  세 번째 문단  </p>
            <script>var x = 1;</script>
        </div>
    </body></html>"#;

    #[test]
    fn test_extract_joins_lines_with_blank_lines() {
        let text = extract_article_text(ARTICLE).unwrap();
        assert_eq!(text, "첫 문단입니다.\n\n두 번째 줄\n\n세 번째 문단");
    }

    #[test]
    fn test_extract_falls_back_to_article_body_class() {
        let html = r#"<div class="article_body">Body text</div>"#;
        assert_eq!(extract_article_text(html).unwrap(), "Body text");
    }

    #[test]
    fn test_extract_none_without_container() {
        assert!(extract_article_text("<div class=\"other\">x</div>").is_none());
    }

    #[tokio::test]
    async fn test_fetch_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/article/001/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ARTICLE))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/article/001/2"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let source = HttpArticleBodySource::new(Duration::from_secs(5)).unwrap();

        let body = source
            .fetch_body(&format!("{}/article/001/1", server.uri()))
            .await
            .unwrap();
        assert!(body.starts_with("첫 문단입니다."));

        let err = source
            .fetch_body(&format!("{}/article/001/2", server.uri()))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "transient_fetch");
    }
}
