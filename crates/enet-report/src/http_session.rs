//! Script-less page session over a [`Transport`].
//!
//! Pages are fetched with plain GET requests and queried with `scraper`.
//! Frames are entered by fetching their source, either the hint provided by
//! the caller or the frame's `src` attribute resolved against the page URL.
//! XPath locators are not supported.

use async_trait::async_trait;
use enet_core::{Element, EnetError, Locator, PageSession, Result, Transport};
use scraper::Html;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument, trace};
use url::Url;

use crate::dom::{selector, text_of};

#[derive(Debug, Clone)]
struct Page {
    url: String,
    html: String,
}

/// A [`PageSession`] that fetches pages through a [`Transport`].
///
/// Clicks and typed keys are recorded but have no effect on the page since
/// no script runs.
#[derive(Debug)]
pub struct HttpPageSession<T: Transport> {
    transport: Arc<T>,
    outer: Option<Page>,
    frames: Vec<Page>,
    clicks: Vec<Locator>,
    keys: Vec<(Locator, String)>,
}

impl<T: Transport> HttpPageSession<T> {
    /// Create a session over a shared transport.
    #[must_use]
    pub const fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            outer: None,
            frames: Vec::new(),
            clicks: Vec::new(),
            keys: Vec::new(),
        }
    }

    /// Returns every locator clicked so far.
    #[must_use]
    pub fn clicks(&self) -> &[Locator] {
        &self.clicks
    }

    /// Returns every `(locator, keys)` pair typed so far.
    #[must_use]
    pub fn typed_keys(&self) -> &[(Locator, String)] {
        &self.keys
    }

    /// Returns the frame nesting depth (0 for the outer page).
    #[must_use]
    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    fn current(&self) -> Result<&Page> {
        self.frames
            .last()
            .or(self.outer.as_ref())
            .ok_or_else(|| EnetError::Other("no page loaded".to_string()))
    }

    fn resolve(&self, src: &str) -> Result<String> {
        let base = Url::parse(&self.current()?.url)
            .map_err(|e| EnetError::Parse(format!("invalid page URL: {e}")))?;
        base.join(src)
            .map(String::from)
            .map_err(|e| EnetError::Parse(format!("invalid frame source {src}: {e}")))
    }
}

/// Runs `locator` against `html`, returning element snapshots.
fn select(html: &str, locator: &Locator) -> Result<Vec<Element>> {
    let css = locator.to_css().ok_or_else(|| {
        EnetError::NotSupported(format!("locator {locator} needs a script engine"))
    })?;
    let selector = selector(&css)?;
    let document = Html::parse_document(html);

    Ok(document
        .select(&selector)
        .map(|el| Element {
            tag: el.value().name().to_string(),
            text: text_of(el),
            attributes: el
                .value()
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        })
        .collect())
}

#[async_trait]
impl<T: Transport> PageSession for HttpPageSession<T> {
    #[instrument(skip(self))]
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let html = self.transport.get(url).await?;
        self.frames.clear();
        self.outer = Some(Page {
            url: url.to_string(),
            html,
        });
        debug!("Loaded page");
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        self.outer
            .as_ref()
            .map(|p| p.url.clone())
            .ok_or_else(|| EnetError::Other("no page loaded".to_string()))
    }

    async fn find_element(&self, locator: &Locator) -> Result<Element> {
        select(&self.current()?.html, locator)?
            .into_iter()
            .next()
            .ok_or_else(|| EnetError::ElementNotFound(locator.to_string()))
    }

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<Element>> {
        select(&self.current()?.html, locator)
    }

    async fn click(&mut self, locator: &Locator) -> Result<()> {
        self.find_element(locator).await?;
        trace!(%locator, "Click");
        self.clicks.push(locator.clone());
        Ok(())
    }

    async fn send_keys(&mut self, locator: &Locator, keys: &str) -> Result<()> {
        self.find_element(locator).await?;
        self.keys.push((locator.clone(), keys.to_string()));
        Ok(())
    }

    #[instrument(skip(self))]
    async fn switch_to_frame(&mut self, locator: &Locator, src_hint: Option<&str>) -> Result<()> {
        let frame = self.find_element(locator).await?;
        let src = match src_hint {
            Some(hint) => hint.to_string(),
            None => {
                let src = frame
                    .attribute("src")
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| {
                        EnetError::NotSupported(format!("frame {locator} has no static source"))
                    })?;
                self.resolve(src)?
            }
        };

        let html = self.transport.get(&src).await?;
        self.frames.push(Page { url: src, html });
        debug!(depth = self.frames.len(), "Entered frame");
        Ok(())
    }

    async fn switch_to_default(&mut self) -> Result<()> {
        self.frames.clear();
        Ok(())
    }

    async fn page_source(&self) -> Result<String> {
        Ok(self.current()?.html.clone())
    }

    async fn quit(&mut self) -> Result<()> {
        self.outer = None;
        self.frames.clear();
        debug!("Session closed");
        Ok(())
    }
}
