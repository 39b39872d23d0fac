//! Search client for the ENET filing index.

use enet_core::{
    CategoryOption, ENET_URL, EnetError, FilingRecord, FilingStatus, FilterSpec, IssuerCache,
    IssuerCode, IssuerDirectory, Result, RetryPolicy, Transport, text,
};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, instrument, trace, warn};

use crate::codec::{self, RawRow};
use crate::directory::{self, CONSULTATION_PAGE};
use crate::links;

/// Search endpoint path under the ENET base URL.
pub const SEARCH_PATH: &str = "frmConsultaExternaCVM.aspx/ListarDocumentos";

const SEARCH_HEADERS: &[(&str, &str)] = &[
    ("Content-Type", "application/json; charset=UTF-8"),
    ("Accept", "application/json, text/javascript, */*; q=0.01"),
    ("X-Requested-With", "XMLHttpRequest"),
];

/// Client for the ENET filing search.
///
/// A search is a single round trip: the filter is encoded, posted, decoded
/// and normalized into [`FilingRecord`]s. Only active filings are returned,
/// most recently delivered first.
pub struct SearchClient<T: Transport> {
    transport: Arc<T>,
    policy: RetryPolicy,
    issuer_cache: Option<Arc<dyn IssuerCache>>,
    check_issuer: bool,
}

impl<T: Transport> Clone for SearchClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            policy: self.policy,
            issuer_cache: self.issuer_cache.clone(),
            check_issuer: self.check_issuer,
        }
    }
}

impl<T: Transport> std::fmt::Debug for SearchClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchClient")
            .field("transport", &self.transport)
            .field("policy", &self.policy)
            .field("issuer_cache", &self.issuer_cache.is_some())
            .field("check_issuer", &self.check_issuer)
            .finish()
    }
}

impl<T: Transport> SearchClient<T> {
    /// Create a client over a shared transport with the default retry policy.
    #[must_use]
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            policy: RetryPolicy::default(),
            issuer_cache: None,
            check_issuer: false,
        }
    }

    /// Set the retry policy applied to transport failures.
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Cache the issuer directory through `cache`.
    #[must_use]
    pub fn with_issuer_cache(mut self, cache: Arc<dyn IssuerCache>) -> Self {
        self.issuer_cache = Some(cache);
        self
    }

    /// Reject searches for issuers missing from the issuer directory.
    #[must_use]
    pub const fn with_issuer_check(mut self, enabled: bool) -> Self {
        self.check_issuer = enabled;
        self
    }

    /// Returns the shared transport.
    #[must_use]
    pub const fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Search filings matching `spec`.
    ///
    /// Returns an empty vector when nothing matches.
    #[instrument(skip(self), fields(issuer = ?spec.issuer))]
    pub async fn search(&self, spec: &FilterSpec) -> Result<Vec<FilingRecord>> {
        let body = codec::encode(spec)?;

        if self.check_issuer
            && let Some(code) = spec.issuer
        {
            let directory = self.issuers().await?;
            if !directory.contains(code) {
                return Err(EnetError::Validation(format!("unknown issuer code {code}")));
            }
        }

        let url = format!("{ENET_URL}{SEARCH_PATH}");
        let url = url.as_str();
        let transport = &self.transport;

        debug!("Posting filing search");
        let raw = self
            .policy
            .retry("filing search", move |attempt| {
                let body = body.to_string();
                async move {
                    trace!(attempt, "Search attempt");
                    transport.post(url, body, SEARCH_HEADERS).await
                }
            })
            .await?;

        let rows = codec::decode(&raw)?;
        let total = rows.len();

        let mut records = rows
            .into_iter()
            .filter_map(to_record)
            .filter(|record| record.status.is_active())
            .collect::<Vec<_>>();

        records.sort_by(newest_first);

        debug!(total, active = records.len(), "Decoded search results");
        Ok(records)
    }

    /// Fetch the issuer directory, consulting the cache first.
    #[instrument(skip(self))]
    pub async fn issuers(&self) -> Result<IssuerDirectory> {
        if let Some(cache) = &self.issuer_cache
            && let Some(directory) = cache.get_directory().await?
        {
            return Ok(directory);
        }

        let html = self.consultation_page().await?;
        let directory = directory::parse_issuers(&html)?;

        if let Some(cache) = &self.issuer_cache
            && let Err(e) = cache.put_directory(&directory).await
        {
            warn!(error = %e, "Failed to cache issuer directory");
        }
        Ok(directory)
    }

    /// Fetch the categories offered by the portal's category selector.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<CategoryOption>> {
        let html = self.consultation_page().await?;
        directory::parse_categories(&html)
    }

    async fn consultation_page(&self) -> Result<String> {
        let url = format!("{ENET_URL}{CONSULTATION_PAGE}");
        let url = url.as_str();
        let transport = &self.transport;
        self.policy
            .retry("consultation page", move |_| async move {
                transport.get(url).await
            })
            .await
    }
}

/// Normalizes a raw row. Rows without an issuer code are dropped.
fn to_record(row: RawRow) -> Option<FilingRecord> {
    let Some(issuer_code) = IssuerCode::parse(&row.issuer_code) else {
        trace!(raw = %row.issuer_code, "Dropping row without issuer code");
        return None;
    };

    let reference_date = text::find_date(&row.reference_date);
    if reference_date.is_none() {
        warn!(issuer = %issuer_code, raw = %row.reference_date, "Unparsable reference date");
    }
    let delivered_at = text::find_datetime(&row.delivered_at);
    if delivered_at.is_none() {
        warn!(issuer = %issuer_code, raw = %row.delivered_at, "Unparsable delivery timestamp");
    }

    let actions = row.actions.as_deref().unwrap_or_default();
    let view = links::extract_view(actions);
    let download = links::extract_download(actions);

    Some(FilingRecord {
        issuer_code,
        issuer_name: text::squash_whitespace(&row.issuer_name),
        category: row.category,
        document_type: row.document_type,
        species: row.species,
        reference_date,
        delivered_at,
        status: FilingStatus::from_label(&row.status),
        version: text::digits_only(&row.version).parse().ok(),
        modality: row.modality,
        view_url: view.as_ref().map(|v| v.url.clone()),
        document_id: view.as_ref().and_then(|v| v.document_id.clone()),
        institution_code: view.and_then(|v| v.institution_code),
        download,
    })
}

/// Delivery timestamp descending, undated records last.
fn newest_first(a: &FilingRecord, b: &FilingRecord) -> Ordering {
    match (a.delivered_at, b.delivered_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
