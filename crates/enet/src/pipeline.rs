//! Filing pipeline: search, navigate, extract and aggregate.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info_span, instrument, warn};

use enet_core::{
    EnetError, FilingRecord, FilterSpec, PageSession, Result, Statement, StatementName, Transport,
};
use enet_report::{HttpPageSession, NavigationContext, ReportNavigator, StatementExtractor};
use enet_search::{HttpTransport, SearchClient};

/// Default number of times discovery is restarted after a navigation timeout.
pub const DEFAULT_DISCOVERY_ATTEMPTS: usize = 3;

/// Pipeline settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// How many times to run discovery for one filing when the report page
    /// does not render in time.
    pub discovery_attempts: usize,
    /// Statement names to extract, or `None` for every listed statement.
    pub statements: Option<Vec<String>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            discovery_attempts: DEFAULT_DISCOVERY_ATTEMPTS,
            statements: None,
        }
    }
}

impl PipelineConfig {
    /// Set the discovery attempts.
    #[must_use]
    pub const fn with_discovery_attempts(mut self, attempts: usize) -> Self {
        self.discovery_attempts = attempts;
        self
    }

    /// Restrict extraction to the given statement names.
    #[must_use]
    pub fn with_statements<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.statements = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Returns true if `name` should be extracted.
    #[must_use]
    pub fn wants(&self, name: &StatementName) -> bool {
        self.statements
            .as_ref()
            .is_none_or(|wanted| wanted.iter().any(|w| w.trim() == name.as_str()))
    }
}

/// A statement that was not stored because its slot was already taken.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DuplicateStatement {
    /// Reference date of the slot.
    pub reference_date: NaiveDate,
    /// Statement name of the slot.
    pub name: StatementName,
    /// Filing the rejected statement came from.
    pub document: String,
    /// Version of the rejected statement.
    pub version: Option<u32>,
    /// Filing whose statement holds the slot.
    pub kept_document: String,
}

#[derive(Clone, Debug, PartialEq)]
struct Stored {
    document: String,
    statement: Statement,
}

/// Statements keyed by reference date, then statement name.
///
/// Append-only: the first statement stored for a slot wins and later ones
/// are recorded as duplicates. Feed filings newest first so the latest
/// version of a filing is the one kept.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilingResults {
    by_date: BTreeMap<NaiveDate, BTreeMap<StatementName, Stored>>,
    duplicates: Vec<DuplicateStatement>,
}

impl FilingResults {
    /// Create empty results.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a statement extracted from `document`. Returns false if its slot
    /// was already taken.
    pub fn insert(&mut self, document: impl Into<String>, statement: Statement) -> bool {
        let document = document.into();
        let slot = self.by_date.entry(statement.reference_date).or_default();
        if let Some(kept) = slot.get(&statement.name) {
            warn!(
                date = %statement.reference_date,
                statement = %statement.name,
                %document,
                kept = %kept.document,
                "Duplicate statement ignored"
            );
            self.duplicates.push(DuplicateStatement {
                reference_date: statement.reference_date,
                name: statement.name,
                document,
                version: statement.version,
                kept_document: kept.document.clone(),
            });
            return false;
        }
        slot.insert(
            statement.name.clone(),
            Stored {
                document,
                statement,
            },
        );
        true
    }

    /// Merge another result set into this one, keeping existing slots.
    pub fn merge(&mut self, other: Self) {
        for stored in other
            .by_date
            .into_values()
            .flat_map(BTreeMap::into_values)
        {
            self.insert(stored.document, stored.statement);
        }
        self.duplicates.extend(other.duplicates);
    }

    /// Returns a stored statement.
    #[must_use]
    pub fn get(&self, reference_date: NaiveDate, name: &StatementName) -> Option<&Statement> {
        self.stored(reference_date, name).map(|s| &s.statement)
    }

    /// Returns the filing a stored statement was extracted from.
    #[must_use]
    pub fn document_of(&self, reference_date: NaiveDate, name: &StatementName) -> Option<&str> {
        self.stored(reference_date, name).map(|s| s.document.as_str())
    }

    /// Returns every statement stored for a reference date, by name.
    pub fn on(&self, reference_date: NaiveDate) -> impl Iterator<Item = &Statement> {
        self.by_date
            .get(&reference_date)
            .into_iter()
            .flat_map(|slot| slot.values().map(|s| &s.statement))
    }

    /// Returns the reference dates in ascending order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.by_date.keys().copied()
    }

    /// Iterates over every stored statement, by date then name.
    pub fn iter(&self) -> impl Iterator<Item = &Statement> {
        self.by_date
            .values()
            .flat_map(|slot| slot.values().map(|s| &s.statement))
    }

    /// Returns the statements that were not stored.
    #[must_use]
    pub fn duplicates(&self) -> &[DuplicateStatement] {
        &self.duplicates
    }

    /// Returns the number of stored statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_date.values().map(BTreeMap::len).sum()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn stored(&self, reference_date: NaiveDate, name: &StatementName) -> Option<&Stored> {
        self.by_date.get(&reference_date)?.get(name)
    }
}

/// A filing or statement that could not be processed.
#[derive(Debug)]
pub struct FilingFailure {
    /// Filing identifier.
    pub document: String,
    /// The failing statement, or `None` when the whole filing failed.
    pub statement: Option<StatementName>,
    /// What went wrong.
    pub error: EnetError,
}

/// Outcome of a pipeline run.
#[derive(Debug, Default)]
pub struct PipelineReport {
    /// Extracted statements.
    pub results: FilingResults,
    /// Filings and statements that failed.
    pub failures: Vec<FilingFailure>,
}

impl PipelineReport {
    /// Merge another report into this one.
    pub fn merge(&mut self, other: Self) {
        self.results.merge(other.results);
        self.failures.extend(other.failures);
    }
}

/// Runs filings through search, report navigation and extraction.
///
/// Filings are processed one at a time in search order, and the statements
/// of a filing in page order. Failures are collected, never propagated past
/// the filing or statement that caused them.
#[derive(Debug)]
pub struct FilingPipeline<T: Transport, S: PageSession> {
    search: SearchClient<T>,
    navigator: ReportNavigator<S>,
    extractor: StatementExtractor,
    config: PipelineConfig,
}

impl FilingPipeline<HttpTransport, HttpPageSession<HttpTransport>> {
    /// Create a pipeline talking to the live portal, with the search client
    /// and the page session sharing one cookie-aware transport.
    pub fn http(user_agent: &str) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(user_agent)?);
        Ok(Self::new(
            SearchClient::new(Arc::clone(&transport)),
            ReportNavigator::new(HttpPageSession::new(transport)),
        ))
    }
}

impl<T: Transport, S: PageSession> FilingPipeline<T, S> {
    /// Create a pipeline with the default configuration.
    #[must_use]
    pub fn new(search: SearchClient<T>, navigator: ReportNavigator<S>) -> Self {
        Self {
            search,
            navigator,
            extractor: StatementExtractor::new(),
            config: PipelineConfig::default(),
        }
    }

    /// Set the pipeline configuration.
    #[must_use]
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns the search client.
    #[must_use]
    pub const fn search_client(&self) -> &SearchClient<T> {
        &self.search
    }

    /// Returns the report navigator.
    #[must_use]
    pub const fn navigator(&self) -> &ReportNavigator<S> {
        &self.navigator
    }

    /// Search filings and process every result.
    ///
    /// Search errors propagate; per-filing errors end up in the report.
    #[instrument(skip(self))]
    pub async fn run(&mut self, spec: &FilterSpec) -> Result<PipelineReport> {
        let records = self.search.search(spec).await?;
        debug!(filings = records.len(), "Search complete");
        Ok(self.process(records).await)
    }

    /// Process already discovered filings in order.
    pub async fn process(&mut self, records: Vec<FilingRecord>) -> PipelineReport {
        let mut report = PipelineReport::default();

        for record in records {
            if !record.status.is_active() {
                debug!(document = %record.label(), "Skipping inactive filing");
                continue;
            }

            let span = info_span!("filing", document = %record.label());
            let outcome = self
                .process_filing(&record, &mut report)
                .instrument(span)
                .await;

            if let Err(error) = outcome {
                warn!(document = %record.label(), %error, "Filing failed");
                report.failures.push(FilingFailure {
                    document: record.label(),
                    statement: None,
                    error,
                });
            }
        }

        debug!(
            statements = report.results.len(),
            failures = report.failures.len(),
            "Processing complete"
        );
        report
    }

    /// Release the page session.
    pub async fn shutdown(mut self) -> Result<()> {
        self.navigator.quit().await
    }

    async fn process_filing(
        &mut self,
        record: &FilingRecord,
        report: &mut PipelineReport,
    ) -> Result<()> {
        record.require_view()?;
        let ctx = self.discover(record).await?;

        let reference_date = ctx
            .reference_date
            .or(record.reference_date)
            .ok_or_else(|| EnetError::Parse(format!("{} has no reference date", record.label())))?;
        let version = ctx.version.or(record.version);

        let names = ctx
            .statement_names()
            .filter(|name| self.config.wants(name))
            .cloned()
            .collect::<Vec<_>>();

        for name in names {
            match self.extract(&ctx, &name, reference_date, version).await {
                Ok(statement) => {
                    report.results.insert(record.label(), statement);
                }
                Err(error) => {
                    warn!(statement = %name, %error, "Statement failed");
                    report.failures.push(FilingFailure {
                        document: record.label(),
                        statement: Some(name),
                        error,
                    });
                }
            }
        }
        Ok(())
    }

    /// Runs discovery from scratch until the page renders or the attempts
    /// run out.
    async fn discover(&mut self, record: &FilingRecord) -> Result<NavigationContext> {
        let attempts = self.config.discovery_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.navigator.discover(record).await {
                Err(e @ EnetError::NavigationTimeout { .. }) if attempt < attempts => {
                    warn!(attempt, error = %e, "Report page not ready, retrying discovery");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn extract(
        &mut self,
        ctx: &NavigationContext,
        name: &StatementName,
        reference_date: NaiveDate,
        version: Option<u32>,
    ) -> Result<Statement> {
        let html = self.navigator.fetch_statement(ctx, name).await?;
        self.extractor.extract(name, &html, reference_date, version)
    }
}

/// Splits filings into contiguous shards, one per pipeline, and runs them
/// concurrently.
///
/// Shards keep the search order and reports are merged in shard order, so
/// the same statement wins a slot as in a sequential [`FilingPipeline::process`].
pub async fn run_sharded<T: Transport, S: PageSession>(
    pipelines: &mut [FilingPipeline<T, S>],
    records: Vec<FilingRecord>,
) -> Result<PipelineReport> {
    if pipelines.is_empty() {
        return Err(EnetError::Other("no pipelines to run".to_string()));
    }

    let shard_size = records.len().div_ceil(pipelines.len()).max(1);
    let mut shards = vec![Vec::new(); pipelines.len()];
    for (i, record) in records.into_iter().enumerate() {
        shards[i / shard_size].push(record);
    }

    let reports = join_all(
        pipelines
            .iter_mut()
            .zip(shards)
            .map(|(pipeline, shard)| pipeline.process(shard)),
    )
    .await;

    let mut merged = PipelineReport::default();
    for report in reports {
        merged.merge(report);
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use enet_core::statement::{EQUITY_CHANGES, VALUE_COLUMN};
    use enet_core::transport::Method;
    use enet_core::{
        ENET_URL, ENETCONSULTA_URL, FilingStatus, IssuerCode, ReplayTransport, RetryPolicy,
    };
    use enet_search::client::SEARCH_PATH;

    const BALANCE: &str = "Balanço Patrimonial Ativo";

    fn view_path(doc: u32) -> String {
        format!(
            "frmGerenciaPaginaFRE.aspx?NumeroSequencialDocumento={doc}&CodigoTipoInstituicao=1"
        )
    }

    fn report_page(doc: u32, date: &str) -> String {
        versioned_report_page(doc, date, 1)
    }

    fn versioned_report_page(doc: u32, date: &str, version: u32) -> String {
        format!(
            r#"<html><body>
            <span id="lblDataDocumento">{date}</span>
            <span id="lblDescricaoCategoria">DFP - Demonstrações Financeiras Padronizadas - V{version}</span>
            <input type="hidden" id="hdnNumeroSequencialDocumento" value="{doc}" />
            <input type="hidden" id="hdnCodigoTipoDocumento" value="4" />
            <input type="hidden" id="hdnCodigoInstituicao" value="1" />
            <input type="hidden" id="hdnHash" value="H{doc}" />
            <select name="cmbQuadro">
              <option value="frmDemonstracaoFinanceiraITR.aspx?Informacao=2&amp;Demonstracao=2&amp;Periodo=0">{BALANCE}</option>
              <option value="frmDemonstracaoFinanceiraITR.aspx?Informacao=2&amp;Demonstracao=8&amp;Periodo=0">{EQUITY_CHANGES}</option>
            </select>
            <iframe id="iFrameFormulariosFilho"></iframe>
            <script>var p = 'x.aspx?NumeroSequencialRegistroCvm=77&a=1';</script>
            </body></html>"#
        )
    }

    const BALANCE_PAGE: &str = r#"<html><body>
        <div id="TituloTabelaSemBorda">Balanço Patrimonial Ativo - (Reais Mil)</div>
        <table>
          <tr><td>Conta</td><td>Descrição</td><td>Atual</td><td>Anterior</td></tr>
          <tr><td>1</td><td>Ativo Total</td><td>1.000</td><td>900</td></tr>
        </table>
    </body></html>"#;

    const EQUITY_PAGE: &str = r#"<html><body>
        <div id="TituloTabelaSemBorda">DMPL - (Reais Mil)</div>
        <table><tr><td>Legenda</td></tr></table>
        <table>
          <tr><td>Conta</td><td>Descrição</td><td>Capital</td><td>Reservas</td><td>Total</td></tr>
          <tr><td>5.01</td><td>Saldos Iniciais</td><td>100</td><td>20</td><td>120</td></tr>
        </table>
    </body></html>"#;

    fn statement_prefix(demonstration: u32) -> String {
        format!(
            "{ENETCONSULTA_URL}frmDemonstracaoFinanceiraITR.aspx?\
             Informacao=2&Demonstracao={demonstration}&"
        )
    }

    fn search_row(doc: u32, delivered: &str, status: &str, with_view: bool) -> String {
        let actions = if with_view {
            format!("<i onclick=\"OpenPopUpVer('{}')\"></i>", view_path(doc))
        } else {
            String::new()
        };
        format!(
            "009512$&PETROBRAS$&DFP$&Demonstrações Financeiras Padronizadas$&$&\
             31/12/2020$&{delivered}$&{status}$&1$&AP$&{actions}"
        )
    }

    fn transport() -> ReplayTransport {
        let rows = [
            search_row(1001, "10/03/2021 09:00", "Ativo", true),
            search_row(1002, "15/03/2020 09:00", "Ativo", true),
            search_row(1003, "01/03/2021 09:00", "Cancelado", true),
            search_row(1004, "01/01/2020 09:00", "Ativo", false),
        ];
        let search = serde_json::json!({ "d": { "dados": rows.join("$&&*") } }).to_string();

        ReplayTransport::new()
            .route(format!("{ENET_URL}{SEARCH_PATH}"), search)
            .route(format!("{ENET_URL}{}", view_path(1001)), report_page(1001, "31/12/2020"))
            .route(format!("{ENET_URL}{}", view_path(1002)), report_page(1002, "31/12/2019"))
            .route(statement_prefix(2), BALANCE_PAGE)
            .route(statement_prefix(8), EQUITY_PAGE)
    }

    fn pipeline(
        transport: Arc<ReplayTransport>,
    ) -> FilingPipeline<ReplayTransport, HttpPageSession<ReplayTransport>> {
        let policy = RetryPolicy::immediate(2);
        FilingPipeline::new(
            SearchClient::new(Arc::clone(&transport)).with_retry_policy(policy),
            ReportNavigator::new(HttpPageSession::new(transport)).with_retry_policy(policy),
        )
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(doc: u32) -> FilingRecord {
        FilingRecord {
            issuer_code: IssuerCode::from(9512),
            issuer_name: "PETROBRAS".into(),
            category: "DFP".into(),
            document_type: String::new(),
            species: String::new(),
            reference_date: Some(date(2020, 12, 31)),
            delivered_at: None,
            status: FilingStatus::Active,
            version: Some(1),
            modality: "AP".into(),
            view_url: Some(format!("{ENET_URL}{}", view_path(doc))),
            document_id: Some(doc.to_string()),
            institution_code: Some("1".into()),
            download: None,
        }
    }

    #[tokio::test]
    async fn test_run_end_to_end() {
        let mut pipeline = pipeline(Arc::new(transport()));
        let report = pipeline
            .run(&FilterSpec::new().with_issuer(9512).with_category("DFP"))
            .await
            .unwrap();

        // Two active filings with two statements each
        assert_eq!(report.results.len(), 4);
        assert_eq!(
            report.results.dates().collect::<Vec<_>>(),
            vec![date(2019, 12, 31), date(2020, 12, 31)]
        );

        let balance = report
            .results
            .get(date(2019, 12, 31), &StatementName::new(BALANCE))
            .unwrap();
        assert_eq!(balance.currency_unit, "Reais Mil");
        assert_eq!(balance.version, Some(1));
        assert_eq!(balance.value_of("1"), Some(1000.0));

        let equity = report
            .results
            .get(date(2020, 12, 31), &StatementName::new(EQUITY_CHANGES))
            .unwrap();
        assert_eq!(equity.columns.len(), 5);

        // The active row without a view link is reported, not fatal
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            report.failures[0].error,
            EnetError::PartialRecord { missing: "view", .. }
        ));

        let df = balance.to_dataframe().unwrap();
        assert_eq!(df.height(), 1);
        assert!(df.column(VALUE_COLUMN).is_ok());

        pipeline.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_statement_failure_does_not_stop_siblings() {
        let transport = ReplayTransport::new()
            .route(format!("{ENET_URL}{}", view_path(1001)), report_page(1001, "31/12/2020"))
            .route(statement_prefix(2), BALANCE_PAGE);
        let mut pipeline = pipeline(Arc::new(transport));

        let report = pipeline.process(vec![record(1001)]).await;

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(
            report.failures[0].statement,
            Some(StatementName::new(EQUITY_CHANGES))
        );
    }

    #[tokio::test]
    async fn test_duplicates_are_flagged() {
        let mut pipeline = pipeline(Arc::new(transport()));
        let report = pipeline.process(vec![record(1001), record(1001)]).await;

        assert_eq!(report.results.len(), 2);
        assert_eq!(report.results.duplicates().len(), 2);
        assert!(report.failures.is_empty());

        let duplicate = &report.results.duplicates()[0];
        assert_eq!(duplicate.document, "1001");
        assert_eq!(duplicate.kept_document, "1001");
        assert_eq!(duplicate.version, Some(1));
    }

    #[tokio::test]
    async fn test_statement_filter() {
        let mut pipeline = pipeline(Arc::new(transport()))
            .with_config(PipelineConfig::default().with_statements([BALANCE]));
        let report = pipeline.process(vec![record(1001), record(1002)]).await;

        assert_eq!(report.results.len(), 2);
        assert!(report.results.iter().all(|s| s.name.as_str() == BALANCE));
    }

    #[tokio::test]
    async fn test_discovery_is_retried_on_timeout() {
        let view = format!("{ENET_URL}{}", view_path(1001));
        let transport = Arc::new(
            ReplayTransport::new().route(view.clone(), "<html><body>loading</body></html>"),
        );
        let mut pipeline = pipeline(Arc::clone(&transport))
            .with_config(PipelineConfig::default().with_discovery_attempts(2));

        let mut inactive = record(1002);
        inactive.status = FilingStatus::Other("Cancelado".into());
        let report = pipeline.process(vec![record(1001), inactive]).await;

        assert!(report.results.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            report.failures[0].error,
            EnetError::NavigationTimeout { .. }
        ));

        let navigations = transport
            .requests()
            .iter()
            .filter(|r| r.method == Method::Get && r.url == view)
            .count();
        assert_eq!(navigations, 2);
    }

    #[tokio::test]
    async fn test_run_sharded_merges_reports() {
        let transport = Arc::new(transport());
        let mut pipelines = vec![pipeline(Arc::clone(&transport)), pipeline(transport)];

        let records = vec![record(1001), record(1002), record(1001)];
        let report = run_sharded(&mut pipelines, records).await.unwrap();

        // Record 1002 carries a 2019 page date; the repeated 1001 is a duplicate
        assert_eq!(report.results.len(), 4);
        assert_eq!(report.results.duplicates().len(), 2);

        let mut none: Vec<FilingPipeline<ReplayTransport, HttpPageSession<ReplayTransport>>> =
            Vec::new();
        assert!(run_sharded(&mut none, vec![]).await.is_err());
    }

    #[tokio::test]
    async fn test_run_sharded_keeps_latest_version() {
        // Search order: 2019 filing, 2020 V2, then the older 2020 V1
        let transport = Arc::new(transport().route(
            format!("{ENET_URL}{}", view_path(1005)),
            versioned_report_page(1005, "31/12/2020", 2),
        ));
        let records = || vec![record(1002), record(1005), record(1001)];

        let sequential = pipeline(Arc::clone(&transport)).process(records()).await;
        let mut pipelines = vec![pipeline(Arc::clone(&transport)), pipeline(transport)];
        let sharded = run_sharded(&mut pipelines, records()).await.unwrap();

        let balance = StatementName::new(BALANCE);
        for report in [&sequential, &sharded] {
            let kept = report.results.get(date(2020, 12, 31), &balance).unwrap();
            assert_eq!(kept.version, Some(2));
            assert_eq!(
                report.results.document_of(date(2020, 12, 31), &balance),
                Some("1005")
            );

            assert_eq!(report.results.duplicates().len(), 2);
            assert!(report.results.duplicates().iter().all(|d| {
                d.document == "1001" && d.version == Some(1) && d.kept_document == "1005"
            }));
        }
        assert_eq!(sequential.results, sharded.results);
    }

    #[test]
    fn test_results_on_date() {
        let mut results = FilingResults::new();
        assert_eq!(results.on(date(2020, 12, 31)).count(), 0);

        results.insert(
            "1001",
            Statement {
                name: StatementName::new(BALANCE),
                reference_date: date(2020, 12, 31),
                version: None,
                currency_unit: "Reais".into(),
                columns: Vec::new(),
                rows: Vec::new(),
            },
        );
        assert_eq!(results.on(date(2020, 12, 31)).count(), 1);
    }

    #[test]
    fn test_results_merge_keeps_first() {
        let statement = |unit: &str| Statement {
            name: StatementName::new(BALANCE),
            reference_date: date(2020, 12, 31),
            version: Some(1),
            currency_unit: unit.into(),
            columns: Vec::new(),
            rows: Vec::new(),
        };

        let mut first = FilingResults::new();
        assert!(first.insert("1001", statement("Reais Mil")));
        let mut second = FilingResults::new();
        assert!(second.insert("1002", statement("Reais")));

        first.merge(second);
        assert_eq!(first.len(), 1);
        assert_eq!(
            first
                .get(date(2020, 12, 31), &StatementName::new(BALANCE))
                .unwrap()
                .currency_unit,
            "Reais Mil"
        );
        assert_eq!(first.duplicates().len(), 1);
        assert_eq!(first.duplicates()[0].document, "1002");
        assert_eq!(first.duplicates()[0].kept_document, "1001");
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"statements": ["Balanço Patrimonial Ativo"]}"#).unwrap();
        assert_eq!(config.discovery_attempts, DEFAULT_DISCOVERY_ATTEMPTS);
        assert!(config.wants(&StatementName::new(BALANCE)));
        assert!(!config.wants(&StatementName::new(EQUITY_CHANGES)));
        assert!(PipelineConfig::default().wants(&StatementName::new(EQUITY_CHANGES)));
    }
}
