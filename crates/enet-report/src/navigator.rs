//! Report page navigation.
//!
//! A filing's report page lists its statements in the `cmbQuadro` selector
//! and renders the selected one inside the `iFrameFormulariosFilho` frame.
//! Both render asynchronously, so every lookup is polled under a
//! [`RetryPolicy`].

use chrono::NaiveDate;
use enet_core::{
    ENETCONSULTA_URL, EnetError, FilingRecord, IssuerCode, Locator, PageSession, Result,
    RetryPolicy, StatementName,
    session::escape_css,
    text::{between, find_date},
};
use tracing::{debug, instrument, warn};

/// Name of the statement selector.
pub const STATEMENT_SELECT: &str = "cmbQuadro";

/// Id of the frame rendering the selected statement.
pub const STATEMENT_FRAME: &str = "iFrameFormulariosFilho";

const REGISTRATION_KEY: &str = "NumeroSequencialRegistroCvm=";

/// Which browsing context the navigator is in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FrameState {
    /// The report page itself.
    #[default]
    Outer,
    /// Inside the statement frame.
    InStatementFrame,
}

/// Session tokens read from the report page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionTokens {
    /// `hdnNumeroSequencialDocumento`.
    pub document_sequence: String,
    /// `hdnCodigoTipoDocumento`.
    pub document_type: String,
    /// `hdnCodigoInstituicao`.
    pub institution_code: String,
    /// `hdnHash`.
    pub hash: String,
    /// `NumeroSequencialRegistroCvm`.
    pub registration_sequence: String,
}

/// A statement offered by the report page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatementOption {
    /// Statement name as displayed.
    pub name: StatementName,
    /// Option value (the statement page path).
    pub value: String,
}

/// Everything discovered on a filing's report page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigationContext {
    /// URL of the report page.
    pub view_url: String,
    /// Session tokens required by statement pages.
    pub tokens: SessionTokens,
    /// Statements in page order.
    pub statements: Vec<StatementOption>,
    /// Reference date shown on the page, if readable.
    pub reference_date: Option<NaiveDate>,
    /// Document version shown on the page, if readable.
    pub version: Option<u32>,
    /// Issuer code stored on the page, if readable.
    pub issuer_code: Option<IssuerCode>,
}

impl NavigationContext {
    /// Returns the statement names in page order.
    pub fn statement_names(&self) -> impl Iterator<Item = &StatementName> {
        self.statements.iter().map(|s| &s.name)
    }

    /// Finds a statement option by name.
    #[must_use]
    pub fn option(&self, name: &StatementName) -> Option<&StatementOption> {
        self.statements.iter().find(|s| &s.name == name)
    }

    /// Builds the URL of a statement page.
    pub fn statement_url(&self, name: &StatementName) -> Result<String> {
        let option = self.option(name).ok_or_else(|| not_listed(name))?;
        let t = &self.tokens;
        Ok(format!(
            "{ENETCONSULTA_URL}{}&CodTipoDocumento={}&NumeroSequencialDocumento={}&NumeroSequencialRegistroCvm={}&CodigoTipoInstituicao={}&Hash={}",
            option.value,
            t.document_type,
            t.document_sequence,
            t.registration_sequence,
            t.institution_code,
            t.hash
        ))
    }
}

fn not_listed(name: &StatementName) -> EnetError {
    EnetError::NotSupported(format!("statement '{name}' is not listed by this filing"))
}

/// Drives a [`PageSession`] through filing report pages.
#[derive(Debug)]
pub struct ReportNavigator<S: PageSession> {
    session: S,
    policy: RetryPolicy,
    state: FrameState,
}

impl<S: PageSession> ReportNavigator<S> {
    /// Create a navigator with the default retry policy.
    #[must_use]
    pub fn new(session: S) -> Self {
        Self {
            session,
            policy: RetryPolicy::default(),
            state: FrameState::Outer,
        }
    }

    /// Set the policy used when polling for page elements.
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the current browsing context.
    #[must_use]
    pub const fn state(&self) -> FrameState {
        self.state
    }

    /// Returns the underlying session.
    #[must_use]
    pub const fn session(&self) -> &S {
        &self.session
    }

    /// Consumes the navigator, returning the session.
    #[must_use]
    pub fn into_session(self) -> S {
        self.session
    }

    /// Open a filing's report page and read its statements and tokens.
    #[instrument(skip(self, record), fields(document = %record.label()))]
    pub async fn discover(&mut self, record: &FilingRecord) -> Result<NavigationContext> {
        let view_url = record.require_view()?.to_string();

        self.restore().await?;
        self.session.navigate(&view_url).await?;

        let statements = self.statement_options().await?;
        let tokens = SessionTokens {
            document_sequence: self.hidden_value("hdnNumeroSequencialDocumento").await?,
            document_type: self.hidden_value("hdnCodigoTipoDocumento").await?,
            institution_code: self.hidden_value("hdnCodigoInstituicao").await?,
            hash: self.hidden_value("hdnHash").await?,
            registration_sequence: self.registration_sequence().await?,
        };

        let reference_date = self.label_text("lblDataDocumento").await.and_then(|t| find_date(&t));
        let version = self
            .label_text("lblDescricaoCategoria")
            .await
            .and_then(|t| parse_version(&t));
        let issuer_code = self
            .session
            .find_element(&Locator::id("hdnCodigoCvm"))
            .await
            .ok()
            .and_then(|el| el.value().and_then(IssuerCode::parse));

        debug!(statements = statements.len(), ?reference_date, ?version, "Discovered report page");

        Ok(NavigationContext {
            view_url,
            tokens,
            statements,
            reference_date,
            version,
            issuer_code,
        })
    }

    /// Select a statement and return the markup of its frame.
    ///
    /// The outer context is restored before returning, on failure too.
    #[instrument(skip(self, ctx), fields(statement = %name))]
    pub async fn fetch_statement(
        &mut self,
        ctx: &NavigationContext,
        name: &StatementName,
    ) -> Result<String> {
        let option = ctx.option(name).ok_or_else(|| not_listed(name))?;
        let url = ctx.statement_url(name)?;

        let fetched = self.read_statement_frame(&option.value, &url).await;
        let restored = self.restore().await;

        match (fetched, restored) {
            (Ok(html), Ok(())) => Ok(html),
            (Err(e), restored) => {
                if let Err(restore_err) = restored {
                    warn!(error = %restore_err, "Failed to restore outer context");
                }
                Err(e)
            }
            (Ok(_), Err(e)) => Err(e),
        }
    }

    /// Release the page session.
    pub async fn quit(&mut self) -> Result<()> {
        self.state = FrameState::Outer;
        self.session.quit().await
    }

    async fn read_statement_frame(&mut self, value: &str, url: &str) -> Result<String> {
        let option = Locator::css(format!(
            "select[name='{STATEMENT_SELECT}'] option[value='{}']",
            escape_css(value)
        ));
        self.session.click(&option).await?;

        self.state = FrameState::InStatementFrame;
        self.session
            .switch_to_frame(&Locator::id(STATEMENT_FRAME), Some(url))
            .await?;

        let session = &self.session;
        self.policy
            .poll("statement frame", move || async move {
                let source = session.page_source().await?;
                Ok(source.to_ascii_lowercase().contains("<table").then_some(source))
            })
            .await
    }

    async fn restore(&mut self) -> Result<()> {
        if self.state == FrameState::InStatementFrame {
            self.session.switch_to_default().await?;
            self.state = FrameState::Outer;
        }
        Ok(())
    }

    async fn statement_options(&self) -> Result<Vec<StatementOption>> {
        let session = &self.session;
        let locator = Locator::css(format!("select[name='{STATEMENT_SELECT}'] option"));
        let locator = &locator;

        self.policy
            .poll("statement selector", move || async move {
                let options = session
                    .find_elements(locator)
                    .await?
                    .into_iter()
                    .filter_map(|el| {
                        let value = el.value()?.trim().to_string();
                        let name = StatementName::new(&el.text);
                        (!name.as_str().is_empty()).then_some(StatementOption { name, value })
                    })
                    .collect::<Vec<_>>();
                Ok((!options.is_empty()).then_some(options))
            })
            .await
    }

    async fn hidden_value(&self, id: &str) -> Result<String> {
        let session = &self.session;
        let locator = Locator::id(id);
        let locator = &locator;

        self.policy
            .poll(id, move || async move {
                let element = session.find_element(locator).await?;
                Ok(element.value().map(|v| v.trim().to_string()))
            })
            .await
    }

    async fn registration_sequence(&self) -> Result<String> {
        let session = &self.session;
        self.policy
            .poll("NumeroSequencialRegistroCvm", move || async move {
                let url = session.current_url().await?;
                if let Some(sequence) = registration_in(&url) {
                    return Ok(Some(sequence));
                }
                let source = session.page_source().await?;
                Ok(registration_in(&source))
            })
            .await
    }

    async fn label_text(&self, id: &str) -> Option<String> {
        self.session
            .find_element(&Locator::id(id))
            .await
            .ok()
            .map(|el| el.text)
            .filter(|t| !t.trim().is_empty())
    }
}

fn registration_in(haystack: &str) -> Option<String> {
    let rest = between(haystack, REGISTRATION_KEY, "&")?;
    let digits = rest
        .chars()
        .take_while(char::is_ascii_digit)
        .collect::<String>();
    (!digits.is_empty()).then_some(digits)
}

/// Reads the document version from a category label ending in `" - V<n>"`.
fn parse_version(label: &str) -> Option<u32> {
    let last = label.rsplit(" - ").next()?.trim();
    last.trim_start_matches(['V', 'v']).parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HttpPageSession;
    use enet_core::{ENET_URL, FilingStatus, ReplayTransport};
    use std::sync::Arc;

    const VIEW_PATH: &str =
        "frmGerenciaPaginaFRE.aspx?NumeroSequencialDocumento=112233&CodigoTipoInstituicao=1";

    const REPORT_PAGE: &str = r#"<html><body>
        <span id="lblDataDocumento">31/12/2020</span>
        <span id="lblDescricaoCategoria">DFP - Demonstrações Financeiras Padronizadas - V2</span>
        <input type="hidden" id="hdnNumeroSequencialDocumento" value="112233" />
        <input type="hidden" id="hdnCodigoTipoDocumento" value="4" />
        <input type="hidden" id="hdnCodigoInstituicao" value="1" />
        <input type="hidden" id="hdnHash" value="ABC123" />
        <input type="hidden" id="hdnCodigoCvm" value="9512" />
        <select name="cmbQuadro" id="cmbQuadro">
          <option value="frmDemonstracaoFinanceiraITR.aspx?Informacao=2&amp;Demonstracao=2&amp;Periodo=0">Balanço Patrimonial Ativo</option>
          <option value="frmDemonstracaoFinanceiraITR.aspx?Informacao=2&amp;Demonstracao=8&amp;Periodo=0">Demonstração das Mutações do Patrimônio Líquido</option>
        </select>
        <iframe id="iFrameFormulariosFilho" src=""></iframe>
        <script>var pagina = 'frmDemonstracaoFinanceiraITR.aspx?NumeroSequencialRegistroCvm=5555&CodigoTipoInstituicao=1';</script>
    </body></html>"#;

    const BALANCE_PAGE: &str = r#"<html><body>
        <div id="TituloTabelaSemBorda">Balanço Patrimonial Ativo - (Reais Mil)</div>
        <table>
          <tr><td>Conta</td><td>Descrição</td><td>31/12/2020</td><td>31/12/2019</td></tr>
          <tr><td>1</td><td>Ativo Total</td><td>987.654</td><td>800.000</td></tr>
        </table>
    </body></html>"#;

    const EQUITY_PAGE: &str = r#"<html><body>
        <div id="TituloTabelaSemBorda">DMPL - 01/01/2020 à 31/12/2020 - (Reais Mil)</div>
        <table><tr><td>Legenda</td></tr></table>
        <table>
          <tr><td>Conta</td><td>Descrição</td><td>Capital Social</td><td>Reservas</td><td>Total</td></tr>
          <tr><td>5.01</td><td>Saldos Iniciais</td><td>100</td><td>20</td><td>120</td></tr>
        </table>
    </body></html>"#;

    fn statement_prefix(demonstration: u32) -> String {
        format!(
            "{ENETCONSULTA_URL}frmDemonstracaoFinanceiraITR.aspx?Informacao=2&Demonstracao={demonstration}&"
        )
    }

    fn report_transport() -> ReplayTransport {
        ReplayTransport::new()
            .route(format!("{ENET_URL}{VIEW_PATH}"), REPORT_PAGE)
            .route(statement_prefix(2), BALANCE_PAGE)
            .route(statement_prefix(8), EQUITY_PAGE)
    }

    fn record() -> FilingRecord {
        FilingRecord {
            issuer_code: IssuerCode::from(9512),
            issuer_name: "PETROBRAS".into(),
            category: "DFP".into(),
            document_type: String::new(),
            species: String::new(),
            reference_date: NaiveDate::from_ymd_opt(2020, 12, 31),
            delivered_at: None,
            status: FilingStatus::Active,
            version: Some(1),
            modality: "AP".into(),
            view_url: Some(format!("{ENET_URL}{VIEW_PATH}")),
            document_id: Some("112233".into()),
            institution_code: Some("1".into()),
            download: None,
        }
    }

    fn navigator(
        transport: ReplayTransport,
    ) -> ReportNavigator<HttpPageSession<ReplayTransport>> {
        ReportNavigator::new(HttpPageSession::new(Arc::new(transport)))
            .with_retry_policy(RetryPolicy::immediate(3))
    }

    #[tokio::test]
    async fn test_discover_reads_tokens_and_labels() {
        let mut navigator = navigator(report_transport());
        let ctx = navigator.discover(&record()).await.unwrap();

        assert_eq!(ctx.statements.len(), 2);
        assert_eq!(ctx.statements[0].name.as_str(), "Balanço Patrimonial Ativo");
        assert_eq!(ctx.tokens.hash, "ABC123");
        assert_eq!(ctx.tokens.registration_sequence, "5555");
        assert_eq!(ctx.reference_date, NaiveDate::from_ymd_opt(2020, 12, 31));
        assert_eq!(ctx.version, Some(2));
        assert_eq!(ctx.issuer_code, IssuerCode::parse("9512"));

        assert_eq!(
            ctx.statement_url(&StatementName::new("Balanço Patrimonial Ativo"))
                .unwrap(),
            "https://www.rad.cvm.gov.br/ENETCONSULTA/frmDemonstracaoFinanceiraITR.aspx?\
             Informacao=2&Demonstracao=2&Periodo=0\
             &CodTipoDocumento=4&NumeroSequencialDocumento=112233&NumeroSequencialRegistroCvm=5555\
             &CodigoTipoInstituicao=1&Hash=ABC123"
        );
        assert!(ctx.statement_url(&StatementName::new("Unknown")).is_err());
    }

    #[tokio::test]
    async fn test_fetch_statement_restores_outer_context() {
        let mut navigator = navigator(report_transport());
        let ctx = navigator.discover(&record()).await.unwrap();

        for name in ctx.statement_names().cloned().collect::<Vec<_>>() {
            let html = navigator.fetch_statement(&ctx, &name).await.unwrap();
            assert!(html.contains("TituloTabelaSemBorda"));
            assert_eq!(navigator.state(), FrameState::Outer);
        }
        assert_eq!(
            navigator.session().page_source().await.unwrap(),
            REPORT_PAGE
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_still_restores() {
        let transport = ReplayTransport::new().route(format!("{ENET_URL}{VIEW_PATH}"), REPORT_PAGE);
        let mut navigator = navigator(transport);
        let ctx = navigator.discover(&record()).await.unwrap();

        let name = StatementName::new("Balanço Patrimonial Ativo");
        let result = navigator.fetch_statement(&ctx, &name).await;

        assert!(matches!(result, Err(EnetError::Transport(_))));
        assert_eq!(navigator.state(), FrameState::Outer);
    }

    #[tokio::test]
    async fn test_missing_token_times_out() {
        let page = REPORT_PAGE.replace("id=\"hdnHash\" value=\"ABC123\"", "id=\"hdnHash\" value=\"\"");
        let transport = ReplayTransport::new().route(format!("{ENET_URL}{VIEW_PATH}"), page);
        let mut navigator = navigator(transport);

        match navigator.discover(&record()).await {
            Err(EnetError::NavigationTimeout { element, attempts }) => {
                assert_eq!(element, "hdnHash");
                assert_eq!(attempts, 3);
            }
            other => panic!("expected navigation timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_selector_times_out() {
        let transport = ReplayTransport::new().route(
            format!("{ENET_URL}{VIEW_PATH}"),
            "<html><body><select name='cmbQuadro'></select></body></html>",
        );
        let mut navigator = navigator(transport);

        assert!(matches!(
            navigator.discover(&record()).await,
            Err(EnetError::NavigationTimeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_record_without_view_link() {
        let mut navigator = navigator(report_transport());
        let mut partial = record();
        partial.view_url = None;

        assert!(matches!(
            navigator.discover(&partial).await,
            Err(EnetError::PartialRecord { .. })
        ));
        assert!(navigator.session().current_url().await.is_err());
    }

    #[test]
    fn test_parse_version_and_registration() {
        assert_eq!(parse_version("DFP - Demonstrações - V3"), Some(3));
        assert_eq!(parse_version("DFP"), None);
        assert_eq!(
            registration_in("x.aspx?NumeroSequencialRegistroCvm=42&y=1"),
            Some("42".to_string())
        );
        assert_eq!(
            registration_in("... NumeroSequencialRegistroCvm=77'</script>"),
            Some("77".to_string())
        );
        assert_eq!(registration_in("nothing here"), None);
    }
}
