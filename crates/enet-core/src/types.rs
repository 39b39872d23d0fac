//! Core data types for filing discovery.
//!
//! This module defines the search-side data structures:
//!
//! - [`FilterSpec`] - What to search for
//! - [`Category`] / [`ParticipantType`] - Supported filter enumerations
//! - [`IssuerCode`] - Issuer identifier as delivered by the portal
//! - [`FilingRecord`] - One filing returned by a search
//! - [`DownloadTokens`] - Arguments of a filing's download action
//! - [`Issuer`] / [`IssuerDirectory`] - Issuer reference data
//! - [`CategoryOption`] - A category offered by the portal

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{EnetError, Result};

/// Base URL of the ENET consultation application.
pub const ENET_URL: &str = "https://www.rad.cvm.gov.br/ENET/";

/// Base URL of the ENET report pages.
pub const ENETCONSULTA_URL: &str = "https://www.rad.cvm.gov.br/ENETCONSULTA/";

/// Filing category supported by the search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// Every periodic statement category.
    AllStatements,
    /// Formulário Cadastral (registration form).
    Fca,
    /// Informações Trimestrais (quarterly information).
    Itr,
    /// Demonstrações Financeiras Padronizadas (standardized annual statements).
    Dfp,
    /// Formulário de Referência (reference form).
    Fre,
    /// Every periodic and eventual information document.
    AllIpe,
}

impl Category {
    /// Every supported category.
    pub const ALL: [Self; 6] = [
        Self::AllStatements,
        Self::Fca,
        Self::Itr,
        Self::Dfp,
        Self::Fre,
        Self::AllIpe,
    ];

    /// Returns the code the search endpoint expects.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::AllStatements => "EST_-1",
            Self::Fca => "EST_1",
            Self::Itr => "EST_3",
            Self::Dfp => "EST_4",
            Self::Fre => "EST_9",
            Self::AllIpe => "IPE_-1_-1_-1",
        }
    }

    /// Returns the short name used in search results.
    #[must_use]
    pub const fn short_name(&self) -> &'static str {
        match self {
            Self::AllStatements => "EST",
            Self::Fca => "FCA",
            Self::Itr => "ITR",
            Self::Dfp => "DFP",
            Self::Fre => "FRE",
            Self::AllIpe => "IPE",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Category {
    type Err = EnetError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(category) = Self::ALL
            .iter()
            .find(|c| c.code() == s || c.short_name().eq_ignore_ascii_case(s))
        {
            return Ok(*category);
        }
        // Dropdown indexes of the previous portal layout.
        match s {
            "21" => Ok(Self::Dfp),
            "39" => Ok(Self::Itr),
            _ => Err(EnetError::Validation(format!(
                "unsupported category code '{s}', expected one of {}",
                Self::ALL.map(|c| c.code()).join(", ")
            ))),
        }
    }
}

/// Type of market participant filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticipantType {
    /// No participant filter.
    All,
    /// Publicly held company.
    PublicCompany,
    /// Foreign company.
    ForeignCompany,
    /// Incentivized company.
    IncentivizedCompany,
}

impl ParticipantType {
    /// Returns the numeric code the search endpoint expects.
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Self::All => -1,
            Self::PublicCompany => 1,
            Self::ForeignCompany => 2,
            Self::IncentivizedCompany => 3,
        }
    }

    /// Looks up a participant type by its numeric code.
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            -1 => Ok(Self::All),
            1 => Ok(Self::PublicCompany),
            2 => Ok(Self::ForeignCompany),
            3 => Ok(Self::IncentivizedCompany),
            other => Err(EnetError::Validation(format!(
                "unsupported participant type {other}"
            ))),
        }
    }
}

/// What to search for.
///
/// Category and participant codes are kept as given and validated when the
/// filter is encoded, so a bad code is rejected before any request is made.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Issuer code, or `None` for every issuer.
    pub issuer: Option<u32>,
    /// Category codes (wire codes, short names or legacy indexes).
    pub categories: Vec<String>,
    /// Participant type codes.
    pub participant_types: Vec<i32>,
    /// Inclusive date range, or `None` for the full history.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// Only the most recent reference date per issuer.
    pub last_reference_date_only: bool,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            issuer: None,
            categories: Vec::new(),
            participant_types: vec![ParticipantType::PublicCompany.code()],
            date_range: None,
            last_reference_date_only: false,
        }
    }
}

impl FilterSpec {
    /// Creates a filter with no restriction beyond the default participant type.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the search to one issuer.
    #[must_use]
    pub const fn with_issuer(mut self, issuer: u32) -> Self {
        self.issuer = Some(issuer);
        self
    }

    /// Adds a category code.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    /// Replaces the participant type codes.
    #[must_use]
    pub fn with_participant_types(mut self, codes: Vec<i32>) -> Self {
        self.participant_types = codes;
        self
    }

    /// Restricts the search to an inclusive date range.
    #[must_use]
    pub const fn with_date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.date_range = Some((start, end));
        self
    }

    /// Only returns the most recent reference date.
    #[must_use]
    pub const fn last_reference_date_only(mut self, only: bool) -> Self {
        self.last_reference_date_only = only;
        self
    }

    /// Parses the category codes, defaulting to every statement and IPE
    /// document when none were given.
    pub fn resolved_categories(&self) -> Result<Vec<Category>> {
        if self.categories.is_empty() {
            return Ok(vec![Category::AllStatements, Category::AllIpe]);
        }
        self.categories.iter().map(|c| c.parse()).collect()
    }

    /// Parses the participant type codes. An empty list means every type.
    pub fn resolved_participant_types(&self) -> Result<Vec<ParticipantType>> {
        self.participant_types
            .iter()
            .map(|&c| ParticipantType::from_code(c))
            .collect()
    }

    /// Checks the category and participant codes and the date range.
    pub fn validate(&self) -> Result<()> {
        self.resolved_categories()?;
        self.resolved_participant_types()?;
        if let Some((start, end)) = self.date_range
            && start > end
        {
            return Err(EnetError::Validation(format!(
                "date range starts after it ends ({start} > {end})"
            )));
        }
        Ok(())
    }
}

/// Issuer identifier as delivered by the portal.
///
/// Only digits are kept; leading zeros are preserved.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IssuerCode(String);

impl IssuerCode {
    /// Cleans `raw` down to its digits. Returns `None` when no digit is left.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let digits = crate::text::digits_only(raw);
        (!digits.is_empty()).then_some(Self(digits))
    }

    /// Returns the code as delivered (digits only).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the numeric value of the code.
    #[must_use]
    pub fn value(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl From<u32> for IssuerCode {
    fn from(code: u32) -> Self {
        Self(code.to_string())
    }
}

impl fmt::Display for IssuerCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status of a filing.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilingStatus {
    /// The current, valid submission.
    Active,
    /// Superseded, cancelled or otherwise inactive; keeps the portal's label.
    Other(String),
}

impl FilingStatus {
    /// Maps the portal's status label.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label.eq_ignore_ascii_case("Ativo") {
            Self::Active
        } else {
            Self::Other(label.to_string())
        }
    }

    /// Returns true for [`FilingStatus::Active`].
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Arguments of a filing's download action.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DownloadTokens {
    /// Document sequence number.
    pub sequence: String,
    /// Document version.
    pub version: String,
    /// Delivery protocol.
    pub protocol: String,
    /// Document type code.
    pub type_code: String,
}

impl DownloadTokens {
    /// Builds the document download URL.
    #[must_use]
    pub fn url(&self) -> String {
        format!(
            "{ENET_URL}frmDownloadDocumento.aspx?Tela=ext&numSequencia={}&numVersao={}&numProtocolo={}&descTipo={}&CodigoInstituicao=1",
            self.sequence, self.version, self.protocol, self.type_code
        )
    }
}

/// One filing returned by a search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilingRecord {
    /// Issuer code.
    pub issuer_code: IssuerCode,
    /// Issuer name.
    pub issuer_name: String,
    /// Category label (e.g. "DFP").
    pub category: String,
    /// Document type.
    pub document_type: String,
    /// Document species.
    pub species: String,
    /// Reference date of the filing.
    pub reference_date: Option<NaiveDate>,
    /// When the filing was delivered.
    pub delivered_at: Option<NaiveDateTime>,
    /// Filing status.
    pub status: FilingStatus,
    /// Document version.
    pub version: Option<u32>,
    /// Delivery modality.
    pub modality: String,
    /// Report viewer URL.
    pub view_url: Option<String>,
    /// Document sequence number taken from the viewer URL.
    pub document_id: Option<String>,
    /// Institution type code taken from the viewer URL.
    pub institution_code: Option<String>,
    /// Download action arguments.
    pub download: Option<DownloadTokens>,
}

impl FilingRecord {
    /// Returns true when the record can be drilled into.
    #[must_use]
    pub const fn is_drillable(&self) -> bool {
        self.view_url.is_some()
    }

    /// Returns the viewer URL or a [`EnetError::PartialRecord`] error.
    pub fn require_view(&self) -> Result<&str> {
        self.view_url
            .as_deref()
            .ok_or_else(|| EnetError::PartialRecord {
                document: self.label(),
                missing: "view",
            })
    }

    /// Returns the download URL or a [`EnetError::PartialRecord`] error.
    pub fn require_download(&self) -> Result<String> {
        self.download
            .as_ref()
            .map(DownloadTokens::url)
            .ok_or_else(|| EnetError::PartialRecord {
                document: self.label(),
                missing: "download",
            })
    }

    /// A short human readable identifier for logs and error reports.
    #[must_use]
    pub fn label(&self) -> String {
        match (&self.document_id, self.reference_date) {
            (Some(id), _) => id.clone(),
            (None, Some(date)) => format!("{} {} {date}", self.issuer_code, self.category),
            (None, None) => format!("{} {}", self.issuer_code, self.category),
        }
    }
}

/// An issuer listed by the portal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issuer {
    /// Issuer code.
    pub code: IssuerCode,
    /// Company name.
    pub name: String,
}

/// Every issuer listed by the portal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerDirectory {
    issuers: Vec<Issuer>,
}

impl IssuerDirectory {
    /// Creates a directory from a list of issuers.
    #[must_use]
    pub const fn new(issuers: Vec<Issuer>) -> Self {
        Self { issuers }
    }

    /// Returns the number of issuers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.issuers.len()
    }

    /// Returns true if the directory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issuers.is_empty()
    }

    /// Returns an iterator over the issuers.
    pub fn iter(&self) -> impl Iterator<Item = &Issuer> {
        self.issuers.iter()
    }

    /// Finds an issuer by numeric code, ignoring zero padding.
    #[must_use]
    pub fn find(&self, code: u32) -> Option<&Issuer> {
        self.issuers
            .iter()
            .find(|i| i.code.value() == Some(u64::from(code)))
    }

    /// Returns true if an issuer with this code is listed.
    #[must_use]
    pub fn contains(&self, code: u32) -> bool {
        self.find(code).is_some()
    }
}

/// A category offered by the portal's category selector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryOption {
    /// Wire code (e.g. `EST_4`).
    pub code: String,
    /// Display label.
    pub label: String,
}

impl CategoryOption {
    /// Returns the matching supported category, if any.
    #[must_use]
    pub fn supported(&self) -> Option<Category> {
        self.code.parse().ok()
    }
}
