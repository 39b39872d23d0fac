//! Wire codec for the `ListarDocumentos` endpoint.
//!
//! Requests are a brace-delimited block of `key: 'value'` pairs (not JSON).
//! Responses are a JSON envelope `{"d": {"dados": "..."}}` whose payload is a
//! delimited string: rows are separated by `$&&*` and fields by `$&`.

use enet_core::{EnetError, FilterSpec, Result};
use serde::Deserialize;
use std::fmt;

/// Row separator of the `dados` payload.
pub const ROW_SEPARATOR: &str = "$&&*";

/// Field separator of the `dados` payload.
pub const FIELD_SEPARATOR: &str = "$&";

/// Number of metadata fields every row carries before the actions cell.
pub const METADATA_FIELDS: usize = 10;

const DATE_FORMAT: &str = "%d/%m/%Y";

/// Sort-key wrapper tags the portal puts around some field values.
const SPAN_ORDER_TAGS: [&str; 2] = ["<spanOrder>", "</spanOrder>"];

/// Encoded body of a search request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestBody(String);

impl RequestBody {
    /// Returns the encoded body.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the body, returning the encoded string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encodes a filter specification into a request body.
///
/// The filter is validated first, so unsupported codes never reach the wire.
pub fn encode(spec: &FilterSpec) -> Result<RequestBody> {
    spec.validate()?;

    let categories = spec
        .resolved_categories()?
        .iter()
        .map(|c| c.code())
        .collect::<Vec<_>>()
        .join(",");

    let participants = if spec.participant_types.is_empty() {
        "-1".to_string()
    } else {
        spec.participant_types
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    };

    let (start, end, period) = match spec.date_range {
        Some((start, end)) => (
            start.format(DATE_FORMAT).to_string(),
            end.format(DATE_FORMAT).to_string(),
            "2",
        ),
        None => (String::new(), String::new(), "0"),
    };

    let issuer = spec
        .issuer
        .map(|code| format!("{code:06}"))
        .unwrap_or_default();

    let fields: [(&str, &str); 17] = [
        ("dataDe", start.as_str()),
        ("dataAte", end.as_str()),
        ("empresa", issuer.as_str()),
        ("setorAtividade", "-1"),
        ("categoriaEmissor", "-1"),
        ("situacaoEmissor", "-1"),
        ("tipoParticipante", participants.as_str()),
        ("dataReferencia", ""),
        ("categoria", categories.as_str()),
        ("periodo", period),
        ("horaIni", ""),
        ("horaFim", ""),
        ("palavraChave", ""),
        (
            "ultimaDtRef",
            if spec.last_reference_date_only {
                "true"
            } else {
                "false"
            },
        ),
        ("tipoEmpresa", "0"),
        ("token", ""),
        ("versaoCaptcha", ""),
    ];

    let pairs = fields
        .iter()
        .map(|(key, value)| format!("{key}: '{value}'"))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(RequestBody(format!("{{{pairs}}}")))
}

/// One undecoded search result row.
///
/// Fields are trimmed but otherwise kept as delivered, markup included.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawRow {
    /// Issuer code (may carry markup).
    pub issuer_code: String,
    /// Issuer name.
    pub issuer_name: String,
    /// Category label.
    pub category: String,
    /// Document type.
    pub document_type: String,
    /// Document species.
    pub species: String,
    /// Reference date text.
    pub reference_date: String,
    /// Delivery timestamp text.
    pub delivered_at: String,
    /// Status label.
    pub status: String,
    /// Version text.
    pub version: String,
    /// Delivery modality.
    pub modality: String,
    /// Actions cell holding the view and download calls.
    pub actions: Option<String>,
    /// Extra field appended by newer server versions.
    pub extra: Option<String>,
}

impl RawRow {
    fn from_fields(fields: &[&str]) -> Result<Self> {
        if fields.len() < METADATA_FIELDS {
            return Err(EnetError::Parse(format!(
                "search row has {} fields, expected at least {METADATA_FIELDS}",
                fields.len()
            )));
        }
        let field = |i: usize| fields[i].trim().to_string();
        let optional = |i: usize| fields.get(i).map(|f| f.trim().to_string());

        Ok(Self {
            issuer_code: field(0),
            issuer_name: field(1),
            category: field(2),
            document_type: field(3),
            species: field(4),
            reference_date: field(5),
            delivered_at: field(6),
            status: field(7),
            version: field(8),
            modality: field(9),
            actions: optional(10),
            extra: optional(11),
        })
    }
}

#[derive(Deserialize)]
struct Envelope {
    d: Payload,
}

#[derive(Deserialize)]
struct Payload {
    #[serde(default)]
    dados: Option<String>,
}

/// Decodes a search response into raw rows.
///
/// An empty or null payload means no matches.
pub fn decode(raw: &str) -> Result<Vec<RawRow>> {
    let envelope: Envelope = serde_json::from_str(raw)
        .map_err(|e| EnetError::Parse(format!("malformed search response: {e}")))?;

    let Some(dados) = envelope.d.dados.filter(|d| !d.trim().is_empty()) else {
        return Ok(Vec::new());
    };

    let cleaned = SPAN_ORDER_TAGS
        .iter()
        .fold(dados, |acc, tag| acc.replace(tag, ""));

    cleaned
        .split(ROW_SEPARATOR)
        .filter(|row| !row.trim().is_empty())
        .map(|row| RawRow::from_fields(&row.split(FIELD_SEPARATOR).collect::<Vec<_>>()))
        .collect()
}
