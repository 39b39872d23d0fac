//! Extraction of the view and download actions embedded in a search row.
//!
//! The actions cell is markup with inline script calls:
//!
//! - `OpenPopUpVer('frmGerenciaPaginaFRE.aspx?NumeroSequencialDocumento=…&CodigoTipoInstituicao=…')`
//! - `OpenDownloadDocumentos('seq','version','protocol','type')`
//!
//! Either call may be missing; extraction then yields `None`, never an error.

use enet_core::{DownloadTokens, ENET_URL, text::between};

const VIEW_CALL: &str = "OpenPopUpVer('";
const DOWNLOAD_CALL: &str = "OpenDownloadDocumentos(";

/// Report viewer link of a filing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewLink {
    /// Absolute viewer URL.
    pub url: String,
    /// Document sequence number.
    pub document_id: Option<String>,
    /// Institution type code.
    pub institution_code: Option<String>,
}

/// Extracts the report viewer link from an actions cell.
#[must_use]
pub fn extract_view(cell: &str) -> Option<ViewLink> {
    let fragment = between(cell, VIEW_CALL, "'")?.trim();
    if fragment.is_empty() {
        return None;
    }

    let document_id = between(fragment, "NumeroSequencialDocumento=", "&")
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    let institution_code = between(fragment, "CodigoTipoInstituicao=", "&")
        .map(|code| code.split('\'').next().unwrap_or(code).trim())
        .filter(|code| !code.is_empty())
        .map(str::to_string);

    Some(ViewLink {
        url: format!("{ENET_URL}{fragment}"),
        document_id,
        institution_code,
    })
}

/// Extracts the download arguments from an actions cell.
///
/// Requires exactly four single-quoted arguments.
#[must_use]
pub fn extract_download(cell: &str) -> Option<DownloadTokens> {
    let arguments = between(cell, DOWNLOAD_CALL, ")")?;

    let tokens = arguments
        .split(',')
        .map(|token| {
            token
                .trim()
                .strip_prefix('\'')
                .and_then(|t| t.strip_suffix('\''))
                .map(str::to_string)
        })
        .collect::<Option<Vec<_>>>()?;

    let [sequence, version, protocol, type_code]: [String; 4] = tokens.try_into().ok()?;
    Some(DownloadTokens {
        sequence,
        version,
        protocol,
        type_code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CELL: &str = "<i class='fi-page-search' onclick=\"OpenPopUpVer('frmGerenciaPaginaFRE.aspx?NumeroSequencialDocumento=112233&CodigoTipoInstituicao=1')\"></i>\
                        <i class='fi-download' onclick=\"OpenDownloadDocumentos('112233','2','009512DFP311220200100','DFP')\"></i>";

    #[test]
    fn test_extract_view() {
        let link = extract_view(CELL).unwrap();
        assert_eq!(
            link.url,
            "https://www.rad.cvm.gov.br/ENET/frmGerenciaPaginaFRE.aspx?NumeroSequencialDocumento=112233&CodigoTipoInstituicao=1"
        );
        assert_eq!(link.document_id.as_deref(), Some("112233"));
        assert_eq!(link.institution_code.as_deref(), Some("1"));
    }

    #[test]
    fn test_extract_download() {
        let tokens = extract_download(CELL).unwrap();
        assert_eq!(tokens.sequence, "112233");
        assert_eq!(tokens.version, "2");
        assert_eq!(tokens.protocol, "009512DFP311220200100");
        assert_eq!(tokens.type_code, "DFP");
    }

    #[test]
    fn test_missing_calls() {
        assert!(extract_view("<i></i>").is_none());
        assert!(extract_download("<i></i>").is_none());
        // Wrong arity
        assert!(extract_download("OpenDownloadDocumentos('1','2')").is_none());
    }
}
