//! Reference data embedded in the ENET consultation page.
//!
//! The page carries two hidden inputs: `hdnEmpresas`, a script-object literal
//! listing every issuer, and `hdnComboCategoriaTipoEspecie`, the markup of the
//! category selector.

use enet_core::{CategoryOption, EnetError, Issuer, IssuerCode, IssuerDirectory, Result};
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::debug;

/// Consultation page path under the ENET base URL.
pub const CONSULTATION_PAGE: &str = "frmConsultaExternaCVM.aspx";

#[derive(Deserialize)]
struct IssuerEntry {
    value: String,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| EnetError::Parse(format!("invalid selector {css}: {e:?}")))
}

fn hidden_value(html: &str, id: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let input = selector(&format!("[id='{id}']"))?;
    document
        .select(&input)
        .next()
        .and_then(|el| el.value().attr("value"))
        .map(str::to_string)
        .ok_or_else(|| EnetError::Parse(format!("consultation page has no {id} value")))
}

/// Parses the issuer list out of the consultation page.
///
/// Each entry's value reads `<code> - <name>`; entries without a numeric
/// code are skipped.
pub fn parse_issuers(html: &str) -> Result<IssuerDirectory> {
    let literal = hidden_value(html, "hdnEmpresas")?;
    let json = literal
        .replace("{ key:", "{ \"key\":")
        .replace(", value:", ", \"value\":")
        .replace('\'', "\"");

    let entries: Vec<IssuerEntry> = serde_json::from_str(&json)
        .map_err(|e| EnetError::Parse(format!("malformed issuer list: {e}")))?;

    let issuers = entries
        .into_iter()
        .filter_map(|entry| {
            let mut parts = entry.value.split(" - ");
            let code = IssuerCode::parse(parts.next()?)?;
            let name = parts.last().unwrap_or_default().trim().to_string();
            Some(Issuer { code, name })
        })
        .collect::<Vec<_>>();

    debug!(count = issuers.len(), "Parsed issuer directory");
    Ok(IssuerDirectory::new(issuers))
}

/// Parses the category selector out of the consultation page.
pub fn parse_categories(html: &str) -> Result<Vec<CategoryOption>> {
    let markup = hidden_value(html, "hdnComboCategoriaTipoEspecie")?;
    let fragment = Html::parse_fragment(&markup);
    let option = selector("option")?;

    Ok(fragment
        .select(&option)
        .filter_map(|el| {
            let code = el.value().attr("value")?.trim().to_string();
            let label = el.text().collect::<String>().replace('\u{a0}', "");
            Some(CategoryOption {
                code,
                label: label.trim().to_string(),
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use enet_core::Category;

    const CONSULTATION_HTML: &str = r#"<html><body><form>
        <input type="hidden" id="hdnEmpresas" value="[{ key:'009512', value:'009512 - PETROLEO BRASILEIRO S.A. PETROBRAS'},{ key:'019348', value:'019348 - ITAU UNIBANCO HOLDING S.A.'}]" />
        <input type="hidden" id="hdnComboCategoriaTipoEspecie" value="&lt;option value='EST_4'&gt;DFP&amp;nbsp;- Demonstrações Financeiras Padronizadas&lt;/option&gt;&lt;option value='EST_3'&gt;ITR - Informações Trimestrais&lt;/option&gt;" />
    </form></body></html>"#;

    #[test]
    fn test_parse_issuers() {
        let directory = parse_issuers(CONSULTATION_HTML).unwrap();
        assert_eq!(directory.len(), 2);

        let petrobras = directory.find(9512).unwrap();
        assert_eq!(petrobras.code.as_str(), "009512");
        assert_eq!(petrobras.name, "PETROLEO BRASILEIRO S.A. PETROBRAS");
    }

    #[test]
    fn test_parse_categories() {
        let categories = parse_categories(CONSULTATION_HTML).unwrap();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].code, "EST_4");
        assert_eq!(
            categories[0].label,
            "DFP- Demonstrações Financeiras Padronizadas"
        );
        assert_eq!(categories[0].supported(), Some(Category::Dfp));
    }

    #[test]
    fn test_missing_hidden_input() {
        assert!(matches!(
            parse_issuers("<html></html>"),
            Err(EnetError::Parse(_))
        ));
    }
}
