use roxmltree::Document;

use crate::core::NfseError;

/// Groups every `infDPS` must contain. `serv` is also accepted as `servicos`.
const REQUIRED_GROUPS: &[&[&str]] = &[&["prest"], &["toma"], &["serv", "servicos"], &["valores"]];

/// Cheap structural pre-check before a full parse.
///
/// Fails with [`NfseError::MalformedXml`] on broken XML and with
/// [`NfseError::SchemaMismatch`] naming every missing group.
pub fn validate_nfse_xml(xml: &str) -> Result<(), NfseError> {
    let doc = Document::parse(xml).map_err(|e| NfseError::MalformedXml(e.to_string()))?;
    let inf = doc
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "infDPS")
        .ok_or_else(|| NfseError::SchemaMismatch("infDPS element not found".into()))?;

    let missing: Vec<&str> = REQUIRED_GROUPS
        .iter()
        .filter(|names| {
            !inf.children()
                .any(|c| c.is_element() && names.contains(&c.tag_name().name()))
        })
        .map(|names| names[0])
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(NfseError::SchemaMismatch(format!(
            "infDPS is missing: {}",
            missing.join(", ")
        )))
    }
}
