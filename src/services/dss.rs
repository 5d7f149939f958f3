//! Document Security Store construction and update.
//!
//! The `/DSS` dictionary in the catalog carries the long-term validation
//! material (certificates, CRLs, OCSP responses) as arrays of indirect
//! references to raw-DER stream objects. Updates are append-only and are
//! written as incremental updates so the signed bytes stay untouched.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::domain::types::ValidationData;
use crate::infra::codec::base64_decode;
use crate::infra::error::{SigningError, SigningResult};
use crate::services::incremental::UpdateSection;

/// Append an incremental update carrying the validation data to `bytes`.
///
/// Existing `/Certs`, `/CRLs` and `/OCSPs` references are preserved; new
/// stream objects are appended behind them in input order. The DSS streams
/// are never compressed.
pub fn append_dss_update(bytes: &[u8], validation_data: &ValidationData) -> SigningResult<Vec<u8>> {
    if validation_data.is_empty() {
        log::debug!("validation data is empty, skipping DSS update");
        return Ok(bytes.to_vec());
    }

    let document = Document::load_mem(bytes)
        .map_err(|e| SigningError::ParseFailure(format!("reloading signed PDF: {e}")))?;
    let root_id = document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|e| SigningError::ParseFailure(format!("document has no catalog: {e}")))?;
    let mut catalog = document
        .get_object(root_id)
        .and_then(Object::as_dict)
        .map_err(|e| SigningError::ParseFailure(format!("catalog is not a dictionary: {e}")))?
        .clone();

    let (dss_id, mut dss_dict) = existing_dss(&document, &catalog)?;

    let mut section = UpdateSection::new(bytes, root_id, document.max_id)?;

    add_kind(
        &mut section,
        &document,
        &mut dss_dict,
        "Certs",
        &validation_data.certificates_b64,
    )?;
    add_kind(
        &mut section,
        &document,
        &mut dss_dict,
        "CRLs",
        &validation_data.crls_b64,
    )?;
    add_kind(
        &mut section,
        &document,
        &mut dss_dict,
        "OCSPs",
        &validation_data.ocsps_b64,
    )?;

    let dss_id = match dss_id {
        Some(existing) => existing,
        None => section.allocate(),
    };
    section.add_object(dss_id, Object::Dictionary(dss_dict));

    catalog.set("DSS", Object::Reference(dss_id));
    section.add_object(root_id, Object::Dictionary(catalog));

    log::info!(
        "DSS update: {} certificate(s), {} CRL(s), {} OCSP response(s)",
        validation_data.certificates_b64.len(),
        validation_data.crls_b64.len(),
        validation_data.ocsps_b64.len()
    );

    let mut updated = bytes.to_vec();
    updated.extend_from_slice(&section.render());
    Ok(updated)
}

/// The current DSS dictionary and its id, when the catalog already has one.
fn existing_dss(
    document: &Document,
    catalog: &Dictionary,
) -> SigningResult<(Option<ObjectId>, Dictionary)> {
    match catalog.get(b"DSS") {
        Ok(Object::Reference(id)) => {
            let dict = document
                .get_object(*id)
                .and_then(Object::as_dict)
                .map_err(|e| {
                    SigningError::ParseFailure(format!("/DSS is not a dictionary: {e}"))
                })?
                .clone();
            Ok((Some(*id), dict))
        }
        Ok(Object::Dictionary(dict)) => Ok((None, dict.clone())),
        _ => Ok((None, Dictionary::new())),
    }
}

/// Append one kind of validation material under its DSS key.
fn add_kind(
    section: &mut UpdateSection,
    document: &Document,
    dss_dict: &mut Dictionary,
    key: &str,
    blobs_b64: &[String],
) -> SigningResult<()> {
    if blobs_b64.is_empty() {
        return Ok(());
    }

    let mut refs = existing_array(document, dss_dict, key)?;
    for blob_b64 in blobs_b64 {
        let der = base64_decode(blob_b64)?;
        let id = section.allocate();
        section.add_object(id, Object::Stream(Stream::new(Dictionary::new(), der)));
        refs.push(Object::Reference(id));
    }
    dss_dict.set(key, Object::Array(refs));
    Ok(())
}

/// Dereference the existing array under `key`, preserving its entries.
fn existing_array(
    document: &Document,
    dss_dict: &Dictionary,
    key: &str,
) -> SigningResult<Vec<Object>> {
    match dss_dict.get(key.as_bytes()) {
        Ok(Object::Array(items)) => Ok(items.clone()),
        Ok(Object::Reference(id)) => {
            let items = document
                .get_object(*id)
                .and_then(Object::as_array)
                .map_err(|e| {
                    SigningError::ParseFailure(format!("/DSS /{key} is not an array: {e}"))
                })?;
            Ok(items.clone())
        }
        _ => Ok(Vec::new()),
    }
}
