//! Document-level RFC 3161 timestamp (PAdES B-LTA archive timestamp).
//!
//! A DocTimeStamp is a second signature over the finalized B-LT output. Its
//! `/Contents` holds a TimeStampToken directly rather than a CMS SignedData,
//! and the whole signature travels in an incremental update so the first
//! signature's bytes stay valid.

use std::fs;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, StringFormat};
use sha2::{Digest, Sha256};

use crate::domain::constants;
use crate::infra::error::{SigningError, SigningResult};
use crate::services::byterange;
use crate::services::incremental::UpdateSection;
use crate::services::pdf_signer::{catalog_id, first_page_id, PreparedPdf};

/// Append the DocTimeStamp signature field and dictionary to the finalized
/// document and return the prepared state plus the SHA-256 digest of its
/// byte ranges.
///
/// The digest is computed over the serialized file as it stands with the
/// placeholder, never over any accumulation buffer.
pub fn begin_doc_timestamp(
    output_path: &Path,
    field_name: &str,
    reserved_size: usize,
) -> SigningResult<(PreparedPdf, Vec<u8>)> {
    let bytes = fs::read(output_path)
        .map_err(|e| SigningError::IoError(format!("reading {output_path:?}: {e}")))?;
    let document = Document::load_mem(&bytes)
        .map_err(|e| SigningError::ParseFailure(format!("reloading signed PDF: {e}")))?;

    let root_id = catalog_id(&document)?;
    let page_id = first_page_id(&document)?;
    let mut section = UpdateSection::new(&bytes, root_id, document.max_id)?;

    // DocTimeStamp dictionary: the /Contents will hold a TimeStampToken.
    let mut sig_dict = Dictionary::new();
    sig_dict.set("Type", Object::Name(b"DocTimeStamp".to_vec()));
    sig_dict.set("Filter", Object::Name(b"Adobe.PPKLite".to_vec()));
    sig_dict.set("SubFilter", Object::Name(b"ETSI.RFC3161".to_vec()));
    sig_dict.set(
        "Contents",
        Object::String(vec![0u8; reserved_size], StringFormat::Hexadecimal),
    );
    sig_dict.set(
        "ByteRange",
        Object::Array(
            constants::BYTE_RANGE_PLACEHOLDER
                .iter()
                .map(|v| Object::Integer(*v))
                .collect(),
        ),
    );
    let sig_id = section.allocate();
    section.add_object(sig_id, Object::Dictionary(sig_dict));

    let mut field = Dictionary::new();
    field.set("Type", Object::Name(b"Annot".to_vec()));
    field.set("Subtype", Object::Name(b"Widget".to_vec()));
    field.set("FT", Object::Name(b"Sig".to_vec()));
    field.set(
        "Rect",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(0),
        ]),
    );
    field.set(
        "T",
        Object::String(field_name.as_bytes().to_vec(), StringFormat::Literal),
    );
    field.set("F", Object::Integer(3));
    field.set("V", Object::Reference(sig_id));
    field.set("P", Object::Reference(page_id));
    let field_id = section.allocate();
    section.add_object(field_id, Object::Dictionary(field));

    reemit_acroform(&document, &mut section, root_id, field_id)?;
    reemit_page_annots(&document, &mut section, page_id, field_id)?;

    let mut updated = bytes;
    updated.extend_from_slice(&section.render());

    let byte_range = byterange::find_contents_placeholder(&updated, reserved_size)?;
    byterange::patch_byte_range(&mut updated, &byte_range)?;
    fs::write(output_path, &updated)?;

    let (head, tail) = byte_range.spans(&updated);
    let mut hasher = Sha256::new();
    hasher.update(head);
    hasher.update(tail);
    let digest = hasher.finalize().to_vec();

    log::info!(
        "prepared DocTimeStamp field {field_name} with ByteRange {:?}",
        byte_range.as_array()
    );

    Ok((
        PreparedPdf::from_parts(
            output_path.to_path_buf(),
            updated,
            byte_range,
            reserved_size,
        ),
        digest,
    ))
}

/// Re-emit the AcroForm with the new field appended. When the catalog holds
/// the AcroForm inline it is promoted to an indirect object and the catalog
/// is re-emitted with the reference.
fn reemit_acroform(
    document: &Document,
    section: &mut UpdateSection,
    root_id: lopdf::ObjectId,
    field_id: lopdf::ObjectId,
) -> SigningResult<()> {
    let catalog = document
        .get_object(root_id)
        .and_then(Object::as_dict)
        .map_err(|e| SigningError::ParseFailure(format!("catalog: {e}")))?;

    let (acroform_id, mut acroform) = match catalog.get(b"AcroForm") {
        Ok(Object::Reference(id)) => {
            let dict = document
                .get_object(*id)
                .and_then(Object::as_dict)
                .map_err(|e| SigningError::ParseFailure(format!("AcroForm: {e}")))?
                .clone();
            (Some(*id), dict)
        }
        Ok(Object::Dictionary(dict)) => (None, dict.clone()),
        _ => (None, Dictionary::new()),
    };

    let mut fields = match acroform.get(b"Fields") {
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    };
    fields.push(Object::Reference(field_id));
    acroform.set("Fields", Object::Array(fields));
    acroform.set("SigFlags", Object::Integer(3));

    match acroform_id {
        Some(id) => section.add_object(id, Object::Dictionary(acroform)),
        None => {
            let id = section.allocate();
            section.add_object(id, Object::Dictionary(acroform));
            let mut catalog = catalog.clone();
            catalog.set("AcroForm", Object::Reference(id));
            section.add_object(root_id, Object::Dictionary(catalog));
        }
    }
    Ok(())
}

/// Re-emit the page (or its indirect `/Annots` array) with the widget added.
fn reemit_page_annots(
    document: &Document,
    section: &mut UpdateSection,
    page_id: lopdf::ObjectId,
    field_id: lopdf::ObjectId,
) -> SigningResult<()> {
    let page = document
        .get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|e| SigningError::ParseFailure(format!("page dictionary: {e}")))?;

    match page.get(b"Annots") {
        Ok(Object::Reference(annots_id)) => {
            let mut annots = document
                .get_object(*annots_id)
                .and_then(Object::as_array)
                .map_err(|e| SigningError::ParseFailure(format!("page /Annots: {e}")))?
                .clone();
            annots.push(Object::Reference(field_id));
            section.add_object(*annots_id, Object::Array(annots));
        }
        other => {
            let mut annots = match other {
                Ok(Object::Array(items)) => items.clone(),
                _ => Vec::new(),
            };
            annots.push(Object::Reference(field_id));
            let mut page = page.clone();
            page.set("Annots", Object::Array(annots));
            section.add_object(page_id, Object::Dictionary(page));
        }
    }
    Ok(())
}
