//! PDF signing orchestration: field creation, placeholder reservation and
//! final CMS embedding.
//!
//! `prepare_signature_field` mutates a copy of the input document so that it
//! carries an invisible signature field with a zero-filled `/Contents`
//! reservation and an exact `/ByteRange`; the resulting bytes are what gets
//! hashed for the remote service. `PreparedPdf::embed_contents` later drops
//! the signature container into the reserved slot without moving a byte.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};

use crate::domain::constants;
use crate::infra::error::{SigningError, SigningResult};
use crate::services::byterange::{self, ByteRange};

/// Options for the signature dictionary and its field.
#[derive(Debug, Clone)]
pub struct SignatureFieldOptions {
    pub field_name: String,
    pub reason: String,
    pub signer_name: String,
    pub signing_time: DateTime<Utc>,
    /// Reserved `/Contents` capacity in bytes.
    pub reserved_size: usize,
}

/// A serialized document with a reserved, ByteRange-exact signature slot.
pub struct PreparedPdf {
    output_path: PathBuf,
    bytes: Vec<u8>,
    byte_range: ByteRange,
    reserved_size: usize,
}

impl PreparedPdf {
    pub(crate) fn from_parts(
        output_path: PathBuf,
        bytes: Vec<u8>,
        byte_range: ByteRange,
        reserved_size: usize,
    ) -> Self {
        Self {
            output_path,
            bytes,
            byte_range,
            reserved_size,
        }
    }

    #[must_use]
    pub fn byte_range(&self) -> &ByteRange {
        &self.byte_range
    }

    #[must_use]
    pub fn reserved_size(&self) -> usize {
        self.reserved_size
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// The two covered spans, in order.
    #[must_use]
    pub fn spans(&self) -> (&[u8], &[u8]) {
        self.byte_range.spans(&self.bytes)
    }

    /// Write the signature container into the reserved slot and flush the
    /// file. Fails with `SignatureOverflow` when it does not fit; the slot
    /// keeps its zero filling in that case.
    pub fn embed_contents(&mut self, payload: &[u8]) -> SigningResult<()> {
        byterange::write_contents(
            &mut self.bytes,
            &self.byte_range,
            payload,
            self.reserved_size,
        )?;
        fs::write(&self.output_path, &self.bytes)?;
        log::info!(
            "embedded {} byte container into {} byte reservation",
            payload.len(),
            self.reserved_size
        );
        Ok(())
    }
}

/// Copy `input` to `output` and reserve an invisible CAdES signature there.
pub fn prepare_signature_field(
    input: &Path,
    output: &Path,
    options: &SignatureFieldOptions,
) -> SigningResult<PreparedPdf> {
    fs::copy(input, output)
        .map_err(|e| SigningError::IoError(format!("copying {input:?} to {output:?}: {e}")))?;

    let mut document = Document::load(output)
        .map_err(|e| SigningError::ParseFailure(format!("loading input PDF: {e}")))?;

    let signature_id = add_signature_dictionary(&mut document, options);
    let field_id = add_signature_widget(&mut document, signature_id, options)?;
    attach_to_acroform(&mut document, field_id)?;
    attach_to_page_annots(&mut document, field_id)?;

    let mut bytes = Vec::new();
    document
        .save_to(&mut bytes)
        .map_err(|e| SigningError::IoError(format!("serializing prepared PDF: {e}")))?;

    let byte_range = byterange::find_contents_placeholder(&bytes, options.reserved_size)?;
    byterange::patch_byte_range(&mut bytes, &byte_range)?;
    fs::write(output, &bytes)?;

    log::info!(
        "prepared signature field {} with ByteRange {:?}",
        options.field_name,
        byte_range.as_array()
    );

    Ok(PreparedPdf {
        output_path: output.to_path_buf(),
        bytes,
        byte_range,
        reserved_size: options.reserved_size,
    })
}

fn add_signature_dictionary(document: &mut Document, options: &SignatureFieldOptions) -> ObjectId {
    let mut sig_dict = Dictionary::new();
    sig_dict.set("Type", Object::Name(b"Sig".to_vec()));
    sig_dict.set("Filter", Object::Name(b"Adobe.PPKLite".to_vec()));
    sig_dict.set("SubFilter", Object::Name(b"ETSI.CAdES.detached".to_vec()));
    sig_dict.set(
        "Reason",
        Object::String(options.reason.clone().into_bytes(), StringFormat::Literal),
    );
    sig_dict.set(
        "Name",
        Object::String(
            options.signer_name.clone().into_bytes(),
            StringFormat::Literal,
        ),
    );
    let date = format!("D:{}Z", options.signing_time.format("%Y%m%d%H%M%S"));
    sig_dict.set(
        "M",
        Object::String(date.into_bytes(), StringFormat::Literal),
    );
    sig_dict.set(
        "Contents",
        Object::String(
            vec![0u8; options.reserved_size],
            StringFormat::Hexadecimal,
        ),
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
    document.add_object(Object::Dictionary(sig_dict))
}

fn add_signature_widget(
    document: &mut Document,
    signature_id: ObjectId,
    options: &SignatureFieldOptions,
) -> SigningResult<ObjectId> {
    let page_id = first_page_id(document)?;

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
        Object::String(
            options.field_name.clone().into_bytes(),
            StringFormat::Literal,
        ),
    );
    // Annotation flags: Invisible | Hidden.
    field.set("F", Object::Integer(3));
    field.set("V", Object::Reference(signature_id));
    field.set("P", Object::Reference(page_id));
    Ok(document.add_object(Object::Dictionary(field)))
}

/// Get or create the AcroForm as an indirect dictionary, force `SigFlags 3`
/// and append the field.
fn attach_to_acroform(document: &mut Document, field_id: ObjectId) -> SigningResult<()> {
    let catalog_id = catalog_id(document)?;

    enum AcroFormSlot {
        Indirect(ObjectId),
        Inline(Dictionary),
        Missing,
    }
    let slot = {
        let catalog = document
            .get_object(catalog_id)
            .and_then(Object::as_dict)
            .map_err(|e| SigningError::ParseFailure(format!("catalog: {e}")))?;
        match catalog.get(b"AcroForm") {
            Ok(Object::Reference(id)) => AcroFormSlot::Indirect(*id),
            Ok(Object::Dictionary(dict)) => AcroFormSlot::Inline(dict.clone()),
            _ => AcroFormSlot::Missing,
        }
    };
    let acroform_id = match slot {
        AcroFormSlot::Indirect(id) => id,
        // Promote an inline AcroForm so later phases can re-emit it.
        AcroFormSlot::Inline(dict) => document.add_object(Object::Dictionary(dict)),
        AcroFormSlot::Missing => {
            let mut acroform = Dictionary::new();
            acroform.set("Fields", Object::Array(Vec::new()));
            document.add_object(Object::Dictionary(acroform))
        }
    };

    let catalog = document
        .get_object_mut(catalog_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| SigningError::ParseFailure(format!("catalog: {e}")))?;
    catalog.set("AcroForm", Object::Reference(acroform_id));

    let acroform = document
        .get_object_mut(acroform_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| SigningError::ParseFailure(format!("AcroForm: {e}")))?;
    let mut fields = match acroform.get(b"Fields") {
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    };
    fields.push(Object::Reference(field_id));
    acroform.set("Fields", Object::Array(fields));
    // Signatures exist, append-only.
    acroform.set("SigFlags", Object::Integer(3));
    Ok(())
}

fn attach_to_page_annots(document: &mut Document, field_id: ObjectId) -> SigningResult<()> {
    let page_id = first_page_id(document)?;

    let annots_target = {
        let page = document
            .get_object(page_id)
            .and_then(Object::as_dict)
            .map_err(|e| SigningError::ParseFailure(format!("page dictionary: {e}")))?;
        page.get(b"Annots").ok().and_then(|a| a.as_reference().ok())
    };

    match annots_target {
        Some(annots_id) => {
            let annots = document
                .get_object_mut(annots_id)
                .and_then(Object::as_array_mut)
                .map_err(|e| SigningError::ParseFailure(format!("page /Annots: {e}")))?;
            annots.push(Object::Reference(field_id));
        }
        None => {
            let page = document
                .get_object_mut(page_id)
                .and_then(Object::as_dict_mut)
                .map_err(|e| SigningError::ParseFailure(format!("page dictionary: {e}")))?;
            let mut annots = match page.get(b"Annots") {
                Ok(Object::Array(items)) => items.clone(),
                _ => Vec::new(),
            };
            annots.push(Object::Reference(field_id));
            page.set("Annots", Object::Array(annots));
        }
    }
    Ok(())
}

pub(crate) fn catalog_id(document: &Document) -> SigningResult<ObjectId> {
    document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|e| SigningError::ParseFailure(format!("document has no catalog: {e}")))
}

pub(crate) fn first_page_id(document: &Document) -> SigningResult<ObjectId> {
    document
        .get_pages()
        .get(&1)
        .copied()
        .ok_or_else(|| SigningError::ParseFailure("document has no pages".into()))
}
