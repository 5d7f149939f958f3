//! Service layer module root.
//! Binary constructions and PDF mutation behind the session façade.

pub mod byterange;
pub mod cms_builder;
pub mod doc_timestamp;
pub mod dss;
pub mod incremental;
pub mod inspector;
pub mod pdf_signer;

pub use byterange::ByteRange;
pub use cms_builder::{CmsBuilderParams, CmsSignerContext, CmsStatus};
pub use doc_timestamp::begin_doc_timestamp;
pub use dss::append_dss_update;
pub use inspector::{
    build_ocsp_request, extract_ca_issuers_url, extract_crl_url, extract_ocsp_url,
    extract_tsa_issuer_cert, extract_tsa_signer_cert,
};
pub use pdf_signer::{prepare_signature_field, PreparedPdf, SignatureFieldOptions};
