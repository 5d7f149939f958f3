//! CMS domain wrappers: the final SignedData blob and the canonical
//! signed-attribute set.

use std::fmt;

/// DER bytes of a complete CMS `ContentInfo` carrying a SignedData.
pub struct CmsSignedData {
    der: Vec<u8>,
}

impl CmsSignedData {
    #[must_use]
    pub fn from_der(der: Vec<u8>) -> Self {
        Self { der }
    }

    #[must_use]
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.der.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.der.is_empty()
    }
}

impl fmt::Debug for CmsSignedData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CmsSignedData(len={})", self.der.len())
    }
}

/// One attribute as a complete `Attribute` SEQUENCE DER blob.
#[derive(Clone)]
pub struct SignedAttribute {
    pub oid: String,
    pub der: Vec<u8>,
}

impl fmt::Debug for SignedAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignedAttribute(oid={}, len={})", self.oid, self.der.len())
    }
}

/// Canonically ordered signed attributes.
///
/// DER SET OF ordering sorts elements by their encodings; the sorted
/// concatenation is what both the `[0] IMPLICIT` SignerInfo field and the
/// SET-tagged digest input are built from.
pub struct SignedAttributesCanonical {
    ordered: Vec<SignedAttribute>,
    concatenated_der: Vec<u8>,
}

impl SignedAttributesCanonical {
    #[must_use]
    pub fn new(mut attrs: Vec<SignedAttribute>) -> Self {
        attrs.sort_by(|a, b| a.der.cmp(&b.der));
        let mut concatenated = Vec::new();
        for attr in &attrs {
            concatenated.extend_from_slice(&attr.der);
        }
        Self {
            ordered: attrs,
            concatenated_der: concatenated,
        }
    }

    #[must_use]
    pub fn concatenated_der(&self) -> &[u8] {
        &self.concatenated_der
    }

    #[must_use]
    pub fn ordered(&self) -> &[SignedAttribute] {
        &self.ordered
    }
}

impl fmt::Debug for SignedAttributesCanonical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SignedAttributesCanonical(count={}, total_len={})",
            self.ordered.len(),
            self.concatenated_der.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_ordering_sorts_by_der() {
        let a = SignedAttribute {
            oid: "1.2".into(),
            der: vec![0x30, 0x03, 0x02, 0x01, 0x05],
        };
        let b = SignedAttribute {
            oid: "1.3".into(),
            der: vec![0x30, 0x03, 0x02, 0x01, 0x01],
        };
        let canonical = SignedAttributesCanonical::new(vec![a.clone(), b.clone()]);
        assert_eq!(canonical.ordered()[0].der, b.der);
        let mut expected = b.der.clone();
        expected.extend_from_slice(&a.der);
        assert_eq!(canonical.concatenated_der(), expected.as_slice());
    }
}
