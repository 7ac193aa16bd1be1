#![forbid(unsafe_code)]

//! Transform registry mapping algorithm URIs to transforms.

use crate::cipher::{CipherTransform, KeyTransportTransform};
use crate::transform::Transform;
use base64::Engine;
use solna_core::{algorithm, ns, Error, Result};
use solna_crypto::keytransport::OaepParams;
use solna_xml::document;

/// Create an `EncryptionMethod` transform from its algorithm URI.
pub fn encryption_method(uri: &str) -> Result<Box<dyn Transform>> {
    match uri {
        algorithm::RSA_PKCS1 | algorithm::RSA_OAEP => Ok(Box::new(KeyTransportTransform::new(
            solna_crypto::keytransport::from_uri(uri)?,
        ))),
        _ => Ok(Box::new(CipherTransform::new(
            solna_crypto::cipher::from_uri(uri)?,
        ))),
    }
}

/// Create an `EncryptionMethod` transform by parsing the element: the
/// `Algorithm` attribute plus any algorithm parameters in child
/// elements (RSA-OAEP `DigestMethod` / `OAEPparams`).
pub fn encryption_method_node(node: roxmltree::Node<'_, '_>) -> Result<Box<dyn Transform>> {
    let uri = node
        .attribute(ns::attr::ALGORITHM)
        .ok_or_else(|| Error::MissingAttribute("Algorithm on EncryptionMethod".into()))?;
    match uri {
        algorithm::RSA_OAEP => {
            let params = read_oaep_params(node);
            Ok(Box::new(KeyTransportTransform::new(
                solna_crypto::keytransport::from_uri_with_params(uri, params)?,
            )))
        }
        _ => encryption_method(uri),
    }
}

/// Whether a URI names a transform usable under `CipherReference/Transforms`.
pub fn is_reference_transform(uri: &str) -> bool {
    matches!(uri, algorithm::BASE64 | algorithm::XPATH)
}

/// Read RSA-OAEP parameters from `EncryptionMethod` child elements.
fn read_oaep_params(enc_method: roxmltree::Node<'_, '_>) -> OaepParams {
    let mut params = OaepParams::default();
    for child in enc_method.children() {
        if !child.is_element() {
            continue;
        }
        let local = child.tag_name().name();
        let child_ns = child.tag_name().namespace().unwrap_or("");

        if local == ns::node::DIGEST_METHOD && (child_ns == ns::DSIG || child_ns == ns::ENC) {
            if let Some(alg) = child.attribute(ns::attr::ALGORITHM) {
                params.digest_uri = Some(alg.to_owned());
            }
        }
        if local == ns::node::RSA_OAEP_PARAMS {
            let text = document::node_text(child);
            let clean: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            if !clean.is_empty() {
                if let Ok(bytes) = base64::engine::general_purpose::STANDARD.decode(&clean) {
                    params.oaep_params = Some(bytes);
                }
            }
        }
    }
    params
}
