#![forbid(unsafe_code)]

//! XML-Enc decryption.
//!
//! Parses an `<enc:EncryptedData>` element, resolves method and key,
//! recovers the plaintext from `CipherValue` or `CipherReference`, and
//! splices it back into the document when the `Type` attribute asks
//! for it.

use crate::context::EncContext;
use crate::encrypt::find_encrypted_data;
use crate::result::EncResult;
use crate::state;
use roxmltree::Node;
use solna_core::{ns, Error, Result};
use solna_keys::Key;
use solna_transforms::base64_transform::Base64Decode;
use solna_transforms::membuf::MemBuf;
use solna_transforms::reference::ReferenceState;
use solna_xml::{document, edit, Edit};

/// Decrypt the first `EncryptedData` element of a document.
///
/// With `Type="…#Element"` the element is replaced by the decrypted
/// subtree; with `Type="…#Content"` the decrypted children are spliced
/// in its place; any other `Type` leaves the document alone and only
/// `buffer` carries the plaintext.  `ctx.ignore_type` suppresses
/// splicing entirely.
pub fn decrypt(ctx: &EncContext, key: Option<&Key>, xml: &str) -> Result<EncResult> {
    let doc = document::parse(xml)?;
    let enc_node = find_encrypted_data(&doc)?;
    let id_map = document::build_id_map(&doc, &ctx.id_attrs);

    let mut result = EncResult::new(false);
    let mut state = state::read_encrypted_data(ctx, xml, enc_node, false, key, &mut result)?;

    let cipher_node = state
        .cipher_data
        .and_then(|id| doc.get_node(id))
        .ok_or_else(|| Error::NodeNotFound(ns::node::CIPHER_DATA.into()))?;

    let plaintext = match document::first_element_child(cipher_node) {
        Some(child) if document::is_named(child, ns::ENC, ns::node::CIPHER_VALUE) => {
            reject_trailing(child)?;
            read_cipher_value(&mut state, child)?
        }
        Some(child) if document::is_named(child, ns::ENC, ns::node::CIPHER_REFERENCE) => {
            reject_trailing(child)?;
            read_cipher_reference(&mut state, &doc, &id_map, child)?
        }
        Some(child) => return Err(Error::InvalidNode(child.tag_name().name().to_owned())),
        None => {
            return Err(Error::NodeNotFound(
                "CipherValue or CipherReference".into(),
            ))
        }
    };

    // splice the plaintext back into the document as the Type demands
    result.document = if ctx.ignore_type {
        xml.to_owned()
    } else {
        match result.enc_type.as_deref() {
            Some(ns::ENC_TYPE_ELEMENT) | Some(ns::ENC_TYPE_CONTENT) => {
                // a #Content plaintext is a sequence of children, so
                // replacing the element's range splices the children in
                // place; #Element carries exactly one element subtree
                let spliced = splice(xml, enc_node, &plaintext)?;
                result.replaced = true;
                spliced
            }
            _ => xml.to_owned(),
        }
    };
    result.buffer = Some(plaintext);
    Ok(result)
}

fn reject_trailing(node: Node<'_, '_>) -> Result<()> {
    match document::next_element_sibling(node) {
        Some(extra) => Err(Error::InvalidNode(extra.tag_name().name().to_owned())),
        None => Ok(()),
    }
}

/// The inline path: base64-decode the node text through the cipher
/// into a memory sink.
fn read_cipher_value(state: &mut state::EncState, cipher_value: Node<'_, '_>) -> Result<Vec<u8>> {
    state.pipeline.prepend(Box::new(Base64Decode::new()))?;
    state.pipeline.append(Box::new(MemBuf::new()))?;

    let content = document::node_text(cipher_value);
    state.pipeline.write(content.as_bytes())?;
    state.pipeline.flush()?;
    state
        .pipeline
        .take_sink_buffer()
        .ok_or_else(|| Error::Transform("pipeline has no sink buffer".into()))
}

/// The referenced path: fetch the URI, run the declared transforms,
/// then hand the cipher pipeline over to the reference state one
/// transform at a time.
fn read_cipher_reference(
    state: &mut state::EncState,
    doc: &roxmltree::Document<'_>,
    id_map: &std::collections::HashMap<String, roxmltree::NodeId>,
    cipher_reference: Node<'_, '_>,
) -> Result<Vec<u8>> {
    let uri = cipher_reference
        .attribute(ns::attr::URI)
        .ok_or_else(|| Error::MissingAttribute("URI on CipherReference".into()))?;
    let mut reference = ReferenceState::open(doc, id_map, uri)?;

    let mut cur = document::first_element_child(cipher_reference);
    if let Some(node) = cur {
        if document::is_named(node, ns::ENC, ns::node::TRANSFORMS) {
            reference.apply_declared(doc, id_map, node)?;
            cur = document::next_element_sibling(node);
        }
    }
    if let Some(extra) = cur {
        return Err(Error::InvalidNode(extra.tag_name().name().to_owned()));
    }

    while let Some(transform) = state.pipeline.pop_front() {
        reference.apply(transform)?;
    }
    Ok(reference.into_binary())
}

/// Replace the `EncryptedData` element with the plaintext fragment and
/// validate that the result still parses.
fn splice(xml: &str, enc_node: Node<'_, '_>, plaintext: &[u8]) -> Result<String> {
    let fragment = std::str::from_utf8(plaintext)
        .map_err(|e| Error::XmlParse(format!("plaintext is not UTF-8 XML: {e}")))?;
    let spliced = edit::apply_one(xml, Edit::replace_node(enc_node, fragment))?;
    document::parse(&spliced)?;
    Ok(spliced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encrypt::{encrypt_memory, encrypt_xml_node, Target};
    use crate::template;
    use solna_core::algorithm;
    use solna_keys::{KeyData, KeyUsage, KeysManager};

    fn context_with_aes(bytes: Vec<u8>) -> EncContext {
        let mut manager = KeysManager::new();
        manager.add_key(Key::new(KeyData::Aes(bytes), KeyUsage::Any));
        EncContext::new(manager)
    }

    fn template_with(method: &str, enc_type: Option<&str>) -> String {
        let template = template::create_encrypted_data(None, enc_type, None, None);
        let template = template::add_encryption_method(&template, method).unwrap();
        template::add_cipher_value(&template).unwrap()
    }

    // AES-128-CBC memory round trip with a directly supplied key
    #[test]
    fn aes128_cbc_memory_round_trip() {
        let ctx = context_with_aes(vec![0u8; 16]);
        let key = Key::new(KeyData::Aes(vec![0u8; 16]), KeyUsage::Any);
        let template = template_with(algorithm::AES128_CBC, None);

        let encrypted = encrypt_memory(&ctx, Some(&key), &template, b"hello world").unwrap();
        assert!(encrypted.document.contains("CipherValue"));

        let decrypted = decrypt(&ctx, Some(&key), &encrypted.document).unwrap();
        assert_eq!(decrypted.buffer.as_deref(), Some(b"hello world".as_slice()));
        assert!(!decrypted.replaced);
    }

    // byte round trips across every supported symmetric method
    #[test]
    fn round_trip_all_methods() {
        let methods: &[(&str, usize)] = &[
            (algorithm::AES128_CBC, 16),
            (algorithm::AES192_CBC, 24),
            (algorithm::AES256_CBC, 32),
            (algorithm::AES128_GCM, 16),
            (algorithm::AES192_GCM, 24),
            (algorithm::AES256_GCM, 32),
            (algorithm::TRIPLEDES_CBC, 24),
        ];
        let large: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
        let payloads: &[&[u8]] = &[
            b"",
            b"A",
            b"hello world",
            b"a noticeably longer payload that spans multiple cipher blocks....",
            &large,
        ];
        for &(method, key_size) in methods {
            let ctx = context_with_aes(vec![0u8; 16]);
            let key_data: Vec<u8> = (0..key_size).map(|i| i as u8).collect();
            let key = if method == algorithm::TRIPLEDES_CBC {
                Key::new(KeyData::Des3(key_data), KeyUsage::Any)
            } else {
                Key::new(KeyData::Aes(key_data), KeyUsage::Any)
            };
            let template = template_with(method, None);
            for &payload in payloads {
                let encrypted = encrypt_memory(&ctx, Some(&key), &template, payload).unwrap();
                let decrypted = decrypt(&ctx, Some(&key), &encrypted.document).unwrap();
                assert_eq!(decrypted.buffer.as_deref(), Some(payload), "{method}");
            }
        }
    }

    // URI cipher-reference decrypt: base64 file content with a declared
    // base64 transform, and raw file content with no transforms
    #[test]
    fn cipher_reference_from_file() {
        let ctx = context_with_aes(vec![0u8; 16]);
        let key = Key::new(KeyData::Aes(vec![0u8; 16]), KeyUsage::Any);

        // produce iv||ciphertext via a normal encrypt
        let template = template_with(algorithm::AES128_CBC, None);
        let encrypted = encrypt_memory(&ctx, Some(&key), &template, b"hello world").unwrap();
        let base64_text = encrypted.buffer.unwrap();

        let path = std::env::temp_dir().join("solna-cipher-reference-test.bin");
        std::fs::write(&path, &base64_text).unwrap();

        let reference_template = template::create_encrypted_data(None, None, None, None);
        let reference_template =
            template::add_encryption_method(&reference_template, algorithm::AES128_CBC).unwrap();
        let reference_template =
            template::add_cipher_reference(&reference_template, path.to_str()).unwrap();
        let reference_template = template::add_cipher_reference_transform(
            &reference_template,
            algorithm::BASE64,
        )
        .unwrap();

        let decrypted = decrypt(&ctx, Some(&key), &reference_template).unwrap();
        assert_eq!(decrypted.buffer.as_deref(), Some(b"hello world".as_slice()));

        // raw bytes, no declared transforms
        use base64::Engine;
        let raw = base64::engine::general_purpose::STANDARD
            .decode(String::from_utf8(base64_text).unwrap())
            .unwrap();
        std::fs::write(&path, &raw).unwrap();
        let raw_template = template::create_encrypted_data(None, None, None, None);
        let raw_template =
            template::add_encryption_method(&raw_template, algorithm::AES128_CBC).unwrap();
        let raw_template = template::add_cipher_reference(&raw_template, path.to_str()).unwrap();
        let decrypted = decrypt(&ctx, Some(&key), &raw_template).unwrap();
        assert_eq!(decrypted.buffer.as_deref(), Some(b"hello world".as_slice()));

        std::fs::remove_file(&path).ok();
    }

    // element splice round trip: the document canonicalizes back
    #[test]
    fn element_splice_round_trip() {
        let ctx = context_with_aes(vec![7u8; 16]);
        let original = "<root><secret>42</secret></root>";
        let template = template_with(algorithm::AES128_CBC, Some(ns::ENC_TYPE_ELEMENT));

        let encrypted = encrypt_xml_node(
            &ctx,
            None,
            original,
            Target::Element {
                ns: None,
                local: "secret",
            },
            &template,
        )
        .unwrap();
        assert!(encrypted.replaced);
        assert!(encrypted.document.contains("EncryptedData"));
        assert!(!encrypted.document.contains("<secret>"));

        let decrypted = decrypt(&ctx, None, &encrypted.document).unwrap();
        assert!(decrypted.replaced);
        assert_eq!(decrypted.document, original);
    }

    // content splice round trip: children restored inside the element
    #[test]
    fn content_splice_round_trip() {
        let ctx = context_with_aes(vec![7u8; 16]);
        let original = "<root><secret><a>1</a><b>2</b></secret></root>";
        let template = template_with(algorithm::AES128_CBC, Some(ns::ENC_TYPE_CONTENT));

        let encrypted = encrypt_xml_node(
            &ctx,
            None,
            original,
            Target::Element {
                ns: None,
                local: "secret",
            },
            &template,
        )
        .unwrap();
        assert!(encrypted.replaced);
        // the EncryptedData sits inside the still-present element
        assert!(encrypted.document.contains("<secret>"));
        assert!(!encrypted.document.contains("<a>1</a>"));

        let decrypted = decrypt(&ctx, None, &encrypted.document).unwrap();
        assert!(decrypted.replaced);
        assert_eq!(decrypted.document, original);
    }

    // unknown Type: plaintext is opaque bytes, no splicing
    #[test]
    fn opaque_type_is_not_spliced() {
        let ctx = context_with_aes(vec![3u8; 16]);
        let template = template_with(algorithm::AES128_CBC, Some("urn:example:opaque"));
        let encrypted = encrypt_memory(&ctx, None, &template, b"just bytes").unwrap();

        let decrypted = decrypt(&ctx, None, &encrypted.document).unwrap();
        assert!(!decrypted.replaced);
        assert_eq!(decrypted.document, encrypted.document);
        assert_eq!(decrypted.buffer.as_deref(), Some(b"just bytes".as_slice()));
    }

    // ignore_type suppresses splicing even for #Element
    #[test]
    fn ignore_type_suppresses_splice() {
        let mut ctx = context_with_aes(vec![3u8; 16]);
        let original = "<root><secret>42</secret></root>";
        let template = template_with(algorithm::AES128_CBC, Some(ns::ENC_TYPE_ELEMENT));
        let encrypted = encrypt_xml_node(
            &ctx,
            None,
            original,
            Target::Element {
                ns: None,
                local: "secret",
            },
            &template,
        )
        .unwrap();

        ctx.ignore_type = true;
        let decrypted = decrypt(&ctx, None, &encrypted.document).unwrap();
        assert!(!decrypted.replaced);
        assert_eq!(decrypted.document, encrypted.document);
    }

    // missing method and no context default
    #[test]
    fn missing_method_is_invalid_data() {
        let ctx = context_with_aes(vec![0u8; 16]);
        let template = template::create_encrypted_data(None, None, None, None);
        let template = template::add_cipher_value(&template).unwrap();
        let err = decrypt(&ctx, None, &template).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    // wrong key: the cipher reports a transform failure, no buffer
    #[test]
    fn wrong_key_is_transform_failure() {
        let ctx = context_with_aes(vec![0u8; 16]);
        let right = Key::new(KeyData::Aes(vec![0u8; 16]), KeyUsage::Any);
        let wrong = Key::new(KeyData::Aes(vec![1u8; 16]), KeyUsage::Any);
        // GCM authenticates, so the wrong key always fails
        let template = template_with(algorithm::AES128_GCM, None);
        let encrypted = encrypt_memory(&ctx, Some(&right), &template, b"hello world").unwrap();

        let err = decrypt(&ctx, Some(&wrong), &encrypted.document).unwrap_err();
        assert!(matches!(err, Error::Transform(_)));
    }

    // strict child order: KeyInfo before EncryptionMethod fails even
    // when a default method exists
    #[test]
    fn swapped_key_info_order_is_rejected() {
        let mut ctx = context_with_aes(vec![0u8; 16]);
        ctx.default_method = Some(algorithm::AES128_CBC.to_owned());
        let xml = concat!(
            r#"<EncryptedData xmlns="http://www.w3.org/2001/04/xmlenc#">"#,
            r#"<KeyInfo xmlns="http://www.w3.org/2000/09/xmldsig#"/>"#,
            r#"<EncryptionMethod Algorithm="http://www.w3.org/2001/04/xmlenc#aes128-cbc"/>"#,
            r#"<CipherData><CipherValue>AAAA</CipherValue></CipherData>"#,
            r#"</EncryptedData>"#
        );
        let err = decrypt(&ctx, None, xml).unwrap_err();
        assert!(matches!(err, Error::InvalidNode(_)));
    }

    // same-document CipherReference via fragment URI and XPath
    #[test]
    fn cipher_reference_same_document_fragment() {
        let ctx = context_with_aes(vec![0u8; 16]);
        let key = Key::new(KeyData::Aes(vec![0u8; 16]), KeyUsage::Any);
        let template = template_with(algorithm::AES128_CBC, None);
        let encrypted = encrypt_memory(&ctx, Some(&key), &template, b"carried inline").unwrap();
        let base64_text = String::from_utf8(encrypted.buffer.unwrap()).unwrap();

        let xml = format!(
            concat!(
                r#"<root><Payload Id="payload">{}</Payload>"#,
                r#"<EncryptedData xmlns="http://www.w3.org/2001/04/xmlenc#">"#,
                r#"<EncryptionMethod Algorithm="http://www.w3.org/2001/04/xmlenc#aes128-cbc"/>"#,
                r#"<CipherData><CipherReference URI="#,
                "\"#payload\">",
                r#"<Transforms><Transform xmlns="http://www.w3.org/2000/09/xmldsig#" "#,
                r#"Algorithm="http://www.w3.org/2000/09/xmldsig#base64"/></Transforms>"#,
                r#"</CipherReference></CipherData></EncryptedData></root>"#
            ),
            base64_text
        );
        let decrypted = decrypt(&ctx, Some(&key), &xml).unwrap();
        assert_eq!(
            decrypted.buffer.as_deref(),
            Some(b"carried inline".as_slice())
        );
    }

    // RSA-OAEP as the EncryptionMethod for a small payload
    #[test]
    fn rsa_oaep_round_trip() {
        let mut rng = rand::thread_rng();
        let private = rsa::RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let public = private.to_public_key();
        let key = Key::new(
            KeyData::Rsa {
                private: Some(private),
                public,
            },
            KeyUsage::Any,
        );
        let ctx = EncContext::new(KeysManager::new());
        let template = template_with(algorithm::RSA_OAEP, None);

        let encrypted = encrypt_memory(&ctx, Some(&key), &template, b"session key").unwrap();
        let decrypted = decrypt(&ctx, Some(&key), &encrypted.document).unwrap();
        assert_eq!(decrypted.buffer.as_deref(), Some(b"session key".as_slice()));
    }

    #[test]
    fn decrypt_dump_reports_direction() {
        let ctx = context_with_aes(vec![0u8; 16]);
        let template = template_with(algorithm::AES128_CBC, None);
        let encrypted = encrypt_memory(&ctx, None, &template, b"dump me").unwrap();
        let decrypted = decrypt(&ctx, None, &encrypted.document).unwrap();

        let mut out = Vec::new();
        decrypted.dump(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("= DECRYPTION RESULT (not-replaced)"));
        assert!(text.contains("dump me"));
    }
}
