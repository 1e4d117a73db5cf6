//! Builds small real PDFs for end-to-end tests.

#![allow(dead_code)]

use lopdf::{
    dictionary, Document, EncryptionState, EncryptionVersion, Object, Permissions, Stream,
    StringFormat,
};

/// A one-page, unencrypted PDF with the given text.
pub fn simple_pdf(text: &str) -> Vec<u8> {
    save(simple_document(text))
}

fn simple_document(text: &str) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let content = format!("BT /F1 14 Tf 72 720 Td ({}) Tj ET", text);
    let content_id = doc.add_object(Object::Stream(Stream::new(
        dictionary! {},
        content.into_bytes(),
    )));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        "Contents" => content_id,
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set(
        "ID",
        Object::Array(vec![
            Object::String(b"0123456789abcdef".to_vec(), StringFormat::Literal),
            Object::String(b"fedcba9876543210".to_vec(), StringFormat::Literal),
        ]),
    );
    doc
}

/// Same page as [`simple_pdf`], RC4-128 encrypted with `user_password`.
pub fn encrypted_pdf(text: &str, user_password: &str) -> Vec<u8> {
    let mut doc = simple_document(text);
    let state = EncryptionState::try_from(EncryptionVersion::V2 {
        document: &doc,
        owner_password: "owner-password",
        user_password,
        key_length: 128,
        permissions: Permissions::all(),
    })
    .expect("Failed to set up encryption");
    doc.encrypt(&state).expect("Failed to encrypt PDF");
    save(doc)
}

fn save(mut doc: Document) -> Vec<u8> {
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to serialize PDF");
    bytes
}
