use std::process::Command;

use lopdf::{Document, Object, Stream, dictionary};

/// One-page PDF drawn in a non-embedded, non-core font with no `Widths` array.
fn arial_pdf(lines: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.4");
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Arial",
    });

    let mut content = String::new();
    for (row, line) in lines.iter().enumerate() {
        let y = 700 - (row as i32) * 20;
        content.push_str(&format!("BT /F1 12 Tf 72 {y} Td ({line}) Tj ET\n"));
    }
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        },
    });
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    });
    if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
        dict.set("Parent", pages_id);
    }
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("serialize pdf");
    buf
}

#[test]
fn extract_prints_only_the_document_text_on_stdout() {
    let lines = [
        "Lipid Panel",
        "LDL Cholesterol 162 mg/dL above the desirable range",
    ];
    let dir = std::env::temp_dir().join(format!("medlens-cli-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("temp dir");
    let pdf_path = dir.join("lipids.pdf");
    std::fs::write(&pdf_path, arial_pdf(&lines)).expect("write pdf");

    let output = Command::new(env!("CARGO_BIN_EXE_medlens-cli"))
        .current_dir(&dir)
        .env("RUST_LOG", "debug")
        .env("MEDLENS_LOG_FILE", dir.join("medlens.log"))
        .arg("extract")
        .arg(&pdf_path)
        .output()
        .expect("run medlens-cli");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "extract failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(stdout, format!("{}\n", lines.join("\n")));

    let _ = std::fs::remove_dir_all(&dir);
}
