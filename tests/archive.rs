mod common;

use std::io::{Cursor, Read};

use constancia_fill::{
    ArtifactSink, BatchOptions, DirectorySink, Job, Output, RenderedArtifact, ZipSink, entry_names,
    generate,
};

fn artifact(row: usize, name: &str) -> RenderedArtifact {
    RenderedArtifact {
        row,
        name: name.to_string(),
        bytes: format!("%PDF-1.7 {name}").into_bytes(),
    }
}

fn read_zip(bytes: Vec<u8>) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            file.read_to_end(&mut data).unwrap();
            (file.name().to_string(), data)
        })
        .collect()
}

#[test]
fn entry_names_follow_display_names() {
    let names = entry_names(&[artifact(0, "Ana"), artifact(1, "José Núñez")]);
    assert_eq!(names, ["pdf_Ana.pdf", "pdf_José Núñez.pdf"]);
}

#[test]
fn repeated_names_get_a_suffix() {
    let names = entry_names(&[
        artifact(0, "Ana"),
        artifact(1, "Luis"),
        artifact(2, "Ana"),
        artifact(3, "ANA"),
    ]);
    assert_eq!(
        names,
        ["pdf_Ana.pdf", "pdf_Luis.pdf", "pdf_Ana_2.pdf", "pdf_ANA_3.pdf"]
    );
}

#[test]
fn path_characters_are_replaced() {
    let names = entry_names(&[artifact(0, "a/b\\c:d"), artifact(1, "../secreto")]);
    assert_eq!(names, ["pdf_a_b_c_d.pdf", "pdf__secreto.pdf"]);
}

#[test]
fn unusable_name_falls_back_to_position() {
    let names = entry_names(&[artifact(0, "Ana"), artifact(1, "..."), artifact(2, "  ")]);
    assert_eq!(names, ["pdf_Ana.pdf", "pdf_2.pdf", "pdf_3.pdf"]);
}

#[test]
fn zip_sink_writes_every_artifact_in_order() {
    let artifacts = [artifact(0, "Ana"), artifact(2, "Luis"), artifact(3, "Ana")];
    let mut sink = ZipSink::new(Cursor::new(Vec::new()));
    let names = sink.deliver(&artifacts).unwrap();

    let entries = read_zip(sink.into_inner().into_inner());
    let entry_names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(entry_names, names);
    assert_eq!(entry_names, ["pdf_Ana.pdf", "pdf_Luis.pdf", "pdf_Ana_2.pdf"]);
    for ((_, data), artifact) in entries.iter().zip(&artifacts) {
        assert_eq!(data, &artifact.bytes);
    }
}

#[test]
fn zip_output_is_reproducible() {
    let artifacts = [artifact(0, "Ana"), artifact(1, "Luis")];
    let build = || {
        let mut sink = ZipSink::new(Cursor::new(Vec::new()));
        sink.deliver(&artifacts).unwrap();
        sink.into_inner().into_inner()
    };
    assert_eq!(build(), build());
}

#[test]
fn empty_batch_is_a_valid_empty_archive() {
    let mut sink = ZipSink::new(Cursor::new(Vec::new()));
    assert!(sink.deliver(&[]).unwrap().is_empty());
    assert!(read_zip(sink.into_inner().into_inner()).is_empty());
}

#[test]
fn directory_sink_writes_loose_files() {
    let dir = common::scratch_dir("dir-sink").join("salida");
    let artifacts = [artifact(0, "Ana"), artifact(1, "Luis")];
    let names = DirectorySink::new(&dir).deliver(&artifacts).unwrap();

    for (name, artifact) in names.iter().zip(&artifacts) {
        assert_eq!(std::fs::read(dir.join(name)).unwrap(), artifact.bytes);
    }
}

#[test]
fn generate_writes_one_document_per_named_row() {
    let _ = env_logger::try_init();
    let dir = common::scratch_dir("generate");
    let csv = dir.join("alumnos.csv");
    std::fs::write(
        &csv,
        "Nombre,NoDeCuenta,Responsabilidad,RecomendariaAlAlumno\n\
         Ana,123,6,1\n\
         ,456,5,0\n\
         Luis,789,3,0\n",
    )
    .unwrap();
    let template = dir.join("plantilla.pdf");
    std::fs::write(&template, common::template_pdf(1, common::LETTER)).unwrap();
    let output = dir.join("todos.zip");

    let job = Job {
        csv,
        template,
        output: Output::Archive(output.clone()),
        layout: common::layout(),
        font: None,
        delimiter: b',',
        options: BatchOptions::default(),
    };
    let summary = generate(&job).unwrap();

    assert_eq!(
        summary.written,
        [
            ("Ana".to_string(), "pdf_Ana.pdf".to_string()),
            ("Luis".to_string(), "pdf_Luis.pdf".to_string()),
        ]
    );
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].row, 1);
    assert_eq!(summary.skipped[0].line, Some(3));
    assert!(summary.errors.is_empty());

    let entries = read_zip(std::fs::read(&output).unwrap());
    assert_eq!(entries.len(), 2);
    let (_, ana) = &entries[0];
    assert_eq!(common::page_count(ana), 2);
    let texts: Vec<String> = common::stamps(ana)
        .into_iter()
        .filter(|s| s.page == 1)
        .map(|s| s.text())
        .collect();
    assert_eq!(texts, ["Ana", "123", "x", "x"]);
}

#[test]
fn generate_rejects_csv_without_display_column() {
    let dir = common::scratch_dir("generate-invalid");
    let csv = dir.join("alumnos.csv");
    std::fs::write(&csv, "Alumno\nAna\n").unwrap();
    let template = dir.join("plantilla.pdf");
    std::fs::write(&template, common::template_pdf(2, common::LETTER)).unwrap();
    let output = dir.join("out");

    let job = Job {
        csv,
        template,
        output: Output::Directory(output.clone()),
        layout: common::layout(),
        font: None,
        delimiter: b',',
        options: BatchOptions::default(),
    };
    let err = generate(&job).unwrap_err();
    assert!(matches!(err, constancia_fill::Error::InputValidation(_)), "got {err:?}");
    assert!(!output.exists(), "nothing is written for an invalid input");
}
