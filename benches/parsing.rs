use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use dotrebuild::rebuild::options::OptionsTable;
use dotrebuild::rebuild::references::parse_metadata_references;
use dotrebuild::rebuild::sources::{decode_embedded_source, HashAlgorithm};

fn options_blob() -> Vec<u8> {
    let pairs = [
        ("version", "2"),
        ("compiler-version", "4.0.1-1.22076.8 (6db4c97b)"),
        ("language", "C#"),
        ("language-version", "10.0"),
        ("optimization", "release"),
        ("platform", "AnyCpu"),
        ("output-kind", "ConsoleApplication"),
        ("source-file-count", "64"),
        ("define", "TRACE,RELEASE,NET6_0"),
        ("nullable", "Enable"),
        ("checked", "false"),
        ("unsafe", "false"),
    ];

    let mut blob = Vec::new();
    for (key, value) in pairs {
        blob.extend_from_slice(key.as_bytes());
        blob.push(0);
        blob.extend_from_slice(value.as_bytes());
        blob.push(0);
    }
    blob
}

fn reference_blob() -> Vec<u8> {
    let mut blob = Vec::new();
    for index in 0..128 {
        blob.extend_from_slice(format!("System.Dep{index}.dll").as_bytes());
        blob.push(0);
        blob.push(0); // no aliases
        blob.push(0x01);
        blob.extend_from_slice(&(index as i32).to_le_bytes());
        blob.extend_from_slice(&0x0002_0000_i32.to_le_bytes());
        blob.extend_from_slice(&[index as u8; 16]);
    }
    blob
}

fn embedded_source_raw() -> Vec<u8> {
    let text = "class Program\n{\n    static void Main()\n    {\n    }\n}\n".repeat(64);
    let mut blob = 0i32.to_le_bytes().to_vec();
    blob.extend_from_slice(text.as_bytes());
    blob
}

fn bench_parsing(c: &mut Criterion) {
    let options = options_blob();
    c.bench_function("options_table_parse", |b| {
        b.iter(|| OptionsTable::parse(black_box(&options)).unwrap())
    });

    let table = OptionsTable::parse(&options).unwrap();
    c.bench_function("options_table_lookup", |b| {
        b.iter(|| table.try_get_unique(black_box("language-version")))
    });

    let references = reference_blob();
    c.bench_function("metadata_references_parse", |b| {
        b.iter(|| parse_metadata_references(black_box(&references)).unwrap())
    });

    let embedded = embedded_source_raw();
    c.bench_function("embedded_source_decode_raw", |b| {
        b.iter(|| decode_embedded_source(black_box(&embedded), HashAlgorithm::Sha256).unwrap())
    });
}

criterion_group!(benches, bench_parsing);
criterion_main!(benches);
