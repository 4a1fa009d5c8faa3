//! Builders for crafted PE images and Portable PDBs used by the integration tests.
//!
//! The builders emit the narrow (2-byte index) encodings throughout, which is valid for the
//! small images these tests construct.

#![allow(dead_code)]

use std::io::Write;

/// MVID shared by the crafted images.
pub const MVID: [u8; 16] = [
    0x8e, 0x90, 0x37, 0xd4, 0xe6, 0x65, 0x7c, 0x48, 0x97, 0x35, 0x7b, 0xdf, 0xf6, 0x99, 0xbe,
    0xa5,
];

/// PDB id stamped into crafted `#Pdb` streams.
pub const PDB_ID: [u8; 20] = [0xDD; 20];

/// C# compilation-options CDI kind.
pub const CDI_COMPILATION_OPTIONS: uguid::Guid = uguid::guid!("b5feec05-8cd0-4a83-96da-466284bb4bd8");
/// Metadata-references CDI kind.
pub const CDI_METADATA_REFERENCES: uguid::Guid = uguid::guid!("7e4d4708-096e-4c5c-aeda-cb10ba6a740d");
/// Embedded-source CDI kind.
pub const CDI_EMBEDDED_SOURCE: uguid::Guid = uguid::guid!("0e8a571b-6926-466e-b4ad-8ab04611f5fe");
/// Source-link CDI kind.
pub const CDI_SOURCE_LINK: uguid::Guid = uguid::guid!("cc110556-a091-4d38-9fec-25ab9a351a6a");
/// SHA-256 document hash algorithm.
pub const HASH_SHA256: uguid::Guid = uguid::guid!("8829d00f-11b8-4213-878b-770e8597ac16");
/// SHA-1 document hash algorithm.
pub const HASH_SHA1: uguid::Guid = uguid::guid!("ff1816ec-aa5e-4d10-87f7-6f4963833460");
/// C# document language.
pub const LANGUAGE_CSHARP: uguid::Guid = uguid::guid!("3f5162f8-07c6-11d3-9053-00c04fa302a1");

/// Raw-deflate compression, matching the embedded payload encodings.
pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder =
        flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Encodes a compilation-options blob from key/value pairs.
pub fn options_blob(pairs: &[(&str, &str)]) -> Vec<u8> {
    let mut blob = Vec::new();
    for (key, value) in pairs {
        blob.extend_from_slice(key.as_bytes());
        blob.push(0);
        blob.extend_from_slice(value.as_bytes());
        blob.push(0);
    }
    blob
}

/// Encodes one metadata-reference record.
pub fn reference_record(name: &str, aliases: &str, flags: u8, mvid: [u8; 16]) -> Vec<u8> {
    let mut record = Vec::new();
    record.extend_from_slice(name.as_bytes());
    record.push(0);
    record.extend_from_slice(aliases.as_bytes());
    record.push(0);
    record.push(flags);
    record.extend_from_slice(&0x5F5E_1000_i32.to_le_bytes());
    record.extend_from_slice(&0x0001_8000_i32.to_le_bytes());
    record.extend_from_slice(&mvid);
    record
}

/// Encodes an embedded-source CDI payload, raw or deflate-compressed.
pub fn embedded_source_blob(text: &str, compressed: bool) -> Vec<u8> {
    let mut blob = Vec::new();
    if compressed {
        blob.extend_from_slice(&(text.len() as i32).to_le_bytes());
        blob.extend_from_slice(&deflate(text.as_bytes()));
    } else {
        blob.extend_from_slice(&0i32.to_le_bytes());
        blob.extend_from_slice(text.as_bytes());
    }
    blob
}

// ================================================================================================
// Heap accumulation
// ================================================================================================

/// Accumulates the `#Strings`, `#Blob` and `#GUID` heaps of one metadata directory.
pub struct Heaps {
    pub strings: Vec<u8>,
    pub blobs: Vec<u8>,
    pub guids: Vec<u8>,
}

impl Heaps {
    pub fn new() -> Heaps {
        Heaps {
            strings: vec![0],
            blobs: vec![0],
            guids: Vec::new(),
        }
    }

    /// Adds a string, returning its heap offset.
    pub fn string(&mut self, value: &str) -> u32 {
        let offset = self.strings.len() as u32;
        self.strings.extend_from_slice(value.as_bytes());
        self.strings.push(0);
        offset
    }

    /// Adds a blob with its compressed length prefix, returning its heap offset.
    pub fn blob(&mut self, data: &[u8]) -> u32 {
        let offset = self.blobs.len() as u32;
        let len = data.len() as u32;
        if len < 0x80 {
            self.blobs.push(len as u8);
        } else if len < 0x4000 {
            self.blobs.push(0x80 | (len >> 8) as u8);
            self.blobs.push(len as u8);
        } else {
            self.blobs.push(0xC0 | (len >> 24) as u8);
            self.blobs.push((len >> 16) as u8);
            self.blobs.push((len >> 8) as u8);
            self.blobs.push(len as u8);
        }
        self.blobs.extend_from_slice(data);
        offset
    }

    /// Adds a GUID, returning its 1-based heap index.
    pub fn guid(&mut self, guid: [u8; 16]) -> u32 {
        self.guids.extend_from_slice(&guid);
        (self.guids.len() / 16) as u32
    }
}

/// Encodes a composite document name: separator `/` plus one blob part per path segment.
pub fn document_name_blob(heaps: &mut Heaps, path: &str) -> Vec<u8> {
    let mut name = vec![b'/'];
    for part in path.split('/') {
        let index = if part.is_empty() {
            0
        } else {
            heaps.blob(part.as_bytes())
        };
        // Compressed-uint encoding; test indexes stay below 0x80.
        assert!(index < 0x80);
        name.push(index as u8);
    }
    name
}

// ================================================================================================
// Metadata directory assembly
// ================================================================================================

fn align4(value: usize) -> usize {
    (value + 3) & !3
}

/// Assembles a metadata directory (root + stream directory + stream data).
pub fn build_metadata(streams: &[(&str, &[u8])]) -> Vec<u8> {
    const VERSION: &[u8] = b"v4.0.30319\0\0";

    let mut header_size = 16 + VERSION.len() + 4;
    for (name, _) in streams {
        header_size += 8 + align4(name.len() + 1);
    }

    let mut image = Vec::new();
    image.extend_from_slice(&0x424A_5342_u32.to_le_bytes());
    image.extend_from_slice(&1u16.to_le_bytes());
    image.extend_from_slice(&1u16.to_le_bytes());
    image.extend_from_slice(&0u32.to_le_bytes());
    image.extend_from_slice(&(VERSION.len() as u32).to_le_bytes());
    image.extend_from_slice(VERSION);
    image.extend_from_slice(&0u16.to_le_bytes());
    image.extend_from_slice(&(streams.len() as u16).to_le_bytes());

    let mut data_offset = align4(header_size);
    for (name, data) in streams {
        image.extend_from_slice(&(data_offset as u32).to_le_bytes());
        image.extend_from_slice(&(data.len() as u32).to_le_bytes());
        image.extend_from_slice(name.as_bytes());
        let padded = align4(name.len() + 1);
        image.resize(image.len() + padded - name.len(), 0);
        data_offset += align4(data.len());
    }

    assert_eq!(image.len(), header_size);
    image.resize(align4(image.len()), 0);

    for (_, data) in streams {
        image.extend_from_slice(data);
        image.resize(align4(image.len()), 0);
    }

    image
}

// ================================================================================================
// Portable PDB assembly
// ================================================================================================

/// One crafted document of a [`PdbSpec`].
pub struct DocSpec {
    pub path: String,
    pub hash_algorithm: uguid::Guid,
    pub hash: Vec<u8>,
    pub language: uguid::Guid,
    /// Raw embedded-source CDI payload, if the document embeds its text
    pub embedded_blob: Option<Vec<u8>>,
}

/// Specification of one crafted Portable PDB.
pub struct PdbSpec {
    /// Entry-point token recorded in the `#Pdb` stream, 0 for none
    pub entry_point: u32,
    /// Row counts of referenced type-system tables: (table id, rows)
    pub type_system_rows: Vec<(u8, u32)>,
    /// Documents in rid order
    pub documents: Vec<DocSpec>,
    /// Module-attached CDI records: (kind, payload)
    pub module_cdis: Vec<(uguid::Guid, Vec<u8>)>,
}

impl PdbSpec {
    /// A PDB whose module carries the given options blob and nothing else.
    pub fn with_options(options: Vec<u8>) -> PdbSpec {
        PdbSpec {
            entry_point: 0,
            type_system_rows: Vec::new(),
            documents: Vec::new(),
            module_cdis: vec![(CDI_COMPILATION_OPTIONS, options)],
        }
    }
}

/// Builds a complete standalone Portable PDB image.
pub fn build_portable_pdb(spec: &PdbSpec) -> Vec<u8> {
    let mut heaps = Heaps::new();

    // Document rows: (name, hash_algorithm, hash, language)
    let mut document_rows = Vec::new();
    for document in &spec.documents {
        let name_blob = document_name_blob(&mut heaps, &document.path);
        let name = heaps.blob(&name_blob);
        let algorithm = heaps.guid(document.hash_algorithm.to_bytes());
        let hash = heaps.blob(&document.hash);
        let language = heaps.guid(document.language.to_bytes());
        document_rows.push((name, algorithm, hash, language));
    }

    // CDI rows sorted by parent coded value: module (tag 7) precedes documents (tag 22).
    let mut cdi_rows = Vec::new();
    for (kind, payload) in &spec.module_cdis {
        let kind_index = heaps.guid(kind.to_bytes());
        let value = heaps.blob(payload);
        cdi_rows.push(((1u32 << 5) | 7, kind_index, value));
    }
    for (rid, document) in spec.documents.iter().enumerate() {
        if let Some(payload) = &document.embedded_blob {
            let kind_index = heaps.guid(CDI_EMBEDDED_SOURCE.to_bytes());
            let value = heaps.blob(payload);
            cdi_rows.push((((rid as u32 + 1) << 5) | 22, kind_index, value));
        }
    }

    // #Pdb stream
    let mut pdb_stream = PDB_ID.to_vec();
    pdb_stream.extend_from_slice(&spec.entry_point.to_le_bytes());
    let mut referenced: u64 = 0;
    for (table, _) in &spec.type_system_rows {
        referenced |= 1 << table;
    }
    pdb_stream.extend_from_slice(&referenced.to_le_bytes());
    let mut sorted_rows = spec.type_system_rows.clone();
    sorted_rows.sort_by_key(|(table, _)| *table);
    for (_, rows) in &sorted_rows {
        pdb_stream.extend_from_slice(&rows.to_le_bytes());
    }

    // #~ stream
    let mut valid: u64 = 0;
    if !document_rows.is_empty() {
        valid |= 1 << 0x30;
    }
    if !cdi_rows.is_empty() {
        valid |= 1 << 0x37;
    }

    let mut tables = Vec::new();
    tables.extend_from_slice(&0u32.to_le_bytes());
    tables.push(2); // major
    tables.push(0); // minor
    tables.push(0); // heap sizes: all narrow
    tables.push(1); // reserved
    tables.extend_from_slice(&valid.to_le_bytes());
    tables.extend_from_slice(&0u64.to_le_bytes()); // sorted
    if !document_rows.is_empty() {
        tables.extend_from_slice(&(document_rows.len() as u32).to_le_bytes());
    }
    if !cdi_rows.is_empty() {
        tables.extend_from_slice(&(cdi_rows.len() as u32).to_le_bytes());
    }
    for (name, algorithm, hash, language) in &document_rows {
        tables.extend_from_slice(&(*name as u16).to_le_bytes());
        tables.extend_from_slice(&(*algorithm as u16).to_le_bytes());
        tables.extend_from_slice(&(*hash as u16).to_le_bytes());
        tables.extend_from_slice(&(*language as u16).to_le_bytes());
    }
    for (parent, kind, value) in &cdi_rows {
        tables.extend_from_slice(&(*parent as u16).to_le_bytes());
        tables.extend_from_slice(&(*kind as u16).to_le_bytes());
        tables.extend_from_slice(&(*value as u16).to_le_bytes());
    }

    build_metadata(&[
        ("#Pdb", &pdb_stream),
        ("#~", &tables),
        ("#Strings", &heaps.strings),
        ("#GUID", &heaps.guids),
        ("#Blob", &heaps.blobs),
    ])
}

// ================================================================================================
// PE image assembly
// ================================================================================================

/// One crafted type definition.
pub struct TypeSpec {
    pub namespace: String,
    pub name: String,
    /// First method rid owned by this type
    pub method_list: u32,
}

/// One crafted manifest resource.
pub struct ResourceSpec {
    pub name: String,
    pub flags: u32,
    pub data: Vec<u8>,
    /// Overrides the row's data offset, for crafting corrupt tables
    pub raw_offset: Option<u32>,
}

impl ResourceSpec {
    /// A public embedded resource.
    pub fn public(name: &str, data: &[u8]) -> ResourceSpec {
        ResourceSpec {
            name: name.to_string(),
            flags: 0x1,
            data: data.to_vec(),
            raw_offset: None,
        }
    }
}

/// Specification of one crafted PE image.
pub struct PeSpec {
    /// Assembly name; `None` builds a module-only image
    pub assembly_name: Option<String>,
    pub module_name: String,
    /// Public key blob; empty means unsigned
    pub public_key: Vec<u8>,
    pub types: Vec<TypeSpec>,
    /// Method names in rid order
    pub methods: Vec<String>,
    pub resources: Vec<ResourceSpec>,
    /// A Portable PDB image to embed via the debug directory
    pub embedded_pdb: Option<Vec<u8>>,
    /// PDB identity GUID to record in a CodeView debug entry
    pub codeview_guid: Option<[u8; 16]>,
    pub high_entropy_va: bool,
}

impl PeSpec {
    /// A minimal console-app-shaped image: `ConsoleApp.Program` with one `Main` method.
    pub fn console_app(assembly_name: &str) -> PeSpec {
        PeSpec {
            assembly_name: Some(assembly_name.to_string()),
            module_name: format!("{assembly_name}.dll"),
            public_key: Vec::new(),
            types: vec![
                TypeSpec {
                    namespace: String::new(),
                    name: "<Module>".to_string(),
                    method_list: 1,
                },
                TypeSpec {
                    namespace: "ConsoleApp".to_string(),
                    name: "Program".to_string(),
                    method_list: 1,
                },
            ],
            methods: vec!["Main".to_string()],
            resources: Vec::new(),
            embedded_pdb: None,
            codeview_guid: None,
            high_entropy_va: false,
        }
    }
}

fn push_u16(buffer: &mut Vec<u8>, value: u16) {
    buffer.extend_from_slice(&value.to_le_bytes());
}

fn push_u32(buffer: &mut Vec<u8>, value: u32) {
    buffer.extend_from_slice(&value.to_le_bytes());
}

/// Builds a complete PE image goblin can parse, containing CLR metadata and optionally an
/// embedded PDB and manifest resources.
pub fn build_pe(spec: &PeSpec) -> Vec<u8> {
    const SECTION_RVA: u32 = 0x2000;
    const SECTION_FILE_OFFSET: u32 = 0x200;

    // ---- metadata heaps and tables ----
    let mut heaps = Heaps::new();
    let module_name = heaps.string(&spec.module_name);
    let mvid = heaps.guid(MVID);

    let type_rows: Vec<(u32, u32, u32)> = spec
        .types
        .iter()
        .map(|t| {
            let name = heaps.string(&t.name);
            let namespace = if t.namespace.is_empty() {
                0
            } else {
                heaps.string(&t.namespace)
            };
            (name, namespace, t.method_list)
        })
        .collect();

    let method_rows: Vec<u32> = spec.methods.iter().map(|name| heaps.string(name)).collect();

    let assembly_row = spec.assembly_name.as_ref().map(|name| {
        let key = if spec.public_key.is_empty() {
            0
        } else {
            heaps.blob(&spec.public_key)
        };
        (heaps.string(name), key)
    });

    // ---- resources directory ----
    let mut resources_dir = Vec::new();
    let mut resource_rows = Vec::new(); // (offset, flags, name)
    for resource in &spec.resources {
        let offset = resources_dir.len() as u32;
        push_u32(&mut resources_dir, resource.data.len() as u32);
        resources_dir.extend_from_slice(&resource.data);
        resources_dir.resize(align4(resources_dir.len()), 0);
        resource_rows.push((
            resource.raw_offset.unwrap_or(offset),
            resource.flags,
            heaps.string(&resource.name),
        ));
    }

    // ---- tables stream ----
    let mut valid: u64 = 1; // Module
    if !type_rows.is_empty() {
        valid |= 1 << 0x02;
    }
    if !method_rows.is_empty() {
        valid |= 1 << 0x06;
    }
    if assembly_row.is_some() {
        valid |= 1 << 0x20;
    }
    if !resource_rows.is_empty() {
        valid |= 1 << 0x28;
    }

    let mut tables = Vec::new();
    push_u32(&mut tables, 0);
    tables.push(2);
    tables.push(0);
    tables.push(0);
    tables.push(1);
    tables.extend_from_slice(&valid.to_le_bytes());
    tables.extend_from_slice(&0u64.to_le_bytes());

    push_u32(&mut tables, 1); // Module rows
    if !type_rows.is_empty() {
        push_u32(&mut tables, type_rows.len() as u32);
    }
    if !method_rows.is_empty() {
        push_u32(&mut tables, method_rows.len() as u32);
    }
    if assembly_row.is_some() {
        push_u32(&mut tables, 1);
    }
    if !resource_rows.is_empty() {
        push_u32(&mut tables, resource_rows.len() as u32);
    }

    // Module row
    push_u16(&mut tables, 0);
    push_u16(&mut tables, module_name as u16);
    push_u16(&mut tables, mvid as u16);
    push_u16(&mut tables, 0);
    push_u16(&mut tables, 0);

    // TypeDef rows
    for (name, namespace, method_list) in &type_rows {
        push_u32(&mut tables, 0); // flags
        push_u16(&mut tables, *name as u16);
        push_u16(&mut tables, *namespace as u16);
        push_u16(&mut tables, 0); // extends
        push_u16(&mut tables, 1); // field list
        push_u16(&mut tables, *method_list as u16);
    }

    // MethodDef rows
    for name in &method_rows {
        push_u32(&mut tables, 0); // rva
        push_u16(&mut tables, 0); // impl flags
        push_u16(&mut tables, 0x0016); // flags: public static hidebysig
        push_u16(&mut tables, *name as u16);
        push_u16(&mut tables, 0); // signature
        push_u16(&mut tables, 1); // param list
    }

    // Assembly row
    if let Some((name, key)) = assembly_row {
        push_u32(&mut tables, 0x8004); // SHA1
        push_u16(&mut tables, 1);
        push_u16(&mut tables, 0);
        push_u16(&mut tables, 0);
        push_u16(&mut tables, 0);
        push_u32(&mut tables, if key == 0 { 0 } else { 1 }); // flags: PublicKey
        push_u16(&mut tables, key as u16);
        push_u16(&mut tables, name as u16);
        push_u16(&mut tables, 0); // culture
    }

    // ManifestResource rows
    for (offset, flags, name) in &resource_rows {
        push_u32(&mut tables, *offset);
        push_u32(&mut tables, *flags);
        push_u16(&mut tables, *name as u16);
        push_u16(&mut tables, 0); // implementation: embedded
    }

    let metadata = build_metadata(&[
        ("#~", &tables),
        ("#Strings", &heaps.strings),
        ("#GUID", &heaps.guids),
        ("#Blob", &heaps.blobs),
    ]);

    // ---- section content layout (all offsets relative to SECTION_RVA) ----
    let resources_offset = 72usize; // right after the CLR header
    let metadata_offset = align4(resources_offset + resources_dir.len());

    let debug_offset = align4(metadata_offset + metadata.len());
    let mut debug_entries: Vec<(u32, Vec<u8>)> = Vec::new();
    if let Some(guid) = &spec.codeview_guid {
        let mut payload = Vec::new();
        push_u32(&mut payload, 0x5344_5352); // "RSDS"
        payload.extend_from_slice(guid);
        push_u32(&mut payload, 1); // age
        payload.extend_from_slice(b"app.pdb\0");
        debug_entries.push((2, payload));
    }
    if let Some(pdb) = &spec.embedded_pdb {
        let mut payload = Vec::new();
        push_u32(&mut payload, 0x4244_504D); // "MPDB"
        push_u32(&mut payload, pdb.len() as u32);
        payload.extend_from_slice(&deflate(pdb));
        debug_entries.push((17, payload));
    }

    let mut content = Vec::new();

    // CLR header
    push_u32(&mut content, 72);
    push_u16(&mut content, 2);
    push_u16(&mut content, 5);
    push_u32(&mut content, SECTION_RVA + metadata_offset as u32);
    push_u32(&mut content, metadata.len() as u32);
    push_u32(&mut content, 0x0000_0001); // ILONLY
    push_u32(&mut content, 0); // entry point token
    if resources_dir.is_empty() {
        push_u32(&mut content, 0);
        push_u32(&mut content, 0);
    } else {
        push_u32(&mut content, SECTION_RVA + resources_offset as u32);
        push_u32(&mut content, resources_dir.len() as u32);
    }
    push_u32(&mut content, 0); // strong name rva
    push_u32(&mut content, 0); // strong name size
    content.resize(content.len() + 32, 0); // reserved tail of the CLR header

    assert_eq!(content.len(), 72);
    content.extend_from_slice(&resources_dir);
    content.resize(metadata_offset, 0);
    content.extend_from_slice(&metadata);

    let mut debug_dir_size = 0u32;
    if !debug_entries.is_empty() {
        content.resize(debug_offset, 0);
        let mut payload_offset = debug_offset + 28 * debug_entries.len();

        for (entry_type, payload) in &debug_entries {
            push_u32(&mut content, 0); // characteristics
            push_u32(&mut content, 0); // timestamp
            push_u16(&mut content, 0x0100); // major: portable pdb
            push_u16(&mut content, 0x0100); // minor
            push_u32(&mut content, *entry_type);
            push_u32(&mut content, payload.len() as u32);
            push_u32(&mut content, SECTION_RVA + payload_offset as u32);
            push_u32(&mut content, SECTION_FILE_OFFSET + payload_offset as u32);
            payload_offset += payload.len();
        }
        for (_, payload) in &debug_entries {
            content.extend_from_slice(payload);
        }
        debug_dir_size = 28 * debug_entries.len() as u32;
    }

    let virtual_size = content.len() as u32;
    let raw_size = (virtual_size + 0x1FF) & !0x1FF;
    let size_of_image = (SECTION_RVA + virtual_size + 0xFFF) & !0xFFF;

    // ---- headers ----
    let mut image = Vec::new();

    // DOS header
    image.extend_from_slice(b"MZ");
    image.resize(0x3C, 0);
    push_u32(&mut image, 0x80);
    image.resize(0x80, 0);

    // PE signature + COFF header
    image.extend_from_slice(b"PE\0\0");
    push_u16(&mut image, 0x014C); // i386
    push_u16(&mut image, 1); // one section
    push_u32(&mut image, 0); // timestamp
    push_u32(&mut image, 0);
    push_u32(&mut image, 0);
    push_u16(&mut image, 224); // optional header size
    push_u16(&mut image, 0x2102); // executable | 32bit | dll

    // Optional header, PE32
    push_u16(&mut image, 0x010B);
    image.push(48);
    image.push(0);
    push_u32(&mut image, raw_size); // size of code
    push_u32(&mut image, 0);
    push_u32(&mut image, 0);
    push_u32(&mut image, 0); // entry point
    push_u32(&mut image, SECTION_RVA); // base of code
    push_u32(&mut image, 0); // base of data
    push_u32(&mut image, 0x0040_0000); // image base
    push_u32(&mut image, 0x1000); // section alignment
    push_u32(&mut image, 0x200); // file alignment
    push_u16(&mut image, 4); // os major
    push_u16(&mut image, 0);
    push_u16(&mut image, 0); // image version
    push_u16(&mut image, 0);
    push_u16(&mut image, 6); // subsystem major
    push_u16(&mut image, 0); // subsystem minor
    push_u32(&mut image, 0); // win32 version
    push_u32(&mut image, size_of_image);
    push_u32(&mut image, 0x200); // size of headers
    push_u32(&mut image, 0); // checksum
    push_u16(&mut image, 3); // console subsystem
    push_u16(&mut image, if spec.high_entropy_va { 0x0020 } else { 0 });
    push_u32(&mut image, 0x0010_0000); // stack reserve
    push_u32(&mut image, 0x1000); // stack commit
    push_u32(&mut image, 0x0010_0000); // heap reserve
    push_u32(&mut image, 0x1000); // heap commit
    push_u32(&mut image, 0); // loader flags
    push_u32(&mut image, 16); // directory count

    // Data directories
    for index in 0..16u32 {
        match index {
            6 if debug_dir_size != 0 => {
                push_u32(&mut image, SECTION_RVA + debug_offset as u32);
                push_u32(&mut image, debug_dir_size);
            }
            14 => {
                push_u32(&mut image, SECTION_RVA);
                push_u32(&mut image, 72);
            }
            _ => {
                push_u32(&mut image, 0);
                push_u32(&mut image, 0);
            }
        }
    }

    // Section header
    image.extend_from_slice(b".text\0\0\0");
    push_u32(&mut image, virtual_size);
    push_u32(&mut image, SECTION_RVA);
    push_u32(&mut image, raw_size);
    push_u32(&mut image, SECTION_FILE_OFFSET);
    push_u32(&mut image, 0);
    push_u32(&mut image, 0);
    push_u16(&mut image, 0);
    push_u16(&mut image, 0);
    push_u32(&mut image, 0x6000_0020); // code | execute | read

    image.resize(SECTION_FILE_OFFSET as usize, 0);
    image.extend_from_slice(&content);
    image.resize(SECTION_FILE_OFFSET as usize + raw_size as usize, 0);

    image
}
