//! Tables Stream (`#~`) for .NET Metadata
//!
//! Provides parsing of the compressed metadata tables stream shared by .NET images and
//! Portable PDBs. The stream starts with a header describing heap index widths and the row
//! counts of every present table, followed by the packed table rows themselves.
//!
//! Row sizes depend on the row counts of *all* tables (simple and coded indexes shrink to
//! two bytes when every referenced table is small), so this module computes the complete
//! sizing picture before any row can be located. For Portable PDB files, the row counts of
//! type-system tables live in the `#Pdb` stream rather than the PDB's own `#~` stream; they
//! are supplied here as external row counts and participate in index sizing only.
//!
//! # Key Components
//!
//! - [`TableId`] - Identifier for every ECMA-335 and Portable PDB table
//! - [`CodedIndexKind`] - The coded-index families and their tag layouts
//! - [`TableInfo`] - Row counts plus heap flags; answers all sizing questions
//! - [`TablesHeader`] - The parsed stream: locates tables and reads typed rows
//!
//! # References
//!
//! - [ECMA-335 II.24.2.6](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)
//! - [Portable PDB Format](https://github.com/dotnet/runtime/blob/main/docs/design/specs/PortablePdb-Metadata.md)

use crate::{
    file::io::read_le_at,
    metadata::tables::RowRead,
    Error::OutOfBounds,
    Result,
};

/// Identifier of a metadata table within the tables stream.
///
/// The discriminant is the table number as it appears in the `Valid` bitvector and in
/// metadata token high bytes. Tables `0x30` and above are Portable PDB tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum TableId {
    /// Module table
    Module = 0x00,
    /// TypeRef table
    TypeRef = 0x01,
    /// TypeDef table
    TypeDef = 0x02,
    /// FieldPtr table
    FieldPtr = 0x03,
    /// Field table
    Field = 0x04,
    /// MethodPtr table
    MethodPtr = 0x05,
    /// MethodDef table
    MethodDef = 0x06,
    /// ParamPtr table
    ParamPtr = 0x07,
    /// Param table
    Param = 0x08,
    /// InterfaceImpl table
    InterfaceImpl = 0x09,
    /// MemberRef table
    MemberRef = 0x0A,
    /// Constant table
    Constant = 0x0B,
    /// CustomAttribute table
    CustomAttribute = 0x0C,
    /// FieldMarshal table
    FieldMarshal = 0x0D,
    /// DeclSecurity table
    DeclSecurity = 0x0E,
    /// ClassLayout table
    ClassLayout = 0x0F,
    /// FieldLayout table
    FieldLayout = 0x10,
    /// StandAloneSig table
    StandAloneSig = 0x11,
    /// EventMap table
    EventMap = 0x12,
    /// EventPtr table
    EventPtr = 0x13,
    /// Event table
    Event = 0x14,
    /// PropertyMap table
    PropertyMap = 0x15,
    /// PropertyPtr table
    PropertyPtr = 0x16,
    /// Property table
    Property = 0x17,
    /// MethodSemantics table
    MethodSemantics = 0x18,
    /// MethodImpl table
    MethodImpl = 0x19,
    /// ModuleRef table
    ModuleRef = 0x1A,
    /// TypeSpec table
    TypeSpec = 0x1B,
    /// ImplMap table
    ImplMap = 0x1C,
    /// FieldRVA table
    FieldRVA = 0x1D,
    /// EncLog table
    EncLog = 0x1E,
    /// EncMap table
    EncMap = 0x1F,
    /// Assembly table
    Assembly = 0x20,
    /// AssemblyProcessor table
    AssemblyProcessor = 0x21,
    /// AssemblyOS table
    AssemblyOS = 0x22,
    /// AssemblyRef table
    AssemblyRef = 0x23,
    /// AssemblyRefProcessor table
    AssemblyRefProcessor = 0x24,
    /// AssemblyRefOS table
    AssemblyRefOS = 0x25,
    /// File table
    File = 0x26,
    /// ExportedType table
    ExportedType = 0x27,
    /// ManifestResource table
    ManifestResource = 0x28,
    /// NestedClass table
    NestedClass = 0x29,
    /// GenericParam table
    GenericParam = 0x2A,
    /// MethodSpec table
    MethodSpec = 0x2B,
    /// GenericParamConstraint table
    GenericParamConstraint = 0x2C,
    /// Document table (Portable PDB)
    Document = 0x30,
    /// MethodDebugInformation table (Portable PDB)
    MethodDebugInformation = 0x31,
    /// LocalScope table (Portable PDB)
    LocalScope = 0x32,
    /// LocalVariable table (Portable PDB)
    LocalVariable = 0x33,
    /// LocalConstant table (Portable PDB)
    LocalConstant = 0x34,
    /// ImportScope table (Portable PDB)
    ImportScope = 0x35,
    /// StateMachineMethod table (Portable PDB)
    StateMachineMethod = 0x36,
    /// CustomDebugInformation table (Portable PDB)
    CustomDebugInformation = 0x37,
}

impl TableId {
    /// Maps a raw table number to its identifier.
    #[must_use]
    pub fn from_id(id: u8) -> Option<TableId> {
        use TableId::*;

        Some(match id {
            0x00 => Module,
            0x01 => TypeRef,
            0x02 => TypeDef,
            0x03 => FieldPtr,
            0x04 => Field,
            0x05 => MethodPtr,
            0x06 => MethodDef,
            0x07 => ParamPtr,
            0x08 => Param,
            0x09 => InterfaceImpl,
            0x0A => MemberRef,
            0x0B => Constant,
            0x0C => CustomAttribute,
            0x0D => FieldMarshal,
            0x0E => DeclSecurity,
            0x0F => ClassLayout,
            0x10 => FieldLayout,
            0x11 => StandAloneSig,
            0x12 => EventMap,
            0x13 => EventPtr,
            0x14 => Event,
            0x15 => PropertyMap,
            0x16 => PropertyPtr,
            0x17 => Property,
            0x18 => MethodSemantics,
            0x19 => MethodImpl,
            0x1A => ModuleRef,
            0x1B => TypeSpec,
            0x1C => ImplMap,
            0x1D => FieldRVA,
            0x1E => EncLog,
            0x1F => EncMap,
            0x20 => Assembly,
            0x21 => AssemblyProcessor,
            0x22 => AssemblyOS,
            0x23 => AssemblyRef,
            0x24 => AssemblyRefProcessor,
            0x25 => AssemblyRefOS,
            0x26 => File,
            0x27 => ExportedType,
            0x28 => ManifestResource,
            0x29 => NestedClass,
            0x2A => GenericParam,
            0x2B => MethodSpec,
            0x2C => GenericParamConstraint,
            0x30 => Document,
            0x31 => MethodDebugInformation,
            0x32 => LocalScope,
            0x33 => LocalVariable,
            0x34 => LocalConstant,
            0x35 => ImportScope,
            0x36 => StateMachineMethod,
            0x37 => CustomDebugInformation,
            _ => return None,
        })
    }
}

/// The coded-index families used by the tables this library sizes and decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodedIndexKind {
    /// TypeDef, TypeRef or TypeSpec (2 tag bits)
    TypeDefOrRef,
    /// Field, Param or Property (2 tag bits)
    HasConstant,
    /// Any attributable entity (5 tag bits)
    HasCustomAttribute,
    /// Field or Param (1 tag bit)
    HasFieldMarshal,
    /// TypeDef, MethodDef or Assembly (2 tag bits)
    HasDeclSecurity,
    /// TypeDef, TypeRef, ModuleRef, MethodDef or TypeSpec (3 tag bits)
    MemberRefParent,
    /// Event or Property (1 tag bit)
    HasSemantics,
    /// MethodDef or MemberRef (1 tag bit)
    MethodDefOrRef,
    /// Field or MethodDef (1 tag bit)
    MemberForwarded,
    /// File, AssemblyRef or ExportedType (2 tag bits)
    Implementation,
    /// MethodDef or MemberRef (3 tag bits)
    CustomAttributeType,
    /// Module, ModuleRef, AssemblyRef or TypeRef (2 tag bits)
    ResolutionScope,
    /// TypeDef or MethodDef (1 tag bit)
    TypeOrMethodDef,
    /// Any entity that can carry custom debug information (5 tag bits)
    HasCustomDebugInformation,
}

impl CodedIndexKind {
    /// Number of tag bits in the low end of the coded value.
    #[must_use]
    pub fn tag_bits(&self) -> u32 {
        match self {
            CodedIndexKind::HasFieldMarshal
            | CodedIndexKind::HasSemantics
            | CodedIndexKind::MethodDefOrRef
            | CodedIndexKind::MemberForwarded
            | CodedIndexKind::TypeOrMethodDef => 1,
            CodedIndexKind::TypeDefOrRef
            | CodedIndexKind::HasConstant
            | CodedIndexKind::HasDeclSecurity
            | CodedIndexKind::Implementation
            | CodedIndexKind::ResolutionScope => 2,
            CodedIndexKind::MemberRefParent | CodedIndexKind::CustomAttributeType => 3,
            CodedIndexKind::HasCustomAttribute | CodedIndexKind::HasCustomDebugInformation => 5,
        }
    }

    /// The member tables in tag order. A `None` entry marks an unused tag value.
    #[must_use]
    pub fn tables(&self) -> &'static [Option<TableId>] {
        use TableId::*;

        match self {
            CodedIndexKind::TypeDefOrRef => &[Some(TypeDef), Some(TypeRef), Some(TypeSpec), None],
            CodedIndexKind::HasConstant => &[Some(Field), Some(Param), Some(Property), None],
            CodedIndexKind::HasCustomAttribute => &[
                Some(MethodDef),
                Some(Field),
                Some(TypeRef),
                Some(TypeDef),
                Some(Param),
                Some(InterfaceImpl),
                Some(MemberRef),
                Some(Module),
                Some(DeclSecurity),
                Some(Property),
                Some(Event),
                Some(StandAloneSig),
                Some(ModuleRef),
                Some(TypeSpec),
                Some(Assembly),
                Some(AssemblyRef),
                Some(File),
                Some(ExportedType),
                Some(ManifestResource),
                Some(GenericParam),
                Some(GenericParamConstraint),
                Some(MethodSpec),
            ],
            CodedIndexKind::HasFieldMarshal => &[Some(Field), Some(Param)],
            CodedIndexKind::HasDeclSecurity => {
                &[Some(TypeDef), Some(MethodDef), Some(Assembly), None]
            }
            CodedIndexKind::MemberRefParent => &[
                Some(TypeDef),
                Some(TypeRef),
                Some(ModuleRef),
                Some(MethodDef),
                Some(TypeSpec),
            ],
            CodedIndexKind::HasSemantics => &[Some(Event), Some(Property)],
            CodedIndexKind::MethodDefOrRef => &[Some(MethodDef), Some(MemberRef)],
            CodedIndexKind::MemberForwarded => &[Some(Field), Some(MethodDef)],
            CodedIndexKind::Implementation => {
                &[Some(File), Some(AssemblyRef), Some(ExportedType), None]
            }
            CodedIndexKind::CustomAttributeType => {
                &[None, None, Some(MethodDef), Some(MemberRef), None]
            }
            CodedIndexKind::ResolutionScope => {
                &[Some(Module), Some(ModuleRef), Some(AssemblyRef), Some(TypeRef)]
            }
            CodedIndexKind::TypeOrMethodDef => &[Some(TypeDef), Some(MethodDef)],
            CodedIndexKind::HasCustomDebugInformation => &[
                Some(MethodDef),
                Some(Field),
                Some(TypeRef),
                Some(TypeDef),
                Some(Param),
                Some(InterfaceImpl),
                Some(MemberRef),
                Some(Module),
                Some(DeclSecurity),
                Some(Property),
                Some(Event),
                Some(StandAloneSig),
                Some(ModuleRef),
                Some(TypeSpec),
                Some(Assembly),
                Some(AssemblyRef),
                Some(File),
                Some(ExportedType),
                Some(ManifestResource),
                Some(GenericParam),
                Some(GenericParamConstraint),
                Some(MethodSpec),
                Some(Document),
                Some(LocalScope),
                Some(LocalVariable),
                Some(LocalConstant),
                Some(ImportScope),
            ],
        }
    }

    /// Packs a table and row id into a raw coded value.
    ///
    /// # Errors
    /// Returns an error if `table` is not a member of this coded-index family.
    pub fn encode(&self, table: TableId, rid: u32) -> Result<u32> {
        let tag = self
            .tables()
            .iter()
            .position(|entry| *entry == Some(table))
            .ok_or_else(|| {
                malformed_error!("Table {:?} is not part of coded index {:?}", table, self)
            })?;

        Ok((rid << self.tag_bits()) | tag as u32)
    }

    /// Unpacks a raw coded value into its table and row id.
    ///
    /// # Errors
    /// Returns an error if the tag selects an unused slot of this family.
    pub fn decode(&self, raw: u32) -> Result<(TableId, u32)> {
        let tag = (raw & ((1 << self.tag_bits()) - 1)) as usize;
        let rid = raw >> self.tag_bits();

        match self.tables().get(tag) {
            Some(Some(table)) => Ok((*table, rid)),
            _ => Err(malformed_error!(
                "Invalid tag {} for coded index {:?}",
                tag,
                self
            )),
        }
    }
}

/// Row counts and heap flags for one tables stream; answers all sizing questions.
///
/// Row counts include externally supplied counts (the `#Pdb` stream's referenced-table
/// counts) which affect index widths without contributing rows to this stream.
pub struct TableInfo {
    row_counts: [u32; 64],
    heap_sizes: u8,
}

impl TableInfo {
    /// Returns the row count of the given table.
    #[must_use]
    pub fn row_count(&self, table: TableId) -> u32 {
        self.row_counts[table as usize]
    }

    /// Returns `true` if `#Strings` indexes are 4 bytes wide.
    #[must_use]
    pub fn is_large_str(&self) -> bool {
        self.heap_sizes & 0x01 != 0
    }

    /// Returns `true` if `#GUID` indexes are 4 bytes wide.
    #[must_use]
    pub fn is_large_guid(&self) -> bool {
        self.heap_sizes & 0x02 != 0
    }

    /// Returns `true` if `#Blob` indexes are 4 bytes wide.
    #[must_use]
    pub fn is_large_blob(&self) -> bool {
        self.heap_sizes & 0x04 != 0
    }

    /// Byte width of a `#Strings` index.
    #[must_use]
    pub fn str_bytes(&self) -> u32 {
        if self.is_large_str() {
            4
        } else {
            2
        }
    }

    /// Byte width of a `#GUID` index.
    #[must_use]
    pub fn guid_bytes(&self) -> u32 {
        if self.is_large_guid() {
            4
        } else {
            2
        }
    }

    /// Byte width of a `#Blob` index.
    #[must_use]
    pub fn blob_bytes(&self) -> u32 {
        if self.is_large_blob() {
            4
        } else {
            2
        }
    }

    /// Returns `true` if a simple index into `table` is 4 bytes wide.
    #[must_use]
    pub fn is_large_index(&self, table: TableId) -> bool {
        self.row_count(table) > 0xFFFF
    }

    /// Byte width of a simple index into `table`.
    #[must_use]
    pub fn index_bytes(&self, table: TableId) -> u32 {
        if self.is_large_index(table) {
            4
        } else {
            2
        }
    }

    /// Returns `true` if a coded index of the given kind is 4 bytes wide.
    #[must_use]
    pub fn is_large_coded(&self, kind: CodedIndexKind) -> bool {
        let limit = 0xFFFF_u32 >> kind.tag_bits();
        kind.tables()
            .iter()
            .flatten()
            .any(|table| self.row_count(*table) > limit)
    }

    /// Byte width of a coded index of the given kind.
    #[must_use]
    pub fn coded_bytes(&self, kind: CodedIndexKind) -> u32 {
        if self.is_large_coded(kind) {
            4
        } else {
            2
        }
    }

    /// Computes the on-disk byte size of one row of `table`.
    #[must_use]
    pub fn row_size(&self, table: TableId) -> u32 {
        use CodedIndexKind::*;
        use TableId::*;

        let s = self.str_bytes();
        let g = self.guid_bytes();
        let b = self.blob_bytes();

        match table {
            Module => 2 + s + g + g + g,
            TypeRef => self.coded_bytes(ResolutionScope) + s + s,
            TypeDef => {
                4 + s
                    + s
                    + self.coded_bytes(TypeDefOrRef)
                    + self.index_bytes(Field)
                    + self.index_bytes(MethodDef)
            }
            FieldPtr => self.index_bytes(Field),
            Field => 2 + s + b,
            MethodPtr => self.index_bytes(MethodDef),
            MethodDef => 4 + 2 + 2 + s + b + self.index_bytes(Param),
            ParamPtr => self.index_bytes(Param),
            Param => 2 + 2 + s,
            InterfaceImpl => self.index_bytes(TypeDef) + self.coded_bytes(TypeDefOrRef),
            MemberRef => self.coded_bytes(MemberRefParent) + s + b,
            Constant => 1 + 1 + self.coded_bytes(HasConstant) + b,
            CustomAttribute => {
                self.coded_bytes(HasCustomAttribute) + self.coded_bytes(CustomAttributeType) + b
            }
            FieldMarshal => self.coded_bytes(HasFieldMarshal) + b,
            DeclSecurity => 2 + self.coded_bytes(HasDeclSecurity) + b,
            ClassLayout => 2 + 4 + self.index_bytes(TypeDef),
            FieldLayout => 4 + self.index_bytes(Field),
            StandAloneSig => b,
            EventMap => self.index_bytes(TypeDef) + self.index_bytes(Event),
            EventPtr => self.index_bytes(Event),
            Event => 2 + s + self.coded_bytes(TypeDefOrRef),
            PropertyMap => self.index_bytes(TypeDef) + self.index_bytes(Property),
            PropertyPtr => self.index_bytes(Property),
            Property => 2 + s + b,
            MethodSemantics => 2 + self.index_bytes(MethodDef) + self.coded_bytes(HasSemantics),
            MethodImpl => {
                self.index_bytes(TypeDef)
                    + self.coded_bytes(MethodDefOrRef)
                    + self.coded_bytes(MethodDefOrRef)
            }
            ModuleRef => s,
            TypeSpec => b,
            ImplMap => {
                2 + self.coded_bytes(MemberForwarded) + s + self.index_bytes(ModuleRef)
            }
            FieldRVA => 4 + self.index_bytes(Field),
            EncLog => 4 + 4,
            EncMap => 4,
            Assembly => 4 + 2 + 2 + 2 + 2 + 4 + b + s + s,
            AssemblyProcessor => 4,
            AssemblyOS => 4 + 4 + 4,
            AssemblyRef => 2 + 2 + 2 + 2 + 4 + b + s + s + b,
            AssemblyRefProcessor => 4 + self.index_bytes(AssemblyRef),
            AssemblyRefOS => 4 + 4 + 4 + self.index_bytes(AssemblyRef),
            File => 4 + s + b,
            ExportedType => 4 + 4 + s + s + self.coded_bytes(Implementation),
            ManifestResource => 4 + 4 + s + self.coded_bytes(Implementation),
            NestedClass => self.index_bytes(TypeDef) + self.index_bytes(TypeDef),
            GenericParam => 2 + 2 + self.coded_bytes(TypeOrMethodDef) + s,
            MethodSpec => self.coded_bytes(MethodDefOrRef) + b,
            GenericParamConstraint => {
                self.index_bytes(GenericParam) + self.coded_bytes(TypeDefOrRef)
            }
            Document => b + g + b + g,
            MethodDebugInformation => self.index_bytes(Document) + b,
            LocalScope => {
                self.index_bytes(MethodDef)
                    + self.index_bytes(ImportScope)
                    + self.index_bytes(LocalVariable)
                    + self.index_bytes(LocalConstant)
                    + 4
                    + 4
            }
            LocalVariable => 2 + 2 + s,
            LocalConstant => s + b,
            ImportScope => self.index_bytes(ImportScope) + b,
            StateMachineMethod => self.index_bytes(MethodDef) + self.index_bytes(MethodDef),
            CustomDebugInformation => self.coded_bytes(HasCustomDebugInformation) + g + b,
        }
    }
}

/// The parsed `#~` tables stream: sizing information plus the location of every table's rows.
pub struct TablesHeader<'a> {
    /// The packed row data, beginning immediately after the row-count array
    data: &'a [u8],
    /// Sizing information for the whole stream
    info: TableInfo,
    /// `Valid` bitvector of present tables
    valid: u64,
    /// Byte offset of each present table's rows within `data`
    offsets: [usize; 64],
    /// Stream format major version
    pub major_version: u8,
    /// Stream format minor version
    pub minor_version: u8,
}

impl<'a> TablesHeader<'a> {
    /// Parses a `#~` tables stream.
    ///
    /// # Arguments
    /// * `data` - The complete stream bytes
    /// * `external_rows` - Row counts of tables not present in this stream that still
    ///   participate in index sizing (the `#Pdb` stream's referenced-table counts). Empty
    ///   for a PE image's tables stream.
    ///
    /// # Errors
    /// Returns an error if the header is truncated, declares an unknown table, or the row
    /// data region is smaller than the declared tables require.
    pub fn from(data: &'a [u8], external_rows: &[(TableId, u32)]) -> Result<TablesHeader<'a>> {
        if data.len() < 24 {
            return Err(OutOfBounds);
        }

        let mut offset = 4; // reserved u32
        let major_version = read_le_at::<u8>(data, &mut offset)?;
        let minor_version = read_le_at::<u8>(data, &mut offset)?;
        let heap_sizes = read_le_at::<u8>(data, &mut offset)?;
        offset += 1; // reserved u8
        let valid = read_le_at::<u64>(data, &mut offset)?;
        let _sorted = read_le_at::<u64>(data, &mut offset)?;

        let mut row_counts = [0u32; 64];
        for bit in 0..64 {
            if valid & (1u64 << bit) == 0 {
                continue;
            }

            if TableId::from_id(bit).is_none() {
                return Err(malformed_error!(
                    "Tables stream declares unknown table 0x{:02X}",
                    bit
                ));
            }

            row_counts[bit as usize] = read_le_at::<u32>(data, &mut offset)?;
        }

        for (table, count) in external_rows {
            let slot = &mut row_counts[*table as usize];
            *slot = (*slot).max(*count);
        }

        let info = TableInfo {
            row_counts,
            heap_sizes,
        };

        let rows = &data[offset..];
        let mut offsets = [0usize; 64];
        let mut cursor = 0usize;
        for bit in 0..64u8 {
            if valid & (1u64 << bit) == 0 {
                continue;
            }

            // Unknown bits were rejected above.
            let table = TableId::from_id(bit).unwrap();
            offsets[bit as usize] = cursor;

            let size = info.row_size(table) as usize * info.row_counts[bit as usize] as usize;
            let Some(next) = cursor.checked_add(size) else {
                return Err(OutOfBounds);
            };
            cursor = next;
        }

        if cursor > rows.len() {
            return Err(OutOfBounds);
        }

        Ok(TablesHeader {
            data: rows,
            info,
            valid,
            offsets,
            major_version,
            minor_version,
        })
    }

    /// Returns the sizing information for this stream.
    #[must_use]
    pub fn info(&self) -> &TableInfo {
        &self.info
    }

    /// Returns `true` if the table is present in this stream.
    #[must_use]
    pub fn has_table(&self, table: TableId) -> bool {
        self.valid & (1u64 << (table as u8)) != 0
    }

    /// Returns the number of rows of `table` physically present in this stream.
    ///
    /// External row counts supplied for index sizing do not make a table present.
    #[must_use]
    pub fn row_count(&self, table: TableId) -> u32 {
        if self.has_table(table) {
            self.info.row_count(table)
        } else {
            0
        }
    }

    /// Reads the typed row `rid` (1-based) of `T`'s table.
    ///
    /// # Errors
    /// Returns an error if the table is absent, the rid is out of range, or the row data is
    /// truncated.
    pub(crate) fn read_row<T: RowRead>(&self, rid: u32) -> Result<T> {
        if rid == 0 || rid > self.row_count(T::TABLE) {
            return Err(OutOfBounds);
        }

        let row_size = self.info.row_size(T::TABLE) as usize;
        let mut offset = self.offsets[T::TABLE as usize] + (rid as usize - 1) * row_size;

        T::read_row(self.data, &mut offset, rid, &self.info)
    }

    /// Reads every row of `T`'s table in rid order.
    ///
    /// # Errors
    /// Returns an error if any row fails to parse.
    pub(crate) fn read_all_rows<T: RowRead>(&self) -> Result<Vec<T>> {
        let count = self.row_count(T::TABLE);
        let mut rows = Vec::with_capacity(count as usize);
        for rid in 1..=count {
            rows.push(self.read_row::<T>(rid)?);
        }
        Ok(rows)
    }
}
