//! Program model — the typed in-memory representation of one deployed
//! program: identity, imports, structs, records, mappings, closures, and
//! functions with their finalize counterparts.
//!
//! Built by the parser, consumed by the generator and the table layer.
//! Collections are ordered and name-keyed; declaration order is significant
//! for row layout and for deterministic regeneration.

use crate::core::types::{ValueType, Visibility};
use crate::error::{Error, Result};
use indexmap::IndexMap;

/// A struct member. Struct fields never carry a visibility qualifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    pub name: String,
    pub ty: ValueType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<StructField>,
}

/// A record member. Record fields always carry a visibility qualifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordField {
    pub name: String,
    pub ty: ValueType,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDef {
    pub name: String,
    pub fields: Vec<RecordField>,
}

/// A public on-ledger key→value table. The value side always renders
/// `.public`; the key carries no qualifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingDef {
    pub name: String,
    pub key: ValueType,
    pub value: ValueType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInput {
    pub register: String,
    pub ty: ValueType,
    pub visibility: Option<Visibility>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionOutput {
    pub register: String,
    pub ty: ValueType,
    pub visibility: Option<Visibility>,
}

/// One opaque body line, stored verbatim (trimmed, including the trailing
/// semicolon).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction(pub String);

/// The public state-mutating counterpart of a function, executed on-ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeDef {
    pub name: String,
    pub inputs: Vec<FunctionInput>,
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    pub name: String,
    pub inputs: Vec<FunctionInput>,
    pub outputs: Vec<FunctionOutput>,
    pub instructions: Vec<Instruction>,
    pub finalize: Option<FinalizeDef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosureDef {
    pub name: String,
    pub inputs: Vec<FunctionInput>,
    pub outputs: Vec<FunctionOutput>,
    pub instructions: Vec<Instruction>,
}

/// A complete program: one identity plus its ordered definitions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgramModel {
    /// Program name without the `.aleo` suffix.
    pub name: String,
    /// Imported program names, declaration order.
    pub imports: Vec<String>,
    pub structs: IndexMap<String, StructDef>,
    pub records: IndexMap<String, RecordDef>,
    pub mappings: IndexMap<String, MappingDef>,
    pub closures: IndexMap<String, ClosureDef>,
    pub functions: IndexMap<String, FunctionDef>,
}

impl ProgramModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The deployable program id, `<name>.aleo`.
    pub fn id(&self) -> String {
        format!("{}.aleo", self.name)
    }

    /// Strip the `.aleo` suffix off a program id. A bare name passes through.
    pub fn name_from_id(id: &str) -> &str {
        id.strip_suffix(".aleo").unwrap_or(id)
    }

    /// Every custom type referenced by a declaration must resolve to a local
    /// definition or to an imported (or self-referencing) program.
    pub fn check_type_references(&self) -> Result<()> {
        let declared: Vec<&ValueType> = self
            .structs
            .values()
            .flat_map(|s| s.fields.iter().map(|f| &f.ty))
            .chain(
                self.records
                    .values()
                    .flat_map(|r| r.fields.iter().map(|f| &f.ty)),
            )
            .chain(self.mappings.values().flat_map(|m| [&m.key, &m.value]))
            .collect();

        for ty in declared {
            self.check_type(ty)?;
        }
        Ok(())
    }

    fn check_type(&self, ty: &ValueType) -> Result<()> {
        match ty {
            ValueType::Array { element, .. } => self.check_type(element),
            ValueType::Custom { name, from_program } => match from_program {
                Some(program) => {
                    if program == &self.name || self.imports.iter().any(|i| i == program) {
                        Ok(())
                    } else {
                        Err(Error::UnresolvedType {
                            name: format!("{}.aleo/{}", program, name),
                            program: self.name.clone(),
                        })
                    }
                }
                None => {
                    if self.structs.contains_key(name) || self.records.contains_key(name) {
                        Ok(())
                    } else {
                        Err(Error::UnresolvedType {
                            name: name.clone(),
                            program: self.name.clone(),
                        })
                    }
                }
            },
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::parse_type;

    fn sample() -> ProgramModel {
        let mut program = ProgramModel::new("library");
        program.structs.insert(
            "RowData_books".to_string(),
            StructDef {
                name: "RowData_books".to_string(),
                fields: vec![
                    StructField {
                        name: "title".to_string(),
                        ty: parse_type("u128", "t").unwrap(),
                    },
                    StructField {
                        name: "holder".to_string(),
                        ty: parse_type("address", "t").unwrap(),
                    },
                ],
            },
        );
        program
    }

    #[test]
    fn test_program_id_suffix() {
        let program = ProgramModel::new("library");
        assert_eq!(program.id(), "library.aleo");
        assert_eq!(ProgramModel::name_from_id("library.aleo"), "library");
        assert_eq!(ProgramModel::name_from_id("library"), "library");
    }

    #[test]
    fn test_program_local_custom_type_resolves() {
        let mut program = sample();
        program.records.insert(
            "Row_books".to_string(),
            RecordDef {
                name: "Row_books".to_string(),
                fields: vec![RecordField {
                    name: "data".to_string(),
                    ty: parse_type("RowData_books", "t").unwrap(),
                    visibility: crate::core::types::Visibility::Private,
                }],
            },
        );
        assert!(program.check_type_references().is_ok());
    }

    #[test]
    fn test_program_unknown_custom_type_fails() {
        let mut program = sample();
        program.records.insert(
            "Row_books".to_string(),
            RecordDef {
                name: "Row_books".to_string(),
                fields: vec![RecordField {
                    name: "data".to_string(),
                    ty: parse_type("Ghost", "t").unwrap(),
                    visibility: crate::core::types::Visibility::Private,
                }],
            },
        );
        assert!(matches!(
            program.check_type_references(),
            Err(Error::UnresolvedType { .. })
        ));
    }

    #[test]
    fn test_program_cross_program_type_requires_import() {
        let mut program = sample();
        program.structs.get_mut("RowData_books").unwrap().fields[0].ty =
            parse_type("vault.aleo/Token", "t").unwrap();
        assert!(program.check_type_references().is_err());

        program.imports.push("vault".to_string());
        assert!(program.check_type_references().is_ok());
    }
}
