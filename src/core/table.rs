//! Table abstraction — a deployed program viewed as a relational table.
//!
//! The schema comes from the program's `RowData_<table>` struct; base/view
//! classification from presence of the canonical CRUD functions. Insert
//! compilation turns a VALUES row into the one struct-literal argument the
//! on-ledger insert function takes.

use crate::core::program::{
    FunctionDef, FunctionInput, FunctionOutput, Instruction, ProgramModel, RecordDef, RecordField,
    StructDef, StructField,
};
use crate::core::types::{is_valid_address, Address, ValueType, Visibility};
use crate::error::{Error, Result};
use crate::sql::Literal;
use rustc_hash::{FxHashMap, FxHashSet};

/// Whether a synthesized table gets the canonical CRUD surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Base,
    View,
}

/// One schema column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub ty: ValueType,
}

/// A ledger program wrapped as a relational table.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    /// The owning account address.
    pub database: Address,
    /// Alias under which the query refers to this table.
    pub reference: String,
    pub program: ProgramModel,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn row_data_struct_name(&self) -> String {
        format!("RowData_{}", self.name)
    }

    pub fn row_record_name(&self) -> String {
        format!("Row_{}", self.name)
    }

    pub fn insert_function_name(&self) -> String {
        format!("insert_{}", self.name)
    }

    pub fn update_function_name(&self) -> String {
        format!("update_{}", self.name)
    }

    pub fn delete_function_name(&self) -> String {
        format!("delete_{}", self.name)
    }

    /// Wrap an already-loaded program. The `RowData_<table>` struct is the
    /// schema; its absence is fatal.
    pub fn from_program(
        database: Address,
        name: impl Into<String>,
        alias: Option<String>,
        program: ProgramModel,
    ) -> Result<Self> {
        let name = name.into();
        let mut table = Self {
            reference: alias.unwrap_or_else(|| name.clone()),
            name,
            database,
            program,
            columns: Vec::new(),
        };
        let struct_name = table.row_data_struct_name();
        let schema = table
            .program
            .structs
            .get(&struct_name)
            .ok_or(Error::StructNotFound(struct_name))?;
        table.columns = schema
            .fields
            .iter()
            .map(|field| Column {
                name: field.name.clone(),
                ty: field.ty.clone(),
            })
            .collect();
        Ok(table)
    }

    /// Synthesize a table (and its backing program model) from a column
    /// list. Base tables get the three CRUD functions; views get none.
    pub fn from_columns(
        database: Address,
        name: impl Into<String>,
        columns: Vec<Column>,
        kind: TableKind,
    ) -> Self {
        let name = name.into();
        let mut table = Self {
            reference: name.clone(),
            name,
            database,
            program: ProgramModel::default(),
            columns,
        };
        table.program = table.build_program(kind);
        table
    }

    fn build_program(&self, kind: TableKind) -> ProgramModel {
        let mut program = ProgramModel::new(&self.name);
        let struct_name = self.row_data_struct_name();
        let record_name = self.row_record_name();

        program.structs.insert(
            struct_name.clone(),
            StructDef {
                name: struct_name.clone(),
                fields: self
                    .columns
                    .iter()
                    .map(|column| StructField {
                        name: column.name.clone(),
                        ty: column.ty.clone(),
                    })
                    .collect(),
            },
        );
        program.records.insert(
            record_name.clone(),
            RecordDef {
                name: record_name.clone(),
                fields: vec![
                    RecordField {
                        name: "owner".to_string(),
                        ty: ValueType::Address,
                        visibility: Visibility::Private,
                    },
                    RecordField {
                        name: "data".to_string(),
                        ty: ValueType::Custom {
                            name: struct_name.clone(),
                            from_program: None,
                        },
                        visibility: Visibility::Private,
                    },
                ],
            },
        );

        if kind == TableKind::Base {
            let row_struct = ValueType::Custom {
                name: struct_name,
                from_program: None,
            };
            let row_record = ValueType::Custom {
                name: record_name,
                from_program: None,
            };

            let insert = FunctionDef {
                name: self.insert_function_name(),
                inputs: vec![private_input("r0", row_struct.clone())],
                outputs: vec![record_output("r1", row_record.clone())],
                instructions: vec![Instruction(format!(
                    "cast self.signer r0 into r1 as {}.record;",
                    self.row_record_name()
                ))],
                finalize: None,
            };
            let update = FunctionDef {
                name: self.update_function_name(),
                inputs: vec![
                    record_input("r0", row_record.clone()),
                    private_input("r1", row_struct),
                ],
                outputs: vec![record_output("r2", row_record.clone())],
                instructions: vec![Instruction(format!(
                    "cast self.signer r1 into r2 as {}.record;",
                    self.row_record_name()
                ))],
                finalize: None,
            };
            let delete = FunctionDef {
                name: self.delete_function_name(),
                inputs: vec![record_input("r0", row_record)],
                outputs: Vec::new(),
                instructions: Vec::new(),
                finalize: None,
            };
            program.functions.insert(insert.name.clone(), insert);
            program.functions.insert(update.name.clone(), update);
            program.functions.insert(delete.name.clone(), delete);
        }

        program
    }

    /// A view carries none of the canonical CRUD functions.
    pub fn is_view(&self) -> bool {
        ![
            self.insert_function_name(),
            self.update_function_name(),
            self.delete_function_name(),
        ]
        .iter()
        .any(|name| self.program.functions.contains_key(name))
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Compile a VALUES row into the struct-literal call argument for
    /// `insert_<table>`. Column matching is by name, emitted in schema
    /// order; missing and extra columns are both reported.
    pub fn insert_argument(&self, columns: &[String], values: &[Literal]) -> Result<String> {
        if self.is_view() {
            return Err(Error::Unsupported(format!(
                "table '{}' is a view and cannot be inserted into",
                self.name
            )));
        }

        let column_names: Vec<String> = if columns.is_empty() {
            self.columns.iter().map(|c| c.name.clone()).collect()
        } else {
            columns.to_vec()
        };
        if column_names.len() != values.len() {
            return Err(Error::Unsupported(format!(
                "INSERT column count ({}) does not match value count ({})",
                column_names.len(),
                values.len()
            )));
        }
        let mut seen = FxHashSet::default();
        for name in &column_names {
            if !seen.insert(name.as_str()) {
                return Err(Error::Unsupported(format!(
                    "column '{}' is supplied more than once",
                    name
                )));
            }
        }

        let supplied: FxHashMap<&str, &Literal> = column_names
            .iter()
            .map(String::as_str)
            .zip(values.iter())
            .collect();
        let expected: FxHashSet<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();

        let missing: Vec<String> = self
            .columns
            .iter()
            .filter(|c| !supplied.contains_key(c.name.as_str()))
            .map(|c| c.name.clone())
            .collect();
        let extra: Vec<String> = column_names
            .iter()
            .filter(|name| !expected.contains(name.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() || !extra.is_empty() {
            return Err(Error::ColumnSetMismatch { missing, extra });
        }

        let mut members = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let literal = supplied[column.name.as_str()];
            let value = literal_to_ledger_string(literal, &column.ty)?;
            members.push(format!("{}:{}", column.name, value));
        }
        if members.is_empty() {
            return Err(Error::Unsupported(
                "at least one inserted column is required".to_string(),
            ));
        }
        Ok(format!("{{{}}}", members.join(",")))
    }
}

fn private_input(register: &str, ty: ValueType) -> FunctionInput {
    FunctionInput {
        register: register.to_string(),
        ty,
        visibility: Some(Visibility::Private),
    }
}

fn record_input(register: &str, ty: ValueType) -> FunctionInput {
    FunctionInput {
        register: register.to_string(),
        ty,
        visibility: Some(Visibility::Record),
    }
}

fn record_output(register: &str, ty: ValueType) -> FunctionOutput {
    FunctionOutput {
        register: register.to_string(),
        ty,
        visibility: Some(Visibility::Record),
    }
}

/// The (literal kind, target type) compatibility table. Everything outside
/// it is an incompatible conversion.
pub(crate) fn literal_to_ledger_string(literal: &Literal, target: &ValueType) -> Result<String> {
    match (literal, target) {
        (Literal::Number(number), ValueType::Integer { .. }) => {
            Ok(format!("{}{}", number, target))
        }
        (Literal::Str(text), ValueType::Address) => {
            if is_valid_address(text) {
                Ok(text.clone())
            } else {
                Err(Error::InvalidAddress(text.clone()))
            }
        }
        (Literal::Bool(value), ValueType::Boolean) => Ok(value.to_string()),
        _ => Err(Error::IncompatibleType {
            value: literal.text(),
            kind: literal.kind(),
            target: target.to_string(),
        }),
    }
}
