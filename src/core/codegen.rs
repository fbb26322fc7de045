//! Program source generation — program model to text.
//!
//! The deterministic inverse of the parser: for every valid model `M`,
//! `parse_program(&generate(&M))` reconstructs a structurally equal model.
//! Emission order is imports, program header, structs, records, mappings,
//! closures, then functions with each paired finalize immediately after.

use crate::core::program::{
    ClosureDef, FinalizeDef, FunctionDef, FunctionInput, FunctionOutput, Instruction, MappingDef,
    ProgramModel, RecordDef, StructDef,
};
use std::fmt::Write;

const INDENT: &str = "    ";

/// Serialize a program model to deployable source text.
pub fn generate(program: &ProgramModel) -> String {
    let mut out = String::new();

    for import in &program.imports {
        let _ = writeln!(out, "import {}.aleo;", import);
    }
    if !program.imports.is_empty() {
        out.push('\n');
    }
    let _ = writeln!(out, "program {};", program.id());

    for def in program.structs.values() {
        out.push('\n');
        emit_struct(&mut out, def);
    }
    for def in program.records.values() {
        out.push('\n');
        emit_record(&mut out, def);
    }
    for def in program.mappings.values() {
        out.push('\n');
        emit_mapping(&mut out, def);
    }
    for def in program.closures.values() {
        out.push('\n');
        emit_closure(&mut out, def);
    }
    for def in program.functions.values() {
        out.push('\n');
        emit_function(&mut out, def);
    }

    out
}

fn emit_struct(out: &mut String, def: &StructDef) {
    let _ = writeln!(out, "struct {}:", def.name);
    for field in &def.fields {
        // Visibility is suppressed on struct fields.
        let _ = writeln!(out, "{}{} as {};", INDENT, field.name, field.ty);
    }
}

fn emit_record(out: &mut String, def: &RecordDef) {
    let _ = writeln!(out, "record {}:", def.name);
    for field in &def.fields {
        let _ = writeln!(
            out,
            "{}{} as {}.{};",
            INDENT, field.name, field.ty, field.visibility
        );
    }
}

fn emit_mapping(out: &mut String, def: &MappingDef) {
    let _ = writeln!(out, "mapping {}:", def.name);
    let _ = writeln!(out, "{}key as {};", INDENT, def.key);
    let _ = writeln!(out, "{}value as {}.public;", INDENT, def.value);
}

fn emit_closure(out: &mut String, def: &ClosureDef) {
    let _ = writeln!(out, "closure {}:", def.name);
    emit_body(out, &def.inputs, &def.instructions, &def.outputs);
}

fn emit_function(out: &mut String, def: &FunctionDef) {
    let _ = writeln!(out, "function {}:", def.name);
    emit_body(out, &def.inputs, &def.instructions, &def.outputs);
    if let Some(finalize) = &def.finalize {
        emit_finalize(out, finalize);
    }
}

fn emit_finalize(out: &mut String, def: &FinalizeDef) {
    let _ = writeln!(out, "finalize {}:", def.name);
    emit_body(out, &def.inputs, &def.instructions, &[]);
}

fn emit_body(
    out: &mut String,
    inputs: &[FunctionInput],
    instructions: &[Instruction],
    outputs: &[FunctionOutput],
) {
    for input in inputs {
        match input.visibility {
            Some(visibility) => {
                let _ = writeln!(
                    out,
                    "{}input {} as {}.{};",
                    INDENT, input.register, input.ty, visibility
                );
            }
            None => {
                let _ = writeln!(out, "{}input {} as {};", INDENT, input.register, input.ty);
            }
        }
    }
    for Instruction(line) in instructions {
        let _ = writeln!(out, "{}{}", INDENT, line);
    }
    for output in outputs {
        match output.visibility {
            Some(visibility) => {
                let _ = writeln!(
                    out,
                    "{}output {} as {}.{};",
                    INDENT, output.register, output.ty, visibility
                );
            }
            None => {
                let _ = writeln!(out, "{}output {} as {};", INDENT, output.register, output.ty);
            }
        }
    }
}
