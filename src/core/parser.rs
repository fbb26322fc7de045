//! Program source parsing — text to program model.
//!
//! A finite-state machine over cleaned, one-statement-per-line source.
//! The state is `Idle` or one open block; a block-header line closes any
//! open block and opens a new one, any other line folds into the open block
//! through a block-specific reducer, and end-of-input force-closes. The
//! result is a complete [`ProgramModel`] or an error — never a partial
//! model.

use crate::core::program::{
    ClosureDef, FinalizeDef, FunctionDef, FunctionInput, FunctionOutput, Instruction, MappingDef,
    ProgramModel, RecordDef, RecordField, StructDef, StructField,
};
use crate::core::types::{parse_type, split_visibility, ValueType, Visibility};
use crate::error::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

static BLOCK_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("block comment pattern"));

static IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^import\s+([A-Za-z_][A-Za-z0-9_]*)\.aleo\s*;$").expect("import"));

static PROGRAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^program\s+([A-Za-z_][A-Za-z0-9_]*)\.aleo\s*;$").expect("program header")
});

static BLOCK_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(struct|record|mapping|closure|function|finalize)\s+([A-Za-z_][A-Za-z0-9_]*)\s*:$")
        .expect("block header")
});

static FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s+as\s+(.+?)\s*;$").expect("field line")
});

static INPUT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^input\s+(r\d+)\s+as\s+(.+?)\s*;$").expect("input line"));

static OUTPUT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^output\s+(\S+)\s+as\s+(.+?)\s*;$").expect("output line"));

/// One parsed block, tagged by kind with a strongly-typed payload.
#[derive(Debug)]
enum Block {
    Import(String),
    Header(String),
    Struct(StructDef),
    Record(RecordDef),
    Mapping(MappingAcc),
    Closure(ClosureDef),
    Function(FunctionDef),
    Finalize(FinalizeDef),
}

/// Mapping accumulator: both entries must be seen before the block closes.
#[derive(Debug)]
struct MappingAcc {
    name: String,
    key: Option<ValueType>,
    value: Option<ValueType>,
}

enum State {
    Idle,
    Open(Block),
}

/// Parse complete program source into a model.
pub fn parse_program(source: &str) -> Result<ProgramModel> {
    let mut blocks = Vec::new();
    let mut state = State::Idle;

    for line in clean_lines(source) {
        if let Some(block) = parse_block_header(&line) {
            if let State::Open(open) = std::mem::replace(&mut state, State::Open(block)) {
                blocks.push(open);
            }
        } else {
            match &mut state {
                State::Idle => {
                    return Err(Error::InvalidSyntax {
                        block: "source",
                        name: "top level".to_string(),
                        line,
                    })
                }
                State::Open(block) => reduce(block, &line)?,
            }
        }
    }
    if let State::Open(open) = state {
        blocks.push(open);
    }

    assemble(blocks)
}

/// Strip comments, trim, and drop blank lines.
fn clean_lines(source: &str) -> Vec<String> {
    let source = BLOCK_COMMENT_RE.replace_all(source, "");
    source
        .lines()
        .map(|line| {
            let line = match line.find("//") {
                Some(at) => &line[..at],
                None => line,
            };
            line.trim().to_string()
        })
        .filter(|line| !line.is_empty())
        .collect()
}

/// Recognize a line that opens a block; `None` means a body line.
fn parse_block_header(line: &str) -> Option<Block> {
    if let Some(captures) = IMPORT_RE.captures(line) {
        return Some(Block::Import(captures[1].to_string()));
    }
    if let Some(captures) = PROGRAM_RE.captures(line) {
        return Some(Block::Header(captures[1].to_string()));
    }
    let captures = BLOCK_HEADER_RE.captures(line)?;
    let name = captures[2].to_string();
    Some(match &captures[1] {
        "struct" => Block::Struct(StructDef {
            name,
            fields: Vec::new(),
        }),
        "record" => Block::Record(RecordDef {
            name,
            fields: Vec::new(),
        }),
        "mapping" => Block::Mapping(MappingAcc {
            name,
            key: None,
            value: None,
        }),
        "closure" => Block::Closure(ClosureDef {
            name,
            inputs: Vec::new(),
            outputs: Vec::new(),
            instructions: Vec::new(),
        }),
        "function" => Block::Function(FunctionDef {
            name,
            inputs: Vec::new(),
            outputs: Vec::new(),
            instructions: Vec::new(),
            finalize: None,
        }),
        "finalize" => Block::Finalize(FinalizeDef {
            name,
            inputs: Vec::new(),
            instructions: Vec::new(),
        }),
        _ => unreachable!("pattern lists every block keyword"),
    })
}

/// Fold one body line into the open block.
fn reduce(block: &mut Block, line: &str) -> Result<()> {
    match block {
        Block::Import(_) | Block::Header(_) => Err(Error::InvalidSyntax {
            block: "source",
            name: "top level".to_string(),
            line: line.to_string(),
        }),
        Block::Struct(def) => {
            let field = reduce_field_line("struct", &def.name, line)?;
            match field {
                (name, ty, None) => {
                    def.fields.push(StructField { name, ty });
                    Ok(())
                }
                // Struct fields must omit the qualifier.
                (_, _, Some(_)) => Err(invalid_syntax("struct", &def.name, line)),
            }
        }
        Block::Record(def) => {
            let field = reduce_field_line("record", &def.name, line)?;
            match field {
                (name, ty, Some(visibility)) => {
                    def.fields.push(RecordField {
                        name,
                        ty,
                        visibility,
                    });
                    Ok(())
                }
                // Record fields require a qualifier.
                (_, _, None) => Err(invalid_syntax("record", &def.name, line)),
            }
        }
        Block::Mapping(acc) => reduce_mapping_line(acc, line),
        Block::Closure(def) => reduce_callable_line(
            "closure",
            &def.name.clone(),
            &mut def.inputs,
            Some(&mut def.outputs),
            &mut def.instructions,
            line,
        ),
        Block::Function(def) => reduce_callable_line(
            "function",
            &def.name.clone(),
            &mut def.inputs,
            Some(&mut def.outputs),
            &mut def.instructions,
            line,
        ),
        Block::Finalize(def) => reduce_callable_line(
            "finalize",
            &def.name.clone(),
            &mut def.inputs,
            None,
            &mut def.instructions,
            line,
        ),
    }
}

fn invalid_syntax(block: &'static str, name: &str, line: &str) -> Error {
    Error::InvalidSyntax {
        block,
        name: name.to_string(),
        line: line.to_string(),
    }
}

/// `name as Type[.visibility];` — shared by struct and record reducers.
fn reduce_field_line(
    block: &'static str,
    block_name: &str,
    line: &str,
) -> Result<(String, ValueType, Option<Visibility>)> {
    let captures = FIELD_RE
        .captures(line)
        .ok_or_else(|| invalid_syntax(block, block_name, line))?;
    let (type_text, visibility) = split_visibility(&captures[2]);
    let ty = parse_type(type_text, block_name)?;
    Ok((captures[1].to_string(), ty, visibility))
}

/// Mapping bodies are exactly a `key` entry and a `value` entry; the value
/// must be `.public`, the key must carry no qualifier.
fn reduce_mapping_line(acc: &mut MappingAcc, line: &str) -> Result<()> {
    let captures = FIELD_RE
        .captures(line)
        .ok_or_else(|| invalid_syntax("mapping", &acc.name, line))?;
    let entry = &captures[1];
    let (type_text, visibility) = split_visibility(&captures[2]);
    let ty = parse_type(type_text, &acc.name)?;

    match entry {
        "key" => {
            if visibility.is_some() || acc.key.is_some() {
                return Err(invalid_syntax("mapping", &acc.name, line));
            }
            acc.key = Some(ty);
            Ok(())
        }
        "value" => {
            if visibility != Some(Visibility::Public) || acc.value.is_some() {
                return Err(invalid_syntax("mapping", &acc.name, line));
            }
            acc.value = Some(ty);
            Ok(())
        }
        _ => Err(invalid_syntax("mapping", &acc.name, line)),
    }
}

/// Closure/function/finalize bodies: `input`/`output` lines populate the
/// ordered argument lists, anything else appends to the instruction body.
fn reduce_callable_line(
    block: &'static str,
    block_name: &str,
    inputs: &mut Vec<FunctionInput>,
    outputs: Option<&mut Vec<FunctionOutput>>,
    instructions: &mut Vec<Instruction>,
    line: &str,
) -> Result<()> {
    if line.starts_with("input") {
        let captures = INPUT_RE
            .captures(line)
            .ok_or_else(|| invalid_syntax(block, block_name, line))?;
        let (type_text, visibility) = split_visibility(&captures[2]);
        inputs.push(FunctionInput {
            register: captures[1].to_string(),
            ty: parse_type(type_text, block_name)?,
            visibility,
        });
        return Ok(());
    }
    if line.starts_with("output") {
        let Some(outputs) = outputs else {
            // Finalize blocks have no outputs.
            return Err(invalid_syntax(block, block_name, line));
        };
        let captures = OUTPUT_RE
            .captures(line)
            .ok_or_else(|| invalid_syntax(block, block_name, line))?;
        let (type_text, visibility) = split_visibility(&captures[2]);
        outputs.push(FunctionOutput {
            register: captures[1].to_string(),
            ty: parse_type(type_text, block_name)?,
            visibility,
        });
        return Ok(());
    }
    instructions.push(Instruction(line.to_string()));
    Ok(())
}

/// Fold closed blocks into a model, enforcing program-level invariants.
fn assemble(blocks: Vec<Block>) -> Result<ProgramModel> {
    let mut program = ProgramModel::default();
    let mut name: Option<String> = None;

    for block in blocks {
        match block {
            Block::Import(import) => program.imports.push(import),
            Block::Header(header) => {
                if name.is_some() {
                    return Err(Error::MultipleProgramIds);
                }
                name = Some(header);
            }
            Block::Struct(def) => insert_unique(&mut program.structs, def.name.clone(), def)?,
            Block::Record(def) => insert_unique(&mut program.records, def.name.clone(), def)?,
            Block::Mapping(acc) => {
                let (Some(key), Some(value)) = (acc.key, acc.value) else {
                    return Err(invalid_syntax("mapping", &acc.name, "<end of block>"));
                };
                let def = MappingDef {
                    name: acc.name,
                    key,
                    value,
                };
                insert_unique(&mut program.mappings, def.name.clone(), def)?;
            }
            Block::Closure(def) => insert_unique(&mut program.closures, def.name.clone(), def)?,
            Block::Function(def) => insert_unique(&mut program.functions, def.name.clone(), def)?,
            Block::Finalize(def) => {
                let function = program
                    .functions
                    .get_mut(&def.name)
                    .ok_or_else(|| Error::UnmatchedFinalize(def.name.clone()))?;
                if function.finalize.is_some() {
                    return Err(Error::DuplicateDefinition(def.name));
                }
                function.finalize = Some(def);
            }
        }
    }

    program.name = name.ok_or(Error::NoProgramId)?;
    program.check_type_references()?;
    Ok(program)
}

fn insert_unique<V>(map: &mut indexmap::IndexMap<String, V>, name: String, def: V) -> Result<()> {
    if map.contains_key(&name) {
        return Err(Error::DuplicateDefinition(name));
    }
    map.insert(name, def);
    Ok(())
}
