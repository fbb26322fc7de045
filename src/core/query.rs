//! Query compilation — SQL statements to ledger artifacts.
//!
//! INSERT compiles to one call argument against the target table's program.
//! SELECT either resolves entirely against caller-owned tables (local-read
//! fast path, nothing deployed) or synthesizes a fresh view program that
//! re-homes the projected data under the caller, gated on the caller's
//! address, and deploys it through the registry.
//!
//! Every load/compile step takes an explicit [`QueryContext`]; there is no
//! ambient caller, endpoint, or cross-query cache. Any failure aborts the
//! whole query before a deploy or call is attempted.

use crate::core::codegen::generate;
use crate::core::ident::random_program_name;
use crate::core::parser::parse_program;
use crate::core::program::{
    FunctionDef, FunctionInput, FunctionOutput, Instruction, ProgramModel, RecordDef, RecordField,
};
use crate::core::resolver::{resolve_column, resolve_projection, Field};
use crate::core::table::{literal_to_ledger_string, Column, Table, TableKind};
use crate::core::types::{Address, ValueType, Visibility};
use crate::error::{Error, Result};
use crate::registry::{ProgramRegistry, TxId};
use crate::sql::{
    Comparison, ComparisonOp, InsertStatement, Operand, SelectStatement, Statement, TableRef,
    WhereClause,
};
use tracing::{debug, info};

/// Explicit per-query context: the calling account and the ledger seam.
pub struct QueryContext<'a> {
    pub caller: Address,
    pub registry: &'a dyn ProgramRegistry,
}

/// A compiled SELECT, built per query and discarded.
#[derive(Debug)]
pub struct QueryPlan {
    pub tables: Vec<Table>,
    pub fields: Vec<Field>,
    pub where_clause: Option<WhereClause>,
}

/// What executing a statement produced.
#[derive(Debug)]
pub enum QueryOutcome {
    /// INSERT: one call issued against the table's program.
    Inserted {
        program_id: String,
        transaction: TxId,
    },
    /// SELECT over caller-owned tables only: satisfied from locally held
    /// records; fetching them is the caller's concern.
    LocalRead {
        tables: Vec<String>,
        fields: Vec<Field>,
    },
    /// Cross-ownership SELECT: a fresh view program was deployed.
    ViewDeployed {
        program_id: String,
        transaction: TxId,
    },
}

/// Compile and execute one statement against the ledger.
pub async fn execute_statement(
    ctx: &QueryContext<'_>,
    statement: Statement,
) -> Result<QueryOutcome> {
    match statement {
        Statement::Insert(insert) => execute_insert(ctx, insert).await,
        Statement::Select(select) => execute_select(ctx, select).await,
        Statement::CreateDatabase { .. } => Err(Error::Unsupported(
            "a database is a ledger account; create one with 'snarkos account new'".to_string(),
        )),
        Statement::CreateTable { .. } => Err(Error::Unsupported(
            "CREATE TABLE is not supported; tables are deployed as ledger programs".to_string(),
        )),
    }
}

/// Load a referenced table: fetch its program source, reconstruct the
/// model, and read the schema.
pub async fn load_table(ctx: &QueryContext<'_>, reference: &TableRef) -> Result<Table> {
    let database = match &reference.database {
        Some(text) => {
            Address::parse(text).map_err(|_| Error::InvalidDatabase(text.clone()))?
        }
        None => ctx.caller.clone(),
    };
    let program_id = format!("{}.aleo", reference.table);
    debug!(program = %program_id, "loading table program");
    let source = ctx.registry.fetch_program(&program_id).await?;
    let program = parse_program(&source)?;
    Table::from_program(database, &reference.table, reference.alias.clone(), program)
}

async fn execute_insert(ctx: &QueryContext<'_>, insert: InsertStatement) -> Result<QueryOutcome> {
    let table = load_table(ctx, &insert.table).await?;
    let argument = table.insert_argument(&insert.columns, &insert.values)?;
    let program_id = table.program.id();
    let function = table.insert_function_name();
    info!(program = %program_id, function = %function, "compiled insert");
    let transaction = ctx
        .registry
        .call(&program_id, &function, &[argument])
        .await?;
    Ok(QueryOutcome::Inserted {
        program_id,
        transaction,
    })
}

async fn execute_select(ctx: &QueryContext<'_>, select: SelectStatement) -> Result<QueryOutcome> {
    if select.from.is_empty() || select.from.len() > 2 {
        return Err(Error::Unsupported(
            "only one or two source tables are supported".to_string(),
        ));
    }

    // Both loads may run concurrently; field resolution needs them all.
    let tables = match select.from.as_slice() {
        [only] => vec![load_table(ctx, only).await?],
        [first, second] => {
            let (first, second) =
                tokio::try_join!(load_table(ctx, first), load_table(ctx, second))?;
            vec![first, second]
        }
        _ => unreachable!("source count checked above"),
    };

    let fields = resolve_projection(&select.projection, &tables)?;
    let plan = QueryPlan {
        tables,
        fields,
        where_clause: select.where_clause,
    };

    if plan.tables.iter().all(|table| table.database == ctx.caller) {
        debug!("all sources caller-owned; local read");
        return Ok(QueryOutcome::LocalRead {
            tables: plan.tables.into_iter().map(|t| t.name).collect(),
            fields: plan.fields,
        });
    }

    let view = synthesize_view(ctx, &plan)?;
    let source = generate(&view.program);
    let program_id = view.program.id();
    info!(program = %program_id, "deploying synthesized view program");
    let transaction = ctx.registry.deploy(&program_id, &source).await?;
    Ok(QueryOutcome::ViewDeployed {
        program_id,
        transaction,
    })
}

/// Build the view program for a cross-ownership SELECT: imports and
/// embedded row structs for every source, the output row pair, a
/// `Done_` sentinel record, one `process_` function per source, and the
/// closing `end_` function.
fn synthesize_view(ctx: &QueryContext<'_>, plan: &QueryPlan) -> Result<Table> {
    // Both sources would embed row structs under the same names.
    if let [first, second] = plan.tables.as_slice() {
        if first.name == second.name {
            return Err(Error::Unsupported(
                "synthesizing a view over the same table twice is not supported".to_string(),
            ));
        }
    }
    let name = random_program_name();
    let columns: Vec<Column> = plan
        .fields
        .iter()
        .map(|field| Column {
            name: field.output.clone(),
            ty: field.column.ty.clone(),
        })
        .collect();
    let mut view = Table::from_columns(ctx.caller.clone(), name, columns, TableKind::View);

    for source in &plan.tables {
        if !view.program.imports.contains(&source.program.name) {
            view.program.imports.push(source.program.name.clone());
        }
        embed_row_structs(&mut view.program, source)?;
    }

    let done_record = RecordDef {
        name: format!("Done_{}", view.name),
        fields: vec![RecordField {
            name: "owner".to_string(),
            ty: ValueType::Address,
            visibility: Visibility::Private,
        }],
    };
    view.program
        .records
        .insert(done_record.name.clone(), done_record);

    match plan.tables.as_slice() {
        [source] => {
            let process = build_single_process(ctx, plan, &view, source)?;
            view.program.functions.insert(process.name.clone(), process);
        }
        [first, second] => {
            let stage_record = RecordDef {
                name: format!("Stage_{}", view.name),
                fields: vec![
                    RecordField {
                        name: "owner".to_string(),
                        ty: ValueType::Address,
                        visibility: Visibility::Private,
                    },
                    RecordField {
                        name: "data".to_string(),
                        ty: ValueType::custom(first.row_data_struct_name()),
                        visibility: Visibility::Private,
                    },
                ],
            };
            let stage_name = stage_record.name.clone();
            view.program
                .records
                .insert(stage_record.name.clone(), stage_record);

            let stage = build_stage_process(ctx, &view, first, &stage_name);
            let join = build_join_process(ctx, plan, &view, first, second, &stage_name)?;
            view.program.functions.insert(stage.name.clone(), stage);
            view.program.functions.insert(join.name.clone(), join);
        }
        _ => unreachable!("source count checked by the select path"),
    }

    let end = build_end_function(ctx, &view);
    view.program.functions.insert(end.name.clone(), end);
    Ok(view)
}

/// Copy a source's row-data struct into the view program, together with
/// every struct it references, so the generated source passes its own
/// type-reference check. Cross-program references carry their import along.
fn embed_row_structs(program: &mut ProgramModel, source: &Table) -> Result<()> {
    let mut pending = vec![source.row_data_struct_name()];
    while let Some(name) = pending.pop() {
        if program.structs.contains_key(&name) {
            continue;
        }
        let def = source
            .program
            .structs
            .get(&name)
            .cloned()
            .ok_or(Error::StructNotFound(name))?;
        for field in &def.fields {
            queue_struct_refs(&field.ty, &mut pending, &mut program.imports);
        }
        program.structs.insert(def.name.clone(), def);
    }
    Ok(())
}

fn queue_struct_refs(ty: &ValueType, pending: &mut Vec<String>, imports: &mut Vec<String>) {
    match ty {
        ValueType::Array { element, .. } => queue_struct_refs(element, pending, imports),
        ValueType::Custom {
            name,
            from_program: None,
        } => pending.push(name.clone()),
        ValueType::Custom {
            from_program: Some(program),
            ..
        } => {
            if !imports.iter().any(|import| import == program) {
                imports.push(program.clone());
            }
        }
        _ => {}
    }
}

/// Single source: gate, predicate asserts, then cast straight into the
/// output row record.
fn build_single_process(
    ctx: &QueryContext<'_>,
    plan: &QueryPlan,
    view: &Table,
    source: &Table,
) -> Result<FunctionDef> {
    let mut instructions = vec![caller_gate(ctx)];
    let mut next_register = 1usize;

    compile_predicates(
        plan.where_clause.as_ref(),
        &plan.tables,
        &mut next_register,
        &mut instructions,
        |_, column| format!("r0.{}", column),
    )?;

    let cast_args: Vec<String> = plan
        .fields
        .iter()
        .map(|field| format!("r0.{}", field.column.name))
        .collect();
    let (struct_register, record_register) = (next_register, next_register + 1);
    instructions.push(Instruction(format!(
        "cast {} into r{} as {};",
        cast_args.join(" "),
        struct_register,
        view.row_data_struct_name()
    )));
    instructions.push(Instruction(format!(
        "cast self.caller r{} into r{} as {}.record;",
        struct_register,
        record_register,
        view.row_record_name()
    )));

    Ok(FunctionDef {
        name: format!("process_{}", source.name),
        inputs: vec![FunctionInput {
            register: "r0".to_string(),
            ty: ValueType::custom(source.row_data_struct_name()),
            visibility: Some(Visibility::Private),
        }],
        outputs: vec![FunctionOutput {
            register: format!("r{}", record_register),
            ty: ValueType::custom(view.row_record_name()),
            visibility: Some(Visibility::Record),
        }],
        instructions,
        finalize: None,
    })
}

/// First source of a join: forward the whole row in a stage record.
fn build_stage_process(
    ctx: &QueryContext<'_>,
    view: &Table,
    source: &Table,
    stage_name: &str,
) -> FunctionDef {
    FunctionDef {
        name: format!("process_{}", source.name),
        inputs: vec![FunctionInput {
            register: "r0".to_string(),
            ty: ValueType::custom(source.row_data_struct_name()),
            visibility: Some(Visibility::Private),
        }],
        outputs: vec![FunctionOutput {
            register: "r1".to_string(),
            ty: ValueType::custom(stage_name),
            visibility: Some(Visibility::Record),
        }],
        instructions: vec![
            caller_gate(ctx),
            Instruction(format!(
                "cast self.caller r0 into r1 as {}.record;",
                stage_name
            )),
        ],
        finalize: None,
    }
}

/// Second source of a join: both rows are visible, so the join predicates
/// assert here before the combined cast.
fn build_join_process(
    ctx: &QueryContext<'_>,
    plan: &QueryPlan,
    view: &Table,
    first: &Table,
    second: &Table,
    stage_name: &str,
) -> Result<FunctionDef> {
    let mut instructions = vec![caller_gate(ctx)];
    let mut next_register = 2usize;

    compile_predicates(
        plan.where_clause.as_ref(),
        &plan.tables,
        &mut next_register,
        &mut instructions,
        |table_index, column| match table_index {
            0 => format!("r0.data.{}", column),
            _ => format!("r1.{}", column),
        },
    )?;

    let cast_args: Vec<String> = plan
        .fields
        .iter()
        .map(|field| {
            if field.table == first.reference {
                format!("r0.data.{}", field.column.name)
            } else {
                format!("r1.{}", field.column.name)
            }
        })
        .collect();
    let (struct_register, record_register) = (next_register, next_register + 1);
    instructions.push(Instruction(format!(
        "cast {} into r{} as {};",
        cast_args.join(" "),
        struct_register,
        view.row_data_struct_name()
    )));
    instructions.push(Instruction(format!(
        "cast self.caller r{} into r{} as {}.record;",
        struct_register,
        record_register,
        view.row_record_name()
    )));

    Ok(FunctionDef {
        name: format!("process_{}", second.name),
        inputs: vec![
            FunctionInput {
                register: "r0".to_string(),
                ty: ValueType::custom(stage_name),
                visibility: Some(Visibility::Record),
            },
            FunctionInput {
                register: "r1".to_string(),
                ty: ValueType::custom(second.row_data_struct_name()),
                visibility: Some(Visibility::Private),
            },
        ],
        outputs: vec![FunctionOutput {
            register: format!("r{}", record_register),
            ty: ValueType::custom(view.row_record_name()),
            visibility: Some(Visibility::Record),
        }],
        instructions,
        finalize: None,
    })
}

/// Closing function: gate plus the `Done_` sentinel.
fn build_end_function(ctx: &QueryContext<'_>, view: &Table) -> FunctionDef {
    let done_name = format!("Done_{}", view.name);
    FunctionDef {
        name: format!("end_{}", view.name),
        inputs: Vec::new(),
        outputs: vec![FunctionOutput {
            register: "r0".to_string(),
            ty: ValueType::custom(&done_name),
            visibility: Some(Visibility::Record),
        }],
        instructions: vec![
            caller_gate(ctx),
            Instruction(format!(
                "cast self.caller into r0 as {}.record;",
                done_name
            )),
        ],
        finalize: None,
    }
}

fn caller_gate(ctx: &QueryContext<'_>) -> Instruction {
    Instruction(format!("assert.eq self.caller {};", ctx.caller))
}

/// Compile a WHERE conjunction into assert instructions. Equality maps to
/// `assert.eq`/`assert.neq`; orderings compute into a fresh register and
/// assert it true.
fn compile_predicates(
    where_clause: Option<&WhereClause>,
    tables: &[Table],
    next_register: &mut usize,
    instructions: &mut Vec<Instruction>,
    column_ref: impl Fn(usize, &str) -> String,
) -> Result<()> {
    let Some(clause) = where_clause else {
        return Ok(());
    };
    for comparison in &clause.comparisons {
        let (left, right) = compile_operands(comparison, tables, &column_ref)?;
        match comparison.op {
            ComparisonOp::Eq => {
                instructions.push(Instruction(format!("assert.eq {} {};", left, right)));
            }
            ComparisonOp::NotEq => {
                instructions.push(Instruction(format!("assert.neq {} {};", left, right)));
            }
            ComparisonOp::Lt | ComparisonOp::LtEq | ComparisonOp::Gt | ComparisonOp::GtEq => {
                let opcode = match comparison.op {
                    ComparisonOp::Lt => "lt",
                    ComparisonOp::LtEq => "lte",
                    ComparisonOp::Gt => "gt",
                    ComparisonOp::GtEq => "gte",
                    _ => unreachable!("equality handled above"),
                };
                instructions.push(Instruction(format!(
                    "{} {} {} into r{};",
                    opcode, left, right, next_register
                )));
                instructions.push(Instruction(format!(
                    "assert.eq r{} true;",
                    next_register
                )));
                *next_register += 1;
            }
        }
    }
    Ok(())
}

/// Resolve both operands of a comparison to register expressions or
/// converted literals. A literal side converts against the column side's
/// type; two literals have no column to type against.
fn compile_operands(
    comparison: &Comparison,
    tables: &[Table],
    column_ref: &impl Fn(usize, &str) -> String,
) -> Result<(String, String)> {
    let render = |operand: &Operand, other: &Operand| -> Result<String> {
        match operand {
            Operand::Column { table, name } => {
                let (index, column) = resolve_column(table.as_deref(), name, tables)?;
                Ok(column_ref(index, &column.name))
            }
            Operand::Literal(literal) => match other {
                Operand::Column { table, name } => {
                    let (_, column) = resolve_column(table.as_deref(), name, tables)?;
                    literal_to_ledger_string(literal, &column.ty)
                }
                Operand::Literal(_) => Err(Error::Unsupported(
                    "a WHERE comparison needs at least one column reference".to_string(),
                )),
            },
        }
    };
    let left = render(&comparison.left, &comparison.right)?;
    let right = render(&comparison.right, &comparison.left)?;
    Ok((left, right))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::memory::MemoryRegistry;
    use crate::sql::{ColumnSelector, InsertStatement, Literal, ProjectionItem};

    const OWNER: &str = "aleo1rhgdu77hgyqd3xjj8ucu3jj9r2krwz6mnzyd80gncr5fxcwlh5rsvzp9px";
    const HOLDER: &str = "aleo1tvqeh35f2kxm0533zvgnsnw0frmvyq2tkgqxwc7xhrdaqzgfvyfql3jy03";

    fn owner() -> Address {
        Address::parse(OWNER).unwrap()
    }

    fn holder() -> Address {
        Address::parse(HOLDER).unwrap()
    }

    fn u64_column(name: &str) -> Column {
        Column {
            name: name.to_string(),
            ty: ValueType::Integer {
                width: 64,
                signed: false,
            },
        }
    }

    fn publish_table(registry: &MemoryRegistry, database: Address, name: &str, columns: &[&str]) {
        let table = Table::from_columns(
            database,
            name,
            columns.iter().map(|c| u64_column(c)).collect(),
            TableKind::Base,
        );
        registry.publish(&table.program.id(), &generate(&table.program));
    }

    fn table_ref(name: &str) -> TableRef {
        TableRef {
            database: None,
            table: name.to_string(),
            alias: None,
        }
    }

    fn star() -> Vec<ProjectionItem> {
        vec![ProjectionItem {
            table: None,
            column: ColumnSelector::Star,
            alias: None,
        }]
    }

    #[tokio::test]
    async fn test_query_insert_calls_table_program() {
        let registry = MemoryRegistry::new();
        publish_table(&registry, owner(), "orders", &["id", "total"]);
        let ctx = QueryContext {
            caller: owner(),
            registry: &registry,
        };

        let outcome = execute_statement(
            &ctx,
            Statement::Insert(InsertStatement {
                table: table_ref("orders"),
                columns: vec!["total".to_string(), "id".to_string()],
                values: vec![
                    Literal::Number("50".to_string()),
                    Literal::Number("7".to_string()),
                ],
            }),
        )
        .await
        .unwrap();

        match outcome {
            QueryOutcome::Inserted { program_id, .. } => assert_eq!(program_id, "orders.aleo"),
            other => panic!("expected an insert call, got {:?}", other),
        }
        let calls = registry.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function, "insert_orders");
        assert_eq!(calls[0].args, vec!["{id:7u64,total:50u64}".to_string()]);
        assert!(registry.deployed().is_empty());
    }

    #[tokio::test]
    async fn test_query_insert_rejects_bad_database_qualifier() {
        let registry = MemoryRegistry::new();
        let ctx = QueryContext {
            caller: owner(),
            registry: &registry,
        };
        let statement = Statement::Insert(InsertStatement {
            table: TableRef {
                database: Some("not_an_address".to_string()),
                table: "orders".to_string(),
                alias: None,
            },
            columns: Vec::new(),
            values: vec![Literal::Number("1".to_string())],
        });
        assert_eq!(
            execute_statement(&ctx, statement).await.unwrap_err(),
            Error::InvalidDatabase("not_an_address".to_string())
        );
    }

    #[tokio::test]
    async fn test_query_select_owned_table_reads_locally() {
        let registry = MemoryRegistry::new();
        publish_table(&registry, owner(), "orders", &["id", "total"]);
        let ctx = QueryContext {
            caller: owner(),
            registry: &registry,
        };

        let outcome = execute_statement(
            &ctx,
            Statement::Select(SelectStatement {
                from: vec![table_ref("orders")],
                projection: star(),
                where_clause: None,
            }),
        )
        .await
        .unwrap();

        match outcome {
            QueryOutcome::LocalRead { tables, fields } => {
                assert_eq!(tables, vec!["orders".to_string()]);
                let outputs: Vec<&str> = fields.iter().map(|f| f.output.as_str()).collect();
                assert_eq!(outputs, vec!["id", "total"]);
            }
            other => panic!("expected a local read, got {:?}", other),
        }
        assert!(registry.deployed().is_empty());
    }

    #[tokio::test]
    async fn test_query_select_two_owned_tables_never_deploys() {
        let registry = MemoryRegistry::new();
        publish_table(&registry, owner(), "orders", &["id"]);
        publish_table(&registry, owner(), "customers", &["balance"]);
        let ctx = QueryContext {
            caller: owner(),
            registry: &registry,
        };

        let outcome = execute_statement(
            &ctx,
            Statement::Select(SelectStatement {
                from: vec![table_ref("orders"), table_ref("customers")],
                projection: star(),
                where_clause: None,
            }),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, QueryOutcome::LocalRead { .. }));
        assert!(registry.deployed().is_empty());
        assert!(registry.calls().is_empty());
    }

    #[tokio::test]
    async fn test_query_select_foreign_table_deploys_view() {
        let registry = MemoryRegistry::new();
        publish_table(&registry, holder(), "orders", &["id", "total"]);
        let ctx = QueryContext {
            caller: owner(),
            registry: &registry,
        };
        let statement = Statement::Select(SelectStatement {
            from: vec![TableRef {
                database: Some(HOLDER.to_string()),
                table: "orders".to_string(),
                alias: None,
            }],
            projection: star(),
            where_clause: None,
        });

        let outcome = execute_statement(&ctx, statement).await.unwrap();
        let program_id = match outcome {
            QueryOutcome::ViewDeployed { program_id, .. } => program_id,
            other => panic!("expected a view deploy, got {:?}", other),
        };
        assert_eq!(registry.deployed(), vec![program_id.clone()]);

        let view = parse_program(&registry.source_of(&program_id).unwrap()).unwrap();
        assert_eq!(view.id(), program_id);
        assert_eq!(view.name.len(), crate::core::ident::PROGRAM_NAME_LEN);
        assert_eq!(view.imports, vec!["orders".to_string()]);
        assert!(view.structs.contains_key("RowData_orders"));
        assert!(view.structs.contains_key(&format!("RowData_{}", view.name)));
        assert!(view.records.contains_key(&format!("Row_{}", view.name)));
        let sentinels = view
            .records
            .keys()
            .filter(|name| name.starts_with("Done_"))
            .count();
        assert_eq!(sentinels, 1);
        assert!(view.records.contains_key(&format!("Done_{}", view.name)));

        let process = &view.functions["process_orders"];
        let gate = format!("assert.eq self.caller {};", OWNER);
        assert_eq!(process.instructions[0].0, gate);
        assert_eq!(
            process.instructions[1].0,
            format!("cast r0.id r0.total into r1 as RowData_{};", view.name)
        );
        let end = &view.functions[&format!("end_{}", view.name)];
        assert_eq!(end.instructions[0].0, gate);
    }

    #[tokio::test]
    async fn test_query_select_join_stages_through_record() {
        let registry = MemoryRegistry::new();
        publish_table(&registry, holder(), "orders", &["id", "total"]);
        publish_table(&registry, owner(), "customers", &["id", "balance"]);
        let ctx = QueryContext {
            caller: owner(),
            registry: &registry,
        };
        let statement = Statement::Select(SelectStatement {
            from: vec![
                TableRef {
                    database: Some(HOLDER.to_string()),
                    table: "orders".to_string(),
                    alias: Some("o".to_string()),
                },
                TableRef {
                    database: None,
                    table: "customers".to_string(),
                    alias: Some("c".to_string()),
                },
            ],
            projection: vec![
                ProjectionItem {
                    table: Some("o".to_string()),
                    column: ColumnSelector::Named("total".to_string()),
                    alias: None,
                },
                ProjectionItem {
                    table: Some("c".to_string()),
                    column: ColumnSelector::Named("balance".to_string()),
                    alias: None,
                },
            ],
            where_clause: Some(WhereClause {
                comparisons: vec![
                    Comparison {
                        left: Operand::Column {
                            table: Some("o".to_string()),
                            name: "id".to_string(),
                        },
                        op: ComparisonOp::Eq,
                        right: Operand::Column {
                            table: Some("c".to_string()),
                            name: "id".to_string(),
                        },
                    },
                    Comparison {
                        left: Operand::Column {
                            table: Some("o".to_string()),
                            name: "total".to_string(),
                        },
                        op: ComparisonOp::Gt,
                        right: Operand::Literal(Literal::Number("100".to_string())),
                    },
                ],
            }),
        });

        let outcome = execute_statement(&ctx, statement).await.unwrap();
        let program_id = match outcome {
            QueryOutcome::ViewDeployed { program_id, .. } => program_id,
            other => panic!("expected a view deploy, got {:?}", other),
        };

        let view = parse_program(&registry.source_of(&program_id).unwrap()).unwrap();
        let stage_name = format!("Stage_{}", view.name);
        assert!(view.records.contains_key(&stage_name));

        let stage = &view.functions["process_orders"];
        assert_eq!(
            stage.instructions[1].0,
            format!("cast self.caller r0 into r1 as {}.record;", stage_name)
        );

        let join = &view.functions["process_customers"];
        let body: Vec<&str> = join.instructions.iter().map(|i| i.0.as_str()).collect();
        assert_eq!(body[0], format!("assert.eq self.caller {};", OWNER));
        assert_eq!(body[1], "assert.eq r0.data.id r1.id;");
        assert_eq!(body[2], "gt r0.data.total 100u64 into r2;");
        assert_eq!(body[3], "assert.eq r2 true;");
        assert_eq!(
            body[4],
            format!("cast r0.data.total r1.balance into r3 as RowData_{};", view.name)
        );
        assert_eq!(
            body[5],
            format!("cast self.caller r3 into r4 as Row_{}.record;", view.name)
        );
    }

    #[tokio::test]
    async fn test_query_select_same_table_twice_reads_locally_when_owned() {
        let registry = MemoryRegistry::new();
        publish_table(&registry, owner(), "orders", &["id"]);
        let ctx = QueryContext {
            caller: owner(),
            registry: &registry,
        };
        let aliased = |alias: &str| TableRef {
            database: None,
            table: "orders".to_string(),
            alias: Some(alias.to_string()),
        };
        let statement = Statement::Select(SelectStatement {
            from: vec![aliased("a"), aliased("b")],
            projection: vec![
                ProjectionItem {
                    table: Some("a".to_string()),
                    column: ColumnSelector::Named("id".to_string()),
                    alias: Some("left_id".to_string()),
                },
                ProjectionItem {
                    table: Some("b".to_string()),
                    column: ColumnSelector::Named("id".to_string()),
                    alias: Some("right_id".to_string()),
                },
            ],
            where_clause: None,
        });

        let outcome = execute_statement(&ctx, statement).await.unwrap();
        assert!(matches!(outcome, QueryOutcome::LocalRead { .. }));
        assert!(registry.deployed().is_empty());
    }

    #[tokio::test]
    async fn test_query_select_same_table_twice_rejected_on_synthesis() {
        let registry = MemoryRegistry::new();
        publish_table(&registry, holder(), "orders", &["id"]);
        let ctx = QueryContext {
            caller: owner(),
            registry: &registry,
        };
        let aliased = |alias: &str| TableRef {
            database: Some(HOLDER.to_string()),
            table: "orders".to_string(),
            alias: Some(alias.to_string()),
        };
        let statement = Statement::Select(SelectStatement {
            from: vec![aliased("a"), aliased("b")],
            projection: vec![ProjectionItem {
                table: Some("a".to_string()),
                column: ColumnSelector::Named("id".to_string()),
                alias: None,
            }],
            where_clause: None,
        });

        assert!(matches!(
            execute_statement(&ctx, statement).await.unwrap_err(),
            Error::Unsupported(_)
        ));
        assert!(registry.deployed().is_empty());
    }

    #[tokio::test]
    async fn test_query_view_embeds_nested_struct_types() {
        let source = "\
program books.aleo;

struct String64:
    part0 as u128;
    part1 as u128;

struct RowData_books:
    id as u64;
    title as String64;

record Row_books:
    owner as address.private;
    data as RowData_books.private;

function insert_books:
    input r0 as RowData_books.private;
    cast self.signer r0 into r1 as Row_books.record;
    output r1 as Row_books.record;
";
        let registry = MemoryRegistry::new();
        registry.publish("books.aleo", source);
        let ctx = QueryContext {
            caller: owner(),
            registry: &registry,
        };
        let statement = Statement::Select(SelectStatement {
            from: vec![TableRef {
                database: Some(HOLDER.to_string()),
                table: "books".to_string(),
                alias: None,
            }],
            projection: star(),
            where_clause: None,
        });

        let outcome = execute_statement(&ctx, statement).await.unwrap();
        let program_id = match outcome {
            QueryOutcome::ViewDeployed { program_id, .. } => program_id,
            other => panic!("expected a view deploy, got {:?}", other),
        };
        let view = parse_program(&registry.source_of(&program_id).unwrap()).unwrap();
        assert!(view.structs.contains_key("RowData_books"));
        assert!(view.structs.contains_key("String64"));
    }

    #[tokio::test]
    async fn test_query_select_rejects_three_tables() {
        let registry = MemoryRegistry::new();
        let ctx = QueryContext {
            caller: owner(),
            registry: &registry,
        };
        let statement = Statement::Select(SelectStatement {
            from: vec![table_ref("a"), table_ref("b"), table_ref("c")],
            projection: star(),
            where_clause: None,
        });
        assert!(matches!(
            execute_statement(&ctx, statement).await.unwrap_err(),
            Error::Unsupported(_)
        ));
    }

    #[tokio::test]
    async fn test_query_where_rejects_literal_only_comparison() {
        let registry = MemoryRegistry::new();
        publish_table(&registry, holder(), "orders", &["id"]);
        let ctx = QueryContext {
            caller: owner(),
            registry: &registry,
        };
        let statement = Statement::Select(SelectStatement {
            from: vec![table_ref("orders")],
            projection: star(),
            where_clause: Some(WhereClause {
                comparisons: vec![Comparison {
                    left: Operand::Literal(Literal::Number("1".to_string())),
                    op: ComparisonOp::Eq,
                    right: Operand::Literal(Literal::Number("1".to_string())),
                }],
            }),
        });
        assert!(matches!(
            execute_statement(&ctx, statement).await.unwrap_err(),
            Error::Unsupported(_)
        ));
        assert!(registry.deployed().is_empty());
    }

    #[tokio::test]
    async fn test_query_create_database_points_at_wallet() {
        let registry = MemoryRegistry::new();
        let ctx = QueryContext {
            caller: owner(),
            registry: &registry,
        };
        let statement = Statement::CreateDatabase {
            name: "mine".to_string(),
        };
        assert!(matches!(
            execute_statement(&ctx, statement).await.unwrap_err(),
            Error::Unsupported(_)
        ));
    }
}
