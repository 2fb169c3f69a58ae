//! Pest-driven conversion from source text to the AST in `crate::ast`.
//! One function per grammar rule in `blend65.pest`, mirroring the
//! teacher's `barracuda_pest_parser.rs`: a top-level dispatcher per AST
//! family (declarations, statements, the expression precedence ladder)
//! rather than a single recursive `match` over every rule at once.

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use blend65_common::{Position, SourceSpan};

use crate::ast::{
    BinaryOp, CompoundOp, Decl, EnumDecl, EnumMember, Expr, FunctionDecl, ImportDecl, Literal,
    MapField, MemoryMapDecl, ModuleDecl, Param, Program, Radix, Stmt, StorageClass, SwitchCase,
    TypeAliasDecl, UnaryOp, VariableDecl,
};

#[derive(Parser)]
#[grammar = "frontend/blend65.pest"]
struct Blend65Parser;

#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub span: SourceSpan,
}

pub fn parse(source: &str) -> Result<Program, Vec<ParseError>> {
    let mut pairs = Blend65Parser::parse(Rule::program, source).map_err(|e| vec![parse_error_from_pest(e)])?;
    let program_pair = pairs.next().expect("program rule always produces exactly one pair");
    Ok(build_program(program_pair))
}

fn parse_error_from_pest(error: pest::error::Error<Rule>) -> ParseError {
    let (start, end) = match error.location {
        pest::error::InputLocation::Pos(p) => (p, p),
        pest::error::InputLocation::Span((s, e)) => (s, e),
    };
    let (line, column) = match error.line_col {
        pest::error::LineColLocation::Pos((l, c)) => (l, c),
        pest::error::LineColLocation::Span((l, c), _) => (l, c),
    };
    let pos = Position::new(line as u32, column as u32, start as u32);
    let end_pos = Position::new(line as u32, column as u32, end as u32);
    ParseError { message: error.variant.message().to_string(), span: SourceSpan::new(pos, end_pos) }
}

fn span_of(pair: &Pair<Rule>) -> SourceSpan {
    let span = pair.as_span();
    let (start_line, start_col) = span.start_pos().line_col();
    let (end_line, end_col) = span.end_pos().line_col();
    SourceSpan::new(
        Position::new(start_line as u32, start_col as u32, span.start() as u32),
        Position::new(end_line as u32, end_col as u32, span.end() as u32),
    )
}

fn build_program(pair: Pair<Rule>) -> Program {
    let span = span_of(&pair);
    let mut module = ModuleDecl { name: vec![], explicit: false, span };
    let mut declarations = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::module_decl => module = build_module_decl(inner),
            Rule::top_decl_list => {
                for decl_pair in inner.into_inner() {
                    if decl_pair.as_rule() == Rule::top_decl {
                        declarations.push(build_top_decl(decl_pair));
                    }
                }
            }
            _ => {}
        }
    }
    Program { module, declarations, span }
}

fn build_module_decl(pair: Pair<Rule>) -> ModuleDecl {
    let span = span_of(&pair);
    let dotted = pair.into_inner().next().expect("module_decl wraps a dotted_name");
    let name = dotted.as_str().split('.').map(|s| s.to_string()).collect();
    ModuleDecl { name, explicit: true, span }
}

fn build_top_decl(pair: Pair<Rule>) -> Decl {
    let inner = pair.into_inner().next().expect("top_decl has exactly one alternative");
    match inner.as_rule() {
        Rule::export_decl => build_export_decl(inner),
        Rule::import_decl => Decl::Import(build_import_decl(inner)),
        Rule::function_decl => Decl::Function(build_function_decl(inner)),
        Rule::variable_decl => Decl::Variable(build_variable_decl(inner)),
        Rule::type_alias_decl => Decl::TypeAlias(build_type_alias_decl(inner)),
        Rule::enum_decl => Decl::Enum(build_enum_decl(inner)),
        Rule::memory_map_decl => Decl::MemoryMap(build_memory_map_decl(inner)),
        other => unreachable!("unexpected top_decl alternative: {other:?}"),
    }
}

fn build_export_decl(pair: Pair<Rule>) -> Decl {
    let span = span_of(&pair);
    let inner = pair.into_inner().next().expect("export_decl wraps one declaration");
    let mut decl = match inner.as_rule() {
        Rule::function_decl => Decl::Function(build_function_decl(inner)),
        Rule::variable_decl => Decl::Variable(build_variable_decl(inner)),
        Rule::type_alias_decl => Decl::TypeAlias(build_type_alias_decl(inner)),
        Rule::enum_decl => Decl::Enum(build_enum_decl(inner)),
        other => unreachable!("unexpected export target: {other:?}"),
    };
    mark_exported(&mut decl);
    Decl::Export { inner: Box::new(decl), span }
}

fn mark_exported(decl: &mut Decl) {
    match decl {
        Decl::Function(f) => f.exported = true,
        Decl::Variable(v) => v.exported = true,
        Decl::TypeAlias(t) => t.exported = true,
        Decl::Enum(e) => e.exported = true,
        _ => {}
    }
}

fn build_import_decl(pair: Pair<Rule>) -> ImportDecl {
    let span = span_of(&pair);
    let mut identifiers = Vec::new();
    let mut wildcard = false;
    let mut module_path = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::import_list => {
                if inner.as_str() == "*" {
                    wildcard = true;
                } else {
                    for id in inner.into_inner() {
                        if id.as_rule() == Rule::identifier {
                            identifiers.push(id.as_str().to_string());
                        }
                    }
                }
            }
            Rule::dotted_name => module_path = inner.as_str().split('.').map(|s| s.to_string()).collect(),
            _ => {}
        }
    }
    ImportDecl { identifiers, module_path, wildcard, span }
}

fn build_function_decl(pair: Pair<Rule>) -> FunctionDecl {
    let span = span_of(&pair);
    let callback = pair.as_str().trim_start().starts_with("callback");
    let mut name = String::new();
    let mut params = Vec::new();
    let mut return_type = None;
    let mut body = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::identifier => name = inner.as_str().to_string(),
            Rule::param_list => {
                params = inner.into_inner().filter(|p| p.as_rule() == Rule::param).map(build_param).collect();
            }
            Rule::type_name => return_type = Some(inner.as_str().to_string()),
            Rule::block => body = Some(build_block(inner)),
            _ => {}
        }
    }
    let stub = body.is_none();
    FunctionDecl { name, params, return_type, body, exported: false, callback, stub, span }
}

fn build_param(pair: Pair<Rule>) -> Param {
    let span = span_of(&pair);
    let mut inner = pair.into_inner();
    let name = inner.next().expect("param name").as_str().to_string();
    let type_annotation = inner.next().expect("param type").as_str().to_string();
    Param { name, type_annotation, span }
}

fn build_variable_decl(pair: Pair<Rule>) -> VariableDecl {
    let span = span_of(&pair);
    let mut constant = false;
    let mut storage = StorageClass::None;
    let mut explicit_address = None;
    let mut name = String::new();
    let mut type_annotation = None;
    let mut initializer = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::var_kind => constant = inner.as_str().trim_start().starts_with("const"),
            Rule::storage_modifier => {
                storage = storage_class_from(inner.as_str());
                explicit_address = inner.into_inner().next().map(build_expr);
            }
            Rule::identifier => name = inner.as_str().to_string(),
            Rule::type_name => type_annotation = Some(inner.as_str().to_string()),
            Rule::expr => initializer = Some(build_expr(inner)),
            _ => {}
        }
    }
    VariableDecl { name, type_annotation, initializer, storage, explicit_address, constant, exported: false, span }
}

fn storage_class_from(text: &str) -> StorageClass {
    if text.starts_with("@zp") {
        StorageClass::ZeroPage
    } else if text.starts_with("@ram") {
        StorageClass::Ram
    } else if text.starts_with("@data") {
        StorageClass::Data
    } else {
        StorageClass::Map
    }
}

fn build_type_alias_decl(pair: Pair<Rule>) -> TypeAliasDecl {
    let span = span_of(&pair);
    let mut inner = pair.into_inner();
    let name = inner.next().expect("type alias name").as_str().to_string();
    let aliased_type = inner.next().expect("aliased type").as_str().to_string();
    TypeAliasDecl { name, aliased_type, exported: false, span }
}

fn build_enum_decl(pair: Pair<Rule>) -> EnumDecl {
    let span = span_of(&pair);
    let mut inner = pair.into_inner();
    let name = inner.next().expect("enum name").as_str().to_string();
    let members = inner.filter(|p| p.as_rule() == Rule::enum_member).map(build_enum_member).collect();
    EnumDecl { name, members, exported: false, span }
}

fn build_enum_member(pair: Pair<Rule>) -> EnumMember {
    let span = span_of(&pair);
    let mut inner = pair.into_inner();
    let name = inner.next().expect("enum member name").as_str().to_string();
    let value = inner.next().map(build_expr);
    EnumMember { name, value, span }
}

fn build_memory_map_decl(pair: Pair<Rule>) -> MemoryMapDecl {
    let span = span_of(&pair);
    let mut inner = pair.into_inner();
    let name = inner.next().expect("map name").as_str().to_string();
    let body = inner.next().expect("map body");
    match body.as_rule() {
        Rule::map_simple_body => {
            let mut parts = body.into_inner();
            let first = build_expr(parts.next().expect("map address"));
            match parts.next() {
                Some(end) => MemoryMapDecl::Range { name, start: first, end: build_expr(end), span },
                None => MemoryMapDecl::Simple { name, address: first, span },
            }
        }
        Rule::map_struct_body => {
            let mut parts = body.into_inner();
            let base = build_expr(parts.next().expect("map base address"));
            let fields: Vec<MapField> = parts.filter(|p| p.as_rule() == Rule::map_field).map(build_map_field).collect();
            if fields.iter().any(|f| f.address.is_some()) {
                MemoryMapDecl::ExplicitStruct { name, base, fields, span }
            } else {
                MemoryMapDecl::SequentialStruct { name, base, fields, span }
            }
        }
        other => unreachable!("unexpected memory_map_decl body: {other:?}"),
    }
}

fn build_map_field(pair: Pair<Rule>) -> MapField {
    let span = span_of(&pair);
    let mut inner = pair.into_inner();
    let name = inner.next().expect("map field name").as_str().to_string();
    let type_annotation = inner.next().expect("map field type").as_str().to_string();
    let address = inner.next().map(build_expr);
    MapField { name, type_annotation, address, span }
}

fn build_block(pair: Pair<Rule>) -> Vec<Stmt> {
    pair.into_inner().find(|p| p.as_rule() == Rule::stmt_list).map(build_stmt_list).unwrap_or_default()
}

fn build_stmt_list(pair: Pair<Rule>) -> Vec<Stmt> {
    pair.into_inner().filter(|p| p.as_rule() == Rule::stmt).map(build_stmt).collect()
}

fn build_stmt(pair: Pair<Rule>) -> Stmt {
    let inner = pair.into_inner().next().expect("stmt has exactly one alternative");
    match inner.as_rule() {
        Rule::if_stmt => build_if_stmt(inner),
        Rule::while_stmt => build_while_stmt(inner),
        Rule::do_while_stmt => build_do_while_stmt(inner),
        Rule::for_stmt => build_for_stmt(inner),
        Rule::switch_stmt => build_switch_stmt(inner),
        Rule::return_stmt => build_return_stmt(inner),
        Rule::break_stmt => Stmt::Break(span_of(&inner)),
        Rule::continue_stmt => Stmt::Continue(span_of(&inner)),
        Rule::let_stmt => Stmt::Let(build_variable_decl(inner.into_inner().next().expect("let_stmt wraps a variable_decl"))),
        Rule::block => Stmt::Block(build_block(inner)),
        Rule::expr_stmt => Stmt::ExprStmt(build_expr(inner.into_inner().next().expect("expr_stmt wraps an expr"))),
        other => unreachable!("unexpected stmt alternative: {other:?}"),
    }
}

fn build_if_stmt(pair: Pair<Rule>) -> Stmt {
    let span = span_of(&pair);
    let mut inner = pair.into_inner();
    let condition = build_expr(inner.next().expect("if condition"));
    let then_branch = build_block(inner.next().expect("if then-block"));
    let else_branch = inner.next().map(|p| match p.as_rule() {
        Rule::block => build_block(p),
        Rule::if_stmt => vec![build_if_stmt(p)],
        other => unreachable!("unexpected else-branch alternative: {other:?}"),
    });
    Stmt::If { condition, then_branch, else_branch, span }
}

fn build_while_stmt(pair: Pair<Rule>) -> Stmt {
    let span = span_of(&pair);
    let mut inner = pair.into_inner();
    let condition = build_expr(inner.next().expect("while condition"));
    let body = build_block(inner.next().expect("while body"));
    Stmt::While { condition, body, span }
}

fn build_do_while_stmt(pair: Pair<Rule>) -> Stmt {
    let span = span_of(&pair);
    let mut inner = pair.into_inner();
    let body = build_block(inner.next().expect("do-while body"));
    let condition = build_expr(inner.next().expect("do-while condition"));
    Stmt::DoWhile { body, condition, span }
}

fn build_for_stmt(pair: Pair<Rule>) -> Stmt {
    let span = span_of(&pair);
    let mut inner = pair.into_inner();
    let loop_var = inner.next().expect("for loop variable").as_str().to_string();
    let mut exprs = Vec::new();
    let mut body = Vec::new();
    for p in inner {
        match p.as_rule() {
            Rule::expr => exprs.push(build_expr(p)),
            Rule::block => body = build_block(p),
            _ => {}
        }
    }
    let mut exprs = exprs.into_iter();
    let start = exprs.next().expect("for start expression");
    let end = exprs.next().expect("for end expression");
    let step = exprs.next();
    Stmt::For { loop_var, start, end, step, body, span }
}

fn build_switch_stmt(pair: Pair<Rule>) -> Stmt {
    let span = span_of(&pair);
    let mut inner = pair.into_inner();
    let value = build_expr(inner.next().expect("switch value"));
    let mut cases = Vec::new();
    let mut default = None;
    for p in inner {
        match p.as_rule() {
            Rule::switch_case => cases.push(build_switch_case(p)),
            Rule::default_case => default = Some(build_default_case(p)),
            _ => {}
        }
    }
    Stmt::Switch { value, cases, default, span }
}

fn build_switch_case(pair: Pair<Rule>) -> SwitchCase {
    let span = span_of(&pair);
    let mut inner = pair.into_inner();
    let value = build_expr(inner.next().expect("case value"));
    let body = inner.next().map(build_stmt_list).unwrap_or_default();
    SwitchCase { value, body, span }
}

fn build_default_case(pair: Pair<Rule>) -> Vec<Stmt> {
    pair.into_inner().next().map(build_stmt_list).unwrap_or_default()
}

fn build_return_stmt(pair: Pair<Rule>) -> Stmt {
    let span = span_of(&pair);
    let value = pair.into_inner().next().map(build_expr);
    Stmt::Return { value, span }
}

fn build_expr(pair: Pair<Rule>) -> Expr {
    build_ternary(pair.into_inner().next().expect("expr wraps a ternary"))
}

fn build_ternary(pair: Pair<Rule>) -> Expr {
    let span = span_of(&pair);
    let mut parts = pair.into_inner();
    let condition = build_assignment(parts.next().expect("ternary condition"));
    match (parts.next(), parts.next()) {
        (Some(then_p), Some(else_p)) => Expr::Ternary {
            condition: Box::new(condition),
            then_expr: Box::new(build_assignment(then_p)),
            else_expr: Box::new(build_assignment(else_p)),
            span,
        },
        _ => condition,
    }
}

fn build_assignment(pair: Pair<Rule>) -> Expr {
    let span = span_of(&pair);
    let mut parts = pair.into_inner();
    let target = build_logic_or(parts.next().expect("assignment left-hand side"));
    match (parts.next(), parts.next()) {
        (Some(op_pair), Some(rhs_pair)) => Expr::Assignment {
            target: Box::new(target),
            op: compound_op_from(op_pair.as_str()),
            value: Box::new(build_logic_or(rhs_pair)),
            span,
        },
        _ => target,
    }
}

fn compound_op_from(text: &str) -> CompoundOp {
    match text {
        "=" => CompoundOp::ASSIGN,
        "+=" => CompoundOp::ADD_ASSIGN,
        "-=" => CompoundOp::SUB_ASSIGN,
        "*=" => CompoundOp::MUL_ASSIGN,
        "/=" => CompoundOp::DIV_ASSIGN,
        "%=" => CompoundOp::MOD_ASSIGN,
        "&=" => CompoundOp::AND_ASSIGN,
        "|=" => CompoundOp::OR_ASSIGN,
        "^=" => CompoundOp::XOR_ASSIGN,
        "<<=" => CompoundOp::SHL_ASSIGN,
        ">>=" => CompoundOp::SHR_ASSIGN,
        other => unreachable!("unknown assignment operator: {other}"),
    }
}

fn build_logic_or(pair: Pair<Rule>) -> Expr {
    fold_fixed_op(pair, BinaryOp::LOGICAL_OR, build_logic_and)
}

fn build_logic_and(pair: Pair<Rule>) -> Expr {
    fold_fixed_op(pair, BinaryOp::LOGICAL_AND, build_bit_or)
}

fn build_bit_or(pair: Pair<Rule>) -> Expr {
    fold_fixed_op(pair, BinaryOp::BIT_OR, build_bit_xor)
}

fn build_bit_xor(pair: Pair<Rule>) -> Expr {
    fold_fixed_op(pair, BinaryOp::BIT_XOR, build_bit_and)
}

fn build_bit_and(pair: Pair<Rule>) -> Expr {
    fold_fixed_op(pair, BinaryOp::BIT_AND, build_equality)
}

/// Folds a level whose single operator never needs disambiguating from
/// source text (`||`, `&&`, `|`, `^`, `&` each own one precedence level).
fn fold_fixed_op(pair: Pair<Rule>, op: BinaryOp, operand: fn(Pair<Rule>) -> Expr) -> Expr {
    let mut operands = pair.into_inner().map(operand);
    let mut acc = operands.next().expect("at least one operand");
    for rhs in operands {
        let span = acc.span().merge(&rhs.span());
        acc = Expr::Binary { op, lhs: Box::new(acc), rhs: Box::new(rhs), span };
    }
    acc
}

fn build_equality(pair: Pair<Rule>) -> Expr {
    fold_tagged_op(pair, build_comparison, |t| match t {
        "==" => BinaryOp::EQUAL,
        "!=" => BinaryOp::NOT_EQUAL,
        other => unreachable!("unknown equality operator: {other}"),
    })
}

fn build_comparison(pair: Pair<Rule>) -> Expr {
    fold_tagged_op(pair, build_shift, |t| match t {
        "<=" => BinaryOp::LESS_EQUAL,
        ">=" => BinaryOp::GREATER_EQUAL,
        "<" => BinaryOp::LESS_THAN,
        ">" => BinaryOp::GREATER_THAN,
        other => unreachable!("unknown comparison operator: {other}"),
    })
}

fn build_shift(pair: Pair<Rule>) -> Expr {
    fold_tagged_op(pair, build_term, |t| match t {
        "<<" => BinaryOp::SHL,
        ">>" => BinaryOp::SHR,
        other => unreachable!("unknown shift operator: {other}"),
    })
}

fn build_term(pair: Pair<Rule>) -> Expr {
    fold_tagged_op(pair, build_factor, |t| match t {
        "+" => BinaryOp::ADD,
        "-" => BinaryOp::SUB,
        other => unreachable!("unknown term operator: {other}"),
    })
}

fn build_factor(pair: Pair<Rule>) -> Expr {
    fold_tagged_op(pair, build_unary, |t| match t {
        "*" => BinaryOp::MUL,
        "/" => BinaryOp::DIV,
        "%" => BinaryOp::MOD,
        other => unreachable!("unknown factor operator: {other}"),
    })
}

/// Folds a level whose grammar captures the matched operator as its own
/// pair (`equality_op`, `comparison_op`, `shift_op`, `term_op`, `factor_op`),
/// since more than one operator shares the level.
fn fold_tagged_op(pair: Pair<Rule>, operand: fn(Pair<Rule>) -> Expr, op_of: fn(&str) -> BinaryOp) -> Expr {
    let mut parts = pair.into_inner();
    let mut acc = operand(parts.next().expect("at least one operand"));
    let mut pending_op = None;
    for part in parts {
        if is_op_rule(part.as_rule()) {
            pending_op = Some(op_of(part.as_str()));
        } else {
            let rhs = operand(part);
            let op = pending_op.take().expect("operator between two operands");
            let span = acc.span().merge(&rhs.span());
            acc = Expr::Binary { op, lhs: Box::new(acc), rhs: Box::new(rhs), span };
        }
    }
    acc
}

fn is_op_rule(rule: Rule) -> bool {
    matches!(rule, Rule::equality_op | Rule::comparison_op | Rule::shift_op | Rule::term_op | Rule::factor_op)
}

fn build_unary(pair: Pair<Rule>) -> Expr {
    let span = span_of(&pair);
    let mut parts = pair.into_inner();
    let first = parts.next().expect("unary has an operand or a postfix");
    match first.as_rule() {
        Rule::unary_op => {
            let op = unary_op_from(first.as_str());
            let operand = build_unary(parts.next().expect("unary operand"));
            Expr::Unary { op, operand: Box::new(operand), span }
        }
        Rule::postfix => build_postfix(first),
        other => unreachable!("unexpected unary alternative: {other:?}"),
    }
}

fn unary_op_from(text: &str) -> UnaryOp {
    match text {
        "-" => UnaryOp::NEGATE,
        "!" => UnaryOp::NOT,
        "~" => UnaryOp::BIT_NOT,
        "@" => UnaryOp::ADDRESS_OF,
        other => unreachable!("unknown unary operator: {other}"),
    }
}

fn build_postfix(pair: Pair<Rule>) -> Expr {
    let mut parts = pair.into_inner();
    let mut expr = build_primary(parts.next().expect("postfix primary"));
    for op_pair in parts {
        let op_span = span_of(&op_pair);
        let inner = op_pair.into_inner().next().expect("postfix_op has exactly one alternative");
        expr = match inner.as_rule() {
            Rule::call_args => {
                let args = inner.into_inner().map(build_expr).collect();
                Expr::Call { callee: Box::new(expr.clone()), args, span: expr.span().merge(&op_span) }
            }
            Rule::index_op => {
                let index = build_expr(inner.into_inner().next().expect("index expression"));
                Expr::Index { object: Box::new(expr.clone()), index: Box::new(index), span: expr.span().merge(&op_span) }
            }
            Rule::member_op => {
                let property = inner.into_inner().next().expect("member identifier").as_str().to_string();
                Expr::Member { object: Box::new(expr.clone()), property, span: expr.span().merge(&op_span) }
            }
            other => unreachable!("unexpected postfix_op alternative: {other:?}"),
        };
    }
    expr
}

fn build_primary(pair: Pair<Rule>) -> Expr {
    let inner = pair.into_inner().next().expect("primary has exactly one alternative");
    match inner.as_rule() {
        Rule::literal => build_literal(inner),
        Rule::array_literal => build_array_literal(inner),
        Rule::expr => build_expr(inner),
        Rule::identifier => Expr::Identifier { name: inner.as_str().to_string(), span: span_of(&inner) },
        other => unreachable!("unexpected primary alternative: {other:?}"),
    }
}

fn build_array_literal(pair: Pair<Rule>) -> Expr {
    let span = span_of(&pair);
    let elements = pair.into_inner().map(build_expr).collect();
    Expr::ArrayLiteral { elements, span }
}

fn build_literal(pair: Pair<Rule>) -> Expr {
    let span = span_of(&pair);
    let inner = pair.into_inner().next().expect("literal has exactly one alternative");
    let value = match inner.as_rule() {
        Rule::bool_literal => Literal::Bool(inner.as_str() == "true"),
        Rule::string_literal => {
            let text = inner.as_str();
            Literal::Str(text[1..text.len() - 1].to_string())
        }
        Rule::integer_literal => build_integer_literal(inner),
        other => unreachable!("unexpected literal alternative: {other:?}"),
    };
    Expr::Literal { value, span }
}

fn build_integer_literal(pair: Pair<Rule>) -> Literal {
    let text = pair.as_str();
    if let Some(digits) = text.strip_prefix('$').or_else(|| text.strip_prefix("0x")) {
        Literal::Integer { value: i64::from_str_radix(digits, 16).unwrap_or(0), radix: Radix::Hex }
    } else if let Some(digits) = text.strip_prefix('%').or_else(|| text.strip_prefix("0b")) {
        Literal::Integer { value: i64::from_str_radix(digits, 2).unwrap_or(0), radix: Radix::Binary }
    } else {
        Literal::Integer { value: text.parse().unwrap_or(0), radix: Radix::Decimal }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Decl;

    #[test]
    fn parses_explicit_module_declaration() {
        let program = parse("module demo.sprites;\nfunction main() {\n}\n").unwrap();
        assert!(program.module.explicit);
        assert_eq!(program.module.name, vec!["demo".to_string(), "sprites".to_string()]);
    }

    #[test]
    fn defaults_to_an_implicit_module_when_none_is_declared() {
        let program = parse("function main() {\n}\n").unwrap();
        assert!(!program.module.explicit);
        assert!(program.module.name.is_empty());
    }

    #[test]
    fn parses_exported_stub_function_with_params_and_return_type() {
        let program = parse("export function add(a: byte, b: byte): byte;\n").unwrap();
        let Decl::Export { inner, .. } = &program.declarations[0] else { panic!("expected an export wrapper") };
        let Decl::Function(f) = inner.as_ref() else { panic!("expected a function declaration") };
        assert!(f.exported);
        assert!(f.stub);
        assert!(f.body.is_none());
        assert_eq!(f.params.len(), 2);
        assert_eq!(f.return_type.as_deref(), Some("byte"));
    }

    #[test]
    fn parses_callback_function() {
        let program = parse("callback function on_raster() {\n}\n").unwrap();
        let Decl::Function(f) = &program.declarations[0] else { panic!("expected a function declaration") };
        assert!(f.callback);
        assert!(!f.stub);
    }

    #[test]
    fn parses_zero_page_variable_with_explicit_address() {
        let program = parse("let @zp($02) counter: byte = 0;\n").unwrap();
        let Decl::Variable(v) = &program.declarations[0] else { panic!("expected a variable declaration") };
        assert_eq!(v.storage, StorageClass::ZeroPage);
        assert!(v.explicit_address.is_some());
        assert!(!v.constant);
    }

    #[test]
    fn parses_hex_and_binary_integer_literals() {
        let program = parse("let a: byte = $ff;\nlet b: byte = %1010;\nlet c: byte = 0x10;\n").unwrap();
        let Decl::Variable(a) = &program.declarations[0] else { panic!() };
        let Some(Expr::Literal { value: Literal::Integer { value, radix }, .. }) = &a.initializer else { panic!() };
        assert_eq!(*value, 255);
        assert_eq!(*radix, Radix::Hex);
    }

    #[test]
    fn respects_arithmetic_precedence() {
        let program = parse("function f() {\n  let x: byte = 1 + 2 * 3;\n}\n").unwrap();
        let Decl::Function(f) = &program.declarations[0] else { panic!() };
        let Stmt::Let(v) = &f.body.as_ref().unwrap()[0] else { panic!() };
        let Some(Expr::Binary { op, lhs, rhs, .. }) = &v.initializer else { panic!() };
        assert_eq!(*op, BinaryOp::ADD);
        assert!(matches!(lhs.as_ref(), Expr::Literal { .. }));
        assert!(matches!(rhs.as_ref(), Expr::Binary { op: BinaryOp::MUL, .. }));
    }

    #[test]
    fn parses_for_loop_with_step() {
        let program = parse("function f() {\n  for (i in 0..10:2) {\n  }\n}\n").unwrap();
        let Decl::Function(f) = &program.declarations[0] else { panic!() };
        let Stmt::For { loop_var, step, .. } = &f.body.as_ref().unwrap()[0] else { panic!() };
        assert_eq!(loop_var, "i");
        assert!(step.is_some());
    }

    #[test]
    fn parses_memory_map_struct_with_explicit_field_addresses() {
        let program = parse("map sid @$d400 {\n  freq: word @$d400,\n  control: byte @$d404,\n};\n").unwrap();
        let Decl::MemoryMap(MemoryMapDecl::ExplicitStruct { fields, .. }) = &program.declarations[0] else {
            panic!("expected an explicit-struct memory map")
        };
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn rejects_malformed_source() {
        let result = parse("function (( {\n");
        assert!(result.is_err());
    }
}
