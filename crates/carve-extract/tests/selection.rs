mod support;

use std::sync::Arc;

use carve_core::{CancellationToken, Cancelled, DocumentVersion};
use carve_extract::{
    classify_selection_with, messages, ExtractMethodOptions, ScopeKind, SelectionType,
};
use carve_semantic::FlowRegion;
use carve_syntax::SyntaxKind;
use carve_test_utils::{init_tracing, parse_fixture};
use pretty_assertions::assert_eq;

use support::{int_local, method, rejection, select, use_of};

fn defaults() -> ExtractMethodOptions {
    ExtractMethodOptions::default()
}

#[test]
fn exact_expression_is_an_expression_selection() {
    init_tracing();
    let fixture = parse_fixture(&method(
        "",
        r#"(Parameter (TypeRef "int") "a") "," (Parameter (TypeRef "int") "b")"#,
        r#"(LocalDeclarationStatement
             (VariableDeclaration (TypeRef "int")
               (VariableDeclarator "c"
                 (EqualsValueClause "=" $0(BinaryExpression (NameExpression "a") "+" (NameExpression "b"))$1)))
             ";")"#,
    ));
    let selection = select(&fixture, &defaults()).unwrap();

    assert_eq!(selection.selection_type(), SelectionType::Expression);
    assert_eq!(&fixture.tree.text()[selection.final_span()], "a + b");
    assert!(!selection.selection_changed());
    assert_eq!(selection.scope().kind, ScopeKind::Method);
    let expr = fixture.node(SyntaxKind::BinaryExpression, "a + b");
    assert_eq!(selection.region(), FlowRegion::Expression(expr));
    assert!(selection.status().message().is_none());
}

#[test]
fn partial_expression_expands_to_the_statement() {
    let fixture = parse_fixture(&method(
        "",
        "",
        r#"(LocalDeclarationStatement
             (VariableDeclaration (TypeRef "int")
               (VariableDeclarator "c"
                 (EqualsValueClause "=" (BinaryExpression $0(NameExpression "a") "+"$1 (NameExpression "b")))))
             ";")"#,
    ));
    let selection = select(&fixture, &defaults()).unwrap();

    assert_eq!(selection.selection_type(), SelectionType::SingleStatement);
    assert_eq!(&fixture.tree.text()[selection.final_span()], "int c = a + b;");
    assert!(selection.selection_changed());
    assert_eq!(selection.original_span(), fixture.selection());
}

#[test]
fn span_across_statements_selects_the_sibling_run() {
    let body = format!(
        r#"{} nl (ExpressionStatement (AssignmentExpression $0(NameExpression "x") "=" (LiteralExpression "2")) ";") nl
           (ExpressionStatement (AssignmentExpression (NameExpression "x") "=" (LiteralExpression "3"))$1 ";") nl
           {}"#,
        int_local("x", Some("1")),
        use_of("x"),
    );
    let fixture = parse_fixture(&method("", "", &body));

    let selection = select(&fixture, &defaults()).unwrap();
    assert_eq!(selection.selection_type(), SelectionType::MultipleStatements);
    assert_eq!(
        &fixture.tree.text()[selection.final_span()],
        "x = 2;\nx = 3;"
    );
    assert!(selection.selection_changed());

    // Without expansion only fully covered statements count, and the first
    // one is covered.
    let options = ExtractMethodOptions {
        allow_selection_expansion: false,
        ..defaults()
    };
    let selection = select(&fixture, &options).unwrap();
    assert_eq!(selection.selection_type(), SelectionType::SingleStatement);
    assert_eq!(&fixture.tree.text()[selection.final_span()], "x = 2;");
}

#[test]
fn no_contained_statement_without_expansion() {
    let fixture = parse_fixture(&method(
        "",
        "",
        r#"(ExpressionStatement (AssignmentExpression $0(NameExpression "x") "="$1 (LiteralExpression "2")) ";")"#,
    ));
    let options = ExtractMethodOptions {
        allow_selection_expansion: false,
        ..defaults()
    };
    assert_eq!(
        rejection(select(&fixture, &options)),
        messages::NO_VALID_STATEMENT_RANGE
    );
}

#[test]
fn constant_initializers_are_rejected() {
    let fixture = parse_fixture(&method(
        "",
        "",
        r#"(LocalDeclarationStatement "const"
             (VariableDeclaration (TypeRef "int")
               (VariableDeclarator "k"
                 (EqualsValueClause "=" $0(BinaryExpression (LiteralExpression "1") "+" (LiteralExpression "2"))$1)))
             ";")"#,
    ));
    assert_eq!(
        rejection(select(&fixture, &defaults())),
        messages::CONSTANT_INITIALIZER
    );

    let fixture = parse_fixture(
        r#"(CompilationUnit
             (ClassDeclaration "class" "C" "{" nl
               (FieldDeclaration "const"
                 (VariableDeclaration (TypeRef "int")
                   (VariableDeclarator "K"
                     (EqualsValueClause "=" $0(BinaryExpression (LiteralExpression "1") "+" (LiteralExpression "2"))$1)))
                 ";") nl
             "}"))"#,
    );
    assert_eq!(
        rejection(select(&fixture, &defaults())),
        messages::CONSTANT_INITIALIZER
    );
}

#[test]
fn field_initializer_is_a_valid_scope() {
    let fixture = parse_fixture(
        r#"(CompilationUnit
             (ClassDeclaration "class" "C" "{" nl
               (FieldDeclaration "static"
                 (VariableDeclaration (TypeRef "int")
                   (VariableDeclarator "F"
                     (EqualsValueClause "=" $0(BinaryExpression (LiteralExpression "1") "+" (LiteralExpression "2"))$1)))
                 ";") nl
             "}"))"#,
    );
    let selection = select(&fixture, &defaults()).unwrap();
    assert_eq!(selection.scope().kind, ScopeKind::FieldInitializer);
    assert!(selection.facts().scope_is_static);
}

#[test]
fn ref_and_out_arguments_are_rejected() {
    for modifier in ["ref", "out"] {
        let fixture = parse_fixture(&method(
            "",
            "",
            &format!(
                r#"(ExpressionStatement
                     (InvocationExpression (NameExpression "F")
                       (ArgumentList "(" (Argument "{modifier}" $0(NameExpression "v")$1) ")"))
                     ";")"#
            ),
        ));
        assert_eq!(
            rejection(select(&fixture, &defaults())),
            messages::REF_OR_OUT_ARGUMENT,
            "{modifier}"
        );
    }
}

#[test]
fn yield_is_rejected_unless_nested() {
    let fixture = parse_fixture(&method(
        "",
        "",
        r#"$0(YieldStatement "yield" "return" (LiteralExpression "1") ";")$1"#,
    ));
    assert_eq!(rejection(select(&fixture, &defaults())), messages::CONTAINS_YIELD);

    let fixture = parse_fixture(&method(
        "",
        "",
        r#"$0(LocalFunctionStatement (TypeRef "int") "Gen" (ParameterList "(" ")")
             (Block "{" (YieldStatement "yield" "return" (LiteralExpression "1") ";") "}"))$1"#,
    ));
    let selection = select(&fixture, &defaults()).unwrap();
    assert_eq!(selection.selection_type(), SelectionType::SingleStatement);
}

#[test]
fn syntax_errors_are_rejected() {
    let fixture = parse_fixture(&method(
        "",
        "",
        r#"$0(ExpressionStatement (NameExpression "a") Error:"@" ";")$1"#,
    ));
    assert_eq!(rejection(select(&fixture, &defaults())), messages::SYNTAX_ERRORS);
}

#[test]
fn directives_must_balance() {
    let fixture = parse_fixture(&method(
        "",
        "",
        r##"$0(ExpressionStatement (NameExpression "a") ";") nl
           IfDirective:"#if DEBUG" nl
           (ExpressionStatement (NameExpression "b") ";")$1 nl
           EndIfDirective:"#endif""##,
    ));
    assert_eq!(
        rejection(select(&fixture, &defaults())),
        messages::CROSSES_DIRECTIVES
    );
}

#[test]
fn selection_must_be_inside_a_type() {
    let fixture = parse_fixture(
        r#"(CompilationUnit
             (MethodDeclaration (TypeRef "void") "M" (ParameterList "(" ")")
               (Block "{" nl $0(ExpressionStatement (NameExpression "a") ";")$1 nl "}")))"#,
    );
    assert_eq!(rejection(select(&fixture, &defaults())), messages::NOT_IN_TYPE);
}

#[test]
fn out_of_range_span_is_invalid() {
    let fixture = parse_fixture(&method("", "", r#"$0(ExpressionStatement (NameExpression "a") ";")$1"#));
    let len = fixture.tree.text_len();
    let span = carve_core::TextRange::new(0.into(), len + carve_core::TextSize::from(1));
    let result = carve_extract::classify_selection(Arc::new(fixture.tree.clone()), span, &defaults());
    assert_eq!(rejection(result), messages::INVALID_SELECTION);
}

#[test]
fn partial_loop_block_widens_with_a_note() {
    let fixture = parse_fixture(&method(
        "",
        "",
        r#"(LoopBlock
             (LoopHeader "For" (NameExpression "i")) nl
             $0(ExpressionStatement (NameExpression "a") ";") nl
             (LoopTrailer "Next")$1)"#,
    ));
    let selection = select(&fixture, &defaults()).unwrap();

    assert_eq!(selection.selection_type(), SelectionType::SingleStatement);
    assert_eq!(
        &fixture.tree.text()[selection.final_span()],
        "For i\na;\nNext"
    );
    assert!(selection.status().succeeded());
    assert_eq!(
        selection.status().message().as_deref(),
        Some(messages::LOOP_WIDENED)
    );
}

#[test]
fn async_static_and_await_facts() {
    let fixture = parse_fixture(&method(
        r#""static" "async""#,
        "",
        r#"$0(ExpressionStatement
             (AwaitExpression "await" (InvocationExpression (NameExpression "Go") (ArgumentList "(" ")")))
             ";")$1"#,
    ));
    let selection = select(&fixture, &defaults()).unwrap();
    let facts = selection.facts();
    assert!(facts.contains_await);
    assert!(facts.scope_is_async);
    assert!(facts.scope_is_static);
    assert!(!facts.contains_configure_await_false);
    assert!(selection.requires_async());
}

#[test]
fn await_inside_a_lambda_does_not_count() {
    let fixture = parse_fixture(&method(
        "",
        "",
        r#"$0(ExpressionStatement
             (InvocationExpression (NameExpression "Run")
               (ArgumentList "("
                 (Argument
                   (LambdaExpression "async" (ParameterList "(" ")") "=>"
                     (AwaitExpression "await" (NameExpression "t"))))
                 ")"))
             ";")$1"#,
    ));
    let selection = select(&fixture, &defaults()).unwrap();
    assert!(!selection.requires_async());
}

#[test]
fn primary_constructor_base_arguments() {
    let fixture = parse_fixture(
        r#"(CompilationUnit
             (RecordDeclaration "record" "R" (ParameterList "(" (Parameter (TypeRef "int") "x") ")")
               (BaseList ":"
                 (PrimaryConstructorBaseType (TypeRef "Base")
                   (ArgumentList "("
                     (Argument $0(BinaryExpression (NameExpression "x") "+" (LiteralExpression "1"))$1)
                     ")")))
               ";"))"#,
    );
    let selection = select(&fixture, &defaults()).unwrap();
    assert_eq!(selection.scope().kind, ScopeKind::PrimaryConstructorBaseType);
    assert!(selection.facts().in_primary_constructor_base_type);
    assert_eq!(selection.selection_type(), SelectionType::Expression);
}

#[test]
fn rehoming_keeps_the_original_span() {
    let fixture = parse_fixture(&method(
        "",
        "",
        r#"(ExpressionStatement (AssignmentExpression $0(NameExpression "x") "="$1 (LiteralExpression "2")) ";")"#,
    ));
    let selection = select(&fixture, &defaults()).unwrap();
    assert!(selection.selection_changed());

    let next = fixture.tree.with_version(DocumentVersion(1));
    let rehomed = selection.with_tree(Arc::new(next)).unwrap();
    assert_eq!(rehomed.tree().version(), DocumentVersion(1));
    assert_eq!(rehomed.original_span(), selection.original_span());
    assert_eq!(rehomed.final_span(), selection.final_span());
    assert!(rehomed.selection_changed());
    assert_eq!(selection.tree().version(), DocumentVersion::default());
}

#[test]
fn cancelled_classification_stops() {
    let fixture = parse_fixture(&method("", "", r#"$0(ExpressionStatement (NameExpression "a") ";")$1"#));
    let token = CancellationToken::new();
    token.cancel();
    let result = classify_selection_with(
        Arc::new(fixture.tree.clone()),
        fixture.selection(),
        &defaults(),
        &mut token.checker(),
    );
    assert_eq!(result.err(), Some(Cancelled));
}
