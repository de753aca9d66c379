#![allow(dead_code)]

use std::sync::Arc;

use carve_extract::{classify_selection, ExtractMethodOptions, OperationStatus, Selection};
use carve_test_utils::Fixture;

/// `class C { <modifiers> void M(<params>) { <body> } }` as a fixture.
pub fn method(modifiers: &str, params: &str, body: &str) -> String {
    method_returning(modifiers, r#"(TypeRef "void")"#, params, body)
}

pub fn method_returning(modifiers: &str, return_type: &str, params: &str, body: &str) -> String {
    format!(
        r#"(CompilationUnit
             (ClassDeclaration "class" "C" "{{" nl
               (MethodDeclaration {modifiers} {return_type} "M" (ParameterList "(" {params} ")")
                 (Block "{{" nl
                   {body} nl
                 "}}")) nl
             "}}"))"#
    )
}

/// `int name;` or `int name = value;`
pub fn int_local(name: &str, value: Option<&str>) -> String {
    match value {
        None => format!(
            r#"(LocalDeclarationStatement (VariableDeclaration (TypeRef "int") (VariableDeclarator "{name}")) ";")"#
        ),
        Some(value) => format!(
            r#"(LocalDeclarationStatement
                 (VariableDeclaration (TypeRef "int")
                   (VariableDeclarator "{name}" (EqualsValueClause "=" (LiteralExpression "{value}"))))
                 ";")"#
        ),
    }
}

/// `Use(name);`
pub fn use_of(name: &str) -> String {
    format!(
        r#"(ExpressionStatement
             (InvocationExpression (NameExpression "Use") (ArgumentList "(" (Argument (NameExpression "{name}")) ")"))
             ";")"#
    )
}

/// Classifies the `$0..$1` selection of `fixture`.
pub fn select(fixture: &Fixture, options: &ExtractMethodOptions) -> Result<Selection, OperationStatus> {
    classify_selection(Arc::new(fixture.tree.clone()), fixture.selection(), options)
}

/// The single hard failure message of a rejected selection.
#[track_caller]
pub fn rejection(result: Result<Selection, OperationStatus>) -> String {
    match result {
        Ok(selection) => panic!(
            "expected a rejection, got a {:?} selection of {:?}",
            selection.selection_type(),
            &selection.tree().text()[selection.final_span()]
        ),
        Err(status) => {
            assert!(status.failed_hard(), "rejections are hard: {status}");
            status.message().unwrap_or_default()
        }
    }
}
