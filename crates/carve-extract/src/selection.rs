//! Turns a raw text span into a validated [`Selection`].
//!
//! The classifier only looks at syntax. It normalizes the span, finds the
//! bounding tokens, decides between an expression and a statement range,
//! and rejects spans no extracted method could replace.

use std::sync::Arc;

use carve_core::{Cancelled, TextRange};
use carve_semantic::FlowRegion;
use carve_syntax::{NodeId, SyntaxKind, SyntaxTree, TokenId};
use serde::Serialize;

use crate::options::ExtractMethodOptions;
use crate::status::{messages, OperationStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionType {
    Expression,
    SingleStatement,
    MultipleStatements,
}

impl SelectionType {
    pub fn is_expression(self) -> bool {
        self == SelectionType::Expression
    }

    pub fn is_statements(self) -> bool {
        !self.is_expression()
    }
}

/// What kind of body the selection lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    Method,
    Constructor,
    Accessor,
    LocalFunction,
    Lambda,
    FieldInitializer,
    PrimaryConstructorBaseType,
}

/// The innermost body that contains a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtractScope {
    /// The declaration owning the body (method, lambda, declarator, ...).
    pub member: NodeId,
    /// The body itself: a block, an expression body, an initializer, or a
    /// base-type argument list.
    pub body: NodeId,
    pub kind: ScopeKind,
}

/// Syntactic facts about the final span, computed once per selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SelectionFacts {
    /// `await`, `await foreach` or `await using` outside nested functions.
    pub contains_await: bool,
    pub contains_configure_await_false: bool,
    pub scope_is_async: bool,
    /// The containing member (or one of its containers) is static.
    pub scope_is_static: bool,
    pub in_primary_constructor_base_type: bool,
    pub in_constructor: bool,
}

/// A validated extraction unit.
///
/// Immutable once built. [`Selection::with_tree`] produces a new selection
/// bound to another snapshot of the document.
#[derive(Debug, Clone)]
pub struct Selection {
    tree: Arc<SyntaxTree>,
    original_span: TextRange,
    final_span: TextRange,
    selection_type: SelectionType,
    selection_changed: bool,
    first_token: TokenId,
    last_token: TokenId,
    scope: ExtractScope,
    common_root: NodeId,
    region: FlowRegion,
    facts: SelectionFacts,
    status: OperationStatus,
    allow_expansion: bool,
}

impl Selection {
    pub fn tree(&self) -> &Arc<SyntaxTree> {
        &self.tree
    }

    /// The span the user asked for.
    pub fn original_span(&self) -> TextRange {
        self.original_span
    }

    /// Token-aligned span that will be replaced by the call.
    pub fn final_span(&self) -> TextRange {
        self.final_span
    }

    pub fn selection_type(&self) -> SelectionType {
        self.selection_type
    }

    pub fn is_expression(&self) -> bool {
        self.selection_type.is_expression()
    }

    /// Whether the final bounding tokens differ from the ones under the
    /// user's original span.
    pub fn selection_changed(&self) -> bool {
        self.selection_changed
    }

    pub fn first_token(&self) -> TokenId {
        self.first_token
    }

    pub fn last_token(&self) -> TokenId {
        self.last_token
    }

    pub fn scope(&self) -> ExtractScope {
        self.scope
    }

    /// Expression node, or the container of the statement range.
    pub fn common_root(&self) -> NodeId {
        self.common_root
    }

    /// Region to hand to the data-flow provider.
    pub fn region(&self) -> FlowRegion {
        self.region
    }

    pub fn facts(&self) -> &SelectionFacts {
        &self.facts
    }

    /// Soft notes raised while classifying (always `succeeded`).
    pub fn status(&self) -> &OperationStatus {
        &self.status
    }

    /// The extracted method has to be `async`.
    pub fn requires_async(&self) -> bool {
        self.facts.contains_await
    }

    /// Re-homes the selection onto `tree` by its final span.
    ///
    /// The result keeps this selection's original span, and reports a change
    /// if either classification moved the bounds.
    pub fn with_tree(&self, tree: Arc<SyntaxTree>) -> Result<Selection, OperationStatus> {
        let options = ExtractMethodOptions {
            allow_selection_expansion: self.allow_expansion,
            ..ExtractMethodOptions::default()
        };
        let mut rehomed = classify_selection(tree, self.final_span, &options)?;
        rehomed.original_span = self.original_span;
        rehomed.selection_changed |= self.selection_changed;
        Ok(rehomed)
    }
}

/// Classifies `span` of `tree`.
///
/// Every rejection is a hard [`OperationStatus`]. Soft notes ride along in
/// [`Selection::status`].
pub fn classify_selection(
    tree: Arc<SyntaxTree>,
    span: TextRange,
    options: &ExtractMethodOptions,
) -> Result<Selection, OperationStatus> {
    match classify_selection_with(tree, span, options, &mut || Ok(())) {
        Ok(result) => result,
        Err(Cancelled) => Err(OperationStatus::failed(messages::CANCELLED)),
    }
}

/// Like [`classify_selection`], calling `check_cancelled` at every traversal
/// step.
pub fn classify_selection_with(
    tree: Arc<SyntaxTree>,
    span: TextRange,
    options: &ExtractMethodOptions,
    check_cancelled: &mut dyn FnMut() -> Result<(), Cancelled>,
) -> Result<Result<Selection, OperationStatus>, Cancelled> {
    let classified = Classifier {
        tree: &tree,
        allow_expansion: options.allow_selection_expansion,
        check_cancelled,
    }
    .classify(span);

    let parts = match classified {
        Ok(parts) => parts,
        Err(Rejected::Cancelled(cancelled)) => return Err(cancelled),
        Err(Rejected::Status(status)) => {
            tracing::debug!(target: "carve.extract", ?span, %status, "selection rejected");
            return Ok(Err(status));
        }
    };

    tracing::debug!(
        target: "carve.extract",
        original = ?span,
        final_span = ?parts.final_span,
        selection_type = ?parts.selection_type,
        changed = parts.selection_changed,
        "selection classified"
    );

    Ok(Ok(Selection {
        tree,
        original_span: span,
        final_span: parts.final_span,
        selection_type: parts.selection_type,
        selection_changed: parts.selection_changed,
        first_token: parts.first_token,
        last_token: parts.last_token,
        scope: parts.scope,
        common_root: parts.common_root,
        region: parts.region,
        facts: parts.facts,
        status: parts.status,
        allow_expansion: options.allow_selection_expansion,
    }))
}

enum Rejected {
    Status(OperationStatus),
    Cancelled(Cancelled),
}

impl From<Cancelled> for Rejected {
    fn from(cancelled: Cancelled) -> Self {
        Rejected::Cancelled(cancelled)
    }
}

fn reject<T>(reason: &str) -> Result<T, Rejected> {
    Err(Rejected::Status(OperationStatus::failed(reason)))
}

struct Parts {
    final_span: TextRange,
    selection_type: SelectionType,
    selection_changed: bool,
    first_token: TokenId,
    last_token: TokenId,
    scope: ExtractScope,
    common_root: NodeId,
    region: FlowRegion,
    facts: SelectionFacts,
    status: OperationStatus,
}

struct StatementRange {
    container: NodeId,
    first: NodeId,
    last: NodeId,
}

struct Classifier<'t, 'c> {
    tree: &'t SyntaxTree,
    allow_expansion: bool,
    check_cancelled: &'c mut dyn FnMut() -> Result<(), Cancelled>,
}

impl Classifier<'_, '_> {
    fn check(&mut self) -> Result<(), Cancelled> {
        (self.check_cancelled)()
    }

    fn classify(mut self, span: TextRange) -> Result<Parts, Rejected> {
        let tree = self.tree;
        if span.end() > tree.text_len() {
            return reject(messages::INVALID_SELECTION);
        }
        let span = adjust_span(tree, span);

        let (Some(first), Some(last)) = (
            tree.find_token_on_right(span.start()),
            tree.find_token_on_left(span.end()),
        ) else {
            return reject(messages::INVALID_SELECTION);
        };
        if first > last {
            return reject(messages::NO_VALID_TOKEN);
        }

        self.check()?;
        if self.scope_of(tree.token_parent(first))?.is_none()
            || self.scope_of(tree.token_parent(last))?.is_none()
        {
            return reject(messages::NO_VALID_SELECTION);
        }

        let Some(common) = tree.token_common_ancestor(first, last) else {
            return reject(messages::NO_COMMON_ROOT);
        };
        if !tree
            .ancestors(common)
            .any(|node| tree.kind(node).is_type_declaration())
        {
            return reject(messages::NOT_IN_TYPE);
        }
        let Some(scope) = self.scope_of(common)? else {
            return reject(messages::NO_VALID_SELECTION);
        };

        let mut status = OperationStatus::ok();
        let (selection_type, region, common_root, final_first, final_last) =
            match self.exact_expression(common, first, last, scope)? {
                Some(expr) => {
                    self.check_expression_context(expr, scope)?;
                    (
                        SelectionType::Expression,
                        FlowRegion::Expression(expr),
                        expr,
                        first,
                        last,
                    )
                }
                None => {
                    let range = if self.allow_expansion {
                        self.smallest_range_containing(first, last, scope)?
                    } else {
                        self.largest_range_contained(span, scope)?
                    };
                    let Some(range) = range else {
                        return reject(messages::NO_VALID_STATEMENT_RANGE);
                    };
                    let (range, widened) = widen_loop_block(tree, range);
                    if widened {
                        status = status.with(OperationStatus::warning(messages::LOOP_WIDENED));
                    }
                    let (Some(final_first), Some(final_last)) =
                        (tree.first_token(range.first), tree.last_token(range.last))
                    else {
                        return reject(messages::NO_VALID_STATEMENT_RANGE);
                    };
                    let selection_type = if range.first == range.last {
                        SelectionType::SingleStatement
                    } else {
                        SelectionType::MultipleStatements
                    };
                    (
                        selection_type,
                        FlowRegion::Statements {
                            first: range.first,
                            last: range.last,
                        },
                        range.container,
                        final_first,
                        final_last,
                    )
                }
            };

        let final_span = TextRange::new(
            tree.token_range(final_first).start(),
            tree.token_range(final_last).end(),
        );
        if tree.contains_errors_in(final_span) {
            return reject(messages::SYNTAX_ERRORS);
        }
        if crosses_directives(tree, final_span) {
            return reject(messages::CROSSES_DIRECTIVES);
        }

        let roots = region_roots(tree, region);
        let mut facts = SelectionFacts::default();
        let mut contains_yield = false;
        for node in self.nodes_outside_nested_functions(&roots)? {
            match tree.kind(node) {
                SyntaxKind::YieldStatement => contains_yield = true,
                SyntaxKind::AwaitExpression => facts.contains_await = true,
                SyntaxKind::ForEachStatement
                | SyntaxKind::UsingStatement
                | SyntaxKind::LocalDeclarationStatement
                    if tree.has_child_token(node, SyntaxKind::AwaitKw) =>
                {
                    facts.contains_await = true;
                }
                SyntaxKind::InvocationExpression if is_configure_await_false(tree, node) => {
                    facts.contains_configure_await_false = true;
                }
                _ => {}
            }
        }
        if contains_yield {
            return reject(messages::CONTAINS_YIELD);
        }

        facts.scope_is_async = tree.has_child_token(scope.member, SyntaxKind::AsyncKw);
        facts.scope_is_static = is_static_context(tree, scope.member);
        facts.in_primary_constructor_base_type = scope.kind == ScopeKind::PrimaryConstructorBaseType;
        facts.in_constructor = scope.kind == ScopeKind::Constructor;

        Ok(Parts {
            final_span,
            selection_type,
            selection_changed: final_first != first || final_last != last,
            first_token: final_first,
            last_token: final_last,
            scope,
            common_root,
            region,
            facts,
            status,
        })
    }

    /// Innermost extraction scope containing `node`.
    fn scope_of(&mut self, node: NodeId) -> Result<Option<ExtractScope>, Cancelled> {
        let tree = self.tree;
        let mut body = node;
        for member in tree.ancestors(node).skip(1) {
            self.check()?;
            if let Some(kind) = scope_kind(tree, body, member) {
                return Ok(Some(ExtractScope { member, body, kind }));
            }
            body = member;
        }
        Ok(None)
    }

    /// The expression spanning exactly `first..=last`, if any.
    fn exact_expression(
        &mut self,
        common: NodeId,
        first: TokenId,
        last: TokenId,
        scope: ExtractScope,
    ) -> Result<Option<NodeId>, Cancelled> {
        let tree = self.tree;
        for node in tree.ancestors(common) {
            self.check()?;
            if tree.first_token(node) != Some(first) || tree.last_token(node) != Some(last) {
                break;
            }
            if !tree.is_ancestor_of(scope.body, node) {
                break;
            }
            if tree.kind(node).is_expression() {
                return Ok(Some(node));
            }
        }
        Ok(None)
    }

    fn check_expression_context(
        &mut self,
        expr: NodeId,
        scope: ExtractScope,
    ) -> Result<(), Rejected> {
        let tree = self.tree;
        for node in tree.ancestors(expr) {
            self.check()?;
            if node == scope.member {
                break;
            }
            if matches!(
                tree.kind(node),
                SyntaxKind::LocalDeclarationStatement | SyntaxKind::FieldDeclaration
            ) && tree.has_child_token(node, SyntaxKind::ConstKw)
            {
                return reject(messages::CONSTANT_INITIALIZER);
            }
        }
        // A field initializer's declaration sits above the scope member.
        if scope.kind == ScopeKind::FieldInitializer {
            let is_const = tree
                .ancestors(scope.member)
                .find(|&node| tree.kind(node) == SyntaxKind::FieldDeclaration)
                .is_some_and(|field| tree.has_child_token(field, SyntaxKind::ConstKw));
            if is_const {
                return reject(messages::CONSTANT_INITIALIZER);
            }
        }

        if let Some(parent) = tree.parent(expr) {
            if tree.kind(parent) == SyntaxKind::Argument
                && (tree.has_child_token(parent, SyntaxKind::RefKw)
                    || tree.has_child_token(parent, SyntaxKind::OutKw))
            {
                return reject(messages::REF_OR_OUT_ARGUMENT);
            }
        }
        Ok(())
    }

    /// Nearest statement that sits in a statement list strictly inside the
    /// scope body.
    fn enclosing_statement(
        &mut self,
        node: NodeId,
        scope: ExtractScope,
    ) -> Result<Option<NodeId>, Cancelled> {
        let tree = self.tree;
        for candidate in tree.ancestors(node) {
            self.check()?;
            if candidate == scope.body {
                break;
            }
            if is_listed_statement(tree, candidate) {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// Smallest sibling run of statements covering both tokens.
    fn smallest_range_containing(
        &mut self,
        first: TokenId,
        last: TokenId,
        scope: ExtractScope,
    ) -> Result<Option<StatementRange>, Cancelled> {
        let tree = self.tree;
        let (Some(start), Some(end)) = (
            self.enclosing_statement(tree.token_parent(first), scope)?,
            self.enclosing_statement(tree.token_parent(last), scope)?,
        ) else {
            return Ok(None);
        };
        let Some(common) = tree.common_ancestor(start, end) else {
            return Ok(None);
        };

        for container in tree.ancestors(common) {
            self.check()?;
            if !tree.is_ancestor_of(scope.body, container) {
                break;
            }
            if container == start || container == end {
                continue;
            }
            if !tree.kind(container).is_statement_container() {
                continue;
            }
            let (Some(first), Some(last)) = (
                child_containing(tree, container, start),
                child_containing(tree, container, end),
            ) else {
                return Ok(None);
            };
            if !is_listed_statement(tree, first) || !is_listed_statement(tree, last) {
                return Ok(None);
            }
            return Ok(Some(StatementRange {
                container,
                first,
                last,
            }));
        }
        Ok(None)
    }

    /// Largest sibling run of statements that lies entirely inside `span`.
    fn largest_range_contained(
        &mut self,
        span: TextRange,
        scope: ExtractScope,
    ) -> Result<Option<StatementRange>, Cancelled> {
        let tree = self.tree;
        let mut outermost: Vec<NodeId> = Vec::new();
        for node in tree.descendants(scope.body) {
            self.check()?;
            if node == scope.body || !is_listed_statement(tree, node) {
                continue;
            }
            if !span.contains_range(tree.node_span(node)) {
                continue;
            }
            if outermost
                .last()
                .is_some_and(|&prev| tree.is_ancestor_of(prev, node))
            {
                continue;
            }
            outermost.push(node);
        }

        let (Some(&first), Some(&last)) = (outermost.first(), outermost.last()) else {
            return Ok(None);
        };
        let container = tree.parent(first);
        if outermost
            .iter()
            .any(|&node| tree.parent(node) != container)
        {
            return Ok(None);
        }
        Ok(container.map(|container| StatementRange {
            container,
            first,
            last,
        }))
    }

    /// Nodes under `roots` in preorder, not descending into lambdas or local
    /// functions.
    fn nodes_outside_nested_functions(
        &mut self,
        roots: &[NodeId],
    ) -> Result<Vec<NodeId>, Cancelled> {
        let tree = self.tree;
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = roots.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            self.check()?;
            if tree.kind(node).is_nested_function() {
                continue;
            }
            out.push(node);
            let children: Vec<NodeId> = tree.child_nodes(node).collect();
            stack.extend(children.into_iter().rev());
        }
        Ok(out)
    }
}

/// Pulls an end offset sitting at the very start of a line back to the end
/// of the previous line, so the span does not reach into the next line.
fn adjust_span(tree: &SyntaxTree, span: TextRange) -> TextRange {
    let index = tree.line_index();
    if span.is_empty() || !index.is_line_start(span.end()) {
        return span;
    }
    let line = index.line_of(span.end());
    if line == 0 {
        return span;
    }
    let Some(end) = index.line_end(line - 1) else {
        return span;
    };
    if end >= span.start() {
        return TextRange::new(span.start(), end);
    }
    match index.line_end_including_break(line - 1) {
        Some(end) if end >= span.start() => TextRange::new(span.start(), end),
        _ => span,
    }
}

fn scope_kind(tree: &SyntaxTree, body: NodeId, member: NodeId) -> Option<ScopeKind> {
    use SyntaxKind::*;

    let body_kind = tree.kind(body);
    let is_body = matches!(body_kind, Block | ArrowExpressionClause);
    match tree.kind(member) {
        MethodDeclaration if is_body => Some(ScopeKind::Method),
        ConstructorDeclaration if is_body => Some(ScopeKind::Constructor),
        AccessorDeclaration if is_body => Some(ScopeKind::Accessor),
        PropertyDeclaration if body_kind == ArrowExpressionClause => Some(ScopeKind::Accessor),
        PropertyDeclaration if body_kind == EqualsValueClause => Some(ScopeKind::FieldInitializer),
        LocalFunctionStatement if is_body => Some(ScopeKind::LocalFunction),
        LambdaExpression if body_kind == Block || body_kind.is_expression() => {
            Some(ScopeKind::Lambda)
        }
        VariableDeclarator if body_kind == EqualsValueClause && is_field_declarator(tree, member) => {
            Some(ScopeKind::FieldInitializer)
        }
        PrimaryConstructorBaseType if body_kind == ArgumentList => {
            Some(ScopeKind::PrimaryConstructorBaseType)
        }
        _ => None,
    }
}

fn is_field_declarator(tree: &SyntaxTree, declarator: NodeId) -> bool {
    tree.ancestors(declarator)
        .map(|node| tree.kind(node))
        .find(|&kind| kind == SyntaxKind::FieldDeclaration || kind.is_statement())
        == Some(SyntaxKind::FieldDeclaration)
}

/// A statement whose parent is a statement list.
fn is_listed_statement(tree: &SyntaxTree, node: NodeId) -> bool {
    tree.kind(node).is_statement()
        && tree
            .parent(node)
            .is_some_and(|parent| tree.kind(parent).is_statement_container())
}

/// The child of `container` that contains `node`.
fn child_containing(tree: &SyntaxTree, container: NodeId, node: NodeId) -> Option<NodeId> {
    tree.ancestors(node)
        .find(|&ancestor| tree.parent(ancestor) == Some(container))
}

/// Widens a range that cuts a loop block's header or trailer to the whole
/// loop. Returns whether any unselected part of the loop was pulled in.
fn widen_loop_block(tree: &SyntaxTree, range: StatementRange) -> (StatementRange, bool) {
    let is_loop_edge = |node: NodeId| {
        matches!(
            tree.kind(node),
            SyntaxKind::LoopHeader | SyntaxKind::LoopTrailer
        )
    };
    if tree.kind(range.container) != SyntaxKind::LoopBlock
        || !(is_loop_edge(range.first) || is_loop_edge(range.last))
    {
        return (range, false);
    }
    let block = range.container;
    let Some(container) = tree.parent(block) else {
        return (range, false);
    };
    if !tree.kind(container).is_statement_container() {
        return (range, false);
    }
    let whole = tree.kind(range.first) == SyntaxKind::LoopHeader
        && tree.kind(range.last) == SyntaxKind::LoopTrailer;
    (
        StatementRange {
            container,
            first: block,
            last: block,
        },
        !whole,
    )
}

fn region_roots(tree: &SyntaxTree, region: FlowRegion) -> Vec<NodeId> {
    match region {
        FlowRegion::Expression(node) => vec![node],
        FlowRegion::Statements { first, last } => {
            let Some(container) = tree.parent(first) else {
                return vec![first];
            };
            tree.child_nodes(container)
                .skip_while(|&node| node != first)
                .take_while(|&node| node <= last)
                .collect()
        }
    }
}

/// Directive regions must open and close inside the span, and an `#else` or
/// `#elif` may only appear inside a region opened in the span.
fn crosses_directives(tree: &SyntaxTree, span: TextRange) -> bool {
    let mut depth = 0u32;
    for token in tree.tokens_in_range(span) {
        let kind = tree.token_kind(token);
        if !kind.is_directive() {
            continue;
        }
        if kind.is_opening_directive() {
            depth += 1;
        } else if kind.is_closing_directive() {
            if depth == 0 {
                return true;
            }
            depth -= 1;
        } else if depth == 0 {
            return true;
        }
    }
    depth != 0
}

/// `expr.ConfigureAwait(false)`.
fn is_configure_await_false(tree: &SyntaxTree, invocation: NodeId) -> bool {
    let Some(callee) = tree.child_nodes(invocation).next() else {
        return false;
    };
    if tree.kind(callee) != SyntaxKind::MemberAccessExpression
        || tree
            .last_token(callee)
            .map(|token| tree.token_text(token))
            != Some("ConfigureAwait")
    {
        return false;
    }
    let Some(arguments) = tree.child_node_of_kind(invocation, SyntaxKind::ArgumentList) else {
        return false;
    };
    let args: Vec<NodeId> = tree
        .child_nodes(arguments)
        .filter(|&node| tree.kind(node) == SyntaxKind::Argument)
        .collect();
    match args.as_slice() {
        [arg] => tree
            .tokens(*arg)
            .any(|token| tree.token_kind(token) == SyntaxKind::FalseKw),
        _ => false,
    }
}

/// A `static` modifier on the member or anything enclosing it, up to and
/// including the nearest type declaration.
fn is_static_context(tree: &SyntaxTree, member: NodeId) -> bool {
    for node in tree.ancestors(member) {
        if tree.has_child_token(node, SyntaxKind::StaticKw) {
            return true;
        }
        if tree.kind(node).is_type_declaration() {
            break;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use carve_test_utils::parse_fixture;
    use pretty_assertions::assert_eq;

    use super::*;

    fn method(body: &str) -> String {
        format!(
            r#"(CompilationUnit
                 (ClassDeclaration "class" "C" "{{" nl
                   (MethodDeclaration (TypeRef "void") "M" (ParameterList "(" ")")
                     (Block "{{" nl {body} nl "}}")) nl
                 "}}"))"#
        )
    }

    fn classify(src: &str, options: &ExtractMethodOptions) -> Result<Selection, OperationStatus> {
        let fixture = parse_fixture(src);
        let span = fixture.selection();
        classify_selection(Arc::new(fixture.tree), span, options)
    }

    fn message(result: Result<Selection, OperationStatus>) -> String {
        let status = result.expect_err("selection should be rejected");
        assert!(status.failed_hard());
        status.message().unwrap_or_default()
    }

    #[test]
    fn span_ending_at_line_start_is_pulled_back() {
        let fixture = parse_fixture(&method(
            r#"$0(ExpressionStatement (NameExpression "a") ";") nl $1(ExpressionStatement (NameExpression "b") ";")"#,
        ));
        let span = adjust_span(&fixture.tree, fixture.range(0, 1));
        assert_eq!(&fixture.tree.text()[span], "a;");
    }

    #[test]
    fn cursor_inside_whitespace_has_no_token() {
        let src = method(r#"(ExpressionStatement (NameExpression "a") ";") nl $0$1 nl (ExpressionStatement (NameExpression "b") ";")"#);
        assert_eq!(
            message(classify(&src, &ExtractMethodOptions::default())),
            messages::NO_VALID_TOKEN
        );
    }

    #[test]
    fn selection_outside_any_body_is_rejected() {
        let src = r#"(CompilationUnit
             (ClassDeclaration "class" "C" "{" nl
               $0(FieldDeclaration (TypeRef "int") (VariableDeclarator "f") ";")$1 nl "}"))"#;
        assert_eq!(
            message(classify(src, &ExtractMethodOptions::default())),
            messages::NO_VALID_SELECTION
        );
    }

    #[test]
    fn configure_await_false_detection() {
        let src = method(
            r#"$0(ExpressionStatement
                 (AwaitExpression "await"
                   (InvocationExpression
                     (MemberAccessExpression (NameExpression "t") "." "ConfigureAwait")
                     (ArgumentList "(" (Argument (LiteralExpression "false")) ")")))
                 ";")$1"#,
        );
        let selection = classify(&src, &ExtractMethodOptions::default()).unwrap();
        assert!(selection.facts().contains_await);
        assert!(selection.facts().contains_configure_await_false);
        assert!(selection.requires_async());
    }

    #[test]
    fn directive_balance() {
        let fixture = parse_fixture(&method(
            r##"$0IfDirective:"#if X" nl (ExpressionStatement (NameExpression "a") ";") nl EndIfDirective:"#endif"$1 nl
               $2ElseDirective:"#else" nl (ExpressionStatement (NameExpression "b") ";")$3"##,
        ));
        assert!(!crosses_directives(&fixture.tree, fixture.range(0, 1)));
        assert!(crosses_directives(&fixture.tree, fixture.range(2, 3)));
    }
}
