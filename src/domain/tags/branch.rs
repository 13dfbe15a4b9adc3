//! Branching tags - `if`/`unless` chains and `case`/`when` selection
//!
//! Every test expression is parsed once at compile time. At render time the
//! branches are tried in declared order; the first match renders its body and
//! no later test is evaluated.

use super::compiler::{Compiler, RenderStep};
use crate::domain::context::{Flow, RenderContext};
use crate::domain::expression::Expression;
use crate::domain::template::TagNode;
use crate::domain::value::equal;
use crate::error::Result;
use std::io::Write;

/// When a branch applies
#[derive(Debug)]
pub enum BranchTest {
    /// Always applies (`else`)
    Unconditional,
    /// Applies when the expression is truthy
    ConditionalOn(Expression),
}

impl BranchTest {
    fn passes(&self, ctx: &mut dyn RenderContext) -> Result<bool> {
        match self {
            BranchTest::Unconditional => Ok(true),
            BranchTest::ConditionalOn(expr) => Ok(ctx.evaluate(expr)?.is_truthy()),
        }
    }
}

/// One arm of an `if`/`unless` chain
#[derive(Debug)]
pub struct CompiledBranch {
    test: BranchTest,
    body: Vec<RenderStep>,
}

impl CompiledBranch {
    pub fn test(&self) -> &BranchTest {
        &self.test
    }

    pub fn body(&self) -> &[RenderStep] {
        &self.body
    }
}

/// Compile an `if` tag
pub fn compile_if(tag: &TagNode, compiler: &Compiler<'_>) -> Result<RenderStep> {
    compile_conditional(tag, compiler, false)
}

/// Compile an `unless` tag: the primary test is negated, `elsif`s are not
pub fn compile_unless(tag: &TagNode, compiler: &Compiler<'_>) -> Result<RenderStep> {
    compile_conditional(tag, compiler, true)
}

fn compile_conditional(
    tag: &TagNode,
    compiler: &Compiler<'_>,
    negated: bool,
) -> Result<RenderStep> {
    let mut test = Expression::parse(&tag.parameters)?;
    if negated {
        test = Expression::negate(test);
    }

    let mut branches = Vec::with_capacity(tag.branches.len() + 1);
    branches.push(CompiledBranch {
        test: BranchTest::ConditionalOn(test),
        body: compiler.compile_body(&tag.body)?,
    });

    for clause in &tag.branches {
        let test = match clause.name.as_str() {
            "elsif" => BranchTest::ConditionalOn(Expression::parse(&clause.parameters)?),
            // `else`, and anything validation let through, always applies
            _ => BranchTest::Unconditional,
        };
        branches.push(CompiledBranch {
            test,
            body: compiler.compile_body(&clause.body)?,
        });
    }

    Ok(RenderStep::Conditional(branches))
}

/// Render the first branch whose test passes; nothing if none does
pub fn render_conditional(
    branches: &[CompiledBranch],
    out: &mut dyn Write,
    ctx: &mut dyn RenderContext,
) -> Result<Flow> {
    for branch in branches {
        if branch.test.passes(ctx)? {
            return ctx.render_branch(out, &branch.body);
        }
    }
    Ok(Flow::Normal)
}

/// One `when` arm of a `case`
#[derive(Debug)]
pub struct WhenBranch {
    candidate: Expression,
    body: Vec<RenderStep>,
}

/// Compiled `case` tag
#[derive(Debug)]
pub struct CaseStep {
    subject: Expression,
    whens: Vec<WhenBranch>,
}

impl CaseStep {
    pub fn subject(&self) -> &Expression {
        &self.subject
    }

    pub fn candidates(&self) -> impl Iterator<Item = &Expression> {
        self.whens.iter().map(|w| &w.candidate)
    }

    /// Evaluate the subject once, then render the first `when` equal to it
    pub fn render(&self, out: &mut dyn Write, ctx: &mut dyn RenderContext) -> Result<Flow> {
        let subject = ctx.evaluate(&self.subject)?;
        for when in &self.whens {
            let candidate = ctx.evaluate(&when.candidate)?;
            if equal(&subject, &candidate) {
                return ctx.render_branch(out, &when.body);
            }
        }
        Ok(Flow::Normal)
    }
}

/// Compile a `case` tag
///
/// The direct body is not rendered; validation only lets whitespace through.
pub fn compile_case(tag: &TagNode, compiler: &Compiler<'_>) -> Result<RenderStep> {
    let subject = Expression::parse(&tag.parameters)?;

    let whens = tag
        .branches
        .iter()
        .map(|when| {
            Ok(WhenBranch {
                candidate: Expression::parse(&when.parameters)?,
                body: compiler.compile_body(&when.body)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(RenderStep::Case(CaseStep { subject, whens }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tags::{render_steps, TagRegistry};
    use crate::domain::{Context, Node, Template, Value};
    use crate::error::TagflowError;

    /// Records the text of every expression it evaluates
    struct TrackingContext {
        inner: Context,
        evaluated: Vec<String>,
    }

    impl TrackingContext {
        fn new(vars: &[(&str, Value)]) -> Self {
            TrackingContext {
                inner: Context::with_variables(
                    vars.iter().map(|(k, v)| (k.to_string(), v.clone())),
                ),
                evaluated: Vec::new(),
            }
        }
    }

    impl RenderContext for TrackingContext {
        fn evaluate(&mut self, expr: &Expression) -> Result<Value> {
            self.evaluated.push(expr.to_string());
            self.inner.evaluate(expr)
        }

        fn render_branch(&mut self, out: &mut dyn Write, body: &[RenderStep]) -> Result<Flow> {
            render_steps(body, out, self)
        }

        fn set(&mut self, name: &str, value: Value) {
            self.inner.set(name, value);
        }

        fn capture_inner(&mut self, body: &[RenderStep]) -> Result<(String, Flow)> {
            let mut buffer = Vec::new();
            let flow = render_steps(body, &mut buffer, self)?;
            Ok((String::from_utf8(buffer).unwrap(), flow))
        }
    }

    fn tag(name: &str, parameters: &str) -> TagNode {
        TagNode::new(name, parameters)
    }

    fn compile(tree: TagNode) -> Template {
        let registry = TagRegistry::standard().unwrap();
        Template::compile(&registry, &[Node::Tag(tree)]).unwrap()
    }

    fn render(tree: TagNode, ctx: &mut dyn RenderContext) -> String {
        compile(tree).render(ctx).unwrap()
    }

    fn if_elsif_else() -> TagNode {
        tag("if", "false")
            .child(Node::text("A"))
            .branch(tag("elsif", "true").child(Node::text("B")))
            .branch(tag("else", "").child(Node::text("C")))
    }

    #[test]
    fn test_if_elsif_else_picks_first_truthy() {
        assert_eq!(render(if_elsif_else(), &mut Context::new()), "B");
    }

    #[test]
    fn test_if_short_circuits_later_tests() {
        let tree = tag("if", "a")
            .child(Node::text("A"))
            .branch(tag("elsif", "b").child(Node::text("B")))
            .branch(tag("elsif", "c").child(Node::text("C")));
        let mut ctx = TrackingContext::new(&[
            ("a", Value::Bool(false)),
            ("b", Value::Int(0)),
            ("c", Value::Bool(true)),
        ]);

        assert_eq!(render(tree, &mut ctx), "B");
        assert_eq!(ctx.evaluated, vec!["a", "b"]);
    }

    #[test]
    fn test_if_without_match_renders_nothing() {
        let tree = tag("if", "nil").child(Node::text("A"));
        let mut ctx = TrackingContext::new(&[]);
        assert_eq!(render(tree, &mut ctx), "");
        assert_eq!(ctx.evaluated, vec!["nil"]);
    }

    #[test]
    fn test_truthiness_of_zero_and_empty() {
        for value in [Value::Int(0), Value::from(""), Value::Array(vec![])] {
            let tree = tag("if", "v").child(Node::text("yes"));
            let mut ctx = Context::with_variables([("v".to_string(), value)]);
            assert_eq!(render(tree, &mut ctx), "yes");
        }
    }

    #[test]
    fn test_unless_else() {
        let tree = tag("unless", "true")
            .child(Node::text("A"))
            .branch(tag("else", "").child(Node::text("B")));
        assert_eq!(render(tree, &mut Context::new()), "B");
    }

    #[test]
    fn test_unless_matches_if_with_swapped_bodies() {
        let inputs = [
            Value::Nil,
            Value::Bool(false),
            Value::Bool(true),
            Value::Int(0),
            Value::from(""),
            Value::from("false"),
            Value::Array(vec![]),
        ];
        for value in inputs {
            let unless = tag("unless", "x")
                .child(Node::text("A"))
                .branch(tag("else", "").child(Node::text("B")));
            let if_tag = tag("if", "x")
                .child(Node::text("B"))
                .branch(tag("else", "").child(Node::text("A")));

            let vars = [("x".to_string(), value.clone())];
            let a = render(unless, &mut Context::with_variables(vars.clone()));
            let b = render(if_tag, &mut Context::with_variables(vars));
            assert_eq!(a, b, "unless and if disagree for {:?}", value);
        }
    }

    #[test]
    fn test_unless_does_not_negate_elsif() {
        let tree = tag("unless", "true")
            .child(Node::text("A"))
            .branch(tag("elsif", "true").child(Node::text("B")));
        assert_eq!(render(tree, &mut Context::new()), "B");
    }

    #[test]
    fn test_else_before_elsif_is_accepted() {
        let tree = tag("if", "false")
            .child(Node::text("A"))
            .branch(tag("else", "").child(Node::text("E")))
            .branch(tag("elsif", "true").child(Node::text("F")));
        assert_eq!(render(tree, &mut Context::new()), "E");
    }

    #[test]
    fn test_unknown_clause_name_acts_as_else() {
        let registry = TagRegistry::standard().unwrap();
        let compiler = Compiler::new(&registry);
        let tree = tag("if", "false")
            .child(Node::text("A"))
            .branch(tag("otherwise", "ignored text").child(Node::text("O")));

        let step = compile_if(&tree, &compiler).unwrap();
        let mut out = Vec::new();
        step.render(&mut out, &mut Context::new()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "O");
    }

    #[test]
    fn test_compile_error_names_malformed_elsif() {
        let registry = TagRegistry::standard().unwrap();
        let tree = tag("if", "a").branch(tag("elsif", "b ==").child(Node::text("B")));
        let err = Template::compile(&registry, &[Node::Tag(tree)]).unwrap_err();
        match err {
            TagflowError::Expression { text, .. } => assert_eq!(text, "b =="),
            other => panic!("Expected expression error, got {:?}", other),
        }
    }

    #[test]
    fn test_compile_error_names_malformed_primary() {
        let registry = TagRegistry::standard().unwrap();
        let err = Template::compile(&registry, &[Node::Tag(tag("unless", ""))]).unwrap_err();
        assert!(matches!(err, TagflowError::Expression { .. }));
    }

    #[test]
    fn test_evaluation_failure_aborts_without_output() {
        let tree = tag("if", "missing").child(Node::text("A"));
        let template = compile(tree);
        let err = template
            .render(&mut Context::new().strict(true))
            .unwrap_err();
        assert!(matches!(err, TagflowError::UndefinedVariable(_)));
    }

    #[test]
    fn test_body_failure_keeps_earlier_siblings_only() {
        let registry = TagRegistry::standard().unwrap();
        let tree = tag("if", "true")
            .child(Node::text("partial"))
            .child(Node::output("missing"));
        let template =
            Template::compile(&registry, &[Node::text("before|"), Node::Tag(tree)]).unwrap();

        let mut out = Vec::new();
        let result = template.render_to(&mut out, &mut Context::new().strict(true));
        assert!(result.is_err());
        assert_eq!(String::from_utf8(out).unwrap(), "before|");
    }

    #[test]
    fn test_loop_signal_propagates_out_of_branch() {
        let registry = TagRegistry::standard().unwrap();
        let compiler = Compiler::new(&registry);
        // Compiled without validation, as a loop engine would compile its body
        let steps = compiler
            .compile_body(&[
                Node::Tag(tag("if", "true").child(tag("continue", ""))),
                Node::text("after"),
            ])
            .unwrap();

        let mut out = Vec::new();
        let flow = render_steps(&steps, &mut out, &mut Context::new()).unwrap();
        assert_eq!(flow, Flow::Continue);
        assert!(out.is_empty());
    }

    fn case_one_two_three(subject: &str) -> TagNode {
        tag("case", subject)
            .branch(tag("when", "1").child(Node::text("one")))
            .branch(tag("when", "2").child(Node::text("two")))
            .branch(tag("when", "3").child(Node::text("three")))
    }

    #[test]
    fn test_case_selects_matching_when() {
        assert_eq!(render(case_one_two_three("2"), &mut Context::new()), "two");
    }

    #[test]
    fn test_case_no_match_renders_nothing() {
        assert_eq!(render(case_one_two_three("9"), &mut Context::new()), "");
    }

    #[test]
    fn test_case_evaluates_subject_once_and_short_circuits() {
        let mut ctx = TrackingContext::new(&[("n", Value::Int(2))]);
        assert_eq!(render(case_one_two_three("n"), &mut ctx), "two");
        assert_eq!(ctx.evaluated, vec!["n", "1", "2"]);
    }

    #[test]
    fn test_case_equality_mirrors_generic_equal() {
        let pairs = [
            (Value::Int(1), Value::Float(1.0)),
            (Value::Int(1), Value::from("1")),
            (Value::Nil, Value::Nil),
            (Value::Bool(false), Value::Nil),
            (Value::from("a"), Value::from("a")),
            (Value::from(vec![1i64, 2]), Value::from(vec![1.0, 2.0])),
            (Value::from(vec![1i64]), Value::from(vec![2i64])),
        ];
        for (subject, candidate) in pairs {
            let tree = tag("case", "s").branch(tag("when", "w").child(Node::text("hit")));
            let mut ctx = Context::with_variables([
                ("s".to_string(), subject.clone()),
                ("w".to_string(), candidate.clone()),
            ]);
            let matched = render(tree, &mut ctx) == "hit";
            assert_eq!(
                matched,
                equal(&subject, &candidate),
                "case/when disagrees with equal for {:?} and {:?}",
                subject,
                candidate
            );
        }
    }

    #[test]
    fn test_case_subject_error_propagates() {
        let template = compile(case_one_two_three("missing"));
        let err = template
            .render(&mut Context::new().strict(true))
            .unwrap_err();
        assert!(matches!(err, TagflowError::UndefinedVariable(_)));
    }

    #[test]
    fn test_compile_case_keeps_declared_order() {
        let registry = TagRegistry::standard().unwrap();
        let step = compile_case(&case_one_two_three("x"), &Compiler::new(&registry)).unwrap();
        match step {
            RenderStep::Case(case) => {
                assert_eq!(case.subject().to_string(), "x");
                let candidates: Vec<String> = case.candidates().map(|c| c.to_string()).collect();
                assert_eq!(candidates, vec!["1", "2", "3"]);
            }
            other => panic!("Expected case step, got {:?}", other),
        }
    }
}
