use super::{CompileCondition, Expression, Import, NodeIndex};
use span::{Location, Span, Spanning};

#[derive(Clone, PartialEq, Debug)]
pub struct Statement {
    pub span: Span,
    pub bare: BareStatement,
}

impl Statement {
    pub fn new(span: Span, bare: BareStatement) -> Self {
        Self { span, bare }
    }

    /// The direct sub-statements in source order.
    pub fn children(&self) -> Vec<&Statement> {
        use BareStatement::*;

        match &self.bare {
            Block(statements) => statements.iter().collect(),
            If(if_) => std::iter::once(&if_.consequence).chain(&if_.alternative).collect(),
            While(while_) => vec![&while_.body],
            DoWhile(do_while) => vec![&do_while.body],
            For(for_) => for_.initializer.iter().chain(std::iter::once(&for_.body)).collect(),
            Foreach(foreach) => vec![&foreach.body],
            Switch(switch) => vec![&switch.body],
            Case(case) => case.body.iter().collect(),
            With(with) => vec![&with.body],
            Synchronized(synchronized) => vec![&synchronized.body],
            Try(try_) => std::iter::once(&try_.body)
                .chain(try_.catches.iter().map(|catch| &catch.body))
                .chain(&try_.finally)
                .collect(),
            ScopeGuard(guard) => vec![&guard.body],
            Conditional(conditional) => {
                std::iter::once(&conditional.consequence).chain(&conditional.alternative).collect()
            }
            Labeled(labeled) => vec![&labeled.body],
            Expression(_) | Declaration(_) | Continue(_) | Break(_) | Return(_) | Goto(_)
            | Throw(_) | StaticAssert(_) | Import(_) | Asm | Empty | Error => Vec::new(),
        }
    }

    /// The local declarations this statement introduces into the scope of its sub-statements
    /// like foreach variables, excluding declaration statements.
    pub fn scoped_declarations(&self) -> Vec<NodeIndex> {
        use BareStatement::*;

        match &self.bare {
            If(if_) => if_.variable.into_iter().collect(),
            Foreach(foreach) => foreach.variables.clone(),
            Try(try_) => try_.catches.iter().filter_map(|catch| catch.variable).collect(),
            _ => Vec::new(),
        }
    }

    /// The chain of statements enclosing the given location, outermost first.
    pub fn path_to(&self, location: Location) -> Vec<&Statement> {
        let mut path = Vec::new();
        let mut statement = self;

        if !statement.span.contains(location) {
            return path;
        }

        loop {
            path.push(statement);
            match statement.children().into_iter().find(|child| child.span.contains(location)) {
                Some(child) => statement = child,
                None => break path,
            }
        }
    }
}

impl Spanning for Statement {
    fn span(&self) -> Span {
        self.span
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum BareStatement {
    Block(Vec<Statement>),
    Expression(Expression),
    /// Local declarations like `int a = 1, b;`.
    Declaration(Vec<NodeIndex>),
    If(Box<If>),
    While(Box<While>),
    DoWhile(Box<While>),
    For(Box<For>),
    Foreach(Box<Foreach>),
    Switch(Box<Switch>),
    /// `case a, b:`, `case a: .. case b:` and `default:`.
    Case(Box<Case>),
    Continue(Option<String>),
    Break(Option<String>),
    Return(Option<Expression>),
    /// The label; `case` and `default` for `goto case;` and `goto default;`.
    Goto(String),
    With(Box<With>),
    Synchronized(Box<Synchronized>),
    Try(Box<Try>),
    Throw(Expression),
    /// `scope(exit)`, `scope(failure)` and `scope(success)`.
    ScopeGuard(Box<ScopeGuard>),
    /// `version`, `debug` and `static if` inside of function bodies.
    Conditional(Box<ConditionalStatement>),
    StaticAssert(Vec<Expression>),
    Labeled(Box<Labeled>),
    Import(Vec<Import>),
    /// Inline assembler, skipped.
    Asm,
    Empty,
    /// A statement that failed to parse.
    Error,
}

#[derive(Clone, PartialEq, Debug)]
pub struct If {
    /// The variable declared in `if (auto x = …)`.
    pub variable: Option<NodeIndex>,
    pub condition: Expression,
    pub consequence: Statement,
    pub alternative: Option<Statement>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct While {
    pub condition: Expression,
    pub body: Statement,
}

#[derive(Clone, PartialEq, Debug)]
pub struct For {
    pub initializer: Option<Statement>,
    pub condition: Option<Expression>,
    pub increment: Option<Expression>,
    pub body: Statement,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Foreach {
    pub reverse: bool,
    pub variables: Vec<NodeIndex>,
    pub aggregate: Expression,
    /// The upper bound of `foreach (i; 0 .. n)`.
    pub upper: Option<Expression>,
    pub body: Statement,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Switch {
    pub is_final: bool,
    pub subject: Expression,
    pub body: Statement,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Case {
    /// Empty for `default:`.
    pub values: Vec<Expression>,
    pub is_range: bool,
    /// The statements up to the next case label.
    pub body: Option<Statement>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct With {
    pub subject: Expression,
    pub body: Statement,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Synchronized {
    pub subject: Option<Expression>,
    pub body: Statement,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Try {
    pub body: Statement,
    pub catches: Vec<Catch>,
    pub finally: Option<Statement>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Catch {
    pub variable: Option<NodeIndex>,
    pub body: Statement,
}

#[derive(Clone, PartialEq, Debug)]
pub struct ScopeGuard {
    pub kind: String,
    pub body: Statement,
}

#[derive(Clone, PartialEq, Debug)]
pub struct ConditionalStatement {
    pub condition: CompileCondition,
    pub consequence: Statement,
    pub alternative: Option<Statement>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Labeled {
    pub label: String,
    pub body: Statement,
}
