//! A small text template engine for routing rules.
//!
//! Text is copied verbatim; `{{ ... }}` actions are evaluated against a
//! [`TemplateContext`]. Supported action syntax:
//!
//! - `.Field` looks up a context field,
//! - `"quoted"` and `` `raw` `` string literals, `true` and `false`,
//! - `func arg1 arg2` calls a function registered in the [`FuncMap`],
//! - `( ... )` groups a nested call,
//! - `a | func x` passes the left value as the last argument of `func`,
//! - `{{- ` and ` -}}` trim the whitespace around the action.
//!
//! Functions are resolved when the template is compiled, so a compiled
//! [`Template`] is immutable and can be evaluated from many threads at once.
use std::{collections::BTreeMap, fmt, sync::Arc};

use thiserror::Error;

/// A value flowing through template evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Bool(bool),
    List(Vec<String>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{b}"),
            Value::List(items) => write!(f, "[{}]", items.join(" ")),
        }
    }
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Bool(_) => "bool",
            Value::List(_) => "list",
        }
    }
}

/// Errors raised by a registered function.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HelperError {
    #[error("wrong number of args: want {expected}, got {got}")]
    Arity { expected: usize, got: usize },

    #[error("argument {index} must be a {expected}, got {got}")]
    ArgumentType {
        index: usize,
        expected: &'static str,
        got: &'static str,
    },
}

/// Template compilation and evaluation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template {template}: unclosed action at byte {offset}")]
    UnclosedAction { template: String, offset: usize },

    #[error("template {template}: {message}")]
    Syntax { template: String, message: String },

    #[error("template {template}: function {function:?} not defined")]
    UndefinedFunction { template: String, function: String },

    #[error("template {template}: can't evaluate field {field}")]
    UndefinedField { template: String, field: String },

    #[error("template {template}: error calling {function}: {source}")]
    Call {
        template: String,
        function: String,
        #[source]
        source: HelperError,
    },
}

/// A registered template function.
pub type Helper = Arc<dyn Fn(&[Value]) -> Result<Value, HelperError> + Send + Sync>;

/// Function table available to templates at compile time.
#[derive(Clone, Default)]
pub struct FuncMap {
    funcs: BTreeMap<String, Helper>,
}

impl FuncMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `func` under `name`, replacing any earlier registration.
    pub fn register<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, HelperError> + Send + Sync + 'static,
    {
        self.funcs.insert(name.into(), Arc::new(func));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Helper> {
        self.funcs.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.funcs.keys().map(String::as_str)
    }
}

impl fmt::Debug for FuncMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.funcs.keys()).finish()
    }
}

/// Argument accessors for helper implementations.
pub mod args {
    use super::{HelperError, Value};

    pub fn expect_arity(args: &[Value], expected: usize) -> Result<(), HelperError> {
        if args.len() == expected {
            Ok(())
        } else {
            Err(HelperError::Arity {
                expected,
                got: args.len(),
            })
        }
    }

    pub fn string(args: &[Value], index: usize) -> Result<&str, HelperError> {
        match &args[index] {
            Value::Str(s) => Ok(s),
            other => Err(HelperError::ArgumentType {
                index,
                expected: "string",
                got: other.kind(),
            }),
        }
    }

    pub fn list(args: &[Value], index: usize) -> Result<&[String], HelperError> {
        match &args[index] {
            Value::List(items) => Ok(items),
            other => Err(HelperError::ArgumentType {
                index,
                expected: "list",
                got: other.kind(),
            }),
        }
    }
}

/// Field source for template evaluation.
pub trait TemplateContext {
    fn field(&self, name: &str) -> Option<Value>;
}

/// A compiled template.
#[derive(Clone)]
pub struct Template {
    name: String,
    nodes: Vec<Node>,
}

#[derive(Clone)]
enum Node {
    Text(String),
    Action(Pipeline),
}

#[derive(Clone)]
struct Pipeline {
    commands: Vec<Command>,
}

#[derive(Clone)]
enum Command {
    Operand(Operand),
    Call {
        function: String,
        helper: Helper,
        args: Vec<Operand>,
    },
}

#[derive(Clone)]
enum Operand {
    Field(String),
    Str(String),
    Bool(bool),
    Nested(Box<Pipeline>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Field(String),
    Ident(String),
    Str(String),
    LParen,
    RParen,
    Pipe,
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name)
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

impl Template {
    /// Parse `text`, resolving every function call against `funcs`.
    pub fn compile(name: &str, text: &str, funcs: &FuncMap) -> Result<Self, TemplateError> {
        let compiler = Compiler { name, funcs };
        let nodes = compiler.nodes(text)?;
        Ok(Self {
            name: name.to_string(),
            nodes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render the template against `ctx`.
    pub fn execute(&self, ctx: &dyn TemplateContext) -> Result<String, TemplateError> {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Action(pipeline) => {
                    let value = self.eval_pipeline(pipeline, ctx)?;
                    out.push_str(&value.to_string());
                }
            }
        }
        Ok(out)
    }

    fn eval_pipeline(
        &self,
        pipeline: &Pipeline,
        ctx: &dyn TemplateContext,
    ) -> Result<Value, TemplateError> {
        let mut piped: Option<Value> = None;
        for command in &pipeline.commands {
            let value = match command {
                Command::Operand(operand) => self.eval_operand(operand, ctx)?,
                Command::Call {
                    function,
                    helper,
                    args,
                } => {
                    let mut values = args
                        .iter()
                        .map(|arg| self.eval_operand(arg, ctx))
                        .collect::<Result<Vec<_>, _>>()?;
                    values.extend(piped.take());
                    helper(&values).map_err(|source| TemplateError::Call {
                        template: self.name.clone(),
                        function: function.clone(),
                        source,
                    })?
                }
            };
            piped = Some(value);
        }
        piped.ok_or_else(|| TemplateError::Syntax {
            template: self.name.clone(),
            message: "empty pipeline".to_string(),
        })
    }

    fn eval_operand(
        &self,
        operand: &Operand,
        ctx: &dyn TemplateContext,
    ) -> Result<Value, TemplateError> {
        match operand {
            Operand::Field(field) => ctx.field(field).ok_or_else(|| TemplateError::UndefinedField {
                template: self.name.clone(),
                field: field.clone(),
            }),
            Operand::Str(s) => Ok(Value::Str(s.clone())),
            Operand::Bool(b) => Ok(Value::Bool(*b)),
            Operand::Nested(pipeline) => self.eval_pipeline(pipeline, ctx),
        }
    }
}

struct Compiler<'a> {
    name: &'a str,
    funcs: &'a FuncMap,
}

impl Compiler<'_> {
    fn syntax(&self, message: impl Into<String>) -> TemplateError {
        TemplateError::Syntax {
            template: self.name.to_string(),
            message: message.into(),
        }
    }

    fn nodes(&self, text: &str) -> Result<Vec<Node>, TemplateError> {
        let mut nodes = Vec::new();
        let mut offset = 0;
        let mut trim_next = false;

        while let Some(start) = text[offset..].find("{{").map(|i| offset + i) {
            let mut body_start = start + 2;
            let trim_left = has_trim_marker(&text[body_start..]);
            if trim_left {
                body_start += 1;
            }
            push_text(&mut nodes, &text[offset..start], trim_next, trim_left);

            let body_len = find_action_end(&text[body_start..]).ok_or_else(|| {
                TemplateError::UnclosedAction {
                    template: self.name.to_string(),
                    offset: start,
                }
            })?;
            let mut body = &text[body_start..body_start + body_len];
            let trim_right = body
                .strip_suffix('-')
                .is_some_and(|b| b.ends_with(char::is_whitespace));
            if trim_right {
                body = &body[..body.len() - 1];
            }

            if !is_comment(body) {
                nodes.push(Node::Action(self.action(body)?));
            }
            offset = body_start + body_len + 2;
            trim_next = trim_right;
        }
        push_text(&mut nodes, &text[offset..], trim_next, false);
        Ok(nodes)
    }

    fn action(&self, body: &str) -> Result<Pipeline, TemplateError> {
        let tokens = self.lex(body)?;
        let mut pos = 0;
        let pipeline = self.pipeline(&tokens, &mut pos)?;
        if pos != tokens.len() {
            return Err(self.syntax(format!("unexpected {:?} in action", tokens[pos])));
        }
        Ok(pipeline)
    }

    fn pipeline(&self, tokens: &[Token], pos: &mut usize) -> Result<Pipeline, TemplateError> {
        let mut commands = Vec::new();
        loop {
            let command = self.command(tokens, pos)?;
            if !commands.is_empty() && matches!(command, Command::Operand(_)) {
                return Err(self.syntax("non executable command in pipeline stage"));
            }
            commands.push(command);
            if tokens.get(*pos) == Some(&Token::Pipe) {
                *pos += 1;
            } else {
                break;
            }
        }
        Ok(Pipeline { commands })
    }

    fn command(&self, tokens: &[Token], pos: &mut usize) -> Result<Command, TemplateError> {
        let head = match tokens.get(*pos) {
            Some(Token::Ident(name)) if name != "true" && name != "false" => {
                *pos += 1;
                Some(name.clone())
            }
            _ => None,
        };

        let mut operands = Vec::new();
        while let Some(token) = tokens.get(*pos) {
            if matches!(token, Token::Pipe | Token::RParen) {
                break;
            }
            operands.push(self.operand(tokens, pos)?);
        }

        match head {
            Some(function) => {
                let helper = self.helper(&function)?;
                Ok(Command::Call {
                    function,
                    helper,
                    args: operands,
                })
            }
            None => {
                let mut operands = operands.into_iter();
                match (operands.next(), operands.next()) {
                    (Some(operand), None) => Ok(Command::Operand(operand)),
                    (None, _) => Err(self.syntax("missing value for command")),
                    (Some(_), Some(_)) => Err(self.syntax("can't give argument to non-function")),
                }
            }
        }
    }

    fn operand(&self, tokens: &[Token], pos: &mut usize) -> Result<Operand, TemplateError> {
        let token = &tokens[*pos];
        *pos += 1;
        match token {
            Token::Field(name) => Ok(Operand::Field(name.clone())),
            Token::Str(s) => Ok(Operand::Str(s.clone())),
            Token::Ident(name) if name == "true" => Ok(Operand::Bool(true)),
            Token::Ident(name) if name == "false" => Ok(Operand::Bool(false)),
            Token::Ident(name) => {
                // A bare function name in argument position is a zero-argument call.
                Ok(Operand::Nested(Box::new(Pipeline {
                    commands: vec![Command::Call {
                        function: name.clone(),
                        helper: self.helper(name)?,
                        args: Vec::new(),
                    }],
                })))
            }
            Token::LParen => {
                let pipeline = self.pipeline(tokens, pos)?;
                if tokens.get(*pos) != Some(&Token::RParen) {
                    return Err(self.syntax("unclosed left paren"));
                }
                *pos += 1;
                Ok(Operand::Nested(Box::new(pipeline)))
            }
            Token::RParen => Err(self.syntax("unexpected right paren")),
            Token::Pipe => Err(self.syntax("missing value for command")),
        }
    }

    fn helper(&self, function: &str) -> Result<Helper, TemplateError> {
        self.funcs
            .get(function)
            .cloned()
            .ok_or_else(|| TemplateError::UndefinedFunction {
                template: self.name.to_string(),
                function: function.to_string(),
            })
    }

    fn lex(&self, body: &str) -> Result<Vec<Token>, TemplateError> {
        let mut tokens = Vec::new();
        let mut chars = body.char_indices().peekable();

        while let Some((_, c)) = chars.next() {
            match c {
                c if c.is_whitespace() => {}
                '(' => tokens.push(Token::LParen),
                ')' => tokens.push(Token::RParen),
                '|' => tokens.push(Token::Pipe),
                '.' => {
                    let mut name = String::new();
                    while let Some(&(_, c)) = chars.peek() {
                        if c.is_alphanumeric() || c == '_' {
                            name.push(c);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    if name.is_empty() {
                        return Err(self.syntax("bare dot is not supported"));
                    }
                    if matches!(chars.peek(), Some(&(_, '.'))) {
                        return Err(self.syntax(format!("nested field access on .{name}")));
                    }
                    tokens.push(Token::Field(name));
                }
                '"' => {
                    let mut value = String::new();
                    loop {
                        match chars.next() {
                            Some((_, '"')) => break,
                            Some((_, '\\')) => match chars.next() {
                                Some((_, 'n')) => value.push('\n'),
                                Some((_, 't')) => value.push('\t'),
                                Some((_, 'r')) => value.push('\r'),
                                Some((_, c @ ('\\' | '"'))) => value.push(c),
                                Some((_, c)) => {
                                    return Err(self.syntax(format!("unknown escape \\{c}")));
                                }
                                None => return Err(self.syntax("unterminated quoted string")),
                            },
                            Some((_, c)) => value.push(c),
                            None => return Err(self.syntax("unterminated quoted string")),
                        }
                    }
                    tokens.push(Token::Str(value));
                }
                '`' => {
                    let mut value = String::new();
                    loop {
                        match chars.next() {
                            Some((_, '`')) => break,
                            Some((_, c)) => value.push(c),
                            None => return Err(self.syntax("unterminated raw string")),
                        }
                    }
                    tokens.push(Token::Str(value));
                }
                c if c.is_alphabetic() || c == '_' => {
                    let mut name = c.to_string();
                    while let Some(&(_, c)) = chars.peek() {
                        if c.is_alphanumeric() || c == '_' {
                            name.push(c);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    tokens.push(Token::Ident(name));
                }
                other => return Err(self.syntax(format!("unexpected {other:?} in action"))),
            }
        }
        Ok(tokens)
    }
}

fn push_text(nodes: &mut Vec<Node>, text: &str, trim_start: bool, trim_end: bool) {
    let text = if trim_start { text.trim_start() } else { text };
    let text = if trim_end { text.trim_end() } else { text };
    if !text.is_empty() {
        nodes.push(Node::Text(text.to_string()));
    }
}

fn has_trim_marker(body: &str) -> bool {
    body.strip_prefix('-')
        .is_some_and(|rest| rest.starts_with(char::is_whitespace))
}

fn is_comment(body: &str) -> bool {
    let body = body.trim();
    body.starts_with("/*") && body.ends_with("*/")
}

/// Byte offset of the `}}` closing the action, skipping string literals.
fn find_action_end(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut i = 0;
    let mut quote: Option<u8> = None;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(b'"') if b == b'\\' => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'`' => quote = Some(b),
            None if b == b'}' && bytes.get(i + 1) == Some(&b'}') => return Some(i),
            None => {}
        }
        i += 1;
    }
    None
}
