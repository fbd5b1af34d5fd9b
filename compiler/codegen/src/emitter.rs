//! Structured text emitter
//!
//! Every generator writes C through a [`StructuredEmitter`]. It keeps an explicit
//! stack of open blocks, so indentation always follows nesting and a generator that
//! closes the wrong kind of block fails with an [`EmitterError`] instead of
//! producing unbalanced output.

use std::fmt;

use thiserror::Error;

/// Misuse of the block structure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitterError {
    /// The block on top of the stack is not the one being closed.
    #[error("cannot close {expected}: innermost open block is {found}")]
    Mismatched {
        /// Block kind the caller tried to close
        expected: &'static str,
        /// Block kind actually on top
        found: &'static str,
    },
    /// Nothing is open.
    #[error("cannot close {0}: no block is open")]
    EmptyStack(&'static str),
    /// `else` or `else if` with no condition chain on top of the stack.
    #[error("`{0}` requires an open condition chain")]
    NoConditionChain(&'static str),
    /// The chain already ended in `else`.
    #[error("`{0}` after `else`")]
    AfterElse(&'static str),
    /// A function definition was opened inside another block.
    #[error("function `{0}` opened inside another block")]
    NestedFunction(String),
    /// Output requested while blocks are still open.
    #[error("{0} block(s) still open")]
    Unbalanced(usize),
}

/// Result alias for emitter operations.
pub type Result<T> = std::result::Result<T, EmitterError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Scope,
    Function,
    Condition { has_else: bool },
}

impl Block {
    fn describe(&self) -> &'static str {
        match self {
            Block::Scope => "a scope",
            Block::Function => "a function",
            Block::Condition { .. } => "a condition chain",
        }
    }
}

/// A named, typed function parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    /// Parameter name
    pub name: String,
    /// Parameter type
    pub c_type: String,
}

impl Argument {
    /// Create a parameter
    pub fn new(name: impl Into<String>, c_type: impl Into<String>) -> Self {
        Self { name: name.into(), c_type: c_type.into() }
    }
}

/// A function header: `[static ]<return type>[ <attributes>] <name>(<args>)`.
///
/// An empty argument list renders as `void`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    name: String,
    return_type: String,
    args: Vec<Argument>,
    is_static: bool,
    attributes: Vec<String>,
}

impl FunctionSignature {
    /// A non-static function with no arguments
    pub fn new(name: impl Into<String>, return_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            return_type: return_type.into(),
            args: Vec::new(),
            is_static: false,
            attributes: Vec::new(),
        }
    }

    /// Append a parameter
    pub fn arg(mut self, name: impl Into<String>, c_type: impl Into<String>) -> Self {
        self.args.push(Argument::new(name, c_type));
        self
    }

    /// Append parameters
    pub fn args(mut self, args: impl IntoIterator<Item = Argument>) -> Self {
        self.args.extend(args);
        self
    }

    /// Give the function internal linkage
    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Add an attribute such as `__attribute__((unused))`
    pub fn attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attributes.push(attribute.into());
        self
    }

    /// Function name
    pub fn name(&self) -> &str { &self.name }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_static {
            f.write_str("static ")?;
        }
        f.write_str(&self.return_type)?;
        for attribute in &self.attributes {
            write!(f, " {}", attribute)?;
        }
        write!(f, " {}(", self.name)?;
        if self.args.is_empty() {
            f.write_str("void")?;
        }
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} {}", arg.c_type, arg.name)?;
        }
        f.write_str(")")
    }
}

/// Indentation- and scope-aware writer for block-structured C.
#[derive(Debug, Clone)]
pub struct StructuredEmitter {
    out: String,
    indent_unit: String,
    stack: Vec<Block>,
}

impl Default for StructuredEmitter {
    fn default() -> Self { Self::new("\t") }
}

impl StructuredEmitter {
    /// Create an emitter indenting with `indent_unit` per level
    pub fn new(indent_unit: impl Into<String>) -> Self {
        Self { out: String::new(), indent_unit: indent_unit.into(), stack: Vec::new() }
    }

    /// Current nesting depth
    pub fn depth(&self) -> usize { self.stack.len() }

    /// Whether every opened block has been closed
    pub fn is_balanced(&self) -> bool { self.stack.is_empty() }

    fn line_at(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.out.push_str(&self.indent_unit);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn line(&mut self, text: &str) { self.line_at(self.stack.len(), text) }

    // ----- scopes -----

    /// Open a brace block, optionally preceded by `prefix` on the same line
    pub fn start_scope(&mut self, prefix: Option<&str>) {
        let text = format!("{}{{", prefix.unwrap_or_default());
        self.line(&text);
        self.stack.push(Block::Scope);
    }

    /// Close the innermost scope; `terminate` writes `};` for initializer lists
    pub fn end_scope(&mut self, terminate: bool) -> Result<()> {
        self.pop(Block::Scope)?;
        self.line(if terminate { "};" } else { "}" });
        Ok(())
    }

    // ----- functions -----

    /// Write a prototype: `<signature>;`
    pub fn function_prototype(&mut self, signature: &FunctionSignature) {
        let text = format!("{};", signature);
        self.line(&text);
    }

    /// Open a function definition
    pub fn start_function(&mut self, signature: &FunctionSignature) -> Result<()> {
        if !self.stack.is_empty() {
            return Err(EmitterError::NestedFunction(signature.name().to_string()));
        }
        let text = format!("{}{{", signature);
        self.line(&text);
        self.stack.push(Block::Function);
        Ok(())
    }

    /// Close the open function definition
    pub fn end_function(&mut self) -> Result<()> {
        self.pop(Block::Function)?;
        self.line("}");
        Ok(())
    }

    // ----- conditions -----

    /// Open a new `if` chain
    pub fn start_condition(&mut self, condition: &str) {
        let text = format!("if({}){{", condition);
        self.line(&text);
        self.stack.push(Block::Condition { has_else: false });
    }

    /// Append `else if` to the chain on top of the stack, or open a new chain
    pub fn start_or_alternative(&mut self, condition: &str) -> Result<()> {
        match self.stack.last() {
            Some(Block::Condition { has_else: true }) => Err(EmitterError::AfterElse("else if")),
            Some(Block::Condition { has_else: false }) => {
                self.close_arm(&format!("else if({}){{", condition));
                Ok(())
            }
            _ => {
                self.start_condition(condition);
                Ok(())
            }
        }
    }

    /// Turn the tail of the current chain into `else`
    pub fn add_else(&mut self) -> Result<()> {
        match self.stack.last_mut() {
            Some(Block::Condition { has_else }) => {
                if *has_else {
                    return Err(EmitterError::AfterElse("else"));
                }
                *has_else = true;
            }
            _ => return Err(EmitterError::NoConditionChain("else")),
        }
        self.close_arm("else {");
        Ok(())
    }

    /// Close the whole chain on top of the stack
    pub fn end_condition(&mut self) -> Result<()> {
        match self.stack.last() {
            Some(Block::Condition { .. }) => {}
            Some(other) => {
                return Err(EmitterError::Mismatched {
                    expected: "a condition chain",
                    found: other.describe(),
                })
            }
            None => return Err(EmitterError::EmptyStack("a condition chain")),
        }
        self.stack.pop();
        self.line("}");
        Ok(())
    }

    fn close_arm(&mut self, opener: &str) {
        let depth = self.stack.len() - 1;
        self.line_at(depth, "}");
        self.line_at(depth, opener);
    }

    // ----- flat emissions -----

    /// `<statement>;`
    pub fn add_statement(&mut self, statement: &str) {
        let text = format!("{};", statement);
        self.line(&text);
    }

    /// `//<comment>`
    pub fn add_comment(&mut self, comment: &str) {
        let text = format!("//{}", comment);
        self.line(&text);
    }

    /// `<name>:`
    pub fn add_label(&mut self, name: &str) {
        let text = format!("{}:", name);
        self.line(&text);
    }

    /// `break;`
    pub fn add_break(&mut self) { self.add_statement("break") }

    /// One `<item>,` line per item
    pub fn add_items<I, S>(&mut self, items: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for item in items {
            let text = format!("{},", item.as_ref());
            self.line(&text);
        }
    }

    /// An empty line
    pub fn add_blank_line(&mut self) { self.out.push('\n') }

    /// Text written as-is, without indentation
    pub fn add_raw(&mut self, text: &str) { self.out.push_str(text) }

    fn pop(&mut self, expected: Block) -> Result<()> {
        match self.stack.last() {
            Some(top) if *top == expected => {
                self.stack.pop();
                Ok(())
            }
            Some(top) => Err(EmitterError::Mismatched {
                expected: expected.describe(),
                found: top.describe(),
            }),
            None => Err(EmitterError::EmptyStack(expected.describe())),
        }
    }

    /// Return the buffered text; every block must be closed
    pub fn finish(self) -> Result<String> {
        if !self.stack.is_empty() {
            return Err(EmitterError::Unbalanced(self.stack.len()));
        }
        Ok(self.out)
    }
}
