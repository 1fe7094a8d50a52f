//! Parser for calculator input using chumsky.
//!
//! Role
//! - Turn source text into an expression tree rooted at a [`NodeRef`].
//! - Mirrors the engine's canonical lowering: subtraction becomes
//!   `Addition(a, Multiplication(-1, b))` and division becomes
//!   `Multiplication(a, Power(b, -1))`, so the printer can round-trip them.
//!
//! Two stages:
//! 1) Tokenisation from input string to a `Token` stream.
//! 2) Parsing tokens into an owned AST, then lowering against the calculator's
//!    symbol tables.
//!
//! Accepted syntax:
//! - Integer literals of any size, float literals `12.5`.
//! - Identifiers, resolved against variables and unit aliases; unknown names
//!   become fresh unknown variables (see [`ParseOptions`]).
//! - Calls `f(a, b)`, parentheses, unary minus and `not`.
//! - `^` / `**` power (right-associative), `*` `/`, implicit number-identifier
//!   multiplication (`10m`), `+` `-`, word operators `and` `or` `xor`
//!   (bitwise), comparisons `=` `!=` `<` `<=` `>` `>=` at lowest precedence.
//!
//! Malformed input never raises: diagnostics are queued as Error messages on
//! the calculator and an Undefined node is returned.
use chumsky::{input::ValueInput, prelude::*};
use log::warn;
use num_bigint::BigInt;

use mxexpr::node::{ComparisonOp, Node, NodeKind, NodeRef};

use crate::calculator::Calculator;
use crate::message::MessageKind;
use crate::options::ParseOptions;

pub type Spanned<T> = (T, SimpleSpan);
type Span = SimpleSpan;

#[derive(Clone, Debug, PartialEq)]
enum Token {
    // Literals & identifiers
    Int(BigInt),
    Float(f64),
    Ident(String),

    // Delimiters & punctuation
    LParen,
    RParen,
    Comma,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret, // ^ and **
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,

    // Word operators
    And,
    Or,
    Xor,
    Not,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Int(v) => write!(f, "{v}"),
            Token::Float(v) => write!(f, "{v}"),
            Token::Ident(name) => write!(f, "{name}"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Caret => write!(f, "^"),
            Token::Eq => write!(f, "="),
            Token::Neq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::Le => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::Ge => write!(f, ">="),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Xor => write!(f, "xor"),
            Token::Not => write!(f, "not"),
        }
    }
}

// ---------------- Lexer ----------------

fn lexer<'a>() -> impl Parser<'a, &'a str, Vec<Spanned<Token>>, extra::Err<Rich<'a, char>>> {
    let digits = any().filter(|c: &char| c.is_ascii_digit()).repeated().at_least(1);

    // One numeric rule; the presence of a '.' decides the arm.
    let number = digits
        .then(just('.').then(digits).or_not())
        .to_slice()
        .map(|s: &str| {
            if s.contains('.') {
                Token::Float(s.parse().unwrap())
            } else {
                Token::Int(s.parse().unwrap())
            }
        });

    let word = any()
        .filter(|c: &char| c.is_ascii_alphabetic() || *c == '_' || *c == 'π')
        .then(
            any()
                .filter(|c: &char| c.is_ascii_alphanumeric() || *c == '_')
                .repeated(),
        )
        .to_slice()
        .map(|s: &str| match s {
            "and" => Token::And,
            "or" => Token::Or,
            "xor" => Token::Xor,
            "not" => Token::Not,
            _ => Token::Ident(s.to_string()),
        });

    // Multi-char operators first to avoid prefix capture
    let op = choice((
        just("**").to(Token::Caret),
        just("!=").to(Token::Neq),
        just("<=").to(Token::Le),
        just(">=").to(Token::Ge),
        just('^').to(Token::Caret),
        just('=').to(Token::Eq),
        just('<').to(Token::Lt),
        just('>').to(Token::Gt),
        just('+').to(Token::Plus),
        just('-').to(Token::Minus),
        just('*').to(Token::Star),
        just('/').to(Token::Slash),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just(',').to(Token::Comma),
    ));

    let token = choice((number, word, op));

    token
        .map_with(|tok, e| (tok, e.span()))
        .padded()
        .repeated()
        .collect()
        .then_ignore(end())
}

// ---------------- Owned AST ----------------

#[derive(Debug, Clone, Copy)]
enum BitOp {
    And,
    Or,
    Xor,
}

#[derive(Debug, Clone)]
enum Ast {
    Int(BigInt),
    Float(f64),
    Ident(String),
    Call(String, Vec<Ast>),
    /// Number-identifier juxtaposition (`10m`), resolved by [`ParseOptions`].
    Juxtapose(Box<Ast>, String),
    Neg(Box<Ast>),
    Not(Box<Ast>),
    Pow(Box<Ast>, Box<Ast>),
    Mul(Box<Ast>, Box<Ast>),
    Div(Box<Ast>, Box<Ast>),
    Add(Box<Ast>, Box<Ast>),
    Sub(Box<Ast>, Box<Ast>),
    Bit(BitOp, Box<Ast>, Box<Ast>),
    Cmp(ComparisonOp, Box<Ast>, Box<Ast>),
}

// ---------------- chumsky parser over tokens ----------------

fn ast_parser<'tokens, I>()
-> impl Parser<'tokens, I, Ast, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    recursive(|expr| {
        let literal = select! {
            Token::Int(v) => Ast::Int(v),
            Token::Float(v) => Ast::Float(v),
        };
        let ident = select! { Token::Ident(name) => name };

        let call = ident
            .clone()
            .then(
                expr.clone()
                    .separated_by(just(Token::Comma))
                    .collect::<Vec<_>>()
                    .delimited_by(just(Token::LParen), just(Token::RParen)),
            )
            .map(|(name, args)| Ast::Call(name, args))
            .labelled("call");

        let paren = expr
            .clone()
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .labelled("parentheses");

        // A literal directly followed by an identifier is unit juxtaposition.
        let literal_unit = literal.then(ident.clone().or_not()).map(|(lit, unit)| match unit {
            Some(name) => Ast::Juxtapose(Box::new(lit), name),
            None => lit,
        });

        let atom = call
            .or(literal_unit)
            .or(ident.map(Ast::Ident))
            .or(paren)
            .labelled("atom");

        // Power is right-assoc and binds tighter than the prefixes, but the
        // exponent itself admits a prefix: `-2^2` is `-(2^2)`, `2^-3` parses.
        let unary = recursive(|unary| {
            let power = atom
                .clone()
                .then(just(Token::Caret).ignore_then(unary.clone()).or_not())
                .map(|(base, exp)| match exp {
                    Some(exp) => Ast::Pow(Box::new(base), Box::new(exp)),
                    None => base,
                });
            choice((
                just(Token::Minus)
                    .ignore_then(unary.clone())
                    .map(|a| Ast::Neg(Box::new(a))),
                just(Token::Not)
                    .ignore_then(unary)
                    .map(|a| Ast::Not(Box::new(a))),
                power,
            ))
        })
        .labelled("unary");

        #[derive(Clone, Copy)]
        enum MulOp {
            Mul,
            Div,
        }
        let mul_op = choice((
            just(Token::Star).to(MulOp::Mul),
            just(Token::Slash).to(MulOp::Div),
        ));
        let product = unary
            .clone()
            .foldl(mul_op.then(unary).repeated(), |a, (op, b)| match op {
                MulOp::Mul => Ast::Mul(Box::new(a), Box::new(b)),
                MulOp::Div => Ast::Div(Box::new(a), Box::new(b)),
            })
            .labelled("product");

        #[derive(Clone, Copy)]
        enum SumOp {
            Add,
            Sub,
        }
        let sum_op = choice((
            just(Token::Plus).to(SumOp::Add),
            just(Token::Minus).to(SumOp::Sub),
        ));
        let sum = product
            .clone()
            .foldl(sum_op.then(product).repeated(), |a, (op, b)| match op {
                SumOp::Add => Ast::Add(Box::new(a), Box::new(b)),
                SumOp::Sub => Ast::Sub(Box::new(a), Box::new(b)),
            })
            .labelled("sum");

        let bit_op = choice((
            just(Token::And).to(BitOp::And),
            just(Token::Or).to(BitOp::Or),
            just(Token::Xor).to(BitOp::Xor),
        ));
        let bitword = sum
            .clone()
            .foldl(bit_op.then(sum).repeated(), |a, (op, b)| {
                Ast::Bit(op, Box::new(a), Box::new(b))
            })
            .labelled("bitwise");

        let cmp_op = choice((
            just(Token::Eq).to(ComparisonOp::Equals),
            just(Token::Neq).to(ComparisonOp::NotEquals),
            just(Token::Le).to(ComparisonOp::LessOrEqual),
            just(Token::Ge).to(ComparisonOp::GreaterOrEqual),
            just(Token::Lt).to(ComparisonOp::Less),
            just(Token::Gt).to(ComparisonOp::Greater),
        ));
        bitword
            .clone()
            .foldl(cmp_op.then(bitword).repeated(), |a, (op, b)| {
                Ast::Cmp(op, Box::new(a), Box::new(b))
            })
            .labelled("comparison")
    })
}

// ---------------- Lowering against the symbol tables ----------------

impl Calculator {
    /// Parse `text` into an expression tree.
    ///
    /// Diagnostics (lexing, parsing, unresolved names) are queued as Error
    /// messages; the returned node is Undefined when nothing usable could be
    /// built.
    pub fn parse(&self, text: &str, options: &ParseOptions) -> NodeRef {
        let (tokens, lex_errs) = lexer().parse(text).into_output_errors();
        for err in lex_errs {
            warn!("lexing error in {text:?}: {err}");
            self.push_message(MessageKind::Error, format!("lexing error: {err}"));
        }
        let tokens = match tokens {
            Some(tokens) => tokens,
            None => return Node::undefined(),
        };

        let plain: Vec<Token> = tokens.into_iter().map(|(tok, _span)| tok).collect();
        let (ast, parse_errs) = ast_parser()
            .then_ignore(end())
            .parse(plain.as_slice())
            .into_output_errors();
        for err in parse_errs {
            warn!("parse error in {text:?}: {err}");
            self.push_message(MessageKind::Error, format!("parse error: {err}"));
        }
        match ast {
            Some(ast) => self.lower(&ast, options),
            None => Node::undefined(),
        }
    }

    fn lower(&self, ast: &Ast, options: &ParseOptions) -> NodeRef {
        match ast {
            Ast::Int(value) => Node::number(value.clone()),
            Ast::Float(value) => Node::number(*value),
            Ast::Ident(name) => self.lower_ident(name, options),
            Ast::Call(name, args) => {
                let args: Vec<NodeRef> = args.iter().map(|a| self.lower(a, options)).collect();
                match self.get_function(name) {
                    Some(function) => match Node::function(function, args) {
                        Ok(node) => node,
                        Err(_) => Node::undefined(),
                    },
                    None => {
                        self.push_message(
                            MessageKind::Error,
                            format!("unknown function '{name}'"),
                        );
                        Node::undefined()
                    }
                }
            }
            Ast::Juxtapose(value, name) => {
                if !options.implicit_multiplication {
                    self.push_message(
                        MessageKind::Error,
                        format!("implicit multiplication is disabled ('{name}')"),
                    );
                    return Node::undefined();
                }
                let value = self.lower(value, options);
                let ident = self.lower_ident(name, options);
                Node::multiplication([value, ident])
            }
            Ast::Neg(inner) => self.lower(inner, options).negated(),
            Ast::Not(inner) => {
                let inner = self.lower(inner, options);
                sequence_node(NodeKind::BitwiseNot, vec![inner])
            }
            Ast::Pow(base, exp) => Node::power(
                Some(self.lower(base, options)),
                Some(self.lower(exp, options)),
            ),
            Ast::Mul(a, b) => {
                Node::multiplication([self.lower(a, options), self.lower(b, options)])
            }
            // Division lowers to the engine's canonical inverse-power form.
            Ast::Div(a, b) => self.lower(a, options) / self.lower(b, options),
            Ast::Add(a, b) => Node::addition([self.lower(a, options), self.lower(b, options)]),
            // Subtraction lowers to addition of the negation.
            Ast::Sub(a, b) => self.lower(a, options) - self.lower(b, options),
            Ast::Bit(op, a, b) => {
                let kind = match op {
                    BitOp::And => NodeKind::BitwiseAnd,
                    BitOp::Or => NodeKind::BitwiseOr,
                    BitOp::Xor => NodeKind::BitwiseXor,
                };
                sequence_node(kind, vec![self.lower(a, options), self.lower(b, options)])
            }
            Ast::Cmp(op, a, b) => Node::comparison(
                Some(self.lower(a, options)),
                *op,
                Some(self.lower(b, options)),
            ),
        }
    }

    fn lower_ident(&self, name: &str, options: &ParseOptions) -> NodeRef {
        match self.resolve_or_intern(name, options.unknowns_as_variables) {
            Some(node) => node,
            None => {
                self.push_message(MessageKind::Error, format!("unknown identifier '{name}'"));
                Node::undefined()
            }
        }
    }
}

fn sequence_node(kind: NodeKind, children: Vec<NodeRef>) -> NodeRef {
    match Node::operation(kind, children) {
        Ok(node) => node,
        Err(_) => Node::undefined(),
    }
}
