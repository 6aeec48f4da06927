//! Policyfile parser.
//!
//! Parses Policyfile documents into a validated [`PolicyDocument`].
//!
//! # Policyfile Format
//!
//! ```ruby
//! name 'default'
//!
//! default_source :supermarket
//!
//! cookbook 'managed_chef_server', '= 0.18.1', :supermarket
//!
//! run_list 'managed_chef_server::default'
//! named_run_list :upgrade, 'managed_chef_server::upgrade'
//!
//! default['mcs']['org']['name'] = 'example'
//! ```

use crate::attributes::{AttributePath, AttributeTree, AttributeValue};
use crate::error::{Error, Result};
use crate::lexer::{tokenize, Token, TokenKind};
use crate::model::{
    CookbookSource, Dependency, GitReference, PolicyDocument, RunList, SourceDescriptor,
    VersionConstraint, DEFAULT_RUN_LIST,
};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Parses Policyfile text into a [`PolicyDocument`].
///
/// # Errors
///
/// Returns an error if:
/// - The syntax is invalid or a directive is unknown ([`Error::MalformedDocument`])
/// - `name` or `default_source` is missing ([`Error::MalformedDocument`])
/// - A cookbook is declared twice ([`Error::DuplicateDependency`])
/// - A run list names no recipes ([`Error::EmptyRunList`])
///
/// # Example
///
/// ```rust
/// use policyfile::parse;
///
/// let input = r#"
/// name 'web'
/// default_source :supermarket
/// cookbook 'nginx', '~> 12.0'
/// run_list 'nginx::default'
/// default['nginx']['port'] = 8080
/// "#;
///
/// let doc = parse(input).unwrap();
/// assert_eq!(doc.name, "web");
/// assert_eq!(doc.attribute("nginx.port").unwrap().as_i64(), Some(8080));
/// ```
pub fn parse(input: &str) -> Result<PolicyDocument> {
    let tokens = tokenize(input)?;
    let statements = StatementParser::new(tokens).parse_statements()?;

    let mut builder = DocumentBuilder::default();
    for statement in statements {
        builder.apply(statement)?;
    }
    let document = builder.finish()?;

    debug!(
        "Parsed policy '{}' with {} cookbooks and {} run lists",
        document.name,
        document.dependencies.len(),
        document.run_lists.len()
    );
    Ok(document)
}

/// A literal value as written in the source.
#[derive(Debug, Clone, PartialEq)]
enum Literal {
    Str(String),
    Symbol(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Nil,
    Array(Vec<Literal>),
    Hash(Vec<(String, Literal)>),
}

impl Literal {
    const fn describe(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Bool(_) => "boolean",
            Self::Nil => "nil",
            Self::Array(_) => "array",
            Self::Hash(_) => "hash",
        }
    }

    fn into_attribute(self, line: usize) -> Result<AttributeValue> {
        Ok(match self {
            Self::Str(s) | Self::Symbol(s) => AttributeValue::String(s),
            Self::Integer(n) => AttributeValue::Integer(n),
            Self::Float(f) => AttributeValue::Float(f),
            Self::Bool(b) => AttributeValue::Bool(b),
            Self::Nil => AttributeValue::Null,
            Self::Array(items) => AttributeValue::List(
                items
                    .into_iter()
                    .map(|item| item.into_attribute(line))
                    .collect::<Result<_>>()?,
            ),
            Self::Hash(pairs) => {
                let mut map = BTreeMap::new();
                for (key, value) in pairs {
                    if map.contains_key(&key) {
                        return Err(Error::malformed(
                            line,
                            format!("duplicate key '{key}' in hash literal"),
                        ));
                    }
                    map.insert(key, value.into_attribute(line)?);
                }
                AttributeValue::Map(map)
            }
        })
    }
}

/// A directive argument.
#[derive(Debug, Clone, PartialEq)]
enum Arg {
    Positional(Literal),
    Keyword(String, Literal),
}

/// Which attribute tree an assignment targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Default,
    Override,
}

#[derive(Debug, Clone, PartialEq)]
enum Statement {
    Call {
        name: String,
        args: Vec<Arg>,
        line: usize,
    },
    Assign {
        scope: Scope,
        path: Vec<String>,
        value: Literal,
        line: usize,
    },
}

/// Internal parser state.
struct StatementParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl StatementParser {
    const fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn advance(&mut self) -> Result<Token> {
        let token = self.tokens.get(self.pos).cloned().ok_or_else(|| {
            Error::malformed(self.line(), "unexpected end of input")
        })?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, expected: &TokenKind, what: &str) -> Result<()> {
        let token = self.advance()?;
        if &token.kind == expected {
            Ok(())
        } else {
            Err(Error::malformed(
                token.line,
                format!("expected {what}, found {}", describe(&token.kind)),
            ))
        }
    }

    fn parse_statements(mut self) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();
        while let Some(kind) = self.peek() {
            if kind == &TokenKind::Newline {
                self.pos += 1;
                continue;
            }
            let statement = self.parse_statement()?;
            trace!(?statement, "parsed statement");
            statements.push(statement);
        }
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        let token = self.advance()?;
        let line = token.line;
        let name = match token.kind {
            TokenKind::Ident(name) => name,
            other => {
                return Err(Error::malformed(
                    line,
                    format!("expected a directive, found {}", describe(&other)),
                ));
            }
        };

        if self.peek() == Some(&TokenKind::LBracket) && matches!(name.as_str(), "default" | "override") {
            let scope = if name == "default" {
                Scope::Default
            } else {
                Scope::Override
            };
            return self.parse_assignment(scope, line);
        }

        let args = if self.peek() == Some(&TokenKind::LParen) {
            self.pos += 1;
            let args = if self.peek() == Some(&TokenKind::RParen) {
                Vec::new()
            } else {
                self.parse_args()?
            };
            self.expect(&TokenKind::RParen, "')'")?;
            args
        } else if self.peek() == Some(&TokenKind::Newline) {
            Vec::new()
        } else {
            self.parse_args()?
        };
        self.expect(&TokenKind::Newline, "end of line")?;

        Ok(Statement::Call { name, args, line })
    }

    fn parse_assignment(&mut self, scope: Scope, line: usize) -> Result<Statement> {
        let mut path = Vec::new();
        while self.peek() == Some(&TokenKind::LBracket) {
            self.pos += 1;
            let token = self.advance()?;
            match token.kind {
                TokenKind::Str(key) | TokenKind::Symbol(key) => path.push(key),
                other => {
                    return Err(Error::malformed(
                        token.line,
                        format!("attribute keys must be strings, found {}", describe(&other)),
                    ));
                }
            }
            self.expect(&TokenKind::RBracket, "']'")?;
        }
        self.expect(&TokenKind::Assign, "'=' after attribute path")?;
        let value = self.parse_value()?;
        self.expect(&TokenKind::Newline, "end of line")?;

        Ok(Statement::Assign {
            scope,
            path,
            value,
            line,
        })
    }

    fn parse_args(&mut self) -> Result<Vec<Arg>> {
        let mut args = Vec::new();
        loop {
            if let Some(TokenKind::Label(label)) = self.peek() {
                let label = label.clone();
                self.pos += 1;
                args.push(Arg::Keyword(label, self.parse_value()?));
            } else {
                args.push(Arg::Positional(self.parse_value()?));
            }

            if self.peek() == Some(&TokenKind::Comma) {
                self.pos += 1;
            } else {
                return Ok(args);
            }
        }
    }

    fn parse_value(&mut self) -> Result<Literal> {
        let token = self.advance()?;
        Ok(match token.kind {
            TokenKind::Str(s) => Literal::Str(s),
            TokenKind::Symbol(s) => Literal::Symbol(s),
            TokenKind::Integer(n) => Literal::Integer(n),
            TokenKind::Float(f) => Literal::Float(f),
            TokenKind::Ident(word) => match word.as_str() {
                "true" => Literal::Bool(true),
                "false" => Literal::Bool(false),
                "nil" => Literal::Nil,
                _ => {
                    return Err(Error::malformed(
                        token.line,
                        format!("expected a value, found identifier '{word}'"),
                    ));
                }
            },
            TokenKind::LBracket => Literal::Array(self.parse_array()?),
            TokenKind::LBrace => Literal::Hash(self.parse_hash()?),
            other => {
                return Err(Error::malformed(
                    token.line,
                    format!("expected a value, found {}", describe(&other)),
                ));
            }
        })
    }

    fn parse_array(&mut self) -> Result<Vec<Literal>> {
        let mut items = Vec::new();
        loop {
            if self.peek() == Some(&TokenKind::RBracket) {
                self.pos += 1;
                return Ok(items);
            }
            items.push(self.parse_value()?);
            match self.peek() {
                Some(TokenKind::Comma) => self.pos += 1,
                Some(TokenKind::RBracket) => {}
                _ => {
                    let token = self.advance()?;
                    return Err(Error::malformed(
                        token.line,
                        format!("expected ',' or ']', found {}", describe(&token.kind)),
                    ));
                }
            }
        }
    }

    fn parse_hash(&mut self) -> Result<Vec<(String, Literal)>> {
        let mut pairs = Vec::new();
        loop {
            let token = self.advance()?;
            let key = match token.kind {
                TokenKind::RBrace => return Ok(pairs),
                TokenKind::Label(key) => key,
                TokenKind::Str(key) | TokenKind::Symbol(key) => {
                    self.expect(&TokenKind::FatArrow, "'=>'")?;
                    key
                }
                other => {
                    return Err(Error::malformed(
                        token.line,
                        format!("expected hash key, found {}", describe(&other)),
                    ));
                }
            };
            pairs.push((key, self.parse_value()?));
            match self.peek() {
                Some(TokenKind::Comma) => self.pos += 1,
                Some(TokenKind::RBrace) => {}
                _ => {
                    let token = self.advance()?;
                    return Err(Error::malformed(
                        token.line,
                        format!("expected ',' or '}}', found {}", describe(&token.kind)),
                    ));
                }
            }
        }
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Ident(s) => format!("identifier '{s}'"),
        TokenKind::Label(s) => format!("keyword '{s}:'"),
        TokenKind::Symbol(s) => format!("symbol ':{s}'"),
        TokenKind::Str(s) => format!("string '{s}'"),
        TokenKind::Integer(n) => format!("integer {n}"),
        TokenKind::Float(f) => format!("float {f}"),
        TokenKind::Comma => "','".to_string(),
        TokenKind::Assign => "'='".to_string(),
        TokenKind::FatArrow => "'=>'".to_string(),
        TokenKind::LBracket => "'['".to_string(),
        TokenKind::RBracket => "']'".to_string(),
        TokenKind::LBrace => "'{'".to_string(),
        TokenKind::RBrace => "'}'".to_string(),
        TokenKind::LParen => "'('".to_string(),
        TokenKind::RParen => "')'".to_string(),
        TokenKind::Newline => "end of line".to_string(),
    }
}

/// Accumulates directives and enforces document-level invariants.
#[derive(Default)]
struct DocumentBuilder {
    name: Option<String>,
    default_source: Vec<SourceDescriptor>,
    dependencies: Vec<Dependency>,
    run_lists: BTreeMap<String, RunList>,
    attributes: AttributeTree,
    override_attributes: AttributeTree,
}

impl DocumentBuilder {
    fn apply(&mut self, statement: Statement) -> Result<()> {
        match statement {
            Statement::Call { name, args, line } => match name.as_str() {
                "name" => self.name(&args, line),
                "default_source" => self.default_source(args, line),
                "cookbook" => self.cookbook(args, line),
                "run_list" => {
                    let recipes = recipes(args, line)?;
                    self.add_run_list(DEFAULT_RUN_LIST.to_string(), recipes, line)
                }
                "named_run_list" => self.named_run_list(args, line),
                other => Err(Error::malformed(line, format!("unknown directive '{other}'"))),
            },
            Statement::Assign {
                scope,
                path,
                value,
                line,
            } => {
                let tree = match scope {
                    Scope::Default => &mut self.attributes,
                    Scope::Override => &mut self.override_attributes,
                };
                let value = value.into_attribute(line)?;
                tree.insert(&AttributePath::from(path), value)
                    .map_err(|e| pin_line(e, line))
            }
        }
    }

    fn name(&mut self, args: &[Arg], line: usize) -> Result<()> {
        if self.name.is_some() {
            return Err(Error::malformed(line, "'name' declared more than once"));
        }
        let [Arg::Positional(Literal::Str(name) | Literal::Symbol(name))] = args else {
            return Err(Error::malformed(line, "'name' takes exactly one string"));
        };
        if name.trim().is_empty() {
            return Err(Error::malformed(line, "'name' must not be empty"));
        }
        if name.chars().any(char::is_control) {
            return Err(Error::malformed(
                line,
                "'name' must not contain control characters",
            ));
        }
        self.name = Some(name.clone());
        Ok(())
    }

    fn default_source(&mut self, args: Vec<Arg>, line: usize) -> Result<()> {
        let mut positional = Vec::new();
        for arg in args {
            match arg {
                Arg::Positional(value) => positional.push(value),
                Arg::Keyword(key, _) => {
                    return Err(Error::malformed(
                        line,
                        format!("'default_source' does not accept keyword '{key}:'"),
                    ));
                }
            }
        }

        let mut iter = positional.into_iter();
        let kind = match iter.next() {
            Some(Literal::Symbol(kind)) => kind,
            Some(other) => {
                return Err(Error::malformed(
                    line,
                    format!("'default_source' expects a source symbol, found {}", other.describe()),
                ));
            }
            None => return Err(Error::malformed(line, "'default_source' requires a source type")),
        };
        let location = match iter.next() {
            Some(Literal::Str(s)) => Some(s),
            Some(other) => {
                return Err(Error::malformed(
                    line,
                    format!("'default_source :{kind}' expects a string location, found {}", other.describe()),
                ));
            }
            None => None,
        };
        if iter.next().is_some() {
            return Err(Error::malformed(
                line,
                format!("too many arguments to 'default_source :{kind}'"),
            ));
        }

        let required = |location: Option<String>, what: &str| {
            location.ok_or_else(|| {
                Error::malformed(line, format!("'default_source :{kind}' requires a {what}"))
            })
        };
        let source = match kind.as_str() {
            "supermarket" => SourceDescriptor::Supermarket { url: location },
            "chef_server" => SourceDescriptor::ChefServer {
                url: required(location, "URL")?,
            },
            "chef_repo" => SourceDescriptor::ChefRepo {
                path: required(location, "path")?,
            },
            "artifactory" => SourceDescriptor::Artifactory {
                url: required(location, "URL")?,
            },
            other => {
                return Err(Error::malformed(
                    line,
                    format!(
                        "unknown default_source ':{other}' (expected :supermarket, :chef_server, :chef_repo or :artifactory)"
                    ),
                ));
            }
        };

        if self.default_source.contains(&source) {
            return Err(Error::malformed(
                line,
                format!("default_source '{source}' declared more than once"),
            ));
        }
        self.default_source.push(source);
        Ok(())
    }

    fn cookbook(&mut self, args: Vec<Arg>, line: usize) -> Result<()> {
        let mut name = None;
        let mut constraint = None;
        let mut symbol_source = None;
        let mut options = CookbookOptions::default();

        for arg in args {
            match arg {
                Arg::Positional(Literal::Str(s)) if name.is_none() => name = Some(s),
                Arg::Positional(Literal::Str(s)) if constraint.is_none() && symbol_source.is_none() => {
                    let parsed = VersionConstraint::parse(&s).map_err(|reason| Error::malformed(line, reason))?;
                    constraint = Some(parsed);
                }
                Arg::Positional(Literal::Symbol(s)) if name.is_some() && symbol_source.is_none() => {
                    symbol_source = Some(match s.as_str() {
                        "supermarket" => CookbookSource::Supermarket { url: None },
                        "chef_server" => CookbookSource::ChefServer { url: None },
                        other => {
                            return Err(Error::malformed(
                                line,
                                format!("unknown cookbook source ':{other}'"),
                            ));
                        }
                    });
                }
                Arg::Positional(other) => {
                    return Err(Error::malformed(
                        line,
                        format!("unexpected {} argument to 'cookbook'", other.describe()),
                    ));
                }
                Arg::Keyword(key, value) => options.set(&key, value, line)?,
            }
        }

        let name = name.ok_or_else(|| Error::malformed(line, "'cookbook' requires a name"))?;
        if name.trim().is_empty() {
            return Err(Error::malformed(line, "cookbook name must not be empty"));
        }
        if self.dependencies.iter().any(|d| d.name == name) {
            return Err(Error::DuplicateDependency { name, line });
        }

        let source = match (symbol_source, options.into_source(&name, line)?) {
            (Some(_), Some(_)) => {
                return Err(Error::malformed(
                    line,
                    format!("cookbook '{name}' declares more than one source"),
                ));
            }
            (symbol, keyword) => symbol.or(keyword),
        };

        self.dependencies.push(Dependency {
            name,
            constraint,
            source,
        });
        Ok(())
    }

    fn named_run_list(&mut self, args: Vec<Arg>, line: usize) -> Result<()> {
        let mut args = args.into_iter();
        let name = match args.next() {
            Some(Arg::Positional(Literal::Symbol(name) | Literal::Str(name))) => name,
            Some(_) => {
                return Err(Error::malformed(
                    line,
                    "'named_run_list' expects a symbol or string name first",
                ));
            }
            None => return Err(Error::malformed(line, "'named_run_list' requires a name")),
        };
        if name.trim().is_empty() {
            return Err(Error::malformed(line, "run list name must not be empty"));
        }
        let recipes = recipes(args.collect(), line)?;
        self.add_run_list(name, recipes, line)
    }

    fn add_run_list(&mut self, name: String, recipes: RunList, line: usize) -> Result<()> {
        if recipes.is_empty() {
            return Err(Error::EmptyRunList { name, line });
        }
        if self.run_lists.contains_key(&name) {
            return Err(Error::malformed(
                line,
                format!("run list '{name}' declared more than once"),
            ));
        }
        self.run_lists.insert(name, recipes);
        Ok(())
    }

    fn finish(self) -> Result<PolicyDocument> {
        let name = self
            .name
            .ok_or_else(|| Error::malformed_document("missing required field 'name'"))?;
        if self.default_source.is_empty() {
            return Err(Error::malformed_document(
                "missing required field 'default_source'",
            ));
        }
        self.attributes.check_unique_paths()?;
        self.override_attributes.check_unique_paths()?;

        Ok(PolicyDocument {
            name,
            default_source: self.default_source,
            dependencies: self.dependencies,
            run_lists: self.run_lists,
            attributes: self.attributes,
            override_attributes: self.override_attributes,
        })
    }
}

/// Keyword options of a `cookbook` directive.
#[derive(Default)]
struct CookbookOptions {
    path: Option<String>,
    git: Option<String>,
    github: Option<String>,
    chef_server: Option<String>,
    supermarket: Option<String>,
    reference: Option<GitReference>,
    rel: Option<String>,
}

impl CookbookOptions {
    fn set(&mut self, key: &str, value: Literal, line: usize) -> Result<()> {
        let Literal::Str(value) = value else {
            return Err(Error::malformed(
                line,
                format!("cookbook option '{key}:' expects a string, found {}", value.describe()),
            ));
        };

        let slot = match key {
            "path" => &mut self.path,
            "git" => &mut self.git,
            "github" => &mut self.github,
            "chef_server" => &mut self.chef_server,
            "supermarket" => &mut self.supermarket,
            "rel" => &mut self.rel,
            "branch" | "tag" | "ref" => {
                if self.reference.is_some() {
                    return Err(Error::malformed(
                        line,
                        "only one of 'branch:', 'tag:' or 'ref:' may be given",
                    ));
                }
                self.reference = Some(match key {
                    "branch" => GitReference::Branch(value),
                    "tag" => GitReference::Tag(value),
                    _ => GitReference::Ref(value),
                });
                return Ok(());
            }
            other => {
                return Err(Error::malformed(
                    line,
                    format!("unknown cookbook option '{other}:'"),
                ));
            }
        };
        if slot.is_some() {
            return Err(Error::malformed(
                line,
                format!("cookbook option '{key}:' given more than once"),
            ));
        }
        *slot = Some(value);
        Ok(())
    }

    fn into_source(self, name: &str, line: usize) -> Result<Option<CookbookSource>> {
        let mut sources = Vec::new();
        if let Some(path) = self.path {
            sources.push(CookbookSource::Path { path });
        }
        if let Some(url) = self.git {
            sources.push(CookbookSource::Git {
                url,
                reference: self.reference.clone(),
                rel: self.rel.clone(),
            });
        }
        if let Some(repo) = self.github {
            sources.push(CookbookSource::Github {
                repo,
                reference: self.reference.clone(),
                rel: self.rel.clone(),
            });
        }
        if let Some(url) = self.chef_server {
            sources.push(CookbookSource::ChefServer { url: Some(url) });
        }
        if let Some(url) = self.supermarket {
            sources.push(CookbookSource::Supermarket { url: Some(url) });
        }

        if sources.len() > 1 {
            return Err(Error::malformed(
                line,
                format!("cookbook '{name}' declares more than one source"),
            ));
        }
        let source = sources.pop();
        let is_git = matches!(
            source,
            Some(CookbookSource::Git { .. } | CookbookSource::Github { .. })
        );
        if !is_git && (self.reference.is_some() || self.rel.is_some()) {
            return Err(Error::malformed(
                line,
                format!("cookbook '{name}': 'branch:', 'tag:', 'ref:' and 'rel:' need a git or github source"),
            ));
        }
        Ok(source)
    }
}

/// Collects recipe identifiers from run-list arguments.
///
/// Accepts separate strings, a single array, or a mix of both.
fn recipes(args: Vec<Arg>, line: usize) -> Result<RunList> {
    let mut out = Vec::new();
    for arg in args {
        match arg {
            Arg::Positional(Literal::Array(items)) => {
                for item in items {
                    out.push(recipe_item(item, line)?);
                }
            }
            Arg::Positional(item) => out.push(recipe_item(item, line)?),
            Arg::Keyword(key, _) => {
                return Err(Error::malformed(
                    line,
                    format!("run lists do not accept keyword '{key}:'"),
                ));
            }
        }
    }
    Ok(out)
}

fn recipe_item(item: Literal, line: usize) -> Result<String> {
    match item {
        Literal::Str(raw) => recipe_id(&raw, line),
        other => Err(Error::malformed(
            line,
            format!("run list items must be strings, found {}", other.describe()),
        )),
    }
}

/// Normalizes a run-list item to a bare recipe identifier.
fn recipe_id(raw: &str, line: usize) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with("role[") {
        return Err(Error::malformed(
            line,
            format!("roles are not supported in policy run lists: '{trimmed}'"),
        ));
    }
    let id = trimmed
        .strip_prefix("recipe[")
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);

    let valid_part = |part: &str| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    };
    let parts: Vec<&str> = id.split("::").collect();
    if parts.len() > 2 || !parts.iter().all(|p| valid_part(p)) {
        return Err(Error::malformed(
            line,
            format!("invalid recipe identifier '{raw}'"),
        ));
    }
    Ok(id.to_string())
}

/// Attaches a line to an error raised without one.
fn pin_line(error: Error, line: usize) -> Error {
    match error {
        Error::MalformedDocument { line: None, reason } => Error::MalformedDocument {
            line: Some(line),
            reason,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ConstraintOperator;

    const MINIMAL: &str = "name 'p'\ndefault_source :supermarket\n";

    fn with_minimal(body: &str) -> String {
        format!("{MINIMAL}{body}")
    }

    #[test]
    fn parse_minimal_document() {
        let doc = parse(MINIMAL).unwrap();
        assert_eq!(doc.name, "p");
        assert_eq!(doc.default_source, vec![SourceDescriptor::Supermarket { url: None }]);
        assert!(doc.dependencies.is_empty());
        assert!(doc.run_lists.is_empty());
        assert!(doc.attributes.is_empty());
    }

    #[test]
    fn parse_is_deterministic() {
        let input = with_minimal(
            "cookbook 'a', '>= 1.0'\nrun_list 'a'\ndefault['x']['y'] = [1, 'two', nil]\n",
        );
        assert_eq!(parse(&input).unwrap(), parse(&input).unwrap());
    }

    #[test]
    fn parse_missing_name() {
        let result = parse("default_source :supermarket\nrun_list 'a'\n");
        assert!(matches!(
            result,
            Err(Error::MalformedDocument { line: None, ref reason }) if reason.contains("'name'")
        ));
    }

    #[test]
    fn parse_empty_input() {
        assert!(matches!(parse(""), Err(Error::MalformedDocument { .. })));
        assert!(matches!(parse("# only a comment\n"), Err(Error::MalformedDocument { .. })));
    }

    #[test]
    fn parse_missing_default_source() {
        let result = parse("name 'p'\n");
        assert!(matches!(
            result,
            Err(Error::MalformedDocument { ref reason, .. }) if reason.contains("default_source")
        ));
    }

    #[test]
    fn parse_rejects_empty_and_repeated_name() {
        assert!(matches!(
            parse("name ''\ndefault_source :supermarket\n"),
            Err(Error::MalformedDocument { line: Some(1), .. })
        ));
        assert!(matches!(
            parse("name 'a'\nname 'b'\ndefault_source :supermarket\n"),
            Err(Error::MalformedDocument { line: Some(2), .. })
        ));
        assert!(parse("name 'a', 'b'\ndefault_source :supermarket\n").is_err());
    }

    #[test]
    fn parse_rejects_control_characters_in_name() {
        assert_eq!(
            parse("name \"web\\nname: evil\"\ndefault_source :supermarket\n").unwrap_err(),
            Error::malformed(1, "'name' must not contain control characters")
        );
        assert!(parse("name \"tab\\there\"\ndefault_source :supermarket\n").is_err());
    }

    #[test]
    fn parse_duplicate_dependency() {
        let input = with_minimal("cookbook 'nginx'\ncookbook 'nginx', '= 1.0.0'\n");
        assert_eq!(
            parse(&input).unwrap_err(),
            Error::DuplicateDependency {
                name: "nginx".to_string(),
                line: 4
            }
        );
    }

    #[test]
    fn parse_empty_run_list() {
        assert_eq!(
            parse(&with_minimal("run_list\n")).unwrap_err(),
            Error::EmptyRunList {
                name: "default".to_string(),
                line: 3
            }
        );
        assert_eq!(
            parse(&with_minimal("named_run_list :deploy\n")).unwrap_err(),
            Error::EmptyRunList {
                name: "deploy".to_string(),
                line: 3
            }
        );
        assert!(matches!(
            parse(&with_minimal("run_list []\n")),
            Err(Error::EmptyRunList { .. })
        ));
    }

    #[test]
    fn parse_run_list_forms() {
        let input = with_minimal(
            "run_list ['a::b', 'recipe[c]'],\n  'd'\nnamed_run_list(:ops, 'e::f')\nnamed_run_list 'with-dash', 'g'\n",
        );
        let doc = parse(&input).unwrap();
        assert_eq!(doc.default_run_list().unwrap(), ["a::b", "c", "d"]);
        assert_eq!(doc.run_list("ops").unwrap(), ["e::f"]);
        assert_eq!(doc.run_list("with-dash").unwrap(), ["g"]);
    }

    #[test]
    fn parse_rejects_duplicate_run_list() {
        let input = with_minimal("run_list 'a'\nnamed_run_list :default, 'b'\n");
        assert!(matches!(
            parse(&input),
            Err(Error::MalformedDocument { line: Some(4), .. })
        ));
    }

    #[test]
    fn parse_rejects_bad_recipes() {
        for item in ["'role[web]'", "'a::b::c'", "'has space'", "''", "1", "'a::'"] {
            let input = with_minimal(&format!("run_list {item}\n"));
            assert!(
                matches!(parse(&input), Err(Error::MalformedDocument { .. })),
                "accepted {item}"
            );
        }
    }

    #[test]
    fn parse_default_sources() {
        let input = "name 'p'\n\
            default_source :supermarket, 'https://market.example'\n\
            default_source :chef_server, 'https://chef.example/organizations/o'\n\
            default_source :chef_repo, '../cookbooks'\n\
            default_source :artifactory, 'https://art.example'\n";
        let doc = parse(input).unwrap();
        assert_eq!(doc.default_source.len(), 4);
        assert_eq!(
            doc.default_source[2],
            SourceDescriptor::ChefRepo {
                path: "../cookbooks".into()
            }
        );
    }

    #[test]
    fn parse_rejects_bad_default_sources() {
        for line in [
            "default_source\n",
            "default_source :nexus\n",
            "default_source :chef_server\n",
            "default_source 'supermarket'\n",
            "default_source :supermarket\ndefault_source :supermarket\n",
            "default_source :supermarket, url: 'x'\n",
        ] {
            let input = format!("name 'p'\n{line}");
            assert!(
                matches!(parse(&input), Err(Error::MalformedDocument { .. })),
                "accepted {line:?}"
            );
        }
    }

    #[test]
    fn parse_cookbook_sources() {
        let input = with_minimal(
            "cookbook 'a', '~> 1.2', :chef_server\n\
             cookbook 'b', path: '../b'\n\
             cookbook 'c', git: 'https://git.example/c.git', tag: 'v1', rel: 'cookbooks/c'\n\
             cookbook 'd', github: 'org/d', branch: 'main'\n\
             cookbook 'e'\n",
        );
        let doc = parse(&input).unwrap();

        let a = doc.dependency("a").unwrap();
        assert_eq!(a.constraint.as_ref().unwrap().operator, ConstraintOperator::Pessimistic);
        assert_eq!(a.source, Some(CookbookSource::ChefServer { url: None }));

        assert_eq!(
            doc.dependency("b").unwrap().source,
            Some(CookbookSource::Path { path: "../b".into() })
        );
        assert_eq!(
            doc.dependency("c").unwrap().source,
            Some(CookbookSource::Git {
                url: "https://git.example/c.git".into(),
                reference: Some(GitReference::Tag("v1".into())),
                rel: Some("cookbooks/c".into()),
            })
        );
        assert_eq!(
            doc.dependency("d").unwrap().source,
            Some(CookbookSource::Github {
                repo: "org/d".into(),
                reference: Some(GitReference::Branch("main".into())),
                rel: None,
            })
        );
        let e = doc.dependency("e").unwrap();
        assert!(e.constraint.is_none() && e.source.is_none());

        let names: Vec<_> = doc.dependencies.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn parse_rejects_bad_cookbooks() {
        for line in [
            "cookbook\n",
            "cookbook :a\n",
            "cookbook 'a', 'latest'\n",
            "cookbook 'a', :git\n",
            "cookbook 'a', path: '.', git: 'u'\n",
            "cookbook 'a', :supermarket, path: '.'\n",
            "cookbook 'a', branch: 'main'\n",
            "cookbook 'a', git: 'u', branch: 'x', tag: 'y'\n",
            "cookbook 'a', version: '1.0'\n",
            "cookbook 'a', path: 1\n",
        ] {
            let input = with_minimal(line);
            assert!(
                matches!(parse(&input), Err(Error::MalformedDocument { .. })),
                "accepted {line:?}"
            );
        }
    }

    #[test]
    fn parse_attribute_values() {
        let input = with_minimal(
            "default['a']['str'] = \"double\"\n\
             default['a']['sym'] = :sym\n\
             default['a']['int'] = -3\n\
             default['a']['float'] = 0.25\n\
             default['a']['nil'] = nil\n\
             default['a']['list'] = [1, [true], {}]\n\
             default['a']['hash'] = { 'k' => 'v', other: 2 }\n\
             override['a']['int'] = 4\n",
        );
        let doc = parse(&input).unwrap();
        assert_eq!(doc.attribute("a.str").unwrap().as_str(), Some("double"));
        assert_eq!(doc.attribute("a.sym").unwrap().as_str(), Some("sym"));
        assert_eq!(doc.attribute("a.int").unwrap().as_i64(), Some(-3));
        assert_eq!(doc.attribute("a.float").unwrap(), &AttributeValue::Float(0.25));
        assert_eq!(doc.attribute("a.nil").unwrap(), &AttributeValue::Null);
        assert_eq!(
            doc.attribute("a.list").unwrap(),
            &AttributeValue::List(vec![
                AttributeValue::Integer(1),
                AttributeValue::List(vec![AttributeValue::Bool(true)]),
                AttributeValue::Map(BTreeMap::new()),
            ])
        );
        assert_eq!(doc.attribute("a.hash.k").unwrap().as_str(), Some("v"));
        assert_eq!(doc.attribute("a.hash.other").unwrap().as_i64(), Some(2));
        assert_eq!(doc.override_attribute("a.int").unwrap().as_i64(), Some(4));
        assert!(doc.override_attribute("a.str").is_err());
    }

    #[test]
    fn parse_rejects_attribute_conflicts() {
        let input = with_minimal("default['a'] = 1\ndefault['a'] = 2\n");
        assert!(matches!(
            parse(&input),
            Err(Error::MalformedDocument { line: Some(4), .. })
        ));

        let input = with_minimal("default['a'] = 1\ndefault['a']['b'] = 2\n");
        assert!(matches!(
            parse(&input),
            Err(Error::MalformedDocument { line: Some(4), .. })
        ));

        let input = with_minimal("default['a.b'] = 1\ndefault['a']['b'] = 2\n");
        assert!(matches!(
            parse(&input),
            Err(Error::MalformedDocument { line: None, .. })
        ));

        let input = with_minimal("default['h'] = { 'k' => 1, k: 2 }\n");
        assert!(matches!(
            parse(&input),
            Err(Error::MalformedDocument { line: Some(3), .. })
        ));
    }

    #[test]
    fn parse_rejects_unknown_directives_and_syntax() {
        for body in [
            "include_policy 'base'\n",
            "default 'x'\n",
            "normal['a'] = 1\n",
            "default['a'] 1\n",
            "default[1] = 2\n",
            "run_list 'a' 'b'\n",
            "= 1\n",
            "run_list foo\n",
        ] {
            let input = with_minimal(body);
            assert!(
                matches!(parse(&input), Err(Error::MalformedDocument { .. })),
                "accepted {body:?}"
            );
        }
    }

    #[test]
    fn parse_reports_line_of_unknown_directive() {
        let input = with_minimal("\n\n# comment\nfrobnicate\n");
        assert_eq!(
            parse(&input).unwrap_err(),
            Error::malformed(6, "unknown directive 'frobnicate'")
        );
    }

    #[test]
    fn recipe_id_normalization() {
        assert_eq!(recipe_id("recipe[nginx::default]", 1).unwrap(), "nginx::default");
        assert_eq!(recipe_id(" nginx ", 1).unwrap(), "nginx");
        assert!(recipe_id("recipe[]", 1).is_err());
    }
}
