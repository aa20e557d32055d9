//! Username template language
//!
//! Templates mix static text with `{{ … }}` actions. An action is a pipeline
//! of commands separated by `|`; the value of each stage is passed as the
//! **last** argument of the next one, so `{{ .RoleName | truncate 15 }}` is
//! the same as `{{ truncate 15 .RoleName }}`.
//!
//! Operands:
//! - fields `.RoleName` and `.DisplayName` (aliases `role`, `role_name`, `display_name`)
//! - `"quoted"` or `` `raw` `` strings and integers
//! - parenthesised sub-pipelines
//!
//! Functions: `printf`, `truncate`, `random`, `lowercase`, `uppercase`,
//! `replace`, `unix_time`, `unix_time_millis`, `uuid`.
//!
//! `{{-` and `-}}` trim whitespace around the action.
//!
//! Templates are parsed once; unknown fields and functions are rejected at
//! parse time, argument errors at render time.

use rand::Rng;
use rand::distributions::Alphanumeric;
use std::fmt;
use thiserror::Error;

use crate::core::UsernameMetadata;

/// Upper bound on actions per template
const MAX_ACTIONS: usize = 64;

/// Upper bound on `random N`
const MAX_RANDOM_LEN: usize = 1024;

/// Upper bound on nested `( … )` sub-pipelines within one action
const MAX_NESTING: usize = 16;

/// Template parse or render error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// `{{` without a matching `}}`
    #[error("unclosed action starting at offset {offset}")]
    Unclosed {
        /// Byte offset of the `{{`
        offset: usize,
    },

    /// Malformed action
    #[error("syntax error at offset {offset}: {reason}")]
    Syntax {
        /// Byte offset of the offending token
        offset: usize,
        /// What is wrong
        reason: String,
    },

    /// Template has more actions than allowed
    #[error("template has more than {max} actions")]
    TooManyActions {
        /// Limit
        max: usize,
    },

    /// A function rejected its arguments
    #[error("{function}: {reason}")]
    Render {
        /// Function name
        function: &'static str,
        /// What is wrong
        reason: String,
    },
}

type TemplateResult<T> = Result<T, TemplateError>;

/// A parsed template
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq)]
enum Part {
    Text(String),
    Action(Pipeline),
}

#[derive(Debug, Clone, PartialEq)]
struct Pipeline(Vec<Command>);

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Call { function: Function, args: Vec<Operand> },
    Value(Operand),
}

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Field(Field),
    Text(String),
    Int(i64),
    Call(Function),
    Pipeline(Pipeline),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    RoleName,
    DisplayName,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "RoleName" => Some(Self::RoleName),
            "DisplayName" => Some(Self::DisplayName),
            _ => None,
        }
    }

    fn from_alias(name: &str) -> Option<Self> {
        match name {
            "role" | "role_name" => Some(Self::RoleName),
            "display_name" => Some(Self::DisplayName),
            _ => None,
        }
    }

    fn read(self, metadata: &UsernameMetadata) -> &str {
        match self {
            Self::RoleName => &metadata.role_name,
            Self::DisplayName => &metadata.display_name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Function {
    Printf,
    Truncate,
    Random,
    Lowercase,
    Uppercase,
    Replace,
    UnixTime,
    UnixTimeMillis,
    Uuid,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "printf" => Self::Printf,
            "truncate" => Self::Truncate,
            "random" => Self::Random,
            "lowercase" => Self::Lowercase,
            "uppercase" => Self::Uppercase,
            "replace" => Self::Replace,
            "unix_time" => Self::UnixTime,
            "unix_time_millis" => Self::UnixTimeMillis,
            "uuid" => Self::Uuid,
            _ => return None,
        })
    }

    fn name(self) -> &'static str {
        match self {
            Self::Printf => "printf",
            Self::Truncate => "truncate",
            Self::Random => "random",
            Self::Lowercase => "lowercase",
            Self::Uppercase => "uppercase",
            Self::Replace => "replace",
            Self::UnixTime => "unix_time",
            Self::UnixTimeMillis => "unix_time_millis",
            Self::Uuid => "uuid",
        }
    }

    fn error(self, reason: impl Into<String>) -> TemplateError {
        TemplateError::Render {
            function: self.name(),
            reason: reason.into(),
        }
    }

    fn arity(self, args: &[Value], expected: usize) -> TemplateResult<()> {
        if args.len() == expected {
            Ok(())
        } else {
            Err(self.error(format!(
                "expected {expected} argument(s), got {}",
                args.len()
            )))
        }
    }

    fn call(self, args: Vec<Value>) -> TemplateResult<Value> {
        match self {
            Self::Printf => printf(args),
            Self::Truncate => {
                self.arity(&args, 2)?;
                let len = self.count(&args[0])?;
                Ok(Value::Text(args[1].to_string().chars().take(len).collect()))
            }
            Self::Random => {
                self.arity(&args, 1)?;
                let len = self.count(&args[0])?;
                if len > MAX_RANDOM_LEN {
                    return Err(self.error(format!("length must be at most {MAX_RANDOM_LEN}")));
                }
                let value = rand::thread_rng()
                    .sample_iter(&Alphanumeric)
                    .take(len)
                    .map(char::from)
                    .collect();
                Ok(Value::Text(value))
            }
            Self::Lowercase => {
                self.arity(&args, 1)?;
                Ok(Value::Text(args[0].to_string().to_lowercase()))
            }
            Self::Uppercase => {
                self.arity(&args, 1)?;
                Ok(Value::Text(args[0].to_string().to_uppercase()))
            }
            Self::Replace => {
                self.arity(&args, 3)?;
                let from = args[0].to_string();
                if from.is_empty() {
                    return Err(self.error("search string must not be empty"));
                }
                let to = args[1].to_string();
                Ok(Value::Text(args[2].to_string().replace(&from, &to)))
            }
            Self::UnixTime => {
                self.arity(&args, 0)?;
                Ok(Value::Int(chrono::Utc::now().timestamp()))
            }
            Self::UnixTimeMillis => {
                self.arity(&args, 0)?;
                Ok(Value::Int(chrono::Utc::now().timestamp_millis()))
            }
            Self::Uuid => {
                self.arity(&args, 0)?;
                Ok(Value::Text(uuid::Uuid::new_v4().to_string()))
            }
        }
    }

    /// Non-negative integer argument
    fn count(self, value: &Value) -> TemplateResult<usize> {
        let n = value.as_int().ok_or_else(|| {
            self.error(format!("expected an integer, got {value:?}"))
        })?;
        usize::try_from(n).map_err(|_| self.error(format!("length must not be negative, got {n}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Text(String),
    Int(i64),
}

impl Value {
    fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
        }
    }
}

fn printf(args: Vec<Value>) -> TemplateResult<Value> {
    let function = Function::Printf;
    let mut args = args.into_iter();
    let format = args
        .next()
        .ok_or_else(|| function.error("missing format string"))?
        .to_string();

    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some(verb @ ('s' | 'v' | 'd')) => {
                let value = args
                    .next()
                    .ok_or_else(|| function.error(format!("missing argument for %{verb}")))?;
                if verb == 'd' {
                    let n = value
                        .as_int()
                        .ok_or_else(|| function.error(format!("%d needs an integer, got {value:?}")))?;
                    out.push_str(&n.to_string());
                } else {
                    out.push_str(&value.to_string());
                }
            }
            Some(other) => return Err(function.error(format!("unsupported verb %{other}"))),
            None => return Err(function.error("format ends with a lone %")),
        }
    }

    if args.next().is_some() {
        return Err(function.error("too many arguments for format"));
    }
    Ok(Value::Text(out))
}

impl Template {
    /// Parse a template
    pub fn parse(source: &str) -> TemplateResult<Self> {
        let mut parts = Vec::new();
        let mut actions = 0usize;
        let mut cursor = 0usize;
        let mut trim_next = false;

        while let Some(found) = source[cursor..].find("{{") {
            let open = cursor + found;
            let mut text = &source[cursor..open];
            if trim_next {
                text = text.trim_start();
            }

            let mut body = open + 2;
            let strip_left = source[body..].starts_with('-')
                && source[body + 1..].starts_with(char::is_whitespace);
            if strip_left {
                text = text.trim_end();
                body += 1;
            }
            push_text(&mut parts, text);

            let lexed = lex_action(source, open, body)?;
            let pipeline = Parser::new(lexed.tokens, open).parse_action()?;
            parts.push(Part::Action(pipeline));

            actions += 1;
            if actions > MAX_ACTIONS {
                return Err(TemplateError::TooManyActions { max: MAX_ACTIONS });
            }

            cursor = lexed.end;
            trim_next = lexed.strip_right;
        }

        let mut tail = &source[cursor..];
        if trim_next {
            tail = tail.trim_start();
        }
        push_text(&mut parts, tail);

        Ok(Self {
            source: source.to_string(),
            parts,
        })
    }

    /// Template text as given to [`Template::parse`]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render against the username metadata of one request
    pub fn render(&self, metadata: &UsernameMetadata) -> TemplateResult<String> {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Text(text) => out.push_str(text),
                Part::Action(pipeline) => {
                    out.push_str(&eval_pipeline(pipeline, metadata)?.to_string());
                }
            }
        }
        Ok(out)
    }
}

fn push_text(parts: &mut Vec<Part>, text: &str) {
    if !text.is_empty() {
        parts.push(Part::Text(text.to_string()));
    }
}

fn eval_pipeline(pipeline: &Pipeline, metadata: &UsernameMetadata) -> TemplateResult<Value> {
    let mut piped: Option<Value> = None;
    for command in &pipeline.0 {
        let value = match command {
            Command::Value(operand) => eval_operand(operand, metadata)?,
            Command::Call { function, args } => {
                let mut values = args
                    .iter()
                    .map(|arg| eval_operand(arg, metadata))
                    .collect::<TemplateResult<Vec<_>>>()?;
                values.extend(piped.take());
                function.call(values)?
            }
        };
        piped = Some(value);
    }
    // Parser never produces an empty pipeline
    Ok(piped.unwrap_or_else(|| Value::Text(String::new())))
}

fn eval_operand(operand: &Operand, metadata: &UsernameMetadata) -> TemplateResult<Value> {
    match operand {
        Operand::Field(field) => Ok(Value::Text(field.read(metadata).to_string())),
        Operand::Text(text) => Ok(Value::Text(text.clone())),
        Operand::Int(n) => Ok(Value::Int(*n)),
        Operand::Call(function) => function.call(Vec::new()),
        Operand::Pipeline(pipeline) => eval_pipeline(pipeline, metadata),
    }
}

// ── Lexer ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Field(String),
    Ident(String),
    Text(String),
    Int(i64),
    Pipe,
    Open,
    Close,
}

struct Lexed {
    tokens: Vec<(usize, Token)>,
    /// Offset just past the closing `}}`
    end: usize,
    strip_right: bool,
}

fn syntax(offset: usize, reason: impl Into<String>) -> TemplateError {
    TemplateError::Syntax {
        offset,
        reason: reason.into(),
    }
}

fn ident_at(source: &str, start: usize) -> &str {
    let rest = &source[start..];
    let len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    &rest[..len]
}

fn lex_action(source: &str, open: usize, start: usize) -> TemplateResult<Lexed> {
    let mut tokens = Vec::new();
    let mut i = start;

    loop {
        let rest = &source[i..];
        if rest.starts_with("}}") {
            return Ok(Lexed {
                tokens,
                end: i + 2,
                strip_right: false,
            });
        }
        if rest.starts_with("-}}") {
            return Ok(Lexed {
                tokens,
                end: i + 3,
                strip_right: true,
            });
        }
        let Some(c) = rest.chars().next() else {
            return Err(TemplateError::Unclosed { offset: open });
        };

        match c {
            c if c.is_whitespace() => i += c.len_utf8(),
            '|' => {
                tokens.push((i, Token::Pipe));
                i += 1;
            }
            '(' => {
                tokens.push((i, Token::Open));
                i += 1;
            }
            ')' => {
                tokens.push((i, Token::Close));
                i += 1;
            }
            '"' => {
                let (text, next) = lex_quoted(source, i)?;
                tokens.push((i, Token::Text(text)));
                i = next;
            }
            '`' => {
                let body = &source[i + 1..];
                let len = body
                    .find('`')
                    .ok_or_else(|| syntax(i, "unterminated raw string"))?;
                tokens.push((i, Token::Text(body[..len].to_string())));
                i += len + 2;
            }
            '.' => {
                let name = ident_at(source, i + 1);
                if name.is_empty() {
                    return Err(syntax(i, "expected a field name after '.'"));
                }
                tokens.push((i, Token::Field(name.to_string())));
                i += 1 + name.len();
            }
            c if c.is_ascii_digit() || (c == '-' && rest[1..].starts_with(|d: char| d.is_ascii_digit())) => {
                let digits = rest[1..]
                    .find(|d: char| !d.is_ascii_digit())
                    .map_or(rest.len(), |n| n + 1);
                let literal = &rest[..digits];
                let n = literal
                    .parse::<i64>()
                    .map_err(|e| syntax(i, format!("bad number {literal}: {e}")))?;
                tokens.push((i, Token::Int(n)));
                i += digits;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let name = ident_at(source, i);
                tokens.push((i, Token::Ident(name.to_string())));
                i += name.len();
            }
            other => return Err(syntax(i, format!("unexpected character {other:?}"))),
        }
    }
}

/// Lex a double-quoted string starting at `start`; returns the value and the offset after it
fn lex_quoted(source: &str, start: usize) -> TemplateResult<(String, usize)> {
    let mut value = String::new();
    let mut chars = source[start + 1..].char_indices();
    while let Some((idx, c)) = chars.next() {
        match c {
            '"' => return Ok((value, start + 1 + idx + 1)),
            '\\' => match chars.next() {
                Some((_, '"')) => value.push('"'),
                Some((_, '\\')) => value.push('\\'),
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, other)) => {
                    return Err(syntax(start + 1 + idx, format!("unknown escape \\{other}")));
                }
                None => break,
            },
            c => value.push(c),
        }
    }
    Err(syntax(start, "unterminated string"))
}

// ── Parser ──────────────────────────────────────────────────────────────────

enum Item {
    Ident(usize, String),
    Operand(Operand),
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    open: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<(usize, Token)>, open: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            open,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, token)| token)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.open, |(offset, _)| *offset)
    }

    fn parse_action(mut self) -> TemplateResult<Pipeline> {
        if self.tokens.is_empty() {
            return Err(syntax(self.open, "empty action"));
        }
        let pipeline = self.parse_pipeline()?;
        if self.pos < self.tokens.len() {
            return Err(syntax(self.offset(), "unexpected ')'"));
        }
        Ok(pipeline)
    }

    fn parse_pipeline(&mut self) -> TemplateResult<Pipeline> {
        let mut commands = vec![self.parse_command()?];
        while self.peek() == Some(&Token::Pipe) {
            self.pos += 1;
            let offset = self.offset();
            let command = self.parse_command()?;
            if matches!(command, Command::Value(_)) {
                return Err(syntax(offset, "cannot pipe into a non-function"));
            }
            commands.push(command);
        }
        Ok(Pipeline(commands))
    }

    fn parse_command(&mut self) -> TemplateResult<Command> {
        let start = self.offset();
        let mut items = Vec::new();
        while let Some((offset, token)) = self.tokens.get(self.pos).cloned() {
            let item = match token {
                Token::Pipe | Token::Close => break,
                Token::Open => {
                    if self.depth >= MAX_NESTING {
                        return Err(syntax(offset, "parentheses nested too deeply"));
                    }
                    self.pos += 1;
                    self.depth += 1;
                    let inner = self.parse_pipeline()?;
                    self.depth -= 1;
                    if self.peek() != Some(&Token::Close) {
                        return Err(syntax(offset, "unclosed '('"));
                    }
                    Item::Operand(Operand::Pipeline(inner))
                }
                Token::Field(name) => Item::Operand(Operand::Field(
                    Field::from_name(&name)
                        .ok_or_else(|| syntax(offset, format!("unknown field .{name}")))?,
                )),
                Token::Ident(name) => Item::Ident(offset, name),
                Token::Text(text) => Item::Operand(Operand::Text(text)),
                Token::Int(n) => Item::Operand(Operand::Int(n)),
            };
            self.pos += 1;
            items.push(item);
        }

        let mut items = items.into_iter();
        let Some(first) = items.next() else {
            return Err(syntax(start, "missing command"));
        };

        if let Item::Ident(offset, name) = &first {
            if let Some(function) = Function::from_name(name) {
                let args = items.map(into_operand).collect::<TemplateResult<Vec<_>>>()?;
                return Ok(Command::Call { function, args });
            }
            if !items.as_slice().is_empty() {
                return Err(syntax(*offset, format!("{name} is not a function")));
            }
        } else if !items.as_slice().is_empty() {
            return Err(syntax(start, "cannot give arguments to a non-function"));
        }
        Ok(Command::Value(into_operand(first)?))
    }
}

fn into_operand(item: Item) -> TemplateResult<Operand> {
    match item {
        Item::Operand(operand) => Ok(operand),
        Item::Ident(offset, name) => {
            if let Some(field) = Field::from_alias(&name) {
                Ok(Operand::Field(field))
            } else if let Some(function) = Function::from_name(&name) {
                Ok(Operand::Call(function))
            } else {
                Err(syntax(offset, format!("function {name} is not defined")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn metadata(display_name: &str, role_name: &str) -> UsernameMetadata {
        UsernameMetadata::new(display_name, role_name)
    }

    fn render(source: &str) -> String {
        Template::parse(source)
            .unwrap()
            .render(&metadata("token", "my-role"))
            .unwrap()
    }

    #[rstest]
    #[case("begin_{{role}}_end", "begin_my-role_end")]
    #[case("{{ .RoleName | uppercase }}", "MY-ROLE")]
    #[case("{{ .DisplayName }}_{{ role_name }}", "token_my-role")]
    #[case(r#"{{ printf "%s_%s" .DisplayName .RoleName }}"#, "token_my-role")]
    #[case(r#"{{ printf "%v-%d%%" display_name 42 }}"#, "token-42%")]
    #[case("{{ .RoleName | truncate 4 }}", "my-r")]
    #[case("{{ truncate 2 .DisplayName }}", "to")]
    #[case(r#"{{ .RoleName | replace "-" "_" | uppercase }}"#, "MY_ROLE")]
    #[case(r#"{{ "ABC" | lowercase }}"#, "abc")]
    #[case("{{ `raw\\n` }}", "raw\\n")]
    #[case("a  {{- role -}}  b", "amy-roleb")]
    #[case("plain text }} stays", "plain text }} stays")]
    #[case(r#"{{ printf "%s" (printf "%s-%s" role "x" | truncate 5) }}"#, "my-ro")]
    fn test_render(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(render(source), expected);
    }

    #[test]
    fn test_default_shape() {
        let template =
            Template::parse(r#"{{ printf "v-%s-%s" (.RoleName | truncate 15) (random 20) | truncate 20 }}"#)
                .unwrap();
        let rendered = template.render(&metadata("", "test")).unwrap();

        assert_eq!(rendered.len(), 20);
        assert!(rendered.starts_with("v-test-"));
        assert!(rendered[7..].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_random_differs_between_renders() {
        let template = Template::parse("{{ random 24 }}").unwrap();
        let meta = metadata("", "r");
        assert_ne!(template.render(&meta).unwrap(), template.render(&meta).unwrap());
    }

    #[test]
    fn test_time_and_uuid_functions() {
        let seconds: i64 = render("{{ unix_time }}").parse().unwrap();
        let millis: i64 = render(r#"{{ printf "%d" unix_time_millis }}"#).parse().unwrap();
        assert!(millis / 1000 >= seconds - 1);

        let id = render("{{ uuid }}");
        assert_eq!(id.len(), 36);
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }

    #[rstest]
    #[case("{{ role")]
    #[case("{{ }}")]
    #[case("{{ .Nope }}")]
    #[case("{{ nope }}")]
    #[case("{{ (role }}")]
    #[case("{{ role) }}")]
    #[case(r#"{{ role | "x" }}"#)]
    #[case("{{ role 1 }}")]
    #[case(r#"{{ "a" "b" }}"#)]
    #[case(r#"{{ "unterminated }}"#)]
    #[case("{{ role | }}")]
    #[case("{{ # }}")]
    #[case("{{ (((((((((((((((((role))))))))))))))))) }}")]
    fn test_parse_rejects(#[case] source: &str) {
        assert!(Template::parse(source).is_err(), "{source} should not parse");
    }

    fn nested(depth: usize) -> String {
        format!("{{{{ {}role{} }}}}", "(".repeat(depth), ")".repeat(depth))
    }

    #[test]
    fn test_nesting_limit() {
        assert_eq!(render(&nested(MAX_NESTING)), "my-role");

        let err = Template::parse(&nested(MAX_NESTING + 1)).unwrap_err();
        assert_eq!(
            err,
            TemplateError::Syntax {
                offset: 3 + MAX_NESTING,
                reason: "parentheses nested too deeply".to_string(),
            }
        );
    }

    #[test]
    fn test_deep_nesting_is_an_error_not_a_crash() {
        assert!(Template::parse(&nested(200_000)).is_err());
    }

    #[test]
    fn test_unclosed_reports_offset() {
        assert_eq!(
            Template::parse("ab{{ role").unwrap_err(),
            TemplateError::Unclosed { offset: 2 }
        );
    }

    #[test]
    fn test_too_many_actions() {
        let source = "{{role}}".repeat(MAX_ACTIONS + 1);
        assert_eq!(
            Template::parse(&source).unwrap_err(),
            TemplateError::TooManyActions { max: MAX_ACTIONS }
        );
    }

    #[rstest]
    #[case(r#"{{ truncate "x" role }}"#, "truncate")]
    #[case("{{ truncate -1 role }}", "truncate")]
    #[case("{{ random 5000 }}", "random")]
    #[case(r#"{{ printf "%s %s" role }}"#, "printf")]
    #[case(r#"{{ printf "%d" role }}"#, "printf")]
    #[case(r#"{{ printf "%q" role }}"#, "printf")]
    #[case(r#"{{ printf "%s" role 1 }}"#, "printf")]
    #[case("{{ uppercase }}", "uppercase")]
    #[case(r#"{{ role | replace "" "x" }}"#, "replace")]
    fn test_render_rejects(#[case] source: &str, #[case] function: &str) {
        let err = Template::parse(source)
            .unwrap()
            .render(&metadata("token", "my-role"))
            .unwrap_err();
        assert!(
            matches!(&err, TemplateError::Render { function: f, .. } if *f == function),
            "unexpected error {err:?}"
        );
    }

    #[test]
    fn test_source_is_kept() {
        let template = Template::parse("x-{{role}}").unwrap();
        assert_eq!(template.source(), "x-{{role}}");
    }
}
