//! Formula parsing.
//!
//! Reads a Ruby formula back into [`FormulaData`]. Only the subset of the
//! Homebrew DSL that [`FormulaGenerator`](crate::FormulaGenerator) and the
//! formula templates produce is understood: header fields, `on_<os>` /
//! `on_<arch>` blocks holding `url` and `sha256`, `def install` with
//! `bin.install`, and a `test do` block with a `system` call. Other
//! statements inside the class body are skipped.

use crate::error::{Error, Result};
use crate::formula::{BinaryInfo, FormulaData};
use ranked_searcher_release::Target;
use std::collections::BTreeMap;

/// Prefix of the installed binary path in a `system` call.
const BIN_PREFIX: &str = "#{bin}/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Class,
    Os(&'static str),
    Arch(Target),
    Install,
    Test,
}

/// A block that has been opened and not yet closed.
#[derive(Debug)]
struct OpenBlock {
    block: Block,
    span: (usize, usize),
}

/// URL and checksum collected inside one `on_<arch>` block.
#[derive(Debug, Default)]
struct PendingBinary {
    url: Option<String>,
    sha256: Option<String>,
}

/// A single logical line of the formula.
struct Line<'a> {
    text: &'a str,
    span: (usize, usize),
}

/// Parses a formula's source text.
///
/// # Errors
///
/// Returns [`Error::Parse`] pointing at the offending line for unknown or
/// unbalanced blocks, a target declared twice, a platform block missing its
/// `url` or `sha256`, malformed string literals, or a formula without a
/// class, version, or install step.
pub fn parse_formula(source: &str) -> Result<FormulaData> {
    Parser::new(source).parse()
}

struct Parser<'a> {
    source: &'a str,
    stack: Vec<OpenBlock>,
    class_name: Option<String>,
    desc: Option<String>,
    homepage: Option<String>,
    version: Option<String>,
    license: Option<String>,
    binary_name: Option<String>,
    test_args: Vec<String>,
    binaries: BTreeMap<Target, BinaryInfo>,
    pending: PendingBinary,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            stack: Vec::new(),
            class_name: None,
            desc: None,
            homepage: None,
            version: None,
            license: None,
            binary_name: None,
            test_args: Vec::new(),
            binaries: BTreeMap::new(),
            pending: PendingBinary::default(),
        }
    }

    fn parse(mut self) -> Result<FormulaData> {
        let source = self.source;
        let mut offset = 0;
        for raw in source.split_inclusive('\n') {
            let content = raw.trim_end_matches(['\n', '\r']);
            let text = content.trim();
            let indent = content.len() - content.trim_start().len();
            let line = Line {
                text,
                span: (offset + indent, text.len()),
            };
            offset += raw.len();

            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            self.line(&line)?;
        }

        if let Some(open) = self.stack.last() {
            return Err(self.error("block is never closed with `end`", open.span));
        }

        let whole = (0, self.source.len());
        let class_name = self
            .class_name
            .ok_or_else(|| Error::parse("missing `class <Name> < Formula`", self.source, whole))?;
        let version = self
            .version
            .ok_or_else(|| Error::parse("missing `version`", self.source, whole))?;
        let binary_name = self
            .binary_name
            .ok_or_else(|| Error::parse("missing `bin.install` in `def install`", self.source, whole))?;

        Ok(FormulaData {
            class_name,
            desc: self.desc.unwrap_or_default(),
            homepage: self.homepage.unwrap_or_default(),
            version,
            license: self.license,
            binary_name,
            test_args: self.test_args,
            binaries: self.binaries,
        })
    }

    fn error(&self, message: impl Into<String>, span: (usize, usize)) -> Error {
        Error::parse(message, self.source, span)
    }

    fn current(&self) -> Option<Block> {
        self.stack.last().map(|open| open.block)
    }

    fn open(&mut self, block: Block, line: &Line<'_>) {
        self.stack.push(OpenBlock {
            block,
            span: line.span,
        });
    }

    fn line(&mut self, line: &Line<'_>) -> Result<()> {
        if is_end(line.text) {
            return self.close(line);
        }

        match self.current() {
            None => self.top_level(line),
            Some(Block::Class) => self.class_body(line),
            Some(Block::Os(os)) => self.os_body(os, line),
            Some(Block::Arch(target)) => self.arch_body(target, line),
            Some(Block::Install) => self.install_body(line),
            Some(Block::Test) => self.test_body(line),
        }
    }

    fn close(&mut self, line: &Line<'_>) -> Result<()> {
        let Some(open) = self.stack.pop() else {
            return Err(self.error("`end` without a matching block", line.span));
        };

        if let Block::Arch(target) = open.block {
            let pending = std::mem::take(&mut self.pending);
            let url = pending
                .url
                .ok_or_else(|| self.error(format!("{target} block has no `url`"), open.span))?;
            let sha256 = pending
                .sha256
                .ok_or_else(|| self.error(format!("{target} block has no `sha256`"), open.span))?;
            self.binaries.insert(target, BinaryInfo { url, sha256 });
        }
        Ok(())
    }

    fn top_level(&mut self, line: &Line<'_>) -> Result<()> {
        let class_name = line
            .text
            .strip_prefix("class ")
            .and_then(|rest| rest.split_once('<'))
            .filter(|(_, parent)| parent.trim() == "Formula")
            .map(|(name, _)| name.trim());

        match class_name {
            Some(name) if !name.is_empty() && self.class_name.is_none() => {
                self.class_name = Some(name.to_string());
                self.open(Block::Class, line);
                Ok(())
            }
            Some(_) => Err(self.error("only one formula class is allowed", line.span)),
            None => Err(self.error(
                "expected `class <Name> < Formula`",
                line.span,
            )),
        }
    }

    fn class_body(&mut self, line: &Line<'_>) -> Result<()> {
        let (keyword, rest) = split_keyword(line.text);
        match keyword {
            "desc" | "homepage" | "version" | "license" => {
                let value = self.single_string(rest, line)?;
                let slot = match keyword {
                    "desc" => &mut self.desc,
                    "homepage" => &mut self.homepage,
                    "version" => &mut self.version,
                    _ => &mut self.license,
                };
                if slot.is_none() {
                    *slot = Some(value);
                } else {
                    return Err(self.error(format!("`{keyword}` is declared twice"), line.span));
                }
            }
            "on_macos" | "on_linux" if rest == "do" => {
                let os = if keyword == "on_macos" { "on_macos" } else { "on_linux" };
                self.open(Block::Os(os), line);
            }
            "def" if rest == "install" => self.open(Block::Install, line),
            "test" if rest == "do" => self.open(Block::Test, line),
            "url" | "sha256" => {
                return Err(self.error(
                    format!("`{keyword}` must be inside an on_<os> / on_<arch> block"),
                    line.span,
                ));
            }
            _ if line.text.ends_with(" do") => {
                return Err(self.error(
                    format!("unsupported block `{}`", line.text),
                    line.span,
                ));
            }
            _ => {
                tracing::debug!(statement = line.text, "Skipping formula statement");
            }
        }
        Ok(())
    }

    fn os_body(&mut self, os: &'static str, line: &Line<'_>) -> Result<()> {
        let (keyword, rest) = split_keyword(line.text);
        if rest != "do" {
            return Err(self.error(
                format!("expected `on_intel do` or `on_arm do` inside {os}"),
                line.span,
            ));
        }
        let target = Target::from_blocks(os, keyword).ok_or_else(|| {
            self.error(format!("unsupported platform `{os} {keyword}`"), line.span)
        })?;
        if self.binaries.contains_key(&target) {
            return Err(self.error(
                format!("{target} is declared more than once"),
                line.span,
            ));
        }
        self.open(Block::Arch(target), line);
        Ok(())
    }

    fn arch_body(&mut self, target: Target, line: &Line<'_>) -> Result<()> {
        let (keyword, rest) = split_keyword(line.text);
        let slot = match keyword {
            "url" => &self.pending.url,
            "sha256" => &self.pending.sha256,
            _ => {
                return Err(self.error(
                    format!("unexpected `{}` in {target} block", line.text),
                    line.span,
                ));
            }
        };
        if slot.is_some() {
            return Err(self.error(
                format!("`{keyword}` is declared twice in the {target} block"),
                line.span,
            ));
        }
        let value = self.single_string(rest, line)?;
        match keyword {
            "url" => self.pending.url = Some(value),
            _ => self.pending.sha256 = Some(value),
        }
        Ok(())
    }

    fn install_body(&mut self, line: &Line<'_>) -> Result<()> {
        let (keyword, rest) = split_keyword(line.text);
        if keyword == "bin.install" && self.binary_name.is_none() {
            self.binary_name = Some(self.single_string(rest, line)?);
        } else {
            tracing::debug!(statement = line.text, "Skipping install statement");
        }
        Ok(())
    }

    fn test_body(&mut self, line: &Line<'_>) -> Result<()> {
        let (keyword, rest) = split_keyword(line.text);
        if keyword != "system" {
            tracing::debug!(statement = line.text, "Skipping test statement");
            return Ok(());
        }
        let args = parse_strings(rest).map_err(|msg| self.error(msg, line.span))?;
        let Some((program, args)) = args.split_first() else {
            return Err(self.error("`system` needs a command", line.span));
        };
        if !program.starts_with(BIN_PREFIX) {
            return Err(self.error(
                "test command must run the installed binary (`#{bin}/...`)",
                line.span,
            ));
        }
        self.test_args = args.to_vec();
        Ok(())
    }

    fn single_string(&self, rest: &str, line: &Line<'_>) -> Result<String> {
        let mut values = parse_strings(rest).map_err(|msg| self.error(msg, line.span))?;
        if values.len() != 1 {
            return Err(self.error("expected exactly one string literal", line.span));
        }
        Ok(values.remove(0))
    }
}

/// `end`, optionally followed by a trailing comment.
fn is_end(text: &str) -> bool {
    text.strip_prefix("end")
        .is_some_and(|rest| rest.is_empty() || rest.trim_start().starts_with('#'))
}

fn split_keyword(text: &str) -> (&str, &str) {
    text.split_once(char::is_whitespace)
        .map_or((text, ""), |(keyword, rest)| (keyword, rest.trim()))
}

/// Parses a comma separated list of double-quoted Ruby string literals.
///
/// `#{bin}` interpolation is kept verbatim; `\"`, `\\`, `\#`, `\n`, `\t` and `\r`
/// are unescaped.
fn parse_strings(input: &str) -> std::result::Result<Vec<String>, String> {
    let mut values = Vec::new();
    let mut chars = input.trim().chars().peekable();

    loop {
        match chars.next() {
            None => break,
            Some('"') => {}
            Some(other) => return Err(format!("expected a string literal, found `{other}`")),
        }

        let mut value = String::new();
        loop {
            match chars.next() {
                None => return Err("unterminated string literal".to_string()),
                Some('"') => break,
                Some('\\') => match chars.next() {
                    Some(escaped @ ('"' | '\\' | '#')) => value.push(escaped),
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some(other) => return Err(format!("unsupported escape `\\{other}`")),
                    None => return Err("unterminated string literal".to_string()),
                },
                Some(c) => value.push(c),
            }
        }
        values.push(value);

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            None => break,
            Some(',') => {
                while chars.peek().is_some_and(|c| c.is_whitespace()) {
                    chars.next();
                }
                if chars.peek().is_none() {
                    return Err("trailing comma".to_string());
                }
            }
            Some(other) => return Err(format!("expected `,` between strings, found `{other}`")),
        }
    }

    if values.is_empty() {
        return Err("expected a string literal".to_string());
    }
    Ok(values)
}
