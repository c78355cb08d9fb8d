//! Line-preserving `go.mod` model.

use super::ManifestError;
use std::collections::BTreeSet;

/// One `require` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Module path of the dependency.
    pub path: String,
    /// Required version.
    pub version: String,
    /// True if marked `// indirect`.
    pub indirect: bool,
    line: usize,
    block: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct Block {
    open: usize,
    close: usize,
}

/// A parsed `go.mod` file that serializes back with every untouched line
/// unchanged.
#[derive(Debug, Clone)]
pub struct ModuleDescriptor {
    lines: Vec<String>,
    module: Option<(usize, String)>,
    requirements: Vec<Requirement>,
    blocks: Vec<Block>,
    removed: BTreeSet<usize>,
    trailing_newline: bool,
}

impl ModuleDescriptor {
    /// Parses manifest text. `path` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Parse`] for a malformed directive or an
    /// unterminated block.
    pub fn parse(path: &str, text: &str) -> Result<Self, ManifestError> {
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        let parse_error = |line: usize, message: &str| ManifestError::Parse {
            path: path.to_string(),
            line: line + 1,
            message: message.to_string(),
        };

        let mut module = None;
        let mut requirements = Vec::new();
        let mut blocks: Vec<Block> = Vec::new();
        let mut open_block: Option<(String, usize)> = None;

        for (index, raw) in lines.iter().enumerate() {
            let (code, comment) = split_comment(raw);
            let code = code.trim();

            if let Some((directive, open)) = &open_block {
                if code == ")" {
                    blocks.push(Block {
                        open: *open,
                        close: index,
                    });
                    open_block = None;
                } else if directive == "require" && !code.is_empty() {
                    let requirement = parse_requirement(code, comment, index, Some(blocks.len()))
                        .ok_or_else(|| parse_error(index, "malformed requirement"))?;
                    requirements.push(requirement);
                }
                continue;
            }

            if code.is_empty() {
                continue;
            }

            let (directive, rest) = match code.split_once(char::is_whitespace) {
                Some((directive, rest)) => (directive, rest.trim()),
                None => (code, ""),
            };

            if rest == "(" {
                open_block = Some((directive.to_string(), index));
                continue;
            }

            match directive {
                "module" => {
                    if rest.is_empty() {
                        return Err(parse_error(index, "module directive without a path"));
                    }
                    module = Some((index, unquote(rest).to_string()));
                }
                "require" => {
                    let requirement = parse_requirement(rest, comment, index, None)
                        .ok_or_else(|| parse_error(index, "malformed requirement"))?;
                    requirements.push(requirement);
                }
                _ => {}
            }
        }

        if let Some((directive, open)) = open_block {
            return Err(parse_error(open, &format!("unterminated {directive} block")));
        }

        Ok(Self {
            lines,
            module,
            requirements,
            blocks,
            removed: BTreeSet::new(),
            trailing_newline: text.ends_with('\n'),
        })
    }

    /// Returns the declared module path.
    #[must_use]
    pub fn module_path(&self) -> Option<&str> {
        self.module.as_ref().map(|(_, path)| path.as_str())
    }

    /// Returns the requirements that have not been dropped, in file order.
    pub fn requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements
            .iter()
            .filter(|req| !self.removed.contains(&req.line))
    }

    /// Rewrites the `module` directive, keeping its trailing comment. Does
    /// nothing if there is none.
    pub fn set_module(&mut self, path: &str) {
        if let Some((line, current)) = &mut self.module {
            let original = &self.lines[*line];
            let indent: String = original.chars().take_while(|c| c.is_whitespace()).collect();
            let rewritten = match split_comment(original).1 {
                Some(comment) => format!("{indent}module {path} // {comment}"),
                None => format!("{indent}module {path}"),
            };
            self.lines[*line] = rewritten;
            *current = path.to_string();
        }
    }

    /// Drops the requirement on `path`. Returns true if one was found.
    ///
    /// A `require` block left without entries is removed entirely.
    pub fn drop_require(&mut self, path: &str) -> bool {
        let Some(dropped) = self
            .requirements
            .iter()
            .find(|req| req.path == path && !self.removed.contains(&req.line))
            .cloned()
        else {
            return false;
        };
        self.removed.insert(dropped.line);

        if let Some(block_index) = dropped.block {
            let Block { open, close } = self.blocks[block_index];
            let empty = ((open + 1)..close).all(|line| {
                self.removed.contains(&line) || split_comment(&self.lines[line]).0.trim().is_empty()
            });
            if empty {
                self.removed.extend(open..=close);
            }
        }
        true
    }

    /// Serializes the manifest.
    #[must_use]
    pub fn format(&self) -> String {
        let mut out = self
            .lines
            .iter()
            .enumerate()
            .filter(|(index, _)| !self.removed.contains(index))
            .map(|(_, line)| line.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        if self.trailing_newline {
            out.push('\n');
        }
        out
    }
}

fn split_comment(line: &str) -> (&str, Option<&str>) {
    match line.find("//") {
        Some(at) => (&line[..at], Some(line[at + 2..].trim())),
        None => (line, None),
    }
}

fn unquote(token: &str) -> &str {
    token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(token)
}

fn parse_requirement(
    code: &str,
    comment: Option<&str>,
    line: usize,
    block: Option<usize>,
) -> Option<Requirement> {
    let mut fields = code.split_whitespace();
    let path = unquote(fields.next()?).to_string();
    let version = fields.next()?.to_string();
    if fields.next().is_some() {
        return None;
    }
    Some(Requirement {
        path,
        version,
        indirect: comment.is_some_and(|c| c == "indirect" || c.starts_with("indirect;")),
        line,
        block,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = "module github.com/old/app

go 1.22

require (
\tgithub.com/old/lib v1.2.3
\tgolang.org/x/mod v0.17.0 // indirect
)

require github.com/old/single v0.1.0

replace (
\tgithub.com/old/lib => ../lib
)
";

    #[test]
    fn parses_module_and_requirements() {
        let descriptor = ModuleDescriptor::parse("go.mod", MANIFEST).unwrap();

        assert_eq!(descriptor.module_path(), Some("github.com/old/app"));
        let reqs: Vec<_> = descriptor.requirements().collect();
        assert_eq!(reqs.len(), 3);
        assert_eq!(reqs[0].path, "github.com/old/lib");
        assert!(!reqs[0].indirect);
        assert!(reqs[1].indirect);
        assert_eq!(reqs[2].version, "v0.1.0");
        assert_eq!(descriptor.blocks.len(), 2);
    }

    #[test]
    fn untouched_manifest_round_trips() {
        let descriptor = ModuleDescriptor::parse("go.mod", MANIFEST).unwrap();
        assert_eq!(descriptor.format(), MANIFEST);
    }

    #[test]
    fn dropping_last_entry_removes_block() {
        let text = "module a\n\nrequire (\n\tgithub.com/old/lib v1.0.0\n)\n";
        let mut descriptor = ModuleDescriptor::parse("go.mod", text).unwrap();

        assert!(descriptor.drop_require("github.com/old/lib"));
        assert!(!descriptor.drop_require("github.com/old/lib"));
        assert_eq!(descriptor.format(), "module a\n\n");
    }

    #[test]
    fn set_module_keeps_other_lines() {
        let mut descriptor = ModuleDescriptor::parse("go.mod", MANIFEST).unwrap();
        descriptor.set_module("gitlab.example/new/app");
        descriptor.drop_require("github.com/old/single");

        let formatted = descriptor.format();
        assert!(formatted.starts_with("module gitlab.example/new/app\n\ngo 1.22\n"));
        assert!(!formatted.contains("github.com/old/single"));
        assert!(formatted.contains("github.com/old/lib => ../lib"));
    }

    #[test]
    fn set_module_keeps_trailing_comment() {
        let mut descriptor =
            ModuleDescriptor::parse("go.mod", "module github.com/old/app // Deprecated: moved\n").unwrap();
        descriptor.set_module("gitlab.example/new/app");

        assert_eq!(descriptor.module_path(), Some("gitlab.example/new/app"));
        assert_eq!(
            descriptor.format(),
            "module gitlab.example/new/app // Deprecated: moved\n"
        );
    }

    #[test]
    fn unterminated_block_is_an_error() {
        let result = ModuleDescriptor::parse("go.mod", "module a\nrequire (\n\tx v1\n");
        assert!(matches!(result, Err(ManifestError::Parse { line: 2, .. })));
    }
}
