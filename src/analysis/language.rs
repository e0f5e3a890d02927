//! Language detection for changed files.
//!
//! Tags use linguist-style display names (`Python`, `JavaScript`, ...). The
//! identifier extractor matches them case-insensitively.

use std::path::Path;

/// Maps a file to a language tag.
pub trait LanguageDetector: Send + Sync {
    /// Detect the language of `path` given its content, or `None` if unknown.
    fn detect(&self, path: &Path, content: &[u8]) -> Option<String>;
}

/// Extension-table detector with a shebang fallback for extensionless scripts.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtensionDetector;

impl LanguageDetector for ExtensionDetector {
    fn detect(&self, path: &Path, content: &[u8]) -> Option<String> {
        if let Some(language) = by_filename(path).or_else(|| by_extension(path)) {
            return Some(language.to_string());
        }
        by_shebang(content).map(str::to_string)
    }
}

fn by_filename(path: &Path) -> Option<&'static str> {
    let name = path.file_name()?.to_str()?;
    match name {
        "Makefile" | "GNUmakefile" | "makefile" => Some("Makefile"),
        "Dockerfile" => Some("Dockerfile"),
        "CMakeLists.txt" => Some("CMake"),
        "Rakefile" | "Gemfile" => Some("Ruby"),
        _ => None,
    }
}

fn by_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let language = match ext.as_str() {
        "py" | "pyw" | "pyi" => "Python",
        "java" => "Java",
        "js" | "jsx" | "mjs" | "cjs" => "JavaScript",
        "ts" | "tsx" => "TypeScript",
        "rs" => "Rust",
        "go" => "Go",
        "c" | "h" => "C",
        "cpp" | "cc" | "cxx" | "hpp" | "hxx" | "hh" => "C++",
        "cs" => "C#",
        "kt" | "kts" => "Kotlin",
        "scala" => "Scala",
        "rb" => "Ruby",
        "php" => "PHP",
        "swift" => "Swift",
        "m" => "Objective-C",
        "sh" | "bash" | "zsh" => "Shell",
        "pl" | "pm" => "Perl",
        "lua" => "Lua",
        "r" => "R",
        "html" | "htm" => "HTML",
        "css" => "CSS",
        "scss" => "SCSS",
        "json" => "JSON",
        "yml" | "yaml" => "YAML",
        "toml" => "TOML",
        "xml" => "XML",
        "md" | "markdown" => "Markdown",
        "rst" => "reStructuredText",
        "sql" => "SQL",
        "ipynb" => "Jupyter Notebook",
        _ => return None,
    };
    Some(language)
}

fn by_shebang(content: &[u8]) -> Option<&'static str> {
    let first_line = content.split(|&b| b == b'\n').next()?;
    let line = std::str::from_utf8(first_line).ok()?.strip_prefix("#!")?;

    // `#!/usr/bin/env python3` names the interpreter as an argument
    let mut words = line.split_whitespace();
    let mut interpreter = words.next()?.rsplit('/').next()?;
    if interpreter == "env" {
        interpreter = words.find(|w| !w.starts_with('-'))?;
    }

    let interpreter = interpreter.trim_end_matches(|c: char| c.is_ascii_digit() || c == '.');
    match interpreter {
        "python" => Some("Python"),
        "node" | "nodejs" => Some("JavaScript"),
        "sh" | "bash" | "zsh" | "dash" => Some("Shell"),
        "ruby" => Some("Ruby"),
        "perl" => Some("Perl"),
        _ => None,
    }
}
