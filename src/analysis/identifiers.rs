//! Structural identifier extraction with tree-sitter.
//!
//! Each supported language registers a grammar together with three queries:
//! class declarations, function declarations and variable bindings. Adding a
//! language means registering another entry; nothing else branches on the tag.

use once_cell::sync::OnceCell;
use std::collections::HashMap;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Parser, Query, QueryCursor};

use crate::error::ParseError;
use crate::types::IdentifierSet;

/// Query source text for the three identifier kinds of one language.
#[derive(Debug, Clone, Copy)]
pub struct QuerySources {
    pub classes: &'static str,
    pub functions: &'static str,
    pub variables: &'static str,
}

const PYTHON_QUERIES: QuerySources = QuerySources {
    classes: "(class_definition name: (identifier) @class.def)",
    functions: "(function_definition name: (identifier) @function.def)",
    variables: "(assignment left: (identifier) @var.def)",
};

const JAVA_QUERIES: QuerySources = QuerySources {
    classes: "(class_declaration name: (identifier) @class.dec)",
    functions: "(method_declaration name: (identifier) @method.dec)",
    variables: "(variable_declarator name: (identifier) @variable.name)",
};

const JAVASCRIPT_QUERIES: QuerySources = QuerySources {
    classes: "(class_declaration name: (identifier) @class.dec)",
    functions: "(function_declaration name: (identifier) @function.dec)",
    variables: "(variable_declaration (variable_declarator (identifier) @var.dec))",
};

struct Grammar {
    language: Language,
    classes: Query,
    functions: Query,
    variables: Query,
}

impl Grammar {
    fn compile(tag: &str, language: Language, sources: QuerySources) -> Result<Self, ParseError> {
        let query = |kind: &'static str, source: &str| {
            Query::new(&language, source).map_err(|source| ParseError::Query {
                language: tag.to_string(),
                kind,
                source,
            })
        };

        Ok(Self {
            classes: query("classes", sources.classes)?,
            functions: query("functions", sources.functions)?,
            variables: query("variables", sources.variables)?,
            language,
        })
    }
}

/// Registry of grammars keyed by lower-case language tag.
pub struct IdentifierExtractor {
    grammars: HashMap<String, Grammar>,
}

static BUILTIN: OnceCell<IdentifierExtractor> = OnceCell::new();

impl IdentifierExtractor {
    /// An extractor that knows no languages; every lookup yields an empty set.
    pub fn empty() -> Self {
        Self {
            grammars: HashMap::new(),
        }
    }

    /// Python, Java and JavaScript, compiled once per process.
    pub fn builtin() -> Result<&'static Self, ParseError> {
        BUILTIN.get_or_try_init(|| {
            let mut extractor = Self::empty();
            extractor.register("python", tree_sitter_python::LANGUAGE.into(), PYTHON_QUERIES)?;
            extractor.register("java", tree_sitter_java::LANGUAGE.into(), JAVA_QUERIES)?;
            extractor.register(
                "javascript",
                tree_sitter_javascript::LANGUAGE.into(),
                JAVASCRIPT_QUERIES,
            )?;
            Ok(extractor)
        })
    }

    /// Add or replace the grammar for `tag`.
    pub fn register(
        &mut self,
        tag: &str,
        language: Language,
        sources: QuerySources,
    ) -> Result<(), ParseError> {
        let tag = tag.to_lowercase();
        let grammar = Grammar::compile(&tag, language, sources)?;
        self.grammars.insert(tag, grammar);
        Ok(())
    }

    pub fn supports(&self, tag: &str) -> bool {
        self.grammars.contains_key(&tag.to_lowercase())
    }

    /// Tags of all registered languages, sorted.
    pub fn languages(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.grammars.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Extract class, function and variable names from `content`.
    ///
    /// Unsupported or missing languages are not an error: they produce an empty set.
    pub fn extract(&self, content: &[u8], language: Option<&str>) -> Result<IdentifierSet, ParseError> {
        let Some(tag) = language.map(str::to_lowercase) else {
            return Ok(IdentifierSet::default());
        };
        let Some(grammar) = self.grammars.get(&tag) else {
            return Ok(IdentifierSet::default());
        };

        let mut parser = Parser::new();
        parser
            .set_language(&grammar.language)
            .map_err(|source| ParseError::Grammar {
                language: tag.clone(),
                source,
            })?;
        let tree = parser
            .parse(content, None)
            .ok_or_else(|| ParseError::NoTree { language: tag.clone() })?;
        let root = tree.root_node();

        let mut cursor = QueryCursor::new();
        let mut run = |query: &Query| -> Result<Vec<String>, ParseError> {
            let mut names = Vec::new();
            let mut captures = cursor.captures(query, root, content);
            while let Some((m, index)) = captures.next() {
                let capture = m.captures[*index];
                names.push(capture.node.utf8_text(content)?.to_string());
            }
            Ok(names)
        };

        Ok(IdentifierSet {
            classes: run(&grammar.classes)?,
            functions: run(&grammar.functions)?,
            variables: run(&grammar.variables)?,
        })
    }
}
