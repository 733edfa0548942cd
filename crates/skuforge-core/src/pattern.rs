//! # Pattern Compiler
//!
//! Renders SKU templates such as `{CATEGORY_CODE}-{PRODUCT_NAME}-{INCREMENT}`
//! into literal identifiers.
//!
//! ## Rendering Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  "{CATEGORY_CODE}-{BRAND_CODE}-{PRODUCT_NAME}-{INCREMENT}"              │
//! │       │                                                                 │
//! │       ▼  parse (unknown tokens / unbalanced braces rejected)           │
//! │  [Token(CategoryCode), "-", Token(BrandCode), "-", ...]                │
//! │       │                                                                 │
//! │       ▼  substitute                                                     │
//! │  "AT--AOTHUN-001"          (brand absent → empty, no residue)          │
//! │       │                                                                 │
//! │       ▼  case fold (UPPER / LOWER)                                     │
//! │  "AT--AOTHUN-001"                                                      │
//! │       │                                                                 │
//! │       ▼  collapse separator runs, trim edges                           │
//! │  "AT-AOTHUN-001"                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tokens
//! | Token              | Substitution                                    |
//! |--------------------|-------------------------------------------------|
//! | `{CATEGORY_CODE}`  | category code, verbatim (required)              |
//! | `{BRAND_CODE}`     | brand code, verbatim, empty when absent         |
//! | `{PRODUCT_NAME}`   | slug of the name, uppercased, ≤ 10 chars        |
//! | `{ATTRIBUTE_VALUE}`| resolved short codes joined with the separator  |
//! | `{YEAR}`           | two-digit year                                  |
//! | `{INCREMENT}`      | `007` style sequence, or `###` in preview       |

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::normalize::name_segment;
use crate::types::{CaseType, SkuContext};

/// Placeholder rendered for `{INCREMENT}` when no sequence is supplied.
pub const INCREMENT_PLACEHOLDER: &str = "###";

/// Literal form of the increment token.
pub const INCREMENT_TOKEN: &str = "{INCREMENT}";

// =============================================================================
// Tokens
// =============================================================================

/// A recognized pattern token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    CategoryCode,
    BrandCode,
    ProductName,
    AttributeValue,
    Year,
    Increment,
}

impl Token {
    pub const ALL: [Token; 6] = [
        Token::CategoryCode,
        Token::BrandCode,
        Token::ProductName,
        Token::AttributeValue,
        Token::Year,
        Token::Increment,
    ];

    /// Name between the braces.
    pub fn name(&self) -> &'static str {
        match self {
            Token::CategoryCode => "CATEGORY_CODE",
            Token::BrandCode => "BRAND_CODE",
            Token::ProductName => "PRODUCT_NAME",
            Token::AttributeValue => "ATTRIBUTE_VALUE",
            Token::Year => "YEAR",
            Token::Increment => "INCREMENT",
        }
    }

    pub fn from_name(name: &str) -> Option<Token> {
        Token::ALL.into_iter().find(|t| t.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Token(Token),
}

// =============================================================================
// Compiled Pattern
// =============================================================================

/// A parsed pattern, ready to render any number of times.
///
/// ## Example
/// ```rust
/// use skuforge_core::pattern::CompiledPattern;
/// use skuforge_core::{CaseType, SkuContext};
///
/// let pattern = CompiledPattern::parse("{CATEGORY_CODE}-{PRODUCT_NAME}-{INCREMENT}").unwrap();
/// let ctx = SkuContext::new().category_code("AT").product_name("Áo Thun");
///
/// let sku = pattern.render(&ctx, "-", CaseType::Upper, Some(1)).unwrap();
/// assert_eq!(sku, "AT-AOTHUN-001");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPattern {
    source: String,
    segments: Vec<Segment>,
}

impl CompiledPattern {
    /// Parses `pattern`, rejecting empty patterns, unknown tokens and
    /// unbalanced braces.
    pub fn parse(pattern: &str) -> CoreResult<Self> {
        if pattern.trim().is_empty() {
            return Err(ValidationError::required("pattern").into());
        }

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.chars();

        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for inner in chars.by_ref() {
                        match inner {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => return Err(CoreError::UnbalancedBraces(pattern.to_string())),
                            other => name.push(other),
                        }
                    }
                    if !closed {
                        return Err(CoreError::UnbalancedBraces(pattern.to_string()));
                    }
                    let token = Token::from_name(&name).ok_or(CoreError::UnknownToken(name))?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Token(token));
                }
                '}' => return Err(CoreError::UnbalancedBraces(pattern.to_string())),
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(CompiledPattern {
            source: pattern.to_string(),
            segments,
        })
    }

    /// The pattern text this was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the pattern uses `token` at least once.
    pub fn has(&self, token: Token) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Token(t) if *t == token))
    }

    /// Renders the pattern.
    ///
    /// `increment` of `None` leaves `{INCREMENT}` as [`INCREMENT_PLACEHOLDER`].
    pub fn render(
        &self,
        context: &SkuContext,
        separator: &str,
        case_type: CaseType,
        increment: Option<i64>,
    ) -> CoreResult<String> {
        let mut out = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Token(token) => out.push_str(&substitute(*token, context, separator, increment)?),
            }
        }

        let folded = case_type.apply(&out);
        Ok(cleanup_separators(&folded, separator))
    }
}

fn substitute(
    token: Token,
    context: &SkuContext,
    separator: &str,
    increment: Option<i64>,
) -> CoreResult<String> {
    let value = match token {
        Token::CategoryCode => required(context.category_code.as_deref(), "category_code")?.to_string(),
        Token::BrandCode => context.brand_code.clone().unwrap_or_default(),
        Token::ProductName => name_segment(required(context.product_name.as_deref(), "product_name")?),
        Token::AttributeValue => context.attribute_values.join(separator),
        Token::Year => {
            let year = context.year.unwrap_or_else(|| Utc::now().year());
            format!("{:02}", year.rem_euclid(100))
        }
        Token::Increment => match increment {
            Some(n) => format!("{:03}", n),
            None => INCREMENT_PLACEHOLDER.to_string(),
        },
    };
    Ok(value)
}

fn required<'a>(value: Option<&'a str>, field: &str) -> CoreResult<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::required(field).into()),
    }
}

/// Collapses runs of `separator` into one and trims it from both ends.
pub fn cleanup_separators(s: &str, separator: &str) -> String {
    if separator.is_empty() {
        return s.to_string();
    }

    let doubled = separator.repeat(2);
    let mut out = s.to_string();
    while out.contains(&doubled) {
        out = out.replace(&doubled, separator);
    }

    out.trim_start_matches(separator)
        .trim_end_matches(separator)
        .to_string()
}

// =============================================================================
// Free Functions
// =============================================================================

/// Parses and renders in one call.
pub fn render(
    pattern: &str,
    context: &SkuContext,
    separator: &str,
    case_type: CaseType,
    increment: Option<i64>,
) -> CoreResult<String> {
    CompiledPattern::parse(pattern)?.render(context, separator, case_type, increment)
}

/// Checks that a pattern parses.
pub fn validate_pattern(pattern: &str) -> CoreResult<()> {
    CompiledPattern::parse(pattern).map(|_| ())
}

/// The pattern with `{INCREMENT}` and any separator it leaves trailing
/// removed.
///
/// ```rust
/// use skuforge_core::pattern::base_pattern;
///
/// assert_eq!(base_pattern("{CATEGORY_CODE}-{PRODUCT_NAME}-{INCREMENT}", "-"),
///            "{CATEGORY_CODE}-{PRODUCT_NAME}");
/// ```
pub fn base_pattern(pattern: &str, separator: &str) -> String {
    let stripped = pattern.replace(INCREMENT_TOKEN, "");
    if separator.is_empty() {
        return stripped;
    }
    stripped.trim_end_matches(separator).to_string()
}

// =============================================================================
// Generation Path
// =============================================================================

/// Which generation strategy a pattern calls for.
///
/// ```text
/// pattern contains {INCREMENT}?
///      │
///      ├── yes → WithIncrement     (atomic sequence, one re-allocation)
///      └── no  → WithoutIncrement  (optimistic base, suffix fallback)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum GenerationPath {
    WithIncrement,
    WithoutIncrement,
}

impl GenerationPath {
    pub fn for_pattern(pattern: &str) -> Self {
        if pattern.contains(INCREMENT_TOKEN) {
            GenerationPath::WithIncrement
        } else {
            GenerationPath::WithoutIncrement
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
