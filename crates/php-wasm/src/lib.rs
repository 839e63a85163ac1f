//! WASM bindings for the PHP scanner.
//!
//! Exposes `tokenize()`, `diagnostics()` and `version()` to JavaScript via
//! wasm-bindgen. Tokens cross the boundary as plain JS objects.

use php_lexer::{Diagnostic, DiagnosticBag, LanguageFeatures, Scanner, ScannerOptions, Severity, Token};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// A diagnostic as handed to JavaScript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticView {
    pub start: usize,
    pub end: usize,
    pub severity: &'static str,
    pub message: String,
}

impl From<&Diagnostic> for DiagnosticView {
    fn from(diagnostic: &Diagnostic) -> Self {
        Self {
            start: diagnostic.span.start,
            end: diagnostic.span.end(),
            severity: match diagnostic.error.severity() {
                Severity::Fatal => "error",
                Severity::Warning => "warning",
            },
            message: diagnostic.error.to_string(),
        }
    }
}

fn options(short_tags: bool) -> ScannerOptions {
    let mut features = LanguageFeatures::PHP70;
    features.set(LanguageFeatures::SHORT_OPEN_TAGS, short_tags);
    ScannerOptions::new().with_features(features)
}

fn scan(source: &str, short_tags: bool) -> (Vec<Token>, Vec<DiagnosticView>) {
    let mut scanner = Scanner::with_options(source, options(short_tags), DiagnosticBag::new());
    let tokens = scanner.collect_all();
    let diagnostics = scanner.errors().diagnostics().iter().map(DiagnosticView::from).collect();
    (tokens, diagnostics)
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsError::new(&e.to_string()))
}

/// Scan PHP source.
///
/// Returns `{ tokens: Token[], diagnostics: Diagnostic[] }`. Scanning never
/// fails on malformed input; problems are listed in `diagnostics`.
#[wasm_bindgen]
pub fn tokenize(source: &str, short_tags: bool) -> Result<JsValue, JsError> {
    let (tokens, diagnostics) = scan(source, short_tags);

    let js_obj = js_sys::Object::new();
    js_sys::Reflect::set(&js_obj, &"tokens".into(), &to_js(&tokens)?)
        .map_err(|_| JsError::new("Failed to set tokens property"))?;
    js_sys::Reflect::set(&js_obj, &"diagnostics".into(), &to_js(&diagnostics)?)
        .map_err(|_| JsError::new("Failed to set diagnostics property"))?;

    Ok(js_obj.into())
}

/// Only the diagnostics of a scan, for editors that lint on change.
#[wasm_bindgen]
pub fn diagnostics(source: &str, short_tags: bool) -> Result<JsValue, JsError> {
    let (_, diagnostics) = scan(source, short_tags);
    to_js(&diagnostics)
}

/// Get the scanner version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use php_lexer::TokenKind;
    use pretty_assertions::assert_eq;

    // =========================================================================
    // Native tests (non-WASM), covering what the bindings hand over
    // =========================================================================

    #[test]
    fn test_empty_source() {
        let (tokens, diagnostics) = scan("", false);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::End);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_unicode_escapes_enabled() {
        let (tokens, _) = scan(r#"<?php "\u{41}";"#, false);
        assert_eq!(tokens[1].value.as_str(), Some("A"));
    }

    #[test]
    fn test_short_tags_flag() {
        let (plain, _) = scan("<? echo 1;", false);
        assert_eq!(plain[0].kind, TokenKind::InlineHtml);
        let (short, _) = scan("<? echo 1;", true);
        assert_eq!(short[0].kind, TokenKind::OpenTag);
    }

    #[test]
    fn test_diagnostic_view() {
        let (_, diagnostics) = scan("<?php 1e999;", false);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, "warning");
        assert_eq!(diagnostics[0].start, 6);
        assert_eq!(diagnostics[0].end, 11);
        assert!(diagnostics[0].message.contains("1e999"));
    }

    #[test]
    fn test_multiple_scans_are_independent() {
        let (first, _) = scan("<?php $a;", false);
        let (second, _) = scan("<?php $b;", false);
        assert_eq!(first[1].value.as_str(), Some("a"));
        assert_eq!(second[1].value.as_str(), Some("b"));
    }

    #[test]
    fn test_version() {
        let v = version();
        assert!(!v.is_empty());
        assert!(v.contains('.'));
    }
}
