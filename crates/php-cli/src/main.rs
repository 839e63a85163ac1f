use clap::{Args, Parser, Subcommand};
use php_lexer::{
    Diagnostic, DiagnosticBag, Encoding, LanguageFeatures, Scanner, ScannerOptions, SemanticValue, Severity,
    Text, Token,
};
use std::path::Path;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "php-syntax")]
#[command(about = "PHP scanner: dump tokens and lexical diagnostics")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the token stream of a PHP file
    Tokens {
        /// Input .php file
        path: String,

        /// Print tokens as a JSON array
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Report lexical errors and warnings without printing tokens
    Check {
        /// Input .php file
        path: String,

        #[command(flatten)]
        scan: ScanArgs,
    },
}

#[derive(Args)]
struct ScanArgs {
    /// Accept `<?` as an open tag
    #[arg(long)]
    short_tags: bool,

    /// Decode `\u{...}` escapes
    #[arg(long)]
    unicode_escapes: bool,

    /// Source encoding (utf8, latin1)
    #[arg(long, default_value = "utf8")]
    encoding: Encoding,
}

impl ScanArgs {
    fn options(&self) -> ScannerOptions {
        let mut features = LanguageFeatures::BASIC;
        features.set(LanguageFeatures::SHORT_OPEN_TAGS, self.short_tags);
        features.set(LanguageFeatures::UNICODE_CODEPOINT_ESCAPES, self.unicode_escapes);
        ScannerOptions::new()
            .with_encoding(self.encoding)
            .with_features(features)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Tokens { path, json, scan } => cmd_tokens(&path, json, &scan),
        Command::Check { path, scan } => cmd_check(&path, &scan),
    }
}

fn read_source(path: &str, encoding: Encoding) -> String {
    let p = Path::new(path);
    if !p.exists() {
        eprintln!("Error: file not found: {path}");
        std::process::exit(1);
    }
    match std::fs::read(p) {
        Ok(bytes) => encoding.decode(&bytes),
        Err(e) => {
            eprintln!("Error reading {path}: {e}");
            std::process::exit(1);
        }
    }
}

fn scan(source: &str, args: &ScanArgs) -> (Vec<Token>, Vec<Diagnostic>) {
    let mut scanner = Scanner::with_options(source, args.options(), DiagnosticBag::new());
    let tokens = scanner.collect_all();
    let diagnostics = scanner.into_errors().into_diagnostics();
    debug!(tokens = tokens.len(), diagnostics = diagnostics.len(), "scanned");
    (tokens, diagnostics)
}

fn cmd_tokens(path: &str, json: bool, args: &ScanArgs) {
    let source = read_source(path, args.encoding);
    let (tokens, diagnostics) = scan(&source, args);

    if json {
        match serde_json::to_string_pretty(&tokens) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error encoding tokens: {e}");
                std::process::exit(1);
            }
        }
    } else {
        for token in &tokens {
            println!("{}", format_token(token));
        }
    }

    report(path, &source, &diagnostics);
}

fn cmd_check(path: &str, args: &ScanArgs) {
    let source = read_source(path, args.encoding);
    let (_, diagnostics) = scan(&source, args);

    if report(path, &source, &diagnostics) {
        std::process::exit(1);
    }

    eprintln!("OK: {path}");
}

/// Print diagnostics to stderr. Returns true if any was fatal.
fn report(path: &str, source: &str, diagnostics: &[Diagnostic]) -> bool {
    let mut fatal = false;
    for diagnostic in diagnostics {
        let (line, column) = line_column(source, diagnostic.span.start);
        let level = match diagnostic.error.severity() {
            Severity::Fatal => {
                fatal = true;
                "error"
            }
            Severity::Warning => "warning",
        };
        eprintln!("{path}:{line}:{column}: {level}: {}", diagnostic.error);
    }
    fatal
}

/// 1-based line and column of a character offset.
fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for c in source.chars().take(offset) {
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

fn format_token(token: &Token) -> String {
    let head = format!("{:>6} {:<24}", token.span.to_string(), format!("{:?}", token.kind));
    match &token.value {
        SemanticValue::None => head.trim_end().to_string(),
        SemanticValue::Integer(v) => format!("{head} {v}"),
        SemanticValue::WideInteger(v) => format!("{head} {v}"),
        SemanticValue::Float(v) => format!("{head} {v:?}"),
        SemanticValue::Text(text) | SemanticValue::Literal { text, .. } | SemanticValue::Encapsed { text, .. } => {
            format!("{head} {}", quote_text(text))
        }
    }
}

fn quote_text(text: &Text) -> String {
    match text {
        Text::Str(s) => format!("{:?}", &**s),
        Text::Bytes(bytes) => format!("b{:?}", String::from_utf8_lossy(bytes)),
    }
}
