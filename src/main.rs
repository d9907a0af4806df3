use std::ffi::OsString;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bfi::config::{STACK_CAPACITY, TAPE_SIZE};
use bfi::{BoundsPolicy, EngineConfig, EofPolicy, run_file};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\nCopyright (c) 2008 Susam Pal\n\n",
    "This is free software. You are permitted to redistribute and use it in\n",
    "source and binary forms, with or without modification, under the terms\n",
    "of the Simplified BSD License.",
);

const AFTER_HELP: &str = "\
Exit status is 0 when the program runs to the end of its source, and 1 on a
missing or unreadable file or any runtime error. Set RUST_LOG to filter logs.";

#[derive(Parser)]
#[command(
    name = "bfi",
    version,
    long_version = LONG_VERSION,
    about = "Brainfuck interpreter that runs programs straight from the source file",
    after_help = AFTER_HELP
)]
struct Cli {
    /// Program source file.
    file: Option<PathBuf>,

    /// Number of byte cells on the tape (decimal, 0x hex or 0 octal).
    #[arg(
        short = 's',
        value_name = "SIZE",
        value_parser = parse_size,
        default_value_t = TAPE_SIZE
    )]
    size: usize,

    /// Initial size of the loop stack used for nested loops.
    #[arg(
        short = 'd',
        value_name = "DEPTH",
        value_parser = parse_size,
        default_value_t = STACK_CAPACITY
    )]
    depth: usize,

    /// What to do when the tape pointer leaves the tape (checked, wrap).
    #[arg(long, value_parser = parse_bounds, default_value = "checked")]
    bounds: BoundsPolicy,

    /// Value stored by ',' once input is exhausted (max, zero, unchanged).
    #[arg(long, value_parser = parse_eof, default_value = "max")]
    eof: EofPolicy,

    /// Abort after this many instructions.
    #[arg(long, value_name = "N")]
    max_steps: Option<u64>,

    /// Log engine activity to stderr.
    #[arg(short, long)]
    verbose: bool,
}

/// Parse an unsigned size the way C's `strtoul(s, NULL, 0)` does.
fn parse_size(s: &str) -> Result<usize, String> {
    let hex = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"));
    let (digits, radix) = if let Some(hex) = hex {
        (hex, 16)
    } else if s.len() > 1 && s.starts_with('0') {
        (&s[1..], 8)
    } else {
        (s, 10)
    };
    usize::from_str_radix(digits, radix).map_err(|e| format!("Invalid size '{s}': {e}"))
}

fn parse_bounds(s: &str) -> Result<BoundsPolicy, String> {
    match s {
        "checked" => Ok(BoundsPolicy::Checked),
        "wrap" => Ok(BoundsPolicy::Wrap),
        other => Err(format!("Unknown bounds policy '{other}', expected checked or wrap")),
    }
}

fn parse_eof(s: &str) -> Result<EofPolicy, String> {
    match s {
        "max" => Ok(EofPolicy::Max),
        "zero" => Ok(EofPolicy::Zero),
        "unchanged" => Ok(EofPolicy::Unchanged),
        other => Err(format!("Unknown eof policy '{other}', expected max, zero or unchanged")),
    }
}

/// Basename of the executable, for diagnostics.
fn program_name(argv0: Option<&OsString>) -> String {
    argv0
        .map(Path::new)
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bfi".to_string())
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    // Already installed when called more than once in one process.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    let code = run_cli(
        std::env::args_os(),
        io::stdin().lock(),
        io::stdout().lock(),
        &mut io::stderr(),
    );
    ExitCode::from(code)
}

/// Parse `args`, run the named program against `stdin`/`stdout`, and return
/// the process exit status.
fn run_cli<I, T>(args: I, stdin: impl Read, stdout: impl Write, stderr: &mut impl Write) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let pname = program_name(args.first());

    let cli = match Cli::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = write!(stderr, "{}", e.render());
            return 1;
        }
        Err(e) => {
            // --help and --version are not failures.
            let mut stdout = stdout;
            let _ = write!(stdout, "{}", e.render());
            let _ = stdout.flush();
            return 0;
        }
    };
    init_tracing(cli.verbose);

    let Some(path) = cli.file.as_deref() else {
        let _ = writeln!(stderr, "{pname}: No input files");
        return 1;
    };

    match run(&cli, path, stdin, stdout) {
        Ok(()) => 0,
        Err(e) => {
            let _ = writeln!(stderr, "{pname}: {e:#}");
            1
        }
    }
}

fn run(cli: &Cli, path: &Path, stdin: impl Read, stdout: impl Write) -> anyhow::Result<()> {
    let config = EngineConfig {
        tape_size: cli.size,
        stack_capacity: cli.depth,
        bounds: cli.bounds,
        eof: cli.eof,
        max_steps: cli.max_steps,
        ..Default::default()
    };
    debug!(?config, "configuration");

    let stats = run_file(path, stdin, BufWriter::new(stdout), &config)?;
    debug!(?stats, "done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO: &[u8] = b"++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";

    /// Run the CLI with empty stdin, returning (status, stdout, stderr).
    fn cli(args: &[&str]) -> (u8, String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = run_cli(args.iter().copied(), &b""[..], &mut out, &mut err);
        (
            code,
            String::from_utf8_lossy(&out).into_owned(),
            String::from_utf8_lossy(&err).into_owned(),
        )
    }

    fn program_file(source: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(source).unwrap();
        file
    }

    #[test]
    fn test_parse_size_radixes() {
        assert_eq!(parse_size("30000"), Ok(30000));
        assert_eq!(parse_size("0x10"), Ok(16));
        assert_eq!(parse_size("010"), Ok(8));
        assert_eq!(parse_size("0"), Ok(0));
        assert!(parse_size("12k").is_err());
        assert!(parse_size("-1").is_err());
    }

    #[test]
    fn test_parse_policies() {
        assert_eq!(parse_bounds("wrap"), Ok(BoundsPolicy::Wrap));
        assert!(parse_bounds("unchecked").is_err());
        assert_eq!(parse_eof("unchanged"), Ok(EofPolicy::Unchanged));
        assert!(parse_eof("-1").is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["bfi", "hello.b"]).unwrap();
        assert_eq!(cli.file.as_deref(), Some(Path::new("hello.b")));
        assert_eq!(cli.size, 30000);
        assert_eq!(cli.depth, 1000);
        assert_eq!(cli.bounds, BoundsPolicy::Checked);
        assert_eq!(cli.eof, EofPolicy::Max);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_flags() {
        let args = ["bfi", "-s", "0x100", "-d", "4", "--bounds", "wrap", "-v", "prog.b"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.size, 256);
        assert_eq!(cli.depth, 4);
        assert_eq!(cli.bounds, BoundsPolicy::Wrap);
        assert!(cli.verbose);
    }

    #[test]
    fn test_hello_world_exits_zero() {
        let file = program_file(HELLO);
        let path = file.path().to_str().unwrap();
        let (code, out, err) = cli(&["bfi", path]);
        assert_eq!(code, 0, "stderr: {err}");
        assert_eq!(out, "Hello World!\n");
        assert!(err.is_empty());
    }

    #[test]
    fn test_no_input_file_exits_one() {
        let (code, out, err) = cli(&["/usr/local/bin/bfi"]);
        assert_eq!(code, 1);
        assert!(out.is_empty());
        assert_eq!(err, "bfi: No input files\n");
    }

    #[test]
    fn test_unknown_flag_exits_one() {
        let (code, _, err) = cli(&["bfi", "--bogus", "prog.b"]);
        assert_eq!(code, 1);
        assert!(err.contains("--bogus"));
    }

    #[test]
    fn test_bad_size_exits_one() {
        let (code, _, err) = cli(&["bfi", "-s", "lots", "prog.b"]);
        assert_eq!(code, 1);
        assert!(err.contains("Invalid size"));
    }

    #[test]
    fn test_missing_source_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.b");
        let (code, out, err) = cli(&["bfi", path.to_str().unwrap()]);
        assert_eq!(code, 1);
        assert!(out.is_empty());
        assert!(err.starts_with("bfi: "));
        assert!(err.contains("could not read file"));
    }

    #[test]
    fn test_runtime_errors_exit_one() {
        let file = program_file(b"+.]");
        let (code, out, err) = cli(&["bfi", file.path().to_str().unwrap()]);
        assert_eq!(code, 1);
        // Output before the fault still reaches stdout.
        assert_eq!(out.as_bytes(), &[1u8]);
        assert!(err.contains("unmatched ']' at byte offset 2"));

        let file = program_file(b"+");
        let path = file.path().to_str().unwrap();
        let (code, _, err) = cli(&["bfi", "-s", "0x7fffffffffffffff", path]);
        assert_eq!(code, 1);
        assert!(err.contains("out of memory"));
    }

    #[test]
    fn test_help_and_version_exit_zero() {
        let (code, out, err) = cli(&["bfi", "--help"]);
        assert_eq!(code, 0);
        assert!(out.contains("Usage"));
        assert!(out.contains("Exit status is 0"));
        assert!(err.is_empty());

        let (code, out, _) = cli(&["bfi", "-V"]);
        assert_eq!(code, 0);
        assert!(out.starts_with("bfi 0.1.0"));

        let (code, out, _) = cli(&["bfi", "--version"]);
        assert_eq!(code, 0);
        assert!(out.contains("Simplified BSD License"));
    }
}
