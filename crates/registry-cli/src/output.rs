// crates/registry-cli/src/output.rs
// ============================================================================
// Module: Output Helpers
// Description: Wraps stdout/stderr writes so command bodies never call the
//              `print!`/`println!` family directly.
// Purpose: Keep terminal output funneled through one fallible path.
// Dependencies: std::io
// ============================================================================

use std::io::Write;

/// Writes a single line to stdout.
pub fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
pub fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
pub fn emit_error(message: &str) -> std::process::ExitCode {
    let _ = write_stderr_line(message);
    std::process::ExitCode::FAILURE
}

/// Prompts on stdout and reads a yes/no answer from stdin. An unreadable or
/// empty answer counts as "no".
pub fn confirm(prompt: &str) -> std::io::Result<bool> {
    let mut stdout = std::io::stdout();
    write!(&mut stdout, "{prompt} [y/N] ")?;
    stdout.flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}
