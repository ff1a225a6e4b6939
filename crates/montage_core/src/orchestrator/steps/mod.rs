//! Pipeline step implementations.

mod concat;
mod normalize;

pub use concat::ConcatStep;
pub use normalize::NormalizeStep;

use std::process::Command;

use super::errors::{StepError, StepResult};
use super::types::Context;

/// Run an ffmpeg invocation and stream its output into the run log.
///
/// ffmpeg writes everything to stderr, progress included, so the whole
/// stream goes through the logger's tail buffer; on failure the tail is
/// surfaced and the last real line becomes the error message.
pub(crate) fn run_ffmpeg(ctx: &Context, program: &str, tokens: &[String]) -> StepResult<i32> {
    ctx.logger.command(&format!("{} {}", program, tokens.join(" ")));
    if ctx.settings.logging.show_commands {
        ctx.logger.log_command_pretty(program, tokens);
    }

    let result = Command::new(program)
        .args(tokens)
        .output()
        .map_err(|e| StepError::io_error(format!("executing {}", program), e))?;

    let exit_code = result.status.code().unwrap_or(-1);

    if !result.stdout.is_empty() {
        let stdout = String::from_utf8_lossy(&result.stdout);
        for line in stdout.lines() {
            ctx.logger.output_line(line, false);
        }
    }
    if !result.stderr.is_empty() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        for line in stderr.lines() {
            ctx.logger.output_line(line, true);
        }
    }

    if exit_code != 0 {
        ctx.logger.show_tail(&format!("{} output", program));
        return Err(StepError::command_failed(
            program,
            exit_code,
            last_stderr_line(&result.stderr),
        ));
    }

    Ok(exit_code)
}

/// The last non-blank stderr line, where ffmpeg puts the actual error.
fn last_stderr_line(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("no error output")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_stderr_line_skips_trailing_blanks() {
        let stderr = b"frame= 450 fps=30\nConversion failed!\n\n  \n";
        assert_eq!(last_stderr_line(stderr), "Conversion failed!");
        assert_eq!(last_stderr_line(b""), "no error output");
    }
}
