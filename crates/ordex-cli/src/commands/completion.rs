use anyhow::Result;
use clap::Command;
use clap_complete::{Shell, generate};
use std::io::Write;

/// Write the completion script for `shell` to `out`
pub fn execute(shell: Shell, cmd: &mut Command, out: &mut impl Write) -> Result<()> {
    let bin_name = cmd.get_name().to_string();
    tracing::debug!("Generating {} completions for {}", shell, bin_name);
    generate(shell, cmd, bin_name, out);
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Arg;

    #[test]
    fn test_generates_for_named_command() {
        let mut cmd = Command::new("ordex").subcommand(
            Command::new("decode").arg(Arg::new("input").required(true)),
        );
        let mut buf = Vec::new();

        execute(Shell::Bash, &mut cmd, &mut buf).unwrap();

        let script = String::from_utf8(buf).unwrap();
        assert!(script.contains("_ordex()"));
        assert!(script.contains("decode"));
    }
}
