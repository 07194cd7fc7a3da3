//! Shared output layer for pretty/text/JSON parity across all commands.
//!
//! Precedence for the mode (highest wins): `--format` / `--json`, the
//! `WETODO_FORMAT` env var, the `output` key in the config file, then pretty
//! on a TTY and text when piped. The resolution itself lives in
//! `wetodo_core::config`; this module only maps the result and renders.

use clap::ValueEnum;
use serde::Serialize;
use std::io::{self, Write};

/// Shared width for human pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 60;

/// Write a horizontal separator used by pretty human output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Write a section heading followed by a separator.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<10} {}", format!("{key}:"), value.as_ref())
}

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Human-optimized output with headings and check boxes.
    Pretty,
    /// Tab-separated plain text for scripts and pipes.
    Text,
    /// Machine-readable JSON.
    Json,
}

impl OutputMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Text => "text",
            Self::Json => "json",
        }
    }

    /// Map a resolved config value; anything unexpected falls back to text.
    pub fn from_resolved(raw: &str) -> Self {
        match raw {
            "pretty" => Self::Pretty,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Render a serializable value with explicit pretty/text renderers.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_to(&mut out, mode, value, text_fn, pretty_fn)
}

fn render_to<T: Serialize>(
    out: &mut dyn Write,
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut *out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => text_fn(value, out)?,
        OutputMode::Pretty => pretty_fn(value, out)?,
    }
    Ok(())
}

/// Shorten a UUID for human output.
pub fn short_uuid(uuid: &str) -> &str {
    uuid.get(..8).unwrap_or(uuid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        name: &'static str,
    }

    fn render(mode: OutputMode) -> String {
        let mut buf = Vec::new();
        render_to(
            &mut buf,
            mode,
            &Sample { name: "x" },
            |s, w| writeln!(w, "text {}", s.name),
            |s, w| writeln!(w, "pretty {}", s.name),
        )
        .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn dispatches_on_mode() {
        assert_eq!(render(OutputMode::Text), "text x\n");
        assert_eq!(render(OutputMode::Pretty), "pretty x\n");
        let json: serde_json::Value = serde_json::from_str(&render(OutputMode::Json)).unwrap();
        assert_eq!(json["name"], "x");
    }

    #[test]
    fn resolved_strings_map_to_modes() {
        for mode in [OutputMode::Pretty, OutputMode::Text, OutputMode::Json] {
            assert_eq!(OutputMode::from_resolved(mode.as_str()), mode);
        }
        assert_eq!(OutputMode::from_resolved("weird"), OutputMode::Text);
    }

    #[test]
    fn pretty_helpers_write_expected_shapes() {
        let mut buf = Vec::new();
        pretty_section(&mut buf, "Heading").unwrap();
        pretty_kv(&mut buf, "uuid", "abc").unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Heading");
        assert_eq!(lines[1].len(), PRETTY_RULE_WIDTH);
        assert_eq!(lines[2], "uuid:      abc");
    }

    #[test]
    fn short_uuid_truncates() {
        assert_eq!(short_uuid("0123456789abcdef"), "01234567");
        assert_eq!(short_uuid("abc"), "abc");
    }
}
