use std::io::{BufRead, BufReader, Write};

use anyhow::Context;
use textree::{config, Tree};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .context("usage: textree <file> [first line]")?;
    let first_line = match args.next() {
        Some(line) => line
            .parse::<usize>()
            .with_context(|| format!("invalid line number: {line}"))?,
        None => 0,
    };

    let config_path = config::path();
    let config = config::load(&config_path);
    log::debug!("using config from {}: {config:?}", config_path.display());

    let bytes = std::fs::read(&path).with_context(|| format!("reading {path} failed"))?;
    let tree = Tree::from_utf8(&bytes).with_context(|| format!("loading {path} failed"))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if config.show_stats {
        writeln!(
            out,
            "{path}: {} bytes, {} chars, {} lines",
            tree.len_bytes(),
            tree.len_chars(),
            tree.len_lines()
        )?;
    }

    let preview = BufReader::new(tree.cursor_at_line(first_line))
        .lines()
        .take(config.preview_lines);
    for (line_num, line) in (first_line..).zip(preview) {
        let line = line.context("reading from tree failed")?;
        if config.show_line_numbers {
            writeln!(out, "{:>6} {line}", line_num + 1)?;
        } else {
            writeln!(out, "{line}")?;
        }
    }

    Ok(())
}
