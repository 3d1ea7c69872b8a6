/*
 * This file is part of Pulseboard.
 *
 * Copyright (C) 2025 Pulseboard contributors
 *
 * Pulseboard is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Pulseboard is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Pulseboard. If not, see <https://www.gnu.org/licenses/>.
 */

use std::io::stdout;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, bail};
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::layout::Rect;
use ratatui::Terminal;

use pulseboard::api::HttpApi;
use pulseboard::app::App;
use pulseboard::catalog::Catalog;
use pulseboard::config::load_config;
use pulseboard::events::{handle_key_event, handle_mouse_event};
use pulseboard::logger;
use pulseboard::ui::ui;

const USAGE: &str = "\
Usage: pulseboard [catalog] [--api-url <url>] [--config <path>]

  catalog           fetch metrics and segments, print them as JSON and exit
  --api-url <url>   API base URL (overrides config and PULSEBOARD_API_URL)
  --config <path>   config file (default: ~/.config/pulseboard/config.json)
  -h, --help        show this help";

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    command: Option<String>,
    api_url: Option<String>,
    config: Option<PathBuf>,
    help: bool,
}

fn parse_args(args: &[String]) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut it = args.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => out.help = true,
            "--api-url" => {
                let url = it.next().ok_or_else(|| anyhow!("--api-url needs a value"))?;
                out.api_url = Some(url.clone());
            }
            "--config" => {
                let path = it.next().ok_or_else(|| anyhow!("--config needs a value"))?;
                out.config = Some(PathBuf::from(path));
            }
            "catalog" if out.command.is_none() => out.command = Some(arg.clone()),
            other => bail!("unknown argument: {}\n\n{}", other, USAGE),
        }
    }
    Ok(out)
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cli = parse_args(args.get(1..).unwrap_or(&[]))?;
    if cli.help {
        println!("{}", USAGE);
        return Ok(());
    }

    let (mut config, config_problem) = load_config(cli.config.as_deref());
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }

    let log_path = logger::init_logging(config.log_path.as_deref());
    logger::log_event("startup", serde_json::json!({
        "args": args,
        "api": config.api_base_url,
        "log": log_path,
    }));
    if let Some(problem) = config_problem {
        logger::log_event("config_defaults", serde_json::json!({ "reason": problem }));
    }

    let api = Arc::new(HttpApi::new(&config.api_base_url)?);

    // One-shot mode: `pulseboard catalog`
    if cli.command.as_deref() == Some("catalog") {
        let catalog = Catalog::load(api.as_ref())?;
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, App::new(config, api));

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
        logger::log_event("fatal_error", serde_json::json!({ "error": err.to_string() }));
        std::process::exit(1);
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>,
    mut app: App,
) -> anyhow::Result<()> {
    loop {
        let size = terminal.size()?;
        app.set_viewport(Rect::new(0, 0, size.width, size.height));

        // apply finished fetches before drawing
        app.pump();
        terminal.draw(|f| ui(f, &app))?;

        let timeout = app.tick_rate().saturating_sub(app.last_tick.elapsed());
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key_event) => {
                    if handle_key_event(&mut app, key_event)? {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse_event) => handle_mouse_event(&mut app, mouse_event),
                _ => {}
            }
        }

        if app.last_tick.elapsed() >= app.tick_rate() {
            app.last_tick = Instant::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args_defaults() {
        assert_eq!(parse_args(&[]).unwrap(), CliArgs::default());
    }

    #[test]
    fn test_parse_args_catalog_with_flags() {
        let cli = parse_args(&args(&["catalog", "--api-url", "http://localhost:3000", "--config", "/tmp/c.json"])).unwrap();
        assert_eq!(cli.command.as_deref(), Some("catalog"));
        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:3000"));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.json")));
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(&args(&["--api-url"])).is_err());
        assert!(parse_args(&args(&["bogus"])).is_err());
        assert!(parse_args(&args(&["catalog", "catalog"])).is_err());
        assert!(parse_args(&args(&["-h"])).unwrap().help);
    }
}
