//! Interactive start menu and prompts.
//!
//! The start menu runs a countdown toward a full run so an unattended
//! terminal still produces the montage. Key handling uses raw mode for
//! single-keypress selection; the line prompts below it are ordinary
//! buffered stdin reads.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

/// What the user picked at the start menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    FullRun,
    MergeOnly,
    ReRender,
    ClearCache,
    Quit,
}

/// Raw mode that turns itself off when dropped, so an error inside the
/// menu loop cannot leave the terminal unusable.
struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// Show the start menu and wait for a choice.
///
/// The countdown runs toward a full run; any recognized key resolves
/// the menu immediately. Ctrl+C quits.
pub fn prompt_run_choice(countdown_secs: u64) -> io::Result<MenuChoice> {
    println!();
    println!("  ENTER/Y  full run");
    println!("  P        merge only (pick files)");
    println!("  R        re-render (pick files)");
    println!("  C        clear cached intermediates");
    println!("  Q        quit");
    println!();

    let _raw = RawModeGuard::enter()?;
    let deadline = Instant::now() + Duration::from_secs(countdown_secs);

    loop {
        let now = Instant::now();
        if now >= deadline {
            clear_countdown_line()?;
            return Ok(MenuChoice::FullRun);
        }

        let remaining = (deadline - now).as_secs() + 1;
        print!("\rStarting full run in {:2}s... ", remaining);
        io::stdout().flush()?;

        if event::poll(Duration::from_millis(200))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(choice) = choice_for_key(key.code, key.modifiers) {
                    clear_countdown_line()?;
                    return Ok(choice);
                }
            }
        }
    }
}

fn clear_countdown_line() -> io::Result<()> {
    print!("\r{:40}\r", "");
    io::stdout().flush()
}

/// Map a key press to a menu choice, if it is one.
///
/// Ctrl+C arrives as a plain 'c' with the control modifier set, so it
/// has to be checked before the clear-cache key.
fn choice_for_key(code: KeyCode, modifiers: KeyModifiers) -> Option<MenuChoice> {
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return Some(MenuChoice::Quit);
    }
    match code {
        KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => Some(MenuChoice::FullRun),
        KeyCode::Char('p') | KeyCode::Char('P') => Some(MenuChoice::MergeOnly),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(MenuChoice::ReRender),
        KeyCode::Char('c') | KeyCode::Char('C') => Some(MenuChoice::ClearCache),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(MenuChoice::Quit),
        _ => None,
    }
}

/// Read one line of input after a prompt.
pub fn prompt_line(prompt: &str) -> io::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Ask a yes/no question, defaulting to no.
pub fn confirm(prompt: &str) -> io::Result<bool> {
    let answer = prompt_line(&format!("{} [y/N] ", prompt))?;
    Ok(matches!(answer.as_str(), "y" | "Y" | "yes" | "Yes"))
}
