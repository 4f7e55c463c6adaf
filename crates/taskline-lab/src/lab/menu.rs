//! Interactive scenario menu.

use crate::lab::config::LabConfig;
use crate::lab::scenarios::{SCENARIOS, Scenario, run_scenario};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Exit,
    Run(Scenario),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MenuError {
    #[error("{0:?} is not a number")]
    NotANumber(String),
    #[error("no scenario numbered {0}")]
    Unknown(u8),
}

pub fn parse_choice(input: &str) -> Result<Choice, MenuError> {
    let input = input.trim();
    let number: u8 = input
        .parse()
        .map_err(|_| MenuError::NotANumber(input.to_owned()))?;
    if number == 0 {
        return Ok(Choice::Exit);
    }
    Scenario::from_number(number)
        .map(Choice::Run)
        .ok_or(MenuError::Unknown(number))
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MenuStats {
    pub completed: usize,
    pub failed: usize,
    pub rejected: usize,
}

fn print_menu() {
    println!("\n========== taskline lab ==========");
    for entry in SCENARIOS {
        println!("{}. {}", entry.number, entry.title);
    }
    println!("0. Exit");
    println!("==================================");
    println!("Choose a scenario:");
}

/// Reads choices line by line from `input` until `0` or end of input.
///
/// Bad input and failing scenarios are reported and the menu carries on.
///
/// # Errors
///
/// Only if reading `input` itself fails.
pub async fn run_menu<R>(input: R, config: &LabConfig) -> anyhow::Result<MenuStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut stats = MenuStats::default();

    loop {
        print_menu();
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_choice(&line) {
            Ok(Choice::Exit) => break,
            Ok(Choice::Run(scenario)) => match run_scenario(scenario, config).await {
                Ok(()) => stats.completed += 1,
                Err(e) => {
                    tracing::error!("Scenario {scenario:?} failed: {e:#}");
                    println!("Scenario failed: {e:#}");
                    stats.failed += 1;
                }
            },
            Err(e) => {
                println!("Invalid choice: {e}");
                stats.rejected += 1;
            }
        }
    }

    println!("Goodbye");
    Ok(stats)
}
