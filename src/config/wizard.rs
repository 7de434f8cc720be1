use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::battle::{transport, BattleSetup, BonusCategory, RoundCatalogue};

const DEFAULT_BATTLE_FILE: &str = "battle.json";

/// Line-oriented prompts over any reader/writer pair.
pub struct Prompter<R, W> {
    input: R,
    output: W,
    typewriter_delay_ms: u64,
}

impl Prompter<std::io::StdinLock<'static>, std::io::Stdout> {
    pub fn stdio() -> Self {
        Self {
            input: std::io::stdin().lock(),
            output: std::io::stdout(),
            typewriter_delay_ms: 18,
        }
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            typewriter_delay_ms: 0,
        }
    }

    /// Prompt user with a message and return their trimmed input.
    pub fn prompt(&mut self, message: &str) -> Result<String> {
        write!(self.output, "{}", message).context("Failed to write prompt")?;
        self.output.flush().context("Failed to flush stdout")?;
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("Failed to read input")?;
        if read == 0 {
            anyhow::bail!("Input closed before setup was finished");
        }
        Ok(line.trim().to_string())
    }

    /// Prompt with a default value. Returns default if input is empty.
    pub fn prompt_with_default(&mut self, message: &str, default: &str) -> Result<String> {
        let input = self.prompt(&format!("{} [{}]: ", message, default))?;
        if input.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(input)
        }
    }

    /// Prompt with a yes/no question.
    pub fn prompt_yes_no(&mut self, message: &str, default_yes: bool) -> Result<bool> {
        let hint = if default_yes { "Y/n" } else { "y/N" };
        let input = self.prompt(&format!("{} [{}]: ", message, hint))?.to_lowercase();
        if input.is_empty() {
            Ok(default_yes)
        } else {
            Ok(input == "y" || input == "yes" || input == "s" || input == "si" || input == "sí")
        }
    }

    /// Prompt for a positive count, re-asking until one is given.
    pub fn prompt_count(&mut self, message: &str, default: u32) -> Result<u32> {
        loop {
            let input = self.prompt_with_default(message, &default.to_string())?;
            match input.parse::<u32>() {
                Ok(n) if n >= 1 => return Ok(n),
                _ => self.say("  Invalid: must be a whole number of at least 1. Try again.")?,
            }
        }
    }

    pub fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}", text).context("Failed to write output")
    }

    /// Print text with a typewriter effect, one character at a time.
    pub fn typewriter(&mut self, text: &str) -> Result<()> {
        if self.typewriter_delay_ms == 0 {
            return self.say(text);
        }
        for c in text.chars() {
            write!(self.output, "{}", c).context("Failed to write output")?;
            self.output.flush().ok();
            std::thread::sleep(std::time::Duration::from_millis(self.typewriter_delay_ms));
        }
        writeln!(self.output).context("Failed to write output")
    }
}

/// Ask for contestants and rounds and build a battle setup.
pub fn build_setup<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    catalogue: RoundCatalogue,
) -> Result<BattleSetup> {
    let mut setup = BattleSetup::new(catalogue);

    // 1. Contestants
    p.typewriter("Who is battling? Enter one MC per line, empty line when done.")?;
    loop {
        let name = p.prompt(&format!("  MC {}: ", setup.contestants().len() + 1))?;
        if name.is_empty() {
            if setup.contestants().len() >= 2 {
                break;
            }
            p.say("  A battle needs at least two MCs.")?;
            continue;
        }
        if let Err(e) = setup.add_contestant(&name) {
            p.say(&format!("  {}. Try again.", e))?;
        }
    }

    // 2. Rounds
    p.say("")?;
    p.typewriter("Pick the rounds in the order they will be played.")?;
    let names: Vec<String> = setup.catalogue().names().map(String::from).collect();
    for (i, preset) in setup.catalogue().presets().iter().enumerate() {
        p.say(&format!(
            "  {:>2}. {} ({} x {})",
            i + 1,
            preset.name,
            preset.turns_per_mc,
            preset.patterns_per_turn
        ))?;
    }

    loop {
        let choice = p.prompt("Round number or name (empty when done): ")?;
        if choice.is_empty() {
            if !setup.rounds().is_empty() {
                break;
            }
            p.say("  Add at least one round.")?;
            continue;
        }
        let name = match choice.parse::<usize>() {
            Ok(n) if n >= 1 && n <= names.len() => names[n - 1].clone(),
            _ => choice,
        };
        match setup.add_round_config(&name) {
            Ok(round) => configure_round(p, &mut setup, &round.id)?,
            Err(e) => p.say(&format!("  {}. Try again.", e))?,
        }
    }

    Ok(setup)
}

fn configure_round<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    setup: &mut BattleSetup,
    id: &str,
) -> Result<()> {
    let Some(round) = setup.round(id).cloned() else {
        return Ok(());
    };

    let keep = p.prompt_yes_no(
        &format!(
            "  Keep {} at {} interventions x {} patterns?",
            round.name, round.turns_per_mc, round.patterns_per_turn
        ),
        true,
    )?;
    if !keep {
        let turns = p.prompt_count("  Interventions per MC", round.turns_per_mc)?;
        let patterns = p.prompt_count("  Patterns per intervention", round.patterns_per_turn)?;
        setup.set_turns_per_mc(id, turns)?;
        setup.set_patterns_per_turn(id, patterns)?;
    }

    let labels: Vec<&str> = BonusCategory::ALL.iter().map(|c| c.label()).collect();
    loop {
        let input = p.prompt(&format!(
            "  Bonuses, comma separated ({}) or empty for none: ",
            labels.join(", ")
        ))?;
        let mut categories = Vec::new();
        let mut unknown = Vec::new();
        for part in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match BonusCategory::parse(part) {
                Some(c) if !categories.contains(&c) => categories.push(c),
                Some(_) => {}
                None => unknown.push(part.to_string()),
            }
        }
        if !unknown.is_empty() {
            p.say(&format!("  Unknown bonus: {}. Try again.", unknown.join(", ")))?;
            continue;
        }
        for category in categories {
            setup.toggle_bonus(id, category)?;
        }
        break;
    }

    if p.prompt_yes_no("  Ida y vuelta (play twice)?", false)? {
        setup.toggle_double_round(id)?;
    }
    Ok(())
}

/// Run the interactive setup wizard and write a battle configuration file.
pub fn run_setup_wizard(out: Option<PathBuf>, catalogue: RoundCatalogue) -> Result<()> {
    let mut p = Prompter::stdio();

    p.say("")?;
    p.typewriter("Battle Judge Setup")?;
    p.say("==================")?;
    p.say("")?;

    let setup = build_setup(&mut p, catalogue)?;

    let default_path = out.unwrap_or_else(|| PathBuf::from(DEFAULT_BATTLE_FILE));
    p.say("")?;
    let path_str = p.prompt_with_default(
        "Where should the battle be saved?",
        &default_path.display().to_string(),
    )?;
    let path = PathBuf::from(&path_str);

    if path.exists() {
        let overwrite = p.prompt_yes_no(
            &format!("{} already exists. Overwrite?", path.display()),
            false,
        )?;
        if !overwrite {
            p.say("Aborted.")?;
            return Ok(());
        }
    }

    transport::save_config(&path, &setup)?;

    p.say("")?;
    p.say(&format!("Battle written to {}", path.display()))?;
    p.say(&format!("Run `battle-judge judge {}` to start judging.", path.display()))?;
    Ok(())
}
