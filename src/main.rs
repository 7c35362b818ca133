//! Scam Shield - Entry Point
//!
//! Terminal shell for the quiz engine. It loads the authored scenario
//! pack, restores per-device progress, and drives the session
//! controller through an interactive command loop: browse scenarios,
//! play one message by message, pick a response, and read the outcome.

use clap::Parser;
use scam_shield::content::{ContentRegistry, IconTag, Message, Scenario, Sender};
use scam_shield::core::config::EngineConfig;
use scam_shield::core::error::Result;
use scam_shield::core::types::{CategoryId, ScenarioId};
use scam_shield::progress::{JsonFileStore, ProgressStore};
use scam_shield::session::SessionController;

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

/// Learn to spot messaging scams through simulated conversations
#[derive(Parser, Debug)]
#[command(name = "scam-shield")]
#[command(about = "Learn to spot messaging scams through simulated conversations")]
struct Args {
    /// Directory of authored scenario TOML files
    #[arg(long, default_value = "data/scenarios")]
    data_dir: PathBuf,

    /// Category definitions file (optional)
    #[arg(long, default_value = "data/categories.toml")]
    categories: PathBuf,

    /// Where per-device progress is stored
    #[arg(long, default_value = "progress.json")]
    progress_file: PathBuf,

    /// Only list scenarios from this category id
    #[arg(long)]
    category: Option<u32>,
}

fn main() -> Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("scam_shield=info")
        .init();

    let args = Args::parse();

    let config = EngineConfig::default();
    if let Err(reason) = config.validate() {
        tracing::error!(%reason, "invalid engine configuration");
        std::process::exit(2);
    }

    // Load the authored content pack
    let mut registry = ContentRegistry::new();
    registry.load_directory(&args.data_dir)?;
    if args.categories.exists() {
        registry.load_categories(&args.categories)?;
    }
    tracing::info!(scenarios = registry.len(), "content loaded");

    // Restore progress; a missing or malformed file starts fresh
    let backend = JsonFileStore::new(&args.progress_file);
    let progress = ProgressStore::open(Box::new(backend), config.completion_award);

    let mut session = SessionController::new(&registry, progress, config);

    println!("\n=== SCAM SHIELD ===");
    println!("Learn to recognise WhatsApp scams before they cost you");
    println!();
    println!("Commands:");
    println!("  list / l        - List scenarios");
    println!("  play <id>       - Play a scenario");
    println!("  profile / p     - Show progress");
    println!("  reset           - Reset all progress");
    println!("  quit / q        - Exit");
    println!();

    // Main command loop
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input == "quit" || input == "q" {
            break;
        }

        if input == "list" || input == "l" {
            list_scenarios(&registry, &session, args.category.map(CategoryId));
            continue;
        }

        if input == "profile" || input == "p" {
            show_profile(&session);
            continue;
        }

        if input == "reset" {
            if confirm("Clear all completed scenarios and your score?")? {
                if let Err(e) = session.reset_progress() {
                    println!("Could not save the reset: {e}");
                } else {
                    println!("Progress cleared.");
                }
            }
            continue;
        }

        if let Some(rest) = input.strip_prefix("play ") {
            match rest.trim().parse::<u32>() {
                Ok(id) => {
                    if let Err(e) = play_scenario(&mut session, ScenarioId(id)) {
                        println!("{e}");
                        session.exit();
                    }
                }
                Err(_) => println!("Usage: play <id>"),
            }
            continue;
        }

        println!("Unknown command. Try: list, play <id>, profile, reset, quit");
    }

    println!("Stay safe out there.");
    Ok(())
}

fn list_scenarios(
    registry: &ContentRegistry,
    session: &SessionController<'_>,
    category: Option<CategoryId>,
) {
    let scenarios: Vec<&Scenario> = match category {
        Some(id) => registry.by_category(id),
        None => registry.all().iter().collect(),
    };

    if scenarios.is_empty() {
        println!("No scenarios found.");
        return;
    }

    println!();
    for scenario in scenarios {
        let done = if session.is_completed(scenario.id) {
            "[done]"
        } else {
            "      "
        };
        println!(
            "  {:>3}  {} {} {}",
            scenario.id.0,
            done,
            icon_glyph(scenario.icon),
            scenario.title
        );
        println!("            {}", scenario.description);
    }
    println!();
}

fn show_profile(session: &SessionController<'_>) {
    let summary = session.progress_summary();
    println!();
    println!(
        "  Completed: {}/{} ({}%)",
        summary.completed_count, summary.total_count, summary.percentage
    );
    println!("  Score:     {} points", summary.score);
    println!();
}

/// Run one scenario attempt from transcript to outcome
fn play_scenario(session: &mut SessionController<'_>, id: ScenarioId) -> Result<()> {
    session.start_attempt(id)?;

    // Header mirrors a chat screen: contact name plus presence line.
    let scenario = match session.scenario() {
        Some(scenario) => scenario,
        None => return Ok(()),
    };
    println!();
    println!(
        "--- {} {}  ({})",
        icon_glyph(scenario.icon),
        scenario.contact_name,
        scenario.contact_status
    );
    println!("    {}", scenario.title);
    println!();
    println!("Press Enter to reveal each message, or type 'end' to jump to the end.");
    println!();

    // Reveal messages one at a time. Jumping prints the rest at once but
    // still requires the dwell on the final message.
    let messages: Vec<_> = scenario.visible_messages().collect();
    let mut jumped = false;
    for (index, message) in messages.iter().enumerate() {
        if !jumped && index > 0 {
            let line = prompt("")?;
            if line.trim() == "end" {
                jumped = true;
            }
        }
        render_message(scenario, message);
    }

    // The final message is now on screen. Holding it in view for the
    // dwell duration unlocks the options.
    let timer = if jumped {
        session.jump_to_end()?
    } else {
        session.visibility_changed(1.0)?
    };
    if let Some(timer) = timer {
        std::thread::sleep(Duration::from_millis(timer.duration_ms));
        session.timer_elapsed(timer.token)?;
    }

    // Decision loop: pick an option, read the outcome, maybe retry.
    loop {
        let options = session.available_options().to_vec();
        println!();
        println!("How do you respond?");
        for (index, option) in options.iter().enumerate() {
            println!("  [{}] {}", index + 1, option.text);
        }

        let choice = loop {
            let line = prompt("choice> ")?;
            match line.trim().parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => break n - 1,
                _ => println!("Pick a number between 1 and {}.", options.len()),
            }
        };

        let outcome = session.select_option(&options[choice].id)?;

        println!();
        println!("=== {} ===", outcome.title);
        println!("{}", outcome.description);
        println!();
        for point in &outcome.explanation {
            println!("  - {point}");
        }
        println!();
        println!("Please note: {}", outcome.advice);

        if session.save_warning() {
            println!();
            println!("(warning: progress could not be saved and may not be retained)");
        }

        if session.can_retry() {
            let line = prompt("\n[t] try again, [b] back to games > ")?;
            if line.trim() == "t" {
                session.retry()?;
                continue;
            }
        } else {
            prompt("\nPress Enter to go back > ")?;
        }

        session.exit();
        return Ok(());
    }
}

fn render_message(scenario: &Scenario, message: &Message) {
    let timestamp = message.timestamp.as_deref().unwrap_or("12:00 PM");
    match message.sender {
        Sender::Contact => {
            println!("  {}: {}", scenario.contact_name, message.content);
            if let Some(attachment) = &message.attachment {
                println!("  {}: [attachment] {}", scenario.contact_name, attachment.name);
            }
            println!("      {timestamp}");
        }
        Sender::User => {
            println!("{:>68}", format!("You: {}", message.content));
            println!("{:>68}", timestamp);
        }
        // Excluded from transcripts; kept for future annotations.
        Sender::System => {}
    }
}

/// Map content icons to terminal glyphs (the shell owns presentation)
fn icon_glyph(tag: IconTag) -> &'static str {
    match tag {
        IconTag::Ticket => "🎟",
        IconTag::TrendingUp => "📈",
        IconTag::Briefcase => "💼",
        IconTag::CreditCard => "💳",
        IconTag::ShoppingBag => "🛍",
        IconTag::FileText => "📄",
        IconTag::Users => "👥",
        IconTag::Video => "🎥",
        IconTag::Key => "🔑",
        IconTag::Monitor => "🖥",
        IconTag::MessageCircle => "💬",
    }
}

fn prompt(text: &str) -> io::Result<String> {
    print!("{text}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}

fn confirm(question: &str) -> io::Result<bool> {
    let answer = prompt(&format!("{question} [y/N] "))?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
