//! CLI command implementations

pub mod commit;
pub mod config;
pub mod start;
pub mod status;
pub mod stop;
pub mod watch;

use autocommit_core::{PublishOutcome, PushResult};
use owo_colors::OwoColorize;

/// Print the result of a publish cycle
pub(crate) fn print_outcome(outcome: &PublishOutcome) {
    match outcome {
        PublishOutcome::NoChanges => println!("{}", "Nothing to commit".dimmed()),
        PublishOutcome::Committed { push } => match push {
            PushResult::Pushed => println!("{} Committed and pushed", "✓".green()),
            PushResult::PushedWithUpstream { branch } => println!(
                "{} Committed and pushed (set upstream for {})",
                "✓".green(),
                branch.cyan()
            ),
            PushResult::Skipped => println!("{} Committed {}", "✓".green(), "(not pushed)".dimmed()),
            PushResult::Failed { reason } => {
                println!("{} Committed locally", "✓".green());
                println!("{} Push failed: {}", "Warning:".yellow(), reason);
            }
        },
    }
}
