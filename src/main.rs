// repo-stats entry point.
// Runs the collection pipeline and optionally opens the dashboard.

use std::io;
use std::panic;
use std::process::ExitCode;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::error;

use repo_stats::app::App;
use repo_stats::cli::{self, Cli};
use repo_stats::report::RepoReport;

/// Restore the terminal before the default panic message is printed.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));
}

fn run_dashboard(reports: Vec<RepoReport>, template: String) -> io::Result<()> {
    setup_panic_hook();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = App::new(reports, template).run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    cli::init_tracing(cli.verbose);

    let (reports, template) = match cli::execute(&cli).await {
        Ok(result) => result,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.dashboard {
        if let Err(e) = run_dashboard(reports, template) {
            error!("Dashboard failed: {}", e);
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
