use std::{env, io, process::ExitCode};

use bb_followers::{USAGE, prompt::TermPrompter, run, settings::Settings, wants_help};

// -1 as seen by the parent process.
const HELP_EXIT: u8 = 255;

fn main() -> ExitCode {
    env_logger::init();
    let args: Vec<String> = env::args().skip(1).collect();

    if wants_help(&args) {
        print!("{USAGE}");
        return ExitCode::from(HELP_EXIT);
    }

    let result = Settings::resolve(&args, &mut TermPrompter::new())
        .and_then(|settings| run(settings, &mut io::stdout().lock()));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::debug!("run failed: {err:?}");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
