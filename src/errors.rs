//! Error and panic reporting
//!
//! Panics leave the alternate screen before anything is printed, so the
//! report is readable and the shell is usable afterwards.

use color_eyre::Result;
use tracing::error;

pub fn init() -> Result<()> {
    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default()
        .panic_section(format!(
            "This is a bug. Consider reporting it along with {}",
            crate::logging::LOG_FILE.as_str()
        ))
        .capture_span_trace_by_default(false)
        .display_location_section(false)
        .display_env_section(false)
        .into_hooks();
    eyre_hook.install()?;

    std::panic::set_hook(Box::new(move |panic_info| {
        if let Err(e) = crate::tui::terminal::restore() {
            eprintln!("Unable to restore terminal: {e:?}");
        }

        #[cfg(not(debug_assertions))]
        {
            use human_panic::{handle_dump, metadata, print_msg};
            let metadata = metadata!();
            let file_path = handle_dump(&metadata, panic_info);
            let _ = print_msg(file_path, &metadata);
            eprintln!("{}", panic_hook.panic_report(panic_info));
        }

        error!("Panic: {}", panic_hook.panic_report(panic_info));

        #[cfg(debug_assertions)]
        {
            better_panic::Settings::auto()
                .most_recent_first(false)
                .lineno_suffix(true)
                .verbosity(better_panic::Verbosity::Full)
                .create_panic_handler()(panic_info);
        }

        std::process::exit(1);
    }));
    Ok(())
}
