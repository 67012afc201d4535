pub mod banner;
pub mod progress;
pub mod tui;

/// Prints the welcome banner and applies the prompt theme for all subsequent inquire prompts.
pub fn init_ui() {
    banner::print_welcome();
    tui::apply_theme();
}
