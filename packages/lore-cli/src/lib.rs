use clap::builder::{
	Styles,
	styling::{AnsiColor, Effects},
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared help styling for every LORE binary.
pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Green.on_default() | Effects::BOLD)
		.usage(AnsiColor::Green.on_default() | Effects::BOLD)
		.literal(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Cyan.on_default())
}
