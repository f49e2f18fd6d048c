//! Terminal output for chat events. One line per event:
//! `MM/DD/YY HH:MM:SS I│SRC>DST text`, where I is S (sent), R (received)
//! or A (acknowledged). Colors come from the settings file, keyed by
//! callsign, with a white fallback.

use std::collections::HashMap;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use crossterm::style::{Color, Stylize};

use rfchat_core::{ChatEvent, StatusLevel};

const TIMESTAMP_FORMAT: &str = "%m/%d/%y %H:%M:%S";

pub struct Renderer {
    callsign: String,
    colors: HashMap<String, String>,
}

impl Renderer {
    pub fn new(callsign: String, colors: HashMap<String, String>) -> Self {
        Self { callsign, colors }
    }

    pub fn render(&self, event: &ChatEvent) {
        match event {
            ChatEvent::Sent {
                at,
                source,
                destination,
                text,
            } => {
                // Unacknowledged sends print dim; the A line re-prints them
                // in color once the ack lands.
                let line = format!(
                    "{} S\u{2502}{}>{} {}",
                    timestamp(*at),
                    source,
                    destination,
                    text
                );
                println!("{}", line.with(Color::DarkGrey));
            }
            ChatEvent::Received {
                at,
                source,
                destination,
                text,
            } => {
                println!(
                    "{} {}\u{2502}{}>{} {}",
                    timestamp(*at).with(Color::DarkGrey),
                    "R".with(self.color_for(source)),
                    source.as_str().with(self.color_for(source)),
                    destination.as_str().with(Color::Grey),
                    text
                );
            }
            ChatEvent::Acknowledged {
                at,
                source,
                destination,
                text,
                ..
            } => {
                println!(
                    "{} {}\u{2502}{}>{} {}",
                    timestamp(*at).with(Color::DarkGrey),
                    "A".with(self.color_for(&self.callsign)),
                    source.as_str().with(self.color_for(&self.callsign)),
                    destination.as_str().with(Color::Grey),
                    text
                );
            }
            ChatEvent::Status { level, text } => {
                let color = match level {
                    StatusLevel::Info => Color::Grey,
                    StatusLevel::Warning => Color::Yellow,
                    StatusLevel::Error => Color::Red,
                };
                println!("{}", format!("* {text}").with(color));
            }
        }
    }

    pub fn clear_screen(&self) {
        // ANSI clear plus cursor home; crossterm's execute! would need a
        // writer handle for the same two codes.
        print!("\u{1b}[2J\u{1b}[1;1H");
        let _ = std::io::Write::flush(&mut std::io::stdout());
    }

    fn color_for(&self, callsign: &str) -> Color {
        self.colors
            .get(callsign)
            .map(|name| parse_color(name))
            .unwrap_or(Color::White)
    }
}

fn timestamp(at: SystemTime) -> String {
    DateTime::<Local>::from(at).format(TIMESTAMP_FORMAT).to_string()
}

fn parse_color(name: &str) -> Color {
    match name.to_ascii_lowercase().as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "grey" | "gray" => Color::Grey,
        "dark-grey" | "dark-gray" => Color::DarkGrey,
        "dark-red" => Color::DarkRed,
        "dark-green" => Color::DarkGreen,
        "dark-yellow" => Color::DarkYellow,
        "dark-blue" => Color::DarkBlue,
        "dark-magenta" => Color::DarkMagenta,
        "dark-cyan" => Color::DarkCyan,
        _ => Color::White,
    }
}
