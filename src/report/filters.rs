use crate::filters::{FilterCatalog, FilterSelection};
use colored::Colorize;
use std::fmt::Write as _;

/// Print the active and unused filters to stdout.
pub fn print_filter_listing(catalog: &FilterCatalog, selection: &FilterSelection) {
    print!("{}", render_filter_listing(catalog, selection));
}

/// Active filters in green, unused ones in red. Integration filters carry a marker.
pub fn render_filter_listing(catalog: &FilterCatalog, selection: &FilterSelection) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", "Active:".yellow());
    for name in &selection.active {
        let _ = writeln!(out, "> {}{}", name.green(), marker(catalog, name));
    }

    if !selection.inactive.is_empty() {
        let _ = writeln!(out, "{}", "Unused:".yellow());
        for name in &selection.inactive {
            let _ = writeln!(out, "> {}{}", name.red(), marker(catalog, name));
        }
    }

    out
}

fn marker(catalog: &FilterCatalog, name: &str) -> String {
    if catalog.is_integration(name) {
        format!(" {}", "(integration)".blue())
    } else {
        String::new()
    }
}
