//! Default colors for branch lines.

/// ANSI escape sequences used to color branch lines when no palette is
/// provided: the colors that `git log --graph` cycles through for columns,
/// with the reset sequence in the final position.
///
/// Callers may supply any palette with the same shape via
/// [`GraphOptions::column_colors`](crate::graph::GraphOptions::column_colors);
/// the entries are treated as opaque tokens.
pub const COLUMN_COLORS_ANSI: &[&str] = &[
    "\x1b[31m",   // red
    "\x1b[32m",   // green
    "\x1b[33m",   // yellow
    "\x1b[34m",   // blue
    "\x1b[35m",   // magenta
    "\x1b[36m",   // cyan
    "\x1b[1;31m", // bold red
    "\x1b[1;32m", // bold green
    "\x1b[1;33m", // bold yellow
    "\x1b[1;34m", // bold blue
    "\x1b[1;35m", // bold magenta
    "\x1b[1;36m", // bold cyan
    "\x1b[m",     // reset
];
