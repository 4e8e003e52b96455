// src/commands/verb.rs
//! The verb table. Dispatch is an explicit lookup, nothing is derived from
//! method names at runtime.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Add,
    Disable,
    Edit,
    Enable,
    Export,
    List,
    Refresh,
    Reload,
    Remove,
    Scan,
    Upgrade,
    Version,
    Help,
}

/// (name, verb, signature, one-line description). Order is the help order.
const VERBS: &[(&str, Verb, &str, &str)] = &[
    ("add", Verb::Add, "[OPTIONS] IDENTIFIER", "Add a new mirror"),
    ("disable", Verb::Disable, "IDENTIFIER", "Disable a mirror"),
    ("edit", Verb::Edit, "IDENTIFIER", "Edit a mirror"),
    ("enable", Verb::Enable, "IDENTIFIER", "Enable a mirror"),
    ("export", Verb::Export, "[OPTIONS] FORMAT", "Export the mirror database"),
    ("list", Verb::List, "[OPTIONS]", "List all mirrors"),
    ("refresh", Verb::Refresh, "", "Refresh the local repository"),
    ("reload", Verb::Reload, "", "Reload configuration"),
    ("remove", Verb::Remove, "IDENTIFIER", "Remove a mirror"),
    ("scan", Verb::Scan, "IDENTIFIER", "(Re-)Scan a mirror"),
    ("upgrade", Verb::Upgrade, "", "Seamless binary upgrade"),
    ("version", Verb::Version, "", "Print version informations"),
];

impl Verb {
    /// Case-insensitive lookup. `help` is accepted but not listed.
    pub fn lookup(name: &str) -> Option<Verb> {
        if name.eq_ignore_ascii_case("help") {
            return Some(Verb::Help);
        }
        VERBS
            .iter()
            .find(|(n, ..)| n.eq_ignore_ascii_case(name))
            .map(|(_, v, ..)| *v)
    }

    pub fn name(&self) -> &'static str {
        self.entry().map(|(n, ..)| *n).unwrap_or("help")
    }

    pub fn signature(&self) -> &'static str {
        self.entry().map(|(_, _, s, _)| *s).unwrap_or("")
    }

    pub fn description(&self) -> &'static str {
        self.entry()
            .map(|(.., d)| *d)
            .unwrap_or("Show this help")
    }

    fn entry(&self) -> Option<&'static (&'static str, Verb, &'static str, &'static str)> {
        VERBS.iter().find(|(_, v, ..)| v == self)
    }
}

/// Top-level usage listing every verb.
pub fn help_text() -> String {
    let mut help = String::from(
        "Usage: mirrorbits [OPTIONS] COMMAND [arg...]\n\nA smart download redirector.\n\nCommands:\n",
    );
    for (name, _, _, description) in VERBS {
        help.push_str(&format!("    {name:<10}{description}\n"));
    }
    help
}
