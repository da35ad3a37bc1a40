use log::trace;
use regex::Regex;
use std::{collections::HashMap, sync::LazyLock};

/// How a matching identifier is turned into a global name.
enum GlobalName {
    /// Base namespace followed by the captured sub-path, `/` becoming `.`
    Namespace(&'static str),
    /// Always the same global
    Fixed(&'static str),
}

struct Rule {
    pattern: Regex,
    name: GlobalName,
}

impl Rule {
    fn new(pattern: &str, name: GlobalName) -> Self {
        Self { pattern: Regex::new(pattern).expect("global name pattern is valid"), name }
    }
}

/// Conventional globals of well-known UMD libraries, checked in order.
///
/// `platform-browser-dynamic` has to come before `platform-browser`, which in
/// turn has to come before the catch-all `@angular` rule.
static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(
            r"^@angular/platform-browser-dynamic(/?.*)$",
            GlobalName::Namespace("ng.platformBrowserDynamic"),
        ),
        Rule::new(r"^@angular/platform-browser(/?.*)$", GlobalName::Namespace("ng.platformBrowser")),
        Rule::new(r"^@angular(/.+)$", GlobalName::Namespace("ng")),
        Rule::new(r"^rxjs/(add/)?observable", GlobalName::Fixed("Rx.Observable")),
        Rule::new(r"^rxjs/scheduler", GlobalName::Fixed("Rx.Scheduler")),
        Rule::new(r"^rxjs/symbol", GlobalName::Fixed("Rx.Symbol")),
        Rule::new(r"^rxjs/(add/)?operator", GlobalName::Fixed("Rx.Observable.prototype")),
        Rule::new(r"^rxjs/[^/]+$", GlobalName::Fixed("Rx")),
    ]
});

/// Picks the global variable a UMD bundle reads `module_id` from.
///
/// `overrides` wins over the built-in conventions. `None` means there is no
/// opinion and the bundler is left to guess a name.
pub fn umd_global_name(module_id: &str, overrides: &HashMap<String, String>) -> Option<String> {
    if let Some(name) = overrides.get(module_id) {
        trace!("Using configured global '{}' for '{}'", name, module_id);
        return Some(name.clone());
    }

    for rule in RULES.iter() {
        let Some(captures) = rule.pattern.captures(module_id) else {
            continue;
        };
        let name = match rule.name {
            GlobalName::Namespace(base) => {
                let rest = captures.get(1).map_or("", |m| m.as_str());
                format!("{}{}", base, rest.replace('/', "."))
            }
            GlobalName::Fixed(name) => name.to_string(),
        };
        trace!("Derived global '{}' for '{}'", name, module_id);
        return Some(name);
    }

    None
}
