use log::trace;
use oxipack_core::COMMONJS_HELPERS;
use std::{collections::HashSet, path::Path};

/// Decides whether `module_id` stays an external reference in the bundle.
///
/// Local files (absolute, `.`- or `/`-prefixed), the CommonJS interop helpers
/// and anything listed in `embedded` are inlined. Everything else is left for
/// the runtime environment to supply.
///
/// Plugin-internal virtual modules (ids starting with `\0`, such as the
/// CommonJS proxies) are inlined as well; the bundler asks about them once a
/// plugin has resolved an id.
pub fn is_external(module_id: &str, embedded: &HashSet<String>) -> bool {
    if module_id.starts_with('\0')
        || Path::new(module_id).is_absolute()
        || module_id.starts_with('.')
        || module_id.starts_with('/')
        || module_id.contains(COMMONJS_HELPERS)
    {
        return false;
    }

    if embedded.contains(module_id) {
        trace!("Embedding '{}'", module_id);
        return false;
    }

    true
}
