//! Process-wide named parsers.
//!
//! Lets separate modules of one program register options on a shared parser
//! without passing it around: each calls [`get_parser`] with the same name
//! and receives the same instance.
//!
//! ```ignore
//! let parser = argfig::get_parser(argfig::DEFAULT_PARSER_NAME, None)?;
//! parser.lock().unwrap().add_option(OptionSpec::new(["--threads"]))?;
//! ```

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use tracing::debug;

use crate::builder::{ArgParser, ArgParserBuilder};
use crate::error::ArgfigError;

/// Name used when a program needs only one shared parser.
pub const DEFAULT_PARSER_NAME: &str = "default";

pub type SharedParser = Arc<Mutex<ArgParser>>;

/// Each parser is stored with the builder it was created from, so builders
/// can be compared without locking the parser.
static PARSERS: LazyLock<Mutex<HashMap<String, (ArgParserBuilder, SharedParser)>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Create the parser `name`. Fails if it already exists.
pub fn init_parser(name: &str, builder: ArgParserBuilder) -> Result<SharedParser, ArgfigError> {
    let mut parsers = PARSERS.lock().unwrap_or_else(PoisonError::into_inner);
    if parsers.contains_key(name) {
        return Err(ArgfigError::RegistryConflict {
            name: name.to_string(),
        });
    }
    let parser = Arc::new(Mutex::new(builder.clone().build()?));
    parsers.insert(name.to_string(), (builder, Arc::clone(&parser)));
    debug!(name, "Created shared parser");
    Ok(parser)
}

/// Return the parser `name`, creating it on first use.
///
/// A `builder` given for an existing parser must equal the one it was
/// created with; `None` accepts whatever exists, or creates the parser from
/// default settings.
pub fn get_parser(
    name: &str,
    builder: Option<ArgParserBuilder>,
) -> Result<SharedParser, ArgfigError> {
    let mut parsers = PARSERS.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some((created_with, existing)) = parsers.get(name) {
        if builder.is_some_and(|b| &b != created_with) {
            return Err(ArgfigError::RegistryConflict {
                name: name.to_string(),
            });
        }
        return Ok(Arc::clone(existing));
    }

    let builder = builder.unwrap_or_default();
    let parser = Arc::new(Mutex::new(builder.clone().build()?));
    parsers.insert(name.to_string(), (builder, Arc::clone(&parser)));
    debug!(name, "Created shared parser");
    Ok(parser)
}
