pub mod format;
pub mod logging;
pub mod path_resolver;
pub mod validation;
