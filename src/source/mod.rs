// Remote artifact access: existence probes and full-body fetches.

pub mod http_source;
pub mod traits;
