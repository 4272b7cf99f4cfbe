use std::error::Error;
use std::fmt::Formatter;

/// Write an error, followed by every error in its `source` chain, one per
/// line. Used for the `Debug` impls of our error enums, so that logging
/// `error.cause_chain=?e` shows the root cause (e.g. the `reqwest::Error`
/// behind a failed provider call).
pub fn error_chain_fmt(
    e: &impl Error,
    f: &mut Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{e}\n")?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{cause}")?;
        current = cause.source();
    }
    Ok(())
}
