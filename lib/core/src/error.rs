//! Error handling foundation for the amber-hearth platform.
//!
//! Only the `Result` type alias lives here. Each crate defines its own
//! domain-specific error enums in its own error module and uses
//! rootcause's `.context()` to attach layer-appropriate context as
//! errors propagate toward the platform boundary.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
///
/// Each layer adds its own context via `.context()` as errors propagate.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_type_works() {
        let ok: Result<u8> = Ok(7);
        assert_eq!(ok.expect("should be ok"), 7);
    }
}
