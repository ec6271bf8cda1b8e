//! Result type alias for Inkguard

use super::errors::InkguardError;

/// Result type alias for library setup: configuration, pattern files,
/// result documents
///
/// # Examples
///
/// ```
/// use inkguard::domain::{InkguardError, PiiType, Result};
///
/// fn enabled_types(list: &str) -> Result<Vec<PiiType>> {
///     list.split(',').map(str::parse).collect()
/// }
///
/// assert_eq!(enabled_types("ssn,phone").unwrap(), vec![PiiType::Ssn, PiiType::Phone]);
/// assert!(matches!(enabled_types("ssn,iban"), Err(InkguardError::Validation(_))));
/// ```
pub type Result<T> = std::result::Result<T, InkguardError>;
