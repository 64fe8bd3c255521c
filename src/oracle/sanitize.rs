// Identifier checks for names interpolated into generated SQL

use crate::error::NodeError;

const MAX_PART_LEN: usize = 128;

/// Schema-qualified table names: `table` or `schema.table`
pub const TABLE_PARTS: usize = 2;

/// Procedure names: `proc`, `pkg.proc` or `schema.pkg.proc`
pub const PROCEDURE_PARTS: usize = 3;

fn is_safe_part(part: &str) -> bool {
  if part.is_empty() || part.len() > MAX_PART_LEN { return false; }
  let mut chars = part.chars();
  match chars.next() {
    Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
    _ => return false,
  }
  chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '#')
}

/// Letters, digits, `_`, `$`, `#`, starting with a letter or underscore,
/// split into at most `max_parts` dot-separated parts.
/// Quotes, spaces, semicolons and comment markers never pass.
pub fn is_safe_identifier(id: &str, max_parts: usize) -> bool {
  let parts: Vec<&str> = id.split('.').collect();
  parts.len() <= max_parts && parts.iter().all(|p| is_safe_part(p))
}

pub fn check_identifier(kind: &str, id: &str, max_parts: usize) -> Result<(), NodeError> {
  if is_safe_identifier(id, max_parts) {
    Ok(())
  } else {
    Err(NodeError::invalid_input(format!("Invalid {} identifier '{}'", kind, id)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_plain_identifiers() {
    assert!(is_safe_identifier("employees", TABLE_PARTS));
    assert!(is_safe_identifier("HR.EMPLOYEES", TABLE_PARTS));
    assert!(is_safe_identifier("_tmp$1#", 1));
    assert!(is_safe_identifier("hr.pkg_payroll.raise_salary", PROCEDURE_PARTS));
  }

  #[test]
  fn test_rejects_injection_shapes() {
    assert!(!is_safe_identifier("", TABLE_PARTS));
    assert!(!is_safe_identifier("employees; DROP TABLE x", TABLE_PARTS));
    assert!(!is_safe_identifier("\"Quoted\"", TABLE_PARTS));
    assert!(!is_safe_identifier("a--b", TABLE_PARTS));
    assert!(!is_safe_identifier("1abc", TABLE_PARTS));
    assert!(!is_safe_identifier("a.b.c", TABLE_PARTS));
    assert!(!is_safe_identifier("a..b", PROCEDURE_PARTS));
    assert!(!is_safe_identifier(&"x".repeat(129), 1));
  }

  #[test]
  fn test_check_identifier_message() {
    let err = check_identifier("table", "bad name", TABLE_PARTS).unwrap_err();
    assert_eq!(err.to_string(), "Invalid table identifier 'bad name'");
  }
}
